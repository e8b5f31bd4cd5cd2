use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::domain::models::{Dimension, HumanAction, HumanActionKind};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ActionArg {
    Approve,
    Reject,
    Rerun,
    LockDimensions,
    ForceAccept,
}

impl From<ActionArg> for HumanActionKind {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::Approve => HumanActionKind::Approve,
            ActionArg::Reject => HumanActionKind::Reject,
            ActionArg::Rerun => HumanActionKind::Rerun,
            ActionArg::LockDimensions => HumanActionKind::LockDimensions,
            ActionArg::ForceAccept => HumanActionKind::ForceAccept,
        }
    }
}

/// Prepare a HITL action document.
///
/// The document is written under `<state_dir>/hitl/<task>.json`; the
/// service hosting the run reads it and delivers the action to the waiting
/// pipeline. Delivery across processes is the host's concern, not this
/// binary's.
#[derive(Debug, Args)]
pub struct HitlArgs {
    /// Task the action applies to.
    pub task_id: String,

    /// What the pipeline should do.
    #[arg(long, value_enum)]
    pub action: ActionArg,

    /// Dimensions to lock, as wire ids (L1..L5).
    #[arg(long, value_delimiter = ',')]
    pub lock: Vec<String>,

    /// Dimensions to rerun, as wire ids (L1..L5).
    #[arg(long, value_delimiter = ',')]
    pub rerun: Vec<String>,

    /// Winning candidate for force-accept.
    #[arg(long)]
    pub candidate: Option<String>,

    /// Free-form justification, kept for the audit trail.
    #[arg(long)]
    pub reason: Option<String>,
}

pub async fn execute(
    args: HitlArgs,
    config_path: Option<&std::path::Path>,
    json: bool,
) -> Result<()> {
    let config = super::load_config(config_path)?;

    let action = HumanAction {
        action: args.action.into(),
        locked_dimensions: parse_dimensions(&args.lock)?,
        rerun_dimensions: parse_dimensions(&args.rerun)?,
        candidate_id: args.candidate,
        reason: args.reason,
    };

    let dir = config.state_dir.join("hitl");
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(format!(
        "{}.json",
        crate::adapters::checkpoint::sanitize_task_id(&args.task_id)
    ));
    tokio::fs::write(&path, serde_json::to_vec_pretty(&action)?).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "task_id": args.task_id, "path": path, "action": action })
        );
    } else {
        println!("HITL action written to {}", path.display());
    }
    Ok(())
}

fn parse_dimensions(ids: &[String]) -> Result<Vec<Dimension>> {
    ids.iter()
        .map(|id| {
            Dimension::from_id(id).with_context(|| format!("unknown dimension id: {id}"))
        })
        .collect()
}
