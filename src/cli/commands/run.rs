use anyhow::{Context, Result};
use clap::Args;
use uuid::Uuid;

use crate::domain::models::{PipelineEvent, PipelineOutput, Task};
use crate::infrastructure::setup;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// What to depict, e.g. "crane over pines at dusk".
    pub subject: String,

    /// Tradition key, e.g. "chinese_ink". Unknown keys use the default
    /// weight profile.
    #[arg(long, default_value = "default")]
    pub tradition: String,

    /// Task id; generated when omitted.
    #[arg(long)]
    pub task_id: Option<String>,

    /// Seed base for reproducible candidate generation.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override the configured round ceiling.
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Print pipeline events as they happen instead of only the result.
    #[arg(long)]
    pub follow: bool,
}

pub async fn execute(
    args: RunArgs,
    config_path: Option<&std::path::Path>,
    json: bool,
) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(seed) = args.seed {
        config.draft.seed_base = seed;
    }
    if let Some(max_rounds) = args.max_rounds {
        config.decision.max_rounds = max_rounds;
    }

    let orchestrator = setup::build_orchestrator(config)?;
    let task = Task::new(
        args.task_id
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        args.subject,
        args.tradition,
    );

    let output = if args.follow {
        let (mut events, handle) = orchestrator.run_streaming(task);
        while let Some(event) = events.recv().await {
            print_event(&event, json);
        }
        handle.await.context("pipeline task panicked")?
    } else {
        orchestrator.run(task).await
    };

    print_output(&output, json)?;
    Ok(())
}

fn print_event(event: &PipelineEvent, json: bool) {
    if json {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
        return;
    }
    match event {
        PipelineEvent::StageStarted { stage, round, .. } => {
            println!("[round {round}] {stage} started");
        }
        PipelineEvent::StageCompleted {
            stage,
            round,
            success,
            ..
        } => {
            let verdict = if *success { "ok" } else { "failed" };
            println!("[round {round}] {stage} {verdict}");
        }
        PipelineEvent::DecisionMade {
            round,
            action,
            reason,
            ..
        } => {
            println!("[round {round}] decision: {action:?} ({reason})");
        }
        PipelineEvent::HumanRequired { round, .. } => {
            println!("[round {round}] waiting for human input");
        }
        PipelineEvent::HumanReceived { round, action, .. } => match action {
            Some(action) => println!("[round {round}] human action: {action:?}"),
            None => println!("[round {round}] human wait timed out"),
        },
        PipelineEvent::PipelineCompleted {
            final_decision,
            total_rounds,
            ..
        } => {
            println!("pipeline completed: {final_decision:?} after {total_rounds} round(s)");
        }
        PipelineEvent::PipelineFailed { error, .. } => {
            println!("pipeline failed: {error}");
        }
    }
}

fn print_output(output: &PipelineOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    if output.success {
        println!("Run {} completed.", output.task_id);
    } else {
        println!(
            "Run {} failed: {}",
            output.task_id,
            output.error.as_deref().unwrap_or("unknown error")
        );
    }
    if let Some(decision) = output.final_decision {
        println!("  Decision: {decision:?}");
    }
    if let Some(candidate_id) = &output.best_candidate_id {
        println!("  Best candidate: {candidate_id}");
    }
    if let Some(candidate) = &output.best_candidate {
        println!("  Artifact: {}", candidate.artifact_location);
    }
    println!("  Rounds: {}", output.total_rounds);
    println!("  Cost: ${:.4}", output.total_cost);
    println!("  Latency: {} ms", output.total_latency_ms);
    Ok(())
}
