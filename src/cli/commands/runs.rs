use anyhow::Result;
use clap::Args;
use comfy_table::{presets, Cell, ContentArrangement, Table};

use crate::adapters::FsCheckpointStore;
use crate::domain::models::RunSummary;
use crate::domain::ports::CheckpointStore;

#[derive(Debug, Args)]
pub struct RunsArgs {
    /// Show at most this many rows, newest first.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

pub async fn execute(
    args: RunsArgs,
    config_path: Option<&std::path::Path>,
    json: bool,
) -> Result<()> {
    let config = super::load_config(config_path)?;
    let store = FsCheckpointStore::new(&config.state_dir);

    let index = store.load_index().await?;
    let mut rows: Vec<RunSummary> = index.into_values().collect();
    rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    rows.truncate(args.limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No runs found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(["TASK", "STATUS", "DECISION", "COST", "LATENCY", "UPDATED"]);
    for row in &rows {
        table.add_row([
            Cell::new(&row.task_id),
            Cell::new(format!("{:?}", row.status)),
            Cell::new(
                row.decision
                    .map_or_else(|| "-".to_string(), |d| format!("{d:?}")),
            ),
            Cell::new(format!("${:.4}", row.cost)),
            Cell::new(format!("{} ms", row.latency_ms)),
            Cell::new(row.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()),
        ]);
    }
    println!("{} run(s):", rows.len());
    println!("{table}");
    Ok(())
}
