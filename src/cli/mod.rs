//! Operator CLI: a thin layer over the library.
//!
//! The platform's REST front-end is a separate service; this binary exists
//! for running one pipeline locally, inspecting the runs index, and
//! preparing HITL action documents.

pub mod commands;

use clap::{Parser, Subcommand};

/// Evaluation pipeline for culturally-grounded artwork generation.
#[derive(Debug, Parser)]
#[command(name = "atelier", version, about, long_about = None)]
pub struct Cli {
    /// Emit machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a config file (defaults to .atelier/config.yaml merging).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one pipeline task to completion.
    Run(commands::run::RunArgs),
    /// List the runs index.
    Runs(commands::runs::RunsArgs),
    /// Prepare a human-in-the-loop action document for a task.
    Hitl(commands::hitl::HitlArgs),
}

/// Report a command failure and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        let body = serde_json::json!({ "error": format!("{err:#}") });
        eprintln!("{body}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
