pub mod hitl;
pub mod run;
pub mod runs;

use anyhow::Result;
use std::path::Path;

use crate::domain::models::PipelineConfig;
use crate::infrastructure::ConfigLoader;

/// Resolve the effective configuration for a command.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
