// s3-rewind/src/restore/mod.rs
mod logic; // Run orchestration: checks, prompts, plan, copy
pub(crate) mod plan; // Concurrent history fetch + version selection
pub(crate) mod copy; // Fail-fast concurrent copy execution
pub(crate) mod report; // Run counters

use anyhow::Result;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::prompt::Prompter;
use crate::store::ObjectStore;
pub use report::RunReport;

/// Public entry point for the restore process.
pub async fn run_restore_flow(
    app_config: &AppConfig,
    store: Arc<dyn ObjectStore>,
    prompter: &dyn Prompter,
) -> Result<RunReport> {
    logic::perform_restore_orchestration(store, prompter, &app_config.restore).await
}
