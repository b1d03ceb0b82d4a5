//! Scheduler command implementation

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use gastos_core::{EngineConfig, Scheduler};

use super::build_engine;

/// Run the background scheduler until Ctrl-C
pub async fn cmd_run(config: EngineConfig, file: &Path) -> Result<()> {
    let full_secs = config.scheduler.full_pass_interval_secs;
    let fast_secs = config.scheduler.fast_path_interval_secs;
    let (engine, _store) = build_engine(config, file)?;

    println!(
        "⏱  Scheduler running: full pass every {}s, fast path every {}s. Ctrl-C to stop.",
        full_secs, fast_secs
    );

    let scheduler = Scheduler::start(Arc::clone(&engine));
    tokio::signal::ctrl_c().await?;
    println!("\nStopping...");
    scheduler.stop().await;

    let alerts = engine.active_alerts();
    println!(
        "Done: {} active alert(s), {} intervention(s) recorded.",
        alerts.len(),
        engine.interventions().len()
    );

    Ok(())
}
