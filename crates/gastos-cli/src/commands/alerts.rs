//! Alert command implementation

use std::path::Path;

use anyhow::Result;
use chrono::Utc;

use gastos_core::EngineConfig;

use super::build_engine;

/// Run one full pass and print the active alert set, most urgent first
pub async fn cmd_alerts(config: EngineConfig, file: &Path) -> Result<()> {
    let (engine, _store) = build_engine(config, file)?;
    engine.full_pass(Utc::now()).await?;

    let alerts = engine.active_alerts();
    if alerts.is_empty() {
        println!("✅ No active alerts");
        return Ok(());
    }

    println!("🚨 {} active alert(s)\n", alerts.len());
    for alert in &alerts {
        println!(
            "  #{} [{}] {} ({})",
            alert.id, alert.severity, alert.message, alert.alert_type
        );
        if let Some(suggestion) = &alert.suggestion {
            println!("     💡 {}", suggestion);
        }
    }

    let interventions = engine.interventions();
    if !interventions.is_empty() {
        println!("\n⚡ Interventions:");
        for intervention in &interventions {
            println!(
                "  #{} {} — {}",
                intervention.id, intervention.action, intervention.triggering_pattern
            );
        }
    }

    Ok(())
}
