//! Inference backend command implementations

use anyhow::Result;

use gastos_core::ai::parsing::parse_batch_categorization;
use gastos_core::{AiClient, AiGateway, CategoryCatalog, EngineConfig, InferenceBackend};

/// Test connectivity to the inference endpoint and run a sample
/// categorization through the gateway
pub async fn cmd_ai_test(config: EngineConfig, description: Option<&str>) -> Result<()> {
    let client = AiClient::from_env().unwrap_or_else(|| {
        AiClient::http(&config.inference.endpoint, &config.inference.model)
    });

    println!("🔍 Testing inference backend...\n");
    println!("  endpoint: {}", client.host());
    println!("  model:    {}\n", client.model());

    print!("Checking availability... ");
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!(
            "\n⚠ Could not reach {}. Start an Ollama-compatible server and pull '{}'.",
            client.host(),
            client.model()
        );
        return Ok(());
    }

    let sample = description.unwrap_or("JOLLIBEE KATIPUNAN QC");
    let catalog = CategoryCatalog::builtin();
    let vocabulary = catalog.names().join(", ");

    let prompt = format!(
        "Classify each transaction into exactly one of these categories: {vocabulary}.\n\
         Transactions:\n\
         1. \"{sample}\" | amount: -350.00 | date: 2026-08-01\n\
         Respond with only a JSON object:\n\
         {{\"categories\": [..], \"confidence\": [..], \"subcategories\": [..], \"reasoning\": [..]}}\n\
         Each array must have exactly 1 entries, aligned to the input order. \
         Confidence is a number between 0 and 1. Use null for unknown subcategories."
    );

    println!("\n📋 Classifying \"{}\"...", sample);
    let gateway = AiGateway::new(client, config.inference);
    match gateway.generate(&prompt).await {
        Ok(response) => match parse_batch_categorization(&response, 1) {
            Ok(parsed) => {
                println!(
                    "  → {} ({:.2})",
                    parsed.categories[0], parsed.confidence[0]
                );
            }
            Err(e) => println!("  ❌ Unparseable response: {}", e),
        },
        Err(e) => println!("  ❌ Error: {}", e),
    }

    Ok(())
}
