//! Transaction categorization
//!
//! Two-stage flow: a deterministic rule pass always runs, then an optional
//! AI-assisted refinement overwrites rule results only when the model's
//! response is well-formed and positionally complete. No transaction is
//! ever left uncategorized; "Other" is the terminal fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::ai::parsing::parse_batch_categorization;
use crate::ai::AiGateway;
use crate::categories::{CategoryCatalog, MatchKind};
use crate::config::CategorizerConfig;
use crate::models::Transaction;
use crate::store::AnnotationSink;

/// Where a transaction's label came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategorySource {
    Rule,
    Ai,
    Fallback,
}

/// One transaction's categorization result
#[derive(Debug, Clone)]
pub struct Categorization {
    pub transaction_id: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub confidence: f64,
    pub source: CategorySource,
}

/// Counters for one categorization pass
#[derive(Debug, Default, Clone)]
pub struct CategorizationSummary {
    pub processed: usize,
    pub by_rule: usize,
    pub by_ai: usize,
    pub fallback: usize,
    pub sink_failures: usize,
}

/// Hybrid rule/AI categorizer
pub struct Categorizer {
    catalog: Arc<CategoryCatalog>,
    config: CategorizerConfig,
    gateway: Option<AiGateway>,
}

impl Categorizer {
    pub fn new(catalog: Arc<CategoryCatalog>, config: CategorizerConfig) -> Self {
        Self {
            catalog,
            config,
            gateway: None,
        }
    }

    pub fn with_gateway(
        catalog: Arc<CategoryCatalog>,
        config: CategorizerConfig,
        gateway: AiGateway,
    ) -> Self {
        Self {
            catalog,
            config,
            gateway: Some(gateway),
        }
    }

    /// Deterministic rule pass for one transaction
    ///
    /// Identical description+amount always yields the identical label and
    /// confidence; no AI involvement.
    pub fn rule_categorize(&self, tx: &Transaction) -> Categorization {
        let (category, subcategory, mut confidence, source): (_, _, f64, _) =
            match self.catalog.match_description(&tx.raw_description) {
                Some(m) => {
                    let confidence = match m.kind {
                        MatchKind::Rule => 0.8,
                        MatchKind::Keyword => 0.75,
                    };
                    (m.category, m.subcategory, confidence, CategorySource::Rule)
                }
                None => (
                    self.catalog.fallback().to_string(),
                    None,
                    0.6,
                    CategorySource::Fallback,
                ),
            };

        // Large transactions are less likely keyword noise; floor the
        // confidence for anything past the material threshold.
        if tx.magnitude() > self.config.material_amount {
            confidence = confidence.max(0.65);
        }

        Categorization {
            transaction_id: tx.id.clone(),
            category,
            subcategory,
            confidence,
            source,
        }
    }

    /// Categorize a batch: rule pass, AI refinement, annotation write-out
    ///
    /// AI batches are processed sequentially with a fixed inter-batch delay
    /// to stay under the gateway rate limit. Any gateway or parse failure
    /// leaves the rule-pass result standing for that batch.
    pub async fn categorize(
        &self,
        transactions: &[Transaction],
        sink: &dyn AnnotationSink,
    ) -> (Vec<Categorization>, CategorizationSummary) {
        let mut results: Vec<Categorization> =
            transactions.iter().map(|tx| self.rule_categorize(tx)).collect();

        if let Some(gateway) = &self.gateway {
            let batch_size = self.config.batch_size.clamp(1, 50);
            let chunk_count = transactions.len().div_ceil(batch_size);

            for (chunk_idx, chunk) in transactions.chunks(batch_size).enumerate() {
                let offset = chunk_idx * batch_size;
                self.refine_chunk(gateway, chunk, &mut results[offset..offset + chunk.len()])
                    .await;

                if chunk_idx + 1 < chunk_count {
                    tokio::time::sleep(std::time::Duration::from_millis(
                        self.config.inter_batch_delay_ms,
                    ))
                    .await;
                }
            }
        }

        let mut summary = CategorizationSummary {
            processed: results.len(),
            ..Default::default()
        };

        for result in &results {
            match result.source {
                CategorySource::Rule => summary.by_rule += 1,
                CategorySource::Ai => summary.by_ai += 1,
                CategorySource::Fallback => summary.fallback += 1,
            }

            // Best-effort persistence: one failed annotation never blocks
            // the rest of the batch.
            if let Err(e) = sink.save_categorization(
                &result.transaction_id,
                &result.category,
                result.subcategory.as_deref(),
                result.confidence,
            ) {
                warn!(
                    transaction_id = %result.transaction_id,
                    error = %e,
                    "failed to persist categorization"
                );
                summary.sink_failures += 1;
            }
        }

        debug!(
            processed = summary.processed,
            by_rule = summary.by_rule,
            by_ai = summary.by_ai,
            fallback = summary.fallback,
            "categorization pass complete"
        );

        (results, summary)
    }

    /// Ask the model to refine one chunk; mutate `results` only on a
    /// well-formed, positionally complete response
    async fn refine_chunk(
        &self,
        gateway: &AiGateway,
        chunk: &[Transaction],
        results: &mut [Categorization],
    ) {
        let prompt = self.build_prompt(chunk);

        let response = match gateway.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                // Never discard a working fallback: the rule pass stands.
                warn!(error = %e, batch = chunk.len(), "AI refinement unavailable, keeping rule results");
                return;
            }
        };

        let parsed = match parse_batch_categorization(&response, chunk.len()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "rejected AI categorization response");
                return;
            }
        };

        for (i, result) in results.iter_mut().enumerate() {
            let category = &parsed.categories[i];
            // Names outside the fixed vocabulary are ignored per item.
            if !self.catalog.contains(category) {
                debug!(category = %category, "AI proposed unknown category, keeping rule result");
                continue;
            }
            result.category = category.clone();
            result.subcategory = parsed.subcategories.get(i).cloned().flatten();
            result.confidence = parsed.confidence[i];
            result.source = CategorySource::Ai;
        }
    }

    fn build_prompt(&self, chunk: &[Transaction]) -> String {
        let vocabulary = self.catalog.names().join(", ");
        let mut lines = String::new();
        for (i, tx) in chunk.iter().enumerate() {
            lines.push_str(&format!(
                "{}. \"{}\" | amount: {:.2} | date: {}\n",
                i + 1,
                tx.raw_description,
                tx.amount as f64 / 100.0,
                tx.timestamp.format("%Y-%m-%d"),
            ));
        }

        format!(
            "Classify each transaction into exactly one of these categories: {vocab}.\n\
             Transactions:\n{lines}\n\
             Respond with only a JSON object:\n\
             {{\"categories\": [..], \"confidence\": [..], \"subcategories\": [..], \"reasoning\": [..]}}\n\
             Each array must have exactly {n} entries, aligned to the input order. \
             Confidence is a number between 0 and 1. Use null for unknown subcategories.",
            vocab = vocabulary,
            lines = lines,
            n = chunk.len(),
        )
    }
}
