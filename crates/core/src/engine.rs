//! Hybrid extraction: learned rules first, the model only when a rule misses.

use crate::error::ExtractError;
use crate::llm::ModelExtractor;
use crate::models::{project, ExtractionResult, RuleSet, Schema};
use crate::rules;
use std::sync::Arc;
use storage::RuleStore;
use tracing::{debug, info};

/// Orchestrates lookup, local extraction, escalation and learning for one call at a time.
///
/// The store is shared; concurrent calls for the same label each write back the rule set they
/// read plus what they learned, so the last writer wins.
pub struct HybridExtractor {
    store: Arc<dyn RuleStore>,
    model: Arc<dyn ModelExtractor>,
}

impl HybridExtractor {
    pub fn new(store: Arc<dyn RuleStore>, model: Arc<dyn ModelExtractor>) -> Self {
        Self { store, model }
    }

    pub fn store(&self) -> &Arc<dyn RuleStore> {
        &self.store
    }

    pub async fn extract(
        &self,
        label: &str,
        schema: &Schema,
        document_text: &str,
    ) -> Result<ExtractionResult, ExtractError> {
        validate(label, schema)?;
        info!(label, fields = schema.len(), "starting extraction");

        let known = match self.store.lookup(label).await? {
            Some(stored) => {
                debug!(label, rules = stored.len(), "knowledge base hit");
                let outcome = rules::apply_rules(schema, document_text, &stored);
                if outcome.complete {
                    info!(label, "local extraction succeeded");
                    return Ok(outcome.values);
                }
                info!(
                    label,
                    missing = ?outcome.missing(),
                    "local extraction incomplete; escalating to llm"
                );
                stored
            }
            None => {
                info!(label, "new label; escalating to llm");
                RuleSet::new()
            }
        };

        let model_output = project(
            schema,
            self.model.extract_with_llm(schema, document_text).await,
        );

        let learned = rules::learn_rules(known, &model_output);
        self.store.upsert(label, &learned).await?;
        info!(label, rules = learned.len(), "rules updated");

        Ok(model_output)
    }

    /// Ends the store lifecycle; the extractor must not be used afterwards.
    pub async fn close(&self) {
        self.store.close().await;
    }
}

fn validate(label: &str, schema: &Schema) -> Result<(), ExtractError> {
    if label.trim().is_empty() {
        return Err(ExtractError::InvalidInput("label must not be empty".into()));
    }
    if schema.is_empty() {
        return Err(ExtractError::InvalidInput(
            "schema must contain at least one field".into(),
        ));
    }
    Ok(())
}
