//! Model-backed field extraction.
//!
//! The extractor never fails: provider errors and unusable replies degrade to a result with
//! every schema field absent.

use crate::models::{all_absent, ExtractionResult, Schema};
use providers::{ChatRequest, LlmProvider};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a JSON data extractor.";

#[async_trait::async_trait]
pub trait ModelExtractor: Send + Sync {
    /// Always covers exactly the keys of `schema`.
    async fn extract_with_llm(&self, schema: &Schema, document_text: &str) -> ExtractionResult;
}

pub struct LlmExtractor {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl LlmExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

pub fn build_prompt(schema: &Schema, document_text: &str) -> Result<String, serde_json::Error> {
    let schema_json = serde_json::to_string_pretty(schema)?;
    Ok(format!(
        "You are a highly accurate data extraction assistant.\n\
         Extract the requested information from the document text below.\n\n\
         The output MUST be a valid JSON object with exactly the keys of the schema.\n\
         If a piece of information is not found, return null for that field.\n\n\
         SCHEMA (with descriptions):\n{schema_json}\n\n\
         DOCUMENT TEXT:\n---\n{document_text}\n---\n\n\
         EXTRACTED JSON:"
    ))
}

/// Maps a model reply onto the schema. Fails only when the reply is not a JSON object.
pub fn parse_reply(schema: &Schema, raw: &str) -> Result<ExtractionResult, String> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| e.to_string())?;
    let Value::Object(mut fields) = value else {
        return Err("model reply is not a JSON object".to_string());
    };
    Ok(schema
        .keys()
        .map(|k| (k.clone(), fields.remove(k).and_then(value_text)))
        .collect())
}

fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[async_trait::async_trait]
impl ModelExtractor for LlmExtractor {
    async fn extract_with_llm(&self, schema: &Schema, document_text: &str) -> ExtractionResult {
        let user = match build_prompt(schema, document_text) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to render extraction prompt");
                return all_absent(schema);
            }
        };
        let request = ChatRequest {
            system: SYSTEM_PROMPT.to_string(),
            user,
            temperature: self.temperature,
            json_mode: true,
        };

        let raw = match self.provider.complete(&request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "llm call failed; returning empty result");
                return all_absent(schema);
            }
        };

        match parse_reply(schema, &raw) {
            Ok(result) => {
                debug!(
                    found = result.values().filter(|v| v.is_some()).count(),
                    fields = schema.len(),
                    "llm extraction parsed"
                );
                result
            }
            Err(e) => {
                warn!(error = %e, "llm reply unusable; returning empty result");
                all_absent(schema)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use providers::noop::NoopProvider;
    use providers::ProviderError;
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedProvider {
        reply: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for CannedProvider {
        async fn complete(&self, request: &ChatRequest) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    fn schema() -> Schema {
        [
            ("total".to_string(), json!("Total amount due")),
            ("date".to_string(), json!("Issue date")),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn prompt_carries_schema_descriptions_and_text() {
        let prompt = build_prompt(&schema(), "Total Due: 1234.56").unwrap();
        assert!(prompt.contains("\"total\": \"Total amount due\""));
        assert!(prompt.contains("---\nTotal Due: 1234.56\n---"));
    }

    #[test]
    fn reply_is_projected_onto_schema() {
        let parsed = parse_reply(
            &schema(),
            r#"{"total": 1234.56, "extra": "dropped", "date": null}"#,
        )
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["total"].as_deref(), Some("1234.56"));
        assert_eq!(parsed["date"], None);
    }

    #[test]
    fn blank_strings_count_as_absent() {
        let parsed = parse_reply(&schema(), r#"{"total": "  ", "date": "2024-01-10"}"#).unwrap();
        assert_eq!(parsed["total"], None);
        assert_eq!(parsed["date"].as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn non_object_reply_is_rejected() {
        assert!(parse_reply(&schema(), "[1,2]").is_err());
        assert!(parse_reply(&schema(), "sure! here is the JSON").is_err());
    }

    #[tokio::test]
    async fn provider_is_called_in_json_mode() {
        let provider = Arc::new(CannedProvider::new(
            r#"{"total": "1234.56", "date": "2024-01-10"}"#,
        ));
        let extractor = LlmExtractor::new(provider.clone());

        let result = extractor.extract_with_llm(&schema(), "doc").await;
        assert_eq!(result["total"].as_deref(), Some("1234.56"));
        assert_eq!(result["date"].as_deref(), Some("2024-01-10"));

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].json_mode);
        assert_eq!(seen[0].temperature, 0.0);
        assert_eq!(seen[0].system, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn failures_degrade_to_all_absent() {
        let extractor = LlmExtractor::new(Arc::new(NoopProvider));
        let result = extractor.extract_with_llm(&schema(), "doc").await;
        assert_eq!(result, all_absent(&schema()));

        let extractor = LlmExtractor::new(Arc::new(CannedProvider::new("not json")));
        let result = extractor.extract_with_llm(&schema(), "doc").await;
        assert_eq!(result, all_absent(&schema()));
    }
}
