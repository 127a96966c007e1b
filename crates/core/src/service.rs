use crate::config::AppConfig;
use crate::engine::HybridExtractor;
use crate::llm::LlmExtractor;
use anyhow::Context;
use providers::noop::NoopProvider;
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::{LlmProvider, ProviderRegistry};
use std::sync::Arc;
use storage::SqliteRuleStore;
use tracing::{info, warn};

pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    let mut reg = ProviderRegistry::new().with_llm("noop", Arc::new(NoopProvider));

    if let Some(key) = std::env::var_os("OPENAI_API_KEY") {
        let base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .unwrap_or_else(|| config.llm.base_url.clone());
        let provider = OpenAiProvider::new(OpenAiConfig {
            api_key: key.to_string_lossy().into_owned(),
            base_url,
            chat_model: config.llm.model.clone(),
        });
        reg = reg.with_llm("openai", Arc::new(provider));
    }

    reg.set_preferred_llm(&config.llm.provider)
}

/// Opens the knowledge base and wires the configured model behind the engine.
///
/// An unavailable provider falls back to the no-op one: rules still apply, escalations
/// return empty results.
pub async fn open_engine(config: &AppConfig) -> anyhow::Result<HybridExtractor> {
    let store = SqliteRuleStore::open(&config.database.path)
        .await
        .with_context(|| format!("open knowledge base at {}", config.database.path))?;

    let registry = build_registry(config);
    let provider: Arc<dyn LlmProvider> = match registry.llm(None) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "llm provider unavailable; running with rules only");
            Arc::new(NoopProvider)
        }
    };
    info!(
        provider = %config.llm.provider,
        model = %config.llm.model,
        db = %config.database.path,
        "extraction engine ready"
    );

    let model = LlmExtractor::new(provider).with_temperature(config.llm.temperature);
    Ok(HybridExtractor::new(Arc::new(store), Arc::new(model)))
}
