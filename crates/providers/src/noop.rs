use crate::{ChatRequest, LlmProvider, ProviderError};

/// Stand-in used when no model is configured; every completion fails.
#[derive(Debug, Default)]
pub struct NoopProvider;

#[async_trait::async_trait]
impl LlmProvider for NoopProvider {
    async fn complete(&self, _request: &ChatRequest) -> Result<String, ProviderError> {
        Err(ProviderError::NotImplemented)
    }
}
