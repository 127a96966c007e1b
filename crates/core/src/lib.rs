//! Core library: learned-rule extraction with language-model fallback.

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod llm;
pub mod models;
pub mod rules;
pub mod service;

pub use engine::HybridExtractor;
pub use error::ExtractError;
pub use llm::{LlmExtractor, ModelExtractor};
pub use models::{ExtractionResult, RuleSet, Schema};
