use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL (`sqlite:...`) or a plain file path.
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Registered provider name: `openai` or `noop`.
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

/// Loads `path` (or `config/default` when present), layered over built-in defaults and
/// `DOCEXTRACT_*` environment variables, e.g. `DOCEXTRACT_DATABASE__PATH`.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder()
        .set_default("database.path", "knowledge_base.db")?
        .set_default("llm.provider", "openai")?
        .set_default("llm.model", "gpt-4o-mini")?
        .set_default("llm.base_url", "https://api.openai.com")?
        .set_default("llm.temperature", 0.0)?;
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("DOCEXTRACT")
            .prefix_separator("_")
            .separator("__"),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("extract.toml");
        std::fs::write(
            &path,
            "[database]\npath = \"sqlite::memory:\"\n\n[llm]\nprovider = \"noop\"\n",
        )
        .unwrap();

        let cfg = load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(cfg.database.path, "sqlite::memory:");
        assert_eq!(cfg.llm.provider, "noop");
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.llm.temperature, 0.0);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load(Some("/definitely/not/here.toml")).is_err());
    }
}
