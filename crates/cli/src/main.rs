use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::input;
use extractor_core::config;
use extractor_core::config::AppConfig;
use extractor_core::service;
use std::path::PathBuf;
use storage::{RuleStore, SqliteRuleStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract {
            label,
            schema,
            pdf,
            text,
        } => run_extract(cfg, &label, &schema, pdf, text).await,
        Commands::Rules { label } => run_rules(cfg, label.as_deref()).await,
    }
}

#[derive(Parser)]
#[command(name = "docextract")]
#[command(about = "Schema-driven document field extraction with learned rules", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract schema fields from a single-page document
    Extract {
        /// Document type identifier; rules are learned per label
        #[arg(long)]
        label: String,
        /// Schema as inline JSON object or @file
        #[arg(long)]
        schema: String,
        /// Single-page PDF to read (first page only)
        #[arg(long, conflicts_with = "text", required_unless_present = "text")]
        pdf: Option<PathBuf>,
        /// Plain text file to read
        #[arg(long)]
        text: Option<PathBuf>,
    },
    /// Show learned rules
    Rules {
        /// Only this label; otherwise list every label
        #[arg(long)]
        label: Option<String>,
    },
}

async fn run_extract(
    cfg: AppConfig,
    label: &str,
    schema_arg: &str,
    pdf: Option<PathBuf>,
    text: Option<PathBuf>,
) -> Result<()> {
    let schema = input::read_schema_arg(schema_arg)?;
    let document_text = input::read_document(pdf.as_deref(), text.as_deref())?;

    let engine = service::open_engine(&cfg).await?;
    let outcome = engine.extract(label, &schema, &document_text).await;
    engine.close().await;

    println!("{}", serde_json::to_string_pretty(&outcome?)?);
    Ok(())
}

async fn run_rules(cfg: AppConfig, label: Option<&str>) -> Result<()> {
    let store = SqliteRuleStore::open(&cfg.database.path).await?;
    let output = match label {
        Some(l) => serde_json::json!({
            "label": l,
            "rules": store.lookup(l).await?,
        }),
        None => {
            let records = store.list().await?;
            serde_json::Value::Array(
                records
                    .into_iter()
                    .map(|r| {
                        serde_json::json!({
                            "label": r.label,
                            "rules": r.rules.len(),
                            "updated_at": r.updated_at,
                        })
                    })
                    .collect(),
            )
        }
    };
    store.close().await;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
