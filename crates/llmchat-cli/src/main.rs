use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use llmchat::chat::ChatClient;
use llmchat::providers::openai::OpenAiCompatibleProvider;
use llmchat::settings::{Settings, MODEL_OPTIONS};
use llmchat::store::ConversationStore;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;
mod session;

use session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// API key (can also be set via LLMCHAT_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Model to use (can also be set via LLMCHAT_MODEL environment variable)
    #[arg(short, long)]
    model: Option<String>,

    /// Wait for the whole reply instead of streaming it
    #[arg(long)]
    no_stream: bool,

    /// Where conversations are kept between runs
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Print the known models and exit
    #[arg(long)]
    list_models: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.list_models {
        for option in MODEL_OPTIONS {
            println!(
                "{:<40} {} {}",
                option.value,
                option.label,
                style(format!("(max {} tokens)", option.max_tokens)).dim()
            );
        }
        return Ok(());
    }

    let settings = apply_overrides(Settings::new()?, &cli);
    settings.validate()?;
    if settings.api_key.is_empty() {
        anyhow::bail!("API key must be provided via --api-key or LLMCHAT_API_KEY");
    }

    let state_file = match cli.state_file {
        Some(path) => path,
        None => default_state_file()?,
    };
    let store = load_store(&state_file)?;

    let provider = OpenAiCompatibleProvider::new(settings.host.clone())?;
    let mut session = Session::new(
        ChatClient::new(Box::new(provider)),
        store,
        settings,
        state_file,
    );
    session.start().await
}

fn apply_overrides(mut settings: Settings, cli: &Cli) -> Settings {
    if let Some(api_key) = &cli.api_key {
        settings.api_key = api_key.clone();
    }
    if let Some(model) = &cli.model {
        settings.model = model.clone();
    }
    if cli.no_stream {
        settings.stream = false;
    }
    settings
}

fn default_state_file() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".config").join("llmchat").join("conversations.json"))
}

fn load_store(path: &PathBuf) -> Result<ConversationStore> {
    if !path.exists() {
        return Ok(ConversationStore::new());
    }
    ConversationStore::load(path)
        .with_context(|| format!("failed to read conversations from {}", path.display()))
}
