//! Folio application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialise tracing
//! 3. Open the durable key/value store
//! 4. Run the requested command (chat, validate, suggest, prefs)

mod cli;
mod repl;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use folio_chat::{
    resolve, ChainSet, ChatOrchestrator, HttpCompletionClient, PromptBuilder, RateLimiter,
    ResolveInput, UserAction,
};
use folio_core::config::FolioConfig;
use folio_core::preferences::Preferences;
use folio_core::storage::{FileStore, KeyValueStore, MemoryStore};
use folio_core::types::Mode;

use crate::cli::{CliArgs, Command};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

fn open_store(args: &CliArgs, config: &FolioConfig) -> Arc<dyn KeyValueStore> {
    if args.ephemeral {
        tracing::info!("Using in-memory store");
        return Arc::new(MemoryStore::new());
    }
    let path = args
        .resolve_data_dir(&config.general.data_dir)
        .join("storage.json");
    tracing::info!(path = %path.display(), "Using file store");
    Arc::new(FileStore::open(path))
}

fn load_chains(config: &FolioConfig) -> AppResult<ChainSet> {
    let path = config.chat.chains_path.as_deref().map(Path::new);
    Ok(ChainSet::load_or_builtin(path)?)
}

async fn run_chat(
    config: &FolioConfig,
    store: Arc<dyn KeyValueStore>,
    mode: Option<Mode>,
) -> AppResult<()> {
    let mut chat_config = config.chat.clone();
    if mode.is_some() {
        chat_config.default_mode = mode;
    }

    let prefs = Preferences::load(store.as_ref())?;
    let chains = Arc::new(load_chains(config)?);
    let completion = Arc::new(HttpCompletionClient::from_config(&config.llm)?);
    let limiter = RateLimiter::new(Arc::clone(&store), &config.rate_limit);
    let prompts = PromptBuilder::from_config(&chat_config)?;

    let orch = ChatOrchestrator::new(&chat_config, chains, completion, limiter, prompts);
    repl::run(&orch, prefs).await?;
    Ok(())
}

fn run_validate(config: &FolioConfig) -> AppResult<bool> {
    let chains = match load_chains(config) {
        Ok(chains) => chains,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(false);
        }
    };

    let defects = chains.validate();
    for (mode, defect) in &defects {
        eprintln!("{}: {}", mode, defect);
    }
    for mode in Mode::ALL {
        let chain = chains.for_mode(mode);
        println!(
            "{}: {} nodes, {} entries, {} topic rules",
            mode,
            chain.graph().len(),
            chain.graph().entries().len(),
            chain.classifier().len()
        );
    }
    Ok(defects.is_empty())
}

fn run_suggest(
    config: &FolioConfig,
    mode: Mode,
    chip: Option<&str>,
    text: Option<&str>,
) -> AppResult<()> {
    let chains = load_chains(config)?;
    let last_action = match (chip, text) {
        (Some(chip), _) => Some(UserAction::Chip(chip)),
        (None, Some(text)) => Some(UserAction::Typed(text)),
        (None, None) => None,
    };
    let input = ResolveInput {
        has_messages: last_action.is_some(),
        awaiting_reply: false,
        last_action,
    };
    for suggestion in resolve(chains.for_mode(mode), &input) {
        println!("{}", suggestion);
    }
    Ok(())
}

fn run_prefs(
    store: &dyn KeyValueStore,
    theme: Option<folio_core::types::Theme>,
    experience: Option<folio_core::types::Experience>,
) -> AppResult<()> {
    let mut prefs = Preferences::load(store)?;
    if theme.is_some() || experience.is_some() {
        prefs.theme = theme.unwrap_or(prefs.theme);
        prefs.experience = experience.unwrap_or(prefs.experience);
        prefs.save(store)?;
    }
    println!("{}", serde_json::to_string_pretty(&prefs)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = FolioConfig::load_or_default(&config_file);

    // Tracing.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(args.resolve_log_filter(&config.general.log_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    tracing::info!("Starting Folio v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration resolved");

    let result = match args.command {
        Command::Chat { mode } => {
            let store = open_store(&args, &config);
            run_chat(&config, store, mode).await.map(|_| true)
        }
        Command::Validate => run_validate(&config),
        Command::Suggest {
            mode,
            ref chip,
            ref text,
        } => run_suggest(&config, mode, chip.as_deref(), text.as_deref()).map(|_| true),
        Command::Prefs { theme, experience } => {
            let store = open_store(&args, &config);
            run_prefs(store.as_ref(), theme, experience).map(|_| true)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
