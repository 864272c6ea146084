//! CLI argument definitions for the Folio terminal front end.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use folio_core::types::{Experience, Mode, Theme};

/// Folio: the portfolio chat assistant in your terminal.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the durable key/value store.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Keep all state in memory for this run.
    #[arg(long = "ephemeral", global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open an interactive chat session.
    Chat {
        /// Conversation style; asked interactively when omitted.
        #[arg(short = 'm', long = "mode")]
        mode: Option<Mode>,
    },
    /// Check the conversation chains for structural defects.
    Validate,
    /// Print the suggestions the resolver picks for one reply.
    Suggest {
        #[arg(short = 'm', long = "mode")]
        mode: Mode,
        /// Text of the chip that was clicked.
        #[arg(long = "chip", conflicts_with = "text")]
        chip: Option<String>,
        /// Text the visitor typed.
        #[arg(long = "text")]
        text: Option<String>,
    },
    /// Show or update UI preferences.
    Prefs {
        #[arg(long = "theme")]
        theme: Option<Theme>,
        #[arg(long = "experience")]
        experience: Option<Experience>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > FOLIO_CONFIG env var > ~/.folio/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("FOLIO_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory path.
    ///
    /// Priority: --data-dir flag > config file value (with `~` expanded).
    pub fn resolve_data_dir(&self, config_data_dir: &str) -> PathBuf {
        match self.data_dir {
            Some(ref p) => p.clone(),
            None => expand_home(config_data_dir),
        }
    }

    /// Resolve the log filter.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_filter(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        std::env::var("RUST_LOG").unwrap_or_else(|_| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    expand_home("~/.folio/config.toml")
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(path)
    }
}
