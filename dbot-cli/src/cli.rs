//! CLI parser and config loading.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dbot_telegram::TelegramConfig;

pub const DEFAULT_SAVE_INTERVAL_SECS: u64 = 60;

#[derive(Parser)]
#[command(name = "dbot")]
#[command(about = "Telegram Bot CLI: run, validate", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
        /// Directory holding the persisted JSON files (overrides PERSISTENCE_DIR).
        #[arg(short, long)]
        persistence_dir: Option<PathBuf>,
        /// Seconds between persistence checkpoints while running; 0 saves only on shutdown.
        #[arg(long, default_value_t = DEFAULT_SAVE_INTERVAL_SECS)]
        save_interval: u64,
    },
    /// Check that the persisted JSON files in a directory load.
    Validate {
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

/// Load TelegramConfig from environment. Arguments that are given override BOT_TOKEN and PERSISTENCE_DIR.
pub fn load_config(token: Option<String>, persistence_dir: Option<PathBuf>) -> Result<TelegramConfig> {
    let mut config = match token {
        Some(token) => {
            let mut config = TelegramConfig::from_env()
                .unwrap_or_else(|_| TelegramConfig::with_token(token.clone()));
            config.bot_token = token;
            config
        }
        None => TelegramConfig::from_env()?,
    };
    if let Some(dir) = persistence_dir {
        config.persistence_dir = dir;
    }
    Ok(config)
}

/// Persistence directory for `validate`: the argument, else PERSISTENCE_DIR, else the default.
pub fn persistence_dir_or_default(dir: Option<PathBuf>) -> PathBuf {
    dir.or_else(|| std::env::var("PERSISTENCE_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(dbot_telegram::DEFAULT_PERSISTENCE_DIR))
}
