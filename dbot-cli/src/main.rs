//! dbot CLI: run the Telegram bot with file-backed persistence, or validate persisted data.
//! Config from env (.env is loaded first) and optional CLI args.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use dbot_cli::{
    build_chain, checkpoint, load_config, load_persistence, persistence_dir_or_default,
    save_periodically, Cli, Commands,
};
use dbot_core::init_tracing;
use dbot_telegram::run_dispatcher;
use storage::Persistence;
use tokio::sync::Mutex;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            token,
            persistence_dir,
            save_interval,
        } => handle_run(token, persistence_dir, save_interval).await,
        Commands::Validate { dir } => handle_validate(&persistence_dir_or_default(dir)),
    }
}

/// Loads persistence, runs the dispatcher until Ctrl-C, then writes persistence back.
/// With a non-zero `save_interval` (seconds) persistence is also checkpointed while running.
async fn handle_run(
    token: Option<String>,
    persistence_dir: Option<PathBuf>,
    save_interval: u64,
) -> Result<()> {
    let config = load_config(token, persistence_dir)?;
    init_tracing(config.log_file.as_deref())?;

    info!(
        persistence_dir = %config.persistence_dir.display(),
        api_url = ?config.telegram_api_url,
        save_interval,
        "Starting bot"
    );

    let persistence = Arc::new(Mutex::new(load_persistence(&config.persistence_dir)?));
    let chain = build_chain(persistence.clone())?;
    let bot = config.build_bot()?;

    let saver = (save_interval > 0).then(|| {
        tokio::spawn(save_periodically(
            persistence.clone(),
            config.persistence_dir.clone(),
            Duration::from_secs(save_interval),
        ))
    });

    let result = run_dispatcher(bot, chain).await;

    if let Some(saver) = saver {
        saver.abort();
    }
    checkpoint(&persistence, &config.persistence_dir).await?;
    info!("Bot stopped, persistence saved");
    result
}

/// Prints what the persisted files in `dir` contain, or the error naming the bad payload.
fn handle_validate(dir: &Path) -> Result<()> {
    let mut persistence = load_persistence(dir)?;

    println!("Persistence in {} is valid.", dir.display());
    println!("  users:         {}", persistence.get_user_data().len());
    println!("  chats:         {}", persistence.get_chat_data().len());
    println!("  bot data keys: {}", persistence.get_bot_data().len());
    println!(
        "  callback data: {}",
        persistence
            .get_callback_data()
            .map_or(0, |data| data.entries.len())
    );
    Ok(())
}
