//! Reads and writes the five persistence payloads as files in one directory.
//!
//! `user_data.json`, `chat_data.json`, `bot_data.json`, `callback_data.json` and
//! `conversations.json`. A missing file is an absent payload.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use storage::{DictPersistence, JsonSnapshot, Persistence};
use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};

pub const USER_DATA_FILE: &str = "user_data.json";
pub const CHAT_DATA_FILE: &str = "chat_data.json";
pub const BOT_DATA_FILE: &str = "bot_data.json";
pub const CALLBACK_DATA_FILE: &str = "callback_data.json";
pub const CONVERSATIONS_FILE: &str = "conversations.json";

fn read_optional(dir: &Path, name: &str) -> Result<Option<String>> {
    let path = dir.join(name);
    match fs::read_to_string(&path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Snapshot from the files in `dir`. A missing directory yields an empty snapshot.
pub fn load_snapshot(dir: &Path) -> Result<JsonSnapshot> {
    Ok(JsonSnapshot {
        user_data: read_optional(dir, USER_DATA_FILE)?,
        chat_data: read_optional(dir, CHAT_DATA_FILE)?,
        bot_data: read_optional(dir, BOT_DATA_FILE)?,
        callback_data: read_optional(dir, CALLBACK_DATA_FILE)?,
        conversations: read_optional(dir, CONVERSATIONS_FILE)?,
    })
}

/// Loads and decodes the persistence stored in `dir`.
pub fn load_persistence(dir: &Path) -> Result<DictPersistence> {
    let snapshot = load_snapshot(dir)?;
    let persistence = DictPersistence::from_snapshot(&snapshot)
        .with_context(|| format!("Invalid persistence data in {}", dir.display()))?;
    info!(dir = %dir.display(), "Persistence loaded");
    Ok(persistence)
}

/// Writes every payload of `snapshot` into `dir`, creating it if needed. Absent payloads (`None` or
/// `null`) have their file removed, so the next load sees them as absent again.
///
/// Each file is written to a temporary sibling first and renamed into place.
pub fn save_snapshot(dir: &Path, snapshot: &JsonSnapshot) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let files = [
        (USER_DATA_FILE, &snapshot.user_data),
        (CHAT_DATA_FILE, &snapshot.chat_data),
        (BOT_DATA_FILE, &snapshot.bot_data),
        (CALLBACK_DATA_FILE, &snapshot.callback_data),
        (CONVERSATIONS_FILE, &snapshot.conversations),
    ];
    for (name, contents) in files {
        let path = dir.join(name);
        match contents.as_deref() {
            None | Some("null") => match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to remove {}", path.display()))
                }
            },
            Some(contents) => {
                let tmp = dir.join(format!("{}.tmp", name));
                fs::write(&tmp, contents)
                    .with_context(|| format!("Failed to write {}", tmp.display()))?;
                fs::rename(&tmp, &path)
                    .with_context(|| format!("Failed to replace {}", path.display()))?;
            }
        }
    }
    debug!(dir = %dir.display(), "Snapshot written");
    Ok(())
}

/// Encodes every collection and writes it into `dir`.
pub fn save_persistence(dir: &Path, persistence: &DictPersistence) -> Result<()> {
    save_snapshot(dir, &persistence.to_snapshot()?)?;
    info!(dir = %dir.display(), "Persistence saved");
    Ok(())
}

/// Flushes and encodes under the lock, then writes the files with the lock released.
pub async fn checkpoint(persistence: &Mutex<DictPersistence>, dir: &Path) -> Result<()> {
    let snapshot = {
        let mut store = persistence.lock().await;
        store.flush().context("Flush persistence")?;
        store.to_snapshot()?
    };
    save_snapshot(dir, &snapshot)
}

/// Checkpoints `persistence` into `dir` every `period` until the task is aborted. A failed
/// checkpoint is logged and retried on the next tick.
pub async fn save_periodically(persistence: Arc<Mutex<DictPersistence>>, dir: PathBuf, period: Duration) {
    let mut ticks = time::interval_at(time::Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticks.tick().await;
        match checkpoint(&persistence, &dir).await {
            Ok(()) => debug!(dir = %dir.display(), "step: persistence checkpoint written"),
            Err(e) => error!(error = %format!("{:#}", e), "Persistence checkpoint failed"),
        }
    }
}
