//! Configuration file watcher for hot-reload support
//!
//! The watch is placed on the directory holding the config file, not on the
//! file itself: editors that save by writing a temporary file and renaming it
//! over the original replace the inode, which a single-file watch loses.
//! Events for the config file name are coalesced and trigger one reload once
//! the directory has been quiet for [`SETTLE_DELAY`].

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::AppConfig;

/// Quiet period after the last file event before reloading
pub const SETTLE_DELAY: Duration = Duration::from_millis(150);

/// Delivers a freshly loaded [`AppConfig`] each time the file changes
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<AppConfig>,
}

impl ConfigWatcher {
    /// Watch `config_path` for edits, creation and rename-over saves
    ///
    /// Must be called inside a Tokio runtime. Invalid edits are logged and
    /// skipped; the previous config stays active.
    pub fn new(config_path: impl AsRef<Path>) -> Result<Self> {
        let config_path = config_path.as_ref().to_path_buf();
        let file_name = config_path
            .file_name()
            .map(OsStr::to_os_string)
            .with_context(|| {
                format!("Config path has no file name: {}", config_path.display())
            })?;
        let dir = match config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (touch_tx, touch_rx) = mpsc::unbounded_channel::<()>();
        let (tx, rx) = mpsc::channel(10);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| match res {
                Ok(event) if touches_config(&event, &file_name) => {
                    debug!("Config file event: {:?} {:?}", event.kind, event.paths);
                    let _ = touch_tx.send(());
                }
                Ok(_) => {}
                Err(e) => error!("Watch error: {}", e),
            })?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch config directory: {}", dir.display()))?;

        tokio::spawn(reload_loop(config_path.clone(), touch_rx, tx));

        info!("Config file watcher started for: {}", config_path.display());

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait for the next config update
    /// Returns None if the watcher has been closed
    pub async fn next_config(&mut self) -> Option<AppConfig> {
        self.rx.recv().await
    }
}

/// Whether a directory event concerns the config file
///
/// Renames show up as `Modify(Name(_))` with the new path, so rename-over
/// saves are covered by the `Modify` arm.
fn touches_config(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
}

/// Coalesce bursts of file events into single reloads
async fn reload_loop(
    config_path: PathBuf,
    mut touches: mpsc::UnboundedReceiver<()>,
    tx: mpsc::Sender<AppConfig>,
) {
    let path = config_path.to_string_lossy().into_owned();

    while touches.recv().await.is_some() {
        loop {
            match tokio::time::timeout(SETTLE_DELAY, touches.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        match AppConfig::load(&path).await {
            Ok(new_config) => {
                info!("Configuration reloaded successfully");
                if tx.send(new_config).await.is_err() {
                    debug!("Config receiver dropped, stopping reloads");
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to reload config (keeping old config): {:#}", e);
            }
        }
    }
}
