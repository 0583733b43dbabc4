// Backup-file persistence for a storage node's local store.
//
// The on-disk format is private to each node, so this picks pretty
// JSON for readability. Mutations are handed to a single background task
// over an unbounded channel so concurrent persistence of the same file is
// naturally serialized (the simplest approach: a single persistence queue
// per node), without blocking the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::warn;

/// Handle to the background persistence task. Cloning is cheap; all clones
/// share the same queue and consumer task.
#[derive(Clone)]
pub struct PersistenceHandle {
    tx: mpsc::UnboundedSender<HashMap<String, String>>,
}

impl PersistenceHandle {
    /// Spawn the background writer and return a handle to it.
    pub fn spawn(path: PathBuf) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<HashMap<String, String>>();

        tokio::spawn(async move {
            while let Some(snapshot) = rx.recv().await {
                if let Err(e) = write_snapshot(&path, &snapshot).await {
                    warn!("failed to persist backup file {}: {e}", path.display());
                }
            }
        });

        Self { tx }
    }

    /// Enqueue the current local store for persistence. Never blocks; a
    /// full channel would indicate the consumer has died, which we treat
    /// as best-effort (persistence is not on the write's critical path).
    pub fn persist(&self, snapshot: HashMap<String, String>) {
        let _ = self.tx.send(snapshot);
    }
}

async fn write_snapshot(path: &Path, snapshot: &HashMap<String, String>) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(snapshot).unwrap_or_else(|_| "{}".to_string());
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }
    tokio::fs::write(path, json).await
}

/// Load a backup file if present; a missing file starts empty, mirroring
/// the original's `_load_from_disk` `FileNotFoundError` handling.
pub fn load_backup(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
        Err(_) => HashMap::new(),
    }
}
