//! Live command table with all-or-nothing reloads

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Notify, watch};

use super::CommandTable;

/// Shared handle to the current command table
///
/// Readers take a cheap `Arc` snapshot once per cycle. The reload task builds a
/// complete table off to the side and swaps it in through the watch channel, so
/// a reader never observes a half-loaded table.
#[derive(Debug, Clone)]
pub struct CommandStore {
    tx: Arc<watch::Sender<Arc<CommandTable>>>,
    nudge: Arc<Notify>,
}

impl CommandStore {
    /// Create a store seeded with `table`
    #[must_use]
    pub fn new(table: CommandTable) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(table));
        Self {
            tx: Arc::new(tx),
            nudge: Arc::new(Notify::new()),
        }
    }

    /// Current table
    #[must_use]
    pub fn snapshot(&self) -> Arc<CommandTable> {
        self.tx.borrow().clone()
    }

    /// Subscribe to table swaps
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<CommandTable>> {
        self.tx.subscribe()
    }

    /// Ask the reload task to re-read the source
    pub fn request_reload(&self) {
        self.nudge.notify_one();
    }

    /// Swap in `table` unless it equals the current one
    ///
    /// Returns whether a swap happened.
    pub fn replace(&self, table: CommandTable) -> bool {
        self.tx.send_if_modified(|current| {
            if **current == table {
                false
            } else {
                *current = Arc::new(table);
                true
            }
        })
    }

    /// Load `path` and swap it in
    ///
    /// A missing file is "no update"; a malformed file is logged and ignored.
    /// Returns whether the table changed.
    pub fn reload_from(&self, path: &std::path::Path, assistant_name: &str, master_name: &str) -> bool {
        match CommandTable::load(path, assistant_name, master_name) {
            Ok(Some(table)) => {
                let changed = self.replace(table);
                if changed {
                    tracing::info!(path = %path.display(), "command table reloaded");
                }
                changed
            }
            Ok(None) => {
                tracing::debug!(path = %path.display(), "command file absent, keeping current table");
                false
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "command file reload failed");
                false
            }
        }
    }
}

/// Spawn the background reload task
///
/// The task waits for [`CommandStore::request_reload`] and reloads `path` each
/// time it is nudged. It runs until the runtime shuts down.
pub fn spawn_reloader(
    store: CommandStore,
    path: PathBuf,
    assistant_name: String,
    master_name: String,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            store.nudge.notified().await;
            let (s, p, a, m) = (store.clone(), path.clone(), assistant_name.clone(), master_name.clone());
            let result = tokio::task::spawn_blocking(move || s.reload_from(&p, &a, &m)).await;
            if let Err(e) = result {
                tracing::warn!(error = %e, "command reload task panicked");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"command_db": [{"name": "mute", "commands": ["stop"]}]}"#;

    #[test]
    fn missing_file_keeps_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = CommandStore::new(CommandTable::parse(DOC, "a", "b").unwrap());

        assert!(!store.reload_from(&dir.path().join("gone.json"), "a", "b"));
        assert_eq!(store.snapshot().phrases_by_name("mute"), ["stop"]);
    }

    #[test]
    fn malformed_file_keeps_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands_db.json");
        std::fs::write(&path, "{ nope").unwrap();
        let store = CommandStore::new(CommandTable::parse(DOC, "a", "b").unwrap());

        assert!(!store.reload_from(&path, "a", "b"));
        assert_eq!(store.snapshot().phrases_by_name("mute"), ["stop"]);
    }

    #[test]
    fn identical_reload_is_not_a_swap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands_db.json");
        std::fs::write(&path, DOC).unwrap();
        let store = CommandStore::new(CommandTable::default());
        let rx = store.subscribe();

        assert!(store.reload_from(&path, "a", "b"));
        let first = store.snapshot();
        assert!(!store.reload_from(&path, "a", "b"));
        assert!(Arc::ptr_eq(&first, &store.snapshot()));
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn reloader_swaps_on_nudge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands_db.json");
        let store = CommandStore::new(CommandTable::default());
        let mut rx = store.subscribe();
        let handle = spawn_reloader(store.clone(), path.clone(), "a".into(), "b".into());

        std::fs::write(&path, DOC).unwrap();
        store.request_reload();

        tokio::time::timeout(std::time::Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(store.snapshot().phrases_by_name("mute"), ["stop"]);
        handle.abort();
    }
}
