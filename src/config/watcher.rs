//! Route directory watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::loader::{is_route_file, load_all};
use crate::routing::RouteStore;

/// A watcher that rebuilds the route table when definition files change.
pub struct ConfigWatcher {
    dir: PathBuf,
    store: Arc<RouteStore>,
}

/// Keeps the OS watch and the reload task alive.
pub struct WatcherHandle {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Wait for the reload task to exit (after shutdown).
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher for `dir`, publishing into `store`.
    pub fn new(dir: &Path, store: Arc<RouteStore>) -> Self {
        Self {
            dir: dir.to_path_buf(),
            store,
        }
    }

    /// Start watching the directory.
    ///
    /// Filesystem events are delivered on notify's thread and forwarded to a
    /// reload task on the current Tokio runtime, which exits on `shutdown`.
    pub fn run(self, shutdown: broadcast::Receiver<()>) -> Result<WatcherHandle, notify::Error> {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel::<PathBuf>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Some(path) = relevant_path(&event) {
                        let _ = trigger_tx.send(path);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default(),
        )?;

        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %self.dir.display(), "Route watcher started");

        let task = tokio::spawn(reload_loop(self.dir, self.store, trigger_rx, shutdown));

        Ok(WatcherHandle {
            _watcher: watcher,
            task,
        })
    }
}

/// The route file named by `event`, if the event should trigger a reload.
fn relevant_path(event: &Event) -> Option<PathBuf> {
    if matches!(event.kind, EventKind::Access(_)) {
        return None;
    }
    event.paths.iter().find(|p| is_route_file(p)).cloned()
}

async fn reload_loop(
    dir: PathBuf,
    store: Arc<RouteStore>,
    mut triggers: mpsc::UnboundedReceiver<PathBuf>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            trigger = triggers.recv() => {
                let Some(path) = trigger else { break };

                // Each reload is a full rebuild, so queued triggers collapse into one.
                let mut coalesced = 0usize;
                while triggers.try_recv().is_ok() {
                    coalesced += 1;
                }

                tracing::info!(
                    file = %path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
                    coalesced,
                    "Route configuration changed"
                );
                reload(&dir, &store).await;
            }
            _ = shutdown.recv() => {
                tracing::info!("Route watcher received shutdown signal, exiting loop");
                break;
            }
        }
    }
}

/// Rebuild the table from `dir` and publish it.
///
/// On failure the current table stays active and `None` is returned.
pub async fn reload(dir: &Path, store: &RouteStore) -> Option<u64> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            tracing::error!(path = %dir.display(), "Route path is not a directory. Keeping current route table.");
            return None;
        }
        Err(e) => {
            tracing::error!(path = %dir.display(), error = %e, "Route directory unavailable. Keeping current route table.");
            return None;
        }
    }

    match load_all(dir).await {
        Ok(table) => {
            let routes = table.len();
            let generation = store.replace(table);
            tracing::info!(routes, generation, "Route table replaced");
            Some(generation)
        }
        Err(e) => {
            tracing::error!("Failed to reload routes: {}. Keeping current route table.", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_relevant_path_filters() {
        assert!(relevant_path(&event(EventKind::Create(CreateKind::File), "/r/a.json")).is_some());
        assert!(relevant_path(&event(EventKind::Modify(ModifyKind::Any), "/r/a.json")).is_some());
        assert!(relevant_path(&event(EventKind::Remove(RemoveKind::File), "/r/a.json")).is_some());
        assert!(relevant_path(&event(EventKind::Modify(ModifyKind::Any), "/r/a.swp")).is_none());
        assert!(relevant_path(&event(EventKind::Access(AccessKind::Any), "/r/a.json")).is_none());
    }

    #[tokio::test]
    async fn test_reload_publishes_new_table() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("api.json"),
            r#"{"urlContext": "/api", "backend": "api:1"}"#,
        )
        .unwrap();

        let store = RouteStore::default();
        assert_eq!(reload(dir.path(), &store).await, Some(1));
        assert!(store.snapshot().get("/api").is_some());
    }

    #[tokio::test]
    async fn test_reload_keeps_table_when_directory_missing() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("gone");

        let store = RouteStore::new(
            vec![crate::config::RouteConfig::new("/keep", "keep:1")]
                .into_iter()
                .collect(),
        );
        assert_eq!(reload(&dir, &store).await, None);
        assert!(store.snapshot().get("/keep").is_some());
        assert!(!dir.exists());
    }
}
