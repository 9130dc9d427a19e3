use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

/// Watches a bookmarks file for changes made by the browser.
///
/// Browsers replace the file by renaming a temp file over it, so the parent
/// directory is watched and events are filtered by file name.
pub struct BookmarksWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<()>,
}

impl BookmarksWatcher {
    pub fn new(bookmarks_path: &Path, poll_interval: Duration) -> Result<Self> {
        let file_name: OsString = bookmarks_path
            .file_name()
            .with_context(|| format!("not a file path: {}", bookmarks_path.display()))?
            .to_os_string();
        let dir = bookmarks_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    if event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()))
                    {
                        let _ = tx.send(());
                    }
                }
            },
            Config::default().with_poll_interval(poll_interval),
        )?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {}", dir.display()))?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Wait for the next change. Bursts already queued are folded into one.
    pub async fn changed(&mut self) -> Option<()> {
        let first = self.rx.recv().await;
        while self.rx.try_recv().is_ok() {}
        first
    }
}
