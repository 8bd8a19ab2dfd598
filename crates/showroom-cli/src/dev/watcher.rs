//! Documentation watcher.
//!
//! Watches the docs directory recursively and forwards changes to Markdown and
//! MDX documents. Bursts are coalesced by [`FileWatcher::settle`].

use crate::docs::document_kind;
use crate::error::{CliError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

/// Directory names whose contents never trigger a rebuild.
const IGNORED_DIRS: &[&str] = &["node_modules", "target"];

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Watcher over the documentation root.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// Returns the watcher (changes stop when it is dropped) and the receiving
    /// end of the change channel.
    pub fn new(root: PathBuf) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(100);
        let filter_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else { return };
            for path in &event.paths {
                if !Self::is_relevant(path, &filter_root) {
                    continue;
                }
                let change = match event.kind {
                    EventKind::Create(_) => FileChange::Created(path.clone()),
                    EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };
                // The receiver is gone once the server shuts down.
                let _ = tx.blocking_send(change);
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    /// Whether a changed path is a document under `root`.
    fn is_relevant(path: &Path, root: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };

        let hidden_or_ignored = relative.components().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            name.starts_with('.') || IGNORED_DIRS.contains(&name.as_ref())
        });

        !hidden_or_ignored && document_kind(path).is_some()
    }

    /// Wait until no change arrived for `quiet`, returning every change seen.
    ///
    /// Returns an empty list when the channel is closed.
    pub async fn settle(
        rx: &mut mpsc::Receiver<FileChange>,
        first: FileChange,
        quiet: Duration,
    ) -> Vec<FileChange> {
        let mut changes = vec![first];
        loop {
            match tokio::time::timeout(quiet, rx.recv()).await {
                Ok(Some(change)) => {
                    if !changes.contains(&change) {
                        changes.push(change);
                    }
                }
                Ok(None) => return Vec::new(),
                Err(_) => return changes,
            }
        }
    }

    /// Get the root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_documents_are_relevant() {
        let root = PathBuf::from("/project/docs");

        assert!(FileWatcher::is_relevant(
            Path::new("/project/docs/button.md"),
            &root
        ));
        assert!(FileWatcher::is_relevant(
            Path::new("/project/docs/guide/card.mdx"),
            &root
        ));
        assert!(!FileWatcher::is_relevant(
            Path::new("/project/docs/logo.png"),
            &root
        ));
    }

    #[test]
    fn test_hidden_ignored_and_outside_paths() {
        let root = PathBuf::from("/project/docs");

        assert!(!FileWatcher::is_relevant(
            Path::new("/project/docs/.drafts/wip.md"),
            &root
        ));
        assert!(!FileWatcher::is_relevant(
            Path::new("/project/docs/node_modules/pkg/readme.md"),
            &root
        ));
        assert!(!FileWatcher::is_relevant(Path::new("/project/README.md"), &root));
    }

    #[test]
    fn test_file_change_path() {
        let path = PathBuf::from("/project/docs/index.md");
        assert_eq!(FileChange::Modified(path.clone()).path(), path.as_path());
        assert_eq!(FileChange::Created(path.clone()).path(), path.as_path());
        assert_eq!(FileChange::Removed(path.clone()).path(), path.as_path());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_coalesces_a_burst() {
        let (tx, mut rx) = mpsc::channel(10);
        let a = FileChange::Modified(PathBuf::from("/docs/a.md"));
        let b = FileChange::Modified(PathBuf::from("/docs/b.md"));

        tx.send(a.clone()).await.unwrap();
        tx.send(b.clone()).await.unwrap();
        tx.send(a.clone()).await.unwrap();

        let first = rx.recv().await.unwrap();
        let changes = FileWatcher::settle(&mut rx, first, Duration::from_millis(100)).await;
        assert_eq!(changes, vec![a, b]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_reports_closed_channel() {
        let (tx, mut rx) = mpsc::channel(10);
        drop(tx);
        let first = FileChange::Removed(PathBuf::from("/docs/a.md"));
        let changes = FileWatcher::settle(&mut rx, first, Duration::from_millis(100)).await;
        assert!(changes.is_empty());
    }
}
