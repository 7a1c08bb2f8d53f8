use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use notify::{Config as NotifyConfig, PollWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer_opt, Config as DebouncerConfig, DebouncedEventKind};
use walkdir::WalkDir;

use crate::error::WorkerError;
use crate::processor::InputFormat;
use crate::worker::job::DEFAULT_SESSION;

/// Timing of the polling watcher.
#[derive(Debug, Clone, Copy)]
pub struct WatchTiming {
    pub poll_interval: Duration,
    pub debounce: Duration,
}

impl Default for WatchTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            debounce: Duration::from_millis(500),
        }
    }
}

/// Drop-folder transport.
///
/// Files placed directly in the inbox belong to the `default` session; files in
/// `inbox/<name>/` belong to session `<name>`. Anything deeper is ignored.
pub struct InboxScanner {
    inbox: PathBuf,
}

impl InboxScanner {
    pub fn new<P: AsRef<Path>>(inbox: P) -> Self {
        Self {
            inbox: inbox.as_ref().to_path_buf(),
        }
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    /// Session a path belongs to, or `None` if the scanner should ignore it.
    pub fn session_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.inbox).ok()?;
        let mut components: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;

        let filename = components.pop()?;
        if !is_candidate(filename) {
            return None;
        }

        match components.as_slice() {
            [] => Some(DEFAULT_SESSION.to_string()),
            [session] if !session.starts_with('.') => Some(session.to_string()),
            _ => None,
        }
    }

    /// Inputs already waiting in the inbox, oldest first.
    pub fn scan(&self) -> Result<Vec<(String, PathBuf)>, WorkerError> {
        let mut found = Vec::new();

        for entry in WalkDir::new(&self.inbox)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| WorkerError::ScanFailed {
                path: self.inbox.clone(),
                source: e,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if let Some(session) = self.session_for(path) {
                let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
                debug!("Found input for session '{}': {}", session, path.display());
                found.push((modified, session, path.to_path_buf()));
            }
        }

        // Arrival order decides which file replaces which within a session.
        found.sort_by(|a, b| a.0.cmp(&b.0));

        info!(
            "Scanned {} inputs in {}",
            found.len(),
            self.inbox.display()
        );
        Ok(found
            .into_iter()
            .map(|(_, session, path)| (session, path))
            .collect())
    }

    /// Block until `shutdown` is set, reporting every new or changed input.
    pub fn watch<F>(
        &self,
        timing: WatchTiming,
        callback: F,
        shutdown: Arc<AtomicBool>,
    ) -> Result<(), WorkerError>
    where
        F: Fn(String, PathBuf) + Send + 'static,
    {
        // PollWatcher keeps working on network and container mounts.
        let poll_config = NotifyConfig::default().with_poll_interval(timing.poll_interval);

        let debouncer_config = DebouncerConfig::default()
            .with_timeout(timing.debounce)
            .with_notify_config(poll_config);

        let (tx, rx) = std::sync::mpsc::channel();

        let mut debouncer = new_debouncer_opt::<_, PollWatcher>(debouncer_config, tx)
            .map_err(|e| WorkerError::WatchError(e.to_string()))?;

        debouncer
            .watcher()
            .watch(&self.inbox, RecursiveMode::Recursive)
            .map_err(|e| WorkerError::WatchError(e.to_string()))?;

        info!("Watching inbox: {}", self.inbox.display());

        loop {
            if shutdown.load(Ordering::Relaxed) {
                info!("Watch mode shutting down...");
                break;
            }

            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(Ok(events)) => {
                    for event in events {
                        if !matches!(event.kind, DebouncedEventKind::Any) {
                            continue;
                        }
                        let path = &event.path;
                        if !path.is_file() {
                            continue;
                        }
                        if let Some(session) = self.session_for(path) {
                            info!("New input for session '{}': {}", session, path.display());
                            callback(session, path.to_path_buf());
                        }
                    }
                }
                Ok(Err(errors)) => {
                    warn!("Watch error: {:?}", errors);
                }
                Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {
                    continue;
                }
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    error!("Watch channel disconnected");
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Supported input that is not a hidden file or an office lock file.
fn is_candidate(filename: &str) -> bool {
    if filename.starts_with('.') || filename.starts_with("~$") {
        return false;
    }
    InputFormat::from_path(Path::new(filename)).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = InboxScanner::new(temp_dir.path());

        let found = scanner.scan().unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_assigns_sessions() {
        let temp_dir = TempDir::new().unwrap();
        let evening = temp_dir.path().join("evening");
        std::fs::create_dir(&evening).unwrap();

        std::fs::write(temp_dir.path().join("orders.xlsx"), b"x").unwrap();
        std::fs::write(evening.join("labels.pdf"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();

        let scanner = InboxScanner::new(temp_dir.path());
        let mut found = scanner.scan().unwrap();
        found.sort();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, DEFAULT_SESSION);
        assert!(found[0].1.ends_with("orders.xlsx"));
        assert_eq!(found[1].0, "evening");
        assert!(found[1].1.ends_with("labels.pdf"));
    }

    #[test]
    fn test_scan_ignores_deeper_directories() {
        let temp_dir = TempDir::new().unwrap();
        let deep = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&deep).unwrap();
        std::fs::write(deep.join("labels.pdf"), b"x").unwrap();

        let scanner = InboxScanner::new(temp_dir.path());

        assert!(scanner.scan().unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_inbox_fails() {
        let temp_dir = TempDir::new().unwrap();
        let scanner = InboxScanner::new(temp_dir.path().join("missing"));

        assert!(matches!(
            scanner.scan(),
            Err(WorkerError::ScanFailed { .. })
        ));
    }

    #[test]
    fn test_session_for() {
        let scanner = InboxScanner::new("/inbox");

        assert_eq!(
            scanner.session_for(Path::new("/inbox/orders.xlsx")).as_deref(),
            Some(DEFAULT_SESSION)
        );
        assert_eq!(
            scanner.session_for(Path::new("/inbox/night/labels.PDF")).as_deref(),
            Some("night")
        );
        assert_eq!(scanner.session_for(Path::new("/inbox/.orders.xlsx")), None);
        assert_eq!(scanner.session_for(Path::new("/inbox/~$orders.xlsx")), None);
        assert_eq!(scanner.session_for(Path::new("/inbox/.tmp/labels.pdf")), None);
        assert_eq!(scanner.session_for(Path::new("/inbox/a/b/labels.pdf")), None);
        assert_eq!(scanner.session_for(Path::new("/elsewhere/labels.pdf")), None);
        assert_eq!(scanner.session_for(Path::new("/inbox/readme.md")), None);
    }
}
