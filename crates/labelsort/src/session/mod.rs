//! Per-session pairing of uploaded inputs into reconciliation jobs.
//!
//! A session collects one manifest spreadsheet and one label document, in either
//! order. Once both are present the pair becomes a [`Job`] and the session starts
//! over empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::error::SessionError;
use crate::processor::InputFormat;
use crate::worker::job::Job;

#[derive(Debug)]
pub enum SessionEvent {
    /// The file was stored; the session still lacks an input of kind `missing`.
    Waiting {
        missing: InputFormat,
        /// A previously held file of the same kind, now removed.
        replaced: Option<PathBuf>,
    },
    /// Both inputs are present.
    Ready(Job),
}

#[derive(Debug)]
pub struct Session {
    name: String,
    manifest: Option<PathBuf>,
    document: Option<PathBuf>,
    updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            manifest: None,
            document: None,
            updated_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manifest(&self) -> Option<&Path> {
        self.manifest.as_deref()
    }

    pub fn document(&self) -> Option<&Path> {
        self.document.as_deref()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_none() && self.document.is_none()
    }

    /// Put `path` into the slot for its kind of input.
    ///
    /// A different file already in that slot is deleted from disk. When both slots
    /// are filled the session hands out the job and is empty again.
    pub fn offer(&mut self, path: PathBuf) -> Result<SessionEvent, SessionError> {
        let format = InputFormat::from_path(&path)
            .ok_or_else(|| SessionError::UnsupportedInput { path: path.clone() })?;
        if !path.is_file() {
            return Err(SessionError::MissingInput(path));
        }

        let slot = match format {
            InputFormat::Spreadsheet => &mut self.manifest,
            InputFormat::Pdf => &mut self.document,
        };
        let replaced = slot.replace(path.clone()).filter(|old| *old != path);
        if let Some(old) = &replaced {
            remove_input(old);
        }
        self.updated_at = Utc::now();

        match (self.manifest.take(), self.document.take()) {
            (Some(manifest), Some(document)) => {
                debug!("Session '{}' complete", self.name);
                Ok(SessionEvent::Ready(Job::for_session(
                    self.name.clone(),
                    manifest,
                    document,
                )))
            }
            (manifest, document) => {
                let missing = if manifest.is_none() {
                    InputFormat::Spreadsheet
                } else {
                    InputFormat::Pdf
                };
                self.manifest = manifest;
                self.document = document;
                Ok(SessionEvent::Waiting { missing, replaced })
            }
        }
    }

    /// Forget the held inputs without touching them on disk.
    pub fn reset(&mut self) {
        self.manifest = None;
        self.document = None;
        self.updated_at = Utc::now();
    }
}

/// All live sessions, keyed by name.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offer(&mut self, session: &str, path: PathBuf) -> Result<SessionEvent, SessionError> {
        let entry = self
            .sessions
            .entry(session.to_string())
            .or_insert_with(|| Session::new(session));
        let event = entry.offer(path);
        if entry.is_empty() {
            self.sessions.remove(session);
        }
        event
    }

    pub fn get(&self, session: &str) -> Option<&Session> {
        self.sessions.get(session)
    }

    /// Sessions holding one input and waiting for the other.
    pub fn pending(&self) -> usize {
        self.sessions.len()
    }
}

/// Input files of a job, deleted from disk when this guard is dropped.
///
/// Dropping happens whether the job succeeded or failed; [`InputFiles::keep`]
/// disarms the guard for inputs that must survive.
#[derive(Debug)]
pub struct InputFiles {
    paths: Vec<PathBuf>,
}

impl InputFiles {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    pub fn for_job(job: &Job) -> Self {
        Self::new(vec![job.manifest_path.clone(), job.document_path.clone()])
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Disarm the guard; the files stay where they are.
    pub fn keep(mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.paths)
    }
}

impl Drop for InputFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            remove_input(path);
        }
    }
}

fn remove_input(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed input {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove input {}: {}", path.display(), e),
    }
}
