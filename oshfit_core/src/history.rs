//! Session history log.
//!
//! Sessions are stored as they were submitted, one JSON document per line, and
//! normalized on every load. Appends take an exclusive file lock; edits and
//! deletions rewrite the file through a temp file and an atomic rename.
//!
//! A pass that changes the history and then re-evaluates achievements holds
//! [`HistoryLock`] from start to finish, so passes from different processes
//! never interleave.

use crate::normalize::{session_from_json, session_id_from_raw};
use crate::{Error, Result, Session};
use fs2::FileExt;
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Session sink trait for persisting raw sessions
pub trait SessionSink {
    fn append(&mut self, session: &Value) -> Result<()>;
}

/// Id of a stored session, if it carries one
pub fn raw_session_id(session: &Value) -> Option<Uuid> {
    session
        .get("id")?
        .as_str()
        .filter(|id| !id.trim().is_empty())
        .map(session_id_from_raw)
}

/// Give a raw session a fresh id if it has none, returning its id.
///
/// Ids must be stored so a session keeps its identity across loads.
pub fn ensure_session_id(session: &mut Value) -> Result<Uuid> {
    if let Some(id) = raw_session_id(session) {
        return Ok(id);
    }

    let object = session
        .as_object_mut()
        .ok_or_else(|| Error::InvalidSession("session must be a JSON object".into()))?;
    let id = Uuid::new_v4();
    object.insert("id".into(), Value::String(id.to_string()));
    Ok(id)
}

/// Exclusive hold on a user's history, released on drop
#[derive(Debug)]
pub struct HistoryLock {
    file: File,
}

impl Drop for HistoryLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release history lock: {}", e);
        }
    }
}

/// JSONL session history with file locking
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Create a history log for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock file next to the log
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_file_name(".lock")
    }

    /// Block until this process is the only one working on the history
    pub fn lock(&self) -> Result<HistoryLock> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;
        file.lock_exclusive()?;

        tracing::debug!("Locked history {:?}", self.path);
        Ok(HistoryLock { file })
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Read every stored session document, skipping lines that are not JSON
    pub fn read_raw(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let reader = BufReader::new(&file);
        let mut sessions = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Value>(&line) {
                Ok(value) => sessions.push(value),
                Err(e) => {
                    tracing::warn!("Failed to parse session at line {}: {}", line_num + 1, e);
                }
            }
        }

        file.unlock()?;
        tracing::debug!("Read {} raw sessions from {:?}", sessions.len(), self.path);
        Ok(sessions)
    }

    /// Load and normalize the full history.
    ///
    /// Sessions that cannot be normalized (no usable date or category) are
    /// logged and skipped.
    pub fn load(&self) -> Result<Vec<Session>> {
        let raw = self.read_raw()?;
        let total = raw.len();

        let sessions: Vec<Session> = raw
            .iter()
            .enumerate()
            .filter_map(|(index, value)| match session_from_json(value) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!("Skipping stored session #{}: {}", index + 1, e);
                    None
                }
            })
            .collect();

        tracing::info!("Loaded {} of {} stored sessions", sessions.len(), total);
        Ok(sessions)
    }

    pub fn contains(&self, id: Uuid) -> Result<bool> {
        Ok(self
            .read_raw()?
            .iter()
            .any(|value| raw_session_id(value) == Some(id)))
    }

    /// Replace the stored session with id `id`. Returns false if there is none.
    pub fn replace(&self, id: Uuid, session: &Value) -> Result<bool> {
        let replacement = serde_json::to_string(session)?;
        self.rewrite(id, Some(replacement))
    }

    /// Remove the stored session with id `id`. Returns false if there is none.
    pub fn remove(&self, id: Uuid) -> Result<bool> {
        self.rewrite(id, None)
    }

    /// Rewrite the log with the line for `id` swapped for `replacement` (or dropped).
    ///
    /// Lines that do not parse are carried over verbatim.
    fn rewrite(&self, id: Uuid, replacement: Option<String>) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }

        let file = File::open(&self.path)?;
        file.lock_exclusive()?;

        let mut lines = Vec::new();
        let mut found = false;
        for line in BufReader::new(&file).lines() {
            let line = line?;
            let matches = !found
                && serde_json::from_str::<Value>(&line)
                    .ok()
                    .and_then(|value| raw_session_id(&value))
                    == Some(id);

            if matches {
                found = true;
                if let Some(replacement) = &replacement {
                    lines.push(replacement.clone());
                }
            } else if !line.trim().is_empty() {
                lines.push(line);
            }
        }

        if !found {
            file.unlock()?;
            return Ok(false);
        }

        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Other(format!("history path {:?} has no parent", self.path)))?;
        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            for line in &lines {
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        file.unlock()?;

        let action = if replacement.is_some() { "Replaced" } else { "Removed" };
        tracing::info!("{} session {} in {:?}", action, id, self.path);
        Ok(true)
    }
}

impl SessionSink for HistoryLog {
    fn append(&mut self, session: &Value) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = BufWriter::new(&file);
        let line = serde_json::to_string(session)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended session to {:?}", self.path);
        Ok(())
    }
}
