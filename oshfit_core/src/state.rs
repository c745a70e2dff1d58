//! Achievement state persistence with file locking.
//!
//! A user's achievement states live in one JSON file that is replaced
//! atomically on every save.

use crate::{AchievementState, Error, Result, UserAchievements};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

impl UserAchievements {
    /// Load achievement states from a file with shared locking
    ///
    /// Returns no states if the file doesn't exist.
    /// If the file is corrupted, logs a warning and returns no states.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No achievement file found, starting with none unlocked");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(
                    "Unable to open achievement file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!(
                "Unable to lock achievement file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!(
                "Failed to read achievement file {:?}: {}. Using defaults.",
                path,
                e
            );
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<UserAchievements>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded {} achievement states from {:?}", state.states.len(), path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to parse achievement file {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Save achievement states with exclusive locking
    ///
    /// Writes to a temp file in the same directory, syncs it, then renames it
    /// over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("achievement path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved {} achievement states to {:?}", self.states.len(), path);
        Ok(())
    }

    /// Load states, modify them, and save them back
    ///
    /// Unlocks already on disk when saving are kept even if `f` produced a
    /// locked state for the same id.
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserAchievements) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.merge_unlocked(&Self::load(path)?);
        state.save(path)?;
        Ok(state)
    }

    /// Take over every unlock from `other` that is locked or missing here
    pub fn merge_unlocked(&mut self, other: &UserAchievements) {
        for theirs in other.states.iter().filter(|s| s.is_unlocked()) {
            match self.states.iter_mut().find(|s| s.id == theirs.id) {
                Some(ours) if ours.is_unlocked() => {}
                Some(ours) => {
                    tracing::warn!("Keeping unlock of {} found on disk", theirs.id);
                    *ours = theirs.clone();
                }
                None => self.states.push(theirs.clone()),
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&AchievementState> {
        self.states.iter().find(|s| s.id == id)
    }
}
