//! Rotation schedule persistence with file locking.
//!
//! The schedule records where the user is in the push/pull/legs/rest
//! rotation. It is saved atomically and read with a shared lock.

use crate::{CycleDay, Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Position in the rotation and when it last moved
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct ScheduleState {
    pub cycle_position: u8,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl ScheduleState {
    /// The rotation day the user is currently on
    pub fn today(&self) -> CycleDay {
        CycleDay::from_position(self.cycle_position)
    }

    /// Move to the next day of the rotation
    pub fn advance(&mut self, at: DateTime<Utc>) {
        self.cycle_position = (self.cycle_position % CycleDay::LENGTH + 1) % CycleDay::LENGTH;
        self.last_completed_at = Some(at);
        tracing::debug!("Schedule advanced to {:?}", self.today());
    }

    /// Load schedule state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No schedule file found, starting at Push");
            return Ok(Self::default());
        }

        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!("Unable to open schedule file {:?}: {}. Using defaults.", path, e);
                return Ok(Self::default());
            }
        };

        if let Err(e) = file.lock_shared() {
            tracing::warn!("Unable to lock schedule file {:?}: {}. Using defaults.", path, e);
            return Ok(Self::default());
        }

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        if let Err(e) = reader.read_to_string(&mut contents) {
            let _ = file.unlock();
            tracing::warn!("Failed to read schedule file {:?}: {}. Using defaults.", path, e);
            return Ok(Self::default());
        }

        file.unlock()?;

        match serde_json::from_str::<ScheduleState>(&contents) {
            Ok(state) => {
                tracing::debug!("Loaded schedule from {:?}", path);
                Ok(state)
            }
            Err(e) => {
                tracing::warn!("Failed to parse schedule file {:?}: {}. Using defaults.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Save schedule state to a file with exclusive locking
    ///
    /// Writes to a temp file in the same directory, syncs it, then renames
    /// it over the original.
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "schedule path missing parent",
            ))
        })?;
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

        tracing::debug!("Saved schedule to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut ScheduleState) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.save(path)?;
        Ok(state)
    }
}
