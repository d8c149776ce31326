//! Append-only workout journal.
//!
//! Every change to the workout log is appended to a JSONL (JSON Lines) file
//! with file locking to ensure safe concurrent access. The current state of
//! the log is recovered by folding the events in order.

use crate::{Result, SetLog, WorkoutLog};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One line of the journal
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEvent {
    WorkoutStarted {
        workout: WorkoutLog,
    },
    SetLogged {
        set: SetLog,
    },
    SetUpdated {
        set_log_id: String,
        weight: f64,
        reps: u32,
    },
    SetDeleted {
        set_log_id: String,
    },
    WorkoutCompleted {
        workout_log_id: String,
        total_volume: f64,
        duration_seconds: u64,
        completed_at: DateTime<Utc>,
    },
}

/// JSONL-backed journal with file locking
#[derive(Clone, Debug)]
pub struct JsonlJournal {
    path: PathBuf,
}

impl JsonlJournal {
    /// Create a new journal for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure the parent directory exists
    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Append one event as a JSON line
    pub fn append(&self, event: &JournalEvent) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(event)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        drop(writer);

        file.unlock()?;

        tracing::debug!("Appended {} to journal", event_name(event));
        Ok(())
    }

    /// Read every event back in append order
    pub fn read(&self) -> Result<Vec<JournalEvent>> {
        read_events(&self.path)
    }
}

fn event_name(event: &JournalEvent) -> &'static str {
    match event {
        JournalEvent::WorkoutStarted { .. } => "workout_started",
        JournalEvent::SetLogged { .. } => "set_logged",
        JournalEvent::SetUpdated { .. } => "set_updated",
        JournalEvent::SetDeleted { .. } => "set_deleted",
        JournalEvent::WorkoutCompleted { .. } => "workout_completed",
    }
}

/// Read all events from a journal file
///
/// Lines that fail to parse are skipped with a warning.
pub fn read_events(path: &Path) -> Result<Vec<JournalEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut events = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalEvent>(&line) {
            Ok(event) => events.push(event),
            Err(e) => {
                tracing::warn!("Failed to parse journal event at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} events from journal", events.len());
    Ok(events)
}
