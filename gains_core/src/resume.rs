//! Resume persistence for the in-progress session.
//!
//! A single durable slot holds the latest snapshot of the session plus the
//! time it was written. There is no history and no versioning: every write
//! overwrites the slot. On load the snapshot is only honoured inside a resume
//! window that grows with the size of the workout; stale or unparseable
//! snapshots are discarded and treated as absent.

use crate::config::ResumeConfig;
use crate::{Clock, Error, Result, WorkoutSession};
use chrono::{DateTime, Duration, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Fixed key of the resume slot
pub const RESUME_KEY: &str = "clean-gains-active-workout";

/// The durable form of an in-progress session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResumeSnapshot {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub saved_at: DateTime<Utc>,
}

/// Local key-value storage port
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store; clones share the same map
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| Error::Other(format!("memory store poisoned: {}", e)))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory, replaced atomically on write
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(self.path_for(key)).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// How long a snapshot of this size stays resumable
pub fn resume_window(session: &WorkoutSession, config: &ResumeConfig) -> Duration {
    let total_sets = session.total_sets() as i64;
    Duration::seconds(total_sets * config.seconds_per_set + config.buffer_minutes * 60)
}

pub struct ResumeStore {
    storage: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: ResumeConfig,
}

impl ResumeStore {
    pub fn new(storage: Box<dyn KeyValueStore>, clock: Arc<dyn Clock>, config: ResumeConfig) -> Self {
        Self {
            storage,
            clock,
            config,
        }
    }

    /// Convenience constructor for a file-backed slot under `data_dir`
    pub fn in_dir(data_dir: &Path, clock: Arc<dyn Clock>, config: ResumeConfig) -> Self {
        Self::new(Box::new(FileStore::new(data_dir)), clock, config)
    }

    /// Overwrite the slot with the current session
    ///
    /// Write failures are logged and swallowed: losing a snapshot only costs
    /// the ability to resume, never the live session.
    pub fn save(&mut self, session: &WorkoutSession) {
        let snapshot = ResumeSnapshot {
            session: session.clone(),
            saved_at: self.clock.now(),
        };

        let payload = match serde_json::to_string(&snapshot) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to serialize resume snapshot: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.set(RESUME_KEY, &payload) {
            tracing::warn!("Failed to write resume snapshot: {}", e);
        } else {
            tracing::debug!("Saved resume snapshot for {}", session.workout_log_id);
        }
    }

    /// Load the snapshot if it is still inside its resume window
    pub fn load(&mut self) -> Option<ResumeSnapshot> {
        let payload = match self.storage.get(RESUME_KEY) {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read resume snapshot: {}", e);
                return None;
            }
        };

        let snapshot = match serde_json::from_str::<ResumeSnapshot>(&payload) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Discarding unreadable resume snapshot: {}", e);
                self.clear();
                return None;
            }
        };

        if let Err(e) = snapshot.session.check_integrity() {
            tracing::warn!("Discarding inconsistent resume snapshot: {}", e);
            self.clear();
            return None;
        }

        let age = self.clock.now() - snapshot.saved_at;
        let window = resume_window(&snapshot.session, &self.config);
        if age > window {
            tracing::info!(
                "Discarding stale resume snapshot ({}s old, window {}s)",
                age.num_seconds(),
                window.num_seconds()
            );
            self.clear();
            return None;
        }

        tracing::info!("Resuming workout {}", snapshot.session.workout_log_id);
        Some(snapshot)
    }

    pub fn clear(&mut self) {
        if let Err(e) = self.storage.remove(RESUME_KEY) {
            tracing::warn!("Failed to clear resume snapshot: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseProgress, ManualClock, WorkoutType};
    use crate::catalog::build_default_program;

    /// A session with exactly `sets` sets spread over the push exercises
    fn session_with_sets(sets: usize, started_at: DateTime<Utc>) -> WorkoutSession {
        let program = build_default_program();
        let push: &WorkoutType = &program.workout_types[0];
        let mut exercises: Vec<ExerciseProgress> = push
            .exercises
            .iter()
            .map(|ex| ExerciseProgress::new(ex.clone(), vec![]))
            .collect();
        for ex in &mut exercises {
            ex.sets.clear();
        }
        for i in 0..sets {
            let ex = &mut exercises[i % 5];
            let n = ex.sets.len() as u32 + 1;
            ex.sets.push(crate::SetEntry::empty(n));
        }

        WorkoutSession {
            workout_log_id: "log-1".into(),
            workout_type_id: push.id.clone(),
            workout_type_name: push.name.clone(),
            exercises,
            current_exercise_index: 0,
            started_at,
            paused: false,
            paused_elapsed_seconds: None,
        }
    }

    fn store(clock: &ManualClock, storage: &MemoryStore) -> ResumeStore {
        ResumeStore::new(
            Box::new(storage.clone()),
            Arc::new(clock.clone()),
            ResumeConfig::default(),
        )
    }

    #[test]
    fn test_window_scales_with_set_count() {
        let session = session_with_sets(10, Utc::now());
        let window = resume_window(&session, &ResumeConfig::default());
        assert_eq!(window, Duration::seconds(10 * 135 + 1200));
    }

    #[test]
    fn test_snapshot_older_than_window_is_rejected() {
        let clock = ManualClock::new(Utc::now());
        let storage = MemoryStore::new();
        let mut resume = store(&clock, &storage);

        resume.save(&session_with_sets(10, clock.now()));
        clock.advance(Duration::minutes(45));

        assert!(resume.load().is_none());
        assert!(storage.get(RESUME_KEY).unwrap().is_none(), "stale entry is discarded");
    }

    #[test]
    fn test_snapshot_inside_window_is_accepted() {
        let clock = ManualClock::new(Utc::now());
        let storage = MemoryStore::new();
        let mut resume = store(&clock, &storage);

        let session = session_with_sets(10, clock.now());
        resume.save(&session);
        clock.advance(Duration::minutes(40));

        let snapshot = resume.load().expect("snapshot within window");
        assert_eq!(snapshot.session, session);
    }

    #[test]
    fn test_corrupted_payload_treated_as_absent() {
        let clock = ManualClock::new(Utc::now());
        let mut storage = MemoryStore::new();
        storage.set(RESUME_KEY, "{ not json").unwrap();
        let mut resume = store(&clock, &storage);

        assert!(resume.load().is_none());
        assert!(storage.get(RESUME_KEY).unwrap().is_none());
    }

    /// Save a valid snapshot, rewrite its JSON, then load it back
    fn load_edited<F>(edit: F) -> (Option<ResumeSnapshot>, MemoryStore)
    where
        F: FnOnce(&mut serde_json::Value),
    {
        let clock = ManualClock::new(Utc::now());
        let mut storage = MemoryStore::new();
        let mut resume = store(&clock, &storage);
        resume.save(&session_with_sets(10, clock.now()));

        let raw = storage.get(RESUME_KEY).unwrap().unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        edit(&mut json);
        storage.set(RESUME_KEY, &json.to_string()).unwrap();

        (resume.load(), storage)
    }

    #[test]
    fn test_unedited_snapshot_passes_integrity_check() {
        let (loaded, _) = load_edited(|_| {});
        assert!(loaded.is_some());
    }

    #[test]
    fn test_exercise_index_out_of_range_is_discarded() {
        let (loaded, storage) = load_edited(|json| {
            json["currentExerciseIndex"] = serde_json::json!(9);
        });
        assert!(loaded.is_none());
        assert!(storage.get(RESUME_KEY).unwrap().is_none());
    }

    #[test]
    fn test_no_exercises_is_discarded() {
        let (loaded, storage) = load_edited(|json| {
            json["exercises"] = serde_json::json!([]);
        });
        assert!(loaded.is_none());
        assert!(storage.get(RESUME_KEY).unwrap().is_none());
    }

    #[test]
    fn test_exercise_without_sets_is_discarded() {
        let (loaded, storage) = load_edited(|json| {
            json["exercises"][2]["sets"] = serde_json::json!([]);
        });
        assert!(loaded.is_none());
        assert!(storage.get(RESUME_KEY).unwrap().is_none());
    }

    #[test]
    fn test_gap_in_set_numbers_is_discarded() {
        let (loaded, storage) = load_edited(|json| {
            json["exercises"][0]["sets"][1]["setNumber"] = serde_json::json!(5);
        });
        assert!(loaded.is_none());
        assert!(storage.get(RESUME_KEY).unwrap().is_none());
    }

    #[test]
    fn test_completed_set_without_values_is_discarded() {
        let (loaded, storage) = load_edited(|json| {
            json["exercises"][0]["sets"][0]["isCompleted"] = serde_json::json!(true);
        });
        assert!(loaded.is_none());
        assert!(storage.get(RESUME_KEY).unwrap().is_none());
    }

    #[test]
    fn test_blob_uses_external_field_names() {
        let clock = ManualClock::new(Utc::now());
        let storage = MemoryStore::new();
        let mut resume = store(&clock, &storage);
        resume.save(&session_with_sets(2, clock.now()));

        let raw = storage.get(RESUME_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        for field in [
            "workoutLogId",
            "workoutTypeId",
            "workoutTypeName",
            "exercises",
            "currentExerciseIndex",
            "startedAt",
            "savedAt",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_file_store_overwrites_and_removes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut files = FileStore::new(temp_dir.path());

        files.set("slot", "one").unwrap();
        files.set("slot", "two").unwrap();
        assert_eq!(files.get("slot").unwrap().as_deref(), Some("two"));

        files.remove("slot").unwrap();
        assert!(files.get("slot").unwrap().is_none());
        // Removing a missing key is not an error
        files.remove("slot").unwrap();
    }
}
