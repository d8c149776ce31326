//! File-backed implementation of the workout log backend.
//!
//! Records live in an append-only journal; the rotation position lives in a
//! separate schedule file. Reads fold the journal from the start, which is
//! cheap at the scale of one user's training history.

use crate::journal::{JournalEvent, JsonlJournal};
use crate::sync::is_new_personal_record;
use crate::{
    Clock, CompletionReceipt, Error, NewSetLog, PreviousSet, Result, ScheduleState, SetLog,
    WorkoutLog, WorkoutLogApi,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Journal file name inside the data directory
pub const JOURNAL_FILE: &str = "journal.jsonl";
/// Schedule file name inside the data directory
pub const SCHEDULE_FILE: &str = "schedule.json";

/// Workout logs and set logs as they stand after folding the journal
#[derive(Debug, Default)]
struct LogView {
    workouts: Vec<WorkoutLog>,
    sets: Vec<SetLog>,
    /// Heaviest weight per exercise at the time it was logged
    records: HashMap<String, f64>,
}

impl LogView {
    fn fold(events: Vec<JournalEvent>) -> Self {
        let mut view = LogView::default();
        for event in events {
            match event {
                JournalEvent::WorkoutStarted { workout } => view.workouts.push(workout),
                JournalEvent::SetLogged { set } => {
                    let record = view.records.entry(set.exercise_id.clone()).or_insert(set.weight);
                    if set.weight > *record {
                        *record = set.weight;
                    }
                    view.sets.push(set);
                }
                JournalEvent::SetUpdated {
                    set_log_id,
                    weight,
                    reps,
                } => {
                    if let Some(set) = view.sets.iter_mut().find(|s| s.id == set_log_id) {
                        set.weight = weight;
                        set.reps = reps;
                    }
                }
                JournalEvent::SetDeleted { set_log_id } => {
                    view.sets.retain(|s| s.id != set_log_id);
                }
                JournalEvent::WorkoutCompleted {
                    workout_log_id,
                    total_volume,
                    duration_seconds,
                    completed_at,
                } => {
                    if let Some(w) = view.workouts.iter_mut().find(|w| w.id == workout_log_id) {
                        w.completed_at = Some(completed_at);
                        w.total_volume = Some(total_volume);
                        w.duration_seconds = Some(duration_seconds);
                    }
                }
            }
        }
        view
    }
}

pub struct LocalWorkoutLog {
    journal: JsonlJournal,
    schedule_path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl LocalWorkoutLog {
    /// Open the log stored under `data_dir`
    pub fn new(data_dir: &Path, clock: Arc<dyn Clock>) -> Self {
        Self {
            journal: JsonlJournal::new(data_dir.join(JOURNAL_FILE)),
            schedule_path: data_dir.join(SCHEDULE_FILE),
            clock,
        }
    }

    fn view(&self) -> Result<LogView> {
        Ok(LogView::fold(self.journal.read()?))
    }

    pub fn schedule(&self) -> Result<ScheduleState> {
        ScheduleState::load(&self.schedule_path)
    }

    /// Mark a rest day as done and move the rotation on
    pub fn complete_rest_day(&self) -> Result<ScheduleState> {
        let now = self.clock.now();
        ScheduleState::update(&self.schedule_path, |state| {
            if state.today() != crate::CycleDay::Rest {
                return Err(Error::Validation(format!(
                    "today is a {} day, not a rest day",
                    state.today().label()
                )));
            }
            state.advance(now);
            Ok(())
        })
    }

    /// Heaviest weight ever recorded for an exercise
    pub fn personal_record(&self, exercise_id: &str) -> Result<Option<f64>> {
        Ok(self.view()?.records.get(exercise_id).copied())
    }

    /// Sets of the most recently completed workout of this type, by exercise
    pub fn previous_sets(&self, workout_type_id: &str) -> Result<HashMap<String, Vec<PreviousSet>>> {
        let view = self.view()?;
        let last = view
            .workouts
            .iter()
            .filter(|w| w.workout_type_id == workout_type_id)
            .filter_map(|w| w.completed_at.map(|at| (at, w)))
            .max_by_key(|(at, _)| *at)
            .map(|(_, w)| w.id.clone());

        let mut by_exercise: HashMap<String, Vec<PreviousSet>> = HashMap::new();
        let Some(last_id) = last else {
            return Ok(by_exercise);
        };

        for set in view.sets.iter().filter(|s| s.workout_log_id == last_id) {
            by_exercise
                .entry(set.exercise_id.clone())
                .or_default()
                .push(PreviousSet {
                    set_number: set.set_number,
                    weight: set.weight,
                    reps: set.reps,
                });
        }
        for sets in by_exercise.values_mut() {
            sets.sort_by_key(|s| s.set_number);
        }

        Ok(by_exercise)
    }

    /// All workout logs, oldest first
    pub fn workouts(&self) -> Result<Vec<WorkoutLog>> {
        Ok(self.view()?.workouts)
    }
}

fn remote_err(e: Error) -> Error {
    match e {
        Error::RemoteSync(_) | Error::NotFound(_) => e,
        other => Error::RemoteSync(other.to_string()),
    }
}

#[async_trait]
impl WorkoutLogApi for LocalWorkoutLog {
    async fn start_workout(&self, workout_type_id: &str) -> Result<WorkoutLog> {
        let workout = WorkoutLog {
            id: Uuid::new_v4().to_string(),
            workout_type_id: workout_type_id.to_string(),
            started_at: self.clock.now(),
            completed_at: None,
            total_volume: None,
            duration_seconds: None,
        };
        self.journal
            .append(&JournalEvent::WorkoutStarted {
                workout: workout.clone(),
            })
            .map_err(remote_err)?;
        Ok(workout)
    }

    async fn log_set(&self, set: &NewSetLog) -> Result<SetLog> {
        let view = self.view().map_err(remote_err)?;
        if !view.workouts.iter().any(|w| w.id == set.workout_log_id) {
            return Err(Error::NotFound(format!("workout log {}", set.workout_log_id)));
        }

        // Edits and deletions never lower the stored record
        let previous_max = view.records.get(&set.exercise_id).copied();
        let logged = SetLog {
            id: Uuid::new_v4().to_string(),
            workout_log_id: set.workout_log_id.clone(),
            exercise_id: set.exercise_id.clone(),
            set_number: set.set_number,
            weight: set.weight,
            reps: set.reps,
            is_pr: is_new_personal_record(previous_max, set.weight),
            logged_at: self.clock.now(),
        };
        self.journal
            .append(&JournalEvent::SetLogged { set: logged.clone() })
            .map_err(remote_err)?;
        Ok(logged)
    }

    async fn update_set(&self, set_log_id: &str, weight: f64, reps: u32) -> Result<SetLog> {
        let view = self.view().map_err(remote_err)?;
        let mut set = view
            .sets
            .into_iter()
            .find(|s| s.id == set_log_id)
            .ok_or_else(|| Error::NotFound(format!("set log {}", set_log_id)))?;

        self.journal
            .append(&JournalEvent::SetUpdated {
                set_log_id: set_log_id.to_string(),
                weight,
                reps,
            })
            .map_err(remote_err)?;

        set.weight = weight;
        set.reps = reps;
        Ok(set)
    }

    async fn delete_set_log(&self, set_log_id: &str) -> Result<()> {
        let view = self.view().map_err(remote_err)?;
        if !view.sets.iter().any(|s| s.id == set_log_id) {
            return Err(Error::NotFound(format!("set log {}", set_log_id)));
        }
        self.journal
            .append(&JournalEvent::SetDeleted {
                set_log_id: set_log_id.to_string(),
            })
            .map_err(remote_err)
    }

    async fn complete_workout(
        &self,
        workout_log_id: &str,
        total_volume: f64,
        duration_seconds: u64,
    ) -> Result<CompletionReceipt> {
        let view = self.view().map_err(remote_err)?;
        if !view.workouts.iter().any(|w| w.id == workout_log_id) {
            return Err(Error::NotFound(format!("workout log {}", workout_log_id)));
        }

        let now = self.clock.now();
        self.journal
            .append(&JournalEvent::WorkoutCompleted {
                workout_log_id: workout_log_id.to_string(),
                total_volume,
                duration_seconds,
                completed_at: now,
            })
            .map_err(remote_err)?;

        ScheduleState::update(&self.schedule_path, |state| {
            state.advance(now);
            Ok(())
        })
        .map_err(remote_err)?;

        Ok(CompletionReceipt { success: true })
    }
}
