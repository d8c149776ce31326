//! Core domain types for the Gains workout tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises, workout types and the push/pull/legs/rest rotation
//! - The in-progress session (exercises, sets, previous-session sets)
//! - Records exchanged with the workout log backend

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Program Types
// ============================================================================

/// Position in the four-day training rotation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CycleDay {
    Push,
    Pull,
    Legs,
    Rest,
}

impl CycleDay {
    /// Number of positions in the rotation
    pub const LENGTH: u8 = 4;

    /// Map a stored cycle position (0..4) onto a day; out-of-range wraps
    pub fn from_position(position: u8) -> Self {
        match position % Self::LENGTH {
            0 => CycleDay::Push,
            1 => CycleDay::Pull,
            2 => CycleDay::Legs,
            _ => CycleDay::Rest,
        }
    }

    pub fn position(self) -> u8 {
        match self {
            CycleDay::Push => 0,
            CycleDay::Pull => 1,
            CycleDay::Legs => 2,
            CycleDay::Rest => 3,
        }
    }

    pub fn next(self) -> Self {
        Self::from_position(self.position() + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            CycleDay::Push => "Push",
            CycleDay::Pull => "Pull",
            CycleDay::Legs => "Legs",
            CycleDay::Rest => "Rest",
        }
    }
}

/// An exercise definition (e.g., "Bench Press")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub rest_seconds: u32,
    pub target_reps_min: u32,
    pub target_reps_max: u32,
    pub default_sets: u32,
}

/// A workout type (one non-rest day of the rotation) and its ordered exercises
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutType {
    pub id: String,
    pub name: String,
    pub day: CycleDay,
    pub exercises: Vec<Exercise>,
}

// ============================================================================
// Session Types
// ============================================================================

/// One set of the current session
///
/// `key` is a local identifier that never changes for the lifetime of the
/// set, so in-flight remote results can find the set even after deletions
/// have shifted positions. `remote_id` is only present once the backend has
/// accepted the set.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetEntry {
    #[serde(default = "Uuid::new_v4")]
    pub key: Uuid,
    pub set_number: u32,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    #[serde(rename = "isCompleted")]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
}

impl SetEntry {
    /// A fresh, empty set with the given 1-based number
    pub fn empty(set_number: u32) -> Self {
        Self {
            key: Uuid::new_v4(),
            set_number,
            weight: None,
            reps: None,
            completed: false,
            completed_at: None,
            remote_id: None,
        }
    }

    /// Contribution to total volume; incomplete sets contribute nothing
    pub fn volume(&self) -> f64 {
        match (self.completed, self.weight, self.reps) {
            (true, Some(weight), Some(reps)) => weight * reps as f64,
            _ => 0.0,
        }
    }
}

/// A set from the previous session of the same workout type (display only)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PreviousSet {
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
}

/// Progress through one exercise of the session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProgress {
    #[serde(flatten)]
    pub exercise: Exercise,
    pub sets: Vec<SetEntry>,
    #[serde(default)]
    pub previous_sets: Vec<PreviousSet>,
}

impl ExerciseProgress {
    /// Build the initial progress for an exercise: `default_sets` empty sets
    pub fn new(exercise: Exercise, previous_sets: Vec<PreviousSet>) -> Self {
        let set_count = exercise.default_sets.max(1);
        Self {
            sets: (1..=set_count).map(SetEntry::empty).collect(),
            exercise,
            previous_sets,
        }
    }

    /// Index of the editable set: the first one not yet completed
    pub fn active_set_index(&self) -> Option<usize> {
        self.sets.iter().position(|s| !s.completed)
    }

    /// Reassign set numbers as `1..=N` in list order
    pub fn renumber(&mut self) {
        for (idx, set) in self.sets.iter_mut().enumerate() {
            set.set_number = idx as u32 + 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.sets.iter().all(|s| s.completed)
    }

    pub fn volume(&self) -> f64 {
        self.sets.iter().map(SetEntry::volume).sum()
    }

    /// The previous-session set with the same number, if any
    pub fn previous_for(&self, set_number: u32) -> Option<&PreviousSet> {
        self.previous_sets.iter().find(|p| p.set_number == set_number)
    }
}

/// An in-progress workout session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutSession {
    pub workout_log_id: String,
    pub workout_type_id: String,
    pub workout_type_name: String,
    pub exercises: Vec<ExerciseProgress>,
    pub current_exercise_index: usize,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub paused: bool,
    /// Elapsed reading captured when the session was paused
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_elapsed_seconds: Option<u64>,
}

impl WorkoutSession {
    /// Build the initial session for a freshly started workout log
    pub fn from_workout_type<F>(
        workout_log: &WorkoutLog,
        workout_type: &WorkoutType,
        mut previous_sets: F,
    ) -> Self
    where
        F: FnMut(&str) -> Vec<PreviousSet>,
    {
        let exercises = workout_type
            .exercises
            .iter()
            .map(|ex| ExerciseProgress::new(ex.clone(), previous_sets(&ex.id)))
            .collect();

        Self {
            workout_log_id: workout_log.id.clone(),
            workout_type_id: workout_type.id.clone(),
            workout_type_name: workout_type.name.clone(),
            exercises,
            current_exercise_index: 0,
            started_at: workout_log.started_at,
            paused: false,
            paused_elapsed_seconds: None,
        }
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|ex| ex.sets.len()).sum()
    }

    pub fn completed_sets(&self) -> usize {
        self.exercises
            .iter()
            .flat_map(|ex| ex.sets.iter())
            .filter(|s| s.completed)
            .count()
    }

    /// Sum of weight x reps over completed sets
    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(ExerciseProgress::volume).sum()
    }

    /// True iff every set of every exercise is completed
    pub fn is_complete(&self) -> bool {
        self.exercises.iter().all(ExerciseProgress::is_complete)
    }

    /// Check the structural invariants every mutation preserves.
    ///
    /// Snapshots come back from storage that may have been edited or
    /// truncated, so a restored session is checked before it is used.
    pub fn check_integrity(&self) -> crate::Result<()> {
        if self.current_exercise_index >= self.exercises.len() {
            return Err(crate::Error::Validation(format!(
                "current exercise {} is out of range ({} exercises)",
                self.current_exercise_index,
                self.exercises.len()
            )));
        }

        for progress in &self.exercises {
            if progress.sets.is_empty() {
                return Err(crate::Error::Validation(format!(
                    "exercise '{}' has no sets",
                    progress.exercise.id
                )));
            }
            for (position, set) in progress.sets.iter().enumerate() {
                if set.set_number as usize != position + 1 {
                    return Err(crate::Error::Validation(format!(
                        "exercise '{}' has set number {} at position {}",
                        progress.exercise.id,
                        set.set_number,
                        position + 1
                    )));
                }
                if set.completed && (set.weight.is_none() || set.reps.is_none()) {
                    return Err(crate::Error::Validation(format!(
                        "completed set {} of '{}' has no weight or reps",
                        set.set_number, progress.exercise.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Locate a set by its stable key
    pub fn find_set_mut(&mut self, key: Uuid) -> Option<&mut SetEntry> {
        self.exercises
            .iter_mut()
            .flat_map(|ex| ex.sets.iter_mut())
            .find(|s| s.key == key)
    }
}

/// A single-field edit of a set
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SetField {
    Weight(Option<f64>),
    Reps(Option<u32>),
}

// ============================================================================
// Workout Log Records
// ============================================================================

/// A workout as recorded by the log backend
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    pub id: String,
    pub workout_type_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_volume: Option<f64>,
    pub duration_seconds: Option<u64>,
}

/// A request to record one completed set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewSetLog {
    pub workout_log_id: String,
    pub exercise_id: String,
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
}

/// A set as recorded by the log backend
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetLog {
    pub id: String,
    pub workout_log_id: String,
    pub exercise_id: String,
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    pub is_pr: bool,
    pub logged_at: DateTime<Utc>,
}

/// Acknowledgement of a workout completion
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionReceipt {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench() -> Exercise {
        Exercise {
            id: "bench_press".into(),
            name: "Bench Press".into(),
            rest_seconds: 120,
            target_reps_min: 6,
            target_reps_max: 10,
            default_sets: 3,
        }
    }

    #[test]
    fn test_cycle_day_wraps() {
        assert_eq!(CycleDay::from_position(0), CycleDay::Push);
        assert_eq!(CycleDay::from_position(3), CycleDay::Rest);
        assert_eq!(CycleDay::from_position(5), CycleDay::Pull);
        assert_eq!(CycleDay::Rest.next(), CycleDay::Push);
        assert_eq!(CycleDay::Legs.next(), CycleDay::Rest);
    }

    #[test]
    fn test_new_progress_has_numbered_empty_sets() {
        let progress = ExerciseProgress::new(bench(), vec![]);
        let numbers: Vec<u32> = progress.sets.iter().map(|s| s.set_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(progress.sets.iter().all(|s| s.weight.is_none() && !s.completed));
        assert_eq!(progress.active_set_index(), Some(0));
    }

    #[test]
    fn test_active_set_is_first_incomplete() {
        let mut progress = ExerciseProgress::new(bench(), vec![]);
        progress.sets[0].completed = true;
        assert_eq!(progress.active_set_index(), Some(1));

        for set in &mut progress.sets {
            set.completed = true;
        }
        assert_eq!(progress.active_set_index(), None);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_volume_counts_only_completed_sets() {
        let mut progress = ExerciseProgress::new(bench(), vec![]);
        progress.sets[0].weight = Some(100.0);
        progress.sets[0].reps = Some(5);
        progress.sets[0].completed = true;
        progress.sets[1].weight = Some(200.0);
        progress.sets[1].reps = Some(5);

        assert_eq!(progress.volume(), 500.0);
    }

    #[test]
    fn test_set_entry_serializes_with_resume_field_names() {
        let mut set = SetEntry::empty(1);
        set.remote_id = Some("log-1".into());
        let json = serde_json::to_value(&set).unwrap();

        assert_eq!(json["setNumber"], 1);
        assert_eq!(json["isCompleted"], false);
        assert_eq!(json["id"], "log-1");
        assert!(json.get("completedAt").is_none());
    }
}
