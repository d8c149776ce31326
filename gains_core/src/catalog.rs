//! Built-in training program: the push, pull and legs workout types.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// The set of workout types the rotation cycles through
#[derive(Clone, Debug)]
pub struct Program {
    pub workout_types: Vec<WorkoutType>,
}

/// Cached default program - built once and reused across all operations
static DEFAULT_PROGRAM: Lazy<Program> = Lazy::new(build_default_program);

/// Get a reference to the cached default program
pub fn get_default_program() -> &'static Program {
    &DEFAULT_PROGRAM
}

impl Program {
    /// Workout type scheduled for a rotation day (none on rest days)
    pub fn workout_for_day(&self, day: CycleDay) -> Option<&WorkoutType> {
        self.workout_types.iter().find(|w| w.day == day)
    }

    /// Look a workout type up by id or by (case-insensitive) name
    pub fn find(&self, key: &str) -> Option<&WorkoutType> {
        let key = key.to_lowercase();
        self.workout_types
            .iter()
            .find(|w| w.id == key || w.name.to_lowercase() == key)
    }

    /// Check the program for structural mistakes; returns every problem found
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut type_ids = HashSet::new();
        let mut exercise_ids = HashSet::new();

        for workout in &self.workout_types {
            if !type_ids.insert(&workout.id) {
                errors.push(format!("Duplicate workout type id '{}'", workout.id));
            }
            if workout.day == CycleDay::Rest {
                errors.push(format!("Workout type '{}' is scheduled on a rest day", workout.id));
            }
            if workout.exercises.is_empty() {
                errors.push(format!("Workout type '{}' has no exercises", workout.id));
            }

            for exercise in &workout.exercises {
                if !exercise_ids.insert(&exercise.id) {
                    errors.push(format!("Duplicate exercise id '{}'", exercise.id));
                }
                if exercise.default_sets == 0 {
                    errors.push(format!("Exercise '{}' has zero default sets", exercise.id));
                }
                if exercise.target_reps_min > exercise.target_reps_max {
                    errors.push(format!(
                        "Exercise '{}' has an inverted rep range {}-{}",
                        exercise.id, exercise.target_reps_min, exercise.target_reps_max
                    ));
                }
            }
        }

        errors
    }
}

fn exercise(id: &str, name: &str, rest_seconds: u32, reps: (u32, u32), default_sets: u32) -> Exercise {
    Exercise {
        id: id.into(),
        name: name.into(),
        rest_seconds,
        target_reps_min: reps.0,
        target_reps_max: reps.1,
        default_sets,
    }
}

/// Builds the default program with fresh allocations
pub fn build_default_program() -> Program {
    let push = WorkoutType {
        id: "push".into(),
        name: "Push".into(),
        day: CycleDay::Push,
        exercises: vec![
            exercise("bench_press", "Bench Press", 150, (6, 10), 3),
            exercise("overhead_press", "Overhead Press", 120, (6, 10), 3),
            exercise("incline_db_press", "Incline Dumbbell Press", 90, (8, 12), 3),
            exercise("lateral_raise", "Lateral Raise", 60, (12, 15), 3),
            exercise("triceps_pushdown", "Triceps Pushdown", 60, (10, 15), 3),
        ],
    };

    let pull = WorkoutType {
        id: "pull".into(),
        name: "Pull".into(),
        day: CycleDay::Pull,
        exercises: vec![
            exercise("deadlift", "Deadlift", 180, (3, 6), 3),
            exercise("barbell_row", "Barbell Row", 120, (6, 10), 3),
            exercise("lat_pulldown", "Lat Pulldown", 90, (8, 12), 3),
            exercise("face_pull", "Face Pull", 60, (12, 15), 3),
            exercise("biceps_curl", "Biceps Curl", 60, (10, 15), 3),
        ],
    };

    let legs = WorkoutType {
        id: "legs".into(),
        name: "Legs".into(),
        day: CycleDay::Legs,
        exercises: vec![
            exercise("squat", "Back Squat", 180, (5, 8), 3),
            exercise("romanian_deadlift", "Romanian Deadlift", 120, (8, 10), 3),
            exercise("leg_press", "Leg Press", 120, (10, 12), 3),
            exercise("leg_curl", "Leg Curl", 60, (10, 15), 3),
            exercise("calf_raise", "Calf Raise", 60, (12, 20), 4),
        ],
    };

    Program {
        workout_types: vec![push, pull, legs],
    }
}
