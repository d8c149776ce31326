//! Active workout session store.
//!
//! The store owns the in-progress [`WorkoutSession`] and is the only place it
//! is mutated. Every mutation is applied locally first, then mirrored to the
//! workout log through the [`SyncController`], and finally written to the
//! resume slot.
//!
//! Completing a set is the one operation that waits on the backend. It is
//! split into [`SessionStore::begin_complete_set`] (optimistic, synchronous)
//! and [`SessionStore::finish_complete_set`] (applies the backend answer) so
//! that other mutations may run while the call is in flight. The answer is
//! matched to its set by the set's stable key, not by position.

use crate::navigator::Navigable;
use crate::resume::ResumeStore;
use crate::sync::SyncController;
use crate::{
    Clock, Error, ExerciseProgress, NewSetLog, PreviousSet, Result, SetEntry, SetField, SetLog,
    WorkoutSession, WorkoutType,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// A set accepted by the workout log
#[derive(Clone, Debug, PartialEq)]
pub struct SetLogged {
    pub set_log_id: String,
    pub is_pr: bool,
}

/// Why a set was not completed
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SetRejection {
    #[error("no workout in progress")]
    NoSession,

    #[error("no set {set} in exercise {exercise}")]
    OutOfRange { exercise: usize, set: usize },

    #[error("weight and reps are both required")]
    MissingValues,

    #[error("set is already completed")]
    AlreadyCompleted,

    /// The backend call failed and the set was made editable again
    #[error("set was not saved: {0}")]
    RemoteFailed(String),

    /// The set disappeared locally before the backend answered
    #[error("set was removed before it was saved")]
    SetRemoved,
}

impl SetRejection {
    /// Whether the rejection came after an optimistic change was rolled back
    pub fn was_rolled_back(&self) -> bool {
        matches!(self, SetRejection::RemoteFailed(_))
    }
}

impl From<SetRejection> for Error {
    fn from(rejection: SetRejection) -> Self {
        match rejection {
            SetRejection::RemoteFailed(reason) => Error::RemoteSync(reason),
            other => Error::Validation(other.to_string()),
        }
    }
}

pub type CompleteSetResult = std::result::Result<SetLogged, SetRejection>;

/// A set submission waiting for the backend
#[derive(Clone, Debug)]
pub struct PendingSetLog {
    key: Uuid,
    request: NewSetLog,
}

impl PendingSetLog {
    pub fn request(&self) -> &NewSetLog {
        &self.request
    }
}

/// Totals of a finished workout
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutSummary {
    pub workout_log_id: String,
    pub workout_type_name: String,
    pub total_volume: f64,
    pub duration_seconds: u64,
    pub total_sets: usize,
    pub total_exercises: usize,
}

pub struct SessionStore {
    session: Option<WorkoutSession>,
    sync: SyncController,
    resume: ResumeStore,
    clock: Arc<dyn Clock>,
    background: Vec<JoinHandle<()>>,
}

impl SessionStore {
    pub fn new(sync: SyncController, resume: ResumeStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            session: None,
            sync,
            resume,
            clock,
            background: Vec::new(),
        }
    }

    pub fn session(&self) -> Option<&WorkoutSession> {
        self.session.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Install a session, replacing any previous one
    pub fn start(&mut self, session: WorkoutSession) {
        if let Some(previous) = &self.session {
            tracing::info!(
                "Replacing workout {} with {}",
                previous.workout_log_id,
                session.workout_log_id
            );
        }
        tracing::info!(
            "Workout {} ({}) in progress",
            session.workout_log_id,
            session.workout_type_name
        );
        self.session = Some(session);
        self.persist();
    }

    /// Open a workout log for `workout_type` and install its initial session
    pub async fn start_new(
        &mut self,
        workout_type: &WorkoutType,
        previous_sets: &HashMap<String, Vec<PreviousSet>>,
    ) -> Result<()> {
        let log = self.sync.start_workout(&workout_type.id).await?;
        let session = WorkoutSession::from_workout_type(&log, workout_type, |exercise_id| {
            previous_sets.get(exercise_id).cloned().unwrap_or_default()
        });
        self.start(session);
        Ok(())
    }

    /// Rehydrate from the resume slot; returns whether a session was found
    pub fn restore(&mut self) -> bool {
        match self.resume.load() {
            Some(snapshot) => {
                self.session = Some(snapshot.session);
                true
            }
            None => false,
        }
    }

    pub fn current_exercise_index(&self) -> Option<usize> {
        self.session.as_ref().map(|s| s.current_exercise_index)
    }

    pub fn current_exercise(&self) -> Option<&ExerciseProgress> {
        let session = self.session.as_ref()?;
        session.exercises.get(session.current_exercise_index)
    }

    /// Jump to an exercise; out-of-range indices are ignored
    pub fn set_current_exercise(&mut self, index: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if index >= session.exercises.len() || index == session.current_exercise_index {
            return;
        }
        session.current_exercise_index = index;
        tracing::debug!("Current exercise is now {}", index);
        self.persist();
    }

    pub fn next_exercise(&mut self) {
        if let Some(index) = self.current_exercise_index() {
            self.set_current_exercise(index + 1);
        }
    }

    pub fn previous_exercise(&mut self) {
        if let Some(index) = self.current_exercise_index() {
            if index > 0 {
                self.set_current_exercise(index - 1);
            }
        }
    }

    pub fn set_paused(&mut self, paused: bool) {
        let now = self.clock.now();
        if let Some(session) = self.session.as_mut() {
            if session.paused != paused {
                let elapsed = (now - session.started_at).num_seconds().max(0) as u64;
                session.paused = paused;
                session.paused_elapsed_seconds = paused.then_some(elapsed);
                self.persist();
            }
        }
    }

    /// Edit the weight or reps of a set that has not been completed yet
    pub fn update_set_field(&mut self, exercise: usize, set: usize, field: SetField) -> Result<()> {
        let entry = self.set_mut(exercise, set)?;
        if entry.completed {
            return Err(Error::Validation(format!(
                "set {} is already completed",
                entry.set_number
            )));
        }

        if let SetField::Weight(Some(weight)) = field {
            if !weight.is_finite() {
                return Err(Error::Validation(format!(
                    "weight must be a finite number, got {}",
                    weight
                )));
            }
        }

        match field {
            SetField::Weight(weight) => entry.weight = weight,
            SetField::Reps(reps) => entry.reps = reps,
        }
        tracing::debug!("Set {} of exercise {} edited: {:?}", set, exercise, field);
        self.persist();
        Ok(())
    }

    /// Optimistically mark a set completed and prepare its backend request
    pub fn begin_complete_set(
        &mut self,
        exercise: usize,
        set: usize,
    ) -> std::result::Result<PendingSetLog, SetRejection> {
        let now = self.clock.now();
        let session = self.session.as_mut().ok_or(SetRejection::NoSession)?;
        let workout_log_id = session.workout_log_id.clone();
        let progress = session
            .exercises
            .get_mut(exercise)
            .ok_or(SetRejection::OutOfRange { exercise, set })?;
        let exercise_id = progress.exercise.id.clone();
        let entry = progress
            .sets
            .get_mut(set)
            .ok_or(SetRejection::OutOfRange { exercise, set })?;

        // The completed flag doubles as the in-flight guard
        if entry.completed {
            return Err(SetRejection::AlreadyCompleted);
        }
        let (Some(weight), Some(reps)) = (entry.weight, entry.reps) else {
            return Err(SetRejection::MissingValues);
        };
        if !weight.is_finite() {
            return Err(SetRejection::MissingValues);
        }

        entry.completed = true;
        entry.completed_at = Some(now);
        let pending = PendingSetLog {
            key: entry.key,
            request: NewSetLog {
                workout_log_id,
                exercise_id,
                set_number: entry.set_number,
                weight,
                reps,
            },
        };

        self.persist();
        Ok(pending)
    }

    /// Apply the backend answer for a pending set
    pub fn finish_complete_set(
        &mut self,
        pending: PendingSetLog,
        outcome: Result<SetLog>,
    ) -> CompleteSetResult {
        let entry = self
            .session
            .as_mut()
            .filter(|s| s.workout_log_id == pending.request.workout_log_id)
            .and_then(|s| s.find_set_mut(pending.key));

        let result = match (entry, outcome) {
            (Some(entry), Ok(logged)) => {
                entry.remote_id = Some(logged.id.clone());
                Ok(SetLogged {
                    set_log_id: logged.id,
                    is_pr: logged.is_pr,
                })
            }
            (Some(entry), Err(e)) => {
                // Weight and reps stay as entered so the user can retry
                entry.completed = false;
                entry.completed_at = None;
                tracing::warn!(
                    "Rolled back set {} of {}: {}",
                    pending.request.set_number,
                    pending.request.exercise_id,
                    e
                );
                Err(SetRejection::RemoteFailed(e.to_string()))
            }
            (None, Ok(logged)) => {
                tracing::warn!(
                    "Set log {} arrived for a set that no longer exists; removing it",
                    logged.id
                );
                if let Some(handle) = self.sync.delete_set_log_detached(logged.id) {
                    self.background.push(handle);
                }
                return Err(SetRejection::SetRemoved);
            }
            (None, Err(_)) => return Err(SetRejection::SetRemoved),
        };

        self.persist();
        result
    }

    /// Complete a set: optimistic local change, backend call, reconcile
    pub async fn complete_set(&mut self, exercise: usize, set: usize) -> CompleteSetResult {
        let pending = self.begin_complete_set(exercise, set)?;
        let outcome = self.sync.log_set(pending.request()).await;
        self.finish_complete_set(pending, outcome)
    }

    /// Append an empty set numbered after the last one
    pub fn add_set(&mut self, exercise: usize) -> Result<()> {
        let progress = self.exercise_mut(exercise)?;
        let set_number = progress.sets.len() as u32 + 1;
        progress.sets.push(SetEntry::empty(set_number));
        tracing::debug!("Added set {} to exercise {}", set_number, exercise);
        self.persist();
        Ok(())
    }

    /// Remove a set and renumber the rest; the last set of an exercise stays.
    /// A set already known to the backend is deleted there in the background.
    pub fn delete_set(&mut self, exercise: usize, set: usize) -> Result<()> {
        let progress = self.exercise_mut(exercise)?;
        if set >= progress.sets.len() {
            return Err(Error::Validation(format!(
                "no set {} in exercise {}",
                set, exercise
            )));
        }
        if progress.sets.len() == 1 {
            return Err(Error::Validation(
                "an exercise must keep at least one set".into(),
            ));
        }

        let removed = progress.sets.remove(set);
        progress.renumber();
        tracing::debug!("Deleted set {} of exercise {}", removed.set_number, exercise);
        self.persist();

        if let Some(remote_id) = removed.remote_id {
            if let Some(handle) = self.sync.delete_set_log_detached(remote_id) {
                self.background.push(handle);
            }
        }
        Ok(())
    }

    /// Correct the values of a set the backend has already recorded
    ///
    /// Applied locally first; restored to the previous values if the backend
    /// rejects the change.
    pub async fn amend_set(&mut self, exercise: usize, set: usize, weight: f64, reps: u32) -> Result<()> {
        if !weight.is_finite() {
            return Err(Error::Validation(format!(
                "weight must be a finite number, got {}",
                weight
            )));
        }
        let entry = self.set_mut(exercise, set)?;
        if !entry.completed {
            return Err(Error::Validation(format!(
                "set {} has not been completed yet",
                entry.set_number
            )));
        }
        let Some(remote_id) = entry.remote_id.clone() else {
            return Err(Error::Validation(format!(
                "set {} is still being saved",
                entry.set_number
            )));
        };

        let key = entry.key;
        let previous = (entry.weight, entry.reps);
        entry.weight = Some(weight);
        entry.reps = Some(reps);
        self.persist();

        if let Err(e) = self.sync.update_set(&remote_id, weight, reps).await {
            if let Some(entry) = self.session.as_mut().and_then(|s| s.find_set_mut(key)) {
                entry.weight = previous.0;
                entry.reps = previous.1;
            }
            self.persist();
            return Err(e);
        }
        Ok(())
    }

    pub fn total_volume(&self) -> f64 {
        self.session.as_ref().map_or(0.0, WorkoutSession::total_volume)
    }

    pub fn is_complete(&self) -> bool {
        self.session.as_ref().is_some_and(WorkoutSession::is_complete)
    }

    pub fn active_set_index(&self, exercise: usize) -> Option<usize> {
        self.session
            .as_ref()?
            .exercises
            .get(exercise)?
            .active_set_index()
    }

    /// Whole seconds since the session started
    pub fn duration_seconds(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| {
            (self.clock.now() - s.started_at).num_seconds().max(0) as u64
        })
    }

    /// Close the workout on the backend and end the session
    ///
    /// If the backend does not acknowledge the completion the session and
    /// its resume snapshot are kept so the user can try again.
    pub async fn finish(&mut self) -> Result<WorkoutSummary> {
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| Error::Validation("no workout in progress".into()))?;
        if !session.is_complete() {
            return Err(Error::Validation(format!(
                "{} of {} sets completed",
                session.completed_sets(),
                session.total_sets()
            )));
        }

        let summary = WorkoutSummary {
            workout_log_id: session.workout_log_id.clone(),
            workout_type_name: session.workout_type_name.clone(),
            total_volume: session.total_volume(),
            duration_seconds: self.duration_seconds(),
            total_sets: session.completed_sets(),
            total_exercises: session.exercises.len(),
        };

        let acknowledged = self
            .sync
            .complete_workout(
                &summary.workout_log_id,
                summary.total_volume,
                summary.duration_seconds,
            )
            .await;
        if !acknowledged {
            return Err(Error::RemoteSync(format!(
                "workout {} could not be completed",
                summary.workout_log_id
            )));
        }

        self.resume.clear();
        self.session = None;
        Ok(summary)
    }

    /// Drop the session without completing it
    pub fn abandon(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!("Abandoned workout {}", session.workout_log_id);
        }
        self.resume.clear();
    }

    /// Wait for every background backend call started so far
    pub async fn settle(&mut self) {
        for handle in self.background.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!("Background sync task failed: {}", e);
            }
        }
    }

    fn exercise_mut(&mut self, exercise: usize) -> Result<&mut ExerciseProgress> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::Validation("no workout in progress".into()))?
            .exercises
            .get_mut(exercise)
            .ok_or_else(|| Error::Validation(format!("no exercise {}", exercise)))
    }

    fn set_mut(&mut self, exercise: usize, set: usize) -> Result<&mut SetEntry> {
        self.exercise_mut(exercise)?
            .sets
            .get_mut(set)
            .ok_or_else(|| Error::Validation(format!("no set {} in exercise {}", set, exercise)))
    }

    fn persist(&mut self) {
        if let Some(session) = &self.session {
            self.resume.save(session);
        }
    }
}

impl Navigable for SessionStore {
    fn advance(&mut self) {
        self.next_exercise();
    }

    fn retreat(&mut self) {
        self.previous_exercise();
    }
}
