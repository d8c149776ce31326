//! Optimistic sync controller.
//!
//! Translates local mutation intents into [`WorkoutLogApi`] calls and
//! interprets the results. Local state is always updated first by the
//! session store; this controller only decides what happens on the remote
//! side and how failures are reported:
//!
//! - `log_set` / `update_set` failures are returned so the caller can roll
//!   back its optimistic change.
//! - `delete_set_log` runs detached (fire-and-forget); failures are logged.
//! - `complete_workout` failures are logged and reported as `false`.

use crate::{CompletionReceipt, NewSetLog, Result, SetLog, WorkoutLog, WorkoutLogApi};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// A weight is a personal record iff it strictly beats the stored maximum.
/// With no stored maximum any weight counts.
pub fn is_new_personal_record(previous_max: Option<f64>, weight: f64) -> bool {
    match previous_max {
        None => true,
        Some(max) => weight > max,
    }
}

#[derive(Clone)]
pub struct SyncController {
    api: Arc<dyn WorkoutLogApi>,
}

impl SyncController {
    pub fn new(api: Arc<dyn WorkoutLogApi>) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &Arc<dyn WorkoutLogApi> {
        &self.api
    }

    pub async fn start_workout(&self, workout_type_id: &str) -> Result<WorkoutLog> {
        let log = self.api.start_workout(workout_type_id).await?;
        tracing::info!("Started workout log {} ({})", log.id, workout_type_id);
        Ok(log)
    }

    /// Submit a completed set
    pub async fn log_set(&self, set: &NewSetLog) -> Result<SetLog> {
        match self.api.log_set(set).await {
            Ok(logged) => {
                tracing::debug!(
                    "Logged set {} of {} as {} (pr: {})",
                    set.set_number,
                    set.exercise_id,
                    logged.id,
                    logged.is_pr
                );
                Ok(logged)
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to log set {} of {}: {}",
                    set.set_number,
                    set.exercise_id,
                    e
                );
                Err(e)
            }
        }
    }

    pub async fn update_set(&self, set_log_id: &str, weight: f64, reps: u32) -> Result<SetLog> {
        self.api
            .update_set(set_log_id, weight, reps)
            .await
            .map_err(|e| {
                tracing::warn!("Failed to update set log {}: {}", set_log_id, e);
                e
            })
    }

    /// Delete a set log without waiting for the outcome
    ///
    /// Returns the handle of the background task, or `None` when no async
    /// runtime is available to run it (the delete is then skipped and the
    /// divergence logged).
    pub fn delete_set_log_detached(&self, set_log_id: String) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(
                "No async runtime available; set log {} was not deleted remotely",
                set_log_id
            );
            return None;
        };

        let api = Arc::clone(&self.api);
        Some(runtime.spawn(async move {
            match api.delete_set_log(&set_log_id).await {
                Ok(()) => tracing::debug!("Deleted set log {}", set_log_id),
                Err(e) => tracing::warn!(
                    "Failed to delete set log {} remotely, local and remote state now differ: {}",
                    set_log_id,
                    e
                ),
            }
        }))
    }

    /// Close the workout log; returns whether the backend acknowledged it
    pub async fn complete_workout(
        &self,
        workout_log_id: &str,
        total_volume: f64,
        duration_seconds: u64,
    ) -> bool {
        match self
            .api
            .complete_workout(workout_log_id, total_volume, duration_seconds)
            .await
        {
            Ok(CompletionReceipt { success: true }) => {
                tracing::info!(
                    "Completed workout {} (volume {}, {}s)",
                    workout_log_id,
                    total_volume,
                    duration_seconds
                );
                true
            }
            Ok(CompletionReceipt { success: false }) => {
                tracing::warn!("Backend declined completion of workout {}", workout_log_id);
                false
            }
            Err(e) => {
                tracing::warn!("Failed to complete workout {}: {}", workout_log_id, e);
                false
            }
        }
    }
}
