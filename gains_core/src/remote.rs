//! Workout log backend contract.
//!
//! The session engine never talks to storage directly: every durable record
//! of a workout goes through [`WorkoutLogApi`]. Implementations may be
//! remote services or local files; failures surface as
//! [`Error::RemoteSync`](crate::Error::RemoteSync).

use crate::{CompletionReceipt, NewSetLog, Result, SetLog, WorkoutLog};
use async_trait::async_trait;

#[async_trait]
pub trait WorkoutLogApi: Send + Sync {
    /// Open a new workout log for a workout type
    async fn start_workout(&self, workout_type_id: &str) -> Result<WorkoutLog>;

    /// Record a completed set; the returned log says whether it was a PR
    async fn log_set(&self, set: &NewSetLog) -> Result<SetLog>;

    /// Correct the weight and reps of an already recorded set
    async fn update_set(&self, set_log_id: &str, weight: f64, reps: u32) -> Result<SetLog>;

    async fn delete_set_log(&self, set_log_id: &str) -> Result<()>;

    /// Close the workout log and advance the rotation
    async fn complete_workout(
        &self,
        workout_log_id: &str,
        total_volume: f64,
        duration_seconds: u64,
    ) -> Result<CompletionReceipt>;
}
