//! Session stopwatch.
//!
//! Elapsed time is always measured from the session start; pausing only
//! stops sampling, so the reading jumps forward to the true elapsed time on
//! resume. A session paused in an earlier run carries the reading taken
//! when it was paused, and the display stays frozen at that value.

use crate::rest_timer::format_clock;
use crate::{Clock, WorkoutSession};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct ElapsedTimer {
    started_at: DateTime<Utc>,
    elapsed_seconds: u64,
    paused: bool,
    clock: Arc<dyn Clock>,
}

impl ElapsedTimer {
    /// Start sampling immediately
    pub fn new(started_at: DateTime<Utc>, clock: Arc<dyn Clock>) -> Self {
        let mut timer = Self {
            started_at,
            elapsed_seconds: 0,
            paused: false,
            clock,
        };
        timer.sample();
        timer
    }

    /// Rebuild the stopwatch for a stored session, frozen if it is paused
    pub fn for_session(session: &WorkoutSession, clock: Arc<dyn Clock>) -> Self {
        let mut timer = Self::new(session.started_at, clock);
        if session.paused {
            if let Some(frozen) = session.paused_elapsed_seconds {
                timer.elapsed_seconds = frozen;
            }
            timer.set_paused(true);
        }
        timer
    }

    /// Take one reading; ignored while paused
    pub fn sample(&mut self) {
        if self.paused {
            return;
        }
        let elapsed = (self.clock.now() - self.started_at).num_seconds();
        self.elapsed_seconds = elapsed.max(0) as u64;
    }

    /// Flip pause; resuming samples straight away. Returns the new state.
    pub fn toggle_pause(&mut self) -> bool {
        self.set_paused(!self.paused);
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        if !paused {
            self.sample();
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn formatted(&self) -> String {
        format_clock(self.elapsed_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ManualClock;
    use chrono::Duration;

    fn timer_at(start: DateTime<Utc>) -> (ElapsedTimer, ManualClock) {
        let clock = ManualClock::new(start);
        (ElapsedTimer::new(start, Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_samples_from_session_start() {
        let start = Utc::now();
        let (mut timer, clock) = timer_at(start);
        assert_eq!(timer.elapsed_seconds(), 0);

        clock.advance(Duration::seconds(125));
        timer.sample();
        assert_eq!(timer.elapsed_seconds(), 125);
        assert_eq!(timer.formatted(), "2:05");
    }

    #[test]
    fn test_pause_freezes_reading_without_reset() {
        let start = Utc::now();
        let (mut timer, clock) = timer_at(start);
        clock.advance(Duration::seconds(60));
        timer.sample();

        assert!(timer.toggle_pause());
        clock.advance(Duration::seconds(30));
        timer.sample();
        assert_eq!(timer.elapsed_seconds(), 60);

        assert!(!timer.toggle_pause());
        assert_eq!(timer.elapsed_seconds(), 90);
    }

    fn paused_session(start: DateTime<Utc>, frozen: Option<u64>) -> WorkoutSession {
        WorkoutSession {
            workout_log_id: "log-1".into(),
            workout_type_id: "push".into(),
            workout_type_name: "Push".into(),
            exercises: vec![],
            current_exercise_index: 0,
            started_at: start,
            paused: true,
            paused_elapsed_seconds: frozen,
        }
    }

    #[test]
    fn test_paused_session_shows_frozen_reading() {
        let start = Utc::now();
        let clock = ManualClock::new(start + Duration::minutes(30));
        let session = paused_session(start, Some(600));

        let mut timer = ElapsedTimer::for_session(&session, Arc::new(clock.clone()));
        assert!(timer.is_paused());
        assert_eq!(timer.formatted(), "10:00");

        clock.advance(Duration::minutes(5));
        timer.sample();
        assert_eq!(timer.elapsed_seconds(), 600);

        // Resuming jumps to the true elapsed time
        timer.set_paused(false);
        assert_eq!(timer.elapsed_seconds(), 35 * 60);
    }

    #[test]
    fn test_paused_session_without_reading_freezes_now() {
        let start = Utc::now();
        let clock = ManualClock::new(start + Duration::seconds(90));
        let session = paused_session(start, None);

        let timer = ElapsedTimer::for_session(&session, Arc::new(clock));
        assert!(timer.is_paused());
        assert_eq!(timer.elapsed_seconds(), 90);
    }

    #[test]
    fn test_start_in_future_reads_zero() {
        let start = Utc::now();
        let clock = ManualClock::new(start - Duration::seconds(10));
        let timer = ElapsedTimer::new(start, Arc::new(clock));
        assert_eq!(timer.elapsed_seconds(), 0);
    }

    #[test]
    fn test_no_hour_rollover() {
        let start = Utc::now();
        let (mut timer, clock) = timer_at(start);
        clock.advance(Duration::minutes(95));
        timer.sample();
        assert_eq!(timer.formatted(), "95:00");
    }
}
