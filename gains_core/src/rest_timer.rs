//! Rest countdown between sets.
//!
//! `Idle -> Running -> Expired -> Idle`. The timer is a plain state machine
//! advanced one second per [`RestTimer::tick`]; scheduling the ticks is the
//! caller's job (see [`crate::ticker::Ticker`]). Reaching zero fires the
//! rest-complete alert bundle exactly once, after the state change has been
//! applied, so an alert failure can never leave the timer half-updated.

use crate::alerts::{fire_rest_complete, AlertReport, AlertSettings, PlatformAlerts};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestPhase {
    Idle,
    Running,
    Expired,
}

pub struct RestTimer {
    phase: RestPhase,
    remaining_seconds: u32,
    total_seconds: u32,
    default_seconds: u32,
    settings: AlertSettings,
    platform: Arc<dyn PlatformAlerts>,
}

impl RestTimer {
    pub fn new(default_seconds: u32, settings: AlertSettings, platform: Arc<dyn PlatformAlerts>) -> Self {
        Self {
            phase: RestPhase::Idle,
            remaining_seconds: 0,
            total_seconds: default_seconds,
            default_seconds,
            settings,
            platform,
        }
    }

    pub fn phase(&self) -> RestPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == RestPhase::Running
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    /// Arm the timer for `seconds`; allowed from any phase
    pub fn start(&mut self, seconds: u32) {
        self.total_seconds = seconds;
        self.remaining_seconds = seconds;
        if seconds == 0 {
            // Nothing to count down, so no alerts either
            self.phase = RestPhase::Idle;
            return;
        }
        self.phase = RestPhase::Running;
        tracing::debug!("Rest timer started for {}s", seconds);
    }

    pub fn start_default(&mut self) {
        self.start(self.default_seconds)
    }

    /// Advance one second. Returns the alert report when this tick expired
    /// the timer; ticks outside `Running` are ignored.
    pub fn tick(&mut self) -> Option<AlertReport> {
        if self.phase != RestPhase::Running {
            return None;
        }

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return None;
        }

        self.phase = RestPhase::Expired;
        tracing::info!("Rest complete after {}s", self.total_seconds);
        Some(fire_rest_complete(self.platform.as_ref(), self.settings))
    }

    /// Abandon the current interval without any completion alerts
    pub fn skip(&mut self) {
        self.remaining_seconds = 0;
        self.phase = RestPhase::Idle;
        tracing::debug!("Rest timer skipped");
    }

    /// Acknowledge an expired timer
    pub fn dismiss(&mut self) {
        if self.phase == RestPhase::Expired {
            self.phase = RestPhase::Idle;
        }
    }

    /// Percentage of the interval already elapsed (0 when nothing is armed)
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 0.0;
        }
        let elapsed = self.total_seconds.saturating_sub(self.remaining_seconds);
        elapsed as f64 / self.total_seconds as f64 * 100.0
    }

    pub fn formatted_remaining(&self) -> String {
        format_clock(self.remaining_seconds as u64)
    }
}

/// `m:ss`; minutes keep counting past 59
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertError, NotificationPermission, SilentAlerts};
    use std::sync::Mutex;

    /// Records every capability call; failing capabilities can be chosen
    #[derive(Default)]
    struct RecordingAlerts {
        calls: Mutex<Vec<String>>,
        fail_sound: bool,
        permission: Option<NotificationPermission>,
    }

    impl RecordingAlerts {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PlatformAlerts for RecordingAlerts {
        fn play_sound(&self) -> Result<(), AlertError> {
            self.calls.lock().unwrap().push("sound".into());
            if self.fail_sound {
                Err(AlertError::Failed("autoplay blocked".into()))
            } else {
                Ok(())
            }
        }

        fn vibrate(&self, pattern_ms: &[u64]) -> Result<(), AlertError> {
            self.calls.lock().unwrap().push(format!("vibrate {:?}", pattern_ms));
            Ok(())
        }

        fn notification_permission(&self) -> NotificationPermission {
            self.permission.unwrap_or(NotificationPermission::Default)
        }

        fn show_notification(&self, title: &str, _body: &str) -> Result<(), AlertError> {
            self.calls.lock().unwrap().push(format!("notify {}", title));
            Ok(())
        }
    }

    fn all_alerts() -> AlertSettings {
        AlertSettings {
            sound: true,
            vibration: true,
            notifications: true,
        }
    }

    #[test]
    fn test_full_countdown_expires_with_full_progress() {
        let platform = Arc::new(RecordingAlerts::default());
        let mut timer = RestTimer::new(90, all_alerts(), platform.clone());
        timer.start(90);

        let mut reports = Vec::new();
        for _ in 0..90 {
            if let Some(report) = timer.tick() {
                reports.push(report);
            }
        }

        assert_eq!(timer.phase(), RestPhase::Expired);
        assert_eq!(timer.remaining_seconds(), 0);
        assert_eq!(timer.progress(), 100.0);
        assert_eq!(reports.len(), 1, "bundle fires exactly once");
        assert_eq!(platform.calls(), vec!["sound", "vibrate [200, 100, 200]"]);
    }

    #[test]
    fn test_skip_midway_goes_idle_without_alerts() {
        let platform = Arc::new(RecordingAlerts::default());
        let mut timer = RestTimer::new(90, all_alerts(), platform.clone());
        timer.start(90);
        for _ in 0..30 {
            assert!(timer.tick().is_none());
        }

        timer.skip();
        assert_eq!(timer.remaining_seconds(), 0);
        assert_eq!(timer.phase(), RestPhase::Idle);

        // Further ticks do nothing
        assert!(timer.tick().is_none());
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_progress_is_zero_without_total() {
        let mut timer = RestTimer::new(0, all_alerts(), Arc::new(SilentAlerts));
        assert_eq!(timer.progress(), 0.0);
        timer.start(0);
        assert_eq!(timer.phase(), RestPhase::Idle);
        assert_eq!(timer.progress(), 0.0);
    }

    #[test]
    fn test_zero_second_start_stays_idle_without_alerts() {
        let platform = Arc::new(RecordingAlerts::default());
        let mut timer = RestTimer::new(90, all_alerts(), platform.clone());
        timer.start(0);

        assert_eq!(timer.phase(), RestPhase::Idle);
        assert!(!timer.is_active());
        assert!(timer.tick().is_none());
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_progress_midway() {
        let mut timer = RestTimer::new(60, all_alerts(), Arc::new(SilentAlerts));
        timer.start(60);
        for _ in 0..15 {
            timer.tick();
        }
        assert_eq!(timer.progress(), 25.0);
        assert_eq!(timer.formatted_remaining(), "0:45");
    }

    #[test]
    fn test_rearm_from_expired_and_dismiss() {
        let mut timer = RestTimer::new(2, all_alerts(), Arc::new(SilentAlerts));
        timer.start_default();
        timer.tick();
        timer.tick();
        assert_eq!(timer.phase(), RestPhase::Expired);

        timer.start(120);
        assert!(timer.is_active());
        assert_eq!(timer.total_seconds(), 120);

        timer.skip();
        timer.start(1);
        timer.tick();
        timer.dismiss();
        assert_eq!(timer.phase(), RestPhase::Idle);
    }

    #[test]
    fn test_sound_failure_does_not_block_other_alerts() {
        let platform = Arc::new(RecordingAlerts {
            fail_sound: true,
            permission: Some(NotificationPermission::Granted),
            ..Default::default()
        });
        let mut timer = RestTimer::new(1, all_alerts(), platform.clone());
        timer.start(1);

        let report = timer.tick().expect("expired");
        assert!(!report.sound);
        assert!(report.vibration);
        assert!(report.notification);
        assert_eq!(timer.phase(), RestPhase::Expired);
        assert_eq!(platform.calls().len(), 3);
    }

    #[test]
    fn test_notification_requires_permission_and_setting() {
        let denied = Arc::new(RecordingAlerts {
            permission: Some(NotificationPermission::Denied),
            ..Default::default()
        });
        let report = fire_rest_complete(denied.as_ref(), all_alerts());
        assert!(!report.notification);

        let granted = Arc::new(RecordingAlerts {
            permission: Some(NotificationPermission::Granted),
            ..Default::default()
        });
        let settings = AlertSettings {
            notifications: false,
            ..all_alerts()
        };
        let report = fire_rest_complete(granted.as_ref(), settings);
        assert!(!report.notification);
        assert!(!granted.calls().iter().any(|c| c.starts_with("notify")));
    }

    #[test]
    fn test_disabled_alerts_are_not_attempted() {
        let platform = Arc::new(RecordingAlerts::default());
        let settings = AlertSettings {
            sound: false,
            vibration: false,
            notifications: false,
        };
        let mut timer = RestTimer::new(1, settings, platform.clone());
        timer.start(1);
        assert_eq!(timer.tick(), Some(AlertReport::default()));
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_format_clock_has_no_hour_rollover() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(75), "1:15");
        assert_eq!(format_clock(3725), "62:05");
    }
}
