//! Platform capability ports used when a rest interval ends.
//!
//! Every capability is best-effort: any of them may be missing on the
//! current platform, and a failure in one never stops the others.

/// Vibration pattern played at the end of a rest interval (on, off, on; ms)
pub const REST_COMPLETE_VIBRATION: [u64; 3] = [200, 100, 200];
pub const REST_COMPLETE_TITLE: &str = "Rest Complete";
pub const REST_COMPLETE_BODY: &str = "Time to get back to work!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    Default,
    Unsupported,
}

/// Why a capability could not be used
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AlertError {
    #[error("not supported on this platform")]
    Unsupported,

    #[error("{0}")]
    Failed(String),
}

pub trait PlatformAlerts: Send + Sync {
    fn play_sound(&self) -> Result<(), AlertError>;

    fn vibrate(&self, pattern_ms: &[u64]) -> Result<(), AlertError>;

    fn notification_permission(&self) -> NotificationPermission;

    fn request_notification_permission(&self) -> NotificationPermission {
        self.notification_permission()
    }

    fn show_notification(&self, title: &str, body: &str) -> Result<(), AlertError>;
}

/// A platform with no sound, vibration or notifications
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAlerts;

impl PlatformAlerts for SilentAlerts {
    fn play_sound(&self) -> Result<(), AlertError> {
        Err(AlertError::Unsupported)
    }

    fn vibrate(&self, _pattern_ms: &[u64]) -> Result<(), AlertError> {
        Err(AlertError::Unsupported)
    }

    fn notification_permission(&self) -> NotificationPermission {
        NotificationPermission::Unsupported
    }

    fn show_notification(&self, _title: &str, _body: &str) -> Result<(), AlertError> {
        Err(AlertError::Unsupported)
    }
}

/// Which alerts the user wants at the end of a rest interval
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AlertSettings {
    pub sound: bool,
    pub vibration: bool,
    pub notifications: bool,
}

impl From<&crate::config::TimerConfig> for AlertSettings {
    fn from(config: &crate::config::TimerConfig) -> Self {
        Self {
            sound: config.sound_enabled,
            vibration: config.vibration_enabled,
            notifications: config.notifications_enabled,
        }
    }
}

/// What actually went out when the completion bundle fired
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlertReport {
    pub sound: bool,
    pub vibration: bool,
    pub notification: bool,
}

/// Fire the rest-complete bundle; each alert is attempted independently
pub fn fire_rest_complete(platform: &dyn PlatformAlerts, settings: AlertSettings) -> AlertReport {
    let mut report = AlertReport::default();

    if settings.sound {
        match platform.play_sound() {
            Ok(()) => report.sound = true,
            Err(e) => tracing::warn!("Rest complete sound failed: {}", e),
        }
    }

    if settings.vibration {
        match platform.vibrate(&REST_COMPLETE_VIBRATION) {
            Ok(()) => report.vibration = true,
            Err(e) => tracing::debug!("Rest complete vibration skipped: {}", e),
        }
    }

    if settings.notifications
        && platform.notification_permission() == NotificationPermission::Granted
    {
        match platform.show_notification(REST_COMPLETE_TITLE, REST_COMPLETE_BODY) {
            Ok(()) => report.notification = true,
            Err(e) => tracing::warn!("Rest complete notification failed: {}", e),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_error_messages() {
        assert_eq!(AlertError::Unsupported.to_string(), "not supported on this platform");
        assert_eq!(AlertError::Failed("speaker busy".into()).to_string(), "speaker busy");

        let err: Box<dyn std::error::Error + Send + Sync> = Box::new(AlertError::Unsupported);
        assert_eq!(err.to_string(), "not supported on this platform");
    }

    #[test]
    fn test_silent_platform_reports_nothing_sent() {
        let settings = AlertSettings {
            sound: true,
            vibration: true,
            notifications: true,
        };
        assert_eq!(fire_rest_complete(&SilentAlerts, settings), AlertReport::default());
    }
}
