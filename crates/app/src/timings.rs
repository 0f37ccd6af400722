//! Timing knobs shared by the router, the synchronizer and the dispatcher.

use std::time::Duration;

use kiosk_bridge_domain::error::ValidationError;

/// Windows and delays used by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Throttle window for movement and per-beacon events.
    pub throttle_window: Duration,
    /// Delay before an active motion sensor reverts to `off`.
    pub motion_active_revert: Duration,
    /// Heartbeat for an idle motion sensor.
    pub motion_idle_revert: Duration,
    /// Pause between hub subscription attempts.
    pub subscribe_retry: Duration,
    /// Age after which a beacon sighting is evicted.
    pub beacon_ttl: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            throttle_window: Duration::from_secs(10),
            motion_active_revert: Duration::from_secs(5),
            motion_idle_revert: Duration::from_secs(10),
            subscribe_retry: Duration::from_secs(1),
            beacon_ttl: Duration::from_secs(3600),
        }
    }
}

impl Timings {
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroDuration`] naming the first zero value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let named = [
            ("throttle_window", self.throttle_window),
            ("motion_active_revert", self.motion_active_revert),
            ("motion_idle_revert", self.motion_idle_revert),
            ("subscribe_retry", self.subscribe_retry),
            ("beacon_ttl", self.beacon_ttl),
        ];
        match named.into_iter().find(|(_, value)| value.is_zero()) {
            Some((name, _)) => Err(ValidationError::ZeroDuration(name)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_kiosk_timings() {
        let timings = Timings::default();
        assert_eq!(timings.throttle_window, Duration::from_secs(10));
        assert_eq!(timings.motion_active_revert, Duration::from_secs(5));
        assert_eq!(timings.motion_idle_revert, Duration::from_secs(10));
        assert_eq!(timings.subscribe_retry, Duration::from_secs(1));
        assert!(timings.validate().is_ok());
    }

    #[test]
    fn should_reject_zero_duration() {
        let timings = Timings {
            motion_idle_revert: Duration::ZERO,
            ..Timings::default()
        };
        assert_eq!(
            timings.validate(),
            Err(ValidationError::ZeroDuration("motion_idle_revert"))
        );
    }
}
