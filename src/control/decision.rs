//! Fan decision engine: maps a CPU temperature and the believed remote fan mode
//! to the next action. Pure; all I/O happens in the controller.

use std::fmt;

/// What we believe the BMC fan mode is. Never read back from the BMC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteFanState {
    #[default]
    Unknown,
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanAction {
    NoOp,
    SetAutoMode,
    /// 0-100%
    SetManualSpeed(u8),
}

/// Three contiguous bands: `[.., low)`, `[low, auto)`, `[auto, ..]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub low_threshold: f64,
    pub auto_threshold: f64,
    pub low_speed: u8,
    pub medium_speed: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Low,
    Medium,
    Auto,
}

impl ThresholdPolicy {
    pub fn band(&self, temp: f64) -> Band {
        if temp >= self.auto_threshold {
            Band::Auto
        } else if temp >= self.low_threshold {
            Band::Medium
        } else {
            Band::Low
        }
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: FanAction,
    /// Issue the manual-mode enable before the speed command. Only set when the
    /// believed state is not already `Manual`; speeds themselves are never deduplicated.
    pub enable_manual_first: bool,
    /// Believed state once the action took effect.
    pub on_success: RemoteFanState,
}

pub fn decide(temp: f64, known: RemoteFanState, policy: &ThresholdPolicy) -> Decision {
    let manual = |speed: u8| Decision {
        action: FanAction::SetManualSpeed(speed),
        enable_manual_first: known != RemoteFanState::Manual,
        on_success: RemoteFanState::Manual,
    };

    match policy.band(temp) {
        Band::Auto => Decision {
            action: FanAction::SetAutoMode,
            enable_manual_first: false,
            on_success: RemoteFanState::Auto,
        },
        Band::Medium => manual(policy.medium_speed),
        Band::Low => manual(policy.low_speed),
    }
}

/// Shutdown policy. Hot or blind: hand cooling back to the BMC.
/// Below the auto threshold the fans stay on their last manual setting; they will
/// not revert to BMC control on their own once this process is gone.
pub fn decide_shutdown(temp: Option<f64>, policy: &ThresholdPolicy) -> FanAction {
    match temp {
        Some(t) if t < policy.auto_threshold => FanAction::NoOp,
        _ => FanAction::SetAutoMode,
    }
}

impl fmt::Display for RemoteFanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFanState::Unknown => write!(f, "unknown"),
            RemoteFanState::Auto => write!(f, "auto"),
            RemoteFanState::Manual => write!(f, "manual"),
        }
    }
}

impl fmt::Display for FanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FanAction::NoOp => write!(f, "no-op"),
            FanAction::SetAutoMode => write!(f, "BMC auto fan mode"),
            FanAction::SetManualSpeed(p) => write!(f, "manual fan speed {}%", p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY: ThresholdPolicy = ThresholdPolicy {
        low_threshold: 60.0,
        auto_threshold: 70.0,
        low_speed: 10,
        medium_speed: 50,
    };

    fn action(temp: f64) -> FanAction {
        decide(temp, RemoteFanState::Unknown, &POLICY).action
    }

    #[test]
    fn bands_map_to_actions() {
        assert_eq!(action(35.0), FanAction::SetManualSpeed(10));
        assert_eq!(action(59.9), FanAction::SetManualSpeed(10));
        assert_eq!(action(65.0), FanAction::SetManualSpeed(50));
        assert_eq!(action(69.99), FanAction::SetManualSpeed(50));
        assert_eq!(action(85.0), FanAction::SetAutoMode);
    }

    #[test]
    fn boundaries_resolve_to_upper_band() {
        assert_eq!(action(60.0), FanAction::SetManualSpeed(50));
        assert_eq!(action(70.0), FanAction::SetAutoMode);
    }

    #[test]
    fn negative_and_extreme_readings_stay_in_bands() {
        assert_eq!(action(-10.0), FanAction::SetManualSpeed(10));
        assert_eq!(action(f64::MAX), FanAction::SetAutoMode);
    }

    #[test]
    fn manual_enable_only_when_not_already_manual() {
        for known in [RemoteFanState::Unknown, RemoteFanState::Auto] {
            let d = decide(50.0, known, &POLICY);
            assert!(d.enable_manual_first, "known={known}");
            assert_eq!(d.on_success, RemoteFanState::Manual);
        }

        let d = decide(65.0, RemoteFanState::Manual, &POLICY);
        assert!(!d.enable_manual_first);
        assert_eq!(d.action, FanAction::SetManualSpeed(50));
    }

    #[test]
    fn auto_band_never_requests_manual_enable() {
        let d = decide(72.0, RemoteFanState::Manual, &POLICY);
        assert_eq!(d.action, FanAction::SetAutoMode);
        assert!(!d.enable_manual_first);
        assert_eq!(d.on_success, RemoteFanState::Auto);
    }

    #[test]
    fn shutdown_policy_is_asymmetric() {
        assert_eq!(decide_shutdown(Some(75.0), &POLICY), FanAction::SetAutoMode);
        assert_eq!(decide_shutdown(Some(70.0), &POLICY), FanAction::SetAutoMode);
        assert_eq!(decide_shutdown(Some(55.0), &POLICY), FanAction::NoOp);
        assert_eq!(decide_shutdown(None, &POLICY), FanAction::SetAutoMode);
    }
}
