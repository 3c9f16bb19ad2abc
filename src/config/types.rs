//! Controller configuration structs, defaults, and validation.

use serde::{Deserialize, Serialize};

use crate::control::decision::ThresholdPolicy;
use crate::error::ConfigError;
use crate::telemetry::extractor::{CPU_ICON_SUFFIX, DEFAULT_CPU_KEYWORDS};

/// Upper bound for every interval and timeout setting (one day).
pub const MAX_DURATION_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub telemetry: TelemetrySettings,
    pub control: ControlSettings,
    pub bmc: BmcSettings,
    pub commands: RawCommandSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    pub url: String,
    pub timeout_secs: f64,
    /// Hardware labels containing any of these (case-insensitive) count as CPUs.
    pub cpu_keywords: Vec<String>,
    /// Hardware whose ImageURL ends with this counts as a CPU. Empty disables the icon check.
    pub cpu_icon_suffix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub poll_interval_secs: f64,
    pub low_threshold: f64,  // below: manual low speed
    pub auto_threshold: f64, // at or above: BMC auto mode
    pub low_speed: u8,       // 0-100%
    pub medium_speed: u8,    // 0-100%
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BmcSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub interface: String,
    pub ipmitool_path: String,
    pub control_timeout_secs: f64,
    pub listing_timeout_secs: f64,
}

/// Vendor raw frames, space separated. Dell defaults; confirm per server model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCommandSettings {
    pub disable_auto: String,
    pub enable_auto: String,
    pub set_speed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub log_level: String,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8085/data.json".to_string(),
            timeout_secs: 4.0,
            cpu_keywords: DEFAULT_CPU_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            cpu_icon_suffix: CPU_ICON_SUFFIX.to_string(),
        }
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5.0,
            low_threshold: 60.0,
            auto_threshold: 70.0,
            low_speed: 10,
            medium_speed: 50,
        }
    }
}

impl Default for BmcSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 623,
            user: "root".to_string(),
            password: String::new(),
            interface: "lanplus".to_string(),
            ipmitool_path: "ipmitool".to_string(),
            control_timeout_secs: 15.0,
            listing_timeout_secs: 45.0,
        }
    }
}

impl Default for RawCommandSettings {
    fn default() -> Self {
        Self {
            disable_auto: "0x30 0x30 0x01 0x00".to_string(),
            enable_auto: "0x30 0x30 0x01 0x01".to_string(),
            set_speed: "0x30 0x30 0x02 0xff {{SPEED_HEX}}".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Check the invariants the control loop relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let control = &self.control;
        if control.low_threshold.is_nan()
            || control.auto_threshold.is_nan()
            || control.low_threshold >= control.auto_threshold
        {
            return Err(ConfigError::ThresholdOrder {
                low: control.low_threshold,
                auto: control.auto_threshold,
            });
        }

        for (field, value) in [
            ("control.low_speed", control.low_speed),
            ("control.medium_speed", control.medium_speed),
        ] {
            if value > 100 {
                return Err(ConfigError::SpeedOutOfRange { field, value });
            }
        }

        for (field, value) in [
            ("control.poll_interval_secs", control.poll_interval_secs),
            ("telemetry.timeout_secs", self.telemetry.timeout_secs),
            ("bmc.control_timeout_secs", self.bmc.control_timeout_secs),
            ("bmc.listing_timeout_secs", self.bmc.listing_timeout_secs),
        ] {
            if !value.is_finite() || value <= 0.0 || value > MAX_DURATION_SECS {
                return Err(ConfigError::DurationOutOfRange {
                    field,
                    value,
                    max: MAX_DURATION_SECS,
                });
            }
        }

        if self.bmc.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }

        let template = &self.commands.set_speed;
        if !template.contains("{{SPEED_HEX}}") && !template.contains("{{SPEED}}") {
            return Err(ConfigError::MissingSpeedPlaceholder);
        }

        Ok(())
    }

    pub fn policy(&self) -> ThresholdPolicy {
        ThresholdPolicy {
            low_threshold: self.control.low_threshold,
            auto_threshold: self.control.auto_threshold,
            low_speed: self.control.low_speed,
            medium_speed: self.control.medium_speed,
        }
    }

    /// Copy safe to print or log: the BMC password is replaced.
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        if !copy.bmc.password.is_empty() {
            copy.bmc.password = "********".to_string();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ControllerConfig {
        let mut config = ControllerConfig::default();
        config.bmc.host = "10.10.10.194".to_string();
        config
    }

    #[test]
    fn defaults_validate_once_host_is_set() {
        assert_eq!(ControllerConfig::default().validate(), Err(ConfigError::MissingHost));
        assert_eq!(valid().validate(), Ok(()));
    }

    #[test]
    fn rejects_inverted_or_equal_thresholds() {
        let mut config = valid();
        config.control.low_threshold = 70.0;
        config.control.auto_threshold = 70.0;
        assert!(matches!(config.validate(), Err(ConfigError::ThresholdOrder { .. })));

        config.control.low_threshold = 80.0;
        assert!(matches!(config.validate(), Err(ConfigError::ThresholdOrder { .. })));
    }

    #[test]
    fn rejects_speed_above_100() {
        let mut config = valid();
        config.control.medium_speed = 101;
        assert_eq!(
            config.validate(),
            Err(ConfigError::SpeedOutOfRange { field: "control.medium_speed", value: 101 })
        );
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut config = valid();
        config.control.poll_interval_secs = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DurationOutOfRange { field: "control.poll_interval_secs", .. })
        ));
    }

    #[test]
    fn rejects_timeout_too_large_for_a_duration() {
        let mut config = valid();
        config.bmc.control_timeout_secs = 1e30;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DurationOutOfRange { field: "bmc.control_timeout_secs", .. })
        ));

        config.bmc.control_timeout_secs = MAX_DURATION_SECS;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_speed_template_without_placeholder() {
        let mut config = valid();
        config.commands.set_speed = "0x30 0x30 0x02 0xff".to_string();
        assert_eq!(config.validate(), Err(ConfigError::MissingSpeedPlaceholder));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{"bmc": {"host": "bmc.lan"}, "control": {"low_threshold": 55}}"#)
                .unwrap();
        assert_eq!(config.bmc.host, "bmc.lan");
        assert_eq!(config.bmc.port, 623);
        assert_eq!(config.control.low_threshold, 55.0);
        assert_eq!(config.control.auto_threshold, 70.0);
        assert_eq!(config.telemetry.timeout_secs, 4.0);
    }

    #[test]
    fn masked_hides_password() {
        let mut config = valid();
        config.bmc.password = "calvin".to_string();
        let masked = config.masked();
        assert_eq!(masked.bmc.password, "********");
        assert_eq!(config.bmc.password, "calvin");
    }
}
