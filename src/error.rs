//! Domain error types: telemetry acquisition and configuration validation.

use thiserror::Error;

/// Why a poll produced no temperature. All variants collapse into
/// "no reading this cycle" for the control loop.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Feed unreachable, timed out, or answered with a non-2xx status.
    #[error("telemetry feed unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// Body was not JSON, or the node tree lacked the expected arrays.
    #[error("telemetry document malformed: {0}")]
    Decode(String),

    /// Valid document, but no CPU-class node carried a parsable "CPU Package" sensor.
    #[error("no CPU Package temperature found in telemetry")]
    SensorNotFound,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("control.low_threshold ({low}) must be below control.auto_threshold ({auto})")]
    ThresholdOrder { low: f64, auto: f64 },

    #[error("{field} must be within 0-100%, got {value}")]
    SpeedOutOfRange { field: &'static str, value: u8 },

    #[error("{field} must be between 0 and {max} seconds, got {value}")]
    DurationOutOfRange { field: &'static str, value: f64, max: f64 },

    #[error("bmc.host is empty; set it in the config file or FANBRIDGE_IPMI_HOST")]
    MissingHost,

    #[error("commands.set_speed must contain a {{{{SPEED_HEX}}}} or {{{{SPEED}}}} placeholder")]
    MissingSpeedPlaceholder,
}
