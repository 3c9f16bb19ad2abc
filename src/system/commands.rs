//! Logical BMC commands and their translation into ipmitool arguments.
//! Raw byte strings come from configuration; speed percentages are rendered
//! into the `{{SPEED_HEX}}` / `{{SPEED}}` placeholder as a hex byte.

use std::fmt;

use crate::config::types::RawCommandSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpmiCommand {
    EnableAuto,
    DisableAutoEnableManual,
    /// 0-100%
    SetSpeedPercentage(u8),
    SdrList,
    McInfo,
}

/// Which configured timeout bounds a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutTier {
    Control,
    Listing,
}

impl IpmiCommand {
    /// Arguments after the interface/credential flags.
    pub fn args(&self, raw: &RawCommandSettings) -> Vec<String> {
        match self {
            IpmiCommand::EnableAuto => raw_args(&raw.enable_auto),
            IpmiCommand::DisableAutoEnableManual => raw_args(&raw.disable_auto),
            IpmiCommand::SetSpeedPercentage(percent) => {
                raw_args(&interpolate_command(&raw.set_speed, &speed_hex(*percent)))
            }
            IpmiCommand::SdrList => vec!["sdr".to_string(), "list".to_string()],
            IpmiCommand::McInfo => vec!["mc".to_string(), "info".to_string()],
        }
    }

    /// Raw OEM control frames print nothing on success.
    pub fn expects_output(&self) -> bool {
        matches!(self, IpmiCommand::SdrList | IpmiCommand::McInfo)
    }

    pub fn timeout_tier(&self) -> TimeoutTier {
        if self.expects_output() {
            TimeoutTier::Listing
        } else {
            TimeoutTier::Control
        }
    }
}

impl fmt::Display for IpmiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpmiCommand::EnableAuto => write!(f, "enable auto fan control"),
            IpmiCommand::DisableAutoEnableManual => write!(f, "disable auto fan control (manual mode)"),
            IpmiCommand::SetSpeedPercentage(p) => write!(f, "set all fans to {}% ({})", p, speed_hex(*p)),
            IpmiCommand::SdrList => write!(f, "sdr list"),
            IpmiCommand::McInfo => write!(f, "mc info"),
        }
    }
}

/// 10 -> "0x0a". Values above 100 are clamped.
pub fn speed_hex(percent: u8) -> String {
    format!("0x{:02x}", percent.min(100))
}

/// Substitute {{SPEED_HEX}} or {{SPEED}} in command bytes string.
pub fn interpolate_command(template: &str, speed_value: &str) -> String {
    template
        .replace("{{SPEED_HEX}}", speed_value)
        .replace("{{SPEED}}", speed_value)
}

fn raw_args(bytes: &str) -> Vec<String> {
    std::iter::once("raw".to_string())
        .chain(bytes.split_whitespace().map(str::to_string))
        .collect()
}
