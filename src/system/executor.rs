//! ipmitool subprocess executor.
//! Runs one command against the remote BMC over LAN, bounded by its timeout tier,
//! and classifies the result into success, ambiguous success, or failure.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, trace};

use crate::config::types::{BmcSettings, RawCommandSettings, MAX_DURATION_SECS};
use crate::system::commands::{IpmiCommand, TimeoutTier};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Non-zero exit with empty stderr on a raw command that prints nothing.
    /// Some iDRAC firmware does this after applying the command; the effect is unverified.
    AmbiguousSuccess,
    Failure(String),
}

impl CommandOutcome {
    /// Success or ambiguous success: the believed remote state may advance.
    pub fn took_effect(&self) -> bool {
        !matches!(self, CommandOutcome::Failure(_))
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Success => write!(f, "success"),
            CommandOutcome::AmbiguousSuccess => write!(f, "ambiguous success"),
            CommandOutcome::Failure(reason) => write!(f, "failure: {}", reason),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: IpmiCommand) -> CommandOutcome;
}

/// Outcome plus captured stdout, for commands whose output is wanted.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub outcome: CommandOutcome,
    pub stdout: String,
}

/// Classify a finished ipmitool process.
pub fn classify(exit_ok: bool, exit_code: Option<i32>, stderr: &str, expects_output: bool) -> CommandOutcome {
    if exit_ok {
        return CommandOutcome::Success;
    }

    let code = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
    let stderr = stderr.trim();

    if !stderr.is_empty() {
        CommandOutcome::Failure(format!("exit code {}: {}", code, stderr))
    } else if !expects_output {
        CommandOutcome::AmbiguousSuccess
    } else {
        CommandOutcome::Failure(format!("exit code {} with no diagnostic output", code))
    }
}

pub struct IpmitoolRunner {
    bmc: BmcSettings,
    raw: RawCommandSettings,
}

impl IpmitoolRunner {
    pub fn new(bmc: BmcSettings, raw: RawCommandSettings) -> Self {
        Self { bmc, raw }
    }

    /// Out-of-range settings are clamped to `MAX_DURATION_SECS`.
    fn timeout_for(&self, command: IpmiCommand) -> Duration {
        let secs = match command.timeout_tier() {
            TimeoutTier::Control => self.bmc.control_timeout_secs,
            TimeoutTier::Listing => self.bmc.listing_timeout_secs,
        };
        Duration::try_from_secs_f64(secs.min(MAX_DURATION_SECS))
            .unwrap_or(Duration::from_secs_f64(MAX_DURATION_SECS))
    }

    /// Interface and credential flags followed by the command arguments.
    pub fn full_args(&self, command: IpmiCommand) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-I".into(),
            self.bmc.interface.clone(),
            "-H".into(),
            self.bmc.host.clone(),
            "-p".into(),
            self.bmc.port.to_string(),
            "-U".into(),
            self.bmc.user.clone(),
            "-P".into(),
            self.bmc.password.clone(),
        ];
        args.extend(command.args(&self.raw));
        args
    }

    /// Command line for logs, with the password masked.
    pub fn display_command(&self, command: IpmiCommand) -> String {
        let args = self.full_args(command);
        let mut shown = Vec::with_capacity(args.len() + 1);
        shown.push(self.bmc.ipmitool_path.clone());
        let mut mask_next = false;
        for arg in args {
            if mask_next {
                shown.push("****".to_string());
                mask_next = false;
            } else {
                mask_next = arg == "-P";
                shown.push(arg);
            }
        }
        shown.join(" ")
    }

    fn build_ipmitool_command(&self, command: IpmiCommand) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.bmc.ipmitool_path);
        cmd.args(self.full_args(command))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Run `command` and keep its stdout.
    pub async fn invoke(&self, command: IpmiCommand) -> Invocation {
        let limit = self.timeout_for(command);
        debug!("Executing: {}", self.display_command(command));

        let mut cmd = self.build_ipmitool_command(command);
        let output = tokio::time::timeout(limit, cmd.output()).await;

        match output {
            Err(_) => Invocation {
                outcome: CommandOutcome::Failure(format!(
                    "timed out after {:.0}s: {}",
                    limit.as_secs_f64(),
                    self.display_command(command)
                )),
                stdout: String::new(),
            },
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => Invocation {
                outcome: CommandOutcome::Failure(format!(
                    "ipmitool executable not found at '{}'",
                    self.bmc.ipmitool_path
                )),
                stdout: String::new(),
            },
            Ok(Err(e)) => Invocation {
                outcome: CommandOutcome::Failure(format!("failed to execute ipmitool: {}", e)),
                stdout: String::new(),
            },
            Ok(Ok(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
                let stderr = String::from_utf8_lossy(&output.stderr);
                trace!("ipmitool exit={:?} stdout={:?} stderr={:?}", output.status.code(), stdout, stderr);
                Invocation {
                    outcome: classify(
                        output.status.success(),
                        output.status.code(),
                        &stderr,
                        command.expects_output(),
                    ),
                    stdout,
                }
            }
        }
    }
}

#[async_trait]
impl CommandRunner for IpmitoolRunner {
    async fn run(&self, command: IpmiCommand) -> CommandOutcome {
        self.invoke(command).await.outcome
    }
}

/// Logs what would be executed and reports success without touching the BMC.
pub struct DryRunRunner {
    inner: IpmitoolRunner,
}

impl DryRunRunner {
    pub fn new(bmc: BmcSettings, raw: RawCommandSettings) -> Self {
        Self {
            inner: IpmitoolRunner::new(bmc, raw),
        }
    }
}

#[async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, command: IpmiCommand) -> CommandOutcome {
        info!("[DRY RUN] Would execute: {}", self.inner.display_command(command));
        CommandOutcome::Success
    }
}
