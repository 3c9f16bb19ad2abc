//! Applies decisions to the remote BMC and derives the next believed fan state
//! from the command outcomes.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::control::decision::{Decision, FanAction, RemoteFanState};
use crate::system::commands::IpmiCommand;
use crate::system::executor::{CommandOutcome, CommandRunner};

pub struct FanController {
    runner: Arc<dyn CommandRunner>,
}

impl FanController {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Execute `decision` and return the new believed state: `on_success` if every
    /// issued command took effect, `Unknown` on any failure, `known` for a no-op.
    pub async fn apply(&self, decision: &Decision, known: RemoteFanState) -> RemoteFanState {
        match decision.action {
            FanAction::NoOp => known,
            FanAction::SetAutoMode => {
                if self.issue(IpmiCommand::EnableAuto).await.took_effect() {
                    info!("BMC fan control set to auto mode");
                    RemoteFanState::Auto
                } else {
                    error!("Failed to set BMC fan control to auto mode; remote fan mode now unknown");
                    RemoteFanState::Unknown
                }
            }
            FanAction::SetManualSpeed(percent) => {
                if decision.enable_manual_first {
                    if !self.issue(IpmiCommand::DisableAutoEnableManual).await.took_effect() {
                        error!(
                            "Could not enter manual fan mode; not setting fan speed to {}%. Remote fan mode now unknown",
                            percent
                        );
                        return RemoteFanState::Unknown;
                    }
                    info!("BMC fan control switched to manual mode");
                }

                if self.issue(IpmiCommand::SetSpeedPercentage(percent)).await.took_effect() {
                    info!("BMC fan speed set to {}%", percent);
                    decision.on_success
                } else {
                    error!("Failed to set BMC fan speed to {}%; remote fan mode now unknown", percent);
                    RemoteFanState::Unknown
                }
            }
        }
    }

    /// Run one command and log its classified outcome.
    async fn issue(&self, command: IpmiCommand) -> CommandOutcome {
        info!("BMC: {}...", command);
        let outcome = self.runner.run(command).await;

        match &outcome {
            CommandOutcome::Success => {}
            CommandOutcome::AmbiguousSuccess => warn!(
                "BMC: '{}' exited non-zero with empty stderr; assuming it was applied (unverified)",
                command
            ),
            CommandOutcome::Failure(reason) => error!("BMC: '{}' failed: {}", command, reason),
        }

        outcome
    }
}
