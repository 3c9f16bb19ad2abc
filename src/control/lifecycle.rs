//! Control loop and lifecycle: periodic polling in steady state, then a one-shot
//! finalization pass on every exit path (return, shutdown signal, panic).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::control::decision::{decide, decide_shutdown, Band, Decision, FanAction, RemoteFanState, ThresholdPolicy};
use crate::control::fan_control::FanController;
use crate::telemetry::CpuTemperatureReader;

#[derive(Clone)]
pub struct ControlLoop {
    reader: Arc<CpuTemperatureReader>,
    controller: Arc<FanController>,
    policy: ThresholdPolicy,
    poll_interval: Duration,
}

impl ControlLoop {
    pub fn new(
        reader: Arc<CpuTemperatureReader>,
        controller: Arc<FanController>,
        policy: ThresholdPolicy,
        poll_interval: Duration,
    ) -> Self {
        Self {
            reader,
            controller,
            policy,
            poll_interval,
        }
    }

    /// One poll: read, decide, execute. Returns the new believed state.
    /// Without a reading nothing is sent and `known` is returned unchanged.
    pub async fn tick(&self, known: RemoteFanState) -> RemoteFanState {
        let Some(temp) = self.reader.read_or_absent().await else {
            warn!("No valid CPU temperature this cycle; BMC fan settings left as they are");
            return known;
        };

        let decision = decide(temp, known, &self.policy);
        info!("Decision: {} -> target {}", self.explain(temp), decision.action);

        let next = self.controller.apply(&decision, known).await;
        debug!("Believed BMC fan mode: {} -> {}", known, next);
        next
    }

    fn explain(&self, temp: f64) -> String {
        let p = &self.policy;
        match p.band(temp) {
            Band::Auto => format!("{:.1}°C >= {:.1}°C", temp, p.auto_threshold),
            Band::Medium => format!("{:.1}°C in [{:.1}, {:.1})°C", temp, p.low_threshold, p.auto_threshold),
            Band::Low => format!("{:.1}°C < {:.1}°C", temp, p.low_threshold),
        }
    }

    /// Poll forever, starting from `Unknown`.
    async fn steady_state(&self) {
        let mut known = RemoteFanState::Unknown;
        let mut cycle: u64 = 0;

        loop {
            cycle += 1;
            debug!("--- Cycle {} ---", cycle);
            known = self.tick(known).await;
            debug!("Waiting {:.1}s...", self.poll_interval.as_secs_f64());
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Shutdown pass. Reads once more and applies the shutdown policy.
    /// Returns the action taken.
    pub async fn finalize(&self) -> FanAction {
        info!("Fetching final CPU temperature to decide the BMC fan state on exit...");
        let temp = self.reader.read_or_absent().await;
        let action = decide_shutdown(temp, &self.policy);
        let auto = self.policy.auto_threshold;

        match temp {
            Some(t) if action == FanAction::SetAutoMode => {
                info!("Final temperature {:.1}°C >= {:.1}°C; restoring BMC auto fan mode", t, auto);
            }
            Some(t) => {
                warn!(
                    "Final temperature {:.1}°C < {:.1}°C; BMC fans stay on their last manual setting",
                    t, auto
                );
                warn!("BMC fans will NOT return to auto control after exit. Monitor server temperatures.");
            }
            None => {
                warn!("No CPU temperature at exit; forcing BMC auto fan mode as a precaution");
            }
        }

        if action == FanAction::SetAutoMode {
            let decision = Decision {
                action,
                enable_manual_first: false,
                on_success: RemoteFanState::Auto,
            };
            self.controller.apply(&decision, RemoteFanState::Unknown).await;
        }

        action
    }

    /// Run the steady-state loop until `shutdown` resolves or the loop dies,
    /// then finalize. Finalization is not raced against anything.
    pub async fn run<S>(self, shutdown: S) -> FanAction
    where
        S: Future<Output = ()>,
    {
        let worker = self.clone();
        let mut steady = tokio::spawn(async move { worker.steady_state().await });

        tokio::select! {
            joined = &mut steady => match joined {
                Ok(()) => info!("Control loop finished"),
                Err(e) if e.is_panic() => error!("Control loop crashed: {}", e),
                Err(e) => error!("Control loop stopped unexpectedly: {}", e),
            },
            () = shutdown => {
                info!("Shutdown requested; stopping control loop");
                steady.abort();
                // Abort lands at the next await; make sure no command is still in flight.
                let _ = steady.await;
            }
        }

        self.finalize().await
    }
}
