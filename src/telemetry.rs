//! TelemetrySource trait and the CPU package temperature reader built on it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

pub mod extractor;
pub mod ohm_http;
pub mod types;

pub use ohm_http::OhmHttpSource;

use crate::config::types::TelemetrySettings;
use crate::error::TelemetryError;
use extractor::{max_cpu_package_temp, CpuNodePredicate, NameOrIconHeuristic};
use types::SensorNode;

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Fetch one hardware snapshot. Single attempt, no retries.
    async fn fetch_snapshot(&self) -> Result<SensorNode, TelemetryError>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

/// Produces one `TemperatureReading` per call: fetch, then extract.
pub struct CpuTemperatureReader {
    source: Arc<dyn TelemetrySource>,
    predicate: Box<dyn CpuNodePredicate>,
}

impl CpuTemperatureReader {
    pub fn new(source: Arc<dyn TelemetrySource>, predicate: Box<dyn CpuNodePredicate>) -> Self {
        Self { source, predicate }
    }

    /// Reader using the name/icon heuristic configured in `settings`.
    pub fn from_settings(source: Arc<dyn TelemetrySource>, settings: &TelemetrySettings) -> Self {
        let heuristic = NameOrIconHeuristic::new(&settings.cpu_keywords, &settings.cpu_icon_suffix);
        Self::new(source, Box::new(heuristic))
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    pub async fn read(&self) -> Result<f64, TelemetryError> {
        let snapshot = self.source.fetch_snapshot().await?;
        max_cpu_package_temp(&snapshot, self.predicate.as_ref())
    }

    /// Like [`read`](Self::read), with every error logged and collapsed into `None`.
    pub async fn read_or_absent(&self) -> Option<f64> {
        match self.read().await {
            Ok(temp) => {
                info!("Local CPU Package temperature: {:.1}°C", temp);
                Some(temp)
            }
            Err(TelemetryError::SensorNotFound) => {
                warn!("No CPU Package temperature found in {}", self.describe());
                warn!("Make sure OpenHardwareMonitor is running with its web server enabled and detects the CPU package sensor.");
                None
            }
            Err(e) => {
                warn!("Telemetry unavailable from {}: {}", self.describe(), e);
                None
            }
        }
    }
}
