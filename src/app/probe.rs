//! `--test`: one telemetry read and a read-only BMC query. Never changes fan settings.

use tracing::{error, info, warn};

use crate::system::commands::IpmiCommand;
use crate::system::executor::IpmitoolRunner;
use crate::telemetry::CpuTemperatureReader;

#[derive(Debug, Default)]
pub struct ProbeReport {
    pub temperature: Option<f64>,
    pub bmc_reachable: bool,
    pub fan_sensors: Vec<String>,
}

impl ProbeReport {
    pub fn healthy(&self) -> bool {
        self.temperature.is_some() && self.bmc_reachable
    }
}

/// `sdr list` rows naming a fan, trimmed.
pub fn fan_lines(sdr_output: &str) -> Vec<String> {
    sdr_output
        .lines()
        .filter(|line| line.to_lowercase().contains("fan"))
        .map(|line| line.trim().to_string())
        .collect()
}

pub async fn run_probe(reader: &CpuTemperatureReader, ipmi: &IpmitoolRunner) -> ProbeReport {
    let mut report = ProbeReport::default();

    info!("Telemetry: {}", reader.describe());
    match reader.read().await {
        Ok(temp) => {
            info!("CPU Package temperature: {:.1}°C", temp);
            report.temperature = Some(temp);
        }
        Err(e) => error!("Telemetry check failed: {}", e),
    }

    let mc = ipmi.invoke(IpmiCommand::McInfo).await;
    if mc.outcome.took_effect() {
        report.bmc_reachable = true;
        info!("BMC responded to '{}'", IpmiCommand::McInfo);
        for line in mc.stdout.lines().take(4) {
            info!("  {}", line.trim());
        }
    } else {
        error!("BMC check failed: {}", mc.outcome);
        return report;
    }

    let sdr = ipmi.invoke(IpmiCommand::SdrList).await;
    if sdr.outcome.took_effect() {
        report.fan_sensors = fan_lines(&sdr.stdout);
        info!("Discovered {} fan sensors", report.fan_sensors.len());
        for line in &report.fan_sensors {
            info!("  {}", line);
        }
    } else {
        warn!("Could not list BMC sensors: {}", sdr.outcome);
    }

    report
}
