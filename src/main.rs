//! Fanbridge entry point: CLI dispatch, logging, signal handlers, control loop.

mod app;
mod config;
mod control;
mod error;
mod system;
mod telemetry;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use app::cli::{Args, HELP_TEXT};
use app::logging::{init_tracing, reload_filter, resolve_filter};
use app::probe::run_probe;
use app::signals::{shutdown_signal, spawn_log_reload};
use config::persistence::{init_config, load_config};
use control::fan_control::FanController;
use control::ControlLoop;
use system::executor::{CommandRunner, DryRunRunner, IpmitoolRunner};
use telemetry::{CpuTemperatureReader, OhmHttpSource};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            if err.kind() == clap::error::ErrorKind::DisplayHelp {
                print!("{}", HELP_TEXT);
                std::process::exit(0);
            }
            if err.kind() == clap::error::ErrorKind::DisplayVersion {
                println!("fanbridge {} ({})", env!("CARGO_PKG_VERSION"), std::env::consts::ARCH);
                std::process::exit(0);
            }

            eprintln!("{}", err);
            eprintln!();
            print!("{}", HELP_TEXT);
            std::process::exit(2);
        }
    };

    // Priority: 1. --log-level flag, 2. LOG_LEVEL env, 3. config file, 4. default (info)
    let env_level = std::env::var("LOG_LEVEL").ok();
    let early_level = args.log_level.as_deref().or(env_level.as_deref());
    init_tracing(resolve_filter(early_level, None, "info"));

    if args.init_config {
        let path = init_config(args.config.as_deref()).await?;
        println!("Wrote default configuration to {:?}", path);
        println!("Set bmc.host (and bmc.password) before starting fan control.");
        return Ok(());
    }

    let config = load_config(args.config.as_deref()).await?;

    if early_level.is_none() {
        reload_filter(resolve_filter(None, None, &config.logging.log_level))?;
    }

    if args.show_config {
        println!("\n{}", serde_json::to_string_pretty(&config.masked())?);
        return Ok(());
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let source = OhmHttpSource::new(&config.telemetry).context("Failed to build telemetry HTTP client")?;
    let reader = Arc::new(CpuTemperatureReader::from_settings(Arc::new(source), &config.telemetry));

    if args.test {
        info!("Running in test mode (fan settings are not changed)");
        let ipmi = IpmitoolRunner::new(config.bmc.clone(), config.commands.clone());
        let report = run_probe(&reader, &ipmi).await;
        if report.healthy() {
            info!("Test passed");
            return Ok(());
        }
        error!("Test failed");
        std::process::exit(1);
    }

    let runner: Arc<dyn CommandRunner> = if args.dry_run {
        Arc::new(DryRunRunner::new(config.bmc.clone(), config.commands.clone()))
    } else {
        Arc::new(IpmitoolRunner::new(config.bmc.clone(), config.commands.clone()))
    };

    let policy = config.policy();
    let poll_interval = Duration::from_secs_f64(config.control.poll_interval_secs);

    info!("Fanbridge v{} starting", env!("CARGO_PKG_VERSION"));
    info!("Telemetry: {}", reader.describe());
    info!(
        "BMC: {}:{} via {} ({})",
        config.bmc.host, config.bmc.port, config.bmc.interface, config.bmc.ipmitool_path
    );
    info!(
        "Thresholds: low {:.1}°C ({}%), medium ({}%), auto at {:.1}°C; polling every {:.1}s",
        policy.low_threshold,
        policy.low_speed,
        policy.medium_speed,
        policy.auto_threshold,
        poll_interval.as_secs_f64()
    );
    if args.dry_run {
        warn!("Dry run: ipmitool commands are logged, not executed");
    }
    warn!(
        "On exit, BMC auto fan mode is restored only if the CPU is at or above {:.1}°C or unreadable",
        policy.auto_threshold
    );

    spawn_log_reload(args.config.clone());

    let controller = Arc::new(FanController::new(runner));
    let action = ControlLoop::new(reader, controller, policy, poll_interval)
        .run(shutdown_signal())
        .await;

    info!("Exit action: {}", action);
    info!("Fan control stopped");
    Ok(())
}
