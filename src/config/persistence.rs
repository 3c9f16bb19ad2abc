//! Config file load, save, and environment override logic.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::types::ControllerConfig;

/// `config.json` next to the running executable.
pub fn default_config_path() -> Result<PathBuf> {
    let exe_dir = std::env::current_exe()?
        .parent()
        .ok_or_else(|| anyhow!("Cannot determine executable directory"))?
        .to_path_buf();
    Ok(exe_dir.join("config.json"))
}

pub fn resolve_config_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

/// Load the config file (defaults if absent) and apply `FANBRIDGE_*` environment overrides.
/// Validation is left to the caller so `--show-config` can print an incomplete config.
pub async fn load_config(path: Option<&Path>) -> Result<ControllerConfig> {
    let config_path = resolve_config_path(path)?;

    let mut config = if config_path.exists() {
        let content = tokio::fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config: {:?}", config_path))?;
        let config: ControllerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON: {:?}", config_path))?;
        info!("Loaded configuration from: {:?}", config_path);
        config
    } else {
        info!("Config file {:?} not found, using defaults. Run with --init-config to create one.", config_path);
        ControllerConfig::default()
    };

    let applied = apply_overrides(&mut config, |key| std::env::var(key).ok());
    for key in applied {
        info!("Config override from environment: {}", key);
    }

    Ok(config)
}

/// Apply overrides from `lookup` (the process environment in production).
/// Returns the names of the variables that were applied.
pub fn apply_overrides<F>(config: &mut ControllerConfig, lookup: F) -> Vec<&'static str>
where
    F: Fn(&str) -> Option<String>,
{
    let mut applied = Vec::new();

    if let Some(url) = lookup("FANBRIDGE_TELEMETRY_URL") {
        config.telemetry.url = url;
        applied.push("FANBRIDGE_TELEMETRY_URL");
    }
    if let Some(host) = lookup("FANBRIDGE_IPMI_HOST") {
        config.bmc.host = host;
        applied.push("FANBRIDGE_IPMI_HOST");
    }
    if let Some(port) = lookup("FANBRIDGE_IPMI_PORT") {
        match port.trim().parse::<u16>() {
            Ok(p) => {
                config.bmc.port = p;
                applied.push("FANBRIDGE_IPMI_PORT");
            }
            Err(_) => warn!("Ignoring FANBRIDGE_IPMI_PORT='{}': not a valid port", port),
        }
    }
    if let Some(user) = lookup("FANBRIDGE_IPMI_USER") {
        config.bmc.user = user;
        applied.push("FANBRIDGE_IPMI_USER");
    }
    if let Some(pass) = lookup("FANBRIDGE_IPMI_PASS") {
        config.bmc.password = pass;
        applied.push("FANBRIDGE_IPMI_PASS");
    }
    if let Some(path) = lookup("FANBRIDGE_IPMITOOL") {
        config.bmc.ipmitool_path = path;
        applied.push("FANBRIDGE_IPMITOOL");
    }

    applied
}

pub async fn save_config(config: &ControllerConfig, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write config: {:?}", path))?;
    info!("Configuration saved to: {:?}", path);
    Ok(())
}

/// Write a default config file, refusing to overwrite an existing one.
pub async fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let config_path = resolve_config_path(path)?;
    if config_path.exists() {
        return Err(anyhow!(
            "Config file already exists: {:?}. Edit it directly or remove it first.",
            config_path
        ));
    }
    save_config(&ControllerConfig::default(), &config_path).await?;
    Ok(config_path)
}
