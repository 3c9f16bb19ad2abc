//! Command-line argument definitions (clap) and help text.

use clap::Parser;
use std::path::PathBuf;

pub const HELP_TEXT: &str = "
Fanbridge - CPU temperature driven BMC fan control
Usage: fanbridge [OPTIONS]

Options:
  -h, --help                    Print help
  -V, --version                 Print version
Run:
      --dry-run                 Log ipmitool commands instead of executing them
      --log-level <LOG_LEVEL>   Set log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)
Config & Debug:
  -c, --config <PATH>           Config file (default: config.json next to the executable)
      --show-config             Print the effective configuration (password masked)
      --init-config             Write a default config file and exit
      --test                    Read the CPU temperature once and query the BMC, then exit

Environment:
  LOG_LEVEL, FANBRIDGE_TELEMETRY_URL, FANBRIDGE_IPMI_HOST, FANBRIDGE_IPMI_PORT,
  FANBRIDGE_IPMI_USER, FANBRIDGE_IPMI_PASS, FANBRIDGE_IPMITOOL
";

#[derive(Parser, Debug)]
#[command(name = "fanbridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CPU temperature driven BMC fan control", long_about = None)]
pub struct Args {
    // === Run ===
    /// Log ipmitool commands instead of executing them
    #[arg(long = "dry-run", help_heading = "Run")]
    pub dry_run: bool,

    /// Set log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)
    #[arg(long = "log-level", help_heading = "Run")]
    pub log_level: Option<String>,

    // === Config & Debug ===
    /// Config file (default: config.json next to the executable)
    #[arg(short = 'c', long, value_name = "PATH", help_heading = "Config & Debug")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration (password masked)
    #[arg(long = "show-config", help_heading = "Config & Debug")]
    pub show_config: bool,

    /// Write a default config file and exit
    #[arg(long = "init-config", help_heading = "Config & Debug")]
    pub init_config: bool,

    /// Read the CPU temperature once and query the BMC, then exit
    #[arg(long, help_heading = "Config & Debug")]
    pub test: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_runs_the_controller() {
        let args = Args::try_parse_from(["fanbridge"]).unwrap();
        assert!(!args.dry_run && !args.test && !args.show_config && !args.init_config);
        assert!(args.config.is_none());
    }

    #[test]
    fn parses_config_path_and_level() {
        let args =
            Args::try_parse_from(["fanbridge", "-c", "/etc/fanbridge.json", "--log-level", "debug", "--dry-run"])
                .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/etc/fanbridge.json")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(args.dry_run);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Args::try_parse_from(["fanbridge", "--start"]).is_err());
    }
}
