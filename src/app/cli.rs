//! Command-line argument definitions (clap) and help text.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

pub const HELP_TEXT: &str = "
Local AI Assistant Bootstrap
Usage: assistant-bootstrap [OPTIONS]

Runs the full setup when no command is given:
  [1/5] install Ollama   [2/5] write systemd unit   [3/5] enable + restart service
  [4/5] pull the model   [5/5] scaffold the assistant script and install its dependency

Options:
  -h, --help                    Print help
  -V, --version                 Print version
Bootstrap:
      --reinstall               Run the Ollama installer even if the binary exists
Service:
  -U, --uninstall-service       Stop, disable and remove the systemd unit
Config & Debug:
  -f, --config-file <PATH>      Config file (default: config.json next to the binary)
  -c, --config                  Show effective configuration and the unit it renders
      --init-config             Write a default config file
      --check                   Run health check (binary, unit, service, model, script)
      --log-level <LOG_LEVEL>   Set log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)

-U, -c, --init-config and --check are exclusive; --reinstall only applies to the full setup.
";

#[derive(Parser, Debug)]
#[command(name = "assistant-bootstrap")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Local AI Assistant Bootstrap", long_about = None)]
#[command(group(
    ArgGroup::new("command").args(["uninstall_service", "config", "init_config", "check"])
))]
pub struct Args {
    // === Bootstrap ===
    /// Run the Ollama installer even if the binary exists
    #[arg(long, conflicts_with = "command", help_heading = "Bootstrap")]
    pub reinstall: bool,

    // === Service ===
    /// Stop, disable and remove the systemd unit
    #[arg(short = 'U', long = "uninstall-service", help_heading = "Service")]
    pub uninstall_service: bool,

    // === Config & Debug ===
    /// Config file (default: config.json next to the binary)
    #[arg(short = 'f', long = "config-file", value_name = "PATH", help_heading = "Config & Debug")]
    pub config_file: Option<PathBuf>,

    /// Show effective configuration and the unit it renders
    #[arg(short = 'c', long, help_heading = "Config & Debug")]
    pub config: bool,

    /// Write a default config file
    #[arg(long = "init-config", help_heading = "Config & Debug")]
    pub init_config: bool,

    /// Run health check (binary, unit, service, model, script)
    #[arg(long, help_heading = "Config & Debug")]
    pub check: bool,

    /// Set log level (TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL)
    #[arg(long = "log-level", help_heading = "Config & Debug")]
    pub log_level: Option<String>,
}
