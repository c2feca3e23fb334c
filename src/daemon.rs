//! Model-serving daemon supervision: unit rendering, systemd control, health check.

pub mod status;
pub mod systemd;
pub mod unit;

pub const SYSTEMD_RUN_DIR: &str = "/run/systemd/system";
pub const SYSTEMCTL: &str = "systemctl";
