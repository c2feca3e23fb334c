use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

use crate::config::types::BootstrapConfig;
use crate::daemon::{SYSTEMCTL, SYSTEMD_RUN_DIR};
use crate::system::executor::{CommandError, CommandRunner, CommandSpec};
use crate::system::identity::is_root;

/// Check if systemd is available on this system
pub fn has_systemd() -> bool {
    Path::new(SYSTEMD_RUN_DIR).exists()
}

pub fn systemctl<I, S>(args: I) -> CommandSpec
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    CommandSpec::new(SYSTEMCTL).args(args)
}

/// True when `path` already holds exactly `content`.
pub async fn unit_is_current(path: &Path, content: &str) -> bool {
    match tokio::fs::read_to_string(path).await {
        Ok(existing) => existing == content,
        Err(_) => false,
    }
}

/// Replace `path` via a sibling `.tmp` file and a rename, so an interrupted
/// write never leaves a truncated unit behind.
pub async fn replace_file(path: &Path, content: &str) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, content).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// True when systemd reports the loaded unit is older than its file on disk.
/// Accepts both `--value` output (`yes`) and `NeedDaemonReload=yes`.
pub async fn needs_daemon_reload(runner: &dyn CommandRunner, unit: &str) -> Result<bool, CommandError> {
    let shown = runner
        .probe(&systemctl(["show", "-p", "NeedDaemonReload", "--value", unit]))
        .await?;
    if !shown.success {
        debug!("systemctl show {} exited with {:?}", unit, shown.code);
        return Ok(false);
    }

    let value = shown.stdout.trim();
    let value = value.strip_prefix("NeedDaemonReload=").unwrap_or(value);
    Ok(value.eq_ignore_ascii_case("yes"))
}

pub async fn is_enabled(runner: &dyn CommandRunner, unit: &str) -> Result<bool, CommandError> {
    let probe = runner
        .probe(&systemctl(["is-enabled", "--quiet", unit]))
        .await?;
    debug!("{} enabled: {}", unit, probe.success);
    Ok(probe.success)
}

/// Active or activating
pub async fn is_active(runner: &dyn CommandRunner, unit: &str) -> Result<bool, CommandError> {
    let probe = runner
        .probe(&systemctl(["is-active", "--quiet", unit]))
        .await?;
    debug!("{} active: {}", unit, probe.success);
    Ok(probe.success)
}

/// Uninstall the daemon's systemd unit. The daemon binary and pulled models stay.
pub async fn uninstall_systemd_service(runner: &dyn CommandRunner, config: &BootstrapConfig) -> Result<()> {
    if !is_root() {
        return Err(anyhow!(
            "Root privileges required. Run with: sudo assistant-bootstrap --uninstall-service"
        ));
    }

    if !has_systemd() {
        println!("❌ systemd not detected on this system.");
        return Ok(());
    }

    let unit_path = &config.service.unit_path;
    if !unit_path.exists() {
        println!("✓ Service is not installed");
        return Ok(());
    }

    let unit = config.service.unit_name();

    // Stop and disable may fail on a unit that never started; removal proceeds regardless
    if let Err(e) = runner.run(&systemctl(["stop", unit.as_str()])).await {
        warn!("Stopping {} failed: {}", unit, e);
    }
    println!("✓ Service stopped");

    if let Err(e) = runner.run(&systemctl(["disable", unit.as_str()])).await {
        warn!("Disabling {} failed: {}", unit, e);
    }
    println!("✓ Service disabled");

    tokio::fs::remove_file(unit_path)
        .await
        .with_context(|| format!("Failed to remove {:?}", unit_path))?;
    println!("✓ Service file removed");

    runner
        .run(&systemctl(["daemon-reload"]))
        .await
        .context("Failed to reload systemd daemon (run: systemctl daemon-reload)")?;
    println!("✓ Systemd daemon reloaded");

    Ok(())
}
