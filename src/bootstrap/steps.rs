//! The five bootstrap steps. Each one inspects host state first and only acts
//! when something is missing, so a re-run after a partial failure picks up
//! where the previous run stopped.

use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::bootstrap::error::StepError;
use crate::bootstrap::orchestrator::HostFacts;
use crate::bootstrap::scaffold::write_placeholder;
use crate::config::types::BootstrapConfig;
use crate::daemon::systemd::{
    is_active, is_enabled, needs_daemon_reload, replace_file, systemctl, unit_is_current,
};
use crate::daemon::unit::ServiceUnit;
use crate::system::executor::{CommandRunner, CommandSpec};
use crate::system::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    InstallDaemon,
    WriteUnit,
    StartService,
    PullModel,
    Scaffold,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::InstallDaemon,
        Step::WriteUnit,
        Step::StartService,
        Step::PullModel,
        Step::Scaffold,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// 1-based position in the sequence
    pub fn number(self) -> usize {
        match self {
            Step::InstallDaemon => 1,
            Step::WriteUnit => 2,
            Step::StartService => 3,
            Step::PullModel => 4,
            Step::Scaffold => 5,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::InstallDaemon => "Install Ollama",
            Step::WriteUnit => "Write systemd unit",
            Step::StartService => "Start Ollama service",
            Step::PullModel => "Pull model",
            Step::Scaffold => "Scaffold assistant script",
        }
    }

    /// Progress line printed before the step runs, e.g. `[4/5] Pulling model deepseek-coder...`
    pub fn banner(self, config: &BootstrapConfig) -> String {
        let action = match self {
            Step::InstallDaemon => "Installing Ollama...".to_string(),
            Step::WriteUnit => "Writing systemd unit...".to_string(),
            Step::StartService => "Starting Ollama service...".to_string(),
            Step::PullModel => format!("Pulling model {}...", config.model.name),
            Step::Scaffold => "Scaffolding assistant script...".to_string(),
        };
        format!("[{}/{}] {}", self.number(), Self::COUNT, action)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.number(), Self::COUNT, self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Applied,
    AlreadySatisfied,
}

/// Everything a step may read. The identity is resolved once per run.
pub struct StepContext<'a> {
    pub config: &'a BootstrapConfig,
    pub identity: &'a Identity,
    pub runner: &'a dyn CommandRunner,
    pub host: HostFacts,
    pub work_dir: &'a Path,
}

impl StepContext<'_> {
    fn ollama(&self) -> CommandSpec {
        CommandSpec::new(self.config.daemon.binary_path.to_string_lossy())
    }

    fn installer(&self) -> CommandSpec {
        CommandSpec::new(self.config.scaffold.installer.as_str())
    }
}

/// Step 1: run the official install script unless the binary is already present.
pub async fn install_daemon(ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let binary = &ctx.config.daemon.binary_path;

    if binary.exists() && !ctx.config.daemon.reinstall {
        debug!("Daemon binary present at {:?}, skipping installer", binary);
        return Ok(StepOutcome::AlreadySatisfied);
    }

    let script = format!("curl -fsSL {} | sh", ctx.config.daemon.install_script_url);
    ctx.runner.run(&CommandSpec::shell(script)).await?;

    if !binary.exists() {
        return Err(StepError::DaemonMissing(binary.clone()));
    }

    info!("Ollama installed at {:?}", binary);
    Ok(StepOutcome::Applied)
}

/// Step 2: render the unit and replace the file wholesale when it differs.
pub async fn write_unit(ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let path = &ctx.config.service.unit_path;
    let content = ServiceUnit::for_daemon(ctx.config, ctx.identity).render();

    if unit_is_current(path, &content).await {
        debug!("Unit file {:?} is up-to-date", path);
        return Ok(StepOutcome::AlreadySatisfied);
    }

    if !ctx.host.is_root {
        return Err(StepError::PrivilegeRequired(path.clone()));
    }

    replace_file(path, &content)
        .await
        .map_err(|e| StepError::io("write", path, e))?;

    info!("Unit file written: {:?} (User={})", path, ctx.identity.user);
    Ok(StepOutcome::Applied)
}

/// Step 3: daemon-reload, enable, restart.
/// With `refresh` (new unit or new binary this run) or a loaded unit that is
/// older than its file (left by an interrupted run) all three run; otherwise
/// only the missing enable and/or restart.
pub async fn start_service(ctx: &StepContext<'_>, refresh: bool) -> Result<StepOutcome, StepError> {
    if !ctx.host.has_systemd {
        return Err(StepError::SystemdUnavailable);
    }

    let unit = ctx.config.service.unit_name();

    let refresh = refresh || {
        let stale = needs_daemon_reload(ctx.runner, &unit).await?;
        if stale {
            info!("{} changed on disk since systemd loaded it, reloading", unit);
        }
        stale
    };

    let (enabled, active) = if refresh {
        (false, false)
    } else {
        (
            is_enabled(ctx.runner, &unit).await?,
            is_active(ctx.runner, &unit).await?,
        )
    };

    if enabled && active {
        return Ok(StepOutcome::AlreadySatisfied);
    }

    if refresh {
        ctx.runner.run(&systemctl(["daemon-reload"])).await?;
    }
    if !enabled {
        ctx.runner.run(&systemctl(["enable", unit.as_str()])).await?;
    }
    if !active {
        ctx.runner.run(&systemctl(["restart", unit.as_str()])).await?;
    }

    info!("{} enabled and running", unit);
    Ok(StepOutcome::Applied)
}

/// Step 4: `ollama pull <model>` unless `ollama list` already has it.
pub async fn pull_model(ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let model = &ctx.config.model.name;

    let listing = ctx.runner.probe(&ctx.ollama().arg("list")).await?;
    if !listing.success {
        debug!("ollama list exited with {:?}: {}", listing.code, listing.stderr.trim());
    } else if model_listed(&listing.stdout, model) {
        debug!("Model {} already present", model);
        return Ok(StepOutcome::AlreadySatisfied);
    }

    ctx.runner.run(&ctx.ollama().arg("pull").arg(model.as_str())).await?;

    info!("Model {} pulled", model);
    Ok(StepOutcome::Applied)
}

/// Step 5: overwrite the placeholder script, then install the package if missing.
pub async fn scaffold(ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let script = ctx.work_dir.join(&ctx.config.scaffold.script_path);
    write_placeholder(&script).await?;
    info!("Placeholder script written: {:?}", script);

    let package = ctx.config.scaffold.package.as_str();
    let shown = ctx.runner.probe(&ctx.installer().args(["show", package])).await?;
    if shown.success {
        debug!("Package {} already installed", package);
    } else {
        ctx.runner.run(&ctx.installer().args(["install", package])).await?;
        info!("Package {} installed", package);
    }

    // The script write is unconditional, so this step always applies
    Ok(StepOutcome::Applied)
}

/// Match a model against `ollama list` output. An untagged name also matches `:latest`.
pub fn model_listed(listing: &str, model: &str) -> bool {
    let latest = (!model.contains(':')).then(|| format!("{}:latest", model));

    listing
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|name| *name != "NAME")
        .any(|name| name == model || latest.as_deref() == Some(name))
}
