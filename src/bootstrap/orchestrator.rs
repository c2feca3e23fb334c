//! Runs the five steps in order and stops at the first failure.

use std::path::PathBuf;

use tracing::{error, info};

use crate::bootstrap::error::{BootstrapError, StepError};
use crate::bootstrap::steps::{self, Step, StepContext, StepOutcome};
use crate::config::types::BootstrapConfig;
use crate::daemon::systemd::has_systemd;
use crate::system::executor::CommandRunner;
use crate::system::identity::{is_root, Identity};

/// Host facts sampled once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostFacts {
    pub is_root: bool,
    pub has_systemd: bool,
}

impl HostFacts {
    pub fn detect() -> Self {
        Self {
            is_root: is_root(),
            has_systemd: has_systemd(),
        }
    }
}

#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub outcomes: Vec<(Step, StepOutcome)>,
}

impl BootstrapReport {
    pub fn outcome(&self, step: Step) -> Option<StepOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| *s == step)
            .map(|(_, outcome)| *outcome)
    }

    fn applied(&self, step: Step) -> bool {
        self.outcome(step) == Some(StepOutcome::Applied)
    }
}

pub struct Bootstrap<'a> {
    config: &'a BootstrapConfig,
    identity: Identity,
    runner: &'a dyn CommandRunner,
    host: HostFacts,
    work_dir: PathBuf,
}

impl<'a> Bootstrap<'a> {
    pub fn new(
        config: &'a BootstrapConfig,
        identity: Identity,
        runner: &'a dyn CommandRunner,
        host: HostFacts,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            identity,
            runner,
            host,
            work_dir,
        }
    }

    /// Execute every step in order. No rollback: on failure, the steps that
    /// already ran keep their effects and the rest are never started.
    pub async fn run(&self) -> Result<BootstrapReport, BootstrapError> {
        let ctx = StepContext {
            config: self.config,
            identity: &self.identity,
            runner: self.runner,
            host: self.host,
            work_dir: &self.work_dir,
        };
        let mut report = BootstrapReport::default();

        for step in Step::ALL {
            println!("{}", step.banner(self.config));

            let outcome = match self.execute(step, &ctx, &report).await {
                Ok(outcome) => outcome,
                Err(source) => {
                    error!("{} failed: {}", step, source);
                    return Err(BootstrapError { step, source });
                }
            };

            match outcome {
                StepOutcome::Applied => println!("✓ {}", step.title()),
                StepOutcome::AlreadySatisfied => println!("✓ {} (already done)", step.title()),
            }
            report.outcomes.push((step, outcome));
        }

        info!(
            "Bootstrap complete: {} step(s) applied, {} already satisfied",
            report.outcomes.iter().filter(|(_, o)| *o == StepOutcome::Applied).count(),
            report.outcomes.iter().filter(|(_, o)| *o == StepOutcome::AlreadySatisfied).count(),
        );
        Ok(report)
    }

    async fn execute(
        &self,
        step: Step,
        ctx: &StepContext<'_>,
        report: &BootstrapReport,
    ) -> Result<StepOutcome, StepError> {
        match step {
            Step::InstallDaemon => steps::install_daemon(ctx).await,
            Step::WriteUnit => steps::write_unit(ctx).await,
            Step::StartService => {
                let refresh = report.applied(Step::InstallDaemon) || report.applied(Step::WriteUnit);
                steps::start_service(ctx, refresh).await
            }
            Step::PullModel => steps::pull_model(ctx).await,
            Step::Scaffold => steps::scaffold(ctx).await,
        }
    }
}
