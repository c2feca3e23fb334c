//! Recording `CommandRunner` used by unit tests in place of real processes.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::system::executor::{CommandError, CommandRunner, CommandSpec, ProbeOutput};

type Effect = Box<dyn Fn() + Send + Sync>;

/// Records every command it sees. Commands are matched by prefix of their
/// rendered form (e.g. `"systemctl enable"`). Unmatched `run`s succeed,
/// unmatched `probe`s report a non-zero exit with empty output.
#[derive(Default)]
pub(crate) struct StubRunner {
    calls: Mutex<Vec<String>>,
    failures: Vec<(String, i32)>,
    missing: Vec<String>,
    probes: Vec<(String, ProbeOutput)>,
    effects: Vec<(String, Effect)>,
}

impl StubRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make matching commands exit with `code`.
    pub(crate) fn fail(mut self, prefix: &str, code: i32) -> Self {
        self.failures.push((prefix.to_string(), code));
        self
    }

    /// Make matching commands fail to spawn.
    pub(crate) fn missing(mut self, prefix: &str) -> Self {
        self.missing.push(prefix.to_string());
        self
    }

    /// Answer matching probes with a successful exit and `stdout`.
    pub(crate) fn probe_ok(mut self, prefix: &str, stdout: &str) -> Self {
        self.probes.push((
            prefix.to_string(),
            ProbeOutput {
                success: true,
                code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ));
        self
    }

    /// Run `effect` whenever a matching command succeeds.
    pub(crate) fn on_run(mut self, prefix: &str, effect: impl Fn() + Send + Sync + 'static) -> Self {
        self.effects.push((prefix.to_string(), Box::new(effect)));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, cmd: &CommandSpec) -> Result<String, CommandError> {
        let rendered = cmd.to_string();
        self.calls.lock().unwrap().push(rendered.clone());

        if self.missing.iter().any(|p| rendered.starts_with(p.as_str())) {
            return Err(CommandError::Spawn {
                command: rendered,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }
        Ok(rendered)
    }

    fn failure_code(&self, rendered: &str) -> Option<i32> {
        self.failures
            .iter()
            .find(|(p, _)| rendered.starts_with(p.as_str()))
            .map(|(_, code)| *code)
    }
}

#[async_trait]
impl CommandRunner for StubRunner {
    async fn run(&self, cmd: &CommandSpec) -> Result<(), CommandError> {
        let rendered = self.record(cmd)?;

        if let Some(code) = self.failure_code(&rendered) {
            return Err(CommandError::ExitStatus {
                command: rendered,
                code: Some(code),
            });
        }

        for (prefix, effect) in &self.effects {
            if rendered.starts_with(prefix.as_str()) {
                effect();
            }
        }
        Ok(())
    }

    async fn probe(&self, cmd: &CommandSpec) -> Result<ProbeOutput, CommandError> {
        let rendered = self.record(cmd)?;

        if let Some(code) = self.failure_code(&rendered) {
            return Ok(ProbeOutput {
                success: false,
                code: Some(code),
                ..ProbeOutput::default()
            });
        }

        Ok(self
            .probes
            .iter()
            .find(|(p, _)| rendered.starts_with(p.as_str()))
            .map(|(_, out)| out.clone())
            .unwrap_or(ProbeOutput {
                success: false,
                code: Some(1),
                ..ProbeOutput::default()
            }))
    }
}
