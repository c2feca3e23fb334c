//! Subprocess executor.
//! Every external tool (installer, systemctl, ollama, pip) is spawned through
//! the `CommandRunner` trait so the bootstrap sequence can be driven by stubs.

use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, trace};

/// A program plus its arguments, independent of how it gets spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `sh -c <script>`, used for the curl-to-shell installer pipeline.
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(script)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured result of a state probe (`systemctl is-active`, `ollama list`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {}", exit_label(.code))]
    ExitStatus { command: String, code: Option<i32> },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run with inherited stdio so the tool's own output reaches the terminal.
    /// Succeeds only on a zero exit status.
    async fn run(&self, cmd: &CommandSpec) -> Result<(), CommandError>;

    /// Run with captured output. A non-zero exit is reported in the
    /// returned `ProbeOutput`, only spawn failures are errors.
    async fn probe(&self, cmd: &CommandSpec) -> Result<ProbeOutput, CommandError>;
}

/// Spawns real processes via `tokio::process`.
pub struct SystemRunner;

impl SystemRunner {
    fn build(cmd: &CommandSpec) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(&cmd.program);
        command.args(&cmd.args).stdin(Stdio::null());
        command
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &CommandSpec) -> Result<(), CommandError> {
        debug!("Executing: {}", cmd);

        let status = Self::build(cmd)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|source| CommandError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(CommandError::ExitStatus {
                command: cmd.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }

    async fn probe(&self, cmd: &CommandSpec) -> Result<ProbeOutput, CommandError> {
        trace!("Probing: {}", cmd);

        let output = Self::build(cmd)
            .output()
            .await
            .map_err(|source| CommandError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        Ok(ProbeOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
