//! External command execution.

use infracost_tasks_core::{Result, TaskError};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Fully specified invocation of an external program.
///
/// Environment for the child is passed explicitly; the parent process
/// environment is never modified.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: PathBuf,

    /// Arguments, one element per argv entry.
    pub args: Vec<String>,

    /// Extra environment variables for the child.
    pub envs: Vec<(String, String)>,

    /// Working directory (inherits the parent's when unset).
    pub working_dir: Option<PathBuf>,

    /// Timeout in seconds, 0 disables it.
    pub timeout_secs: u64,

    /// Argument positions masked in logs.
    pub secret_args: Vec<usize>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            envs: Vec::new(),
            working_dir: None,
            timeout_secs: 0,
            secret_args: Vec::new(),
        }
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Mask the argument at `index` in [`CommandSpec::display`].
    pub fn secret_arg(mut self, index: usize) -> Self {
        self.secret_args.push(index);
        self
    }

    /// Command line as it would be typed, for logs.
    pub fn display(&self) -> String {
        let args = self.args.iter().enumerate().map(|(i, arg)| {
            if self.secret_args.contains(&i) {
                "***".to_string()
            } else {
                arg.clone()
            }
        });
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(args)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code, -1 when terminated by a signal.
    pub exit_code: i32,

    pub stdout: String,

    pub stderr: String,

    pub duration_ms: u64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run a command to completion, capturing its output.
pub async fn run_command(spec: &CommandSpec) -> Result<CommandOutput> {
    let start = Instant::now();
    debug!(command = %spec.display(), "Running command");

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &spec.working_dir {
        command.current_dir(dir);
    }

    let child = command
        .spawn()
        .map_err(|e| TaskError::ReportSpawn(format!("{}: {}", spec.program.display(), e)))?;

    let output = if spec.timeout_secs > 0 {
        tokio::time::timeout(
            Duration::from_secs(spec.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| TaskError::ReportTimeout {
            secs: spec.timeout_secs,
        })??
    } else {
        child.wait_with_output().await?
    };

    let result = CommandOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    debug!(
        exit_code = result.exit_code,
        duration_ms = result.duration_ms,
        "Command finished"
    );

    Ok(result)
}
