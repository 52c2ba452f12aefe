//! Reporting task outcomes to the pipeline agent.
//!
//! The agent reads `##vso[...]` logging commands from the task's stdout.

use std::fmt;
use std::io::Write;

/// Final state of a task run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskResult {
    Succeeded,
    Failed,
}

impl TaskResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskResult::Succeeded => "Succeeded",
            TaskResult::Failed => "Failed",
        }
    }

    /// Process exit code for this result.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskResult::Succeeded => 0,
            TaskResult::Failed => 1,
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escape a logging command message.
fn escape_message(message: &str) -> String {
    message
        .replace('%', "%AZP25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// `##vso[task.complete ...]` line for `result`.
pub fn complete_command(result: TaskResult, message: &str) -> String {
    format!(
        "##vso[task.complete result={};]{}",
        result,
        escape_message(message)
    )
}

/// `##vso[task.debug]` line.
pub fn debug_command(message: &str) -> String {
    format!("##vso[task.debug]{}", escape_message(message))
}

/// `##vso[task.setvariable]` line exposing `name` to later pipeline steps.
pub fn set_variable_command(name: &str, value: &str) -> String {
    format!(
        "##vso[task.setvariable variable={}]{}",
        name,
        escape_message(value)
    )
}

/// Writes logging commands to a sink, stdout in production.
pub struct AgentLog<W: Write> {
    out: W,
    debug: bool,
}

impl AgentLog<std::io::Stdout> {
    pub fn stdout(debug: bool) -> Self {
        Self::new(std::io::stdout(), debug)
    }
}

impl<W: Write> AgentLog<W> {
    pub fn new(out: W, debug: bool) -> Self {
        Self { out, debug }
    }

    pub fn debug(&mut self, message: &str) -> std::io::Result<()> {
        if self.debug {
            writeln!(self.out, "{}", debug_command(message))?;
        }
        Ok(())
    }

    pub fn set_variable(&mut self, name: &str, value: &str) -> std::io::Result<()> {
        writeln!(self.out, "{}", set_variable_command(name, value))
    }

    pub fn set_result(&mut self, result: TaskResult, message: &str) -> std::io::Result<()> {
        writeln!(self.out, "{}", complete_command(result, message))?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
