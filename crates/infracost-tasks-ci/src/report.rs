//! Report generation with `infracost output`.

use crate::command::{run_command, CommandSpec};
use async_trait::async_trait;
use infracost_tasks_core::{OutputFormat, ReportPaths, Result, TaskError, UpdateBehavior};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Default name of the rendered report file.
pub const DEFAULT_OUT_FILE: &str = "infracost-comment.md";

/// Child environment variable carrying the post behavior.
pub const POST_CONDITION_ENV: &str = "INFRACOST_CI_POST_CONDITION";

pub const DEFAULT_BINARY: &str = "infracost";

/// Everything needed to run `infracost output` once.
#[derive(Debug, Clone)]
pub struct ReportInvocation {
    pub binary: PathBuf,
    pub paths: ReportPaths,
    pub format: OutputFormat,
    pub out_file: PathBuf,
    pub post_condition: UpdateBehavior,
    pub working_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl ReportInvocation {
    pub fn new(paths: ReportPaths, format: OutputFormat, post_condition: UpdateBehavior) -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            paths,
            format,
            out_file: PathBuf::from(DEFAULT_OUT_FILE),
            post_condition,
            working_dir: None,
            timeout_secs: 0,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_out_file(mut self, out_file: impl Into<PathBuf>) -> Self {
        self.out_file = out_file.into();
        self
    }

    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Arguments for `infracost`, one `--path` per report path in order.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["output".to_string()];
        for path in &self.paths {
            args.push("--path".to_string());
            args.push(path.clone());
        }
        args.push("--format".to_string());
        args.push(self.format.as_str().to_string());
        args.push("--out-file".to_string());
        args.push(self.out_file.to_string_lossy().into_owned());
        args.push("--show-skipped".to_string());
        args
    }

    /// Resolved location of the out-file, honouring the working directory.
    pub fn out_file_path(&self) -> PathBuf {
        match &self.working_dir {
            Some(dir) if self.out_file.is_relative() => dir.join(&self.out_file),
            _ => self.out_file.clone(),
        }
    }

    pub fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.binary, self.args())
            .env(POST_CONDITION_ENV, self.post_condition.as_str())
            .working_dir(self.working_dir.clone())
            .timeout_secs(self.timeout_secs)
    }
}

/// Produces the raw report text for a comment.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, invocation: &ReportInvocation) -> Result<String>;
}

/// Runs the installed infracost CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct InfracostCli;

#[async_trait]
impl ReportGenerator for InfracostCli {
    async fn generate(&self, invocation: &ReportInvocation) -> Result<String> {
        info!(
            format = %invocation.format,
            paths = invocation.paths.len(),
            "Generating cost estimate report"
        );

        debug!(
            env = POST_CONDITION_ENV,
            value = %invocation.post_condition,
            "Passing post condition to infracost"
        );
        let output = run_command(&invocation.command()).await?;

        if !output.success() {
            warn!(
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "infracost output failed"
            );
            return Err(TaskError::ReportGenerationFailed {
                code: output.exit_code,
            });
        }

        let out_file = invocation.out_file_path();
        let report = tokio::fs::read_to_string(&out_file).await?;
        info!(
            out_file = %out_file.display(),
            bytes = report.len(),
            duration_ms = output.duration_ms,
            "Report generated"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(paths: &[&str]) -> ReportInvocation {
        let paths = ReportPaths::new(paths.iter().map(|p| p.to_string()).collect()).unwrap();
        ReportInvocation::new(paths, OutputFormat::GithubComment, UpdateBehavior::Update)
    }

    #[test]
    fn test_args_keep_path_order() {
        let args = invocation(&["a.json", "b.json"]).args();
        assert_eq!(
            args,
            vec![
                "output",
                "--path",
                "a.json",
                "--path",
                "b.json",
                "--format",
                "github-comment",
                "--out-file",
                "infracost-comment.md",
                "--show-skipped",
            ]
        );
    }

    #[test]
    fn test_post_condition_is_passed_to_child() {
        let spec = invocation(&["a.json"]).command();
        assert!(spec
            .envs
            .contains(&(POST_CONDITION_ENV.to_string(), "update".to_string())));
    }

    #[test]
    fn test_out_file_relative_to_working_dir() {
        let inv = invocation(&["a.json"]).with_working_dir(Some(PathBuf::from("/work")));
        assert_eq!(inv.out_file_path(), PathBuf::from("/work/infracost-comment.md"));

        let abs = inv.with_out_file("/tmp/report.md");
        assert_eq!(abs.out_file_path(), PathBuf::from("/tmp/report.md"));
    }
}
