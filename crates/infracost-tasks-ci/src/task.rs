//! The comment task: generate a cost report and post it.

use crate::environment::CiEnvironment;
use crate::inputs::TaskInputs;
use crate::platform::{DetectOptions, PlatformDetector};
use crate::report::{ReportGenerator, ReportInvocation, DEFAULT_BINARY, DEFAULT_OUT_FILE, POST_CONDITION_ENV};
use crate::result::{AgentLog, TaskResult};
use infracost_tasks_core::{
    resolve_credential, CommentPlanner, CommentRequest, OutputFormat, RenderedComment,
    Result, TargetType, TaskError, UpdateBehavior,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Settings for the report generator that do not come from task inputs.
#[derive(Debug, Clone)]
pub struct CommentTaskOptions {
    pub binary: PathBuf,
    pub out_file: PathBuf,
    pub working_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for CommentTaskOptions {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            out_file: PathBuf::from(DEFAULT_OUT_FILE),
            working_dir: None,
            timeout_secs: 0,
        }
    }
}

/// Outcome of a successful comment task run.
#[derive(Debug, Clone)]
pub struct CommentOutcome {
    /// Name of the platform the comment went to.
    pub platform: String,

    pub format: OutputFormat,

    pub behavior: UpdateBehavior,

    pub comment: RenderedComment,
}

/// Orchestrates one comment task invocation.
pub struct CommentTask {
    generator: Arc<dyn ReportGenerator>,
    detector: Arc<dyn PlatformDetector>,
    options: CommentTaskOptions,
}

impl CommentTask {
    pub fn new(generator: Arc<dyn ReportGenerator>, detector: Arc<dyn PlatformDetector>) -> Self {
        Self {
            generator,
            detector,
            options: CommentTaskOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CommentTaskOptions) -> Self {
        self.options = options;
        self
    }

    /// Build and validate the request from task inputs and environment.
    pub fn build_request(inputs: &TaskInputs, env: &CiEnvironment) -> Result<CommentRequest> {
        let path = inputs.require("path")?;
        let behavior = inputs.parse_or("behavior", UpdateBehavior::Update)?;
        let target_type = inputs.parse_or("targetType", TargetType::PullRequest)?;
        let provider = env.repo_provider().ok_or_else(|| {
            TaskError::UnsupportedProvider("BUILD_REPOSITORY_PROVIDER is not set".to_string())
        })?;

        let request = CommentRequest::new(CommentPlanner::normalize_report_paths(&path)?, provider)
            .with_behavior(behavior)
            .with_target_type(target_type)
            .with_tag(inputs.optional("tag"))
            .dry_run(inputs.get_bool_input("dryRun"));

        request.validate()?;
        Ok(request)
    }

    /// Run the task. Any error aborts before later steps run.
    pub async fn run(&self, inputs: &TaskInputs, env: &CiEnvironment) -> Result<CommentOutcome> {
        let request = Self::build_request(inputs, env)?;
        let credential = resolve_credential(&request.repo_provider, request.dry_run, |name| {
            inputs.optional(name)
        })?;

        let format = CommentPlanner::select_format(&request.repo_provider);
        info!(
            provider = %request.repo_provider.id(),
            format = %format,
            behavior = %request.update_behavior,
            target_type = %request.target_type,
            dry_run = request.dry_run,
            "Planning infracost comment"
        );

        let invocation = ReportInvocation::new(
            request.report_paths.clone(),
            format,
            request.update_behavior,
        )
        .with_binary(&self.options.binary)
        .with_out_file(&self.options.out_file)
        .with_working_dir(self.options.working_dir.clone())
        .with_timeout_secs(self.options.timeout_secs);

        let report = self.generator.generate(&invocation).await?;
        let comment = CommentPlanner::render_comment(
            &report,
            format,
            request.target_type,
            request.update_behavior,
        );

        let platform = self.detector.autodetect(&DetectOptions {
            target_type: request.target_type,
            tag: request.tag.clone(),
            dry_run: request.dry_run,
            credential,
        })?;

        platform
            .post_comment(request.update_behavior, comment.body())
            .await?;
        info!(platform = platform.name(), "Comment posted");

        Ok(CommentOutcome {
            platform: platform.name().to_string(),
            format,
            behavior: request.update_behavior,
            comment,
        })
    }

    /// Run the task and report the result through the agent log.
    pub async fn run_and_report<W: Write>(
        &self,
        inputs: &TaskInputs,
        env: &CiEnvironment,
        log: &mut AgentLog<W>,
    ) -> std::io::Result<TaskResult> {
        // An invalid behavior is reported by run() below.
        if let Ok(behavior) = inputs.parse_or("behavior", UpdateBehavior::default()) {
            log.debug(&format!(
                "passing {}={} to infracost output",
                POST_CONDITION_ENV, behavior
            ))?;
        }

        match self.run(inputs, env).await {
            Ok(_) => {
                log.set_result(TaskResult::Succeeded, "")?;
                Ok(TaskResult::Succeeded)
            }
            Err(e) => {
                let message = e.task_message();
                error!(error = %e, "Comment task failed");
                log.set_result(TaskResult::Failed, &message)?;
                Ok(TaskResult::Failed)
            }
        }
    }
}
