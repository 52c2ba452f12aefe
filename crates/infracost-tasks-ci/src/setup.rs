//! The configure task: apply task inputs to the infracost CLI configuration.

use crate::command::{run_command, CommandSpec};
use crate::environment::CiEnvironment;
use crate::inputs::TaskInputs;
use crate::report::DEFAULT_BINARY;
use crate::result::{AgentLog, TaskResult};
use infracost_tasks_core::{Result, TaskError};
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info};

/// Type of a configuration input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Boolean,
}

/// Mapping from a task input to an `infracost configure` key.
#[derive(Debug, Clone, Copy)]
pub struct ConfigOption {
    pub input_name: &'static str,
    pub config_name: &'static str,
    pub required: bool,
    pub kind: OptionKind,
}

pub const CONFIG_OPTIONS: [ConfigOption; 4] = [
    ConfigOption {
        input_name: "apiKey",
        config_name: "api_key",
        required: true,
        kind: OptionKind::String,
    },
    ConfigOption {
        input_name: "currency",
        config_name: "currency",
        required: false,
        kind: OptionKind::String,
    },
    ConfigOption {
        input_name: "pricingApiEndpoint",
        config_name: "pricing_api_endpoint",
        required: false,
        kind: OptionKind::String,
    },
    ConfigOption {
        input_name: "enableDashboard",
        config_name: "enable_dashboard",
        required: false,
        kind: OptionKind::Boolean,
    },
];

/// Settings to apply, in table order. Unset and false values are skipped.
pub fn collect_settings(inputs: &TaskInputs) -> Result<Vec<(&'static str, String)>> {
    let mut settings = Vec::new();
    for option in CONFIG_OPTIONS {
        let value = match option.kind {
            OptionKind::Boolean => inputs
                .get_bool_input(option.input_name)
                .then(|| "true".to_string()),
            OptionKind::String => inputs.get_input(option.input_name, option.required)?,
        };
        if let Some(value) = value {
            settings.push((option.config_name, value));
        }
    }
    Ok(settings)
}

/// Pipeline variables later `infracost` steps pick up from the agent.
pub fn pipeline_variables(env: &CiEnvironment) -> Vec<(&'static str, String)> {
    let mut vars = vec![
        ("INFRACOST_AZURE_DEVOPS_PIPELINE", "true".to_string()),
        ("INFRACOST_SKIP_UPDATE_CHECK", "true".to_string()),
    ];
    if let Some(uri) = env.repository_uri() {
        vars.push(("INFRACOST_VCS_REPOSITORY_URL", uri.to_string()));
    }
    let level = if env.debug_enabled() { "debug" } else { "info" };
    vars.push(("INFRACOST_LOG_LEVEL", level.to_string()));
    vars
}

/// Runs `infracost configure set` for every provided option.
#[derive(Debug, Clone)]
pub struct ConfigureTask {
    binary: PathBuf,
    timeout_secs: u64,
}

impl Default for ConfigureTask {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl ConfigureTask {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout_secs: 0,
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Apply settings; returns how many were written.
    pub async fn run(&self, inputs: &TaskInputs) -> Result<usize> {
        let settings = collect_settings(inputs)?;

        for (name, value) in &settings {
            info!(option = %name, "Setting infracost configuration");
            let spec = CommandSpec::new(
                &self.binary,
                vec![
                    "configure".to_string(),
                    "set".to_string(),
                    name.to_string(),
                    value.clone(),
                ],
            )
            .secret_arg(3)
            .timeout_secs(self.timeout_secs);

            let output = run_command(&spec).await?;
            if !output.success() {
                return Err(TaskError::ConfigureFailed {
                    option: name.to_string(),
                    code: output.exit_code,
                });
            }
        }

        Ok(settings.len())
    }

    /// Export pipeline variables, apply settings and report the result.
    pub async fn run_and_report<W: Write>(
        &self,
        inputs: &TaskInputs,
        env: &CiEnvironment,
        log: &mut AgentLog<W>,
    ) -> std::io::Result<TaskResult> {
        for (name, value) in pipeline_variables(env) {
            log.set_variable(name, &value)?;
        }

        match self.run(inputs).await {
            Ok(count) => {
                info!(options = count, "infracost configured");
                log.set_result(TaskResult::Succeeded, "")?;
                Ok(TaskResult::Succeeded)
            }
            Err(e) => {
                error!(error = %e, "Configure task failed");
                log.set_result(TaskResult::Failed, &e.to_string())?;
                Ok(TaskResult::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_required() {
        let err = collect_settings(&TaskInputs::new()).unwrap_err();
        assert_eq!(err.to_string(), "Input required: apiKey");
    }

    #[test]
    fn test_collect_settings_in_table_order() {
        let inputs = TaskInputs::new()
            .with("enableDashboard", "true")
            .with("currency", "EUR")
            .with("apiKey", "ico-123");
        let settings = collect_settings(&inputs).unwrap();
        assert_eq!(
            settings,
            vec![
                ("api_key", "ico-123".to_string()),
                ("currency", "EUR".to_string()),
                ("enable_dashboard", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_false_boolean_is_skipped() {
        let inputs = TaskInputs::new()
            .with("apiKey", "ico-123")
            .with("enableDashboard", "false");
        let settings = collect_settings(&inputs).unwrap();
        assert_eq!(settings, vec![("api_key", "ico-123".to_string())]);
    }

    #[tokio::test]
    async fn test_configure_failure_reports_option() {
        let task = ConfigureTask::new("false");
        let inputs = TaskInputs::new().with("apiKey", "ico-123");
        let err = task.run(&inputs).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::ConfigureFailed { ref option, .. } if option == "api_key"
        ));
        assert!(err
            .to_string()
            .starts_with("Error running infracost configure set api_key:"));
    }

    #[test]
    fn test_pipeline_variables_defaults() {
        let vars = pipeline_variables(&CiEnvironment::default());
        assert_eq!(
            vars,
            vec![
                ("INFRACOST_AZURE_DEVOPS_PIPELINE", "true".to_string()),
                ("INFRACOST_SKIP_UPDATE_CHECK", "true".to_string()),
                ("INFRACOST_LOG_LEVEL", "info".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_and_report_exports_variables() {
        let env = CiEnvironment::from_vars([
            ("BUILD_REPOSITORY_URI", "https://github.com/infracost/example"),
            ("SYSTEM_DEBUG", "true"),
        ]);
        let inputs = TaskInputs::new().with("apiKey", "ico-123");
        let mut log = AgentLog::new(Vec::new(), false);

        let result = ConfigureTask::new("true")
            .run_and_report(&inputs, &env, &mut log)
            .await
            .unwrap();

        assert_eq!(result, TaskResult::Succeeded);
        let out = String::from_utf8(log.into_inner()).unwrap();
        assert_eq!(
            out.lines().collect::<Vec<_>>(),
            vec![
                "##vso[task.setvariable variable=INFRACOST_AZURE_DEVOPS_PIPELINE]true",
                "##vso[task.setvariable variable=INFRACOST_SKIP_UPDATE_CHECK]true",
                "##vso[task.setvariable variable=INFRACOST_VCS_REPOSITORY_URL]https://github.com/infracost/example",
                "##vso[task.setvariable variable=INFRACOST_LOG_LEVEL]debug",
                "##vso[task.complete result=Succeeded;]",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_and_report_failure_still_exports() {
        let mut log = AgentLog::new(Vec::new(), false);
        let result = ConfigureTask::new("true")
            .run_and_report(&TaskInputs::new(), &CiEnvironment::default(), &mut log)
            .await
            .unwrap();

        assert_eq!(result, TaskResult::Failed);
        let out = String::from_utf8(log.into_inner()).unwrap();
        assert!(out.starts_with("##vso[task.setvariable variable=INFRACOST_AZURE_DEVOPS_PIPELINE]true"));
        assert!(out.ends_with("##vso[task.complete result=Failed;]Input required: apiKey\n"));
    }

    #[tokio::test]
    async fn test_configure_runs_each_option() {
        let task = ConfigureTask::new("true");
        let inputs = TaskInputs::new()
            .with("apiKey", "ico-123")
            .with("pricingApiEndpoint", "https://pricing.example.com");
        assert_eq!(task.run(&inputs).await.unwrap(), 2);
    }
}
