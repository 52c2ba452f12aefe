//! Error taxonomy for the infracost pipeline tasks.

/// Prefix attached to every failure surfaced to the pipeline log.
pub const FAILURE_CONTEXT: &str = "Failed to post a comment";

/// Errors produced while planning, generating and delivering a comment.
///
/// Every variant is fatal for the current task invocation.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("Input required: {0}")]
    MissingInput(String),

    #[error("invalid value for input {name}: {value}")]
    InvalidInput { name: String, value: String },

    #[error("{provider} only support {supported} targetType, got {target_type}")]
    UnsupportedCombination {
        provider: String,
        supported: String,
        target_type: String,
    },

    #[error("Unsupported repo provider: {0}")]
    UnsupportedProvider(String),

    #[error("infracost output command failed with code {code}")]
    ReportGenerationFailed { code: i32 },

    #[error("could not start infracost: {0}")]
    ReportSpawn(String),

    #[error("infracost output command timed out after {secs} seconds")]
    ReportTimeout { secs: u64 },

    #[error("Error running infracost configure set {option}: {code}")]
    ConfigureFailed { option: String, code: i32 },

    #[error("{0}")]
    PlatformNotDetected(String),

    #[error("comment delivery failed: {0}")]
    Delivery(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskError {
    /// Human-readable message as reported to the pipeline.
    pub fn task_message(&self) -> String {
        format!("{}: {}", FAILURE_CONTEXT, self)
    }
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, TaskError>;
