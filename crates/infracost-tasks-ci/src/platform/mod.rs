//! Comment delivery.
//!
//! A [`PlatformDetector`] inspects the CI environment and returns the
//! [`CommentPlatform`] able to post to the current pull request or commit.

pub mod azure;
pub mod detect;
pub mod dry_run;
pub mod github;
pub mod reconcile;

use async_trait::async_trait;
use infracost_tasks_core::{Credential, Result, TaskError, TargetType, UpdateBehavior};
use std::time::Duration;

pub use detect::{DetectedTarget, EnvPlatformDetector};
pub use dry_run::DryRunPlatform;
pub use reconcile::{CommentBackend, ExistingComment, TaggedPlatform};

const USER_AGENT: &str = concat!("infracost-tasks/", env!("CARGO_PKG_VERSION"));

/// Default timeout for a single API request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Options for platform detection.
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    pub target_type: TargetType,
    pub tag: Option<String>,
    pub dry_run: bool,
    pub credential: Option<Credential>,
}

/// A hosting platform that can post comments.
#[async_trait]
pub trait CommentPlatform: Send + Sync {
    fn name(&self) -> &str;

    /// Create, update or replace the comment according to `behavior`.
    async fn post_comment(&self, behavior: UpdateBehavior, body: &str) -> Result<()>;
}

/// Resolves the comment platform for the current environment.
pub trait PlatformDetector: Send + Sync {
    fn autodetect(&self, options: &DetectOptions) -> Result<Box<dyn CommentPlatform>>;
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| TaskError::Delivery(format!("failed to create HTTP client: {}", e)))
}

/// Turn a non-success response into a delivery error carrying the body.
pub(crate) async fn check_response(
    response: reqwest::Response,
    action: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TaskError::Delivery(format!(
        "{} failed with status {}: {}",
        action,
        status,
        body.trim()
    )))
}

pub(crate) fn request_error(action: &str, err: reqwest::Error) -> TaskError {
    TaskError::Delivery(format!("{} failed: {}", action, err))
}
