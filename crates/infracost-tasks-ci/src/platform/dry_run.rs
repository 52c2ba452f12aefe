//! Platform that logs instead of posting.

use super::CommentPlatform;
use async_trait::async_trait;
use infracost_tasks_core::{Result, UpdateBehavior};
use tracing::{debug, info};

/// Stands in for a detected platform when `dryRun` is set.
#[derive(Debug, Clone)]
pub struct DryRunPlatform {
    target: String,
}

impl DryRunPlatform {
    /// `target` describes where the comment would have gone.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

#[async_trait]
impl CommentPlatform for DryRunPlatform {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn post_comment(&self, behavior: UpdateBehavior, body: &str) -> Result<()> {
        info!(
            destination = %self.target,
            behavior = %behavior,
            bytes = body.len(),
            "Dry run: skipping comment delivery"
        );
        debug!(body = %body, "Dry run comment body");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_never_fails() {
        let platform = DryRunPlatform::new("GitHub pull request infracost/example#1");
        for behavior in UpdateBehavior::ALL {
            platform.post_comment(behavior, "body").await.unwrap();
        }
        assert_eq!(platform.name(), "dry-run");
    }
}
