//! Comment reconciliation shared by every hosting platform.
//!
//! Comments posted by the task carry a hidden markdown marker so later runs
//! can find them again. The post behavior decides what happens to marked
//! comments before the new body is written.

use super::CommentPlatform;
use async_trait::async_trait;
use infracost_tasks_core::{Result, UpdateBehavior};
use tracing::{debug, info};

/// Marker key shared by every comment the task posts.
pub const MARKER_KEY: &str = "infracost-comment";

/// Hidden markdown line identifying comments for `tag`.
///
/// Untagged comments use the bare key; a tag is appended after a colon so
/// tagged and untagged runs never match each other.
pub fn marker(tag: Option<&str>) -> String {
    match tag.map(str::trim).filter(|t| !t.is_empty()) {
        Some(tag) => format!("[//]: <> ({}:{})", MARKER_KEY, tag),
        None => format!("[//]: <> ({})", MARKER_KEY),
    }
}

/// Prefix `body` with `marker`.
pub fn tag_body(marker: &str, body: &str) -> String {
    format!("{}\n\n{}", marker, body)
}

pub fn has_marker(body: &str, marker: &str) -> bool {
    body.lines().any(|line| line.trim() == marker)
}

/// A comment already present on the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingComment {
    pub id: u64,

    /// Enclosing thread, for platforms that group comments in threads.
    pub thread_id: Option<u64>,

    /// Global node id, for platforms with a separate GraphQL API.
    pub node_id: Option<String>,

    pub body: String,

    pub hidden: bool,
}

/// Primitive comment operations against one pull request or commit.
#[async_trait]
pub trait CommentBackend: Send + Sync {
    /// Platform name for logs.
    fn name(&self) -> &str;

    /// Existing comments, oldest first.
    async fn list_comments(&self) -> Result<Vec<ExistingComment>>;

    async fn create_comment(&self, body: &str) -> Result<()>;

    async fn update_comment(&self, comment: &ExistingComment, body: &str) -> Result<()>;

    async fn delete_comment(&self, comment: &ExistingComment) -> Result<()>;

    async fn hide_comment(&self, comment: &ExistingComment) -> Result<()>;
}

/// Applies a post behavior to a backend using marker-tagged comments.
pub struct TaggedPlatform<B> {
    backend: B,
    marker: String,
}

impl<B: CommentBackend> TaggedPlatform<B> {
    pub fn new(backend: B, tag: Option<&str>) -> Self {
        Self {
            backend,
            marker: marker(tag),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn matching_comments(&self) -> Result<Vec<ExistingComment>> {
        let comments = self.backend.list_comments().await?;
        let matching: Vec<_> = comments
            .into_iter()
            .filter(|c| has_marker(&c.body, &self.marker))
            .collect();
        debug!(count = matching.len(), marker = %self.marker, "Found matching comments");
        Ok(matching)
    }

    async fn update(&self, body: &str) -> Result<()> {
        let latest = self
            .matching_comments()
            .await?
            .into_iter()
            .rev()
            .find(|c| !c.hidden);
        match latest {
            Some(existing) if existing.body == body => {
                info!(id = existing.id, "Comment unchanged, skipping update");
                Ok(())
            }
            Some(existing) => {
                info!(id = existing.id, platform = self.backend.name(), "Updating comment");
                self.backend.update_comment(&existing, body).await
            }
            None => {
                info!(platform = self.backend.name(), "No existing comment, creating one");
                self.backend.create_comment(body).await
            }
        }
    }

    async fn delete_and_new(&self, body: &str) -> Result<()> {
        for existing in self.matching_comments().await? {
            info!(id = existing.id, platform = self.backend.name(), "Deleting comment");
            self.backend.delete_comment(&existing).await?;
        }
        self.backend.create_comment(body).await
    }

    async fn hide_and_new(&self, body: &str) -> Result<()> {
        for existing in self.matching_comments().await? {
            if existing.hidden {
                continue;
            }
            info!(id = existing.id, platform = self.backend.name(), "Hiding comment");
            self.backend.hide_comment(&existing).await?;
        }
        self.backend.create_comment(body).await
    }
}

#[async_trait]
impl<B: CommentBackend> CommentPlatform for TaggedPlatform<B> {
    fn name(&self) -> &str {
        self.backend.name()
    }

    async fn post_comment(&self, behavior: UpdateBehavior, body: &str) -> Result<()> {
        let body = tag_body(&self.marker, body);

        match behavior {
            UpdateBehavior::Update => self.update(&body).await,
            UpdateBehavior::DeleteAndNew => self.delete_and_new(&body).await,
            UpdateBehavior::HideAndNew => self.hide_and_new(&body).await,
            UpdateBehavior::New => {
                info!(platform = self.backend.name(), "Creating comment");
                self.backend.create_comment(&body).await
            }
        }
    }
}
