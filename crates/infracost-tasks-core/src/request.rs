//! Comment request value types.

use crate::error::{Result, TaskError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a newly rendered comment reconciles with previously posted ones.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateBehavior {
    /// Edit the latest matching comment in place.
    #[default]
    Update,

    /// Delete matching comments, then post a new one.
    DeleteAndNew,

    /// Always post a new comment.
    New,

    /// Hide matching comments, then post a new one.
    HideAndNew,
}

impl UpdateBehavior {
    pub const ALL: [UpdateBehavior; 4] = [
        UpdateBehavior::Update,
        UpdateBehavior::DeleteAndNew,
        UpdateBehavior::New,
        UpdateBehavior::HideAndNew,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateBehavior::Update => "update",
            UpdateBehavior::DeleteAndNew => "delete-and-new",
            UpdateBehavior::New => "new",
            UpdateBehavior::HideAndNew => "hide-and-new",
        }
    }
}

impl fmt::Display for UpdateBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateBehavior {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        UpdateBehavior::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| TaskError::InvalidInput {
                name: "behavior".to_string(),
                value: s.to_string(),
            })
    }
}

/// What a comment attaches to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TargetType {
    #[default]
    PullRequest,
    Commit,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::PullRequest => "pull-request",
            TargetType::Commit => "commit",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pull-request" => Ok(TargetType::PullRequest),
            "commit" => Ok(TargetType::Commit),
            other => Err(TaskError::InvalidInput {
                name: "targetType".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Hosting VCS platform of the repository being built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RepoProvider {
    GitHub,
    AzureRepos,
    /// Any provider identifier without dedicated support.
    Other(String),
}

impl RepoProvider {
    /// Map a `BUILD_REPOSITORY_PROVIDER` identifier.
    pub fn from_id(id: &str) -> Self {
        match id {
            "GitHub" => RepoProvider::GitHub,
            "TfsGit" => RepoProvider::AzureRepos,
            other => RepoProvider::Other(other.to_string()),
        }
    }

    /// The identifier as the pipeline platform spells it.
    pub fn id(&self) -> &str {
        match self {
            RepoProvider::GitHub => "GitHub",
            RepoProvider::AzureRepos => "TfsGit",
            RepoProvider::Other(id) => id,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            RepoProvider::GitHub => "GitHub",
            RepoProvider::AzureRepos => "Azure DevOps Repos",
            RepoProvider::Other(id) => id,
        }
    }
}

impl fmt::Display for RepoProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Ordered, non-empty list of report artifact locations.
///
/// Elements are kept verbatim; existence is checked by the infracost CLI.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportPaths(Vec<String>);

impl ReportPaths {
    pub fn new(paths: Vec<String>) -> Result<Self> {
        if paths.is_empty() {
            return Err(TaskError::MalformedInput(
                "path list must contain at least one entry".to_string(),
            ));
        }
        Ok(Self(paths))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ReportPaths {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A single comment task invocation, built once from task inputs.
#[derive(Debug, Clone, Serialize)]
pub struct CommentRequest {
    pub report_paths: ReportPaths,
    pub update_behavior: UpdateBehavior,
    pub target_type: TargetType,
    pub repo_provider: RepoProvider,
    pub tag: Option<String>,
    pub dry_run: bool,
}

impl CommentRequest {
    /// Create a request with default behavior and target type.
    pub fn new(report_paths: ReportPaths, repo_provider: RepoProvider) -> Self {
        Self {
            report_paths,
            update_behavior: UpdateBehavior::default(),
            target_type: TargetType::default(),
            repo_provider,
            tag: None,
            dry_run: false,
        }
    }

    pub fn with_behavior(mut self, behavior: UpdateBehavior) -> Self {
        self.update_behavior = behavior;
        self
    }

    pub fn with_target_type(mut self, target_type: TargetType) -> Self {
        self.target_type = target_type;
        self
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Check the target type against the provider.
    pub fn validate(&self) -> Result<()> {
        crate::planner::CommentPlanner::validate_target_support(
            &self.repo_provider,
            self.target_type,
        )
    }
}
