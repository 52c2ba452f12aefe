//! Comment lifecycle decisions.
//!
//! Everything here is pure: no I/O, no clock, no randomness. Given the same
//! inputs the planner always produces the same format, note and body.

use crate::error::{Result, TaskError};
use crate::request::{RepoProvider, ReportPaths, TargetType, UpdateBehavior};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

const FEEDBACK_URL: &str = "https://www.infracost.io/feedback/submit/";

const UPDATED_NOTE: &str = "This comment will be updated when the cost estimate changes.";
const REPLACED_NOTE: &str = "This comment will be replaced when the cost estimate changes.";

/// Report format requested from `infracost output`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    GithubComment,
    AzureReposComment,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::GithubComment => "github-comment",
            OutputFormat::AzureReposComment => "azure-repos-comment",
        }
    }

    /// Markdown dialect the format renders to.
    pub fn markdown(&self) -> CommentFormat {
        match self {
            OutputFormat::GithubComment => CommentFormat::GithubMarkdown,
            OutputFormat::AzureReposComment => CommentFormat::AzureDevopsMarkdown,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markdown dialect of a rendered comment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum CommentFormat {
    GithubMarkdown,
    AzureDevopsMarkdown,
}

/// Final comment body, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedComment {
    body: String,
    format: CommentFormat,
}

impl RenderedComment {
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn format(&self) -> CommentFormat {
        self.format
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

/// Stateless decision engine for comment format, notes and support checks.
pub struct CommentPlanner;

impl CommentPlanner {
    /// Pick the report format for a provider.
    ///
    /// Providers other than GitHub fall back to the Azure Repos format.
    pub fn select_format(provider: &RepoProvider) -> OutputFormat {
        match provider {
            RepoProvider::GitHub => OutputFormat::GithubComment,
            RepoProvider::AzureRepos | RepoProvider::Other(_) => OutputFormat::AzureReposComment,
        }
    }

    /// Azure Repos commentary is pull-request scoped only.
    pub fn validate_target_support(provider: &RepoProvider, target_type: TargetType) -> Result<()> {
        match (provider, target_type) {
            (RepoProvider::AzureRepos, TargetType::Commit) => {
                Err(TaskError::UnsupportedCombination {
                    provider: provider.display_name().to_string(),
                    supported: TargetType::PullRequest.as_str().to_string(),
                    target_type: target_type.as_str().to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Note describing what happens to the comment on the next run.
    pub fn compose_note(target_type: TargetType, behavior: UpdateBehavior) -> &'static str {
        if target_type == TargetType::Commit {
            return "";
        }

        match behavior {
            UpdateBehavior::Update => UPDATED_NOTE,
            UpdateBehavior::DeleteAndNew => REPLACED_NOTE,
            UpdateBehavior::New | UpdateBehavior::HideAndNew => "",
        }
    }

    /// Decorate raw report text with the note and the feedback block.
    pub fn render_comment(
        raw_report: &str,
        format: OutputFormat,
        target_type: TargetType,
        behavior: UpdateBehavior,
    ) -> RenderedComment {
        let mut body = String::with_capacity(raw_report.len() + 512);
        body.push_str(raw_report);

        let note = Self::compose_note(target_type, behavior);
        if !note.is_empty() {
            body.push('\n');
            body.push_str(note);
            body.push_str("\n\n");
        }

        body.push_str(&feedback_block());

        RenderedComment {
            body,
            format: format.markdown(),
        }
    }

    /// Interpret the `path` input as either a JSON array of paths or one
    /// literal path.
    pub fn normalize_report_paths(raw: &str) -> Result<ReportPaths> {
        let parsed: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(e) if e.is_syntax() || e.is_eof() => {
                return ReportPaths::new(vec![raw.to_string()]);
            }
            Err(e) => return Err(TaskError::MalformedInput(e.to_string())),
        };

        match parsed {
            Value::Array(items) => {
                let paths = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(path) => Ok(path),
                        other => Err(TaskError::MalformedInput(format!(
                            "path list entries must be strings, got {}",
                            other
                        ))),
                    })
                    .collect::<Result<Vec<_>>>()?;
                ReportPaths::new(paths)
            }
            Value::String(_) => ReportPaths::new(vec![raw.to_string()]),
            other => Err(TaskError::MalformedInput(format!(
                "path must be a file path or a JSON array of paths, got {}",
                other
            ))),
        }
    }
}

fn feedback_link(value: &str, label: &str) -> String {
    format!(
        "<a href=\"{}?value={}\" rel=\"noopener noreferrer\" target=\"_blank\">{}</a>",
        FEEDBACK_URL, value, label
    )
}

/// Fixed suffix asking readers whether the comment was useful.
pub fn feedback_block() -> String {
    format!(
        "<sub>\n  Is this comment useful? {}, {}\n<sub>\n",
        feedback_link("yes", "Yes"),
        feedback_link("no", "No")
    )
}
