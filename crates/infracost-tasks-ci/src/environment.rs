//! Snapshot of the CI environment the task runs in.

use infracost_tasks_core::RepoProvider;
use std::collections::BTreeMap;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Immutable view of the environment variables relevant to the tasks.
///
/// Built once at startup so that detection logic never reads the process
/// environment directly.
#[derive(Debug, Clone, Default)]
pub struct CiEnvironment {
    vars: BTreeMap<String, String>,
}

impl CiEnvironment {
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Non-empty value of a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn flag(&self, name: &str) -> bool {
        self.get(name)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn is_azure_pipelines(&self) -> bool {
        self.flag("TF_BUILD")
    }

    pub fn is_github_actions(&self) -> bool {
        self.flag("GITHUB_ACTIONS")
    }

    /// Repository provider reported by the pipeline, if any.
    ///
    /// Outside Azure Pipelines a GitHub Actions run implies GitHub.
    pub fn repo_provider(&self) -> Option<RepoProvider> {
        match self.get("BUILD_REPOSITORY_PROVIDER") {
            Some(id) => Some(RepoProvider::from_id(id)),
            None if self.is_github_actions() => Some(RepoProvider::GitHub),
            None => None,
        }
    }

    /// `owner/repo` of a GitHub repository.
    pub fn github_repository(&self) -> Option<&str> {
        if self.is_azure_pipelines() {
            self.get("BUILD_REPOSITORY_NAME")
        } else {
            self.get("GITHUB_REPOSITORY")
        }
    }

    /// Pull request number for GitHub-hosted repositories.
    pub fn github_pull_request_number(&self) -> Option<u64> {
        if let Some(number) = self.get("SYSTEM_PULLREQUEST_PULLREQUESTNUMBER") {
            return number.parse().ok();
        }
        self.get("GITHUB_REF").and_then(pull_number_from_ref)
    }

    pub fn github_api_url(&self) -> &str {
        self.get("GITHUB_API_URL").unwrap_or(DEFAULT_GITHUB_API_URL)
    }

    /// Commit the pipeline is building.
    pub fn commit_sha(&self) -> Option<&str> {
        self.get("SYSTEM_PULLREQUEST_SOURCECOMMITID")
            .or_else(|| self.get("BUILD_SOURCEVERSION"))
            .or_else(|| self.get("GITHUB_SHA"))
    }

    pub fn azure_collection_uri(&self) -> Option<&str> {
        self.get("SYSTEM_COLLECTIONURI")
            .or_else(|| self.get("SYSTEM_TEAMFOUNDATIONCOLLECTIONURI"))
    }

    pub fn azure_team_project(&self) -> Option<&str> {
        self.get("SYSTEM_TEAMPROJECT")
    }

    pub fn azure_repository_id(&self) -> Option<&str> {
        self.get("BUILD_REPOSITORY_ID")
    }

    pub fn azure_pull_request_id(&self) -> Option<u64> {
        self.get("SYSTEM_PULLREQUEST_PULLREQUESTID")
            .and_then(|id| id.parse().ok())
    }

    /// Clone URL of the repository being built.
    pub fn repository_uri(&self) -> Option<&str> {
        self.get("BUILD_REPOSITORY_URI")
    }

    /// Whether task debug output was requested for this run.
    pub fn debug_enabled(&self) -> bool {
        self.flag("SYSTEM_DEBUG")
    }
}

fn pull_number_from_ref(git_ref: &str) -> Option<u64> {
    git_ref
        .strip_prefix("refs/pull/")?
        .split('/')
        .next()?
        .parse()
        .ok()
}
