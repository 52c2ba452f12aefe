//! Platform detection from the CI environment.

use super::azure::{AzureReposBackend, AzureReposConfig};
use super::github::{GitHubBackend, GitHubConfig, GitHubTarget};
use super::reconcile::TaggedPlatform;
use super::{CommentPlatform, DetectOptions, DryRunPlatform, PlatformDetector, DEFAULT_HTTP_TIMEOUT};
use crate::environment::CiEnvironment;
use infracost_tasks_core::{
    CommentPlanner, CredentialInput, RepoProvider, Result, TargetType, TaskError,
};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

pub const NOT_DETECTED: &str = "Unable to detect current environment";

/// Where a comment will be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectedTarget {
    GitHub {
        api_url: String,
        repository: String,
        target: GitHubTarget,
    },
    AzureRepos {
        collection_uri: String,
        project: String,
        repository_id: String,
        pull_request_id: u64,
    },
}

impl DetectedTarget {
    pub fn provider(&self) -> RepoProvider {
        match self {
            DetectedTarget::GitHub { .. } => RepoProvider::GitHub,
            DetectedTarget::AzureRepos { .. } => RepoProvider::AzureRepos,
        }
    }
}

impl fmt::Display for DetectedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectedTarget::GitHub {
                repository,
                target: GitHubTarget::PullRequest(number),
                ..
            } => write!(f, "GitHub pull request {}#{}", repository, number),
            DetectedTarget::GitHub {
                repository,
                target: GitHubTarget::Commit(sha),
                ..
            } => write!(f, "GitHub commit {}@{}", repository, sha),
            DetectedTarget::AzureRepos {
                project,
                repository_id,
                pull_request_id,
                ..
            } => write!(
                f,
                "Azure Repos pull request {}/{}!{}",
                project, repository_id, pull_request_id
            ),
        }
    }
}

fn missing(what: &str) -> TaskError {
    TaskError::PlatformNotDetected(format!("{}: missing {}", NOT_DETECTED, what))
}

/// Work out the comment target from environment facts.
pub fn detect_target(env: &CiEnvironment, target_type: TargetType) -> Result<DetectedTarget> {
    let provider = env
        .repo_provider()
        .ok_or_else(|| TaskError::PlatformNotDetected(NOT_DETECTED.to_string()))?;
    debug!(provider = %provider.id(), target_type = %target_type, "Detecting comment target");

    match provider {
        RepoProvider::GitHub => {
            let repository = env
                .github_repository()
                .ok_or_else(|| missing("repository name"))?
                .to_string();
            let target = match target_type {
                TargetType::PullRequest => GitHubTarget::PullRequest(
                    env.github_pull_request_number()
                        .ok_or_else(|| missing("pull request number"))?,
                ),
                TargetType::Commit => GitHubTarget::Commit(
                    env.commit_sha()
                        .ok_or_else(|| missing("commit SHA"))?
                        .to_string(),
                ),
            };
            Ok(DetectedTarget::GitHub {
                api_url: env.github_api_url().to_string(),
                repository,
                target,
            })
        }
        RepoProvider::AzureRepos => {
            CommentPlanner::validate_target_support(&provider, target_type)?;
            Ok(DetectedTarget::AzureRepos {
                collection_uri: env
                    .azure_collection_uri()
                    .ok_or_else(|| missing("SYSTEM_COLLECTIONURI"))?
                    .to_string(),
                project: env
                    .azure_team_project()
                    .ok_or_else(|| missing("SYSTEM_TEAMPROJECT"))?
                    .to_string(),
                repository_id: env
                    .azure_repository_id()
                    .ok_or_else(|| missing("BUILD_REPOSITORY_ID"))?
                    .to_string(),
                pull_request_id: env
                    .azure_pull_request_id()
                    .ok_or_else(|| missing("SYSTEM_PULLREQUEST_PULLREQUESTID"))?,
            })
        }
        RepoProvider::Other(_) => Err(TaskError::PlatformNotDetected(NOT_DETECTED.to_string())),
    }
}

/// Detects the platform from a [`CiEnvironment`] snapshot.
#[derive(Debug, Clone)]
pub struct EnvPlatformDetector {
    env: CiEnvironment,
    timeout: Duration,
}

impl EnvPlatformDetector {
    pub fn new(env: CiEnvironment) -> Self {
        Self {
            env,
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl PlatformDetector for EnvPlatformDetector {
    fn autodetect(&self, options: &DetectOptions) -> Result<Box<dyn CommentPlatform>> {
        let detected = detect_target(&self.env, options.target_type)?;
        info!(target_type = %options.target_type, detected = %detected, "Detected comment target");

        if options.dry_run {
            return Ok(Box::new(DryRunPlatform::new(detected.to_string())));
        }

        let provider = detected.provider();
        let token = match &options.credential {
            Some(credential) => credential.token().to_string(),
            None => {
                let input = CredentialInput::for_provider(&provider)?;
                return Err(TaskError::MissingInput(input.input_name().to_string()));
            }
        };
        let tag = options.tag.as_deref();

        match detected {
            DetectedTarget::GitHub {
                api_url,
                repository,
                target,
            } => {
                let mut config = GitHubConfig::new(api_url, repository, target, token);
                config.timeout = self.timeout;
                Ok(Box::new(TaggedPlatform::new(GitHubBackend::new(config)?, tag)))
            }
            DetectedTarget::AzureRepos {
                collection_uri,
                project,
                repository_id,
                pull_request_id,
            } => {
                let mut config = AzureReposConfig::new(
                    collection_uri,
                    project,
                    repository_id,
                    pull_request_id,
                    token,
                );
                config.timeout = self.timeout;
                Ok(Box::new(TaggedPlatform::new(AzureReposBackend::new(config)?, tag)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infracost_tasks_core::Credential;

    fn azure_github_env() -> CiEnvironment {
        CiEnvironment::from_vars([
            ("TF_BUILD", "True"),
            ("BUILD_REPOSITORY_PROVIDER", "GitHub"),
            ("BUILD_REPOSITORY_NAME", "infracost/example"),
            ("SYSTEM_PULLREQUEST_PULLREQUESTNUMBER", "8"),
            ("BUILD_SOURCEVERSION", "deadbeef"),
        ])
    }

    fn azure_repos_env() -> CiEnvironment {
        CiEnvironment::from_vars([
            ("TF_BUILD", "True"),
            ("BUILD_REPOSITORY_PROVIDER", "TfsGit"),
            ("SYSTEM_COLLECTIONURI", "https://dev.azure.com/infracost/"),
            ("SYSTEM_TEAMPROJECT", "costs"),
            ("BUILD_REPOSITORY_ID", "repo-id"),
            ("SYSTEM_PULLREQUEST_PULLREQUESTID", "21"),
        ])
    }

    #[test]
    fn test_detect_github_pull_request() {
        let target = detect_target(&azure_github_env(), TargetType::PullRequest).unwrap();
        assert_eq!(
            target,
            DetectedTarget::GitHub {
                api_url: "https://api.github.com".to_string(),
                repository: "infracost/example".to_string(),
                target: GitHubTarget::PullRequest(8),
            }
        );
        assert_eq!(target.to_string(), "GitHub pull request infracost/example#8");
    }

    #[test]
    fn test_detect_github_commit() {
        let target = detect_target(&azure_github_env(), TargetType::Commit).unwrap();
        assert!(matches!(
            target,
            DetectedTarget::GitHub { target: GitHubTarget::Commit(ref sha), .. } if sha == "deadbeef"
        ));
    }

    #[test]
    fn test_detect_azure_repos() {
        let target = detect_target(&azure_repos_env(), TargetType::PullRequest).unwrap();
        assert_eq!(target.provider(), RepoProvider::AzureRepos);
        assert_eq!(target.to_string(), "Azure Repos pull request costs/repo-id!21");
    }

    #[test]
    fn test_azure_repos_rejects_commit() {
        let err = detect_target(&azure_repos_env(), TargetType::Commit).unwrap_err();
        assert!(matches!(err, TaskError::UnsupportedCombination { .. }));
    }

    #[test]
    fn test_undetected_environment() {
        let err = detect_target(&CiEnvironment::default(), TargetType::PullRequest).unwrap_err();
        assert_eq!(err.to_string(), NOT_DETECTED);
    }

    #[test]
    fn test_missing_pull_request_id() {
        let env = CiEnvironment::from_vars([
            ("BUILD_REPOSITORY_PROVIDER", "GitHub"),
            ("GITHUB_REPOSITORY", "infracost/example"),
        ]);
        let err = detect_target(&env, TargetType::PullRequest).unwrap_err();
        assert!(err.to_string().starts_with(NOT_DETECTED));
        assert!(err.to_string().contains("pull request number"));
    }

    #[test]
    fn test_autodetect_dry_run_needs_no_token() {
        let detector = EnvPlatformDetector::new(azure_github_env());
        let platform = detector
            .autodetect(&DetectOptions {
                dry_run: true,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(platform.name(), "dry-run");
    }

    #[test]
    fn test_autodetect_requires_token() {
        let detector = EnvPlatformDetector::new(azure_repos_env());
        let err = detector
            .autodetect(&DetectOptions::default())
            .err()
            .expect("expected missing token");
        assert_eq!(err.to_string(), "Input required: azureReposToken");
    }

    #[test]
    fn test_autodetect_builds_backend() {
        let detector = EnvPlatformDetector::new(azure_github_env());
        let platform = detector
            .autodetect(&DetectOptions {
                credential: Some(Credential::new(CredentialInput::GithubToken, "token")),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(platform.name(), "GitHub");
    }
}
