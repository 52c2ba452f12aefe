//! GitHub comment backend (REST v3, GraphQL for hiding).

use super::reconcile::{CommentBackend, ExistingComment};
use super::{check_response, http_client, request_error, DEFAULT_HTTP_TIMEOUT};
use async_trait::async_trait;
use infracost_tasks_core::{Result, TaskError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

const PER_PAGE: usize = 100;

// GitHub caps `nodes(ids:)` lookups at 100 ids.
const NODES_PER_QUERY: usize = 100;

const MINIMIZED_QUERY: &str = "query($ids: [ID!]!) { nodes(ids: $ids) { id ... on Minimizable { isMinimized } } }";

const MINIMIZE_MUTATION: &str = "mutation($id: ID!) { minimizeComment(input: {subjectId: $id, classifier: OUTDATED}) { clientMutationId } }";

/// What the comment attaches to on GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitHubTarget {
    PullRequest(u64),
    Commit(String),
}

/// Connection details for one GitHub repository.
#[derive(Clone)]
pub struct GitHubConfig {
    /// REST API root, e.g. `https://api.github.com`.
    pub api_url: String,

    /// `owner/repo`.
    pub repository: String,

    pub target: GitHubTarget,

    pub token: String,

    pub timeout: Duration,
}

impl GitHubConfig {
    pub fn new(
        api_url: impl Into<String>,
        repository: impl Into<String>,
        target: GitHubTarget,
        token: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            repository: repository.into(),
            target,
            token: token.into(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    fn api_root(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Collection URL used to list and create comments.
    pub fn comments_url(&self) -> String {
        match &self.target {
            GitHubTarget::PullRequest(number) => format!(
                "{}/repos/{}/issues/{}/comments",
                self.api_root(),
                self.repository,
                number
            ),
            GitHubTarget::Commit(sha) => format!(
                "{}/repos/{}/commits/{}/comments",
                self.api_root(),
                self.repository,
                sha
            ),
        }
    }

    /// URL of a single comment.
    pub fn comment_url(&self, id: u64) -> String {
        match &self.target {
            GitHubTarget::PullRequest(_) => format!(
                "{}/repos/{}/issues/comments/{}",
                self.api_root(),
                self.repository,
                id
            ),
            GitHubTarget::Commit(_) => format!(
                "{}/repos/{}/comments/{}",
                self.api_root(),
                self.repository,
                id
            ),
        }
    }

    /// GraphQL endpoint matching the REST root.
    ///
    /// GitHub Enterprise serves REST under `/api/v3` and GraphQL under
    /// `/api/graphql`.
    pub fn graphql_url(&self) -> String {
        let root = self.api_root();
        format!("{}/graphql", root.strip_suffix("/v3").unwrap_or(root))
    }
}

#[derive(Debug, Deserialize)]
struct ApiComment {
    id: u64,
    node_id: Option<String>,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NodesData {
    #[serde(default)]
    nodes: Vec<Option<MinimizableNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MinimizableNode {
    id: String,
    #[serde(default)]
    is_minimized: bool,
}

/// Node ids reported as minimized. Deleted comments come back as `null`.
fn minimized_ids(data: NodesData) -> HashSet<String> {
    data.nodes
        .into_iter()
        .flatten()
        .filter(|node| node.is_minimized)
        .map(|node| node.id)
        .collect()
}

/// Comment backend for a GitHub pull request or commit.
pub struct GitHubBackend {
    config: GitHubConfig,
    client: reqwest::Client,
}

impl GitHubBackend {
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        action: &str,
    ) -> Result<Option<T>> {
        let response = self
            .request(reqwest::Method::POST, &self.config.graphql_url())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| request_error(action, e))?;
        let result: GraphQlResponse<T> = check_response(response, action)
            .await?
            .json()
            .await
            .map_err(|e| request_error(action, e))?;

        if let Some(error) = result.errors.first() {
            return Err(TaskError::Delivery(format!(
                "{} failed: {}",
                action, error.message
            )));
        }
        Ok(result.data)
    }

    /// Which of `node_ids` are currently minimized.
    async fn minimized(&self, node_ids: &[String]) -> Result<HashSet<String>> {
        let mut minimized = HashSet::new();
        for chunk in node_ids.chunks(NODES_PER_QUERY) {
            let data: Option<NodesData> = self
                .graphql(
                    MINIMIZED_QUERY,
                    json!({ "ids": chunk }),
                    "checking hidden GitHub comments",
                )
                .await?;
            if let Some(data) = data {
                minimized.extend(minimized_ids(data));
            }
        }
        Ok(minimized)
    }
}

#[async_trait]
impl CommentBackend for GitHubBackend {
    fn name(&self) -> &str {
        "GitHub"
    }

    async fn list_comments(&self) -> Result<Vec<ExistingComment>> {
        let url = self.config.comments_url();
        let mut comments = Vec::new();
        let mut page = 1usize;

        loop {
            let response = self
                .request(reqwest::Method::GET, &url)
                .query(&[("per_page", PER_PAGE), ("page", page)])
                .send()
                .await
                .map_err(|e| request_error("listing GitHub comments", e))?;
            let batch: Vec<ApiComment> = check_response(response, "listing GitHub comments")
                .await?
                .json()
                .await
                .map_err(|e| request_error("decoding GitHub comments", e))?;

            let done = batch.len() < PER_PAGE;
            comments.extend(batch.into_iter().map(|c| ExistingComment {
                id: c.id,
                thread_id: None,
                node_id: c.node_id,
                body: c.body,
                hidden: false,
            }));

            if done {
                break;
            }
            page += 1;
        }

        // REST does not expose the minimized state.
        let node_ids: Vec<String> = comments.iter().filter_map(|c| c.node_id.clone()).collect();
        let minimized = self.minimized(&node_ids).await?;
        for comment in &mut comments {
            comment.hidden = comment
                .node_id
                .as_ref()
                .is_some_and(|id| minimized.contains(id));
        }

        debug!(
            count = comments.len(),
            hidden = minimized.len(),
            "Listed GitHub comments"
        );
        Ok(comments)
    }

    async fn create_comment(&self, body: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, &self.config.comments_url())
            .json(&json!({ "body": body }))
            .send()
            .await
            .map_err(|e| request_error("creating GitHub comment", e))?;
        check_response(response, "creating GitHub comment").await?;
        Ok(())
    }

    async fn update_comment(&self, comment: &ExistingComment, body: &str) -> Result<()> {
        let response = self
            .request(reqwest::Method::PATCH, &self.config.comment_url(comment.id))
            .json(&json!({ "body": body }))
            .send()
            .await
            .map_err(|e| request_error("updating GitHub comment", e))?;
        check_response(response, "updating GitHub comment").await?;
        Ok(())
    }

    async fn delete_comment(&self, comment: &ExistingComment) -> Result<()> {
        let response = self
            .request(reqwest::Method::DELETE, &self.config.comment_url(comment.id))
            .send()
            .await
            .map_err(|e| request_error("deleting GitHub comment", e))?;
        check_response(response, "deleting GitHub comment").await?;
        Ok(())
    }

    async fn hide_comment(&self, comment: &ExistingComment) -> Result<()> {
        let node_id = comment.node_id.as_deref().ok_or_else(|| {
            TaskError::Delivery(format!("GitHub comment {} has no node id", comment.id))
        })?;

        let _: Option<Value> = self
            .graphql(
                MINIMIZE_MUTATION,
                json!({ "id": node_id }),
                "hiding GitHub comment",
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(target: GitHubTarget) -> GitHubConfig {
        GitHubConfig::new("https://api.github.com/", "infracost/example", target, "token")
    }

    #[test]
    fn test_pull_request_urls() {
        let cfg = config(GitHubTarget::PullRequest(7));
        assert_eq!(
            cfg.comments_url(),
            "https://api.github.com/repos/infracost/example/issues/7/comments"
        );
        assert_eq!(
            cfg.comment_url(99),
            "https://api.github.com/repos/infracost/example/issues/comments/99"
        );
    }

    #[test]
    fn test_commit_urls() {
        let cfg = config(GitHubTarget::Commit("abc123".to_string()));
        assert_eq!(
            cfg.comments_url(),
            "https://api.github.com/repos/infracost/example/commits/abc123/comments"
        );
        assert_eq!(
            cfg.comment_url(5),
            "https://api.github.com/repos/infracost/example/comments/5"
        );
    }

    #[test]
    fn test_graphql_url() {
        assert_eq!(
            config(GitHubTarget::PullRequest(1)).graphql_url(),
            "https://api.github.com/graphql"
        );

        let ghes = GitHubConfig::new(
            "https://git.example.com/api/v3",
            "org/repo",
            GitHubTarget::PullRequest(1),
            "token",
        );
        assert_eq!(ghes.graphql_url(), "https://git.example.com/api/graphql");
    }

    #[test]
    fn test_decode_comment_without_body() {
        let comment: ApiComment =
            serde_json::from_str(r#"{"id": 3, "node_id": "IC_abc"}"#).unwrap();
        assert_eq!(comment.id, 3);
        assert_eq!(comment.body, "");
    }

    #[test]
    fn test_decode_minimized_nodes() {
        let response: GraphQlResponse<NodesData> = serde_json::from_str(
            r#"{
                "data": {
                    "nodes": [
                        {"id": "IC_1", "isMinimized": true},
                        {"id": "IC_2", "isMinimized": false},
                        null,
                        {"id": "IC_4"}
                    ]
                }
            }"#,
        )
        .unwrap();

        assert!(response.errors.is_empty());
        let minimized = minimized_ids(response.data.unwrap());
        assert_eq!(minimized, HashSet::from(["IC_1".to_string()]));
    }

    #[test]
    fn test_decode_graphql_errors() {
        let response: GraphQlResponse<NodesData> = serde_json::from_str(
            r#"{"data": null, "errors": [{"message": "Could not resolve to a node"}]}"#,
        )
        .unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "Could not resolve to a node");
    }

    #[tokio::test]
    async fn test_minimized_with_no_comments_skips_request() {
        let backend = GitHubBackend::new(config(GitHubTarget::PullRequest(1))).unwrap();
        assert!(backend.minimized(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hide_requires_node_id() {
        let backend = GitHubBackend::new(config(GitHubTarget::PullRequest(1))).unwrap();
        let comment = ExistingComment {
            id: 1,
            thread_id: None,
            node_id: None,
            body: String::new(),
            hidden: false,
        };
        let err = backend.hide_comment(&comment).await.unwrap_err();
        assert!(matches!(err, TaskError::Delivery(_)));
    }
}
