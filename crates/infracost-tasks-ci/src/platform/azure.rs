//! Azure Repos comment backend (pull request threads, REST 6.0).

use super::reconcile::{CommentBackend, ExistingComment};
use super::{check_response, http_client, request_error, DEFAULT_HTTP_TIMEOUT};
use async_trait::async_trait;
use infracost_tasks_core::{Result, TaskError};
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const API_VERSION: &str = "6.0";

// Thread status codes from the Azure DevOps API.
const THREAD_STATUS_ACTIVE: u8 = 1;
const THREAD_STATUS_CLOSED: u8 = 4;

const COMMENT_TYPE_TEXT: u8 = 1;

/// Connection details for one Azure Repos pull request.
#[derive(Clone)]
pub struct AzureReposConfig {
    /// Organization URL, e.g. `https://dev.azure.com/org/`.
    pub collection_uri: String,

    pub project: String,

    pub repository_id: String,

    pub pull_request_id: u64,

    pub token: String,

    pub timeout: Duration,
}

impl AzureReposConfig {
    pub fn new(
        collection_uri: impl Into<String>,
        project: impl Into<String>,
        repository_id: impl Into<String>,
        pull_request_id: u64,
        token: impl Into<String>,
    ) -> Self {
        Self {
            collection_uri: collection_uri.into(),
            project: project.into(),
            repository_id: repository_id.into(),
            pull_request_id,
            token: token.into(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    /// Build an API URL below the pull request's `threads` collection.
    pub fn threads_url(&self, tail: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.collection_uri).map_err(|e| {
            TaskError::Delivery(format!(
                "invalid collection URI {}: {}",
                self.collection_uri, e
            ))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TaskError::Delivery(format!(
                    "collection URI {} cannot be a base",
                    self.collection_uri
                ))
            })?;
            let pull_request_id = self.pull_request_id.to_string();
            segments.pop_if_empty().extend([
                self.project.as_str(),
                "_apis",
                "git",
                "repositories",
                self.repository_id.as_str(),
                "pullRequests",
                pull_request_id.as_str(),
                "threads",
            ]);
            segments.extend(tail);
        }

        url.query_pairs_mut().append_pair("api-version", API_VERSION);
        Ok(url)
    }
}

#[derive(Debug, Deserialize)]
struct ThreadList {
    #[serde(default)]
    value: Vec<Thread>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Thread {
    id: u64,
    #[serde(default)]
    is_deleted: bool,
    status: Option<String>,
    #[serde(default)]
    comments: Vec<ThreadComment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadComment {
    id: u64,
    #[serde(default)]
    content: String,
    #[serde(default)]
    is_deleted: bool,
}

fn existing_comments(threads: ThreadList) -> Vec<ExistingComment> {
    threads
        .value
        .into_iter()
        .filter(|t| !t.is_deleted)
        .filter_map(|thread| {
            let hidden = thread.status.as_deref() == Some("closed");
            let thread_id = thread.id;
            thread
                .comments
                .into_iter()
                .find(|c| !c.is_deleted)
                .map(|c| ExistingComment {
                    id: c.id,
                    thread_id: Some(thread_id),
                    node_id: None,
                    body: c.content,
                    hidden,
                })
        })
        .collect()
}

/// Comment backend for an Azure Repos pull request.
pub struct AzureReposBackend {
    config: AzureReposConfig,
    client: reqwest::Client,
}

impl AzureReposBackend {
    pub fn new(config: AzureReposConfig) -> Result<Self> {
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AzureReposConfig {
        &self.config
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth("", Some(&self.config.token))
    }

    fn thread_id(comment: &ExistingComment) -> Result<String> {
        comment
            .thread_id
            .map(|id| id.to_string())
            .ok_or_else(|| TaskError::Delivery(format!("comment {} has no thread", comment.id)))
    }
}

#[async_trait]
impl CommentBackend for AzureReposBackend {
    fn name(&self) -> &str {
        "Azure Repos"
    }

    async fn list_comments(&self) -> Result<Vec<ExistingComment>> {
        let url = self.config.threads_url(&[])?;
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| request_error("listing Azure Repos threads", e))?;
        let threads: ThreadList = check_response(response, "listing Azure Repos threads")
            .await?
            .json()
            .await
            .map_err(|e| request_error("decoding Azure Repos threads", e))?;

        let comments = existing_comments(threads);
        debug!(count = comments.len(), "Listed Azure Repos threads");
        Ok(comments)
    }

    async fn create_comment(&self, body: &str) -> Result<()> {
        let url = self.config.threads_url(&[])?;
        let response = self
            .request(reqwest::Method::POST, url)
            .json(&json!({
                "comments": [{
                    "parentCommentId": 0,
                    "content": body,
                    "commentType": COMMENT_TYPE_TEXT,
                }],
                "status": THREAD_STATUS_ACTIVE,
            }))
            .send()
            .await
            .map_err(|e| request_error("creating Azure Repos thread", e))?;
        check_response(response, "creating Azure Repos thread").await?;
        Ok(())
    }

    async fn update_comment(&self, comment: &ExistingComment, body: &str) -> Result<()> {
        let thread_id = Self::thread_id(comment)?;
        let comment_id = comment.id.to_string();
        let url = self
            .config
            .threads_url(&[thread_id.as_str(), "comments", comment_id.as_str()])?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(&json!({ "content": body }))
            .send()
            .await
            .map_err(|e| request_error("updating Azure Repos comment", e))?;
        check_response(response, "updating Azure Repos comment").await?;
        Ok(())
    }

    async fn delete_comment(&self, comment: &ExistingComment) -> Result<()> {
        let thread_id = Self::thread_id(comment)?;
        let comment_id = comment.id.to_string();
        let url = self
            .config
            .threads_url(&[thread_id.as_str(), "comments", comment_id.as_str()])?;
        let response = self
            .request(reqwest::Method::DELETE, url)
            .send()
            .await
            .map_err(|e| request_error("deleting Azure Repos comment", e))?;
        check_response(response, "deleting Azure Repos comment").await?;
        Ok(())
    }

    async fn hide_comment(&self, comment: &ExistingComment) -> Result<()> {
        let thread_id = Self::thread_id(comment)?;
        let url = self.config.threads_url(&[thread_id.as_str()])?;
        let response = self
            .request(reqwest::Method::PATCH, url)
            .json(&json!({ "status": THREAD_STATUS_CLOSED }))
            .send()
            .await
            .map_err(|e| request_error("closing Azure Repos thread", e))?;
        check_response(response, "closing Azure Repos thread").await?;
        Ok(())
    }
}
