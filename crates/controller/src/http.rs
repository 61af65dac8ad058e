//! HTTP client for the ragreader API.
//!
//! Implements [`JobApi`] for the lifecycle controller and exposes the
//! pass-through endpoints the CLI needs (sign-up, document submission,
//! queries). All endpoints live under `{api_url}/api/{version}`.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ragreader_core::{ApiConfig, ApiError, CreateJobResponse, JobId, JobStatusReport, JobTicket};

use crate::api::JobApi;

/// Client for the ragreader REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

/// One of the three mutually exclusive ways to hand content to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    File(std::path::PathBuf),
    Url(String),
    Text(String),
}

/// Generic `{status, message, data}` envelope returned by most endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerMessage {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ServerMessage {
    /// The answer text of a query response.
    ///
    /// Accepts `data` as a bare string or as `{"answer": ...}`, falling back
    /// to `message`.
    pub fn answer(&self) -> Option<&str> {
        match &self.data {
            Some(serde_json::Value::String(text)) => Some(text.as_str()),
            Some(serde_json::Value::Object(map)) => map
                .get("answer")
                .and_then(|a| a.as_str())
                .or(self.message.as_deref()),
            _ => self.message.as_deref(),
        }
    }

    /// Retrieved context passages, when the server includes them.
    pub fn context(&self) -> Vec<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get("context"))
            .and_then(|c| c.as_array())
            .map(|items| items.iter().filter_map(|i| i.as_str()).collect())
            .unwrap_or_default()
    }
}

#[derive(Serialize)]
struct UserBody<'a> {
    #[serde(rename = "USER")]
    user: &'a str,
}

#[derive(Serialize)]
struct SignUpBody<'a> {
    #[serde(rename = "USERNAME")]
    username: &'a str,
    #[serde(rename = "EMAIL")]
    email: &'a str,
}

#[derive(Serialize)]
struct UrlBody<'a> {
    #[serde(rename = "URL")]
    url: &'a str,
    #[serde(rename = "USER")]
    user: &'a str,
}

#[derive(Serialize)]
struct TextBody<'a> {
    #[serde(rename = "TEXT")]
    text: &'a str,
    #[serde(rename = "USER")]
    user: &'a str,
}

#[derive(Serialize)]
struct QueryBody<'a> {
    #[serde(rename = "QUERY")]
    query: &'a str,
    #[serde(rename = "USER")]
    user: &'a str,
}

fn transport(e: reqwest::Error) -> ApiError {
    ApiError::Transport(e.to_string())
}

impl ApiClient {
    /// Create a client for the configured API, with its request timeout.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(transport)?;
        Ok(Self {
            base_url: config.base_url(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode a JSON body, mapping non-2xx to [`ApiError::Status`].
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = request.send().await.map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await.map_err(transport)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Register a guest user.
    pub async fn sign_up(&self, username: &str, email: &str) -> Result<ServerMessage, ApiError> {
        let request = self
            .http
            .post(self.url("sign-up/"))
            .json(&SignUpBody { username, email });
        self.send_json(request).await
    }

    /// Upload a document, URL or pasted text for `user`.
    pub async fn submit(&self, submission: &Submission, user: &str) -> Result<ServerMessage, ApiError> {
        match submission {
            Submission::File(path) => self.submit_file(path, user).await,
            Submission::Url(url) => {
                let request = self
                    .http
                    .post(self.url("insert-url/"))
                    .json(&UrlBody { url, user });
                self.send_json(request).await
            }
            Submission::Text(text) => {
                let request = self
                    .http
                    .post(self.url("insert-text/"))
                    .json(&TextBody { text, user });
                self.send_json(request).await
            }
        }
    }

    async fn submit_file(&self, path: &Path, user: &str) -> Result<ServerMessage, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        debug!(file = %file_name, size = bytes.len(), "uploading document");

        let form = reqwest::multipart::Form::new()
            .part("FILE", reqwest::multipart::Part::bytes(bytes).file_name(file_name))
            .text("USER", user.to_string());
        let request = self.http.post(self.url("insert-data/")).multipart(form);
        self.send_json(request).await
    }

    /// Ask a question against the indexed documents.
    pub async fn query(&self, query: &str, user: &str) -> Result<ServerMessage, ApiError> {
        let request = self
            .http
            .post(self.url("query/"))
            .json(&QueryBody { query, user });
        self.send_json(request).await
    }

    /// Drop everything the server has indexed.
    pub async fn clean(&self) -> Result<ServerMessage, ApiError> {
        self.send_json(self.http.get(self.url("clean/"))).await
    }
}

#[async_trait]
impl JobApi for ApiClient {
    async fn create_job(&self, identity: &str) -> Result<JobTicket, ApiError> {
        let request = self
            .http
            .post(self.url("open-chat/"))
            .json(&UserBody { user: identity });
        let resp: CreateJobResponse = self.send_json(request).await?;
        JobTicket::try_from(resp)
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusReport, ApiError> {
        let url = self.url(&format!("job-status/{}/", job_id));
        self.send_json(self.http.get(url)).await
    }
}
