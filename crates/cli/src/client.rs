//! HTTP client for the test hub API

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use testdeck_common::{
    Error, FsRecord, ProjectId, Result, RunConfig, RunSnapshot, RunTicket, Suite, SuiteDraft,
    WorkspaceApi,
};
use tracing::{debug, error};

/// Client for the test hub REST API
#[derive(Clone)]
pub struct HubClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ScanResponse {
    #[serde(default)]
    count: usize,
}

impl HubClient {
    /// Create a new client rooted at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}{}", method, self.base_url, path);
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = remote_error(status.as_u16(), &body);
        error!("API error: {}", err);
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Check whether the API answers at all
    pub async fn health_check(&self) -> bool {
        self.http.get(&self.base_url).send().await.is_ok()
    }
}

/// Build the error for a non-2xx response, preferring the API's own message
fn remote_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["details", "error", "message"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no response body".to_string()
            } else {
                trimmed.to_string()
            }
        });
    Error::Remote { status, message }
}

#[async_trait]
impl WorkspaceApi for HubClient {
    async fn fetch_tree(&self, project: &ProjectId) -> Result<Vec<FsRecord>> {
        let request = self
            .request(Method::GET, "/api/fs")
            .query(&[("projectId", project.as_str())]);
        self.send_json(request).await
    }

    async fn submit_batch_run(
        &self,
        project: &ProjectId,
        file_ids: &[String],
        config: &RunConfig,
    ) -> Result<RunTicket> {
        let request = self
            .request(Method::POST, "/api/runner/batch-execute")
            .json(&json!({
                "projectId": project,
                "fileIds": file_ids,
                "config": config,
            }));
        self.send_json(request).await
    }

    async fn run_status(&self, run_id: &str, project: &ProjectId) -> Result<RunSnapshot> {
        let request = self
            .request(Method::GET, &format!("/api/runner/run/{}", run_id))
            .query(&[("projectId", project.as_str())]);
        self.send_json(request).await
    }

    async fn cancel_run(&self, run_id: &str, project: &ProjectId) -> Result<()> {
        let request = self
            .request(Method::POST, &format!("/api/runner/cancel/{}", run_id))
            .json(&json!({ "projectId": project }));
        self.send(request).await?;
        Ok(())
    }

    async fn list_runs(&self, project: &ProjectId) -> Result<Vec<RunSnapshot>> {
        let request = self.request(Method::GET, &format!("/api/runner/runs/{}", project));
        self.send_json(request).await
    }

    async fn rescan(&self, project: &ProjectId) -> Result<usize> {
        let request = self
            .request(Method::POST, "/api/runner/scan")
            .json(&json!({ "projectId": project }));
        let response: ScanResponse = self.send_json(request).await?;
        Ok(response.count)
    }

    async fn list_suites(&self, project: &ProjectId) -> Result<Vec<Suite>> {
        let request = self
            .request(Method::GET, "/api/suites")
            .query(&[("projectId", project.as_str())]);
        self.send_json(request).await
    }

    async fn create_suite(&self, project: &ProjectId, draft: &SuiteDraft) -> Result<Suite> {
        let request = self.request(Method::POST, "/api/suites").json(&json!({
            "projectId": project,
            "name": draft.name,
            "description": draft.description,
            "fileIds": draft.file_ids,
        }));
        self.send_json(request).await
    }

    async fn delete_suite(&self, project: &ProjectId, suite_id: &str) -> Result<()> {
        let request = self
            .request(Method::DELETE, &format!("/api/suites/{}", suite_id))
            .query(&[("projectId", project.as_str())]);
        self.send(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_prefers_details() {
        let err = remote_error(400, r#"{"error":"bad","details":"fileIds empty"}"#);
        match err {
            Error::Remote { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "fileIds empty");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_remote_error_falls_back_to_body() {
        let err = remote_error(502, "  Bad Gateway \n");
        assert_eq!(err.to_string(), "Remote returned 502: Bad Gateway");

        let err = remote_error(500, "");
        assert_eq!(err.to_string(), "Remote returned 500: no response body");
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = HubClient::new("http://localhost:8081/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8081");
    }
}
