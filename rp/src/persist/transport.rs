//! SaveTransport - how change logs reach the server

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::error::version_in_message;
use super::{SaveError, ServerConfig};
use crate::domain::RoadmapData;
use crate::tracker::ChangeLog;

/// Partial update sent to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    /// Last server version this client saw
    pub version: u64,
    pub user_id: String,
    #[serde(flatten)]
    pub changes: ChangeLog,
}

impl SaveRequest {
    pub fn new(version: u64, user_id: impl Into<String>, changes: ChangeLog) -> Self {
        Self {
            version,
            user_id: user_id.into(),
            changes,
        }
    }
}

/// Server answer to a save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub version: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn ok(version: u64) -> Self {
        Self {
            version,
            success: true,
            error: None,
        }
    }

    pub fn rejected(version: u64, error: impl Into<String>) -> Self {
        Self {
            version,
            success: false,
            error: Some(error.into()),
        }
    }

    /// New server version, or the rejection as an error
    pub fn into_result(self) -> Result<u64, SaveError> {
        if self.success {
            Ok(self.version)
        } else {
            Err(SaveError::from_rejection(self.error, self.version))
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: u64,
}

/// Capability to talk to the persistence server
#[async_trait]
pub trait SaveTransport: Send + Sync {
    /// Send a partial update
    async fn save(&self, request: SaveRequest) -> Result<SaveResponse, SaveError>;

    /// Fetch the full snapshot
    async fn fetch(&self) -> Result<RoadmapData, SaveError>;

    /// Fetch only the current server version
    async fn fetch_version(&self) -> Result<u64, SaveError>;
}

/// JSON-over-HTTP transport
pub struct HttpTransport {
    base_url: String,
    http: Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn from_config(config: &ServerConfig) -> Result<Self, SaveError> {
        debug!(?config, "from_config: called");
        let timeout = config.timeout();
        let http = Client::builder().timeout(timeout).build().map_err(SaveError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send_error(&self, e: reqwest::Error) -> SaveError {
        if e.is_timeout() {
            debug!("send_error: request timed out");
            SaveError::Timeout(self.timeout)
        } else {
            SaveError::Network(e)
        }
    }

    async fn check_status(response: Response) -> Result<Response, SaveError> {
        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(%status, "check_status: API error");
            let message = response.text().await.unwrap_or_default();
            return Err(SaveError::ApiError { status, message });
        }
        Ok(response)
    }
}

#[async_trait]
impl SaveTransport for HttpTransport {
    async fn save(&self, request: SaveRequest) -> Result<SaveResponse, SaveError> {
        debug!(version = request.version, entries = request.changes.len(), "save: called");
        let response = self
            .http
            .put(self.url("/api/v1/data"))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status().as_u16();
        if status == 409 {
            // Conflicts usually still carry a SaveResponse body
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "save: version conflict");
            return match serde_json::from_str::<SaveResponse>(&text) {
                Ok(parsed) => Ok(parsed),
                Err(_) => Err(SaveError::Conflict {
                    server_version: version_in_message(&text),
                    message: text,
                }),
            };
        }

        let response = Self::check_status(response).await?;
        let parsed: SaveResponse = response.json().await?;
        debug!(version = parsed.version, success = parsed.success, "save: response");
        Ok(parsed)
    }

    async fn fetch(&self) -> Result<RoadmapData, SaveError> {
        debug!("fetch: called");
        let response = self
            .http
            .get(self.url("/api/v1/data"))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = Self::check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn fetch_version(&self) -> Result<u64, SaveError> {
        debug!("fetch_version: called");
        let response = self
            .http
            .get(self.url("/api/v1/version"))
            .send()
            .await
            .map_err(|e| self.send_error(e))?;
        let response = Self::check_status(response).await?;
        let parsed: VersionResponse = response.json().await?;
        Ok(parsed.version)
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_request_wire_shape() {
        let mut changes = ChangeLog::default();
        let mut patch = serde_json::Map::new();
        patch.insert("id".to_string(), json!("t1"));
        patch.insert("planWeeks".to_string(), json!(5));
        changes.tasks.push(patch);
        changes.deleted.resources.push("r9".to_string());

        let request = SaveRequest::new(7, "u1", changes);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "version": 7,
                "userId": "u1",
                "tasks": [{"id": "t1", "planWeeks": 5}],
                "deleted": {"resources": ["r9"]}
            })
        );
    }

    #[test]
    fn test_request_omits_unchanged_kinds() {
        let request = SaveRequest::new(1, "u1", ChangeLog::default());
        let value = serde_json::to_value(&request).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(value["teams"], Value::Null);
    }

    #[test]
    fn test_response_into_result() {
        let response: SaveResponse = serde_json::from_str(r#"{"version": 5, "success": true}"#).unwrap();
        assert_eq!(response.into_result().unwrap(), 5);

        let err = SaveResponse::rejected(6, "Version conflict").into_result().unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(err.server_version(), Some(6));
    }

    #[test]
    fn test_http_transport_trims_base_url() {
        let config = ServerConfig {
            base_url: "http://example.test/".to_string(),
            ..Default::default()
        };
        let transport = HttpTransport::from_config(&config).unwrap();
        assert_eq!(transport.url("/api/v1/data"), "http://example.test/api/v1/data");
    }

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockTransport::new();
        transport.push_response(Ok(SaveResponse::rejected(3, "nope")));

        let first = transport.save(SaveRequest::new(2, "u1", ChangeLog::default())).await.unwrap();
        assert!(!first.success);
        let second = transport.save(SaveRequest::new(2, "u1", ChangeLog::default())).await.unwrap();
        assert_eq!(second, SaveResponse::ok(3));

        assert_eq!(transport.call_count(), 2);
        assert_eq!(transport.requests().len(), 2);
    }
}
