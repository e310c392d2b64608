use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderValue};

use super::types::{
    ConfigurationVersion, ConfigurationVersionResponse, CreateConfigurationVersionRequest,
    WorkspaceId, WorkspaceResponse, error_message,
};
use super::{TfcApi, TfcError};
use crate::credentials::ApiToken;

pub const TFC_DEFAULT_ADDRESS: &str = "https://app.terraform.io";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const JSON_API: &str = "application/vnd.api+json";
const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Clone)]
pub struct TfcClient {
    client: reqwest::Client,
    base_url: String,
}

impl TfcClient {
    pub fn new() -> Result<Self, TfcError> {
        Self::with_base_url(TFC_DEFAULT_ADDRESS.to_string(), DEFAULT_TIMEOUT)
    }

    /// `address` is the scheme+host of the TFC/TFE instance; `/api/v2` is appended.
    /// NOTE: Also used for testing with mock servers.
    pub fn with_base_url(address: String, timeout: Duration) -> Result<Self, TfcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TfcError::Network)?;

        let base_url = format!("{}/api/v2", address.trim_end_matches('/'));

        Ok(Self { client, base_url })
    }

    pub fn api_base(&self) -> &str {
        &self.base_url
    }

    async fn read_success_body(
        response: reqwest::Response,
        resource: &str,
    ) -> Result<String, TfcError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TfcError::from_status(
                status.as_u16(),
                resource,
                error_message(&body, status),
            ));
        }

        Ok(body)
    }
}

#[async_trait]
impl TfcApi for TfcClient {
    async fn resolve_workspace(
        &self,
        token: &ApiToken,
        organization: &str,
        workspace: &str,
    ) -> Result<WorkspaceId, TfcError> {
        let url = format!(
            "{}/organizations/{}/workspaces/{}",
            self.base_url, organization, workspace
        );
        tracing::debug!(%url, "resolving workspace");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_API))
            .send()
            .await?;

        let resource = format!("workspace '{}/{}'", organization, workspace);
        let body = Self::read_success_body(response, &resource).await?;

        let parsed: WorkspaceResponse =
            serde_json::from_str(&body).map_err(|e| TfcError::Parse {
                message: format!("Failed to parse workspace: {}", e),
            })?;

        Ok(WorkspaceId::new(parsed.data.id))
    }

    async fn create_configuration_version(
        &self,
        token: &ApiToken,
        workspace_id: &WorkspaceId,
    ) -> Result<ConfigurationVersion, TfcError> {
        let url = format!(
            "{}/workspaces/{}/configuration-versions",
            self.base_url, workspace_id
        );
        tracing::debug!(%url, "creating configuration version");

        let payload = serde_json::to_string(&CreateConfigurationVersionRequest::default())
            .map_err(|e| TfcError::Parse {
                message: format!("Failed to encode request: {}", e),
            })?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(token.expose())
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_API))
            .body(payload)
            .send()
            .await?;

        let resource = format!("workspace '{}'", workspace_id);
        let body = Self::read_success_body(response, &resource).await?;

        let parsed: ConfigurationVersionResponse =
            serde_json::from_str(&body).map_err(|e| TfcError::Parse {
                message: format!("Failed to parse configuration version: {}", e),
            })?;

        let upload_url = reqwest::Url::parse(&parsed.data.attributes.upload_url).map_err(|e| {
            TfcError::Parse {
                message: format!("upload-url is not an absolute URL: {}", e),
            }
        })?;

        Ok(ConfigurationVersion::new(parsed.data.id, upload_url))
    }

    async fn upload(
        &self,
        version: ConfigurationVersion,
        content: Vec<u8>,
    ) -> Result<(), TfcError> {
        tracing::debug!(
            host = version.upload_host(),
            bytes = content.len(),
            "uploading configuration"
        );

        // Signed URL: no Authorization header, and it must not end up in errors.
        let response = self
            .client
            .put(version.into_upload_url())
            .header(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM))
            .body(content)
            .send()
            .await
            .map_err(|e| TfcError::Network(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TfcError::Upload {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

impl std::fmt::Debug for TfcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfcClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
