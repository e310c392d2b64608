use serde::{Deserialize, Serialize};

pub const CONFIGURATION_VERSIONS_TYPE: &str = "configuration-versions";

/// Opaque workspace identifier (`ws-...`), valid for one invocation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A freshly allocated configuration-version and its single-use upload slot.
///
/// Deliberately not `Clone`: uploading consumes it.
pub struct ConfigurationVersion {
    pub id: Option<String>,
    upload_url: reqwest::Url,
}

impl ConfigurationVersion {
    pub fn new(id: Option<String>, upload_url: reqwest::Url) -> Self {
        Self { id, upload_url }
    }

    /// Host of the signed URL, safe to log.
    pub fn upload_host(&self) -> &str {
        self.upload_url.host_str().unwrap_or("<unknown>")
    }

    pub(crate) fn into_upload_url(self) -> reqwest::Url {
        self.upload_url
    }
}

impl std::fmt::Debug for ConfigurationVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationVersion")
            .field("id", &self.id)
            .field("upload_url", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct CreateConfigurationVersionRequest {
    pub data: CreateConfigurationVersionData,
}

#[derive(Debug, Serialize)]
pub struct CreateConfigurationVersionData {
    #[serde(rename = "type")]
    pub type_: &'static str,
}

impl Default for CreateConfigurationVersionRequest {
    fn default() -> Self {
        Self {
            data: CreateConfigurationVersionData {
                type_: CONFIGURATION_VERSIONS_TYPE,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceResponse {
    pub data: WorkspaceData,
}

#[derive(Debug, Deserialize)]
pub struct WorkspaceData {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfigurationVersionResponse {
    pub data: ConfigurationVersionData,
}

#[derive(Debug, Deserialize)]
pub struct ConfigurationVersionData {
    #[serde(default)]
    pub id: Option<String>,
    pub attributes: ConfigurationVersionAttributes,
}

#[derive(Debug, Deserialize)]
pub struct ConfigurationVersionAttributes {
    #[serde(rename = "upload-url")]
    pub upload_url: String,
}

/// JSON:API error document, e.g. `{"errors":[{"status":"404","title":"not found"}]}`.
#[derive(Debug, Deserialize, Default)]
pub struct ErrorDocument {
    #[serde(default)]
    pub errors: Vec<ApiErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorObject {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Best human-readable message from an error body; falls back to the status reason.
pub fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<ErrorDocument>(body)
        .ok()
        .and_then(|doc| doc.errors.into_iter().next())
        .and_then(|e| e.detail.or(e.title))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string()
        })
}
