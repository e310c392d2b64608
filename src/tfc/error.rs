use thiserror::Error;

/// Terraform Cloud errors that can occur during API and upload operations.
///
/// SECURITY: Error messages must NEVER contain sensitive data like API tokens
/// or the signed part of an upload URL.
#[derive(Debug, Error)]
pub enum TfcError {
    /// Authentication failed (401/403, or a token that cannot be sent at all)
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The organization or workspace does not exist or is not visible to the token
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Response body was not well-formed JSON or lacked an expected field
    #[error("unexpected response: {message}")]
    Parse { message: String },

    /// API returned some other non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Signed upload endpoint rejected the archive
    #[error("upload rejected with status {status}")]
    Upload { status: u16 },

    /// Network-level error (connection failed, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl TfcError {
    /// Maps a non-success API status onto the error taxonomy.
    pub(crate) fn from_status(status: u16, resource: &str, message: String) -> Self {
        match status {
            401 | 403 => TfcError::Auth { message },
            404 => TfcError::NotFound {
                resource: resource.to_string(),
            },
            _ => TfcError::Api { status, message },
        }
    }
}
