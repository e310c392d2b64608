use std::path::PathBuf;
use std::time::Duration;

use crate::credentials::ApiToken;
use crate::error::PublishError;
use crate::tfc::{DEFAULT_TIMEOUT, TFC_DEFAULT_ADDRESS};

/// One publish invocation's inputs. Built once, never mutated.
#[derive(Debug)]
pub struct PublishRequest {
    pub source_directory: PathBuf,
    pub organization: String,
    pub workspace: String,
    pub token: ApiToken,
}

impl PublishRequest {
    pub fn new(
        source_directory: PathBuf,
        organization: String,
        workspace: String,
        token: ApiToken,
    ) -> Result<Self, PublishError> {
        validate_name("organization", &organization)?;
        validate_name("workspace", &workspace)?;

        Ok(Self {
            source_directory,
            organization,
            workspace,
            token,
        })
    }
}

// Names end up as URL path segments.
fn validate_name(field: &str, value: &str) -> Result<(), PublishError> {
    if value.is_empty() {
        return Err(PublishError::Config(format!("{} must not be empty", field)));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(PublishError::Config(format!(
            "{} '{}' may only contain letters, digits, '-' and '_'",
            field, value
        )));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PublishSettings {
    /// Scheme and host of the Terraform Cloud / Enterprise instance.
    pub address: String,
    pub timeout: Duration,
    pub scratch_dir: PathBuf,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            address: TFC_DEFAULT_ADDRESS.to_string(),
            timeout: DEFAULT_TIMEOUT,
            scratch_dir: default_scratch_dir(),
        }
    }
}

pub fn default_scratch_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("tfc-publish")
}
