mod client;
mod error;
mod types;

pub use client::{DEFAULT_TIMEOUT, TFC_DEFAULT_ADDRESS, TfcClient};
pub use error::TfcError;
pub use types::{ConfigurationVersion, WorkspaceId};

use async_trait::async_trait;

use crate::credentials::ApiToken;

/// The three Terraform Cloud calls a publish needs, in the order it makes them.
///
/// Allocating the configuration-version and uploading to its signed URL stay two
/// separate calls; `upload` takes the version by value so a slot is used once.
#[async_trait]
pub trait TfcApi: Send + Sync {
    async fn resolve_workspace(
        &self,
        token: &ApiToken,
        organization: &str,
        workspace: &str,
    ) -> Result<WorkspaceId, TfcError>;

    async fn create_configuration_version(
        &self,
        token: &ApiToken,
        workspace_id: &WorkspaceId,
    ) -> Result<ConfigurationVersion, TfcError>;

    async fn upload(&self, version: ConfigurationVersion, content: Vec<u8>)
    -> Result<(), TfcError>;
}
