use thiserror::Error;

use crate::package::ArchiveError;
use crate::tfc::TfcError;
use crate::workflow::PublishStep;

/// A failed publish. Each variant names the step that failed.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("package step failed: {0}")]
    Archive(#[source] ArchiveError),

    #[error("resolve-workspace step failed: {0}")]
    Resolve(#[source] TfcError),

    #[error("create-configuration-version step failed: {0}")]
    CreateVersion(#[source] TfcError),

    #[error("upload step failed: {0}")]
    Upload(#[source] TfcError),

    #[error("cleanup step failed: {0}")]
    Cleanup(#[source] ArchiveError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PublishError {
    /// `None` for errors raised before the workflow starts.
    pub fn failed_step(&self) -> Option<PublishStep> {
        match self {
            PublishError::Archive(_) => Some(PublishStep::Package),
            PublishError::Resolve(_) => Some(PublishStep::ResolveWorkspace),
            PublishError::CreateVersion(_) => Some(PublishStep::CreateConfigurationVersion),
            PublishError::Upload(_) => Some(PublishStep::Upload),
            PublishError::Cleanup(_) => Some(PublishStep::Cleanup),
            PublishError::Config(_) => None,
        }
    }
}
