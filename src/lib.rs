//! tfc-publish - push a Terraform configuration directory to a Terraform Cloud workspace
//!
//! Packages the directory, resolves the workspace, allocates a configuration
//! version and uploads the archive to its signed URL so Terraform Cloud queues a run.

pub mod credentials;
pub mod output;
pub mod package;
pub mod request;
pub mod tfc;
pub mod workflow;

mod error;

pub use credentials::ApiToken;
pub use error::PublishError;
pub use package::{Artifact, ArchiveError, list_archive, package_directory};
pub use request::{PublishRequest, PublishSettings, default_scratch_dir};
pub use tfc::{
    ConfigurationVersion, TFC_DEFAULT_ADDRESS, TfcApi, TfcClient, TfcError, WorkspaceId,
};
pub use workflow::{PublishReport, PublishState, PublishStep, publish};
