use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tfc_publish::output::OutputFormat;
use tfc_publish::{ApiToken, PublishSettings, TfcError, default_scratch_dir};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Package a directory and upload it as a new configuration version
    Publish(PublishArgs),
    /// Package a directory and keep the archive without contacting Terraform Cloud
    Package(PackageArgs),
}

#[derive(clap::Args, Debug)]
pub struct PublishArgs {
    #[arg(long, env = "TF_REPO_PATH")]
    pub source: PathBuf,

    #[arg(long, env = "TF_ORG")]
    pub organization: String,

    #[arg(long, env = "TF_WORKSPACE")]
    pub workspace: String,

    #[arg(long, env = "TFC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Token as exported by the build runner's parameter store
    #[arg(
        long = "pipeline-token",
        env = "TOKEN",
        hide = true,
        hide_env_values = true
    )]
    pub pipeline_token: Option<String>,

    #[arg(long, env = "TFC_TOKEN_FILE", conflicts_with = "token")]
    pub token_file: Option<PathBuf>,

    #[arg(long, env = "TFC_ADDRESS", default_value = tfc_publish::TFC_DEFAULT_ADDRESS)]
    pub address: String,

    #[arg(long, env = "TFC_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    #[arg(long, env = "TFC_SCRATCH_DIR")]
    pub scratch_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl PublishArgs {
    pub fn api_token(&self) -> Result<ApiToken, TfcError> {
        match (self.inline_token(), &self.token_file) {
            (Some(token), _) => ApiToken::new(token.to_string()),
            (None, Some(path)) => ApiToken::from_file(path),
            (None, None) => Err(TfcError::Auth {
                message:
                    "No API token provided. Set TFC_TOKEN or TOKEN, or use --token / --token-file"
                        .to_string(),
            }),
        }
    }

    /// `--token` / `TFC_TOKEN` wins over the pipeline's `TOKEN`.
    fn inline_token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .or(self.pipeline_token.as_deref())
    }

    pub fn settings(&self) -> PublishSettings {
        PublishSettings {
            address: self.address.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            scratch_dir: self.scratch_dir.clone().unwrap_or_else(default_scratch_dir),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct PackageArgs {
    #[arg(long, env = "TF_REPO_PATH")]
    pub source: PathBuf,

    /// Directory the archive is written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}
