//! The publish workflow: package, resolve, allocate, upload, clean up.
//!
//! Steps run strictly in sequence and any failure ends the run. The artifact is
//! a drop guard, so a failed run removes it as well.

use serde::Serialize;

use crate::error::PublishError;
use crate::package::{self, ArchiveError};
use crate::request::{PublishRequest, PublishSettings};
use crate::tfc::TfcApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    Idle,
    Packaged,
    Resolved,
    VersionCreated,
    Uploaded,
    Done,
    Failed,
}

impl PublishState {
    /// The only successor on the success path; `None` for terminal states.
    pub fn next(self) -> Option<PublishState> {
        match self {
            PublishState::Idle => Some(PublishState::Packaged),
            PublishState::Packaged => Some(PublishState::Resolved),
            PublishState::Resolved => Some(PublishState::VersionCreated),
            PublishState::VersionCreated => Some(PublishState::Uploaded),
            PublishState::Uploaded => Some(PublishState::Done),
            PublishState::Done | PublishState::Failed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishStep {
    Package,
    ResolveWorkspace,
    CreateConfigurationVersion,
    Upload,
    Cleanup,
}

impl std::fmt::Display for PublishStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PublishStep::Package => "package",
            PublishStep::ResolveWorkspace => "resolve-workspace",
            PublishStep::CreateConfigurationVersion => "create-configuration-version",
            PublishStep::Upload => "upload",
            PublishStep::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Tracks the current state and every state visited.
#[derive(Debug)]
pub struct StateMachine {
    trail: Vec<PublishState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            trail: vec![PublishState::Idle],
        }
    }

    pub fn current(&self) -> PublishState {
        self.trail
            .last()
            .copied()
            .unwrap_or(PublishState::Idle)
    }

    pub fn trail(&self) -> &[PublishState] {
        &self.trail
    }

    /// Moves to the single successor of the current state.
    pub fn advance(&mut self) -> PublishState {
        let from = self.current();
        match from.next() {
            Some(to) => {
                tracing::info!(?from, ?to, "publish state changed");
                self.trail.push(to);
                to
            }
            None => from,
        }
    }

    pub fn fail(&mut self, error: &PublishError) {
        let from = self.current();
        if from.is_terminal() {
            return;
        }
        tracing::error!(
            ?from,
            step = ?error.failed_step(),
            error = %error,
            "publish failed"
        );
        self.trail.push(PublishState::Failed);
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub organization: String,
    pub workspace: String,
    pub workspace_id: String,
    pub configuration_version_id: Option<String>,
    pub artifact_name: String,
    pub artifact_created_at: u64,
    pub archive_bytes: u64,
    pub file_count: usize,
    pub states: Vec<PublishState>,
}

/// Runs one publish. Only `Ok` means every step, cleanup included, succeeded.
pub async fn publish<A>(
    api: &A,
    request: &PublishRequest,
    settings: &PublishSettings,
) -> Result<PublishReport, PublishError>
where
    A: TfcApi + ?Sized,
{
    let mut machine = StateMachine::new();

    match run(api, request, settings, &mut machine).await {
        Ok(report) => Ok(report),
        Err(e) => {
            machine.fail(&e);
            Err(e)
        }
    }
}

async fn run<A>(
    api: &A,
    request: &PublishRequest,
    settings: &PublishSettings,
    machine: &mut StateMachine,
) -> Result<PublishReport, PublishError>
where
    A: TfcApi + ?Sized,
{
    let source = request.source_directory.clone();
    let scratch = settings.scratch_dir.clone();
    let artifact = tokio::task::spawn_blocking(move || package::package_directory(&source, &scratch))
        .await
        .map_err(|e| PublishError::Archive(ArchiveError::Io(std::io::Error::other(e))))?
        .map_err(PublishError::Archive)?;
    machine.advance();

    let workspace_id = api
        .resolve_workspace(&request.token, &request.organization, &request.workspace)
        .await
        .map_err(PublishError::Resolve)?;
    tracing::info!(%workspace_id, "workspace resolved");
    machine.advance();

    let version = api
        .create_configuration_version(&request.token, &workspace_id)
        .await
        .map_err(PublishError::CreateVersion)?;
    let configuration_version_id = version.id.clone();
    tracing::info!(
        configuration_version = configuration_version_id.as_deref().unwrap_or("<unknown>"),
        "configuration version created"
    );
    machine.advance();

    let content = artifact.read_bytes().await.map_err(PublishError::Archive)?;
    api.upload(version, content)
        .await
        .map_err(PublishError::Upload)?;
    tracing::info!(artifact = %artifact.file_name(), "configuration uploaded");
    machine.advance();

    let artifact_name = artifact.file_name();
    let artifact_created_at = artifact.created_at_epoch();
    let archive_bytes = artifact.size_bytes();
    let file_count = artifact.file_count();
    artifact.cleanup().map_err(PublishError::Cleanup)?;
    machine.advance();

    Ok(PublishReport {
        organization: request.organization.clone(),
        workspace: request.workspace.clone(),
        workspace_id: workspace_id.to_string(),
        configuration_version_id,
        artifact_name,
        artifact_created_at,
        archive_bytes,
        file_count,
        states: machine.trail().to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ApiToken;
    use crate::tfc::{ConfigurationVersion, TfcError, WorkspaceId};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[test]
    fn test_success_path_is_strictly_sequential() {
        let mut state = PublishState::Idle;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            visited.push(next);
            state = next;
        }
        assert_eq!(
            visited,
            vec![
                PublishState::Idle,
                PublishState::Packaged,
                PublishState::Resolved,
                PublishState::VersionCreated,
                PublishState::Uploaded,
                PublishState::Done,
            ]
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(PublishState::Done.is_terminal());
        assert!(PublishState::Failed.is_terminal());
        assert!(!PublishState::Uploaded.is_terminal());
    }

    #[test]
    fn test_machine_does_not_advance_past_done() {
        let mut machine = StateMachine::new();
        for _ in 0..10 {
            machine.advance();
        }
        assert_eq!(machine.current(), PublishState::Done);
        assert_eq!(machine.trail().len(), 6);
    }

    #[test]
    fn test_fail_from_intermediate_state() {
        let mut machine = StateMachine::new();
        machine.advance();
        machine.advance();
        machine.fail(&PublishError::CreateVersion(TfcError::Auth {
            message: "denied".to_string(),
        }));
        assert_eq!(machine.current(), PublishState::Failed);

        // Failed is terminal.
        machine.advance();
        assert_eq!(machine.current(), PublishState::Failed);
    }

    #[test]
    fn test_step_display_names() {
        assert_eq!(PublishStep::ResolveWorkspace.to_string(), "resolve-workspace");
        assert_eq!(
            PublishStep::CreateConfigurationVersion.to_string(),
            "create-configuration-version"
        );
    }

    /// Records calls; fails at the configured step.
    #[derive(Default)]
    struct FakeApi {
        fail_at: Option<PublishStep>,
        calls: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl TfcApi for FakeApi {
        async fn resolve_workspace(
            &self,
            _token: &ApiToken,
            _organization: &str,
            _workspace: &str,
        ) -> Result<WorkspaceId, TfcError> {
            self.calls.lock().unwrap().push("resolve");
            if self.fail_at == Some(PublishStep::ResolveWorkspace) {
                return Err(TfcError::NotFound {
                    resource: "workspace".to_string(),
                });
            }
            Ok(WorkspaceId::new("ws-1"))
        }

        async fn create_configuration_version(
            &self,
            _token: &ApiToken,
            _workspace_id: &WorkspaceId,
        ) -> Result<ConfigurationVersion, TfcError> {
            self.calls.lock().unwrap().push("create");
            if self.fail_at == Some(PublishStep::CreateConfigurationVersion) {
                return Err(TfcError::Parse {
                    message: "bad".to_string(),
                });
            }
            let url = reqwest::Url::parse("https://storage.example/up").unwrap();
            Ok(ConfigurationVersion::new(Some("cv-1".to_string()), url))
        }

        async fn upload(
            &self,
            _version: ConfigurationVersion,
            content: Vec<u8>,
        ) -> Result<(), TfcError> {
            assert!(!content.is_empty());
            self.calls.lock().unwrap().push("upload");
            if self.fail_at == Some(PublishStep::Upload) {
                return Err(TfcError::Upload { status: 500 });
            }
            Ok(())
        }
    }

    fn fixture() -> (tempfile::TempDir, tempfile::TempDir, PublishRequest, PublishSettings) {
        let source = tempfile::tempdir().unwrap();
        let scratch = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("main.tf"), "# main").unwrap();

        let request = PublishRequest::new(
            source.path().to_path_buf(),
            "acme".to_string(),
            "prod".to_string(),
            ApiToken::new("tok-1".to_string()).unwrap(),
        )
        .unwrap();
        let settings = PublishSettings {
            scratch_dir: scratch.path().to_path_buf(),
            ..PublishSettings::default()
        };
        (source, scratch, request, settings)
    }

    fn scratch_is_empty(scratch: &tempfile::TempDir) -> bool {
        std::fs::read_dir(scratch.path()).unwrap().count() == 0
    }

    #[tokio::test]
    async fn test_publish_success_reports_full_trail() {
        let (_source, scratch, request, settings) = fixture();
        let api = FakeApi::default();

        let report = publish(&api, &request, &settings).await.unwrap();

        assert_eq!(report.workspace_id, "ws-1");
        assert_eq!(report.configuration_version_id.as_deref(), Some("cv-1"));
        assert_eq!(report.file_count, 1);
        assert_eq!(report.states.last(), Some(&PublishState::Done));
        assert_eq!(*api.calls.lock().unwrap(), vec!["resolve", "create", "upload"]);
        assert!(scratch_is_empty(&scratch));
    }

    #[tokio::test]
    async fn test_publish_failure_halts_and_cleans_up() {
        for (fail_at, expected_calls) in [
            (PublishStep::ResolveWorkspace, vec!["resolve"]),
            (PublishStep::CreateConfigurationVersion, vec!["resolve", "create"]),
            (PublishStep::Upload, vec!["resolve", "create", "upload"]),
        ] {
            let (_source, scratch, request, settings) = fixture();
            let api = FakeApi {
                fail_at: Some(fail_at),
                ..FakeApi::default()
            };

            let err = publish(&api, &request, &settings).await.unwrap_err();

            assert_eq!(err.failed_step(), Some(fail_at));
            assert_eq!(*api.calls.lock().unwrap(), expected_calls);
            assert!(scratch_is_empty(&scratch), "artifact left behind after {fail_at}");
        }
    }

    #[tokio::test]
    async fn test_publish_missing_source_makes_no_api_calls() {
        let (_source, _scratch, mut request, settings) = fixture();
        request.source_directory = PathBuf::from("/definitely/not/here");
        let api = FakeApi::default();

        let err = publish(&api, &request, &settings).await.unwrap_err();

        assert!(matches!(
            err,
            PublishError::Archive(ArchiveError::SourceMissing { .. })
        ));
        assert!(api.calls.lock().unwrap().is_empty());
    }
}
