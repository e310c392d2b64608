//! Packaging of a configuration directory into a `.tar.gz` artifact.
//!
//! Artifacts live in a scratch directory under a name derived from the current
//! Unix time, the process id and a process-local sequence number, and are
//! created with create-new semantics, so concurrent or repeated runs never
//! write to the same file.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use thiserror::Error;
use walkdir::WalkDir;

const ARTIFACT_PREFIX: &str = "content-";
const ARTIFACT_SUFFIX: &str = ".tar.gz";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("source directory does not exist: {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("source is not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("source directory contains no files: {}", path.display())]
    EmptySource { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A packaged archive on local scratch storage.
///
/// Removed by [`Artifact::cleanup`]; if dropped before that, the file is
/// removed best-effort so no exit path leaves it behind.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    created_at_epoch: u64,
    size_bytes: u64,
    file_count: usize,
    removed: bool,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn created_at_epoch(&self) -> u64 {
        self.created_at_epoch
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Files and symlinks in the archive (directories not counted).
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub async fn read_bytes(&self) -> Result<Vec<u8>, ArchiveError> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    pub fn cleanup(mut self) -> Result<(), ArchiveError> {
        self.removed = true;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "artifact removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Hands the file over to the caller; it is no longer removed on drop.
    pub fn keep(mut self) -> PathBuf {
        self.removed = true;
        self.path.clone()
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "artifact removed on drop"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove artifact"
            ),
        }
    }
}

fn unique_name(epoch: u64) -> String {
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}{}-{}-{}{}",
        ARTIFACT_PREFIX,
        epoch,
        std::process::id(),
        seq,
        ARTIFACT_SUFFIX
    )
}

fn check_source(source: &Path) -> Result<PathBuf, ArchiveError> {
    let metadata = match fs::metadata(source) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ArchiveError::SourceMissing {
                path: source.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_dir() {
        return Err(ArchiveError::NotADirectory {
            path: source.to_path_buf(),
        });
    }

    Ok(fs::canonicalize(source)?)
}

/// Archives the full recursive contents of `source` into a new artifact in
/// `scratch_dir`. Entry paths are relative to `source`.
pub fn package_directory(source: &Path, scratch_dir: &Path) -> Result<Artifact, ArchiveError> {
    let root = check_source(source)?;

    fs::create_dir_all(scratch_dir)?;
    let scratch_dir = fs::canonicalize(scratch_dir)?;

    let created_at_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let path = scratch_dir.join(unique_name(created_at_epoch));

    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)?;

    // From here on the guard owns the file, so failures below still clean up.
    let mut artifact = Artifact {
        path,
        created_at_epoch,
        size_bytes: 0,
        file_count: 0,
        removed: false,
    };

    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);

    for entry in WalkDir::new(&root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.path() == artifact.path {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(&root)
            .map_err(|e| io::Error::other(e.to_string()))?;

        // Links are stored as links but still carry configuration.
        if entry.file_type().is_file() || entry.file_type().is_symlink() {
            artifact.file_count += 1;
        }

        builder.append_path_with_name(entry.path(), rel)?;
    }

    if artifact.file_count == 0 {
        return Err(ArchiveError::EmptySource {
            path: source.to_path_buf(),
        });
    }

    let encoder = builder.into_inner()?;
    let file: File = encoder.finish()?;
    file.sync_all()?;

    artifact.size_bytes = file.metadata()?.len();

    tracing::info!(
        artifact = %artifact.file_name(),
        files = artifact.file_count,
        bytes = artifact.size_bytes,
        "configuration packaged"
    );

    Ok(artifact)
}

/// Entry names of a `.tar.gz` archive, in archive order.
pub fn list_archive(path: &Path) -> Result<Vec<String>, ArchiveError> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path)?));

    let mut names = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        names.push(entry.path()?.to_string_lossy().into_owned());
    }

    Ok(names)
}
