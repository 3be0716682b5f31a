//! Destination handling for generated files: path resolution, presence checks, and a
//! streaming writer that persists each chunk as it arrives.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

const PARTIAL_SUFFIX: &str = ".partial";

/// How chunks reach the destination path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Stream into `<name>.partial` and rename over the destination once the stream ends.
    /// An interrupted task never leaves a truncated file at the destination.
    #[default]
    Atomic,
    /// Append straight to the destination. An interrupted task leaves a truncated,
    /// non-empty file that later runs will skip.
    InPlace,
}

impl WriteMode {
    pub fn as_str(self) -> &'static str {
        match self {
            WriteMode::Atomic => "atomic",
            WriteMode::InPlace => "in_place",
        }
    }
}

impl std::str::FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "atomic" => Ok(WriteMode::Atomic),
            "in_place" | "in-place" => Ok(WriteMode::InPlace),
            other => Err(format!("unknown write mode: {}", other)),
        }
    }
}

/// Target directory joined with a manifest entry.
pub fn resolve_destination(target_dir: &Path, relative: &str) -> PathBuf {
    target_dir.join(relative)
}

/// A destination counts as present only when it exists with non-zero length.
pub async fn is_present(path: &Path) -> bool {
    crate::overrides::exists_and_non_empty(path).await
}

/// Create `dir` and its ancestors. Concurrent creation by another task is not an error.
pub async fn ensure_dir(dir: &Path) -> Result<(), PipelineError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(PipelineError::io(dir, e)),
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}

/// Writes one generated file chunk by chunk, flushing each chunk to disk.
pub struct StreamingFileWriter {
    destination: PathBuf,
    working: PathBuf,
    file: File,
    mode: WriteMode,
    bytes: u64,
}

impl StreamingFileWriter {
    /// Creates the parent directory and opens the working file.
    pub async fn create(destination: &Path, mode: WriteMode) -> Result<Self, PipelineError> {
        if let Some(parent) = destination.parent() {
            ensure_dir(parent).await?;
        }
        let working = match mode {
            WriteMode::Atomic => partial_path(destination),
            WriteMode::InPlace => destination.to_path_buf(),
        };
        let mut options = OpenOptions::new();
        match mode {
            WriteMode::Atomic => options.write(true).create(true).truncate(true),
            WriteMode::InPlace => options.append(true).create(true),
        };
        let file = options
            .open(&working)
            .await
            .map_err(|e| PipelineError::io(&working, e))?;
        Ok(Self {
            destination: destination.to_path_buf(),
            working,
            file,
            mode,
            bytes: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &str) -> Result<(), PipelineError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.file
            .write_all(chunk.as_bytes())
            .await
            .map_err(|e| PipelineError::io(&self.working, e))?;
        self.file
            .flush()
            .await
            .map_err(|e| PipelineError::io(&self.working, e))?;
        self.file
            .sync_data()
            .await
            .map_err(|e| PipelineError::io(&self.working, e))?;
        self.bytes += chunk.len() as u64;
        Ok(())
    }

    pub fn working_path(&self) -> &Path {
        &self.working
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Finish the file. In atomic mode the working file replaces the destination.
    pub async fn commit(self) -> Result<u64, PipelineError> {
        self.file
            .sync_all()
            .await
            .map_err(|e| PipelineError::io(&self.working, e))?;
        drop(self.file);
        if self.mode == WriteMode::Atomic {
            tokio::fs::rename(&self.working, &self.destination)
                .await
                .map_err(|e| PipelineError::io(&self.destination, e))?;
        }
        Ok(self.bytes)
    }
}
