use std::path::PathBuf;

use crate::error::UploadError;
use crate::UploadedFile;

/// Files above this size are accepted but flagged; the server refuses them.
pub const LARGE_FILE_WARNING_BYTES: u64 = 500 * 1024 * 1024;

/// A file the user picked on the local disk, not yet sent anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub size: u64,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub slot: String,
    pub file: LocalFile,
}

/// Pending local picks plus the canonical file list that gets submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadCoordinator {
    pending: Vec<PendingUpload>,
    files: Vec<UploadedFile>,
}

impl UploadCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a selection with a slot, replacing whatever the slot held before.
    ///
    /// Returns the names of files large enough to deserve a warning.
    pub fn add_local_files(
        &mut self,
        slot: &str,
        files: Vec<LocalFile>,
    ) -> Result<Vec<String>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NothingChosen {
                slot: slot.to_string(),
            });
        }
        self.pending.retain(|pending| pending.slot != slot);
        let oversized = files
            .iter()
            .filter(|file| file.size > LARGE_FILE_WARNING_BYTES)
            .map(LocalFile::file_name)
            .collect();
        self.pending
            .extend(files.into_iter().map(|file| PendingUpload {
                slot: slot.to_string(),
                file,
            }));
        Ok(oversized)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending(&self) -> &[PendingUpload] {
        &self.pending
    }

    /// Hands the pending batch to an upload attempt. The batch is gone either way.
    pub fn take_pending(&mut self) -> Vec<PendingUpload> {
        std::mem::take(&mut self.pending)
    }

    /// Installs the result of an upload. Replaces, never merges.
    pub fn replace_files(&mut self, files: Vec<UploadedFile>) {
        self.files = files;
    }

    pub fn append_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    pub fn current_files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn reset(&mut self) {
        self.pending.clear();
        self.files.clear();
    }
}
