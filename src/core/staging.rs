//! Staging of uploaded files
//!
//! An upload is written to the upload directory under a unique name and
//! removed again when its [`StagedFile`] guard is dropped, whether the run
//! that used it succeeded, failed or panicked.

use crate::adapters::loader::SourceFormat;
use crate::domain::{AnonymizerError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Uploaded bytes on disk, deleted on drop
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    original_name: String,
    format: SourceFormat,
}

impl StagedFile {
    /// Validates `filename` and writes `bytes` into `directory`.
    ///
    /// Only the final component of `filename` is used, so names carrying
    /// directory parts cannot escape `directory`.
    ///
    /// # Errors
    ///
    /// Returns a load error for an unsupported extension and an I/O error if
    /// the file cannot be written.
    pub fn stage(directory: &Path, filename: &str, bytes: &[u8]) -> Result<Self> {
        let original_name = Path::new(filename)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                AnonymizerError::Validation(format!("Invalid file name: '{filename}'"))
            })?;

        let format = SourceFormat::from_path(Path::new(&original_name))?;

        fs::create_dir_all(directory).map_err(|e| {
            AnonymizerError::Io(format!(
                "Failed to create upload directory {}: {e}",
                directory.display()
            ))
        })?;

        let path = directory.join(format!("{}_{original_name}", Uuid::new_v4().simple()));
        fs::write(&path, bytes).map_err(|e| {
            AnonymizerError::Io(format!("Failed to stage upload {}: {e}", path.display()))
        })?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Upload staged");

        Ok(Self {
            path,
            original_name,
            format,
        })
    }

    /// Location of the staged bytes
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name as uploaded, without directory parts
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Staged upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged upload"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_staged_file_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let staged = StagedFile::stage(dir.path(), "patients.csv", b"name\nAlice\n").unwrap();
        let path = staged.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(staged.original_name(), "patients.csv");
        assert_eq!(staged.format(), SourceFormat::Csv);

        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_unsupported_extension_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let result = StagedFile::stage(dir.path(), "payload.exe", b"MZ");

        assert!(matches!(result, Err(AnonymizerError::Load(_))));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_directory_parts_are_stripped() {
        let dir = TempDir::new().unwrap();
        let staged = StagedFile::stage(dir.path(), "../../etc/records.json", b"[]").unwrap();

        assert_eq!(staged.original_name(), "records.json");
        assert_eq!(staged.path().parent(), Some(dir.path()));
    }

    #[test]
    fn test_removed_when_panicking() {
        let dir = TempDir::new().unwrap();
        let upload_dir = dir.path().to_path_buf();

        let result = std::panic::catch_unwind(move || {
            let _staged = StagedFile::stage(&upload_dir, "notes.txt", b"hello").unwrap();
            panic!("processing failed");
        });

        assert!(result.is_err());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
