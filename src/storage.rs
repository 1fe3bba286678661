//! Filesystem-backed blob store for uploads.
//!
//! Files are renamed to a random UUID (original extension preserved) and
//! placed under the configured root, optionally inside a per-category
//! subdirectory. The returned relative path is what gets persisted in the
//! database; loads resolve it back under the root and refuse anything that
//! escapes it.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

/// Subdirectory categories. Pure convention, not enforced by type.
pub const DOCUMENTS_DIR: &str = "documents";
pub const PROFILE_PICTURES_DIR: &str = "profile-pictures";
pub const CVS_DIR: &str = "cvs";
pub const CABINET_PHOTOS_DIR: &str = "cabinet_photos";
pub const DIPLOMA_DOCS_DIR: &str = "diploma_docs";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Filename contains invalid path sequence: {0}")]
    InvalidFilename(String),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A file received from a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if absent.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root: PathBuf = root.into();
        fs::create_dir_all(&root).map_err(|e| StorageError::Io {
            path: root.display().to_string(),
            source: e,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `bytes` under a fresh UUID name, preserving the extension of
    /// `original_name`. Returns the relative path to persist
    /// (`subdir/uuid.ext` when a subdirectory is given).
    pub fn store(
        &self,
        original_name: &str,
        bytes: &[u8],
        subdirectory: Option<&str>,
    ) -> Result<String, StorageError> {
        if original_name.contains("..") {
            return Err(StorageError::InvalidFilename(original_name.to_string()));
        }

        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let file_name = format!("{}{extension}", Uuid::new_v4());

        let (target, relative) = match subdirectory {
            Some(subdir) if !subdir.is_empty() => {
                let dir = self.root.join(subdir);
                fs::create_dir_all(&dir).map_err(|e| StorageError::Io {
                    path: dir.display().to_string(),
                    source: e,
                })?;
                (dir.join(&file_name), format!("{subdir}/{file_name}"))
            }
            _ => (self.root.join(&file_name), file_name),
        };

        fs::write(&target, bytes).map_err(|e| StorageError::Io {
            path: target.display().to_string(),
            source: e,
        })?;

        tracing::debug!(path = %relative, size = bytes.len(), "Stored uploaded file");
        Ok(relative)
    }

    /// Resolve a stored relative path, refusing traversal out of the root.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        if relative.contains("..") {
            return Err(StorageError::InvalidFilename(relative.to_string()));
        }
        let path = self.root.join(relative);
        if !path.exists() {
            return Err(StorageError::NotFound(relative.to_string()));
        }
        // Canonicalize both sides; symlinked roots resolve consistently.
        let canonical = path.canonicalize().map_err(|e| StorageError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let root = self.root.canonicalize().map_err(|e| StorageError::Io {
            path: self.root.display().to_string(),
            source: e,
        })?;
        if !canonical.starts_with(&root) {
            return Err(StorageError::InvalidFilename(relative.to_string()));
        }
        Ok(canonical)
    }

    /// Read a stored file back. Fails with `NotFound` when absent.
    pub fn load(&self, relative: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(relative)?;
        fs::read(&path).map_err(|e| StorageError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Best-effort delete; a missing file is not an error.
    pub fn delete(&self, relative: &str) {
        match self.resolve(relative) {
            Ok(path) => {
                if let Err(e) = fs::remove_file(&path) {
                    tracing::warn!(path = %relative, error = %e, "Failed to delete stored file");
                }
            }
            Err(StorageError::NotFound(_)) => {}
            Err(e) => {
                tracing::warn!(path = %relative, error = %e, "Refusing to delete stored file"
                );
            }
        }
    }
}
