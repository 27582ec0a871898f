// Uploaded Image Ownership
// A temporary image file that is removed once analysis is done with it

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Owns an uploaded image on disk. The file is deleted when the guard drops,
/// whether or not analysis succeeded.
#[derive(Debug)]
pub struct UploadedImage {
    path: PathBuf,
    mime: String,
}

impl UploadedImage {
    pub fn new(path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime: mime.into(),
        }
    }

    /// Write `bytes` to a fresh file under `dir` and take ownership of it.
    pub fn persist(dir: &Path, bytes: &[u8], mime: impl Into<String>) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("upload-{}", uuid::Uuid::new_v4()));
        fs::write(&path, bytes)?;
        Ok(Self::new(path, mime))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Size on disk, without reading the contents.
    pub fn byte_len(&self) -> io::Result<u64> {
        fs::metadata(&self.path).map(|m| m.len())
    }

    pub fn read(&self) -> io::Result<Vec<u8>> {
        fs::read(&self.path)
    }
}

impl Drop for UploadedImage {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "upload.removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "upload.remove_failed"),
        }
    }
}
