use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::app::ports::UploadSourcePort;

/// Reads the upload CSV from disk
pub struct FileUploadSource {
    path: PathBuf,
}

impl FileUploadSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UploadSourcePort for FileUploadSource {
    fn read_upload(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).with_context(|| format!("Failed to read upload {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
