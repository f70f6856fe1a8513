//! Uploaded file storage under `<root>/media/`

use burialdb_common::config::IMPORT_UPLOAD_DIR;
use std::io;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

/// Media folder holding uploaded import files
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an upload under a unique name, keeping the original extension
    ///
    /// Returns the path relative to the media folder.
    pub async fn save_upload(&self, original_filename: &str, content: &[u8]) -> io::Result<String> {
        let dir = self.root.join(IMPORT_UPLOAD_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let name = stored_name(original_filename);
        tokio::fs::write(dir.join(&name), content).await?;

        Ok(format!("{}/{}", IMPORT_UPLOAD_DIR, name))
    }

    /// Absolute path of a stored file
    ///
    /// Paths escaping the media folder are refused.
    pub fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let relative = Path::new(relative);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing media path {}", relative.display()),
            ));
        }
        Ok(self.root.join(relative))
    }

    /// Remove a stored file; a file that is already gone is not an error
    pub fn remove(&self, relative: &str) -> io::Result<()> {
        match std::fs::remove_file(self.resolve(relative)?) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

fn stored_name(original_filename: &str) -> String {
    let extension = Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase);

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}
