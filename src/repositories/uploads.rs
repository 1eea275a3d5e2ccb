use std::path::{Path, PathBuf};

use anyhow::Context;
use uuid::Uuid;

/// Files uploaded as avatars, kept on disk under generated names.
#[derive(Clone, Debug)]
pub struct UploadRepository {
    dir: PathBuf,
}

impl UploadRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, anyhow::Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Could not create upload directory {}", dir.display()))?;

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes the file and returns the name it can be retrieved by.
    pub async fn store(&self, original_name: &str, bytes: &[u8]) -> Result<String, anyhow::Error> {
        let filename = generate_filename(original_name);
        let path = self.dir.join(&filename);

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Could not write upload {}", path.display()))?;

        log::info!("Stored upload {original_name:?} as {filename} ({} bytes)", bytes.len());
        Ok(filename)
    }

    pub async fn retrieve(&self, filename: &str) -> Result<Option<Vec<u8>>, anyhow::Error> {
        if !is_plain_filename(filename) {
            return Ok(None);
        }

        match tokio::fs::read(self.dir.join(filename)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Could not read upload {filename}")),
        }
    }
}

fn generate_filename(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string();

    match extension(original_name) {
        Some(ext) => format!("file-{millis}-{suffix}.{ext}"),
        None => format!("file-{millis}-{suffix}"),
    }
}

/// The uploaded extension, case preserved.
fn extension(original_name: &str) -> Option<String> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_string)
}

fn is_plain_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\'])
        && !filename.contains("..")
}
