use crate::error::ValidationError;
use axum::body::Bytes;
use chrono::Utc;
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const UPLOADS_PREFIX: &str = "/uploads/";

const ALLOWED_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif"];

#[derive(Debug)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedImage {
    /// The declared content type, or one guessed from the file name.
    pub fn mime_type(&self) -> String {
        match self.content_type.as_deref() {
            Some(declared) if !declared.is_empty() && declared != "application/octet-stream" => {
                declared.to_string()
            }
            _ => mime_guess::from_path(&self.file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        }
    }

    pub fn check(&self, max_bytes: usize) -> Result<(), ValidationError> {
        let mime = self.mime_type();
        if !ALLOWED_TYPES.contains(&mime.as_str()) {
            return Err(ValidationError::UnsupportedImageType(mime));
        }
        if self.data.len() > max_bytes {
            return Err(ValidationError::ImageTooLarge {
                size: self.data.len(),
                max: max_bytes,
            });
        }
        Ok(())
    }
}

/// `<unix-millis>-<random><ext>`, keeping the original extension.
pub fn stored_file_name(original: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let extension = Path::new(original)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();
    format!("{}-{}{}", Utc::now().timestamp_millis(), suffix, extension)
}

/// Only images under `/uploads/` are backed by files; everything else is a placeholder asset.
pub fn is_uploaded_image(image_path: &str) -> bool {
    image_path.starts_with(UPLOADS_PREFIX)
}

fn is_safe_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

/// Image files on local disk, addressed publicly as `/uploads/<name>`.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Resolves a stored file name, refusing anything that could escape the directory.
    pub fn local_path(&self, name: &str) -> Option<PathBuf> {
        is_safe_name(name).then(|| self.dir.join(name))
    }

    /// Writes the image under a fresh name and returns its public path.
    pub async fn save(&self, image: &UploadedImage) -> io::Result<String> {
        let name = stored_file_name(&image.file_name);
        self.ensure_dir().await?;
        fs::write(self.dir.join(&name), &image.data).await?;
        tracing::debug!(file = %name, bytes = image.data.len(), "stored upload");
        Ok(format!("{UPLOADS_PREFIX}{name}"))
    }

    /// Best-effort removal of the file behind an uploaded image path.
    ///
    /// Placeholder paths are ignored and a missing file counts as removed.
    /// Other IO failures are logged and never returned.
    pub async fn remove(&self, image_path: &str) {
        let Some(name) = image_path.strip_prefix(UPLOADS_PREFIX) else {
            return;
        };
        let Some(path) = self.local_path(name) else {
            tracing::warn!(image_path, "refusing to remove upload outside uploads dir");
            return;
        };
        match fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %path.display(), "removed upload"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove upload")
            }
        }
    }
}
