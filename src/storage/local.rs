use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Raster formats accepted for item images.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Upload size cap: 10 MB.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Lowercased extension of an uploaded filename, if it is an accepted image
/// format.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Local-disk image storage. Returns `/uploads/<name>` reference strings
/// that locate the stored file later.
#[derive(Clone, Debug)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn save(&self, extension: &str, content: &[u8]) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("Cannot create upload dir: {}", e)))?;

        let filename = format!("{}.{}", Uuid::new_v4().simple(), extension);
        let path = self.root.join(&filename);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| AppError::Storage(format!("Cannot write image: {}", e)))?;

        Ok(format!("/uploads/{}", filename))
    }

    /// Best-effort delete by reference string; a missing file is not an
    /// error.
    pub async fn delete(&self, image_url: &str) -> AppResult<()> {
        let Some(filename) = Path::new(image_url).file_name() else {
            return Ok(());
        };
        let path = self.root.join(filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Cannot delete image: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_raster_formats() {
        assert_eq!(allowed_extension("photo.JPG").as_deref(), Some("jpg"));
        assert_eq!(allowed_extension("scan.png").as_deref(), Some("png"));
        assert_eq!(allowed_extension("anim.webp").as_deref(), Some("webp"));
    }

    #[test]
    fn rejects_other_extensions() {
        assert_eq!(allowed_extension("payload.exe"), None);
        assert_eq!(allowed_extension("doc.pdf"), None);
        assert_eq!(allowed_extension("noextension"), None);
    }

    #[tokio::test]
    async fn save_and_delete_round_trip() {
        let dir = std::env::temp_dir().join(format!("eam-test-{}", Uuid::new_v4().simple()));
        let store = LocalImageStore::new(dir.clone());

        let url = store.save("png", b"fake-png-bytes").await.unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let on_disk = dir.join(url.trim_start_matches("/uploads/"));
        assert!(on_disk.exists());

        store.delete(&url).await.unwrap();
        assert!(!on_disk.exists());

        // deleting again is fine
        store.delete(&url).await.unwrap();
        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
