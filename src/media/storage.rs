use std::path::PathBuf;

use crate::{
    codec::ContentFile,
    error::{Error, HtmlError},
};

/// Writes decoded uploads below `root` and renders their public URLs.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    base_url: String,
}

impl MediaStorage {
    pub fn new(root: PathBuf, base_url: String) -> Self {
        Self { root, base_url }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Saves `file` under `upload_to` with a fresh unique name and returns the
    /// stored path relative to the media root.
    pub async fn save(&self, file: &ContentFile, upload_to: &str) -> Result<String, Error> {
        let directory = self.root.join(upload_to);
        tokio::fs::create_dir_all(&directory).await.map_err(|e| {
            log::error!("Failed to create media directory {}: {e}", directory.display());
            HtmlError::Internal.new("Failed to store file")
        })?;

        let name = match file.extension() {
            "" => uuid::Uuid::new_v4().simple().to_string(),
            extension => format!("{}.{extension}", uuid::Uuid::new_v4().simple()),
        };
        let path = directory.join(&name);
        tokio::fs::write(&path, &file.content).await.map_err(|e| {
            log::error!("Failed to write {}: {e}", path.display());
            HtmlError::Internal.new("Failed to store file")
        })?;

        log::debug!("Stored {} ({} bytes)", path.display(), file.content.len());
        Ok(format!("{upload_to}/{name}"))
    }

    /// Removes a file stored by [`MediaStorage::save`]. Failures are logged
    /// and swallowed; the caller is already answering with another error.
    pub async fn discard(&self, path: &str) {
        let full = self.root.join(path);
        if let Err(e) = tokio::fs::remove_file(&full).await {
            log::warn!("Failed to remove {}: {e}", full.display());
        }
    }

    /// Runs `write` and discards the freshly stored `path` when it fails.
    pub async fn keep_if<T, F>(&self, path: Option<&str>, write: F) -> Result<T, Error>
    where
        F: std::future::Future<Output = Result<T, Error>>,
    {
        let result = write.await;
        if let (Err(_), Some(path)) = (&result, path) {
            self.discard(path).await;
        }
        result
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn optional_url(&self, path: Option<&str>) -> Option<String> {
        path.filter(|path| !path.is_empty()).map(|path| self.url(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn saved_files_land_under_their_upload_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().to_path_buf(), "/media/".to_string());
        let file = ContentFile {
            name: "temp.png".to_string(),
            content: vec![1, 2, 3],
        };

        let path = storage.save(&file, "avatars").await.unwrap();

        assert!(path.starts_with("avatars/"));
        assert!(path.ends_with(".png"));
        assert_eq!(std::fs::read(dir.path().join(&path)).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn every_save_gets_a_new_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().to_path_buf(), "/media/".to_string());
        let file = ContentFile {
            name: "temp.gif".to_string(),
            content: vec![0],
        };

        let first = storage.save(&file, "recipes").await.unwrap();
        let second = storage.save(&file, "recipes").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn failed_writes_discard_the_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().to_path_buf(), "/media/".to_string());
        let file = ContentFile {
            name: "temp.png".to_string(),
            content: vec![1],
        };
        let path = storage.save(&file, "recipes").await.unwrap();

        let result: Result<(), Error> = storage
            .keep_if(Some(&path), async {
                Err(HtmlError::InvalidRequest.field("ingredients", "Ingredient 7 does not exist."))
            })
            .await;

        assert_eq!(result.unwrap_err().code, 400);
        assert!(!dir.path().join(&path).exists());
    }

    #[tokio::test]
    async fn successful_writes_keep_the_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path().to_path_buf(), "/media/".to_string());
        let file = ContentFile {
            name: "temp.png".to_string(),
            content: vec![1],
        };
        let path = storage.save(&file, "avatars").await.unwrap();

        let id = storage.keep_if(Some(&path), async { Ok(3) }).await.unwrap();

        assert_eq!(id, 3);
        assert!(dir.path().join(&path).exists());
    }

    #[test]
    fn urls_join_the_base_url() {
        let storage = MediaStorage::new(PathBuf::from("media"), "/media/".to_string());

        assert_eq!(storage.url("avatars/a.png"), "/media/avatars/a.png");
        assert_eq!(storage.optional_url(None), None);
        assert_eq!(storage.optional_url(Some("")), None);
    }
}
