use super::{ObjectStorage, StorageError, StoredObject, encode_key_path, validate_key};
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    io,
    path::{Path, PathBuf},
};

/// Writes objects below a directory that the HTTP layer serves under `/files`.
#[derive(Debug, Clone)]
pub(crate) struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalObjectStorage {
    pub(crate) fn new(root: PathBuf, public_base_url: String) -> Result<Self, StorageError> {
        Ok(Self {
            root: init_storage_dir(root)?,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }
}

fn init_storage_dir(path: PathBuf) -> Result<PathBuf, io::Error> {
    if path.exists() {
        if !path.is_dir() {
            return Err(io::Error::other(format!(
                "FILE_STORAGE_DIR is not a directory: {}",
                path.display()
            )));
        }
    } else {
        std::fs::create_dir_all(&path).map_err(|error| {
            io::Error::other(format!(
                "failed to create FILE_STORAGE_DIR {}: {error}",
                path.display()
            ))
        })?;
    }

    Ok(path.canonicalize().unwrap_or(path))
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        _content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;

        let target_path = self.root.join(key);
        if let Some(parent) = target_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target_path, &bytes).await?;

        tracing::debug!(
            path = %target_path.display(),
            size = bytes.len(),
            "Stored object on local disk"
        );

        Ok(StoredObject {
            path: key.to_string(),
            public_url: format!("{}/files/{}", self.public_base_url, encode_key_path(key)),
        })
    }

    fn provider_name(&self) -> &'static str {
        "local"
    }

    fn served_root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_nested_object_and_builds_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(
            dir.path().to_path_buf(),
            "http://localhost:3000/".to_string(),
        )
        .unwrap();

        let stored = storage
            .put("videos/a@b.com/1_x_clip.mp4", Bytes::from_static(b"abc"), "video/mp4")
            .await
            .unwrap();

        assert_eq!(stored.path, "videos/a@b.com/1_x_clip.mp4");
        assert_eq!(
            stored.public_url,
            "http://localhost:3000/files/videos/a%40b.com/1_x_clip.mp4"
        );
        let root = storage.served_root().unwrap();
        let written = std::fs::read(root.join("videos/a@b.com/1_x_clip.mp4")).unwrap();
        assert_eq!(written, b"abc");
    }

    #[tokio::test]
    async fn refuses_keys_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage =
            LocalObjectStorage::new(dir.path().join("store"), "http://h".to_string()).unwrap();

        let result = storage
            .put("../escape.mp4", Bytes::from_static(b"x"), "video/mp4")
            .await;

        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
        assert!(!dir.path().join("escape.mp4").exists());
    }

    #[test]
    fn root_must_be_a_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = LocalObjectStorage::new(file.path().to_path_buf(), "http://h".to_string());
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
