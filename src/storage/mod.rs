//! Object storage for uploaded videos.

mod local;
mod supabase;

pub(crate) use local::LocalObjectStorage;
pub(crate) use supabase::SupabaseObjectStorage;

use crate::config::StorageSettings;
use async_trait::async_trait;
use bytes::Bytes;
use std::{path::Path, sync::Arc};

#[derive(Debug, thiserror::Error)]
pub(crate) enum StorageError {
    #[error("invalid object key `{0}`")]
    InvalidKey(String),
    #[error("failed to write object: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage provider rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("storage provider unreachable: {0}")]
    Transport(String),
}

/// Where an object ended up and how clients can fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredObject {
    pub(crate) path: String,
    pub(crate) public_url: String,
}

#[async_trait]
pub(crate) trait ObjectStorage: Send + Sync {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError>;

    fn provider_name(&self) -> &'static str;

    /// Directory to expose under `/files`, for providers that write locally.
    fn served_root(&self) -> Option<&Path> {
        None
    }
}

pub(crate) type SharedObjectStorage = Arc<dyn ObjectStorage>;

pub(crate) fn from_settings(
    settings: &StorageSettings,
) -> Result<SharedObjectStorage, StorageError> {
    Ok(match settings {
        StorageSettings::Local {
            root,
            public_base_url,
        } => Arc::new(LocalObjectStorage::new(root.clone(), public_base_url.clone())?),
        StorageSettings::Supabase {
            url,
            service_role_key,
            bucket,
        } => Arc::new(SupabaseObjectStorage::new(
            url.clone(),
            service_role_key.clone(),
            bucket.clone(),
        )),
    })
}

/// Percent-encodes each `/`-separated key segment for use in a URL path.
pub(crate) fn encode_key_path(key: &str) -> String {
    key.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// Keys are relative, slash-separated and never climb out of their root.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.starts_with('\\')
        || key.contains('\\')
        || key.contains(':')
        || key.split('/').any(|segment| segment.is_empty() || segment == "..");
    if invalid {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_traversal_and_absolute_keys() {
        for key in ["", "/etc/passwd", "videos/../secret", "a//b", "C:\\x", "..\\x"] {
            assert!(validate_key(key).is_err(), "{key} should be rejected");
        }
        assert!(validate_key("videos/a@b.com/1_x_clip.mp4").is_ok());
    }

    #[test]
    fn url_paths_escape_query_and_fragment_characters() {
        assert_eq!(
            encode_key_path("videos/a?b#c@x.io/1_clip.mp4"),
            "videos/a%3Fb%23c%40x.io/1_clip.mp4"
        );
        assert_eq!(encode_key_path("videos/u/1_a_clip.mp4"), "videos/u/1_a_clip.mp4");
    }
}
