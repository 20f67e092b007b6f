use super::{ObjectStorage, StorageError, StoredObject, encode_key_path, validate_key};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
struct StorageApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Supabase Storage REST client authenticated with the service-role key.
#[derive(Debug, Clone)]
pub(crate) struct SupabaseObjectStorage {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
    bucket: String,
}

impl SupabaseObjectStorage {
    pub(crate) fn new(base_url: String, service_role_key: String, bucket: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key,
            bucket,
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            encode_key_path(key)
        )
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            encode_key_path(key)
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseObjectStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_key(key)?;

        let response = self
            .client
            .post(self.object_url(key))
            .bearer_auth(&self.service_role_key)
            .header("apikey", &self.service_role_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|error| StorageError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StorageApiError>(&body)
                .ok()
                .and_then(|parsed| parsed.message.or(parsed.error))
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), key, "Supabase storage rejected upload");
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(StoredObject {
            path: key.to_string(),
            public_url: self.public_url(key),
        })
    }

    fn provider_name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn posts_object_with_service_credentials() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/uploads/videos/u/1_a_clip.mp4")
            .match_header("authorization", "Bearer service-key")
            .match_header("apikey", "service-key")
            .match_header("content-type", "video/mp4")
            .match_header("x-upsert", "false")
            .match_body(Matcher::Exact("frames".to_string()))
            .with_status(200)
            .with_body(r#"{"Key":"uploads/videos/u/1_a_clip.mp4"}"#)
            .create_async()
            .await;

        let storage = SupabaseObjectStorage::new(
            server.url(),
            "service-key".to_string(),
            "uploads".to_string(),
        );
        let stored = storage
            .put("videos/u/1_a_clip.mp4", Bytes::from_static(b"frames"), "video/mp4")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(
            stored.public_url,
            format!(
                "{}/storage/v1/object/public/uploads/videos/u/1_a_clip.mp4",
                server.url()
            )
        );
    }

    #[tokio::test]
    async fn escapes_reserved_characters_in_object_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/storage/v1/object/uploads/videos/a%3Fb%23c/1_clip.mp4")
            .with_status(200)
            .create_async()
            .await;

        let storage =
            SupabaseObjectStorage::new(server.url(), "k".to_string(), "uploads".to_string());
        let stored = storage
            .put("videos/a?b#c/1_clip.mp4", Bytes::from_static(b"x"), "video/mp4")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(stored.public_url.ends_with("/public/uploads/videos/a%3Fb%23c/1_clip.mp4"));
    }

    #[tokio::test]
    async fn surfaces_provider_message_on_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/storage/v1/object/uploads/videos/u/dup.mp4")
            .with_status(409)
            .with_body(r#"{"statusCode":"409","error":"Duplicate","message":"The resource already exists"}"#)
            .create_async()
            .await;

        let storage =
            SupabaseObjectStorage::new(server.url(), "k".to_string(), "uploads".to_string());
        let error = storage
            .put("videos/u/dup.mp4", Bytes::from_static(b"x"), "video/mp4")
            .await
            .unwrap_err();

        match error {
            StorageError::Rejected { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "The resource already exists");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
