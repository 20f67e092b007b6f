use crate::service::error::{ServiceError, ServiceErrorKind};
use crate::storage::{SharedObjectStorage, StorageError};
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use prometheus::CounterVec;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const ALLOWED_MIME_TYPES: [&str; 5] = [
    "video/mp4",
    "video/avi",
    "video/mov",
    "video/mkv",
    "video/webm",
];
const ALLOWED_EXTENSIONS: [&str; 5] = ["mp4", "avi", "mov", "mkv", "webm"];
const FALLBACK_TITLE: &str = "untitled video";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";
const RANDOM_SUFFIX_LEN: usize = 12;

pub(crate) struct UploadRequest {
    pub(crate) original_filename: String,
    pub(crate) content_type: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) bytes: Bytes,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadReceipt {
    pub(crate) message: &'static str,
    pub(crate) video_id: String,
    pub(crate) file_path: String,
    pub(crate) file_url: String,
    pub(crate) original_filename: String,
    pub(crate) file_size: u64,
    pub(crate) sha256: String,
    pub(crate) title: String,
    pub(crate) upload_time: String,
}

/// Accepts when either the declared MIME type or the extension is allowed.
pub(crate) fn validate_video_type(
    filename: &str,
    content_type: Option<&str>,
) -> Result<(), ServiceError> {
    let mime_allowed = content_type
        .map(|mime| mime.trim().to_ascii_lowercase())
        .is_some_and(|mime| ALLOWED_MIME_TYPES.contains(&mime.as_str()));
    let extension = filename
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let extension_allowed = filename.contains('.') && ALLOWED_EXTENSIONS.contains(&extension.as_str());

    if mime_allowed || extension_allowed {
        Ok(())
    } else {
        Err(ServiceError::bad_request(
            "unsupported file type, upload an MP4, AVI, MOV, MKV or WEBM video",
        ))
    }
}

fn replace_disallowed(value: &str, extra: &[char]) -> String {
    value
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' || extra.contains(&ch) {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Replaces everything outside `[A-Za-z0-9.-]` with `_`.
pub(crate) fn safe_object_name(filename: &str) -> String {
    replace_disallowed(filename, &[])
}

/// Folder name for a subject: `[A-Za-z0-9.@_-]` kept, the rest becomes `_`.
pub(crate) fn safe_subject_segment(subject: &str) -> String {
    replace_disallowed(subject, &['@', '_'])
}

fn random_suffix() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(RANDOM_SUFFIX_LEN)
        .collect()
}

#[derive(Clone)]
pub(crate) struct UploadService {
    storage: SharedObjectStorage,
    max_upload_bytes: u64,
    outcomes: Option<CounterVec>,
}

impl UploadService {
    pub(crate) fn new(storage: SharedObjectStorage, max_upload_bytes: u64) -> Self {
        Self {
            storage,
            max_upload_bytes,
            outcomes: None,
        }
    }

    /// Counts uploads by `outcome` (`stored`, `rejected`, `failed`).
    pub(crate) fn with_outcome_counter(mut self, counter: Option<CounterVec>) -> Self {
        self.outcomes = counter;
        self
    }

    pub(crate) fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub(crate) fn record_rejection(&self) {
        self.record("rejected");
    }

    fn record(&self, outcome: &str) {
        if let Some(counter) = &self.outcomes {
            counter.with_label_values(&[outcome]).inc();
        }
    }

    pub(crate) async fn store(
        &self,
        subject: &str,
        upload: UploadRequest,
    ) -> Result<UploadReceipt, ServiceError> {
        let result = self.store_inner(subject, upload).await;
        match &result {
            Ok(_) => self.record("stored"),
            Err(error) if error.kind() == ServiceErrorKind::BadRequest => {
                self.record("rejected")
            }
            Err(_) => self.record("failed"),
        }
        result
    }

    async fn store_inner(
        &self,
        subject: &str,
        upload: UploadRequest,
    ) -> Result<UploadReceipt, ServiceError> {
        validate_video_type(&upload.original_filename, upload.content_type.as_deref())?;

        let file_size = upload.bytes.len() as u64;
        if file_size == 0 {
            return Err(ServiceError::bad_request("uploaded file is empty"));
        }
        if file_size > self.max_upload_bytes {
            return Err(ServiceError::bad_request(format!(
                "file exceeds the {} byte upload limit",
                self.max_upload_bytes
            )));
        }

        let millis = Utc::now().timestamp_millis();
        let suffix = random_suffix();
        let key = format!(
            "videos/{}/{millis}_{suffix}_{}",
            safe_subject_segment(subject),
            safe_object_name(&upload.original_filename)
        );
        let sha256 = format!("{:x}", Sha256::digest(&upload.bytes));
        let content_type = upload
            .content_type
            .clone()
            .filter(|mime| !mime.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

        let stored = self
            .storage
            .put(&key, upload.bytes, &content_type)
            .await
            .map_err(|error| match error {
                StorageError::InvalidKey(_) => ServiceError::bad_request(error.to_string()),
                other => {
                    tracing::error!(error = %other, key = %key, "Video upload failed");
                    ServiceError::internal(format!("file upload failed: {other}"))
                }
            })?;

        tracing::info!(
            provider = self.storage.provider_name(),
            path = %stored.path,
            size = file_size,
            "Video uploaded"
        );

        let title = upload
            .title
            .filter(|title| !title.trim().is_empty())
            .or_else(|| Some(upload.original_filename.clone()).filter(|name| !name.is_empty()))
            .unwrap_or_else(|| FALLBACK_TITLE.to_string());

        Ok(UploadReceipt {
            message: "file uploaded",
            video_id: format!("video_{millis}_{suffix}"),
            file_path: stored.path,
            file_url: stored.public_url,
            original_filename: upload.original_filename,
            file_size,
            sha256,
            title,
            upload_time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}
