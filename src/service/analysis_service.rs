use crate::analysis_backend::{AnalysisBackendClient, BackendError};
use crate::entity::{AnalysisTaskActiveModel, AnalysisTaskModel, UserModel};
use crate::repository::analysis_task_repository::AnalysisTaskRepository;
use crate::service::data_quality;
use crate::service::error::{ServiceError, map_db_error};
use crate::service::payload::{optional_bool, required_string};
use crate::service::video_service::owned_video;
use chrono::Utc;
use sea_orm::{ActiveValue::Set, DatabaseConnection};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

pub(crate) const STATUS_PENDING: &str = "pending";
const INITIAL_PROGRESS: &str = "{}";

#[derive(Clone)]
pub(crate) struct AnalysisService {
    db: Arc<DatabaseConnection>,
    backend: Option<AnalysisBackendClient>,
}

impl AnalysisService {
    pub(crate) fn new(db: Arc<DatabaseConnection>, backend: Option<AnalysisBackendClient>) -> Self {
        Self { db, backend }
    }

    pub(crate) async fn list(&self, owner: &UserModel) -> Result<Vec<AnalysisTaskModel>, ServiceError> {
        AnalysisTaskRepository::list_for_owner(self.db.as_ref(), &owner.id)
            .await
            .map_err(map_db_error)
    }

    pub(crate) async fn create(
        &self,
        owner: &UserModel,
        payload: Value,
    ) -> Result<AnalysisTaskModel, ServiceError> {
        let video_id = required_string(&payload, "video_id")?;
        let video_segmentation = optional_bool(&payload, "video_segmentation")?;
        let transition_detection = optional_bool(&payload, "transition_detection")?;
        let audio_transcription = optional_bool(&payload, "audio_transcription")?;
        let report_generation = optional_bool(&payload, "report_generation")?;

        let video = owned_video(self.db.as_ref(), owner, &video_id).await?;

        let now = Utc::now();
        let active_model = AnalysisTaskActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            video_id: Set(video.id),
            user_id: Set(owner.id.clone()),
            video_segmentation: Set(video_segmentation),
            transition_detection: Set(transition_detection),
            audio_transcription: Set(audio_transcription),
            report_generation: Set(report_generation),
            status: Set(STATUS_PENDING.to_string()),
            progress: Set(INITIAL_PROGRESS.to_string()),
            error_message: Set(None),
            report_pdf_url: Set(None),
            subtitle_srt_url: Set(None),
            subtitle_vtt_url: Set(None),
            script_md_url: Set(None),
            started_at: Set(None),
            completed_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let task = AnalysisTaskRepository::insert(self.db.as_ref(), active_model)
            .await
            .map_err(map_db_error)?;
        tracing::info!(task_id = %task.id, video_id = %task.video_id, "Analysis task queued");
        Ok(task)
    }

    pub(crate) async fn get(
        &self,
        owner: &UserModel,
        task_id: &str,
    ) -> Result<AnalysisTaskModel, ServiceError> {
        let task = AnalysisTaskRepository::find_by_id(self.db.as_ref(), task_id)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| ServiceError::not_found(format!("analysis task {task_id} was not found")))?;

        if task.user_id != owner.id {
            return Err(ServiceError::forbidden("analysis task belongs to another user"));
        }

        Ok(task)
    }

    pub(crate) async fn list_for_video(
        &self,
        owner: &UserModel,
        video_id: &str,
    ) -> Result<Vec<AnalysisTaskModel>, ServiceError> {
        let video = owned_video(self.db.as_ref(), owner, video_id).await?;
        AnalysisTaskRepository::list_for_videos(self.db.as_ref(), vec![video.id])
            .await
            .map_err(map_db_error)
    }

    /// Engine results for a task, with a `data_quality` report attached.
    pub(crate) async fn results(&self, owner: &UserModel, task_id: &str) -> Result<Value, ServiceError> {
        let task = self.get(owner, task_id).await?;
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| ServiceError::unavailable("analysis backend is not configured"))?;

        let mut results = backend
            .fetch_results(&task.id)
            .await
            .map_err(|error| match error {
                BackendError::NotFound(_) => ServiceError::not_found(error.to_string()),
                BackendError::Unreachable(_) | BackendError::Status(_) | BackendError::InvalidBody(_) => {
                    tracing::warn!(task_id = %task.id, error = %error, "Analysis backend call failed");
                    ServiceError::bad_gateway(error.to_string())
                }
            })?;

        let report = data_quality::assess(&results, &task.id);
        if report.has_issues {
            tracing::warn!(task_id = %task.id, issues = ?report.issues, "Analysis results have quality issues");
        }

        let report = serde_json::to_value(report)
            .map_err(|error| ServiceError::internal(error.to_string()))?;
        match results.as_object_mut() {
            Some(object) => {
                object.insert("data_quality".to_string(), report);
                Ok(results)
            }
            None => Err(ServiceError::bad_gateway(
                "analysis backend returned a non-object results document",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::error::ServiceErrorKind;
    use crate::test_support::{memory_db, seed_user, seed_video};
    use serde_json::json;

    #[tokio::test]
    async fn create_defaults_to_pending_with_empty_progress() {
        let db = memory_db().await;
        let owner = seed_user(&db, "ada@example.com").await;
        let video = seed_video(&db, &owner, "clip", 0).await;
        let service = AnalysisService::new(db, None);

        let task = service
            .create(&owner, json!({"video_id": video.id, "audio_transcription": true}))
            .await
            .unwrap();

        assert_eq!(task.status, STATUS_PENDING);
        assert_eq!(task.progress, "{}");
        assert!(task.audio_transcription);
        assert!(!task.video_segmentation);
        assert!(!task.report_generation);
        assert_eq!(task.user_id, owner.id);
    }

    #[tokio::test]
    async fn create_checks_video_presence_and_ownership() {
        let db = memory_db().await;
        let owner = seed_user(&db, "ada@example.com").await;
        let intruder = seed_user(&db, "eve@example.com").await;
        let video = seed_video(&db, &owner, "clip", 0).await;
        let service = AnalysisService::new(db, None);

        let missing_field = service.create(&owner, json!({})).await.unwrap_err();
        assert_eq!(missing_field.kind(), ServiceErrorKind::BadRequest);

        let unknown = service
            .create(&owner, json!({"video_id": "does-not-exist"}))
            .await
            .unwrap_err();
        assert_eq!(unknown.kind(), ServiceErrorKind::NotFound);

        let foreign = service
            .create(&intruder, json!({"video_id": video.id}))
            .await
            .unwrap_err();
        assert_eq!(foreign.kind(), ServiceErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn listing_scopes_to_owner_and_video() {
        let db = memory_db().await;
        let owner = seed_user(&db, "ada@example.com").await;
        let intruder = seed_user(&db, "eve@example.com").await;
        let first = seed_video(&db, &owner, "first", 5).await;
        let second = seed_video(&db, &owner, "second", 1).await;
        let service = AnalysisService::new(db, None);

        let task_a = service.create(&owner, json!({"video_id": first.id})).await.unwrap();
        let task_b = service.create(&owner, json!({"video_id": second.id})).await.unwrap();

        assert_eq!(service.list(&owner).await.unwrap().len(), 2);
        assert!(service.list(&intruder).await.unwrap().is_empty());

        let for_first = service.list_for_video(&owner, &first.id).await.unwrap();
        assert_eq!(for_first.len(), 1);
        assert_eq!(for_first[0].id, task_a.id);

        let forbidden = service.get(&intruder, &task_b.id).await.unwrap_err();
        assert_eq!(forbidden.kind(), ServiceErrorKind::Forbidden);
        let forbidden = service.list_for_video(&intruder, &second.id).await.unwrap_err();
        assert_eq!(forbidden.kind(), ServiceErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn results_require_configured_backend() {
        let db = memory_db().await;
        let owner = seed_user(&db, "ada@example.com").await;
        let video = seed_video(&db, &owner, "clip", 0).await;
        let service = AnalysisService::new(db, None);
        let task = service.create(&owner, json!({"video_id": video.id})).await.unwrap();

        let error = service.results(&owner, &task.id).await.unwrap_err();
        assert_eq!(error.kind(), ServiceErrorKind::Unavailable);
    }

    #[tokio::test]
    async fn results_attach_data_quality() {
        let db = memory_db().await;
        let owner = seed_user(&db, "ada@example.com").await;
        let video = seed_video(&db, &owner, "clip", 0).await;
        let mut server = mockito::Server::new_async().await;
        let service = AnalysisService::new(db, Some(AnalysisBackendClient::new(server.url())));
        let task = service.create(&owner, json!({"video_id": video.id})).await.unwrap();

        server
            .mock("GET", format!("/uploads/{}_results.json", task.id).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "segments": [{"duration": 30.0}, {"duration": 30.0}],
                    "transcription": {"segments": [{"text": "hi"}]},
                    "video_path": format!("uploads/{}.mp4", task.id)
                })
                .to_string(),
            )
            .create_async()
            .await;

        let results = service.results(&owner, &task.id).await.unwrap();
        assert_eq!(results["data_quality"]["score"], json!(75));
        assert_eq!(results["data_quality"]["has_issues"], json!(true));
    }

    #[tokio::test]
    async fn backend_failures_map_to_gateway_errors() {
        let db = memory_db().await;
        let owner = seed_user(&db, "ada@example.com").await;
        let video = seed_video(&db, &owner, "clip", 0).await;
        let mut server = mockito::Server::new_async().await;
        let service = AnalysisService::new(db, Some(AnalysisBackendClient::new(server.url())));
        let pending = service.create(&owner, json!({"video_id": video.id})).await.unwrap();
        let broken = service.create(&owner, json!({"video_id": video.id})).await.unwrap();

        server
            .mock("GET", format!("/uploads/{}_results.json", pending.id).as_str())
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", format!("/uploads/{}_results.json", broken.id).as_str())
            .with_status(503)
            .create_async()
            .await;

        let not_ready = service.results(&owner, &pending.id).await.unwrap_err();
        assert_eq!(not_ready.kind(), ServiceErrorKind::NotFound);
        let failed = service.results(&owner, &broken.id).await.unwrap_err();
        assert_eq!(failed.kind(), ServiceErrorKind::BadGateway);
    }
}
