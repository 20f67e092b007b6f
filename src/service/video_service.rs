use crate::entity::{AnalysisTaskModel, UserModel, VideoActiveModel, VideoModel};
use crate::repository::analysis_task_repository::AnalysisTaskRepository;
use crate::repository::video_repository::VideoRepository;
use crate::service::error::{ServiceError, map_db_error};
use crate::service::payload::{optional_string, required_positive_i64, required_string};
use chrono::Utc;
use sea_orm::{ActiveValue::Set, DatabaseConnection};
use serde::Serialize;
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

const DEFAULT_LIMIT: u64 = 100;
const MAX_LIMIT: u64 = 500;
pub(crate) const STATUS_UPLOADED: &str = "uploaded";

#[derive(Debug, Serialize)]
pub(crate) struct VideoWithTasks {
    #[serde(flatten)]
    pub(crate) video: VideoModel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tasks: Option<Vec<AnalysisTaskModel>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeletedVideo {
    pub(crate) message: &'static str,
}

pub(crate) fn clamp_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Loads a live video and checks that `owner` may see it.
pub(crate) async fn owned_video(
    db: &DatabaseConnection,
    owner: &UserModel,
    video_id: &str,
) -> Result<VideoModel, ServiceError> {
    let video = VideoRepository::find_active_by_id(db, video_id)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| ServiceError::not_found(format!("video {video_id} was not found")))?;

    if video.user_id != owner.id {
        return Err(ServiceError::forbidden("video belongs to another user"));
    }

    Ok(video)
}

#[derive(Clone)]
pub(crate) struct VideoService {
    db: Arc<DatabaseConnection>,
}

impl VideoService {
    pub(crate) fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub(crate) async fn list(
        &self,
        owner: &UserModel,
        skip: Option<u64>,
        limit: Option<u64>,
        include_tasks: bool,
    ) -> Result<Vec<VideoWithTasks>, ServiceError> {
        let videos = VideoRepository::list_for_owner(
            self.db.as_ref(),
            &owner.id,
            skip.unwrap_or(0),
            clamp_limit(limit),
        )
        .await
        .map_err(map_db_error)?;

        if !include_tasks {
            return Ok(videos
                .into_iter()
                .map(|video| VideoWithTasks { video, tasks: None })
                .collect());
        }

        let video_ids = videos.iter().map(|video| video.id.clone()).collect();
        let mut tasks_by_video: HashMap<String, Vec<AnalysisTaskModel>> = HashMap::new();
        for task in AnalysisTaskRepository::list_for_videos(self.db.as_ref(), video_ids)
            .await
            .map_err(map_db_error)?
        {
            tasks_by_video
                .entry(task.video_id.clone())
                .or_default()
                .push(task);
        }

        Ok(videos
            .into_iter()
            .map(|video| {
                let tasks = tasks_by_video.remove(&video.id).unwrap_or_default();
                VideoWithTasks {
                    video,
                    tasks: Some(tasks),
                }
            })
            .collect())
    }

    pub(crate) async fn create(
        &self,
        owner: &UserModel,
        payload: Value,
    ) -> Result<VideoModel, ServiceError> {
        let title = required_string(&payload, "title")?;
        let filename = required_string(&payload, "filename")?;
        let file_url = required_string(&payload, "file_url")?;
        let file_size = required_positive_i64(&payload, "file_size")?;
        let description = optional_string(&payload, "description")?.unwrap_or_default();

        let now = Utc::now();
        let active_model = VideoActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(owner.id.clone()),
            title: Set(title),
            filename: Set(filename),
            file_size: Set(file_size),
            file_url: Set(Some(file_url)),
            description: Set(description),
            thumbnail_url: Set(None),
            duration: Set(None),
            resolution_width: Set(None),
            resolution_height: Set(None),
            format: Set(None),
            status: Set(STATUS_UPLOADED.to_string()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            deleted_at: Set(None),
        };

        let video = VideoRepository::insert(self.db.as_ref(), active_model)
            .await
            .map_err(map_db_error)?;
        tracing::info!(video_id = %video.id, user_id = %owner.id, "Video record created");
        Ok(video)
    }

    pub(crate) async fn get(
        &self,
        owner: &UserModel,
        video_id: &str,
    ) -> Result<VideoModel, ServiceError> {
        owned_video(self.db.as_ref(), owner, video_id).await
    }

    pub(crate) async fn delete(
        &self,
        owner: &UserModel,
        video_id: &str,
    ) -> Result<DeletedVideo, ServiceError> {
        let video = owned_video(self.db.as_ref(), owner, video_id).await?;
        VideoRepository::soft_delete(self.db.as_ref(), video)
            .await
            .map_err(map_db_error)?;
        tracing::info!(video_id, user_id = %owner.id, "Video soft-deleted");

        Ok(DeletedVideo {
            message: "video deleted",
        })
    }
}
