use crate::entity::{VideoActiveModel, VideoColumn, VideoEntity, VideoModel};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect,
};

pub(crate) struct VideoRepository;

impl VideoRepository {
    /// Soft-deleted rows are excluded.
    pub(crate) async fn list_for_owner<C>(
        db: &C,
        user_id: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<VideoModel>, DbErr>
    where
        C: ConnectionTrait,
    {
        VideoEntity::find()
            .filter(VideoColumn::UserId.eq(user_id))
            .filter(VideoColumn::DeletedAt.is_null())
            .order_by_desc(VideoColumn::CreatedAt)
            .order_by_desc(VideoColumn::Id)
            .offset(skip)
            .limit(limit)
            .all(db)
            .await
    }

    pub(crate) async fn find_active_by_id<C>(db: &C, id: &str) -> Result<Option<VideoModel>, DbErr>
    where
        C: ConnectionTrait,
    {
        VideoEntity::find_by_id(id.to_string())
            .filter(VideoColumn::DeletedAt.is_null())
            .one(db)
            .await
    }

    pub(crate) async fn insert<C>(db: &C, active_model: VideoActiveModel) -> Result<VideoModel, DbErr>
    where
        C: ConnectionTrait,
    {
        active_model.insert(db).await
    }

    pub(crate) async fn soft_delete<C>(db: &C, existing: VideoModel) -> Result<VideoModel, DbErr>
    where
        C: ConnectionTrait,
    {
        let now = Utc::now();
        let mut active_model = existing.into_active_model();
        active_model.deleted_at = Set(Some(now.into()));
        active_model.updated_at = Set(now.into());
        active_model.update(db).await
    }
}
