use crate::entity::{
    AnalysisTaskActiveModel, AnalysisTaskColumn, AnalysisTaskEntity, AnalysisTaskModel,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

pub(crate) struct AnalysisTaskRepository;

impl AnalysisTaskRepository {
    pub(crate) async fn list_for_owner<C>(
        db: &C,
        user_id: &str,
    ) -> Result<Vec<AnalysisTaskModel>, DbErr>
    where
        C: ConnectionTrait,
    {
        AnalysisTaskEntity::find()
            .filter(AnalysisTaskColumn::UserId.eq(user_id))
            .order_by_desc(AnalysisTaskColumn::CreatedAt)
            .order_by_desc(AnalysisTaskColumn::Id)
            .all(db)
            .await
    }

    pub(crate) async fn list_for_videos<C>(
        db: &C,
        video_ids: Vec<String>,
    ) -> Result<Vec<AnalysisTaskModel>, DbErr>
    where
        C: ConnectionTrait,
    {
        if video_ids.is_empty() {
            return Ok(Vec::new());
        }

        AnalysisTaskEntity::find()
            .filter(AnalysisTaskColumn::VideoId.is_in(video_ids))
            .order_by_desc(AnalysisTaskColumn::CreatedAt)
            .order_by_desc(AnalysisTaskColumn::Id)
            .all(db)
            .await
    }

    pub(crate) async fn find_by_id<C>(db: &C, id: &str) -> Result<Option<AnalysisTaskModel>, DbErr>
    where
        C: ConnectionTrait,
    {
        AnalysisTaskEntity::find_by_id(id.to_string()).one(db).await
    }

    pub(crate) async fn insert<C>(
        db: &C,
        active_model: AnalysisTaskActiveModel,
    ) -> Result<AnalysisTaskModel, DbErr>
    where
        C: ConnectionTrait,
    {
        active_model.insert(db).await
    }
}
