use crate::entity::{UserActiveModel, UserColumn, UserEntity, UserModel};
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

pub(crate) struct UserRepository;

impl UserRepository {
    pub(crate) async fn find_by_email<C>(db: &C, email: &str) -> Result<Option<UserModel>, DbErr>
    where
        C: ConnectionTrait,
    {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(db)
            .await
    }

    pub(crate) async fn insert<C>(db: &C, active_model: UserActiveModel) -> Result<UserModel, DbErr>
    where
        C: ConnectionTrait,
    {
        active_model.insert(db).await
    }
}
