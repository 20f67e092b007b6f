//! Shared fixtures for in-process tests.

use crate::entity::{UserActiveModel, UserModel, VideoActiveModel, VideoModel};
use chrono::{Duration, Utc};
use common_http_server_rs::{AuthConfig, SharedAuthConfig};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use uuid::Uuid;

/// bcrypt's minimum cost keeps account tests fast.
pub(crate) const TEST_HASH_COST: u32 = 4;
pub(crate) const TEST_JWT_SECRET: &str = "test-secret-with-at-least-thirty-two-characters";

pub(crate) fn test_auth_config() -> SharedAuthConfig {
    AuthConfig::default()
        .with_jwt_secret(TEST_JWT_SECRET)
        .shared()
}

/// A migrated in-memory SQLite database on a single pooled connection.
pub(crate) async fn memory_db() -> Arc<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("in-memory sqlite should open");
    Migrator::up(&db, None)
        .await
        .expect("migrations should apply");
    Arc::new(db)
}

pub(crate) async fn seed_user(db: &DatabaseConnection, email: &str) -> UserModel {
    let now = Utc::now();
    UserActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        email: Set(email.to_string()),
        name: Set(email.split('@').next().unwrap_or(email).to_string()),
        password_hash: Set("not-a-bcrypt-hash".to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(db)
    .await
    .expect("user insert should succeed")
}

/// Inserts a video whose `created_at` is offset so ordering is deterministic.
pub(crate) async fn seed_video(
    db: &DatabaseConnection,
    owner: &UserModel,
    title: &str,
    age_minutes: i64,
) -> VideoModel {
    let created_at = Utc::now() - Duration::minutes(age_minutes);
    VideoActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(owner.id.clone()),
        title: Set(title.to_string()),
        filename: Set(format!("{title}.mp4")),
        file_size: Set(1024),
        file_url: Set(Some(format!("http://files.local/{title}.mp4"))),
        description: Set(String::new()),
        thumbnail_url: Set(None),
        duration: Set(None),
        resolution_width: Set(None),
        resolution_height: Set(None),
        format: Set(None),
        status: Set("uploaded".to_string()),
        created_at: Set(created_at.into()),
        updated_at: Set(created_at.into()),
        deleted_at: Set(None),
    }
    .insert(db)
    .await
    .expect("video insert should succeed")
}
