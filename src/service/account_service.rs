use crate::entity::{UserActiveModel, UserModel};
use crate::repository::user_repository::UserRepository;
use crate::service::error::{ServiceError, ServiceErrorKind, map_db_error};
use crate::service::payload::{required_raw_string, required_string};
use chrono::Utc;
use common_http_server_rs::{JwtUtils, SharedAuthConfig};
use regex::Regex;
use sea_orm::{ActiveValue::Set, DatabaseConnection, prelude::DateTimeWithTimeZone};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

pub(crate) const DEFAULT_HASH_COST: u32 = 12;
const MIN_PASSWORD_CHARS: usize = 6;
const INVALID_CREDENTIALS: &str = "invalid email or password";

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

#[derive(Debug, Serialize)]
pub(crate) struct AccountView {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) name: String,
    pub(crate) created_at: DateTimeWithTimeZone,
}

impl From<UserModel> for AccountView {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
    pub(crate) token_type: &'static str,
    pub(crate) user: AccountView,
}

#[derive(Clone)]
pub(crate) struct AccountService {
    db: Arc<DatabaseConnection>,
    auth_config: SharedAuthConfig,
    hash_cost: u32,
}

impl AccountService {
    pub(crate) fn new(db: Arc<DatabaseConnection>, auth_config: SharedAuthConfig) -> Self {
        Self {
            db,
            auth_config,
            hash_cost: DEFAULT_HASH_COST,
        }
    }

    pub(crate) fn with_hash_cost(mut self, hash_cost: u32) -> Self {
        self.hash_cost = hash_cost;
        self
    }

    pub(crate) async fn register(&self, payload: Value) -> Result<TokenResponse, ServiceError> {
        let email = normalize_email(required_string(&payload, "email")?);
        let password = required_raw_string(&payload, "password")?;
        let name = required_string(&payload, "name")?;

        validate_email(&email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ServiceError::bad_request(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }

        if UserRepository::find_by_email(self.db.as_ref(), &email)
            .await
            .map_err(map_db_error)?
            .is_some()
        {
            return Err(ServiceError::bad_request("email is already registered"));
        }

        let password_hash = hash_password(password, self.hash_cost).await?;
        let now = Utc::now();
        let active_model = UserActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            email: Set(email.clone()),
            name: Set(name),
            password_hash: Set(password_hash),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let user = UserRepository::insert(self.db.as_ref(), active_model)
            .await
            .map_err(|error| match map_db_error(error) {
                // Lost a race with a concurrent registration.
                conflict if conflict.kind() == ServiceErrorKind::Conflict => {
                    ServiceError::bad_request("email is already registered")
                }
                other => other,
            })?;

        tracing::info!(user_id = %user.id, "Account registered");
        self.token_response(user)
    }

    pub(crate) async fn login(&self, payload: Value) -> Result<TokenResponse, ServiceError> {
        let email = normalize_email(required_string(&payload, "email")?);
        let password = required_raw_string(&payload, "password")?;

        let Some(user) = UserRepository::find_by_email(self.db.as_ref(), &email)
            .await
            .map_err(map_db_error)?
        else {
            tracing::warn!("Login rejected for unknown account");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        };

        if !verify_password(password, user.password_hash.clone()).await? {
            tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }

        self.token_response(user)
    }

    /// Maps a verified token subject (email) to its account.
    pub(crate) async fn resolve_subject(&self, subject: &str) -> Result<UserModel, ServiceError> {
        UserRepository::find_by_email(self.db.as_ref(), &normalize_email(subject.to_string()))
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| ServiceError::not_found("user not found"))
    }

    fn token_response(&self, user: UserModel) -> Result<TokenResponse, ServiceError> {
        let access_token = JwtUtils::generate_token(&user.email, &self.auth_config)
            .map_err(|error| ServiceError::internal(error.to_string()))?;

        Ok(TokenResponse {
            access_token,
            token_type: "bearer",
            user: user.into(),
        })
    }
}

/// Emails are stored and compared in lowercase.
fn normalize_email(email: String) -> String {
    email.to_lowercase()
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    let pattern = EMAIL_PATTERN
        .as_ref()
        .ok_or_else(|| ServiceError::internal("email pattern failed to compile"))?;
    if pattern.is_match(email) {
        Ok(())
    } else {
        Err(ServiceError::bad_request("email address is not valid"))
    }
}

async fn hash_password(password: String, cost: u32) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|error| ServiceError::internal(format!("password hashing task failed: {error}")))?
        .map_err(|error| ServiceError::internal(format!("failed to hash password: {error}")))
}

async fn verify_password(password: String, password_hash: String) -> Result<bool, ServiceError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|error| ServiceError::internal(format!("password check task failed: {error}")))?;

    // A malformed stored hash is treated as a failed login.
    Ok(verified.unwrap_or(false))
}
