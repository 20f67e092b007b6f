use crate::auth::types::{AuthError, AuthUser};

/// 从请求中获取认证用户
pub fn get_auth_user(request: &axum::extract::Request) -> Result<&AuthUser, AuthError> {
    request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuthHeader)
}

/// Returns the bearer subject, if the JWT layer has already run.
pub fn auth_subject(request: &axum::extract::Request) -> Option<&str> {
    get_auth_user(request)
        .ok()
        .map(|auth_user| auth_user.subject.as_str())
}
