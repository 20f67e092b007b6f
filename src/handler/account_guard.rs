use crate::entity::UserModel;
use crate::service::account_service::AccountService;
use crate::service::error::ServiceError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use common_http_server_rs::get_auth_user;

/// The account behind the request's bearer token.
#[derive(Debug, Clone)]
pub(crate) struct CurrentAccount(pub(crate) UserModel);

/// Runs inside `jwt_auth_middleware`; turns the token subject into an account.
pub(crate) async fn account_guard(
    State(accounts): State<AccountService>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let subject = get_auth_user(&request)
        .map_err(|error| ServiceError::unauthorized(error.to_string()))?
        .subject
        .clone();

    let account = accounts.resolve_subject(&subject).await?;
    tracing::debug!(user_id = %account.id, "Resolved bearer token to account");
    request.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(request).await)
}
