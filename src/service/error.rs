use sea_orm::DbErr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ServiceErrorKind {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    PayloadTooLarge,
    BadGateway,
    Unavailable,
    Internal,
}

#[derive(Debug, Clone)]
pub(crate) struct ServiceError {
    kind: ServiceErrorKind,
    message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::BadRequest, message)
    }

    pub(crate) fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Unauthorized, message)
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Forbidden, message)
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::NotFound, message)
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Conflict, message)
    }

    pub(crate) fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::BadGateway, message)
    }

    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Unavailable, message)
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Internal, message)
    }

    pub(crate) fn kind(&self) -> ServiceErrorKind {
        self.kind
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ServiceError {}

/// Classifies driver errors by message so SQLite and Postgres map alike.
pub(crate) fn map_db_error(error: DbErr) -> ServiceError {
    match error {
        DbErr::RecordNotFound(message) => ServiceError::not_found(message),
        DbErr::Json(message) | DbErr::Type(message) => ServiceError::bad_request(message),
        other => {
            let message = other.to_string();
            let lowered = message.to_ascii_lowercase();

            if lowered.contains("unique constraint") || lowered.contains("duplicate key") {
                ServiceError::conflict(message)
            } else if lowered.contains("foreign key constraint")
                || lowered.contains("not null constraint failed")
                || lowered.contains("violates not-null constraint")
                || lowered.contains("check constraint")
                || lowered.contains("datatype mismatch")
            {
                ServiceError::bad_request(message)
            } else {
                ServiceError::internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    fn exec_error(message: &str) -> DbErr {
        DbErr::Exec(RuntimeErr::Internal(message.to_string()))
    }

    #[test]
    fn unique_violations_become_conflicts() {
        for message in [
            "UNIQUE constraint failed: users.email",
            "duplicate key value violates unique constraint \"users_email_key\"",
        ] {
            assert_eq!(
                map_db_error(exec_error(message)).kind(),
                ServiceErrorKind::Conflict
            );
        }
    }

    #[test]
    fn foreign_key_and_not_null_violations_are_bad_requests() {
        for message in [
            "FOREIGN KEY constraint failed",
            "insert or update on table \"videos\" violates foreign key constraint",
            "NOT NULL constraint failed: videos.title",
        ] {
            assert_eq!(
                map_db_error(exec_error(message)).kind(),
                ServiceErrorKind::BadRequest
            );
        }
    }

    #[test]
    fn unknown_driver_errors_are_internal() {
        let error = map_db_error(DbErr::Conn(RuntimeErr::Internal("pool timed out".into())));
        assert_eq!(error.kind(), ServiceErrorKind::Internal);
    }
}
