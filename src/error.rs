use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use diesel::r2d2::PoolError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

const CONFLICT_DETAIL: &str = "Request conflicts with existing data";

/// Failures raised by the data-access layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique, foreign-key, check or not-null constraint rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Another connection holds the write lock past the busy timeout.
    #[error("database is busy: {0}")]
    Busy(String),

    #[error("database error: {0}")]
    Database(DieselError),

    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
}

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation,
                info,
            ) => StoreError::ConstraintViolation(info.message().to_string()),
            DieselError::DatabaseError(_, info) if is_lock_contention(info.message()) => {
                StoreError::Busy(info.message().to_string())
            }
            DieselError::NotFound => StoreError::NotFound("record"),
            other => StoreError::Database(other),
        }
    }
}

/// Errors surfaced at the service boundary, each mapped to an HTTP status.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller input failed a precondition.
    #[error("{0}")]
    Validation(String),

    /// Request body could not be decoded.
    #[error("{0}")]
    InvalidPayload(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Circuit breaker is open.
    #[error("storage is temporarily unavailable")]
    Unavailable,

    /// Write lock contention; the request can be retried.
    #[error("storage is busy, try again")]
    Busy,

    #[error(transparent)]
    Store(StoreError),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] BlockingError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    /// Whether this failure says something about the health of the store,
    /// as opposed to the request itself.
    pub fn is_outage(&self) -> bool {
        matches!(
            self,
            ServiceError::Store(StoreError::Database(_) | StoreError::Pool(_))
        )
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => ServiceError::NotFound(format!("{} not found", capitalize(what))),
            StoreError::ConstraintViolation(message) => {
                log::warn!("constraint violation: {}", message);
                ServiceError::Conflict(CONFLICT_DETAIL.to_string())
            }
            StoreError::Busy(message) => {
                log::warn!("store busy: {}", message);
                ServiceError::Busy
            }
            other => ServiceError::Store(other),
        }
    }
}

impl From<DieselError> for ServiceError {
    fn from(err: DieselError) -> Self {
        StoreError::from(err).into()
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidPayload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Unavailable | ServiceError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Store(_) | ServiceError::Blocking(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let detail = match self {
            ServiceError::Store(_) | ServiceError::Blocking(_) => {
                log::error!("request failed: {}", self);
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "detail": detail }))
    }
}

// SQLITE_BUSY / SQLITE_LOCKED only surface through their message
fn is_lock_contention(message: &str) -> bool {
    message.contains("database is locked") || message.contains("database table is locked")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
