use chrono::{DateTime, Utc};
use sea_orm::{DbErr, SqlErr};

/// Ошибки операций с пропусками
#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Pass has already been scanned")]
    AlreadyScanned { scan_time: Option<DateTime<Utc>> },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type PassResult<T> = Result<T, PassError>;

impl PassError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound("Pass not found".into())
    }

    pub fn duplicate_barcode() -> Self {
        Self::Conflict("A pass with this barcode already exists".into())
    }
}

/// Нарушение UNIQUE в цепочке ошибок репозитория
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<DbErr>().and_then(|e| e.sql_err()),
            Some(SqlErr::UniqueConstraintViolation(_))
        )
    })
}
