//! Businesses service errors.

use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusinessesServiceError {
    #[error("invalid data")]
    InvalidData(#[source] Error),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for BusinessesServiceError {
    fn from(error: Error) -> Self {
        match error {
            Error::ColumnDecode { .. } | Error::Decode(_) => Self::InvalidData(error),
            _ => Self::Sql(error),
        }
    }
}
