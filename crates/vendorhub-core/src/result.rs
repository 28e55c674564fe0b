//! Convenience result type alias for vendorhub.

use crate::error::AppError;

/// A specialized `Result` type for vendorhub operations.
pub type AppResult<T> = Result<T, AppError>;
