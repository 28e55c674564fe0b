//! Failure taxonomy for vendor procedure calls.

use thiserror::Error;

use vendorhub_core::AppError;

use crate::procedure::ProcedureId;

/// Why a vendor operation did not take effect.
///
/// The public boolean API collapses every variant to `false`; the `try_*`
/// variants on [`crate::VendorApi`] surface it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VendorError {
    /// The hub or its dispatch table is not present.
    #[error("vendor dispatch table is unavailable")]
    Unavailable,
    /// A required argument was missing or empty; no call was issued.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// The call ran but the hub reported failure.
    #[error("procedure '{procedure}' reported failure")]
    RemoteFailure {
        /// The procedure that failed.
        procedure: ProcedureId,
    },
}

impl From<VendorError> for AppError {
    fn from(err: VendorError) -> Self {
        let message = err.to_string();
        match err {
            VendorError::Unavailable => AppError::service_unavailable(message),
            VendorError::InvalidArgument(_) => AppError::validation(message),
            VendorError::RemoteFailure { .. } => AppError::plugin(message),
        }
    }
}
