//! # vendorhub-core
//!
//! Core crate for vendorhub. Contains the unified error system, the
//! result alias, and the configuration schema shared by the protocol
//! crate and the demo binary.
//!
//! This crate has **no** internal dependencies on other vendorhub crates.

pub mod config;
pub mod error;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
