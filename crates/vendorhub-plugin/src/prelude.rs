//! Prelude for vendor plugins.

pub use vendorhub_core::{AppError, AppResult};

pub use crate::callback::RequestCallback;
pub use crate::error::VendorError;
pub use crate::lifecycle::{PluginHost, PluginStage, VendorPlugin};
pub use crate::vendor::{EventData, VendorApi, VendorHandle};
