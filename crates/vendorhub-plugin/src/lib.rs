//! # vendorhub-plugin
//!
//! Cross-plugin procedure-call convention for "vendor" plugins. Provides:
//!
//! - An ordered parameter bag ([`CallData`]) used for every call
//! - The host procedure table ([`ProcHandler`]) and a process-wide instance
//! - Typed requests for each fixed procedure ([`procedure`])
//! - A tri-state cache for the hub's dispatch table ([`DispatchCell`])
//! - The call marshaller and the vendor registration API ([`VendorApi`])
//! - A one-shot post-load lifecycle for vendor plugins ([`PluginHost`])
//! - A reference hub that owns the dispatch table ([`VendorHub`])

pub mod calldata;
pub mod callback;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod hub;
pub mod lifecycle;
pub mod marshal;
pub mod prelude;
pub mod procedure;
pub mod vendor;

pub use calldata::{CallData, CallValue, Opaque};
pub use callback::RequestCallback;
pub use dispatch::{DispatchCell, DispatchState, get_registry};
pub use error::VendorError;
pub use host::{ProcHandler, global_proc_handler};
pub use hub::{VendorEvent, VendorHub};
pub use lifecycle::{PluginHost, PluginStage, VendorPlugin};
pub use procedure::ProcedureId;
pub use vendor::{EventData, VendorApi, VendorHandle};
