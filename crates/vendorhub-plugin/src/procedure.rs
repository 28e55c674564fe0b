//! Fixed procedures, their wire keys, and one typed request per procedure.
//!
//! Procedure names and keys are a string-stable contract between
//! independently compiled plugins. They live here and nowhere else.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calldata::{CallData, Opaque};
use crate::callback::RequestCallback;
use crate::error::VendorError;
use crate::host::ProcHandler;
use crate::vendor::{EventData, VendorHandle};

/// Field names used inside parameter bags.
pub mod keys {
    /// Dispatch table returned by [`super::ProcedureId::GetDispatchTable`].
    pub const PH: &str = "ph";
    /// Vendor name passed to `vendor_register`.
    pub const NAME: &str = "name";
    /// Vendor identity, returned by `vendor_register` and injected into every other call.
    pub const VENDOR: &str = "vendor";
    /// Request type or event name.
    pub const TYPE: &str = "type";
    /// Request callback capability.
    pub const CALLBACK: &str = "callback";
    /// Event payload.
    pub const DATA: &str = "data";
    /// Result flag written by the hub.
    pub const SUCCESS: &str = "success";
}

/// Enumeration of every procedure in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcedureId {
    /// Published on the host table; returns the hub's dispatch table.
    GetDispatchTable,
    /// Creates a vendor.
    VendorRegister,
    /// Adds a request handler for a vendor.
    VendorRequestRegister,
    /// Removes a request handler.
    VendorRequestUnregister,
    /// Emits an event under the vendor's name.
    VendorEventEmit,
}

impl ProcedureId {
    /// Every procedure the hub serves on its dispatch table.
    pub const HUB_PROCEDURES: [ProcedureId; 4] = [
        Self::VendorRegister,
        Self::VendorRequestRegister,
        Self::VendorRequestUnregister,
        Self::VendorEventEmit,
    ];

    /// Returns the wire name of this procedure.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetDispatchTable => "vendor_api_get_ph",
            Self::VendorRegister => "vendor_register",
            Self::VendorRequestRegister => "vendor_request_register",
            Self::VendorRequestUnregister => "vendor_request_unregister",
            Self::VendorEventEmit => "vendor_event_emit",
        }
    }
}

impl fmt::Display for ProcedureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed request for one procedure.
///
/// `pack` writes the request's fields into a fresh bag; `unpack` reads the
/// procedure's result back out of the same bag after the call.
pub trait Procedure {
    /// Which procedure this request targets.
    const ID: ProcedureId;

    /// What the caller gets back.
    type Output;

    /// Checks request fields locally, before any call is issued.
    fn validate(&self) -> Result<(), VendorError> {
        Ok(())
    }

    /// Writes request fields.
    fn pack(&self, cd: &mut CallData);

    /// Reads the result.
    fn unpack(cd: &CallData) -> Self::Output;
}

/// Packs `request`, tags it with `vendor` if given, calls it on `ph`, and
/// unpacks the result. The bag is dropped before returning.
pub(crate) fn invoke<P: Procedure>(
    ph: &ProcHandler,
    request: &P,
    vendor: Option<&VendorHandle>,
) -> P::Output {
    let mut cd = CallData::new();
    request.pack(&mut cd);
    if let Some(vendor) = vendor {
        cd.set_ptr(keys::VENDOR, vendor.as_opaque().clone());
    }

    if !ph.call(P::ID.as_str(), &mut cd) {
        debug!(procedure = %P::ID, "Procedure not found on table");
    }

    P::unpack(&cd)
}

fn require_name(name: &str, what: &'static str) -> Result<(), VendorError> {
    if name.is_empty() {
        return Err(VendorError::InvalidArgument(what));
    }
    Ok(())
}

/// Asks the host for the hub's dispatch table.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetDispatchTable;

impl Procedure for GetDispatchTable {
    const ID: ProcedureId = ProcedureId::GetDispatchTable;
    type Output = Option<Arc<ProcHandler>>;

    fn pack(&self, _cd: &mut CallData) {}

    fn unpack(cd: &CallData) -> Self::Output {
        cd.ptr_as::<ProcHandler>(keys::PH)
    }
}

/// Registers a vendor under a human-readable name.
#[derive(Debug, Clone, Copy)]
pub struct RegisterVendor<'a> {
    /// Vendor name.
    pub name: &'a str,
}

impl Procedure for RegisterVendor<'_> {
    const ID: ProcedureId = ProcedureId::VendorRegister;
    type Output = Option<VendorHandle>;

    fn pack(&self, cd: &mut CallData) {
        cd.set_string(keys::NAME, self.name);
    }

    fn unpack(cd: &CallData) -> Self::Output {
        cd.ptr(keys::VENDOR).cloned().map(VendorHandle::from_opaque)
    }
}

/// Adds a request handler for the calling vendor.
#[derive(Debug, Clone, Copy)]
pub struct RegisterRequest<'a> {
    /// Request type, unique per vendor.
    pub request_type: &'a str,
    /// Handler capability; the hub keeps its own clone.
    pub callback: &'a RequestCallback,
}

impl Procedure for RegisterRequest<'_> {
    const ID: ProcedureId = ProcedureId::VendorRequestRegister;
    type Output = bool;

    fn validate(&self) -> Result<(), VendorError> {
        require_name(self.request_type, "request type")
    }

    fn pack(&self, cd: &mut CallData) {
        cd.set_string(keys::TYPE, self.request_type);
        let callback: Opaque = Arc::new(self.callback.clone());
        cd.set_ptr(keys::CALLBACK, callback);
    }

    fn unpack(cd: &CallData) -> bool {
        cd.bool(keys::SUCCESS)
    }
}

/// Removes a request handler for the calling vendor.
#[derive(Debug, Clone, Copy)]
pub struct UnregisterRequest<'a> {
    /// Request type.
    pub request_type: &'a str,
}

impl Procedure for UnregisterRequest<'_> {
    const ID: ProcedureId = ProcedureId::VendorRequestUnregister;
    type Output = bool;

    fn validate(&self) -> Result<(), VendorError> {
        require_name(self.request_type, "request type")
    }

    fn pack(&self, cd: &mut CallData) {
        cd.set_string(keys::TYPE, self.request_type);
    }

    fn unpack(cd: &CallData) -> bool {
        cd.bool(keys::SUCCESS)
    }
}

/// Emits a named event with a payload under the calling vendor's name.
#[derive(Debug, Clone, Copy)]
pub struct EmitEvent<'a> {
    /// Event name.
    pub event_type: &'a str,
    /// Payload; shared for the duration of the call only.
    pub data: &'a EventData,
}

impl Procedure for EmitEvent<'_> {
    const ID: ProcedureId = ProcedureId::VendorEventEmit;
    type Output = bool;

    fn validate(&self) -> Result<(), VendorError> {
        require_name(self.event_type, "event name")
    }

    fn pack(&self, cd: &mut CallData) {
        cd.set_string(keys::TYPE, self.event_type);
        let data: Opaque = self.data.clone();
        cd.set_ptr(keys::DATA, data);
    }

    fn unpack(cd: &CallData) -> bool {
        cd.bool(keys::SUCCESS)
    }
}
