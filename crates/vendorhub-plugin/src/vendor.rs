//! Vendor registration API — vendor, request, and event operations.
//!
//! [`VendorApi`] binds the operations to one host procedure table and one
//! dispatch cell. The free functions at the bottom use the process-wide
//! host, which is what a plugin loaded into a real host would call.
//!
//! Call [`VendorApi::register_vendor`] from the post-load hook only; see
//! [`crate::lifecycle`].

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::calldata::Opaque;
use crate::callback::RequestCallback;
use crate::dispatch::{DispatchCell, DispatchState};
use crate::error::VendorError;
use crate::host::{ProcHandler, global_proc_handler};
use crate::marshal;
use crate::procedure::{self, EmitEvent, RegisterRequest, RegisterVendor, UnregisterRequest};

/// Event payload. Emitting never changes its reference count once the
/// call has returned.
pub type EventData = Arc<serde_json::Value>;

/// Opaque vendor identity handed out by the hub.
///
/// Equality is identity: two handles are equal only if the hub produced
/// them from the same vendor.
#[derive(Clone)]
pub struct VendorHandle(Opaque);

impl VendorHandle {
    /// Wraps the hub's vendor reference.
    pub fn from_opaque(inner: Opaque) -> Self {
        Self(inner)
    }

    /// The hub's vendor reference.
    pub fn as_opaque(&self) -> &Opaque {
        &self.0
    }

    /// Recovers the hub's concrete vendor type.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.0.clone().downcast::<T>().ok()
    }
}

impl PartialEq for VendorHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for VendorHandle {}

impl fmt::Debug for VendorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VendorHandle({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

/// Vendor operations against one host procedure table.
#[derive(Debug)]
pub struct VendorApi {
    /// Host table the dispatch table is resolved from.
    host: Arc<ProcHandler>,
    /// Cached dispatch table.
    dispatch: DispatchCell,
}

impl VendorApi {
    /// Creates an API bound to `host`. Nothing is resolved yet.
    pub fn new(host: Arc<ProcHandler>) -> Self {
        Self {
            host,
            dispatch: DispatchCell::new(),
        }
    }

    /// State of the cached dispatch table.
    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatch.state()
    }

    /// The cached dispatch table, if resolved.
    pub fn dispatch_table(&self) -> Option<&Arc<ProcHandler>> {
        self.dispatch.get()
    }

    /// How many times the dispatch table was actually resolved.
    pub fn resolve_attempts(&self) -> usize {
        self.dispatch.resolve_attempts()
    }

    /// Registers a vendor and returns its handle.
    ///
    /// Resolves the dispatch table on first use. Returns `None` if the hub
    /// is unavailable or refuses the name.
    pub fn register_vendor(&self, name: &str) -> Option<VendorHandle> {
        let Some(ph) = self.dispatch.resolve(&self.host) else {
            debug!(vendor = %name, "Hub unavailable, vendor not registered");
            return None;
        };

        // No vendor identity exists yet, so this bypasses the marshaller.
        let vendor = procedure::invoke(ph, &RegisterVendor { name }, None);
        match &vendor {
            Some(handle) => info!(vendor = %name, handle = ?handle, "Vendor registered"),
            None => warn!(vendor = %name, "Hub refused vendor registration"),
        }
        vendor
    }

    /// Registers a request handler under `request_type` for `vendor`.
    pub fn try_register_request(
        &self,
        vendor: Option<&VendorHandle>,
        request_type: &str,
        callback: &RequestCallback,
    ) -> Result<(), VendorError> {
        let request = RegisterRequest {
            request_type,
            callback,
        };
        marshal::try_run_simple_proc(self.table(), vendor, &request)
    }

    /// Removes the handler registered under `request_type` for `vendor`.
    pub fn try_unregister_request(
        &self,
        vendor: Option<&VendorHandle>,
        request_type: &str,
    ) -> Result<(), VendorError> {
        marshal::try_run_simple_proc(self.table(), vendor, &UnregisterRequest { request_type })
    }

    /// Emits `event_name` with `data` under `vendor`'s name.
    pub fn try_emit_event(
        &self,
        vendor: Option<&VendorHandle>,
        event_name: &str,
        data: &EventData,
    ) -> Result<(), VendorError> {
        let request = EmitEvent {
            event_type: event_name,
            data,
        };
        marshal::try_run_simple_proc(self.table(), vendor, &request)
    }

    /// Boolean form of [`Self::try_register_request`].
    pub fn register_request(
        &self,
        vendor: Option<&VendorHandle>,
        request_type: &str,
        callback: &RequestCallback,
    ) -> bool {
        let request = RegisterRequest {
            request_type,
            callback,
        };
        marshal::run_simple_proc(self.table(), vendor, &request)
    }

    /// Boolean form of [`Self::try_unregister_request`].
    pub fn unregister_request(&self, vendor: Option<&VendorHandle>, request_type: &str) -> bool {
        marshal::run_simple_proc(self.table(), vendor, &UnregisterRequest { request_type })
    }

    /// Boolean form of [`Self::try_emit_event`].
    pub fn emit_event(
        &self,
        vendor: Option<&VendorHandle>,
        event_name: &str,
        data: &EventData,
    ) -> bool {
        let request = EmitEvent {
            event_type: event_name,
            data,
        };
        marshal::run_simple_proc(self.table(), vendor, &request)
    }

    fn table(&self) -> Option<&ProcHandler> {
        self.dispatch.get().map(Arc::as_ref)
    }
}

/// The vendor API bound to the process-wide host table.
pub fn global() -> &'static Arc<VendorApi> {
    static API: OnceLock<Arc<VendorApi>> = OnceLock::new();
    API.get_or_init(|| Arc::new(VendorApi::new(global_proc_handler().clone())))
}

/// Registers a vendor through the process-wide API.
pub fn register_vendor(name: &str) -> Option<VendorHandle> {
    global().register_vendor(name)
}

/// Registers a request handler through the process-wide API.
pub fn register_request(
    vendor: Option<&VendorHandle>,
    request_type: &str,
    callback: &RequestCallback,
) -> bool {
    global().register_request(vendor, request_type, callback)
}

/// Removes a request handler through the process-wide API.
pub fn unregister_request(vendor: Option<&VendorHandle>, request_type: &str) -> bool {
    global().unregister_request(vendor, request_type)
}

/// Emits an event through the process-wide API.
pub fn emit_event(vendor: Option<&VendorHandle>, event_name: &str, data: &EventData) -> bool {
    global().emit_event(vendor, event_name, data)
}
