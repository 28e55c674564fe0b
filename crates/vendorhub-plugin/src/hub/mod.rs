//! Reference hub — owns the dispatch table and serves the vendor procedures.
//!
//! [`VendorHub::install`] publishes the dispatch table on a host table under
//! `vendor_api_get_ph` and fills it with the four vendor procedures. The
//! procedures read and write parameter bags exactly as an independently
//! compiled hub would, so vendors only ever see the wire contract.

pub mod definitions;
pub mod dispatcher;
pub mod registry;

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{info, warn};

use vendorhub_core::AppResult;

use crate::calldata::{CallData, Opaque};
use crate::callback::RequestCallback;
use crate::host::ProcHandler;
use crate::procedure::{ProcedureId, keys};

pub use definitions::VendorEvent;
pub use dispatcher::HubDispatcher;
pub use registry::{HubVendor, VendorRegistry};

/// The hub plugin.
#[derive(Debug)]
pub struct VendorHub {
    /// Dispatch table handed to vendors.
    table: Arc<ProcHandler>,
    /// Request and event routing.
    dispatcher: Arc<HubDispatcher>,
}

impl VendorHub {
    /// Creates a hub with its dispatch table populated.
    pub fn new(event_capacity: usize) -> Self {
        let registry = Arc::new(VendorRegistry::new());
        let dispatcher = Arc::new(HubDispatcher::new(registry.clone(), event_capacity));
        let table = Arc::new(ProcHandler::new());

        let reg = registry.clone();
        table.add(ProcedureId::VendorRegister.as_str(), move |cd| {
            vendor_register(&reg, cd)
        });
        table.add(
            ProcedureId::VendorRequestRegister.as_str(),
            vendor_request_register,
        );
        table.add(
            ProcedureId::VendorRequestUnregister.as_str(),
            vendor_request_unregister,
        );
        let disp = dispatcher.clone();
        table.add(ProcedureId::VendorEventEmit.as_str(), move |cd| {
            vendor_event_emit(&disp, cd)
        });

        Self { table, dispatcher }
    }

    /// Publishes the dispatch table on `host`.
    pub fn install(&self, host: &ProcHandler) {
        let table = self.table.clone();
        host.add(ProcedureId::GetDispatchTable.as_str(), move |cd| {
            let ph: Opaque = table.clone();
            cd.set_ptr(keys::PH, ph);
        });
        info!(procedures = ?self.table.names(), "Vendor hub installed");
    }

    /// Withdraws the dispatch table from `host`. Vendors that already
    /// resolved it keep their reference.
    pub fn uninstall(&self, host: &ProcHandler) -> bool {
        host.remove(ProcedureId::GetDispatchTable.as_str())
    }

    /// The dispatch table.
    pub fn dispatch_table(&self) -> &Arc<ProcHandler> {
        &self.table
    }

    /// Calls a vendor request on the caller's thread and returns its response.
    pub fn call_vendor_request(
        &self,
        vendor_name: &str,
        request_type: &str,
        request_data: &Value,
    ) -> AppResult<Value> {
        self.dispatcher
            .call_request(vendor_name, request_type, request_data)
    }

    /// Subscribes to vendor events.
    pub fn subscribe(&self) -> broadcast::Receiver<VendorEvent> {
        self.dispatcher.subscribe()
    }

    /// Registered vendor names, sorted.
    pub fn vendor_names(&self) -> Vec<String> {
        self.dispatcher.registry().names()
    }

    /// Whether `vendor_name` has a handler for `request_type`.
    pub fn has_request(&self, vendor_name: &str, request_type: &str) -> bool {
        self.dispatcher
            .registry()
            .get(vendor_name)
            .map(|vendor| vendor.request(request_type).is_some())
            .unwrap_or(false)
    }

    /// Request types registered by `vendor_name`.
    pub fn request_types(&self, vendor_name: &str) -> Vec<String> {
        self.dispatcher
            .registry()
            .get(vendor_name)
            .map(|vendor| vendor.request_types())
            .unwrap_or_default()
    }
}

fn vendor_register(registry: &VendorRegistry, cd: &mut CallData) {
    let name = cd.string(keys::NAME).unwrap_or_default().to_string();
    match registry.register(&name) {
        Ok(vendor) => {
            let handle: Opaque = vendor;
            cd.set_ptr(keys::VENDOR, handle);
        }
        Err(e) => warn!(vendor = %name, error = %e, "Vendor registration refused"),
    }
}

fn vendor_request_register(cd: &mut CallData) {
    let success = match (
        cd.ptr_as::<HubVendor>(keys::VENDOR),
        cd.string(keys::TYPE),
        cd.ptr_as::<RequestCallback>(keys::CALLBACK),
    ) {
        (Some(vendor), Some(request_type), Some(callback)) if !request_type.is_empty() => {
            vendor.register_request(request_type, RequestCallback::clone(&callback))
        }
        _ => false,
    };
    cd.set_bool(keys::SUCCESS, success);
}

fn vendor_request_unregister(cd: &mut CallData) {
    let success = match (cd.ptr_as::<HubVendor>(keys::VENDOR), cd.string(keys::TYPE)) {
        (Some(vendor), Some(request_type)) => vendor.unregister_request(request_type),
        _ => false,
    };
    cd.set_bool(keys::SUCCESS, success);
}

fn vendor_event_emit(dispatcher: &HubDispatcher, cd: &mut CallData) {
    let success = match (cd.ptr_as::<HubVendor>(keys::VENDOR), cd.string(keys::TYPE)) {
        (Some(vendor), Some(event_type)) if !event_type.is_empty() => {
            // Snapshot the payload; the caller keeps the only long-lived reference.
            let event_data = cd
                .ptr_as::<Value>(keys::DATA)
                .map(|data| Value::clone(&data))
                .unwrap_or(Value::Null);
            dispatcher.emit(VendorEvent::new(vendor.name(), event_type, event_data));
            true
        }
        _ => false,
    };
    cd.set_bool(keys::SUCCESS, success);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_publishes_table() {
        let host = ProcHandler::new();
        let hub = VendorHub::new(8);
        hub.install(&host);

        let mut cd = CallData::new();
        assert!(host.call(ProcedureId::GetDispatchTable.as_str(), &mut cd));
        let table = cd.ptr_as::<ProcHandler>(keys::PH).expect("table");
        assert!(Arc::ptr_eq(&table, hub.dispatch_table()));
        for id in ProcedureId::HUB_PROCEDURES {
            assert!(table.contains(id.as_str()), "missing {id}");
        }

        assert!(hub.uninstall(&host));
        assert!(!host.contains(ProcedureId::GetDispatchTable.as_str()));
    }

    #[test]
    fn test_request_register_requires_vendor() {
        let hub = VendorHub::new(8);
        let mut cd = CallData::new();
        cd.set_string(keys::TYPE, "ping");
        let callback: Opaque = Arc::new(RequestCallback::new(|_, _| {}));
        cd.set_ptr(keys::CALLBACK, callback);

        assert!(
            hub.dispatch_table()
                .call(ProcedureId::VendorRequestRegister.as_str(), &mut cd)
        );
        assert!(!cd.bool(keys::SUCCESS));
    }

    #[test]
    fn test_vendor_register_refuses_duplicates() {
        let hub = VendorHub::new(8);
        let table = hub.dispatch_table();

        let mut first = CallData::new();
        first.set_string(keys::NAME, "demo");
        table.call(ProcedureId::VendorRegister.as_str(), &mut first);
        assert!(first.ptr(keys::VENDOR).is_some());

        let mut second = CallData::new();
        second.set_string(keys::NAME, "demo");
        table.call(ProcedureId::VendorRegister.as_str(), &mut second);
        assert!(second.ptr(keys::VENDOR).is_none());
        assert_eq!(hub.vendor_names(), vec!["demo".to_string()]);
    }
}
