//! Hub-side vendor registry — vendors by name, request handlers by type.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};
use uuid::Uuid;

use vendorhub_core::AppError;

use crate::callback::RequestCallback;

/// A registered vendor. The hub hands out `Arc<HubVendor>` as the opaque
/// vendor handle.
#[derive(Debug)]
pub struct HubVendor {
    /// Identifier used in logs.
    id: Uuid,
    /// Vendor name, unique within the hub.
    name: String,
    /// Request type → handler.
    requests: RwLock<HashMap<String, RequestCallback>>,
}

impl HubVendor {
    fn new(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            requests: RwLock::new(HashMap::new()),
        }
    }

    /// Vendor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a handler. Fails if `request_type` is already taken.
    pub fn register_request(&self, request_type: &str, callback: RequestCallback) -> bool {
        let mut requests = self.requests.write().unwrap_or_else(|e| e.into_inner());
        if requests.contains_key(request_type) {
            warn!(
                vendor = %self.name,
                request_type = %request_type,
                "Request type already registered"
            );
            return false;
        }

        requests.insert(request_type.to_string(), callback);
        info!(
            vendor = %self.name,
            vendor_id = %self.id,
            request_type = %request_type,
            "Vendor request registered"
        );
        true
    }

    /// Removes a handler. Fails if `request_type` is not registered.
    pub fn unregister_request(&self, request_type: &str) -> bool {
        let mut requests = self.requests.write().unwrap_or_else(|e| e.into_inner());
        if requests.remove(request_type).is_none() {
            warn!(
                vendor = %self.name,
                request_type = %request_type,
                "Request type not registered"
            );
            return false;
        }

        info!(vendor = %self.name, request_type = %request_type, "Vendor request unregistered");
        true
    }

    /// Returns the handler for `request_type`.
    pub fn request(&self, request_type: &str) -> Option<RequestCallback> {
        let requests = self.requests.read().unwrap_or_else(|e| e.into_inner());
        requests.get(request_type).cloned()
    }

    /// Registered request types, sorted.
    pub fn request_types(&self) -> Vec<String> {
        let requests = self.requests.read().unwrap_or_else(|e| e.into_inner());
        let mut types: Vec<String> = requests.keys().cloned().collect();
        types.sort();
        types
    }
}

/// Registry of vendors keyed by name.
#[derive(Debug, Default)]
pub struct VendorRegistry {
    vendors: RwLock<HashMap<String, Arc<HubVendor>>>,
}

impl VendorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a vendor. Empty and duplicate names are refused.
    pub fn register(&self, name: &str) -> Result<Arc<HubVendor>, AppError> {
        if name.is_empty() {
            return Err(AppError::validation("Vendor name must not be empty"));
        }

        let mut vendors = self.vendors.write().unwrap_or_else(|e| e.into_inner());
        if vendors.contains_key(name) {
            return Err(AppError::conflict(format!(
                "Vendor '{}' is already registered",
                name
            )));
        }

        let vendor = Arc::new(HubVendor::new(name));
        vendors.insert(name.to_string(), vendor.clone());

        info!(vendor = %name, vendor_id = %vendor.id, "Vendor created");
        Ok(vendor)
    }

    /// Looks up a vendor by name.
    pub fn get(&self, name: &str) -> Option<Arc<HubVendor>> {
        let vendors = self.vendors.read().unwrap_or_else(|e| e.into_inner());
        vendors.get(name).cloned()
    }

    /// Vendor names, sorted.
    pub fn names(&self) -> Vec<String> {
        let vendors = self.vendors.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = vendors.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use vendorhub_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_duplicate_and_empty_vendor_names() {
        let registry = VendorRegistry::new();
        registry.register("obs-ndi").expect("first");

        let dup = registry.register("obs-ndi").unwrap_err();
        assert_eq!(dup.kind, ErrorKind::Conflict);
        let empty = registry.register("").unwrap_err();
        assert_eq!(empty.kind, ErrorKind::Validation);
        assert_eq!(registry.names(), vec!["obs-ndi".to_string()]);
    }

    #[test]
    fn test_request_types_unique_per_vendor() {
        let registry = VendorRegistry::new();
        let a = registry.register("a").expect("a");
        let b = registry.register("b").expect("b");

        assert!(a.register_request("ping", RequestCallback::new(|_, _| {})));
        assert!(!a.register_request("ping", RequestCallback::new(|_, _| {})));
        assert!(b.register_request("ping", RequestCallback::new(|_, _| {})));

        assert!(a.unregister_request("ping"));
        assert!(!a.unregister_request("ping"));
        assert!(a.request_types().is_empty());
        assert_eq!(b.request_types(), vec!["ping".to_string()]);
    }
}
