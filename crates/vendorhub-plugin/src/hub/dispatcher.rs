//! Hub dispatcher — routes requests to vendor handlers and fans events out.
//!
//! Requests run synchronously on the caller's thread. Events are pushed into
//! a broadcast channel; emitting never waits for subscribers, and an emit
//! with nobody listening still succeeds.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use vendorhub_core::{AppError, AppResult};

use super::definitions::VendorEvent;
use super::registry::VendorRegistry;

/// Dispatches vendor requests and events.
#[derive(Debug)]
pub struct HubDispatcher {
    /// Vendor registry.
    registry: Arc<VendorRegistry>,
    /// Event fan-out.
    events: broadcast::Sender<VendorEvent>,
}

impl HubDispatcher {
    /// Creates a dispatcher whose event channel buffers `event_capacity` events
    /// per lagging subscriber.
    pub fn new(registry: Arc<VendorRegistry>, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self { registry, events }
    }

    /// Calls the handler registered by `vendor_name` for `request_type`.
    pub fn call_request(
        &self,
        vendor_name: &str,
        request_type: &str,
        request_data: &Value,
    ) -> AppResult<Value> {
        let vendor = self
            .registry
            .get(vendor_name)
            .ok_or_else(|| AppError::not_found(format!("Vendor '{}' not found", vendor_name)))?;

        let callback = vendor.request(request_type).ok_or_else(|| {
            AppError::not_found(format!(
                "Request type '{}' not registered by vendor '{}'",
                request_type, vendor_name
            ))
        })?;

        debug!(
            vendor = %vendor_name,
            request_type = %request_type,
            "Dispatching vendor request"
        );

        Ok(callback.invoke(request_data))
    }

    /// Broadcasts an event. Returns how many subscribers will see it.
    pub fn emit(&self, event: VendorEvent) -> usize {
        debug!(
            vendor = %event.vendor_name,
            event_type = %event.event_type,
            "Broadcasting vendor event"
        );
        // `send` only fails when there are no receivers.
        self.events.send(event).unwrap_or(0)
    }

    /// Subscribes to every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<VendorEvent> {
        self.events.subscribe()
    }

    /// Returns a reference to the vendor registry.
    pub fn registry(&self) -> &Arc<VendorRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use vendorhub_core::error::ErrorKind;

    use crate::callback::RequestCallback;

    use super::*;

    #[test]
    fn test_call_request_errors() {
        let registry = Arc::new(VendorRegistry::new());
        let dispatcher = HubDispatcher::new(registry.clone(), 4);

        let err = dispatcher.call_request("demo", "ping", &json!({})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        registry.register("demo").expect("vendor");
        let err = dispatcher.call_request("demo", "ping", &json!({})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_call_request_runs_handler() {
        let registry = Arc::new(VendorRegistry::new());
        let vendor = registry.register("demo").expect("vendor");
        vendor.register_request(
            "add",
            RequestCallback::new(|req, res| {
                let sum = req["a"].as_i64().unwrap_or(0) + req["b"].as_i64().unwrap_or(0);
                res["sum"] = json!(sum);
            }),
        );

        let dispatcher = HubDispatcher::new(registry, 4);
        let response = dispatcher
            .call_request("demo", "add", &json!({ "a": 2, "b": 40 }))
            .expect("response");
        assert_eq!(response, json!({ "sum": 42 }));
    }

    #[test]
    fn test_emit_without_subscribers() {
        let dispatcher = HubDispatcher::new(Arc::new(VendorRegistry::new()), 0);
        assert_eq!(dispatcher.emit(VendorEvent::new("demo", "tick", json!(null))), 0);

        let mut rx = dispatcher.subscribe();
        assert_eq!(dispatcher.emit(VendorEvent::new("demo", "tick", json!(1))), 1);
        let event = rx.try_recv().expect("event");
        assert_eq!(event.event_data, json!(1));
    }
}
