//! Values the hub hands to the outside world.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event emitted by a vendor, as delivered to hub subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorEvent {
    /// Name of the emitting vendor.
    pub vendor_name: String,
    /// Event name chosen by the vendor.
    pub event_type: String,
    /// Snapshot of the payload taken during the emit call.
    pub event_data: serde_json::Value,
    /// When the hub received the event.
    pub timestamp: DateTime<Utc>,
}

impl VendorEvent {
    /// Creates an event stamped with the current time.
    pub fn new(vendor_name: &str, event_type: &str, event_data: serde_json::Value) -> Self {
        Self {
            vendor_name: vendor_name.to_string(),
            event_type: event_type.to_string(),
            event_data,
            timestamp: Utc::now(),
        }
    }
}
