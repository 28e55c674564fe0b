//! Vendor and hub configuration.

use serde::{Deserialize, Serialize};

/// Settings for the vendor plugin registered by the demo binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Human-readable vendor name passed to `vendor_register`.
    #[serde(default = "default_vendor_name")]
    pub name: String,
    /// Request types the vendor registers during post-load.
    #[serde(default = "default_request_types")]
    pub request_types: Vec<String>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            name: default_vendor_name(),
            request_types: default_request_types(),
        }
    }
}

/// Settings for the in-process reference hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Whether the hub is installed on the host at all. When `false`,
    /// vendors observe the "feature unavailable" path.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Capacity of the event broadcast channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            event_capacity: default_event_capacity(),
        }
    }
}

fn default_vendor_name() -> String {
    "demo".to_string()
}

fn default_request_types() -> Vec<String> {
    vec!["ping".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_event_capacity() -> usize {
    64
}
