//! Demo vendor plugin — answers its configured request types and announces
//! itself with a `vendor_ready` event.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use serde_json::{Value, json};
use tracing::{info, warn};

use vendorhub_core::config::vendor::VendorConfig;
use vendorhub_plugin::prelude::*;

/// Vendor plugin driven by [`VendorConfig`].
#[derive(Debug)]
pub struct DemoVendor {
    /// Vendor settings.
    config: VendorConfig,
    /// Handle obtained during post-load.
    handle: OnceLock<VendorHandle>,
    /// Requests answered so far; shared with every registered handler.
    answered: Arc<AtomicU64>,
}

impl DemoVendor {
    /// Creates the plugin. Nothing is registered until post-load.
    pub fn new(config: VendorConfig) -> Self {
        Self {
            config,
            handle: OnceLock::new(),
            answered: Arc::new(AtomicU64::new(0)),
        }
    }
}

fn answer(request: &Value, response: &mut Value, answered: &Arc<AtomicU64>) {
    let count = answered.fetch_add(1, Ordering::SeqCst) + 1;
    response["pong"] = json!(true);
    response["count"] = json!(count);
    response["echo"] = request.clone();
}

impl VendorPlugin for DemoVendor {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn on_post_load(&self, api: &VendorApi) -> AppResult<()> {
        let Some(vendor) = api.register_vendor(&self.config.name) else {
            warn!(vendor = %self.config.name, "Vendor features disabled");
            return Ok(());
        };
        // Unload needs the handle even when a later registration fails.
        self.handle
            .set(vendor.clone())
            .map_err(|_| AppError::conflict("Demo vendor registered twice"))?;

        for request_type in &self.config.request_types {
            let callback = RequestCallback::with_context(self.answered.clone(), answer);
            api.try_register_request(Some(&vendor), request_type, &callback)?;
        }

        let data: EventData = Arc::new(json!({ "requestTypes": self.config.request_types }));
        api.try_emit_event(Some(&vendor), "vendor_ready", &data)?;

        info!(
            vendor = %self.config.name,
            requests = self.config.request_types.len(),
            "Demo vendor ready"
        );
        Ok(())
    }

    fn on_unload(&self, api: &VendorApi) -> AppResult<()> {
        let Some(vendor) = self.handle.get() else {
            return Ok(());
        };

        for request_type in &self.config.request_types {
            if !api.unregister_request(Some(vendor), request_type) {
                warn!(request_type = %request_type, "Request was not registered");
            }
        }
        info!(
            vendor = %self.config.name,
            answered = self.answered.load(Ordering::SeqCst),
            "Demo vendor unloaded"
        );
        Ok(())
    }
}
