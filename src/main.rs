//! vendorhub demo — installs the reference hub on the process-wide host,
//! loads a demo vendor plugin, and exercises requests and events end to end.

mod demo;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{EnvFilter, fmt};

use vendorhub_core::config::AppConfig;
use vendorhub_core::AppResult;
use vendorhub_plugin::{PluginHost, VendorHub, global_proc_handler, vendor};

use crate::demo::DemoVendor;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Demo error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from an explicit file or the default layered sources.
fn load_configuration() -> AppResult<AppConfig> {
    match std::env::var("VENDORHUB_CONFIG") {
        Ok(path) => AppConfig::load_from(std::path::Path::new(&path)),
        Err(_) => {
            let env =
                std::env::var("VENDORHUB_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> AppResult<()> {
    tracing::info!("Starting vendorhub demo v{}", env!("CARGO_PKG_VERSION"));

    let host = global_proc_handler();
    let hub = if config.hub.enabled {
        let hub = VendorHub::new(config.hub.event_capacity);
        hub.install(host);
        Some(hub)
    } else {
        tracing::info!("Hub disabled by configuration");
        None
    };
    let mut events = hub.as_ref().map(VendorHub::subscribe);

    let plugins = PluginHost::new(vendor::global().clone());
    plugins.load(Arc::new(DemoVendor::new(config.vendor.clone())))?;
    plugins.post_load()?;

    if let Some(hub) = &hub {
        for request_type in &config.vendor.request_types {
            let response = hub.call_vendor_request(
                &config.vendor.name,
                request_type,
                &json!({ "from": "vendorhub-demo" }),
            )?;
            tracing::info!(request_type = %request_type, response = %response, "Vendor request answered");
        }
    }

    if let Some(events) = events.as_mut() {
        loop {
            match tokio::time::timeout(Duration::from_millis(50), events.recv()).await {
                Ok(Ok(event)) => {
                    tracing::info!(event = %serde_json::to_string(&event)?, "Vendor event");
                }
                Ok(Err(RecvError::Lagged(skipped))) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Ok(Err(RecvError::Closed)) | Err(_) => break,
            }
        }
    }

    plugins.unload_all();

    tracing::info!("vendorhub demo finished");
    Ok(())
}
