//! Plugin lifecycle — load, a single post-load pass, unload.
//!
//! Vendors may only register from [`VendorPlugin::on_post_load`]. The host
//! runs that hook exactly once per plugin, after every plugin (the hub
//! included) has loaded, and refuses to run it a second time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

use vendorhub_core::{AppError, AppResult};

use crate::vendor::VendorApi;

/// Trait implemented by vendor plugins.
pub trait VendorPlugin: Send + Sync + std::fmt::Debug {
    /// Plugin name, unique within a host.
    fn name(&self) -> &str;

    /// Called when the plugin is loaded. Vendor calls are not allowed yet.
    fn on_load(&self) -> AppResult<()> {
        Ok(())
    }

    /// Called once after all plugins are loaded. Register the vendor here.
    fn on_post_load(&self, api: &VendorApi) -> AppResult<()>;

    /// Called when the plugin is unloaded.
    fn on_unload(&self, _api: &VendorApi) -> AppResult<()> {
        Ok(())
    }
}

/// Where a plugin is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStage {
    /// `on_load` succeeded.
    Loaded,
    /// `on_post_load` succeeded.
    PostLoaded,
    /// `on_post_load` returned an error.
    Failed,
}

#[derive(Debug)]
struct PluginEntry {
    plugin: Arc<dyn VendorPlugin>,
    stage: PluginStage,
}

/// Drives the lifecycle of vendor plugins against one [`VendorApi`].
#[derive(Debug)]
pub struct PluginHost {
    /// Vendor API handed to post-load hooks.
    api: Arc<VendorApi>,
    /// Loaded plugins in load order.
    plugins: Mutex<Vec<PluginEntry>>,
    /// Set once the post-load pass has run.
    post_loaded: AtomicBool,
}

impl PluginHost {
    /// Creates a host with no plugins.
    pub fn new(api: Arc<VendorApi>) -> Self {
        Self {
            api,
            plugins: Mutex::new(Vec::new()),
            post_loaded: AtomicBool::new(false),
        }
    }

    /// Loads a plugin. Must happen before [`Self::post_load`].
    pub fn load(&self, plugin: Arc<dyn VendorPlugin>) -> AppResult<()> {
        if self.post_loaded.load(Ordering::SeqCst) {
            return Err(AppError::conflict(format!(
                "Plugin '{}' loaded after post-load",
                plugin.name()
            )));
        }

        let mut plugins = self.plugins.lock().unwrap_or_else(|e| e.into_inner());
        if plugins.iter().any(|e| e.plugin.name() == plugin.name()) {
            return Err(AppError::conflict(format!(
                "Plugin '{}' is already loaded",
                plugin.name()
            )));
        }

        plugin.on_load().map_err(|e| {
            AppError::plugin(format!("Plugin '{}' load failed: {}", plugin.name(), e))
        })?;

        info!(plugin = %plugin.name(), "Plugin loaded");
        plugins.push(PluginEntry {
            plugin,
            stage: PluginStage::Loaded,
        });
        Ok(())
    }

    /// Runs every plugin's post-load hook, once.
    ///
    /// A failing hook is logged and marks that plugin [`PluginStage::Failed`];
    /// the remaining plugins still run.
    pub fn post_load(&self) -> AppResult<()> {
        if self.post_loaded.swap(true, Ordering::SeqCst) {
            return Err(AppError::conflict("Post-load has already run"));
        }

        let mut plugins = self.plugins.lock().unwrap_or_else(|e| e.into_inner());
        for entry in plugins.iter_mut() {
            match entry.plugin.on_post_load(&self.api) {
                Ok(()) => entry.stage = PluginStage::PostLoaded,
                Err(e) => {
                    error!(plugin = %entry.plugin.name(), error = %e, "Plugin post-load failed");
                    entry.stage = PluginStage::Failed;
                }
            }
        }

        info!(
            plugins = plugins.len(),
            dispatch = ?self.api.dispatch_state(),
            "Post-load complete"
        );
        Ok(())
    }

    /// Unloads every plugin in reverse load order.
    pub fn unload_all(&self) {
        let mut plugins = self.plugins.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(entry) = plugins.pop() {
            if let Err(e) = entry.plugin.on_unload(&self.api) {
                warn!(plugin = %entry.plugin.name(), error = %e, "Plugin unload returned error");
            }
            info!(plugin = %entry.plugin.name(), "Plugin unloaded");
        }
    }

    /// Stage of the named plugin.
    pub fn stage(&self, name: &str) -> Option<PluginStage> {
        let plugins = self.plugins.lock().unwrap_or_else(|e| e.into_inner());
        plugins
            .iter()
            .find(|e| e.plugin.name() == name)
            .map(|e| e.stage)
    }

    /// Loaded plugin names in load order.
    pub fn list(&self) -> Vec<String> {
        let plugins = self.plugins.lock().unwrap_or_else(|e| e.into_inner());
        plugins.iter().map(|e| e.plugin.name().to_string()).collect()
    }

    /// The vendor API handed to plugins.
    pub fn api(&self) -> &Arc<VendorApi> {
        &self.api
    }
}
