//! Host procedure table — named procedures callable across plugins.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, RwLock};

use tracing::{debug, trace};

use crate::calldata::CallData;

/// A procedure body. Reads its inputs from the bag and writes results back.
pub type ProcFn = Arc<dyn Fn(&mut CallData) + Send + Sync>;

/// Table of named procedures.
///
/// The host runtime owns one of these for the whole process; the hub owns
/// another one (the dispatch table) and publishes it through the host's.
pub struct ProcHandler {
    /// Procedure name → body.
    procs: RwLock<HashMap<String, ProcFn>>,
    /// Number of calls issued against this table, found or not.
    calls: AtomicU64,
}

impl ProcHandler {
    /// Creates an empty procedure table.
    pub fn new() -> Self {
        Self {
            procs: RwLock::new(HashMap::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Adds a procedure, replacing any existing one with the same name.
    pub fn add<F>(&self, name: &str, proc_fn: F)
    where
        F: Fn(&mut CallData) + Send + Sync + 'static,
    {
        let mut procs = self.procs.write().unwrap_or_else(|e| e.into_inner());
        if procs.insert(name.to_string(), Arc::new(proc_fn)).is_some() {
            debug!(procedure = %name, "Procedure replaced");
        }
    }

    /// Removes a procedure. Returns whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        let mut procs = self.procs.write().unwrap_or_else(|e| e.into_inner());
        procs.remove(name).is_some()
    }

    /// Whether a procedure with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        let procs = self.procs.read().unwrap_or_else(|e| e.into_inner());
        procs.contains_key(name)
    }

    /// Calls a procedure synchronously.
    ///
    /// Returns `false` when no procedure is registered under `name`; the
    /// bag is left untouched in that case.
    pub fn call(&self, name: &str, cd: &mut CallData) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);

        // Clone out of the lock so procedures may call back into this table.
        let proc_fn = {
            let procs = self.procs.read().unwrap_or_else(|e| e.into_inner());
            procs.get(name).cloned()
        };

        match proc_fn {
            Some(proc_fn) => {
                trace!(procedure = %name, "Calling procedure");
                proc_fn(cd);
                true
            }
            None => false,
        }
    }

    /// Number of calls issued so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Registered procedure names, sorted.
    pub fn names(&self) -> Vec<String> {
        let procs = self.procs.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = procs.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ProcHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProcHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcHandler")
            .field("procs", &self.names())
            .field("calls", &self.call_count())
            .finish()
    }
}

/// The host runtime's own procedure table, shared by every plugin in the process.
pub fn global_proc_handler() -> &'static Arc<ProcHandler> {
    static HOST: OnceLock<Arc<ProcHandler>> = OnceLock::new();
    HOST.get_or_init(|| Arc::new(ProcHandler::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_missing_counts_and_fails() {
        let ph = ProcHandler::new();
        let mut cd = CallData::new();

        assert!(!ph.call("absent", &mut cd));
        assert!(cd.is_empty());
        assert_eq!(ph.call_count(), 1);
    }

    #[test]
    fn test_call_writes_back() {
        let ph = ProcHandler::new();
        ph.add("double", |cd| {
            let doubled = format!("{0}{0}", cd.string("in").unwrap_or_default());
            cd.set_string("out", doubled);
        });

        let mut cd = CallData::new();
        cd.set_string("in", "ab");
        assert!(ph.call("double", &mut cd));
        assert_eq!(cd.string("out"), Some("abab"));
        assert_eq!(ph.names(), vec!["double".to_string()]);
    }

    #[test]
    fn test_reentrant_call() {
        let ph = Arc::new(ProcHandler::new());
        ph.add("inner", |cd| cd.set_bool("inner", true));

        let weak = Arc::downgrade(&ph);
        ph.add("outer", move |cd| {
            if let Some(ph) = weak.upgrade() {
                ph.call("inner", cd);
            }
        });

        let mut cd = CallData::new();
        assert!(ph.call("outer", &mut cd));
        assert!(cd.bool("inner"));
        assert!(ph.remove("outer"));
        assert!(!ph.contains("outer"));
    }
}
