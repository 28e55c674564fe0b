//! Registry accessor — resolves the hub's dispatch table and caches it.
//!
//! Resolution moves forward only:
//!
//! ```text
//! Unresolved ──resolve──▶ Resolved     (hub answered with a table)
//!            └─resolve──▶ Unavailable  (hub absent; never retried)
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::host::ProcHandler;
use crate::procedure::{self, GetDispatchTable, ProcedureId};

/// Observable state of a [`DispatchCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    /// No resolution attempted yet.
    Unresolved,
    /// The hub's dispatch table is cached.
    Resolved,
    /// The hub was absent when resolution ran.
    Unavailable,
}

/// Asks `host` for the hub's dispatch table.
///
/// Returns `None` when no hub is installed. This is a normal outcome that
/// disables vendor features, not an error. Nothing is cached here.
pub fn get_registry(host: &ProcHandler) -> Option<Arc<ProcHandler>> {
    let table = procedure::invoke(host, &GetDispatchTable, None);
    if table.is_none() {
        debug!(
            procedure = %ProcedureId::GetDispatchTable,
            "Unable to fetch vendor dispatch table. Hub not installed?"
        );
    }
    table
}

/// Process-lifetime cache for the dispatch table.
///
/// The first resolution wins, whether it found a table or not. Concurrent
/// first callers block until the winner finishes, so the host is asked at
/// most once per cell.
#[derive(Debug, Default)]
pub struct DispatchCell {
    table: OnceLock<Option<Arc<ProcHandler>>>,
    attempts: AtomicUsize,
}

impl DispatchCell {
    /// Creates an unresolved cell.
    pub const fn new() -> Self {
        Self {
            table: OnceLock::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Current state.
    pub fn state(&self) -> DispatchState {
        match self.table.get() {
            None => DispatchState::Unresolved,
            Some(Some(_)) => DispatchState::Resolved,
            Some(None) => DispatchState::Unavailable,
        }
    }

    /// The cached table, if resolved.
    pub fn get(&self) -> Option<&Arc<ProcHandler>> {
        self.table.get().and_then(Option::as_ref)
    }

    /// Resolves against `host` on first use; returns the cached outcome afterwards.
    pub fn resolve(&self, host: &ProcHandler) -> Option<&Arc<ProcHandler>> {
        self.table
            .get_or_init(|| {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                let table = get_registry(host);
                match &table {
                    Some(_) => info!("Vendor dispatch table resolved"),
                    None => debug!("Vendor features disabled for this process"),
                }
                table
            })
            .as_ref()
    }

    /// How many times resolution actually ran. Never more than one.
    pub fn resolve_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}
