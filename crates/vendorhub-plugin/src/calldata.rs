//! Parameter bag passed across every procedure call.
//!
//! A [`CallData`] is allocated immediately before a call, filled with named
//! fields, handed to the callee by `&mut`, and dropped right after. The
//! callee writes its results back into the same bag.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque shared reference crossing the plugin boundary.
///
/// The receiving side recovers the concrete type with [`CallData::ptr_as`].
pub type Opaque = Arc<dyn Any + Send + Sync>;

/// A typed value stored in a [`CallData`].
#[derive(Clone)]
pub enum CallValue {
    /// UTF-8 string.
    String(String),
    /// Opaque shared reference.
    Ptr(Opaque),
    /// Boolean flag.
    Bool(bool),
}

impl fmt::Debug for CallValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.debug_tuple("String").field(s).finish(),
            Self::Ptr(p) => write!(f, "Ptr({:p})", Arc::as_ptr(p) as *const ()),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
        }
    }
}

/// Ordered name → value container.
///
/// Setting an existing key replaces the value in place, so the original
/// insertion order is kept.
#[derive(Debug, Default)]
pub struct CallData {
    entries: Vec<(String, CallValue)>,
}

impl CallData {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: CallValue) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Sets a string field.
    pub fn set_string(&mut self, key: &str, value: impl Into<String>) {
        self.set(key, CallValue::String(value.into()));
    }

    /// Sets an opaque reference field.
    pub fn set_ptr(&mut self, key: &str, value: Opaque) {
        self.set(key, CallValue::Ptr(value));
    }

    /// Sets a boolean field.
    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, CallValue::Bool(value));
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&CallValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Returns a string field, or `None` if absent or of another type.
    pub fn string(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(CallValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Returns an opaque reference field.
    pub fn ptr(&self, key: &str) -> Option<&Opaque> {
        match self.get(key) {
            Some(CallValue::Ptr(p)) => Some(p),
            _ => None,
        }
    }

    /// Returns an opaque reference field downcast to `T`.
    ///
    /// Returns `None` if the field is missing or holds a different type.
    pub fn ptr_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.ptr(key).cloned().and_then(|p| p.downcast::<T>().ok())
    }

    /// Returns a boolean field. Missing or mistyped fields read as `false`.
    pub fn bool(&self, key: &str) -> bool {
        matches!(self.get(key), Some(CallValue::Bool(true)))
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag has no fields.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
