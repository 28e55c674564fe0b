//! Request handler capability registered by vendors.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Signature of a request handler: reads the request object and fills in
/// the response object.
pub type RequestHandlerFn = dyn Fn(&Value, &mut Value) + Send + Sync;

/// A request handler together with whatever state it captured.
///
/// Cloning shares the same handler. Registration hands the hub its own
/// clone, so captured state lives as long as either side holds one; the
/// vendor keeps full ownership of anything it shares through an `Arc`.
///
/// Handlers run synchronously on the thread that dispatches the request,
/// which is why they must be `Send + Sync`.
#[derive(Clone)]
pub struct RequestCallback {
    handler: Arc<RequestHandlerFn>,
}

impl RequestCallback {
    /// Wraps a closure.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Value, &mut Value) + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Binds a plain function to a shared context, the equivalent of a
    /// function pointer paired with private data.
    pub fn with_context<C>(context: Arc<C>, handler: fn(&Value, &mut Value, &Arc<C>)) -> Self
    where
        C: Send + Sync + 'static,
    {
        Self::new(move |request, response| handler(request, response, &context))
    }

    /// Runs the handler and returns the response object it produced.
    pub fn invoke(&self, request: &Value) -> Value {
        let mut response = Value::Object(Map::new());
        (self.handler)(request, &mut response);
        response
    }

    /// Whether both values share the same handler.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.handler, &other.handler)
    }
}

impl fmt::Debug for RequestCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCallback")
            .field("handler", &"<closure>")
            .finish()
    }
}
