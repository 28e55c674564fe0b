//! Process-wide API. Kept to a single test: the global host and dispatch
//! cell are shared by everything in this test binary.

use std::sync::Arc;

use serde_json::json;

use vendorhub_plugin::vendor::{self, emit_event, register_request, register_vendor};
use vendorhub_plugin::{
    DispatchState, EventData, RequestCallback, VendorHub, get_registry, global_proc_handler,
};

#[test]
fn test_global_api_without_hub_stays_unavailable() {
    let host = global_proc_handler();
    assert!(get_registry(host).is_none());

    assert!(register_vendor("demo").is_none());
    assert_eq!(vendor::global().dispatch_state(), DispatchState::Unavailable);

    // Installing the hub afterwards does not revive this process's cell.
    let hub = VendorHub::new(4);
    hub.install(host);
    assert!(get_registry(host).is_some());
    assert!(register_vendor("demo").is_none());
    assert_eq!(vendor::global().resolve_attempts(), 1);

    let table_calls = hub.dispatch_table().call_count();
    let callback = RequestCallback::new(|_, _| {});
    let data: EventData = Arc::new(json!({}));
    assert!(!register_request(None, "ping", &callback));
    assert!(!emit_event(None, "tick", &data));
    assert_eq!(hub.dispatch_table().call_count(), table_calls);
    assert_eq!(Arc::strong_count(&data), 1);
}
