//! End-to-end vendor API behaviour against the reference hub.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};

use vendorhub_plugin::prelude::*;
use vendorhub_plugin::{DispatchState, ProcHandler, VendorHub, get_registry};

/// Host table with the hub installed.
fn installed() -> (Arc<ProcHandler>, VendorHub, VendorApi) {
    let host = Arc::new(ProcHandler::new());
    let hub = VendorHub::new(16);
    hub.install(&host);
    let api = VendorApi::new(host.clone());
    (host, hub, api)
}

fn record_context(_request: &Value, response: &mut Value, ctx: &Arc<AtomicUsize>) {
    ctx.fetch_add(1, Ordering::SeqCst);
    response["ctx"] = json!(Arc::as_ptr(ctx) as usize);
}

#[test]
fn test_ping_round_trip() {
    let (_host, hub, api) = installed();

    let vendor = api.register_vendor("demo").expect("vendor handle");
    assert_eq!(api.dispatch_state(), DispatchState::Resolved);
    let table = api.dispatch_table().expect("resolved table");
    assert!(Arc::ptr_eq(table, hub.dispatch_table()));

    let ctx = Arc::new(AtomicUsize::new(0));
    let callback = RequestCallback::with_context(ctx.clone(), record_context);
    assert!(api.register_request(Some(&vendor), "ping", &callback));
    assert!(hub.has_request("demo", "ping"));

    let response = hub
        .call_vendor_request("demo", "ping", &json!({}))
        .expect("response");
    assert_eq!(response["ctx"], json!(Arc::as_ptr(&ctx) as usize));
    assert_eq!(ctx.load(Ordering::SeqCst), 1);

    assert!(api.unregister_request(Some(&vendor), "ping"));
    assert!(!hub.has_request("demo", "ping"));
    assert!(hub.call_vendor_request("demo", "ping", &json!({})).is_err());

    // Second removal reports failure but must not panic.
    assert!(!api.unregister_request(Some(&vendor), "ping"));
    assert_eq!(
        api.try_unregister_request(Some(&vendor), "ping"),
        Err(VendorError::RemoteFailure {
            procedure: vendorhub_plugin::ProcedureId::VendorRequestUnregister
        })
    );
}

#[test]
fn test_duplicate_request_type_refused() {
    let (_host, hub, api) = installed();
    let vendor = api.register_vendor("demo").expect("vendor handle");
    let callback = RequestCallback::new(|_, res| res["ok"] = json!(true));

    assert!(api.register_request(Some(&vendor), "ping", &callback));
    assert!(!api.register_request(Some(&vendor), "ping", &callback));
    assert_eq!(hub.request_types("demo"), vec!["ping".to_string()]);
}

#[test]
fn test_invalid_arguments_issue_no_calls() {
    let (_host, hub, api) = installed();
    let vendor = api.register_vendor("demo").expect("vendor handle");
    let table = hub.dispatch_table().clone();
    let before = table.call_count();

    let callback = RequestCallback::new(|_, _| {});
    let data: EventData = Arc::new(json!({}));

    assert!(!api.register_request(None, "ping", &callback));
    assert!(!api.register_request(Some(&vendor), "", &callback));
    assert!(!api.unregister_request(None, "ping"));
    assert!(!api.unregister_request(Some(&vendor), ""));
    assert!(!api.emit_event(None, "tick", &data));
    assert!(!api.emit_event(Some(&vendor), "", &data));
    assert_eq!(
        api.try_emit_event(Some(&vendor), "", &data),
        Err(VendorError::InvalidArgument("event name"))
    );

    assert_eq!(table.call_count(), before);
}

#[test]
fn test_emit_event_keeps_refcount() {
    let (_host, hub, api) = installed();
    let vendor = api.register_vendor("demo").expect("vendor handle");
    let mut events = hub.subscribe();

    let data: EventData = Arc::new(json!({ "scene": "intro" }));
    let before = Arc::strong_count(&data);
    assert!(api.emit_event(Some(&vendor), "scene_changed", &data));
    assert_eq!(Arc::strong_count(&data), before);

    let event = events.try_recv().expect("event");
    assert_eq!(event.vendor_name, "demo");
    assert_eq!(event.event_type, "scene_changed");
    assert_eq!(event.event_data, json!({ "scene": "intro" }));
}

#[test]
fn test_no_hub_installed() {
    let host = Arc::new(ProcHandler::new());
    let api = VendorApi::new(host.clone());

    assert!(get_registry(&host).is_none());
    assert!(get_registry(&host).is_none());

    assert!(api.register_vendor("demo").is_none());
    assert!(api.register_vendor("demo").is_none());
    assert_eq!(api.dispatch_state(), DispatchState::Unavailable);
    assert_eq!(api.resolve_attempts(), 1);

    let calls = host.call_count();
    let callback = RequestCallback::new(|_, _| {});
    let data: EventData = Arc::new(json!(null));
    assert!(!api.register_request(None, "ping", &callback));
    assert!(!api.emit_event(None, "tick", &data));
    assert_eq!(
        api.try_register_request(None, "ping", &callback),
        Err(VendorError::Unavailable)
    );
    assert_eq!(host.call_count(), calls);
}

#[test]
fn test_hub_installed_late_is_not_picked_up() {
    let host = Arc::new(ProcHandler::new());
    let api = VendorApi::new(host.clone());
    assert!(api.register_vendor("demo").is_none());

    let hub = VendorHub::new(4);
    hub.install(&host);
    assert!(api.register_vendor("demo").is_none());
    assert_eq!(api.dispatch_state(), DispatchState::Unavailable);
    assert!(hub.vendor_names().is_empty());

    // A fresh API in the same process does see it.
    let fresh = VendorApi::new(host);
    assert!(fresh.register_vendor("demo").is_some());
}

#[test]
fn test_duplicate_vendor_refused_by_hub() {
    let (_host, hub, api) = installed();
    let first = api.register_vendor("demo");
    assert!(first.is_some());
    assert!(api.register_vendor("demo").is_none());
    assert!(api.register_vendor("").is_none());
    assert_eq!(hub.vendor_names(), vec!["demo".to_string()]);
    assert_eq!(api.resolve_attempts(), 1);
}

#[test]
fn test_vendor_handles_compare_by_identity() {
    let (_host, _hub, api) = installed();
    let a = api.register_vendor("a").expect("a");
    let b = api.register_vendor("b").expect("b");
    assert_eq!(a, a.clone());
    assert_ne!(a, b);
    assert_eq!(
        a.downcast::<vendorhub_plugin::hub::HubVendor>()
            .expect("hub vendor")
            .name(),
        "a"
    );
}

#[tokio::test]
async fn test_subscriber_receives_events_in_order() {
    let (_host, hub, api) = installed();
    let vendor = api.register_vendor("demo").expect("vendor handle");
    let mut events = hub.subscribe();

    for n in 0..3 {
        let data: EventData = Arc::new(json!({ "n": n }));
        assert!(api.emit_event(Some(&vendor), "tick", &data));
    }

    for n in 0..3 {
        let event = tokio::time::timeout(std::time::Duration::from_secs(1), events.recv())
            .await
            .expect("timely")
            .expect("event");
        assert_eq!(event.event_data["n"], json!(n));
    }
}
