//! Object Proxy Tests
//!
//! Property existence gating and capability gating on wrapped native objects.
//!
//! # Running Tests
//! ```bash
//! cargo test --test proxy_tests
//! ```

use std::sync::Arc;

use objwrap_engine::{ObjectProxy, Runtime, Value};
use objwrap_sdk::{NativeHandle, ParamSpec, ValueType};
use objwrap_test::{FakeAppSink, FakeAppSrc, FakeElement, FakeLoopback};

fn filter() -> Arc<FakeElement> {
    Arc::new(
        FakeElement::new("CapsFilter", "filter0")
            .with_default(ParamSpec::read_write("caps", ValueType::Caps))
            .with(ParamSpec::read_write("qos", ValueType::Boolean), true)
            .with_default(ParamSpec::read_only("parent", ValueType::Object))
            .with_default(ParamSpec::read_only("stats", ValueType::Boxed("Structure"))),
    )
}

// ===== Property existence gating =====

#[test]
fn test_unknown_property_get_is_undefined() {
    let proxy = ObjectProxy::wrap(filter());
    assert!(proxy.get("does-not-exist").is_undefined());
    assert!(proxy.get("").is_undefined());
    assert!(proxy.descriptor("does-not-exist").is_none());
}

#[test]
fn test_unknown_property_set_does_not_mutate() {
    let el = filter();
    let before: Vec<_> = el
        .props()
        .specs()
        .iter()
        .map(|s| el.props().value(&s.name))
        .collect();

    let proxy = ObjectProxy::wrap(el.clone());
    proxy.set("does-not-exist", &Value::from(1));
    proxy.set("qos_level", &Value::Bool(false));

    let after: Vec<_> = el
        .props()
        .specs()
        .iter()
        .map(|s| el.props().value(&s.name))
        .collect();
    assert_eq!(before, after);
    assert_eq!(el.props().set_count(), 0);
}

#[test]
fn test_unsupported_property_type_reads_undefined() {
    let proxy = ObjectProxy::wrap(filter());
    assert!(proxy.get("stats").is_undefined());
    assert!(proxy.get("parent").is_null());
    assert_eq!(proxy.get("qos"), Value::Bool(true));
}

#[test]
fn test_caps_property_as_string() {
    let proxy = ObjectProxy::wrap(filter());
    assert!(proxy.get("caps").is_null());
    proxy.set("caps", &Value::from("video/x-raw, width=(int)640"));
    assert_eq!(proxy.get("caps"), Value::from("video/x-raw, width=(int)640"));
}

#[test]
fn test_object_property_rewraps() {
    let parent: NativeHandle = Arc::new(FakeElement::new("Pipeline", "pipeline0"));
    let child = Arc::new(
        FakeElement::new("Identity", "id0")
            .with_default(ParamSpec::read_write("peer", ValueType::Object)),
    );
    let proxy = ObjectProxy::wrap(child);
    proxy.set("peer", &Value::native(parent.clone()));

    let value = proxy.get("peer");
    let peer = ObjectProxy::from_value(&value).unwrap();
    assert!(Arc::ptr_eq(peer.handle(), &parent));
    assert_eq!(peer.class_name(), "Pipeline");
    assert_eq!(peer.get("name"), Value::from("pipeline0"));
    assert!(ObjectProxy::from_value(&Value::Null).is_none());
}

#[test]
fn test_proxy_keeps_object_alive() {
    let el = filter();
    let weak = Arc::downgrade(&el);
    let proxy = ObjectProxy::wrap(el);
    assert!(weak.upgrade().is_some());
    drop(proxy);
    assert!(weak.upgrade().is_none());
}

// ===== Capability gating =====

#[test]
fn test_plain_object_exposes_only_properties() {
    let proxy = ObjectProxy::wrap(filter());
    assert!(proxy.method_names().is_empty());
    for method in ["pull", "push", "setCapsFromString"] {
        assert!(!proxy.has_method(method));
    }
}

#[test]
fn test_sink_has_pull_but_not_push() {
    let proxy = ObjectProxy::wrap(Arc::new(FakeAppSink::new("sink0")));
    assert_eq!(proxy.method_names(), vec!["pull"]);
    assert!(proxy.capabilities().pull);
    assert!(!proxy.capabilities().push);
}

#[test]
fn test_source_has_push_and_caps_but_not_pull() {
    let rt = Runtime::new().unwrap();
    let proxy = ObjectProxy::wrap(Arc::new(FakeAppSrc::new("src0")));
    assert_eq!(proxy.method_names(), vec!["push", "setCapsFromString"]);
    assert!(proxy
        .call(&rt, "pull", &[Value::function(|_, _| Value::Undefined)])
        .is_err());
}

#[test]
fn test_dual_capability_exposes_all() {
    let proxy = ObjectProxy::wrap(Arc::new(FakeLoopback::new("loop0")));
    assert_eq!(proxy.method_names(), vec!["pull", "push", "setCapsFromString"]);
}

#[test]
fn test_properties_follow_declaration_order() {
    let proxy = ObjectProxy::wrap(Arc::new(FakeAppSrc::new("src0")));
    assert_eq!(
        proxy.property_names(),
        &[
            "name",
            "caps",
            "is-live",
            "format",
            "max-bytes",
            "current-level-bytes",
            "block"
        ]
    );
    assert_eq!(proxy.get("format"), Value::Number(2.0));
    assert_eq!(proxy.get("max_bytes"), Value::Number(200_000.0));
}
