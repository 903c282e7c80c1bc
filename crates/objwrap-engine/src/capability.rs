//! Capability predicate table
//!
//! Each entry pairs a capability test on the native object with the methods
//! a proxy installs when the test passes. Capabilities are independent: an
//! object passing several tests gets every matching method set.

use objwrap_sdk::{is_pull_capable, is_push_capable, NativeObject};
use rustc_hash::FxHashMap;

use crate::bridge;
use crate::error::BridgeResult;
use crate::proxy::ObjectProxy;
use crate::runtime::{Runtime, Value};

/// A proxy method implementation
pub type Method = fn(&ObjectProxy, &Runtime, &[Value]) -> BridgeResult<Value>;

/// One row of the capability table
pub struct Capability {
    pub name: &'static str,
    pub predicate: fn(&dyn NativeObject) -> bool,
    /// Records this capability in the wrap-time facts
    pub set: fn(&mut Capabilities),
    pub methods: &'static [(&'static str, Method)],
}

/// Every capability a proxy can expose
pub static CAPABILITIES: &[Capability] = &[
    Capability {
        name: "pull",
        predicate: is_pull_capable,
        set: set_pull,
        methods: &[("pull", bridge::pull as Method)],
    },
    Capability {
        name: "push",
        predicate: is_push_capable,
        set: set_push,
        methods: &[
            ("push", bridge::push as Method),
            ("setCapsFromString", bridge::set_caps_from_string as Method),
        ],
    },
];

/// Capability facts of a wrapped object, evaluated once at wrap time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub pull: bool,
    pub push: bool,
}

fn set_pull(caps: &mut Capabilities) {
    caps.pull = true;
}

fn set_push(caps: &mut Capabilities) {
    caps.push = true;
}

/// Evaluate the table against `obj`, returning the facts and the method set
pub(crate) fn detect(obj: &dyn NativeObject) -> (Capabilities, FxHashMap<&'static str, Method>) {
    let mut caps = Capabilities::default();
    let mut methods = FxHashMap::default();
    for capability in CAPABILITIES {
        if !(capability.predicate)(obj) {
            continue;
        }
        (capability.set)(&mut caps);
        methods.extend(capability.methods.iter().copied());
    }
    (caps, methods)
}

#[cfg(test)]
mod tests {
    use super::*;
    use objwrap_test::{FakeAppSink, FakeAppSrc, FakeElement, FakeLoopback};

    fn method_names(obj: &dyn NativeObject) -> Vec<&'static str> {
        let (_, methods) = detect(obj);
        let mut names: Vec<_> = methods.into_keys().collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn test_every_row_records_a_fact() {
        for capability in CAPABILITIES {
            let mut caps = Capabilities::default();
            (capability.set)(&mut caps);
            assert_ne!(caps, Capabilities::default(), "{}", capability.name);
        }
    }

    #[test]
    fn test_plain_element_has_no_methods() {
        let obj = FakeElement::new("Identity", "id0");
        assert_eq!(detect(&obj).0, Capabilities::default());
        assert!(method_names(&obj).is_empty());
    }

    #[test]
    fn test_sink_gets_pull_only() {
        let obj = FakeAppSink::new("sink0");
        assert_eq!(detect(&obj).0, Capabilities { pull: true, push: false });
        assert_eq!(method_names(&obj), vec!["pull"]);
    }

    #[test]
    fn test_source_gets_push_and_caps() {
        let obj = FakeAppSrc::new("src0");
        assert_eq!(detect(&obj).0, Capabilities { pull: false, push: true });
        assert_eq!(method_names(&obj), vec!["push", "setCapsFromString"]);
    }

    #[test]
    fn test_capabilities_combine() {
        let obj = FakeLoopback::new("loop0");
        assert_eq!(detect(&obj).0, Capabilities { pull: true, push: true });
        assert_eq!(method_names(&obj), vec!["pull", "push", "setCapsFromString"]);
    }
}
