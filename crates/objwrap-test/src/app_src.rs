//! Push-capable source that captures what it receives

use std::sync::atomic::{AtomicUsize, Ordering};

use objwrap_sdk::{
    Caps, FlowReturn, NativeBuffer, NativeObject, NativeResult, NativeValue, ParamSpec,
    PushSource, ValueType,
};
use parking_lot::Mutex;

use crate::bag::PropertyBag;

/// Source that records every pushed buffer and caps update
pub struct FakeAppSrc {
    props: PropertyBag,
    pushed: Mutex<Vec<NativeBuffer>>,
    flow: Mutex<FlowReturn>,
    caps_updates: AtomicUsize,
}

impl FakeAppSrc {
    /// Source with the usual application-source properties
    pub fn new(name: &str) -> Self {
        Self {
            props: PropertyBag::new("AppSrc")
                .with(ParamSpec::read_write("name", ValueType::String), name)
                .with_default(ParamSpec::read_write("caps", ValueType::Caps))
                .with(ParamSpec::read_write("is-live", ValueType::Boolean), false)
                .with(
                    ParamSpec::read_write("format", ValueType::Enum("Format")),
                    format_value(2),
                )
                .with(ParamSpec::read_write("max-bytes", ValueType::UInt64), 200_000u64)
                .with(ParamSpec::read_only("current-level-bytes", ValueType::UInt64), 0u64)
                .with(ParamSpec::read_write("block", ValueType::Boolean), false),
            pushed: Mutex::new(Vec::new()),
            flow: Mutex::new(FlowReturn::Ok),
            caps_updates: AtomicUsize::new(0),
        }
    }

    /// Flow result returned by subsequent pushes
    pub fn set_flow_return(&self, flow: FlowReturn) {
        *self.flow.lock() = flow;
    }

    /// Buffers received so far, in push order
    pub fn pushed(&self) -> Vec<NativeBuffer> {
        self.pushed.lock().clone()
    }

    /// Caps most recently applied through `set_caps`
    pub fn caps(&self) -> Option<Caps> {
        self.props.value("caps").and_then(|v| v.as_caps().cloned())
    }

    /// Number of `set_caps` calls
    pub fn caps_updates(&self) -> usize {
        self.caps_updates.load(Ordering::SeqCst)
    }

    /// Property storage
    pub fn props(&self) -> &PropertyBag {
        &self.props
    }
}

fn format_value(v: i32) -> NativeValue {
    let mut value = NativeValue::new(ValueType::Enum("Format"));
    let _ = value.set_enum(v);
    value
}

impl NativeObject for FakeAppSrc {
    fn type_name(&self) -> &str {
        self.props.type_name()
    }

    fn list_properties(&self) -> Vec<ParamSpec> {
        self.props.specs()
    }

    fn get_property(&self, name: &str, value: &mut NativeValue) -> NativeResult<()> {
        self.props.get(name, value)
    }

    fn set_property(&self, name: &str, value: &NativeValue) -> NativeResult<()> {
        self.props.set(name, value)
    }

    fn as_push_source(&self) -> Option<&dyn PushSource> {
        Some(self)
    }
}

impl PushSource for FakeAppSrc {
    fn push_buffer(&self, buffer: NativeBuffer) -> FlowReturn {
        let flow = *self.flow.lock();
        if flow.is_ok() {
            let level = {
                let mut pushed = self.pushed.lock();
                pushed.push(buffer);
                pushed.iter().map(|b| b.len() as u64).sum::<u64>()
            };
            self.props.store("current-level-bytes", NativeValue::from(level));
        }
        flow
    }

    fn set_caps(&self, caps: Option<Caps>) {
        let mut value = NativeValue::new(ValueType::Caps);
        let _ = value.set_caps(caps);
        self.props.store("caps", value);
        self.caps_updates.fetch_add(1, Ordering::SeqCst);
    }
}
