//! Pull-capable sink whose pulls always panic

use std::sync::atomic::{AtomicUsize, Ordering};

use objwrap_sdk::{NativeObject, NativeResult, NativeValue, ParamSpec, PullResult, PullSink, ValueType};

use crate::bag::PropertyBag;

/// Sink that panics inside `pull_sample`
pub struct FakeFaultySink {
    props: PropertyBag,
    pulls_started: AtomicUsize,
}

impl FakeFaultySink {
    pub fn new(name: &str) -> Self {
        Self {
            props: PropertyBag::new("FaultySink")
                .with(ParamSpec::read_write("name", ValueType::String), name),
            pulls_started: AtomicUsize::new(0),
        }
    }

    /// Number of pulls that have entered `pull_sample`
    pub fn pulls_started(&self) -> usize {
        self.pulls_started.load(Ordering::SeqCst)
    }
}

impl NativeObject for FakeFaultySink {
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

    fn as_pull_sink(&self) -> Option<&dyn PullSink> {
        Some(self)
    }
}

impl PullSink for FakeFaultySink {
    fn pull_sample(&self) -> PullResult {
        self.pulls_started.fetch_add(1, Ordering::SeqCst);
        panic!("sink failed while pulling");
    }
}
