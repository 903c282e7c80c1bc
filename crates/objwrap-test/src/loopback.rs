//! Object with both capabilities: what is pushed can be pulled back

use crossbeam::channel::{self, Receiver, Sender};
use objwrap_sdk::{
    Caps, FlowReturn, NativeBuffer, NativeObject, NativeResult, NativeValue, ParamSpec,
    PullResult, PullSink, PushSource, Sample, ValueType,
};
use parking_lot::Mutex;

use crate::bag::PropertyBag;

/// Pushed buffers are re-emitted as samples carrying the caps that were
/// current at push time.
pub struct FakeLoopback {
    props: PropertyBag,
    caps: Mutex<Option<Caps>>,
    tx: Sender<PullResult>,
    rx: Receiver<PullResult>,
}

impl FakeLoopback {
    pub fn new(name: &str) -> Self {
        let (tx, rx) = channel::unbounded();
        Self {
            props: PropertyBag::new("Loopback")
                .with(ParamSpec::read_write("name", ValueType::String), name)
                .with(ParamSpec::read_only("queued", ValueType::UInt), 0u32),
            caps: Mutex::new(None),
            tx,
            rx,
        }
    }

    /// Close the stream; the next pull after the queued samples reports
    /// end-of-stream
    pub fn finish(&self) {
        let _ = self.tx.send(PullResult::EndOfStream);
    }

    fn update_queued(&self) {
        self.props
            .store("queued", NativeValue::from(self.rx.len() as u32));
    }
}

impl NativeObject for FakeLoopback {
    fn type_name(&self) -> &str {
        self.props.type_name()
    }

    fn list_properties(&self) -> Vec<ParamSpec> {
        self.props.specs()
    }

    fn get_property(&self, name: &str, value: &mut NativeValue) -> NativeResult<()> {
        self.update_queued();
        self.props.get(name, value)
    }

    fn set_property(&self, name: &str, value: &NativeValue) -> NativeResult<()> {
        self.props.set(name, value)
    }

    fn as_pull_sink(&self) -> Option<&dyn PullSink> {
        Some(self)
    }

    fn as_push_source(&self) -> Option<&dyn PushSource> {
        Some(self)
    }
}

impl PullSink for FakeLoopback {
    fn pull_sample(&self) -> PullResult {
        self.rx.recv().unwrap_or(PullResult::EndOfStream)
    }
}

impl PushSource for FakeLoopback {
    fn push_buffer(&self, buffer: NativeBuffer) -> FlowReturn {
        let caps = self.caps.lock().clone();
        match self.tx.send(PullResult::Sample(Sample::new(buffer, caps))) {
            Ok(()) => FlowReturn::Ok,
            Err(_) => FlowReturn::Eos,
        }
    }

    fn set_caps(&self, caps: Option<Caps>) {
        *self.caps.lock() = caps;
    }
}
