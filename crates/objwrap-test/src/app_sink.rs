//! Pull-capable sink fed by the test

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::channel::{self, Receiver, Sender};
use objwrap_sdk::{
    Caps, NativeObject, NativeResult, NativeValue, ParamSpec, PullResult, PullSink, Sample,
    ValueType,
};

use crate::bag::PropertyBag;

/// Sink whose `pull_sample` blocks until the test supplies an outcome.
///
/// Outcomes are delivered in the order they were queued, one per pull.
pub struct FakeAppSink {
    props: PropertyBag,
    queue_tx: Sender<PullResult>,
    queue_rx: Receiver<PullResult>,
    pulls_started: AtomicUsize,
}

impl FakeAppSink {
    /// Sink with the usual application-sink properties
    pub fn new(name: &str) -> Self {
        let (queue_tx, queue_rx) = channel::unbounded();
        Self {
            props: PropertyBag::new("AppSink")
                .with(ParamSpec::read_write("name", ValueType::String), name)
                .with(ParamSpec::read_write("emit-signals", ValueType::Boolean), false)
                .with(ParamSpec::read_write("max-buffers", ValueType::UInt), 0u32)
                .with(ParamSpec::read_write("drop", ValueType::Boolean), false)
                .with(ParamSpec::read_write("sync", ValueType::Boolean), true)
                .with_default(ParamSpec::read_write("caps", ValueType::Caps))
                .with(ParamSpec::read_only("eos", ValueType::Boolean), false)
                .with_default(ParamSpec::read_only(
                    "last-sample",
                    ValueType::Boxed("Sample"),
                )),
            queue_tx,
            queue_rx,
            pulls_started: AtomicUsize::new(0),
        }
    }

    /// Queue a sample for the next pull
    pub fn push_sample(&self, sample: Sample) {
        let _ = self.queue_tx.send(PullResult::Sample(sample));
    }

    /// Queue an end-of-stream outcome and mark the sink as drained
    pub fn end_of_stream(&self) {
        self.props.store("eos", NativeValue::from(true));
        let _ = self.queue_tx.send(PullResult::EndOfStream);
    }

    /// Queue a no-data outcome
    pub fn push_empty(&self) {
        let _ = self.queue_tx.send(PullResult::Empty);
    }

    /// Number of pulls that have entered `pull_sample`
    pub fn pulls_started(&self) -> usize {
        self.pulls_started.load(Ordering::SeqCst)
    }

    /// Property storage
    pub fn props(&self) -> &PropertyBag {
        &self.props
    }

    /// Current `caps` property
    pub fn caps(&self) -> Option<Caps> {
        self.props.value("caps").and_then(|v| v.as_caps().cloned())
    }
}

impl NativeObject for FakeAppSink {
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

impl PullSink for FakeAppSink {
    fn pull_sample(&self) -> PullResult {
        self.pulls_started.fetch_add(1, Ordering::SeqCst);
        // The sink owns a sender, so the queue never disconnects
        self.queue_rx.recv().unwrap_or(PullResult::EndOfStream)
    }
}
