//! Test doubles for the native object model
//!
//! In-process implementations of `NativeObject` with real property tables and
//! the pull/push capability views, used by the engine's tests and benches in
//! place of a native library.

pub mod app_sink;
pub mod app_src;
pub mod bag;
pub mod element;
pub mod faulty_sink;
pub mod loopback;

pub use app_sink::FakeAppSink;
pub use app_src::FakeAppSrc;
pub use bag::PropertyBag;
pub use element::FakeElement;
pub use faulty_sink::FakeFaultySink;
pub use loopback::FakeLoopback;

use objwrap_sdk::{Caps, NativeBuffer, Sample};

/// Sample carrying `bytes` and caps parsed from `caps`
pub fn sample(bytes: &[u8], caps: &str) -> Sample {
    Sample::new(NativeBuffer::copy_from_slice(bytes), Caps::from_string(caps))
}
