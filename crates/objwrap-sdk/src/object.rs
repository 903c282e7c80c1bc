//! Native object interface
//!
//! `NativeObject` is the surface the bridge programs against. The native
//! library provides the concrete implementations; the bridge never depends on
//! them directly. Capabilities beyond plain properties are exposed as optional
//! views (`as_pull_sink`, `as_push_source`) so that a single object may offer
//! any combination of them.

use std::sync::Arc;

use crate::buffer::{FlowReturn, NativeBuffer, PullResult};
use crate::caps::Caps;
use crate::error::NativeResult;
use crate::param::{canonical_name, ParamSpec};
use crate::value::NativeValue;

/// Shared handle to a native object.
///
/// Lifetime is governed by reference counting; holders of a handle keep the
/// object alive.
pub type NativeHandle = Arc<dyn NativeObject>;

/// An instance in the native object graph.
///
/// Implementations must be safe to call from several threads at once: the
/// bridge reads properties on its logical thread while a pull may be blocked
/// on a worker thread.
pub trait NativeObject: Send + Sync {
    /// Registered name of the object's concrete type
    fn type_name(&self) -> &str;

    /// Property specifications of the object's concrete type
    fn list_properties(&self) -> Vec<ParamSpec>;

    /// Find a property specification by name (`_` and `-` are interchangeable)
    fn find_property(&self, name: &str) -> Option<ParamSpec> {
        let name = canonical_name(name);
        self.list_properties().into_iter().find(|spec| spec.name == name)
    }

    /// Read a property into `value`, which the caller has initialized to the
    /// property's declared type
    fn get_property(&self, name: &str, value: &mut NativeValue) -> NativeResult<()>;

    /// Write a property from a container of the property's declared type
    fn set_property(&self, name: &str, value: &NativeValue) -> NativeResult<()>;

    /// Pull capability view
    fn as_pull_sink(&self) -> Option<&dyn PullSink> {
        None
    }

    /// Push capability view
    fn as_push_source(&self) -> Option<&dyn PushSource> {
        None
    }
}

/// An object from which samples can be pulled
pub trait PullSink: Send + Sync {
    /// Block until a sample is available, the stream ends, or the sink gives
    /// up without data
    fn pull_sample(&self) -> PullResult;
}

/// An object into which buffers can be pushed
pub trait PushSource: Send + Sync {
    /// Hand a buffer to the pipeline; ownership transfers with the call
    fn push_buffer(&self, buffer: NativeBuffer) -> FlowReturn;

    /// Replace the format of subsequently pushed buffers; `None` clears it
    fn set_caps(&self, caps: Option<Caps>);
}

/// Whether `obj` exposes the pull capability
pub fn is_pull_capable(obj: &dyn NativeObject) -> bool {
    obj.as_pull_sink().is_some()
}

/// Whether `obj` exposes the push capability
pub fn is_push_capable(obj: &dyn NativeObject) -> bool {
    obj.as_push_source().is_some()
}
