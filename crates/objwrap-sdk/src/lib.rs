//! Objwrap SDK - the native object model as seen by the bridge
//!
//! This crate defines the boundary between the bridge and the native library
//! whose objects it exposes. The native library implements `NativeObject`
//! (and optionally the `PullSink` / `PushSource` capability views); the bridge
//! only ever talks to these traits.
//!
//! # Example
//!
//! ```ignore
//! use objwrap_sdk::{NativeObject, NativeValue, ValueType};
//!
//! fn read_name(obj: &dyn NativeObject) -> Option<String> {
//!     let spec = obj.find_property("name")?;
//!     let mut value = NativeValue::new(spec.value_type);
//!     obj.get_property(&spec.name, &mut value).ok()?;
//!     value.as_str().map(str::to_owned)
//! }
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod caps;
pub mod error;
pub mod object;
pub mod param;
pub mod value;

pub use buffer::{BufferBuilder, FlowReturn, NativeBuffer, PullResult, Sample};
pub use caps::{Caps, ParseCapsError, Structure};
pub use error::{NativeError, NativeResult};
pub use object::{is_pull_capable, is_push_capable, NativeHandle, NativeObject, PullSink, PushSource};
pub use param::{canonical_name, ParamFlags, ParamSpec};
pub use value::{NativeValue, ValueType};
