//! Objwrap engine - exposes native objects to a single-threaded dynamic runtime
//!
//! The engine has four parts:
//!
//! - [`marshal`]: conversions between `NativeValue` containers and dynamic
//!   [`Value`]s, plus buffer, sample and metadata conversion
//! - [`proxy`]: [`ObjectProxy`], a property descriptor table and method set
//!   built once per wrapped object
//! - [`capability`]: the table deciding which methods a proxy installs
//! - the bridge methods themselves (`pull`, `push`, `setCapsFromString`),
//!   reached through [`ObjectProxy::call`]
//!
//! All dynamic values live on the thread owning the [`Runtime`]. The only
//! work that leaves it is the blocking native pull, run on the runtime's IO
//! worker pool.
//!
//! # Example
//!
//! ```ignore
//! use objwrap_engine::{ObjectProxy, Runtime, Value};
//!
//! let rt = Runtime::new()?;
//! let sink = ObjectProxy::wrap(handle);
//! sink.set("max-buffers", &Value::from(4));
//! sink.call(&rt, "pull", &[Value::function(|_, args| {
//!     println!("status: {:?}", args[2]);
//!     Value::Undefined
//! })])?;
//! rt.run_until_idle();
//! ```

mod bridge;
pub mod capability;
pub mod defaults;
pub mod error;
pub mod marshal;
pub mod options;
pub mod proxy;
pub mod runtime;

pub use capability::{Capabilities, Capability, Method, CAPABILITIES};
pub use error::{BridgeError, BridgeResult};
pub use options::{ArgumentPolicy, RuntimeOptions};
pub use proxy::{ObjectProxy, PropertyDescriptor};
pub use runtime::{BufferRef, FunctionRef, NativeRef, ObjectRef, Runtime, TaskId, Value};
