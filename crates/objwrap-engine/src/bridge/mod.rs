//! Capability methods installed on proxies
//!
//! `pull` hands the blocking native pull to the IO worker pool and delivers
//! the outcome on the logical thread. `push` and `setCapsFromString` run
//! synchronously on the calling thread.

mod pull;
mod push;

pub(crate) use pull::pull;
pub(crate) use push::{push, set_caps_from_string};

use tracing::warn;

use crate::error::{BridgeError, BridgeResult};
use crate::options::ArgumentPolicy;
use crate::runtime::{Runtime, Value};

/// Apply the runtime's argument policy to a call with a bad argument.
fn reject(
    rt: &Runtime,
    method: &'static str,
    expected: &'static str,
    got: Option<&Value>,
) -> BridgeResult<Value> {
    let got = got.map_or("nothing", Value::type_name);
    match rt.options().argument_policy {
        ArgumentPolicy::Strict => Err(BridgeError::invalid_argument(method, expected, got)),
        ArgumentPolicy::Lenient => {
            warn!(method, expected, got, "ignoring call with invalid argument");
            Ok(Value::Undefined)
        }
    }
}
