use objwrap_sdk::Caps;
use tracing::{debug, trace, warn};

use super::reject;
use crate::error::BridgeResult;
use crate::marshal;
use crate::proxy::ObjectProxy;
use crate::runtime::{Runtime, Value};

/// `push(buffer)`: copy the bytes into a native buffer and hand it to the
/// source. Returns after the native push returns.
pub(crate) fn push(proxy: &ObjectProxy, rt: &Runtime, args: &[Value]) -> BridgeResult<Value> {
    let bytes = match args.first() {
        Some(Value::Buffer(bytes)) => bytes,
        other => return reject(rt, "push", "buffer", other),
    };
    let Some(source) = proxy.handle().as_push_source() else {
        return Ok(Value::Undefined);
    };

    let buffer = marshal::bytes_to_native(&bytes.borrow())?;
    let len = buffer.len();
    let flow = source.push_buffer(buffer);
    if flow.is_ok() {
        trace!(class = proxy.class_name(), len, "buffer pushed");
    } else {
        warn!(class = proxy.class_name(), len, %flow, "native source rejected buffer");
    }
    Ok(Value::Undefined)
}

/// `setCapsFromString(caps)`: parse and apply a format description.
///
/// A string that does not parse clears the source's caps.
pub(crate) fn set_caps_from_string(
    proxy: &ObjectProxy,
    rt: &Runtime,
    args: &[Value],
) -> BridgeResult<Value> {
    let text = match args.first() {
        Some(Value::String(text)) => text,
        other => return reject(rt, "setCapsFromString", "string", other),
    };
    let Some(source) = proxy.handle().as_push_source() else {
        return Ok(Value::Undefined);
    };

    let caps = Caps::from_string(text);
    if caps.is_none() {
        debug!(class = proxy.class_name(), caps = %text, "caps string did not parse");
    }
    source.set_caps(caps);
    Ok(Value::Undefined)
}
