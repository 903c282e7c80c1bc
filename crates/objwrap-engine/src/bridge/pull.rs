use objwrap_sdk::PullResult;
use tracing::{debug, warn};

use super::reject;
use crate::error::BridgeResult;
use crate::marshal;
use crate::proxy::ObjectProxy;
use crate::runtime::{Runtime, Value};

/// `pull(callback)`: schedule a blocking pull and return immediately.
///
/// `callback(buffer, metadata, status)` runs exactly once on the logical
/// thread. Without a sample, `buffer` is `null` and `metadata` an empty
/// object; `status` is `"sample"`, `"eos"` or `"empty"`.
pub(crate) fn pull(proxy: &ObjectProxy, rt: &Runtime, args: &[Value]) -> BridgeResult<Value> {
    let callback = match args.first() {
        Some(f @ Value::Function(_)) => f.clone(),
        other => return reject(rt, "pull", "function", other),
    };

    // The worker gets its own strong reference; dynamic values stay here
    let handle = proxy.handle().clone();
    let task = rt.spawn_blocking(
        move || match handle.as_pull_sink() {
            Some(sink) => sink.pull_sample(),
            None => PullResult::Empty,
        },
        move |rt, result| deliver(rt, &callback, result),
    )?;
    debug!(class = proxy.class_name(), %task, "pull scheduled");
    Ok(Value::Undefined)
}

fn deliver(rt: &Runtime, callback: &Value, result: BridgeResult<PullResult>) {
    let outcome = result.unwrap_or_else(|err| {
        warn!(error = %err, "pull failed on worker, delivering empty result");
        PullResult::Empty
    });
    let status = outcome.status();
    let (buffer, metadata) = match outcome {
        PullResult::Sample(sample) => marshal::sample_to_dynamic(sample),
        PullResult::EndOfStream | PullResult::Empty => (Value::Null, Value::empty_object()),
    };
    debug!(status, "delivering pull result");
    rt.call(callback, &[buffer, metadata, Value::string(status)]);
}

