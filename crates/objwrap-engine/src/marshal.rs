//! Value marshalling between native containers and dynamic values
//!
//! Conversions are lenient in both directions. `to_native` always returns a
//! container initialized to the requested type; a dynamic value it cannot
//! represent leaves the zero value in place. `try_to_native` reports that
//! case as an error instead. `from_native` maps types it does not support to
//! `Undefined`.

use indexmap::IndexMap;
use objwrap_sdk::{
    Caps, NativeBuffer, NativeError, NativeResult, NativeValue, Sample, Structure, ValueType,
};
use tracing::trace;

use crate::defaults::MAX_SAFE_INTEGER;
use crate::runtime::Value;

// ============================================================================
// Dynamic → native
// ============================================================================

/// Convert `value` into a container of the declared type `ty`
pub fn to_native(value: &Value, ty: ValueType) -> NativeValue {
    try_to_native(value, ty).unwrap_or_else(|err| {
        trace!(target_type = %ty, got = value.type_name(), error = %err, "value left at zero");
        let mut out = NativeValue::default();
        let _ = out.init(ty);
        out
    })
}

/// Like [`to_native`], but fails when `value` has no representation in `ty`
pub fn try_to_native(value: &Value, ty: ValueType) -> NativeResult<NativeValue> {
    let mut out = NativeValue::default();
    out.init(ty)?;
    store(&mut out, value)?;
    Ok(out)
}

macro_rules! saturate {
    ($v:expr, $t:ty) => {
        $v.clamp(<$t>::MIN as i128, <$t>::MAX as i128) as $t
    };
}

fn store(out: &mut NativeValue, value: &Value) -> NativeResult<()> {
    let ty = out.value_type();
    let mismatch = || NativeError::mismatch(ty, value.type_name());
    match ty {
        ValueType::Boolean => out.set_bool(truthy(value).ok_or_else(mismatch)?),
        ValueType::Char => out.set_char(saturate!(integer(value).ok_or_else(mismatch)?, i8)),
        ValueType::UChar => out.set_uchar(saturate!(integer(value).ok_or_else(mismatch)?, u8)),
        ValueType::Int => out.set_int(saturate!(integer(value).ok_or_else(mismatch)?, i32)),
        ValueType::UInt => out.set_uint(saturate!(integer(value).ok_or_else(mismatch)?, u32)),
        ValueType::Long => out.set_long(saturate!(integer(value).ok_or_else(mismatch)?, i64)),
        ValueType::ULong => out.set_ulong(saturate!(integer(value).ok_or_else(mismatch)?, u64)),
        ValueType::Int64 => out.set_int64(saturate!(integer(value).ok_or_else(mismatch)?, i64)),
        ValueType::UInt64 => {
            out.set_uint64(saturate!(integer(value).ok_or_else(mismatch)?, u64))
        }
        ValueType::Enum(_) => out.set_enum(saturate!(integer(value).ok_or_else(mismatch)?, i32)),
        ValueType::Flags(_) => {
            out.set_flags(saturate!(integer(value).ok_or_else(mismatch)?, u32))
        }
        ValueType::Float => out.set_float(number(value).ok_or_else(mismatch)? as f32),
        ValueType::Double => out.set_double(number(value).ok_or_else(mismatch)?),
        ValueType::String => match value {
            Value::String(s) => out.set_string(Some(&**s)),
            Value::Null | Value::Undefined => out.set_string(None),
            _ => Err(mismatch()),
        },
        ValueType::Object => match value {
            Value::Native(obj) => out.set_object(Some(obj.handle().clone())),
            Value::Null | Value::Undefined => out.set_object(None),
            _ => Err(mismatch()),
        },
        ValueType::Caps => match value {
            Value::String(s) => out.set_caps(Some(Caps::from_string(s).ok_or_else(mismatch)?)),
            Value::Null | Value::Undefined => out.set_caps(None),
            _ => Err(mismatch()),
        },
        ValueType::Fraction | ValueType::Pointer | ValueType::Boxed(_) | ValueType::Invalid => {
            Err(mismatch())
        }
    }
}

fn truthy(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(*n != 0.0 && !n.is_nan()),
        Value::BigInt(i) => Some(*i != 0),
        _ => None,
    }
}

/// Integer view of a dynamic value: numbers truncate toward zero, non-finite
/// numbers become 0.
fn integer(value: &Value) -> Option<i128> {
    match value {
        Value::Number(n) => Some(truncate(*n)),
        Value::BigInt(i) => Some(*i),
        Value::Bool(b) => Some(*b as i128),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i128>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(truncate))
        }
        _ => None,
    }
}

fn truncate(n: f64) -> i128 {
    if n.is_finite() {
        n.trunc() as i128
    } else {
        0
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::BigInt(i) => Some(*i as f64),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

// ============================================================================
// Native → dynamic
// ============================================================================

/// Convert a container into a dynamic value.
///
/// Fraction, pointer, boxed and uninitialized containers yield `Undefined`.
pub fn from_native(value: &NativeValue) -> Value {
    let converted = match value.value_type() {
        ValueType::Boolean => value.as_bool().map(Value::Bool),
        ValueType::Char => value.as_char().map(|v| Value::Number(v as f64)),
        ValueType::UChar => value.as_uchar().map(|v| Value::Number(v as f64)),
        ValueType::Int => value.as_int().map(|v| Value::Number(v as f64)),
        ValueType::UInt => value.as_uint().map(|v| Value::Number(v as f64)),
        ValueType::Long => value.as_long().map(signed_wide),
        ValueType::ULong => value.as_ulong().map(unsigned_wide),
        ValueType::Int64 => value.as_int64().map(signed_wide),
        ValueType::UInt64 => value.as_uint64().map(unsigned_wide),
        ValueType::Enum(_) => value.as_enum().map(|v| Value::Number(v as f64)),
        ValueType::Flags(_) => value.as_flags().map(|v| Value::Number(v as f64)),
        ValueType::Float => value.as_float().map(|v| Value::Number(v as f64)),
        ValueType::Double => value.as_double().map(Value::Number),
        ValueType::String => Some(value.as_str().map_or(Value::Null, Value::string)),
        ValueType::Object => Some(
            value
                .as_object()
                .map_or(Value::Null, |obj| Value::native(obj.clone())),
        ),
        ValueType::Caps => Some(
            value
                .as_caps()
                .map_or(Value::Null, |caps| Value::from(caps.to_string())),
        ),
        ValueType::Fraction | ValueType::Pointer | ValueType::Boxed(_) | ValueType::Invalid => {
            None
        }
    };
    converted.unwrap_or_default()
}

fn signed_wide(v: i64) -> Value {
    if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&v) {
        Value::Number(v as f64)
    } else {
        Value::BigInt(v as i128)
    }
}

fn unsigned_wide(v: u64) -> Value {
    if v <= MAX_SAFE_INTEGER as u64 {
        Value::Number(v as f64)
    } else {
        Value::BigInt(v as i128)
    }
}

// ============================================================================
// Buffers, samples and metadata
// ============================================================================

/// Metadata field conversion; `None` means the field is left out of the map
pub fn metadata_field_to_dynamic(value: &NativeValue) -> Option<Value> {
    match from_native(value) {
        Value::Undefined => None,
        converted => Some(converted),
    }
}

/// Convert a structure into an ordered map, dropping unsupported fields
pub fn structure_to_dynamic(structure: &Structure) -> Value {
    let mut map = IndexMap::with_capacity(structure.len());
    for (key, field) in structure.fields() {
        match metadata_field_to_dynamic(field) {
            Some(v) => {
                map.insert(key.to_string(), v);
            }
            None => trace!(key, field_type = %field.value_type(), "metadata field dropped"),
        }
    }
    Value::object(map)
}

/// Copy a native buffer into a dynamic buffer
pub fn buffer_to_dynamic(buffer: &NativeBuffer) -> Value {
    Value::buffer(buffer.as_slice())
}

/// Copy bytes into a newly allocated native buffer
pub fn bytes_to_native(bytes: &[u8]) -> NativeResult<NativeBuffer> {
    let mut builder = NativeBuffer::allocate(bytes.len());
    builder.fill(0, bytes)?;
    Ok(builder.finish())
}

/// Convert a pulled sample into `(buffer, metadata)`.
///
/// The sample is consumed: its native references are released when this
/// returns. A sample without a buffer yields `Null`; without caps, an empty
/// map. Only the first caps structure describes the sample's format.
pub fn sample_to_dynamic(sample: Sample) -> (Value, Value) {
    let buffer = sample
        .buffer
        .as_ref()
        .map_or(Value::Null, buffer_to_dynamic);
    let metadata = sample
        .caps
        .as_ref()
        .and_then(|caps| caps.structure(0))
        .map_or_else(Value::empty_object, structure_to_dynamic);
    (buffer, metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_targets_truncate_and_saturate() {
        assert_eq!(to_native(&Value::from(3.9), ValueType::Int).as_int(), Some(3));
        assert_eq!(to_native(&Value::from(-3.9), ValueType::Int).as_int(), Some(-3));
        assert_eq!(to_native(&Value::from(300), ValueType::UChar).as_uchar(), Some(255));
        assert_eq!(to_native(&Value::from(-1), ValueType::UInt).as_uint(), Some(0));
        assert_eq!(
            to_native(&Value::Number(f64::INFINITY), ValueType::Int64).as_int64(),
            Some(0)
        );
        assert_eq!(
            to_native(&Value::BigInt(1 << 70), ValueType::UInt64).as_uint64(),
            Some(u64::MAX)
        );
        assert_eq!(to_native(&Value::Bool(true), ValueType::Int).as_int(), Some(1));
        assert_eq!(to_native(&Value::from(" 42 "), ValueType::Int).as_int(), Some(42));
    }

    #[test]
    fn test_mismatch_leaves_zero_value() {
        let out = to_native(&Value::from("not a number"), ValueType::Int);
        assert_eq!(out.value_type(), ValueType::Int);
        assert_eq!(out.as_int(), Some(0));

        let out = to_native(&Value::from(1.0), ValueType::String);
        assert_eq!(out.value_type(), ValueType::String);
        assert_eq!(out.as_str(), None);

        let out = to_native(&Value::from(1.0), ValueType::Fraction);
        assert_eq!(out.value_type(), ValueType::Fraction);
    }

    #[test]
    fn test_wide_integers_become_bigint() {
        let safe = NativeValue::from(MAX_SAFE_INTEGER);
        assert_eq!(from_native(&safe), Value::Number(MAX_SAFE_INTEGER as f64));
        let big = NativeValue::from(MAX_SAFE_INTEGER + 1);
        assert_eq!(from_native(&big), Value::BigInt((MAX_SAFE_INTEGER + 1) as i128));
        let huge = NativeValue::from(u64::MAX);
        assert_eq!(from_native(&huge), Value::BigInt(u64::MAX as i128));
        assert_eq!(
            to_native(&from_native(&huge), ValueType::UInt64).as_uint64(),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_unsupported_types_are_undefined() {
        let mut frac = NativeValue::new(ValueType::Fraction);
        frac.set_fraction(30, 1).unwrap();
        assert!(from_native(&frac).is_undefined());
        assert!(from_native(&NativeValue::new(ValueType::Pointer)).is_undefined());
        assert!(from_native(&NativeValue::new(ValueType::Boxed("Sample"))).is_undefined());
        assert!(from_native(&NativeValue::default()).is_undefined());
        assert_eq!(metadata_field_to_dynamic(&frac), None);
    }

    #[test]
    fn test_null_payloads_are_null() {
        assert!(from_native(&NativeValue::new(ValueType::String)).is_null());
        assert!(from_native(&NativeValue::new(ValueType::Object)).is_null());
        assert!(from_native(&NativeValue::new(ValueType::Caps)).is_null());
    }

    #[test]
    fn test_caps_as_string() {
        let native = to_native(&Value::from("audio/x-raw, rate=(int)48000"), ValueType::Caps);
        let caps = native.as_caps().unwrap();
        assert_eq!(caps.structure(0).unwrap().name(), "audio/x-raw");
        assert_eq!(from_native(&native), Value::from("audio/x-raw, rate=(int)48000"));
    }

    #[test]
    fn test_structure_drops_unsupported_fields() {
        let mut rate = NativeValue::new(ValueType::Fraction);
        rate.set_fraction(30, 1).unwrap();
        let structure = Structure::new("video/x-raw")
            .with_field("width", 640i32)
            .with_field("framerate", rate)
            .with_field("format", "I420");
        let map = structure_to_dynamic(&structure);
        assert_eq!(map.keys(), vec!["width", "format"]);
        assert_eq!(map.get("width"), Value::Number(640.0));
    }

    #[test]
    fn test_sample_without_caps_has_empty_metadata() {
        let sample = Sample::new(NativeBuffer::copy_from_slice(b"abc"), None);
        let (buffer, metadata) = sample_to_dynamic(sample);
        assert_eq!(buffer.to_bytes(), Some(b"abc".to_vec()));
        assert_eq!(metadata.type_name(), "object");
        assert!(metadata.keys().is_empty());
    }

    #[test]
    fn test_sample_bytes_are_copied() {
        let native = NativeBuffer::copy_from_slice(&[9, 8, 7]);
        let sample = Sample::new(native.clone(), None);
        let (buffer, _) = sample_to_dynamic(sample);
        assert_eq!(native.ref_count(), 1);
        if let Value::Buffer(bytes) = &buffer {
            bytes.borrow_mut()[0] = 0;
        }
        assert_eq!(native.as_slice(), &[9, 8, 7]);
    }

    #[test]
    fn test_bytes_to_native() {
        let buffer = bytes_to_native(&[1, 2, 3, 4]).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4]);
        assert!(bytes_to_native(&[]).unwrap().is_empty());
    }
}
