//! NativeValue - the native type system's tagged value container
//!
//! A `NativeValue` is the unit in which property values cross the native
//! boundary. It follows a strict lifecycle:
//!
//! ```text
//! default()  ->  init(ty)  ->  set_* / as_*  ->  unset() (or drop)
//! ```
//!
//! A zero-initialized container has type `ValueType::Invalid` and carries no
//! payload. `init` fixes the declared type and installs a zero payload for it;
//! typed setters reject a value of any other type. Owned payloads (duplicated
//! strings, object references, caps) are released by `unset` and on drop, so
//! every exit path disposes of the container.

use std::fmt;
use std::sync::Arc;

use crate::caps::Caps;
use crate::error::{NativeError, NativeResult};
use crate::object::NativeHandle;

// ============================================================================
// ValueType
// ============================================================================

/// Fundamental type tags of the native type system.
///
/// `Enum`, `Flags` and `Boxed` carry the registered name of the concrete
/// native type; the bridge treats all enums alike and never inspects boxed
/// payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Uninitialized container
    Invalid,
    /// Boolean
    Boolean,
    /// Signed 8-bit integer
    Char,
    /// Unsigned 8-bit integer
    UChar,
    /// Signed 32-bit integer
    Int,
    /// Unsigned 32-bit integer
    UInt,
    /// Signed `long` (64-bit on all supported targets)
    Long,
    /// Unsigned `long` (64-bit on all supported targets)
    ULong,
    /// Signed 64-bit integer
    Int64,
    /// Unsigned 64-bit integer
    UInt64,
    /// Enumeration, stored as a signed 32-bit value
    Enum(&'static str),
    /// Bit flags, stored as an unsigned 32-bit value
    Flags(&'static str),
    /// 32-bit float
    Float,
    /// 64-bit float
    Double,
    /// Nullable UTF-8 string
    String,
    /// Nullable reference to another native object
    Object,
    /// Nullable format description
    Caps,
    /// Rational number (numerator, denominator)
    Fraction,
    /// Raw address
    Pointer,
    /// Opaque boxed structure
    Boxed(&'static str),
}

impl ValueType {
    /// Short type name used in diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            ValueType::Invalid => "invalid",
            ValueType::Boolean => "boolean",
            ValueType::Char => "char",
            ValueType::UChar => "uchar",
            ValueType::Int => "int",
            ValueType::UInt => "uint",
            ValueType::Long => "long",
            ValueType::ULong => "ulong",
            ValueType::Int64 => "int64",
            ValueType::UInt64 => "uint64",
            ValueType::Enum(name) | ValueType::Flags(name) => *name,
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Object => "object",
            ValueType::Caps => "caps",
            ValueType::Fraction => "fraction",
            ValueType::Pointer => "pointer",
            ValueType::Boxed(name) => *name,
        }
    }

    /// True for every signed integer width, including enums
    pub const fn is_signed_integer(&self) -> bool {
        matches!(
            self,
            ValueType::Char | ValueType::Int | ValueType::Long | ValueType::Int64 | ValueType::Enum(_)
        )
    }

    /// Zero payload installed by `NativeValue::init`
    fn zero_payload(&self) -> Payload {
        match self {
            ValueType::Invalid | ValueType::Boxed(_) => Payload::Empty,
            ValueType::Boolean => Payload::Bool(false),
            ValueType::Float | ValueType::Double => Payload::Float(0.0),
            ValueType::String => Payload::Str(None),
            ValueType::Object => Payload::Object(None),
            ValueType::Caps => Payload::Caps(None),
            ValueType::Fraction => Payload::Fraction(0, 1),
            ValueType::Pointer => Payload::Pointer(0),
            t if t.is_signed_integer() => Payload::Int(0),
            _ => Payload::UInt(0),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// NativeValue
// ============================================================================

#[derive(Clone)]
enum Payload {
    Empty,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(Option<String>),
    Object(Option<NativeHandle>),
    Caps(Option<Caps>),
    Fraction(i32, i32),
    Pointer(usize),
}

/// Type-tagged native value container.
///
/// `Clone` performs a value copy: strings and caps are duplicated, object
/// references gain a reference.
#[derive(Clone)]
pub struct NativeValue {
    ty: ValueType,
    payload: Payload,
}

impl Default for NativeValue {
    /// Zero-initialized, uninitialized container
    fn default() -> Self {
        Self {
            ty: ValueType::Invalid,
            payload: Payload::Empty,
        }
    }
}

macro_rules! typed_accessors {
    ($($set:ident, $get:ident, $variant:ident, $rust:ty, $payload:ident, $store:ty;)*) => {
        $(
            #[doc = concat!("Store a value into a `", stringify!($variant), "` container")]
            pub fn $set(&mut self, v: $rust) -> NativeResult<()> {
                self.expect_type(ValueType::$variant)?;
                self.payload = Payload::$payload(v as $store);
                Ok(())
            }

            #[doc = concat!("Read the value of a `", stringify!($variant), "` container")]
            pub fn $get(&self) -> Option<$rust> {
                match (&self.ty, &self.payload) {
                    (ValueType::$variant, Payload::$payload(v)) => Some(*v as $rust),
                    _ => None,
                }
            }
        )*
    };
}

impl NativeValue {
    /// Create a container already initialized to `ty`
    pub fn new(ty: ValueType) -> Self {
        Self {
            ty,
            payload: ty.zero_payload(),
        }
    }

    /// Initialize a zeroed container with its declared type.
    ///
    /// Fails if the container was already initialized; call `unset` first.
    pub fn init(&mut self, ty: ValueType) -> NativeResult<()> {
        if self.ty != ValueType::Invalid {
            return Err(NativeError::mismatch(ValueType::Invalid, self.ty));
        }
        self.ty = ty;
        self.payload = ty.zero_payload();
        Ok(())
    }

    /// Release any owned payload and return to the zeroed state
    pub fn unset(&mut self) {
        self.ty = ValueType::Invalid;
        self.payload = Payload::Empty;
    }

    /// Declared type of the container
    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    /// Whether `init` has been called
    pub fn is_initialized(&self) -> bool {
        self.ty != ValueType::Invalid
    }

    fn expect_type(&self, ty: ValueType) -> NativeResult<()> {
        if self.ty == ty {
            Ok(())
        } else {
            Err(NativeError::mismatch(ty, self.ty))
        }
    }

    typed_accessors! {
        set_bool, as_bool, Boolean, bool, Bool, bool;
        set_char, as_char, Char, i8, Int, i64;
        set_uchar, as_uchar, UChar, u8, UInt, u64;
        set_int, as_int, Int, i32, Int, i64;
        set_uint, as_uint, UInt, u32, UInt, u64;
        set_long, as_long, Long, i64, Int, i64;
        set_ulong, as_ulong, ULong, u64, UInt, u64;
        set_int64, as_int64, Int64, i64, Int, i64;
        set_uint64, as_uint64, UInt64, u64, UInt, u64;
        set_float, as_float, Float, f32, Float, f64;
        set_double, as_double, Double, f64, Float, f64;
    }

    /// Store an enum value; the container may hold any enum type
    pub fn set_enum(&mut self, v: i32) -> NativeResult<()> {
        match self.ty {
            ValueType::Enum(_) => {
                self.payload = Payload::Int(v as i64);
                Ok(())
            }
            other => Err(NativeError::mismatch("enum", other)),
        }
    }

    /// Read an enum value
    pub fn as_enum(&self) -> Option<i32> {
        match (&self.ty, &self.payload) {
            (ValueType::Enum(_), Payload::Int(v)) => Some(*v as i32),
            _ => None,
        }
    }

    /// Store a flags value; the container may hold any flags type
    pub fn set_flags(&mut self, v: u32) -> NativeResult<()> {
        match self.ty {
            ValueType::Flags(_) => {
                self.payload = Payload::UInt(v as u64);
                Ok(())
            }
            other => Err(NativeError::mismatch("flags", other)),
        }
    }

    /// Read a flags value
    pub fn as_flags(&self) -> Option<u32> {
        match (&self.ty, &self.payload) {
            (ValueType::Flags(_), Payload::UInt(v)) => Some(*v as u32),
            _ => None,
        }
    }

    /// Store a duplicate of `s` (or the null string)
    pub fn set_string(&mut self, s: Option<&str>) -> NativeResult<()> {
        self.expect_type(ValueType::String)?;
        self.payload = Payload::Str(s.map(str::to_owned));
        Ok(())
    }

    /// Borrow the string; `None` for the null string or a non-string container
    pub fn as_str(&self) -> Option<&str> {
        match &self.payload {
            Payload::Str(Some(s)) if self.ty == ValueType::String => Some(s),
            _ => None,
        }
    }

    /// Store an object reference (or null); the container holds a reference
    pub fn set_object(&mut self, obj: Option<NativeHandle>) -> NativeResult<()> {
        self.expect_type(ValueType::Object)?;
        self.payload = Payload::Object(obj);
        Ok(())
    }

    /// Borrow the object reference
    pub fn as_object(&self) -> Option<&NativeHandle> {
        match &self.payload {
            Payload::Object(Some(obj)) if self.ty == ValueType::Object => Some(obj),
            _ => None,
        }
    }

    /// Store caps (or null)
    pub fn set_caps(&mut self, caps: Option<Caps>) -> NativeResult<()> {
        self.expect_type(ValueType::Caps)?;
        self.payload = Payload::Caps(caps);
        Ok(())
    }

    /// Borrow the caps
    pub fn as_caps(&self) -> Option<&Caps> {
        match &self.payload {
            Payload::Caps(Some(caps)) if self.ty == ValueType::Caps => Some(caps),
            _ => None,
        }
    }

    /// Store a fraction; the denominator must be non-zero
    pub fn set_fraction(&mut self, num: i32, den: i32) -> NativeResult<()> {
        self.expect_type(ValueType::Fraction)?;
        if den == 0 {
            return Err(NativeError::mismatch("non-zero denominator", "0"));
        }
        self.payload = Payload::Fraction(num, den);
        Ok(())
    }

    /// Read a fraction as `(numerator, denominator)`
    pub fn as_fraction(&self) -> Option<(i32, i32)> {
        match self.payload {
            Payload::Fraction(n, d) if self.ty == ValueType::Fraction => Some((n, d)),
            _ => None,
        }
    }

    /// Store a raw address
    pub fn set_pointer(&mut self, addr: usize) -> NativeResult<()> {
        self.expect_type(ValueType::Pointer)?;
        self.payload = Payload::Pointer(addr);
        Ok(())
    }

    /// Read a raw address
    pub fn as_pointer(&self) -> Option<usize> {
        match self.payload {
            Payload::Pointer(addr) if self.ty == ValueType::Pointer => Some(addr),
            _ => None,
        }
    }

    /// Copy `src` into this container; both must have the same type
    pub fn copy_from(&mut self, src: &NativeValue) -> NativeResult<()> {
        self.expect_type(src.ty)?;
        self.payload = src.payload.clone();
        Ok(())
    }
}

impl PartialEq for NativeValue {
    fn eq(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        match (&self.payload, &other.payload) {
            (Payload::Empty, Payload::Empty) => true,
            (Payload::Bool(a), Payload::Bool(b)) => a == b,
            (Payload::Int(a), Payload::Int(b)) => a == b,
            (Payload::UInt(a), Payload::UInt(b)) => a == b,
            (Payload::Float(a), Payload::Float(b)) => a == b,
            (Payload::Str(a), Payload::Str(b)) => a == b,
            (Payload::Object(a), Payload::Object(b)) => match (a, b) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            },
            (Payload::Caps(a), Payload::Caps(b)) => a == b,
            (Payload::Fraction(an, ad), Payload::Fraction(bn, bd)) => {
                (*an as i64) * (*bd as i64) == (*bn as i64) * (*ad as i64)
            }
            (Payload::Pointer(a), Payload::Pointer(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for NativeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.payload {
            Payload::Empty => write!(f, "NativeValue::{}", self.ty),
            Payload::Bool(b) => write!(f, "NativeValue::{}({})", self.ty, b),
            Payload::Int(i) => write!(f, "NativeValue::{}({})", self.ty, i),
            Payload::UInt(u) => write!(f, "NativeValue::{}({})", self.ty, u),
            Payload::Float(x) => write!(f, "NativeValue::{}({})", self.ty, x),
            Payload::Str(s) => write!(f, "NativeValue::{}({:?})", self.ty, s),
            Payload::Object(Some(obj)) => {
                write!(f, "NativeValue::{}(<{}>)", self.ty, obj.type_name())
            }
            Payload::Object(None) => write!(f, "NativeValue::{}(null)", self.ty),
            Payload::Caps(Some(caps)) => write!(f, "NativeValue::{}({})", self.ty, caps),
            Payload::Caps(None) => write!(f, "NativeValue::{}(null)", self.ty),
            Payload::Fraction(n, d) => write!(f, "NativeValue::{}({}/{})", self.ty, n, d),
            Payload::Pointer(p) => write!(f, "NativeValue::{}({:#x})", self.ty, p),
        }
    }
}

// ============================================================================
// Conversions from Rust primitives
// ============================================================================

macro_rules! from_primitive {
    ($($rust:ty => $setter:ident, $variant:ident;)*) => {
        $(
            impl From<$rust> for NativeValue {
                fn from(v: $rust) -> Self {
                    let mut value = NativeValue::new(ValueType::$variant);
                    // Infallible: the container was just initialized to the matching type
                    let _ = value.$setter(v);
                    value
                }
            }
        )*
    };
}

from_primitive! {
    bool => set_bool, Boolean;
    i32 => set_int, Int;
    u32 => set_uint, UInt;
    i64 => set_int64, Int64;
    u64 => set_uint64, UInt64;
    f32 => set_float, Float;
    f64 => set_double, Double;
}

impl From<&str> for NativeValue {
    fn from(s: &str) -> Self {
        Self {
            ty: ValueType::String,
            payload: Payload::Str(Some(s.to_owned())),
        }
    }
}

impl From<String> for NativeValue {
    fn from(s: String) -> Self {
        Self {
            ty: ValueType::String,
            payload: Payload::Str(Some(s)),
        }
    }
}

impl From<Caps> for NativeValue {
    fn from(caps: Caps) -> Self {
        Self {
            ty: ValueType::Caps,
            payload: Payload::Caps(Some(caps)),
        }
    }
}

impl From<NativeHandle> for NativeValue {
    fn from(obj: NativeHandle) -> Self {
        Self {
            ty: ValueType::Object,
            payload: Payload::Object(Some(obj)),
        }
    }
}
