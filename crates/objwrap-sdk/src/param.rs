//! Property specifications
//!
//! Every native object type publishes a table of `ParamSpec`s describing the
//! properties its instances carry. The table is open-ended: subtypes add
//! entries, so it is always queried per instance.

use std::fmt;
use std::ops::BitOr;

use crate::value::ValueType;

/// Property access flags (bitflags)
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamFlags(u32);

impl ParamFlags {
    /// No access
    pub const NONE: Self = Self(0x00);
    /// Property can be read
    pub const READABLE: Self = Self(0x01);
    /// Property can be written
    pub const WRITABLE: Self = Self(0x02);
    /// Property is set during construction
    pub const CONSTRUCT: Self = Self(0x04);
    /// Property can only be set during construction
    pub const CONSTRUCT_ONLY: Self = Self(0x08);

    /// READABLE | WRITABLE
    pub const READWRITE: Self = Self(0x03);

    /// Check whether all bits of `other` are set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Build from raw bits, dropping unknown bits
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self(bits & 0x0F)
    }

    /// Property is readable
    pub const fn is_readable(self) -> bool {
        self.contains(Self::READABLE)
    }

    /// Property is writable after construction
    pub const fn is_writable(self) -> bool {
        self.contains(Self::WRITABLE) && !self.contains(Self::CONSTRUCT_ONLY)
    }
}

impl BitOr for ParamFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for ParamFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.contains(Self::READABLE) {
            parts.push("READABLE");
        }
        if self.contains(Self::WRITABLE) {
            parts.push("WRITABLE");
        }
        if self.contains(Self::CONSTRUCT) {
            parts.push("CONSTRUCT");
        }
        if self.contains(Self::CONSTRUCT_ONLY) {
            parts.push("CONSTRUCT_ONLY");
        }
        if parts.is_empty() {
            write!(f, "ParamFlags(NONE)")
        } else {
            write!(f, "ParamFlags({})", parts.join(" | "))
        }
    }
}

/// Specification of one property of a native object type
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Canonical property name (dash-separated)
    pub name: String,
    /// Declared value type
    pub value_type: ValueType,
    /// Access flags
    pub flags: ParamFlags,
}

impl ParamSpec {
    /// Create a spec; the name is canonicalized
    pub fn new(name: &str, value_type: ValueType, flags: ParamFlags) -> Self {
        Self {
            name: canonical_name(name),
            value_type,
            flags,
        }
    }

    /// Readable property of the given type
    pub fn read_only(name: &str, value_type: ValueType) -> Self {
        Self::new(name, value_type, ParamFlags::READABLE)
    }

    /// Readable and writable property of the given type
    pub fn read_write(name: &str, value_type: ValueType) -> Self {
        Self::new(name, value_type, ParamFlags::READWRITE)
    }

    /// Writable-only property of the given type
    pub fn write_only(name: &str, value_type: ValueType) -> Self {
        Self::new(name, value_type, ParamFlags::WRITABLE)
    }
}

/// Canonical form of a property name: `_` and `-` are interchangeable, the
/// dash form is canonical.
pub fn canonical_name(name: &str) -> String {
    name.replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_combination() {
        let rw = ParamFlags::READABLE | ParamFlags::WRITABLE;
        assert_eq!(rw, ParamFlags::READWRITE);
        assert!(rw.is_readable());
        assert!(rw.is_writable());
        assert!(!ParamFlags::READABLE.is_writable());
    }

    #[test]
    fn test_construct_only_not_writable() {
        let flags = ParamFlags::READWRITE | ParamFlags::CONSTRUCT_ONLY;
        assert!(flags.is_readable());
        assert!(!flags.is_writable());
    }

    #[test]
    fn test_from_bits_truncate() {
        assert_eq!(ParamFlags::from_bits_truncate(0xFF).bits(), 0x0F);
    }

    #[test]
    fn test_spec_name_canonicalized() {
        let spec = ParamSpec::read_write("max_buffers", ValueType::UInt);
        assert_eq!(spec.name, "max-buffers");
    }

    #[test]
    fn test_flags_debug() {
        assert_eq!(format!("{:?}", ParamFlags::READWRITE), "ParamFlags(READABLE | WRITABLE)");
        assert_eq!(format!("{:?}", ParamFlags::NONE), "ParamFlags(NONE)");
    }
}
