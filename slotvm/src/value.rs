//! Value: any value a slot or map entry can hold
//!
//! Undefined is internal to the VM. It marks "no value" inside the VM and is
//! never handed to the host, the slot API maps it to Null on the way out.
use std::{fmt, sync::Arc};

use crate::{MapRef, SlotType};

#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(Arc<str>),
    Map(MapRef),
}

impl Value {
    #[inline]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[inline]
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Undefined becomes Null, everything else is passed through
    #[must_use]
    pub fn or_null(self) -> Self {
        match self {
            Self::Undefined => Self::Null,
            other => other,
        }
    }

    /// only value types can be used as map keys
    pub fn is_hashable(&self) -> bool {
        matches!(
            self,
            Self::Null | Self::Bool(_) | Self::Num(_) | Self::Str(_)
        )
    }

    pub fn slot_type(&self) -> SlotType {
        match self {
            Self::Null => SlotType::Null,
            Self::Bool(_) => SlotType::Bool,
            Self::Num(_) => SlotType::Num,
            Self::Str(_) => SlotType::String,
            Self::Map(_) => SlotType::Map,
            Self::Undefined => SlotType::Unknown,
        }
    }

    /// Hash of a hashable value, `None` for maps and undefined.
    pub fn hash_code(&self) -> Option<u32> {
        match self {
            Self::Bool(false) => Some(0),
            Self::Null => Some(1),
            Self::Bool(true) => Some(2),
            Self::Num(n) => Some(hash_bits(n.to_bits())),
            Self::Str(s) => Some(hash_string(s)),
            Self::Map(_) | Self::Undefined => None,
        }
    }
}

// numbers are compared by their bits, so a NaN key can be looked up again
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) => true,
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Num(a), Self::Num(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Map(a), Self::Map(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Num(value)
    }
}

impl From<MapRef> for Value {
    fn from(value: MapRef) -> Self {
        Self::Map(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Num(n) => fmt_num(*n, f),
            Self::Str(s) => f.write_str(s),
            Self::Map(map) => {
                let map = map.read();
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    // nested maps are not expanded, a map may contain itself
                    write!(f, "{}: {}", Shallow(key), Shallow(value))?;
                }
                f.write_str("}")
            }
        }
    }
}

struct Shallow<'a>(&'a Value);

impl fmt::Display for Shallow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Map(_) => f.write_str("{...}"),
            other => other.fmt(f),
        }
    }
}

fn fmt_num(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        return f.write_str("nan");
    }
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "infinity" } else { "-infinity" });
    }
    // integral values print without a fraction
    if n.fract() == 0.0 && n.abs() < 1e15 {
        if n == 0.0 && n.is_sign_negative() {
            return f.write_str("-0");
        }
        return write!(f, "{}", n as i64);
    }
    write!(f, "{n}")
}

/// Integer hash over the raw bits of a number (Thomas Wang's 64 to 32 bit mix).
pub fn hash_bits(bits: u64) -> u32 {
    let mut hash = bits;
    hash = (!hash).wrapping_add(hash << 18);
    hash ^= hash >> 31;
    hash = hash.wrapping_mul(21);
    hash ^= hash >> 11;
    hash = hash.wrapping_add(hash << 6);
    hash ^= hash >> 22;
    (hash & 0x3fff_ffff) as u32
}

/// 32 bit FNV-1a
pub fn hash_string(s: &str) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for byte in s.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_known_vectors() {
        assert_eq!(hash_string(""), 0x811c_9dc5);
        assert_eq!(hash_string("a"), 0xe40c_292c);
        assert_eq!(hash_string("foobar"), 0xbf9c_f968);
    }

    #[test]
    fn singleton_hashes() {
        assert_eq!(Value::Bool(false).hash_code(), Some(0));
        assert_eq!(Value::Null.hash_code(), Some(1));
        assert_eq!(Value::Bool(true).hash_code(), Some(2));
    }

    #[test]
    fn maps_and_undefined_are_not_hashable() {
        let map = Value::Map(MapRef::new());
        assert!(!map.is_hashable());
        assert_eq!(map.hash_code(), None);
        assert!(!Value::Undefined.is_hashable());
        assert_eq!(Value::Undefined.hash_code(), None);
    }

    #[test]
    fn numbers_compare_by_bits() {
        assert_eq!(Value::Num(f64::NAN), Value::Num(f64::NAN));
        assert_ne!(Value::Num(0.0), Value::Num(-0.0));
        assert_eq!(Value::Num(1.5), Value::Num(1.5));
        assert_ne!(Value::Num(1.0), Value::Bool(true));
    }

    #[test]
    fn strings_compare_by_content() {
        let a: Arc<str> = Arc::from("key");
        let b: Arc<str> = Arc::from("key");
        assert_eq!(Value::Str(a.clone()), Value::Str(b.clone()));
        assert_eq!(
            Value::Str(a).hash_code(),
            Value::Str(b).hash_code()
        );
    }

    #[test]
    fn maps_compare_by_identity() {
        let map = MapRef::new();
        assert_eq!(Value::Map(map.clone()), Value::Map(map));
        assert_ne!(Value::Map(MapRef::new()), Value::Map(MapRef::new()));
    }

    #[test]
    fn undefined_becomes_null() {
        assert_eq!(Value::Undefined.or_null(), Value::Null);
        assert_eq!(Value::Num(3.0).or_null(), Value::Num(3.0));
    }

    #[test]
    fn display_numbers() {
        assert_eq!(Value::Num(3.0).to_string(), "3");
        assert_eq!(Value::Num(-2.5).to_string(), "-2.5");
        assert_eq!(Value::Num(f64::INFINITY).to_string(), "infinity");
        assert_eq!(Value::Num(f64::NAN).to_string(), "nan");
    }

    #[test]
    fn display_map_does_not_recurse_into_itself() {
        let map = MapRef::new();
        map.write()
            .set(Value::Str(Arc::from("self")), Value::Map(map.clone()));
        assert_eq!(Value::Map(map).to_string(), "{self: {...}}");
    }
}
