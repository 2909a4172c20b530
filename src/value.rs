//! Host-value adapter: the codec-neutral value type every decode produces
//! and every encode consumes.
//!
//! Shaped after the teacher crate's `Value` enum (`types.rs`), trimmed to
//! the CQL scalar/collection set this codec actually speaks and with
//! collections carrying insertion order explicitly (`Map`/`Udt` are
//! ordered pair vectors, not hash maps) per the ordering invariant in
//! spec §9.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded or to-be-encoded CQL cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CqlValue {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
    Text(String),
    /// Canonical lowercase `8-4-4-4-12` hex string, e.g.
    /// `"550e8400-e29b-41d4-a716-446655440000"`.
    Uuid(String),
    /// Canonical string form (`"192.168.0.1"` / `"::1"`).
    Inet(String),
    /// `"Y-MM-DD"`, `Y` arbitrary width, sign included when negative.
    Date(String),
    /// `"H:MM:SS[.n]"`, trailing zero nanoseconds trimmed.
    Time(String),
    /// Synthetic `"N e[+-]S"` decimal string, e.g. `"-150e-2"`.
    Decimal(String),
    /// Arbitrary-precision decimal integer string.
    VarInt(String),
    Duration {
        months: i32,
        days: i32,
        nanos: i64,
    },
    List(Vec<CqlValue>),
    Set(Vec<CqlValue>),
    /// Ordered key/value pairs, insertion order preserved.
    Map(Vec<(CqlValue, CqlValue)>),
    Tuple(Vec<CqlValue>),
    /// Ordered (field name, value) pairs, declaration order preserved.
    Udt(Vec<(String, CqlValue)>),
}

impl CqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CqlValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CqlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CqlValue::I8(v) => Some(*v as i64),
            CqlValue::I16(v) => Some(*v as i64),
            CqlValue::I32(v) => Some(*v as i64),
            CqlValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CqlValue::F32(v) => Some(*v as f64),
            CqlValue::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CqlValue::Text(s)
            | CqlValue::Uuid(s)
            | CqlValue::Inet(s)
            | CqlValue::Date(s)
            | CqlValue::Time(s)
            | CqlValue::Decimal(s)
            | CqlValue::VarInt(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CqlValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for CqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CqlValue::Null => write!(f, "null"),
            CqlValue::Bool(b) => write!(f, "{b}"),
            CqlValue::I8(v) => write!(f, "{v}"),
            CqlValue::I16(v) => write!(f, "{v}"),
            CqlValue::I32(v) => write!(f, "{v}"),
            CqlValue::I64(v) => write!(f, "{v}"),
            CqlValue::F32(v) => write!(f, "{v}"),
            CqlValue::F64(v) => write!(f, "{v}"),
            CqlValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            CqlValue::Text(s) => write!(f, "{s}"),
            CqlValue::Uuid(s) => write!(f, "{s}"),
            CqlValue::Inet(s) => write!(f, "{s}"),
            CqlValue::Date(s) => write!(f, "{s}"),
            CqlValue::Time(s) => write!(f, "{s}"),
            CqlValue::Decimal(s) => write!(f, "{s}"),
            CqlValue::VarInt(s) => write!(f, "{s}"),
            CqlValue::Duration {
                months,
                days,
                nanos,
            } => write!(f, "{months}mo{days}d{nanos}ns"),
            CqlValue::List(items) => write_seq(f, "[", items.iter(), "]"),
            CqlValue::Set(items) => write_seq(f, "{", items.iter(), "}"),
            CqlValue::Map(pairs) => {
                write!(f, "{{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            CqlValue::Tuple(items) => write_seq(f, "(", items.iter(), ")"),
            CqlValue::Udt(fields) => {
                write!(f, "{{")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_seq<'a, I>(f: &mut fmt::Formatter<'_>, open: &str, items: I, close: &str) -> fmt::Result
where
    I: Iterator<Item = &'a CqlValue>,
{
    write!(f, "{open}")?;
    for (i, item) in items.enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "{close}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_null() {
        assert!(CqlValue::Null.is_null());
        assert!(!CqlValue::I32(0).is_null());
    }

    #[test]
    fn uuid_displays_canonically() {
        let v = CqlValue::Uuid("550e8400-e29b-41d4-a716-446655440000".into());
        assert_eq!(v.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn list_displays_as_bracketed_sequence() {
        let v = CqlValue::List(vec![CqlValue::I32(1), CqlValue::I32(2)]);
        assert_eq!(v.to_string(), "[1, 2]");
    }

    #[test]
    fn map_preserves_insertion_order_in_display() {
        let v = CqlValue::Map(vec![
            (CqlValue::Text("b".into()), CqlValue::I32(2)),
            (CqlValue::Text("a".into()), CqlValue::I32(1)),
        ]);
        assert_eq!(v.to_string(), "{b: 2, a: 1}");
    }
}
