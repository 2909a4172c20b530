//! Encoder: the inverse of [`crate::decode`] — takes a [`CqlValue`] and a
//! [`TypeDescriptor`] and produces the wire bytes a server would accept.
//!
//! Grounded on `encode.c` from the legacy driver (`cass_encode_cell` and its
//! per-type helpers): the DATE inverse-Julian-day math, the DECIMAL
//! scale/unscaled split, and the TIME H:MM:SS parsing all mirror that
//! source's behavior. Containers use [`crate::writer::ByteWriter`]'s
//! reserve/patch pair rather than the original's buffer-realloc-then-memcpy
//! approach, since every collection here is a `Vec` that already knows its
//! length up front.

use crate::bignum::BigInt;
use crate::config::CodecConfig;
use crate::decode::{floor_div, DATE_EPOCH_OFFSET};
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::parser::vint::encode_vint;
use crate::value::CqlValue;
use crate::writer::ByteWriter;

/// Encode one cell: `CqlValue::Null` writes the `-1` absent marker, anything
/// else is length-prefix-wrapped around the per-type payload.
pub fn encode_cell(
    writer: &mut ByteWriter,
    value: &CqlValue,
    ty: &TypeDescriptor,
    config: &CodecConfig,
) -> Result<()> {
    if value.is_null() {
        writer.write_absent();
        return Ok(());
    }
    let pos = writer.reserve_i32();
    if encode_value(writer, value, ty, config)? {
        let written: i32 = (writer.len() - pos - 4)
            .try_into()
            .map_err(|_| Error::overflow("encoded payload length exceeds i32::MAX"))?;
        writer.patch_i32(pos, written);
    } else {
        // Soft-failed INET/UUID literal: nothing was written after the
        // reserved placeholder, so patch it into the `-1` absent marker.
        writer.patch_i32(pos, -1);
    }
    Ok(())
}

fn type_mismatch(ty: &TypeDescriptor, value: &CqlValue) -> Error {
    Error::range(format!("value {value:?} does not match type {ty:?}"))
}

/// Returns `Ok(true)` when a payload was written after the cell's reserved
/// length placeholder, `Ok(false)` when a soft (recoverable) failure means
/// the cell should come out as `-1`/absent instead.
fn encode_value(
    writer: &mut ByteWriter,
    value: &CqlValue,
    ty: &TypeDescriptor,
    config: &CodecConfig,
) -> Result<bool> {
    match ty {
        TypeDescriptor::Ascii | TypeDescriptor::Blob | TypeDescriptor::Custom(_) => match value {
            CqlValue::Bytes(b) => {
                writer.write_bytes(b);
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Varchar | TypeDescriptor::Text => match value {
            CqlValue::Text(s) => {
                writer.write_bytes(s.as_bytes());
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Boolean => match value {
            CqlValue::Bool(b) => {
                writer.write_u8(if *b { 1 } else { 0 });
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::TinyInt => match value {
            CqlValue::I8(v) => {
                writer.write_i8(*v);
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::SmallInt => match value {
            CqlValue::I16(v) => {
                writer.write_i16(*v);
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Int => match value {
            CqlValue::I32(v) => {
                writer.write_i32(*v);
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::BigInt | TypeDescriptor::Counter | TypeDescriptor::Timestamp => {
            match value {
                CqlValue::I64(v) => {
                    writer.write_i64(*v);
                    Ok(true)
                }
                _ => Err(type_mismatch(ty, value)),
            }
        }
        TypeDescriptor::Float => match value {
            CqlValue::F32(v) => {
                writer.write_f32(*v);
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Double => match value {
            CqlValue::F64(v) => {
                writer.write_f64(*v);
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Uuid | TypeDescriptor::TimeUuid => match value {
            CqlValue::Uuid(s) => Ok(encode_uuid(writer, s, config)),
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Inet => match value {
            CqlValue::Inet(s) => Ok(encode_inet(writer, s, config)),
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::VarInt => match value {
            CqlValue::VarInt(s) => {
                let bn = BigInt::from_decimal_str(s)?;
                writer.write_bytes(&bn.to_twos_complement_be());
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Decimal => match value {
            CqlValue::Decimal(s) => encode_decimal(writer, s).map(|()| true),
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Date => match value {
            CqlValue::Date(s) => encode_date(writer, s).map(|()| true),
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Time => match value {
            CqlValue::Time(s) => encode_time(writer, s).map(|()| true),
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Duration => match value {
            CqlValue::Duration {
                months,
                days,
                nanos,
            } => {
                writer.write_bytes(&encode_vint(*months as i64));
                writer.write_bytes(&encode_vint(*days as i64));
                writer.write_bytes(&encode_vint(*nanos));
                Ok(true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::List(inner) => match value {
            CqlValue::List(items) => encode_sequence(writer, items, inner, config).map(|()| true),
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Set(inner) => match value {
            CqlValue::Set(items) => encode_sequence(writer, items, inner, config).map(|()| true),
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Map(key_ty, value_ty) => match value {
            CqlValue::Map(pairs) => {
                encode_map(writer, pairs, key_ty, value_ty, config).map(|()| true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Tuple(field_types) => match value {
            CqlValue::Tuple(fields) => {
                encode_tuple(writer, fields, field_types, config).map(|()| true)
            }
            _ => Err(type_mismatch(ty, value)),
        },
        TypeDescriptor::Udt { fields, .. } => match value {
            CqlValue::Udt(values) => encode_udt(writer, values, fields, config).map(|()| true),
            _ => Err(type_mismatch(ty, value)),
        },
    }
}

/// Parses a canonical or loosely-punctuated hex string (non-hex bytes are
/// skipped, matching the legacy driver's permissive UUID literal parsing),
/// requiring exactly 32 hex digits. A malformed literal is a soft failure —
/// warns and reports "no payload written" rather than erroring, so the
/// caller patches the cell to `-1`/absent (`encode.c`'s `encode_uuid`
/// warns and still emits the cell as undef).
fn encode_uuid(writer: &mut ByteWriter, s: &str, config: &CodecConfig) -> bool {
    let hex_digits: String = s.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex_digits.len() != 32 {
        if config.warn_on_soft_errors {
            log::warn!(
                "malformed UUID literal {s:?}: expected 32 hex digits, got {}",
                hex_digits.len()
            );
        }
        return false;
    }
    match hex::decode(&hex_digits) {
        Ok(bytes) => {
            writer.write_bytes(&bytes);
            true
        }
        Err(e) => {
            if config.warn_on_soft_errors {
                log::warn!("malformed UUID literal {s:?}: {e}");
            }
            false
        }
    }
}

/// Soft failure on a malformed literal, mirroring `encode_inet` in
/// `encode.c`, which warns and emits the cell as undef rather than failing
/// the whole encode.
fn encode_inet(writer: &mut ByteWriter, s: &str, config: &CodecConfig) -> bool {
    if let Ok(v4) = s.parse::<std::net::Ipv4Addr>() {
        writer.write_bytes(&v4.octets());
        return true;
    }
    if let Ok(v6) = s.parse::<std::net::Ipv6Addr>() {
        writer.write_bytes(&v6.octets());
        return true;
    }
    if config.warn_on_soft_errors {
        log::warn!("malformed INET literal {s:?}: not a valid IPv4 or IPv6 address");
    }
    false
}

/// Splits `"{sign}{int_digits}[.{frac_digits}][e{exp}]"` into an unscaled
/// varint string and a `scale`, then writes `[int32 -scale][varint bytes]`.
fn encode_decimal(writer: &mut ByteWriter, s: &str) -> Result<()> {
    let (mantissa, explicit_exp) = match s.split_once(['e', 'E']) {
        Some((m, e)) => {
            let exp: i64 = e
                .parse()
                .map_err(|_| Error::malformed_text(format!("bad exponent in DECIMAL {s:?}")))?;
            (m, exp)
        }
        None => (s, 0),
    };

    let (sign, unsigned) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f),
        None => (unsigned, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(Error::malformed_text(format!(
            "DECIMAL literal {s:?} has no digits"
        )));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(Error::malformed_text(format!(
            "DECIMAL literal {s:?} contains non-digit characters"
        )));
    }

    let unscaled_digits = format!("{int_part}{frac_part}");
    let unscaled = format!("{sign}{unscaled_digits}");
    let scale = frac_part.len() as i64 - explicit_exp;

    let scale_i32: i32 = scale
        .try_into()
        .map_err(|_| Error::overflow("DECIMAL scale exceeds i32 range"))?;
    writer.write_i32(scale_i32);

    let bn = BigInt::from_decimal_str(&unscaled)?;
    writer.write_bytes(&bn.to_twos_complement_be());
    Ok(())
}

/// Inverse of the §6.1 Julian-day formula: `"Y-MM-DD"` (sign allowed on
/// `Y`) to the `uint32` day-offset wire form.
fn encode_date(writer: &mut ByteWriter, s: &str) -> Result<()> {
    let mut parts = s.rsplitn(3, '-');
    let day: i64 = parts
        .next()
        .ok_or_else(|| Error::malformed_text(format!("malformed DATE {s:?}")))?
        .parse()
        .map_err(|_| Error::malformed_text(format!("malformed DATE day in {s:?}")))?;
    let month: i64 = parts
        .next()
        .ok_or_else(|| Error::malformed_text(format!("malformed DATE {s:?}")))?
        .parse()
        .map_err(|_| Error::malformed_text(format!("malformed DATE month in {s:?}")))?;
    let year_str = parts
        .next()
        .ok_or_else(|| Error::malformed_text(format!("malformed DATE {s:?}")))?;
    let year: i64 = year_str
        .parse()
        .map_err(|_| Error::malformed_text(format!("malformed DATE year in {s:?}")))?;

    let a = floor_div(14 - month, 12);
    let y = year + 4800 - a;
    let m = month + 12 * a - 3;
    let jdn = day + floor_div(153 * m + 2, 5) + 365 * y + floor_div(y, 4) - floor_div(y, 100)
        + floor_div(y, 400)
        - 32045;

    let d = jdn + DATE_EPOCH_OFFSET;
    let d: u32 = d
        .try_into()
        .map_err(|_| Error::range(format!("DATE {s:?} is outside the representable range")))?;
    writer.write_bytes(&d.to_be_bytes());
    Ok(())
}

/// Parses `"H:MM:SS[.n]"` into nanoseconds-of-day, normalizing `H` modulo 24
/// the way the legacy driver's `cc_encode_time` tolerates an hour rollover.
fn encode_time(writer: &mut ByteWriter, s: &str) -> Result<()> {
    let (hms, frac) = match s.split_once('.') {
        Some((h, f)) => (h, Some(f)),
        None => (s, None),
    };
    let mut fields = hms.split(':');
    let hours: i64 = fields
        .next()
        .ok_or_else(|| Error::malformed_text(format!("malformed TIME {s:?}")))?
        .parse()
        .map_err(|_| Error::malformed_text(format!("malformed TIME hour in {s:?}")))?;
    let minutes: i64 = fields
        .next()
        .ok_or_else(|| Error::malformed_text(format!("malformed TIME {s:?}")))?
        .parse()
        .map_err(|_| Error::malformed_text(format!("malformed TIME minute in {s:?}")))?;
    let seconds: i64 = fields
        .next()
        .ok_or_else(|| Error::malformed_text(format!("malformed TIME {s:?}")))?
        .parse()
        .map_err(|_| Error::malformed_text(format!("malformed TIME second in {s:?}")))?;
    if fields.next().is_some() {
        return Err(Error::malformed_text(format!("malformed TIME {s:?}")));
    }

    let nanos: i64 = match frac {
        Some(f) => {
            if !f.bytes().all(|b| b.is_ascii_digit()) || f.len() > 9 {
                return Err(Error::malformed_text(format!(
                    "malformed TIME fraction in {s:?}"
                )));
            }
            let padded = format!("{f:0<9}");
            padded
                .parse()
                .map_err(|_| Error::malformed_text(format!("malformed TIME fraction in {s:?}")))?
        }
        None => 0,
    };

    let hours = hours.rem_euclid(24);
    if !(0..60).contains(&minutes) || !(0..60).contains(&seconds) {
        return Err(Error::range(format!("TIME {s:?} has an out-of-range minute or second")));
    }

    let total_nanos = ((hours * 3600 + minutes * 60 + seconds) * 1_000_000_000) + nanos;
    writer.write_bytes(&total_nanos.to_be_bytes());
    Ok(())
}

fn encode_sequence(
    writer: &mut ByteWriter,
    items: &[CqlValue],
    inner: &TypeDescriptor,
    config: &CodecConfig,
) -> Result<()> {
    let count: i32 = items
        .len()
        .try_into()
        .map_err(|_| Error::overflow("container element count exceeds i32::MAX"))?;
    writer.write_i32(count);
    for item in items {
        encode_cell(writer, item, inner, config)?;
    }
    Ok(())
}

fn encode_map(
    writer: &mut ByteWriter,
    pairs: &[(CqlValue, CqlValue)],
    key_ty: &TypeDescriptor,
    value_ty: &TypeDescriptor,
    config: &CodecConfig,
) -> Result<()> {
    let count: i32 = pairs
        .len()
        .try_into()
        .map_err(|_| Error::overflow("map entry count exceeds i32::MAX"))?;
    writer.write_i32(count);
    for (key, value) in pairs {
        encode_cell(writer, key, key_ty, config)?;
        encode_cell(writer, value, value_ty, config)?;
    }
    Ok(())
}

fn encode_tuple(
    writer: &mut ByteWriter,
    fields: &[CqlValue],
    field_types: &[TypeDescriptor],
    config: &CodecConfig,
) -> Result<()> {
    if fields.len() != field_types.len() {
        return Err(Error::length_mismatch("TUPLE", field_types.len(), fields.len()));
    }
    for (value, ty) in fields.iter().zip(field_types) {
        encode_cell(writer, value, ty, config)?;
    }
    Ok(())
}

/// Unlike decode's trailing-field elision, encode requires every declared
/// field present and in order — a client assembling a row always knows its
/// own schema, so a missing field here is a caller bug, not a server-skew
/// case to tolerate.
fn encode_udt(
    writer: &mut ByteWriter,
    values: &[(String, CqlValue)],
    declared_fields: &[(String, TypeDescriptor)],
    config: &CodecConfig,
) -> Result<()> {
    if values.len() != declared_fields.len() {
        return Err(Error::length_mismatch(
            "UDT",
            declared_fields.len(),
            values.len(),
        ));
    }
    for ((value_name, value), (declared_name, field_ty)) in values.iter().zip(declared_fields) {
        if value_name != declared_name {
            return Err(Error::malformed_text(format!(
                "UDT field order mismatch: expected {declared_name:?}, got {value_name:?}"
            )));
        }
        encode_cell(writer, value, field_ty, config)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_cell;
    use crate::reader::ByteReader;

    fn roundtrip(value: &CqlValue, ty: &TypeDescriptor) -> CqlValue {
        let config = CodecConfig::default();
        let mut w = ByteWriter::new();
        encode_cell(&mut w, value, ty, &config).unwrap();
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        decode_cell(&mut r, ty, &config).unwrap()
    }

    #[test]
    fn encodes_int_257() {
        let config = CodecConfig::default();
        let mut w = ByteWriter::new();
        encode_cell(&mut w, &CqlValue::I32(257), &TypeDescriptor::Int, &config).unwrap();
        assert_eq!(hex::encode(w.into_inner()), "0000000400000101");
    }

    #[test]
    fn null_roundtrips() {
        assert_eq!(roundtrip(&CqlValue::Null, &TypeDescriptor::Int), CqlValue::Null);
    }

    #[test]
    fn encodes_varint_minus_one() {
        let config = CodecConfig::default();
        let mut w = ByteWriter::new();
        encode_cell(
            &mut w,
            &CqlValue::VarInt("-1".into()),
            &TypeDescriptor::VarInt,
            &config,
        )
        .unwrap();
        assert_eq!(hex::encode(w.into_inner()), "00000001ff");
    }

    #[test]
    fn varint_roundtrips_across_canonical_boundary() {
        for s in ["-1", "0", "127", "128", "-128", "-129", "123456789012345678901234567890"] {
            let v = CqlValue::VarInt(s.into());
            assert_eq!(roundtrip(&v, &TypeDescriptor::VarInt), v);
        }
    }

    #[test]
    fn encodes_decimal_minus_one_point_five() {
        let config = CodecConfig::default();
        let mut w = ByteWriter::new();
        encode_cell(
            &mut w,
            &CqlValue::Decimal("-1.50".into()),
            &TypeDescriptor::Decimal,
            &config,
        )
        .unwrap();
        assert_eq!(hex::encode(w.into_inner()), "0000000600000002ff6a");
    }

    #[test]
    fn decimal_roundtrips_through_rendered_form() {
        let config = CodecConfig::default();
        let mut w = ByteWriter::new();
        encode_cell(
            &mut w,
            &CqlValue::Decimal("-1.50".into()),
            &TypeDescriptor::Decimal,
            &config,
        )
        .unwrap();
        let bytes = w.into_inner();
        let mut r = ByteReader::new(&bytes);
        let decoded = decode_cell(&mut r, &TypeDescriptor::Decimal, &config).unwrap();
        assert_eq!(decoded, CqlValue::Decimal("-150e-2".into()));
    }

    #[test]
    fn encodes_epoch_date() {
        let config = CodecConfig::default();
        let mut w = ByteWriter::new();
        encode_cell(
            &mut w,
            &CqlValue::Date("1970-01-01".into()),
            &TypeDescriptor::Date,
            &config,
        )
        .unwrap();
        assert_eq!(hex::encode(w.into_inner()), "0000000480000000");
    }

    #[test]
    fn encodes_time_with_millis() {
        let config = CodecConfig::default();
        let mut w = ByteWriter::new();
        encode_cell(
            &mut w,
            &CqlValue::Time("1:02:03.004".into()),
            &TypeDescriptor::Time,
            &config,
        )
        .unwrap();
        assert_eq!(hex::encode(w.into_inner()), "00000008000003631f117900");
    }

    #[test]
    fn encodes_list_of_ints() {
        let config = CodecConfig::default();
        let list_ty = TypeDescriptor::List(Box::new(TypeDescriptor::Int));
        let v = CqlValue::List(vec![CqlValue::I32(1), CqlValue::I32(2)]);
        let mut w = ByteWriter::new();
        encode_cell(&mut w, &v, &list_ty, &config).unwrap();
        assert_eq!(
            hex::encode(w.into_inner()),
            "000000140000000200000004000000010000000400000002"
        );
    }

    #[test]
    fn uuid_roundtrips_lowercase() {
        let v = CqlValue::Uuid("550e8400-e29b-41d4-a716-446655440000".into());
        assert_eq!(roundtrip(&v, &TypeDescriptor::Uuid), v);
    }

    #[test]
    fn uuid_with_wrong_digit_count_softly_nulls() {
        let config = CodecConfig::default();
        let mut w = ByteWriter::new();
        let v = CqlValue::Uuid("not-a-uuid".into());
        encode_cell(&mut w, &v, &TypeDescriptor::Uuid, &config).unwrap();
        assert_eq!(hex::encode(w.into_inner()), "ffffffff");
    }

    #[test]
    fn inet_v4_and_v6_roundtrip() {
        let v4 = CqlValue::Inet("192.168.0.1".into());
        assert_eq!(roundtrip(&v4, &TypeDescriptor::Inet), v4);
        let v6 = CqlValue::Inet("::1".into());
        assert_eq!(roundtrip(&v6, &TypeDescriptor::Inet), v6);
    }

    #[test]
    fn malformed_inet_literal_softly_nulls() {
        let config = CodecConfig::default();
        let mut w = ByteWriter::new();
        let v = CqlValue::Inet("not-an-address".into());
        encode_cell(&mut w, &v, &TypeDescriptor::Inet, &config).unwrap();
        assert_eq!(hex::encode(w.into_inner()), "ffffffff");
    }

    #[test]
    fn duration_roundtrips() {
        let v = CqlValue::Duration {
            months: 14,
            days: 3,
            nanos: 1_500_000_000,
        };
        assert_eq!(roundtrip(&v, &TypeDescriptor::Duration), v);
    }

    #[test]
    fn udt_rejects_field_order_mismatch() {
        let config = CodecConfig::default();
        let udt_ty = TypeDescriptor::Udt {
            keyspace: "ks".into(),
            name: "t".into(),
            fields: vec![
                ("a".into(), TypeDescriptor::Int),
                ("b".into(), TypeDescriptor::Int),
            ],
        };
        let v = CqlValue::Udt(vec![
            ("b".into(), CqlValue::I32(1)),
            ("a".into(), CqlValue::I32(2)),
        ]);
        let mut w = ByteWriter::new();
        assert!(encode_cell(&mut w, &v, &udt_ty, &config).is_err());
    }

    #[test]
    fn udt_roundtrips_with_all_fields_present() {
        let udt_ty = TypeDescriptor::Udt {
            keyspace: "ks".into(),
            name: "t".into(),
            fields: vec![
                ("a".into(), TypeDescriptor::Int),
                ("b".into(), TypeDescriptor::Text),
            ],
        };
        let v = CqlValue::Udt(vec![
            ("a".into(), CqlValue::I32(7)),
            ("b".into(), CqlValue::Text("hi".into())),
        ]);
        assert_eq!(roundtrip(&v, &udt_ty), v);
    }
}
