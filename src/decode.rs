//! Decoder: dispatches a `(bytes, TypeDescriptor)` pair to a per-type
//! decode routine, recursing into containers.
//!
//! Grounded on `decode.c` from the legacy driver (`decode_cell` and its
//! per-type helpers): the length-prefix/NULL handling, the DATE Julian-day
//! math, the TIME nanosecond split, and the DECIMAL exponent-string shape
//! all follow that source's behavior bit for bit. `bswap8/4/2` are not
//! reproduced — this crate reads big-endian directly via `ByteReader`
//! rather than conditionally byte-swapping on host endianness (see
//! SPEC_FULL.md's endian-neutrality note).

use crate::bignum::BigInt;
use crate::config::CodecConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::parser::vint::parse_vint;
use crate::reader::ByteReader;
use crate::value::CqlValue;

/// Decode one cell: reads the leading `int32` length (`-1` => `Null`),
/// then dispatches the payload window on `ty`.
pub fn decode_cell(reader: &mut ByteReader, ty: &TypeDescriptor, config: &CodecConfig) -> Result<CqlValue> {
    decode_cell_at_depth(reader, ty, config, 0)
}

fn decode_cell_at_depth(
    reader: &mut ByteReader,
    ty: &TypeDescriptor,
    config: &CodecConfig,
    depth: usize,
) -> Result<CqlValue> {
    if depth > config.max_nesting_depth {
        return Err(Error::overflow("value nesting exceeds configured maximum"));
    }
    match reader.read_bytes()? {
        None => Ok(CqlValue::Null),
        Some(window) => decode_value(window, ty, config, depth),
    }
}

fn check_len(type_name: &'static str, bytes: &[u8], expected: usize) -> Result<()> {
    if bytes.len() != expected {
        return Err(Error::length_mismatch(type_name, expected, bytes.len()));
    }
    Ok(())
}

fn decode_value(bytes: &[u8], ty: &TypeDescriptor, config: &CodecConfig, depth: usize) -> Result<CqlValue> {
    match ty {
        TypeDescriptor::Ascii | TypeDescriptor::Blob | TypeDescriptor::Custom(_) => {
            Ok(CqlValue::Bytes(bytes.to_vec()))
        }
        TypeDescriptor::Varchar | TypeDescriptor::Text => {
            let s = String::from_utf8(bytes.to_vec())
                .map_err(|e| Error::malformed_text(format!("invalid UTF-8 in TEXT/VARCHAR: {e}")))?;
            Ok(CqlValue::Text(s))
        }
        TypeDescriptor::Boolean => {
            check_len("BOOLEAN", bytes, 1)?;
            Ok(CqlValue::Bool(bytes[0] != 0))
        }
        TypeDescriptor::TinyInt => {
            check_len("TINYINT", bytes, 1)?;
            Ok(CqlValue::I8(bytes[0] as i8))
        }
        TypeDescriptor::SmallInt => {
            check_len("SMALLINT", bytes, 2)?;
            Ok(CqlValue::I16(i16::from_be_bytes(bytes.try_into().unwrap())))
        }
        TypeDescriptor::Int => {
            check_len("INT", bytes, 4)?;
            Ok(CqlValue::I32(i32::from_be_bytes(bytes.try_into().unwrap())))
        }
        TypeDescriptor::BigInt => {
            check_len("BIGINT", bytes, 8)?;
            Ok(CqlValue::I64(i64::from_be_bytes(bytes.try_into().unwrap())))
        }
        TypeDescriptor::Counter => {
            check_len("COUNTER", bytes, 8)?;
            Ok(CqlValue::I64(i64::from_be_bytes(bytes.try_into().unwrap())))
        }
        TypeDescriptor::Timestamp => {
            check_len("TIMESTAMP", bytes, 8)?;
            Ok(CqlValue::I64(i64::from_be_bytes(bytes.try_into().unwrap())))
        }
        TypeDescriptor::Float => {
            check_len("FLOAT", bytes, 4)?;
            Ok(CqlValue::F32(f32::from_be_bytes(bytes.try_into().unwrap())))
        }
        TypeDescriptor::Double => {
            check_len("DOUBLE", bytes, 8)?;
            Ok(CqlValue::F64(f64::from_be_bytes(bytes.try_into().unwrap())))
        }
        TypeDescriptor::Uuid | TypeDescriptor::TimeUuid => {
            check_len("UUID", bytes, 16)?;
            Ok(CqlValue::Uuid(format_uuid(bytes)))
        }
        TypeDescriptor::Inet => decode_inet(bytes),
        TypeDescriptor::VarInt => decode_varint(bytes, config).map(CqlValue::VarInt),
        TypeDescriptor::Decimal => decode_decimal(bytes, config),
        TypeDescriptor::Date => decode_date(bytes),
        TypeDescriptor::Time => decode_time(bytes),
        TypeDescriptor::Duration => decode_duration(bytes),
        TypeDescriptor::List(inner) => {
            decode_sequence(bytes, inner, config, depth).map(CqlValue::List)
        }
        TypeDescriptor::Set(inner) => {
            decode_sequence(bytes, inner, config, depth).map(CqlValue::Set)
        }
        TypeDescriptor::Map(key_ty, value_ty) => decode_map(bytes, key_ty, value_ty, config, depth),
        TypeDescriptor::Tuple(field_types) => decode_tuple(bytes, field_types, config, depth),
        TypeDescriptor::Udt { fields, .. } => decode_udt(bytes, fields, config, depth),
    }
}

/// Renders 16 raw bytes as a canonical lowercase `8-4-4-4-12` hex string.
fn format_uuid(bytes: &[u8]) -> String {
    let hex = hex::encode(bytes);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

fn decode_inet(bytes: &[u8]) -> Result<CqlValue> {
    match bytes.len() {
        4 => {
            let arr: [u8; 4] = bytes.try_into().unwrap();
            Ok(CqlValue::Inet(std::net::Ipv4Addr::from(arr).to_string()))
        }
        16 => {
            let arr: [u8; 16] = bytes.try_into().unwrap();
            Ok(CqlValue::Inet(std::net::Ipv6Addr::from(arr).to_string()))
        }
        other => Err(Error::length_mismatch("INET", 4, other)),
    }
}

fn is_canonical_twos_complement(bytes: &[u8]) -> bool {
    if bytes.len() < 2 {
        return true;
    }
    let top = bytes[0];
    let next = bytes[1];
    !((top == 0x00 && next & 0x80 == 0) || (top == 0xff && next & 0x80 != 0))
}

fn decode_varint(bytes: &[u8], config: &CodecConfig) -> Result<String> {
    if bytes.is_empty() {
        return Err(Error::length_mismatch("VARINT", 1, 0));
    }
    if config.canonicalize_varint && !is_canonical_twos_complement(bytes) {
        return Err(Error::range(
            "VARINT payload is not in canonical (shortest) two's-complement form",
        ));
    }
    Ok(BigInt::from_twos_complement_be(bytes).to_decimal_string())
}

fn decode_decimal(bytes: &[u8], config: &CodecConfig) -> Result<CqlValue> {
    if bytes.len() < 5 {
        return Err(Error::length_mismatch("DECIMAL", 5, bytes.len()));
    }
    let scale = i32::from_be_bytes(bytes[0..4].try_into().unwrap());
    let unscaled = decode_varint(&bytes[4..], config)?;
    if scale == 0 {
        return Ok(CqlValue::Decimal(unscaled));
    }
    let exponent = -(scale as i64);
    let rendered = if exponent > 0 {
        format!("{unscaled}e+{exponent}")
    } else {
        format!("{unscaled}e{exponent}")
    };
    Ok(CqlValue::Decimal(rendered))
}

/// Floor division: rounds toward negative infinity rather than toward
/// zero, as the DATE inverse formula requires on negative operands.
pub(crate) fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

pub(crate) const DATE_EPOCH_OFFSET: i64 = (1i64 << 31) - 2_440_588;

fn decode_date(bytes: &[u8]) -> Result<CqlValue> {
    check_len("DATE", bytes, 4)?;
    let d = u32::from_be_bytes(bytes.try_into().unwrap()) as i64;
    let jdn = d - DATE_EPOCH_OFFSET;
    let (y, m, day) = jdn_to_ymd(jdn);
    Ok(CqlValue::Date(format!("{y}-{m:02}-{day:02}")))
}

fn jdn_to_ymd(j: i64) -> (i64, i64, i64) {
    let f = j + 1401 + floor_div(floor_div(4 * j + 274_277, 146_097) * 3, 4) - 38;
    let e = 4 * f + 3;
    let g = floor_div(e.rem_euclid(1461), 4);
    let h = 5 * g + 2;
    let day = floor_div(h.rem_euclid(153), 5) + 1;
    let m = (floor_div(h, 153) + 2).rem_euclid(12) + 1;
    let y = floor_div(e, 1461) - 4716 + floor_div(12 + 2 - m, 12);
    (y, m, day)
}

fn decode_time(bytes: &[u8]) -> Result<CqlValue> {
    check_len("TIME", bytes, 8)?;
    let total_nanos = i64::from_be_bytes(bytes.try_into().unwrap());
    if !(0..=86_399_999_999_999).contains(&total_nanos) {
        return Err(Error::range(format!(
            "TIME nanoseconds-of-day {total_nanos} out of range"
        )));
    }
    let nanos = total_nanos % 1_000_000_000;
    let total_seconds = total_nanos / 1_000_000_000;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;

    let mut rendered = format!("{hours}:{minutes:02}:{seconds:02}");
    if nanos != 0 {
        let mut frac = format!("{nanos:09}");
        while frac.ends_with('0') {
            frac.pop();
        }
        if !frac.is_empty() {
            rendered.push('.');
            rendered.push_str(&frac);
        }
    }
    Ok(CqlValue::Time(rendered))
}

fn decode_duration(bytes: &[u8]) -> Result<CqlValue> {
    let (rest, months) =
        parse_vint(bytes).map_err(|_| Error::malformed_text("malformed DURATION months"))?;
    let (rest, days) =
        parse_vint(rest).map_err(|_| Error::malformed_text("malformed DURATION days"))?;
    let (rest, nanos) =
        parse_vint(rest).map_err(|_| Error::malformed_text("malformed DURATION nanoseconds"))?;
    if !rest.is_empty() {
        return Err(Error::length_mismatch(
            "DURATION",
            bytes.len() - rest.len(),
            bytes.len(),
        ));
    }
    Ok(CqlValue::Duration {
        months: months as i32,
        days: days as i32,
        nanos,
    })
}

fn decode_sequence(
    bytes: &[u8],
    inner: &TypeDescriptor,
    config: &CodecConfig,
    depth: usize,
) -> Result<Vec<CqlValue>> {
    let mut reader = ByteReader::new(bytes);
    let count = reader.read_i32()?;
    if count < 0 {
        return Err(Error::range(format!("negative container count {count}")));
    }
    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(decode_cell_at_depth(&mut reader, inner, config, depth + 1)?);
    }
    Ok(items)
}

fn decode_map(
    bytes: &[u8],
    key_ty: &TypeDescriptor,
    value_ty: &TypeDescriptor,
    config: &CodecConfig,
    depth: usize,
) -> Result<CqlValue> {
    let mut reader = ByteReader::new(bytes);
    let count = reader.read_i32()?;
    if count < 0 {
        return Err(Error::range(format!("negative container count {count}")));
    }
    let mut pairs = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let key = decode_cell_at_depth(&mut reader, key_ty, config, depth + 1)?;
        let value = decode_cell_at_depth(&mut reader, value_ty, config, depth + 1)?;
        pairs.push((key, value));
    }
    Ok(CqlValue::Map(pairs))
}

fn decode_tuple(
    bytes: &[u8],
    field_types: &[TypeDescriptor],
    config: &CodecConfig,
    depth: usize,
) -> Result<CqlValue> {
    let mut reader = ByteReader::new(bytes);
    let mut fields = Vec::with_capacity(field_types.len());
    for field_ty in field_types {
        fields.push(decode_cell_at_depth(&mut reader, field_ty, config, depth + 1)?);
    }
    Ok(CqlValue::Tuple(fields))
}

/// UDT fields decode in declaration order; if the window runs out early
/// the remaining declared fields default to `Null` rather than erroring —
/// a server sending an older row shape than the client's schema is normal.
fn decode_udt(
    bytes: &[u8],
    declared_fields: &[(String, TypeDescriptor)],
    config: &CodecConfig,
    depth: usize,
) -> Result<CqlValue> {
    let mut reader = ByteReader::new(bytes);
    let mut fields = Vec::with_capacity(declared_fields.len());
    for (name, field_ty) in declared_fields {
        if reader.is_empty() {
            fields.push((name.clone(), CqlValue::Null));
            continue;
        }
        let value = decode_cell_at_depth(&mut reader, field_ty, config, depth + 1)?;
        fields.push((name.clone(), value));
    }
    Ok(CqlValue::Udt(fields))
}
