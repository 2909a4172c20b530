//! Parser and writer for the recursive `<type>` descriptor used in result
//! metadata and prepared-statement signatures.
//!
//! Grounded on the legacy driver's `unpack_type_nocroak`/`cc_type_destroy`
//! (`type.c`): same tag table, same legacy Java-marshal-class-name rewrite.
//! Where the original gave up on UDT and TUPLE (`return -3`, matching
//! comment "not implemented"), this parser fully recurses into them —
//! their wire shape is already in the native protocol and the original's
//! gap was a driver limitation, not a protocol one.

use crate::config::CodecConfig;
use crate::error::{Error, Result};
use crate::reader::ByteReader;
use crate::writer::ByteWriter;
use serde::{Deserialize, Serialize};

const TAG_CUSTOM: u16 = 0x00;
const TAG_ASCII: u16 = 0x01;
const TAG_BIGINT: u16 = 0x02;
const TAG_BLOB: u16 = 0x03;
const TAG_BOOLEAN: u16 = 0x04;
const TAG_COUNTER: u16 = 0x05;
const TAG_DECIMAL: u16 = 0x06;
const TAG_DOUBLE: u16 = 0x07;
const TAG_FLOAT: u16 = 0x08;
const TAG_INT: u16 = 0x09;
const TAG_TEXT: u16 = 0x0A;
const TAG_TIMESTAMP: u16 = 0x0B;
const TAG_UUID: u16 = 0x0C;
const TAG_VARCHAR: u16 = 0x0D;
const TAG_VARINT: u16 = 0x0E;
const TAG_TIMEUUID: u16 = 0x0F;
const TAG_INET: u16 = 0x10;
const TAG_DATE: u16 = 0x11;
const TAG_TIME: u16 = 0x12;
const TAG_SMALLINT: u16 = 0x13;
const TAG_TINYINT: u16 = 0x14;
const TAG_DURATION: u16 = 0x15;
const TAG_LIST: u16 = 0x20;
const TAG_MAP: u16 = 0x21;
const TAG_SET: u16 = 0x22;
const TAG_UDT: u16 = 0x30;
const TAG_TUPLE: u16 = 0x31;

const MARSHAL_PREFIX: &str = "org.apache.cassandra.db.marshal.";

/// A recursive CQL type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeDescriptor {
    /// Unrecognised class name, retained verbatim.
    Custom(String),
    Ascii,
    BigInt,
    Blob,
    Boolean,
    Counter,
    Decimal,
    Double,
    Float,
    Int,
    Text,
    Timestamp,
    Uuid,
    Varchar,
    VarInt,
    TimeUuid,
    Inet,
    Date,
    Time,
    SmallInt,
    TinyInt,
    /// Three-varint duration (months, days, nanoseconds) — not in the
    /// legacy driver's worked examples, but its tag is reserved in the
    /// native protocol's type table and left unparseable otherwise.
    Duration,
    List(Box<TypeDescriptor>),
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Set(Box<TypeDescriptor>),
    Udt {
        keyspace: String,
        name: String,
        fields: Vec<(String, TypeDescriptor)>,
    },
    Tuple(Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Parse a descriptor from `reader`, honoring `config.max_nesting_depth`.
    pub fn parse(reader: &mut ByteReader, config: &CodecConfig) -> Result<Self> {
        Self::parse_at_depth(reader, config, 0)
    }

    fn parse_at_depth(reader: &mut ByteReader, config: &CodecConfig, depth: usize) -> Result<Self> {
        if depth > config.max_nesting_depth {
            return Err(Error::overflow(
                "type descriptor nesting exceeds configured maximum",
            ));
        }

        let tag = reader.read_short()?;
        Ok(match tag {
            TAG_CUSTOM => {
                let class_name = reader.read_string()?;
                rewrite_legacy_class_name(&class_name)
                    .unwrap_or(TypeDescriptor::Custom(class_name))
            }
            TAG_ASCII => TypeDescriptor::Ascii,
            TAG_BIGINT => TypeDescriptor::BigInt,
            TAG_BLOB => TypeDescriptor::Blob,
            TAG_BOOLEAN => TypeDescriptor::Boolean,
            TAG_COUNTER => TypeDescriptor::Counter,
            TAG_DECIMAL => TypeDescriptor::Decimal,
            TAG_DOUBLE => TypeDescriptor::Double,
            TAG_FLOAT => TypeDescriptor::Float,
            TAG_INT => TypeDescriptor::Int,
            TAG_TEXT => TypeDescriptor::Text,
            TAG_TIMESTAMP => TypeDescriptor::Timestamp,
            TAG_UUID => TypeDescriptor::Uuid,
            TAG_VARCHAR => TypeDescriptor::Varchar,
            TAG_VARINT => TypeDescriptor::VarInt,
            TAG_TIMEUUID => TypeDescriptor::TimeUuid,
            TAG_INET => TypeDescriptor::Inet,
            TAG_DATE => TypeDescriptor::Date,
            TAG_TIME => TypeDescriptor::Time,
            TAG_SMALLINT => TypeDescriptor::SmallInt,
            TAG_TINYINT => TypeDescriptor::TinyInt,
            TAG_DURATION => TypeDescriptor::Duration,
            TAG_LIST => {
                let inner = Self::parse_at_depth(reader, config, depth + 1)?;
                TypeDescriptor::List(Box::new(inner))
            }
            TAG_SET => {
                let inner = Self::parse_at_depth(reader, config, depth + 1)?;
                TypeDescriptor::Set(Box::new(inner))
            }
            TAG_MAP => {
                let key = Self::parse_at_depth(reader, config, depth + 1)?;
                let value = Self::parse_at_depth(reader, config, depth + 1)?;
                TypeDescriptor::Map(Box::new(key), Box::new(value))
            }
            TAG_UDT => {
                let keyspace = reader.read_string()?;
                let name = reader.read_string()?;
                let field_count = reader.read_short()?;
                let mut fields = Vec::with_capacity(field_count as usize);
                for _ in 0..field_count {
                    let field_name = reader.read_string()?;
                    let field_type = Self::parse_at_depth(reader, config, depth + 1)?;
                    fields.push((field_name, field_type));
                }
                TypeDescriptor::Udt {
                    keyspace,
                    name,
                    fields,
                }
            }
            TAG_TUPLE => {
                let field_count = reader.read_short()?;
                let mut fields = Vec::with_capacity(field_count as usize);
                for _ in 0..field_count {
                    fields.push(Self::parse_at_depth(reader, config, depth + 1)?);
                }
                TypeDescriptor::Tuple(fields)
            }
            other => return Err(Error::unknown_type(format!("0x{other:04x}"))),
        })
    }

    /// Serialize back to the tag-based wire form. Used by embedders that
    /// construct descriptors in-process and by the round-trip test suite;
    /// always emits the native tag form, never the legacy marshal names.
    pub fn write(&self, writer: &mut ByteWriter) -> Result<()> {
        match self {
            TypeDescriptor::Custom(name) => {
                writer.write_short(TAG_CUSTOM);
                writer.write_string(name)?;
            }
            TypeDescriptor::Ascii => writer.write_short(TAG_ASCII),
            TypeDescriptor::BigInt => writer.write_short(TAG_BIGINT),
            TypeDescriptor::Blob => writer.write_short(TAG_BLOB),
            TypeDescriptor::Boolean => writer.write_short(TAG_BOOLEAN),
            TypeDescriptor::Counter => writer.write_short(TAG_COUNTER),
            TypeDescriptor::Decimal => writer.write_short(TAG_DECIMAL),
            TypeDescriptor::Double => writer.write_short(TAG_DOUBLE),
            TypeDescriptor::Float => writer.write_short(TAG_FLOAT),
            TypeDescriptor::Int => writer.write_short(TAG_INT),
            TypeDescriptor::Text => writer.write_short(TAG_TEXT),
            TypeDescriptor::Timestamp => writer.write_short(TAG_TIMESTAMP),
            TypeDescriptor::Uuid => writer.write_short(TAG_UUID),
            TypeDescriptor::Varchar => writer.write_short(TAG_VARCHAR),
            TypeDescriptor::VarInt => writer.write_short(TAG_VARINT),
            TypeDescriptor::TimeUuid => writer.write_short(TAG_TIMEUUID),
            TypeDescriptor::Inet => writer.write_short(TAG_INET),
            TypeDescriptor::Date => writer.write_short(TAG_DATE),
            TypeDescriptor::Time => writer.write_short(TAG_TIME),
            TypeDescriptor::SmallInt => writer.write_short(TAG_SMALLINT),
            TypeDescriptor::TinyInt => writer.write_short(TAG_TINYINT),
            TypeDescriptor::Duration => writer.write_short(TAG_DURATION),
            TypeDescriptor::List(inner) => {
                writer.write_short(TAG_LIST);
                inner.write(writer)?;
            }
            TypeDescriptor::Set(inner) => {
                writer.write_short(TAG_SET);
                inner.write(writer)?;
            }
            TypeDescriptor::Map(key, value) => {
                writer.write_short(TAG_MAP);
                key.write(writer)?;
                value.write(writer)?;
            }
            TypeDescriptor::Udt {
                keyspace,
                name,
                fields,
            } => {
                writer.write_short(TAG_UDT);
                writer.write_string(keyspace)?;
                writer.write_string(name)?;
                let count: u16 = fields
                    .len()
                    .try_into()
                    .map_err(|_| Error::overflow("UDT field count exceeds u16::MAX"))?;
                writer.write_short(count);
                for (field_name, field_type) in fields {
                    writer.write_string(field_name)?;
                    field_type.write(writer)?;
                }
            }
            TypeDescriptor::Tuple(fields) => {
                writer.write_short(TAG_TUPLE);
                let count: u16 = fields
                    .len()
                    .try_into()
                    .map_err(|_| Error::overflow("tuple field count exceeds u16::MAX"))?;
                writer.write_short(count);
                for field_type in fields {
                    field_type.write(writer)?;
                }
            }
        }
        Ok(())
    }
}

fn rewrite_legacy_class_name(class_name: &str) -> Option<TypeDescriptor> {
    let suffix = class_name.strip_prefix(MARSHAL_PREFIX)?;
    Some(match suffix {
        "UTF8Type" => TypeDescriptor::Varchar,
        "UUIDType" => TypeDescriptor::Uuid,
        "TimeType" => TypeDescriptor::Time,
        "ByteType" => TypeDescriptor::TinyInt,
        "DateType" | "SimpleDateType" => TypeDescriptor::Date,
        "LongType" => TypeDescriptor::BigInt,
        "AsciiType" => TypeDescriptor::Ascii,
        "Int32Type" => TypeDescriptor::Int,
        "BytesType" => TypeDescriptor::Blob,
        "FloatType" => TypeDescriptor::Float,
        "ShortType" => TypeDescriptor::SmallInt,
        "DoubleType" => TypeDescriptor::Double,
        "BooleanType" => TypeDescriptor::Boolean,
        "DecimalType" => TypeDescriptor::Decimal,
        "IntegerType" => TypeDescriptor::VarInt,
        "TimeUUIDType" => TypeDescriptor::TimeUuid,
        "TimestampType" => TypeDescriptor::Timestamp,
        "InetAddressType" => TypeDescriptor::Inet,
        "CounterColumnType" => TypeDescriptor::Counter,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(t: &TypeDescriptor) -> TypeDescriptor {
        let config = CodecConfig::default();
        let mut writer = ByteWriter::new();
        t.write(&mut writer).unwrap();
        let bytes = writer.into_inner();
        let mut reader = ByteReader::new(&bytes);
        TypeDescriptor::parse(&mut reader, &config).unwrap()
    }

    #[test]
    fn primitive_roundtrips() {
        for t in [
            TypeDescriptor::Ascii,
            TypeDescriptor::BigInt,
            TypeDescriptor::Boolean,
            TypeDescriptor::Uuid,
            TypeDescriptor::VarInt,
            TypeDescriptor::Duration,
        ] {
            assert_eq!(roundtrip(&t), t);
        }
    }

    #[test]
    fn nested_container_roundtrips() {
        let t = TypeDescriptor::Map(
            Box::new(TypeDescriptor::Text),
            Box::new(TypeDescriptor::List(Box::new(TypeDescriptor::Int))),
        );
        assert_eq!(roundtrip(&t), t);
    }

    #[test]
    fn udt_roundtrips_with_field_order() {
        let t = TypeDescriptor::Udt {
            keyspace: "ks".into(),
            name: "address".into(),
            fields: vec![
                ("street".into(), TypeDescriptor::Text),
                ("zip".into(), TypeDescriptor::Int),
            ],
        };
        assert_eq!(roundtrip(&t), t);
    }

    #[test]
    fn tuple_roundtrips() {
        let t = TypeDescriptor::Tuple(vec![TypeDescriptor::Int, TypeDescriptor::Text]);
        assert_eq!(roundtrip(&t), t);
    }

    #[test]
    fn legacy_marshal_name_rewrites_to_native_tag() {
        let config = CodecConfig::default();
        let mut writer = ByteWriter::new();
        writer.write_short(TAG_CUSTOM);
        writer
            .write_string("org.apache.cassandra.db.marshal.UTF8Type")
            .unwrap();
        let bytes = writer.into_inner();
        let mut reader = ByteReader::new(&bytes);
        let parsed = TypeDescriptor::parse(&mut reader, &config).unwrap();
        assert_eq!(parsed, TypeDescriptor::Varchar);
    }

    #[test]
    fn unrecognised_custom_class_name_is_retained() {
        let config = CodecConfig::default();
        let mut writer = ByteWriter::new();
        writer.write_short(TAG_CUSTOM);
        writer.write_string("com.example.MyType").unwrap();
        let bytes = writer.into_inner();
        let mut reader = ByteReader::new(&bytes);
        let parsed = TypeDescriptor::parse(&mut reader, &config).unwrap();
        assert_eq!(parsed, TypeDescriptor::Custom("com.example.MyType".into()));
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let config = CodecConfig::default();
        let mut writer = ByteWriter::new();
        writer.write_short(0x99);
        let bytes = writer.into_inner();
        let mut reader = ByteReader::new(&bytes);
        assert!(matches!(
            TypeDescriptor::parse(&mut reader, &config),
            Err(Error::UnknownType(_))
        ));
    }

    #[test]
    fn nesting_beyond_configured_depth_fails() {
        let config = CodecConfig::default().with_max_nesting_depth(1);
        let t = TypeDescriptor::List(Box::new(TypeDescriptor::List(Box::new(
            TypeDescriptor::Int,
        ))));
        let mut writer = ByteWriter::new();
        t.write(&mut writer).unwrap();
        let bytes = writer.into_inner();
        let mut reader = ByteReader::new(&bytes);
        assert!(matches!(
            TypeDescriptor::parse(&mut reader, &config),
            Err(Error::Overflow(_))
        ));
    }
}
