//! Module: codec
//! Responsibility: encode host values into wire values and decode them back under a declared type.
//! Does not own: document framing or query rendering.
//! Boundary: translation embeds literals through `encode`; result shaping reads through `decode`.

#[cfg(test)]
mod tests;

use crate::{
    model::DocumentModel,
    value::{Value, ValueType},
};
use bson::{Bson, Document, oid::ObjectId, spec::ElementType};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// Reserved element marking a host-null identifier on the wire.
pub const HOST_NULL_MARKER: &str = "_hostnull";

///
/// CodecError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CodecError {
    #[error("Cannot deserialize {expected} from BsonType {found}.")]
    FormatMismatch { expected: String, found: String },

    #[error("cannot encode {value} value as {declared}")]
    UnsupportedValue { value: String, declared: String },
}

impl CodecError {
    fn mismatch(expected: &ValueType, wire: &Bson) -> Self {
        Self::FormatMismatch {
            expected: expected.to_string(),
            found: wire_type_name(wire.element_type()).to_string(),
        }
    }

    fn unsupported(value: &Value, declared: &ValueType) -> Self {
        Self::UnsupportedValue {
            value: value.kind_label().to_string(),
            declared: declared.to_string(),
        }
    }
}

/// Wire type name as reported in deserialization errors.
const fn wire_type_name(element: ElementType) -> &'static str {
    match element {
        ElementType::Double => "Double",
        ElementType::String => "String",
        ElementType::EmbeddedDocument => "Document",
        ElementType::Array => "Array",
        ElementType::Binary => "Binary",
        ElementType::Undefined => "Undefined",
        ElementType::ObjectId => "ObjectId",
        ElementType::Boolean => "Boolean",
        ElementType::DateTime => "DateTime",
        ElementType::Null => "Null",
        ElementType::RegularExpression => "RegularExpression",
        ElementType::DbPointer => "DbPointer",
        ElementType::JavaScriptCode => "JavaScript",
        ElementType::Symbol => "Symbol",
        ElementType::JavaScriptCodeWithScope => "JavaScriptWithScope",
        ElementType::Int32 => "Int32",
        ElementType::Timestamp => "Timestamp",
        ElementType::Int64 => "Int64",
        ElementType::Decimal128 => "Decimal128",
        ElementType::MaxKey => "MaxKey",
        ElementType::MinKey => "MinKey",
    }
}

///
/// ObjectIdCodec
///
/// Identifier codec. Host absence is written as a marker document rather
/// than wire null so the two stay distinguishable.
///

pub struct ObjectIdCodec;

impl ObjectIdCodec {
    #[must_use]
    pub fn encode(value: Option<ObjectId>) -> Bson {
        match value {
            Some(id) => Bson::ObjectId(id),
            None => Bson::Document(host_null_document()),
        }
    }

    pub fn decode(wire: &Bson) -> Result<Option<ObjectId>, CodecError> {
        match wire {
            Bson::Null => Ok(None),
            Bson::ObjectId(id) => Ok(Some(*id)),
            Bson::Document(doc) if is_host_null(doc) => Ok(None),
            other => Err(CodecError::mismatch(&ValueType::ObjectId, other)),
        }
    }
}

fn host_null_document() -> Document {
    let mut doc = Document::new();
    doc.insert(HOST_NULL_MARKER, true);

    doc
}

/// True when `doc` is exactly the host-null marker document.
#[must_use]
pub fn is_host_null(doc: &Document) -> bool {
    doc.len() == 1 && matches!(doc.get(HOST_NULL_MARKER), Some(Bson::Boolean(true)))
}

/// Encode a host value under its declared type.
pub fn encode(value: &Value, declared: &ValueType) -> Result<Bson, CodecError> {
    if declared.is_identifier() {
        return match value {
            Value::Null => Ok(ObjectIdCodec::encode(None)),
            Value::ObjectId(id) => Ok(ObjectIdCodec::encode(Some(*id))),
            other => Err(CodecError::unsupported(other, declared)),
        };
    }

    match (value, declared) {
        (Value::Null, _) => Ok(Bson::Null),
        (Value::Int32(n), ValueType::Int64) => Ok(Bson::Int64(i64::from(*n))),
        (Value::Int32(n), ValueType::Double) => Ok(Bson::Double(f64::from(*n))),
        (Value::Int64(n), ValueType::Int32) => i32::try_from(*n)
            .map(Bson::Int32)
            .map_err(|_| CodecError::unsupported(value, declared)),
        (Value::Int64(n), ValueType::Double) => Ok(Bson::Double(int64_as_f64(*n))),
        // The server compares numbers across widths, so a fractional literal
        // stays a double against integer fields.
        (Value::Double(n), ValueType::Int32 | ValueType::Int64) => Ok(Bson::Double(*n)),
        (Value::List(items), ValueType::Array(element)) => items
            .iter()
            .map(|item| encode(item, element))
            .collect::<Result<Vec<_>, _>>()
            .map(Bson::Array),
        (Value::Document(fields), ValueType::Document(model)) => {
            encode_document(fields, model).map(Bson::Document)
        }
        (_, ValueType::Any | ValueType::Anonymous) => encode_any(value),
        _ if type_matches(value, declared) => encode_any(value),
        _ => Err(CodecError::unsupported(value, declared)),
    }
}

fn type_matches(value: &Value, declared: &ValueType) -> bool {
    matches!(
        (value, declared),
        (Value::Bool(_), ValueType::Boolean)
            | (Value::Int32(_), ValueType::Int32)
            | (Value::Int64(_), ValueType::Int64)
            | (Value::Double(_), ValueType::Double)
            | (Value::Text(_), ValueType::String)
            | (Value::DateTime(_), ValueType::DateTime)
    )
}

fn encode_any(value: &Value) -> Result<Bson, CodecError> {
    Ok(match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Int32(n) => Bson::Int32(*n),
        Value::Int64(n) => Bson::Int64(*n),
        Value::Double(n) => Bson::Double(*n),
        Value::Text(s) => Bson::String(s.clone()),
        Value::ObjectId(id) => Bson::ObjectId(*id),
        Value::DateTime(dt) => Bson::DateTime(*dt),
        Value::List(items) => Bson::Array(items.iter().map(encode_any).collect::<Result<_, _>>()?),
        Value::Document(fields) => {
            let mut doc = Document::new();
            for (name, field) in fields {
                doc.insert(name.clone(), encode_any(field)?);
            }
            Bson::Document(doc)
        }
    })
}

// Member names are written under their mapped element names.
fn encode_document(
    fields: &BTreeMap<String, Value>,
    model: &DocumentModel,
) -> Result<Document, CodecError> {
    let mut doc = Document::new();
    for (member, value) in fields {
        match model.lookup(member) {
            Some(field) => doc.insert(field.element.clone(), encode(value, &field.ty)?),
            None => doc.insert(member.clone(), encode_any(value)?),
        };
    }

    Ok(doc)
}

/// Decode a wire value under its declared type.
pub fn decode(wire: &Bson, declared: &ValueType) -> Result<Value, CodecError> {
    if declared.is_identifier() {
        return ObjectIdCodec::decode(wire).map(Value::from);
    }

    match (wire, declared) {
        (Bson::Null, _) => Ok(Value::Null),
        (_, ValueType::Any | ValueType::Anonymous) => decode_any(wire),
        (Bson::Boolean(b), ValueType::Boolean) => Ok(Value::Bool(*b)),
        (Bson::Int32(n), ValueType::Int32) => Ok(Value::Int32(*n)),
        (Bson::Int32(n), ValueType::Int64) => Ok(Value::Int64(i64::from(*n))),
        (Bson::Int64(n), ValueType::Int64) => Ok(Value::Int64(*n)),
        (Bson::Int64(n), ValueType::Int32) => {
            Ok(i32::try_from(*n).map_or(Value::Int64(*n), Value::Int32))
        }
        (Bson::Int32(n), ValueType::Double) => Ok(Value::Double(f64::from(*n))),
        (Bson::Int64(n), ValueType::Double) => Ok(Value::Double(int64_as_f64(*n))),
        (Bson::Double(n), ValueType::Double) => Ok(Value::Double(*n)),
        // Numbers that do not fit the declared width keep their stored value.
        (Bson::Double(n), ValueType::Int32) => {
            Ok(whole_i64(*n)
                .and_then(|whole| i32::try_from(whole).ok())
                .map_or(Value::Double(*n), Value::Int32))
        }
        (Bson::Double(n), ValueType::Int64) => {
            Ok(whole_i64(*n).map_or(Value::Double(*n), Value::Int64))
        }
        (Bson::String(s), ValueType::String) => Ok(Value::Text(s.clone())),
        (Bson::DateTime(dt), ValueType::DateTime) => Ok(Value::DateTime(*dt)),
        (Bson::Array(items), ValueType::Array(element)) => items
            .iter()
            .map(|item| decode(item, element))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (Bson::Document(doc), ValueType::Document(model)) => decode_document(doc, model),
        _ => Err(CodecError::mismatch(declared, wire)),
    }
}

// 2^63; the first double past `i64::MAX`.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

#[expect(clippy::cast_precision_loss)]
const fn int64_as_f64(n: i64) -> f64 {
    n as f64
}

#[expect(clippy::cast_possible_truncation)]
fn whole_i64(n: f64) -> Option<i64> {
    (n.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&n)).then_some(n as i64)
}

fn decode_any(wire: &Bson) -> Result<Value, CodecError> {
    Ok(match wire {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(n) => Value::Int32(*n),
        Bson::Int64(n) => Value::Int64(*n),
        Bson::Double(n) => Value::Double(*n),
        Bson::String(s) => Value::Text(s.clone()),
        Bson::ObjectId(id) => Value::ObjectId(*id),
        Bson::DateTime(dt) => Value::DateTime(*dt),
        Bson::Array(items) => Value::List(items.iter().map(decode_any).collect::<Result<_, _>>()?),
        Bson::Document(doc) if is_host_null(doc) => Value::Null,
        Bson::Document(doc) => {
            let mut fields = BTreeMap::new();
            for (name, element) in doc {
                fields.insert(name.clone(), decode_any(element)?);
            }
            Value::Document(fields)
        }
        other => return Err(CodecError::mismatch(&ValueType::Any, other)),
    })
}

// Elements are read back under their mapped member names.
fn decode_document(doc: &Document, model: &DocumentModel) -> Result<Value, CodecError> {
    let mut fields = BTreeMap::new();
    for (element, wire) in doc {
        match model.lookup_element(element) {
            Some(field) => fields.insert(field.member.clone(), decode(wire, &field.ty)?),
            None => fields.insert(element.clone(), decode_any(wire)?),
        };
    }

    Ok(Value::Document(fields))
}

/// Resolve a dotted element path inside a document.
#[must_use]
pub fn lookup_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;

    for segment in segments {
        match current {
            Bson::Document(inner) => current = inner.get(segment)?,
            _ => return None,
        }
    }

    Some(current)
}
