//! Module: value
//! Responsibility: host-side literal values and the declared types attached to expressions.
//! Does not own: wire encoding (see `codec`) or expression structure.

#[cfg(test)]
mod tests;

use crate::model::DocumentModel;
use bson::{DateTime, oid::ObjectId};
use std::{cmp::Ordering, collections::BTreeMap, fmt, sync::Arc};

///
/// ValueType
///
/// Semantic type an expression evaluates to. Fixed when a node is built.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValueType {
    Any,
    Boolean,
    Int32,
    Int64,
    Double,
    String,
    ObjectId,
    DateTime,
    Array(Box<Self>),
    Document(Arc<DocumentModel>),
    Anonymous,
    Sequence(Box<Self>),
    Function(Box<Self>),
}

impl ValueType {
    #[must_use]
    pub fn array(element: Self) -> Self {
        Self::Array(Box::new(element))
    }

    #[must_use]
    pub fn sequence(element: Self) -> Self {
        Self::Sequence(Box::new(element))
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Double)
    }

    /// Identifier types carry the host-null marker instead of wire null.
    #[must_use]
    pub const fn is_identifier(&self) -> bool {
        matches!(self, Self::ObjectId)
    }

    /// Element type of an array or sequence type.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        match self {
            Self::Array(inner) | Self::Sequence(inner) => Some(inner),
            _ => None,
        }
    }

    #[must_use]
    pub fn document_model(&self) -> Option<&Arc<DocumentModel>> {
        match self {
            Self::Document(model) => Some(model),
            _ => None,
        }
    }

    /// Wider of two numeric types, used for arithmetic result typing.
    #[must_use]
    pub fn widen(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::String, Self::String) => Self::String,
            (left, right) if left.is_numeric() && right.is_numeric() => {
                if matches!(left, Self::Double) || matches!(right, Self::Double) {
                    Self::Double
                } else if matches!(left, Self::Int64) || matches!(right, Self::Int64) {
                    Self::Int64
                } else {
                    Self::Int32
                }
            }
            _ => Self::Any,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "Any"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::Double => write!(f, "Double"),
            Self::String => write!(f, "String"),
            Self::ObjectId => write!(f, "ObjectId"),
            Self::DateTime => write!(f, "DateTime"),
            Self::Array(inner) => write!(f, "Array<{inner}>"),
            Self::Document(model) => write!(f, "{}", model.name),
            Self::Anonymous => write!(f, "Anonymous"),
            Self::Sequence(inner) => write!(f, "Sequence<{inner}>"),
            Self::Function(inner) => write!(f, "Fn() -> {inner}"),
        }
    }
}

///
/// Value
///
/// Host literal. `Null` is the host absence sentinel; the codec decides how
/// it reaches the wire for each declared type.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    Text(String),
    ObjectId(ObjectId),
    DateTime(DateTime),
    List(Vec<Self>),
    Document(BTreeMap<String, Self>),
}

impl Value {
    /// Best-effort type inferred from the literal itself.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Null => ValueType::Any,
            Self::Bool(_) => ValueType::Boolean,
            Self::Int32(_) => ValueType::Int32,
            Self::Int64(_) => ValueType::Int64,
            Self::Double(_) => ValueType::Double,
            Self::Text(_) => ValueType::String,
            Self::ObjectId(_) => ValueType::ObjectId,
            Self::DateTime(_) => ValueType::DateTime,
            Self::List(items) => {
                let element = items
                    .first()
                    .map_or(ValueType::Any, Self::value_type);
                ValueType::array(element)
            }
            Self::Document(_) => ValueType::Anonymous,
        }
    }

    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Double(_) => "double",
            Self::Text(_) => "text",
            Self::ObjectId(_) => "object_id",
            Self::DateTime(_) => "date_time",
            Self::List(_) => "list",
            Self::Document(_) => "document",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int32(n) => Some(*n as f64),
            Self::Int64(n) => Some(*n as f64),
            Self::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub(crate) const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(n) => Some(*n as i64),
            Self::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Compare two values, widening numerics.
    /// Returns `None` when the values are not mutually ordered.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::ObjectId(a), Self::ObjectId(b)) => Some(a.bytes().cmp(&b.bytes())),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::List(a), Self::List(b)) if a == b => Some(Ordering::Equal),
            (Self::Document(a), Self::Document(b)) if a == b => Some(Ordering::Equal),
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
            },
        }
    }

    /// Look up a member on a document value.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Document(fields) => fields.get(name),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int32(n) => write!(f, "{n}"),
            Self::Int64(n) => write!(f, "{n}L"),
            Self::Double(n) => write!(f, "{n:?}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::ObjectId(id) => write!(f, "ObjectId({id})"),
            Self::DateTime(dt) => write!(f, "DateTime({})", dt.timestamp_millis()),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Document(fields) => {
                write!(f, "{{ ")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Self::ObjectId(value)
    }
}

impl From<Option<ObjectId>> for Value {
    fn from(value: Option<ObjectId>) -> Self {
        value.map_or(Self::Null, Self::ObjectId)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}
