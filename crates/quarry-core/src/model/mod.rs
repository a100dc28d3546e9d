//! Module: model
//! Responsibility: document shape metadata used to map host members onto wire element paths.
//! Does not own: value encoding or query semantics.

#[cfg(test)]
mod tests;

use crate::{ID_ELEMENT, value::ValueType};
use std::{fmt, sync::Arc};

///
/// Namespace
///
/// Database + collection pair a query is bound to.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    #[must_use]
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

///
/// FieldModel
///
/// One host member and the wire element it is stored under.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldModel {
    pub member: String,
    pub element: String,
    pub ty: ValueType,
}

///
/// DocumentModel
///
/// Member-to-element mapping for one stored document shape.
/// Nested documents are modelled as fields of `ValueType::Document`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DocumentModel {
    pub name: String,
    pub fields: Vec<FieldModel>,
}

impl DocumentModel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a member stored under its own name.
    #[must_use]
    pub fn field(self, member: impl Into<String>, ty: ValueType) -> Self {
        let member = member.into();
        let element = member.clone();

        self.mapped_field(member, element, ty)
    }

    /// Add a member stored under an explicit element name.
    #[must_use]
    pub fn mapped_field(
        mut self,
        member: impl Into<String>,
        element: impl Into<String>,
        ty: ValueType,
    ) -> Self {
        self.fields.push(FieldModel {
            member: member.into(),
            element: element.into(),
            ty,
        });
        self
    }

    /// Add the identity member, stored under `_id`.
    #[must_use]
    pub fn id_field(self, member: impl Into<String>, ty: ValueType) -> Self {
        self.mapped_field(member, ID_ELEMENT, ty)
    }

    #[must_use]
    pub fn lookup(&self, member: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|field| field.member == member)
    }

    #[must_use]
    pub fn lookup_element(&self, element: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|field| field.element == element)
    }

    #[must_use]
    pub fn into_type(self) -> ValueType {
        ValueType::Document(Arc::new(self))
    }
}
