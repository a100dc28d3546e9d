//! Module: translate::bind
//! Responsibility: turn member chains rooted at the stored document into `Field` nodes.
//! Does not own: deciding whether a bound body can be expressed on the wire.
//! Boundary: runs after parameter substitution and local folding.

use crate::{
    expr::{ExprArena, ExprId, ExprKind, FieldMapping, HostExpr},
    translate::{TranslateError, replace::replace_all},
};

///
/// Resolution
///
/// What a node stands for once member chains are followed. Each variant
/// carries the id that should replace the resolved node.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Resolution {
    Root(ExprId),
    Field(ExprId),
    Object(ExprId),
    Other(ExprId),
}

impl Resolution {
    const fn id(self) -> ExprId {
        match self {
            Self::Root(id) | Self::Field(id) | Self::Object(id) | Self::Other(id) => id,
        }
    }
}

///
/// FieldBinder
///

pub(crate) struct FieldBinder<'a> {
    arena: &'a mut ExprArena,
    document: ExprId,
}

impl<'a> FieldBinder<'a> {
    pub(crate) const fn new(arena: &'a mut ExprArena, document: ExprId) -> Self {
        Self { arena, document }
    }

    pub(crate) fn bind(mut self, body: ExprId) -> Result<ExprId, TranslateError> {
        let mut from = Vec::new();
        let mut to = Vec::new();
        self.collect(body, &mut from, &mut to)?;

        // A shared chain can sit inside another one (`a` within `a.b`);
        // replacing the larger chain first keeps the smaller one reachable.
        let mut pairs: Vec<(ExprId, ExprId)> = from.into_iter().zip(to).collect();
        pairs.sort_by_key(|(from, _)| std::cmp::Reverse(subtree_size(self.arena, *from)));
        let (from, to): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();

        Ok(replace_all(self.arena, body, &from, &to)?)
    }

    fn collect(
        &mut self,
        id: ExprId,
        from: &mut Vec<ExprId>,
        to: &mut Vec<ExprId>,
    ) -> Result<(), TranslateError> {
        match self.arena.kind(id) {
            // already bound; its inner chain belongs to the field
            ExprKind::Field { .. } => return Ok(()),
            ExprKind::Host(HostExpr::Member { .. }) => {
                let resolved = self.resolve(id)?.id();
                if resolved != id {
                    if !from.contains(&id) {
                        from.push(id);
                        to.push(resolved);
                    }
                    return Ok(());
                }
            }
            _ => {}
        }

        for child in self.arena.kind(id).children() {
            self.collect(child, from, to)?;
        }

        Ok(())
    }

    fn resolve(&mut self, id: ExprId) -> Result<Resolution, TranslateError> {
        if id == self.document {
            return Ok(Resolution::Root(id));
        }

        match self.arena.kind(id).clone() {
            ExprKind::Field { .. } => Ok(Resolution::Field(id)),
            ExprKind::Host(HostExpr::NewObject { .. }) => Ok(Resolution::Object(id)),
            ExprKind::Host(HostExpr::Member { target, member }) => {
                let target = self.resolve(target)?;
                self.resolve_member(id, target, &member)
            }
            _ => Ok(Resolution::Other(id)),
        }
    }

    fn resolve_member(
        &mut self,
        id: ExprId,
        target: Resolution,
        member: &str,
    ) -> Result<Resolution, TranslateError> {
        match target {
            Resolution::Root(root) => {
                let ty = self.arena.result_type(root);
                let model = ty
                    .document_model()
                    .ok_or_else(|| TranslateError::UnknownMember {
                        document: ty.to_string(),
                        member: member.to_string(),
                    })?;
                let field = model
                    .lookup(member)
                    .ok_or_else(|| TranslateError::UnknownMember {
                        document: model.name.clone(),
                        member: member.to_string(),
                    })?;
                let mapping = FieldMapping::new(field.element.clone(), field.ty.clone());

                Ok(Resolution::Field(self.arena.alloc_field(id, mapping, false)))
            }
            Resolution::Field(field) => {
                let ExprKind::Field {
                    mapping,
                    is_projected,
                    ..
                } = self.arena.kind(field).clone()
                else {
                    return Ok(Resolution::Other(id));
                };
                let model = mapping.ty.document_model().ok_or_else(|| {
                    TranslateError::UnknownMember {
                        document: mapping.ty.to_string(),
                        member: member.to_string(),
                    }
                })?;
                let nested = model
                    .lookup(member)
                    .ok_or_else(|| TranslateError::UnknownMember {
                        document: model.name.clone(),
                        member: member.to_string(),
                    })?;
                let mapping = mapping.nested(&nested.element, nested.ty.clone());

                Ok(Resolution::Field(
                    self.arena.alloc_field(id, mapping, is_projected),
                ))
            }
            Resolution::Object(object) => {
                let ExprKind::Host(HostExpr::NewObject { members }) = self.arena.kind(object)
                else {
                    return Ok(Resolution::Other(id));
                };
                let value = members
                    .iter()
                    .find(|(name, _)| name == member)
                    .map(|(_, value)| *value)
                    .ok_or_else(|| TranslateError::UnknownMember {
                        document: "anonymous object".to_string(),
                        member: member.to_string(),
                    })?;

                match self.resolve(value)? {
                    Resolution::Field(field) => Ok(Resolution::Field(self.projected(field))),
                    other => Ok(other),
                }
            }
            Resolution::Other(_) => Ok(Resolution::Other(id)),
        }
    }

    // A field reached through a projection is marked as projected.
    fn projected(&mut self, field: ExprId) -> ExprId {
        match self.arena.kind(field).clone() {
            ExprKind::Field {
                inner,
                mapping,
                is_projected: false,
            } => self.arena.alloc_field(inner, mapping, true),
            _ => field,
        }
    }
}

fn subtree_size(arena: &ExprArena, id: ExprId) -> usize {
    1 + arena
        .kind(id)
        .children()
        .into_iter()
        .map(|child| subtree_size(arena, child))
        .sum::<usize>()
}
