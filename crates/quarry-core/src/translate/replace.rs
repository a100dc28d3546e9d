//! Module: translate::replace
//! Responsibility: identity-keyed substitution of subexpressions with minimal reconstruction.
//! Does not own: deciding what to substitute; callers supply `(from, to)` pairs.

use crate::{
    expr::{ConstructionError, ExprArena, ExprId, ExprKind},
    obs::sink::{self, MetricsEvent},
};

///
/// ExpressionReplacer
///
/// Replaces every occurrence of one node id with another. Parents are
/// reallocated only when a child actually changed, so a subtree without
/// `from` comes back as the same id.
///

pub struct ExpressionReplacer<'a> {
    arena: &'a mut ExprArena,
}

impl<'a> ExpressionReplacer<'a> {
    pub const fn new(arena: &'a mut ExprArena) -> Self {
        Self { arena }
    }

    pub fn replace(&mut self, node: ExprId, from: ExprId, to: ExprId) -> ExprId {
        let result = self.visit(node, from, to);

        sink::record(MetricsEvent::Substituted {
            changed: result != node,
        });

        result
    }

    /// Apply each `(from[i], to[i])` pair in order; each pass sees the output
    /// of the previous one.
    pub fn replace_all(
        &mut self,
        node: ExprId,
        from: &[ExprId],
        to: &[ExprId],
    ) -> Result<ExprId, ConstructionError> {
        if from.len() != to.len() {
            return Err(ConstructionError::SubstitutionArity {
                from: from.len(),
                to: to.len(),
            });
        }

        Ok(from
            .iter()
            .zip(to)
            .fold(node, |current, (from, to)| self.replace(current, *from, *to)))
    }

    fn visit(&mut self, id: ExprId, from: ExprId, to: ExprId) -> ExprId {
        if id == from {
            return to;
        }

        match self.arena.kind(id).clone() {
            // Fields keep their mapping and projection flag; only the inner expression moves.
            ExprKind::Field {
                inner,
                mapping,
                is_projected,
            } => {
                let replaced = self.visit(inner, from, to);
                if replaced == inner {
                    return id;
                }

                self.arena.alloc_field(replaced, mapping, is_projected)
            }

            ExprKind::Match { source, predicate } => {
                let new_source = self.visit(source, from, to);
                let new_predicate = self.visit(predicate, from, to);
                if new_source == source && new_predicate == predicate {
                    return id;
                }

                self.arena.alloc_match(new_source, new_predicate)
            }

            ExprKind::Project { source, projector } => {
                let new_source = self.visit(source, from, to);
                let new_projector = self.visit(projector, from, to);
                if new_source == source && new_projector == projector {
                    return id;
                }

                self.arena.alloc_project(new_source, new_projector)
            }

            ExprKind::Host(host) => {
                let children = host.children();
                let replaced: Vec<ExprId> = children
                    .iter()
                    .map(|child| self.visit(*child, from, to))
                    .collect();
                if replaced == children {
                    return id;
                }

                self.arena.rebuild_host(id, &replaced)
            }
        }
    }
}

/// Replace every occurrence of `from` in `node` with `to`.
pub fn replace(arena: &mut ExprArena, node: ExprId, from: ExprId, to: ExprId) -> ExprId {
    ExpressionReplacer::new(arena).replace(node, from, to)
}

/// Apply the pairs sequentially; later pairs see earlier substitutions.
pub fn replace_all(
    arena: &mut ExprArena,
    node: ExprId,
    from: &[ExprId],
    to: &[ExprId],
) -> Result<ExprId, ConstructionError> {
    ExpressionReplacer::new(arena).replace_all(node, from, to)
}
