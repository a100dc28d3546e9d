//! Module: translate::nominate
//! Responsibility: bottom-up discovery of subtrees that wholly satisfy a predicate.
//! Does not own: what the predicate means (target capability or local evaluability).

use crate::{
    expr::{ExprArena, ExprId},
    obs::sink::{self, MetricsEvent},
};
use derive_more::{Deref, IntoIterator};
use std::collections::BTreeSet;

///
/// CandidateSet
///
/// Node ids (by identity) whose whole subtree satisfied the predicate.
/// Ancestor/descendant overlap is kept; use `maximal` for a disjoint cover.
///

#[derive(Clone, Debug, Default, Deref, Eq, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct CandidateSet(BTreeSet<ExprId>);

impl CandidateSet {
    /// Candidates with no candidate ancestor under `root`, in pre-order.
    #[must_use]
    pub fn maximal(&self, arena: &ExprArena, root: ExprId) -> Vec<ExprId> {
        let mut out = Vec::new();
        self.collect_maximal(arena, root, &mut out);

        out
    }

    fn collect_maximal(&self, arena: &ExprArena, id: ExprId, out: &mut Vec<ExprId>) {
        if self.0.contains(&id) {
            if !out.contains(&id) {
                out.push(id);
            }
            return;
        }

        for child in arena.kind(id).children() {
            self.collect_maximal(arena, child, out);
        }
    }
}

///
/// Nominator
///
/// Single pass over a tree. A node is nominated only when none of its
/// descendants failed the predicate and it satisfies the predicate itself;
/// a failure anywhere blocks every ancestor up to the root while sibling
/// subtrees keep their own chance.
///

pub struct Nominator<P> {
    predicate: P,
}

impl<P> Nominator<P>
where
    P: Fn(&ExprArena, ExprId) -> bool,
{
    pub const fn new(predicate: P) -> Self {
        Self { predicate }
    }

    #[must_use]
    pub fn nominate(&self, arena: &ExprArena, root: ExprId) -> CandidateSet {
        let mut candidates = BTreeSet::new();
        self.visit(arena, root, &mut candidates);

        sink::record(MetricsEvent::Nominated {
            candidates: candidates.len() as u64,
        });

        CandidateSet(candidates)
    }

    // Returns whether this subtree is blocked.
    fn visit(&self, arena: &ExprArena, id: ExprId, candidates: &mut BTreeSet<ExprId>) -> bool {
        let mut blocked = false;
        for child in arena.kind(id).children() {
            // every child is visited, even after one has blocked
            blocked |= self.visit(arena, child, candidates);
        }

        if blocked {
            return true;
        }

        if (self.predicate)(arena, id) {
            candidates.insert(id);
            false
        } else {
            true
        }
    }
}

/// Nominate the subtrees of `root` that wholly satisfy `predicate`.
#[must_use]
pub fn nominate<P>(arena: &ExprArena, root: ExprId, predicate: P) -> CandidateSet
where
    P: Fn(&ExprArena, ExprId) -> bool,
{
    Nominator::new(predicate).nominate(arena, root)
}

///
/// Find the node responsible for `root` not being nominated: the first
/// non-candidate, in pre-order, whose children are all candidates.
///
#[must_use]
pub fn first_rejected(
    arena: &ExprArena,
    root: ExprId,
    candidates: &CandidateSet,
) -> Option<ExprId> {
    if candidates.contains(&root) {
        return None;
    }

    arena
        .kind(root)
        .children()
        .into_iter()
        .find_map(|child| first_rejected(arena, child, candidates))
        .or(Some(root))
}
