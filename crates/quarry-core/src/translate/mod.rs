//! Module: translate
//! Responsibility: turn a host sequence expression into an IR stage chain and
//! render it as either a filter/projection pair or an aggregation pipeline.
//! Does not own: executing documents against a store.
//! Boundary: `translate` is the only entry point; helpers stay crate-private.

mod bind;
mod evaluate;
mod nominate;
mod render;
mod replace;


pub use nominate::{CandidateSet, Nominator, first_rejected, nominate};
pub use replace::{ExpressionReplacer, replace, replace_all};

use crate::{
    codec::CodecError,
    config::ExecutionTarget,
    expr::{
        self, BinaryOp, ConstructionError, ExprArena, ExprId, ExprKind, HostExpr,
        SequenceOperator,
    },
    model::Namespace,
    obs::sink::{self, MetricsEvent, StageKind},
    translate::{
        bind::FieldBinder,
        evaluate::{Evaluator, fold_local_subtrees},
        render::{
            FilterRenderer, StageContext, TargetCapability, combine_filters, render_projection,
        },
    },
    value::{Value, ValueType},
};
use bson::{Document, doc};
use thiserror::Error as ThisError;

///
/// TranslateError
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum TranslateError {
    #[error("The {operator} query operator is not supported.")]
    UnsupportedOperator { operator: SequenceOperator },

    #[error("{document} has no member named '{member}'")]
    UnknownMember { document: String, member: String },

    #[error("The expression {expression} cannot be translated to a query document.")]
    UntranslatableExpression { expression: String },

    #[error("invalid arguments to {operator}: {reason}")]
    InvalidArguments {
        operator: SequenceOperator,
        reason: &'static str,
    },

    #[error("operator {op} cannot combine {left} and {right}")]
    InvalidOperands {
        op: BinaryOp,
        left: &'static str,
        right: &'static str,
    },

    #[error("cannot evaluate {expression}: {reason}")]
    Evaluation {
        expression: String,
        reason: &'static str,
    },

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

///
/// TranslatedQuery
///
/// Output of translation. For the `Query` target `filter`/`projection` are
/// populated and `pipeline` is empty; for `Pipeline` the reverse.
/// Keeps its own copy of the IR so results can be shaped after execution.
///

#[derive(Clone, Debug)]
pub struct TranslatedQuery {
    pub namespace: Namespace,
    pub target: ExecutionTarget,
    pub filter: Document,
    pub projection: Option<Document>,
    pub pipeline: Vec<Document>,
    arena: ExprArena,
    stages: ExprId,
    projector: ExprId,
    document: ExprId,
}

impl TranslatedQuery {
    #[must_use]
    pub const fn arena(&self) -> &ExprArena {
        &self.arena
    }

    /// Outermost IR stage (or the document parameter when no stage was built).
    #[must_use]
    pub const fn stages(&self) -> ExprId {
        self.stages
    }

    #[must_use]
    pub const fn projector(&self) -> ExprId {
        self.projector
    }

    /// Apply the final projector to one returned document.
    pub fn shape(&self, document: &Document) -> Result<Value, TranslateError> {
        Evaluator::over_row(&self.arena, document, self.document).evaluate(self.projector)
    }
}

///
/// Translate the sequence expression rooted at `root`.
///
/// The caller's arena is not modified; rewriting happens on a private copy.
///
pub fn translate(
    arena: &ExprArena,
    root: ExprId,
    target: ExecutionTarget,
) -> Result<TranslatedQuery, TranslateError> {
    sink::record(MetricsEvent::TranslateStart { target });

    let mut translator = Translator::new(arena.clone(), target);
    let result = if arena.contains(root) {
        translator.run(root)
    } else {
        Err(ConstructionError::UnknownExpression {
            node: "query",
            id: root,
        }
        .into())
    };

    sink::record(MetricsEvent::TranslateFinish {
        stages: translator.stages_built,
        failed: result.is_err(),
    });

    result
}

///
/// Bound
///
/// Stage chain built so far and the projector describing its current element.
///

#[derive(Clone, Copy, Debug)]
struct Bound {
    stage: ExprId,
    projector: ExprId,
    document: ExprId,
}

///
/// Translator
///

struct Translator {
    arena: ExprArena,
    target: ExecutionTarget,
    namespace: Option<Namespace>,
    stages_built: u64,
}

impl Translator {
    const fn new(arena: ExprArena, target: ExecutionTarget) -> Self {
        Self {
            arena,
            target,
            namespace: None,
            stages_built: 0,
        }
    }

    fn run(&mut self, root: ExprId) -> Result<TranslatedQuery, TranslateError> {
        self.reject_unsupported(root)?;

        let bound = self.bind_sequence(root)?;
        let namespace = self.namespace.clone().ok_or_else(|| {
            TranslateError::UntranslatableExpression {
                expression: expr::render(&self.arena, root),
            }
        })?;

        let mut chain = Vec::new();
        let mut cursor = bound.stage;
        loop {
            match self.arena.kind(cursor) {
                ExprKind::Match { source, .. } | ExprKind::Project { source, .. } => {
                    chain.push(cursor);
                    cursor = *source;
                }
                _ => break,
            }
        }
        chain.reverse();

        let (filter, projection, pipeline) = self.render_stages(&chain, bound.document)?;

        Ok(TranslatedQuery {
            namespace,
            target: self.target,
            filter,
            projection,
            pipeline,
            arena: self.arena.clone(),
            stages: bound.stage,
            projector: bound.projector,
            document: bound.document,
        })
    }

    // Every operator in the chain is checked before any stage is built.
    fn reject_unsupported(&self, root: ExprId) -> Result<(), TranslateError> {
        let mut cursor = root;
        while let ExprKind::Host(HostExpr::Sequence {
            operator, source, ..
        }) = self.arena.kind(cursor)
        {
            if !operator.is_supported() {
                sink::record(MetricsEvent::Rejected {
                    operator: *operator,
                });

                return Err(TranslateError::UnsupportedOperator {
                    operator: *operator,
                });
            }
            cursor = *source;
        }

        Ok(())
    }

    fn bind_sequence(&mut self, id: ExprId) -> Result<Bound, TranslateError> {
        match self.arena.kind(id).clone() {
            ExprKind::Host(HostExpr::Collection(namespace)) => {
                let element = self
                    .arena
                    .result_type(id)
                    .element()
                    .cloned()
                    .unwrap_or(ValueType::Any);
                let document = self.arena.parameter("document", element);
                self.namespace = Some(namespace);

                Ok(Bound {
                    stage: document,
                    projector: document,
                    document,
                })
            }
            ExprKind::Host(HostExpr::Sequence {
                operator,
                source,
                args,
            }) => {
                let bound = self.bind_sequence(source)?;
                match operator {
                    SequenceOperator::Where => self.bind_where(bound, &args),
                    SequenceOperator::Select => self.bind_select(bound, &args),
                    other => Err(TranslateError::UnsupportedOperator { operator: other }),
                }
            }
            _ => Err(TranslateError::UntranslatableExpression {
                expression: expr::render(&self.arena, id),
            }),
        }
    }

    ///
    /// Substitute the current projector for the lambda parameter, bind member
    /// chains to fields, then fold document-independent subtrees.
    ///
    fn lambda_body(
        &mut self,
        operator: SequenceOperator,
        args: &[ExprId],
        bound: Bound,
    ) -> Result<ExprId, TranslateError> {
        let [lambda] = args else {
            return Err(TranslateError::InvalidArguments {
                operator,
                reason: "expected exactly one lambda argument",
            });
        };
        let ExprKind::Host(HostExpr::Lambda { params, body }) = self.arena.kind(*lambda).clone()
        else {
            return Err(TranslateError::InvalidArguments {
                operator,
                reason: "argument is not a lambda",
            });
        };
        let [param] = params.as_slice() else {
            return Err(TranslateError::InvalidArguments {
                operator,
                reason: "lambda must take exactly one parameter",
            });
        };

        let body = replace(&mut self.arena, body, *param, bound.projector);
        let body = FieldBinder::new(&mut self.arena, bound.document).bind(body)?;

        fold_local_subtrees(&mut self.arena, body)
    }

    fn check(
        &self,
        body: ExprId,
        document: ExprId,
        context: StageContext,
    ) -> Result<(), TranslateError> {
        let capability = TargetCapability::new(document, context);
        let candidates = nominate(&self.arena, body, |arena, id| capability.supports(arena, id));
        match first_rejected(&self.arena, body, &candidates) {
            None => Ok(()),
            Some(culprit) => Err(TranslateError::UntranslatableExpression {
                expression: expr::render(&self.arena, culprit),
            }),
        }
    }

    fn bind_where(&mut self, bound: Bound, args: &[ExprId]) -> Result<Bound, TranslateError> {
        let predicate = self.lambda_body(SequenceOperator::Where, args, bound)?;
        self.check(predicate, bound.document, StageContext::Filter)?;

        let stage = self.arena.match_stage(Some(bound.stage), predicate)?;
        self.stage_built(StageKind::Match);

        Ok(Bound { stage, ..bound })
    }

    fn bind_select(&mut self, bound: Bound, args: &[ExprId]) -> Result<Bound, TranslateError> {
        let projector = self.lambda_body(SequenceOperator::Select, args, bound)?;
        self.check(projector, bound.document, StageContext::Projection)?;

        let stage = self.arena.project_stage(Some(bound.stage), projector)?;
        self.stage_built(StageKind::Project);

        Ok(Bound {
            stage,
            projector,
            document: bound.document,
        })
    }

    fn stage_built(&mut self, kind: StageKind) {
        self.stages_built = self.stages_built.saturating_add(1);
        sink::record(MetricsEvent::StageBuilt { kind });
    }

    fn render_stages(
        &self,
        chain: &[ExprId],
        document: ExprId,
    ) -> Result<(Document, Option<Document>, Vec<Document>), TranslateError> {
        let renderer = FilterRenderer::new(&self.arena);
        let mut filters = Vec::new();
        let mut projection = None;
        let mut pipeline = Vec::new();

        for stage in chain {
            match self.arena.kind(*stage) {
                ExprKind::Match { predicate, .. } => {
                    let filter = renderer.render(*predicate)?;
                    pipeline.push(doc! { "$match": filter.clone() });
                    filters.push(filter);
                }
                ExprKind::Project { projector, .. } => {
                    projection = render_projection(&self.arena, *projector, document);
                    if let Some(projection) = &projection {
                        pipeline.push(doc! { "$project": projection.clone() });
                    }
                }
                _ => {}
            }
        }

        Ok(match self.target {
            ExecutionTarget::Query => (combine_filters(filters), projection, Vec::new()),
            ExecutionTarget::Pipeline => (Document::new(), None, pipeline),
        })
    }
}
