use crate::{
    codec::CodecError, config::ConfigError, expr::ConstructionError, query::ExecutionError,
    translate::TranslateError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error for everything a queryable can surface. Each variant keeps
/// its source error intact so callers can match on the exact failure; the
/// class/origin pair gives a stable coarse classification.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl Error {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Translate(err) => match err {
                TranslateError::UnsupportedOperator { .. }
                | TranslateError::UntranslatableExpression { .. } => ErrorClass::Unsupported,
                TranslateError::UnknownMember { .. }
                | TranslateError::InvalidArguments { .. }
                | TranslateError::InvalidOperands { .. }
                | TranslateError::Evaluation { .. } => ErrorClass::InvalidInput,
                TranslateError::Construction(_) => ErrorClass::InvariantViolation,
                TranslateError::Codec(_) => ErrorClass::Format,
            },
            Self::Codec(_) => ErrorClass::Format,
            Self::Construction(_) => ErrorClass::InvariantViolation,
            Self::Config(_) => ErrorClass::InvalidInput,
            Self::Execution(_) => ErrorClass::Internal,
        }
    }

    #[must_use]
    pub const fn origin(&self) -> ErrorOrigin {
        match self {
            Self::Translate(TranslateError::Codec(_)) | Self::Codec(_) => ErrorOrigin::Codec,
            Self::Translate(_) => ErrorOrigin::Translate,
            Self::Construction(_) => ErrorOrigin::Expression,
            Self::Config(_) => ErrorOrigin::Config,
            Self::Execution(_) => ErrorOrigin::Executor,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {self}", self.origin(), self.class())
    }
}

///
/// ErrorClass
/// Error taxonomy for coarse runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Unsupported,
    InvalidInput,
    Format,
    InvariantViolation,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Unsupported => "unsupported",
            Self::InvalidInput => "invalid_input",
            Self::Format => "format",
            Self::InvariantViolation => "invariant_violation",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which layer raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Expression,
    Translate,
    Codec,
    Config,
    Executor,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Expression => "expression",
            Self::Translate => "translate",
            Self::Codec => "codec",
            Self::Config => "config",
            Self::Executor => "executor",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::SequenceOperator;

    #[test]
    fn unsupported_operator_is_classified_and_keeps_message() {
        let err = Error::from(TranslateError::UnsupportedOperator {
            operator: SequenceOperator::Intersect,
        });

        assert_eq!(err.class(), ErrorClass::Unsupported);
        assert_eq!(err.origin(), ErrorOrigin::Translate);
        assert_eq!(
            err.to_string(),
            "The Intersect query operator is not supported."
        );
        assert_eq!(
            err.display_with_class(),
            "translate:unsupported: The Intersect query operator is not supported."
        );
    }

    #[test]
    fn nested_codec_failures_report_codec_origin() {
        let err = Error::from(TranslateError::Codec(CodecError::FormatMismatch {
            expected: "ObjectId".to_string(),
            found: "String".to_string(),
        }));

        assert_eq!(err.class(), ErrorClass::Format);
        assert_eq!(err.origin(), ErrorOrigin::Codec);
        assert_eq!(
            err.to_string(),
            "Cannot deserialize ObjectId from BsonType String."
        );
    }
}
