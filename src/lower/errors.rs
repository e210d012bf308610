use thiserror::Error;

use crate::lower::init::InitId;
use crate::types::{AbstractionPattern, PatternMismatch, Type};

/// Internal-consistency failures detected while planning or finishing call
/// results. None of these are user errors; each aborts lowering of the call.
#[derive(Debug, Clone, Error)]
pub enum LowerToIrError {
    #[error("result descriptors exhausted while planning results")]
    ResultInfosExhausted,

    #[error("{remaining} result descriptor(s) left unconsumed after planning")]
    ResultInfosUnconsumed { remaining: usize },

    #[error("direct results exhausted while finishing result plan")]
    DirectResultsExhausted,

    #[error("{remaining} direct result(s) left unconsumed after finishing result plan")]
    DirectResultsUnconsumed { remaining: usize },

    #[error("tuple arity mismatch: pattern {orig} vs type {subst}")]
    TupleArityMismatch {
        orig: AbstractionPattern,
        subst: Type,
    },

    #[error("pattern {orig} does not fit type {subst}")]
    PatternMismatch {
        orig: AbstractionPattern,
        subst: Type,
    },

    #[error("expected a tuple type, found {0}")]
    ExpectedTuple(Type),

    #[error("result sub-plan did not emit into its context")]
    SubPlanNotInContext,

    #[error("tuple element {index} did not emit into its initialization")]
    ElementNotInContext { index: usize },

    #[error("initialization {0:?} finished twice")]
    InitFinishedTwice(InitId),

    #[error("initialization {0:?} is not a temporary")]
    NotATemporary(InitId),

    #[error("initialization {0:?} cannot be split into tuple elements")]
    CannotSplit(InitId),

    #[error("r-value was already emitted into a context")]
    RValueInContext,
}

impl From<PatternMismatch> for LowerToIrError {
    fn from(err: PatternMismatch) -> Self {
        LowerToIrError::PatternMismatch {
            orig: err.orig,
            subst: err.subst,
        }
    }
}
