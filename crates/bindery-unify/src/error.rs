use bindery_symbols::{Type, id::TypeParamId};
use bindery_utils::errors::Errors;
use thiserror::Error;

pub type UnifyErrors = Errors<UnifyError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnifyError {
    #[error("`{0:?}` occurs in `{1:?}`")]
    Occurs(TypeParamId, Type),
    #[error("cannot unify `{expected:?}` with `{actual:?}`")]
    CannotUnify { expected: Type, actual: Type },
    #[error("array rank {expected} does not match rank {actual}")]
    RankMismatch { expected: u32, actual: u32 },
    #[error("expected {expected} type arguments but got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("pointer types do not take part in unification")]
    UnsupportedPointer,
    #[error("`{0:?}` cannot be substituted by `{1:?}`")]
    InvalidBinding(TypeParamId, Type),
}
