//! Decides whether two type shapes can be made identical by substituting
//! type parameters.
//!
//! ```text
//!   IA<U, object>        U ↦ T        IA<T, object>
//!        ≟         ───────────────▶        ≟         ✓
//!   IA<T, U>             T ↦ object    IA<T, T>
//! ```
//!
//! Every pair reached while walking two types is unified against one shared
//! [`Substitution`], so a parameter bound in one type argument constrains all
//! sibling arguments. A parameter never unifies with a type containing it.

pub mod error;
pub mod substitute;
pub mod unify;

pub mod prelude {
    pub use crate::error::{UnifyError, UnifyErrors};
    pub use crate::substitute::{Substitutable, Substitution};
    pub use crate::unify::{Unifiable, can_unify, can_unify_nullable};
}

pub use unify::{can_unify, can_unify_nullable};
