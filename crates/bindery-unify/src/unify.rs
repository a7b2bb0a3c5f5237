use bindery_symbols::{
    Type,
    id::TypeParamId,
    ty::{ArrayType, NamedType},
};

use crate::{
    error::{UnifyError, UnifyErrors},
    substitute::{Substitutable, Substitution},
};

/// Builds up a substitution `S` such that `S(lhs) == S(rhs)`.
pub trait Unifiable<Rhs = Self> {
    /// Extends `s` so that both sides become identical, or reports why no
    /// such extension exists. On failure `s` may hold partial bindings.
    fn try_unify(&self, rhs: &Rhs, s: &mut Substitution) -> Result<(), UnifyErrors>;
}

impl Unifiable for Type {
    fn try_unify(&self, rhs: &Self, s: &mut Substitution) -> Result<(), UnifyErrors> {
        let mut unifier = Unifier::new(s);
        unifier.unify(self, rhs);
        unifier.errors.into_result(())
    }
}

impl Unifiable for Vec<Type> {
    fn try_unify(&self, rhs: &Self, s: &mut Substitution) -> Result<(), UnifyErrors> {
        let mut unifier = Unifier::new(s);
        if self.len() != rhs.len() {
            unifier.errors.push(UnifyError::ArityMismatch {
                expected: self.len(),
                actual: rhs.len(),
            });
        } else {
            for (lhs, rhs) in self.iter().zip(rhs) {
                unifier.work.push((lhs.clone(), rhs.clone()));
            }
            unifier.run();
        }
        unifier.errors.into_result(())
    }
}

impl Unifiable<Type> for TypeParamId {
    fn try_unify(&self, rhs: &Type, s: &mut Substitution) -> Result<(), UnifyErrors> {
        Type::Param(*self).try_unify(rhs, s)
    }
}

/// Whether some substitution of type parameters makes both types identical.
pub fn can_unify(lhs: &Type, rhs: &Type) -> bool {
    if lhs == rhs {
        return true;
    }

    let mut s = Substitution::empty();
    let result = lhs.try_unify(rhs, &mut s);
    log::trace!("unify {lhs:?} with {rhs:?}: {}", result.is_ok());
    result.is_ok()
}

/// Like [`can_unify`] where an absent type only unifies with another
/// absent type.
pub fn can_unify_nullable(lhs: Option<&Type>, rhs: Option<&Type>) -> bool {
    match (lhs, rhs) {
        (None, None) => true,
        (Some(lhs), Some(rhs)) => can_unify(lhs, rhs),
        _ => false,
    }
}

struct Unifier<'a> {
    substitution: &'a mut Substitution,
    /// Pending pairs. Siblings share `substitution`, so a binding made while
    /// unifying one argument is visible when the next one is popped.
    work: Vec<(Type, Type)>,
    errors: UnifyErrors,
}

impl<'a> Unifier<'a> {
    fn new(substitution: &'a mut Substitution) -> Self {
        Self {
            substitution,
            work: Vec::new(),
            errors: UnifyErrors::new(),
        }
    }

    fn unify(&mut self, lhs: &Type, rhs: &Type) {
        self.work.push((lhs.clone(), rhs.clone()));
        self.run();
    }

    fn run(&mut self) {
        while let Some((lhs, rhs)) = self.work.pop() {
            self.step(lhs, rhs);

            // The first failure decides the outcome.
            if self.errors.has_errors() {
                self.work.clear();
            }
        }
    }

    fn step(&mut self, lhs: Type, rhs: Type) {
        if lhs == rhs {
            return;
        }

        let lhs = lhs.apply(self.substitution);
        let rhs = rhs.apply(self.substitution);

        if lhs == rhs {
            return;
        }

        // A parameter on the right is bound from the left side.
        let swap = matches!(rhs, Type::Param(_)) && !matches!(lhs, Type::Param(_));
        let (lhs, rhs) = if swap { (rhs, lhs) } else { (lhs, rhs) };

        match (lhs, rhs) {
            (Type::Param(param), with) => self.bind_param(param, with),
            (Type::Array(l), Type::Array(r)) => self.unify_array(l, r),
            (Type::Named(l), Type::Named(r)) => self.unify_named(l, r),
            (Type::Pointer(_), _) | (_, Type::Pointer(_)) => {
                self.errors.push(UnifyError::UnsupportedPointer)
            }
            (expected, actual) => self.errors.push(UnifyError::CannotUnify { expected, actual }),
        }
    }

    fn unify_array(&mut self, lhs: ArrayType, rhs: ArrayType) {
        if lhs.rank != rhs.rank {
            self.errors.push(UnifyError::RankMismatch {
                expected: lhs.rank,
                actual: rhs.rank,
            });
        } else {
            self.work.push((*lhs.element, *rhs.element));
        }
    }

    fn unify_named(&mut self, lhs: NamedType, rhs: NamedType) {
        if lhs.def != rhs.def {
            self.errors.push(UnifyError::CannotUnify {
                expected: Type::Named(lhs),
                actual: Type::Named(rhs),
            });
        } else if lhs.args.len() != rhs.args.len() {
            self.errors.push(UnifyError::ArityMismatch {
                expected: lhs.args.len(),
                actual: rhs.args.len(),
            });
        } else {
            // Reversed so the leftmost argument is unified first.
            self.work.extend(lhs.args.into_iter().zip(rhs.args).rev());
        }
    }

    fn bind_param(&mut self, param: TypeParamId, with: Type) {
        match with {
            Type::Void | Type::Pointer(_) => {
                self.errors.push(UnifyError::InvalidBinding(param, with))
            }
            with if with.contains_param(param) => {
                self.errors.push(UnifyError::Occurs(param, with))
            }
            with => {
                self.substitution.insert(param, with);
            }
        }
    }
}
