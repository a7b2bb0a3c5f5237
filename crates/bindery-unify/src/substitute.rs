use std::borrow::Cow;

use bindery_collections::HashMap;
use bindery_symbols::{
    Type,
    id::TypeParamId,
    ty::{ArrayType, NamedType},
};

/// Mapping from type parameters to the types they were bound to during one
/// unification. Never stored on symbols.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Substitution {
    table: HashMap<TypeParamId, Type>,
    /// Fully applied bindings, so a chain `T ↦ U`, `U ↦ int` is walked once
    /// and afterwards read as `T ↦ int`.
    cache: HashMap<TypeParamId, Type>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn unit(param: TypeParamId, ty: Type) -> Self {
        let mut table = HashMap::new();
        table.insert(param, ty);
        Self {
            table,
            cache: HashMap::new(),
        }
    }

    pub fn get(&self, param: &TypeParamId) -> Option<&Type> {
        self.cache.get(param).or_else(|| self.table.get(param))
    }

    pub fn contains(&self, param: &TypeParamId) -> bool {
        self.cache.contains_key(param) || self.table.contains_key(param)
    }

    pub fn insert(&mut self, param: TypeParamId, ty: Type) -> Option<Type> {
        self.table.insert(param, ty)
    }

    pub fn cache(&mut self, param: TypeParamId, ty: &Type) {
        self.cache
            .entry(param)
            .and_modify(|stored| {
                if stored != ty {
                    *stored = ty.clone();
                }
            })
            .or_insert_with(|| ty.clone());
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty() && self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.cache.clear();
    }
}

/// A value a [`Substitution`] can be applied to.
pub trait Substitutable: Sized {
    fn apply(self, s: &mut Substitution) -> Self {
        self.try_apply(s).unwrap_or(self)
    }

    fn apply_mut(&mut self, s: &mut Substitution) {
        if let Some(new) = self.try_apply(s) {
            *self = new;
        }
    }

    fn apply_cow(&self, s: &mut Substitution) -> Cow<'_, Self>
    where
        Self: Clone,
    {
        match self.try_apply(s) {
            Some(t) => Cow::Owned(t),
            None => Cow::Borrowed(self),
        }
    }

    /// Returns `None` when nothing was substituted.
    fn try_apply(&self, s: &mut Substitution) -> Option<Self>;
}

impl<T> Substitutable for Vec<T>
where
    T: Substitutable + Clone,
{
    fn try_apply(&self, s: &mut Substitution) -> Option<Self> {
        let mut result = None;

        for (i, item) in self.iter().enumerate() {
            if let Some(next) = item.try_apply(s) {
                result.get_or_insert_with(|| self.clone())[i] = next;
            }
        }

        result
    }
}

impl<T> Substitutable for Box<T>
where
    T: Substitutable,
{
    fn try_apply(&self, s: &mut Substitution) -> Option<Self> {
        self.as_ref().try_apply(s).map(Box::new)
    }
}

impl Substitutable for Type {
    fn try_apply(&self, s: &mut Substitution) -> Option<Self> {
        match self {
            Type::Void | Type::Error(_) => None,
            Type::Param(param) => {
                let ty = s.get(param).cloned();
                ty.map(|mut ty| {
                    ty.apply_mut(s);
                    s.cache(*param, &ty);
                    ty
                })
            }
            Type::Named(NamedType { def, args }) => args.try_apply(s).map(|args| {
                Type::Named(NamedType { def: *def, args })
            }),
            Type::Array(ArrayType { element, rank }) => element.try_apply(s).map(|element| {
                Type::Array(ArrayType {
                    element,
                    rank: *rank,
                })
            }),
            Type::Pointer(pointee) => pointee.try_apply(s).map(Type::Pointer),
        }
    }
}
