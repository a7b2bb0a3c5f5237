use ecow::EcoString;

/// Where a type reference row points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionScope {
    /// The module holding the signature.
    CurrentModule,
    /// Row `n` of the module's assembly reference table.
    AssemblyRef(usize),
}

/// One segment of a possibly nested type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub name: EcoString,
    /// Type parameters declared by this segment alone.
    pub arity: usize,
}

impl TypeName {
    pub fn new(name: impl Into<EcoString>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

/// A reference to a type defined in some scope, by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeReference {
    pub scope: ResolutionScope,
    pub namespace: EcoString,
    /// Outermost type first; nested types follow their enclosing type.
    pub path: Vec<TypeName>,
}

impl TypeReference {
    pub fn new(
        scope: ResolutionScope,
        namespace: impl Into<EcoString>,
        name: impl Into<EcoString>,
        arity: usize,
    ) -> Self {
        Self {
            scope,
            namespace: namespace.into(),
            path: vec![TypeName::new(name, arity)],
        }
    }

    pub fn nested(mut self, name: impl Into<EcoString>, arity: usize) -> Self {
        self.path.push(TypeName::new(name, arity));
        self
    }

    /// Total number of type arguments a constructed reference takes.
    pub fn arity(&self) -> usize {
        self.path.iter().map(|segment| segment.arity).sum()
    }
}

/// Type shape as encoded in a member signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    Void,
    /// A named type; `args` holds the arguments of every path segment,
    /// outermost first.
    Named {
        reference: TypeReference,
        args: Vec<TypeSig>,
    },
    Array {
        element: Box<TypeSig>,
        rank: u32,
    },
    Pointer(Box<TypeSig>),
    /// Type parameter of the enclosing type chain, counted outermost first.
    TypeParam(usize),
    /// Type parameter of the enclosing method.
    MethodTypeParam(usize),
}

impl TypeSig {
    pub fn named(
        scope: ResolutionScope,
        namespace: impl Into<EcoString>,
        name: impl Into<EcoString>,
    ) -> Self {
        Self::Named {
            reference: TypeReference::new(scope, namespace, name, 0),
            args: Vec::new(),
        }
    }

    pub fn generic(
        scope: ResolutionScope,
        namespace: impl Into<EcoString>,
        name: impl Into<EcoString>,
        args: Vec<TypeSig>,
    ) -> Self {
        Self::Named {
            reference: TypeReference::new(scope, namespace, name, args.len()),
            args,
        }
    }

    pub fn reference(reference: TypeReference, args: Vec<TypeSig>) -> Self {
        Self::Named { reference, args }
    }

    pub fn array(self, rank: u32) -> Self {
        Self::Array {
            element: Box::new(self),
            rank,
        }
    }

    pub fn pointer(self) -> Self {
        Self::Pointer(Box::new(self))
    }
}
