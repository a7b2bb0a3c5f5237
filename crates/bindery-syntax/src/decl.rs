use std::sync::Arc;

use bindery_metadata::image::TypeKind;
use ecow::EcoString;
use enum_as_inner::EnumAsInner;

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumAsInner)]
pub enum TypeExpr {
    Void,
    /// Dotted name, optionally namespace qualified. Arguments of enclosing
    /// generic types come first.
    Path {
        path: EcoString,
        args: Vec<TypeExpr>,
    },
    Array {
        element: Box<TypeExpr>,
        rank: u32,
    },
    Pointer(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn path(path: impl Into<EcoString>) -> Self {
        Self::Path {
            path: path.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(path: impl Into<EcoString>, args: Vec<TypeExpr>) -> Self {
        Self::Path {
            path: path.into(),
            args,
        }
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub namespace: EcoString,
    pub name: EcoString,
    pub kind: TypeKind,
    pub type_params: Vec<EcoString>,
    pub base: Option<TypeExpr>,
    pub interfaces: Vec<TypeExpr>,
    pub methods: Vec<MethodDecl>,
    pub fields: Vec<FieldDecl>,
    pub nested: Vec<Arc<TypeDecl>>,
}

impl TypeDecl {
    pub fn new(kind: TypeKind, namespace: impl Into<EcoString>, name: impl Into<EcoString>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            type_params: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            nested: Vec::new(),
        }
    }

    pub fn class(namespace: impl Into<EcoString>, name: impl Into<EcoString>) -> Self {
        Self::new(TypeKind::Class, namespace, name)
    }

    pub fn structure(namespace: impl Into<EcoString>, name: impl Into<EcoString>) -> Self {
        Self::new(TypeKind::Struct, namespace, name)
    }

    pub fn interface(namespace: impl Into<EcoString>, name: impl Into<EcoString>) -> Self {
        Self::new(TypeKind::Interface, namespace, name)
    }

    pub fn generic<'a>(mut self, params: impl IntoIterator<Item = &'a str>) -> Self {
        self.type_params = params.into_iter().map(EcoString::from).collect();
        self
    }

    pub fn extends(mut self, base: TypeExpr) -> Self {
        self.base = Some(base);
        self
    }

    pub fn implements(mut self, interface: TypeExpr) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn field(mut self, name: impl Into<EcoString>, ty: TypeExpr) -> Self {
        self.fields.push(FieldDecl {
            name: name.into(),
            ty,
        });
        self
    }

    pub fn nested(mut self, mut decl: TypeDecl) -> Self {
        decl.namespace = EcoString::new();
        self.nested.push(Arc::new(decl));
        self
    }

    pub fn arity(&self) -> usize {
        self.type_params.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: EcoString,
    pub type_params: Vec<EcoString>,
    pub return_type: TypeExpr,
    pub params: Vec<ParamDecl>,
}

impl MethodDecl {
    pub fn new(name: impl Into<EcoString>, return_type: TypeExpr) -> Self {
        Self {
            name: name.into(),
            type_params: Vec::new(),
            return_type,
            params: Vec::new(),
        }
    }

    pub fn generic<'a>(mut self, params: impl IntoIterator<Item = &'a str>) -> Self {
        self.type_params = params.into_iter().map(EcoString::from).collect();
        self
    }

    pub fn param(mut self, name: impl Into<EcoString>, ty: TypeExpr) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            ty,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDecl {
    pub name: EcoString,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: EcoString,
    pub ty: TypeExpr,
}
