//! Resolution of member signatures to [`Type`]s.
//!
//! Metadata signatures name their scope explicitly: a type reference row
//! either points at the current module or at one row of the module's
//! assembly reference table, which is bound to exactly one assembly.
//! Source type expressions are looked up the way a compiler would: type
//! parameters, nested types of the enclosing types, then the enclosing
//! namespaces from the innermost out, each in the own assembly before the
//! bound references.

use bindery_metadata::{
    image::TypeDef,
    signature::{ResolutionScope, TypeReference, TypeSig},
};
use bindery_symbols::prelude::*;
use bindery_syntax::{TypeDecl, TypeExpr};
use ecow::{EcoString, eco_format};
use log::trace;

use crate::session::Session;

/// Where a signature is written.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SigContext {
    pub ty: TypeId,
    pub method: Option<MethodId>,
}

impl SigContext {
    fn of_type(ty: TypeId) -> Self {
        Self { ty, method: None }
    }
}

fn dotted(reference: &TypeReference) -> EcoString {
    let mut name = EcoString::new();
    for (i, segment) in reference.path.iter().enumerate() {
        if i > 0 {
            name.push('.');
        }
        name.push_str(&segment.name);
    }
    name
}

fn join_namespace(outer: &str, inner: &[&str]) -> String {
    match (outer.is_empty(), inner.is_empty()) {
        (_, true) => outer.to_owned(),
        (true, false) => inner.join("."),
        (false, false) => format!("{outer}.{}", inner.join(".")),
    }
}

impl Session {
    pub(crate) fn resolve_sig(&mut self, ctx: SigContext, sig: &TypeSig) -> Type {
        match sig {
            TypeSig::Void => Type::Void,
            TypeSig::Array { element, rank } => Type::array(self.resolve_sig(ctx, element), *rank),
            TypeSig::Pointer(pointee) => Type::pointer(self.resolve_sig(ctx, pointee)),
            TypeSig::TypeParam(index) => {
                let params = self.table.all_type_params(ctx.ty);
                match params.get(*index) {
                    Some(&param) => Type::Param(param),
                    None => self.error_type("", eco_format!("!{index}"), 0, None),
                }
            }
            TypeSig::MethodTypeParam(index) => {
                let param = ctx
                    .method
                    .and_then(|method| self.table[method].type_params.get(*index).copied());
                match param {
                    Some(param) => Type::Param(param),
                    None => self.error_type("", eco_format!("!!{index}"), 0, None),
                }
            }
            TypeSig::Named { reference, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.resolve_sig(ctx, arg))
                    .collect::<Vec<_>>();

                let module = self.table[ctx.ty].module;
                match self.resolve_reference(module, reference) {
                    Ok(def) => Type::named(def, args),
                    Err(owner) => self.error_type(
                        reference.namespace.clone(),
                        dotted(reference),
                        reference.arity(),
                        owner,
                    ),
                }
            }
        }
    }

    /// The definition a type reference row of `module` denotes. On failure
    /// returns the assembly the type was expected in.
    fn resolve_reference(
        &mut self,
        module: ModuleId,
        reference: &TypeReference,
    ) -> Result<TypeId, Option<AssemblyId>> {
        let namespace = reference.namespace.as_str();
        let path = reference.path.as_slice();

        match reference.scope {
            ResolutionScope::CurrentModule => {
                if let Some(found) = self.find_type_in_module(module, namespace, path) {
                    return Ok(found);
                }
                let assembly = self.table[module].assembly;
                self.find_type(assembly, namespace, path).ok_or(Some(assembly))
            }
            ResolutionScope::AssemblyRef(row) => {
                let Some(target) = self.table[module].referenced_assemblies().get(row).copied()
                else {
                    return Err(None);
                };
                if let Some(found) = self.find_type(target, namespace, path) {
                    return Ok(found);
                }

                trace!("{} not found in {}", dotted(reference), self.table[target].identity);

                let expected = match &self.table[module].kind {
                    ModuleKind::Metadata { image } => image.assembly_refs.get(row).cloned(),
                    _ => None,
                };
                let owner = match expected {
                    Some(expected)
                        if !self.is_missing(target) && expected != self.table[target].identity =>
                    {
                        self.missing_assembly(&expected)
                    }
                    _ => target,
                };
                Err(Some(owner))
            }
        }
    }

    pub(crate) fn resolve_expr(&mut self, ctx: SigContext, expr: &TypeExpr) -> Type {
        match expr {
            TypeExpr::Void => Type::Void,
            TypeExpr::Array { element, rank } => Type::array(self.resolve_expr(ctx, element), *rank),
            TypeExpr::Pointer(pointee) => Type::pointer(self.resolve_expr(ctx, pointee)),
            TypeExpr::Path { path, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.resolve_expr(ctx, arg))
                    .collect::<Vec<_>>();
                let names = path.split('.').collect::<Vec<_>>();

                if let [name] = names.as_slice()
                    && args.is_empty()
                    && let Some(param) = self.type_param_named(ctx, name)
                {
                    return Type::Param(param);
                }

                match self.resolve_path(ctx, &names, args.len()) {
                    Some((def, mut prefix)) => {
                        prefix.extend(args);
                        Type::named(def, prefix)
                    }
                    None => {
                        let name = names.last().copied().unwrap_or_default();
                        let namespace = names[..names.len().saturating_sub(1)].join(".");
                        self.error_type(namespace, name, args.len(), None)
                    }
                }
            }
        }
    }

    fn type_param_named(&self, ctx: SigContext, name: &str) -> Option<TypeParamId> {
        let named = |params: &[TypeParamId]| {
            params
                .iter()
                .copied()
                .find(|&param| self.table[param].name == name)
        };

        if let Some(found) = ctx.method.and_then(|method| named(&self.table[method].type_params)) {
            return Some(found);
        }

        let mut current = Some(ctx.ty);
        while let Some(ty) = current {
            if let Some(found) = named(&self.table[ty].type_params) {
                return Some(found);
            }
            current = self.table[ty].containing_type();
        }
        None
    }

    /// Resolves a dotted source name taking `arity` arguments. Returns the
    /// definition and the implicit arguments of enclosing generic types.
    fn resolve_path(&mut self, ctx: SigContext, names: &[&str], arity: usize) -> Option<(TypeId, Vec<Type>)> {
        let mut current = Some(ctx.ty);
        while let Some(ty) = current {
            let nested = self.type_members(ty).types;
            if let Some(found) = self.find_path(nested, names, arity) {
                let prefix = self
                    .table
                    .all_type_params(ty)
                    .into_iter()
                    .map(Type::Param)
                    .collect();
                return Some((found, prefix));
            }
            current = self.table[ty].containing_type();
        }

        let module = self.table[ctx.ty].module;
        let mut assemblies = vec![self.table[module].assembly];
        assemblies.extend(
            self.table[module]
                .referenced_assemblies()
                .iter()
                .copied()
                .filter(|&assembly| !self.is_missing(assembly)),
        );

        let mut namespace = Some(self.table.type_namespace(ctx.ty));
        while let Some(ns) = namespace {
            let qualified = self.table[ns].qualified.clone();

            for split in 0..names.len() {
                let (outer, path) = names.split_at(split);
                let full = join_namespace(&qualified, outer);

                for &assembly in &assemblies {
                    if let Some(found) = self.find_type_by_total_arity(assembly, &full, path, arity) {
                        return Some((found, Vec::new()));
                    }
                }
            }
            namespace = self.table[ns].parent;
        }
        None
    }

    /// Reads the declaration of `ty` with `source` or `metadata`. Retargeting
    /// types have no declaration of their own.
    fn declared<T>(
        &self,
        ty: TypeId,
        source: impl FnOnce(&TypeDecl) -> T,
        metadata: impl FnOnce(&TypeDef) -> T,
    ) -> Option<T> {
        match &self.table[ty].origin {
            TypeOrigin::Source(decl) => Some(source(decl)),
            TypeOrigin::Metadata { image, index } => image.type_def(*index).map(metadata),
            TypeOrigin::Retargeting(_) => None,
        }
    }

    fn resolve_signature(&mut self, ctx: SigContext, signature: Option<Signature>) -> Type {
        match signature {
            Some(Signature::Source(expr)) => self.resolve_expr(ctx, &expr),
            Some(Signature::Metadata(sig)) => self.resolve_sig(ctx, &sig),
            None => Type::Void,
        }
    }

    /// Return type of `method`.
    pub fn return_type(&mut self, method: MethodId) -> Type {
        if let Some(ty) = self.members.returns.get(&method) {
            return ty.clone();
        }

        let containing = self.table[method].containing;
        let ty = match self.table[method].origin {
            MemberOrigin::Retargeting(underlying) => {
                let assembly = self.table.containing_assembly(method);
                let ty = self.return_type(underlying);
                self.retarget_type(assembly, &ty)
            }
            MemberOrigin::Declared(row) => {
                let signature = self
                    .declared(
                        containing,
                        |decl| decl.methods.get(row).map(|m| Signature::Source(m.return_type.clone())),
                        |def| def.methods.get(row).map(|m| Signature::Metadata(m.return_type.clone())),
                    )
                    .flatten();
                let ctx = SigContext {
                    ty: containing,
                    method: Some(method),
                };
                self.resolve_signature(ctx, signature)
            }
        };

        self.members.returns.insert(method, ty.clone());
        ty
    }

    /// Parameters of `method` in declaration order.
    pub fn parameters(&mut self, method: MethodId) -> Vec<ParamId> {
        if let Some(params) = self.members.params.get(&method) {
            return params.clone();
        }

        let containing = self.table[method].containing;
        let params = match self.table[method].origin {
            MemberOrigin::Retargeting(underlying) => {
                let assembly = self.table.containing_assembly(method);
                let mut params = Vec::new();
                for param in self.parameters(underlying) {
                    let name = self.table[param].name.clone();
                    let ty = self.table[param].ty.clone();
                    let ty = self.retarget_type(assembly, &ty);
                    params.push(self.table.add_param(method, name, ty, Some(param)));
                }
                params
            }
            MemberOrigin::Declared(row) => {
                let declared = self
                    .declared(
                        containing,
                        |decl| {
                            decl.methods
                                .get(row)
                                .map(|m| {
                                    m.params
                                        .iter()
                                        .map(|p| (p.name.clone(), Signature::Source(p.ty.clone())))
                                        .collect::<Vec<_>>()
                                })
                                .unwrap_or_default()
                        },
                        |def| {
                            def.methods
                                .get(row)
                                .map(|m| {
                                    m.params
                                        .iter()
                                        .map(|p| (p.name.clone(), Signature::Metadata(p.ty.clone())))
                                        .collect::<Vec<_>>()
                                })
                                .unwrap_or_default()
                        },
                    )
                    .unwrap_or_default();

                let ctx = SigContext {
                    ty: containing,
                    method: Some(method),
                };
                let mut params = Vec::new();
                for (name, signature) in declared {
                    let ty = self.resolve_signature(ctx, Some(signature));
                    params.push(self.table.add_param(method, name, ty, None));
                }
                params
            }
        };

        self.members.params.insert(method, params.clone());
        params
    }

    pub fn parameter_types(&mut self, method: MethodId) -> Vec<Type> {
        self.parameters(method)
            .into_iter()
            .map(|param| self.table[param].ty.clone())
            .collect()
    }

    pub fn field_type(&mut self, field: FieldId) -> Type {
        if let Some(ty) = self.members.fields.get(&field) {
            return ty.clone();
        }

        let containing = self.table[field].containing;
        let ty = match self.table[field].origin {
            MemberOrigin::Retargeting(underlying) => {
                let assembly = self.table.containing_assembly(field);
                let ty = self.field_type(underlying);
                self.retarget_type(assembly, &ty)
            }
            MemberOrigin::Declared(row) => {
                let signature = self
                    .declared(
                        containing,
                        |decl| decl.fields.get(row).map(|f| Signature::Source(f.ty.clone())),
                        |def| def.fields.get(row).map(|f| Signature::Metadata(f.ty.clone())),
                    )
                    .flatten();
                self.resolve_signature(SigContext::of_type(containing), signature)
            }
        };

        self.members.fields.insert(field, ty.clone());
        ty
    }

    pub fn base_type(&mut self, ty: TypeId) -> Option<Type> {
        if let Some(base) = self.members.bases.get(&ty) {
            return base.clone();
        }

        let base = match self.table[ty].origin {
            TypeOrigin::Retargeting(underlying) => {
                let assembly = self.table.type_assembly(ty);
                self.base_type(underlying)
                    .map(|base| self.retarget_type(assembly, &base))
            }
            _ => self
                .declared(
                    ty,
                    |decl| decl.base.clone().map(Signature::Source),
                    |def| def.base.clone().map(Signature::Metadata),
                )
                .flatten()
                .map(|signature| self.resolve_signature(SigContext::of_type(ty), Some(signature))),
        };

        self.members.bases.insert(ty, base.clone());
        base
    }

    pub fn interfaces(&mut self, ty: TypeId) -> Vec<Type> {
        if let Some(interfaces) = self.members.interfaces.get(&ty) {
            return interfaces.clone();
        }

        let interfaces: Vec<Type> = match self.table[ty].origin {
            TypeOrigin::Retargeting(underlying) => {
                let assembly = self.table.type_assembly(ty);
                self.interfaces(underlying)
                    .into_iter()
                    .map(|interface| self.retarget_type(assembly, &interface))
                    .collect()
            }
            _ => self
                .declared(
                    ty,
                    |decl| {
                        decl.interfaces
                            .iter()
                            .cloned()
                            .map(Signature::Source)
                            .collect::<Vec<_>>()
                    },
                    |def| {
                        def.interfaces
                            .iter()
                            .cloned()
                            .map(Signature::Metadata)
                            .collect::<Vec<_>>()
                    },
                )
                .unwrap_or_default()
                .into_iter()
                .map(|signature| self.resolve_signature(SigContext::of_type(ty), Some(signature)))
                .collect(),
        };

        self.members.interfaces.insert(ty, interfaces.clone());
        interfaces
    }
}

/// A signature as written in source or in metadata.
#[derive(Debug, Clone)]
enum Signature {
    Source(TypeExpr),
    Metadata(TypeSig),
}
