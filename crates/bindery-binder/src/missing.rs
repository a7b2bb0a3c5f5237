use bindery_metadata::identity::AssemblyIdentity;
use bindery_symbols::prelude::*;
use ecow::EcoString;
use log::debug;

use crate::session::Session;

impl Session {
    /// The placeholder for `identity`. One per identity for the whole
    /// session, so independent compilations missing the same assembly agree
    /// on the symbol.
    pub(crate) fn missing_assembly(&mut self, identity: &AssemblyIdentity) -> AssemblyId {
        if let Some(&id) = self.missing.get(identity) {
            return id;
        }

        debug!("assembly {identity} is missing");

        let id = self.table.add_assembly(identity.clone(), AssemblyKind::Missing);
        let module = self
            .table
            .add_module(id, identity.name(), ModuleKind::Missing, None);
        self.table.set_module_references(module, Vec::new());

        self.missing.insert(identity.clone(), id);
        id
    }

    pub(crate) fn error_type(
        &mut self,
        namespace: impl Into<EcoString>,
        name: impl Into<EcoString>,
        arity: usize,
        assembly: Option<AssemblyId>,
    ) -> Type {
        let id = self.table.error_type(ErrorTypeSymbol {
            namespace: namespace.into(),
            name: name.into(),
            arity,
            assembly,
        });
        Type::Error(id)
    }
}
