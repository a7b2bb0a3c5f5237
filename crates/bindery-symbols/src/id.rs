use bindery_utils::define_id;
use derive_more::From;

define_id!(CompilationId);
define_id!(AssemblyId);
define_id!(ModuleId);
define_id!(NamespaceId);
define_id!(TypeId);
define_id!(MethodId);
define_id!(FieldId);
define_id!(ParamId);
define_id!(TypeParamId);
define_id!(ErrorTypeId);

/// Any member of a named type.
#[derive(Debug, From, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberId {
    Type(TypeId),
    Method(MethodId),
    Field(FieldId),
}

impl MemberId {
    pub fn as_type(self) -> Option<TypeId> {
        bindery_utils::as_variant!(self, Self::Type)
    }

    pub fn as_method(self) -> Option<MethodId> {
        bindery_utils::as_variant!(self, Self::Method)
    }

    pub fn as_field(self) -> Option<FieldId> {
        bindery_utils::as_variant!(self, Self::Field)
    }
}

/// Any symbol owned by an assembly.
#[derive(Debug, From, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolRef {
    Assembly(AssemblyId),
    Module(ModuleId),
    Namespace(NamespaceId),
    Type(TypeId),
    Method(MethodId),
    Field(FieldId),
    Param(ParamId),
    TypeParam(TypeParamId),
}

impl From<MemberId> for SymbolRef {
    fn from(member: MemberId) -> Self {
        match member {
            MemberId::Type(id) => Self::Type(id),
            MemberId::Method(id) => Self::Method(id),
            MemberId::Field(id) => Self::Field(id),
        }
    }
}
