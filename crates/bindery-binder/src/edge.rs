use bindery_metadata::identity::AssemblyIdentity;
use bindery_symbols::id::AssemblyId;
use derive_more::Display;

/// Progress of one declared reference edge within a binding scope.
///
/// ```text
/// Unresolved ─▶ Resolving ─┬─▶ Resolved(assembly)
///                          ├─▶ Retargeted(assembly)
///                          └─▶ Missing(identity)
/// ```
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum EdgeState {
    Unresolved,
    Resolving,
    /// Bound to an assembly of exactly the requested identity.
    #[display("Resolved({_0})")]
    Resolved(AssemblyId),
    /// Bound to another version, or to a retargeting assembly.
    #[display("Retargeted({_0})")]
    Retargeted(AssemblyId),
    #[display("Missing({_0})")]
    Missing(AssemblyIdentity),
}

impl EdgeState {
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Resolved(_) | Self::Retargeted(_) | Self::Missing(_)
        )
    }

    /// The assembly the edge ended up at, unless it is missing.
    pub fn assembly(&self) -> Option<AssemblyId> {
        match self {
            Self::Resolved(id) | Self::Retargeted(id) => Some(*id),
            _ => None,
        }
    }
}

/// A reference from one assembly to another, as seen by one binding scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundEdge {
    pub from: AssemblyIdentity,
    pub requested: AssemblyIdentity,
    state: EdgeState,
}

impl BoundEdge {
    pub fn new(from: AssemblyIdentity, requested: AssemblyIdentity) -> Self {
        Self {
            from,
            requested,
            state: EdgeState::Unresolved,
        }
    }

    pub fn state(&self) -> &EdgeState {
        &self.state
    }

    pub fn begin(&mut self) {
        debug_assert_eq!(self.state, EdgeState::Unresolved);
        self.state = EdgeState::Resolving;
    }

    pub fn finish(&mut self, state: EdgeState) {
        debug_assert_eq!(self.state, EdgeState::Resolving);
        debug_assert!(state.is_final());
        self.state = state;
    }
}
