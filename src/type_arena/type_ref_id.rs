// type_arena/type_ref_id.rs
//
// TypeRefId: arena-assigned handle for an interned type reference, plus the
// closed list of type reference kinds.

use std::fmt;

use smallvec::SmallVec;

/// Identity of an interned type reference.
///
/// Handles are sequential indices assigned by the owning `TypeRefArena` in
/// creation order. Two handles from the same arena are equal iff they name the
/// same canonical type reference. Handles from different arenas are never
/// interchangeable.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TypeRefId(u32);

impl TypeRefId {
    /// Get the raw index (for debugging/serialization)
    pub fn index(self) -> u32 {
        self.0
    }

    /// Create a TypeRefId from a raw index (for internal use by TypeRefArena)
    pub(super) fn from_raw(index: u32) -> Self {
        TypeRefId(index)
    }

    /// Slot in the arena's storage vector
    #[inline]
    pub(super) fn slot(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeRefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// SmallVec for type reference children - inline up to 4 (covers most tuples,
/// generic argument lists and parameter lists)
pub type TypeRefVec = SmallVec<[TypeRefId; 4]>;

/// Kind tag for every type reference variant.
///
/// Reference storage has one kind per ownership policy so the interning
/// tables stay separate per policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeRefKind {
    Builtin,
    Nominal,
    BoundGeneric,
    Tuple,
    OpaqueArchetype,
    Function,
    ProtocolComposition,
    Metatype,
    ExistentialMetatype,
    GenericTypeParameter,
    DependentMember,
    ForeignClass,
    ObjCClass,
    ObjCProtocol,
    Opaque,
    WeakStorage,
    UnownedStorage,
    UnmanagedStorage,
    SILBox,
}

impl TypeRefKind {
    /// Every kind, in declaration order.
    pub const ALL: [TypeRefKind; 19] = [
        TypeRefKind::Builtin,
        TypeRefKind::Nominal,
        TypeRefKind::BoundGeneric,
        TypeRefKind::Tuple,
        TypeRefKind::OpaqueArchetype,
        TypeRefKind::Function,
        TypeRefKind::ProtocolComposition,
        TypeRefKind::Metatype,
        TypeRefKind::ExistentialMetatype,
        TypeRefKind::GenericTypeParameter,
        TypeRefKind::DependentMember,
        TypeRefKind::ForeignClass,
        TypeRefKind::ObjCClass,
        TypeRefKind::ObjCProtocol,
        TypeRefKind::Opaque,
        TypeRefKind::WeakStorage,
        TypeRefKind::UnownedStorage,
        TypeRefKind::UnmanagedStorage,
        TypeRefKind::SILBox,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TypeRefKind::Builtin => "Builtin",
            TypeRefKind::Nominal => "Nominal",
            TypeRefKind::BoundGeneric => "BoundGeneric",
            TypeRefKind::Tuple => "Tuple",
            TypeRefKind::OpaqueArchetype => "OpaqueArchetype",
            TypeRefKind::Function => "Function",
            TypeRefKind::ProtocolComposition => "ProtocolComposition",
            TypeRefKind::Metatype => "Metatype",
            TypeRefKind::ExistentialMetatype => "ExistentialMetatype",
            TypeRefKind::GenericTypeParameter => "GenericTypeParameter",
            TypeRefKind::DependentMember => "DependentMember",
            TypeRefKind::ForeignClass => "ForeignClass",
            TypeRefKind::ObjCClass => "ObjCClass",
            TypeRefKind::ObjCProtocol => "ObjCProtocol",
            TypeRefKind::Opaque => "Opaque",
            TypeRefKind::WeakStorage => "WeakStorage",
            TypeRefKind::UnownedStorage => "UnownedStorage",
            TypeRefKind::UnmanagedStorage => "UnmanagedStorage",
            TypeRefKind::SILBox => "SILBox",
        }
    }

    /// Check if this is one of the reference storage kinds
    #[inline]
    pub fn is_reference_storage(self) -> bool {
        matches!(
            self,
            TypeRefKind::WeakStorage | TypeRefKind::UnownedStorage | TypeRefKind::UnmanagedStorage
        )
    }
}

impl fmt::Display for TypeRefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
