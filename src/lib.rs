// src/lib.rs
//! Interned type references for out-of-process reflection: a hash-consing
//! arena, generic substitution, reverse substitution and symbol tree export.

pub mod classify;
pub mod errors;
pub mod symbol;
pub mod type_arena;

// Re-exports: public API surface
pub use classify::{KindClassifier, KindTable, NominalKind, UnknownKinds};
pub use errors::{ArityKind, BindingSite, DerivationError, TupleLabelError};
pub use symbol::{DemangleContext, RawNames, SymbolKind, SymbolNode, SymbolPayload};
pub use type_arena::{
    DepthAndIndex, GenericArgumentMap, TypeRef, TypeRefArena, TypeRefArenaBuilder, TypeRefId,
    TypeRefKind,
};
