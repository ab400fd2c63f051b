// type_arena/mod.rs
//
// Interned type references using TypeRefId handles for O(1) equality.
//
// This module provides the canonical type reference representation:
// - TypeRefId: u32 handle to an interned reference (Copy, trivial Eq/Hash)
// - TypeRefArena: storage with find-or-create deduplication by fingerprint
// - TypeRef: the closed variant catalog, children held as TypeRefId
// - Substitution, reverse derivation and symbol tree export over the arena

mod arena;
mod derivation;
mod fingerprint;
mod query;
mod substitution;
mod symbolic;
#[cfg(test)]
mod tests_derivation;
pub mod type_ref;
pub mod type_ref_id;

pub use arena::*;
pub use fingerprint::Fingerprint;
pub use query::*;
pub use type_ref::*;
pub use type_ref_id::*;
