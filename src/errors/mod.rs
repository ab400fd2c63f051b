// errors/mod.rs
//! Type reference errors (E9xxx).
//!
//! Every failure this crate can report is returned as a value; callers decide
//! how to surface it.

#![allow(unused_assignments)] // False positives from thiserror derive

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::type_arena::{DepthAndIndex, TypeRefId, TypeRefKind};

/// A position that `derive_substitutions` binds to a substituted type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingSite {
    /// A generic parameter, keyed by its position
    GenericParam(DepthAndIndex),
    /// A dependent member reference, keyed by its canonical identity
    DependentMember(TypeRefId),
}

impl fmt::Display for BindingSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingSite::GenericParam(key) => write!(f, "generic parameter {key}"),
            BindingSite::DependentMember(id) => write!(f, "dependent member {id}"),
        }
    }
}

/// Which child list disagreed in length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArityKind {
    TupleElements,
    FunctionParameters,
    GenericArguments,
    Protocols,
    ArgumentLists,
    ArgumentList,
}

impl fmt::Display for ArityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArityKind::TupleElements => "tuple elements",
            ArityKind::FunctionParameters => "function parameters",
            ArityKind::GenericArguments => "generic arguments",
            ArityKind::Protocols => "protocols",
            ArityKind::ArgumentLists => "opaque argument lists",
            ArityKind::ArgumentList => "opaque arguments",
        })
    }
}

/// Failure to reconstruct the substitutions between an original type and a
/// substituted one.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum DerivationError {
    #[error("structural mismatch: {orig_kind} {orig} cannot produce {subst_kind} {subst}")]
    #[diagnostic(
        code(E9001),
        help("the substituted type must match the original's shape outside generic parameters")
    )]
    StructuralMismatch {
        orig: TypeRefId,
        orig_kind: TypeRefKind,
        subst: TypeRefId,
        subst_kind: TypeRefKind,
    },

    #[error("arity mismatch: expected {expected} {what}, found {found}")]
    #[diagnostic(code(E9002))]
    ArityMismatch {
        what: ArityKind,
        expected: usize,
        found: usize,
    },

    #[error("contradictory substitution: {site} is bound to both {bound} and {conflicting}")]
    #[diagnostic(code(E9003))]
    ContradictorySubstitution {
        site: BindingSite,
        bound: TypeRefId,
        conflicting: TypeRefId,
    },
}

/// Failure to decode a tuple's packed label string.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum TupleLabelError {
    #[error("tuple has {elements} elements but its label string holds {labels} labels")]
    #[diagnostic(code(E9010))]
    ExcessLabels { labels: usize, elements: usize },
}
