// src/classify.rs
//
// Declaration-kind classification for nominal type references.
//
// A mangled name does not say whether it names a struct, an enum or a class;
// answering that needs the subject runtime's type descriptors, which live
// outside this crate. The arena holds one injected classifier and routes every
// nominal kind query through it.

use rustc_hash::FxHashMap;

/// Declaration kind of a nominal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NominalKind {
    Struct,
    Enum,
    Class,
    Protocol,
    Alias,
    Unknown,
}

/// Resolves the declaration kind behind a mangled nominal name.
pub trait KindClassifier {
    fn classify(&self, mangled_name: &str) -> NominalKind;
}

/// Classifier that knows nothing: every name is `Unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownKinds;

impl KindClassifier for UnknownKinds {
    fn classify(&self, _mangled_name: &str) -> NominalKind {
        NominalKind::Unknown
    }
}

/// Classifier backed by a table filled in by the caller, e.g. from descriptors
/// already read out of the subject process.
#[derive(Debug, Clone, Default)]
pub struct KindTable {
    kinds: FxHashMap<String, NominalKind>,
}

impl KindTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the kind of a mangled name, replacing any earlier entry
    pub fn insert(&mut self, mangled_name: impl Into<String>, kind: NominalKind) {
        self.kinds.insert(mangled_name.into(), kind);
    }

    pub fn with(mut self, mangled_name: impl Into<String>, kind: NominalKind) -> Self {
        self.insert(mangled_name, kind);
        self
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl KindClassifier for KindTable {
    fn classify(&self, mangled_name: &str) -> NominalKind {
        self.kinds
            .get(mangled_name)
            .copied()
            .unwrap_or(NominalKind::Unknown)
    }
}

impl<F> KindClassifier for F
where
    F: Fn(&str) -> NominalKind,
{
    fn classify(&self, mangled_name: &str) -> NominalKind {
        self(mangled_name)
    }
}
