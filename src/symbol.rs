// src/symbol.rs
//
// Symbol trees: the node structure handed to an external demangler/printer.
//
// Node kinds follow the subject runtime's demangler grammar so a printer for
// that grammar can render the tree without knowing about type references.

use std::fmt;

/// Kind of a symbol tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Type,
    TypeList,
    MangledName,
    BuiltinTypeName,
    Module,
    Identifier,
    Index,
    Structure,
    Enum,
    Class,
    Protocol,
    OtherNominalType,
    BoundGenericStructure,
    BoundGenericEnum,
    BoundGenericClass,
    BoundGenericOtherNominalType,
    Tuple,
    TupleElement,
    TupleElementName,
    FunctionType,
    NoEscapeFunctionType,
    ObjCBlock,
    ThinFunctionType,
    CFunctionPointer,
    ThrowsAnnotation,
    AsyncAnnotation,
    ArgumentTuple,
    ReturnType,
    InOut,
    Shared,
    Owned,
    VariadicMarker,
    AutoClosureType,
    ProtocolList,
    ProtocolListWithClass,
    ProtocolListWithAnyObject,
    Metatype,
    ExistentialMetatype,
    DependentGenericParamType,
    DependentMemberType,
    DependentAssociatedTypeRef,
    Weak,
    Unowned,
    Unmanaged,
    SILBoxType,
    OpaqueType,
}

/// Leaf payload carried by text and index nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolPayload {
    Text(String),
    Index(u64),
}

/// A node of a symbol tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNode {
    pub kind: SymbolKind,
    pub payload: Option<SymbolPayload>,
    pub children: Vec<SymbolNode>,
}

impl SymbolNode {
    pub fn new(kind: SymbolKind) -> Self {
        Self {
            kind,
            payload: None,
            children: Vec::new(),
        }
    }

    pub fn text(kind: SymbolKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            payload: Some(SymbolPayload::Text(text.into())),
            children: Vec::new(),
        }
    }

    pub fn index(kind: SymbolKind, index: u64) -> Self {
        Self {
            kind,
            payload: Some(SymbolPayload::Index(index)),
            children: Vec::new(),
        }
    }

    /// Node with the given children
    pub fn with_children(kind: SymbolKind, children: Vec<SymbolNode>) -> Self {
        Self {
            kind,
            payload: None,
            children,
        }
    }

    pub fn push(&mut self, child: SymbolNode) {
        self.children.push(child);
    }

    /// Wrap in a `Type` node
    pub fn into_type(self) -> Self {
        Self::with_children(SymbolKind::Type, vec![self])
    }

    pub fn child(&self, i: usize) -> Option<&SymbolNode> {
        self.children.get(i)
    }

    pub fn text_payload(&self) -> Option<&str> {
        match &self.payload {
            Some(SymbolPayload::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn index_payload(&self) -> Option<u64> {
        match self.payload {
            Some(SymbolPayload::Index(index)) => Some(index),
            _ => None,
        }
    }
}

/// Compact s-expression form, e.g. `(Type (Tuple (TupleElement ...)))`.
impl fmt::Display for SymbolNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}", self.kind)?;
        match &self.payload {
            Some(SymbolPayload::Text(text)) => write!(f, " {text:?}")?,
            Some(SymbolPayload::Index(index)) => write!(f, " {index}")?,
            None => {}
        }
        for child in &self.children {
            write!(f, " {child}")?;
        }
        f.write_str(")")
    }
}

/// Demangler collaborator used while exporting symbol trees.
///
/// Mangled names stored in type references are handed here first; a `None`
/// answer makes the exporter fall back to a raw `MangledName` node.
pub trait DemangleContext {
    /// Demangle a mangled type name into a tree rooted at a `Type` node
    fn demangle_type(&mut self, mangled_name: &str) -> Option<SymbolNode>;

    /// Demangle a full symbol, such as an opaque type's declaration
    fn demangle_symbol(&mut self, mangled_name: &str) -> Option<SymbolNode>;
}

/// Context that demangles nothing; every mangled name stays raw.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawNames;

impl DemangleContext for RawNames {
    fn demangle_type(&mut self, _mangled_name: &str) -> Option<SymbolNode> {
        None
    }

    fn demangle_symbol(&mut self, _mangled_name: &str) -> Option<SymbolNode> {
        None
    }
}
