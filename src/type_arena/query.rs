// type_arena/query.rs
//
// TypeRefArena query methods: kind predicates, unwrap helpers, tuple label
// decoding, and the nominal view.

use smallvec::SmallVec;

use crate::classify::NominalKind;
use crate::errors::TupleLabelError;

use super::arena::TypeRefArena;
use super::type_ref::*;
use super::type_ref_id::{TypeRefId, TypeRefKind, TypeRefVec};

/// Decoded tuple labels; an empty label means the element is unlabelled
pub type TupleLabels<'a> = SmallVec<[&'a str; 4]>;

/// Decode a space-separated tuple label string for `element_count` elements.
///
/// Missing labels are padded with empty strings, so `""` over three elements
/// is three empty labels. A trailing separator does not start a new label.
/// More labels than elements is malformed input.
pub fn decode_tuple_labels(
    labels: &str,
    element_count: usize,
) -> Result<TupleLabels<'_>, TupleLabelError> {
    let mut decoded: TupleLabels<'_> = labels.split_terminator(' ').collect();
    if decoded.len() > element_count {
        return Err(TupleLabelError::ExcessLabels {
            labels: decoded.len(),
            elements: element_count,
        });
    }
    decoded.resize(element_count, "");
    Ok(decoded)
}

impl TypeRefArena {
    // ========================================================================
    // Kind predicates
    // ========================================================================

    pub fn is_builtin(&self, id: TypeRefId) -> bool {
        matches!(self.get(id), TypeRef::Builtin { .. })
    }

    /// Check if this is a nominal or bound generic reference
    pub fn is_nominal(&self, id: TypeRefId) -> bool {
        matches!(
            self.get(id),
            TypeRef::Nominal(_) | TypeRef::BoundGeneric { .. }
        )
    }

    pub fn is_bound_generic(&self, id: TypeRefId) -> bool {
        matches!(self.get(id), TypeRef::BoundGeneric { .. })
    }

    pub fn is_tuple(&self, id: TypeRefId) -> bool {
        matches!(self.get(id), TypeRef::Tuple { .. })
    }

    pub fn is_function(&self, id: TypeRefId) -> bool {
        matches!(self.get(id), TypeRef::Function(_))
    }

    pub fn is_generic_param(&self, id: TypeRefId) -> bool {
        matches!(self.get(id), TypeRef::GenericTypeParameter(_))
    }

    pub fn is_dependent_member(&self, id: TypeRefId) -> bool {
        matches!(self.get(id), TypeRef::DependentMember { .. })
    }

    pub fn is_reference_storage(&self, id: TypeRefId) -> bool {
        self.kind(id).is_reference_storage()
    }

    // ========================================================================
    // Unwrap helpers
    // ========================================================================

    /// Mangled name of a builtin reference
    pub fn unwrap_builtin(&self, id: TypeRefId) -> Option<&str> {
        match self.get(id) {
            TypeRef::Builtin { mangled_name } => Some(mangled_name),
            _ => None,
        }
    }

    /// Unwrap a tuple, returning (elements, label string)
    pub fn unwrap_tuple(&self, id: TypeRefId) -> Option<(&TypeRefVec, &str)> {
        match self.get(id) {
            TypeRef::Tuple { elements, labels } => Some((elements, labels)),
            _ => None,
        }
    }

    /// Decoded labels of a tuple, one per element
    pub fn tuple_labels(
        &self,
        id: TypeRefId,
    ) -> Option<Result<TupleLabels<'_>, TupleLabelError>> {
        self.unwrap_tuple(id)
            .map(|(elements, labels)| decode_tuple_labels(labels, elements.len()))
    }

    pub fn unwrap_function(&self, id: TypeRefId) -> Option<&FunctionTypeRef> {
        match self.get(id) {
            TypeRef::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn unwrap_opaque_archetype(&self, id: TypeRefId) -> Option<&OpaqueArchetypeTypeRef> {
        match self.get(id) {
            TypeRef::OpaqueArchetype(opaque) => Some(opaque),
            _ => None,
        }
    }

    /// Argument lists of an opaque archetype, in their original nested shape
    pub fn argument_lists(&self, id: TypeRefId) -> Option<Vec<&[TypeRefId]>> {
        self.unwrap_opaque_archetype(id)
            .map(|opaque| opaque.arguments.iter().collect())
    }

    /// Unwrap a protocol composition, returning (protocols, superclass, has_explicit_any_object)
    pub fn unwrap_protocol_composition(
        &self,
        id: TypeRefId,
    ) -> Option<(&TypeRefVec, Option<TypeRefId>, bool)> {
        match self.get(id) {
            TypeRef::ProtocolComposition {
                protocols,
                superclass,
                has_explicit_any_object,
            } => Some((protocols, *superclass, *has_explicit_any_object)),
            _ => None,
        }
    }

    /// Unwrap a metatype, returning (instance, was_abstract)
    pub fn unwrap_metatype(&self, id: TypeRefId) -> Option<(TypeRefId, bool)> {
        match self.get(id) {
            TypeRef::Metatype {
                instance,
                was_abstract,
            } => Some((*instance, *was_abstract)),
            _ => None,
        }
    }

    pub fn unwrap_existential_metatype(&self, id: TypeRefId) -> Option<TypeRefId> {
        match self.get(id) {
            TypeRef::ExistentialMetatype { instance } => Some(*instance),
            _ => None,
        }
    }

    pub fn unwrap_generic_param(&self, id: TypeRefId) -> Option<DepthAndIndex> {
        match self.get(id) {
            TypeRef::GenericTypeParameter(key) => Some(*key),
            _ => None,
        }
    }

    /// Unwrap a dependent member, returning (member, base, protocol)
    pub fn unwrap_dependent_member(&self, id: TypeRefId) -> Option<(&str, TypeRefId, &str)> {
        match self.get(id) {
            TypeRef::DependentMember {
                member,
                base,
                protocol,
            } => Some((member, *base, protocol)),
            _ => None,
        }
    }

    /// Name of a foreign class, ObjC class or ObjC protocol; `None` for the
    /// unnamed singletons and every other kind
    pub fn class_like_name(&self, id: TypeRefId) -> Option<&str> {
        match self.get(id) {
            TypeRef::ForeignClass { name } => Some(name),
            TypeRef::ObjCClass { name } | TypeRef::ObjCProtocol { name } => name.as_deref(),
            _ => None,
        }
    }

    /// Unwrap a reference storage wrapper, returning (ownership, referent)
    pub fn unwrap_reference_storage(
        &self,
        id: TypeRefId,
    ) -> Option<(ReferenceOwnership, TypeRefId)> {
        match self.get(id) {
            TypeRef::ReferenceStorage {
                ownership,
                referent,
            } => Some((*ownership, *referent)),
            _ => None,
        }
    }

    pub fn unwrap_sil_box(&self, id: TypeRefId) -> Option<TypeRefId> {
        match self.get(id) {
            TypeRef::SILBox { boxed } => Some(*boxed),
            _ => None,
        }
    }

    // ========================================================================
    // Nominal view
    // ========================================================================

    /// View a nominal or bound generic reference through its shared nominal
    /// behaviour
    pub fn nominal_view(&self, id: TypeRefId) -> Option<NominalView<'_>> {
        let (header, generic_args): (&NominalHeader, &[TypeRefId]) = match self.get(id) {
            TypeRef::Nominal(header) => (header, &[]),
            TypeRef::BoundGeneric {
                nominal,
                generic_args,
            } => (nominal, generic_args),
            _ => return None,
        };
        Some(NominalView {
            arena: self,
            id,
            header,
            generic_args,
        })
    }

    /// Nesting depth of a nominal reference; 0 for anything else
    pub fn nominal_depth(&self, id: TypeRefId) -> u32 {
        self.nominal_view(id).map_or(0, |view| view.depth())
    }
}

/// Shared behaviour of nominal and bound generic references.
#[derive(Clone, Copy)]
pub struct NominalView<'a> {
    arena: &'a TypeRefArena,
    id: TypeRefId,
    header: &'a NominalHeader,
    generic_args: &'a [TypeRefId],
}

impl<'a> NominalView<'a> {
    pub fn id(&self) -> TypeRefId {
        self.id
    }

    pub fn mangled_name(&self) -> &'a str {
        &self.header.mangled_name
    }

    /// Bound generic arguments; empty for a plain nominal reference
    pub fn generic_args(&self) -> &'a [TypeRefId] {
        self.generic_args
    }

    pub fn is_bound_generic(&self) -> bool {
        self.arena.kind(self.id) == TypeRefKind::BoundGeneric
    }

    /// The enclosing declaration, whatever its kind
    pub fn parent(&self) -> Option<TypeRefId> {
        self.header.parent
    }

    /// The enclosing declaration, if it is itself nominal
    pub fn parent_view(&self) -> Option<NominalView<'a>> {
        self.header
            .parent
            .and_then(|parent| self.arena.nominal_view(parent))
    }

    /// Enclosing nominal declarations, innermost first
    pub fn parent_chain(&self) -> impl Iterator<Item = NominalView<'a>> + 'a {
        std::iter::successors(self.parent_view(), |view| view.parent_view())
    }

    /// Number of enclosing nominal declarations; 0 for a top-level type
    pub fn depth(&self) -> u32 {
        self.parent_chain().count() as u32
    }

    pub fn is_error_protocol(&self) -> bool {
        self.header.mangled_name == self.arena.error_protocol_name
    }

    /// Declaration kind, as answered by the arena's classifier
    pub fn declaration_kind(&self) -> NominalKind {
        self.arena.classifier.classify(&self.header.mangled_name)
    }

    pub fn is_struct(&self) -> bool {
        self.declaration_kind() == NominalKind::Struct
    }

    pub fn is_enum(&self) -> bool {
        self.declaration_kind() == NominalKind::Enum
    }

    pub fn is_class(&self) -> bool {
        self.declaration_kind() == NominalKind::Class
    }

    pub fn is_protocol(&self) -> bool {
        self.declaration_kind() == NominalKind::Protocol
    }

    pub fn is_alias(&self) -> bool {
        self.declaration_kind() == NominalKind::Alias
    }
}

impl std::fmt::Debug for NominalView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NominalView")
            .field("id", &self.id)
            .field("mangled_name", &self.header.mangled_name)
            .field("parent", &self.header.parent)
            .field("generic_args", &self.generic_args)
            .finish()
    }
}
