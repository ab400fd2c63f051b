// type_arena/arena.rs
//
// TypeRefArena: owner of every type reference, with find-or-create interning
// keyed by per-kind fingerprints.

use std::sync::Arc;

use hashbrown::HashMap;

use crate::classify::{KindClassifier, UnknownKinds};

use super::fingerprint::Fingerprint;
use super::type_ref::*;
use super::type_ref_id::{TypeRefId, TypeRefKind, TypeRefVec};

/// Mangled name of the subject runtime's built-in error protocol.
pub const DEFAULT_ERROR_PROTOCOL: &str = "s5ErrorP";

/// Configuration for a `TypeRefArena`.
pub struct TypeRefArenaBuilder {
    capacity: usize,
    classifier: Arc<dyn KindClassifier + Send + Sync>,
    error_protocol_name: String,
}

impl TypeRefArenaBuilder {
    pub fn new() -> Self {
        Self {
            capacity: 0,
            classifier: Arc::new(UnknownKinds),
            error_protocol_name: DEFAULT_ERROR_PROTOCOL.to_string(),
        }
    }

    /// Use this classifier for nominal declaration-kind queries.
    pub fn with_classifier(mut self, classifier: Arc<dyn KindClassifier + Send + Sync>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Pre-size storage for roughly this many type references.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Mangled name that `is_error_protocol` recognises.
    pub fn with_error_protocol_name(mut self, name: impl Into<String>) -> Self {
        self.error_protocol_name = name.into();
        self
    }

    pub fn build(self) -> TypeRefArena {
        // Spread the capacity hint over the tables; most references are
        // nominal, bound generic, tuple or function.
        let per_table = self.capacity / 4;
        TypeRefArena {
            types: Vec::with_capacity(self.capacity),
            concrete: Vec::with_capacity(self.capacity),
            intern_tables: TypeRefKind::ALL
                .iter()
                .map(|_| HashMap::with_capacity(per_table))
                .collect(),
            opaque: None,
            unnamed_objc_class: None,
            unnamed_objc_protocol: None,
            classifier: self.classifier,
            error_protocol_name: self.error_protocol_name,
        }
    }
}

impl Default for TypeRefArenaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Owner of a set of canonical type references.
///
/// `obtain` and the typed constructors return the existing reference when an
/// equal structure was interned before, so at most one reference per structure
/// is ever live. References are never removed; dropping the arena releases all
/// of them at once.
///
/// All mutation goes through `&mut self`. Issued references are immutable, so
/// a shared `&TypeRefArena` can be read from any number of threads. Interning
/// from several threads needs one lock around the whole arena.
pub struct TypeRefArena {
    /// Interned references, indexed by TypeRefId
    types: Vec<TypeRef>,
    /// Memoized concreteness, parallel to `types`
    concrete: Vec<bool>,
    /// One fingerprint table per kind, indexed by `TypeRefKind as usize`
    intern_tables: Vec<HashMap<Fingerprint, TypeRefId>>,
    opaque: Option<TypeRefId>,
    unnamed_objc_class: Option<TypeRefId>,
    unnamed_objc_protocol: Option<TypeRefId>,
    pub(super) classifier: Arc<dyn KindClassifier + Send + Sync>,
    pub(super) error_protocol_name: String,
}

impl std::fmt::Debug for TypeRefArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRefArena")
            .field("types_count", &self.types.len())
            .field("error_protocol_name", &self.error_protocol_name)
            .finish_non_exhaustive()
    }
}

impl Default for TypeRefArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRefArena {
    /// Create an empty arena with the default configuration
    pub fn new() -> Self {
        TypeRefArenaBuilder::new().build()
    }

    pub fn builder() -> TypeRefArenaBuilder {
        TypeRefArenaBuilder::new()
    }

    /// Number of live type references
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Get the TypeRef for a TypeRefId
    #[track_caller]
    pub fn get(&self, id: TypeRefId) -> &TypeRef {
        self.assert_issued(id);
        &self.types[id.slot()]
    }

    pub fn kind(&self, id: TypeRefId) -> TypeRefKind {
        self.get(id).kind()
    }

    /// All references in creation order
    pub fn entries(&self) -> impl ExactSizeIterator<Item = (TypeRefId, &TypeRef)> + '_ {
        self.types
            .iter()
            .enumerate()
            .map(|(slot, ty)| (TypeRefId::from_raw(slot as u32), ty))
    }

    /// Whether `id` was issued by this arena (by range only; ids from another
    /// arena that happen to be in range are indistinguishable)
    pub fn contains(&self, id: TypeRefId) -> bool {
        id.slot() < self.types.len()
    }

    #[track_caller]
    pub(super) fn assert_issued(&self, id: TypeRefId) {
        if !self.contains(id) {
            panic!(
                "INTERNAL ERROR: type reference {} was not issued by this arena ({} live)\n\
                 Location: {}",
                id,
                self.types.len(),
                std::panic::Location::caller()
            );
        }
    }

    /// Memoized concreteness flag
    #[inline]
    pub(super) fn concrete_flag(&self, id: TypeRefId) -> bool {
        self.concrete[id.slot()]
    }

    // ========================================================================
    // Interning
    // ========================================================================

    /// Find or create the canonical reference for `ty`.
    ///
    /// Every child of `ty` must already have been issued by this arena. The
    /// `Opaque` reference and unnamed ObjC class/protocol references resolve
    /// to the arena's singletons.
    #[track_caller]
    pub fn obtain(&mut self, ty: TypeRef) -> TypeRefId {
        match &ty {
            TypeRef::Opaque => return self.opaque(),
            TypeRef::ObjCClass { name: None } => return self.unnamed_objc_class(),
            TypeRef::ObjCProtocol { name: None } => return self.unnamed_objc_protocol(),
            _ => {}
        }

        let children = ty.children();
        for &child in &children {
            self.assert_issued(child);
        }

        let kind = ty.kind();
        let fingerprint = ty.fingerprint();
        if let Some(&existing) = self.intern_tables[kind as usize].get(&fingerprint) {
            return existing;
        }

        let id = self.push(ty, &children);
        self.intern_tables[kind as usize].insert(fingerprint, id);
        tracing::trace!(%kind, %id, "interned type reference");
        id
    }

    /// Append a new reference without consulting the intern tables
    fn push(&mut self, ty: TypeRef, children: &[TypeRefId]) -> TypeRefId {
        let index = u32::try_from(self.types.len())
            .unwrap_or_else(|_| panic!("INTERNAL ERROR: type reference arena exhausted"));
        let concrete = ty.is_concrete_leaf() && children.iter().all(|&c| self.concrete_flag(c));
        self.types.push(ty);
        self.concrete.push(concrete);
        TypeRefId::from_raw(index)
    }

    /// Look up an already-interned reference without creating one
    pub fn lookup(&self, ty: &TypeRef) -> Option<TypeRefId> {
        match ty {
            TypeRef::Opaque => return self.opaque,
            TypeRef::ObjCClass { name: None } => return self.unnamed_objc_class,
            TypeRef::ObjCProtocol { name: None } => return self.unnamed_objc_protocol,
            _ => {}
        }
        self.intern_tables[ty.kind() as usize]
            .get(&ty.fingerprint())
            .copied()
    }

    // ========================================================================
    // Singletons - created on first request, one per arena
    // ========================================================================

    /// The shared `Opaque` reference
    pub fn opaque(&mut self) -> TypeRefId {
        if let Some(id) = self.opaque {
            return id;
        }
        let id = self.push(TypeRef::Opaque, &[]);
        self.opaque = Some(id);
        id
    }

    /// The shared unnamed ObjC class reference
    pub fn unnamed_objc_class(&mut self) -> TypeRefId {
        if let Some(id) = self.unnamed_objc_class {
            return id;
        }
        let id = self.push(TypeRef::ObjCClass { name: None }, &[]);
        self.unnamed_objc_class = Some(id);
        id
    }

    /// The shared unnamed ObjC protocol reference
    pub fn unnamed_objc_protocol(&mut self) -> TypeRefId {
        if let Some(id) = self.unnamed_objc_protocol {
            return id;
        }
        let id = self.push(TypeRef::ObjCProtocol { name: None }, &[]);
        self.unnamed_objc_protocol = Some(id);
        id
    }

    // ========================================================================
    // Typed constructors - intern on construction
    // ========================================================================

    pub fn builtin(&mut self, mangled_name: impl Into<String>) -> TypeRefId {
        self.obtain(TypeRef::Builtin {
            mangled_name: mangled_name.into(),
        })
    }

    pub fn nominal(
        &mut self,
        mangled_name: impl Into<String>,
        parent: Option<TypeRefId>,
    ) -> TypeRefId {
        self.obtain(TypeRef::Nominal(NominalHeader {
            mangled_name: mangled_name.into(),
            parent,
        }))
    }

    pub fn bound_generic(
        &mut self,
        mangled_name: impl Into<String>,
        generic_args: impl Into<TypeRefVec>,
        parent: Option<TypeRefId>,
    ) -> TypeRefId {
        self.obtain(TypeRef::BoundGeneric {
            nominal: NominalHeader {
                mangled_name: mangled_name.into(),
                parent,
            },
            generic_args: generic_args.into(),
        })
    }

    /// Create a tuple; `labels` is the space-separated label string
    pub fn tuple(
        &mut self,
        elements: impl Into<TypeRefVec>,
        labels: impl Into<String>,
    ) -> TypeRefId {
        self.obtain(TypeRef::Tuple {
            elements: elements.into(),
            labels: labels.into(),
        })
    }

    pub fn opaque_archetype<L: AsRef<[TypeRefId]>>(
        &mut self,
        id: impl Into<String>,
        description: impl Into<String>,
        ordinal: u32,
        argument_lists: &[L],
    ) -> TypeRefId {
        self.obtain(TypeRef::OpaqueArchetype(Box::new(OpaqueArchetypeTypeRef {
            id: id.into(),
            description: description.into(),
            ordinal,
            arguments: PackedArgumentLists::new(argument_lists),
        })))
    }

    pub fn function(
        &mut self,
        params: impl Into<FunctionParamVec>,
        result: TypeRefId,
        flags: FunctionTypeFlags,
    ) -> TypeRefId {
        self.obtain(TypeRef::Function(Box::new(FunctionTypeRef {
            params: params.into(),
            result,
            flags,
        })))
    }

    pub fn protocol_composition(
        &mut self,
        protocols: impl Into<TypeRefVec>,
        superclass: Option<TypeRefId>,
        has_explicit_any_object: bool,
    ) -> TypeRefId {
        self.obtain(TypeRef::ProtocolComposition {
            protocols: protocols.into(),
            superclass,
            has_explicit_any_object,
        })
    }

    pub fn metatype(&mut self, instance: TypeRefId, was_abstract: bool) -> TypeRefId {
        self.obtain(TypeRef::Metatype {
            instance,
            was_abstract,
        })
    }

    pub fn existential_metatype(&mut self, instance: TypeRefId) -> TypeRefId {
        self.obtain(TypeRef::ExistentialMetatype { instance })
    }

    pub fn generic_param(&mut self, depth: u32, index: u32) -> TypeRefId {
        self.obtain(TypeRef::GenericTypeParameter(DepthAndIndex::new(depth, index)))
    }

    pub fn dependent_member(
        &mut self,
        member: impl Into<String>,
        base: TypeRefId,
        protocol: impl Into<String>,
    ) -> TypeRefId {
        self.obtain(TypeRef::DependentMember {
            member: member.into(),
            base,
            protocol: protocol.into(),
        })
    }

    pub fn foreign_class(&mut self, name: impl Into<String>) -> TypeRefId {
        self.obtain(TypeRef::ForeignClass { name: name.into() })
    }

    pub fn objc_class(&mut self, name: impl Into<String>) -> TypeRefId {
        self.obtain(TypeRef::ObjCClass {
            name: Some(name.into()),
        })
    }

    pub fn objc_protocol(&mut self, name: impl Into<String>) -> TypeRefId {
        self.obtain(TypeRef::ObjCProtocol {
            name: Some(name.into()),
        })
    }

    pub fn reference_storage(
        &mut self,
        ownership: ReferenceOwnership,
        referent: TypeRefId,
    ) -> TypeRefId {
        self.obtain(TypeRef::ReferenceStorage {
            ownership,
            referent,
        })
    }

    pub fn weak_storage(&mut self, referent: TypeRefId) -> TypeRefId {
        self.reference_storage(ReferenceOwnership::Weak, referent)
    }

    pub fn unowned_storage(&mut self, referent: TypeRefId) -> TypeRefId {
        self.reference_storage(ReferenceOwnership::Unowned, referent)
    }

    pub fn unmanaged_storage(&mut self, referent: TypeRefId) -> TypeRefId {
        self.reference_storage(ReferenceOwnership::Unmanaged, referent)
    }

    pub fn sil_box(&mut self, boxed: TypeRefId) -> TypeRefId {
        self.obtain(TypeRef::SILBox { boxed })
    }
}
