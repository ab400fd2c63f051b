// type_arena/type_ref.rs
//
// TypeRef: the closed catalog of interned type reference variants and the
// data types they carry.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::fingerprint::Fingerprint;
use super::type_ref_id::{TypeRefId, TypeRefKind, TypeRefVec};

/// Position of a generic parameter: nesting level of its generic context and
/// its index within that context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DepthAndIndex {
    pub depth: u32,
    pub index: u32,
}

impl DepthAndIndex {
    pub fn new(depth: u32, index: u32) -> Self {
        Self { depth, index }
    }
}

impl fmt::Display for DepthAndIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.depth, self.index)
    }
}

/// Mapping from generic parameter positions to the types bound to them.
pub type GenericArgumentMap = FxHashMap<DepthAndIndex, TypeRefId>;

/// Fields shared by nominal and bound generic references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominalHeader {
    pub mangled_name: String,
    /// Enclosing nominal declaration, if any
    pub parent: Option<TypeRefId>,
}

/// How a function parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueOwnership {
    Default,
    InOut,
    Shared,
    Owned,
}

/// Per-parameter flag bits as laid out in the subject runtime's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ParameterFlags(u32);

impl ParameterFlags {
    const VALUE_OWNERSHIP_MASK: u32 = 0x7F;
    const VARIADIC_MASK: u32 = 0x80;
    const AUTO_CLOSURE_MASK: u32 = 0x100;

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn with_value_ownership(self, ownership: ValueOwnership) -> Self {
        let raw = match ownership {
            ValueOwnership::Default => 0,
            ValueOwnership::InOut => 1,
            ValueOwnership::Shared => 2,
            ValueOwnership::Owned => 3,
        };
        Self((self.0 & !Self::VALUE_OWNERSHIP_MASK) | raw)
    }

    pub fn with_variadic(self, variadic: bool) -> Self {
        Self::set(self, Self::VARIADIC_MASK, variadic)
    }

    pub fn with_auto_closure(self, auto_closure: bool) -> Self {
        Self::set(self, Self::AUTO_CLOSURE_MASK, auto_closure)
    }

    /// Ownership convention; unknown encodings read as `Default`
    pub fn value_ownership(self) -> ValueOwnership {
        match self.0 & Self::VALUE_OWNERSHIP_MASK {
            1 => ValueOwnership::InOut,
            2 => ValueOwnership::Shared,
            3 => ValueOwnership::Owned,
            _ => ValueOwnership::Default,
        }
    }

    pub fn is_variadic(self) -> bool {
        self.0 & Self::VARIADIC_MASK != 0
    }

    pub fn is_auto_closure(self) -> bool {
        self.0 & Self::AUTO_CLOSURE_MASK != 0
    }

    fn set(self, mask: u32, on: bool) -> Self {
        if on {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }
}

/// Calling convention of a function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionConvention {
    Swift,
    Block,
    Thin,
    CFunctionPointer,
}

/// Function-level flag bits as laid out in the subject runtime's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FunctionTypeFlags(u64);

impl FunctionTypeFlags {
    const NUM_PARAMETERS_MASK: u64 = 0x0000_FFFF;
    const CONVENTION_MASK: u64 = 0x00FF_0000;
    const CONVENTION_SHIFT: u64 = 16;
    const THROWS_MASK: u64 = 0x0100_0000;
    const PARAM_FLAGS_MASK: u64 = 0x0200_0000;
    const ESCAPING_MASK: u64 = 0x0400_0000;
    const ASYNC_MASK: u64 = 0x2000_0000;
    const SENDABLE_MASK: u64 = 0x4000_0000;

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn num_parameters(self) -> u32 {
        (self.0 & Self::NUM_PARAMETERS_MASK) as u32
    }

    pub fn with_num_parameters(self, count: u16) -> Self {
        Self((self.0 & !Self::NUM_PARAMETERS_MASK) | u64::from(count))
    }

    /// Calling convention; unknown encodings read as `Swift`
    pub fn convention(self) -> FunctionConvention {
        match (self.0 & Self::CONVENTION_MASK) >> Self::CONVENTION_SHIFT {
            1 => FunctionConvention::Block,
            2 => FunctionConvention::Thin,
            3 => FunctionConvention::CFunctionPointer,
            _ => FunctionConvention::Swift,
        }
    }

    pub fn with_convention(self, convention: FunctionConvention) -> Self {
        let raw: u64 = match convention {
            FunctionConvention::Swift => 0,
            FunctionConvention::Block => 1,
            FunctionConvention::Thin => 2,
            FunctionConvention::CFunctionPointer => 3,
        };
        Self((self.0 & !Self::CONVENTION_MASK) | (raw << Self::CONVENTION_SHIFT))
    }

    pub fn throws(self) -> bool {
        self.0 & Self::THROWS_MASK != 0
    }

    pub fn with_throws(self, throws: bool) -> Self {
        self.set(Self::THROWS_MASK, throws)
    }

    pub fn has_param_flags(self) -> bool {
        self.0 & Self::PARAM_FLAGS_MASK != 0
    }

    pub fn with_param_flags(self, has_flags: bool) -> Self {
        self.set(Self::PARAM_FLAGS_MASK, has_flags)
    }

    pub fn is_escaping(self) -> bool {
        self.0 & Self::ESCAPING_MASK != 0
    }

    pub fn with_escaping(self, escaping: bool) -> Self {
        self.set(Self::ESCAPING_MASK, escaping)
    }

    pub fn is_async(self) -> bool {
        self.0 & Self::ASYNC_MASK != 0
    }

    pub fn with_async(self, is_async: bool) -> Self {
        self.set(Self::ASYNC_MASK, is_async)
    }

    pub fn is_sendable(self) -> bool {
        self.0 & Self::SENDABLE_MASK != 0
    }

    pub fn with_sendable(self, sendable: bool) -> Self {
        self.set(Self::SENDABLE_MASK, sendable)
    }

    fn set(self, mask: u64, on: bool) -> Self {
        if on {
            Self(self.0 | mask)
        } else {
            Self(self.0 & !mask)
        }
    }
}

/// One parameter of a function type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParam {
    pub label: String,
    pub ty: TypeRefId,
    pub flags: ParameterFlags,
}

impl FunctionParam {
    /// Unlabelled parameter with default flags
    pub fn new(ty: TypeRefId) -> Self {
        Self {
            label: String::new(),
            ty,
            flags: ParameterFlags::default(),
        }
    }

    pub fn labeled(label: impl Into<String>, ty: TypeRefId) -> Self {
        Self {
            label: label.into(),
            ty,
            flags: ParameterFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: ParameterFlags) -> Self {
        self.flags = flags;
        self
    }
}

pub type FunctionParamVec = SmallVec<[FunctionParam; 4]>;

/// Interned representation of a function type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTypeRef {
    pub params: FunctionParamVec,
    pub result: TypeRefId,
    pub flags: FunctionTypeFlags,
}

/// Ownership policy of a reference storage wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceOwnership {
    Weak,
    Unowned,
    Unmanaged,
}

impl ReferenceOwnership {
    pub fn kind(self) -> TypeRefKind {
        match self {
            ReferenceOwnership::Weak => TypeRefKind::WeakStorage,
            ReferenceOwnership::Unowned => TypeRefKind::UnownedStorage,
            ReferenceOwnership::Unmanaged => TypeRefKind::UnmanagedStorage,
        }
    }
}

/// Window into a `PackedArgumentLists` buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentSpan {
    pub offset: u32,
    pub len: u32,
}

impl ArgumentSpan {
    pub fn end(self) -> u32 {
        self.offset + self.len
    }
}

/// Several argument lists flattened into one contiguous buffer.
///
/// Spans are computed once at construction: offsets increase monotonically,
/// spans never overlap, and the last span ends at the buffer's end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackedArgumentLists {
    buffer: TypeRefVec,
    spans: SmallVec<[ArgumentSpan; 2]>,
}

impl PackedArgumentLists {
    pub fn new<L: AsRef<[TypeRefId]>>(lists: &[L]) -> Self {
        let mut buffer = TypeRefVec::new();
        let mut spans: SmallVec<[ArgumentSpan; 2]> = SmallVec::with_capacity(lists.len());
        for list in lists {
            let list = list.as_ref();
            let offset = span_word(buffer.len());
            buffer.extend_from_slice(list);
            spans.push(ArgumentSpan {
                offset,
                len: span_word(list.len()),
            });
        }
        debug_assert_eq!(
            spans.last().map_or(0, |s| s.end() as usize),
            buffer.len()
        );
        Self { buffer, spans }
    }

    /// Number of argument lists
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The flattened buffer holding every argument in list order
    pub fn buffer(&self) -> &[TypeRefId] {
        &self.buffer
    }

    pub fn spans(&self) -> &[ArgumentSpan] {
        &self.spans
    }

    /// Argument list `i`, if present
    pub fn get(&self, i: usize) -> Option<&[TypeRefId]> {
        self.spans.get(i).map(|&span| self.slice(span))
    }

    /// Iterate over the original argument lists in order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[TypeRefId]> + '_ {
        self.spans.iter().map(|&span| self.slice(span))
    }

    /// Rebuild the nested structure
    pub fn to_lists(&self) -> Vec<Vec<TypeRefId>> {
        self.iter().map(<[TypeRefId]>::to_vec).collect()
    }

    fn slice(&self, span: ArgumentSpan) -> &[TypeRefId] {
        &self.buffer[span.offset as usize..span.end() as usize]
    }
}

fn span_word(len: usize) -> u32 {
    u32::try_from(len)
        .unwrap_or_else(|_| panic!("INTERNAL ERROR: argument list length {len} exceeds u32"))
}

/// Interned representation of an opaque result type's archetype
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueArchetypeTypeRef {
    /// Stable identifier of the opaque type declaration
    pub id: String,
    /// Human-readable, not necessarily stable, description
    pub description: String,
    pub ordinal: u32,
    pub arguments: PackedArgumentLists,
}

/// The canonical type reference representation.
///
/// Stored in the TypeRefArena; pass `TypeRefId` handles around and look the
/// content up with `arena.get(id)`. Child references are always ids issued by
/// the same arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Builtin {
        mangled_name: String,
    },
    Nominal(NominalHeader),
    BoundGeneric {
        nominal: NominalHeader,
        generic_args: TypeRefVec,
    },
    Tuple {
        elements: TypeRefVec,
        /// Space-separated labels, decoded on demand
        labels: String,
    },
    // Boxed to keep TypeRef small
    OpaqueArchetype(Box<OpaqueArchetypeTypeRef>),
    Function(Box<FunctionTypeRef>),
    ProtocolComposition {
        /// Nominal protocol or ObjC protocol references
        protocols: TypeRefVec,
        superclass: Option<TypeRefId>,
        has_explicit_any_object: bool,
    },
    Metatype {
        instance: TypeRefId,
        was_abstract: bool,
    },
    ExistentialMetatype {
        instance: TypeRefId,
    },
    GenericTypeParameter(DepthAndIndex),
    /// `base.member`, where `member` is an associated type of `protocol`
    DependentMember {
        member: String,
        base: TypeRefId,
        protocol: String,
    },
    ForeignClass {
        name: String,
    },
    /// `None` is the arena's unnamed singleton
    ObjCClass {
        name: Option<String>,
    },
    /// `None` is the arena's unnamed singleton
    ObjCProtocol {
        name: Option<String>,
    },
    Opaque,
    ReferenceStorage {
        ownership: ReferenceOwnership,
        referent: TypeRefId,
    },
    SILBox {
        boxed: TypeRefId,
    },
}

impl TypeRef {
    pub fn kind(&self) -> TypeRefKind {
        match self {
            TypeRef::Builtin { .. } => TypeRefKind::Builtin,
            TypeRef::Nominal(_) => TypeRefKind::Nominal,
            TypeRef::BoundGeneric { .. } => TypeRefKind::BoundGeneric,
            TypeRef::Tuple { .. } => TypeRefKind::Tuple,
            TypeRef::OpaqueArchetype(_) => TypeRefKind::OpaqueArchetype,
            TypeRef::Function(_) => TypeRefKind::Function,
            TypeRef::ProtocolComposition { .. } => TypeRefKind::ProtocolComposition,
            TypeRef::Metatype { .. } => TypeRefKind::Metatype,
            TypeRef::ExistentialMetatype { .. } => TypeRefKind::ExistentialMetatype,
            TypeRef::GenericTypeParameter(_) => TypeRefKind::GenericTypeParameter,
            TypeRef::DependentMember { .. } => TypeRefKind::DependentMember,
            TypeRef::ForeignClass { .. } => TypeRefKind::ForeignClass,
            TypeRef::ObjCClass { .. } => TypeRefKind::ObjCClass,
            TypeRef::ObjCProtocol { .. } => TypeRefKind::ObjCProtocol,
            TypeRef::Opaque => TypeRefKind::Opaque,
            TypeRef::ReferenceStorage { ownership, .. } => ownership.kind(),
            TypeRef::SILBox { .. } => TypeRefKind::SILBox,
        }
    }

    /// Encode this reference's constructor arguments.
    ///
    /// Only meaningful within one kind: the arena keeps one table per kind.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut fp = Fingerprint::new();
        match self {
            TypeRef::Builtin { mangled_name } => {
                fp.add_str(mangled_name);
            }
            TypeRef::Nominal(nominal) => {
                fp.add_optional_ref(nominal.parent)
                    .add_str(&nominal.mangled_name);
            }
            TypeRef::BoundGeneric {
                nominal,
                generic_args,
            } => {
                fp.add_optional_ref(nominal.parent)
                    .add_str(&nominal.mangled_name)
                    .add_refs(generic_args);
            }
            TypeRef::Tuple { elements, labels } => {
                fp.add_refs(elements).add_str(labels);
            }
            TypeRef::OpaqueArchetype(opaque) => {
                fp.add_str(&opaque.id)
                    .add_str(&opaque.description)
                    .add_u32(opaque.ordinal)
                    .add_len(opaque.arguments.len());
                for list in opaque.arguments.iter() {
                    fp.add_refs(list);
                }
            }
            TypeRef::Function(func) => {
                fp.add_len(func.params.len());
                for param in &func.params {
                    fp.add_str(&param.label)
                        .add_ref(param.ty)
                        .add_u32(param.flags.bits());
                }
                fp.add_ref(func.result).add_u64(func.flags.bits());
            }
            TypeRef::ProtocolComposition {
                protocols,
                superclass,
                has_explicit_any_object,
            } => {
                fp.add_bool(*has_explicit_any_object)
                    .add_refs(protocols)
                    .add_optional_ref(*superclass);
            }
            TypeRef::Metatype {
                instance,
                was_abstract,
            } => {
                fp.add_ref(*instance).add_bool(*was_abstract);
            }
            TypeRef::ExistentialMetatype { instance } => {
                fp.add_ref(*instance);
            }
            TypeRef::GenericTypeParameter(key) => {
                fp.add_u32(key.depth).add_u32(key.index);
            }
            TypeRef::DependentMember {
                member,
                base,
                protocol,
            } => {
                fp.add_str(member).add_ref(*base).add_str(protocol);
            }
            TypeRef::ForeignClass { name } => {
                fp.add_str(name);
            }
            TypeRef::ObjCClass { name } | TypeRef::ObjCProtocol { name } => {
                // Unnamed singletons never reach the intern tables; the
                // presence word keeps them apart from a named "" all the same.
                match name {
                    Some(name) => fp.add_u32(1).add_str(name),
                    None => fp.add_u32(0),
                };
            }
            TypeRef::Opaque => {}
            TypeRef::ReferenceStorage { referent, .. } => {
                fp.add_ref(*referent);
            }
            TypeRef::SILBox { boxed } => {
                fp.add_ref(*boxed);
            }
        }
        fp
    }

    /// Every direct child reference, in declaration order
    pub fn children(&self) -> TypeRefVec {
        let mut out = TypeRefVec::new();
        match self {
            TypeRef::Nominal(nominal) => out.extend(nominal.parent),
            TypeRef::BoundGeneric {
                nominal,
                generic_args,
            } => {
                out.extend_from_slice(generic_args);
                out.extend(nominal.parent);
            }
            TypeRef::Tuple { elements, .. } => out.extend_from_slice(elements),
            TypeRef::OpaqueArchetype(opaque) => {
                out.extend_from_slice(opaque.arguments.buffer())
            }
            TypeRef::Function(func) => {
                out.extend(func.params.iter().map(|p| p.ty));
                out.push(func.result);
            }
            TypeRef::ProtocolComposition {
                protocols,
                superclass,
                ..
            } => {
                out.extend_from_slice(protocols);
                out.extend(*superclass);
            }
            TypeRef::Metatype { instance, .. } | TypeRef::ExistentialMetatype { instance } => {
                out.push(*instance)
            }
            TypeRef::DependentMember { base, .. } => out.push(*base),
            TypeRef::ReferenceStorage { referent, .. } => out.push(*referent),
            TypeRef::SILBox { boxed } => out.push(*boxed),
            TypeRef::Builtin { .. }
            | TypeRef::GenericTypeParameter(_)
            | TypeRef::ForeignClass { .. }
            | TypeRef::ObjCClass { .. }
            | TypeRef::ObjCProtocol { .. }
            | TypeRef::Opaque => {}
        }
        out
    }

    /// Rebuild this reference with every child replaced by `f(child)`.
    ///
    /// Returns `None` as soon as `f` does. Children are visited in the same
    /// order `children()` lists them.
    pub(super) fn map_children(
        &self,
        mut f: impl FnMut(TypeRefId) -> Option<TypeRefId>,
    ) -> Option<TypeRef> {
        let rebuilt = match self {
            TypeRef::Nominal(nominal) => TypeRef::Nominal(NominalHeader {
                mangled_name: nominal.mangled_name.clone(),
                parent: map_optional(nominal.parent, &mut f)?,
            }),
            TypeRef::BoundGeneric {
                nominal,
                generic_args,
            } => {
                let generic_args = map_ids(generic_args, &mut f)?;
                TypeRef::BoundGeneric {
                    nominal: NominalHeader {
                        mangled_name: nominal.mangled_name.clone(),
                        parent: map_optional(nominal.parent, &mut f)?,
                    },
                    generic_args,
                }
            }
            TypeRef::Tuple { elements, labels } => TypeRef::Tuple {
                elements: map_ids(elements, &mut f)?,
                labels: labels.clone(),
            },
            TypeRef::OpaqueArchetype(opaque) => {
                let lists = opaque
                    .arguments
                    .iter()
                    .map(|list| map_ids(list, &mut f))
                    .collect::<Option<Vec<TypeRefVec>>>()?;
                TypeRef::OpaqueArchetype(Box::new(OpaqueArchetypeTypeRef {
                    id: opaque.id.clone(),
                    description: opaque.description.clone(),
                    ordinal: opaque.ordinal,
                    arguments: PackedArgumentLists::new(&lists),
                }))
            }
            TypeRef::Function(func) => {
                let params = func
                    .params
                    .iter()
                    .map(|param| {
                        Some(FunctionParam {
                            label: param.label.clone(),
                            ty: f(param.ty)?,
                            flags: param.flags,
                        })
                    })
                    .collect::<Option<FunctionParamVec>>()?;
                TypeRef::Function(Box::new(FunctionTypeRef {
                    params,
                    result: f(func.result)?,
                    flags: func.flags,
                }))
            }
            TypeRef::ProtocolComposition {
                protocols,
                superclass,
                has_explicit_any_object,
            } => {
                let protocols = map_ids(protocols, &mut f)?;
                TypeRef::ProtocolComposition {
                    protocols,
                    superclass: map_optional(*superclass, &mut f)?,
                    has_explicit_any_object: *has_explicit_any_object,
                }
            }
            TypeRef::Metatype {
                instance,
                was_abstract,
            } => TypeRef::Metatype {
                instance: f(*instance)?,
                was_abstract: *was_abstract,
            },
            TypeRef::ExistentialMetatype { instance } => TypeRef::ExistentialMetatype {
                instance: f(*instance)?,
            },
            TypeRef::DependentMember {
                member,
                base,
                protocol,
            } => TypeRef::DependentMember {
                member: member.clone(),
                base: f(*base)?,
                protocol: protocol.clone(),
            },
            TypeRef::ReferenceStorage {
                ownership,
                referent,
            } => TypeRef::ReferenceStorage {
                ownership: *ownership,
                referent: f(*referent)?,
            },
            TypeRef::SILBox { boxed } => TypeRef::SILBox { boxed: f(*boxed)? },
            TypeRef::Builtin { .. }
            | TypeRef::GenericTypeParameter(_)
            | TypeRef::ForeignClass { .. }
            | TypeRef::ObjCClass { .. }
            | TypeRef::ObjCProtocol { .. }
            | TypeRef::Opaque => self.clone(),
        };
        Some(rebuilt)
    }

    /// Whether this node by itself is a resolved type, ignoring its children.
    /// Generic parameters, dependent members and opaque archetypes are not.
    pub(super) fn is_concrete_leaf(&self) -> bool {
        !matches!(
            self,
            TypeRef::GenericTypeParameter(_)
                | TypeRef::DependentMember { .. }
                | TypeRef::OpaqueArchetype(_)
        )
    }
}

fn map_ids(
    ids: &[TypeRefId],
    f: &mut impl FnMut(TypeRefId) -> Option<TypeRefId>,
) -> Option<TypeRefVec> {
    ids.iter().map(|&id| f(id)).collect()
}

fn map_optional(
    id: Option<TypeRefId>,
    f: &mut impl FnMut(TypeRefId) -> Option<TypeRefId>,
) -> Option<Option<TypeRefId>> {
    match id {
        Some(id) => f(id).map(Some),
        None => Some(None),
    }
}
