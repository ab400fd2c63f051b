// type_arena/symbolic.rs
//
// Symbol tree export: turn a type reference into the node tree an external
// demangler prints. Every type node is wrapped in a `Type` node.

use crate::classify::NominalKind;
use crate::symbol::{DemangleContext, SymbolKind, SymbolNode};

use super::arena::TypeRefArena;
use super::query::decode_tuple_labels;
use super::type_ref::*;
use super::type_ref_id::TypeRefId;

/// Module name the subject runtime uses for imported ObjC declarations
const OBJC_MODULE: &str = "__C";

impl TypeRefArena {
    /// Build the symbol tree for `id`.
    ///
    /// Mangled names are offered to `ctx` first; names it cannot demangle
    /// appear as raw `MangledName` nodes.
    pub fn to_symbolic_tree(&self, id: TypeRefId, ctx: &mut dyn DemangleContext) -> SymbolNode {
        SymbolExporter { arena: self, ctx }.export(id)
    }
}

struct SymbolExporter<'a, 'c> {
    arena: &'a TypeRefArena,
    ctx: &'c mut dyn DemangleContext,
}

impl SymbolExporter<'_, '_> {
    fn export(&mut self, id: TypeRefId) -> SymbolNode {
        let arena = self.arena;
        let node = match arena.get(id) {
            TypeRef::Builtin { mangled_name } => {
                return self.demangled_type(mangled_name).unwrap_or_else(|| {
                    SymbolNode::text(SymbolKind::BuiltinTypeName, mangled_name).into_type()
                });
            }
            TypeRef::Nominal(nominal) => {
                return self.mangled_type(&nominal.mangled_name);
            }
            TypeRef::BoundGeneric {
                nominal,
                generic_args,
            } => self.bound_generic(&nominal.mangled_name, generic_args),
            TypeRef::Tuple { elements, labels } => self.tuple(elements, labels),
            TypeRef::OpaqueArchetype(opaque) => self.opaque_archetype(opaque),
            TypeRef::Function(func) => self.function(func),
            TypeRef::ProtocolComposition {
                protocols,
                superclass,
                has_explicit_any_object,
            } => self.protocol_composition(protocols, *superclass, *has_explicit_any_object),
            TypeRef::Metatype { instance, .. } => {
                SymbolNode::with_children(SymbolKind::Metatype, vec![self.export(*instance)])
            }
            TypeRef::ExistentialMetatype { instance } => SymbolNode::with_children(
                SymbolKind::ExistentialMetatype,
                vec![self.export(*instance)],
            ),
            TypeRef::GenericTypeParameter(key) => SymbolNode::with_children(
                SymbolKind::DependentGenericParamType,
                vec![
                    SymbolNode::index(SymbolKind::Index, u64::from(key.depth)),
                    SymbolNode::index(SymbolKind::Index, u64::from(key.index)),
                ],
            ),
            TypeRef::DependentMember {
                member,
                base,
                protocol,
            } => {
                let base = self.export(*base);
                let protocol = self.mangled_type(protocol);
                let assoc = SymbolNode::with_children(
                    SymbolKind::DependentAssociatedTypeRef,
                    vec![SymbolNode::text(SymbolKind::Identifier, member), protocol],
                );
                SymbolNode::with_children(SymbolKind::DependentMemberType, vec![base, assoc])
            }
            TypeRef::ForeignClass { name } => return self.mangled_type(name),
            TypeRef::ObjCClass { name } => objc_node(SymbolKind::Class, name.as_deref()),
            TypeRef::ObjCProtocol { name } => objc_node(SymbolKind::Protocol, name.as_deref()),
            TypeRef::Opaque => SymbolNode::new(SymbolKind::OpaqueType),
            TypeRef::ReferenceStorage {
                ownership,
                referent,
            } => {
                let kind = match ownership {
                    ReferenceOwnership::Weak => SymbolKind::Weak,
                    ReferenceOwnership::Unowned => SymbolKind::Unowned,
                    ReferenceOwnership::Unmanaged => SymbolKind::Unmanaged,
                };
                SymbolNode::with_children(kind, vec![self.export(*referent)])
            }
            TypeRef::SILBox { boxed } => {
                SymbolNode::with_children(SymbolKind::SILBoxType, vec![self.export(*boxed)])
            }
        };
        node.into_type()
    }

    fn demangled_type(&mut self, mangled_name: &str) -> Option<SymbolNode> {
        self.ctx.demangle_type(mangled_name)
    }

    /// Demangled type tree, or a raw `MangledName` node wrapped in `Type`
    fn mangled_type(&mut self, mangled_name: &str) -> SymbolNode {
        self.demangled_type(mangled_name).unwrap_or_else(|| {
            SymbolNode::text(SymbolKind::MangledName, mangled_name).into_type()
        })
    }

    fn bound_generic(&mut self, mangled_name: &str, generic_args: &[TypeRefId]) -> SymbolNode {
        let kind = match self.arena.classifier.classify(mangled_name) {
            NominalKind::Struct => SymbolKind::BoundGenericStructure,
            NominalKind::Enum => SymbolKind::BoundGenericEnum,
            NominalKind::Class => SymbolKind::BoundGenericClass,
            NominalKind::Protocol | NominalKind::Alias | NominalKind::Unknown => {
                SymbolKind::BoundGenericOtherNominalType
            }
        };
        let unspecialized = self.mangled_type(mangled_name);
        let args = self.type_list(generic_args);
        SymbolNode::with_children(kind, vec![unspecialized, args])
    }

    fn type_list(&mut self, ids: &[TypeRefId]) -> SymbolNode {
        let children = ids.iter().map(|&id| self.export(id)).collect();
        SymbolNode::with_children(SymbolKind::TypeList, children)
    }

    fn tuple(&mut self, elements: &[TypeRefId], labels: &str) -> SymbolNode {
        // Malformed label strings still export, unlabelled
        let labels = decode_tuple_labels(labels, elements.len()).unwrap_or_default();
        let children = elements
            .iter()
            .enumerate()
            .map(|(i, &element)| {
                let label = labels.get(i).copied().unwrap_or("");
                tuple_element(label, self.export(element))
            })
            .collect();
        SymbolNode::with_children(SymbolKind::Tuple, children)
    }

    fn opaque_archetype(&mut self, opaque: &OpaqueArchetypeTypeRef) -> SymbolNode {
        let decl = self
            .ctx
            .demangle_symbol(&opaque.id)
            .unwrap_or_else(|| SymbolNode::text(SymbolKind::MangledName, opaque.id.as_str()));
        let lists = opaque
            .arguments
            .iter()
            .map(|list| self.type_list(list))
            .collect();
        SymbolNode::with_children(
            SymbolKind::OpaqueType,
            vec![
                decl,
                SymbolNode::index(SymbolKind::Index, u64::from(opaque.ordinal)),
                SymbolNode::with_children(SymbolKind::TypeList, lists),
            ],
        )
    }

    fn function(&mut self, func: &FunctionTypeRef) -> SymbolNode {
        let kind = match func.flags.convention() {
            FunctionConvention::Swift if func.flags.is_escaping() => SymbolKind::FunctionType,
            FunctionConvention::Swift => SymbolKind::NoEscapeFunctionType,
            FunctionConvention::Block => SymbolKind::ObjCBlock,
            FunctionConvention::Thin => SymbolKind::ThinFunctionType,
            FunctionConvention::CFunctionPointer => SymbolKind::CFunctionPointer,
        };

        let mut node = SymbolNode::new(kind);
        if func.flags.throws() {
            node.push(SymbolNode::new(SymbolKind::ThrowsAnnotation));
        }
        if func.flags.is_async() {
            node.push(SymbolNode::new(SymbolKind::AsyncAnnotation));
        }

        let params = func
            .params
            .iter()
            .map(|param| {
                let ty = self.parameter(param);
                tuple_element(&param.label, ty)
            })
            .collect();
        let params = SymbolNode::with_children(SymbolKind::Tuple, params).into_type();
        node.push(SymbolNode::with_children(
            SymbolKind::ArgumentTuple,
            vec![params],
        ));

        let result = self.export(func.result);
        node.push(SymbolNode::with_children(SymbolKind::ReturnType, vec![result]));
        node
    }

    /// Parameter type with its ownership and attribute wrappers applied
    fn parameter(&mut self, param: &FunctionParam) -> SymbolNode {
        let mut ty = self.export(param.ty);
        let ownership = match param.flags.value_ownership() {
            ValueOwnership::Default => None,
            ValueOwnership::InOut => Some(SymbolKind::InOut),
            ValueOwnership::Shared => Some(SymbolKind::Shared),
            ValueOwnership::Owned => Some(SymbolKind::Owned),
        };
        if let Some(kind) = ownership {
            ty = SymbolNode::with_children(kind, vec![ty]).into_type();
        }
        if param.flags.is_auto_closure() {
            ty = SymbolNode::with_children(SymbolKind::AutoClosureType, vec![ty]).into_type();
        }
        if param.flags.is_variadic() {
            ty = SymbolNode::with_children(SymbolKind::VariadicMarker, vec![ty]).into_type();
        }
        ty
    }

    fn protocol_composition(
        &mut self,
        protocols: &[TypeRefId],
        superclass: Option<TypeRefId>,
        has_explicit_any_object: bool,
    ) -> SymbolNode {
        let list =
            SymbolNode::with_children(SymbolKind::ProtocolList, vec![self.type_list(protocols)]);
        if let Some(superclass) = superclass {
            let superclass = self.export(superclass);
            SymbolNode::with_children(SymbolKind::ProtocolListWithClass, vec![list, superclass])
        } else if has_explicit_any_object {
            SymbolNode::with_children(SymbolKind::ProtocolListWithAnyObject, vec![list])
        } else {
            list
        }
    }
}

fn tuple_element(label: &str, ty: SymbolNode) -> SymbolNode {
    let mut element = SymbolNode::new(SymbolKind::TupleElement);
    if !label.is_empty() {
        element.push(SymbolNode::text(SymbolKind::TupleElementName, label));
    }
    element.push(ty);
    element
}

fn objc_node(kind: SymbolKind, name: Option<&str>) -> SymbolNode {
    SymbolNode::with_children(
        kind,
        vec![
            SymbolNode::text(SymbolKind::Module, OBJC_MODULE),
            SymbolNode::text(SymbolKind::Identifier, name.unwrap_or("")),
        ],
    )
}
