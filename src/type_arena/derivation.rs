// type_arena/derivation.rs
//
// Reverse substitution: recover the generic argument bindings that turn an
// original type reference into a substituted one, by walking both in lockstep.

use rustc_hash::FxHashMap;

use crate::errors::{ArityKind, BindingSite, DerivationError};

use super::arena::TypeRefArena;
use super::type_ref::*;
use super::type_ref_id::TypeRefId;

impl TypeRefArena {
    /// Unify `orig` against `subst`, adding the implied bindings to `subs`.
    ///
    /// A generic parameter on the `orig` side binds its position to whatever
    /// sits at the same place on the `subst` side; a dependent member binds the
    /// same way, keyed by its own identity, and when the `subst` side is the
    /// same member of a rewritten base the two bases are unified too.
    /// Everything else must agree in kind, child count and payload. Entries
    /// already in `subs` act as prior bindings.
    ///
    /// `subs` is only updated when the whole walk succeeds; on error it is left
    /// as it was.
    #[tracing::instrument(skip(self, subs))]
    pub fn derive_substitutions(
        &self,
        orig: TypeRefId,
        subst: TypeRefId,
        subs: &mut GenericArgumentMap,
    ) -> Result<(), DerivationError> {
        let mut derivation = Derivation {
            arena: self,
            bindings: subs.clone(),
            member_bindings: FxHashMap::default(),
        };
        match derivation.unify(orig, subst) {
            Ok(()) => {
                *subs = derivation.bindings;
                Ok(())
            }
            Err(err) => {
                tracing::debug!(%err, "substitution derivation failed");
                Err(err)
            }
        }
    }
}

/// Scratch state for one `derive_substitutions` call
struct Derivation<'a> {
    arena: &'a TypeRefArena,
    bindings: GenericArgumentMap,
    /// Dependent member sites, keyed by the canonical member reference
    member_bindings: FxHashMap<TypeRefId, TypeRefId>,
}

impl Derivation<'_> {
    fn unify(&mut self, orig: TypeRefId, subst: TypeRefId) -> Result<(), DerivationError> {
        let arena = self.arena;

        // Identical concrete references cannot contribute bindings
        if orig == subst && arena.is_concrete(orig) {
            return Ok(());
        }

        let orig_ty = arena.get(orig);
        if let TypeRef::GenericTypeParameter(key) = orig_ty {
            return bind(
                &mut self.bindings,
                *key,
                subst,
                BindingSite::GenericParam(*key),
            );
        }
        if let TypeRef::DependentMember {
            member,
            base,
            protocol,
        } = orig_ty
        {
            bind(
                &mut self.member_bindings,
                orig,
                subst,
                BindingSite::DependentMember(orig),
            )?;
            // `subst` keeps the member and rewrites only its base
            return match arena.get(subst) {
                TypeRef::DependentMember {
                    member: subst_member,
                    base: subst_base,
                    protocol: subst_protocol,
                } if member == subst_member && protocol == subst_protocol => {
                    self.unify(*base, *subst_base)
                }
                _ => Ok(()),
            };
        }

        let subst_ty = arena.get(subst);
        if orig_ty.kind() != subst_ty.kind() {
            return Err(self.mismatch(orig, subst));
        }

        match (orig_ty, subst_ty) {
            (
                TypeRef::Builtin { mangled_name: a },
                TypeRef::Builtin { mangled_name: b },
            )
            | (TypeRef::ForeignClass { name: a }, TypeRef::ForeignClass { name: b }) => {
                self.expect(a == b, orig, subst)
            }
            (TypeRef::ObjCClass { name: a }, TypeRef::ObjCClass { name: b })
            | (TypeRef::ObjCProtocol { name: a }, TypeRef::ObjCProtocol { name: b }) => {
                self.expect(a == b, orig, subst)
            }
            (TypeRef::Opaque, TypeRef::Opaque) => Ok(()),
            (TypeRef::Nominal(a), TypeRef::Nominal(b)) => {
                self.unify_header(a, b, orig, subst)?;
                self.unify_optional(a.parent, b.parent)
            }
            (
                TypeRef::BoundGeneric {
                    nominal: a,
                    generic_args: a_args,
                },
                TypeRef::BoundGeneric {
                    nominal: b,
                    generic_args: b_args,
                },
            ) => {
                self.unify_header(a, b, orig, subst)?;
                self.unify_all(ArityKind::GenericArguments, a_args, b_args)?;
                self.unify_optional(a.parent, b.parent)
            }
            (TypeRef::Tuple { elements: a, .. }, TypeRef::Tuple { elements: b, .. }) => {
                // Labels are not part of the match; substitution drops them
                self.unify_all(ArityKind::TupleElements, a, b)
            }
            (TypeRef::OpaqueArchetype(a), TypeRef::OpaqueArchetype(b)) => {
                self.expect(a.id == b.id && a.ordinal == b.ordinal, orig, subst)?;
                check_arity(ArityKind::ArgumentLists, a.arguments.len(), b.arguments.len())?;
                for (a_list, b_list) in a.arguments.iter().zip(b.arguments.iter()) {
                    self.unify_all(ArityKind::ArgumentList, a_list, b_list)?;
                }
                Ok(())
            }
            (TypeRef::Function(a), TypeRef::Function(b)) => {
                check_arity(ArityKind::FunctionParameters, a.params.len(), b.params.len())?;
                self.expect(a.flags == b.flags, orig, subst)?;
                for (a_param, b_param) in a.params.iter().zip(&b.params) {
                    self.expect(a_param.flags == b_param.flags, orig, subst)?;
                    self.unify(a_param.ty, b_param.ty)?;
                }
                self.unify(a.result, b.result)
            }
            (
                TypeRef::ProtocolComposition {
                    protocols: a,
                    superclass: a_super,
                    has_explicit_any_object: a_any,
                },
                TypeRef::ProtocolComposition {
                    protocols: b,
                    superclass: b_super,
                    has_explicit_any_object: b_any,
                },
            ) => {
                self.expect(
                    a_any == b_any && a_super.is_some() == b_super.is_some(),
                    orig,
                    subst,
                )?;
                self.unify_all(ArityKind::Protocols, a, b)?;
                self.unify_optional(*a_super, *b_super)
            }
            (
                TypeRef::Metatype {
                    instance: a,
                    was_abstract: a_abstract,
                },
                TypeRef::Metatype {
                    instance: b,
                    was_abstract: b_abstract,
                },
            ) => {
                self.expect(a_abstract == b_abstract, orig, subst)?;
                self.unify(*a, *b)
            }
            (
                TypeRef::ExistentialMetatype { instance: a },
                TypeRef::ExistentialMetatype { instance: b },
            )
            | (
                TypeRef::ReferenceStorage { referent: a, .. },
                TypeRef::ReferenceStorage { referent: b, .. },
            )
            | (TypeRef::SILBox { boxed: a }, TypeRef::SILBox { boxed: b }) => self.unify(*a, *b),
            // Kinds agree and generic parameters and dependent members
            // returned early, so no pair reaches this arm
            _ => Err(self.mismatch(orig, subst)),
        }
    }

    fn unify_header(
        &self,
        a: &NominalHeader,
        b: &NominalHeader,
        orig: TypeRefId,
        subst: TypeRefId,
    ) -> Result<(), DerivationError> {
        self.expect(
            a.mangled_name == b.mangled_name && a.parent.is_some() == b.parent.is_some(),
            orig,
            subst,
        )
    }

    fn unify_all(
        &mut self,
        what: ArityKind,
        orig: &[TypeRefId],
        subst: &[TypeRefId],
    ) -> Result<(), DerivationError> {
        check_arity(what, orig.len(), subst.len())?;
        orig.iter()
            .zip(subst)
            .try_for_each(|(&o, &s)| self.unify(o, s))
    }

    /// Callers check that both sides agree on presence first
    fn unify_optional(
        &mut self,
        orig: Option<TypeRefId>,
        subst: Option<TypeRefId>,
    ) -> Result<(), DerivationError> {
        match (orig, subst) {
            (Some(o), Some(s)) => self.unify(o, s),
            _ => Ok(()),
        }
    }

    fn expect(&self, ok: bool, orig: TypeRefId, subst: TypeRefId) -> Result<(), DerivationError> {
        if ok {
            Ok(())
        } else {
            Err(self.mismatch(orig, subst))
        }
    }

    fn mismatch(&self, orig: TypeRefId, subst: TypeRefId) -> DerivationError {
        DerivationError::StructuralMismatch {
            orig,
            orig_kind: self.arena.kind(orig),
            subst,
            subst_kind: self.arena.kind(subst),
        }
    }
}

fn check_arity(what: ArityKind, expected: usize, found: usize) -> Result<(), DerivationError> {
    if expected == found {
        Ok(())
    } else {
        Err(DerivationError::ArityMismatch {
            what,
            expected,
            found,
        })
    }
}

/// Record `site -> value`, failing if the site already holds something else
fn bind<K>(
    table: &mut FxHashMap<K, TypeRefId>,
    key: K,
    value: TypeRefId,
    site: BindingSite,
) -> Result<(), DerivationError>
where
    K: std::hash::Hash + Eq,
{
    match table.get(&key) {
        Some(&bound) if bound != value => Err(DerivationError::ContradictorySubstitution {
            site,
            bound,
            conflicting: value,
        }),
        Some(_) => Ok(()),
        None => {
            table.insert(key, value);
            Ok(())
        }
    }
}
