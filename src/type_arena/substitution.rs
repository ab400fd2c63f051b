// type_arena/substitution.rs
//
// Generic substitution: concreteness tests, substitution of generic
// parameters, and the substitution map implied by a bound generic reference.

use super::arena::TypeRefArena;
use super::type_ref::*;
use super::type_ref_id::TypeRefId;

impl TypeRefArena {
    // ========================================================================
    // Concreteness
    // ========================================================================

    /// Check if a reference is free of generic parameters, dependent members
    /// and opaque archetypes anywhere in its structure.
    ///
    /// Computed once at intern time, so this is a table lookup.
    #[track_caller]
    pub fn is_concrete(&self, id: TypeRefId) -> bool {
        self.assert_issued(id);
        self.concrete_flag(id)
    }

    /// Check if a reference would be concrete once `subs` is applied.
    ///
    /// A generic parameter counts as resolved when its position is bound in
    /// `subs`; the bound type itself is not inspected. A dependent member has
    /// no key of its own and survives substitution, so it is never resolved.
    pub fn is_concrete_after_substitutions(
        &self,
        id: TypeRefId,
        subs: &GenericArgumentMap,
    ) -> bool {
        if self.is_concrete(id) {
            return true;
        }
        match self.get(id) {
            TypeRef::GenericTypeParameter(key) => subs.contains_key(key),
            TypeRef::DependentMember { .. } | TypeRef::OpaqueArchetype(_) => false,
            ty => ty
                .children()
                .iter()
                .all(|&child| self.is_concrete_after_substitutions(child, subs)),
        }
    }

    // ========================================================================
    // Substitution
    // ========================================================================

    /// Substitute generic parameters with the types bound in `subs`.
    ///
    /// Parameters without a binding are left in place. A composite is only
    /// rebuilt (and interned) when one of its children actually changed, so a
    /// no-op substitution returns `id` itself without allocating. Rebuilt
    /// tuples carry an empty label string.
    pub fn subst(&mut self, id: TypeRefId, subs: &GenericArgumentMap) -> TypeRefId {
        // Early exit: nothing to substitute, or nothing to substitute into
        if subs.is_empty() || self.is_concrete(id) {
            return id;
        }

        // Clone the interned reference to release the borrow
        let ty = self.get(id).clone();
        if let TypeRef::GenericTypeParameter(key) = ty {
            return subs.get(&key).copied().unwrap_or(id);
        }

        let mut changed = false;
        let rebuilt = ty.map_children(|child| {
            let new_child = self.subst(child, subs);
            changed |= new_child != child;
            Some(new_child)
        });
        let Some(mut rebuilt) = rebuilt.filter(|_| changed) else {
            return id;
        };
        if let TypeRef::Tuple { labels, .. } = &mut rebuilt {
            labels.clear();
        }

        let result = self.obtain(rebuilt);
        tracing::trace!(%id, %result, "substituted type reference");
        result
    }

    /// Look up a substituted reference without creating new references.
    ///
    /// This is the read-only version of `subst`. Returns `Some` if every
    /// rebuilt node already exists in the arena, `None` otherwise.
    pub fn lookup_subst(&self, id: TypeRefId, subs: &GenericArgumentMap) -> Option<TypeRefId> {
        if subs.is_empty() || self.is_concrete(id) {
            return Some(id);
        }

        let ty = self.get(id);
        if let TypeRef::GenericTypeParameter(key) = ty {
            return Some(subs.get(key).copied().unwrap_or(id));
        }

        let mut changed = false;
        let mut rebuilt = ty.map_children(|child| {
            let new_child = self.lookup_subst(child, subs)?;
            changed |= new_child != child;
            Some(new_child)
        })?;
        if !changed {
            return Some(id);
        }
        if let TypeRef::Tuple { labels, .. } = &mut rebuilt {
            labels.clear();
        }
        self.lookup(&rebuilt)
    }

    /// Generic argument bindings implied by a bound generic reference.
    ///
    /// A bound generic binds `(depth, i)` to its `i`th argument, where `depth`
    /// is its nominal depth, then adds its parent's bindings. A plain nominal
    /// defers to its parent. Returns `None` if any bound argument along the
    /// chain is not concrete; other kinds yield an empty map.
    pub fn subst_map(&self, id: TypeRefId) -> Option<GenericArgumentMap> {
        match self.get(id) {
            TypeRef::Nominal(nominal) => match nominal.parent {
                Some(parent) => self.subst_map(parent),
                None => Some(GenericArgumentMap::default()),
            },
            TypeRef::BoundGeneric {
                nominal,
                generic_args,
            } => {
                let depth = self.nominal_depth(id);
                let mut map = GenericArgumentMap::default();
                for (index, &arg) in generic_args.iter().enumerate() {
                    if !self.is_concrete(arg) {
                        return None;
                    }
                    map.insert(DepthAndIndex::new(depth, index as u32), arg);
                }
                if let Some(parent) = nominal.parent {
                    for (key, arg) in self.subst_map(parent)? {
                        map.entry(key).or_insert(arg);
                    }
                }
                Some(map)
            }
            _ => Some(GenericArgumentMap::default()),
        }
    }
}
