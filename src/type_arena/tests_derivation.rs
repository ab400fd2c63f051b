// type_arena/tests_derivation.rs
//
// Unit tests for derive_substitutions.

#[cfg(test)]
mod derivation_tests {
    use smallvec::smallvec;

    use crate::errors::{ArityKind, BindingSite, DerivationError};
    use crate::type_arena::*;

    fn key(depth: u32, index: u32) -> DepthAndIndex {
        DepthAndIndex::new(depth, index)
    }

    // ========================================================================
    // Basic scenarios
    // ========================================================================

    #[test]
    fn derive_tuple_of_params() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let bool_ = arena.builtin("Sb");
        let t = arena.generic_param(0, 0);
        let u = arena.generic_param(0, 1);
        let orig = arena.tuple(smallvec![t, u], "");
        let subst = arena.tuple(smallvec![int, bool_], "");

        let mut subs = GenericArgumentMap::default();
        arena.derive_substitutions(orig, subst, &mut subs).unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[&key(0, 0)], int);
        assert_eq!(subs[&key(0, 1)], bool_);
    }

    #[test]
    fn tuple_arity_mismatch() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let bool_ = arena.builtin("Sb");
        let t = arena.generic_param(0, 0);
        let orig = arena.tuple(smallvec![t], "");
        let subst = arena.tuple(smallvec![int, bool_], "");

        let mut subs = GenericArgumentMap::default();
        let err = arena.derive_substitutions(orig, subst, &mut subs).unwrap_err();
        assert_eq!(
            err,
            DerivationError::ArityMismatch {
                what: ArityKind::TupleElements,
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn contradictory_binding() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let bool_ = arena.builtin("Sb");
        let t = arena.generic_param(0, 0);
        let orig = arena.tuple(smallvec![t, t], "");
        let subst = arena.tuple(smallvec![int, bool_], "");

        let mut subs = GenericArgumentMap::default();
        let err = arena.derive_substitutions(orig, subst, &mut subs).unwrap_err();
        assert_eq!(
            err,
            DerivationError::ContradictorySubstitution {
                site: BindingSite::GenericParam(key(0, 0)),
                bound: int,
                conflicting: bool_,
            }
        );
    }

    #[test]
    fn repeated_param_with_same_binding() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let orig = arena.tuple(smallvec![t, t], "");
        let subst = arena.tuple(smallvec![int, int], "");

        let mut subs = GenericArgumentMap::default();
        arena.derive_substitutions(orig, subst, &mut subs).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[&key(0, 0)], int);
    }

    #[test]
    fn failure_leaves_map_untouched() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let bool_ = arena.builtin("Sb");
        let t = arena.generic_param(0, 0);
        let u = arena.generic_param(0, 1);
        // (0,1) binds before the mismatch on the third element is found
        let orig = arena.tuple(smallvec![u, t, int], "");
        let subst = arena.tuple(smallvec![bool_, int, bool_], "");

        let mut subs = GenericArgumentMap::default();
        let err = arena.derive_substitutions(orig, subst, &mut subs).unwrap_err();
        assert!(matches!(err, DerivationError::StructuralMismatch { .. }));
        assert!(subs.is_empty());
    }

    #[test]
    fn existing_bindings_are_respected() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let bool_ = arena.builtin("Sb");
        let t = arena.generic_param(0, 0);

        let mut subs = GenericArgumentMap::default();
        subs.insert(key(0, 0), bool_);
        let err = arena.derive_substitutions(t, int, &mut subs).unwrap_err();
        assert!(matches!(
            err,
            DerivationError::ContradictorySubstitution { bound, conflicting, .. }
                if bound == bool_ && conflicting == int
        ));
        assert_eq!(subs[&key(0, 0)], bool_);
    }

    // ========================================================================
    // Structural mismatches
    // ========================================================================

    #[test]
    fn kind_mismatch() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let orig = arena.tuple(smallvec![t], "");
        let subst = arena.bound_generic("Sa", smallvec![int], None);

        let err = arena
            .derive_substitutions(orig, subst, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert_eq!(
            err,
            DerivationError::StructuralMismatch {
                orig,
                orig_kind: TypeRefKind::Tuple,
                subst,
                subst_kind: TypeRefKind::BoundGeneric,
            }
        );
    }

    #[test]
    fn leaf_payload_mismatch() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let bool_ = arena.builtin("Sb");
        let foo = arena.objc_class("Foo");
        let bar = arena.objc_class("Bar");

        let mut subs = GenericArgumentMap::default();
        assert!(matches!(
            arena.derive_substitutions(int, bool_, &mut subs),
            Err(DerivationError::StructuralMismatch { .. })
        ));
        assert!(matches!(
            arena.derive_substitutions(foo, bar, &mut subs),
            Err(DerivationError::StructuralMismatch { .. })
        ));
        assert!(arena.derive_substitutions(int, int, &mut subs).is_ok());
        assert!(subs.is_empty());
    }

    #[test]
    fn nominal_name_mismatch() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let array = arena.bound_generic("Sa", smallvec![t], None);
        let set = arena.bound_generic("Sh", smallvec![int], None);

        let err = arena
            .derive_substitutions(array, set, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert!(matches!(err, DerivationError::StructuralMismatch { .. }));
    }

    #[test]
    fn generic_argument_arity_mismatch() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let orig = arena.bound_generic("SD", smallvec![t], None);
        let subst = arena.bound_generic("SD", smallvec![int, int], None);

        let err = arena
            .derive_substitutions(orig, subst, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DerivationError::ArityMismatch {
                what: ArityKind::GenericArguments,
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn function_parameter_count_mismatch() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let orig = arena.function(
            smallvec![FunctionParam::new(t)],
            t,
            FunctionTypeFlags::default().with_num_parameters(1),
        );
        let subst = arena.function(
            smallvec![FunctionParam::new(int), FunctionParam::new(int)],
            int,
            FunctionTypeFlags::default().with_num_parameters(2),
        );

        let err = arena
            .derive_substitutions(orig, subst, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DerivationError::ArityMismatch {
                what: ArityKind::FunctionParameters,
                ..
            }
        ));
    }

    #[test]
    fn function_flags_must_match() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let flags = FunctionTypeFlags::default().with_num_parameters(1);
        let orig = arena.function(smallvec![FunctionParam::new(t)], int, flags);
        let throwing = arena.function(
            smallvec![FunctionParam::new(int)],
            int,
            flags.with_throws(true),
        );
        let inout = arena.function(
            smallvec![FunctionParam::new(int)
                .with_flags(ParameterFlags::default().with_value_ownership(ValueOwnership::InOut))],
            int,
            flags,
        );

        let mut subs = GenericArgumentMap::default();
        assert!(arena.derive_substitutions(orig, throwing, &mut subs).is_err());
        assert!(arena.derive_substitutions(orig, inout, &mut subs).is_err());
        assert!(subs.is_empty());
    }

    #[test]
    fn function_labels_are_ignored() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let flags = FunctionTypeFlags::default().with_num_parameters(1);
        let orig = arena.function(smallvec![FunctionParam::labeled("x", t)], t, flags);
        let subst = arena.function(smallvec![FunctionParam::labeled("y", int)], int, flags);

        let mut subs = GenericArgumentMap::default();
        arena.derive_substitutions(orig, subst, &mut subs).unwrap();
        assert_eq!(subs[&key(0, 0)], int);
    }

    #[test]
    fn reference_storage_ownership_must_match() {
        let mut arena = TypeRefArena::new();
        let class = arena.nominal("4main3FooC", None);
        let t = arena.generic_param(0, 0);
        let weak_t = arena.weak_storage(t);
        let unowned = arena.unowned_storage(class);

        let err = arena
            .derive_substitutions(weak_t, unowned, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DerivationError::StructuralMismatch {
                orig_kind: TypeRefKind::WeakStorage,
                subst_kind: TypeRefKind::UnownedStorage,
                ..
            }
        ));
    }

    #[test]
    fn parent_presence_must_match() {
        let mut arena = TypeRefArena::new();
        let outer = arena.nominal("4main5OuterV", None);
        let nested = arena.nominal("4main5InnerV", Some(outer));
        let top = arena.nominal("4main5InnerV", None);

        let err = arena
            .derive_substitutions(nested, top, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert!(matches!(err, DerivationError::StructuralMismatch { .. }));
    }

    #[test]
    fn generic_param_on_subst_side_does_not_bind() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);

        let err = arena
            .derive_substitutions(int, t, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert!(matches!(err, DerivationError::StructuralMismatch { .. }));
    }

    // ========================================================================
    // Dependent members
    // ========================================================================

    #[test]
    fn dependent_member_is_a_binding_site() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let bool_ = arena.builtin("Sb");
        let t = arena.generic_param(0, 0);
        let element = arena.dependent_member("Element", t, "STQ");

        let consistent_orig = arena.tuple(smallvec![t, element, element], "");
        let consistent = arena.tuple(smallvec![bool_, int, int], "");
        let mut subs = GenericArgumentMap::default();
        arena
            .derive_substitutions(consistent_orig, consistent, &mut subs)
            .unwrap();
        // Only generic parameters land in the caller's map
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[&key(0, 0)], bool_);

        let conflicting = arena.tuple(smallvec![bool_, int, bool_], "");
        let err = arena
            .derive_substitutions(consistent_orig, conflicting, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert_eq!(
            err,
            DerivationError::ContradictorySubstitution {
                site: BindingSite::DependentMember(element),
                bound: int,
                conflicting: bool_,
            }
        );
    }

    #[test]
    fn dependent_member_base_is_walked() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let element = arena.dependent_member("Element", t, "STsP");
        let orig = arena.tuple(smallvec![element], "");

        let map = GenericArgumentMap::from_iter([(key(0, 0), int)]);
        let subst = arena.subst(orig, &map);

        let mut derived = GenericArgumentMap::default();
        arena.derive_substitutions(orig, subst, &mut derived).unwrap();
        assert_eq!(derived, map);
    }

    #[test]
    fn dependent_member_base_must_agree_across_sites() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let string = arena.builtin("SS");
        let t = arena.generic_param(0, 0);
        let element = arena.dependent_member("Element", t, "STsP");
        let int_element = arena.dependent_member("Element", int, "STsP");
        let orig = arena.tuple(smallvec![t, element], "");
        let subst = arena.tuple(smallvec![string, int_element], "");

        let err = arena
            .derive_substitutions(orig, subst, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert_eq!(
            err,
            DerivationError::ContradictorySubstitution {
                site: BindingSite::GenericParam(key(0, 0)),
                bound: string,
                conflicting: int,
            }
        );
    }

    #[test]
    fn other_member_on_subst_side_binds_opaquely() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let element = arena.dependent_member("Element", t, "STsP");
        let index = arena.dependent_member("Index", int, "Sl");

        let mut subs = GenericArgumentMap::default();
        arena.derive_substitutions(element, index, &mut subs).unwrap();
        assert!(subs.is_empty());
    }

    // ========================================================================
    // Round trip
    // ========================================================================

    #[test]
    fn derive_inverts_subst() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let string = arena.builtin("SS");
        let t = arena.generic_param(0, 0);
        let u = arena.generic_param(1, 0);

        let dict = arena.bound_generic("SD", smallvec![t, u], None);
        let optional_u = arena.bound_generic("Sq", smallvec![u], None);
        let meta = arena.metatype(t, false);
        let proto = arena.nominal("4main1PP", None);
        let comp = arena.protocol_composition(smallvec![proto], Some(dict), true);
        let func = arena.function(
            smallvec![
                FunctionParam::labeled("key", t),
                FunctionParam::new(optional_u)
                    .with_flags(ParameterFlags::default().with_variadic(true)),
            ],
            meta,
            FunctionTypeFlags::default()
                .with_num_parameters(2)
                .with_escaping(true),
        );
        let orig = arena.tuple(smallvec![func, comp], "f c");

        let mut map = GenericArgumentMap::default();
        map.insert(key(0, 0), int);
        map.insert(key(1, 0), string);
        // Unrelated binding not present in the original
        map.insert(key(2, 0), int);

        let subst = arena.subst(orig, &map);
        assert!(arena.is_concrete(subst));

        let mut derived = GenericArgumentMap::default();
        arena.derive_substitutions(orig, subst, &mut derived).unwrap();
        assert_eq!(derived.len(), 2);
        assert_eq!(derived[&key(0, 0)], int);
        assert_eq!(derived[&key(1, 0)], string);
    }

    #[test]
    fn derive_through_opaque_archetype_arguments() {
        let mut arena = TypeRefArena::new();
        let int = arena.builtin("Si");
        let t = arena.generic_param(0, 0);
        let orig = arena.opaque_archetype("$s4main3fooQr", "", 0, &[vec![t], vec![]]);
        let subst = arena.opaque_archetype("$s4main3fooQr", "", 0, &[vec![int], vec![]]);
        let reshaped = arena.opaque_archetype("$s4main3fooQr", "", 0, &[vec![int]]);

        let mut subs = GenericArgumentMap::default();
        arena.derive_substitutions(orig, subst, &mut subs).unwrap();
        assert_eq!(subs[&key(0, 0)], int);

        let err = arena
            .derive_substitutions(orig, reshaped, &mut GenericArgumentMap::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DerivationError::ArityMismatch {
                what: ArityKind::ArgumentLists,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn errors_carry_diagnostic_codes() {
        use miette::Diagnostic;

        let err = DerivationError::ArityMismatch {
            what: ArityKind::Protocols,
            expected: 1,
            found: 3,
        };
        assert_eq!(err.code().map(|c| c.to_string()).as_deref(), Some("E9002"));
        assert_eq!(err.to_string(), "arity mismatch: expected 1 protocols, found 3");
    }
}
