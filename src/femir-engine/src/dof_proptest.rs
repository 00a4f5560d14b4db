// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for the DOF algebra using proptest.
//!
//! These tests verify that:
//! 1. DOFS set operations obey the usual boolean-algebra identities
//! 2. Digit-form strings roundtrip through parse and print
//! 3. The per-DOF encodings (position, code, digit, name) agree

use proptest::collection::vec;
use proptest::prelude::*;

use crate::dof::{Dof, DofCoefs, DofHolder, DofKey, DofMatrix, Dofs};

fn dof_strategy() -> impl Strategy<Value = Dof> {
    (0u8..6).prop_map(|position| Dof::from_position(position).unwrap())
}

fn dofs_strategy() -> impl Strategy<Value = Dofs> {
    vec(dof_strategy(), 0..=6).prop_map(|dofs| dofs.into_iter().collect())
}

// Digit strings as decks author them: unordered, repeats allowed.
fn digits_strategy() -> impl Strategy<Value = String> {
    "[1-6]{0,8}"
}

fn holder_strategy() -> impl Strategy<Value = DofHolder> {
    let number = 1u32..500;
    prop_oneof![
        number.clone().prop_map(DofHolder::Node),
        number.clone().prop_map(DofHolder::Cell),
        number.prop_map(DofHolder::Constraint),
    ]
}

fn key_strategy() -> impl Strategy<Value = DofKey> {
    (holder_strategy(), dof_strategy()).prop_map(|(holder, dof)| DofKey::new(holder, dof))
}

fn coef_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        Just(0.0),
        Just(1.0),
        Just(-1.0),
        (-1000i32..1000).prop_map(|x| x as f64),
        (-100i32..100).prop_map(|x| x as f64 / 4.0),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Set-operation identities

    #[test]
    fn union_is_commutative(a in dofs_strategy(), b in dofs_strategy()) {
        prop_assert_eq!(a | b, b | a);
    }

    #[test]
    fn union_contains_both_operands(a in dofs_strategy(), b in dofs_strategy()) {
        let union = a | b;
        prop_assert!(a.is_subset_of(&union));
        prop_assert!(b.is_subset_of(&union));
    }

    #[test]
    fn intersection_is_contained_in_both(a in dofs_strategy(), b in dofs_strategy()) {
        let common = a & b;
        prop_assert!(common.is_subset_of(&a));
        prop_assert!(common.is_subset_of(&b));
    }

    #[test]
    fn complement_is_an_involution(a in dofs_strategy()) {
        prop_assert_eq!(a, !!a);
    }

    #[test]
    fn complement_partitions_all(a in dofs_strategy()) {
        prop_assert!((a & !a).is_empty());
        prop_assert_eq!(Dofs::ALL, a | !a);
    }

    #[test]
    fn difference_removes_exactly_the_intersection(a in dofs_strategy(), b in dofs_strategy()) {
        let diff = a - b;
        prop_assert!((diff & b).is_empty());
        prop_assert_eq!(a, diff | (a & b));
    }

    #[test]
    fn iter_agrees_with_len_and_contains(a in dofs_strategy()) {
        let listed: Vec<Dof> = a.iter().collect();
        prop_assert_eq!(a.len(), listed.len());
        for dof in listed {
            prop_assert!(a.contains(dof));
        }
    }

    // Digit-form roundtrips

    #[test]
    fn digits_roundtrip_from_set(a in dofs_strategy()) {
        prop_assert_eq!(Some(a), Dofs::from_digits(&a.to_digits()));
    }

    #[test]
    fn digits_parse_ignores_order_and_repetition(digits in digits_strategy()) {
        let parsed = Dofs::from_digits(&digits).unwrap();
        for dof in Dof::ALL {
            let expected = digits.contains(char::from(b'0' + dof.digit()));
            prop_assert_eq!(expected, parsed.contains(dof));
        }
        // printed form is ascending and duplicate-free
        let printed = parsed.to_digits();
        let mut sorted: Vec<char> = printed.chars().collect();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(printed, sorted.into_iter().collect::<String>());
    }

    // Per-DOF encodings

    #[test]
    fn encodings_agree(dof in dof_strategy()) {
        prop_assert_eq!(Some(dof), Dof::from_position(dof.position()));
        prop_assert_eq!(Some(dof), Dof::from_code(dof.code()));
        prop_assert_eq!(Some(dof), Dof::from_digit(dof.digit()));
        prop_assert_eq!(Some(dof), Dof::from_name(&dof.to_string()));
    }

    #[test]
    fn coefs_nonzero_lists_exactly_the_nonzero_entries(
        coefs in proptest::array::uniform6(coef_strategy())
    ) {
        let listed: Vec<(Dof, f64)> = DofCoefs::new(coefs).nonzero().collect();
        let expected: Vec<(Dof, f64)> = Dof::ALL
            .into_iter()
            .zip(coefs)
            .filter(|(_, coef)| *coef != 0.0)
            .collect();
        prop_assert_eq!(expected, listed);
    }

    // Matrix insertion conflicts

    #[test]
    fn matrix_accepts_identical_and_rejects_different(
        row in key_strategy(),
        col in key_strategy(),
        coef in coef_strategy(),
    ) {
        let mut matrix = DofMatrix::new();
        matrix.set(row, col, coef).unwrap();
        prop_assert!(matrix.set(row, col, coef).is_ok());
        prop_assert!(matrix.set(row, col, coef + 1.0).is_err());
        prop_assert_eq!(1, matrix.len());
        prop_assert_eq!(Some(coef), matrix.get(row, col));
    }
}
