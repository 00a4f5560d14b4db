// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Property-based tests for group-to-family faceting using proptest.
//!
//! These tests verify that:
//! 1. Family derivation is a true partition of the meshed entities
//! 2. Two entities share a family exactly when their group signatures match
//! 3. Identifier assignment follows the MED convention on both sides

use std::collections::BTreeMap;
use std::collections::HashMap;

use proptest::collection::btree_map;
use proptest::prelude::*;

use crate::family::{self, FamilyPartition};
use crate::geometry::Vec3;
use crate::ident::EntityId;
use crate::mesh::{Cell, CellKind, Mesh, Node};

const GROUP_NAMES: [&str; 5] = ["left", "right", "top", "bottom", "core"];

/// Entity numbers mapped to a five-bit group-membership mask.
fn membership_strategy() -> impl Strategy<Value = BTreeMap<u32, u8>> {
    btree_map(1u32..200, 0u8..32, 0..40)
}

fn signature_for(mask: u8) -> Vec<String> {
    let mut names: Vec<String> = GROUP_NAMES
        .iter()
        .enumerate()
        .filter(|(bit, _)| mask & (1 << bit) != 0)
        .map(|(_, name)| name.to_string())
        .collect();
    names.sort();
    names
}

fn mesh_with_grouped_nodes(memberships: &BTreeMap<u32, u8>) -> Mesh {
    let mut mesh = Mesh::new();
    for (&number, &mask) in memberships {
        mesh.insert_node(Node::new(EntityId::user(number), Vec3::ZERO))
            .unwrap();
        for (bit, name) in GROUP_NAMES.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                mesh.add_node_to_group(name, number);
            }
        }
    }
    mesh
}

fn mesh_with_grouped_cells(memberships: &BTreeMap<u32, u8>) -> Mesh {
    let mut mesh = Mesh::new();
    mesh.insert_node(Node::new(EntityId::user(1), Vec3::ZERO))
        .unwrap();
    for (&number, &mask) in memberships {
        mesh.insert_cell(Cell::new(EntityId::user(number), CellKind::Point1, [1]))
            .unwrap();
        for (bit, name) in GROUP_NAMES.iter().enumerate() {
            if mask & (1 << bit) != 0 {
                mesh.add_cell_to_group(name, number);
            }
        }
    }
    mesh
}

/// Re-derive the expected identifier per entity: 0 for the empty signature,
/// otherwise `step`, `2 * step`, ... in order of first appearance.
fn expected_ids(memberships: &BTreeMap<u32, u8>, step: i32) -> HashMap<u32, i32> {
    let mut by_mask: HashMap<u8, i32> = HashMap::new();
    let mut next = step;
    let mut expected = HashMap::new();
    for (&number, &mask) in memberships {
        let id = if mask == 0 {
            0
        } else {
            *by_mask.entry(mask).or_insert_with(|| {
                let id = next;
                next += step;
                id
            })
        };
        expected.insert(number, id);
    }
    expected
}

fn assert_true_partition(
    partition: &FamilyPartition,
    memberships: &BTreeMap<u32, u8>,
) -> Result<(), TestCaseError> {
    let mut seen = 0usize;
    for family in partition.families() {
        for &member in family.members() {
            prop_assert_eq!(Some(family.id()), partition.family_of(member));
            prop_assert!(memberships.contains_key(&member));
            seen += 1;
        }
    }
    prop_assert_eq!(memberships.len(), seen);
    for &number in memberships.keys() {
        prop_assert!(partition.family_of(number).is_some());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn every_node_lands_in_exactly_one_family(memberships in membership_strategy()) {
        let mesh = mesh_with_grouped_nodes(&memberships);
        let partition = family::node_families(&mesh);
        assert_true_partition(&partition, &memberships)?;
    }

    #[test]
    fn families_split_exactly_on_signatures(memberships in membership_strategy()) {
        let mesh = mesh_with_grouped_nodes(&memberships);
        let partition = family::node_families(&mesh);

        let mut id_by_mask: HashMap<u8, i32> = HashMap::new();
        for (&number, &mask) in &memberships {
            let id = partition.family_of(number).unwrap();
            match id_by_mask.get(&mask) {
                Some(&assigned) => prop_assert_eq!(assigned, id),
                None => {
                    id_by_mask.insert(mask, id);
                }
            }
            let signature = signature_for(mask);
            let family = partition.family(id).unwrap();
            prop_assert_eq!(&signature, &family.signature().to_vec());
            prop_assert_eq!(signature.join("_"), family.name());
        }

        // distinct signatures never share a family
        let distinct_masks = id_by_mask.len();
        let distinct_ids: std::collections::HashSet<i32> =
            id_by_mask.into_values().collect();
        prop_assert_eq!(distinct_masks, distinct_ids.len());
    }

    #[test]
    fn node_ids_count_up_and_ungrouped_is_zero(memberships in membership_strategy()) {
        let mesh = mesh_with_grouped_nodes(&memberships);
        let partition = family::node_families(&mesh);

        let expected = expected_ids(&memberships, 1);
        for (&number, &id) in &expected {
            prop_assert_eq!(Some(id), partition.family_of(number));
        }
        if let Some(ungrouped) = partition.family(0) {
            prop_assert!(ungrouped.is_ungrouped());
            prop_assert_eq!("", ungrouped.name());
        }
    }

    #[test]
    fn cell_ids_count_down(memberships in membership_strategy()) {
        let mesh = mesh_with_grouped_cells(&memberships);
        let partition = family::cell_families(&mesh);

        let expected = expected_ids(&memberships, -1);
        for (&number, &id) in &expected {
            prop_assert_eq!(Some(id), partition.family_of(number));
            prop_assert!(id <= 0);
        }
    }

    #[test]
    fn members_keep_storage_order(memberships in membership_strategy()) {
        let mesh = mesh_with_grouped_nodes(&memberships);
        let partition = family::node_families(&mesh);

        for family in partition.families() {
            let expected: Vec<u32> = memberships
                .iter()
                .filter(|(number, _)| partition.family_of(**number) == Some(family.id()))
                .map(|(&number, _)| number)
                .collect();
            prop_assert_eq!(&expected, &family.members().to_vec());
        }
    }
}
