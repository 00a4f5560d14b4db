// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Faceting of overlapping groups into disjoint families.
//!
//! Some target dialects cannot express overlapping groups and want every
//! node (or cell) in exactly one numbered family instead.  A family is the
//! set of entities sharing one exact combination of group memberships, and
//! the partition is derived once, after the mesh is complete.

use std::collections::HashMap;

use crate::mesh::{Groups, Mesh};

/// One membership class: every entity whose group signature is `signature`.
///
/// Node families take positive identifiers, cell families negative ones, and
/// the ungrouped family is always identifier 0 with an empty name.
#[derive(Clone, PartialEq, Debug)]
pub struct Family {
    id: i32,
    name: String,
    signature: Vec<String>,
    members: Vec<u32>,
}

impl Family {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group names this family stands for, sorted.
    pub fn signature(&self) -> &[String] {
        &self.signature
    }

    /// Members in entity storage order.
    pub fn members(&self) -> &[u32] {
        &self.members
    }

    pub fn is_ungrouped(&self) -> bool {
        self.id == 0
    }
}

/// The disjoint family partition of one entity kind.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct FamilyPartition {
    families: Vec<Family>,
    by_member: HashMap<u32, i32>,
}

impl FamilyPartition {
    /// Families in first-seen order.
    pub fn families(&self) -> std::slice::Iter<'_, Family> {
        self.families.iter()
    }

    pub fn family(&self, id: i32) -> Option<&Family> {
        self.families.iter().find(|f| f.id == id)
    }

    /// The family identifier an entity was assigned to.
    pub fn family_of(&self, member: u32) -> Option<i32> {
        self.by_member.get(&member).copied()
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

/// Partition the mesh nodes into families numbered 1, 2, ...
pub fn node_families(mesh: &Mesh) -> FamilyPartition {
    derive(
        mesh.nodes.iter().map(|n| n.id.number()),
        &mesh.node_groups,
        1,
    )
}

/// Partition the mesh cells into families numbered -1, -2, ...
pub fn cell_families(mesh: &Mesh) -> FamilyPartition {
    derive(
        mesh.cells.iter().map(|c| c.id.number()),
        &mesh.cell_groups,
        -1,
    )
}

fn derive<T>(
    entities: impl Iterator<Item = u32>,
    groups: &Groups<T>,
    step: i32,
) -> FamilyPartition {
    let mut families: Vec<Family> = Vec::new();
    let mut by_signature: HashMap<Vec<String>, usize> = HashMap::new();
    let mut by_member: HashMap<u32, i32> = HashMap::new();
    let mut next = step;

    for entity in entities {
        let mut signature: Vec<String> = groups
            .iter()
            .filter(|g| g.contains(entity))
            .map(|g| g.name().to_owned())
            .collect();
        signature.sort();

        let pos = match by_signature.get(&signature) {
            Some(&pos) => pos,
            None => {
                let id = if signature.is_empty() {
                    0
                } else {
                    let id = next;
                    next += step;
                    id
                };
                families.push(Family {
                    id,
                    name: signature.join("_"),
                    signature: signature.clone(),
                    members: Vec::new(),
                });
                by_signature.insert(signature, families.len() - 1);
                families.len() - 1
            }
        };
        families[pos].members.push(entity);
        by_member.insert(entity, families[pos].id);
    }

    FamilyPartition {
        families,
        by_member,
    }
}
