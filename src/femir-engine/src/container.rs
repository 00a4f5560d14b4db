// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::ident::{Entity, EntityId, Reference};

/// Insertion-ordered, identifier-indexed storage for one entity kind.
///
/// Entities are never removed, so the insertion index of an entity is stable
/// for the life of the container.  Writers rely on it for contiguous
/// renumbering, and global DOF numbering iterates it.
#[derive(Clone, Debug)]
pub struct Container<T> {
    items: Vec<T>,
    index: HashMap<u32, usize>,
    next_auto: u32,
}

impl<T: PartialEq> PartialEq for Container<T> {
    /// The index and the auto-id cursor are bookkeeping derived from the
    /// items, so equality looks at the items alone.
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T: Entity + PartialEq> Container<T> {
    pub fn new() -> Self {
        Container {
            items: Vec::new(),
            index: HashMap::new(),
            next_auto: 1,
        }
    }

    /// Add an entity, rejecting identifier collisions.
    ///
    /// A value-identical re-declaration is a no-op for kinds that opt in via
    /// [`Entity::REDECLARABLE`]; any other collision is a
    /// `DuplicateIdentifier` error.
    pub fn insert(&mut self, entity: T) -> Result<()> {
        let number = entity.id().number();
        match self.index.entry(number) {
            Entry::Occupied(existing) => {
                if T::REDECLARABLE && self.items[*existing.get()] == entity {
                    Ok(())
                } else {
                    Err(Error::new(
                        ErrorKind::Model,
                        ErrorCode::DuplicateIdentifier,
                        Some(format!("{} #{}", T::KIND, number)),
                    ))
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(self.items.len());
                self.items.push(entity);
                Ok(())
            }
        }
    }

    pub fn get(&self, number: u32) -> Option<&T> {
        self.index.get(&number).map(|&pos| &self.items[pos])
    }

    /// Resolve a reference against this container.
    pub fn find(&self, reference: Reference<T>) -> Result<&T> {
        self.get(reference.number()).ok_or_else(|| {
            Error::new(
                ErrorKind::Model,
                ErrorCode::UnresolvedReference,
                Some(format!("{reference}")),
            )
        })
    }

    pub fn contains(&self, number: u32) -> bool {
        self.index.contains_key(&number)
    }

    /// Zero-based insertion index of the entity with this identifier.
    pub fn position(&self, number: u32) -> Option<usize> {
        self.index.get(&number).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Smallest identifier not yet used within this kind.
    ///
    /// Handed-out identifiers count as used even before the entity is
    /// inserted, so a reader can synthesize several ids in a row without
    /// collisions.
    pub fn next_auto_id(&mut self) -> EntityId {
        while self.index.contains_key(&self.next_auto) {
            self.next_auto += 1;
        }
        let id = EntityId::auto(self.next_auto);
        self.next_auto += 1;
        id
    }
}

impl<T: Entity + PartialEq> Default for Container<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::EntityKind;

    #[derive(Debug, Clone, PartialEq)]
    struct Part {
        id: EntityId,
        label: &'static str,
    }

    impl Entity for Part {
        const KIND: EntityKind = EntityKind::Material;

        fn id(&self) -> EntityId {
            self.id
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Ledger {
        id: EntityId,
        tag: u8,
    }

    impl Entity for Ledger {
        const KIND: EntityKind = EntityKind::LoadSet;
        const REDECLARABLE: bool = true;

        fn id(&self) -> EntityId {
            self.id
        }
    }

    fn part(number: u32, label: &'static str) -> Part {
        Part {
            id: EntityId::user(number),
            label,
        }
    }

    #[test]
    fn test_round_trip() {
        let mut c = Container::new();
        c.insert(part(3, "three")).unwrap();
        c.insert(part(1, "one")).unwrap();

        assert_eq!(Some(&part(3, "three")), c.get(3));
        assert_eq!(Some(&part(1, "one")), c.get(1));
        assert_eq!(None, c.get(2));
        assert_eq!(2, c.len());
    }

    #[test]
    fn test_iteration_preserves_insertion_order() {
        let mut c = Container::new();
        for number in [5, 2, 9, 1] {
            c.insert(part(number, "")).unwrap();
        }
        let order: Vec<u32> = c.iter().map(|p| p.id.number()).collect();
        assert_eq!(vec![5, 2, 9, 1], order);

        assert_eq!(Some(0), c.position(5));
        assert_eq!(Some(2), c.position(9));
        assert_eq!(None, c.position(7));
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut c = Container::new();
        c.insert(part(4, "first")).unwrap();

        let err = c.insert(part(4, "first")).unwrap_err();
        assert_eq!(ErrorCode::DuplicateIdentifier, err.code);
        assert_eq!(Some("material #4".to_owned()), err.details);

        // the original is untouched
        assert_eq!(Some(&part(4, "first")), c.get(4));
    }

    #[test]
    fn test_redeclarable_accepts_identical_value_only() {
        let mut c = Container::new();
        let set = Ledger {
            id: EntityId::user(2),
            tag: 7,
        };
        c.insert(set.clone()).unwrap();
        c.insert(set.clone()).unwrap();
        assert_eq!(1, c.len());

        let err = c
            .insert(Ledger {
                id: EntityId::user(2),
                tag: 8,
            })
            .unwrap_err();
        assert_eq!(ErrorCode::DuplicateIdentifier, err.code);
    }

    #[test]
    fn test_find_reports_unresolved() {
        let mut c = Container::new();
        c.insert(part(1, "one")).unwrap();

        assert_eq!("one", c.find(Reference::new(1)).unwrap().label);

        let err = c.find(Reference::new(8)).unwrap_err();
        assert_eq!(ErrorCode::UnresolvedReference, err.code);
        assert_eq!(Some("material #8".to_owned()), err.details);

        // resolution is repeatable
        assert!(c.find(Reference::new(1)).is_ok());
        assert!(c.find(Reference::new(1)).is_ok());
    }

    #[test]
    fn test_next_auto_id_fills_gaps() {
        let mut c = Container::new();
        c.insert(part(1, "")).unwrap();
        c.insert(part(2, "")).unwrap();
        c.insert(part(5, "")).unwrap();

        let a = c.next_auto_id();
        assert_eq!(3, a.number());
        assert!(a.is_auto());

        // granted ids count as used even before insertion
        assert_eq!(4, c.next_auto_id().number());
        assert_eq!(6, c.next_auto_id().number());
    }

    #[test]
    fn test_auto_and_user_ids_share_the_space() {
        let mut c = Container::new();
        let auto = c.next_auto_id();
        assert_eq!(1, auto.number());
        c.insert(Part {
            id: auto,
            label: "synth",
        })
        .unwrap();

        // a user id equal to an auto id is still a duplicate
        let err = c.insert(part(1, "explicit")).unwrap_err();
        assert_eq!(ErrorCode::DuplicateIdentifier, err.code);
    }
}
