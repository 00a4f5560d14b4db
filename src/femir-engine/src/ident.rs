// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Kind-scoped numeric identity.
//!
//! Every entity in the model carries an [`EntityId`]: a number unique within
//! its kind, plus a flag recording whether the number came from the source
//! deck or was synthesized by [`Container::next_auto_id`]. Equality, hashing
//! and ordering look at the number only; the flag is bookkeeping for
//! diagnostics. Cross-entity relationships are expressed as [`Reference`]
//! values, which carry the target kind in a zero-sized type parameter so a
//! reference can never be resolved against the wrong container.
//!
//! [`Container::next_auto_id`]: crate::container::Container::next_auto_id

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Runtime name of an entity kind, used in diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Node,
    Cell,
    CoordinateSystem,
    Material,
    Function,
    Constraint,
    ConstraintSet,
    Loading,
    LoadSet,
    Analysis,
    Objective,
    NodeGroup,
    CellGroup,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use EntityKind::*;
        let name = match self {
            Node => "node",
            Cell => "cell",
            CoordinateSystem => "coordinate_system",
            Material => "material",
            Function => "function",
            Constraint => "constraint",
            ConstraintSet => "constraint_set",
            Loading => "loading",
            LoadSet => "load_set",
            Analysis => "analysis",
            Objective => "objective",
            NodeGroup => "node_group",
            CellGroup => "cell_group",
        };

        write!(f, "{name}")
    }
}

/// Implemented by everything that lives in a [`Container`].
///
/// [`Container`]: crate::container::Container
pub trait Entity {
    const KIND: EntityKind;
    /// Set-like bookkeeping kinds accept a value-identical re-declaration
    /// (decks restate set headers once per member card); everything else
    /// rejects duplicates unconditionally.
    const REDECLARABLE: bool = false;

    fn id(&self) -> EntityId;
}

/// A numeric identifier, unique within one entity kind.
#[derive(Copy, Clone, Debug)]
pub struct EntityId {
    number: u32,
    auto: bool,
}

impl EntityId {
    /// An identifier that appeared in the source deck.
    pub fn user(number: u32) -> Self {
        EntityId {
            number,
            auto: false,
        }
    }

    /// An identifier synthesized because the source omitted one.
    pub fn auto(number: u32) -> Self {
        EntityId { number, auto: true }
    }

    pub fn number(self) -> u32 {
        self.number
    }

    pub fn is_auto(self) -> bool {
        self.auto
    }
}

// Identity is the number alone: a re-read of a deck we wrote, where
// synthesized ids became explicit, compares equal to the original.
impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number.cmp(&other.number)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.auto {
            write!(f, "#{} (auto)", self.number)
        } else {
            write!(f, "#{}", self.number)
        }
    }
}

/// A (kind, identifier) value denoting an entity that may not exist yet.
///
/// References are plain values: resolving one is a lookup against the owning
/// container, repeatable at any time, and failable until `finalize()` has
/// proven the target exists.
pub struct Reference<T> {
    number: u32,
    _kind: PhantomData<T>,
}

impl<T: Entity> Reference<T> {
    pub fn new(number: u32) -> Self {
        Reference {
            number,
            _kind: PhantomData,
        }
    }

    pub fn to(entity: &T) -> Self {
        Reference::new(entity.id().number())
    }

    pub fn kind() -> EntityKind {
        T::KIND
    }

    pub fn number(self) -> u32 {
        self.number
    }
}

// Manual impls: derives would bound T, but a Reference is Copy/Eq/Ord
// regardless of the target type.

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Reference<T> {}

impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
    }
}

impl<T> Eq for Reference<T> {}

impl<T> Hash for Reference<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
    }
}

impl<T> PartialOrd for Reference<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Reference<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number.cmp(&other.number)
    }
}

impl<T> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Reference(#{})", self.number)
    }
}

impl<T: Entity> fmt::Display for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} #{}", T::KIND, self.number)
    }
}
