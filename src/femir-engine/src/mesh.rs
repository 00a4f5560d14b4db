// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use lazy_static::lazy_static;
use smallvec::SmallVec;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::container::Container;
use crate::csys::CoordinateSystem;
use crate::dof::Dofs;
use crate::geometry::Vec3;
use crate::ident::{Entity, EntityId, EntityKind, Reference};

/// A mesh node: a position, and the degrees of freedom it carries.
///
/// The position is expressed in `position_cs` when one is named, otherwise in
/// the global frame.  `displacement_cs` only tags the frame results should be
/// reported in; it never affects the position.
#[derive(Clone, PartialEq, Debug)]
pub struct Node {
    pub id: EntityId,
    pub position: Vec3,
    pub dofs: Dofs,
    pub position_cs: Option<Reference<CoordinateSystem>>,
    pub displacement_cs: Option<Reference<CoordinateSystem>>,
}

impl Node {
    pub fn new(id: EntityId, position: Vec3) -> Self {
        Node {
            id,
            position,
            dofs: Dofs::ALL,
            position_cs: None,
            displacement_cs: None,
        }
    }

    pub fn with_dofs(mut self, dofs: Dofs) -> Self {
        self.dofs = dofs;
        self
    }

    pub fn with_position_cs(mut self, cs: Reference<CoordinateSystem>) -> Self {
        self.position_cs = Some(cs);
        self
    }

    pub fn with_displacement_cs(mut self, cs: Reference<CoordinateSystem>) -> Self {
        self.displacement_cs = Some(cs);
        self
    }
}

impl Entity for Node {
    const KIND: EntityKind = EntityKind::Node;

    fn id(&self) -> EntityId {
        self.id
    }
}

/// Cell topology, numbered the MED way: the code is dimension × 100 plus the
/// node count, so both fall out of the code arithmetically.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CellKind {
    Point1,
    Seg2,
    Seg3,
    Tria3,
    Tria6,
    Quad4,
    Quad8,
    Tetra4,
    Tetra10,
    Pyra5,
    Penta6,
    Hexa8,
    Hexa20,
}

lazy_static! {
    static ref CELL_KIND_BY_CODE: HashMap<u16, CellKind> = {
        let mut kinds = HashMap::new();
        for kind in CellKind::ALL {
            kinds.insert(kind.code(), kind);
        }
        kinds
    };
}

impl CellKind {
    pub const ALL: [CellKind; 13] = [
        CellKind::Point1,
        CellKind::Seg2,
        CellKind::Seg3,
        CellKind::Tria3,
        CellKind::Tria6,
        CellKind::Quad4,
        CellKind::Quad8,
        CellKind::Tetra4,
        CellKind::Tetra10,
        CellKind::Pyra5,
        CellKind::Penta6,
        CellKind::Hexa8,
        CellKind::Hexa20,
    ];

    pub fn code(&self) -> u16 {
        match self {
            CellKind::Point1 => 1,
            CellKind::Seg2 => 102,
            CellKind::Seg3 => 103,
            CellKind::Tria3 => 203,
            CellKind::Tria6 => 206,
            CellKind::Quad4 => 204,
            CellKind::Quad8 => 208,
            CellKind::Tetra4 => 304,
            CellKind::Tetra10 => 310,
            CellKind::Pyra5 => 305,
            CellKind::Penta6 => 306,
            CellKind::Hexa8 => 308,
            CellKind::Hexa20 => 320,
        }
    }

    pub fn from_code(code: u16) -> Option<CellKind> {
        CELL_KIND_BY_CODE.get(&code).copied()
    }

    pub fn from_name(name: &str) -> Option<CellKind> {
        let kind = match name {
            "POINT1" => CellKind::Point1,
            "SEG2" => CellKind::Seg2,
            "SEG3" => CellKind::Seg3,
            "TRIA3" => CellKind::Tria3,
            "TRIA6" => CellKind::Tria6,
            "QUAD4" => CellKind::Quad4,
            "QUAD8" => CellKind::Quad8,
            "TETRA4" => CellKind::Tetra4,
            "TETRA10" => CellKind::Tetra10,
            "PYRA5" => CellKind::Pyra5,
            "PENTA6" => CellKind::Penta6,
            "HEXA8" => CellKind::Hexa8,
            "HEXA20" => CellKind::Hexa20,
            _ => return None,
        };
        Some(kind)
    }

    pub fn node_count(&self) -> usize {
        (self.code() % 100) as usize
    }

    /// Parametric dimension: 0 for points, 1 for segments, 2 for faces, 3
    /// for solids.
    pub fn dimension(&self) -> u8 {
        (self.code() / 100) as u8
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CellKind::Point1 => "POINT1",
            CellKind::Seg2 => "SEG2",
            CellKind::Seg3 => "SEG3",
            CellKind::Tria3 => "TRIA3",
            CellKind::Tria6 => "TRIA6",
            CellKind::Quad4 => "QUAD4",
            CellKind::Quad8 => "QUAD8",
            CellKind::Tetra4 => "TETRA4",
            CellKind::Tetra10 => "TETRA10",
            CellKind::Pyra5 => "PYRA5",
            CellKind::Penta6 => "PENTA6",
            CellKind::Hexa8 => "HEXA8",
            CellKind::Hexa20 => "HEXA20",
        };
        write!(f, "{name}")
    }
}

/// Ordered cell connectivity.  Linear cells fit inline.
pub type Connectivity = SmallVec<[Reference<Node>; 8]>;

/// A cell: a topology tag plus its ordered node references.
#[derive(Clone, PartialEq, Debug)]
pub struct Cell {
    pub id: EntityId,
    pub kind: CellKind,
    pub nodes: Connectivity,
}

impl Cell {
    pub fn new(id: EntityId, kind: CellKind, nodes: impl IntoIterator<Item = u32>) -> Self {
        Cell {
            id,
            kind,
            nodes: nodes.into_iter().map(Reference::new).collect(),
        }
    }
}

impl Entity for Cell {
    const KIND: EntityKind = EntityKind::Cell;

    fn id(&self) -> EntityId {
        self.id
    }
}

/// Something that points at mesh nodes without owning them.
pub trait NodeContainer {
    fn node_refs(&self) -> Vec<Reference<Node>>;
}

/// Something that points at mesh cells without owning them.
pub trait CellContainer {
    fn cell_refs(&self) -> Vec<Reference<Cell>>;
}

impl NodeContainer for Cell {
    fn node_refs(&self) -> Vec<Reference<Node>> {
        self.nodes.to_vec()
    }
}

/// A named, possibly-overlapping set of node or cell identifiers, exactly as
/// authored in the source deck.
#[derive(Clone, PartialEq, Debug)]
pub struct Group<T> {
    name: String,
    pub id: Option<u32>,
    members: BTreeSet<u32>,
    _kind: std::marker::PhantomData<T>,
}

impl<T> Group<T> {
    fn new(name: &str) -> Self {
        Group {
            name: name.to_owned(),
            id: None,
            members: BTreeSet::new(),
            _kind: std::marker::PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, member: u32) {
        self.members.insert(member);
    }

    pub fn contains(&self, member: u32) -> bool {
        self.members.contains(&member)
    }

    /// Members in ascending identifier order.
    pub fn members(&self) -> impl Iterator<Item = u32> + '_ {
        self.members.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T: Entity> Group<T> {
    pub fn refs(&self) -> Vec<Reference<T>> {
        self.members().map(Reference::new).collect()
    }
}

impl NodeContainer for Group<Node> {
    fn node_refs(&self) -> Vec<Reference<Node>> {
        self.refs()
    }
}

impl CellContainer for Group<Cell> {
    fn cell_refs(&self) -> Vec<Reference<Cell>> {
        self.refs()
    }
}

/// Name-keyed group collection, in first-mention order.
#[derive(Clone, PartialEq, Debug)]
pub struct Groups<T> {
    groups: Vec<Group<T>>,
    by_name: HashMap<String, usize>,
}

impl<T> Default for Groups<T> {
    fn default() -> Self {
        Groups::new()
    }
}

impl<T> Groups<T> {
    pub fn new() -> Self {
        Groups {
            groups: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// The named group, created empty on first mention.
    pub fn find_or_create(&mut self, name: &str) -> &mut Group<T> {
        let pos = match self.by_name.get(name) {
            Some(&pos) => pos,
            None => {
                self.by_name.insert(name.to_owned(), self.groups.len());
                self.groups.push(Group::new(name));
                self.groups.len() - 1
            }
        };
        &mut self.groups[pos]
    }

    pub fn get(&self, name: &str) -> Option<&Group<T>> {
        self.by_name.get(name).map(|&pos| &self.groups[pos])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group<T>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// The mesh: canonical node and cell storage plus the authored groups.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Mesh {
    pub nodes: Container<Node>,
    pub cells: Container<Cell>,
    pub node_groups: Groups<Node>,
    pub cell_groups: Groups<Cell>,
}

impl Mesh {
    pub fn new() -> Self {
        Mesh {
            nodes: Container::new(),
            cells: Container::new(),
            node_groups: Groups::new(),
            cell_groups: Groups::new(),
        }
    }

    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        self.nodes.insert(node)
    }

    /// Add a cell, checking its connectivity length against the topology.
    pub fn insert_cell(&mut self, cell: Cell) -> Result<()> {
        if cell.nodes.len() != cell.kind.node_count() {
            return Err(Error::new(
                ErrorKind::Model,
                ErrorCode::BadConnectivityArity,
                Some(format!(
                    "cell #{}: {} takes {} nodes, got {}",
                    cell.id.number(),
                    cell.kind,
                    cell.kind.node_count(),
                    cell.nodes.len()
                )),
            ));
        }
        self.cells.insert(cell)
    }

    pub fn add_node_to_group(&mut self, name: &str, node: u32) {
        self.node_groups.find_or_create(name).add(node);
    }

    pub fn add_cell_to_group(&mut self, name: &str, cell: u32) {
        self.cell_groups.find_or_create(name).add(cell);
    }

    /// Every connectivity entry that names a node the mesh doesn't have.
    pub fn validate_connectivity(&self) -> Vec<Error> {
        let mut errors = Vec::new();
        for cell in self.cells.iter() {
            for node in &cell.nodes {
                if !self.nodes.contains(node.number()) {
                    errors.push(Error::new(
                        ErrorKind::Validation,
                        ErrorCode::DanglingConnectivity,
                        Some(format!(
                            "cell #{}: node #{}",
                            cell.id.number(),
                            node.number()
                        )),
                    ));
                }
            }
        }
        errors
    }
}
