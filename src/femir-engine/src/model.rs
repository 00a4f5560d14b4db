// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The model facade: a single owner for every entity container, the
//! set-membership maps, and the `finalize` pass that freezes it all.
//!
//! A reader populates an open [Model] in any order it likes; nothing is
//! resolved until end-of-input.  `finalize` then runs four stages in a
//! fixed order (reference resolution, frame resolution, DOF assembly,
//! family derivation), each stage assuming the previous ones passed.
//! Every error in the failing stage is collected before giving up.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::result::Result as StdResult;

use float_cmp::approx_eq;
use ordered_float::OrderedFloat;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::container::Container;
use crate::csys::{self, CoordinateSystem, ResolvedCsys};
use crate::datamodel::{
    Analysis, Constraint, ConstraintSet, ConstraintSetKind, FunctionTable, LoadSet, Loading,
    Material, Objective,
};
use crate::dof::{Dof, DofHolder, DofKey, DofMatrix, DofNumbering, Dofs};
use crate::family::{self, FamilyPartition};
use crate::geometry::Vec3;
use crate::ident::{Entity, EntityId, EntityKind, Reference};
use crate::mesh::{Cell, Mesh, Node, NodeContainer};
use crate::model_err;

fn tag<E: Entity>(entity: &E) -> String {
    format!("{} #{}", E::KIND, entity.id().number())
}

/// An open model under construction by a reader.
///
/// Set membership lives here rather than on the set entities themselves:
/// decks attach constraints and loadings to sets by bare identifier, often
/// before or long after the set is mentioned anywhere else.
#[derive(Clone, PartialEq, Debug)]
pub struct Model {
    pub name: String,
    pub mesh: Mesh,
    pub coordinate_systems: Container<CoordinateSystem>,
    pub materials: Container<Material>,
    pub functions: Container<FunctionTable>,
    pub constraints: Container<Constraint>,
    pub constraint_sets: Container<ConstraintSet>,
    pub loadings: Container<Loading>,
    pub load_sets: Container<LoadSet>,
    pub analyses: Container<Analysis>,
    pub objectives: Container<Objective>,
    constraints_by_set: BTreeMap<u32, Vec<Reference<Constraint>>>,
    loadings_by_set: BTreeMap<u32, Vec<Reference<Loading>>>,
    declared: BTreeSet<(EntityKind, u32)>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Model {
            name: name.to_owned(),
            mesh: Mesh::new(),
            coordinate_systems: Container::new(),
            materials: Container::new(),
            functions: Container::new(),
            constraints: Container::new(),
            constraint_sets: Container::new(),
            loadings: Container::new(),
            load_sets: Container::new(),
            analyses: Container::new(),
            objectives: Container::new(),
            constraints_by_set: BTreeMap::new(),
            loadings_by_set: BTreeMap::new(),
            declared: BTreeSet::new(),
        }
    }

    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        self.mesh.insert_node(node)
    }

    pub fn insert_cell(&mut self, cell: Cell) -> Result<()> {
        self.mesh.insert_cell(cell)
    }

    pub fn insert_coordinate_system(&mut self, cs: CoordinateSystem) -> Result<()> {
        self.coordinate_systems.insert(cs)
    }

    pub fn insert_material(&mut self, material: Material) -> Result<()> {
        self.materials.insert(material)
    }

    /// A table with no samples cannot be evaluated, so it is rejected at
    /// the door rather than at finalize.
    pub fn insert_function(&mut self, function: FunctionTable) -> Result<()> {
        if function.points.is_empty() {
            return model_err!(EmptyFunctionTable, tag(&function));
        }
        self.functions.insert(function)
    }

    pub fn insert_constraint(&mut self, constraint: Constraint) -> Result<()> {
        self.constraints.insert(constraint)
    }

    pub fn insert_loading(&mut self, loading: Loading) -> Result<()> {
        self.loadings.insert(loading)
    }

    pub fn insert_analysis(&mut self, analysis: Analysis) -> Result<()> {
        self.analyses.insert(analysis)
    }

    pub fn insert_objective(&mut self, objective: Objective) -> Result<()> {
        self.objectives.insert(objective)
    }

    pub fn add_node_to_group(&mut self, name: &str, node: u32) {
        self.mesh.add_node_to_group(name, node);
    }

    pub fn add_cell_to_group(&mut self, name: &str, cell: u32) {
        self.mesh.add_cell_to_group(name, cell);
    }

    /// Attach a constraint to a set, creating the set on first mention.
    ///
    /// Restating an existing set with the same kind is a no-op; restating
    /// it with a different kind is a duplicate-identifier error and the
    /// membership is not recorded.
    pub fn add_constraint_into_set(
        &mut self,
        constraint: Reference<Constraint>,
        set: u32,
        kind: ConstraintSetKind,
    ) -> Result<()> {
        self.constraint_sets.insert(ConstraintSet {
            id: EntityId::user(set),
            kind,
        })?;
        let members = self.constraints_by_set.entry(set).or_default();
        if !members.contains(&constraint) {
            members.push(constraint);
        }
        Ok(())
    }

    /// Attach a loading to a load set, creating the set on first mention.
    pub fn add_loading_into_set(&mut self, loading: Reference<Loading>, set: u32) -> Result<()> {
        self.load_sets.insert(LoadSet {
            id: EntityId::user(set),
        })?;
        let members = self.loadings_by_set.entry(set).or_default();
        if !members.contains(&loading) {
            members.push(loading);
        }
        Ok(())
    }

    pub fn constraints_in_set(&self, set: u32) -> &[Reference<Constraint>] {
        self.constraints_by_set
            .get(&set)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn loadings_in_set(&self, set: u32) -> &[Reference<Loading>] {
        self.loadings_by_set
            .get(&set)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record a forward mention of an identifier without defining it.
    ///
    /// Declarations never affect resolution.  Their only use is in the
    /// finalize diagnostics, which can then distinguish an identifier that
    /// was declared but never defined from one that was never mentioned.
    pub fn declare_reference(&mut self, kind: EntityKind, number: u32) {
        self.declared.insert((kind, number));
    }

    /// Freeze the model.
    ///
    /// The stages run in a fixed order and the first failing stage wins:
    /// references, then frames, then DOF assembly, then families.  All
    /// errors of the failing stage are reported together.  Either way the
    /// model itself survives, frozen inside the returned value.
    pub fn finalize(self) -> StdResult<FinalizedModel, RejectedModel> {
        let errors = self.check_references();
        if !errors.is_empty() {
            return Err(RejectedModel {
                model: self,
                errors,
            });
        }

        let (frames, errors) = self.resolve_frames();
        if !errors.is_empty() {
            return Err(RejectedModel {
                model: self,
                errors,
            });
        }
        let node_positions = self.global_node_positions(&frames);

        let dofs = match self.assemble_dofs() {
            Ok(dofs) => dofs,
            Err(errors) => {
                return Err(RejectedModel {
                    model: self,
                    errors,
                });
            }
        };

        let node_families = family::node_families(&self.mesh);
        let cell_families = family::cell_families(&self.mesh);

        Ok(FinalizedModel {
            model: self,
            frames,
            node_positions,
            dofs,
            node_families,
            cell_families,
        })
    }

    fn unresolved(&self, owner: &str, kind: EntityKind, number: u32) -> Error {
        let mut details = format!("{owner}: {kind} #{number}");
        if self.declared.contains(&(kind, number)) {
            details.push_str(" (declared but never defined)");
        }
        Error::new(
            ErrorKind::Validation,
            ErrorCode::UnresolvedReference,
            Some(details),
        )
    }

    /// Stage one: every stored reference must point at a stored entity.
    ///
    /// Base links between coordinate systems are deliberately not checked
    /// here; the frame resolver owns those and reports UnresolvedFrame.
    fn check_references(&self) -> Vec<Error> {
        let mut errors = self.mesh.validate_connectivity();

        for node in self.mesh.nodes.iter() {
            let owner = tag(node);
            for cs in [node.position_cs, node.displacement_cs].into_iter().flatten() {
                if !self.coordinate_systems.contains(cs.number()) {
                    errors.push(self.unresolved(&owner, EntityKind::CoordinateSystem, cs.number()));
                }
            }
        }

        for constraint in self.constraints.iter() {
            let owner = tag(constraint);
            for node in constraint.node_refs() {
                if !self.mesh.nodes.contains(node.number()) {
                    errors.push(self.unresolved(&owner, EntityKind::Node, node.number()));
                }
            }
        }

        for (set, members) in &self.constraints_by_set {
            let owner = format!("{} #{set}", EntityKind::ConstraintSet);
            for member in members {
                if !self.constraints.contains(member.number()) {
                    errors.push(self.unresolved(&owner, EntityKind::Constraint, member.number()));
                }
            }
        }

        for loading in self.loadings.iter() {
            let owner = tag(loading);
            for node in loading.node_refs() {
                if !self.mesh.nodes.contains(node.number()) {
                    errors.push(self.unresolved(&owner, EntityKind::Node, node.number()));
                }
            }
            match loading {
                Loading::NodalForce { csys: Some(cs), .. } => {
                    if !self.coordinate_systems.contains(cs.number()) {
                        errors.push(self.unresolved(
                            &owner,
                            EntityKind::CoordinateSystem,
                            cs.number(),
                        ));
                    }
                }
                Loading::DynamicExcitation {
                    function, load_set, ..
                } => {
                    if !self.functions.contains(function.number()) {
                        errors.push(self.unresolved(&owner, EntityKind::Function, function.number()));
                    }
                    if !self.load_sets.contains(load_set.number()) {
                        errors.push(self.unresolved(&owner, EntityKind::LoadSet, load_set.number()));
                    }
                }
                _ => {}
            }
        }

        for (set, members) in &self.loadings_by_set {
            let owner = format!("{} #{set}", EntityKind::LoadSet);
            for member in members {
                if !self.loadings.contains(member.number()) {
                    errors.push(self.unresolved(&owner, EntityKind::Loading, member.number()));
                }
            }
        }

        for analysis in self.analyses.iter() {
            let owner = tag(analysis);
            for set in analysis.constraint_sets() {
                if !self.constraint_sets.contains(set.number()) {
                    errors.push(self.unresolved(&owner, EntityKind::ConstraintSet, set.number()));
                }
            }
            for set in analysis.load_sets() {
                if !self.load_sets.contains(set.number()) {
                    errors.push(self.unresolved(&owner, EntityKind::LoadSet, set.number()));
                }
            }
        }

        for objective in self.objectives.iter() {
            let owner = tag(objective);
            for node in objective.node_refs() {
                if !self.mesh.nodes.contains(node.number()) {
                    errors.push(self.unresolved(&owner, EntityKind::Node, node.number()));
                }
            }
        }

        for group in self.mesh.node_groups.iter() {
            let owner = format!("{} '{}'", EntityKind::NodeGroup, group.name());
            for member in group.members() {
                if !self.mesh.nodes.contains(member) {
                    errors.push(self.unresolved(&owner, EntityKind::Node, member));
                }
            }
        }

        for group in self.mesh.cell_groups.iter() {
            let owner = format!("{} '{}'", EntityKind::CellGroup, group.name());
            for member in group.members() {
                if !self.mesh.cells.contains(member) {
                    errors.push(self.unresolved(&owner, EntityKind::Cell, member));
                }
            }
        }

        errors
    }

    /// Stage two: resolve every stored frame once and cache the result.
    fn resolve_frames(&self) -> (HashMap<u32, ResolvedCsys>, Vec<Error>) {
        let mut frames = HashMap::new();
        let mut errors = Vec::new();
        for cs in self.coordinate_systems.iter() {
            match csys::resolve(&self.coordinate_systems, Reference::new(cs.id.number())) {
                Ok(resolved) => {
                    frames.insert(cs.id.number(), resolved);
                }
                Err(err) => errors.push(err),
            }
        }
        (frames, errors)
    }

    /// Global position of every node.  Authored positions stay untouched
    /// on the node so the deck round-trips unchanged.
    fn global_node_positions(&self, frames: &HashMap<u32, ResolvedCsys>) -> HashMap<u32, Vec3> {
        let mut positions = HashMap::new();
        for node in self.mesh.nodes.iter() {
            let global = match node.position_cs {
                Some(cs) => match frames.get(&cs.number()) {
                    Some(resolved) => resolved.position_to_global(node.position),
                    // stage one resolved the reference, stage two the frame
                    None => continue,
                },
                None => node.position,
            };
            positions.insert(node.id.number(), global);
        }
        positions
    }

    /// Stage three: lower the constraints into the coefficient matrix,
    /// the imposed-value map and the global DOF numbering.
    fn assemble_dofs(&self) -> StdResult<DofAssembly, Vec<Error>> {
        fn couple(
            matrix: &mut DofMatrix,
            errors: &mut Vec<Error>,
            row: DofKey,
            col: DofKey,
            coef: f64,
        ) {
            if let Err(err) = matrix.set(row, col, coef) {
                errors.push(err);
            }
        }

        let mut errors = Vec::new();
        let mut matrix = DofMatrix::new();
        let mut imposed: BTreeMap<(u32, Dof), f64> = BTreeMap::new();

        for constraint in self.constraints.iter() {
            match constraint {
                Constraint::Spc {
                    nodes, fixed, value, ..
                } => {
                    for node in nodes {
                        for dof in fixed.iter() {
                            match imposed.entry((node.number(), dof)) {
                                Entry::Vacant(entry) => {
                                    entry.insert(*value);
                                }
                                Entry::Occupied(entry) => {
                                    let existing = *entry.get();
                                    if !approx_eq!(f64, existing, *value, ulps = 4) {
                                        errors.push(Error::new(
                                            ErrorKind::Model,
                                            ErrorCode::DofConflict,
                                            Some(format!(
                                                "{}: {existing} vs {value}",
                                                DofKey::new(DofHolder::Node(node.number()), dof)
                                            )),
                                        ));
                                    }
                                }
                            }
                        }
                    }
                }
                Constraint::RigidBody { master, slaves, .. } => {
                    for slave in slaves {
                        for dof in Dofs::ALL.iter() {
                            couple(
                                &mut matrix,
                                &mut errors,
                                DofKey::new(DofHolder::Node(slave.number()), dof),
                                DofKey::new(DofHolder::Node(master.number()), dof),
                                1.0,
                            );
                        }
                    }
                }
                Constraint::Rbe3 {
                    master,
                    master_dofs,
                    slaves,
                    slave_dofs,
                    ..
                } => {
                    let coupled = *slave_dofs & *master_dofs;
                    for slave in slaves {
                        for dof in coupled.iter() {
                            couple(
                                &mut matrix,
                                &mut errors,
                                DofKey::new(DofHolder::Node(slave.number()), dof),
                                DofKey::new(DofHolder::Node(master.number()), dof),
                                1.0,
                            );
                        }
                    }
                }
                Constraint::Lmpc { id, terms } => {
                    for term in terms {
                        for (dof, coef) in term.coefs.nonzero() {
                            couple(
                                &mut matrix,
                                &mut errors,
                                DofKey::new(DofHolder::Constraint(id.number()), dof),
                                DofKey::new(DofHolder::Node(term.node.number()), dof),
                                coef,
                            );
                        }
                    }
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let numbering =
            DofNumbering::assign(self.mesh.nodes.iter().map(|n| (n.id.number(), n.dofs)));

        Ok(DofAssembly {
            matrix,
            imposed,
            numbering,
        })
    }
}

/// Everything stage three produces.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct DofAssembly {
    pub matrix: DofMatrix,
    pub imposed: BTreeMap<(u32, Dof), f64>,
    pub numbering: DofNumbering,
}

/// A frozen model plus everything finalize derived from it.
///
/// Immutable by construction: no method hands out `&mut` to anything, and
/// there is no way back to an open [Model].  Writers read from this.
#[derive(Clone, PartialEq, Debug)]
pub struct FinalizedModel {
    model: Model,
    frames: HashMap<u32, ResolvedCsys>,
    node_positions: HashMap<u32, Vec3>,
    dofs: DofAssembly,
    node_families: FamilyPartition,
    cell_families: FamilyPartition,
}

impl FinalizedModel {
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn frame(&self, number: u32) -> Option<&ResolvedCsys> {
        self.frames.get(&number)
    }

    pub fn node_global_position(&self, number: u32) -> Option<Vec3> {
        self.node_positions.get(&number).copied()
    }

    pub fn dof_numbering(&self) -> &DofNumbering {
        &self.dofs.numbering
    }

    pub fn dof_matrix(&self) -> &DofMatrix {
        &self.dofs.matrix
    }

    pub fn imposed_dofs(&self) -> &BTreeMap<(u32, Dof), f64> {
        &self.dofs.imposed
    }

    pub fn node_families(&self) -> &FamilyPartition {
        &self.node_families
    }

    pub fn cell_families(&self) -> &FamilyPartition {
        &self.cell_families
    }

    pub fn objectives(&self) -> std::slice::Iter<'_, Objective> {
        self.model.objectives.iter()
    }

    /// Frequency objectives in ascending expected-cycles order, ties kept
    /// in container order.  Result readers match modes against these.
    pub fn frequency_objectives_sorted(&self) -> Vec<&Objective> {
        let mut cycles: Vec<(OrderedFloat<f64>, &Objective)> = self
            .model
            .objectives
            .iter()
            .filter_map(|objective| match objective {
                Objective::Frequency { cycles, .. } => Some((OrderedFloat(*cycles), objective)),
                _ => None,
            })
            .collect();
        cycles.sort_by_key(|(cycles, _)| *cycles);
        cycles.into_iter().map(|(_, objective)| objective).collect()
    }
}

/// A model finalize refused.
///
/// The model is kept for diagnostics but there is no way to hand it to a
/// writer; a corrected model must be rebuilt from scratch.
#[derive(Clone, PartialEq, Debug)]
pub struct RejectedModel {
    model: Model,
    errors: Vec<Error>,
}

impl RejectedModel {
    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// The error list is never empty; finalize only rejects a model when
    /// the failing stage collected at least one error.
    pub fn first_error(&self) -> &Error {
        &self.errors[0]
    }
}

#[cfg(test)]
fn x_node(id: u32) -> Node {
    Node::new(EntityId::user(id), Vec3::ZERO)
}

#[cfg(test)]
fn x_node_at(id: u32, x: f64, y: f64, z: f64) -> Node {
    Node::new(EntityId::user(id), Vec3::new(x, y, z))
}

#[cfg(test)]
fn x_seg2(id: u32, a: u32, b: u32) -> Cell {
    use crate::mesh::CellKind;
    Cell::new(EntityId::user(id), CellKind::Seg2, [a, b])
}

#[cfg(test)]
fn x_cart_cs(id: u32) -> CoordinateSystem {
    CoordinateSystem::cartesian(
        EntityId::user(id),
        Vec3::ZERO,
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
    )
}

#[cfg(test)]
fn x_spc(id: u32, nodes: &[u32], digits: &str, value: f64) -> Constraint {
    Constraint::Spc {
        id: EntityId::user(id),
        nodes: nodes.iter().map(|n| Reference::new(*n)).collect(),
        fixed: Dofs::from_digits(digits).unwrap(),
        value,
    }
}

#[cfg(test)]
fn x_rigid(id: u32, master: u32, slaves: &[u32]) -> Constraint {
    Constraint::RigidBody {
        id: EntityId::user(id),
        master: Reference::new(master),
        slaves: slaves.iter().map(|n| Reference::new(*n)).collect(),
    }
}

#[cfg(test)]
fn x_rbe3(
    id: u32,
    master: u32,
    master_digits: &str,
    slaves: &[u32],
    slave_digits: &str,
) -> Constraint {
    Constraint::Rbe3 {
        id: EntityId::user(id),
        master: Reference::new(master),
        master_dofs: Dofs::from_digits(master_digits).unwrap(),
        slaves: slaves.iter().map(|n| Reference::new(*n)).collect(),
        slave_dofs: Dofs::from_digits(slave_digits).unwrap(),
    }
}

#[cfg(test)]
fn x_lmpc(id: u32, terms: &[(u32, [f64; 6])]) -> Constraint {
    use crate::dof::DofCoefs;
    Constraint::Lmpc {
        id: EntityId::user(id),
        terms: terms
            .iter()
            .map(|(node, coefs)| crate::datamodel::LmpcTerm {
                node: Reference::new(*node),
                coefs: DofCoefs::new(*coefs),
            })
            .collect(),
    }
}

#[cfg(test)]
fn x_force(id: u32, nodes: &[u32], fz: f64) -> Loading {
    Loading::NodalForce {
        id: EntityId::user(id),
        nodes: nodes.iter().map(|n| Reference::new(*n)).collect(),
        force: Vec3::new(0.0, 0.0, fz),
        moment: Vec3::ZERO,
        csys: None,
    }
}

/// A small but complete model: a two-cell bar, one frame, an SPC on one
/// end, a tip force, one static analysis wired through sets.
#[cfg(test)]
fn x_model() -> Model {
    let mut model = Model::new("bar");
    model.insert_node(x_node_at(1, 0.0, 0.0, 0.0)).unwrap();
    model.insert_node(x_node_at(2, 1.0, 0.0, 0.0)).unwrap();
    model.insert_node(x_node_at(3, 2.0, 0.0, 0.0)).unwrap();
    model.insert_cell(x_seg2(10, 1, 2)).unwrap();
    model.insert_cell(x_seg2(11, 2, 3)).unwrap();
    model.insert_coordinate_system(x_cart_cs(1)).unwrap();
    model.insert_constraint(x_spc(1, &[1], "123456", 0.0)).unwrap();
    model
        .add_constraint_into_set(Reference::new(1), 5, ConstraintSetKind::Spc)
        .unwrap();
    model.insert_loading(x_force(1, &[3], -100.0)).unwrap();
    model.add_loading_into_set(Reference::new(1), 7).unwrap();
    model
        .insert_analysis(Analysis::LinearStatic {
            id: EntityId::user(1),
            constraint_sets: vec![Reference::new(5)],
            load_sets: vec![Reference::new(7)],
        })
        .unwrap();
    model.add_node_to_group("clamped", 1);
    model.add_cell_to_group("bar", 10);
    model.add_cell_to_group("bar", 11);
    model
}
