// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! JSON interchange for model decks and finalized summaries.
//!
//! A deck is the neutral on-disk form of an open model: flat arrays per
//! entity kind, cross-references by bare identifier, groups by name.  The
//! summary is the other direction, a dump of what finalize derived.
//!
//! # Example
//! ```no_run
//! use femir_engine::json;
//!
//! let text = r#"{"name": "plate", "nodes": [], "cells": []}"#;
//! let deck: json::Deck = text.parse()?;
//! let model = json::deck_to_model(deck)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::csys;
use crate::datamodel;
use crate::dof::{Dof, DofCoefs, Dofs};
use crate::family::FamilyPartition;
use crate::geometry::Vec3;
use crate::ident::{Entity, EntityId, Reference};
use crate::interchange_err;
use crate::mesh;
use crate::model::{FinalizedModel, Model};

// Helper functions for serde skip_serializing_if

fn is_empty_string(val: &str) -> bool {
    val.is_empty()
}

fn is_empty_vec<T>(val: &[T]) -> bool {
    val.is_empty()
}

fn is_zero_triple(val: &[f64; 3]) -> bool {
    val.iter().all(|c| *c == 0.0)
}

fn vec3(a: [f64; 3]) -> Vec3 {
    Vec3::new(a[0], a[1], a[2])
}

fn triple(v: Vec3) -> [f64; 3] {
    [v.x, v.y, v.z]
}

fn refs<T: Entity>(numbers: &[u32]) -> Vec<Reference<T>> {
    numbers.iter().map(|n| Reference::new(*n)).collect()
}

fn numbers<T: Entity>(refs: &[Reference<T>]) -> Vec<u32> {
    refs.iter().map(|r| r.number()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: u32,
    pub position: [f64; 3],
    /// DOF digits, 1 through 6; absent means all six.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dofs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub position_cs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub displacement_cs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: u32,
    pub kind: String,
    pub nodes: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoordinateSystem {
    Cartesian {
        id: u32,
        origin: [f64; 3],
        ex: [f64; 3],
        ey: [f64; 3],
        #[serde(skip_serializing_if = "Option::is_none", default)]
        base: Option<u32>,
    },
    Cylindrical {
        id: u32,
        origin: [f64; 3],
        ex: [f64; 3],
        ey: [f64; 3],
        #[serde(skip_serializing_if = "Option::is_none", default)]
        base: Option<u32>,
    },
    Orientation {
        id: u32,
        origin: [f64; 3],
        ex: [f64; 3],
        v: [f64; 3],
        #[serde(skip_serializing_if = "Option::is_none", default)]
        base: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub youngs_modulus: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub poisson_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub density: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    pub points: Vec<[f64; 2]>,
    /// Absent means linear.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub interpolation: Option<String>,
    /// Absent means none.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub extrapolation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LmpcTerm {
    pub node: u32,
    pub coefs: [f64; 6],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    Spc {
        id: u32,
        nodes: Vec<u32>,
        fixed: String,
        #[serde(default)]
        value: f64,
    },
    RigidBody {
        id: u32,
        master: u32,
        slaves: Vec<u32>,
    },
    Rbe3 {
        id: u32,
        master: u32,
        master_dofs: String,
        slaves: Vec<u32>,
        slave_dofs: String,
    },
    Lmpc {
        id: u32,
        terms: Vec<LmpcTerm>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub id: u32,
    pub kind: String,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub constraints: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Loading {
    NodalForce {
        id: u32,
        nodes: Vec<u32>,
        force: [f64; 3],
        #[serde(skip_serializing_if = "is_zero_triple", default)]
        moment: [f64; 3],
        #[serde(skip_serializing_if = "Option::is_none", default)]
        csys: Option<u32>,
    },
    Gravity {
        id: u32,
        acceleration: [f64; 3],
    },
    DynamicExcitation {
        id: u32,
        function: u32,
        load_set: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSet {
    pub id: u32,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub loadings: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyBand {
    pub lower: f64,
    pub upper: f64,
    pub num_modes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Analysis {
    LinearStatic {
        id: u32,
        #[serde(skip_serializing_if = "is_empty_vec", default)]
        constraint_sets: Vec<u32>,
        #[serde(skip_serializing_if = "is_empty_vec", default)]
        load_sets: Vec<u32>,
    },
    LinearModal {
        id: u32,
        #[serde(skip_serializing_if = "is_empty_vec", default)]
        constraint_sets: Vec<u32>,
        band: FrequencyBand,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Objective {
    NodalDisplacement {
        id: u32,
        node: u32,
        dof: String,
        value: f64,
        tolerance: f64,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        instant: Option<f64>,
    },
    Frequency {
        id: u32,
        number: u32,
        cycles: f64,
        tolerance: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<u32>,
    pub members: Vec<u32>,
}

/// A whole model in interchange form.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Deck {
    #[serde(skip_serializing_if = "is_empty_string", default)]
    pub name: String,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub nodes: Vec<Node>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub cells: Vec<Cell>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub coordinate_systems: Vec<CoordinateSystem>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub materials: Vec<Material>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub functions: Vec<Function>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub constraints: Vec<Constraint>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub constraint_sets: Vec<ConstraintSet>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub loadings: Vec<Loading>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub load_sets: Vec<LoadSet>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub analyses: Vec<Analysis>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub objectives: Vec<Objective>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub node_groups: Vec<Group>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub cell_groups: Vec<Group>,
}

impl std::str::FromStr for Deck {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        serde_json::from_str(s).map_err(|err| {
            Error::new(
                ErrorKind::Interchange,
                ErrorCode::JsonDeserialization,
                Some(format!("Failed to parse JSON deck: {err}")),
            )
        })
    }
}

impl Deck {
    /// Parse a Deck from a reader
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|err| {
            Error::new(
                ErrorKind::Interchange,
                ErrorCode::JsonDeserialization,
                Some(format!("Failed to parse JSON deck: {err}")),
            )
        })
    }
}

// Conversions from deck types to engine types.  The digit strings and the
// spelled-out kind names are the fallible part.

fn parse_dofs(owner: &str, digits: &str) -> Result<Dofs> {
    match Dofs::from_digits(digits) {
        Some(dofs) => Ok(dofs),
        None => interchange_err!(
            JsonDeserialization,
            format!("{owner}: bad DOF digits '{digits}'")
        ),
    }
}

fn node_from_json(json: Node) -> Result<mesh::Node> {
    let mut node = mesh::Node::new(EntityId::user(json.id), vec3(json.position));
    if let Some(digits) = &json.dofs {
        node = node.with_dofs(parse_dofs(&format!("node #{}", json.id), digits)?);
    }
    if let Some(cs) = json.position_cs {
        node = node.with_position_cs(Reference::new(cs));
    }
    if let Some(cs) = json.displacement_cs {
        node = node.with_displacement_cs(Reference::new(cs));
    }
    Ok(node)
}

fn cell_from_json(json: Cell) -> Result<mesh::Cell> {
    match mesh::CellKind::from_name(&json.kind) {
        Some(kind) => Ok(mesh::Cell::new(EntityId::user(json.id), kind, json.nodes)),
        None => interchange_err!(
            JsonDeserialization,
            format!("cell #{}: unknown kind '{}'", json.id, json.kind)
        ),
    }
}

fn csys_from_json(json: CoordinateSystem) -> csys::CoordinateSystem {
    let (cs, base) = match json {
        CoordinateSystem::Cartesian {
            id,
            origin,
            ex,
            ey,
            base,
        } => (
            csys::CoordinateSystem::cartesian(
                EntityId::user(id),
                vec3(origin),
                vec3(ex),
                vec3(ey),
            ),
            base,
        ),
        CoordinateSystem::Cylindrical {
            id,
            origin,
            ex,
            ey,
            base,
        } => (
            csys::CoordinateSystem::cylindrical(
                EntityId::user(id),
                vec3(origin),
                vec3(ex),
                vec3(ey),
            ),
            base,
        ),
        CoordinateSystem::Orientation {
            id,
            origin,
            ex,
            v,
            base,
        } => (
            csys::CoordinateSystem::orientation(EntityId::user(id), vec3(origin), vec3(ex), vec3(v)),
            base,
        ),
    };
    match base {
        Some(number) => cs.with_base(Reference::new(number)),
        None => cs,
    }
}

fn material_from_json(json: Material) -> datamodel::Material {
    let mut material = datamodel::Material::new(EntityId::user(json.id));
    material.name = json.name;
    material.youngs_modulus = json.youngs_modulus;
    material.poisson_ratio = json.poisson_ratio;
    material.density = json.density;
    material
}

fn parse_interpolation(id: u32, name: &str) -> Result<datamodel::Interpolation> {
    match datamodel::Interpolation::from_name(name) {
        Some(mode) => Ok(mode),
        None => interchange_err!(
            JsonDeserialization,
            format!("function #{id}: unknown interpolation '{name}'")
        ),
    }
}

fn function_from_json(json: Function) -> Result<datamodel::FunctionTable> {
    let points = json.points.iter().map(|[x, y]| (*x, *y)).collect();
    let mut table = datamodel::FunctionTable::new(EntityId::user(json.id), points);
    table.name = json.name;
    if let Some(name) = &json.interpolation {
        table.interpolation = parse_interpolation(json.id, name)?;
    }
    if let Some(name) = &json.extrapolation {
        table.extrapolation = parse_interpolation(json.id, name)?;
    }
    Ok(table)
}

fn constraint_from_json(json: Constraint) -> Result<datamodel::Constraint> {
    Ok(match json {
        Constraint::Spc {
            id,
            nodes,
            fixed,
            value,
        } => datamodel::Constraint::Spc {
            id: EntityId::user(id),
            nodes: refs(&nodes),
            fixed: parse_dofs(&format!("constraint #{id}"), &fixed)?,
            value,
        },
        Constraint::RigidBody { id, master, slaves } => datamodel::Constraint::RigidBody {
            id: EntityId::user(id),
            master: Reference::new(master),
            slaves: refs(&slaves),
        },
        Constraint::Rbe3 {
            id,
            master,
            master_dofs,
            slaves,
            slave_dofs,
        } => datamodel::Constraint::Rbe3 {
            id: EntityId::user(id),
            master: Reference::new(master),
            master_dofs: parse_dofs(&format!("constraint #{id}"), &master_dofs)?,
            slaves: refs(&slaves),
            slave_dofs: parse_dofs(&format!("constraint #{id}"), &slave_dofs)?,
        },
        Constraint::Lmpc { id, terms } => datamodel::Constraint::Lmpc {
            id: EntityId::user(id),
            terms: terms
                .into_iter()
                .map(|term| datamodel::LmpcTerm {
                    node: Reference::new(term.node),
                    coefs: DofCoefs::new(term.coefs),
                })
                .collect(),
        },
    })
}

fn loading_from_json(json: Loading) -> datamodel::Loading {
    match json {
        Loading::NodalForce {
            id,
            nodes,
            force,
            moment,
            csys,
        } => datamodel::Loading::NodalForce {
            id: EntityId::user(id),
            nodes: refs(&nodes),
            force: vec3(force),
            moment: vec3(moment),
            csys: csys.map(Reference::new),
        },
        Loading::Gravity { id, acceleration } => datamodel::Loading::Gravity {
            id: EntityId::user(id),
            acceleration: vec3(acceleration),
        },
        Loading::DynamicExcitation {
            id,
            function,
            load_set,
        } => datamodel::Loading::DynamicExcitation {
            id: EntityId::user(id),
            function: Reference::new(function),
            load_set: Reference::new(load_set),
        },
    }
}

fn analysis_from_json(json: Analysis) -> datamodel::Analysis {
    match json {
        Analysis::LinearStatic {
            id,
            constraint_sets,
            load_sets,
        } => datamodel::Analysis::LinearStatic {
            id: EntityId::user(id),
            constraint_sets: refs(&constraint_sets),
            load_sets: refs(&load_sets),
        },
        Analysis::LinearModal {
            id,
            constraint_sets,
            band,
        } => datamodel::Analysis::LinearModal {
            id: EntityId::user(id),
            constraint_sets: refs(&constraint_sets),
            band: datamodel::FrequencyBand {
                lower: band.lower,
                upper: band.upper,
                num_modes: band.num_modes,
            },
        },
    }
}

fn objective_from_json(json: Objective) -> Result<datamodel::Objective> {
    Ok(match json {
        Objective::NodalDisplacement {
            id,
            node,
            dof,
            value,
            tolerance,
            instant,
        } => datamodel::Objective::NodalDisplacement {
            id: EntityId::user(id),
            node: Reference::new(node),
            dof: match Dof::from_name(&dof) {
                Some(dof) => dof,
                None => {
                    return interchange_err!(
                        JsonDeserialization,
                        format!("objective #{id}: unknown DOF '{dof}'")
                    );
                }
            },
            value,
            tolerance,
            instant,
        },
        Objective::Frequency {
            id,
            number,
            cycles,
            tolerance,
        } => datamodel::Objective::Frequency {
            id: EntityId::user(id),
            number,
            cycles,
            tolerance,
        },
    })
}

/// Build an open model from a deck.
///
/// Insertion failures (duplicate identifiers, arity mismatches, empty
/// tables) pass through as model errors; everything the deck spells as a
/// string that fails to parse is an interchange error.  Reference targets
/// are not checked here; that is finalize's job.
pub fn deck_to_model(deck: Deck) -> Result<Model> {
    let mut model = Model::new(&deck.name);
    for node in deck.nodes {
        model.insert_node(node_from_json(node)?)?;
    }
    for cell in deck.cells {
        model.insert_cell(cell_from_json(cell)?)?;
    }
    for cs in deck.coordinate_systems {
        model.insert_coordinate_system(csys_from_json(cs))?;
    }
    for material in deck.materials {
        model.insert_material(material_from_json(material))?;
    }
    for function in deck.functions {
        model.insert_function(function_from_json(function)?)?;
    }
    for constraint in deck.constraints {
        model.insert_constraint(constraint_from_json(constraint)?)?;
    }
    for set in deck.constraint_sets {
        let kind = match datamodel::ConstraintSetKind::from_name(&set.kind) {
            Some(kind) => kind,
            None => {
                return interchange_err!(
                    JsonDeserialization,
                    format!("constraint_set #{}: unknown kind '{}'", set.id, set.kind)
                );
            }
        };
        model.constraint_sets.insert(datamodel::ConstraintSet {
            id: EntityId::user(set.id),
            kind,
        })?;
        for member in set.constraints {
            model.add_constraint_into_set(Reference::new(member), set.id, kind)?;
        }
    }
    for loading in deck.loadings {
        model.insert_loading(loading_from_json(loading))?;
    }
    for set in deck.load_sets {
        model.load_sets.insert(datamodel::LoadSet {
            id: EntityId::user(set.id),
        })?;
        for member in set.loadings {
            model.add_loading_into_set(Reference::new(member), set.id)?;
        }
    }
    for analysis in deck.analyses {
        model.insert_analysis(analysis_from_json(analysis))?;
    }
    for objective in deck.objectives {
        model.insert_objective(objective_from_json(objective)?)?;
    }
    for group in deck.node_groups {
        model.mesh.node_groups.find_or_create(&group.name).id = group.id;
        for member in group.members {
            model.add_node_to_group(&group.name, member);
        }
    }
    for group in deck.cell_groups {
        model.mesh.cell_groups.find_or_create(&group.name).id = group.id;
        for member in group.members {
            model.add_cell_to_group(&group.name, member);
        }
    }
    Ok(model)
}

// Conversions from engine types back to deck types.

fn node_to_json(node: &mesh::Node) -> Node {
    Node {
        id: node.id.number(),
        position: triple(node.position),
        dofs: if node.dofs == Dofs::ALL {
            None
        } else {
            Some(node.dofs.to_digits())
        },
        position_cs: node.position_cs.map(|r| r.number()),
        displacement_cs: node.displacement_cs.map(|r| r.number()),
    }
}

fn cell_to_json(cell: &mesh::Cell) -> Cell {
    Cell {
        id: cell.id.number(),
        kind: cell.kind.to_string(),
        nodes: numbers(&cell.nodes),
    }
}

fn csys_to_json(cs: &csys::CoordinateSystem) -> CoordinateSystem {
    let id = cs.id.number();
    let base = cs.base.map(|r| r.number());
    match cs.spec {
        csys::CsysSpec::Cartesian { origin, ex, ey } => CoordinateSystem::Cartesian {
            id,
            origin: triple(origin),
            ex: triple(ex),
            ey: triple(ey),
            base,
        },
        csys::CsysSpec::Cylindrical { origin, ex, ey } => CoordinateSystem::Cylindrical {
            id,
            origin: triple(origin),
            ex: triple(ex),
            ey: triple(ey),
            base,
        },
        csys::CsysSpec::Orientation { origin, ex, v } => CoordinateSystem::Orientation {
            id,
            origin: triple(origin),
            ex: triple(ex),
            v: triple(v),
            base,
        },
    }
}

fn material_to_json(material: &datamodel::Material) -> Material {
    Material {
        id: material.id.number(),
        name: material.name.clone(),
        youngs_modulus: material.youngs_modulus,
        poisson_ratio: material.poisson_ratio,
        density: material.density,
    }
}

fn function_to_json(table: &datamodel::FunctionTable) -> Function {
    Function {
        id: table.id.number(),
        name: table.name.clone(),
        points: table.points.iter().map(|(x, y)| [*x, *y]).collect(),
        interpolation: if table.interpolation == datamodel::Interpolation::Linear {
            None
        } else {
            Some(table.interpolation.to_string())
        },
        extrapolation: if table.extrapolation == datamodel::Interpolation::None {
            None
        } else {
            Some(table.extrapolation.to_string())
        },
    }
}

fn constraint_to_json(constraint: &datamodel::Constraint) -> Constraint {
    match constraint {
        datamodel::Constraint::Spc {
            id,
            nodes,
            fixed,
            value,
        } => Constraint::Spc {
            id: id.number(),
            nodes: numbers(nodes),
            fixed: fixed.to_digits(),
            value: *value,
        },
        datamodel::Constraint::RigidBody { id, master, slaves } => Constraint::RigidBody {
            id: id.number(),
            master: master.number(),
            slaves: numbers(slaves),
        },
        datamodel::Constraint::Rbe3 {
            id,
            master,
            master_dofs,
            slaves,
            slave_dofs,
        } => Constraint::Rbe3 {
            id: id.number(),
            master: master.number(),
            master_dofs: master_dofs.to_digits(),
            slaves: numbers(slaves),
            slave_dofs: slave_dofs.to_digits(),
        },
        datamodel::Constraint::Lmpc { id, terms } => Constraint::Lmpc {
            id: id.number(),
            terms: terms
                .iter()
                .map(|term| LmpcTerm {
                    node: term.node.number(),
                    coefs: term.coefs.as_array(),
                })
                .collect(),
        },
    }
}

fn loading_to_json(loading: &datamodel::Loading) -> Loading {
    match loading {
        datamodel::Loading::NodalForce {
            id,
            nodes,
            force,
            moment,
            csys,
        } => Loading::NodalForce {
            id: id.number(),
            nodes: numbers(nodes),
            force: triple(*force),
            moment: triple(*moment),
            csys: csys.map(|r| r.number()),
        },
        datamodel::Loading::Gravity { id, acceleration } => Loading::Gravity {
            id: id.number(),
            acceleration: triple(*acceleration),
        },
        datamodel::Loading::DynamicExcitation {
            id,
            function,
            load_set,
        } => Loading::DynamicExcitation {
            id: id.number(),
            function: function.number(),
            load_set: load_set.number(),
        },
    }
}

fn analysis_to_json(analysis: &datamodel::Analysis) -> Analysis {
    match analysis {
        datamodel::Analysis::LinearStatic {
            id,
            constraint_sets,
            load_sets,
        } => Analysis::LinearStatic {
            id: id.number(),
            constraint_sets: numbers(constraint_sets),
            load_sets: numbers(load_sets),
        },
        datamodel::Analysis::LinearModal {
            id,
            constraint_sets,
            band,
        } => Analysis::LinearModal {
            id: id.number(),
            constraint_sets: numbers(constraint_sets),
            band: FrequencyBand {
                lower: band.lower,
                upper: band.upper,
                num_modes: band.num_modes,
            },
        },
    }
}

fn objective_to_json(objective: &datamodel::Objective) -> Objective {
    match objective {
        datamodel::Objective::NodalDisplacement {
            id,
            node,
            dof,
            value,
            tolerance,
            instant,
        } => Objective::NodalDisplacement {
            id: id.number(),
            node: node.number(),
            dof: dof.to_string(),
            value: *value,
            tolerance: *tolerance,
            instant: *instant,
        },
        datamodel::Objective::Frequency {
            id,
            number,
            cycles,
            tolerance,
        } => Objective::Frequency {
            id: id.number(),
            number: *number,
            cycles: *cycles,
            tolerance: *tolerance,
        },
    }
}

fn group_to_json<T>(group: &mesh::Group<T>) -> Group {
    Group {
        name: group.name().to_owned(),
        id: group.id,
        members: group.members().collect(),
    }
}

/// Serialize an open model back into a deck.
pub fn model_to_deck(model: &Model) -> Deck {
    Deck {
        name: model.name.clone(),
        nodes: model.mesh.nodes.iter().map(node_to_json).collect(),
        cells: model.mesh.cells.iter().map(cell_to_json).collect(),
        coordinate_systems: model.coordinate_systems.iter().map(csys_to_json).collect(),
        materials: model.materials.iter().map(material_to_json).collect(),
        functions: model.functions.iter().map(function_to_json).collect(),
        constraints: model.constraints.iter().map(constraint_to_json).collect(),
        constraint_sets: model
            .constraint_sets
            .iter()
            .map(|set| ConstraintSet {
                id: set.id.number(),
                kind: set.kind.to_string(),
                constraints: numbers(model.constraints_in_set(set.id.number())),
            })
            .collect(),
        loadings: model.loadings.iter().map(loading_to_json).collect(),
        load_sets: model
            .load_sets
            .iter()
            .map(|set| LoadSet {
                id: set.id.number(),
                loadings: numbers(model.loadings_in_set(set.id.number())),
            })
            .collect(),
        analyses: model.analyses.iter().map(analysis_to_json).collect(),
        objectives: model.objectives.iter().map(objective_to_json).collect(),
        node_groups: model.mesh.node_groups.iter().map(group_to_json).collect(),
        cell_groups: model.mesh.cell_groups.iter().map(group_to_json).collect(),
    }
}

/// What `finalize` derived, in dump form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub name: String,
    pub nodes: Vec<SummaryNode>,
    pub dofs: Vec<SummaryDof>,
    #[serde(skip_serializing_if = "is_empty_vec", default)]
    pub imposed: Vec<SummaryImposed>,
    pub node_families: Vec<SummaryFamily>,
    pub cell_families: Vec<SummaryFamily>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryNode {
    pub id: u32,
    pub global: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDof {
    pub index: usize,
    pub node: u32,
    pub dof: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryImposed {
    pub node: u32,
    pub dof: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryFamily {
    pub id: i32,
    pub name: String,
    pub members: Vec<u32>,
}

fn summary_families(partition: &FamilyPartition) -> Vec<SummaryFamily> {
    partition
        .families()
        .map(|family| SummaryFamily {
            id: family.id(),
            name: family.name().to_owned(),
            members: family.members().to_vec(),
        })
        .collect()
}

/// Dump the derived state of a finalized model.
pub fn summarize(finalized: &FinalizedModel) -> Summary {
    let model = finalized.model();
    Summary {
        name: model.name.clone(),
        nodes: model
            .mesh
            .nodes
            .iter()
            .map(|node| SummaryNode {
                id: node.id.number(),
                global: triple(
                    finalized
                        .node_global_position(node.id.number())
                        .unwrap_or(node.position),
                ),
            })
            .collect(),
        dofs: finalized
            .dof_numbering()
            .iter()
            .enumerate()
            .map(|(index, (node, dof))| SummaryDof {
                index,
                node,
                dof: dof.to_string(),
            })
            .collect(),
        imposed: finalized
            .imposed_dofs()
            .iter()
            .map(|((node, dof), value)| SummaryImposed {
                node: *node,
                dof: dof.to_string(),
                value: *value,
            })
            .collect(),
        node_families: summary_families(finalized.node_families()),
        cell_families: summary_families(finalized.cell_families()),
    }
}
