// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Solver-model entities: materials, tabulated functions, constraints,
//! loadings, analyses and assertion objectives.
//!
//! These are plain data, exactly as a reader authored them.  Cross-entity
//! links are [`Reference`] values throughout; nothing here owns a node or a
//! frame.

use std::fmt;

use crate::csys::CoordinateSystem;
use crate::dof::{Dof, DofCoefs, Dofs};
use crate::geometry::Vec3;
use crate::ident::{Entity, EntityId, EntityKind, Reference};
use crate::mesh::{Node, NodeContainer};

/// Linear-elastic material properties.  Anything the deck leaves out stays
/// `None`; writers decide per dialect what absence means.
#[derive(Clone, PartialEq, Debug)]
pub struct Material {
    pub id: EntityId,
    pub name: Option<String>,
    pub youngs_modulus: Option<f64>,
    pub poisson_ratio: Option<f64>,
    pub density: Option<f64>,
}

impl Material {
    pub fn new(id: EntityId) -> Self {
        Material {
            id,
            name: None,
            youngs_modulus: None,
            poisson_ratio: None,
            density: None,
        }
    }
}

impl Entity for Material {
    const KIND: EntityKind = EntityKind::Material;

    fn id(&self) -> EntityId {
        self.id
    }
}

/// Value reconstruction mode, between samples and beyond the table range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Interpolation {
    Linear,
    Logarithmic,
    Constant,
    None,
}

impl Interpolation {
    pub fn from_name(name: &str) -> Option<Interpolation> {
        match name {
            "linear" => Some(Interpolation::Linear),
            "logarithmic" => Some(Interpolation::Logarithmic),
            "constant" => Some(Interpolation::Constant),
            "none" => Some(Interpolation::None),
            _ => None,
        }
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Interpolation::Linear => "linear",
            Interpolation::Logarithmic => "logarithmic",
            Interpolation::Constant => "constant",
            Interpolation::None => "none",
        };
        write!(f, "{name}")
    }
}

/// A tabulated function: ordered (x, y) samples plus the modes telling a
/// solver how to read between and beyond them.
#[derive(Clone, PartialEq, Debug)]
pub struct FunctionTable {
    pub id: EntityId,
    pub name: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub interpolation: Interpolation,
    pub extrapolation: Interpolation,
}

impl FunctionTable {
    pub fn new(id: EntityId, points: Vec<(f64, f64)>) -> Self {
        FunctionTable {
            id,
            name: None,
            points,
            interpolation: Interpolation::Linear,
            extrapolation: Interpolation::None,
        }
    }
}

impl Entity for FunctionTable {
    const KIND: EntityKind = EntityKind::Function;

    fn id(&self) -> EntityId {
        self.id
    }
}

/// One node's coefficients in a linear multi-point constraint.
#[derive(Clone, PartialEq, Debug)]
pub struct LmpcTerm {
    pub node: Reference<Node>,
    pub coefs: DofCoefs,
}

/// A kinematic constraint.
#[derive(Clone, PartialEq, Debug)]
pub enum Constraint {
    /// Single-point constraint: the fixed DOFs of each node take `value`.
    Spc {
        id: EntityId,
        nodes: Vec<Reference<Node>>,
        fixed: Dofs,
        value: f64,
    },
    /// Every slave DOF follows the master rigidly.
    RigidBody {
        id: EntityId,
        master: Reference<Node>,
        slaves: Vec<Reference<Node>>,
    },
    /// Interpolation element: the master DOFs follow the slave DOFs.
    Rbe3 {
        id: EntityId,
        master: Reference<Node>,
        master_dofs: Dofs,
        slaves: Vec<Reference<Node>>,
        slave_dofs: Dofs,
    },
    /// Linear relation over node DOFs: the weighted sum is zero.
    Lmpc { id: EntityId, terms: Vec<LmpcTerm> },
}

impl Constraint {
    pub fn label(&self) -> &'static str {
        match self {
            Constraint::Spc { .. } => "spc",
            Constraint::RigidBody { .. } => "rigid_body",
            Constraint::Rbe3 { .. } => "rbe3",
            Constraint::Lmpc { .. } => "lmpc",
        }
    }
}

impl Entity for Constraint {
    const KIND: EntityKind = EntityKind::Constraint;

    fn id(&self) -> EntityId {
        match self {
            Constraint::Spc { id, .. }
            | Constraint::RigidBody { id, .. }
            | Constraint::Rbe3 { id, .. }
            | Constraint::Lmpc { id, .. } => *id,
        }
    }
}

impl NodeContainer for Constraint {
    fn node_refs(&self) -> Vec<Reference<Node>> {
        match self {
            Constraint::Spc { nodes, .. } => nodes.clone(),
            Constraint::RigidBody { master, slaves, .. }
            | Constraint::Rbe3 { master, slaves, .. } => {
                let mut refs = vec![*master];
                refs.extend_from_slice(slaves);
                refs
            }
            Constraint::Lmpc { terms, .. } => terms.iter().map(|t| t.node).collect(),
        }
    }
}

/// What a constraint set collects, mirroring the split most solver dialects
/// make between single-point and multi-point cards.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ConstraintSetKind {
    Spc,
    Mpc,
    All,
}

impl ConstraintSetKind {
    pub fn from_name(name: &str) -> Option<ConstraintSetKind> {
        match name {
            "spc" => Some(ConstraintSetKind::Spc),
            "mpc" => Some(ConstraintSetKind::Mpc),
            "all" => Some(ConstraintSetKind::All),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintSetKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ConstraintSetKind::Spc => "spc",
            ConstraintSetKind::Mpc => "mpc",
            ConstraintSetKind::All => "all",
        };
        write!(f, "{name}")
    }
}

/// A named collection of constraints an analysis can turn on.
///
/// Membership lives in the Model, not here; decks restate set declarations
/// freely, so an identical re-declaration is accepted.
#[derive(Clone, PartialEq, Debug)]
pub struct ConstraintSet {
    pub id: EntityId,
    pub kind: ConstraintSetKind,
}

impl Entity for ConstraintSet {
    const KIND: EntityKind = EntityKind::ConstraintSet;
    const REDECLARABLE: bool = true;

    fn id(&self) -> EntityId {
        self.id
    }
}

/// An applied load.
#[derive(Clone, PartialEq, Debug)]
pub enum Loading {
    /// Concentrated force and moment on each listed node, with components
    /// expressed in `csys` when one is named.
    NodalForce {
        id: EntityId,
        nodes: Vec<Reference<Node>>,
        force: Vec3,
        moment: Vec3,
        csys: Option<Reference<CoordinateSystem>>,
    },
    /// Uniform acceleration field over the whole mesh.
    Gravity { id: EntityId, acceleration: Vec3 },
    /// A static load set modulated by a tabulated function.
    DynamicExcitation {
        id: EntityId,
        function: Reference<FunctionTable>,
        load_set: Reference<LoadSet>,
    },
}

impl Loading {
    pub fn label(&self) -> &'static str {
        match self {
            Loading::NodalForce { .. } => "nodal_force",
            Loading::Gravity { .. } => "gravity",
            Loading::DynamicExcitation { .. } => "dynamic_excitation",
        }
    }
}

impl Entity for Loading {
    const KIND: EntityKind = EntityKind::Loading;

    fn id(&self) -> EntityId {
        match self {
            Loading::NodalForce { id, .. }
            | Loading::Gravity { id, .. }
            | Loading::DynamicExcitation { id, .. } => *id,
        }
    }
}

impl NodeContainer for Loading {
    fn node_refs(&self) -> Vec<Reference<Node>> {
        match self {
            Loading::NodalForce { nodes, .. } => nodes.clone(),
            Loading::Gravity { .. } | Loading::DynamicExcitation { .. } => Vec::new(),
        }
    }
}

/// Identifier-only bookkeeping entity; membership lives in the Model.
#[derive(Clone, PartialEq, Debug)]
pub struct LoadSet {
    pub id: EntityId,
}

impl Entity for LoadSet {
    const KIND: EntityKind = EntityKind::LoadSet;
    const REDECLARABLE: bool = true;

    fn id(&self) -> EntityId {
        self.id
    }
}

/// The frequency range and mode budget of a modal analysis.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct FrequencyBand {
    pub lower: f64,
    pub upper: f64,
    pub num_modes: u32,
}

/// One solver run: which constraints and loads apply, and what to compute.
#[derive(Clone, PartialEq, Debug)]
pub enum Analysis {
    LinearStatic {
        id: EntityId,
        constraint_sets: Vec<Reference<ConstraintSet>>,
        load_sets: Vec<Reference<LoadSet>>,
    },
    LinearModal {
        id: EntityId,
        constraint_sets: Vec<Reference<ConstraintSet>>,
        band: FrequencyBand,
    },
}

impl Analysis {
    pub fn label(&self) -> &'static str {
        match self {
            Analysis::LinearStatic { .. } => "linear_static",
            Analysis::LinearModal { .. } => "linear_modal",
        }
    }

    pub fn constraint_sets(&self) -> &[Reference<ConstraintSet>] {
        match self {
            Analysis::LinearStatic {
                constraint_sets, ..
            }
            | Analysis::LinearModal {
                constraint_sets, ..
            } => constraint_sets,
        }
    }

    pub fn load_sets(&self) -> &[Reference<LoadSet>] {
        match self {
            Analysis::LinearStatic { load_sets, .. } => load_sets,
            Analysis::LinearModal { .. } => &[],
        }
    }
}

impl Entity for Analysis {
    const KIND: EntityKind = EntityKind::Analysis;

    fn id(&self) -> EntityId {
        match self {
            Analysis::LinearStatic { id, .. } | Analysis::LinearModal { id, .. } => *id,
        }
    }
}

/// An expected solver result, for checking a run against known answers.
#[derive(Clone, PartialEq, Debug)]
pub enum Objective {
    /// Expected displacement of one node DOF, optionally at a given instant.
    NodalDisplacement {
        id: EntityId,
        node: Reference<Node>,
        dof: Dof,
        value: f64,
        tolerance: f64,
        instant: Option<f64>,
    },
    /// Expected natural frequency of one mode, in cycles per second.
    Frequency {
        id: EntityId,
        number: u32,
        cycles: f64,
        tolerance: f64,
    },
}

impl Objective {
    pub fn label(&self) -> &'static str {
        match self {
            Objective::NodalDisplacement { .. } => "nodal_displacement",
            Objective::Frequency { .. } => "frequency",
        }
    }
}

impl Entity for Objective {
    const KIND: EntityKind = EntityKind::Objective;

    fn id(&self) -> EntityId {
        match self {
            Objective::NodalDisplacement { id, .. } | Objective::Frequency { id, .. } => *id,
        }
    }
}

impl NodeContainer for Objective {
    fn node_refs(&self) -> Vec<Reference<Node>> {
        match self {
            Objective::NodalDisplacement { node, .. } => vec![*node],
            Objective::Frequency { .. } => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_node_refs() {
        let spc = Constraint::Spc {
            id: EntityId::user(1),
            nodes: vec![Reference::new(4), Reference::new(2)],
            fixed: Dofs::TRANSLATIONS,
            value: 0.0,
        };
        assert_eq!(vec![Reference::new(4), Reference::new(2)], spc.node_refs());

        let rigid = Constraint::RigidBody {
            id: EntityId::user(2),
            master: Reference::new(10),
            slaves: vec![Reference::new(11), Reference::new(12)],
        };
        assert_eq!(
            vec![Reference::new(10), Reference::new(11), Reference::new(12)],
            rigid.node_refs()
        );

        let lmpc = Constraint::Lmpc {
            id: EntityId::user(3),
            terms: vec![
                LmpcTerm {
                    node: Reference::new(7),
                    coefs: DofCoefs::new([1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                },
                LmpcTerm {
                    node: Reference::new(8),
                    coefs: DofCoefs::new([-1.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
                },
            ],
        };
        assert_eq!(vec![Reference::new(7), Reference::new(8)], lmpc.node_refs());
    }

    #[test]
    fn test_entity_dispatch() {
        let c = Constraint::Rbe3 {
            id: EntityId::user(9),
            master: Reference::new(1),
            master_dofs: Dofs::ALL,
            slaves: vec![Reference::new(2)],
            slave_dofs: Dofs::TRANSLATIONS,
        };
        assert_eq!(9, c.id().number());
        assert_eq!("rbe3", c.label());

        let a = Analysis::LinearModal {
            id: EntityId::auto(1),
            constraint_sets: vec![Reference::new(5)],
            band: FrequencyBand {
                lower: 0.0,
                upper: 200.0,
                num_modes: 10,
            },
        };
        assert_eq!("linear_modal", a.label());
        assert_eq!(1, a.constraint_sets().len());
        assert!(a.load_sets().is_empty());

        let o = Objective::Frequency {
            id: EntityId::user(1),
            number: 1,
            cycles: 12.5,
            tolerance: 0.05,
        };
        assert_eq!("frequency", o.label());
        assert!(o.node_refs().is_empty());
    }

    #[test]
    fn test_loading_node_refs() {
        let force = Loading::NodalForce {
            id: EntityId::user(1),
            nodes: vec![Reference::new(3)],
            force: Vec3::new(0.0, 0.0, -1.0),
            moment: Vec3::ZERO,
            csys: None,
        };
        assert_eq!(vec![Reference::new(3)], force.node_refs());
        assert_eq!("nodal_force", force.label());

        let gravity = Loading::Gravity {
            id: EntityId::user(2),
            acceleration: Vec3::new(0.0, 0.0, -9.81),
        };
        assert!(gravity.node_refs().is_empty());
    }
}
