// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

#![forbid(unsafe_code)]

pub mod common;
mod container;
pub mod csys;
pub mod datamodel;
mod dof;
mod family;
mod geometry;
mod ident;
pub mod json;
mod mesh;
mod model;

#[cfg(test)]
mod dof_proptest;
#[cfg(test)]
mod family_proptest;

pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::container::Container;
pub use self::dof::{Dof, DofCoefs, DofHolder, DofKey, DofMatrix, DofNumbering, Dofs};
pub use self::family::{Family, FamilyPartition};
pub use self::geometry::Vec3;
pub use self::ident::{Entity, EntityId, EntityKind, Reference};
pub use self::mesh::{
    Cell, CellContainer, CellKind, Connectivity, Group, Groups, Mesh, Node, NodeContainer,
};
pub use self::model::{DofAssembly, FinalizedModel, Model, RejectedModel};
