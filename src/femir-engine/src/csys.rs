// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Coordinate frames and their resolution against the global frame.
//!
//! Declarations are kept exactly as authored; orthonormalization and base
//! chain composition happen at resolution time, so a transform always
//! reflects the current contents of the storage.

use std::collections::BTreeSet;

use crate::common::{Error, ErrorCode, ErrorKind, Result};
use crate::container::Container;
use crate::geometry::Vec3;
use crate::ident::{Entity, EntityId, EntityKind, Reference};

/// A user-declared coordinate system.
///
/// The defining vectors are expressed in the `base` frame when one is named,
/// otherwise directly in the global frame.
#[derive(Clone, PartialEq, Debug)]
pub struct CoordinateSystem {
    pub id: EntityId,
    pub base: Option<Reference<CoordinateSystem>>,
    pub spec: CsysSpec,
}

/// The three declaration shapes a frame can take.
///
/// Cartesian and orientation frames resolve to the same rectangular
/// transform; the distinction is kept because writers reproduce the authored
/// form.  In-plane vectors don't have to be orthogonal to the primary axis,
/// only non-parallel.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum CsysSpec {
    Cartesian { origin: Vec3, ex: Vec3, ey: Vec3 },
    Cylindrical { origin: Vec3, ex: Vec3, ey: Vec3 },
    Orientation { origin: Vec3, ex: Vec3, v: Vec3 },
}

impl CoordinateSystem {
    pub fn cartesian(id: EntityId, origin: Vec3, ex: Vec3, ey: Vec3) -> Self {
        CoordinateSystem {
            id,
            base: None,
            spec: CsysSpec::Cartesian { origin, ex, ey },
        }
    }

    pub fn cylindrical(id: EntityId, origin: Vec3, ex: Vec3, ey: Vec3) -> Self {
        CoordinateSystem {
            id,
            base: None,
            spec: CsysSpec::Cylindrical { origin, ex, ey },
        }
    }

    pub fn orientation(id: EntityId, origin: Vec3, ex: Vec3, v: Vec3) -> Self {
        CoordinateSystem {
            id,
            base: None,
            spec: CsysSpec::Orientation { origin, ex, v },
        }
    }

    pub fn with_base(mut self, base: Reference<CoordinateSystem>) -> Self {
        self.base = Some(base);
        self
    }
}

impl Entity for CoordinateSystem {
    const KIND: EntityKind = EntityKind::CoordinateSystem;

    fn id(&self) -> EntityId {
        self.id
    }
}

/// An origin and right-handed orthonormal basis in global coordinates.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Frame {
    pub origin: Vec3,
    pub ex: Vec3,
    pub ey: Vec3,
    pub ez: Vec3,
}

impl Frame {
    pub const GLOBAL: Frame = Frame {
        origin: Vec3::ZERO,
        ex: Vec3::new(1.0, 0.0, 0.0),
        ey: Vec3::new(0.0, 1.0, 0.0),
        ez: Vec3::new(0.0, 0.0, 1.0),
    };

    /// Full affine transform of a point.
    pub fn point_to_global(&self, local: Vec3) -> Vec3 {
        self.origin + self.vector_to_global(local)
    }

    /// Linear part only; the origin plays no role.
    pub fn vector_to_global(&self, local: Vec3) -> Vec3 {
        self.ex * local.x + self.ey * local.y + self.ez * local.z
    }
}

/// A coordinate system resolved through its whole base chain.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ResolvedCsys {
    Rectangular(Frame),
    Cylindrical(Frame),
}

impl ResolvedCsys {
    pub fn frame(&self) -> &Frame {
        match self {
            ResolvedCsys::Rectangular(frame) | ResolvedCsys::Cylindrical(frame) => frame,
        }
    }

    pub fn is_cylindrical(&self) -> bool {
        matches!(self, ResolvedCsys::Cylindrical(_))
    }

    /// Global position of a point given in local coordinates.
    ///
    /// Cylindrical local coordinates are (r, θ in degrees, z).
    pub fn position_to_global(&self, local: Vec3) -> Vec3 {
        match self {
            ResolvedCsys::Rectangular(frame) => frame.point_to_global(local),
            ResolvedCsys::Cylindrical(frame) => {
                let theta = local.y.to_radians();
                frame.origin
                    + frame.ex * (local.x * theta.cos())
                    + frame.ey * (local.x * theta.sin())
                    + frame.ez * local.z
            }
        }
    }

    /// Global components of a vector given in local components.
    ///
    /// The cylindrical basis is position-dependent, so the global point the
    /// vector is attached to comes along; rectangular frames ignore it.  On
    /// the axis, where the radial direction is undefined, the declared
    /// reference directions stand in.
    pub fn vector_to_global(&self, local: Vec3, at: Vec3) -> Vec3 {
        match self {
            ResolvedCsys::Rectangular(frame) => frame.vector_to_global(local),
            ResolvedCsys::Cylindrical(frame) => {
                let axis = frame.ez;
                let (ur, utheta) = match axis.cross(&(at - frame.origin)).normalize() {
                    Some(utheta) => (utheta.cross(&axis), utheta),
                    None => (frame.ex, frame.ey),
                };
                ur * local.x + utheta * local.y + axis * local.z
            }
        }
    }
}

fn unresolved(number: u32) -> Error {
    Error::new(
        ErrorKind::Validation,
        ErrorCode::UnresolvedFrame,
        Some(format!("coordinate_system #{number}")),
    )
}

fn cyclic(number: u32) -> Error {
    Error::new(
        ErrorKind::Validation,
        ErrorCode::CyclicFrame,
        Some(format!("coordinate_system #{number} is on its own base chain")),
    )
}

fn degenerate(number: u32, why: &str) -> Error {
    Error::new(
        ErrorKind::Validation,
        ErrorCode::DegenerateFrame,
        Some(format!("coordinate_system #{number}: {why}")),
    )
}

/// Normalized primary axis plus an in-plane vector straightened against it.
fn basis(number: u32, ex: Vec3, in_plane: Vec3) -> Result<(Vec3, Vec3, Vec3)> {
    let ex = ex
        .normalize()
        .ok_or_else(|| degenerate(number, "primary axis is zero"))?;
    let ey = (in_plane - ex * in_plane.dot(&ex))
        .normalize()
        .ok_or_else(|| degenerate(number, "in-plane vector is parallel to the primary axis"))?;
    let ez = ex.cross(&ey);
    Ok((ex, ey, ez))
}

/// Resolve a frame reference, composing through its base chain.
pub fn resolve(
    storage: &Container<CoordinateSystem>,
    reference: Reference<CoordinateSystem>,
) -> Result<ResolvedCsys> {
    let mut on_path = BTreeSet::new();
    resolve_inner(storage, reference, &mut on_path)
}

fn resolve_inner(
    storage: &Container<CoordinateSystem>,
    reference: Reference<CoordinateSystem>,
    on_path: &mut BTreeSet<u32>,
) -> Result<ResolvedCsys> {
    let number = reference.number();
    if !on_path.insert(number) {
        return Err(cyclic(number));
    }
    let cs = storage.get(number).ok_or_else(|| unresolved(number))?;
    let base = match cs.base {
        Some(base_ref) => *resolve_inner(storage, base_ref, on_path)?.frame(),
        None => Frame::GLOBAL,
    };
    let (origin, ex, in_plane) = match cs.spec {
        CsysSpec::Cartesian { origin, ex, ey } => (origin, ex, ey),
        CsysSpec::Cylindrical { origin, ex, ey } => (origin, ex, ey),
        CsysSpec::Orientation { origin, ex, v } => (origin, ex, v),
    };
    let (ex, ey, ez) = basis(number, ex, in_plane)?;
    let frame = Frame {
        origin: base.point_to_global(origin),
        ex: base.vector_to_global(ex),
        ey: base.vector_to_global(ey),
        ez: base.vector_to_global(ez),
    };
    Ok(match cs.spec {
        CsysSpec::Cylindrical { .. } => ResolvedCsys::Cylindrical(frame),
        _ => ResolvedCsys::Rectangular(frame),
    })
}

/// Resolve `reference` and carry one local position to global coordinates.
pub fn position_to_global(
    storage: &Container<CoordinateSystem>,
    reference: Reference<CoordinateSystem>,
    local: Vec3,
) -> Result<Vec3> {
    Ok(resolve(storage, reference)?.position_to_global(local))
}

/// Resolve `reference` and carry one local vector, attached at the global
/// point `at`, to global components.
pub fn vector_to_global(
    storage: &Container<CoordinateSystem>,
    reference: Reference<CoordinateSystem>,
    local: Vec3,
    at: Vec3,
) -> Result<Vec3> {
    Ok(resolve(storage, reference)?.vector_to_global(local, at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn assert_vec3_eq(expected: Vec3, actual: Vec3) {
        let ok = approx_eq!(f64, expected.x, actual.x, epsilon = 1e-9)
            && approx_eq!(f64, expected.y, actual.y, epsilon = 1e-9)
            && approx_eq!(f64, expected.z, actual.z, epsilon = 1e-9);
        assert!(ok, "expected {expected}, got {actual}");
    }

    fn storage(systems: Vec<CoordinateSystem>) -> Container<CoordinateSystem> {
        let mut storage = Container::new();
        for cs in systems {
            storage.insert(cs).unwrap();
        }
        storage
    }

    #[test]
    fn test_unit_cartesian_is_identity() {
        let storage = storage(vec![CoordinateSystem::cartesian(
            EntityId::user(1),
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )]);
        let resolved = resolve(&storage, Reference::new(1)).unwrap();

        assert!(!resolved.is_cylindrical());
        assert_eq!(&Frame::GLOBAL, resolved.frame());
        let p = Vec3::new(3.0, -1.0, 2.0);
        assert_vec3_eq(p, resolved.position_to_global(p));
        assert_vec3_eq(p, resolved.vector_to_global(p, Vec3::ZERO));
    }

    #[test]
    fn test_cartesian_translation_and_rotation() {
        // quarter turn about z, origin shifted
        let storage = storage(vec![CoordinateSystem::cartesian(
            EntityId::user(1),
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(-1.0, 0.0, 0.0),
        )]);
        let resolved = resolve(&storage, Reference::new(1)).unwrap();

        assert_vec3_eq(
            Vec3::new(1.0, 3.0, 3.0),
            resolved.position_to_global(Vec3::new(1.0, 0.0, 0.0)),
        );
        // vectors ignore the origin
        assert_vec3_eq(
            Vec3::new(0.0, 1.0, 0.0),
            resolved.vector_to_global(Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO),
        );
        assert_vec3_eq(Vec3::new(0.0, 0.0, 1.0), resolved.frame().ez);
    }

    #[test]
    fn test_skewed_axes_are_straightened() {
        let storage = storage(vec![CoordinateSystem::cartesian(
            EntityId::user(4),
            Vec3::ZERO,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
        )]);
        let frame = *resolve(&storage, Reference::new(4)).unwrap().frame();

        assert_vec3_eq(Vec3::new(1.0, 0.0, 0.0), frame.ex);
        assert_vec3_eq(Vec3::new(0.0, 1.0, 0.0), frame.ey);
        assert_vec3_eq(Vec3::new(0.0, 0.0, 1.0), frame.ez);
    }

    #[test]
    fn test_cylindrical_positions() {
        let storage = storage(vec![CoordinateSystem::cylindrical(
            EntityId::user(2),
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )]);
        let resolved = resolve(&storage, Reference::new(2)).unwrap();

        assert!(resolved.is_cylindrical());
        // (r, theta in degrees, z)
        assert_vec3_eq(
            Vec3::new(2.0, 0.0, 0.0),
            resolved.position_to_global(Vec3::new(2.0, 0.0, 0.0)),
        );
        assert_vec3_eq(
            Vec3::new(0.0, 2.0, 5.0),
            resolved.position_to_global(Vec3::new(2.0, 90.0, 5.0)),
        );
        assert_vec3_eq(
            Vec3::new(1.0, 1.0, 0.0),
            resolved.position_to_global(Vec3::new(std::f64::consts::SQRT_2, 45.0, 0.0)),
        );
        assert_vec3_eq(
            Vec3::new(-3.0, 0.0, 1.0),
            resolved.position_to_global(Vec3::new(3.0, 180.0, 1.0)),
        );
    }

    #[test]
    fn test_cylindrical_vectors_use_the_basis_at_the_point() {
        let storage = storage(vec![CoordinateSystem::cylindrical(
            EntityId::user(2),
            Vec3::ZERO,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )]);
        let resolved = resolve(&storage, Reference::new(2)).unwrap();

        // at theta = 90 the radial direction is +y, tangential is -x
        let at = Vec3::new(0.0, 3.0, 0.0);
        assert_vec3_eq(
            Vec3::new(0.0, 1.0, 0.0),
            resolved.vector_to_global(Vec3::new(1.0, 0.0, 0.0), at),
        );
        assert_vec3_eq(
            Vec3::new(-1.0, 0.0, 0.0),
            resolved.vector_to_global(Vec3::new(0.0, 1.0, 0.0), at),
        );
        // the axial component is position-independent
        assert_vec3_eq(
            Vec3::new(0.0, 0.0, 2.0),
            resolved.vector_to_global(Vec3::new(0.0, 0.0, 2.0), at),
        );
        // on the axis the declared directions stand in
        assert_vec3_eq(
            Vec3::new(1.0, 0.0, 0.0),
            resolved.vector_to_global(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0)),
        );
    }

    #[test]
    fn test_orientation_frame() {
        let storage = storage(vec![CoordinateSystem::orientation(
            EntityId::user(7),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(1.0, 0.0, 1.0),
        )]);
        let resolved = resolve(&storage, Reference::new(7)).unwrap();
        let frame = resolved.frame();

        assert!(!resolved.is_cylindrical());
        assert_vec3_eq(Vec3::new(0.0, 0.0, 1.0), frame.ex);
        assert_vec3_eq(Vec3::new(1.0, 0.0, 0.0), frame.ey);
        assert_vec3_eq(Vec3::new(0.0, 1.0, 0.0), frame.ez);
        assert_vec3_eq(
            Vec3::new(0.0, 2.0, 1.0),
            resolved.position_to_global(Vec3::new(0.0, 0.0, 2.0)),
        );
    }

    #[test]
    fn test_base_chain_composes() {
        // frame 1: quarter turn about z, shifted along x; frame 2 sits one
        // unit along frame 1's x axis
        let storage = storage(vec![
            CoordinateSystem::cartesian(
                EntityId::user(1),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(-1.0, 0.0, 0.0),
            ),
            CoordinateSystem::cartesian(
                EntityId::user(2),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            )
            .with_base(Reference::new(1)),
        ]);
        let frame = *resolve(&storage, Reference::new(2)).unwrap().frame();

        assert_vec3_eq(Vec3::new(1.0, 1.0, 0.0), frame.origin);
        // frame 2 inherits frame 1's rotation
        assert_vec3_eq(Vec3::new(0.0, 1.0, 0.0), frame.ex);
        assert_vec3_eq(Vec3::new(-1.0, 0.0, 0.0), frame.ey);
        assert_vec3_eq(Vec3::new(0.0, 0.0, 1.0), frame.ez);
        assert_vec3_eq(
            Vec3::new(1.0, 1.0, 1.0),
            resolve(&storage, Reference::new(2))
                .unwrap()
                .position_to_global(Vec3::new(0.0, 0.0, 1.0)),
        );
    }

    #[test]
    fn test_missing_frame_is_unresolved() {
        let storage = storage(vec![
            CoordinateSystem::cartesian(
                EntityId::user(2),
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            )
            .with_base(Reference::new(9)),
        ]);

        let err = resolve(&storage, Reference::new(9)).unwrap_err();
        assert_eq!(ErrorCode::UnresolvedFrame, err.code);

        let err = resolve(&storage, Reference::new(2)).unwrap_err();
        assert_eq!(ErrorCode::UnresolvedFrame, err.code);
        assert_eq!(Some("coordinate_system #9".to_owned()), err.details);
    }

    #[test]
    fn test_cycles_are_detected() {
        let unit_x = Vec3::new(1.0, 0.0, 0.0);
        let unit_y = Vec3::new(0.0, 1.0, 0.0);
        let storage = storage(vec![
            CoordinateSystem::cartesian(EntityId::user(1), Vec3::ZERO, unit_x, unit_y)
                .with_base(Reference::new(1)),
            CoordinateSystem::cartesian(EntityId::user(2), Vec3::ZERO, unit_x, unit_y)
                .with_base(Reference::new(3)),
            CoordinateSystem::cartesian(EntityId::user(3), Vec3::ZERO, unit_x, unit_y)
                .with_base(Reference::new(2)),
        ]);

        // self-reference
        let err = resolve(&storage, Reference::new(1)).unwrap_err();
        assert_eq!(ErrorCode::CyclicFrame, err.code);

        // two-frame loop, entered from either end
        assert_eq!(
            ErrorCode::CyclicFrame,
            resolve(&storage, Reference::new(2)).unwrap_err().code
        );
        assert_eq!(
            ErrorCode::CyclicFrame,
            resolve(&storage, Reference::new(3)).unwrap_err().code
        );
    }

    #[test]
    fn test_degenerate_axes_are_rejected() {
        let storage = storage(vec![
            CoordinateSystem::cartesian(
                EntityId::user(1),
                Vec3::ZERO,
                Vec3::ZERO,
                Vec3::new(0.0, 1.0, 0.0),
            ),
            CoordinateSystem::cartesian(
                EntityId::user(2),
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
            ),
        ]);

        let err = resolve(&storage, Reference::new(1)).unwrap_err();
        assert_eq!(ErrorCode::DegenerateFrame, err.code);

        let err = resolve(&storage, Reference::new(2)).unwrap_err();
        assert_eq!(ErrorCode::DegenerateFrame, err.code);
        assert!(err.details.unwrap().contains("parallel"));
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let storage = storage(vec![CoordinateSystem::cylindrical(
            EntityId::user(5),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        )]);

        let first = resolve(&storage, Reference::new(5)).unwrap();
        let second = resolve(&storage, Reference::new(5)).unwrap();
        assert_eq!(first, second);

        assert_vec3_eq(
            Vec3::new(0.0, 0.0, 2.0),
            position_to_global(&storage, Reference::new(5), Vec3::ZERO).unwrap(),
        );
        assert_vec3_eq(
            Vec3::new(0.0, 1.0, 0.0),
            vector_to_global(
                &storage,
                Reference::new(5),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 5.0, 2.0),
            )
            .unwrap(),
        );
    }
}
