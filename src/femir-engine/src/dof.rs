// Copyright 2026 The Femir Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops;

use float_cmp::approx_eq;

use crate::common::{Error, ErrorCode, ErrorKind, Result};

/// One degree of freedom of a node: three translations, three rotations.
///
/// The declaration order is the canonical order everywhere: bit positions,
/// digit names, coefficient slots and global numbering all follow it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Dof {
    Dx,
    Dy,
    Dz,
    Rx,
    Ry,
    Rz,
}

impl Dof {
    pub const ALL: [Dof; 6] = [Dof::Dx, Dof::Dy, Dof::Dz, Dof::Rx, Dof::Ry, Dof::Rz];

    /// Canonical position, 0 through 5.
    pub fn position(&self) -> u8 {
        match self {
            Dof::Dx => 0,
            Dof::Dy => 1,
            Dof::Dz => 2,
            Dof::Rx => 3,
            Dof::Ry => 4,
            Dof::Rz => 5,
        }
    }

    /// Single-bit mask, `1 << position`.
    pub fn code(&self) -> u8 {
        1 << self.position()
    }

    /// Solver-deck digit, 1 through 6.
    pub fn digit(&self) -> u8 {
        self.position() + 1
    }

    pub fn from_position(position: u8) -> Option<Dof> {
        Dof::ALL.get(position as usize).copied()
    }

    pub fn from_code(code: u8) -> Option<Dof> {
        if code.count_ones() != 1 {
            return None;
        }
        Dof::from_position(code.trailing_zeros() as u8)
    }

    pub fn from_digit(digit: u8) -> Option<Dof> {
        if digit == 0 {
            return None;
        }
        Dof::from_position(digit - 1)
    }

    pub fn from_name(name: &str) -> Option<Dof> {
        match name {
            "DX" => Some(Dof::Dx),
            "DY" => Some(Dof::Dy),
            "DZ" => Some(Dof::Dz),
            "RX" => Some(Dof::Rx),
            "RY" => Some(Dof::Ry),
            "RZ" => Some(Dof::Rz),
            _ => None,
        }
    }

    pub fn is_translation(&self) -> bool {
        self.position() < 3
    }

    pub fn is_rotation(&self) -> bool {
        !self.is_translation()
    }
}

impl fmt::Display for Dof {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Dof::Dx => "DX",
            Dof::Dy => "DY",
            Dof::Dz => "DZ",
            Dof::Rx => "RX",
            Dof::Ry => "RY",
            Dof::Rz => "RZ",
        };
        write!(f, "{name}")
    }
}

/// A set of degrees of freedom, packed into the low six bits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Dofs(u8);

impl Dofs {
    pub const NONE: Dofs = Dofs(0);
    pub const ALL: Dofs = Dofs(0b0011_1111);
    pub const TRANSLATIONS: Dofs = Dofs(0b0000_0111);
    pub const ROTATIONS: Dofs = Dofs(0b0011_1000);

    pub fn contains(&self, dof: Dof) -> bool {
        self.0 & dof.code() != 0
    }

    pub fn is_subset_of(&self, other: &Dofs) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn insert(&mut self, dof: Dof) {
        self.0 |= dof.code();
    }

    pub fn remove(&mut self, dof: Dof) {
        self.0 &= !dof.code();
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Dof> + '_ {
        Dof::ALL.iter().copied().filter(|d| self.contains(*d))
    }

    /// Parse the solver-deck digit form, e.g. `"123456"` or `"35"`.
    ///
    /// The empty string is the empty set.  Digit order and repetition don't
    /// matter; anything outside `1`..`6` is rejected.
    pub fn from_digits(digits: &str) -> Option<Dofs> {
        let mut dofs = Dofs::NONE;
        for c in digits.chars() {
            let digit = c.to_digit(10)?;
            dofs.insert(Dof::from_digit(digit as u8)?);
        }
        Some(dofs)
    }

    /// Ascending digit form; the empty set prints as the empty string.
    pub fn to_digits(&self) -> String {
        self.iter().map(|d| d.digit().to_string()).collect()
    }
}

impl ops::BitOr for Dofs {
    type Output = Dofs;
    fn bitor(self, rhs: Dofs) -> Dofs {
        Dofs(self.0 | rhs.0)
    }
}

impl ops::BitAnd for Dofs {
    type Output = Dofs;
    fn bitand(self, rhs: Dofs) -> Dofs {
        Dofs(self.0 & rhs.0)
    }
}

impl ops::Not for Dofs {
    type Output = Dofs;
    fn not(self) -> Dofs {
        Dofs(!self.0 & Dofs::ALL.0)
    }
}

impl ops::Sub for Dofs {
    type Output = Dofs;
    fn sub(self, rhs: Dofs) -> Dofs {
        Dofs(self.0 & !rhs.0)
    }
}

impl FromIterator<Dof> for Dofs {
    fn from_iter<I: IntoIterator<Item = Dof>>(iter: I) -> Dofs {
        let mut dofs = Dofs::NONE;
        for dof in iter {
            dofs.insert(dof);
        }
        dofs
    }
}

impl From<Dof> for Dofs {
    fn from(dof: Dof) -> Dofs {
        Dofs(dof.code())
    }
}

impl fmt::Display for Dofs {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_digits())
    }
}

/// One coefficient per degree of freedom, in canonical order.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct DofCoefs([f64; 6]);

impl DofCoefs {
    pub fn new(coefs: [f64; 6]) -> Self {
        DofCoefs(coefs)
    }

    pub fn zero() -> Self {
        DofCoefs([0.0; 6])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|c| *c == 0.0)
    }

    /// The (dof, coefficient) pairs with a nonzero coefficient.
    pub fn nonzero(&self) -> impl Iterator<Item = (Dof, f64)> + '_ {
        Dof::ALL
            .iter()
            .map(|d| (*d, self[*d]))
            .filter(|(_, c)| *c != 0.0)
    }

    pub fn as_array(&self) -> [f64; 6] {
        self.0
    }
}

impl ops::Index<Dof> for DofCoefs {
    type Output = f64;
    fn index(&self, dof: Dof) -> &f64 {
        &self.0[dof.position() as usize]
    }
}

impl ops::IndexMut<Dof> for DofCoefs {
    fn index_mut(&mut self, dof: Dof) -> &mut f64 {
        &mut self.0[dof.position() as usize]
    }
}

impl ops::Add for DofCoefs {
    type Output = DofCoefs;
    fn add(self, rhs: DofCoefs) -> DofCoefs {
        let mut sum = self.0;
        for (i, c) in rhs.0.iter().enumerate() {
            sum[i] += c;
        }
        DofCoefs(sum)
    }
}

impl ops::Mul<f64> for DofCoefs {
    type Output = DofCoefs;
    fn mul(self, rhs: f64) -> DofCoefs {
        DofCoefs(self.0.map(|c| c * rhs))
    }
}

impl From<[f64; 6]> for DofCoefs {
    fn from(coefs: [f64; 6]) -> Self {
        DofCoefs(coefs)
    }
}

/// The owner of a degree of freedom in an assembled system.
///
/// Constraint rows live alongside node rows, so holders carry the owning
/// kind and sort nodes first, then cells, then constraints.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DofHolder {
    Node(u32),
    Cell(u32),
    Constraint(u32),
}

impl fmt::Display for DofHolder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DofHolder::Node(n) => write!(f, "node #{n}"),
            DofHolder::Cell(n) => write!(f, "cell #{n}"),
            DofHolder::Constraint(n) => write!(f, "constraint #{n}"),
        }
    }
}

/// A single (holder, dof) coordinate of the assembled system.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DofKey {
    pub holder: DofHolder,
    pub dof: Dof,
}

impl DofKey {
    pub fn new(holder: DofHolder, dof: Dof) -> Self {
        DofKey { holder, dof }
    }
}

impl fmt::Display for DofKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.holder, self.dof)
    }
}

/// Sparse pair-keyed coefficient matrix for multi-point constraints.
///
/// Entries are exactly what the caller sets: `(a, b)` and `(b, a)` are
/// distinct slots and neither implies the other.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct DofMatrix {
    coefs: BTreeMap<(DofKey, DofKey), f64>,
}

impl DofMatrix {
    pub fn new() -> Self {
        DofMatrix {
            coefs: BTreeMap::new(),
        }
    }

    /// Record a coefficient, rejecting contradictory re-insertion.
    ///
    /// Setting a slot that already holds the same value (to within floating
    /// point noise) is a no-op; a different value is a `DofConflict`.
    pub fn set(&mut self, row: DofKey, col: DofKey, coef: f64) -> Result<()> {
        if let Some(existing) = self.coefs.get(&(row, col)) {
            if approx_eq!(f64, *existing, coef, ulps = 4) {
                return Ok(());
            }
            return Err(Error::new(
                ErrorKind::Model,
                ErrorCode::DofConflict,
                Some(format!("({row}, {col}): {existing} vs {coef}")),
            ));
        }
        self.coefs.insert((row, col), coef);
        Ok(())
    }

    pub fn get(&self, row: DofKey, col: DofKey) -> Option<f64> {
        self.coefs.get(&(row, col)).copied()
    }

    /// Entries in (row, col) order.
    pub fn iter(&self) -> impl Iterator<Item = (DofKey, DofKey, f64)> + '_ {
        self.coefs.iter().map(|((r, c), v)| (*r, *c, *v))
    }

    pub fn len(&self) -> usize {
        self.coefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefs.is_empty()
    }
}

/// Zero-based global equation numbers for the free node DOFs.
///
/// Numbers are dense and sequential: nodes in container order, and within a
/// node its DOFs in canonical order, skipping the DOFs a node doesn't carry.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct DofNumbering {
    order: Vec<(u32, Dof)>,
    index: HashMap<(u32, Dof), usize>,
}

impl DofNumbering {
    pub fn assign(nodes: impl Iterator<Item = (u32, Dofs)>) -> Self {
        let mut order = Vec::new();
        let mut index = HashMap::new();
        for (node, dofs) in nodes {
            for dof in dofs.iter() {
                index.insert((node, dof), order.len());
                order.push((node, dof));
            }
        }
        DofNumbering { order, index }
    }

    pub fn get(&self, node: u32, dof: Dof) -> Option<usize> {
        self.index.get(&(node, dof)).copied()
    }

    /// (node, dof) pairs in equation-number order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Dof)> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dof_codes_and_digits() {
        assert_eq!(1, Dof::Dx.code());
        assert_eq!(2, Dof::Dy.code());
        assert_eq!(4, Dof::Dz.code());
        assert_eq!(8, Dof::Rx.code());
        assert_eq!(16, Dof::Ry.code());
        assert_eq!(32, Dof::Rz.code());

        for dof in Dof::ALL {
            assert_eq!(Some(dof), Dof::from_position(dof.position()));
            assert_eq!(Some(dof), Dof::from_code(dof.code()));
            assert_eq!(Some(dof), Dof::from_digit(dof.digit()));
        }
        assert_eq!(None, Dof::from_position(6));
        assert_eq!(None, Dof::from_code(3));
        assert_eq!(None, Dof::from_code(64));
        assert_eq!(None, Dof::from_digit(0));
        assert_eq!(None, Dof::from_digit(7));
    }

    #[test]
    fn test_translation_rotation_split() {
        assert!(Dof::Dx.is_translation());
        assert!(Dof::Dz.is_translation());
        assert!(Dof::Rx.is_rotation());
        assert!(Dof::Rz.is_rotation());
        assert_eq!("DX", Dof::Dx.to_string());
        assert_eq!("RZ", Dof::Rz.to_string());
    }

    #[test]
    fn test_dofs_set_operations() {
        let a = Dofs::from_digits("12").unwrap();
        let b = Dofs::from_digits("23").unwrap();

        assert_eq!(Dofs::from_digits("123").unwrap(), a | b);
        assert_eq!(Dofs::from_digits("2").unwrap(), a & b);
        assert_eq!(Dofs::from_digits("1").unwrap(), a - b);
        assert_eq!(Dofs::from_digits("3456").unwrap(), !a);
        assert_eq!(Dofs::NONE, !Dofs::ALL);

        assert!(a.is_subset_of(&Dofs::ALL));
        assert!(a.is_subset_of(&a));
        assert!(!a.is_subset_of(&b));
        assert!(Dofs::NONE.is_subset_of(&a));

        assert_eq!(3, Dofs::TRANSLATIONS.len());
        assert_eq!(Dofs::ALL, Dofs::TRANSLATIONS | Dofs::ROTATIONS);
        assert_eq!(Dofs::NONE, Dofs::TRANSLATIONS & Dofs::ROTATIONS);
    }

    #[test]
    fn test_digit_form() {
        assert_eq!(Some(Dofs::ALL), Dofs::from_digits("123456"));
        assert_eq!(Some(Dofs::NONE), Dofs::from_digits(""));
        // order and repetition are immaterial
        assert_eq!(Dofs::from_digits("135"), Dofs::from_digits("531"));
        assert_eq!(Dofs::from_digits("11"), Dofs::from_digits("1"));
        assert_eq!(None, Dofs::from_digits("127"));
        assert_eq!(None, Dofs::from_digits("0"));
        assert_eq!(None, Dofs::from_digits("1 3"));

        assert_eq!("135", Dofs::from_digits("531").unwrap().to_digits());
        assert_eq!("", Dofs::NONE.to_digits());
        assert_eq!("123456", Dofs::ALL.to_string());
    }

    #[test]
    fn test_dofs_total_order_is_deterministic() {
        let mut sets = vec![
            Dofs::ALL,
            Dofs::NONE,
            Dofs::from_digits("2").unwrap(),
            Dofs::from_digits("16").unwrap(),
        ];
        sets.sort();
        assert_eq!(
            vec![
                Dofs::NONE,
                Dofs::from_digits("2").unwrap(),
                Dofs::from_digits("16").unwrap(),
                Dofs::ALL,
            ],
            sets
        );
    }

    #[test]
    fn test_coefs_indexing_and_arithmetic() {
        let mut c = DofCoefs::zero();
        assert!(c.is_zero());
        c[Dof::Dy] = 2.0;
        c[Dof::Rz] = -1.0;
        assert_eq!(2.0, c[Dof::Dy]);
        assert_eq!(0.0, c[Dof::Dx]);

        let doubled = c * 2.0;
        assert_eq!(4.0, doubled[Dof::Dy]);

        let sum = c + DofCoefs::new([1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
        assert_eq!(1.0, sum[Dof::Dx]);
        assert_eq!(2.0, sum[Dof::Dy]);
        assert_eq!(0.0, sum[Dof::Rz]);

        let nonzero: Vec<(Dof, f64)> = c.nonzero().collect();
        assert_eq!(vec![(Dof::Dy, 2.0), (Dof::Rz, -1.0)], nonzero);
    }

    #[test]
    fn test_matrix_is_not_symmetrized() {
        let mut m = DofMatrix::new();
        let a = DofKey::new(DofHolder::Node(1), Dof::Dx);
        let b = DofKey::new(DofHolder::Node(2), Dof::Dy);

        m.set(a, b, 1.5).unwrap();
        assert_eq!(Some(1.5), m.get(a, b));
        assert_eq!(None, m.get(b, a));
        assert_eq!(1, m.len());
    }

    #[test]
    fn test_matrix_conflict_detection() {
        let mut m = DofMatrix::new();
        let row = DofKey::new(DofHolder::Constraint(7), Dof::Dx);
        let col = DofKey::new(DofHolder::Node(3), Dof::Dx);

        m.set(row, col, 1.0).unwrap();
        // re-stating the same coefficient is fine
        m.set(row, col, 1.0).unwrap();

        let err = m.set(row, col, 2.0).unwrap_err();
        assert_eq!(ErrorCode::DofConflict, err.code);
        assert_eq!(Some(1.0), m.get(row, col));
    }

    #[test]
    fn test_holder_ordering() {
        let mut keys = vec![
            DofKey::new(DofHolder::Constraint(1), Dof::Dx),
            DofKey::new(DofHolder::Node(9), Dof::Dx),
            DofKey::new(DofHolder::Cell(1), Dof::Dx),
            DofKey::new(DofHolder::Node(2), Dof::Rz),
            DofKey::new(DofHolder::Node(2), Dof::Dy),
        ];
        keys.sort();
        assert_eq!(
            vec![
                DofKey::new(DofHolder::Node(2), Dof::Dy),
                DofKey::new(DofHolder::Node(2), Dof::Rz),
                DofKey::new(DofHolder::Node(9), Dof::Dx),
                DofKey::new(DofHolder::Cell(1), Dof::Dx),
                DofKey::new(DofHolder::Constraint(1), Dof::Dx),
            ],
            keys
        );
        assert_eq!("node #2.DY", keys[0].to_string());
        assert_eq!("constraint #1.DX", keys[4].to_string());
    }

    #[test]
    fn test_numbering_skips_absent_dofs() {
        let nodes = vec![
            (10, Dofs::TRANSLATIONS),
            (4, Dofs::NONE),
            (7, Dofs::from_digits("26").unwrap()),
        ];
        let numbering = DofNumbering::assign(nodes.into_iter());

        assert_eq!(5, numbering.len());
        assert_eq!(Some(0), numbering.get(10, Dof::Dx));
        assert_eq!(Some(1), numbering.get(10, Dof::Dy));
        assert_eq!(Some(2), numbering.get(10, Dof::Dz));
        assert_eq!(Some(3), numbering.get(7, Dof::Dy));
        assert_eq!(Some(4), numbering.get(7, Dof::Rz));
        assert_eq!(None, numbering.get(10, Dof::Rx));
        assert_eq!(None, numbering.get(4, Dof::Dx));
        assert_eq!(None, numbering.get(99, Dof::Dx));

        let order: Vec<(u32, Dof)> = numbering.iter().collect();
        assert_eq!((10, Dof::Dx), order[0]);
        assert_eq!((7, Dof::Rz), order[4]);
    }
}
