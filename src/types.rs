//! Common types and traits for 3D geometry.
//!
//! Axis convention used throughout the crate: X runs along the container length,
//! Y is vertical (height) and Z runs along the container width.

use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Global numerical tolerance for floating-point comparisons.
///
/// Used when checking whether an item fits into a free space.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Tolerance used by the interactive collision check.
///
/// Overlaps thinner than this are treated as touching faces.
pub const EPSILON_COLLISION: f64 = 1e-3;

/// Represents a 3D vector or point in space.
///
/// Used for positions and intermediate calculations.
///
/// # Examples
/// ```
/// use load_planner::types::Vec3;
///
/// let position = Vec3::new(1.0, 2.0, 3.0);
/// let extents = Vec3::new(10.0, 20.0, 30.0);
/// let center = position + extents * 0.5;
/// assert_eq!(center, Vec3::new(6.0, 12.0, 18.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - X component (length axis)
    /// * `y` - Y component (vertical axis)
    /// * `z` - Z component (width axis)
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Returns `true` if no component is negative.
    #[inline]
    pub fn is_non_negative(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.z >= 0.0
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }
}

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// `extent` is stored in axis order: x = length, y = height, z = width.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Extents along x, y and z
    pub extent: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from its minimum corner and extents.
    #[inline]
    pub const fn new(min: Vec3, extent: Vec3) -> Self {
        Self { min, extent }
    }

    /// Maximum corner (min + extent).
    #[inline]
    pub fn max(&self) -> Vec3 {
        self.min + self.extent
    }

    /// Open-interval overlap test on all three axes.
    ///
    /// Boxes that only share a face do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.intersects_with_tolerance(other, 0.0)
    }

    /// Overlap test that ignores penetrations of at most `eps` on any axis.
    #[inline]
    pub fn intersects_with_tolerance(&self, other: &Self, eps: f64) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        self.min.x < b_max.x - eps
            && a_max.x > other.min.x + eps
            && self.min.y < b_max.y - eps
            && a_max.y > other.min.y + eps
            && self.min.z < b_max.z - eps
            && a_max.z > other.min.z + eps
    }

    /// Inclusive containment: `self` closes over `inner` on all six faces.
    #[inline]
    pub fn contains(&self, inner: &Self) -> bool {
        let (a_max, b_max) = (self.max(), inner.max());
        self.min.x <= inner.min.x
            && a_max.x >= b_max.x
            && self.min.y <= inner.min.y
            && a_max.y >= b_max.y
            && self.min.z <= inner.min.z
            && a_max.z >= b_max.z
    }

    /// Returns the center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.min + self.extent * 0.5
    }
}

/// Center of mass calculation helper.
///
/// Accumulates weighted positions for center of mass calculation.
#[derive(Clone, Debug, Default)]
pub struct CenterOfMassCalculator {
    weighted: Vec3,
    total_weight: f64,
}

impl CenterOfMassCalculator {
    /// Creates a new calculator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a weighted point.
    pub fn add_point(&mut self, point: Vec3, weight: f64) {
        self.weighted = self.weighted + point * weight;
        self.total_weight += weight;
    }

    /// Calculates the center of mass.
    ///
    /// # Returns
    /// `Some(center)` for a valid center of mass, `None` if no weight was added
    pub fn compute(&self) -> Option<Vec3> {
        if self.total_weight <= 0.0 {
            None
        } else {
            Some(self.weighted * (1.0 / self.total_weight))
        }
    }

    /// Total accumulated weight.
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }
}
