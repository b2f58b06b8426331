//! Geometric primitives for collision detection and free-space bookkeeping.
//!
//! All tests work on axis-aligned boxes given as minimum corner plus extents.
//! Intersection uses open intervals, containment uses closed intervals.

use crate::types::BoundingBox;

/// Anything that occupies an axis-aligned region of space.
pub trait Spatial {
    /// Returns the axis-aligned bounding box of the object.
    fn bounding_box(&self) -> BoundingBox;
}

impl Spatial for BoundingBox {
    #[inline]
    fn bounding_box(&self) -> BoundingBox {
        *self
    }
}

/// Checks whether two objects overlap in space.
///
/// Two boxes overlap only if their open intervals overlap on every axis,
/// so boxes that share a face are not intersecting.
///
/// # Examples
/// ```
/// use load_planner::geometry::intersects;
/// use load_planner::types::{BoundingBox, Vec3};
///
/// let a = BoundingBox::new(Vec3::zero(), Vec3::new(10.0, 10.0, 10.0));
/// let b = BoundingBox::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
/// assert!(!intersects(&a, &b));
/// ```
pub fn intersects(a: &impl Spatial, b: &impl Spatial) -> bool {
    a.bounding_box().intersects(&b.bounding_box())
}

/// Like [`intersects`], but penetrations up to `eps` on an axis are tolerated.
pub fn intersects_with_tolerance(a: &impl Spatial, b: &impl Spatial, eps: f64) -> bool {
    a.bounding_box()
        .intersects_with_tolerance(&b.bounding_box(), eps)
}

/// Checks whether `outer` closes over `inner` on all six faces.
pub fn contains(outer: &impl Spatial, inner: &impl Spatial) -> bool {
    outer.bounding_box().contains(&inner.bounding_box())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    fn boxed(pos: (f64, f64, f64), ext: (f64, f64, f64)) -> BoundingBox {
        BoundingBox::new(Vec3::from(pos), Vec3::from(ext))
    }

    #[test]
    fn separated_on_one_axis_is_enough() {
        let a = boxed((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let b = boxed((5.0, 5.0, 11.0), (10.0, 10.0, 10.0));
        assert!(!intersects(&a, &b));
    }

    #[test]
    fn flush_at_origin_counts_as_touching() {
        let wall = boxed((-10.0, 0.0, 0.0), (10.0, 100.0, 100.0));
        let item = boxed((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        assert!(!intersects(&wall, &item));
        assert!(!intersects_with_tolerance(&wall, &item, 1e-3));
    }

    #[test]
    fn identical_boxes_contain_each_other() {
        let a = boxed((1.0, 2.0, 3.0), (4.0, 5.0, 6.0));
        assert!(contains(&a, &a));
        assert!(intersects(&a, &a));
    }

    #[test]
    fn partial_overlap_is_not_containment() {
        let outer = boxed((0.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        let inner = boxed((5.0, 0.0, 0.0), (10.0, 10.0, 10.0));
        assert!(intersects(&outer, &inner));
        assert!(!contains(&outer, &inner));
    }
}
