//! Free-space bookkeeping for a single packing trial.
//!
//! The manager keeps a flat list of axis-aligned boxes that are known to be empty.
//! Placing an item splits every box it touches into up to five slabs (right, left,
//! above, front, behind). Nothing is generated below a placed item, so packing
//! relies on items being placed from the floor upward.
//! After each split, slivers and boxes swallowed by larger ones are pruned.

use crate::geometry::{Spatial, contains, intersects};
use crate::types::{BoundingBox, Vec3};

/// An empty region inside the container.
///
/// Origin plus extents: `l` along x, `h` along y (vertical), `w` along z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FreeSpaceBox {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub l: f64,
    pub h: f64,
    pub w: f64,
}

impl FreeSpaceBox {
    pub const fn new(x: f64, y: f64, z: f64, l: f64, h: f64, w: f64) -> Self {
        Self { x, y, z, l, h, w }
    }

    /// Builds a box from a corner and extents in axis order.
    pub fn from_corner(origin: Vec3, extent: Vec3) -> Self {
        Self::new(origin.x, origin.y, origin.z, extent.x, extent.y, extent.z)
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Smallest of the three extents.
    #[inline]
    fn min_extent(&self) -> f64 {
        self.l.min(self.h).min(self.w)
    }
}

impl Spatial for FreeSpaceBox {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.origin(), Vec3::new(self.l, self.h, self.w))
    }
}

/// Replaces every box touched by `placed` with the slabs around it.
///
/// Boxes that do not intersect `placed` are carried over unchanged. A slab is only
/// emitted if it has positive extent on the axis it was cut along.
pub fn split(free_spaces: &[FreeSpaceBox], placed: &FreeSpaceBox) -> Vec<FreeSpaceBox> {
    let mut result = Vec::with_capacity(free_spaces.len() + 4);

    for space in free_spaces {
        if !intersects(space, placed) {
            result.push(*space);
            continue;
        }

        let space_right = space.x + space.l;
        let placed_right = placed.x + placed.l;
        if space_right > placed_right {
            result.push(FreeSpaceBox::new(
                placed_right,
                space.y,
                space.z,
                space_right - placed_right,
                space.h,
                space.w,
            ));
        }

        if placed.x > space.x {
            result.push(FreeSpaceBox::new(
                space.x,
                space.y,
                space.z,
                placed.x - space.x,
                space.h,
                space.w,
            ));
        }

        let space_top = space.y + space.h;
        let placed_top = placed.y + placed.h;
        if space_top > placed_top {
            result.push(FreeSpaceBox::new(
                space.x,
                placed_top,
                space.z,
                space.l,
                space_top - placed_top,
                space.w,
            ));
        }

        let space_front = space.z + space.w;
        let placed_front = placed.z + placed.w;
        if space_front > placed_front {
            result.push(FreeSpaceBox::new(
                space.x,
                space.y,
                placed_front,
                space.l,
                space.h,
                space_front - placed_front,
            ));
        }

        if placed.z > space.z {
            result.push(FreeSpaceBox::new(
                space.x,
                space.y,
                space.z,
                space.l,
                space.h,
                placed.z - space.z,
            ));
        }
    }

    result
}

/// Drops slivers thinner than `min_extent` and boxes contained in another box.
///
/// Of two identical boxes, the one earlier in the list survives.
pub fn cleanup(boxes: Vec<FreeSpaceBox>, min_extent: f64) -> Vec<FreeSpaceBox> {
    let candidates: Vec<FreeSpaceBox> = boxes
        .into_iter()
        .filter(|b| b.min_extent() >= min_extent)
        .collect();

    candidates
        .iter()
        .enumerate()
        .filter(|&(i, inner)| {
            !candidates.iter().enumerate().any(|(j, outer)| {
                if i == j || !contains(outer, inner) {
                    return false;
                }
                // Mutual containment means duplicates: keep the first one.
                !contains(inner, outer) || j < i
            })
        })
        .map(|(_, b)| *b)
        .collect()
}

/// Owns the free-space list of one trial.
#[derive(Clone, Debug)]
pub struct FreeSpaceManager {
    spaces: Vec<FreeSpaceBox>,
    min_extent: f64,
}

impl FreeSpaceManager {
    /// Starts with a single box spanning the whole container.
    pub fn new(container_extent: Vec3, min_extent: f64) -> Self {
        Self {
            spaces: vec![FreeSpaceBox::from_corner(Vec3::zero(), container_extent)],
            min_extent,
        }
    }

    /// Current free spaces in list order.
    pub fn spaces(&self) -> &[FreeSpaceBox] {
        &self.spaces
    }

    /// Records a placement: split, then prune.
    pub fn occupy(&mut self, placed: &FreeSpaceBox) {
        let fragments = split(&self.spaces, placed);
        self.spaces = cleanup(fragments, self.min_extent);
    }
}
