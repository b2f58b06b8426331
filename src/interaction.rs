//! Collision checks and magnetic snapping for manual repositioning.
//!
//! Used while a single item is dragged around. Valid items never overlap.
//! There is no upper-bound check against the container: items may sit in the
//! staging area or be lifted over obstacles.

use crate::geometry::intersects_with_tolerance;
use crate::model::{CargoItem, Dimensions};
use crate::types::{EPSILON_COLLISION, Vec3};

/// Tolerances of the interactive path.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InteractionConfig {
    /// Overlaps up to this depth count as touching
    pub collision_epsilon: f64,
    /// Distance within which a face snaps onto a target
    pub snap_threshold: f64,
}

impl InteractionConfig {
    pub const DEFAULT_COLLISION_EPSILON: f64 = EPSILON_COLLISION;
    pub const DEFAULT_SNAP_THRESHOLD: f64 = 50.0;
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            collision_epsilon: Self::DEFAULT_COLLISION_EPSILON,
            snap_threshold: Self::DEFAULT_SNAP_THRESHOLD,
        }
    }
}

/// Returns `true` if the item is below the origin on any axis or overlaps another item.
///
/// Entries of `others` with the same id as `item` are skipped, so the full item
/// list can be passed.
///
/// Takes no container argument, unlike the planner's original contract: there
/// is no upper-bound check against the container's far faces.
pub fn check_collision(item: &CargoItem, others: &[CargoItem], eps: f64) -> bool {
    if !item.position.is_non_negative() {
        return true;
    }
    others
        .iter()
        .filter(|other| other.id != item.id)
        .any(|other| intersects_with_tolerance(item, other, eps))
}

/// Snaps one coordinate.
///
/// Targets are the origin and, per neighbour, three alignments: our far face on
/// its near face, same near face, our near face on its far face. Every target
/// within `threshold` of `value` replaces the previous result, so the last match
/// wins. Targets that would put the item below zero are skipped.
fn snap_axis(
    value: f64,
    size: f64,
    neighbours: impl Iterator<Item = (f64, f64)>,
    threshold: f64,
) -> f64 {
    let mut snapped = value;
    if value.abs() < threshold {
        snapped = 0.0;
    }

    for (start, len) in neighbours {
        let end = start + len;
        let before = start - size;
        if before >= 0.0 && (value - before).abs() < threshold {
            snapped = before;
        }
        if (value - start).abs() < threshold {
            snapped = start;
        }
        if (value - end).abs() < threshold {
            snapped = end;
        }
    }

    snapped
}

/// Magnetic alignment of a candidate corner position.
///
/// Each axis is snapped independently. `others` is visited in the given order
/// and the item identified by `self_id` is ignored.
///
/// # Examples
/// ```
/// use load_planner::interaction::snap;
/// use load_planner::model::{CargoItem, Dimensions};
/// use load_planner::types::Vec3;
///
/// let dims = Dimensions::new(100.0, 100.0, 100.0).unwrap();
/// let neighbour = CargoItem::new("n", "N", Dimensions::new(150.0, 100.0, 100.0).unwrap(), 1.0);
/// let pos = snap(Vec3::new(152.0, 0.0, 0.0), &dims, &[neighbour], "me", 150.0);
/// assert_eq!(pos.x, 150.0);
/// ```
pub fn snap(
    candidate: Vec3,
    dims: &Dimensions,
    others: &[CargoItem],
    self_id: &str,
    threshold: f64,
) -> Vec3 {
    let extent = dims.extent();
    let neighbours = || others.iter().filter(|other| other.id != self_id);

    Vec3::new(
        snap_axis(
            candidate.x,
            extent.x,
            neighbours().map(|o| (o.position.x, o.dims.extent().x)),
            threshold,
        ),
        snap_axis(
            candidate.y,
            extent.y,
            neighbours().map(|o| (o.position.y, o.dims.extent().y)),
            threshold,
        ),
        snap_axis(
            candidate.z,
            extent.z,
            neighbours().map(|o| (o.position.z, o.dims.extent().z)),
            threshold,
        ),
    )
}

/// Moves an item to a snapped candidate position and updates its `valid` flag.
///
/// # Returns
/// The new `valid` flag (`false` if the item now collides)
pub fn drag_to(
    item: &mut CargoItem,
    candidate: Vec3,
    others: &[CargoItem],
    config: &InteractionConfig,
) -> bool {
    item.position = snap(candidate, &item.dims, others, &item.id, config.snap_threshold);
    item.valid = !check_collision(item, others, config.collision_epsilon);
    item.valid
}

/// Recomputes the `valid` flag of every item against all others.
///
/// # Returns
/// Number of items that are now invalid
pub fn revalidate(items: &mut [CargoItem], eps: f64) -> usize {
    let flags: Vec<bool> = items
        .iter()
        .map(|item| !check_collision(item, items, eps))
        .collect();

    let mut invalid = 0;
    for (item, valid) in items.iter_mut().zip(flags) {
        item.valid = valid;
        if !valid {
            invalid += 1;
        }
    }
    invalid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(id: &str, pos: (f64, f64, f64), l: f64, w: f64, h: f64) -> CargoItem {
        CargoItem::new(id, "B", Dimensions::new(l, w, h).unwrap(), 1.0).at(Vec3::from(pos))
    }

    #[test]
    fn negative_coordinates_collide() {
        let item = block("a", (0.0, -0.5, 0.0), 10.0, 10.0, 10.0);
        assert!(check_collision(&item, &[], EPSILON_COLLISION));
    }

    #[test]
    fn touching_items_do_not_collide() {
        let a = block("a", (0.0, 0.0, 0.0), 100.0, 100.0, 100.0);
        let b = block("b", (100.0, 0.0, 0.0), 100.0, 100.0, 100.0);
        let stacked = block("c", (0.0, 100.0, 0.0), 100.0, 100.0, 100.0);
        assert!(!check_collision(&b, &[a.clone(), stacked.clone()], EPSILON_COLLISION));
        assert!(!check_collision(&stacked, &[a, b], EPSILON_COLLISION));
    }

    #[test]
    fn overlap_within_epsilon_is_tolerated() {
        let a = block("a", (0.0, 0.0, 0.0), 100.0, 100.0, 100.0);
        let b = block("b", (99.9995, 0.0, 0.0), 100.0, 100.0, 100.0);
        assert!(!check_collision(&b, std::slice::from_ref(&a), EPSILON_COLLISION));
        let c = block("c", (99.0, 0.0, 0.0), 100.0, 100.0, 100.0);
        assert!(check_collision(&c, &[a], EPSILON_COLLISION));
    }

    #[test]
    fn no_upper_bound_check() {
        let far = block("a", (1e6, 1e6, 1e6), 10.0, 10.0, 10.0);
        assert!(!check_collision(&far, &[], EPSILON_COLLISION));
    }

    #[test]
    fn item_is_not_compared_with_itself() {
        let a = block("a", (0.0, 0.0, 0.0), 10.0, 10.0, 10.0);
        assert!(!check_collision(&a, std::slice::from_ref(&a), EPSILON_COLLISION));
    }

    #[test]
    fn snaps_to_neighbour_far_face_instead_of_origin() {
        let neighbour = block("n", (0.0, 0.0, 0.0), 150.0, 100.0, 100.0);
        let dims = Dimensions::new(100.0, 100.0, 100.0).unwrap();
        let pos = snap(Vec3::new(152.0, 0.0, 0.0), &dims, &[neighbour], "me", 150.0);
        assert_eq!(pos.x, 150.0);
    }

    #[test]
    fn snaps_to_origin_when_alone() {
        let dims = Dimensions::new(100.0, 100.0, 100.0).unwrap();
        let pos = snap(Vec3::new(12.0, 3.0, 80.0), &dims, &[], "me", 50.0);
        assert_eq!(pos, Vec3::new(0.0, 0.0, 80.0));
    }

    #[test]
    fn far_face_aligns_with_neighbour_near_face() {
        let neighbour = block("n", (500.0, 0.0, 0.0), 100.0, 100.0, 100.0);
        let dims = Dimensions::new(200.0, 100.0, 100.0).unwrap();
        let pos = snap(Vec3::new(290.0, 0.0, 0.0), &dims, &[neighbour], "me", 20.0);
        assert_eq!(pos.x, 300.0);
    }

    #[test]
    fn last_matching_neighbour_wins() {
        let first = block("first", (0.0, 0.0, 0.0), 100.0, 100.0, 100.0);
        let second = block("second", (0.0, 0.0, 0.0), 110.0, 100.0, 100.0);
        let dims = Dimensions::new(50.0, 50.0, 50.0).unwrap();

        let pos = snap(Vec3::new(104.0, 0.0, 500.0), &dims, &[first.clone(), second.clone()], "me", 20.0);
        assert_eq!(pos.x, 110.0, "the later neighbour overrides even if farther away");

        let pos = snap(Vec3::new(104.0, 0.0, 500.0), &dims, &[second, first], "me", 20.0);
        assert_eq!(pos.x, 100.0);
    }

    #[test]
    fn self_is_ignored_when_snapping() {
        let me = block("me", (300.0, 0.0, 0.0), 100.0, 100.0, 100.0);
        let dims = me.dims;
        let pos = snap(Vec3::new(310.0, 0.0, 0.0), &dims, &[me], "me", 20.0);
        assert_eq!(pos.x, 310.0);
    }

    #[test]
    fn drag_updates_valid_flag() {
        let config = InteractionConfig::default();
        let wall = block("wall", (0.0, 0.0, 0.0), 100.0, 1000.0, 1000.0);
        let mut item = block("me", (500.0, 0.0, 0.0), 100.0, 100.0, 100.0);

        assert!(drag_to(&mut item, Vec3::new(120.0, 0.0, 0.0), std::slice::from_ref(&wall), &config));
        assert_eq!(item.position.x, 100.0);

        assert!(!drag_to(&mut item, Vec3::new(40.0, 0.0, 300.0), std::slice::from_ref(&wall), &config));
        assert!(!item.valid);
    }

    #[test]
    fn revalidate_flags_overlapping_pairs() {
        let mut items = vec![
            block("a", (0.0, 0.0, 0.0), 100.0, 100.0, 100.0),
            block("b", (50.0, 0.0, 0.0), 100.0, 100.0, 100.0),
            block("c", (500.0, 0.0, 0.0), 100.0, 100.0, 100.0),
        ];
        assert_eq!(revalidate(&mut items, EPSILON_COLLISION), 2);
        assert!(!items[0].valid && !items[1].valid && items[2].valid);
    }
}
