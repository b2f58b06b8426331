//! Shelf layout for items that are not inside the load space.
//!
//! Items are lined up left to right on the floor plane, behind the container's
//! far face (beyond its width on the z axis). A row wraps once the next item would
//! exceed the row width; the next row starts after the widest item of the
//! previous one.

use crate::model::{CargoItem, Container};
use crate::types::Vec3;

/// Spacing parameters of the staging area.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StagingLayout {
    /// Gap between the container's far face and the first row
    pub offset: f64,
    /// Gap between neighbouring items and between rows
    pub spacing: f64,
    /// Maximum x extent of a row
    pub row_width: f64,
}

impl StagingLayout {
    pub const DEFAULT_OFFSET: f64 = 500.0;
    pub const DEFAULT_SPACING: f64 = 100.0;
    pub const DEFAULT_ROW_WIDTH: f64 = 12_000.0;
}

impl Default for StagingLayout {
    fn default() -> Self {
        Self {
            offset: Self::DEFAULT_OFFSET,
            spacing: Self::DEFAULT_SPACING,
            row_width: Self::DEFAULT_ROW_WIDTH,
        }
    }
}

/// Lays out all items in the staging area with the default layout.
///
/// # Examples
/// ```
/// use load_planner::model::{CargoItem, Container, Dimensions};
/// use load_planner::staging::arrange_staging;
///
/// let container = Container::new("Box", Dimensions::new(1000.0, 1000.0, 1000.0).unwrap(), 0.0).unwrap();
/// let dims = Dimensions::new(200.0, 100.0, 50.0).unwrap();
/// let items = vec![CargoItem::new("a", "A", dims, 1.0), CargoItem::new("b", "A", dims, 1.0)];
/// let staged = arrange_staging(items, &container);
/// assert!(staged.iter().all(|item| item.valid && item.position.z > 1000.0));
/// ```
pub fn arrange_staging(items: Vec<CargoItem>, container: &Container) -> Vec<CargoItem> {
    arrange_staging_with(items, container, &StagingLayout::default())
}

/// Lays out all items in the staging area.
///
/// Every item is flagged valid: staged items never overlap each other or the
/// load space. Item order is preserved.
pub fn arrange_staging_with(
    mut items: Vec<CargoItem>,
    container: &Container,
    layout: &StagingLayout,
) -> Vec<CargoItem> {
    let mut x = 0.0;
    let mut z = container.dims.width + layout.offset;
    let mut row_depth: f64 = 0.0;

    for item in &mut items {
        let length = item.dims.length;
        if x > 0.0 && x + length > layout.row_width {
            z += row_depth + layout.spacing;
            x = 0.0;
            row_depth = 0.0;
        }

        item.position = Vec3::new(x, 0.0, z);
        item.valid = true;

        x += length + layout.spacing;
        row_depth = row_depth.max(item.dims.width);
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::intersects;
    use crate::model::Dimensions;

    fn container() -> Container {
        Container::new("Test", Dimensions::new(1000.0, 800.0, 600.0).unwrap(), 1000.0).unwrap()
    }

    fn item(id: &str, l: f64, w: f64, h: f64) -> CargoItem {
        let mut item = CargoItem::new(id, "S", Dimensions::new(l, w, h).unwrap(), 1.0);
        item.valid = false;
        item
    }

    #[test]
    fn first_row_starts_behind_container() {
        let staged = arrange_staging(vec![item("a", 100.0, 50.0, 10.0)], &container());
        assert_eq!(
            staged[0].position,
            Vec3::new(0.0, 0.0, 800.0 + StagingLayout::DEFAULT_OFFSET)
        );
        assert!(staged[0].valid);
    }

    #[test]
    fn rows_wrap_at_row_width() {
        let layout = StagingLayout {
            offset: 100.0,
            spacing: 10.0,
            row_width: 250.0,
        };
        let items = vec![
            item("a", 100.0, 40.0, 10.0),
            item("b", 100.0, 70.0, 10.0),
            item("c", 100.0, 30.0, 10.0),
        ];
        let staged = arrange_staging_with(items, &container(), &layout);

        assert_eq!(staged[0].position, Vec3::new(0.0, 0.0, 900.0));
        assert_eq!(staged[1].position, Vec3::new(110.0, 0.0, 900.0));
        // Second row starts after the widest item of the first row.
        assert_eq!(staged[2].position, Vec3::new(0.0, 0.0, 980.0));
    }

    #[test]
    fn oversized_item_gets_its_own_row() {
        let layout = StagingLayout {
            offset: 0.0,
            spacing: 10.0,
            row_width: 100.0,
        };
        let items = vec![item("a", 500.0, 20.0, 10.0), item("b", 50.0, 20.0, 10.0)];
        let staged = arrange_staging_with(items, &container(), &layout);
        assert_eq!(staged[0].position.x, 0.0);
        assert_eq!(staged[1].position, Vec3::new(0.0, 0.0, 830.0));
    }

    #[test]
    fn staged_items_do_not_overlap() {
        let items: Vec<_> = (0..40)
            .map(|i| item(&format!("i{i}"), 150.0 + f64::from(i) * 7.0, 80.0 + f64::from(i % 5) * 20.0, 50.0))
            .collect();
        let cont = container();
        let staged = arrange_staging(items, &cont);

        for (i, a) in staged.iter().enumerate() {
            assert!(!intersects(a, &cont), "{} overlaps the container", a.id);
            for b in staged.iter().skip(i + 1) {
                assert!(!intersects(a, b), "{} overlaps {}", a.id, b.id);
            }
        }
    }
}
