//! Load statistics for a finished plan.
//!
//! Weight capacity and center of gravity are reported only; the packer never
//! rejects an item because of them.

use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::Spatial;
use crate::model::{CargoItem, Container};
use crate::types::{CenterOfMassCalculator, EPSILON_GENERAL, Vec3};

/// Summary of how the container is loaded.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct LoadReport {
    /// Valid items inside the load space
    pub placed_count: usize,
    /// Items outside the load space (staging area)
    pub staged_count: usize,
    pub packed_volume: f64,
    pub container_volume: f64,
    pub utilization_percent: f64,
    pub loaded_weight: f64,
    pub max_weight: f64,
    pub overweight: bool,
    /// Weighted mean of the loaded items' centers, `None` if nothing with weight is loaded
    pub center_of_gravity: Option<Vec3>,
}

impl LoadReport {
    /// Builds the report from a final item list.
    pub fn from_items(items: &[CargoItem], container: &Container) -> Self {
        let mut placed_count = 0;
        let mut packed_volume = 0.0;
        let mut loaded_weight = 0.0;
        let mut com = CenterOfMassCalculator::new();

        for item in items.iter().filter(|item| is_loaded(item, container)) {
            placed_count += 1;
            packed_volume += item.volume();
            loaded_weight += item.weight;
            com.add_point(item.center(), item.weight);
        }

        let container_volume = container.volume();
        let utilization_percent = if container_volume <= 0.0 {
            0.0
        } else {
            packed_volume / container_volume * 100.0
        };

        Self {
            placed_count,
            staged_count: items.len() - placed_count,
            packed_volume,
            container_volume,
            utilization_percent,
            loaded_weight,
            max_weight: container.max_weight,
            overweight: loaded_weight > container.max_weight + EPSILON_GENERAL,
            center_of_gravity: com.compute(),
        }
    }

    /// Returns `true` if every item ended up inside the load space.
    pub fn is_complete(&self) -> bool {
        self.staged_count == 0
    }
}

/// A valid item whose box lies within the container (small float slack allowed).
pub fn is_loaded(item: &CargoItem, container: &Container) -> bool {
    if !item.valid || !item.position.is_non_negative() {
        return false;
    }
    let limit = container.bounding_box().max();
    let top = item.bounding_box().max();
    top.x <= limit.x + EPSILON_GENERAL
        && top.y <= limit.y + EPSILON_GENERAL
        && top.z <= limit.z + EPSILON_GENERAL
}
