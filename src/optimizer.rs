//! Multi-start greedy packing of cargo items into a single container.
//!
//! One trial sorts the items with a strategy and then places them one after
//! another into the lowest, deepest, leftmost free space that fits. The optimizer
//! runs a fixed battery of trials and keeps the one with the largest packed
//! volume. Items the winning trial could not place are moved to the staging area.

use std::fmt;

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use utoipa::ToSchema;

use crate::free_space::{FreeSpaceBox, FreeSpaceManager};
use crate::model::{CargoItem, Container, Dimensions};
use crate::report::LoadReport;
use crate::staging::{StagingLayout, arrange_staging_with};
use crate::types::Vec3;

/// Corner position given to items a trial could not place.
///
/// The negative height marks them as "not placed".
pub const UNPLACED_POSITION: Vec3 = Vec3::new(0.0, -1000.0, 0.0);

/// Ordering scores closer than this are considered equal.
const SCORE_TIE_BAND: f64 = 0.1;

/// Seeds of the four randomized trials.
pub const RANDOM_SEEDS: [f64; 4] = [7.0, 13.0, 29.0, 53.0];

/// Fixed trial battery. The order doubles as tie-break between equal volumes.
pub const TRIAL_BATTERY: [TrialSpec; 7] = [
    TrialSpec::new(SortStrategy::Volume, 0.0),
    TrialSpec::new(SortStrategy::Footprint, 0.0),
    TrialSpec::new(SortStrategy::MaxDim, 0.0),
    TrialSpec::new(SortStrategy::RandomWeighted, RANDOM_SEEDS[0]),
    TrialSpec::new(SortStrategy::RandomWeighted, RANDOM_SEEDS[1]),
    TrialSpec::new(SortStrategy::RandomWeighted, RANDOM_SEEDS[2]),
    TrialSpec::new(SortStrategy::RandomWeighted, RANDOM_SEEDS[3]),
];

/// Configuration for the packing algorithm.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Free spaces thinner than this on any axis are discarded
    pub min_free_space: f64,
    /// Tolerance when checking whether an item fits into a free space
    pub general_epsilon: f64,
    /// Run the trial battery on the rayon thread pool
    pub parallel_trials: bool,
    /// Layout of the staging area for unplaced items
    pub staging: StagingLayout,
}

impl PackingConfig {
    pub const DEFAULT_MIN_FREE_SPACE: f64 = 50.0;
    pub const DEFAULT_GENERAL_EPSILON: f64 = 1e-6;
    pub const DEFAULT_PARALLEL_TRIALS: bool = true;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            min_free_space: Self::DEFAULT_MIN_FREE_SPACE,
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            parallel_trials: Self::DEFAULT_PARALLEL_TRIALS,
            staging: StagingLayout::default(),
        }
    }
}

/// Builder for PackingConfig.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the minimum free-space extent.
    pub fn min_free_space(mut self, extent: f64) -> Self {
        self.config.min_free_space = extent;
        self
    }

    /// Sets the general tolerance.
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    /// Enables or disables parallel trials.
    pub fn parallel_trials(mut self, parallel: bool) -> Self {
        self.config.parallel_trials = parallel;
        self
    }

    /// Sets the gap between the container and the staging area.
    pub fn staging_offset(mut self, offset: f64) -> Self {
        self.config.staging.offset = offset;
        self
    }

    /// Sets the gap between staged items.
    pub fn staging_spacing(mut self, spacing: f64) -> Self {
        self.config.staging.spacing = spacing;
        self
    }

    /// Sets the row width of the staging area.
    pub fn staging_row_width(mut self, width: f64) -> Self {
        self.config.staging.row_width = width;
        self
    }

    /// Creates the final configuration.
    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// How items are ordered before a trial.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortStrategy {
    /// Volume, descending
    Volume,
    /// Base area, then volume
    Footprint,
    /// Largest extent, then volume
    MaxDim,
    /// Volume with a deterministic per-item perturbation
    RandomWeighted,
}

impl SortStrategy {
    pub fn code(&self) -> &'static str {
        match self {
            SortStrategy::Volume => "VOLUME",
            SortStrategy::Footprint => "FOOTPRINT",
            SortStrategy::MaxDim => "MAX_DIM",
            SortStrategy::RandomWeighted => "RANDOM_WEIGHTED",
        }
    }
}

impl fmt::Display for SortStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One entry of the trial battery.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrialSpec {
    pub strategy: SortStrategy,
    pub seed: f64,
}

impl TrialSpec {
    pub const fn new(strategy: SortStrategy, seed: f64) -> Self {
        Self { strategy, seed }
    }
}

/// Primary and secondary ordering score of an item (both sorted descending).
fn ordering_scores(item: &CargoItem, spec: &TrialSpec) -> (f64, f64) {
    let dims = &item.dims;
    match spec.strategy {
        SortStrategy::Volume => (dims.volume(), 0.0),
        SortStrategy::Footprint => (dims.footprint(), dims.volume()),
        SortStrategy::MaxDim => (dims.max_dim(), dims.volume()),
        SortStrategy::RandomWeighted => {
            // Noise depends on the id length only: equal lengths, equal noise.
            let id_len = item.id.chars().count() as f64;
            (dims.volume() * (1.0 + 0.2 * (id_len + spec.seed).sin()), 0.0)
        }
    }
}

/// Orders items for one trial.
///
/// Items are sorted by their primary score, descending. A band starts at the
/// highest remaining score and takes every item less than 0.1 below it; inside a
/// band the secondary score decides, then height (both descending). The sort is
/// stable, so the input order is the final tie-break.
pub fn sort_items(items: Vec<CargoItem>, spec: &TrialSpec) -> Vec<CargoItem> {
    let mut keyed: Vec<((f64, f64), CargoItem)> = items
        .into_iter()
        .map(|item| (ordering_scores(&item, spec), item))
        .collect();

    keyed.sort_by(|a, b| b.0.0.total_cmp(&a.0.0));

    let mut start = 0;
    while start < keyed.len() {
        let mut end = start + 1;
        while end < keyed.len() && keyed[start].0.0 - keyed[end].0.0 < SCORE_TIE_BAND {
            end += 1;
        }
        keyed[start..end].sort_by(|a, b| {
            b.0.1
                .total_cmp(&a.0.1)
                .then_with(|| b.1.dims.height.total_cmp(&a.1.dims.height))
        });
        start = end;
    }

    keyed.into_iter().map(|(_, item)| item).collect()
}

/// Best (free space, orientation) pair for one item.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Placement {
    /// Index into the free-space list
    pub space_index: usize,
    /// Footprint turned by 90° about the vertical axis
    pub rotated: bool,
    /// Corner position (origin of the free space)
    pub position: Vec3,
    /// Item dimensions in the chosen orientation
    pub dims: Dimensions,
    pub score: f64,
}

/// Gravity-first score: low y dominates, then low z, then low x. Lower is better.
#[inline]
fn placement_score(space: &FreeSpaceBox) -> f64 {
    space.y * 1_000_000.0 + space.z * 1_000.0 + space.x
}

#[inline]
fn fits(dims: &Dimensions, space: &FreeSpaceBox, eps: f64) -> bool {
    dims.length <= space.l + eps && dims.height <= space.h + eps && dims.width <= space.w + eps
}

/// Finds the lowest-scoring feasible placement.
///
/// Spaces are checked in list order, the unrotated orientation before the rotated
/// one; only a strictly lower score replaces the current best. Square footprints
/// are not rotated.
pub fn find_best_placement(
    dims: &Dimensions,
    spaces: &[FreeSpaceBox],
    eps: f64,
) -> Option<Placement> {
    let rotated = dims.rotated();
    let try_rotation = (dims.length - dims.width).abs() > eps;
    let mut best: Option<Placement> = None;

    for (space_index, space) in spaces.iter().enumerate() {
        let score = placement_score(space);
        for (is_rotated, candidate) in [(false, dims), (true, &rotated)] {
            if is_rotated && !try_rotation {
                continue;
            }
            if !fits(candidate, space, eps) {
                continue;
            }
            if best.is_none_or(|current| score < current.score) {
                best = Some(Placement {
                    space_index,
                    rotated: is_rotated,
                    position: space.origin(),
                    dims: *candidate,
                    score,
                });
            }
        }
    }

    best
}

/// Result of a single greedy pass.
#[derive(Clone, Debug)]
pub struct TrialOutcome {
    pub spec: TrialSpec,
    /// All items in placement order, placed ones flagged valid
    pub items: Vec<CargoItem>,
    pub packed_volume: f64,
    pub placed: usize,
}

impl TrialOutcome {
    fn summary(&self, index: usize) -> TrialSummary {
        TrialSummary {
            index,
            strategy: self.spec.strategy,
            seed: self.spec.seed,
            packed_volume: self.packed_volume,
            placed: self.placed,
            unplaced: self.items.len() - self.placed,
        }
    }
}

/// Runs one greedy pass over a private copy of the items.
pub fn run_trial(
    items: &[CargoItem],
    container: &Container,
    spec: &TrialSpec,
    config: &PackingConfig,
) -> TrialOutcome {
    let ordered = sort_items(items.to_vec(), spec);
    let mut free_spaces = FreeSpaceManager::new(container.dims.extent(), config.min_free_space);
    let mut packed_volume = 0.0;
    let mut placed = 0;
    let mut result = Vec::with_capacity(ordered.len());

    for mut item in ordered {
        match find_best_placement(&item.dims, free_spaces.spaces(), config.general_epsilon) {
            Some(placement) => {
                item.position = placement.position;
                item.dims = placement.dims;
                item.valid = true;
                packed_volume += item.volume();
                placed += 1;
                free_spaces.occupy(&FreeSpaceBox::from_corner(
                    item.position,
                    item.dims.extent(),
                ));
            }
            None => {
                item.valid = false;
                item.position = UNPLACED_POSITION;
            }
        }
        result.push(item);
    }

    TrialOutcome {
        spec: *spec,
        items: result,
        packed_volume,
        placed,
    }
}

/// Runs the whole battery. Results come back in battery order.
fn run_battery(
    items: &[CargoItem],
    container: &Container,
    config: &PackingConfig,
) -> Vec<TrialOutcome> {
    if config.parallel_trials {
        TRIAL_BATTERY
            .as_slice()
            .par_iter()
            .map(|spec| run_trial(items, container, spec, config))
            .collect()
    } else {
        TRIAL_BATTERY
            .iter()
            .map(|spec| run_trial(items, container, spec, config))
            .collect()
    }
}

/// Index of the trial with the strictly greatest volume; earlier trials win ties.
fn select_winner(outcomes: &[TrialOutcome]) -> usize {
    let mut best = 0;
    for (index, outcome) in outcomes.iter().enumerate().skip(1) {
        if outcome.packed_volume > outcomes[best].packed_volume {
            best = index;
        }
    }
    best
}

/// Per-trial statistics.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct TrialSummary {
    pub index: usize,
    pub strategy: SortStrategy,
    pub seed: f64,
    pub packed_volume: f64,
    pub placed: usize,
    pub unplaced: usize,
}

/// Result of an auto-pack run.
#[derive(Clone, Debug)]
pub struct PackingResult {
    /// Winning trial's placed items followed by the staged ones
    pub items: Vec<CargoItem>,
    pub trials: Vec<TrialSummary>,
    pub winning_trial: usize,
    pub report: LoadReport,
}

impl PackingResult {
    /// Number of items inside the container.
    pub fn placed_count(&self) -> usize {
        self.report.placed_count
    }

    /// Number of items moved to the staging area.
    pub fn staged_count(&self) -> usize {
        self.report.staged_count
    }
}

/// Events emitted while packing, for live visualization.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// A trial of the battery has finished.
    TrialFinished {
        index: usize,
        strategy: SortStrategy,
        seed: f64,
        packed_volume: f64,
        placed: usize,
        unplaced: usize,
    },
    /// The best trial has been chosen.
    WinnerSelected {
        index: usize,
        strategy: SortStrategy,
        packed_volume: f64,
    },
    /// An item of the winning trial sits inside the container.
    ItemPlaced {
        id: String,
        pos: Vec3,
        dims: Dimensions,
    },
    /// An unplaced item was moved to the staging area.
    ItemStaged { id: String, pos: Vec3 },
    /// Packing finished.
    Finished {
        placed: usize,
        staged: usize,
        utilization_percent: f64,
    },
}

/// Packs items into the container with the default configuration.
///
/// The result holds exactly as many items as the input.
///
/// # Examples
/// ```
/// use load_planner::model::{CargoItem, Container, Dimensions};
/// use load_planner::optimizer::auto_pack;
///
/// let container = Container::new("Cube", Dimensions::new(1000.0, 1000.0, 1000.0).unwrap(), 0.0).unwrap();
/// let items = vec![CargoItem::new("a", "A", Dimensions::new(1000.0, 1000.0, 1000.0).unwrap(), 5.0)];
/// let packed = auto_pack(items, &container);
/// assert_eq!(packed.len(), 1);
/// assert!(packed[0].valid);
/// ```
pub fn auto_pack(items: Vec<CargoItem>, container: &Container) -> Vec<CargoItem> {
    auto_pack_with_config(items, container, &PackingConfig::default()).items
}

/// Packing with a custom configuration.
pub fn auto_pack_with_config(
    items: Vec<CargoItem>,
    container: &Container,
    config: &PackingConfig,
) -> PackingResult {
    auto_pack_with_progress(items, container, config, |_| {})
}

/// Packing with a progress callback.
///
/// Trials may run in parallel; events are emitted afterwards in battery order, so
/// the event sequence does not depend on thread scheduling.
pub fn auto_pack_with_progress(
    items: Vec<CargoItem>,
    container: &Container,
    config: &PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> PackingResult {
    let mut outcomes = run_battery(&items, container, config);

    let trials: Vec<TrialSummary> = outcomes
        .iter()
        .enumerate()
        .map(|(index, outcome)| outcome.summary(index))
        .collect();
    for summary in &trials {
        debug!(
            "trial {} ({}, seed {}): volume {:.1}, placed {}, unplaced {}",
            summary.index,
            summary.strategy,
            summary.seed,
            summary.packed_volume,
            summary.placed,
            summary.unplaced
        );
        on_event(&PackEvent::TrialFinished {
            index: summary.index,
            strategy: summary.strategy,
            seed: summary.seed,
            packed_volume: summary.packed_volume,
            placed: summary.placed,
            unplaced: summary.unplaced,
        });
    }

    let winning_trial = select_winner(&outcomes);
    let winner = outcomes.swap_remove(winning_trial);
    debug!(
        "selected trial {} ({}) with volume {:.1}",
        winning_trial, winner.spec.strategy, winner.packed_volume
    );
    on_event(&PackEvent::WinnerSelected {
        index: winning_trial,
        strategy: winner.spec.strategy,
        packed_volume: winner.packed_volume,
    });

    let (mut packed, unplaced): (Vec<CargoItem>, Vec<CargoItem>) =
        winner.items.into_iter().partition(|item| item.valid);
    if !unplaced.is_empty() {
        warn!(
            "{} of {} items did not fit into '{}' and were staged",
            unplaced.len(),
            packed.len() + unplaced.len(),
            container.name
        );
    }

    for item in &packed {
        on_event(&PackEvent::ItemPlaced {
            id: item.id.clone(),
            pos: item.position,
            dims: item.dims,
        });
    }

    let staged = arrange_staging_with(unplaced, container, &config.staging);
    for item in &staged {
        on_event(&PackEvent::ItemStaged {
            id: item.id.clone(),
            pos: item.position,
        });
    }
    packed.extend(staged);

    let report = LoadReport::from_items(&packed, container);
    on_event(&PackEvent::Finished {
        placed: report.placed_count,
        staged: report.staged_count,
        utilization_percent: report.utilization_percent,
    });

    PackingResult {
        items: packed,
        trials,
        winning_trial,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::intersects_with_tolerance;
    use crate::interaction::check_collision;
    use crate::types::EPSILON_COLLISION;

    fn dims(l: f64, w: f64, h: f64) -> Dimensions {
        Dimensions::new(l, w, h).unwrap()
    }

    fn cube_container(size: f64) -> Container {
        Container::new("Cube", dims(size, size, size), 10_000.0).unwrap()
    }

    fn item(id: &str, l: f64, w: f64, h: f64) -> CargoItem {
        CargoItem::new(id, id, dims(l, w, h), 1.0)
    }

    fn assert_valid_items_disjoint(items: &[CargoItem]) {
        let valid: Vec<_> = items.iter().filter(|i| i.valid).collect();
        for (i, a) in valid.iter().enumerate() {
            assert!(a.position.is_non_negative(), "{} has a negative corner", a.id);
            for b in valid.iter().skip(i + 1) {
                assert!(
                    !intersects_with_tolerance(*a, *b, EPSILON_COLLISION),
                    "{} overlaps {}",
                    a.id,
                    b.id
                );
            }
        }
    }

    fn serial() -> PackingConfig {
        PackingConfig::builder().parallel_trials(false).build()
    }

    #[test]
    fn full_cube_fills_container() {
        let container = cube_container(1000.0);
        let result =
            auto_pack_with_config(vec![item("a", 1000.0, 1000.0, 1000.0)], &container, &serial());

        assert_eq!(result.items[0].position, Vec3::zero());
        assert!(result.items[0].valid);
        assert!((result.report.utilization_percent - 100.0).abs() < 1e-9);

        let mut manager = FreeSpaceManager::new(container.dims.extent(), 50.0);
        manager.occupy(&FreeSpaceBox::from_corner(
            result.items[0].position,
            result.items[0].dims.extent(),
        ));
        assert!(manager.spaces().is_empty());
    }

    #[test]
    fn scorer_prefers_floor_level_spaces() {
        let spaces = [
            FreeSpaceBox::new(0.0, 600.0, 0.0, 1000.0, 400.0, 1000.0),
            FreeSpaceBox::new(600.0, 0.0, 0.0, 400.0, 1000.0, 1000.0),
            FreeSpaceBox::new(0.0, 0.0, 600.0, 1000.0, 1000.0, 400.0),
        ];
        let best = find_best_placement(&dims(300.0, 300.0, 300.0), &spaces, 1e-6).unwrap();
        assert_eq!(best.space_index, 1);
        assert_eq!(best.position, Vec3::new(600.0, 0.0, 0.0));
        assert!(!best.rotated);
    }

    #[test]
    fn scorer_rotates_when_only_rotated_fits() {
        let spaces = [FreeSpaceBox::new(0.0, 0.0, 0.0, 200.0, 500.0, 800.0)];
        let best = find_best_placement(&dims(700.0, 150.0, 100.0), &spaces, 1e-6).unwrap();
        assert!(best.rotated);
        assert_eq!(best.dims, dims(150.0, 700.0, 100.0));
    }

    #[test]
    fn scorer_keeps_first_space_on_equal_scores() {
        let a = FreeSpaceBox::new(0.0, 0.0, 0.0, 500.0, 500.0, 500.0);
        let best = find_best_placement(&dims(100.0, 200.0, 100.0), &[a, a], 1e-6).unwrap();
        assert_eq!(best.space_index, 0);
        assert!(!best.rotated, "unrotated is checked first");
    }

    #[test]
    fn height_never_rotates() {
        let spaces = [FreeSpaceBox::new(0.0, 0.0, 0.0, 500.0, 100.0, 500.0)];
        assert!(find_best_placement(&dims(100.0, 100.0, 200.0), &spaces, 1e-6).is_none());
    }

    #[test]
    fn two_large_cubes_do_not_overlap() {
        let container = cube_container(1000.0);
        let items = vec![item("a", 600.0, 600.0, 600.0), item("b", 600.0, 600.0, 600.0)];
        let trial = run_trial(&items, &container, &TRIAL_BATTERY[0], &serial());

        assert_eq!(trial.items[0].position, Vec3::zero());
        assert_eq!(trial.placed, 1);
        assert!(!trial.items[1].valid);
        assert!(trial.items[1].position.y < 0.0);

        let packed = auto_pack_with_config(items, &container, &serial()).items;
        assert_eq!(packed.len(), 2);
        let (first, second) = (&packed[0], &packed[1]);
        assert!(!check_collision(second, std::slice::from_ref(first), EPSILON_COLLISION));
        assert!(!check_collision(first, std::slice::from_ref(second), EPSILON_COLLISION));
    }

    #[test]
    fn stacks_items_in_layers() {
        let container = Container::new("Box", dims(1000.0, 1000.0, 1000.0), 0.0).unwrap();
        let items: Vec<_> = (0..8)
            .map(|i| item(&format!("c{i}"), 500.0, 500.0, 500.0))
            .collect();
        let result = auto_pack_with_config(items, &container, &serial());

        assert_eq!(result.placed_count(), 8);
        assert!(result.items.iter().any(|i| i.position.y > 0.0));
        assert_valid_items_disjoint(&result.items);
        assert!((result.report.utilization_percent - 100.0).abs() < 1e-9);
    }

    #[test]
    fn overflow_goes_to_staging() {
        let container = Container::new("Small", dims(1000.0, 600.0, 400.0), 500.0).unwrap();
        let items: Vec<_> = (0..300)
            .map(|i| item(&format!("P-{i}"), 150.0, 150.0, 100.0))
            .collect();
        let config = PackingConfig::default();
        let result = auto_pack_with_config(items, &container, &config);

        assert_eq!(result.items.len(), 300);
        assert!(result.staged_count() > 0);
        assert!(result.placed_count() > 0);
        assert!(result.items.iter().all(|i| i.valid));
        assert_valid_items_disjoint(&result.items);

        let far_face = container.dims.width;
        for staged in &result.items[result.placed_count()..] {
            assert!(staged.position.z >= far_face + config.staging.offset);
        }
    }

    #[test]
    fn winner_has_the_largest_volume() {
        let container = Container::new("Van", dims(2000.0, 1200.0, 1000.0), 1000.0).unwrap();
        let mut items = Vec::new();
        for i in 0..25 {
            let f = f64::from(i);
            items.push(item(&format!("x{i}"), 200.0 + f * 30.0, 150.0 + f * 11.0, 120.0 + f * 17.0));
        }
        let result = auto_pack_with_config(items.clone(), &container, &serial());
        let best = result.trials[result.winning_trial].packed_volume;

        assert_eq!(result.trials.len(), TRIAL_BATTERY.len());
        assert!(result.trials.iter().all(|t| t.packed_volume <= best));
        assert!(
            result.trials[..result.winning_trial]
                .iter()
                .all(|t| t.packed_volume < best),
            "earlier trials win ties"
        );
        assert!((result.report.packed_volume - best).abs() < 1e-3);
        assert_eq!(result.items.len(), items.len());
        assert_valid_items_disjoint(&result.items);
    }

    #[test]
    fn parallel_and_serial_batteries_agree() {
        let container = Container::new("Van", dims(1800.0, 1100.0, 900.0), 1000.0).unwrap();
        let items: Vec<_> = (0u32..40)
            .map(|i| {
                let f = f64::from(i % 7);
                item(&format!("id-{}", "x".repeat((i % 5) as usize)), 250.0 + f * 40.0, 180.0 + f * 25.0, 150.0)
            })
            .collect();

        let serial_result = auto_pack_with_config(items.clone(), &container, &serial());
        let parallel = PackingConfig::builder().parallel_trials(true).build();
        let parallel_result = auto_pack_with_config(items, &container, &parallel);

        assert_eq!(serial_result.winning_trial, parallel_result.winning_trial);
        assert_eq!(serial_result.items, parallel_result.items);
    }

    #[test]
    fn repacking_does_not_lose_volume() {
        let container = cube_container(1000.0);
        let items: Vec<_> = (0..6)
            .map(|i| item(&format!("r{i}"), 400.0, 300.0, 250.0))
            .collect();
        let first = auto_pack_with_config(items, &container, &serial());
        assert!(first.report.is_complete());
        let second = auto_pack_with_config(first.items.clone(), &container, &serial());
        assert!(second.report.packed_volume + 1e-6 >= first.report.packed_volume);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let result = auto_pack_with_config(Vec::new(), &cube_container(100.0), &serial());
        assert!(result.items.is_empty());
        assert_eq!(result.winning_trial, 0);
        assert_eq!(result.report.placed_count, 0);
    }

    #[test]
    fn progress_events_follow_battery_order() {
        let container = cube_container(1000.0);
        let items = vec![item("a", 600.0, 600.0, 600.0), item("b", 600.0, 600.0, 600.0)];
        let mut events = Vec::new();
        auto_pack_with_progress(items, &container, &PackingConfig::default(), |e| {
            events.push(e.clone())
        });

        assert_eq!(events.len(), TRIAL_BATTERY.len() + 4);
        for (i, event) in events.iter().take(TRIAL_BATTERY.len()).enumerate() {
            assert!(matches!(event, PackEvent::TrialFinished { index, .. } if *index == i));
        }
        assert!(matches!(
            events[TRIAL_BATTERY.len()],
            PackEvent::WinnerSelected { index: 0, .. }
        ));
        assert!(matches!(
            &events[TRIAL_BATTERY.len() + 1],
            PackEvent::ItemPlaced { id, pos, dims } if id == "a" && *pos == Vec3::zero() && dims.length == 600.0
        ));
        assert!(matches!(events[TRIAL_BATTERY.len() + 2], PackEvent::ItemStaged { .. }));
        assert!(matches!(
            events.last(),
            Some(PackEvent::Finished { placed: 1, staged: 1, .. })
        ));
    }

    #[test]
    fn volume_strategy_sorts_descending() {
        let items = vec![
            item("s", 10.0, 10.0, 10.0),
            item("l", 30.0, 30.0, 30.0),
            item("m", 20.0, 20.0, 20.0),
        ];
        let sorted = sort_items(items, &TRIAL_BATTERY[0]);
        let ids: Vec<_> = sorted.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["l", "m", "s"]);
    }

    #[test]
    fn near_equal_scores_fall_back_to_height() {
        // Volumes differ by 0.05; the taller item goes first regardless.
        let low = item("low", 100.0, 100.0, 1.0);
        let mut tall = item("tall", 1.0, 1.0, 9999.0);
        tall.dims.height = (low.volume() - 0.05) / (tall.dims.length * tall.dims.width);
        let sorted = sort_items(vec![low, tall], &TRIAL_BATTERY[0]);
        assert_eq!(sorted[0].id, "tall");
    }

    #[test]
    fn bands_never_span_a_full_score_step() {
        // Volumes step by 0.08: neighbours tie, items two steps apart do not.
        let stepped = |id: &str, volume: f64, height: f64| item(id, volume / height, 1.0, height);
        let items = vec![
            stepped("big", 10.32, 1.0),
            stepped("b", 10.24, 2.0),
            stepped("c", 10.16, 3.0),
            stepped("d", 10.08, 4.0),
            stepped("small_tall", 10.0, 5.0),
        ];
        let sorted = sort_items(items, &TRIAL_BATTERY[0]);
        let ids: Vec<_> = sorted.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["b", "big", "d", "c", "small_tall"]);
    }

    #[test]
    fn footprint_ties_broken_by_volume() {
        let items = vec![item("flat", 100.0, 100.0, 10.0), item("high", 100.0, 100.0, 50.0)];
        let sorted = sort_items(items, &TRIAL_BATTERY[1]);
        assert_eq!(sorted[0].id, "high");
    }

    #[test]
    fn max_dim_orders_by_longest_side() {
        let items = vec![item("cube", 50.0, 50.0, 50.0), item("rod", 10.0, 10.0, 90.0)];
        let sorted = sort_items(items, &TRIAL_BATTERY[2]);
        assert_eq!(sorted[0].id, "rod");
    }

    #[test]
    fn random_weighted_is_reproducible() {
        let items: Vec<_> = (0..30)
            .map(|i| item(&"k".repeat(1 + i % 9), 100.0 + (i * 13 % 50) as f64, 80.0, 60.0))
            .collect();
        let spec = TRIAL_BATTERY[4];
        let first: Vec<_> = sort_items(items.clone(), &spec).into_iter().map(|i| i.dims).collect();
        let second: Vec<_> = sort_items(items, &spec).into_iter().map(|i| i.dims).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn random_weighted_noise_depends_on_id_length_only() {
        let spec = TrialSpec::new(SortStrategy::RandomWeighted, RANDOM_SEEDS[0]);
        let a = ordering_scores(&item("abc", 10.0, 10.0, 10.0), &spec);
        let b = ordering_scores(&item("xyz", 10.0, 10.0, 10.0), &spec);
        let c = ordering_scores(&item("abcd", 10.0, 10.0, 10.0), &spec);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn battery_layout() {
        assert_eq!(TRIAL_BATTERY.len(), 7);
        let random: Vec<_> = TRIAL_BATTERY
            .iter()
            .filter(|t| t.strategy == SortStrategy::RandomWeighted)
            .map(|t| t.seed)
            .collect();
        assert_eq!(random, RANDOM_SEEDS);
        assert_eq!(SortStrategy::MaxDim.to_string(), "MAX_DIM");
    }
}
