//! Container load planner.
//!
//! Places cuboid cargo items into a container with a multi-start greedy
//! heuristic, lays out the leftovers in a staging area and offers collision
//! checks and magnetic snapping for manual edits.

pub mod api;
pub mod config;
pub mod free_space;
pub mod geometry;
pub mod import;
pub mod interaction;
pub mod model;
pub mod optimizer;
pub mod report;
pub mod staging;
pub mod types;
