//! Data models for the container load planner.
//!
//! This module defines the fundamental data structures:
//! - `Dimensions`: length, width and height of an item or container
//! - `Container`: the fixed-size load space
//! - `CargoItem`: a single piece of cargo with its corner position
//! - `ItemRow`: an imported row that expands into `quantity` items

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::geometry::Spatial;
use crate::types::{BoundingBox, Vec3};

/// Validation error for dimensions, weights and quantities.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Invalid container: {0}")]
    InvalidContainer(String),
}

fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_weight(value: f64) -> Result<(), ValidationError> {
    if value < 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidWeight(format!(
            "Weight must not be negative, got: {}",
            value
        )));
    }
    Ok(())
}

/// Fixed display palette. Items are mapped onto it by a hash of their drawing number.
pub const PALETTE: [&str; 12] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c", "#fabebe", "#008080", "#9a6324",
];

/// Maps an identity string to a palette color.
///
/// Pure function: the same identity always yields the same color.
///
/// # Examples
/// ```
/// use load_planner::model::color_for;
///
/// assert_eq!(color_for("DRW-4711"), color_for("DRW-4711"));
/// ```
pub fn color_for(identity: &str) -> &'static str {
    let hash = identity
        .bytes()
        .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(u32::from(b)));
    PALETTE[hash as usize % PALETTE.len()]
}

/// Extents of an item or container.
///
/// Axis mapping: length ↔ x, height ↔ y (vertical), width ↔ z.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "length": 1200.0, "width": 800.0, "height": 1000.0 }))]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    /// Creates validated dimensions.
    ///
    /// # Returns
    /// `Ok(Dimensions)` if all three values are positive and finite
    ///
    /// # Examples
    /// ```
    /// use load_planner::model::Dimensions;
    ///
    /// assert!(Dimensions::new(10.0, 20.0, 30.0).is_ok());
    /// assert!(Dimensions::new(-10.0, 20.0, 30.0).is_err());
    /// ```
    pub fn new(length: f64, width: f64, height: f64) -> Result<Self, ValidationError> {
        let dims = Self {
            length,
            width,
            height,
        };
        dims.validate()?;
        Ok(dims)
    }

    /// Checks that all components are strictly positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.length, "Length")?;
        validate_dimension(self.width, "Width")?;
        validate_dimension(self.height, "Height")?;
        Ok(())
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Base area (length × width).
    #[inline]
    pub fn footprint(&self) -> f64 {
        self.length * self.width
    }

    /// Largest of the three extents.
    #[inline]
    pub fn max_dim(&self) -> f64 {
        self.length.max(self.width).max(self.height)
    }

    /// The footprint rotated by 90° about the vertical axis.
    #[inline]
    pub fn rotated(&self) -> Self {
        Self {
            length: self.width,
            width: self.length,
            height: self.height,
        }
    }

    /// Extents in axis order (x = length, y = height, z = width).
    #[inline]
    pub fn extent(&self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }
}

/// The load space. Its minimum corner is the origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Container {
    pub name: String,
    pub dims: Dimensions,
    /// Weight capacity in kg. Reported, not enforced by the packer.
    pub max_weight: f64,
}

impl Container {
    /// Creates a new container with validation.
    pub fn new(
        name: impl Into<String>,
        dims: Dimensions,
        max_weight: f64,
    ) -> Result<Self, ValidationError> {
        let container = Self {
            name: name.into(),
            dims,
            max_weight,
        };
        container.validate()?;
        Ok(container)
    }

    /// Checks dimensions and weight capacity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.dims
            .validate()
            .map_err(|err| ValidationError::InvalidContainer(err.to_string()))?;
        validate_weight(self.max_weight)
            .map_err(|err| ValidationError::InvalidContainer(err.to_string()))
    }

    /// Volume of the load space.
    pub fn volume(&self) -> f64 {
        self.dims.volume()
    }
}

impl Spatial for Container {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(Vec3::zero(), self.dims.extent())
    }
}

fn default_valid() -> bool {
    true
}

/// A single piece of cargo.
///
/// `position` is always the minimum corner in container coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CargoItem {
    pub id: String,
    pub drawing_number: String,
    #[serde(default)]
    pub description: Option<String>,
    pub dims: Dimensions,
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default)]
    pub color: String,
}

impl CargoItem {
    /// Creates an unpositioned item colored by its drawing number.
    pub fn new(
        id: impl Into<String>,
        drawing_number: impl Into<String>,
        dims: Dimensions,
        weight: f64,
    ) -> Self {
        let drawing_number = drawing_number.into();
        let color = color_for(&drawing_number).to_string();
        Self {
            id: id.into(),
            drawing_number,
            description: None,
            dims,
            position: Vec3::zero(),
            weight,
            selected: false,
            valid: true,
            color,
        }
    }

    /// Returns the item with a different corner position.
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.dims.volume()
    }

    /// Center of the item's box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        self.bounding_box().center()
    }
}

impl Spatial for CargoItem {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.position, self.dims.extent())
    }
}

fn default_quantity() -> u32 {
    1
}

/// One imported row: an item group with a quantity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "drawing_number": "DRW-4711",
    "description": "Pallet",
    "dims": { "length": 1200.0, "width": 800.0, "height": 1000.0 },
    "weight": 250.0,
    "quantity": 4
}))]
pub struct ItemRow {
    pub drawing_number: String,
    #[serde(default)]
    pub description: Option<String>,
    pub dims: Dimensions,
    #[serde(default)]
    pub weight: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

impl ItemRow {
    /// Creates a validated row.
    pub fn new(
        drawing_number: impl Into<String>,
        dims: Dimensions,
        weight: f64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        let row = Self {
            drawing_number: drawing_number.into(),
            description: None,
            dims,
            weight,
            quantity,
        };
        row.validate()?;
        Ok(row)
    }

    /// Adds a free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Checks dimensions, weight and quantity.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.dims.validate()?;
        validate_weight(self.weight)?;
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity(format!(
                "Quantity of '{}' must be at least 1",
                self.drawing_number
            )));
        }
        Ok(())
    }
}

/// Expands rows into independent items.
///
/// Each row yields `quantity` items that share dimensions, weight and identity.
/// Items are numbered consecutively over the whole call, so ids are unique
/// even if two rows carry the same drawing number.
///
/// # Examples
/// ```
/// use load_planner::model::{Dimensions, ItemRow, expand_rows_to_items};
///
/// let dims = Dimensions::new(100.0, 50.0, 20.0).unwrap();
/// let rows = vec![ItemRow::new("A-1", dims, 3.5, 3).unwrap()];
/// let items = expand_rows_to_items(&rows);
/// assert_eq!(items.len(), 3);
/// assert!(items.iter().all(|item| item.valid));
/// ```
pub fn expand_rows_to_items(rows: &[ItemRow]) -> Vec<CargoItem> {
    let total: usize = rows.iter().map(|row| row.quantity as usize).sum();
    let mut items = Vec::with_capacity(total);
    let mut seq = 0usize;

    for row in rows {
        for _ in 0..row.quantity {
            seq += 1;
            let mut item = CargoItem::new(
                format!("{}-{}", row.drawing_number, seq),
                row.drawing_number.clone(),
                row.dims,
                row.weight,
            );
            item.description = row.description.clone();
            items.push(item);
        }
    }

    items
}
