//! Parsing of delimited item rows (CSV-like text) into `ItemRow`s.
//!
//! Column order: `drawing_number, length, width, height[, weight[, quantity[, description]]]`.
//! Rows that fail the shape checks are dropped and reported; they never abort the
//! import. Optional numeric columns fall back to defaults (weight 0, quantity 1).

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::{Dimensions, ItemRow};

const CANDIDATE_DELIMITERS: [char; 3] = [';', ',', '\t'];
const MIN_FIELDS: usize = 4;

/// Why a row was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowRejection {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("drawing number is empty")]
    MissingIdentity,
    #[error("{column} '{value}' is not a positive number")]
    InvalidDimension { column: &'static str, value: String },
}

/// A dropped row and its 1-based line number.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DroppedRow {
    pub line: usize,
    pub reason: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub rows: Vec<ItemRow>,
    pub dropped: Vec<DroppedRow>,
}

/// Picks the candidate delimiter occurring most often in the first content line.
///
/// Falls back to `;` if none occurs.
pub fn detect_delimiter(text: &str) -> char {
    let first = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .unwrap_or_default();

    CANDIDATE_DELIMITERS
        .iter()
        .map(|&d| (d, first.matches(d).count()))
        .filter(|&(_, count)| count > 0)
        .max_by_key(|&(_, count)| count)
        .map(|(d, _)| d)
        .unwrap_or(';')
}

fn parse_dimension(column: &'static str, raw: &str) -> Result<f64, RowRejection> {
    let normalized = raw.trim().replace(',', ".");
    match normalized.parse::<f64>() {
        Ok(value) if value > 0.0 && value.is_finite() => Ok(value),
        _ => Err(RowRejection::InvalidDimension {
            column,
            value: raw.trim().to_string(),
        }),
    }
}

fn parse_weight(raw: Option<&str>) -> f64 {
    raw.and_then(|value| value.trim().replace(',', ".").parse::<f64>().ok())
        .filter(|value| *value >= 0.0 && value.is_finite())
        .unwrap_or(0.0)
}

fn parse_quantity(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value >= 1)
        .unwrap_or(1)
}

/// Parses a single record.
pub fn parse_row(fields: &[&str]) -> Result<ItemRow, RowRejection> {
    if fields.len() < MIN_FIELDS {
        return Err(RowRejection::TooFewFields {
            expected: MIN_FIELDS,
            found: fields.len(),
        });
    }

    let drawing_number = fields[0].trim();
    if drawing_number.is_empty() {
        return Err(RowRejection::MissingIdentity);
    }

    let dims = Dimensions {
        length: parse_dimension("length", fields[1])?,
        width: parse_dimension("width", fields[2])?,
        height: parse_dimension("height", fields[3])?,
    };

    let description = fields
        .get(6)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(ItemRow {
        drawing_number: drawing_number.to_string(),
        description,
        dims,
        weight: parse_weight(fields.get(4).copied()),
        quantity: parse_quantity(fields.get(5).copied()),
    })
}

/// Parses delimited text into rows.
///
/// Blank lines and lines starting with `#` are skipped silently. If `delimiter`
/// is `None`, it is detected from the first content line. A header line fails the
/// dimension check and shows up in `dropped`.
///
/// With `,` as delimiter, decimal commas cannot be used.
pub fn parse_rows(text: &str, delimiter: Option<char>) -> ImportReport {
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(text));
    let mut report = ImportReport::default();

    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(delimiter).collect();
        match parse_row(&fields) {
            Ok(row) => report.rows.push(row),
            Err(rejection) => report.dropped.push(DroppedRow {
                line: index + 1,
                reason: rejection.to_string(),
            }),
        }
    }

    report
}
