use serde::{Deserialize, Serialize};

use crate::format::RosterFormat;

/// One `unit` selection, flattened for import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportUnit {
    pub name: String,
    pub quantity: u32,
    pub points_cost: f64,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceMetadata {
    pub generator: String,
    pub data_revision: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub format: RosterFormat,
    pub list_name: String,
    pub faction: String,
    pub game_system: String,
    /// The roster's own points total. Not derived from `units`; the two may differ.
    pub total_points: f64,
    pub units: Vec<ImportUnit>,
    pub source: SourceMetadata,
}

impl ParseResult {
    /// Sum of the extracted units' points, for display alongside `total_points`.
    pub fn unit_points_total(&self) -> f64 {
        self.units.iter().map(|unit| unit.points_cost).sum()
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}
