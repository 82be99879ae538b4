//! Canonical roster model shared by the XML and JSON adapters.
//!
//! Field names follow the roster schema's camelCase spelling so the JSON
//! export deserializes straight into these types.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

pub const POINTS_TYPE_ID: &str = "points";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Roster {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub battle_scribe_version: String,
    pub generated_by: String,
    pub game_system_id: String,
    pub game_system_name: String,
    #[serde(deserialize_with = "text_or_number")]
    pub game_system_revision: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub costs: Vec<Cost>,
    #[serde(deserialize_with = "null_as_empty")]
    pub cost_limits: Vec<CostLimit>,
    #[serde(deserialize_with = "null_as_empty")]
    pub forces: Vec<Force>,
}

impl Roster {
    pub fn points(&self) -> f64 {
        points_value(&self.costs)
    }

    pub fn points_limit(&self) -> Option<f64> {
        self.cost_limits
            .iter()
            .find(|limit| limit.type_id == POINTS_TYPE_ID)
            .map(|limit| limit.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Force {
    pub id: String,
    pub name: String,
    pub entry_id: String,
    pub catalogue_id: String,
    #[serde(deserialize_with = "text_or_number")]
    pub catalogue_revision: String,
    pub catalogue_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub selections: Vec<Selection>,
    #[serde(deserialize_with = "null_as_empty")]
    pub forces: Vec<Force>,
    #[serde(deserialize_with = "null_as_empty")]
    pub categories: Vec<Category>,
    #[serde(deserialize_with = "null_as_empty")]
    pub costs: Vec<Cost>,
    #[serde(deserialize_with = "null_as_empty")]
    pub rules: Vec<Rule>,
}

impl Force {
    pub fn points(&self) -> f64 {
        points_value(&self.costs)
    }

    /// Direct selections typed `unit`, in document order.
    pub fn unit_selections(&self) -> impl Iterator<Item = &Selection> {
        self.selections.iter().filter(|s| s.kind.is_unit())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selection {
    pub id: String,
    pub name: String,
    pub entry_id: String,
    pub entry_group_id: String,
    #[serde(deserialize_with = "whole_quantity")]
    pub number: u32,
    #[serde(rename = "type")]
    pub kind: SelectionKind,
    pub from: SelectionSource,
    #[serde(deserialize_with = "null_as_empty")]
    pub selections: Vec<Selection>,
    #[serde(deserialize_with = "null_as_empty")]
    pub categories: Vec<Category>,
    #[serde(deserialize_with = "null_as_empty")]
    pub costs: Vec<Cost>,
    #[serde(deserialize_with = "null_as_empty")]
    pub profiles: Vec<Profile>,
    #[serde(deserialize_with = "null_as_empty")]
    pub rules: Vec<Rule>,
}

impl Selection {
    pub fn points(&self) -> f64 {
        points_value(&self.costs)
    }

    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cost {
    pub name: String,
    pub type_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostLimit {
    pub name: String,
    pub type_id: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub id: String,
    pub entry_id: String,
    pub name: String,
    pub primary: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub type_id: String,
    pub type_name: String,
    pub hidden: bool,
    #[serde(deserialize_with = "null_as_empty")]
    pub characteristics: Vec<Characteristic>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Characteristic {
    pub name: String,
    pub type_id: String,
    #[serde(rename = "$text", deserialize_with = "text_or_number")]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub hidden: bool,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectionKind {
    Unit,
    #[default]
    Upgrade,
    Model,
    Other(String),
}

impl SelectionKind {
    pub const UNIT_RAW: &'static str = "unit";
    pub const UPGRADE_RAW: &'static str = "upgrade";
    pub const MODEL_RAW: &'static str = "model";

    pub fn from_raw(raw: &str) -> Self {
        match raw {
            Self::UNIT_RAW => Self::Unit,
            Self::UPGRADE_RAW => Self::Upgrade,
            Self::MODEL_RAW => Self::Model,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Unit => Self::UNIT_RAW,
            Self::Upgrade => Self::UPGRADE_RAW,
            Self::Model => Self::MODEL_RAW,
            Self::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Self::Unit)
    }
}

impl From<String> for SelectionKind {
    fn from(raw: String) -> Self {
        Self::from_raw(&raw)
    }
}

impl From<SelectionKind> for String {
    fn from(kind: SelectionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a selection came from a plain entry or an entry group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectionSource {
    #[default]
    Entry,
    Group,
    Other(String),
}

impl SelectionSource {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "entry" => Self::Entry,
            "group" => Self::Group,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Entry => "entry",
            Self::Group => "group",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for SelectionSource {
    fn from(raw: String) -> Self {
        Self::from_raw(&raw)
    }
}

impl From<SelectionSource> for String {
    fn from(source: SelectionSource) -> Self {
        source.as_str().to_string()
    }
}

/// Value of the first `points` cost, or 0 when there is none.
pub fn points_value(costs: &[Cost]) -> f64 {
    costs
        .iter()
        .find(|cost| cost.type_id == POINTS_TYPE_ID)
        .map_or(0.0, |cost| cost.value)
}

/// `number` as a whole count; integral decimals such as `2.0` are accepted.
pub fn quantity_from_f64(value: f64) -> Option<u32> {
    if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
        Some(value as u32)
    } else {
        None
    }
}

fn whole_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(u64),
        Float(f64),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Integer(n) => u32::try_from(n)
            .map_err(|_| D::Error::custom(format!("quantity {n} is out of range"))),
        Raw::Float(n) => quantity_from_f64(n)
            .ok_or_else(|| D::Error::custom(format!("quantity {n} is not a whole number"))),
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// Exporters disagree on whether revisions and versions are strings or numbers.
fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(text)) => text,
        Some(Raw::Integer(n)) => n.to_string(),
        Some(Raw::Float(n)) => n.to_string(),
        None => String::new(),
    })
}
