//! Adapters from the two source documents into the canonical [`Roster`].

use serde_json::Value as JsonValue;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::roster::{
    Category, Characteristic, Cost, CostLimit, Force, Profile, Roster, Rule, Selection,
    SelectionKind, SelectionSource, quantity_from_f64,
};
use crate::xml::{ROOT_ELEMENT, XmlNode};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A parsed source document, before schema unification.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceDocument {
    Xml(XmlNode),
    Json(JsonValue),
}

impl SourceDocument {
    pub fn into_roster(self) -> Result<Roster, CoreError> {
        match self {
            Self::Xml(node) => roster_from_xml(&node),
            Self::Json(value) => roster_from_json(value),
        }
    }
}

/// Parses JSON export bytes, keeping the parser's line/column on failure.
pub fn parse_json_document(bytes: &[u8]) -> Result<JsonValue, CoreError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    serde_json::from_slice(bytes).map_err(|e| {
        let err = CoreError::new(CoreErrorCode::JsonSyntax, format!("invalid JSON: {e}"));
        if e.line() > 0 {
            err.at(e.line(), e.column())
        } else {
            err
        }
    })
}

pub fn roster_from_json(document: JsonValue) -> Result<Roster, CoreError> {
    let JsonValue::Object(mut top) = document else {
        return Err(CoreError::new(
            CoreErrorCode::InvalidRoster,
            "JSON export must be an object with a `roster` member",
        ));
    };
    let roster = top.remove(ROOT_ELEMENT).ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::InvalidRoster,
            "JSON export has no `roster` member",
        )
    })?;
    if !roster.is_object() {
        return Err(CoreError::new(
            CoreErrorCode::InvalidRoster,
            "JSON `roster` member is not an object",
        ));
    }

    serde_json::from_value(roster).map_err(|e| {
        CoreError::new(
            CoreErrorCode::InvalidRoster,
            format!("JSON roster does not match the roster schema: {e}"),
        )
    })
}

pub fn roster_from_xml(node: &XmlNode) -> Result<Roster, CoreError> {
    if node.name != ROOT_ELEMENT {
        return Err(CoreError::new(
            CoreErrorCode::InvalidRoster,
            format!(
                "expected <{ROOT_ELEMENT}> element, found <{}>",
                node.name
            ),
        ));
    }

    Ok(Roster {
        id: text_attr(node, "id"),
        name: text_attr(node, "name"),
        battle_scribe_version: text_attr(node, "battleScribeVersion"),
        generated_by: text_attr(node, "generatedBy"),
        game_system_id: text_attr(node, "gameSystemId"),
        game_system_name: text_attr(node, "gameSystemName"),
        game_system_revision: text_attr(node, "gameSystemRevision"),
        costs: costs_from_xml(node)?,
        cost_limits: node
            .collection("costLimits", "costLimit")
            .iter()
            .map(|limit| -> Result<CostLimit, CoreError> {
                Ok(CostLimit {
                    name: text_attr(limit, "name"),
                    type_id: text_attr(limit, "typeId"),
                    value: decimal_attr(limit, "value")?,
                })
            })
            .collect::<Result<_, _>>()?,
        forces: node
            .collection("forces", "force")
            .iter()
            .map(force_from_xml)
            .collect::<Result<_, _>>()?,
    })
}

fn force_from_xml(node: &XmlNode) -> Result<Force, CoreError> {
    Ok(Force {
        id: text_attr(node, "id"),
        name: text_attr(node, "name"),
        entry_id: text_attr(node, "entryId"),
        catalogue_id: text_attr(node, "catalogueId"),
        catalogue_revision: text_attr(node, "catalogueRevision"),
        catalogue_name: text_attr(node, "catalogueName"),
        selections: node
            .collection("selections", "selection")
            .iter()
            .map(selection_from_xml)
            .collect::<Result<_, _>>()?,
        forces: node
            .collection("forces", "force")
            .iter()
            .map(force_from_xml)
            .collect::<Result<_, _>>()?,
        categories: categories_from_xml(node),
        costs: costs_from_xml(node)?,
        rules: rules_from_xml(node),
    })
}

fn selection_from_xml(node: &XmlNode) -> Result<Selection, CoreError> {
    Ok(Selection {
        id: text_attr(node, "id"),
        name: text_attr(node, "name"),
        entry_id: text_attr(node, "entryId"),
        entry_group_id: text_attr(node, "entryGroupId"),
        number: count_attr(node, "number")?,
        kind: node
            .attr("type")
            .map(SelectionKind::from_raw)
            .unwrap_or_default(),
        from: node
            .attr("from")
            .map(SelectionSource::from_raw)
            .unwrap_or_default(),
        selections: node
            .collection("selections", "selection")
            .iter()
            .map(selection_from_xml)
            .collect::<Result<_, _>>()?,
        categories: categories_from_xml(node),
        costs: costs_from_xml(node)?,
        profiles: profiles_from_xml(node),
        rules: rules_from_xml(node),
    })
}

fn costs_from_xml(node: &XmlNode) -> Result<Vec<Cost>, CoreError> {
    node.collection("costs", "cost")
        .iter()
        .map(|cost| -> Result<Cost, CoreError> {
            Ok(Cost {
                name: text_attr(cost, "name"),
                type_id: text_attr(cost, "typeId"),
                value: decimal_attr(cost, "value")?,
            })
        })
        .collect()
}

fn categories_from_xml(node: &XmlNode) -> Vec<Category> {
    node.collection("categories", "category")
        .iter()
        .map(|category| Category {
            id: text_attr(category, "id"),
            entry_id: text_attr(category, "entryId"),
            name: text_attr(category, "name"),
            primary: flag_attr(category, "primary"),
        })
        .collect()
}

fn profiles_from_xml(node: &XmlNode) -> Vec<Profile> {
    node.collection("profiles", "profile")
        .iter()
        .map(|profile| Profile {
            id: text_attr(profile, "id"),
            name: text_attr(profile, "name"),
            type_id: text_attr(profile, "typeId"),
            type_name: text_attr(profile, "typeName"),
            hidden: flag_attr(profile, "hidden"),
            characteristics: profile
                .collection("characteristics", "characteristic")
                .iter()
                .map(|characteristic| Characteristic {
                    name: text_attr(characteristic, "name"),
                    type_id: text_attr(characteristic, "typeId"),
                    value: characteristic.text().unwrap_or_default().to_string(),
                })
                .collect(),
        })
        .collect()
}

fn rules_from_xml(node: &XmlNode) -> Vec<Rule> {
    node.collection("rules", "rule")
        .iter()
        .map(|rule| Rule {
            id: text_attr(rule, "id"),
            name: text_attr(rule, "name"),
            hidden: flag_attr(rule, "hidden"),
            description: rule
                .child("description")
                .and_then(XmlNode::text)
                .unwrap_or_default()
                .to_string(),
        })
        .collect()
}

fn text_attr(node: &XmlNode, name: &str) -> String {
    node.attr(name).unwrap_or_default().to_string()
}

fn flag_attr(node: &XmlNode, name: &str) -> bool {
    node.attr(name) == Some("true")
}

fn decimal_attr(node: &XmlNode, field: &str) -> Result<f64, CoreError> {
    let Some(raw) = node.attr(field) else {
        return Ok(0.0);
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(malformed_number(node, field, raw)),
    }
}

fn count_attr(node: &XmlNode, field: &str) -> Result<u32, CoreError> {
    let Some(raw) = node.attr(field) else {
        return Ok(0);
    };
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<u32>() {
        return Ok(value);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(quantity_from_f64)
        .ok_or_else(|| malformed_number(node, field, raw))
}

fn malformed_number(node: &XmlNode, field: &str, raw: &str) -> CoreError {
    let owner = node
        .attr("name")
        .map(|name| format!("<{} name={name:?}>", node.name))
        .unwrap_or_else(|| format!("<{}>", node.name));
    CoreError::new(
        CoreErrorCode::MalformedNumber,
        format!("attribute `{field}` on {owner} is not a number: {raw:?}"),
    )
}
