use std::fmt::Write as _;

use roster_core::RosterFormat;
use roster_core::core_api::{ImportUnit, ParseResult};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

const SHEET_WIDTH: usize = 59;
const QTY_COL_WIDTH: usize = 3;
const NAME_COL_WIDTH: usize = 44;
const POINTS_COL_WIDTH: usize = 8;
const CATEGORY_INDENT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    CanonicalV1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    #[default]
    SummarySheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRenderOptions {
    /// List each unit's categories under its row.
    pub verbose: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FieldSelection {
    pub name: bool,
    pub faction: bool,
    pub game_system: bool,
    pub points: bool,
    pub units: bool,
    pub generator: bool,
    pub revision: bool,
}

impl FieldSelection {
    pub fn is_any_selected(&self) -> bool {
        self.name
            || self.faction
            || self.game_system
            || self.points
            || self.units
            || self.generator
            || self.revision
    }

    /// `key`/`value` pairs for the selected fields, in fixed order.
    ///
    /// Units expand to one `unit` pair each.
    pub fn selected_pairs(&self, result: &ParseResult) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();

        if self.name {
            out.push(("name", result.list_name.clone()));
        }
        if self.faction {
            out.push(("faction", result.faction.clone()));
        }
        if self.game_system {
            out.push(("game_system", result.game_system.clone()));
        }
        if self.points {
            out.push(("points", format_points(result.total_points)));
        }
        if self.units {
            for unit in &result.units {
                out.push((
                    "unit",
                    format!(
                        "{}x {} ({} pts)",
                        unit.quantity,
                        unit.name,
                        format_points(unit.points_cost)
                    ),
                ));
            }
        }
        if self.generator {
            out.push(("generator", result.source.generator.clone()));
        }
        if self.revision {
            out.push(("revision", result.source.data_revision.clone()));
        }

        out
    }
}

pub fn render_json_full(result: &ParseResult, style: JsonStyle) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(default_json(result)),
    }
}

pub fn render_json_selected(
    result: &ParseResult,
    fields: &FieldSelection,
    style: JsonStyle,
) -> JsonValue {
    match style {
        JsonStyle::CanonicalV1 => JsonValue::Object(selected_json(fields, result)),
    }
}

/// `key=value` lines for the selected fields, one per line.
pub fn render_field_lines(result: &ParseResult, fields: &FieldSelection) -> String {
    let mut out = String::new();
    for (key, value) in fields.selected_pairs(result) {
        writeln!(&mut out, "{key}={value}").expect("writing to String cannot fail");
    }
    out
}

pub fn render_summary_sheet(result: &ParseResult) -> String {
    render_summary_sheet_with_options(result, TextRenderOptions::default())
}

pub fn render_summary_sheet_with_options(
    result: &ParseResult,
    options: TextRenderOptions,
) -> String {
    render_summary_sheet_impl(result, options)
}

pub fn render_text(result: &ParseResult, style: TextStyle) -> String {
    render_text_with_options(result, style, TextRenderOptions::default())
}

pub fn render_text_with_options(
    result: &ParseResult,
    style: TextStyle,
    options: TextRenderOptions,
) -> String {
    match style {
        TextStyle::SummarySheet => render_summary_sheet_impl(result, options),
    }
}

/// Short name of a format, as accepted by `--format`.
pub fn format_name(format: RosterFormat) -> &'static str {
    format.extension().trim_start_matches('.')
}

/// Whole values print without a fraction: `1930`, `95.5`.
pub fn format_points(points: f64) -> String {
    match whole_points(points) {
        Some(whole) => whole.to_string(),
        None => points.to_string(),
    }
}

/// Whole values become JSON integers so `1930.0` renders as `1930`.
pub fn points_to_json(points: f64) -> JsonValue {
    if let Some(whole) = whole_points(points) {
        return JsonValue::from(whole);
    }
    JsonNumber::from_f64(points).map_or(JsonValue::Null, JsonValue::Number)
}

fn whole_points(points: f64) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0;
    if points.fract() == 0.0 && points.abs() < LIMIT {
        Some(points as i64)
    } else {
        None
    }
}

fn selected_json(fields: &FieldSelection, result: &ParseResult) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();

    if fields.name {
        out.insert(
            "listName".to_string(),
            JsonValue::String(result.list_name.clone()),
        );
    }
    if fields.faction {
        out.insert(
            "faction".to_string(),
            JsonValue::String(result.faction.clone()),
        );
    }
    if fields.game_system {
        out.insert(
            "gameSystem".to_string(),
            JsonValue::String(result.game_system.clone()),
        );
    }
    if fields.points {
        out.insert("totalPoints".to_string(), points_to_json(result.total_points));
    }
    if fields.units {
        out.insert("units".to_string(), units_to_json(&result.units));
    }
    if fields.generator {
        out.insert(
            "generator".to_string(),
            JsonValue::String(result.source.generator.clone()),
        );
    }
    if fields.revision {
        out.insert(
            "dataRevision".to_string(),
            JsonValue::String(result.source.data_revision.clone()),
        );
    }

    out
}

fn default_json(result: &ParseResult) -> JsonMap<String, JsonValue> {
    let mut out = JsonMap::new();

    out.insert(
        "format".to_string(),
        JsonValue::String(format_name(result.format).to_string()),
    );
    out.insert(
        "listName".to_string(),
        JsonValue::String(result.list_name.clone()),
    );
    out.insert(
        "faction".to_string(),
        JsonValue::String(result.faction.clone()),
    );
    out.insert(
        "gameSystem".to_string(),
        JsonValue::String(result.game_system.clone()),
    );
    out.insert("totalPoints".to_string(), points_to_json(result.total_points));
    out.insert("units".to_string(), units_to_json(&result.units));

    let mut source = JsonMap::new();
    source.insert(
        "generator".to_string(),
        JsonValue::String(result.source.generator.clone()),
    );
    source.insert(
        "dataRevision".to_string(),
        JsonValue::String(result.source.data_revision.clone()),
    );
    out.insert("source".to_string(), JsonValue::Object(source));

    out
}

fn units_to_json(units: &[ImportUnit]) -> JsonValue {
    JsonValue::Array(units.iter().map(unit_to_json).collect())
}

fn unit_to_json(unit: &ImportUnit) -> JsonValue {
    let mut m = JsonMap::new();
    m.insert("name".to_string(), JsonValue::String(unit.name.clone()));
    m.insert("quantity".to_string(), JsonValue::from(unit.quantity));
    m.insert("pointsCost".to_string(), points_to_json(unit.points_cost));
    m.insert(
        "categories".to_string(),
        JsonValue::Array(
            unit.categories
                .iter()
                .map(|name| JsonValue::String(name.clone()))
                .collect(),
        ),
    );
    JsonValue::Object(m)
}

fn render_summary_sheet_impl(result: &ParseResult, options: TextRenderOptions) -> String {
    let subtitle = match (result.faction.is_empty(), result.game_system.is_empty()) {
        (false, false) => format!("{}  ::  {}", result.faction, result.game_system),
        (false, true) => result.faction.clone(),
        (true, false) => result.game_system.clone(),
        (true, true) => String::new(),
    };

    let mut out = String::new();
    writeln!(&mut out).expect("writing to String cannot fail");
    writeln!(
        &mut out,
        "{}",
        centered_no_trailing(&result.list_name, SHEET_WIDTH)
    )
    .expect("writing to String cannot fail");
    if !subtitle.is_empty() {
        writeln!(&mut out, "{}", centered_no_trailing(&subtitle, SHEET_WIDTH))
            .expect("writing to String cannot fail");
    }
    writeln!(&mut out).expect("writing to String cannot fail");

    let points_section = format!("  Points: {:<14}", format_points(result.total_points));
    let units_section = format!("Units: {:<11}", result.unit_count());
    writeln!(
        &mut out,
        "{}{}Format: {}",
        points_section, units_section, result.format
    )
    .expect("writing to String cannot fail");
    if !result.source.generator.is_empty() {
        writeln!(&mut out, "  Generator: {}", result.source.generator)
            .expect("writing to String cannot fail");
    }
    if !result.source.data_revision.is_empty() {
        writeln!(&mut out, "  Data revision: {}", result.source.data_revision)
            .expect("writing to String cannot fail");
    }
    writeln!(&mut out).expect("writing to String cannot fail");

    write_units_section(&mut out, result, options);
    out
}

fn write_units_section(out: &mut String, result: &ParseResult, options: TextRenderOptions) {
    writeln!(out, " ::: Units :::").expect("writing to String cannot fail");
    writeln!(out).expect("writing to String cannot fail");

    if result.units.is_empty() {
        writeln!(out, "  none").expect("writing to String cannot fail");
        return;
    }

    writeln!(
        out,
        "  {:>q$}  {:<n$}{:>p$}",
        "Qty",
        "Unit",
        "Points",
        q = QTY_COL_WIDTH,
        n = NAME_COL_WIDTH,
        p = POINTS_COL_WIDTH
    )
    .expect("writing to String cannot fail");

    for unit in &result.units {
        writeln!(
            out,
            "  {:>q$}  {:<n$}{:>p$}",
            unit.quantity,
            fit_column(&unit.name, NAME_COL_WIDTH - 1),
            format_points(unit.points_cost),
            q = QTY_COL_WIDTH,
            n = NAME_COL_WIDTH,
            p = POINTS_COL_WIDTH
        )
        .expect("writing to String cannot fail");
        if options.verbose && !unit.categories.is_empty() {
            writeln!(
                out,
                "{}{}",
                " ".repeat(CATEGORY_INDENT),
                unit.categories.join(", ")
            )
            .expect("writing to String cannot fail");
        }
    }

    let label_width = SHEET_WIDTH - POINTS_COL_WIDTH;
    writeln!(out, "{:>w$}", "-".repeat(POINTS_COL_WIDTH), w = SHEET_WIDTH)
        .expect("writing to String cannot fail");
    writeln!(
        out,
        "{:<l$}{:>p$}",
        "  Unit total",
        format_points(result.unit_points_total()),
        l = label_width,
        p = POINTS_COL_WIDTH
    )
    .expect("writing to String cannot fail");
    writeln!(
        out,
        "{:<l$}{:>p$}",
        "  Roster total",
        format_points(result.total_points),
        l = label_width,
        p = POINTS_COL_WIDTH
    )
    .expect("writing to String cannot fail");
}

fn fit_column(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }

    let mut out = String::with_capacity(width);
    for ch in value.chars().take(width - 3) {
        out.push(ch);
    }
    out.push_str("...");
    out
}

fn centered_no_trailing(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len >= width {
        return value.to_string();
    }

    let left_padding = (width - len) / 2;
    format!("{}{}", " ".repeat(left_padding), value)
}
