use crate::core_api::{CoreError, CoreErrorCode, ImportUnit, ParseResult, SourceMetadata};
use crate::format::RosterFormat;
use crate::roster::{Force, Roster, Selection};

/// Flattens a roster into caller-facing units plus list metadata.
///
/// Only the first top-level force is read. Its own `unit` selections come
/// first, then those of each nested force in document order, recursing
/// pre-order through deeper nesting. Selections inside a selection are never
/// visited.
pub fn extract(roster: &Roster, format: RosterFormat) -> Result<ParseResult, CoreError> {
    let Some(force) = roster.forces.first() else {
        return Err(CoreError::new(
            CoreErrorCode::NoForces,
            format!("roster {:?} has no forces", roster.name),
        ));
    };
    if roster.forces.len() > 1 {
        log::debug!(
            "roster {:?} has {} top-level forces; only the first is imported",
            roster.name,
            roster.forces.len()
        );
    }

    let units = extract_units(force);
    log::debug!(
        "extracted {} units from force {:?} ({} nested forces)",
        units.len(),
        force.name,
        force.forces.len()
    );

    Ok(ParseResult {
        format,
        list_name: roster.name.clone(),
        faction: force.catalogue_name.clone(),
        game_system: roster.game_system_name.clone(),
        total_points: roster.points(),
        units,
        source: SourceMetadata {
            generator: generator_label(roster),
            data_revision: roster.game_system_revision.clone(),
        },
    })
}

pub fn extract_units(force: &Force) -> Vec<ImportUnit> {
    let mut out = Vec::new();
    collect_force_units(force, &mut out);
    out
}

fn collect_force_units(force: &Force, out: &mut Vec<ImportUnit>) {
    out.extend(force.unit_selections().map(import_unit));
    for nested in &force.forces {
        collect_force_units(nested, out);
    }
}

fn import_unit(selection: &Selection) -> ImportUnit {
    ImportUnit {
        name: selection.name.clone(),
        quantity: selection.number,
        points_cost: selection.points(),
        categories: selection.category_names(),
    }
}

fn generator_label(roster: &Roster) -> String {
    if !roster.generated_by.is_empty() {
        return roster.generated_by.clone();
    }
    if !roster.battle_scribe_version.is_empty() {
        return format!("BattleScribe {}", roster.battle_scribe_version);
    }
    String::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{Category, Cost, SelectionKind};

    fn selection(name: &str, kind: SelectionKind, number: u32, points: Option<f64>) -> Selection {
        Selection {
            name: name.to_string(),
            kind,
            number,
            costs: points
                .map(|value| {
                    vec![Cost {
                        name: "pts".to_string(),
                        type_id: "points".to_string(),
                        value,
                    }]
                })
                .unwrap_or_default(),
            ..Selection::default()
        }
    }

    fn unit(name: &str, points: f64) -> Selection {
        selection(name, SelectionKind::Unit, 1, Some(points))
    }

    fn force(name: &str, selections: Vec<Selection>, forces: Vec<Force>) -> Force {
        Force {
            name: name.to_string(),
            catalogue_name: "Testers".to_string(),
            selections,
            forces,
            ..Force::default()
        }
    }

    fn names(units: &[ImportUnit]) -> Vec<&str> {
        units.iter().map(|u| u.name.as_str()).collect()
    }

    #[test]
    fn top_level_units_precede_regiment_units() {
        let army = force(
            "Army",
            vec![
                selection("Battle Traits", SelectionKind::Upgrade, 1, None),
                unit("Totem", 20.0),
                unit("Lone Hero", 100.0),
            ],
            vec![
                force("Regiment 1", vec![unit("A", 1.0), unit("B", 2.0)], vec![]),
                force("Regiment 2", vec![unit("C", 3.0)], vec![]),
            ],
        );

        let units = extract_units(&army);
        assert_eq!(names(&units), vec!["Totem", "Lone Hero", "A", "B", "C"]);
    }

    #[test]
    fn deeper_nesting_is_visited_pre_order() {
        let army = force(
            "Army",
            vec![unit("Top", 1.0)],
            vec![
                force(
                    "Outer",
                    vec![unit("Outer Unit", 1.0)],
                    vec![force("Inner", vec![unit("Inner Unit", 1.0)], vec![])],
                ),
                force("Sibling", vec![unit("Sibling Unit", 1.0)], vec![]),
            ],
        );

        let units = extract_units(&army);
        assert_eq!(
            names(&units),
            vec!["Top", "Outer Unit", "Inner Unit", "Sibling Unit"]
        );
    }

    #[test]
    fn nested_selections_are_never_emitted() {
        let mut boss = unit("Boss", 150.0);
        boss.selections = vec![
            selection("General", SelectionKind::Upgrade, 1, Some(0.0)),
            unit("Bodyguard", 60.0),
            selection("Boss Model", SelectionKind::Model, 1, None),
        ];
        let army = force("Army", vec![boss], vec![]);

        let units = extract_units(&army);
        assert_eq!(names(&units), vec!["Boss"]);
        assert_eq!(units[0].points_cost, 150.0);
    }

    #[test]
    fn missing_points_cost_is_zero() {
        let army = force(
            "Army",
            vec![selection("Free Unit", SelectionKind::Unit, 3, None)],
            vec![],
        );
        let units = extract_units(&army);
        assert_eq!(units[0].points_cost, 0.0);
        assert_eq!(units[0].quantity, 3);
    }

    #[test]
    fn categories_are_own_and_verbatim() {
        let mut hero = unit("Hero", 10.0);
        hero.categories = ["HERO", "INFANTRY", "HERO"]
            .into_iter()
            .map(|name| Category {
                name: name.to_string(),
                ..Category::default()
            })
            .collect();
        hero.selections = vec![Selection {
            categories: vec![Category {
                name: "WIZARD".to_string(),
                ..Category::default()
            }],
            ..selection("Upgrade", SelectionKind::Upgrade, 1, None)
        }];

        let units = extract_units(&force("Army", vec![hero], vec![]));
        assert_eq!(units[0].categories, vec!["HERO", "INFANTRY", "HERO"]);
    }

    #[test]
    fn same_name_units_are_not_merged() {
        let mut second = unit("Gutrippaz", 160.0);
        second.number = 2;
        let army = force("Army", vec![unit("Gutrippaz", 320.0), second], vec![]);

        let units = extract_units(&army);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].points_cost, 320.0);
        assert_eq!(units[1].points_cost, 160.0);
        assert_eq!(units[1].quantity, 2);
    }

    #[test]
    fn total_points_come_from_roster_not_units() {
        let roster = Roster {
            name: "Mismatch".to_string(),
            game_system_name: "Test System".to_string(),
            costs: vec![Cost {
                name: "pts".to_string(),
                type_id: "points".to_string(),
                value: 500.0,
            }],
            forces: vec![force("Army", vec![unit("Only", 100.0)], vec![])],
            ..Roster::default()
        };

        let result = extract(&roster, RosterFormat::Json).expect("roster should extract");
        assert_eq!(result.total_points, 500.0);
        assert_eq!(result.unit_points_total(), 100.0);
        assert_eq!(result.faction, "Testers");
    }

    #[test]
    fn only_first_force_is_used() {
        let roster = Roster {
            forces: vec![
                force("First", vec![unit("Kept", 1.0)], vec![]),
                force("Second", vec![unit("Ignored", 1.0)], vec![]),
            ],
            ..Roster::default()
        };
        let result = extract(&roster, RosterFormat::Xml).expect("roster should extract");
        assert_eq!(names(&result.units), vec!["Kept"]);
    }

    #[test]
    fn empty_forces_is_an_error() {
        let err = extract(&Roster::default(), RosterFormat::Xml).expect_err("no forces");
        assert_eq!(err.code, CoreErrorCode::NoForces);
    }

    #[test]
    fn generator_falls_back_to_battlescribe_version() {
        let mut roster = Roster {
            battle_scribe_version: "2.03".to_string(),
            forces: vec![force("Army", vec![], vec![])],
            ..Roster::default()
        };
        let result = extract(&roster, RosterFormat::Xml).expect("roster should extract");
        assert_eq!(result.source.generator, "BattleScribe 2.03");

        roster.generated_by = "https://newrecruit.eu".to_string();
        let result = extract(&roster, RosterFormat::Xml).expect("roster should extract");
        assert_eq!(result.source.generator, "https://newrecruit.eu");
    }
}
