//! Table formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use portcullis::PolicyRule;

use super::colors::SemanticStyle;

fn styled_table(columns: &[&str]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = columns
        .iter()
        .map(|col| {
            if super::no_color() {
                Cell::new(col)
            } else {
                Cell::new(col).add_attribute(Attribute::Bold).fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header_cells);

    table
}

/// Creates a table of policy tuples.
pub fn policy_table(rules: &[PolicyRule]) -> Table {
    let mut table = styled_table(&["Subject", "Object", "Action", "Effect"]);
    for rule in rules {
        table.add_row(vec![
            rule.subject.as_str(),
            rule.object.as_str(),
            rule.action.as_str(),
            rule.effect.as_str(),
        ]);
    }
    table
}

/// Prints policy tuples with a count footer.
pub fn print_policy_table(rules: &[PolicyRule]) {
    if rules.is_empty() {
        println!("{}", "No policies.".muted());
        return;
    }

    println!("{}", policy_table(rules));

    let count = rules.len();
    let word = if count == 1 { "policy" } else { "policies" };
    println!("{}", format!("({count} {word})").muted());
}
