//! Terminal tables

use comfy_table::{presets, Cell, ColumnConstraint, ContentArrangement, Table, Width};
use kwconvert_policy::{SummaryEntry, SupportEntry};

const NOTES_WIDTH: u16 = 50;

fn create_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .set_header(header)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .load_preset(presets::ASCII_MARKDOWN);

    table
}

/// Render the per-rule conversion summary
pub fn render_summary(entries: &[SummaryEntry]) -> String {
    let mut table = create_table(vec!["ID", "STATUS", "NOTES"]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(entry.status),
            Cell::new(&entry.notes),
        ]);
    }

    if let Some(column) = table.column_mut(2) {
        column.set_constraint(ColumnConstraint::UpperBoundary(Width::Fixed(NOTES_WIDTH)));
    }

    table.to_string()
}

/// Render the criterion support matrix
pub fn render_support(entries: &[SupportEntry]) -> String {
    let mut table = create_table(vec![
        "CRITERION", "NAME", "SUPPORTED", "VALUE", "OPERATORS", "MODULE",
    ]);

    for entry in entries {
        let operators = if entry.operators.is_empty() {
            "-".to_string()
        } else {
            entry.operators.join(",")
        };
        let modules = if entry.modules.is_empty() {
            "-".to_string()
        } else {
            entry.modules.join("\n")
        };

        table.add_row(vec![
            Cell::new(&entry.display_name),
            Cell::new(&entry.name),
            Cell::new(if entry.supported { "yes" } else { "no" }),
            Cell::new(entry.value_shape),
            Cell::new(operators),
            Cell::new(modules),
        ]);
    }

    table.to_string()
}
