use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::model::CanonicalStatus;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn status_cell(status: CanonicalStatus) -> Cell {
    let color = match status {
        CanonicalStatus::Success => TableColor::Green,
        CanonicalStatus::Error => TableColor::Red,
        CanonicalStatus::Warning | CanonicalStatus::Pending => TableColor::Yellow,
        CanonicalStatus::Running => TableColor::Cyan,
        CanonicalStatus::Skipped => TableColor::DarkGrey,
    };
    Cell::new(status.capitalized()).fg(color)
}

pub fn optional_cell(value: Option<&str>, fallback: &str) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => Cell::new(fallback).fg(TableColor::DarkGrey),
    }
}
