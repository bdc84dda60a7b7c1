use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    api::directory::{Directory, Roster},
    core::{
        chart::{ChartPoint, PowerChart},
        energy::Component,
        raw::RawChart,
    },
    quantity::power::Watts,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

fn energy_cell(component: Component, kilowatt_hours: u64) -> Cell {
    let cell = Cell::new(kilowatt_hours).set_alignment(CellAlignment::Right);
    if kilowatt_hours == 0 {
        return cell.add_attribute(Attribute::Dim);
    }
    match component {
        Component::Production | Component::Injection => cell.fg(Color::Green),
        Component::Draw => cell.fg(Color::Red),
        Component::Consumption | Component::Total => cell,
    }
}

fn peak(points: &[ChartPoint]) -> Option<Watts> {
    points.iter().map(|point| Watts(point.y)).max()
}

/// Daily energy totals, one row per entity.
pub fn build_totals_table(charts: &[PowerChart], directory: &impl Directory) -> Table {
    let mut table = new_table();
    let mut header = vec!["Entity".to_owned(), "Samples".to_owned()];
    header.extend(Component::ALL.map(|component| format!("{}, kWh", component.caption())));
    header.push("Peak draw".to_owned());
    table.set_header(header);
    for chart in charts {
        let entity = match directory.caption(&chart.entity_id) {
            Some(caption) => format!("{}\n{caption}", chart.entity_id),
            None => chart.entity_id.to_string(),
        };
        let entity = Cell::new(entity);
        let mut row = vec![
            if chart.datasets.is_empty() { entity.add_attribute(Attribute::Dim) } else { entity },
            Cell::new(chart.datasets.len())
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
        ];
        row.extend(
            Component::ALL
                .map(|component| energy_cell(component, chart.totals.get(component))),
        );
        row.push(
            peak(chart.datasets.get(Component::Draw))
                .map_or_else(|| Cell::new("-"), Cell::new)
                .set_alignment(CellAlignment::Right),
        );
        table.add_row(row);
    }
    table
}

/// Channel overview of the raw series.
pub fn build_raw_table(charts: &[RawChart]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Entity", "Channel", "Points", "Min", "Max"]);
    for chart in charts {
        for dataset in &chart.datasets {
            let (min, max) = dataset
                .data
                .iter()
                .map(|point| Watts(point.y))
                .minmax()
                .into_option()
                .map_or_else(|| (Cell::new("-"), Cell::new("-")), |(min, max)| {
                    (Cell::new(min), Cell::new(max))
                });
            table.add_row(vec![
                Cell::new(&chart.entity_id),
                Cell::new(&dataset.label),
                Cell::new(dataset.data.len()).set_alignment(CellAlignment::Right),
                min.set_alignment(CellAlignment::Right),
                max.set_alignment(CellAlignment::Right),
            ]);
        }
    }
    table
}

/// Homes with their channels, then groups with their members.
pub fn build_roster_table(roster: &Roster) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Kind", "ID", "Caption", "Channels or members"]);
    for (entity_id, home) in &roster.homes.0 {
        table.add_row(vec![
            Cell::new("home").add_attribute(Attribute::Dim),
            Cell::new(entity_id),
            Cell::new(""),
            Cell::new(home.channels.join(", ")),
        ]);
    }
    for (group_id, group) in &roster.groups.0 {
        table.add_row(vec![
            Cell::new("group").fg(Color::Cyan),
            Cell::new(group_id),
            Cell::new(group.caption.as_deref().unwrap_or_default()),
            Cell::new(group.members.iter().join(", ")),
        ]);
    }
    table
}
