use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    cache::{CacheStats, Partition},
    core::{clock::REFERENCE_ZONE, document::PriceDocument, error::ErrorResponse, window::QueryWindow},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

/// Price table in the reference zone, prices above the mean are red.
pub fn build_prices_table(document: &PriceDocument) -> Table {
    let mean_price = document.mean_price().unwrap_or_default();

    let mut table = new_table();
    table.set_header(vec!["Date", "Start", "UTC", "Price", "Currency", "Unit"]);
    for period in &document.periods {
        for point in &period.points {
            let local_hour = point.hour.with_timezone::<Tz>(&REFERENCE_ZONE);
            table.add_row(vec![
                Cell::new(local_hour.format("%b %d")).add_attribute(Attribute::Dim),
                Cell::new(local_hour.format("%H:%M")),
                Cell::new(point.hour.format("%H:%M")).add_attribute(Attribute::Dim),
                Cell::new(point.price).set_alignment(CellAlignment::Right).fg(
                    if point.price >= mean_price { Color::Red } else { Color::Green },
                ),
                Cell::new(&period.currency).add_attribute(Attribute::Dim),
                Cell::new(&period.unit).add_attribute(Attribute::Dim),
            ]);
        }
    }
    table
}

pub fn build_window_table(window: &QueryWindow, partition: Partition) -> Table {
    let mut table = new_table();
    table.set_header(vec!["periodStart", "periodEnd", "Days", "Partition"]);
    table.add_row(vec![
        Cell::new(window.period_start()),
        Cell::new(window.period_end()),
        Cell::new(window.n_days()).set_alignment(CellAlignment::Right),
        Cell::new(partition).fg(match partition {
            Partition::DayAhead => Color::DarkYellow,
            Partition::History => Color::Reset,
        }),
    ]);
    table
}

pub fn build_error_table(response: &ErrorResponse) -> Table {
    let mut table = new_table();
    table.set_header(vec![Cell::new(&response.message).fg(Color::Red), Cell::new("")]);
    for detail in response.details.iter().flatten() {
        table.add_row(vec![
            Cell::new(&detail.field).add_attribute(Attribute::Bold),
            Cell::new(&detail.message),
        ]);
    }
    table
}

pub fn build_cache_table(stats: CacheStats) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Hits", "Misses", "Day-ahead", "History"]);
    table.add_row(vec![
        Cell::new(stats.n_hits).fg(Color::Green),
        Cell::new(stats.n_misses).fg(Color::Red),
        Cell::new(stats.n_day_ahead),
        Cell::new(stats.n_history),
    ]);
    table
}
