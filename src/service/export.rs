//! CSV export of a board snapshot.

use chrono::SecondsFormat;

use crate::domain::{Board, SLOT_COUNT};

/// Suggested download name for the export.
pub const EXPORT_FILENAME: &str = "rifa_export.csv";

/// Header row of the export.
const HEADER: [&str; 3] = ["number", "name", "time"];

/// Render the board as CSV: a header row, then one row per slot in numbering
/// order. Every field is quoted, embedded quotes are doubled, and free slots
/// have empty name and time.
#[must_use]
pub fn export_csv(board: &Board) -> String {
    let mut rows = Vec::with_capacity(SLOT_COUNT + 1);
    rows.push(csv_row(HEADER));

    for (slot, reservation) in board.iter() {
        let (name, time) = reservation.map_or_else(
            || (String::new(), String::new()),
            |r| {
                (
                    r.participant_name.clone(),
                    r.reserved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                )
            },
        );
        rows.push(csv_row([slot.to_string(), name, time]));
    }

    rows.join("\n")
}

fn csv_row<S: AsRef<str>>(fields: [S; 3]) -> String {
    fields
        .iter()
        .map(|field| quote(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
