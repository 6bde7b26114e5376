use crate::config::ColumnSpan;

/// Quote a sheet name for A1 notation when it contains anything other than
/// ASCII letters, digits or underscores.
fn sheet_ref(sheet_name: &str) -> String {
    let plain = sheet_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_');
    match plain {
        true => sheet_name.to_string(),
        false => format!("'{}'", sheet_name.replace('\'', "''")),
    }
}

/// Whole-column range, e.g. `RSVP!A:C`.
pub fn column_range(sheet_name: &str, columns: &ColumnSpan) -> String {
    format!(
        "{}!{}:{}",
        sheet_ref(sheet_name),
        columns.start(),
        columns.end()
    )
}

/// Single-row range, e.g. `RSVP!A3:C3`. `row` is 1-based.
pub fn row_range(sheet_name: &str, columns: &ColumnSpan, row: usize) -> String {
    format!(
        "{}!{}{}:{}{}",
        sheet_ref(sheet_name),
        columns.start(),
        row,
        columns.end(),
        row
    )
}
