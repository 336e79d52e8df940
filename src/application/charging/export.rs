//! CSV rendering of the session export

use crate::domain::ExportRow;

/// Header row of the export, in column order
pub const CSV_HEADER: [&str; 4] = [
    "start_percentage",
    "start_datetime",
    "end_percentage",
    "end_datetime",
];

/// Suggested download name for the export
pub const CSV_FILENAME: &str = "charging_sessions.csv";

const LINE_TERMINATOR: &str = "\r\n";

/// Render rows as CSV with a header line and CRLF terminators.
///
/// Fields are integers or RFC 3339 timestamps, so none needs quoting.
pub fn render_csv(rows: &[ExportRow]) -> String {
    let mut out = String::with_capacity(64 * (rows.len() + 1));
    out.push_str(&CSV_HEADER.join(","));
    out.push_str(LINE_TERMINATOR);
    for row in rows {
        let fields = [
            row.start_percentage.as_str(),
            row.start_datetime.as_str(),
            row.end_percentage.as_str(),
            row.end_datetime.as_str(),
        ];
        out.push_str(&fields.join(","));
        out.push_str(LINE_TERMINATOR);
    }
    out
}
