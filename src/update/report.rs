//! Plain-text rendering of subject reports

use crate::update::subjects::SubjectReport;

const HEADERS: [&str; 4] = ["Name", "Current", "Latest", "Status"];

/// Render reports as an aligned text table, outdated rows marked with `!`
pub fn render_table(reports: &[SubjectReport]) -> String {
    let rows: Vec<[String; 4]> = reports
        .iter()
        .map(|r| {
            let status = if r.status.is_outdated() {
                format!("{} !", r.status.as_str())
            } else {
                r.status.as_str().to_string()
            };
            [
                r.name.clone(),
                r.current_version.clone(),
                r.latest_version.clone(),
                status,
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |cells: [&str; 4]| {
        let line = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ");
        format!("{}\n", line.trim_end())
    };

    let mut out = format_row(HEADERS);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format_row([
        &separator[0],
        &separator[1],
        &separator[2],
        &separator[3],
    ]));
    for row in &rows {
        out.push_str(&format_row([&row[0], &row[1], &row[2], &row[3]]));
    }
    out
}
