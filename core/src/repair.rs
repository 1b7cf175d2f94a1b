//! Raw marketing export repair.
//!
//! The raw cost export hides the real spend in the number format of one
//! column instead of its value. Repair copies each data row's format code,
//! unescaped and upper-cased, into a target column and saves a fixed copy
//! that ingestion can read.

use crate::{
    config::RepairConfig,
    error::{MetricsError, MetricsResult},
};
use std::path::Path;
use umya_spreadsheet::Worksheet;

/// Strip escape backslashes and upper-case: `\1\2\.\5` → `12.5`.
pub fn normalize_format_code(code: &str) -> String {
    code.replace('\\', "").to_uppercase()
}

/// Repair data rows (row 2 onward) in place. Returns the rows written.
///
/// Rows whose source cell is missing or formatted `General` are skipped.
pub fn repair_worksheet(ws: &mut Worksheet, source_column: &str, target_column: &str) -> usize {
    let last_row = ws.get_highest_row();
    let mut repaired = 0;
    for row in 2..=last_row {
        let code = ws
            .get_cell(format!("{source_column}{row}").as_str())
            .and_then(|cell| cell.get_style().get_number_format())
            .map(|nf| nf.get_format_code().to_string());
        let Some(code) = code.filter(|c| !c.eq_ignore_ascii_case("general")) else {
            continue;
        };
        ws.get_cell_mut(format!("{target_column}{row}").as_str())
            .set_value(normalize_format_code(&code));
        repaired += 1;
    }
    repaired
}

/// Read `input`, repair its first sheet, write the result to `output`.
pub fn repair_cost_sheet(input: &Path, output: &Path, repair: &RepairConfig) -> MetricsResult<usize> {
    let mut book = umya_spreadsheet::reader::xlsx::read(input)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", input.display()))?;
    let ws = book
        .get_sheet_mut(&0)
        .ok_or_else(|| anyhow::anyhow!("{} has no worksheets", input.display()))?;

    let repaired = repair_worksheet(ws, &repair.source_column, &repair.target_column);

    umya_spreadsheet::writer::xlsx::write(&book, output)
        .map_err(|e| MetricsError::SpreadsheetWrite(format!("{}: {e}", output.display())))?;
    log::info!(
        "repair: {repaired} rows of {} → {}",
        input.display(),
        output.display()
    );
    Ok(repaired)
}
