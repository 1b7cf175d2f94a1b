//! ROMI spreadsheet export.

use crate::{
    error::{MetricsError, MetricsResult},
    romi_metric::RomiTable,
    store::DATE_FORMAT,
};
use std::path::Path;
use umya_spreadsheet::Spreadsheet;

pub const ROMI_HEADER: [&str; 6] = ["date", "country_code", "media_source", "amount", "costs", "romi"];

const SHEET_NAME: &str = "Sheet1";

/// Lay the table out on the first sheet of a new workbook.
///
/// Row 1 is the header; `romi` stays blank for zero-cost segments.
pub fn romi_workbook(table: &RomiTable) -> MetricsResult<Spreadsheet> {
    let mut book = umya_spreadsheet::new_file();
    let ws = book
        .get_sheet_by_name_mut(SHEET_NAME)
        .ok_or_else(|| anyhow::anyhow!("new workbook has no {SHEET_NAME}"))?;

    for (idx, title) in ROMI_HEADER.iter().enumerate() {
        ws.get_cell_mut((idx as u32 + 1, 1)).set_value_string(*title);
    }

    for (offset, row) in table.rows.iter().enumerate() {
        let r = offset as u32 + 2;
        ws.get_cell_mut((1, r))
            .set_value_string(row.date.format(DATE_FORMAT).to_string());
        ws.get_cell_mut((2, r)).set_value_string(row.country_code.as_str());
        ws.get_cell_mut((3, r)).set_value_string(row.media_source.as_str());
        ws.get_cell_mut((4, r)).set_value_number(row.revenue);
        ws.get_cell_mut((5, r)).set_value_number(row.costs);
        if let Some(romi) = row.romi {
            ws.get_cell_mut((6, r)).set_value_number(romi);
        }
    }
    Ok(book)
}

/// Write the table to `path` as xlsx. Returns the number of data rows.
pub fn write_romi_table(table: &RomiTable, path: &Path) -> MetricsResult<usize> {
    let book = romi_workbook(table)?;
    umya_spreadsheet::writer::xlsx::write(&book, path)
        .map_err(|e| MetricsError::SpreadsheetWrite(format!("{}: {e}", path.display())))?;
    log::info!("export: {} ROMI rows written to {}", table.rows.len(), path.display());
    Ok(table.rows.len())
}
