//! Spreadsheet ingestion: first worksheet, header row, typed records.
//!
//! Columns are located by header name, never by position. Any column the
//! analysis does not name is ignored.

use crate::{
    config::AnalysisConfig,
    error::{MetricsError, MetricsResult},
    marketing::MarketingCostRecord,
    transaction::TransactionRecord,
};
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::{collections::HashMap, path::Path};

pub const TRANSACTION_COLUMNS: [&str; 6] = [
    "user_id",
    "product_id",
    "purchase_date",
    "refunded",
    "country_code",
    "media_source",
];

pub const MARKETING_COST_COLUMNS: [&str; 4] = ["date", "country_code", "media_source", "costs"];

/// Which of the two exports a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Transactions,
    MarketingCosts,
}

impl InputKind {
    /// Route a bare file name to its input kind using the configured names.
    pub fn from_file_name(file_name: &str, config: &AnalysisConfig) -> MetricsResult<Self> {
        if file_name == config.transactions_file {
            Ok(InputKind::Transactions)
        } else if file_name == config.marketing_costs_file {
            Ok(InputKind::MarketingCosts)
        } else {
            log::warn!(
                "ingest: file name {file_name:?} is not a known input; check it is in the data directory"
            );
            Err(MetricsError::UnknownInputFile {
                file_name: file_name.to_string(),
                expected: config.input_files(),
            })
        }
    }
}

#[derive(Debug, Clone)]
pub enum InputTable {
    Transactions(Vec<TransactionRecord>),
    MarketingCosts(Vec<MarketingCostRecord>),
}

impl InputTable {
    pub fn len(&self) -> usize {
        match self {
            InputTable::Transactions(rows) => rows.len(),
            InputTable::MarketingCosts(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read `file_name` from `data_dir`, choosing the parser by file name.
pub fn load_input(
    data_dir: &Path,
    file_name: &str,
    config: &AnalysisConfig,
) -> MetricsResult<InputTable> {
    let kind = InputKind::from_file_name(file_name, config)?;
    let path = data_dir.join(file_name);
    let table = match kind {
        InputKind::Transactions => InputTable::Transactions(read_transactions(&path)?),
        InputKind::MarketingCosts => InputTable::MarketingCosts(read_marketing_costs(
            &path,
            &config.dropped_cost_columns,
        )?),
    };
    log::info!("ingest: {} rows from {}", table.len(), path.display());
    Ok(table)
}

pub fn read_transactions(path: &Path) -> MetricsResult<Vec<TransactionRecord>> {
    let range = read_first_sheet(path)?;
    let mut rows = range.rows();
    let header = Header::parse(path, rows.next())?;

    let user_col = header.index("user_id")?;
    let product_col = header.index("product_id")?;
    let date_col = header.index("purchase_date")?;
    let refunded_col = header.index("refunded")?;
    let country_col = header.index("country_code")?;
    let media_col = header.index("media_source")?;

    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        if is_blank(row) {
            continue;
        }
        // Spreadsheet row number: 1-based, after the header.
        let row_no = offset + 2;
        let user_id = required_text(row, user_col, "user_id", row_no)?;
        let product_id = required_text(row, product_col, "product_id", row_no)?;
        let purchase_date = cell(row, date_col)
            .and_then(cell_datetime)
            .ok_or_else(|| invalid(row, date_col, "purchase_date", row_no))?;
        let refunded = cell(row, refunded_col)
            .and_then(cell_bool)
            .ok_or_else(|| invalid(row, refunded_col, "refunded", row_no))?;

        records.push(TransactionRecord::new(
            user_id,
            product_id,
            purchase_date,
            refunded,
            cell(row, country_col).and_then(cell_text),
            cell(row, media_col).and_then(cell_text),
        ));
    }
    Ok(records)
}

pub fn read_marketing_costs(
    path: &Path,
    dropped_columns: &[String],
) -> MetricsResult<Vec<MarketingCostRecord>> {
    let range = read_first_sheet(path)?;
    let mut rows = range.rows();
    let header = Header::parse(path, rows.next())?;

    for name in dropped_columns {
        if header.columns.contains_key(name.as_str()) {
            log::debug!("ingest: dropping column {name} from {}", path.display());
        }
    }

    let date_col = header.index("date")?;
    let country_col = header.index("country_code")?;
    let media_col = header.index("media_source")?;
    let costs_col = header.index("costs")?;

    let mut records = Vec::new();
    for (offset, row) in rows.enumerate() {
        if is_blank(row) {
            continue;
        }
        let row_no = offset + 2;
        let date = cell(row, date_col)
            .and_then(cell_datetime)
            .map(|dt| dt.date())
            .ok_or_else(|| invalid(row, date_col, "date", row_no))?;
        let costs = cell(row, costs_col)
            .and_then(cell_f64)
            .ok_or_else(|| invalid(row, costs_col, "costs", row_no))?;

        records.push(MarketingCostRecord {
            date,
            country_code: cell(row, country_col).and_then(cell_text),
            media_source: cell(row, media_col).and_then(cell_text),
            costs,
        });
    }
    Ok(records)
}

fn read_first_sheet(path: &Path) -> MetricsResult<Range<Data>> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("{} has no worksheets", path.display()))?;
    Ok(workbook.worksheet_range(&sheet)?)
}

struct Header {
    file: String,
    columns: HashMap<String, usize>,
}

impl Header {
    fn parse(path: &Path, row: Option<&[Data]>) -> MetricsResult<Self> {
        let row = row.ok_or_else(|| anyhow::anyhow!("{} is empty", path.display()))?;
        let columns = row
            .iter()
            .enumerate()
            .filter_map(|(idx, c)| cell_text(c).map(|name| (name, idx)))
            .collect();
        Ok(Self {
            file: path.display().to_string(),
            columns,
        })
    }

    fn index(&self, column: &str) -> MetricsResult<usize> {
        self.columns
            .get(column)
            .copied()
            .ok_or_else(|| MetricsError::MissingColumn {
                file: self.file.clone(),
                column: column.to_string(),
            })
    }
}

fn cell(row: &[Data], idx: usize) -> Option<&Data> {
    row.get(idx)
}

fn is_blank(row: &[Data]) -> bool {
    row.iter().all(|c| matches!(c, Data::Empty))
}

fn required_text(row: &[Data], idx: usize, column: &str, row_no: usize) -> MetricsResult<String> {
    cell(row, idx)
        .and_then(cell_text)
        .ok_or_else(|| invalid(row, idx, column, row_no))
}

fn invalid(row: &[Data], idx: usize, column: &str, row_no: usize) -> MetricsError {
    MetricsError::InvalidCell {
        column: column.to_string(),
        row: row_no,
        value: cell(row, idx).map(|c| c.to_string()).unwrap_or_default(),
    }
}

/// Trimmed text of a cell; `None` for empty cells and blank strings.
pub(crate) fn cell_text(data: &Data) -> Option<String> {
    let text = match data {
        Data::Empty => return None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        // Whole-number ids come back as floats from xlsx.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
            format!("{f:.0}")
        }
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::Error(e) => format!("#ERROR:{e:?}"),
    };
    (!text.is_empty()).then_some(text)
}

pub(crate) fn cell_datetime(data: &Data) -> Option<NaiveDateTime> {
    match data {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::DateTimeIso(s) | Data::String(s) => parse_timestamp(s),
        _ => None,
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%d.%m.%Y %H:%M:%S",
    ];
    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d.%m.%Y"];

    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z"))
                .ok()
                .map(|dt| dt.naive_utc())
        })
}

pub(crate) fn cell_bool(data: &Data) -> Option<bool> {
    match data {
        Data::Bool(b) => Some(*b),
        Data::Int(0) => Some(false),
        Data::Int(1) => Some(true),
        Data::Float(f) if *f == 0.0 => Some(false),
        Data::Float(f) if *f == 1.0 => Some(true),
        Data::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn cell_f64(data: &Data) -> Option<f64> {
    match data {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => {
            let s = s.trim();
            // "1,234.50" groups thousands, "7,25" is a decimal comma.
            let normalized = if s.contains('.') {
                s.replace(',', "")
            } else {
                s.replace(',', ".")
            };
            normalized.parse().ok()
        }
        _ => None,
    }
}
