//! CSV import/export template for bulk scan data
//!
//! Reading is split in two: [`read_scan_rows`] maps columns (English or
//! Thai headers) and keeps raw cell text; [`validate_row`] checks one row
//! against a [`CatalogSnapshot`] loaded once per file by the caller.

use std::collections::HashMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WmsError};
use crate::messages;
use crate::model::{Barcode, Notes};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One column of the fixed import template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateColumn {
    pub name: &'static str,
    pub thai_name: &'static str,
    pub required: bool,
}

pub const TEMPLATE_COLUMNS: [TemplateColumn; 4] = [
    TemplateColumn {
        name: "barcode",
        thai_name: "บาร์โค้ด",
        required: true,
    },
    TemplateColumn {
        name: "main_job_id",
        thai_name: "ID_ประเภทงานหลัก",
        required: true,
    },
    TemplateColumn {
        name: "sub_job_id",
        thai_name: "ID_ประเภทงานย่อย",
        required: true,
    },
    TemplateColumn {
        name: "notes",
        thai_name: "หมายเหตุ",
        required: false,
    },
];

pub const NOTIFICATION_COLUMNS: [&str; 5] =
    ["barcode", "event_type", "popup_type", "title", "message"];

/// Raw cells of one data row; `line` is the 1-based line in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub line: usize,
    pub barcode: String,
    pub main_job_id: String,
    pub sub_job_id: String,
    pub notes: String,
}

/// A row that passed every check, ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRow {
    pub line: usize,
    pub barcode: Barcode,
    pub main_job_id: i64,
    pub main_job_name: String,
    pub sub_job_id: i64,
    pub sub_job_name: String,
    pub notes: Notes,
}

/// Per-row verdict returned to the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    pub line: usize,
    pub barcode: String,
    pub valid: bool,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_job_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_job_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubJobEntry {
    pub main_job_id: i64,
    pub name: String,
    pub is_active: bool,
}

/// Job and sub-job catalog as seen at the start of an import
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub jobs: HashMap<i64, String>,
    pub sub_jobs: HashMap<i64, SubJobEntry>,
}

/// Accepts `3`, ` 3 ` and `3.0`; spreadsheets export whole numbers as floats.
pub fn parse_id(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(id) = s.parse::<i64>() {
        return Some(id);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn normalize_header(h: &str) -> String {
    h.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Locate each template column by English or Thai header.
fn column_positions(headers: &csv::StringRecord) -> Result<[Option<usize>; 4]> {
    let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
    let mut positions = [None; 4];

    for (slot, column) in TEMPLATE_COLUMNS.iter().enumerate() {
        positions[slot] = normalized
            .iter()
            .position(|h| h == column.name || h == column.thai_name);

        if column.required && positions[slot].is_none() {
            return Err(WmsError::import(format!(
                "missing column '{}' ({})",
                column.name, column.thai_name
            )));
        }
    }
    Ok(positions)
}

/// 1-based line the record starts on. Blank lines and quoted newlines
/// make this differ from the record index.
fn record_line(record: &csv::StringRecord, index: usize) -> usize {
    record
        .position()
        .map(|p| p.line() as usize)
        .unwrap_or(index + 2)
}

/// Read scan rows from CSV. Blank lines are skipped.
pub fn read_scan_rows<R: Read>(reader: R) -> Result<Vec<ImportRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let positions = column_positions(csv_reader.headers()?)?;
    let cell = |record: &csv::StringRecord, slot: usize| -> String {
        positions[slot]
            .and_then(|i| record.get(i))
            .unwrap_or_default()
            .to_string()
    };

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        rows.push(ImportRow {
            line: record_line(&record, index),
            barcode: cell(&record, 0),
            main_job_id: cell(&record, 1),
            sub_job_id: cell(&record, 2),
            notes: cell(&record, 3),
        });
    }
    Ok(rows)
}

fn is_blank(s: &str) -> bool {
    let t = s.trim();
    t.is_empty() || t.eq_ignore_ascii_case("nan")
}

/// Check one row. Field errors are collected before catalog lookups run.
pub fn validate_row(
    row: &ImportRow,
    catalog: &CatalogSnapshot,
) -> std::result::Result<ValidatedRow, RowOutcome> {
    let mut outcome = RowOutcome {
        line: row.line,
        barcode: row.barcode.trim().to_string(),
        valid: false,
        errors: Vec::new(),
        main_job_name: None,
        sub_job_name: None,
    };

    if is_blank(&row.barcode) {
        outcome.errors.push("ไม่มีบาร์โค้ด".to_string());
    }
    if is_blank(&row.main_job_id) {
        outcome.errors.push("ไม่มี ID ประเภทงานหลัก".to_string());
    }
    if is_blank(&row.sub_job_id) {
        outcome.errors.push("ไม่มี ID ประเภทงานย่อย".to_string());
    }
    if !outcome.errors.is_empty() {
        return Err(outcome);
    }

    let main_job_id = parse_id(&row.main_job_id);
    if main_job_id.is_none() {
        outcome
            .errors
            .push(format!("ID ประเภทงานหลักไม่ถูกต้อง: {}", row.main_job_id.trim()));
    }
    let sub_job_id = parse_id(&row.sub_job_id);
    if sub_job_id.is_none() {
        outcome
            .errors
            .push(format!("ID ประเภทงานย่อยไม่ถูกต้อง: {}", row.sub_job_id.trim()));
    }
    let barcode = match Barcode::new(&row.barcode) {
        Ok(b) => Some(b),
        Err(e) => {
            outcome.errors.push(e.to_string());
            None
        }
    };
    let notes = match Notes::new(if is_blank(&row.notes) { None } else { Some(&row.notes) }) {
        Ok(n) => Some(n),
        Err(e) => {
            outcome.errors.push(e.to_string());
            None
        }
    };

    let (Some(main_job_id), Some(sub_job_id), Some(barcode), Some(notes)) =
        (main_job_id, sub_job_id, barcode, notes)
    else {
        return Err(outcome);
    };

    match catalog.jobs.get(&main_job_id) {
        Some(name) => outcome.main_job_name = Some(name.clone()),
        None => outcome.errors.push(messages::job_not_found(main_job_id)),
    }

    match catalog.sub_jobs.get(&sub_job_id) {
        None => outcome.errors.push(messages::sub_job_not_found(sub_job_id)),
        Some(sub) => {
            outcome.sub_job_name = Some(sub.name.clone());
            if !sub.is_active {
                outcome.errors.push(messages::sub_job_inactive(sub_job_id));
            }
            if sub.main_job_id != main_job_id {
                outcome
                    .errors
                    .push(messages::sub_job_not_in_job(sub_job_id, main_job_id));
            }
        }
    }

    match (outcome.errors.is_empty(), &outcome.main_job_name, &outcome.sub_job_name) {
        (true, Some(main_job_name), Some(sub_job_name)) => Ok(ValidatedRow {
            line: row.line,
            barcode,
            main_job_id,
            main_job_name: main_job_name.clone(),
            sub_job_id,
            sub_job_name: sub_job_name.clone(),
            notes,
        }),
        _ => Err(outcome),
    }
}

impl From<&ValidatedRow> for RowOutcome {
    fn from(row: &ValidatedRow) -> Self {
        Self {
            line: row.line,
            barcode: row.barcode.as_str().to_string(),
            valid: true,
            errors: Vec::new(),
            main_job_name: Some(row.main_job_name.clone()),
            sub_job_name: Some(row.sub_job_name.clone()),
        }
    }
}

/// Raw popup rule row from a notification import file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRow {
    pub line: usize,
    pub barcode: String,
    pub event_type: String,
    pub popup_type: String,
    pub title: String,
    pub message: String,
}

/// Read notification rules. `barcode` and `message` are required columns.
pub fn read_notification_rows<R: Read>(reader: R) -> Result<Vec<NotificationRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(normalize_header).collect();
    let find = |name: &str| headers.iter().position(|h| h == name);
    let positions: Vec<Option<usize>> = NOTIFICATION_COLUMNS.iter().map(|c| find(*c)).collect();

    for required in ["barcode", "message"] {
        if find(required).is_none() {
            return Err(WmsError::import(format!("missing column '{}'", required)));
        }
    }

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let cell = |slot: usize| -> String {
            positions[slot]
                .and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string()
        };
        if is_blank(&cell(0)) {
            continue;
        }
        rows.push(NotificationRow {
            line: record_line(&record, index),
            barcode: cell(0),
            event_type: cell(1),
            popup_type: cell(2),
            title: cell(3),
            message: cell(4),
        });
    }
    Ok(rows)
}

/// Write CSV with a UTF-8 BOM so spreadsheet tools detect Thai text.
pub fn write_csv<W, I, R>(mut writer: W, headers: &[&str], rows: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    writer.write_all(UTF8_BOM)?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(headers)?;
    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn csv_bytes<I, R>(headers: &[&str], rows: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut buf = Vec::new();
    write_csv(&mut buf, headers, rows)?;
    Ok(buf)
}

/// Template file: header plus one sample row.
pub fn template_csv(sample_main_job_id: i64, sample_sub_job_id: i64) -> Result<Vec<u8>> {
    let headers: Vec<&str> = TEMPLATE_COLUMNS.iter().map(|c| c.name).collect();
    let sample = vec![
        "BC000001".to_string(),
        sample_main_job_id.to_string(),
        sample_sub_job_id.to_string(),
        "ตัวอย่าง".to_string(),
    ];
    csv_bytes(&headers, [sample])
}
