//! Row codec for the book CSV.
//!
//! Reading is lenient per cell and strict per file: a bad cell falls back to
//! its default, while a file the CSV reader rejects fails as a whole.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{BookRecord, Decision, ScoreKind};

/// Column order used when writing.
pub const COLUMNS: [&str; 17] = [
    "id",
    "title",
    "url",
    "url_com",
    "purchase_price",
    "used_price",
    "F",
    "R",
    "A",
    "V",
    "S",
    "P",
    "decision",
    "verified",
    "isbn",
    "citation_R",
    "citation_P",
];

/// Header name to column position.
struct ColumnMap {
    positions: HashMap<String, usize>,
}

impl ColumnMap {
    fn new(headers: &csv::StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().trim_start_matches('\u{feff}').to_string(), i))
            .collect();
        Self { positions }
    }

    fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    fn get<'r>(&self, row: &'r csv::StringRecord, name: &str) -> Option<&'r str> {
        self.positions.get(name).and_then(|&i| row.get(i))
    }
}

/// Parse CSV content into records, in file order.
///
/// `path` is only used for error messages.
pub fn read_records(content: &[u8], path: &Path) -> Result<Vec<BookRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| AppError::parse(path, e))?
        .clone();
    if headers.is_empty() {
        return Err(AppError::parse(path, "missing header row"));
    }

    let columns = ColumnMap::new(&headers);
    if !columns.contains("id") {
        return Err(AppError::parse(path, "header has no 'id' column"));
    }

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = result.map_err(|e| AppError::parse(path, format!("row {}: {e}", i + 1)))?;
        records.push(parse_record(&columns, &row));
    }
    Ok(records)
}

fn parse_record(columns: &ColumnMap, row: &csv::StringRecord) -> BookRecord {
    let text = |name: &str| parse_text(columns.get(row, name));
    let score = |kind: ScoreKind| parse_score(columns.get(row, kind.column()));

    let record = BookRecord {
        id: text("id"),
        title: text("title"),
        isbn: text("isbn"),
        primary_url: text("url"),
        secondary_url: text("url_com"),
        purchase_price: parse_price(columns.get(row, "purchase_price")),
        used_price: parse_price(columns.get(row, "used_price")),
        f: score(ScoreKind::Frequency),
        a: score(ScoreKind::Annotation),
        s: score(ScoreKind::Sentiment),
        v: score(ScoreKind::Resale),
        r: score(ScoreKind::Rarity),
        p: score(ScoreKind::Scannability),
        decision: columns
            .get(row, "decision")
            .map(Decision::parse_lenient)
            .unwrap_or_default(),
        verified: parse_verified(columns.get(row, "verified")),
        citation_r: parse_citations(columns.get(row, "citation_R")),
        citation_p: parse_citations(columns.get(row, "citation_P")),
    };

    for kind in ScoreKind::ALL {
        if let Some(value) = record.score(kind) {
            if !kind.accepts(value) {
                log::warn!(
                    "Record {}: {} = {} is outside {:?}",
                    record.id,
                    kind,
                    value,
                    kind.range()
                );
            }
        }
    }

    record
}

/// Text cell; a literal `nan` left behind by spreadsheet tools reads as empty.
fn parse_text(cell: Option<&str>) -> String {
    match cell {
        Some(value) if !value.trim().eq_ignore_ascii_case("nan") => value.to_string(),
        _ => String::new(),
    }
}

/// Price cell; anything but a finite non-negative number reads as 0.0.
fn parse_price(cell: Option<&str>) -> f64 {
    let Some(raw) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return 0.0;
    };
    match raw.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => price,
        _ => {
            log::debug!("Unparseable price '{raw}', using 0.0");
            0.0
        }
    }
}

/// Score cell; accepts `3` and `3.0`, anything else reads as unset.
fn parse_score(cell: Option<&str>) -> Option<i32> {
    let raw = cell.map(str::trim).filter(|s| !s.is_empty())?;
    if let Ok(value) = raw.parse::<i32>() {
        return Some(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 && value.abs() <= i32::MAX as f64 => {
            Some(value as i32)
        }
        _ => {
            log::debug!("Unparseable score '{raw}', leaving unset");
            None
        }
    }
}

fn parse_verified(cell: Option<&str>) -> bool {
    cell.is_some_and(|value| value.trim().eq_ignore_ascii_case("yes"))
}

/// Citation cell: a JSON array of strings, empty on anything else.
fn parse_citations(cell: Option<&str>) -> Vec<String> {
    let Some(raw) = cell.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|e| {
        log::debug!("Invalid citation list '{raw}': {e}");
        Vec::new()
    })
}

fn format_price(price: f64) -> String {
    let text = price.to_string();
    if text.contains(['.', 'e', 'E']) {
        text
    } else {
        format!("{text}.0")
    }
}

fn format_score(score: Option<i32>) -> String {
    score.map(|value| value.to_string()).unwrap_or_default()
}

/// Write the header and every record to `writer`.
pub fn write_records<W: Write>(writer: W, records: &[BookRecord]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(COLUMNS)?;
    for record in records {
        csv.write_record([
            record.id.clone(),
            record.title.clone(),
            record.primary_url.clone(),
            record.secondary_url.clone(),
            format_price(record.purchase_price),
            format_price(record.used_price),
            format_score(record.f),
            format_score(record.r),
            format_score(record.a),
            format_score(record.v),
            format_score(record.s),
            format_score(record.p),
            record.decision.to_string(),
            record.verified_label().to_string(),
            record.isbn.clone(),
            serde_json::to_string(&record.citation_r)?,
            serde_json::to_string(&record.citation_p)?,
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Serialize records into an in-memory CSV document.
pub fn encode_records(records: &[BookRecord]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_records(&mut buffer, records)?;
    Ok(buffer)
}
