use crate::config::{ColumnConfig, ValidationConfig};
use crate::error::{CollaboratorError, SkipReason};
use crate::html::escape_html;
use crate::types::{AddressRecord, RawRow};
use csv::{ByteRecord, ReaderBuilder};
use geo::Point;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

const UNKNOWN_ADDRESS: &str = "unknown address";

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRow {
    pub row: usize,
    pub label: String,
    pub reason: SkipReason,
}

/// Valid records in source order plus everything that was left out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ingested {
    pub records: Vec<AddressRecord>,
    pub skipped: Vec<SkippedRow>,
}

pub fn load_rows(
    path: &Path,
    columns: &ColumnConfig,
) -> Result<Vec<RawRow>, CollaboratorError> {
    info!("Loading rows from {:?}", path);
    let file = File::open(path).map_err(|source| CollaboratorError::OpenSource {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = read_rows(file, columns)?;
    info!("Loaded {} rows", rows.len());
    Ok(rows)
}

/// Cells are decoded lossily, so a stray non-UTF-8 byte only mangles its
/// own cell; only I/O and CSV framing errors fail the read.
pub fn read_rows<R: Read>(
    reader: R,
    columns: &ColumnConfig,
) -> Result<Vec<RawRow>, CollaboratorError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr.byte_headers()?.iter().map(decode).collect();

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let required = |name: &str| {
        position(name).ok_or_else(|| CollaboratorError::MissingColumn(name.to_string()))
    };

    let address_idx = required(&columns.address)?;
    let lat_idx = required(&columns.lat)?;
    let lon_idx = required(&columns.lon)?;
    let done_idx = required(&columns.done)?;
    let note_idx = position(&columns.note);
    if note_idx.is_none() {
        warn!("No '{}' column in source, treating every row as without note", columns.note);
    }

    let cell = |record: &ByteRecord, idx: usize| record.get(idx).map(decode).unwrap_or_default();

    let mut rows = Vec::new();
    for (i, result) in rdr.byte_records().enumerate() {
        let record = result?;
        rows.push(RawRow {
            row: i + 1,
            address: cell(&record, address_idx),
            lat: cell(&record, lat_idx),
            lon: cell(&record, lon_idx),
            done: cell(&record, done_idx),
            note: note_idx.and_then(|idx| record.get(idx)).map(decode),
        });
    }

    Ok(rows)
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Splits rows into valid records and a skip log. Never fails as a whole.
pub fn validate_rows(rows: &[RawRow], config: &ValidationConfig) -> Ingested {
    let mut ingested = Ingested::default();

    for raw in rows {
        match validate_row(raw, config) {
            Ok(record) => ingested.records.push(record),
            Err(reason) => {
                let label = label_for(raw);
                warn!(row = raw.row, address = %label, "Skipping row: {}", reason);
                ingested.skipped.push(SkippedRow {
                    row: raw.row,
                    label,
                    reason,
                });
            }
        }
    }

    if !ingested.skipped.is_empty() {
        warn!("{} rows skipped", ingested.skipped.len());
    }
    info!("{} valid address records", ingested.records.len());

    ingested
}

pub fn validate_row(raw: &RawRow, config: &ValidationConfig) -> Result<AddressRecord, SkipReason> {
    let lat = parse_coordinate("latitude", &raw.lat)?;
    let lon = parse_coordinate("longitude", &raw.lon)?;

    if lat == 0.0 || lon == 0.0 {
        return Err(SkipReason::UnsetCoordinate { lat, lon });
    }
    if !config.bounds.contains(lat, lon) {
        return Err(SkipReason::OutOfBounds { lat, lon });
    }

    Ok(AddressRecord {
        address: raw.address.trim().to_string(),
        location: Point::new(lon, lat),
        done: is_affirmative(&raw.done, &config.affirmative),
        note: raw.note.as_deref().and_then(clean_note),
    })
}

fn parse_coordinate(field: &'static str, value: &str) -> Result<f64, SkipReason> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| SkipReason::InvalidCoordinate {
            field,
            value: value.to_string(),
        })
}

pub fn is_affirmative(flag: &str, affirmative: &str) -> bool {
    flag.trim().to_lowercase() == affirmative.trim().to_lowercase()
}

/// `None` for blank cells and spreadsheet "nan" placeholders.
pub fn clean_note(note: &str) -> Option<String> {
    let trimmed = note.trim();
    if trimmed.is_empty() || trimmed.to_lowercase() == "nan" {
        None
    } else {
        Some(escape_html(trimmed))
    }
}

fn label_for(raw: &RawRow) -> String {
    let address = raw.address.trim();
    if address.is_empty() {
        UNKNOWN_ADDRESS.to_string()
    } else {
        address.to_string()
    }
}
