use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};
use thiserror::Error;

/// Key holding the fields of a row that extend past the header width.
pub const OVERFLOW_KEY: &str = "null";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One CSV row keyed by header; iteration order follows the header row.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub delimiter: u8,
    pub trim: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("object is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 { valid_up_to: usize },
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

pub fn csv_to_records(
    bytes: &[u8],
    options: &TransformOptions,
) -> Result<Vec<Record>, TransformError> {
    let (bom_len, bytes) = match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => (UTF8_BOM.len(), rest),
        None => (0, bytes),
    };
    // Offsets are reported against the object as stored, BOM included.
    if let Err(error) = std::str::from_utf8(bytes) {
        return Err(TransformError::InvalidUtf8 {
            valid_up_to: bom_len + error.valid_up_to(),
        });
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(if options.trim { Trim::All } else { Trim::None })
        .from_reader(bytes);

    let mut rows = reader.records();
    let headers = match rows.next() {
        Some(row) => row?,
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for row in rows {
        records.push(row_to_record(&headers, &row?));
    }
    Ok(records)
}

fn row_to_record(headers: &StringRecord, row: &StringRecord) -> Record {
    let mut record = Record::with_capacity(headers.len());
    for (index, header) in headers.iter().enumerate() {
        // Duplicate headers keep their first position; the later value wins.
        let value = row
            .get(index)
            .map_or(Value::Null, |field| Value::String(field.to_string()));
        record.insert(header.to_string(), value);
    }

    if row.len() > headers.len() {
        let overflow = row
            .iter()
            .skip(headers.len())
            .map(|field| Value::String(field.to_string()))
            .collect();
        record.insert(OVERFLOW_KEY.to_string(), Value::Array(overflow));
    }

    record
}

/// Serializes records as a JSON array, pretty-printed with `indent` spaces
/// when set.
pub fn records_to_json(
    records: &[Record],
    indent: Option<usize>,
) -> Result<String, serde_json::Error> {
    let Some(width) = indent else {
        return serde_json::to_string(records);
    };

    let indent = " ".repeat(width);
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(indent.as_bytes()));
    records.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(<serde_json::Error as serde::ser::Error>::custom)
}
