//! Sectioned CSV layout.
//!
//! ```text
//! **Size**
//! S,M,L
//! XL
//! **Color**
//! Red,,Blue
//! ```
//!
//! A row whose first cell is wrapped in `**` opens a field. Every non-blank
//! cell of the following rows becomes a candidate value of that field.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::nomenclature::Field;

fn header_name(cell: &str) -> Option<String> {
    if cell.starts_with("**") && cell.ends_with("**") {
        Some(cell.trim_matches('*').trim().to_string())
    } else {
        None
    }
}

pub fn parse_reader<R: Read>(reader: R) -> Result<Vec<Field>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut fields = Vec::new();
    let mut current: Option<Field> = None;

    for (row_index, record) in reader.records().enumerate() {
        let record = record?;
        let row = row_index + 1;

        if let Some(name) = record.get(0).and_then(header_name) {
            tracing::debug!("Row {}: new field {:?}", row, name);
            if let Some(done) = current.take() {
                fields.push(done);
            }
            current = Some(Field::new(name));
            continue;
        }

        match current.as_mut() {
            Some(field) => {
                field.values.extend(
                    record
                        .iter()
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string),
                );
            }
            None => tracing::warn!("Skipping row {}: no field header yet", row),
        }
    }

    if let Some(done) = current {
        fields.push(done);
    }

    tracing::debug!("Parsed {} fields", fields.len());
    Ok(fields)
}

pub fn parse_file(path: &Path) -> Result<Vec<Field>, super::ImportError> {
    let file = File::open(path)?;
    Ok(parse_reader(file)?)
}
