use std::collections::HashMap;
use std::path::Path;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One tabular row keyed by header name, cells trimmed.
pub type Row = HashMap<String, String>;

/// Read a CSV with a header row into keyed rows. Tolerates a UTF-8 BOM on
/// the first header and ragged rows (missing trailing cells become "").
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let (rows, _) = read_rows_with_headers(path)?;
    Ok(rows)
}

pub fn read_rows_with_headers(path: &Path) -> Result<(Vec<Row>, Vec<String>)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Row::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let cell = record.get(i).unwrap_or("").trim().to_string();
            row.insert(header.clone(), cell);
        }
        rows.push(row);
    }
    Ok((rows, headers))
}

/// Write keyed rows under an explicit header order, creating parent
/// directories as needed. Cells absent from a row are written empty.
pub fn write_rows(path: &Path, rows: &[Row], headers: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(
            headers
                .iter()
                .map(|h| row.get(h).map(String::as_str).unwrap_or("")),
        )?;
    }
    writer.flush()?;
    Ok(())
}
