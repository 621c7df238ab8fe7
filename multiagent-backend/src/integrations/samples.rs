//! Access to the tabular data samples handed to the agents

use crate::integrations::agent_http::FilePart;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Opens sample files for upload. Handles close when dropped.
pub trait SampleOpener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
}

/// Opens samples straight from the filesystem
pub struct FsSampleOpener;

impl SampleOpener for FsSampleOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(path)?))
    }
}

/// Read a sample into a multipart file part on the blocking pool
pub async fn load_sample(
    opener: Arc<dyn SampleOpener>,
    path: PathBuf,
    field: &str,
) -> Result<FilePart, String> {
    let field = field.to_string();
    tokio::task::spawn_blocking(move || load_file_part(opener.as_ref(), &path, &field))
        .await
        .map_err(|e| format!("Sample load aborted: {}", e))?
}

/// The handle is released before returning
fn load_file_part(
    opener: &dyn SampleOpener,
    path: &Path,
    field: &str,
) -> Result<FilePart, String> {
    let mut handle = opener
        .open(path)
        .map_err(|e| format!("Could not open sample {}: {}", path.display(), e))?;

    let mut bytes = Vec::new();
    handle
        .read_to_end(&mut bytes)
        .map_err(|e| format!("Could not read sample {}: {}", path.display(), e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sample.csv".to_string());

    Ok(FilePart {
        field: field.to_string(),
        file_name,
        content_type: CSV_CONTENT_TYPE.to_string(),
        bytes,
    })
}

/// Renders a tabular sample as text for a model prompt.
/// Never fails: unreadable samples come back as an explanation.
pub trait TabularSampleReader: Send + Sync {
    fn read(&self, path: &Path) -> String;
}

pub struct CsvSampleReader;

impl TabularSampleReader for CsvSampleReader {
    fn read(&self, path: &Path) -> String {
        match File::open(path)
            .map_err(|e| e.to_string())
            .and_then(|f| render_table(f))
        {
            Ok(table) => table,
            Err(e) => {
                log::warn!("[SAMPLES] Could not read {}: {}", path.display(), e);
                format!("Could not read dataset: {}", e)
            }
        }
    }
}

/// Right-aligned column layout, header first, no row index
pub fn render_table<R: Read>(source: R) -> Result<String, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err("No columns to parse from file".to_string());
    }

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > headers.len() {
            return Err(format!(
                "Expected {} fields in line {}, saw {}",
                headers.len(),
                record.position().map(|p| p.line()).unwrap_or(0),
                record.len()
            ));
        }
        let mut row: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format_row(&headers));
    for row in &rows {
        lines.push(format_row(row));
    }
    Ok(lines.join("\n"))
}
