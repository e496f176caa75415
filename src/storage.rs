use crate::models::CatalogRecord;
use crate::report::RunReport;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

fn sanitize_filename(s: &str) -> String {
    s.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}

/// `<name>_<index+1>.jpg`, with spaces and path-hostile characters replaced by underscores
pub fn image_file_name(name: &str, index: usize) -> String {
    format!("{}_{}.jpg", sanitize_filename(name).replace(' ', "_"), index + 1)
}

pub fn write_image(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(file_name);
    fs::write(&path, bytes)?;
    Ok(path)
}

/* ---------------- CSV ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer
pub fn write_row<W: Write, S: AsRef<str>>(w: &mut W, row: &[S]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            w.write_all(b",")?;
        } else {
            first = false;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}

/// Header row followed by one row per record
pub fn write_csv<W: Write, R: CatalogRecord>(w: &mut W, records: &[R]) -> io::Result<()> {
    write_row(w, R::CSV_HEADERS)?;
    for record in records {
        write_row(w, record.csv_row().as_slice())?;
    }
    Ok(())
}

pub fn write_records<R: CatalogRecord>(path: &Path, records: &[R]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_csv(&mut writer, records)?;
    writer.flush()?;
    log::info!("Wrote {} {} records to {}", records.len(), R::KIND, path.display());
    Ok(())
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<(), crate::error::ScrapeError> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json)?;
    log::info!("Wrote run report to {}", path.display());
    Ok(())
}
