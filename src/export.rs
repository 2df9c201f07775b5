use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::{Transaction, DATE_FORMAT};

pub(crate) const REPORT_FILE_NAME: &str = "finance_report.csv";

const HEADER: [&str; 6] = ["ID", "Title", "Amount", "Type", "Category", "Date"];

/// Write every record, in list order, as CSV.
pub(crate) fn write_csv<W: Write>(txns: &[Transaction], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .from_writer(writer);

    wtr.write_record(HEADER)?;
    for txn in txns {
        let amount = txn.amount.to_string();
        let date = txn.date.format(DATE_FORMAT).to_string();
        wtr.write_record([
            txn.id.as_str(),
            txn.title.as_str(),
            amount.as_str(),
            txn.kind().as_str(),
            txn.entry.category_name(),
            date.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export to `path`, returning the number of records written.
pub(crate) fn export_to_path(txns: &[Transaction], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    write_csv(txns, std::io::BufWriter::new(file))
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;
    tracing::info!(path = %path.display(), count = txns.len(), "exported transactions");
    Ok(txns.len())
}

/// `~/finance_report.csv`, or the working directory when there is no home.
pub(crate) fn default_export_path() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
        .join(REPORT_FILE_NAME)
}

/// Expand a leading `~` to the home directory.
pub(crate) fn expand_path(input: &str) -> PathBuf {
    let trimmed = input.trim();
    if let Some(rest) = trimmed.strip_prefix("~/") {
        if let Some(dirs) = directories::UserDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(trimmed)
}
