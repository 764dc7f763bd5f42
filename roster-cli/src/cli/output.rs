//! Output formatting for student listings and user feedback

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::*;
use unicode_width::UnicodeWidthStr;

use crate::roster::Record;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns
    #[default]
    Table,
    /// Pretty-printed JSON array
    Json,
    /// Comma-separated values with a header line
    Csv,
}

const EMPTY_MESSAGE: &str = "No students found";

/// Format records according to the requested output format
pub fn format_records(records: &[Record], format: OutputFormat) -> Result<String> {
    if records.is_empty() && format != OutputFormat::Json {
        return Ok(EMPTY_MESSAGE.to_string());
    }

    match format {
        OutputFormat::Table => Ok(records_to_table(records)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(records).context("Failed to format JSON output")
        }
        OutputFormat::Csv => records_to_csv(records),
    }
}

/// Column names in the order the first record carries them
fn columns(records: &[Record]) -> Vec<&str> {
    records
        .first()
        .map(|r| r.fields().map(|(f, _)| f).collect())
        .unwrap_or_default()
}

fn records_to_table(records: &[Record]) -> String {
    let columns = columns(records);
    let mut widths: Vec<usize> = columns.iter().map(|c| c.width()).collect();
    for record in records {
        for (i, column) in columns.iter().enumerate() {
            let value = record.get(column).unwrap_or_default();
            widths[i] = widths[i].max(value.width());
        }
    }

    let mut lines = Vec::with_capacity(records.len() + 2);
    let header = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| pad(c, *w).bold().to_string())
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(header.trim_end().to_string());
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );

    for record in records {
        let line = columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad(record.get(c).unwrap_or_default(), *w))
            .collect::<Vec<_>>()
            .join("  ");
        lines.push(line.trim_end().to_string());
    }

    lines.join("\n")
}

/// Left-align `text` in a column of `width` display cells
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn records_to_csv(records: &[Record]) -> Result<String> {
    let columns = columns(records);
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| record.get(c).unwrap_or_default()))?;
    }

    let bytes = writer.into_inner().context("Failed to flush CSV output")?;
    let text = String::from_utf8(bytes).context("CSV output was not valid UTF-8")?;
    Ok(text.trim_end().to_string())
}

pub fn success(message: impl AsRef<str>) {
    println!("{}", message.as_ref().green());
}

pub fn warning(message: impl AsRef<str>) {
    eprintln!("{}", message.as_ref().yellow());
}

pub fn error(message: impl AsRef<str>) {
    eprintln!("{}", message.as_ref().red().bold());
}
