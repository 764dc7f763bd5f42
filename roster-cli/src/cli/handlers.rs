//! Subcommand handlers
//!
//! Each handler performs one roster action against the store and reports the
//! outcome as a success, warning or error line. Not-found and fetch failures
//! are reported as warnings; other errors propagate to the caller.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::output::{self, OutputFormat};
use super::{AddArgs, UpdateArgs};
use crate::error::RosterError;
use crate::roster::{self, Fetched, Record, record};
use crate::store::TabularStore;

pub const FETCH_WARNING: &str = "Error fetching students. Check your Google Sheets connection.";

pub async fn handle_add<S: TabularStore + ?Sized>(store: &S, args: AddArgs) -> Result<String> {
    let mut student = Record::student(&args.name, args.email, args.grade, args.notes);
    if let Some(id) = args.id {
        student.set(record::ID, id);
    }

    let id = roster::add_record(store, student)
        .await
        .context("Failed to add student")?;
    output::success(format!("Student {} added with ID {}", args.name, id));

    Ok(id)
}

/// Add every well-formed line of `text` as one batch
pub async fn handle_add_batch_text<S: TabularStore + ?Sized>(
    store: &S,
    text: &str,
) -> Result<Vec<String>> {
    let students = roster::parse_batch(text);
    if students.is_empty() {
        output::warning("No valid lines found. Enter students as Name,Email,Grade,Notes per line.");
        return Ok(Vec::new());
    }

    let ids = roster::add_records_batch(store, students)
        .await
        .context("Failed to add students")?;
    output::success(format!("Added {} students successfully!", ids.len()));

    Ok(ids)
}

pub async fn handle_add_batch<S: TabularStore + ?Sized>(
    store: &S,
    file: Option<&Path>,
) -> Result<Vec<String>> {
    let text = match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?,
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?,
    };
    handle_add_batch_text(store, &text).await
}

pub async fn handle_list<S: TabularStore + ?Sized>(store: &S, format: OutputFormat) -> Result<()> {
    let Fetched { value, warning } = roster::list_records(store).await;
    if warning.is_some() {
        output::warning(FETCH_WARNING);
    }

    println!("{}", output::format_records(&value, format)?);
    Ok(())
}

pub async fn handle_search<S: TabularStore + ?Sized>(
    store: &S,
    id: &str,
    format: OutputFormat,
) -> Result<Option<Record>> {
    let Fetched { value, warning } = roster::find_by_id(store, id).await;
    if warning.is_some() {
        output::warning(FETCH_WARNING);
    }

    match &value {
        Some(student) => println!(
            "{}",
            output::format_records(std::slice::from_ref(student), format)?
        ),
        None => output::warning("Student not found"),
    }
    Ok(value)
}

/// Write `changes` to the student with `id`. Returns false when the student
/// does not exist.
pub async fn handle_update_fields<S: TabularStore + ?Sized>(
    store: &S,
    id: &str,
    changes: &Record,
) -> Result<bool> {
    match roster::update_record(store, id, changes).await {
        Ok(()) => {
            output::success(format!("Student ID {} updated successfully!", id));
            Ok(true)
        }
        Err(RosterError::NotFound(_)) => {
            output::warning("Student not found!");
            Ok(false)
        }
        Err(e) => Err(e).context("Failed to update student"),
    }
}

pub async fn handle_update<S: TabularStore + ?Sized>(store: &S, args: UpdateArgs) -> Result<bool> {
    let mut changes = Record::new();
    let fields = [
        (record::NAME, args.name),
        (record::EMAIL, args.email),
        (record::GRADE, args.grade),
        (record::NOTES, args.notes),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            changes.set(field, value);
        }
    }

    if changes.is_empty() {
        anyhow::bail!("Nothing to update: pass at least one of --name, --email, --grade, --notes");
    }

    handle_update_fields(store, &args.id, &changes).await
}

/// Delete the student with `id`. Returns false when nothing was deleted.
pub async fn handle_delete<S: TabularStore + ?Sized>(store: &S, id: &str) -> Result<bool> {
    match roster::delete_record(store, id).await {
        Ok(()) => {
            output::success(format!("Student ID {} deleted successfully!", id));
            Ok(true)
        }
        Err(RosterError::NotFound(_)) => {
            output::warning("Student not found!");
            Ok(false)
        }
        Err(e) => Err(e).context("Failed to delete student"),
    }
}
