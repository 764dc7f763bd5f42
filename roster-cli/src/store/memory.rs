//! In-memory worksheet used to exercise the roster adapter

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{TabularStore, trim_trailing_empty};
use crate::error::{Result, RosterError};

/// A mutating call made against the store, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AppendRow(Vec<String>),
    AppendRows(Vec<Vec<String>>),
    UpdateCell { row: usize, col: usize, value: String },
    DeleteRow(usize),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Vec<String>>>,
    calls: Mutex<Vec<Call>>,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    /// Store with just the default header row
    pub fn with_header() -> Self {
        Self::from_rows(&[&super::DEFAULT_HEADERS[..]])
    }

    pub fn from_rows(rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.rows.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every subsequent read fail as if the service returned a 503
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RosterError::Api {
                status: 503,
                message: "The service is currently unavailable.".to_string(),
            });
        }
        Ok(())
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TabularStore for MemoryStore {
    async fn col_values(&self, col: usize) -> Result<Vec<String>> {
        self.check_read()?;
        let rows = self.rows.lock().unwrap();
        let values = rows
            .iter()
            .map(|row| row.get(col - 1).cloned().unwrap_or_default())
            .collect();
        Ok(trim_trailing_empty(values))
    }

    async fn row_values(&self, row: usize) -> Result<Vec<String>> {
        self.check_read()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(row - 1)
            .cloned()
            .map(trim_trailing_empty)
            .unwrap_or_default())
    }

    async fn all_values(&self) -> Result<Vec<Vec<String>>> {
        self.check_read()?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn append_row(&self, row: Vec<String>) -> Result<()> {
        self.record(Call::AppendRow(row.clone()));
        self.rows.lock().unwrap().push(row);
        Ok(())
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
        self.record(Call::AppendRows(rows.clone()));
        self.rows.lock().unwrap().extend(rows);
        Ok(())
    }

    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<()> {
        self.record(Call::UpdateCell {
            row,
            col,
            value: value.to_string(),
        });
        let mut rows = self.rows.lock().unwrap();
        if rows.len() < row {
            rows.resize(row, Vec::new());
        }
        let cells = &mut rows[row - 1];
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.to_string();
        Ok(())
    }

    async fn delete_row(&self, row: usize) -> Result<()> {
        self.record(Call::DeleteRow(row));
        let mut rows = self.rows.lock().unwrap();
        if row == 0 || row > rows.len() {
            return Err(RosterError::Api {
                status: 400,
                message: format!("Invalid requests[0].deleteDimension: row {} out of range", row),
            });
        }
        rows.remove(row - 1);
        Ok(())
    }
}
