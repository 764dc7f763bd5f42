//! Tabular store contract
//!
//! A store is a single worksheet: rows of string cells where row 1 is the
//! header. Row and column indexes are 1-based to match spreadsheet
//! addressing. Every call is a round trip to the backing service; nothing is
//! cached between calls.

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

/// Handle to one worksheet inside a remote tabular service
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// All values in a column, top to bottom. Trailing empty cells may be omitted.
    async fn col_values(&self, col: usize) -> Result<Vec<String>>;

    /// All values in a row. Trailing empty cells may be omitted.
    async fn row_values(&self, row: usize) -> Result<Vec<String>>;

    /// Every row in the worksheet, header included
    async fn all_values(&self) -> Result<Vec<Vec<String>>>;

    /// Append one row after the last non-empty row
    async fn append_row(&self, row: Vec<String>) -> Result<()>;

    /// Append many rows in a single request
    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()>;

    /// Overwrite a single cell
    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<()>;

    /// Remove a row; the rows below it shift up by one
    async fn delete_row(&self, row: usize) -> Result<()>;
}

/// Default header written to a freshly created worksheet
pub const DEFAULT_HEADERS: [&str; 5] = ["ID", "Name", "Email", "Grade", "Notes"];

/// Drop trailing empty cells, matching how the Sheets API trims ranges
pub fn trim_trailing_empty(mut values: Vec<String>) -> Vec<String> {
    while values.last().is_some_and(|v| v.is_empty()) {
        values.pop();
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_trailing_empty() {
        let values = vec!["1".to_string(), String::new(), "x".to_string(), String::new(), String::new()];
        assert_eq!(trim_trailing_empty(values), vec!["1", "", "x"]);
        assert!(trim_trailing_empty(vec![String::new()]).is_empty());
    }
}
