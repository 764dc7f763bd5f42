//! Record-level operations over a tabular store
//!
//! Each function takes the store handle explicitly and re-reads whatever it
//! needs; nothing is cached between calls. Update and delete locate their
//! target row by a fresh linear scan, so a concurrent writer that shifts
//! rows between the scan and the write can cause the wrong row to be hit.

use log::{debug, info, warn};

use super::record::{EDITABLE_FIELDS, ID, Record};
use crate::error::{Result, RosterError};
use crate::store::TabularStore;

/// Result of a read that recovers from remote fetch failures.
///
/// On failure `value` holds the empty result and `warning` carries the error
/// so the caller can surface it without aborting.
#[derive(Debug)]
pub struct Fetched<T> {
    pub value: T,
    pub warning: Option<RosterError>,
}

impl<T> Fetched<T> {
    fn ok(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }
}

/// Canonical form of an ID made only of ASCII decimal digits: leading zeros
/// stripped, `"0"` for all zeros. IDs of any length are accepted.
fn parse_numeric_id(value: &str) -> Option<&str> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = value.trim_start_matches('0');
    Some(if trimmed.is_empty() { "0" } else { trimmed })
}

/// Largest numeric ID in an ID column, header row excluded. Canonical digit
/// strings order by length first, then lexically.
fn max_numeric_id(column: &[String]) -> Option<&str> {
    column
        .iter()
        .skip(1)
        .filter_map(|v| parse_numeric_id(v))
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
}

/// Add one to a canonical decimal digit string
fn increment(digits: &str) -> String {
    let kept = digits.trim_end_matches('9');
    let zeros = "0".repeat(digits.len() - kept.len());
    match kept.as_bytes().split_last() {
        Some((last, prefix)) => {
            let prefix = &kept[..prefix.len()];
            format!("{}{}{}", prefix, char::from(last + 1), zeros)
        }
        None => format!("1{}", zeros),
    }
}

/// The ID following the largest numeric ID in `column`, or "1"
fn following_id(column: &[String]) -> String {
    max_numeric_id(column).map_or_else(|| "1".to_string(), increment)
}

/// Read the header row, failing if the worksheet has none
async fn header<S: TabularStore + ?Sized>(store: &S) -> Result<Vec<String>> {
    let headers = store.row_values(1).await?;
    if headers.is_empty() {
        return Err(RosterError::MissingHeader);
    }
    Ok(headers)
}

/// 1-based index of the first data row whose first cell equals `id`.
/// Row 1 is the header and is never matched, unlike a plain scan of every
/// raw row, so an ID of `"ID"` cannot target it.
fn locate_row(rows: &[Vec<String>], id: &str) -> Option<usize> {
    rows.iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| row.first().is_some_and(|cell| cell == id))
        .map(|(idx, _)| idx + 1)
}

/// Compute the next free ID: one more than the largest numeric ID, or "1".
/// Non-numeric IDs are ignored.
pub async fn next_id<S: TabularStore + ?Sized>(store: &S) -> Result<String> {
    let column = store.col_values(1).await?;
    Ok(following_id(&column))
}

/// Append one record, assigning an ID if it has none. Returns the ID.
pub async fn add_record<S: TabularStore + ?Sized>(store: &S, mut record: Record) -> Result<String> {
    let headers = header(store).await?;

    if record.lacks_id() {
        record.set(ID, next_id(store).await?);
    }
    let id = record.id().unwrap_or_default().to_string();

    store.append_row(record.to_row(&headers)).await?;
    info!("Added student with ID {}", id);

    Ok(id)
}

/// Append many records in a single request.
///
/// IDs are assigned sequentially, in input order, to every record lacking
/// one, starting after the largest numeric ID present before the batch. IDs
/// already carried by records in the batch do not move the counter.
/// Returns each record's ID in input order.
pub async fn add_records_batch<S: TabularStore + ?Sized>(
    store: &S,
    records: Vec<Record>,
) -> Result<Vec<String>> {
    if records.is_empty() {
        debug!("Empty batch, nothing to append");
        return Ok(Vec::new());
    }

    let headers = header(store).await?;
    let column = store.col_values(1).await?;
    let mut counter = following_id(&column);

    let mut ids = Vec::with_capacity(records.len());
    let mut rows = Vec::with_capacity(records.len());
    for mut record in records {
        if record.lacks_id() {
            let next = increment(&counter);
            record.set(ID, std::mem::replace(&mut counter, next));
        }
        ids.push(record.id().unwrap_or_default().to_string());
        rows.push(record.to_row(&headers));
    }

    store.append_rows(rows).await?;
    info!("Added {} students in one batch", ids.len());

    Ok(ids)
}

/// Fetch every data row as a header-keyed record.
///
/// A failed fetch yields an empty list and a warning instead of an error.
pub async fn list_records<S: TabularStore + ?Sized>(store: &S) -> Fetched<Vec<Record>> {
    let rows = match store.all_values().await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Error fetching students: {}", e);
            return Fetched {
                value: Vec::new(),
                warning: Some(e),
            };
        }
    };

    let Some((headers, data)) = rows.split_first() else {
        return Fetched::ok(Vec::new());
    };

    let records = data
        .iter()
        .map(|row| Record::from_row(headers, row))
        .collect::<Vec<_>>();
    debug!("Fetched {} students", records.len());

    Fetched::ok(records)
}

/// Find the first record whose `ID` equals `id` as a string.
/// `"01"` and `"1"` are different IDs.
pub async fn find_by_id<S: TabularStore + ?Sized>(store: &S, id: &str) -> Fetched<Option<Record>> {
    let Fetched { value, warning } = list_records(store).await;
    let found = value.into_iter().find(|r| r.id() == Some(id));
    Fetched {
        value: found,
        warning,
    }
}

/// Overwrite the editable fields present in `changes` on the row holding
/// `id`. Fields missing from `changes` are left alone and `ID` is never
/// written. Every column is resolved before the first write; a write that
/// fails part way leaves the earlier cells updated.
pub async fn update_record<S: TabularStore + ?Sized>(
    store: &S,
    id: &str,
    changes: &Record,
) -> Result<()> {
    let rows = store.all_values().await?;
    let row = locate_row(&rows, id).ok_or_else(|| RosterError::NotFound(id.to_string()))?;
    let headers = rows.first().map(Vec::as_slice).unwrap_or_default();

    let mut writes = Vec::new();
    for field in EDITABLE_FIELDS {
        let Some(value) = changes.get(field) else {
            continue;
        };
        let col = headers
            .iter()
            .position(|h| h == field)
            .ok_or_else(|| RosterError::MissingColumn(field.to_string()))?;
        writes.push((col + 1, value));
    }

    for (col, value) in writes {
        debug!("Writing row {} column {} for student {}", row, col, id);
        store.update_cell(row, col, value).await?;
    }
    info!("Updated student {} at row {}", id, row);

    Ok(())
}

/// Remove the row holding `id`. Later rows shift up by one.
pub async fn delete_record<S: TabularStore + ?Sized>(store: &S, id: &str) -> Result<()> {
    let rows = store.all_values().await?;
    let row = locate_row(&rows, id).ok_or_else(|| RosterError::NotFound(id.to_string()))?;

    store.delete_row(row).await?;
    info!("Deleted student {} from row {}", id, row);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::record::{GRADE, NAME};
    use crate::store::memory::{Call, MemoryStore};

    fn students() -> MemoryStore {
        MemoryStore::from_rows(&[
            &["ID", "Name", "Email", "Grade", "Notes"],
            &["1", "Amr", "amr@example.com", "B", ""],
            &["2", "Mona", "mona@example.com", "C", "late"],
            &["5", "Omar", "", "A", ""],
            &["7", "Laila", "laila@example.com", "B", ""],
        ])
    }

    #[tokio::test]
    async fn test_next_id_skips_non_numeric() {
        let store = MemoryStore::from_rows(&[&["ID"], &["2"], &["x"], &["5"], &["7"]]);
        assert_eq!(next_id(&store).await.unwrap(), "8");
    }

    #[tokio::test]
    async fn test_next_id_empty_table() {
        let store = MemoryStore::with_header();
        assert_eq!(next_id(&store).await.unwrap(), "1");
    }

    #[tokio::test]
    async fn test_next_id_ignores_signed_and_padded_values() {
        let store = MemoryStore::from_rows(&[&["ID"], &["-9"], &[" 4"], &["3"]]);
        assert_eq!(next_id(&store).await.unwrap(), "4");
    }

    #[tokio::test]
    async fn test_next_id_at_u128_max() {
        let max = u128::MAX.to_string();
        let store = MemoryStore::from_rows(&[&["ID"], &["3"], &[max.as_str()]]);

        assert_eq!(
            next_id(&store).await.unwrap(),
            "340282366920938463463374607431768211456"
        );
    }

    #[tokio::test]
    async fn test_next_id_beyond_machine_integers() {
        let store = MemoryStore::from_rows(&[
            &["ID"],
            &["5"],
            &["9999999999999999999999999999999999999999"],
            &["0000000000000000000000000000000000000000000012"],
        ]);

        assert_eq!(
            next_id(&store).await.unwrap(),
            "10000000000000000000000000000000000000000"
        );
    }

    #[tokio::test]
    async fn test_next_id_leading_zeros() {
        let store = MemoryStore::from_rows(&[&["ID"], &["009"], &["10"], &["000"]]);
        assert_eq!(next_id(&store).await.unwrap(), "11");

        let zeros = MemoryStore::from_rows(&[&["ID"], &["00"]]);
        assert_eq!(next_id(&zeros).await.unwrap(), "1");
    }

    #[tokio::test]
    async fn test_batch_counter_carries_past_u128_max() {
        let max = u128::MAX.to_string();
        let store = MemoryStore::from_rows(&[
            &["ID", "Name", "Email", "Grade", "Notes"],
            &[max.as_str(), "Amr", "", "", ""],
        ]);
        let records = vec![
            Record::student("A", "", "", ""),
            Record::student("B", "", "", ""),
        ];

        let ids = add_records_batch(&store, records).await.unwrap();

        assert_eq!(
            ids,
            vec![
                "340282366920938463463374607431768211456",
                "340282366920938463463374607431768211457",
            ]
        );
    }

    #[tokio::test]
    async fn test_add_record_assigns_first_id() {
        let store = MemoryStore::with_header();

        let id = add_record(&store, Record::new().with(NAME, "Amr")).await.unwrap();

        assert_eq!(id, "1");
        assert_eq!(
            store.calls(),
            vec![Call::AppendRow(vec![
                "1".to_string(),
                "Amr".to_string(),
                String::new(),
                String::new(),
                String::new(),
            ])]
        );
    }

    #[tokio::test]
    async fn test_add_record_keeps_given_id() {
        let store = students();

        let id = add_record(&store, Record::student("Sara", "", "A", "").with(ID, "42"))
            .await
            .unwrap();

        assert_eq!(id, "42");
        assert_eq!(store.rows().last().unwrap()[0], "42");
    }

    #[tokio::test]
    async fn test_add_record_blank_id_is_assigned() {
        let store = students();

        let id = add_record(&store, Record::new().with(ID, "   ").with(NAME, "Sara"))
            .await
            .unwrap();

        assert_eq!(id, "8");
    }

    #[tokio::test]
    async fn test_add_record_requires_header() {
        let store = MemoryStore::default();

        let err = add_record(&store, Record::new().with(NAME, "Amr")).await.unwrap_err();

        assert!(matches!(err, RosterError::MissingHeader));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_assigns_sequential_ids() {
        let store = MemoryStore::with_header();
        let records = vec![
            Record::student("A", "", "", ""),
            Record::student("B", "", "", ""),
            Record::student("C", "", "", ""),
        ];

        let ids = add_records_batch(&store, records).await.unwrap();

        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(store.calls().len(), 1);
        assert!(matches!(&store.calls()[0], Call::AppendRows(rows) if rows.len() == 3));
    }

    #[tokio::test]
    async fn test_batch_counter_ignores_ids_inside_batch() {
        let store = students();
        let records = vec![
            Record::student("A", "", "", ""),
            Record::student("B", "", "", "").with(ID, "100"),
            Record::student("C", "", "", ""),
        ];

        let ids = add_records_batch(&store, records).await.unwrap();

        assert_eq!(ids, vec!["8", "100", "9"]);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_calls() {
        let store = students();
        store.fail_reads();

        let ids = add_records_batch(&store, Vec::new()).await.unwrap();

        assert!(ids.is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_records_maps_header() {
        let store = students();

        let listed = list_records(&store).await;

        assert!(listed.warning.is_none());
        assert_eq!(listed.value.len(), 4);
        assert_eq!(listed.value[1].get(NAME), Some("Mona"));
        assert_eq!(listed.value[2].get("Email"), Some(""));
    }

    #[tokio::test]
    async fn test_list_records_recovers_from_fetch_error() {
        let store = students();
        store.fail_reads();

        let listed = list_records(&store).await;

        assert!(listed.value.is_empty());
        assert!(matches!(listed.warning, Some(RosterError::Api { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_list_records_is_repeatable() {
        let store = students();

        let first = list_records(&store).await.value;
        let second = list_records(&store).await.value;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_find_by_id_exact_string_match() {
        let store = MemoryStore::from_rows(&[
            &["ID", "Name", "Email", "Grade", "Notes"],
            &["3", "Amr", "", "", ""],
        ]);

        let found = find_by_id(&store, "3").await;
        assert_eq!(found.value.unwrap().get(NAME), Some("Amr"));

        let padded = find_by_id(&store, "03").await;
        assert!(padded.value.is_none());
        assert!(padded.warning.is_none());
    }

    #[tokio::test]
    async fn test_find_by_id_passes_fetch_warning() {
        let store = students();
        store.fail_reads();

        let found = find_by_id(&store, "1").await;

        assert!(found.value.is_none());
        assert!(found.warning.is_some());
    }

    #[tokio::test]
    async fn test_update_writes_only_given_fields() {
        let store = students();

        update_record(&store, "2", &Record::new().with(GRADE, "A"))
            .await
            .unwrap();

        assert_eq!(
            store.calls(),
            vec![Call::UpdateCell {
                row: 3,
                col: 4,
                value: "A".to_string(),
            }]
        );
        assert_eq!(store.rows()[2][3], "A");
    }

    #[tokio::test]
    async fn test_update_full_form_writes_four_cells_and_never_id() {
        let store = students();
        let changes = Record::student("Mona S", "mona@school.org", "B", "").with(ID, "99");

        update_record(&store, "2", &changes).await.unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|c| matches!(c, Call::UpdateCell { row: 3, col, .. } if *col > 1)));
        assert_eq!(store.rows()[2][0], "2");
    }

    #[tokio::test]
    async fn test_update_missing_id_writes_nothing() {
        let store = students();

        let err = update_record(&store, "42", &Record::new().with(GRADE, "A"))
            .await
            .unwrap_err();

        assert!(matches!(err, RosterError::NotFound(id) if id == "42"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_never_targets_header() {
        let store = students();

        let err = update_record(&store, "ID", &Record::new().with(NAME, "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, RosterError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_missing_column_fails_before_writing() {
        let store = MemoryStore::from_rows(&[&["ID", "Name", "Email"], &["1", "Amr", ""]]);
        let changes = Record::new().with(NAME, "Amr S").with(GRADE, "A");

        let err = update_record(&store, "1", &changes).await.unwrap_err();

        assert!(matches!(err, RosterError::MissingColumn(col) if col == "Grade"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_shifts_rows_up() {
        let store = students();

        delete_record(&store, "5").await.unwrap();

        assert_eq!(store.calls(), vec![Call::DeleteRow(4)]);
        let ids: Vec<_> = store.rows().iter().map(|r| r[0].clone()).collect();
        assert_eq!(ids, vec!["ID", "1", "2", "7"]);
    }

    #[tokio::test]
    async fn test_delete_missing_id_leaves_table() {
        let store = students();
        let before = store.rows();

        let err = delete_record(&store, "6").await.unwrap_err();

        assert!(matches!(err, RosterError::NotFound(_)));
        assert_eq!(store.rows(), before);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_skips_empty_rows() {
        let store = MemoryStore::from_rows(&[&["ID", "Name"], &[], &["3", "Amr"]]);

        delete_record(&store, "3").await.unwrap();

        assert_eq!(store.calls(), vec![Call::DeleteRow(3)]);
    }
}
