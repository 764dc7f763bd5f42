//! Student roster operations
//!
//! Translates record-level operations into row and cell calls against a
//! [`TabularStore`](crate::store::TabularStore), using the header row to map
//! field names to columns.

pub mod adapter;
pub mod batch;
pub mod record;

pub use adapter::{
    Fetched, add_record, add_records_batch, delete_record, find_by_id, list_records,
    update_record,
};
pub use batch::parse_batch;
pub use record::Record;
