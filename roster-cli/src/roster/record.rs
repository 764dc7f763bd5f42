//! Student record type
//!
//! A record is an ordered list of `(field, value)` pairs keyed by header
//! name. Keeping the pairs ordered lets a record read from the worksheet
//! carry any extra columns through in header order, while the typed
//! accessors cover the five known student fields.

use serde::ser::{Serialize, SerializeMap, Serializer};

pub const ID: &str = "ID";
pub const NAME: &str = "Name";
pub const EMAIL: &str = "Email";
pub const GRADE: &str = "Grade";
pub const NOTES: &str = "Notes";

/// Fields that may be overwritten after creation. `ID` is immutable.
pub const EDITABLE_FIELDS: [&str; 4] = [NAME, EMAIL, GRADE, NOTES];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a student record from the four user-entered fields
    pub fn student(
        name: impl Into<String>,
        email: impl Into<String>,
        grade: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self::new()
            .with(NAME, name)
            .with(EMAIL, email)
            .with(GRADE, grade)
            .with(NOTES, notes)
    }

    /// Builder-style [`Record::set`]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field, replacing any existing value in place
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.get(ID)
    }

    /// True when the record carries no usable ID (absent or whitespace only)
    pub fn lacks_id(&self) -> bool {
        self.id().is_none_or(|id| id.trim().is_empty())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Map a raw worksheet row onto the header. Short rows are padded with
    /// empty strings; cells beyond the header are ignored.
    pub fn from_row(headers: &[String], row: &[String]) -> Self {
        let mut record = Self::new();
        for (i, header) in headers.iter().enumerate() {
            let value = row.get(i).cloned().unwrap_or_default();
            record.set(header.clone(), value);
        }
        record
    }

    /// Project the record onto the header order. Header fields the record
    /// lacks become empty strings; fields not in the header are dropped.
    pub fn to_row(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .map(|h| self.get(h).unwrap_or_default().to_string())
            .collect()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        ["ID", "Name", "Email", "Grade", "Notes"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    #[test]
    fn test_to_row_pads_missing_and_drops_unknown() {
        let record = Record::new()
            .with(NAME, "Amr")
            .with("Nickname", "A");

        assert_eq!(record.to_row(&headers()), vec!["", "Amr", "", "", ""]);
    }

    #[test]
    fn test_from_row_pads_short_rows() {
        let row = vec!["4".to_string(), "Mona".to_string()];
        let record = Record::from_row(&headers(), &row);

        assert_eq!(record.id(), Some("4"));
        assert_eq!(record.get(NAME), Some("Mona"));
        assert_eq!(record.get(NOTES), Some(""));
        assert_eq!(record.fields().count(), 5);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut record = Record::student("Amr", "amr@example.com", "B", "");
        record.set(GRADE, "A");

        let fields: Vec<_> = record.fields().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![NAME, EMAIL, GRADE, NOTES]);
        assert_eq!(record.get(GRADE), Some("A"));
    }

    #[test]
    fn test_lacks_id() {
        assert!(Record::new().lacks_id());
        assert!(Record::new().with(ID, "  ").lacks_id());
        assert!(!Record::new().with(ID, "7").lacks_id());
    }

    #[test]
    fn test_serializes_in_field_order() {
        let record = Record::from_row(&headers(), &["1".to_string(), "Amr".to_string()]);
        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(
            json,
            r#"{"ID":"1","Name":"Amr","Email":"","Grade":"","Notes":""}"#
        );
    }
}
