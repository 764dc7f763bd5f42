//! Batch text input
//!
//! One student per line as `Name,Email,Grade,Notes`. Lines with fewer than
//! four comma-separated parts are dropped; parts past the fourth are ignored.
//! Commas cannot be quoted.

use super::record::Record;

pub fn parse_batch(text: &str) -> Vec<Record> {
    text.trim()
        .split('\n')
        .filter_map(|line| {
            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() < 4 {
                return None;
            }
            Some(Record::student(
                parts[0].trim(),
                parts[1].trim(),
                parts[2].trim(),
                parts[3].trim(),
            ))
        })
        .collect()
}
