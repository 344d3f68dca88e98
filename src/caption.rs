use crate::timecode::format_seconds;
use serde::Serialize;
use std::fmt::Write as _;

/// A single caption cue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionEntry {
    text: String,
    start_seconds: f64,
    duration_seconds: f64,
}

impl CaptionEntry {
    /// Builds an entry, clamping negative start and duration values to zero.
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds: start_seconds.max(0.0),
            duration_seconds: duration_seconds.max(0.0),
        }
    }

    /// Builds an entry from a start and end offset.
    pub fn from_range(text: impl Into<String>, start_seconds: f64, end_seconds: f64) -> Self {
        Self::new(text, start_seconds, end_seconds - start_seconds)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start_seconds(&self) -> f64 {
        self.start_seconds
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// Caption entries ordered by start time, produced by [`crate::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CaptionSet {
    entries: Vec<CaptionEntry>,
}

impl CaptionSet {
    pub(crate) fn from_normalized(entries: Vec<CaptionEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CaptionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CaptionEntry> {
        self.entries.iter()
    }

    /// Joins every entry's text with single spaces.
    pub fn to_plain_text(&self) -> String {
        self.entries
            .iter()
            .map(CaptionEntry::text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Renders one `[HH:MM:SS.mmm] text` line per entry.
    pub fn to_timestamped_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(
                &mut out,
                "[{}] {}",
                format_seconds(entry.start_seconds),
                entry.text
            );
        }
        out
    }
}

impl<'a> IntoIterator for &'a CaptionSet {
    type Item = &'a CaptionEntry;
    type IntoIter = std::slice::Iter<'a, CaptionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_clamps_negative_values() {
        let entry = CaptionEntry::from_range("late", 5.0, 4.0);
        assert_eq!(entry.duration_seconds(), 0.0);

        let entry = CaptionEntry::new("early", -1.0, 2.0);
        assert_eq!(entry.start_seconds(), 0.0);
        assert_eq!(entry.end_seconds(), 2.0);
    }

    #[test]
    fn renders_plain_and_timestamped_text() {
        let set = CaptionSet::from_normalized(vec![
            CaptionEntry::new("Hello", 1.0, 2.0),
            CaptionEntry::new("world", 3.25, 1.0),
        ]);

        assert_eq!(set.to_plain_text(), "Hello world");
        assert_eq!(
            set.to_timestamped_text(),
            "[00:00:01.000] Hello\n[00:00:03.250] world\n"
        );
    }

    #[test]
    fn serializes_as_a_list_of_camel_case_entries() {
        let set = CaptionSet::from_normalized(vec![CaptionEntry::new("Hi", 0.5, 1.5)]);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{ "text": "Hi", "startSeconds": 0.5, "durationSeconds": 1.5 }])
        );
    }
}
