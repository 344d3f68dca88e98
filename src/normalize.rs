use crate::caption::{CaptionEntry, CaptionSet};
use crate::sanitize::sanitize;
use std::collections::HashSet;

/// Entries shorter than this are treated as auto-caption artifacts.
pub const MIN_CAPTION_DURATION_SECONDS: f64 = 0.1;

/// Start times are bucketed to deciseconds when detecting duplicates.
pub const DEDUP_BUCKETS_PER_SECOND: f64 = 10.0;

/// Thresholds used when cleaning up parsed caption entries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub min_duration_seconds: f64,
    pub dedup_buckets_per_second: f64,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            min_duration_seconds: MIN_CAPTION_DURATION_SECONDS,
            dedup_buckets_per_second: DEDUP_BUCKETS_PER_SECOND,
        }
    }
}

/// Normalizes with the default thresholds.
pub fn normalize(entries: Vec<CaptionEntry>) -> CaptionSet {
    normalize_with(entries, &NormalizeOptions::default())
}

/// Drops near-zero-duration entries, removes duplicates keyed on
/// `(text, floor(start * buckets))` keeping the first occurrence, then
/// stable-sorts by start time.
pub fn normalize_with(entries: Vec<CaptionEntry>, options: &NormalizeOptions) -> CaptionSet {
    let mut seen: HashSet<(String, i64)> = HashSet::with_capacity(entries.len());

    let mut kept: Vec<CaptionEntry> = entries
        .into_iter()
        .filter(|entry| entry.duration_seconds() >= options.min_duration_seconds)
        .filter(|entry| {
            let bucket = (entry.start_seconds() * options.dedup_buckets_per_second).floor() as i64;
            seen.insert((sanitize(entry.text()), bucket))
        })
        .collect();

    kept.sort_by(|a, b| a.start_seconds().total_cmp(&b.start_seconds()));

    CaptionSet::from_normalized(kept)
}
