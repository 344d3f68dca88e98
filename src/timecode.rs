use crate::error::{Result, SubtitleError};

/// Parses an `HH:MM:SS[.mmm]` (or `HH:MM:SS,mmm`) timestamp into seconds.
pub fn parse_timestamp(text: &str) -> Result<f64> {
    let malformed = || SubtitleError::MalformedTimestamp(text.to_string());

    let fields: Vec<&str> = text.trim().split(':').collect();
    if fields.len() != 3 {
        return Err(malformed());
    }

    let hours = parse_whole(fields[0]).ok_or_else(malformed)?;
    let minutes = parse_whole(fields[1]).ok_or_else(malformed)?;
    let seconds = parse_fractional(fields[2]).ok_or_else(malformed)?;

    Ok(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Formats seconds as `HH:MM:SS.mmm`, rounding to the nearest millisecond.
pub fn format_seconds(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02}.{millis:03}")
}

fn parse_whole(field: &str) -> Option<f64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u64>().ok().map(|value| value as f64)
}

fn parse_fractional(field: &str) -> Option<f64> {
    let normalized = field.replace(',', ".");
    let (whole, fraction) = match normalized.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (normalized.as_str(), None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }

    normalized.parse::<f64>().ok()
}
