use crate::caption::{CaptionEntry, CaptionSet};
use crate::error::Result;
use crate::normalize::{normalize_with, NormalizeOptions};
use crate::sanitize::sanitize;
use crate::timecode::parse_timestamp;
use anyhow::anyhow;
use encoding_rs::{Encoding, UTF_16BE, UTF_16LE};
use regex::Regex;
use std::sync::LazyLock;

static VTT_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}:\d{2}:\d{2}\.\d{3})\s+-->\s+(\d{1,2}:\d{2}:\d{2}\.\d{3})(?:\s.*)?$")
        .expect("valid regex")
});
static SRT_TIMING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}:\d{2}:\d{2}[,.]\d{3})\s+-->\s+(\d{1,2}:\d{2}:\d{2}[,.]\d{3})")
        .expect("valid regex")
});
static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

/// Subtitle file formats understood by the parsers.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SubtitleFormat {
    /// WebVTT (`.vtt`).
    WebVtt,
    /// SubRip (`.srt`).
    SubRip,
}

impl SubtitleFormat {
    /// All supported formats, in order of preference.
    pub const ALL: [SubtitleFormat; 2] = [SubtitleFormat::WebVtt, SubtitleFormat::SubRip];

    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::WebVtt => "vtt",
            SubtitleFormat::SubRip => "srt",
        }
    }

    /// Picks the format for a file extension, ignoring case.
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    /// Parses `content` in this format and normalizes the result.
    pub fn parse(&self, content: &str) -> CaptionSet {
        self.parse_with(content, &NormalizeOptions::default())
    }

    pub fn parse_with(&self, content: &str, options: &NormalizeOptions) -> CaptionSet {
        let entries = match self {
            SubtitleFormat::WebVtt => parse_vtt_entries(content),
            SubtitleFormat::SubRip => parse_srt_entries(content),
        };
        normalize_with(entries, options)
    }
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for SubtitleFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        Self::from_extension(trimmed).ok_or_else(|| {
            format!("Unsupported subtitle format '{s}'. Expected 'vtt' or 'srt'.")
        })
    }
}

/// Parses a WebVTT document into normalized captions.
pub fn parse_vtt(content: &str) -> CaptionSet {
    SubtitleFormat::WebVtt.parse(content)
}

/// Parses a SubRip document into normalized captions.
pub fn parse_srt(content: &str) -> CaptionSet {
    SubtitleFormat::SubRip.parse(content)
}

struct OpenCue {
    start: f64,
    end: f64,
    text: String,
}

impl OpenCue {
    fn finish(self) -> Option<CaptionEntry> {
        let text = sanitize(&self.text);
        if text.is_empty() {
            None
        } else {
            Some(CaptionEntry::from_range(text, self.start, self.end))
        }
    }
}

fn parse_vtt_entries(content: &str) -> Vec<CaptionEntry> {
    let mut entries = Vec::new();
    let mut current: Option<OpenCue> = None;
    let mut after_blank = true;
    let mut lines = content.lines().map(str::trim).peekable();

    // Metadata lines after the header are dropped since no cue is open yet.
    if lines.peek().is_some_and(|line| line.starts_with("WEBVTT")) {
        lines.next();
    }

    while let Some(line) = lines.next() {
        if line.is_empty() {
            after_blank = true;
            continue;
        }
        let starts_block = std::mem::replace(&mut after_blank, false);

        if let Some(captures) = VTT_TIMING.captures(line) {
            entries.extend(current.take().and_then(OpenCue::finish));
            current = match (parse_timestamp(&captures[1]), parse_timestamp(&captures[2])) {
                (Ok(start), Ok(end)) => Some(OpenCue {
                    start,
                    end,
                    text: String::new(),
                }),
                (Err(err), _) | (_, Err(err)) => {
                    tracing::debug!(%err, "skipping WebVTT cue");
                    None
                }
            };
            continue;
        }

        if starts_block
            && lines.peek().is_some_and(|next| VTT_TIMING.is_match(next))
            && is_cue_identifier(line, current.as_ref())
        {
            continue;
        }

        if let Some(cue) = current.as_mut() {
            if !cue.text.is_empty() {
                cue.text.push(' ');
            }
            cue.text.push_str(line);
        }
    }

    entries.extend(current.take().and_then(OpenCue::finish));
    entries
}

/// A block's first line directly followed by a timing line is a cue identifier
/// when no text is pending for the open cue. Once text is pending only numeric
/// identifiers are dropped; anything else is caption text.
fn is_cue_identifier(line: &str, open: Option<&OpenCue>) -> bool {
    let text_pending = open.is_some_and(|cue| !cue.text.is_empty());
    !text_pending || line.bytes().all(|b| b.is_ascii_digit())
}

fn parse_srt_entries(content: &str) -> Vec<CaptionEntry> {
    let content = content.replace("\r\n", "\n");

    BLANK_LINE
        .split(&content)
        .filter_map(|block| {
            let lines: Vec<&str> = block
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            if lines.len() < 3 {
                return None;
            }

            let captures = SRT_TIMING.captures(lines[1])?;
            let timing = parse_srt_timing(&captures[1], &captures[2]);
            let (start, end) = match timing {
                Ok(timing) => timing,
                Err(err) => {
                    tracing::debug!(%err, "skipping SubRip block");
                    return None;
                }
            };

            OpenCue {
                start,
                end,
                text: lines[2..].join(" "),
            }
            .finish()
        })
        .collect()
}

fn parse_srt_timing(start: &str, end: &str) -> Result<(f64, f64)> {
    Ok((
        parse_timestamp(&start.replace(',', "."))?,
        parse_timestamp(&end.replace(',', "."))?,
    ))
}

/// Decodes raw subtitle bytes as UTF-8 or UTF-16, honouring a byte-order mark.
pub fn decode_subtitle_bytes(bytes: &[u8]) -> anyhow::Result<String> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (decoded, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        if had_errors {
            return Err(anyhow!(
                "Subtitle file is not valid {}",
                encoding.name()
            ));
        }
        return Ok(decoded.into_owned());
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    // UTF-16 without a BOM: guess from where the NUL bytes sit.
    let looks_utf16le = bytes.len() >= 2 && bytes[0] != 0 && bytes[1] == 0;
    let looks_utf16be = bytes.len() >= 2 && bytes[0] == 0 && bytes[1] != 0;
    let encoding = if looks_utf16le {
        Some(UTF_16LE)
    } else if looks_utf16be {
        Some(UTF_16BE)
    } else {
        None
    };

    if let Some(enc) = encoding {
        let (decoded, had_errors) = enc.decode_without_bom_handling(bytes);
        if !had_errors {
            return Ok(decoded.into_owned());
        }
    }

    Err(anyhow!("Unable to determine the text encoding of the subtitle file"))
}
