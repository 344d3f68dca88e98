use regex::Regex;
use std::sync::LazyLock;

static INLINE_TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\d{1,2}:\d{2}:\d{2}[.,]\d{3}>").expect("valid regex"));
static VOICE_OR_CLASS_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[cv](?:[.\s][^>]*)?>").expect("valid regex"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Strips caption markup from `raw` and collapses whitespace.
///
/// Tags are removed before whitespace is collapsed so that the gaps they
/// leave behind are folded into single spaces.
pub fn sanitize(raw: &str) -> String {
    let text = INLINE_TIMESTAMP.replace_all(raw, "");
    let text = VOICE_OR_CLASS_TAG.replace_all(&text, "");
    let text = ANY_TAG.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}
