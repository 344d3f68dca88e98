use crate::cookies::CookieSource;
use crate::downloader::YT_DLP;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_LANGUAGES: [&str; 2] = ["en", "hi"];

pub const ENV_TIMEOUT_MS: &str = "YT_SUBTITLES_TIMEOUT_MS";
pub const ENV_USE_COOKIES: &str = "YT_SUBTITLES_USE_COOKIES";
pub const ENV_COOKIE_SOURCE: &str = "YT_SUBTITLES_COOKIE_SOURCE";
pub const ENV_DOWNLOADER: &str = "YT_SUBTITLES_DOWNLOADER";
pub const ENV_LANGUAGES: &str = "YT_SUBTITLES_LANGUAGES";

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub timeout_ms: u64,
    pub use_cookies: bool,
    pub cookie_source: Option<CookieSource>,
    pub downloader_binary: String,
    pub default_languages: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            use_cookies: false,
            cookie_source: None,
            downloader_binary: YT_DLP.to_string(),
            default_languages: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from a key lookup; invalid values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut settings = Settings::default();

        if let Some(raw) = get(ENV_TIMEOUT_MS) {
            match raw.parse::<u64>() {
                Ok(timeout_ms) if timeout_ms > 0 => settings.timeout_ms = timeout_ms,
                _ => tracing::warn!(
                    value = %raw,
                    "ignoring invalid {ENV_TIMEOUT_MS}, using {DEFAULT_TIMEOUT_MS} ms"
                ),
            }
        }

        if let Some(raw) = get(ENV_USE_COOKIES) {
            match parse_flag(&raw) {
                Some(flag) => settings.use_cookies = flag,
                None => tracing::warn!(value = %raw, "ignoring invalid {ENV_USE_COOKIES}"),
            }
        }

        if let Some(raw) = get(ENV_COOKIE_SOURCE) {
            match raw.parse::<CookieSource>() {
                Ok(source) => settings.cookie_source = Some(source),
                Err(err) => tracing::warn!(%err, "ignoring {ENV_COOKIE_SOURCE}"),
            }
        }

        if let Some(binary) = get(ENV_DOWNLOADER) {
            settings.downloader_binary = binary;
        }

        if let Some(raw) = get(ENV_LANGUAGES) {
            let languages = parse_language_list(&raw);
            if languages.is_empty() {
                tracing::warn!(value = %raw, "ignoring empty {ENV_LANGUAGES}");
            } else {
                settings.default_languages = languages;
            }
        }

        settings
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Splits a comma-separated language list, dropping blanks and duplicates.
pub fn parse_language_list(raw: &str) -> Vec<String> {
    let mut languages: Vec<String> = Vec::new();
    for language in raw.split(',').filter_map(normalize_language) {
        if !languages.contains(&language) {
            languages.push(language);
        }
    }
    languages
}

/// Trims a language code and rejects anything that is not `xx`, `xxx` or a
/// subtagged form such as `en-US`.
///
/// The primary language is lower-cased. Two-letter regions are upper-cased
/// and four-letter scripts title-cased (`pt-BR`, `zh-Hans`), since the
/// downloader matches YouTube's track names case-sensitively.
pub fn normalize_language(raw: &str) -> Option<String> {
    let mut parts = raw.trim().split('-');
    let primary = parts.next()?;
    if !(2..=3).contains(&primary.len()) || !primary.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    let mut language = primary.to_ascii_lowercase();
    for part in parts {
        if !(1..=8).contains(&part.len()) || !part.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return None;
        }
        language.push('-');
        language.push_str(&subtag_case(part));
    }
    Some(language)
}

fn subtag_case(part: &str) -> String {
    let alphabetic = part.bytes().all(|b| b.is_ascii_alphabetic());
    match part.len() {
        2 if alphabetic => part.to_ascii_uppercase(),
        4 if alphabetic => {
            let lower = part.to_ascii_lowercase();
            lower[..1].to_ascii_uppercase() + &lower[1..]
        }
        _ => part.to_ascii_lowercase(),
    }
}
