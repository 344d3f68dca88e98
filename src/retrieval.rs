use crate::caption::CaptionSet;
use crate::config::{normalize_language, Settings, DEFAULT_LANGUAGES, DEFAULT_TIMEOUT_MS};
use crate::cookies::{self, CookieSource};
use crate::downloader::{classify_exit, classify_io_error, DownloadRequest, Downloader};
use crate::error::{Result, SubtitleError};
use crate::normalize::NormalizeOptions;
use crate::parser::{decode_subtitle_bytes, SubtitleFormat};
use crate::workspace::WorkingArea;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One subtitle retrieval: which video, which languages, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    pub video_id: String,
    pub language_candidates: Vec<String>,
    pub timeout_ms: u64,
    pub use_cookies: bool,
}

impl RetrievalRequest {
    /// A request using the built-in defaults (`en`, then `hi`; 30 s timeout).
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            language_candidates: DEFAULT_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            use_cookies: false,
        }
    }

    /// A request for `language` (if any) with the configured fallbacks behind it.
    pub fn from_settings(
        video_id: impl Into<String>,
        language: Option<&str>,
        settings: &Settings,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            language_candidates: candidate_languages(language, &settings.default_languages),
            timeout_ms: settings.timeout_ms,
            use_cookies: settings.use_cookies,
        }
    }

    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.language_candidates = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_cookies(mut self, use_cookies: bool) -> Self {
        self.use_cookies = use_cookies;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Puts the requested language first, followed by the remaining defaults.
pub fn candidate_languages(requested: Option<&str>, defaults: &[String]) -> Vec<String> {
    let requested = requested.and_then(normalize_language);
    let mut candidates: Vec<String> = requested.into_iter().collect();
    for language in defaults {
        if !candidates.contains(language) {
            candidates.push(language.clone());
        }
    }
    candidates
}

/// Fetches subtitles through a [`Downloader`], trying languages in order.
pub struct SubtitleRetriever {
    downloader: Box<dyn Downloader>,
    cookie_source: Option<CookieSource>,
    normalize: NormalizeOptions,
    scratch_root: Option<PathBuf>,
}

impl SubtitleRetriever {
    pub fn new(downloader: impl Downloader + 'static) -> Self {
        Self {
            downloader: Box::new(downloader),
            cookie_source: None,
            normalize: NormalizeOptions::default(),
            scratch_root: None,
        }
    }

    pub fn with_cookie_source(mut self, source: Option<CookieSource>) -> Self {
        self.cookie_source = source;
        self
    }

    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> Self {
        self.normalize = options;
        self
    }

    /// Creates working areas under `root` instead of the system temp dir.
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Returns captions for the first language candidate that yields any.
    ///
    /// The working area is released on every path; a failed release is
    /// logged and does not change the outcome.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> Result<CaptionSet> {
        let video_id = request.video_id.trim();
        if video_id.is_empty() {
            return Err(SubtitleError::InvalidArgument(
                "video id cannot be empty".to_string(),
            ));
        }
        if request.language_candidates.is_empty() {
            return Err(SubtitleError::InvalidArgument(
                "at least one language candidate is required".to_string(),
            ));
        }

        let area = WorkingArea::acquire(self.scratch_root.clone())
            .await
            .map_err(SubtitleError::WorkingArea)?;

        let outcome = self.retrieve_in(&area, video_id, request).await;

        if let Err(err) = area.release_async().await {
            tracing::warn!(%err, "working area cleanup failed");
        }

        outcome
    }

    async fn retrieve_in(
        &self,
        area: &WorkingArea,
        video_id: &str,
        request: &RetrievalRequest,
    ) -> Result<CaptionSet> {
        let cookies = if request.use_cookies {
            self.provision_cookies(area.path()).await
        } else {
            None
        };

        if !self.downloader.probe_available().await {
            return Err(SubtitleError::ToolUnavailable(format!(
                "'{}' could not be run",
                self.downloader.name()
            )));
        }

        let mut attempted_languages = Vec::with_capacity(request.language_candidates.len());
        let mut last_error = None;

        for language in &request.language_candidates {
            attempted_languages.push(language.clone());
            tracing::debug!(video_id, language = %language, "attempting subtitle download");

            let download = DownloadRequest {
                video_id,
                language,
                output_dir: area.path(),
                timeout: request.timeout(),
                cookies: cookies.as_deref(),
            };

            match self.attempt(&download).await {
                Ok(captions) if !captions.is_empty() => {
                    tracing::info!(
                        video_id,
                        language = %language,
                        entries = captions.len(),
                        "retrieved subtitles"
                    );
                    return Ok(captions);
                }
                Ok(_) => {
                    let err = SubtitleError::DownloadFailed {
                        video_id: video_id.to_string(),
                        language: language.clone(),
                        reason: "subtitle file contained no usable captions".to_string(),
                    };
                    tracing::warn!(%err, "language attempt failed");
                    last_error = Some(err);
                }
                Err(err) => {
                    tracing::warn!(%err, "language attempt failed");
                    last_error = Some(err);
                }
            }
        }

        Err(SubtitleError::NoSubtitlesFound {
            video_id: video_id.to_string(),
            attempted_languages,
            last_error: last_error.map(Box::new),
        })
    }

    async fn provision_cookies(&self, dir: &Path) -> Option<PathBuf> {
        let Some(source) = &self.cookie_source else {
            tracing::warn!("cookies requested but no cookie source is configured");
            return None;
        };
        match cookies::provision(source, dir).await {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "continuing without cookies");
                None
            }
        }
    }

    async fn attempt(&self, request: &DownloadRequest<'_>) -> Result<CaptionSet> {
        let failed = |reason: String| SubtitleError::DownloadFailed {
            video_id: request.video_id.to_string(),
            language: request.language.to_string(),
            reason,
        };

        let result = self.downloader.download(request).await.map_err(|err| {
            classify_io_error(request.video_id, request.language, request.timeout, &err)
        })?;
        if let Some(err) = classify_exit(request.video_id, request.language, &result) {
            return Err(err);
        }

        let dir = request.output_dir.to_path_buf();
        let stem = request.output_stem();
        let files = tokio::task::spawn_blocking(move || find_subtitle_files(&dir, &stem))
            .await
            .map_err(|err| failed(format!("background task failed: {err}")))?
            .map_err(|err| failed(format!("failed to scan working area: {err}")))?;
        let Some((path, format)) = files.into_iter().next() else {
            return Err(failed("no subtitle files were produced".to_string()));
        };

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|err| failed(format!("failed to read {}: {err}", path.display())))?;
        let content = decode_subtitle_bytes(&bytes)
            .map_err(|err| failed(format!("failed to decode {}: {err}", path.display())))?;

        tracing::debug!(file = %path.display(), %format, "parsing subtitle file");
        Ok(format.parse_with(&content, &self.normalize))
    }
}

/// Lists subtitle files named `{stem}.…{ext}` in `dir`, WebVTT first and then
/// in natural name order.
pub fn find_subtitle_files(
    dir: &Path,
    stem: &str,
) -> std::io::Result<Vec<(PathBuf, SubtitleFormat)>> {
    let prefix = format!("{stem}.");
    let mut files: Vec<(PathBuf, SubtitleFormat)> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix))
        })
        .filter_map(|path| {
            let format = path
                .extension()
                .and_then(|ext| ext.to_str())
                .and_then(SubtitleFormat::from_extension)?;
            Some((path, format))
        })
        .collect();

    files.sort_by(|(a_path, a_format), (b_path, b_format)| {
        format_rank(*a_format)
            .cmp(&format_rank(*b_format))
            .then_with(|| natural_cmp(a_path, b_path))
    });
    Ok(files)
}

fn format_rank(format: SubtitleFormat) -> usize {
    SubtitleFormat::ALL
        .iter()
        .position(|candidate| *candidate == format)
        .unwrap_or(usize::MAX)
}

fn natural_cmp(a: &Path, b: &Path) -> Ordering {
    natord::compare(&a.to_string_lossy(), &b.to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_language_goes_first_without_duplicates() {
        let defaults = vec!["en".to_string(), "hi".to_string()];
        assert_eq!(candidate_languages(Some("DE"), &defaults), vec!["de", "en", "hi"]);
        assert_eq!(candidate_languages(Some("hi"), &defaults), vec!["hi", "en"]);
        assert_eq!(candidate_languages(None, &defaults), vec!["en", "hi"]);
        assert_eq!(candidate_languages(Some("not a code"), &defaults), vec!["en", "hi"]);
    }

    #[test]
    fn request_defaults_and_builders() {
        let request = RetrievalRequest::new("dQw4w9WgXcQ");
        assert_eq!(request.language_candidates, vec!["en", "hi"]);
        assert_eq!(request.timeout(), Duration::from_secs(30));
        assert!(!request.use_cookies);

        let request = request
            .with_languages(["fr"])
            .with_timeout_ms(1_000)
            .with_cookies(true);
        assert_eq!(request.language_candidates, vec!["fr"]);
        assert_eq!(request.timeout_ms, 1_000);
        assert!(request.use_cookies);
    }

    #[test]
    fn request_from_settings_uses_configured_values() {
        let settings = Settings {
            timeout_ms: 5_000,
            use_cookies: true,
            default_languages: vec!["en".to_string()],
            ..Settings::default()
        };
        let request = RetrievalRequest::from_settings("dQw4w9WgXcQ", Some("es"), &settings);
        assert_eq!(request.language_candidates, vec!["es", "en"]);
        assert_eq!(request.timeout_ms, 5_000);
        assert!(request.use_cookies);
    }

    #[test]
    fn finds_only_matching_files_preferring_vtt() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "abc-en.en.srt",
            "abc-en.en.vtt",
            "abc-en-us.en-US.vtt",
            "abc-hi.hi.vtt",
            "abc-en.en.json3",
            "cookies.txt",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let files = find_subtitle_files(dir.path(), "abc-en").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|(path, format)| {
                (
                    path.file_name().unwrap().to_string_lossy().into_owned(),
                    *format,
                )
            })
            .collect();
        assert_eq!(
            names,
            vec![
                ("abc-en.en.vtt".to_string(), SubtitleFormat::WebVtt),
                ("abc-en.en.srt".to_string(), SubtitleFormat::SubRip),
            ]
        );
    }
}
