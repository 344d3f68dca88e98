use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SubtitleError>;

/// Failures surfaced by subtitle retrieval and parsing.
#[derive(Debug, Error)]
pub enum SubtitleError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Subtitle downloader is not available: {0}")]
    ToolUnavailable(String),

    #[error("Failed to download '{language}' subtitles for video {video_id}: {reason}")]
    DownloadFailed {
        video_id: String,
        language: String,
        reason: String,
    },

    #[error("Downloading '{language}' subtitles for video {video_id} timed out after {timeout_ms} ms")]
    Timeout {
        video_id: String,
        language: String,
        timeout_ms: u64,
    },

    #[error(
        "No subtitles found for video {video_id} (tried: {tried}){detail}",
        tried = .attempted_languages.join(", "),
        detail = last_error_detail(.last_error)
    )]
    NoSubtitlesFound {
        video_id: String,
        attempted_languages: Vec<String>,
        last_error: Option<Box<SubtitleError>>,
    },

    #[error("Malformed timestamp '{0}'")]
    MalformedTimestamp(String),

    #[error("Failed to remove working area {}: {reason}", .path.display())]
    CleanupFailed { path: PathBuf, reason: String },

    #[error("Failed to prepare working area: {0}")]
    WorkingArea(#[source] std::io::Error),
}

fn last_error_detail(last_error: &Option<Box<SubtitleError>>) -> String {
    match last_error {
        Some(err) => format!("; last error: {err}"),
        None => String::new(),
    }
}

impl SubtitleError {
    /// The video this failure relates to, when known.
    pub fn video_id(&self) -> Option<&str> {
        match self {
            SubtitleError::DownloadFailed { video_id, .. }
            | SubtitleError::Timeout { video_id, .. }
            | SubtitleError::NoSubtitlesFound { video_id, .. } => Some(video_id),
            _ => None,
        }
    }

    /// The language candidate this failure relates to, when known.
    pub fn language(&self) -> Option<&str> {
        match self {
            SubtitleError::DownloadFailed { language, .. }
            | SubtitleError::Timeout { language, .. } => Some(language),
            _ => None,
        }
    }

    /// Whether the orchestrator should move on to the next language candidate.
    pub fn is_per_language(&self) -> bool {
        matches!(
            self,
            SubtitleError::DownloadFailed { .. } | SubtitleError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subtitles_message_lists_languages_and_last_error() {
        let err = SubtitleError::NoSubtitlesFound {
            video_id: "dQw4w9WgXcQ".to_string(),
            attempted_languages: vec!["xx".to_string(), "yy".to_string()],
            last_error: Some(Box::new(SubtitleError::Timeout {
                video_id: "dQw4w9WgXcQ".to_string(),
                language: "yy".to_string(),
                timeout_ms: 500,
            })),
        };

        let message = err.to_string();
        assert!(message.contains("tried: xx, yy"));
        assert!(message.contains("timed out after 500 ms"));
        assert_eq!(err.video_id(), Some("dQw4w9WgXcQ"));
        assert_eq!(err.language(), None);
    }

    #[test]
    fn per_language_failures_are_recoverable() {
        let failed = SubtitleError::DownloadFailed {
            video_id: "abc".to_string(),
            language: "en".to_string(),
            reason: "video is private".to_string(),
        };
        assert!(failed.is_per_language());
        assert_eq!(failed.language(), Some("en"));
        assert!(!SubtitleError::ToolUnavailable("yt-dlp".to_string()).is_per_language());
    }
}
