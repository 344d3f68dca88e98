use crate::error::{Result, SubtitleError};

/// YouTube video identifiers are always this long.
pub const VIDEO_ID_LEN: usize = 11;

/// Returns true when `id` looks like a bare YouTube video identifier.
pub fn is_video_id(id: &str) -> bool {
    id.len() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Accepts a bare video id or a YouTube URL and returns the video id.
pub fn extract_video_id(url_or_id: &str) -> Result<String> {
    let input = url_or_id.trim();
    if input.is_empty() {
        return Err(SubtitleError::InvalidArgument(
            "video id cannot be empty".to_string(),
        ));
    }
    if is_video_id(input) {
        return Ok(input.to_string());
    }

    let url_str = if input.starts_with("http://") || input.starts_with("https://") {
        input.to_string()
    } else {
        format!("https://{input}")
    };

    url::Url::parse(&url_str)
        .ok()
        .and_then(|url| video_id_from_url(&url))
        .ok_or_else(|| {
            SubtitleError::InvalidArgument(format!(
                "'{url_or_id}' is not a YouTube video id (11 characters) or a YouTube URL"
            ))
        })
}

fn video_id_from_url(url: &url::Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let is_youtube = host == "youtube.com" || host.ends_with(".youtube.com");
    let is_short_link = host == "youtu.be";

    let candidate = if is_short_link {
        url.path_segments()?.next().map(str::to_string)
    } else if is_youtube {
        let from_query = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned());
        from_query.or_else(|| {
            let segments: Vec<&str> = url.path_segments()?.collect();
            match segments.as_slice() {
                ["embed" | "shorts" | "live" | "v", id, ..] => Some(id.to_string()),
                _ => None,
            }
        })
    } else {
        None
    };

    candidate.filter(|id| is_video_id(id))
}
