use rust_mcp_sdk::schema::{schema_utils::CallToolError, CallToolResult, TextContent};
use rust_mcp_sdk::{macros::mcp_tool, macros::JsonSchema, tool_box};
use serde::{Deserialize, Serialize};
use yt_subtitles::config::{normalize_language, Settings};
use yt_subtitles::{extract_video_id, RetrievalRequest, SubtitleRetriever};

tool_box!(SubtitleTools, [GetTranscript]);

#[mcp_tool(
    name = "get_transcript",
    description = "Fetch the caption text of a YouTube video. Falls back to the server's default languages when the requested one has no captions.",
    title = "Get YouTube transcript",
    idempotent_hint = true,
    destructive_hint = false,
    open_world_hint = true,
    read_only_hint = true,
    meta = r#"{"version": "0.1.0"}"#
)]
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTranscript {
    /// YouTube video id (11 characters, e.g. `dQw4w9WgXcQ`). A full YouTube URL is also accepted.
    #[serde(rename = "videoId")]
    video_id: String,
    /// Two-letter language code such as `en` or `de`. Omit to use the server defaults.
    #[serde(default)]
    lang: Option<String>,
}

impl GetTranscript {
    pub async fn call_tool(
        &self,
        retriever: &SubtitleRetriever,
        settings: &Settings,
    ) -> Result<CallToolResult, CallToolError> {
        let video_id = extract_video_id(&self.video_id).map_err(|err| {
            CallToolError::invalid_arguments("get_transcript", Some(err.to_string()))
        })?;

        let lang = match self.lang.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(normalize_language(raw).ok_or_else(|| {
                CallToolError::invalid_arguments(
                    "get_transcript",
                    Some(format!("`lang` must be a language code like `en`, got '{raw}'")),
                )
            })?),
        };

        let request = RetrievalRequest::from_settings(&video_id, lang.as_deref(), settings);
        let captions = retriever
            .retrieve(&request)
            .await
            .map_err(|err| CallToolError::from_message(err.to_string()))?;

        Ok(CallToolResult::text_content(vec![TextContent::from(
            captions.to_plain_text(),
        )]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_mcp_sdk::schema::ContentBlock;
    use std::io;
    use std::sync::{Arc, Mutex};
    use yt_subtitles::{DownloadRequest, Downloader, ExitResult};

    /// Writes a WebVTT file for `en` and fails every other language.
    #[derive(Clone, Default)]
    struct EnglishOnly {
        languages: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Downloader for EnglishOnly {
        fn name(&self) -> &str {
            "english-only"
        }

        async fn probe_available(&self) -> bool {
            true
        }

        async fn download(&self, request: &DownloadRequest<'_>) -> io::Result<ExitResult> {
            self.languages
                .lock()
                .unwrap()
                .push(request.language.to_string());
            if request.language != "en" {
                return Ok(ExitResult {
                    stderr: "ERROR: no subtitles".to_string(),
                    exit_code: Some(1),
                    ..ExitResult::default()
                });
            }
            let name = format!("{}.en.vtt", request.output_stem());
            std::fs::write(
                request.output_dir.join(name),
                "WEBVTT\n\n00:00:01.000 --> 00:00:03.000\nHello <c>world</c>\n",
            )?;
            Ok(ExitResult {
                exit_code: Some(0),
                ..ExitResult::default()
            })
        }
    }

    fn tool(video_id: &str, lang: Option<&str>) -> GetTranscript {
        GetTranscript {
            video_id: video_id.to_string(),
            lang: lang.map(str::to_string),
        }
    }

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0] {
            ContentBlock::TextContent(content) => &content.text,
            other => panic!("expected text content, got {other:?}"),
        }
    }

    fn setup(
        languages: &[&str],
    ) -> (EnglishOnly, SubtitleRetriever, Settings, tempfile::TempDir) {
        let scratch = tempfile::tempdir().unwrap();
        let downloader = EnglishOnly::default();
        let retriever = SubtitleRetriever::new(downloader.clone()).with_scratch_root(scratch.path());
        let settings = Settings {
            default_languages: languages.iter().map(|s| s.to_string()).collect(),
            ..Settings::default()
        };
        (downloader, retriever, settings, scratch)
    }

    #[tokio::test]
    async fn returns_plain_text_after_falling_back() {
        let (downloader, retriever, settings, _scratch) = setup(&["en"]);

        let result = tool("https://youtu.be/dQw4w9WgXcQ", Some("DE"))
            .call_tool(&retriever, &settings)
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "Hello world");
        assert_eq!(*downloader.languages.lock().unwrap(), vec!["de", "en"]);
    }

    #[tokio::test]
    async fn bad_arguments_are_rejected_before_downloading() {
        let (downloader, retriever, settings, _scratch) = setup(&["en"]);

        for bad in [tool("not a video", None), tool("dQw4w9WgXcQ", Some("english"))] {
            let err = bad.call_tool(&retriever, &settings).await.unwrap_err();
            assert!(
                err.to_string()
                    .starts_with("Invalid arguments for tool 'get_transcript'"),
                "{err}"
            );
        }
        assert!(downloader.languages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn retrieval_failure_becomes_an_error_result() {
        let (downloader, retriever, settings, _scratch) = setup(&["hi"]);

        let err = tool("dQw4w9WgXcQ", Some("fr"))
            .call_tool(&retriever, &settings)
            .await
            .unwrap_err();
        let result = CallToolResult::from(err);

        assert_eq!(result.is_error, Some(true));
        let text = text_of(&result);
        assert!(text.contains("dQw4w9WgXcQ"), "{text}");
        assert!(text.contains("fr"), "{text}");
        assert_eq!(*downloader.languages.lock().unwrap(), vec!["fr", "hi"]);
    }
}
