use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use yt_subtitles::config::{self, Settings};
use yt_subtitles::cookies::CookieSource;
use yt_subtitles::{extract_video_id, RetrievalRequest, SubtitleRetriever, YtDlp};

/// Print the captions of a YouTube video, fetched with yt-dlp.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Video id (11 characters) or YouTube URL
    video: String,

    /// Preferred language code; the configured defaults are tried after it
    #[arg(short, long)]
    lang: Option<String>,

    /// Comma-separated fallback languages [env: YT_SUBTITLES_LANGUAGES] [default: en,hi]
    #[arg(long)]
    languages: Option<String>,

    /// Per-language download timeout in milliseconds [env: YT_SUBTITLES_TIMEOUT_MS] [default: 30000]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_ms: Option<u64>,

    /// Pass a session cookie file to the downloader [env: YT_SUBTITLES_USE_COOKIES]
    #[arg(long, conflicts_with = "no_cookies")]
    cookies: bool,

    /// Never pass cookies, even when the environment enables them
    #[arg(long)]
    no_cookies: bool,

    /// Cookie file path or http(s) URL [env: YT_SUBTITLES_COOKIE_SOURCE]
    #[arg(long)]
    cookie_source: Option<CookieSource>,

    /// Downloader executable [env: YT_SUBTITLES_DOWNLOADER] [default: yt-dlp]
    #[arg(long)]
    downloader: Option<String>,

    /// Prefix each caption with its start time
    #[arg(long, conflicts_with = "json")]
    timestamps: bool,

    /// Print caption entries as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    /// Applies the flags given on the command line on top of `base`.
    fn settings(&self, mut base: Settings) -> Settings {
        if let Some(timeout_ms) = self.timeout_ms {
            base.timeout_ms = timeout_ms;
        }
        if self.cookies {
            base.use_cookies = true;
        }
        if self.no_cookies {
            base.use_cookies = false;
        }
        if let Some(source) = &self.cookie_source {
            base.cookie_source = Some(source.clone());
        }
        if let Some(downloader) = &self.downloader {
            base.downloader_binary = downloader.clone();
        }
        if let Some(raw) = &self.languages {
            let languages = config::parse_language_list(raw);
            if languages.is_empty() {
                tracing::warn!(value = %raw, "ignoring empty --languages");
            } else {
                base.default_languages = languages;
            }
        }
        base
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings = args.settings(Settings::from_env());
    let video_id = extract_video_id(&args.video)?;
    let request = RetrievalRequest::from_settings(&video_id, args.lang.as_deref(), &settings);

    let retriever = SubtitleRetriever::new(YtDlp::new(&settings.downloader_binary))
        .with_cookie_source(settings.cookie_source.clone());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!(
        "Fetching subtitles for {video_id} ({})",
        request.language_candidates.join(", ")
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = retriever.retrieve(&request).await;
    spinner.finish_and_clear();
    let captions = outcome.with_context(|| format!("Could not fetch subtitles for {video_id}"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&captions)?);
    } else if args.timestamps {
        print!("{}", captions.to_timestamped_text());
    } else {
        println!("{}", captions.to_plain_text());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_settings(pairs: &[(&str, &str)]) -> Settings {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn environment_values_survive_when_no_flags_are_given() {
        let args = Args::try_parse_from(["yt-subtitles", "dQw4w9WgXcQ"]).unwrap();
        let settings = args.settings(env_settings(&[
            (config::ENV_USE_COOKIES, "1"),
            (config::ENV_TIMEOUT_MS, "0"),
            (config::ENV_LANGUAGES, "de,fr"),
            (config::ENV_DOWNLOADER, "/opt/yt-dlp"),
        ]));

        assert!(settings.use_cookies);
        assert_eq!(settings.timeout_ms, config::DEFAULT_TIMEOUT_MS);
        assert_eq!(settings.default_languages, vec!["de", "fr"]);
        assert_eq!(settings.downloader_binary, "/opt/yt-dlp");
    }

    #[test]
    fn flags_override_the_environment() {
        let args = Args::try_parse_from([
            "yt-subtitles",
            "dQw4w9WgXcQ",
            "--no-cookies",
            "--timeout-ms",
            "5000",
            "--languages",
            "es",
            "--downloader",
            "yt-dlp-nightly",
            "--cookie-source",
            "/tmp/jar.txt",
        ])
        .unwrap();
        let settings = args.settings(env_settings(&[
            (config::ENV_USE_COOKIES, "yes"),
            (config::ENV_TIMEOUT_MS, "45000"),
            (config::ENV_LANGUAGES, "de"),
        ]));

        assert!(!settings.use_cookies);
        assert_eq!(settings.timeout_ms, 5_000);
        assert_eq!(settings.default_languages, vec!["es"]);
        assert_eq!(settings.downloader_binary, "yt-dlp-nightly");
        assert_eq!(
            settings.cookie_source,
            Some(CookieSource::File("/tmp/jar.txt".into()))
        );

        let args = Args::try_parse_from(["yt-subtitles", "dQw4w9WgXcQ", "--cookies"]).unwrap();
        assert!(args.settings(Settings::default()).use_cookies);
    }

    #[test]
    fn zero_timeout_flag_is_rejected() {
        assert!(Args::try_parse_from(["yt-subtitles", "x", "--timeout-ms", "0"]).is_err());
        assert!(
            Args::try_parse_from(["yt-subtitles", "x", "--cookies", "--no-cookies"]).is_err()
        );
    }
}
