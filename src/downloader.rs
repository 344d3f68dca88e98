use crate::error::SubtitleError;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default downloader executable.
pub const YT_DLP: &str = "yt-dlp";

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Captured output of one downloader run.
#[derive(Debug, Clone, Default)]
pub struct ExitResult {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ExitResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Parameters for a single-language subtitle download.
#[derive(Debug, Clone)]
pub struct DownloadRequest<'a> {
    pub video_id: &'a str,
    pub language: &'a str,
    pub output_dir: &'a Path,
    pub timeout: Duration,
    pub cookies: Option<&'a Path>,
}

impl DownloadRequest<'_> {
    /// File stem every subtitle file for this request starts with.
    pub fn output_stem(&self) -> String {
        format!("{}-{}", self.video_id, self.language)
    }
}

/// Something that can fetch subtitle files into a directory.
///
/// Process-level failures come back as `io::Error`: `NotFound` when the
/// executable is missing and `TimedOut` when the timeout elapsed.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Name used in log and error messages.
    fn name(&self) -> &str;

    async fn probe_available(&self) -> bool;

    async fn download(&self, request: &DownloadRequest<'_>) -> io::Result<ExitResult>;
}

/// Runs `yt-dlp` as a subprocess.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new(YT_DLP)
    }
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn download_args(request: &DownloadRequest<'_>) -> Vec<String> {
        let template = request
            .output_dir
            .join(format!("{}.%(ext)s", request.output_stem()));

        let mut args = vec![
            "--skip-download".to_string(),
            "--write-subs".to_string(),
            "--write-auto-subs".to_string(),
            "--sub-langs".to_string(),
            request.language.to_string(),
            "--sub-format".to_string(),
            "vtt/srt/best".to_string(),
            "--no-playlist".to_string(),
            "--output".to_string(),
            template.to_string_lossy().into_owned(),
        ];
        if let Some(cookies) = request.cookies {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }
        args.push("--".to_string());
        args.push(format!("{WATCH_URL}{}", request.video_id));
        args
    }

    async fn run(&self, args: &[String], timeout: Duration) -> io::Result<ExitResult> {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Dropping the future on timeout kills the child.
        let output = tokio::time::timeout(timeout, command.output()).await.map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("{} did not finish within {} ms", self.name(), timeout.as_millis()),
            )
        })??;

        Ok(ExitResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

#[async_trait]
impl Downloader for YtDlp {
    fn name(&self) -> &str {
        self.binary.to_str().unwrap_or(YT_DLP)
    }

    async fn probe_available(&self) -> bool {
        match self.run(&["--version".to_string()], PROBE_TIMEOUT).await {
            Ok(result) if result.success() => {
                tracing::debug!(version = result.stdout.trim(), "{} is available", self.name());
                true
            }
            Ok(result) => {
                tracing::warn!(exit_code = ?result.exit_code, "{} --version failed", self.name());
                false
            }
            Err(err) => {
                tracing::warn!(%err, "{} could not be started", self.name());
                false
            }
        }
    }

    async fn download(&self, request: &DownloadRequest<'_>) -> io::Result<ExitResult> {
        let args = Self::download_args(request);
        tracing::debug!(?args, "running {}", self.name());
        self.run(&args, request.timeout).await
    }
}

const MISSING_BINARY_SIGNALS: [&str; 3] = [
    "command not found",
    "No such file or directory",
    "is not recognized as an internal or external command",
];

/// Maps a downloader run to a per-language failure, if it failed.
///
/// Known diagnostics are reported with a readable reason even when the
/// process exited successfully.
pub fn classify_exit(video_id: &str, language: &str, result: &ExitResult) -> Option<SubtitleError> {
    let failed = |reason: String| SubtitleError::DownloadFailed {
        video_id: video_id.to_string(),
        language: language.to_string(),
        reason,
    };
    let stderr = result.stderr.as_str();

    if stderr.contains("Private video") {
        return Some(failed("video is private".to_string()));
    }
    if stderr.contains("Video unavailable") {
        return Some(failed("video is unavailable".to_string()));
    }
    if result.exit_code == Some(127)
        || MISSING_BINARY_SIGNALS.iter().any(|signal| stderr.contains(signal))
    {
        return Some(failed("downloader executable not found".to_string()));
    }
    if result.success() {
        return None;
    }

    let detail = stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no diagnostic output");
    let code = result
        .exit_code
        .map_or_else(|| "a signal".to_string(), |code| format!("code {code}"));
    Some(failed(format!("downloader exited with {code}: {detail}")))
}

/// Maps a process-level error from [`Downloader::download`] into the error taxonomy.
pub fn classify_io_error(
    video_id: &str,
    language: &str,
    timeout: Duration,
    err: &io::Error,
) -> SubtitleError {
    match err.kind() {
        io::ErrorKind::TimedOut => SubtitleError::Timeout {
            video_id: video_id.to_string(),
            language: language.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        },
        io::ErrorKind::NotFound => SubtitleError::DownloadFailed {
            video_id: video_id.to_string(),
            language: language.to_string(),
            reason: "downloader executable not found".to_string(),
        },
        _ => SubtitleError::DownloadFailed {
            video_id: video_id.to_string(),
            language: language.to_string(),
            reason: format!("failed to run downloader: {err}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit(code: i32, stderr: &str) -> ExitResult {
        ExitResult {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: Some(code),
        }
    }

    fn reason(err: Option<SubtitleError>) -> String {
        match err {
            Some(SubtitleError::DownloadFailed { reason, .. }) => reason,
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn successful_run_is_not_an_error() {
        assert!(classify_exit("abc", "en", &exit(0, "")).is_none());
        assert!(classify_exit("abc", "en", &exit(0, "WARNING: something harmless")).is_none());
    }

    #[test]
    fn recognizes_private_and_unavailable_videos() {
        let private = exit(1, "ERROR: [youtube] abc: Private video. Sign in if you've been granted access");
        assert_eq!(reason(classify_exit("abc", "en", &private)), "video is private");

        // yt-dlp may still exit 0 after printing this.
        let unavailable = exit(0, "ERROR: [youtube] abc: Video unavailable");
        assert_eq!(reason(classify_exit("abc", "en", &unavailable)), "video is unavailable");
    }

    #[test]
    fn recognizes_missing_binary() {
        let missing = exit(127, "sh: yt-dlp: command not found");
        assert_eq!(
            reason(classify_exit("abc", "en", &missing)),
            "downloader executable not found"
        );
    }

    #[test]
    fn generic_failure_keeps_last_diagnostic_line() {
        let failed = exit(2, "first line\nERROR: unable to download\n\n");
        assert_eq!(
            reason(classify_exit("abc", "hi", &failed)),
            "downloader exited with code 2: ERROR: unable to download"
        );

        let killed = ExitResult {
            exit_code: None,
            ..ExitResult::default()
        };
        assert_eq!(
            reason(classify_exit("abc", "hi", &killed)),
            "downloader exited with a signal: no diagnostic output"
        );
    }

    #[test]
    fn io_errors_map_to_timeout_or_download_failure() {
        let timeout = Duration::from_millis(1500);
        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert!(matches!(
            classify_io_error("abc", "en", timeout, &timed_out),
            SubtitleError::Timeout { timeout_ms: 1500, .. }
        ));

        let missing = io::Error::new(io::ErrorKind::NotFound, "nope");
        assert!(matches!(
            classify_io_error("abc", "en", timeout, &missing),
            SubtitleError::DownloadFailed { .. }
        ));
    }

    #[test]
    fn download_args_select_language_template_and_cookies() {
        let dir = Path::new("/tmp/area");
        let cookies = dir.join("cookies.txt");
        let request = DownloadRequest {
            video_id: "dQw4w9WgXcQ",
            language: "en",
            output_dir: dir,
            timeout: Duration::from_secs(30),
            cookies: Some(&cookies),
        };

        let args = YtDlp::download_args(&request);
        assert!(args.contains(&"--skip-download".to_string()));
        assert!(args.windows(2).any(|w| w == ["--sub-langs", "en"]));
        assert!(args.contains(&"/tmp/area/dQw4w9WgXcQ-en.%(ext)s".to_string()));
        assert!(args.windows(2).any(|w| w == ["--cookies", "/tmp/area/cookies.txt"]));
        assert_eq!(
            args.last().map(String::as_str),
            Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
        );
    }

    #[tokio::test]
    async fn missing_binary_is_not_available() {
        let downloader = YtDlp::new("/nonexistent/yt-dlp-for-tests");
        assert!(!downloader.probe_available().await);
    }
}
