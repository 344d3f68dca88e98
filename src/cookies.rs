use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound on fetching or copying the cookie file.
pub const COOKIE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the cookie file inside the working area.
pub const COOKIE_FILE_NAME: &str = "cookies.txt";

/// Where a Netscape-format cookie file comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieSource {
    File(PathBuf),
    Url(url::Url),
}

impl std::fmt::Display for CookieSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CookieSource::File(path) => write!(f, "{}", path.display()),
            CookieSource::Url(url) => write!(f, "{url}"),
        }
    }
}

impl std::str::FromStr for CookieSource {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Cookie source cannot be empty".to_string());
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return url::Url::parse(trimmed)
                .map(CookieSource::Url)
                .map_err(|err| format!("Invalid cookie source URL '{trimmed}': {err}"));
        }
        Ok(CookieSource::File(PathBuf::from(trimmed)))
    }
}

/// Writes the cookie file from `source` into `dir` and returns its path.
pub async fn provision(source: &CookieSource, dir: &Path) -> Result<PathBuf> {
    let contents = tokio::time::timeout(COOKIE_FETCH_TIMEOUT, read_source(source))
        .await
        .map_err(|_| {
            anyhow!(
                "Timed out after {} ms reading cookies from {source}",
                COOKIE_FETCH_TIMEOUT.as_millis()
            )
        })??;

    if contents.trim().is_empty() {
        bail!("Cookie source {source} is empty");
    }

    let target = dir.join(COOKIE_FILE_NAME);
    tokio::fs::write(&target, contents)
        .await
        .with_context(|| format!("Failed to write cookie file {}", target.display()))?;
    Ok(target)
}

async fn read_source(source: &CookieSource) -> Result<String> {
    match source {
        CookieSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read cookie file {}", path.display())),
        CookieSource::Url(url) => {
            let client = reqwest::Client::builder()
                .timeout(COOKIE_FETCH_TIMEOUT)
                .build()
                .context("Failed to build HTTP client")?;
            let response = client
                .get(url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to fetch cookies from {url}"))?
                .error_for_status()
                .with_context(|| format!("Cookie source {url} returned an error status"))?;
            response
                .text()
                .await
                .with_context(|| format!("Failed to read cookie response from {url}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_files_and_urls() {
        assert_eq!(
            "/etc/yt/cookies.txt".parse::<CookieSource>(),
            Ok(CookieSource::File(PathBuf::from("/etc/yt/cookies.txt")))
        );
        assert!(matches!(
            "https://secrets.example.com/cookies.txt".parse::<CookieSource>(),
            Ok(CookieSource::Url(_))
        ));
        assert!("  ".parse::<CookieSource>().is_err());
        assert!("https://".parse::<CookieSource>().is_err());
    }

    #[tokio::test]
    async fn copies_a_local_cookie_file() {
        let source_dir = tempfile::tempdir().unwrap();
        let source_path = source_dir.path().join("jar.txt");
        std::fs::write(&source_path, "# Netscape HTTP Cookie File\n").unwrap();

        let area = tempfile::tempdir().unwrap();
        let written = provision(&CookieSource::File(source_path), area.path())
            .await
            .unwrap();

        assert_eq!(written, area.path().join(COOKIE_FILE_NAME));
        assert_eq!(
            std::fs::read_to_string(written).unwrap(),
            "# Netscape HTTP Cookie File\n"
        );
    }

    #[tokio::test]
    async fn empty_or_missing_sources_fail() {
        let area = tempfile::tempdir().unwrap();
        let empty = area.path().join("empty.txt");
        std::fs::write(&empty, "  \n").unwrap();

        assert!(provision(&CookieSource::File(empty), area.path()).await.is_err());
        assert!(
            provision(&CookieSource::File(area.path().join("missing.txt")), area.path())
                .await
                .is_err()
        );
        assert!(!area.path().join(COOKIE_FILE_NAME).exists());
    }
}
