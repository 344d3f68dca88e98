//! Fetch YouTube captions through `yt-dlp` and turn WebVTT/SubRip files into
//! clean, time-ordered caption entries.

pub mod caption;
pub mod config;
pub mod cookies;
pub mod downloader;
pub mod error;
pub mod normalize;
pub mod parser;
pub mod retrieval;
pub mod sanitize;
pub mod timecode;
pub mod video;
pub mod workspace;

pub use caption::{CaptionEntry, CaptionSet};
pub use config::Settings;
pub use downloader::{DownloadRequest, Downloader, ExitResult, YtDlp};
pub use error::{Result, SubtitleError};
pub use normalize::{normalize, NormalizeOptions};
pub use parser::{parse_srt, parse_vtt, SubtitleFormat};
pub use retrieval::{RetrievalRequest, SubtitleRetriever};
pub use sanitize::sanitize;
pub use timecode::{format_seconds, parse_timestamp};
pub use video::extract_video_id;
