use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Url;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::VideoJob;

pub const YOUTUBE_ID_LEN: usize = 11;
pub const UPLOAD_EXTENSIONS: [&str; 3] = ["mp4", "mov", "mkv"];

/// Extracts the video id from the usual YouTube link shapes. Anything else,
/// including unparseable input, yields an empty string.
pub fn pick_youtube_id(raw: &str) -> String {
    let Ok(url) = Url::parse(raw.trim()) else {
        return String::new();
    };
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    let path = url.path().trim_start_matches('/');
    let segment = |idx: usize| path.split('/').nth(idx).unwrap_or_default().to_string();

    if host.contains("youtu.be") {
        return segment(0);
    }
    if host.contains("youtube.com") {
        if path.starts_with("watch") {
            return url
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default();
        }
        if path.starts_with("shorts/") || path.starts_with("embed/") {
            return segment(1);
        }
    }
    String::new()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoInputError {
    #[error("Enter a YouTube link or choose a file.")]
    Missing,
    #[error("Invalid YouTube link. Paste the full address.")]
    InvalidLink,
    #[error("Unsupported file type: {0} (use .mp4, .mov or .mkv)")]
    UnsupportedFile(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoRequest {
    Link(String),
    Upload { path: PathBuf, url: String },
}

pub fn validate_request(url: &str, file: Option<&Path>) -> Result<VideoRequest, VideoInputError> {
    let url = url.trim();
    match file {
        Some(path) => {
            if !is_supported_upload(path) {
                let ext = path
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_default();
                return Err(VideoInputError::UnsupportedFile(ext));
            }
            Ok(VideoRequest::Upload {
                path: path.to_path_buf(),
                url: url.to_string(),
            })
        }
        None if url.is_empty() => Err(VideoInputError::Missing),
        None => {
            if pick_youtube_id(url).chars().count() < YOUTUBE_ID_LEN {
                return Err(VideoInputError::InvalidLink);
            }
            Ok(VideoRequest::Link(url.to_string()))
        }
    }
}

pub fn is_supported_upload(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .is_some_and(|ext| UPLOAD_EXTENSIONS.contains(&ext.as_str()))
}

/// Hex SHA-256 of a file, streamed in 64 KiB chunks.
pub fn file_sha256(path: &Path) -> Result<String> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Empty,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "queued" => JobStatus::Queued,
            "run" => JobStatus::Running,
            "ok" => JobStatus::Done,
            "empty" => JobStatus::Empty,
            "fail" => JobStatus::Failed,
            other => JobStatus::Other(other.to_string()),
        }
    }

    pub fn is_working(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    pub fn label(&self) -> &str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Running => "Analysing",
            JobStatus::Done => "Done",
            JobStatus::Empty => "No result",
            JobStatus::Failed => "Failed",
            JobStatus::Other(raw) => raw,
        }
    }
}

pub fn job_status(job: &VideoJob) -> JobStatus {
    JobStatus::parse(&job.status)
}

pub fn should_poll(job: &VideoJob) -> bool {
    job_status(job).is_working()
}

/// User-facing text for known backend and network failures.
pub fn friendly_error(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    let has = |needle: &str| lower.contains(needle);
    let mapped = if has("truncated_id") || has("incomplete youtube id") {
        "The YouTube link is incomplete. Paste the full video address."
    } else if has("413") || has("body exceeded") {
        "Upload is too large. Trim the clip and try again."
    } else if has("failed to fetch") || has("networkerror") || has("error sending request") {
        "Could not reach the backend. Check that the server is running."
    } else if has("sign in to confirm") || has("not a bot") {
        "YouTube requires a bot check. Browser login cookies are needed."
    } else if has("private") || has("login") {
        "Private or login-only videos cannot be analysed."
    } else if has("cookiesfrombrowser") || has("cookies") {
        "Could not read browser cookies. Check the browser login."
    } else if has("yt_dlp missing") {
        "The backend video module is not installed. Restart the server."
    } else {
        return message.to_string();
    };
    mapped.to_string()
}

/// Failure text for a finished job, if it failed.
pub fn job_error(job: &VideoJob) -> Option<String> {
    if job_status(job) != JobStatus::Failed {
        return None;
    }
    let raw = job
        .error
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or("Analysis failed.");
    Some(friendly_error(raw))
}

pub fn fmt_time(sec: f64) -> String {
    if !sec.is_finite() {
        return "--:--".to_string();
    }
    let value = sec.floor().max(0.0) as u64;
    format!("{:02}:{:02}", value / 60, value % 60)
}

/// Embeddable player URL. The report's clip id wins when it looks complete;
/// otherwise the id is taken from the typed link. `seek` overrides the clip
/// start.
pub fn embed_url(job: Option<&VideoJob>, typed_url: &str, seek: Option<f64>) -> Option<String> {
    let clip = job.and_then(|j| j.report.as_ref()).map(|r| &r.clip);
    let id = clip
        .map(|c| c.video_id.clone())
        .filter(|id| id.chars().count() == YOUTUBE_ID_LEN)
        .unwrap_or_else(|| pick_youtube_id(typed_url));
    if id.is_empty() {
        return None;
    }
    let start = seek
        .or_else(|| clip.map(|c| c.start))
        .filter(|s| s.is_finite())
        .unwrap_or(0.0)
        .floor()
        .max(0.0) as u64;
    Some(format!(
        "https://www.youtube.com/embed/{id}?start={start}&autoplay=1&mute=1&rel=0"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{VideoClip, VideoReport};

    #[test]
    fn youtube_id_shapes() {
        assert_eq!(pick_youtube_id("https://youtu.be/dQw4w9WgXcQ?t=3"), "dQw4w9WgXcQ");
        assert_eq!(
            pick_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10"),
            "dQw4w9WgXcQ"
        );
        assert_eq!(pick_youtube_id("https://youtube.com/shorts/abcdefghijk"), "abcdefghijk");
        assert_eq!(pick_youtube_id("https://www.youtube.com/embed/abcdefghijk"), "abcdefghijk");
        assert_eq!(pick_youtube_id("https://vimeo.com/12345"), "");
        assert_eq!(pick_youtube_id("not a url"), "");
        assert_eq!(pick_youtube_id("https://www.youtube.com/watch"), "");
    }

    #[test]
    fn request_validation() {
        assert_eq!(validate_request("  ", None), Err(VideoInputError::Missing));
        assert_eq!(
            validate_request("https://youtu.be/short", None),
            Err(VideoInputError::InvalidLink)
        );
        assert_eq!(
            validate_request("https://youtu.be/dQw4w9WgXcQ", None),
            Ok(VideoRequest::Link("https://youtu.be/dQw4w9WgXcQ".to_string()))
        );
        assert!(matches!(
            validate_request("", Some(Path::new("clip.MOV"))),
            Ok(VideoRequest::Upload { .. })
        ));
        assert_eq!(
            validate_request("", Some(Path::new("clip.avi"))),
            Err(VideoInputError::UnsupportedFile("avi".to_string()))
        );
    }

    #[test]
    fn time_formatting() {
        assert_eq!(fmt_time(0.0), "00:00");
        assert_eq!(fmt_time(75.9), "01:15");
        assert_eq!(fmt_time(-3.0), "00:00");
        assert_eq!(fmt_time(f64::NAN), "--:--");
        assert_eq!(fmt_time(3_725.0), "62:05");
    }

    #[test]
    fn friendly_errors() {
        assert!(friendly_error("HTTP 413 Payload").contains("too large"));
        assert!(friendly_error("Sign in to confirm you're not a bot").contains("bot check"));
        assert_eq!(friendly_error("something odd"), "something odd");
    }

    #[test]
    fn embed_prefers_report_clip() {
        let job = VideoJob {
            status: "ok".to_string(),
            report: Some(VideoReport {
                clip: VideoClip {
                    video_id: "abcdefghijk".to_string(),
                    start: 42.7,
                    ..VideoClip::default()
                },
                ..VideoReport::default()
            }),
            ..VideoJob::default()
        };
        assert_eq!(
            embed_url(Some(&job), "https://youtu.be/zzzzzzzzzzz", None).as_deref(),
            Some("https://www.youtube.com/embed/abcdefghijk?start=42&autoplay=1&mute=1&rel=0")
        );
        assert_eq!(
            embed_url(None, "https://youtu.be/zzzzzzzzzzz", Some(5.5)).as_deref(),
            Some("https://www.youtube.com/embed/zzzzzzzzzzz?start=5&autoplay=1&mute=1&rel=0")
        );
        assert_eq!(embed_url(None, "", None), None);
    }

    #[test]
    fn failed_job_message() {
        let job = VideoJob {
            status: "fail".to_string(),
            error: Some("yt_dlp missing".to_string()),
            ..VideoJob::default()
        };
        assert!(job_error(&job).is_some_and(|m| m.contains("not installed")));
        assert!(!should_poll(&job));
        let queued = VideoJob {
            status: "queued".to_string(),
            ..VideoJob::default()
        };
        assert!(should_poll(&queued));
        assert_eq!(job_error(&queued), None);
    }
}
