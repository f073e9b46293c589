use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// Name given to URL imports whose path has no final segment.
pub const PLACEHOLDER_FILE_NAME: &str = "media_file";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Audio,
    Video,
    Image,
    #[serde(other)]
    Unknown,
}

impl FileType {
    /// Media kind from a `content-type` value; `unknown` when it names none of ours.
    pub fn from_content_type(content_type: &str) -> FileType {
        let lowered = content_type.to_ascii_lowercase();
        if lowered.contains("audio") {
            FileType::Audio
        } else if lowered.contains("video") {
            FileType::Video
        } else if lowered.contains("image") {
            FileType::Image
        } else {
            FileType::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Audio => "audio",
            FileType::Video => "video",
            FileType::Image => "image",
            FileType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSource {
    #[default]
    Local,
    Url,
}

/// Kind the user declares for a URL import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeclaredKind {
    #[default]
    Auto,
    Audio,
    Video,
    Image,
}

impl FromStr for DeclaredKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(DeclaredKind::Auto),
            "audio" => Ok(DeclaredKind::Audio),
            "video" => Ok(DeclaredKind::Video),
            "image" => Ok(DeclaredKind::Image),
            other => Err(format!("unknown media kind `{other}`")),
        }
    }
}

/// Headers read from the `HEAD` probe of a URL import.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProbeInfo {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// An entry of the canonical file list. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub original_name: String,
    pub saved_name: String,
    pub file_type: FileType,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub source: FileSource,
    /// The server fetches this itself during processing.
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    pub origin_url: Option<String>,
}

impl UploadedFile {
    /// Synthesizes the entry for a URL whose probe succeeded. No bytes are transferred.
    pub fn from_url_probe(url: &str, declared: DeclaredKind, probe: &ProbeInfo) -> UploadedFile {
        let file_type = match declared {
            DeclaredKind::Audio => FileType::Audio,
            DeclaredKind::Video => FileType::Video,
            DeclaredKind::Image => FileType::Image,
            DeclaredKind::Auto => probe
                .content_type
                .as_deref()
                .map(FileType::from_content_type)
                .unwrap_or(FileType::Unknown),
        };
        let name = display_name_from_url(url);
        UploadedFile {
            original_name: name.clone(),
            saved_name: name,
            file_type,
            size: probe.content_length.unwrap_or(0),
            source: FileSource::Url,
            origin_url: Some(url.to_string()),
        }
    }
}

/// Final path segment of the URL, or [`PLACEHOLDER_FILE_NAME`] when there is none.
pub fn display_name_from_url(raw: &str) -> String {
    let from_parsed = Url::parse(raw).ok().and_then(|url| {
        url.path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
    });
    let segment = match from_parsed {
        Some(segment) => segment,
        None => raw
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string(),
    };
    if segment.is_empty() {
        PLACEHOLDER_FILE_NAME.to_string()
    } else {
        segment
    }
}

/// Human readable size, e.g. `1.91 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
