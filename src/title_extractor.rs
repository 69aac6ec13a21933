//! Turns a raw media filename into a search candidate.
//!
//! Release names pack a lot of noise around the actual title:
//! `The.Matrix.1999.1080p.BluRay.x264-GROUP.mkv`. The extractor strips
//! bracketed groups and release tags, picks out the year and any
//! season/episode marker, and keeps whatever is left as the title guess.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

/// Tokens that end the title wherever they appear.
const RELEASE_TAGS: &[&str] = &[
    // sources
    "bluray", "bdrip", "brrip", "bdremux", "remux", "webdl", "webrip", "hdtv", "hdrip",
    "dvdrip", "dvdscr", "camrip", "screener", "hdcam",
    // video
    "4k", "uhd", "hdr", "hdr10", "x264", "x265", "h264", "h265", "hevc", "avc", "xvid",
    "divx", "av1", "vp9", "10bit",
    // audio
    "aac", "ac3", "dts", "dtshd", "ddp", "dd", "eac3", "flac", "mp3", "atmos", "truehd",
    // release flags
    "repack", "unrated", "remastered",
];

// Release words that are also ordinary title words ("Charlotte's Web",
// "Limited Partnership") are not listed: they only show up after the year,
// which already ends the title.

/// Season and episode numbers parsed from a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeMarker {
    pub season: u32,
    pub episode: u32,
}

/// A scanned file and what its name suggests about the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCandidate {
    pub path: PathBuf,
    pub title: String,
    pub year: Option<u16>,
    pub episode: Option<EpisodeMarker>,
    /// Extension including the leading dot, or empty.
    pub extension: String,
}

impl ScanCandidate {
    pub fn search_query(&self) -> &str {
        &self.title
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub struct TitleExtractor {
    episode_patterns: Vec<Regex>,
    year_pattern: Regex,
    bracket_pattern: Regex,
    resolution_pattern: Regex,
}

impl TitleExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        let episode_patterns = vec![
            Regex::new(r"(?i)\bS(?P<season>\d{1,3})[ ._-]*E(?P<episode>\d{1,3})\b")?,
            Regex::new(r"(?i)\b(?P<season>\d{1,2})x(?P<episode>\d{1,3})\b")?,
            Regex::new(
                r"(?i)\bseason[ ._-]*(?P<season>\d{1,3})[ ._-]*(?:episode|ep)[ ._-]*(?P<episode>\d{1,3})\b",
            )?,
        ];

        Ok(Self {
            episode_patterns,
            year_pattern: Regex::new(r"^(19|20)\d{2}$")?,
            bracket_pattern: Regex::new(r"\[[^\]]*\]|\([^)]*\)|\{[^}]*\}")?,
            resolution_pattern: Regex::new(r"^\d{3,4}[pi]$")?,
        })
    }

    /// Build a candidate for `path`. Never fails; the raw stem is the fallback title.
    pub fn extract(&self, path: &Path) -> ScanCandidate {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let (title, year, episode) = self.parse_stem(&stem);
        debug!(
            file = %path.display(),
            title = %title,
            year = ?year,
            episode = ?episode,
            "extracted search candidate"
        );

        ScanCandidate {
            path: path.to_path_buf(),
            title,
            year,
            episode,
            extension,
        }
    }

    fn parse_stem(&self, stem: &str) -> (String, Option<u16>, Option<EpisodeMarker>) {
        let cleaned = self.replace_brackets(stem);
        let spaced: String = cleaned
            .chars()
            .map(|ch| if ch == '.' || ch == '_' { ' ' } else { ch })
            .collect();

        let mut region = spaced.as_str();
        let mut episode = None;
        for pattern in &self.episode_patterns {
            if let Some(captures) = pattern.captures(&spaced) {
                let season = captures.name("season").and_then(|m| m.as_str().parse().ok());
                let number = captures.name("episode").and_then(|m| m.as_str().parse().ok());
                if let (Some(season), Some(episode_number)) = (season, number) {
                    episode = Some(EpisodeMarker {
                        season,
                        episode: episode_number,
                    });
                }
                if let Some(whole) = captures.get(0) {
                    region = &spaced[..whole.start()];
                }
                break;
            }
        }

        let tokens: Vec<&str> = region
            .split_whitespace()
            .map(|t| t.trim_matches(|c: char| c == '-' || c == ','))
            .filter(|t| !t.is_empty())
            .collect();

        let cut = tokens
            .iter()
            .position(|token| self.is_release_tag(token))
            .unwrap_or(tokens.len());

        // First token is never the year: "2012.mkv" is a title.
        let year_index = (1..cut).rev().find(|&i| self.year_pattern.is_match(tokens[i]));
        let year = year_index.and_then(|i| tokens[i].parse::<u16>().ok());

        let title_end = year_index.unwrap_or(cut);
        let title = tokens[..title_end].join(" ");

        if title.is_empty() {
            return (stem.trim().to_string(), year, episode);
        }

        (title, year, episode)
    }

    /// Drop bracketed release info but keep a bare `(2010)` as a year token.
    fn replace_brackets(&self, stem: &str) -> String {
        self.bracket_pattern
            .replace_all(stem, |caps: &regex::Captures| {
                let group = &caps[0];
                let inner = group[1..group.len() - 1].trim();
                if self.year_pattern.is_match(inner) {
                    format!(" {} ", inner)
                } else {
                    " ".to_string()
                }
            })
            .to_string()
    }

    fn is_release_tag(&self, token: &str) -> bool {
        let lower = token.to_lowercase();
        // "x264-GROUP" counts as the tag it starts with.
        let head = lower.split('-').next().unwrap_or(&lower);
        let normalized = lower.replace('-', "");

        if self.resolution_pattern.is_match(head) {
            return true;
        }
        // ddp5 1 / dd5.1 style audio channel suffixes
        let alpha: String = head.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        if !alpha.is_empty()
            && alpha.len() < head.len()
            && matches!(alpha.as_str(), "ddp" | "dd" | "aac" | "dts" | "ac")
        {
            return true;
        }

        RELEASE_TAGS.contains(&head) || RELEASE_TAGS.contains(&normalized.as_str())
    }
}
