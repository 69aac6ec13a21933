//! Metadata lookups against imdbapi.dev.

mod client;
mod payload;
mod retry;

pub use client::{ClientSettings, DEFAULT_BASE_URL, ImdbClient};
pub use retry::RetryPolicy;

use std::fmt;

use crate::error::LookupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Series,
    Episode,
    Unknown,
}

impl MediaKind {
    /// Map the API's free-form `type` string onto a kind.
    pub fn from_api(value: &str) -> Self {
        let normalized = value.to_ascii_lowercase().replace(['_', '-', ' '], "");
        match normalized.as_str() {
            "movie" | "tvmovie" | "short" | "video" => MediaKind::Movie,
            "tvseries" | "tvminiseries" | "series" | "tvshow" => MediaKind::Series,
            "tvepisode" | "episode" => MediaKind::Episode,
            _ => MediaKind::Unknown,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "series",
            MediaKind::Episode => "episode",
            MediaKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// One title returned by the metadata API.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub id: String,
    pub title: String,
    pub year: Option<u16>,
    pub kind: MediaKind,
    /// Higher is better. Taken from the API when it sends one, otherwise
    /// derived from the position in the response.
    pub relevance: f64,
    pub episode_title: Option<String>,
}

impl MatchResult {
    pub fn display_text(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// Anything that can answer title searches.
pub trait MetadataSource {
    /// Search for titles matching `query`. Transient trouble degrades to an
    /// empty list; only fatal errors (bad credentials) are returned.
    fn lookup(&self, query: &str, limit: usize) -> Result<Vec<MatchResult>, LookupError>;

    /// Search for one episode of a series. Sources without episode data
    /// answer with plain title matches.
    fn lookup_episode(
        &self,
        query: &str,
        _season: u32,
        _episode: u32,
        limit: usize,
    ) -> Result<Vec<MatchResult>, LookupError> {
        self.lookup(query, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_api_strings() {
        assert_eq!(MediaKind::from_api("movie"), MediaKind::Movie);
        assert_eq!(MediaKind::from_api("tvSeries"), MediaKind::Series);
        assert_eq!(MediaKind::from_api("TV_EPISODE"), MediaKind::Episode);
        assert_eq!(MediaKind::from_api("videoGame"), MediaKind::Unknown);
    }

    #[test]
    fn display_text_with_and_without_year() {
        let mut result = MatchResult {
            id: "tt1375666".into(),
            title: "Inception".into(),
            year: Some(2010),
            kind: MediaKind::Movie,
            relevance: 1.0,
            episode_title: None,
        };
        assert_eq!(result.display_text(), "Inception (2010)");
        result.year = None;
        assert_eq!(result.display_text(), "Inception");
    }
}
