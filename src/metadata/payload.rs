//! Lenient decoding of imdbapi.dev responses.
//!
//! Every field is treated as optional and loosely typed. The body is read
//! into a `serde_json::Value` once and each item becomes a `RawTitle` whose
//! fields are all `Option`s, so nothing downstream has to cope with missing
//! or oddly typed data.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{MatchResult, MediaKind};

const LIST_KEYS: &[&str] = &["titles", "results", "data"];
const TITLE_KEYS: &[&str] = &["primaryTitle", "title", "originalTitle", "name"];
const YEAR_KEYS: &[&str] = &["startYear", "year", "releaseDate"];
const KIND_KEYS: &[&str] = &["type", "kind", "titleType"];
const SCORE_KEYS: &[&str] = &["score", "relevance"];

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct RawTitle {
    pub id: Option<String>,
    pub title: Option<String>,
    pub year: Option<u16>,
    pub kind: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct RawEpisode {
    pub id: Option<String>,
    pub title: Option<String>,
    pub season: Option<u32>,
    pub episode_number: Option<u32>,
}

impl RawTitle {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let raw = RawTitle {
            id: field(object, &["id"]).and_then(as_text),
            title: field(object, TITLE_KEYS).and_then(as_text),
            year: field(object, YEAR_KEYS).and_then(as_year),
            kind: field(object, KIND_KEYS).and_then(as_text),
            score: field(object, SCORE_KEYS).and_then(Value::as_f64),
        };
        if raw.id.is_none() && raw.title.is_none() {
            return None;
        }
        Some(raw)
    }

    /// `position` and `count` give a relevance when the API sent none.
    pub fn into_match(self, position: usize, count: usize) -> MatchResult {
        let fallback = if count == 0 {
            0.0
        } else {
            1.0 - position as f64 / count as f64
        };
        MatchResult {
            id: self.id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            year: self.year,
            kind: self
                .kind
                .as_deref()
                .map(MediaKind::from_api)
                .unwrap_or(MediaKind::Unknown),
            relevance: self.score.filter(|s| s.is_finite()).unwrap_or(fallback),
            episode_title: None,
        }
    }
}

impl RawEpisode {
    fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(RawEpisode {
            id: field(object, &["id"]).and_then(as_text),
            title: field(object, &["title", "primaryTitle", "name"]).and_then(as_text),
            season: field(object, &["season", "seasonNumber"]).and_then(as_number),
            episode_number: field(object, &["episodeNumber", "episode"]).and_then(as_number),
        })
    }
}

/// Decode a title search body. Garbage in gives an empty list out.
pub(crate) fn decode_titles(body: &str) -> Vec<MatchResult> {
    let raws: Vec<RawTitle> = decode_list(body, LIST_KEYS)
        .iter()
        .filter_map(RawTitle::from_value)
        .collect();
    let count = raws.len();
    debug!(count, "decoded title payload");
    raws.into_iter()
        .enumerate()
        .map(|(position, raw)| raw.into_match(position, count))
        .collect()
}

pub(crate) fn decode_episodes(body: &str) -> Vec<RawEpisode> {
    decode_list(body, &["episodes", "results", "data"])
        .iter()
        .filter_map(RawEpisode::from_value)
        .collect()
}

fn decode_list(body: &str, keys: &[&str]) -> Vec<Value> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            warn!(error = %err, "metadata response was not valid JSON");
            return Vec::new();
        }
    };

    match value {
        Value::Array(items) => items,
        Value::Object(mut object) => keys
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_else(|| {
                warn!("metadata response had no result list");
                Vec::new()
            }),
        _ => {
            warn!("metadata response had an unexpected shape");
            Vec::new()
        }
    }
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
}

fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn as_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts `2010`, `"2010"` and `"2010-07-16"`.
fn as_year(value: &Value) -> Option<u16> {
    let year = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().get(..4).and_then(|head| head.parse().ok()),
        Value::Object(object) => object.get("year").and_then(as_year),
        _ => None,
    }?;
    (1870..=2200).contains(&year).then_some(year)
}
