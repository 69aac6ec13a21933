use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use tracing::{debug, error, warn};

use super::payload;
use super::{MatchResult, MediaKind, MetadataSource, RetryPolicy};
use crate::error::LookupError;

pub const DEFAULT_BASE_URL: &str = "https://api.imdbapi.dev";
const USER_AGENT: &str = concat!("deebee/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Blocking imdbapi.dev client with retry on transient failures.
#[derive(Debug)]
pub struct ImdbClient {
    http: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl ImdbClient {
    pub fn new(settings: ClientSettings) -> Result<Self, LookupError> {
        let api_key = settings
            .api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(LookupError::MissingApiKey)?;

        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| LookupError::Client(err.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            retry: settings.retry,
        })
    }

    /// Title search. Returns every error, transient ones included, once the
    /// retry budget is spent.
    pub fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<MatchResult>, LookupError> {
        let query = query.trim();
        if query.is_empty() {
            debug!("ignoring blank search query");
            return Ok(Vec::new());
        }

        let limit = limit.clamp(1, MAX_LIMIT);
        let url = format!("{}/search/titles", self.base_url);
        let body = self.get(&url, &[("query", query.to_string()), ("limit", limit.to_string())])?;

        let mut results = payload::decode_titles(&body);
        results.truncate(limit);
        debug!(query, limit, count = results.len(), "title search finished");
        Ok(results)
    }

    /// Find `season`/`episode` of the series matching `query`.
    ///
    /// Each candidate series costs one extra request, so the walk stops as
    /// soon as `limit` episodes have been collected. When the exact episode
    /// number is missing from a season listing the first listed episode is
    /// used instead.
    pub fn search_episode(
        &self,
        query: &str,
        season: u32,
        episode: u32,
        limit: usize,
    ) -> Result<Vec<MatchResult>, LookupError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        let series = self.search_titles(query, limit)?;
        let mut results = Vec::new();

        for show in series
            .into_iter()
            .filter(|s| matches!(s.kind, MediaKind::Series | MediaKind::Unknown))
        {
            if results.len() >= limit {
                break;
            }
            if show.id.is_empty() {
                continue;
            }

            let url = format!("{}/titles/{}/episodes", self.base_url, show.id);
            let body = match self.get(&url, &[("season", season.to_string())]) {
                Ok(body) => body,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(series = %show.id, error = %err, "episode listing failed");
                    continue;
                }
            };

            let episodes: Vec<_> = payload::decode_episodes(&body)
                .into_iter()
                .filter(|e| e.season.is_none_or(|s| s == season))
                .collect();
            let picked = episodes
                .iter()
                .find(|e| e.episode_number == Some(episode))
                .or_else(|| episodes.first());

            if let Some(found) = picked {
                debug!(
                    series = %show.id,
                    season,
                    wanted = episode,
                    found = ?found.episode_number,
                    "picked episode"
                );
                results.push(MatchResult {
                    id: found.id.clone().unwrap_or_else(|| show.id.clone()),
                    title: show.title.clone(),
                    year: show.year,
                    kind: MediaKind::Episode,
                    relevance: show.relevance,
                    episode_title: found.title.clone(),
                });
            }
        }

        Ok(results)
    }

    fn get(&self, url: &str, params: &[(&str, String)]) -> Result<String, LookupError> {
        let attempts = self.retry.attempts();
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let outcome = self
                .http
                .get(url)
                .query(params)
                .bearer_auth(&self.api_key)
                .send();

            let requested_wait = match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        error!(%status, "metadata API rejected the API key");
                        return Err(LookupError::Auth {
                            status: status.as_u16(),
                        });
                    }
                    if status.is_success() {
                        match response.text() {
                            Ok(body) => return Ok(body),
                            Err(err) => {
                                last_error = err.to_string();
                                None
                            }
                        }
                    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        last_error = format!("HTTP {status}");
                        retry_after(&response)
                    } else {
                        return Err(LookupError::Status {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                }
                Err(err) if is_transient(&err) => {
                    last_error = err.to_string();
                    None
                }
                Err(err) => {
                    return Err(LookupError::Network {
                        attempts: attempt,
                        message: err.to_string(),
                    });
                }
            };

            if attempt < attempts {
                let delay = self.retry.wait_before_retry(attempt, requested_wait);
                warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "metadata request failed, retrying"
                );
                std::thread::sleep(delay);
            }
        }

        Err(LookupError::Network {
            attempts,
            message: last_error,
        })
    }
}

impl MetadataSource for ImdbClient {
    fn lookup(&self, query: &str, limit: usize) -> Result<Vec<MatchResult>, LookupError> {
        match self.search_titles(query, limit) {
            Ok(results) => Ok(results),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(query, error = %err, "lookup failed, treating as no matches");
                Ok(Vec::new())
            }
        }
    }

    fn lookup_episode(
        &self,
        query: &str,
        season: u32,
        episode: u32,
        limit: usize,
    ) -> Result<Vec<MatchResult>, LookupError> {
        match self.search_episode(query, season, episode, limit) {
            Ok(results) if !results.is_empty() => Ok(results),
            Ok(_) => {
                debug!(query, season, episode, "no episode data, falling back to title search");
                self.lookup(query, limit)
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(query, error = %err, "episode lookup failed, treating as no matches");
                Ok(Vec::new())
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_blank_key_is_rejected() {
        let err = ImdbClient::new(ClientSettings::default()).unwrap_err();
        assert!(matches!(err, LookupError::MissingApiKey));

        let settings = ClientSettings {
            api_key: Some("   ".into()),
            ..ClientSettings::default()
        };
        assert!(matches!(
            ImdbClient::new(settings).unwrap_err(),
            LookupError::MissingApiKey
        ));
    }

    #[test]
    fn blank_query_skips_the_network() {
        let settings = ClientSettings {
            base_url: "http://127.0.0.1:9".into(),
            api_key: Some("key".into()),
            ..ClientSettings::default()
        };
        let client = ImdbClient::new(settings).unwrap();
        assert!(client.search_titles("   ", 5).unwrap().is_empty());
    }
}
