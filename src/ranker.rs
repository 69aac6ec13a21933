//! Ordering of API matches and the numbered choice list shown to the user.

use std::cmp::Ordering;

use crate::metadata::MatchResult;
use crate::title_extractor::ScanCandidate;

/// Order `results` for `candidate` and yield at most `limit` of them.
///
/// Exact (case and punctuation insensitive) title matches come first, then
/// matches whose year is closest to the one in the filename, then the API's
/// own relevance, then the order the API returned them in.
pub fn rank(
    candidate: &ScanCandidate,
    results: Vec<MatchResult>,
    limit: usize,
) -> impl Iterator<Item = MatchResult> + use<> {
    let wanted = normalize_title(&candidate.title);
    let mut keyed: Vec<(RankKey, MatchResult)> = results
        .into_iter()
        .enumerate()
        .map(|(position, result)| {
            let key = RankKey {
                exact_title: normalize_title(&result.title) == wanted,
                year_distance: year_distance(candidate.year, result.year),
                relevance: result.relevance,
                position,
            };
            (key, result)
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
    keyed.into_iter().map(|(_, result)| result).take(limit)
}

#[derive(Debug, Clone, Copy)]
struct RankKey {
    exact_title: bool,
    year_distance: u32,
    relevance: f64,
    position: usize,
}

impl RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .exact_title
            .cmp(&self.exact_title)
            .then(self.year_distance.cmp(&other.year_distance))
            .then(
                other
                    .relevance
                    .partial_cmp(&self.relevance)
                    .unwrap_or(Ordering::Equal),
            )
            .then(self.position.cmp(&other.position))
    }
}

/// Without a year in the filename every match is equally close; a match
/// without a year sorts after every dated one.
fn year_distance(wanted: Option<u16>, found: Option<u16>) -> u32 {
    match (wanted, found) {
        (None, _) => 0,
        (Some(_), None) => u32::MAX,
        (Some(a), Some(b)) => u32::from(a.abs_diff(b)),
    }
}

pub fn normalize_title(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// What a numbered answer stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Choice<'a> {
    Skip,
    Match(&'a MatchResult),
}

/// Ranked matches as presented: `1..=len` pick a match, 0 always means skip.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceList {
    matches: Vec<MatchResult>,
}

impl ChoiceList {
    pub const SKIP: usize = 0;

    pub fn new(ranked: impl IntoIterator<Item = MatchResult>) -> Self {
        Self {
            matches: ranked.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn matches(&self) -> &[MatchResult] {
        &self.matches
    }

    /// `None` for an index that is neither the sentinel nor a listed match.
    pub fn resolve(&self, index: usize) -> Option<Choice<'_>> {
        if index == Self::SKIP {
            return Some(Choice::Skip);
        }
        self.matches.get(index - 1).map(Choice::Match)
    }

    /// Every selectable row, numbered matches first and the sentinel last.
    pub fn rows(&self) -> impl Iterator<Item = (usize, Choice<'_>)> {
        self.matches
            .iter()
            .enumerate()
            .map(|(i, result)| (i + 1, Choice::Match(result)))
            .chain(std::iter::once((Self::SKIP, Choice::Skip)))
    }
}
