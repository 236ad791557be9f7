//! Title matching against catalog search results
//!
//! Maps an external title (and optional season) to the catalog page that most
//! likely carries it. Titles are compared after normalization:
//!
//! - lowercase
//! - NFD decomposition with combining marks removed (`é` → `e`)
//! - everything outside `a-z`, `0-9` and whitespace removed
//!
//! Scores: exact = 100, containment = 80, otherwise the share of query tokens
//! found in the candidate over the longer token list, scaled to 60.

use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

pub const EXACT_SCORE: f64 = 100.0;
pub const CONTAINS_SCORE: f64 = 80.0;
pub const TOKEN_SCORE_MAX: f64 = 60.0;

static SEASON_SUFFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\s*-\s*Saison\s*\d+").ok());

static YEAR_SUFFIX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\s*-\s*\d{4}$").ok());

static SEASON_MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)Saison\s*(\d+)").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Series,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
        }
    }
}

impl std::str::FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "movie" | "film" => Ok(Self::Movie),
            "series" | "tv" => Ok(Self::Series),
            other => Err(format!("unknown content kind: {other}")),
        }
    }
}

/// One search hit on the catalog site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(alias = "type")]
    pub kind: ContentKind,
}

pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}

/// Strip the season and year suffixes from a listing title.
pub fn clean_title(title: &str) -> String {
    let mut cleaned = title.to_string();
    for re in [&*SEASON_SUFFIX, &*YEAR_SUFFIX].into_iter().flatten() {
        cleaned = re.replace(&cleaned, "").into_owned();
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn season_from_title(title: &str) -> Option<u32> {
    SEASON_MARKER
        .as_ref()?
        .captures(title)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Similarity of two titles, both normalized before comparison.
pub fn score(query: &str, candidate: &str) -> f64 {
    score_normalized(&normalize_title(query), &normalize_title(candidate))
}

fn score_normalized(query: &str, candidate: &str) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }
    if query == candidate {
        return EXACT_SCORE;
    }
    if candidate.contains(query) || query.contains(candidate) {
        return CONTAINS_SCORE;
    }

    let query_tokens: Vec<&str> = query.split_whitespace().collect();
    let candidate_tokens: Vec<&str> = candidate.split_whitespace().collect();
    let common = query_tokens
        .iter()
        .filter(|t| candidate_tokens.contains(t))
        .count();
    let longest = query_tokens.len().max(candidate_tokens.len());

    #[allow(clippy::cast_precision_loss)]
    let ratio = common as f64 / longest as f64;
    ratio * TOKEN_SCORE_MAX
}

/// Pick the candidate best matching `title`.
///
/// Candidates of the wrong kind are ignored unless none match the kind. For
/// series with a positive `season`, the first candidate carrying that season
/// marker wins outright. Ties keep the earliest candidate, and when nothing
/// scores above zero the first candidate is returned.
pub fn best_match<'a>(
    candidates: &'a [MatchCandidate],
    title: &str,
    kind: ContentKind,
    season: Option<u32>,
) -> Option<&'a MatchCandidate> {
    let of_kind: Vec<&MatchCandidate> = candidates.iter().filter(|c| c.kind == kind).collect();
    let pool: Vec<&MatchCandidate> = if of_kind.is_empty() {
        candidates.iter().collect()
    } else {
        of_kind
    };

    if let (ContentKind::Series, Some(wanted)) = (kind, season.filter(|s| *s > 0)) {
        if let Some(hit) = pool
            .iter()
            .find(|c| season_from_title(&c.title) == Some(wanted))
        {
            debug!(season = wanted, url = %hit.url, "Season marker match");
            return Some(*hit);
        }
    }

    let query = normalize_title(title);
    let mut best = *pool.first()?;
    let mut best_score = 0.0;

    for candidate in pool {
        let s = score_normalized(&query, &normalize_title(&clean_title(&candidate.title)));
        if s > best_score {
            best_score = s;
            best = candidate;
        }
    }

    debug!(title, score = best_score, url = %best.url, "Best title match");
    Some(best)
}

/// Catalog search, the input side of matching.
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    async fn search(&self, title: &str) -> Result<Vec<MatchCandidate>>;
}

/// Search the catalog for `title` and return the best page URL.
pub async fn find_best_match(
    search: &dyn CatalogSearch,
    title: &str,
    kind: ContentKind,
    season: Option<u32>,
) -> Result<Option<String>> {
    let candidates = search.search(title).await?;
    Ok(best_match(&candidates, title, kind, season).map(|c| c.url.clone()))
}
