use std::path::Path;

use anyhow::Result;

use embed_resolver::{best_match, ContentKind, MatchCandidate};

use super::output::{print_json, read_json};

pub fn cmd_match(
    title: &str,
    candidates: &Path,
    kind: ContentKind,
    season: Option<u32>,
) -> Result<()> {
    let candidates: Vec<MatchCandidate> = read_json(candidates)?;
    print_json(&best_match(&candidates, title, kind, season))
}
