use std::path::Path;

use anyhow::Result;

use embed_resolver::{Config, EmbedReference, Engine};

use super::output::{print_json, read_json};

pub async fn cmd_streams(config: &Config, file: &Path) -> Result<()> {
    let references: Vec<EmbedReference> = read_json(file)?;
    let engine = Engine::from_config(config)?;

    let descriptors = engine.streams(&references).await;
    tracing::info!(
        requested = references.len(),
        resolved = descriptors.len(),
        "Streams resolved"
    );
    print_json(&descriptors)
}
