use anyhow::Result;

use embed_resolver::{Config, ContentKind, Engine};

use super::output::print_json;

pub async fn cmd_locate(config: &Config, id: &str, kind: ContentKind) -> Result<()> {
    let engine = Engine::from_config(config)?;
    let url = engine.locate(id, kind).await.map(String::from);
    print_json(&url)
}
