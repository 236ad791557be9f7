use anyhow::Result;

use embed_resolver::{Config, Engine};

use super::output::print_json;

pub async fn cmd_resolve(config: &Config, host: &str, url: &str) -> Result<()> {
    let engine = Engine::from_config(config)?;

    if !engine.resolver().supports(host) {
        tracing::warn!(host, "No decoder registered for this host");
    }

    let resolved = engine.resolve(url, host).await;
    print_json(&resolved)
}
