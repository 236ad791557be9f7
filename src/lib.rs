//! `embed-resolver` - Stream resolution for third-party video embeds
//!
//! # Features
//!
//! - **Host decoders**: six embed hosts, from plain page scraping to packed
//!   JavaScript, layered payload obfuscation and attested AES-GCM playback
//! - **Dispatch**: host-keyed routing with a namespaced TTL cache; single-use
//!   URLs are never cached
//! - **Fan-out**: a page's whole stream list resolved concurrently, each entry
//!   under its own timeout
//! - **Title matching**: picks the catalog page for an external title/season
//!
//! # Example
//!
//! ```rust,no_run
//! use embed_resolver::{Config, Engine};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = Engine::from_config(&Config::load()?)?;
//!     if let Some(stream) = engine.resolve("https://uqload.example/embed-abc.html", "uqload").await {
//!         println!("{}", stream.direct_url());
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod form;
pub mod http_client;
pub mod matching;
pub mod origin;
pub mod page;
pub mod stream;

#[cfg(test)]
mod testing;

pub use cache::{ns, CacheStore, NamespacePolicy};
pub use config::Config;
pub use engine::Engine;
pub use error::{DecodeError, DecodeResult};
pub use fingerprint::{chrome_profile, BrowserProfile};
pub use http_client::HttpClient;
pub use matching::{best_match, find_best_match, score, CatalogSearch, ContentKind, MatchCandidate};
pub use origin::SiteOrigin;
pub use page::PageLocator;
pub use stream::{
    resolve_all, Decoder, EmbedReference, Host, Language, ResolvedStream, Resolver, StreamDescriptor,
};

/// Version of embed-resolver
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
