//! Embed resolution
//!
//! Turns third-party player embed URLs into directly playable media URLs.
//! One [`Decoder`] per host, dispatched by [`Resolver`] through the shared
//! cache, and fanned out concurrently by [`resolve_all`].

pub mod decoder;
pub mod extract;
pub mod format;
pub mod hosts;
pub mod packer;
pub mod resolver;

pub use decoder::{Decoder, EmbedReference, Host, Language, PlaybackKind, ResolvedStream};
pub use format::{player_name, resolve_all, StreamDescriptor};
pub use hosts::{all_decoders, decoder_for};
pub use resolver::Resolver;
