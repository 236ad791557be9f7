//! Host-specific decoders, one per [`Host`] variant.

pub mod dood;
pub mod filmoon;
pub mod premium;
pub mod uqload;
pub mod vidzy;
pub mod voe;

use std::sync::Arc;

pub use dood::DoodDecoder;
pub use filmoon::FilmoonDecoder;
pub use premium::PremiumDecoder;
pub use uqload::UqloadDecoder;
pub use vidzy::VidzyDecoder;
pub use voe::VoeDecoder;

use crate::http_client::HttpClient;
use crate::origin::SiteOrigin;
use crate::stream::decoder::{Decoder, Host};

/// Build the decoder for `host`.
pub fn decoder_for(
    host: Host,
    client: &Arc<HttpClient>,
    origin: &Arc<SiteOrigin>,
) -> Arc<dyn Decoder> {
    match host {
        Host::Uqload => Arc::new(UqloadDecoder::new(Arc::clone(client))),
        Host::Voe => Arc::new(VoeDecoder::new(Arc::clone(client), Arc::clone(origin))),
        Host::Dood => Arc::new(DoodDecoder::new(Arc::clone(client))),
        Host::Filmoon => Arc::new(FilmoonDecoder::new(Arc::clone(client))),
        Host::Vidzy => Arc::new(VidzyDecoder::new(Arc::clone(client))),
        Host::Premium => Arc::new(PremiumDecoder::new(Arc::clone(client), Arc::clone(origin))),
    }
}

/// One decoder per host.
pub fn all_decoders(client: &Arc<HttpClient>, origin: &Arc<SiteOrigin>) -> Vec<Arc<dyn Decoder>> {
    Host::ALL
        .into_iter()
        .map(|host| decoder_for(host, client, origin))
        .collect()
}
