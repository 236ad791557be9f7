//! `embed-resolver` CLI - Resolve embed URLs and match catalog titles

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use embed_resolver::{Config, ContentKind};

#[derive(Parser)]
#[command(name = "embed-resolver")]
#[command(about = "Resolve third-party video embeds to direct playable URLs")]
#[command(version)]
struct Cli {
    /// Config file (default: ~/.config/embed-resolver/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one embed URL with the decoder for HOST
    Resolve {
        /// Host key (uqload, voe, dood, filmoon, vidzy, premium)
        host: String,

        /// Embed URL
        url: String,
    },

    /// Resolve a JSON array of embed references concurrently
    Streams {
        /// File with `[{"hostKey", "language", "embedUrl"}, ...]`
        file: PathBuf,
    },

    /// Pick the best catalog candidate for a title
    Match {
        /// Title to look for
        title: String,

        /// JSON file with search results
        #[arg(long)]
        candidates: PathBuf,

        /// Content kind (movie, series)
        #[arg(short, long, default_value = "movie")]
        kind: ContentKind,

        /// Season number (series only)
        #[arg(short, long)]
        season: Option<u32>,
    },

    /// Find the content page for a numeric site id
    Locate {
        /// Site id, e.g. 15124302
        id: String,

        /// Content kind (movie, series)
        #[arg(short, long, default_value = "movie")]
        kind: ContentKind,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries JSON only
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Resolve { host, url } => {
            cmd::resolve::cmd_resolve(&config, &host, &url).await?;
        }
        Commands::Streams { file } => {
            cmd::streams::cmd_streams(&config, &file).await?;
        }
        Commands::Match {
            title,
            candidates,
            kind,
            season,
        } => {
            cmd::match_title::cmd_match(&title, &candidates, kind, season)?;
        }
        Commands::Locate { id, kind } => {
            cmd::locate::cmd_locate(&config, &id, kind).await?;
        }
    }

    Ok(())
}
