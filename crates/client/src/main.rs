use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rustplex_client::ClientContext;
use rustplex_core::config::ClientConfig;
use rustplex_core::{ContentItem, MediaKind, MediaServer, url};
use rustplex_fanout::cache::section_kind_for;
use rustplex_resolver::{NoBusyIndicator, expand_stack};

#[derive(Debug, Parser)]
#[command(name = "rustplex", about = "Media server client core")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base HTTP address of the media server.
    #[arg(long, env = "RUSTPLEX_SERVER_URL", default_value = "http://127.0.0.1:32400")]
    server_url: String,

    /// Identifier the server is addressed by in `plexserver://` references.
    #[arg(long, env = "RUSTPLEX_SERVER_UUID", default_value = "local")]
    server_uuid: String,

    #[arg(long, env = "RUSTPLEX_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Refresh sections and print their cached lists.
    Sections {
        /// Server directory type of the sections (movie, show, artist, photo, playlist).
        #[arg(long, default_value = "movie")]
        kind: String,

        /// Seconds to wait for the lists to load.
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        #[arg(required = true)]
        refs: Vec<String>,
    },
    /// Resolve an item and print the address to play.
    Resolve {
        /// Server-relative key (`/library/metadata/1`) or full reference.
        path: String,

        #[arg(long)]
        media_index: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    let mut server = MediaServer::new(cli.server_uuid.clone(), cli.server_url.clone());
    server.token = cli.token.clone();

    let ctx = ClientContext::open(config, server)
        .await
        .context("failed to open client context")?;

    match cli.command {
        Command::Sections { kind, timeout, refs } => {
            let kind = section_kind_for(&kind);
            let sections: Vec<_> = refs
                .iter()
                .map(|r| (as_reference(&cli.server_uuid, r), kind))
                .collect();

            let late = ctx
                .refresh_and_wait(&sections, Duration::from_secs(timeout))
                .await;
            for section in &late {
                warn!(section = %section, "section did not finish loading");
            }

            for (reference, _) in &sections {
                let mut lists = serde_json::Map::new();
                for content in ctx.cache.content_kinds(reference) {
                    let list = ctx.cache.content_list(reference, content);
                    let items: Vec<&ContentItem> = list.iter().collect();
                    lists.insert(content.to_string(), serde_json::to_value(items)?);
                }
                let out = serde_json::json!({ "section": reference, "lists": lists });
                println!("{}", serde_json::to_string_pretty(&out)?);
            }
        }
        Command::Resolve { path, media_index } => {
            let mut item = ContentItem::new(as_reference(&cli.server_uuid, &path), "", MediaKind::Video);
            item.server = Some(cli.server_uuid.clone());
            item.selected_media_item = media_index;

            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    ctrl_c.cancel();
                }
            });

            let resolved = match ctx.engine.resolve(&item, cancel, &NoBusyIndicator).await {
                Ok(resolved) => resolved,
                Err(e) if e.is_cancelled() => {
                    info!("resolution cancelled");
                    return Ok(());
                }
                Err(e) => return Err(e).context("failed to resolve item"),
            };

            for segment in expand_stack(&resolved).context("failed to expand stack")? {
                println!("{}", segment.path);
            }
        }
    }

    Ok(())
}

/// Accept either a full reference or a key on the configured server.
fn as_reference(server_uuid: &str, path: &str) -> String {
    if path.contains("://") {
        path.to_string()
    } else {
        url::server_url(server_uuid, path)
    }
}
