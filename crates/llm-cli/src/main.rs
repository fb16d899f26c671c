//! llm-cli
//!
//! Sends one conversation to a named model from the default catalog and
//! prints the reply, either whole or as it streams in.

mod cli;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use llm_core::MemoryCache;
use llm_runtime::{all_api_keys_set, catalog};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if !all_api_keys_set() {
        tracing::debug!("not every backend credential is set");
    }

    let registry = catalog::default_registry(Arc::new(MemoryCache::new()))?;
    let Some(model) = registry.get(&cli.model) else {
        anyhow::bail!(
            "unknown model {}, available: {}",
            cli.model,
            registry.names().join(", ")
        );
    };

    // Ctrl-C cancels retries and the in-flight request
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupted");
                cancel.cancel();
            }
        }
    });

    let conversation = cli.conversation();
    let options = cli.options(cancel);

    if cli.stream {
        let mut deltas = model.stream(&conversation, options).await?;
        let mut stdout = std::io::stdout().lock();
        while let Some(delta) = deltas.next().await {
            stdout.write_all(delta.as_bytes())?;
            stdout.flush()?;
        }
        writeln!(stdout)?;
    } else {
        let reply = model.prompt(&conversation, options).await?;
        println!("{reply}");
    }

    Ok(())
}
