//! valuecache - Serve a JSON document from a local cache
//!
//! Reads the document from the file store, fetching it over HTTP on a miss,
//! and prints it to stdout. With `--watch` it keeps refreshing in the
//! background and prints every new value.

use std::error::Error;
use std::future::Future;
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing::{debug, info};

use valuecache::cli::{Cli, StartupConfig};
use valuecache::refresh::{RefreshHandle, RefreshMessage};
use valuecache::{logging, HttpFetcher, SingleValueCache};

/// Prints the value as pretty JSON on stdout
fn print_value(value: Option<&Value>) -> Result<(), serde_json::Error> {
    let text = serde_json::to_string_pretty(value.unwrap_or(&Value::Null))?;
    println!("{}", text);
    Ok(())
}

/// Refreshes in the background until `shutdown` resolves, printing each new value
///
/// `shutdown` is polled across iterations, so a signal that arrives while a
/// value is being printed still ends the loop.
async fn watch<S: Future>(
    cache: SingleValueCache<Value>,
    mut handle: RefreshHandle<Value>,
    shutdown: S,
) -> Result<(), Box<dyn Error>> {
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            message = handle.receiver.recv() => match message {
                Some(RefreshMessage::Refreshed(value)) => print_value(Some(&value))?,
                Some(RefreshMessage::RefreshError(e)) => eprintln!("refresh failed: {}", e),
                Some(RefreshMessage::RefreshStarted) => debug!(key = cache.key(), "refresh started"),
                None => break,
            },
            _ = &mut shutdown => {
                info!("interrupted, stopping");
                break;
            }
        }
    }
    handle.shutdown().await;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = StartupConfig::from_cli(&cli)?;
    let store = config.file_store();
    let fetcher: HttpFetcher<Value> = HttpFetcher::new(config.url.clone());
    let cache = SingleValueCache::new(config.key.clone(), fetcher, store);

    cache.ready().await?;
    if config.force_refresh {
        cache.refresh().await?;
    }
    print_value(cache.value().as_ref())?;

    if let Some(refresh) = config.watch {
        let handle = RefreshHandle::spawn(cache.clone(), refresh);
        watch(cache, handle, tokio::signal::ctrl_c()).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
