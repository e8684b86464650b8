use std::{borrow::Cow, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::{
    auth::{Authenticator, OAuthAuthenticator},
    client::HttpClient,
    config::Config,
    mapping::{EntityType, UnifiedRecord},
    sync::SyncService,
};

#[derive(Parser)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// Path to the JSON config file holding credentials and tokens.
    ///
    /// Refreshed tokens are written back to this file.
    #[clap(long = "config", env = "TARGET_QUICKBOOKS_CONFIG")]
    config: PathBuf,

    /// DSN to tell Sentry where to send events.
    ///
    /// If provided, errors will be sent to Sentry.
    #[clap(long = "sentry-dsn", env = "SENTRY_DSN")]
    sentry_dsn: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write unified records to QuickBooks and print their state.
    Sync(SyncOpts),
    /// Exchange the refresh token for a new token pair and save it.
    RefreshToken,
}

#[derive(Args)]
struct SyncOpts {
    /// The unified stream the records belong to, e.g. "Invoices".
    #[clap(long = "stream")]
    stream: EntityType,

    /// File with one JSON record per line. Use "-" to read from stdin.
    #[clap(long = "input", default_value = "-")]
    input: String,
}

pub async fn run_with_sys_args() -> anyhow::Result<()> {
    use tracing_subscriber::prelude::*;

    let cli = Cli::parse();

    let sentry_config = cli.sentry_dsn.map(|dsn| {
        debug!("Enabled sentry.");

        let release_name = option_env!("GIT_SHA")
            .map(Cow::from)
            .or_else(|| sentry::release_name!());

        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: release_name,
                ..Default::default()
            },
        ))
    });

    let sentry_tracing_layer = if sentry_config.is_some() {
        Some(sentry_tracing::layer())
    } else {
        None
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(sentry_tracing_layer)
        .init();

    let config = Config::load(&cli.config)
        .await
        .context("Failed to load config.")?;
    let base_url = config.api_base_url();
    let auth = Arc::new(OAuthAuthenticator::new(config, cli.config.clone()));

    match cli.command {
        Commands::Sync(opts) => {
            let records = if opts.input == "-" {
                read_records(BufReader::new(tokio::io::stdin())).await?
            } else {
                let file = tokio::fs::File::open(&opts.input)
                    .await
                    .with_context(|| format!("Failed to open input file {}.", opts.input))?;

                read_records(BufReader::new(file)).await?
            };

            info!(stream = %opts.stream, records = records.len(), "Read records.");

            let service = SyncService::new(Arc::new(HttpClient::new(base_url, auth)));
            let states = service.map_and_reconcile(opts.stream, &records).await;

            for state in states {
                println!(
                    "{}",
                    serde_json::to_string(&state).context("Failed to serialize record state.")?
                );
            }

            Ok(())
        }
        Commands::RefreshToken => {
            auth.refresh()
                .await
                .context("Failed to refresh access token.")?;

            Ok(())
        }
    }
}

/// Read one unified record per non-blank line.
async fn read_records<R: AsyncBufRead + Unpin>(reader: R) -> anyhow::Result<Vec<UnifiedRecord>> {
    let mut lines = reader.lines();
    let mut records = Vec::new();
    let mut line_number = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read input.")? {
        line_number += 1;

        if line.trim().is_empty() {
            continue;
        }

        let value: serde_json::Value = serde_json::from_str(&line)
            .with_context(|| format!("Line {} is not valid JSON.", line_number))?;
        let record = UnifiedRecord::try_from(value)
            .map_err(|_| anyhow::anyhow!("Line {} is not a JSON object.", line_number))?;

        records.push(record);
    }

    Ok(records)
}
