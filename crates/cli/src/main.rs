//! `mecca` -- command-line client for the Daily English studio.
//!
//! Submits generation tasks, follows their progress, and edits the
//! config of finished videos through the studio's REST API.
//!
//! # Environment variables
//!
//! | Variable                        | Default                 | Description                     |
//! |---------------------------------|-------------------------|---------------------------------|
//! | `MECCA_BASE_URL`                | `http://localhost:5001` | Studio backend base URL         |
//! | `MECCA_POLL_INTERVAL_MS`        | `1000`                  | Milliseconds between polls      |
//! | `MECCA_REQUEST_TIMEOUT_SECS`    | `30`                    | Timeout for ordinary requests   |
//! | `MECCA_REGENERATE_TIMEOUT_SECS` | `600`                   | Timeout for video regeneration  |
//! | `MECCA_THUMBNAIL_TIMEOUT_SECS`  | `120`                   | Timeout for thumbnail rendering |
//! | `RUST_LOG`                      | `mecca_cli=info,...`    | Log filter                      |

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mecca_cli::args::Cli;
use mecca_cli::commands::App;
use mecca_client::config::ClientConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "mecca_cli=debug,mecca_client=debug"
    } else {
        "mecca_cli=info,mecca_client=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url {
        config = config.with_base_url(base_url);
    }

    tracing::debug!(
        base_url = %config.base_url,
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "Client configured",
    );

    App::new(config)?.run(cli.command).await
}
