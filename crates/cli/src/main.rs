//! Little Sun CLI - terminal front end for the dashboard.
//!
//! # Usage
//!
//! ```bash
//! # Interactive shell (default)
//! sun-cli
//! sun-cli shell
//!
//! # Check the backend
//! sun-cli health
//!
//! # Drop the persisted session
//! sun-cli logout
//! ```
//!
//! # Commands
//!
//! - `shell` - Log in, search customers, sort and page through results
//! - `health` - Query the backend health endpoint
//! - `logout` - End the session and remove it from the state file

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use little_sun_dashboard::DashboardConfig;
use little_sun_dashboard::config::SentryConfig;
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "sun-cli")]
#[command(version, about = "Little Sun dashboard CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive dashboard shell
    Shell,
    /// Check backend health
    Health,
    /// Log out and clear the persisted session
    Logout,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: Option<&SentryConfig>) -> Option<sentry::ClientInitGuard> {
    let config = config?;

    let guard = sentry::init((
        config.dsn.expose_secret(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the tracing subscriber, emitting JSON when `json` is set.
///
/// Logs go to stderr so they never interleave with shell output.
fn init_tracing(json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "little_sun_dashboard=info,little_sun_cli=info".into());

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration is needed before Sentry, and Sentry before tracing
    let config = match DashboardConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(false);
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    let _sentry_guard = init_sentry(config.sentry.as_ref());
    init_tracing(config.log_json);

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: DashboardConfig) -> Result<(), commands::CommandError> {
    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => commands::shell::run(config).await,
        Commands::Health => commands::health::run(&config).await,
        Commands::Logout => commands::logout::run(config).await,
    }
}
