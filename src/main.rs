use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fitstore::config::Config;
use fitstore::db::AppState;
use fitstore::handlers;
use fitstore::handlers::admin::resolve_recipients;

#[derive(Parser)]
#[command(name = "fitstore", version, about = "Fitness storefront backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Send one HTML email to every user, or to the given addresses
    Broadcast {
        #[arg(long)]
        subject: String,
        #[arg(long)]
        html_file: PathBuf,
        #[arg(long = "to")]
        to: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    init_logging(config.log_json);

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await
        }
        Command::Broadcast {
            subject,
            html_file,
            to,
        } => broadcast(config, subject, html_file, to).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config.addr();
    if config.admin_emails.is_empty() {
        tracing::warn!("ADMIN_EMAILS is empty, admin routes will reject everyone");
    }
    if config.production {
        tracing::info!("Production mode: purchase reconciliation disabled");
    }

    let state = AppState::new(config);
    if !state.email.is_configured() {
        tracing::warn!("RESEND_API_KEY not set, bulk email is disabled");
    }
    let app = handlers::app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn broadcast(
    config: Config,
    subject: String,
    html_file: PathBuf,
    to: Vec<String>,
) -> anyhow::Result<()> {
    let html = tokio::fs::read_to_string(&html_file)
        .await
        .with_context(|| format!("Failed to read {}", html_file.display()))?;

    let state = AppState::new(config);
    let explicit = (!to.is_empty()).then_some(to);
    let recipients = resolve_recipients(&state, explicit).await?;
    anyhow::ensure!(!recipients.is_empty(), "No recipients");

    let report = state.email.send_bulk(&subject, &html, recipients).await?;
    tracing::info!(sent = report.sent, batches = report.batches, "Broadcast complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fitstore=debug,tower_http=info,info"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
