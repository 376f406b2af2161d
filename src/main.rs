use clap::Parser;
use kioskd::application::coordinator::SessionCoordinator;
use kioskd::application::listener::BusListener;
use kioskd::domain::ports::{LedgerHandle, PublisherHandle};
use kioskd::infrastructure::in_memory::InMemoryLedger;
use kioskd::infrastructure::nats::NatsCommandPublisher;
use kioskd::interfaces::csv::provision_reader::load_accounts;
use kioskd::interfaces::http::{self, AppState};
use miette::{IntoDiagnostic, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONNECT_ATTEMPTS: u32 = 10;

/// Kiosk session coordinator: bridges hardware events on the message bus
/// with the web front end.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// NATS server to connect to.
    #[arg(long, env = "KIOSKD_NATS_URL", default_value = "nats://127.0.0.1:4222")]
    nats_url: String,

    /// Address the front-end HTTP server binds to.
    #[arg(long, env = "KIOSKD_HTTP_ADDR", default_value = "0.0.0.0:8000")]
    http_addr: SocketAddr,

    /// Subject hardware events arrive on.
    #[arg(long, env = "KIOSKD_INBOUND_SUBJECT", default_value = "kiosk.hardware.events")]
    inbound_subject: String,

    /// Subject hardware commands are published to.
    #[arg(long, env = "KIOSKD_OUTBOUND_SUBJECT", default_value = "kiosk.hardware.commands")]
    outbound_subject: String,

    /// CSV file of `rf_id,secret[,balance]` rows to provision at startup.
    #[arg(long, env = "KIOSKD_ACCOUNTS")]
    accounts: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kioskd=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let ledger: LedgerHandle = Arc::new(InMemoryLedger::new());
    if let Some(path) = &cli.accounts {
        let inserted = load_accounts(ledger.as_ref(), path).await.into_diagnostic()?;
        tracing::info!(inserted, "provisioned accounts from file");
    }

    let client = connect_with_backoff(&cli.nats_url).await.into_diagnostic()?;
    tracing::info!(url = %cli.nats_url, "connected to NATS");

    let publisher: PublisherHandle = Arc::new(NatsCommandPublisher::new(
        client.clone(),
        cli.outbound_subject.clone(),
    ));
    let coordinator = Arc::new(SessionCoordinator::new(publisher.clone()));

    let shutdown = CancellationToken::new();
    let listener = BusListener::new(
        client,
        cli.inbound_subject.clone(),
        coordinator.clone(),
        shutdown.clone(),
    );
    let listener_task = tokio::spawn(listener.run());

    let app = http::router(AppState {
        coordinator,
        ledger,
        publisher,
        outbound_subject: cli.outbound_subject.clone(),
    });

    let tcp = tokio::net::TcpListener::bind(cli.http_addr)
        .await
        .into_diagnostic()?;
    tracing::info!(addr = %cli.http_addr, "front-end HTTP server listening");

    axum::serve(tcp, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown.clone()))
        .await
        .into_diagnostic()?;

    // HTTP is down; stop the listener and let it finish its in-flight event.
    shutdown.cancel();
    let _ = listener_task.await;

    Ok(())
}

async fn wait_for_shutdown(shutdown: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
    shutdown.cancel();
}

/// Connects to NATS, retrying with capped backoff for a bounded number of
/// attempts before giving up.
async fn connect_with_backoff(url: &str) -> Result<async_nats::Client, async_nats::ConnectError> {
    let mut backoff = Duration::from_millis(250);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match async_nats::connect(url).await {
            Ok(client) => return Ok(client),
            Err(e) => {
                if attempt >= CONNECT_ATTEMPTS {
                    return Err(e);
                }
                tracing::warn!(attempt, error = %e, "NATS connection failed, retrying");
            }
        }
        tokio::time::sleep(backoff).await;
        backoff = (backoff * 2).min(Duration::from_secs(5));
    }
}
