//! The bus listener: a single dedicated task consuming hardware events.
//!
//! The NATS subscriber hands messages over one at a time, so decode and
//! transition run sequentially with no concurrent decode calls; the HTTP
//! pool only ever meets this task at the coordinator's mutex. Transport
//! loss is retried with bounded backoff, and a cancellation token gives a
//! clean shutdown that finishes the in-flight message first.

use crate::application::coordinator::SessionCoordinator;
use crate::domain::event::KioskEvent;
use futures::StreamExt;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

pub struct BusListener {
    client: async_nats::Client,
    subject: String,
    coordinator: Arc<SessionCoordinator>,
    shutdown: CancellationToken,
}

impl BusListener {
    pub fn new(
        client: async_nats::Client,
        subject: impl Into<String>,
        coordinator: Arc<SessionCoordinator>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            client,
            subject: subject.into(),
            coordinator,
            shutdown,
        }
    }

    /// Runs until the shutdown token fires, resubscribing with capped
    /// backoff whenever the subscription is lost.
    pub async fn run(self) {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            match self.client.subscribe(self.subject.clone()).await {
                Ok(subscriber) => {
                    tracing::info!(subject = %self.subject, "listening for hardware events");
                    backoff = INITIAL_BACKOFF;
                    if self.consume(subscriber).await.is_break() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(subject = %self.subject, error = %e, "subscribe failed");
                }
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = (backoff * 2).min(MAX_BACKOFF);
        }
        tracing::info!("bus listener stopped");
    }

    async fn consume(&self, mut subscriber: async_nats::Subscriber) -> ControlFlow<()> {
        loop {
            tokio::select! {
                // An in-flight handle() finishes before cancellation is
                // observed; a message is never half-applied on shutdown.
                _ = self.shutdown.cancelled() => {
                    let _ = subscriber.unsubscribe().await;
                    return ControlFlow::Break(());
                }
                message = subscriber.next() => match message {
                    Some(message) => self.handle(&message.payload).await,
                    None => {
                        tracing::warn!(subject = %self.subject, "subscription closed by transport");
                        return ControlFlow::Continue(());
                    }
                }
            }
        }
    }

    async fn handle(&self, payload: &[u8]) {
        match KioskEvent::decode(payload) {
            // Unknown actions were already logged by the dispatcher.
            Ok(KioskEvent::Ignored) => {}
            Ok(event) => {
                if let Err(e) = self.coordinator.transition(event).await {
                    tracing::warn!(error = %e, "transition side effect failed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping undecodable bus message");
            }
        }
    }
}
