//! NATS-backed command publisher, plus a recording double for tests.

use crate::domain::command::OutboundCommand;
use crate::domain::ports::CommandPublisher;
use crate::error::PublishError;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::RwLock;
use std::time::Duration;

const PUBLISH_ATTEMPTS: u32 = 3;
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(2);

/// Drives one send attempt at a time until it succeeds, a per-attempt
/// timeout fires, or the attempt budget runs out.
async fn publish_with_retry<'a, F>(
    subject: &str,
    attempts: u32,
    per_attempt_timeout: Duration,
    mut send: F,
) -> Result<(), PublishError>
where
    F: FnMut() -> BoxFuture<'a, Result<(), String>>,
{
    let mut reason = String::new();
    for attempt in 1..=attempts {
        match tokio::time::timeout(per_attempt_timeout, send()).await {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => reason = e,
            Err(_) => reason = format!("timed out after {per_attempt_timeout:?}"),
        }
        tracing::warn!(
            subject = %subject,
            attempt,
            reason = %reason,
            "publish attempt failed"
        );
    }
    Err(PublishError::PublishFailed {
        subject: subject.to_string(),
        attempts,
        reason,
    })
}

/// Publishes hardware commands on a fixed outbound subject.
///
/// Each attempt is bounded by a short timeout and the whole emit gives up
/// after a few attempts: a dead broker surfaces as `PublishFailed` to the
/// caller instead of a hung HTTP handler.
pub struct NatsCommandPublisher {
    client: async_nats::Client,
    subject: String,
}

impl NatsCommandPublisher {
    pub fn new(client: async_nats::Client, subject: impl Into<String>) -> Self {
        Self {
            client,
            subject: subject.into(),
        }
    }

    async fn try_send(&self, payload: Bytes) -> Result<(), String> {
        self.client
            .publish(self.subject.clone(), payload)
            .await
            .map_err(|e| e.to_string())?;
        // publish only buffers; flush pushes it onto the wire.
        self.client.flush().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl CommandPublisher for NatsCommandPublisher {
    async fn emit(&self, command: &OutboundCommand) -> Result<(), PublishError> {
        let payload = Bytes::from(serde_json::to_vec(&command.wire())?);
        publish_with_retry(&self.subject, PUBLISH_ATTEMPTS, PUBLISH_TIMEOUT, || {
            let payload = payload.clone();
            async move { self.try_send(payload).await }.boxed()
        })
        .await?;
        tracing::debug!(
            subject = %self.subject,
            action = command.action(),
            "published hardware command"
        );
        Ok(())
    }
}

/// Command publisher that records instead of sending, for tests.
#[derive(Default)]
pub struct RecordingPublisher {
    emitted: RwLock<Vec<OutboundCommand>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands emitted so far, in order.
    pub fn commands(&self) -> Vec<OutboundCommand> {
        self.emitted
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of emitted commands carrying the given action name.
    pub fn count_for_action(&self, action: &str) -> usize {
        self.emitted
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| c.action() == action)
            .count()
    }

    pub fn was_emitted(&self, action: &str) -> bool {
        self.count_for_action(action) > 0
    }
}

#[async_trait]
impl CommandPublisher for RecordingPublisher {
    async fn emit(&self, command: &OutboundCommand) -> Result<(), PublishError> {
        self.emitted
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(command.clone());
        Ok(())
    }
}
