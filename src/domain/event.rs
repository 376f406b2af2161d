//! Inbound event decoding.
//!
//! Hardware publishes JSON wire messages of the shape
//! `{"action": "<name>", "data": <integer>}`. The dispatcher turns those
//! into typed [`KioskEvent`] values. The protocol is deliberately
//! permissive: an unknown action decodes to [`KioskEvent::Ignored`] so a
//! newer firmware cannot crash an older coordinator, while a structurally
//! malformed payload is a [`DecodeError`] that the listener logs and drops.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};

/// The JSON envelope shared by both bus directions.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct WireMessage {
    pub action: String,
    #[serde(default)]
    pub data: i64,
}

/// Inbound action names understood by the dispatcher.
pub mod actions {
    pub const CARD_READ: &str = "card_read";
    pub const REFILL: &str = "refill";
    pub const REFILL_COMPLETE: &str = "refill_comp";
    pub const WITHDRAWAL_COMPLETE: &str = "successful_withdrawal";
    pub const NEW_WORK: &str = "new_work";
    pub const END_WORK: &str = "end_work";
}

/// One step of the kiosk interaction, as consumed by the session state
/// machine.
///
/// Bus-originated variants are constructed only by [`KioskEvent::decode`];
/// the lifecycle variants (`CredentialVerified`, `SessionEnded` on page
/// resets, `DepositRequested` on a forwarded refill button) are also
/// constructed by the HTTP route layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KioskEvent {
    /// A card was presented; carries the RFID credential.
    CardRead(u64),
    /// The front end asked the acceptor to take a deposit of this amount.
    DepositRequested(i64),
    /// The cash acceptor confirmed a deposit of this amount.
    DepositCompleted(i64),
    /// The dispenser confirmed a withdrawal.
    WithdrawalCompleted,
    /// Hardware announced it is ready for a new interaction.
    SessionStarted,
    /// The current interaction is over.
    SessionEnded,
    /// The front end verified the user's secret.
    CredentialVerified,
    /// An action this coordinator does not recognize; applied as a no-op.
    Ignored,
}

impl KioskEvent {
    /// Decodes a raw bus payload into an event.
    ///
    /// Unknown actions and out-of-range data values are demoted to
    /// [`KioskEvent::Ignored`] with a warning; only a payload that is not a
    /// parseable wire message is an error.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let message: WireMessage = serde_json::from_slice(payload)?;
        let event = match message.action.as_str() {
            actions::CARD_READ => match u64::try_from(message.data) {
                Ok(rf_id) => Self::CardRead(rf_id),
                Err(_) => {
                    tracing::warn!(data = message.data, "card_read with negative credential");
                    Self::Ignored
                }
            },
            actions::REFILL if message.data >= 0 => Self::DepositRequested(message.data),
            actions::REFILL_COMPLETE if message.data >= 0 => Self::DepositCompleted(message.data),
            actions::REFILL | actions::REFILL_COMPLETE => {
                tracing::warn!(
                    action = %message.action,
                    data = message.data,
                    "deposit action with negative amount"
                );
                Self::Ignored
            }
            actions::WITHDRAWAL_COMPLETE => Self::WithdrawalCompleted,
            actions::NEW_WORK => Self::SessionStarted,
            actions::END_WORK => Self::SessionEnded,
            other => {
                tracing::warn!(action = %other, "ignoring unknown hardware action");
                Self::Ignored
            }
        };
        Ok(event)
    }
}
