//! The pure session state machine.
//!
//! [`apply`] is total over (state, event): hardware does not guarantee
//! event ordering, so every pair has defined behavior and out-of-order
//! events degrade to no-ops instead of panics. Mutual exclusion lives one
//! layer up in [`crate::application::coordinator::SessionCoordinator`];
//! this module only computes transitions.

use super::command::OutboundCommand;
use super::event::KioskEvent;
use serde::Serialize;

/// The page the kiosk front end should be showing.
///
/// Serializes to the wire names the front end was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Page {
    #[serde(rename = "main")]
    Idle,
    #[serde(rename = "password")]
    Authenticating,
    #[serde(rename = "put_money")]
    AwaitingDeposit,
    #[serde(rename = "succ_put")]
    DepositConfirmed,
    #[serde(rename = "succ_with")]
    WithdrawalConfirmed,
}

/// The kiosk's authoritative interaction state.
///
/// Exactly one instance exists per process, owned by the coordinator and
/// mutated only through [`apply`]. Invariant: `active_user` is `Some` if
/// and only if the page is not [`Page::Idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub page: Page,
    pub active_user: Option<u64>,
    pub pending_amount: i64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            page: Page::Idle,
            active_user: None,
            pending_amount: 0,
        }
    }
}

impl SessionState {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Applies one event to the session state, returning the hardware command
/// the transition calls for, if any.
///
/// Deposit and withdrawal confirmations with no active session are
/// out-of-order hardware noise and leave the state untouched; this keeps
/// the active-user invariant intact. Presenting a card mid-session updates
/// the active user without changing the page (re-entry policy).
pub fn apply(state: &mut SessionState, event: &KioskEvent) -> Option<OutboundCommand> {
    match *event {
        KioskEvent::CardRead(rf_id) => {
            if state.page == Page::Idle {
                state.page = Page::Authenticating;
            }
            state.active_user = Some(rf_id);
            None
        }
        KioskEvent::DepositRequested(amount) => {
            if state.active_user.is_some() {
                state.page = Page::AwaitingDeposit;
                state.pending_amount = amount;
            }
            None
        }
        KioskEvent::DepositCompleted(amount) => {
            if state.active_user.is_some() {
                state.page = Page::DepositConfirmed;
                state.pending_amount = amount;
            }
            None
        }
        KioskEvent::WithdrawalCompleted => {
            if state.active_user.is_some() {
                state.page = Page::WithdrawalConfirmed;
            }
            None
        }
        KioskEvent::CredentialVerified => {
            if state.page == Page::Authenticating {
                state.reset();
            }
            None
        }
        KioskEvent::SessionEnded => {
            state.reset();
            None
        }
        KioskEvent::SessionStarted => {
            if state.page == Page::Idle {
                Some(OutboundCommand::StartSession)
            } else {
                None
            }
        }
        KioskEvent::Ignored => None,
    }
}
