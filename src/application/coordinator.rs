use crate::domain::event::KioskEvent;
use crate::domain::ports::PublisherHandle;
use crate::domain::session::{self, Page, SessionState};
use crate::error::PublishError;
use tokio::sync::Mutex;

/// Owner of the kiosk's single [`SessionState`].
///
/// Both the bus listener task and the HTTP handler pool go through this
/// type; [`transition`](Self::transition) and
/// [`snapshot`](Self::snapshot) take the same mutex for the full
/// operation, so every check-then-act is one atomic step and interleaved
/// callers observe a linear history.
pub struct SessionCoordinator {
    state: Mutex<SessionState>,
    publisher: PublisherHandle,
}

impl SessionCoordinator {
    pub fn new(publisher: PublisherHandle) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            publisher,
        }
    }

    /// Applies one event and publishes the command it produced, if any.
    ///
    /// The state mutation commits before the publish starts; a
    /// `PublishFailed` is returned to the caller but the transition stands.
    pub async fn transition(&self, event: KioskEvent) -> Result<Page, PublishError> {
        let (page, command) = {
            let mut state = self.state.lock().await;
            let command = session::apply(&mut state, &event);
            tracing::debug!(?event, page = ?state.page, "applied session event");
            (state.page, command)
        };
        if let Some(command) = command {
            self.publisher.emit(&command).await?;
        }
        Ok(page)
    }

    /// A consistent copy of the current session state.
    pub async fn snapshot(&self) -> SessionState {
        *self.state.lock().await
    }
}
