use super::event::{WireMessage, actions};

/// A directive for the kiosk hardware, published on the outbound subject.
///
/// Constructed by state-machine side effects (`StartSession`) and by the
/// HTTP layer (`EndSession`, forwarded front-end buttons).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    /// `new_work`: hardware should begin a fresh interaction.
    StartSession,
    /// `end_work`: hardware should wind down the current interaction.
    EndSession,
    /// A front-end button forwarded verbatim, e.g. `refill` with an amount.
    Forward { action: String, data: i64 },
}

impl OutboundCommand {
    pub fn action(&self) -> &str {
        match self {
            Self::StartSession => actions::NEW_WORK,
            Self::EndSession => actions::END_WORK,
            Self::Forward { action, .. } => action,
        }
    }

    pub fn data(&self) -> i64 {
        match self {
            Self::StartSession | Self::EndSession => 0,
            Self::Forward { data, .. } => *data,
        }
    }

    /// The `{action, data}` envelope this command is published as.
    pub fn wire(&self) -> WireMessage {
        WireMessage {
            action: self.action().to_string(),
            data: self.data(),
        }
    }
}
