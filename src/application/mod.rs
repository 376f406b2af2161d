//! Application layer: the session coordinator that owns the shared state
//! and the bus listener task that feeds it hardware events.

pub mod coordinator;
pub mod listener;
