//! Domain types: accounts, events, commands, and the pure session state
//! machine, plus the port traits the infrastructure implements.

pub mod account;
pub mod command;
pub mod event;
pub mod ports;
pub mod session;
