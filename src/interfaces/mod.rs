//! Inbound interfaces: the front-end HTTP surface and CSV account
//! provisioning.

pub mod csv;
pub mod http;
