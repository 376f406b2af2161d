//! Concrete adapters behind the domain ports: the in-memory account store
//! and the NATS command publisher.

pub mod in_memory;
pub mod nats;
