//! Client Module
//!
//! Blocking client stub for a single server: one connection, one framed
//! request, one framed response. Routing and retries live in `cluster`.

mod stub;

pub use stub::Client;
