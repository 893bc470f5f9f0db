//! Network Module
//!
//! The server side of the wire protocol.
//!
//! ## Architecture
//! - One thread, one `mio` poll over the listener and every connection
//! - Frames are reassembled per connection and dispatched to the engine
//! - The poll timeout is bounded so catalog announcements keep firing

mod connection;
mod dispatch;
mod server;

pub use connection::{Connection, ReadState};
pub use dispatch::respond;
pub use server::{Server, ShutdownHandle};
