//! Write-Ahead Log (WAL) Module
//!
//! Provides durability guarantees through append-only logging.
//!
//! ## Responsibilities
//! - Append every mutation before it is applied
//! - fsync each append before the caller acknowledges it
//! - Replay on startup, dropping a torn final line
//!
//! ## File Format
//! One JSON request per line, in execution order:
//! ```text
//! {"method":"insert","key":"a","value":{"x":1}}
//! {"method":"remove","key":"a"}
//! ```
//! The file is deleted whenever its contents are folded into a checkpoint.

mod writer;
mod recovery;

pub use writer::WalWriter;
pub use recovery::{RecoveryResult, WalRecovery};
