//! Cluster Module
//!
//! Client-side routing over `n` independent servers.
//!
//! ## Placement
//! ```text
//!   hash(key) mod n = 4, n = 5, k = 3
//!
//!   shard:   0    1    2    3    4
//!           [r2] [r3]           [r1]   replicas = [4, 0, 1]
//! ```
//! Every key lives on its primary shard and the `k-1` shards after it,
//! wrapping around the ring. Replicas are independent; nothing keeps them
//! in lockstep beyond the router writing to all of them.

mod ring;
mod router;

pub use ring::{Ring, UNHASHABLE_SHARD};
pub use router::ClusterRouter;
