//! pulseboard-store — embedded metric store for Pulseboard.
//!
//! Backed by [redb](https://docs.rs/redb), persists metric events and
//! answers the only query the dashboard needs: the most recent records,
//! newest first.
//!
//! # Architecture
//!
//! Records are JSON-serialized into redb's `&[u8]` value columns under a
//! time-ordered key. A second table indexes records by their public id
//! so deletion never scans.
//!
//! The `MetricStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use store::{DEFAULT_LIMIT, MetricStore};
pub use types::*;
