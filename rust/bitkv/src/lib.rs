//! # bitkv: bit vectors over a remote key-value store
//!
//! bitkv is a client-side layer over the bitmap primitives of a key-value
//! store (per-bit set, multi-key `AND`/`OR`/`XOR`/`NOT` into a destination,
//! population count). It spares callers the buffer-to-bit conversions and the
//! multi-command choreography that derived bitwise operations need.
//!
//! ## Components
//!
//! * [`vector`] - the in-memory [`BitVector`] and its static bitwise algebra
//! * [`store`] - the store adapter: command model, [`Connection`] trait and an
//!   in-memory reference store
//! * [`Bitmap`] - the immediate API; derived operations run as one transaction
//!   through a scratch key
//! * [`Aggregator`] - the deferred API; chains operations into one transaction
//!   and interprets its tail
//! * [`common`] - error taxonomy shared by all crates
//!
//! ## Example
//!
//! ```no_run
//! # async fn demo() -> bitkv::common::Result<()> {
//! use std::sync::Arc;
//! use bitkv::{Bitmap, BitOp, store::memory_store::MemoryStore};
//!
//! let bitmap = Bitmap::new(Arc::new(MemoryStore::new()))?;
//! bitmap.set_bit("foo", 0, true).await?;
//! bitmap.set_bit("bar", 1, true).await?;
//! assert_eq!(bitmap.count_bitop(BitOp::Or, &["foo", "bar"]).await?, 2);
//!
//! let mut agg = bitmap.aggregate();
//! agg.bitop(BitOp::Or, &["foo", "bar"])?.cleanup()?;
//! let union = agg.exec().await?.into_bits()?;
//! assert_eq!(union.positions().collect::<Vec<_>>(), vec![0, 1]);
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod bitmap;
pub mod config;
pub mod ops;
#[cfg(test)]
mod tests;

pub use bitkv_common as common;
pub use bitkv_store as store;
pub use bitkv_vector as vector;

pub use aggregator::{AggregateOutput, Aggregator, SessionState, Terminal};
pub use bitkv_store::{BitOp, Connection, ReplyMode};
pub use bitkv_vector::BitVector;
pub use bitmap::{Bitmap, BitmapOptions};
pub use config::{BitmapConfig, DEFAULT_SCRATCH_KEY};
pub use ops::BitmapOps;
