//! *Store adapter*: the contract between the bitmap layer and the remote
//! key-value store holding the bit vectors.
//!
//! The store itself is an external collaborator. This crate models the small
//! command vocabulary the bitmap layer needs ([`command::Command`] and
//! [`command::Reply`]), the [`Connection`] trait a transport implements, and
//! the typed [`adapter::StoreAdapter`] that maps logical operations onto
//! commands and replies back onto raw byte buffers.
//!
//! [`memory_store::MemoryStore`] is an in-process reference implementation
//! with the store's bit-addressing and transaction semantics, used by the
//! test suites.

pub mod adapter;
pub mod command;
pub mod memory_store;

use async_trait::async_trait;

pub use adapter::{Batch, StoreAdapter};
pub use command::{BitOp, Command, Reply};

/// How a connection hands back the payload of bulk replies (`GET` and friends).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Bulk replies are delivered as raw byte buffers. This is the only mode
    /// the bitmap layer accepts.
    Buffers,
    /// Bulk replies are decoded into text by the connection. Arbitrary bit
    /// patterns are not valid UTF-8, so decoding them corrupts the data.
    Text,
}

/// The `Connection` trait represents a live link to the key-value store.
///
/// Implementations must execute single commands atomically and must execute
/// a batch all-or-nothing, as one server-side transaction, returning exactly
/// one reply per command in submission order.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// The reply mode this connection operates in.
    fn reply_mode(&self) -> ReplyMode;

    /// Executes a single command.
    async fn execute(&self, command: Command) -> bitkv_common::Result<Reply>;

    /// Executes `commands` as one atomic transaction.
    ///
    /// If any command fails, none of the batch's effects become visible and
    /// the error is returned.
    async fn exec_batch(&self, commands: Vec<Command>) -> bitkv_common::Result<Vec<Reply>>;
}
