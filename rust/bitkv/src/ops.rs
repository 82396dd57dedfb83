//! The bitwise vocabulary shared by the immediate and the deferred APIs.

use async_trait::async_trait;
use bitkv_common::Result;
use bitkv_store::BitOp;

/// Operations offered both by [`crate::Bitmap`], which runs each call
/// against the store right away, and by [`crate::Aggregator`], which queues
/// the call into its pending transaction.
///
/// The output types tell the two apart: the immediate variant yields the
/// store's answer, the deferred variant yields `()` and delivers its result
/// from [`crate::Aggregator::exec`].
#[async_trait]
pub trait BitmapOps: Send {
    type SetBitOutput: Send;
    type BitopOutput: Send;
    type CountOutput: Send;

    /// Sets or clears one bit of `key`.
    async fn set_bit(&mut self, key: &str, offset: u64, value: bool) -> Result<Self::SetBitOutput>;

    /// Reduces `keys` with `op`.
    async fn bitop(&mut self, op: BitOp, keys: &[&str]) -> Result<Self::BitopOutput>;

    /// Population count of the union of `keys`.
    async fn count(&mut self, keys: &[&str]) -> Result<Self::CountOutput>;
}
