//! Deferred, chainable bitmap operations executed as one transaction.

use async_trait::async_trait;
use bitkv_common::{Result, error::Error, verify_arg};
use bitkv_store::{Batch, BitOp, Reply, StoreAdapter};
use bitkv_vector::BitVector;

use crate::ops::BitmapOps;

/// Lifecycle of an [`Aggregator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting chained operations.
    Open,
    /// `exec` has been called; every further call is rejected.
    Finalized,
}

/// The read appended after the chained operations when the session executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// `GET destination`, decoded into a [`BitVector`].
    Get,
    /// `BITCOUNT destination`.
    Count,
}

/// Result of [`Aggregator::exec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateOutput {
    /// The destination read back as a bit vector.
    Bits(BitVector),
    /// The population count of the destination.
    Count(u64),
    /// No reduction or count was chained: the raw replies, one per command.
    Replies(Vec<Reply>),
}

impl AggregateOutput {
    pub fn into_bits(self) -> Result<BitVector> {
        match self {
            AggregateOutput::Bits(bits) => Ok(bits),
            other => Err(Error::unexpected_reply(
                "exec",
                format!("expected a bit vector, got {}", other.describe()),
            )),
        }
    }

    pub fn into_count(self) -> Result<u64> {
        match self {
            AggregateOutput::Count(count) => Ok(count),
            other => Err(Error::unexpected_reply(
                "exec",
                format!("expected a count, got {}", other.describe()),
            )),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            AggregateOutput::Bits(_) => "a bit vector",
            AggregateOutput::Count(_) => "a count",
            AggregateOutput::Replies(_) => "raw replies",
        }
    }
}

/// A chain of store operations submitted as a single transaction.
///
/// Reductions write into the session's destination key (the bitmap's scratch
/// key unless [`crate::Bitmap::aggregate_into`] named another one). After the
/// first reduction the destination becomes the current operand: later
/// reductions take it as their first source, so
///
/// ```text
/// agg.bitop(Or, ["a", "b"])?.bitop(Xor, ["c"])?
/// ```
///
/// queues `BITOP OR dest a b` followed by `BITOP XOR dest dest c`.
///
/// # Result interpretation
///
/// The last of [`Aggregator::bitop`] and [`Aggregator::count`] to be called
/// decides what [`Aggregator::exec`] reads back: a bitop makes it a `GET` of the
/// destination, a count makes it a `BITCOUNT`. Mixing the two in one session
/// is allowed but only the last choice takes effect.
///
/// # Cleanup
///
/// With [`Aggregator::cleanup`], the destination is deleted in the same
/// transaction, right after it has been read, so no other client can observe
/// it.
pub struct Aggregator {
    batch: Option<Batch>,
    destination: String,
    terminal: Option<Terminal>,
    cleanup: bool,
    has_operand: bool,
}

impl Aggregator {
    pub(crate) fn new(adapter: &StoreAdapter, destination: String) -> Aggregator {
        Aggregator {
            batch: Some(adapter.batch()),
            destination,
            terminal: None,
            cleanup: false,
            has_operand: false,
        }
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn state(&self) -> SessionState {
        if self.batch.is_some() {
            SessionState::Open
        } else {
            SessionState::Finalized
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.state() == SessionState::Finalized
    }

    /// The read chosen so far, if any.
    pub fn terminal(&self) -> Option<Terminal> {
        self.terminal
    }

    /// Number of operations queued so far.
    pub fn len(&self) -> usize {
        self.batch.as_ref().map_or(0, Batch::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queues a `SETBIT`.
    pub fn set_bit(&mut self, key: &str, offset: u64, value: bool) -> Result<&mut Self> {
        self.open_batch("set_bit")?.set_bit(key, offset, value);
        Ok(self)
    }

    /// Queues a reduction into the destination and makes `GET` the terminal read.
    ///
    /// Once the destination holds a result from an earlier reduction in this
    /// session it is prepended to `keys`. `NOT` therefore takes either one key
    /// (no earlier reduction) or none (complement the destination).
    pub fn bitop(&mut self, op: BitOp, keys: &[&str]) -> Result<&mut Self> {
        self.open_batch("bitop")?;
        let destination = self.destination.clone();
        let mut sources = Vec::with_capacity(keys.len() + 1);
        if self.has_operand {
            sources.push(destination.as_str());
        }
        sources.extend_from_slice(keys);
        op.verify_arity(sources.len())?;

        self.open_batch("bitop")?.bitop(op, &destination, &sources);
        self.has_operand = true;
        self.terminal = Some(Terminal::Get);
        Ok(self)
    }

    /// Makes `BITCOUNT` of the destination the terminal read.
    pub fn count(&mut self) -> Result<&mut Self> {
        self.open_batch("count")?;
        self.terminal = Some(Terminal::Count);
        Ok(self)
    }

    /// Requests deletion of the destination right after it is read.
    pub fn cleanup(&mut self) -> Result<&mut Self> {
        self.open_batch("cleanup")?;
        self.cleanup = true;
        Ok(self)
    }

    /// Queues a `DEL`.
    pub fn delete(&mut self, keys: &[&str]) -> Result<&mut Self> {
        verify_arg!(keys, !keys.is_empty());
        self.open_batch("delete")?.delete(keys);
        Ok(self)
    }

    /// Submits the session as one transaction and interprets its result.
    ///
    /// The terminal read (and the cleanup `DEL`, if requested) is appended to
    /// the queued operations. The payload is the reply to the terminal read:
    /// the second-to-last reply with cleanup, the last one without.
    ///
    /// The session is finalized even if the submission fails.
    pub async fn exec(&mut self) -> Result<AggregateOutput> {
        let mut batch = self
            .batch
            .take()
            .ok_or_else(|| finalized_error("exec"))?;

        let destination = self.destination.as_str();
        match self.terminal {
            Some(Terminal::Get) => {
                batch.get(destination);
            }
            Some(Terminal::Count) => {
                batch.bit_count(destination);
            }
            None => (),
        }
        if self.cleanup {
            batch.delete(&[destination]);
        }

        let mut replies = batch.exec().await?;
        let Some(terminal) = self.terminal else {
            return Ok(AggregateOutput::Replies(replies));
        };

        let skip_from_end = if self.cleanup { 2 } else { 1 };
        let index = replies.len().checked_sub(skip_from_end).ok_or_else(|| {
            Error::unexpected_reply("exec", "missing reply for the terminal read")
        })?;
        let reply = replies.swap_remove(index);
        match terminal {
            Terminal::Get => Ok(AggregateOutput::Bits(BitVector::decode(
                reply.into_buffer("GET")?,
            ))),
            Terminal::Count => Ok(AggregateOutput::Count(reply.into_count("BITCOUNT")?)),
        }
    }

    fn open_batch(&mut self, method: &str) -> Result<&mut Batch> {
        self.batch.as_mut().ok_or_else(|| finalized_error(method))
    }
}

fn finalized_error(method: &str) -> Error {
    Error::invalid_operation(format!("{method} on a finalized aggregation"))
}

#[async_trait]
impl BitmapOps for Aggregator {
    type SetBitOutput = ();
    type BitopOutput = ();
    type CountOutput = ();

    async fn set_bit(&mut self, key: &str, offset: u64, value: bool) -> Result<()> {
        Aggregator::set_bit(self, key, offset, value).map(|_| ())
    }

    async fn bitop(&mut self, op: BitOp, keys: &[&str]) -> Result<()> {
        Aggregator::bitop(self, op, keys).map(|_| ())
    }

    /// Without keys, counts the destination. With keys, unions them into the
    /// destination first.
    async fn count(&mut self, keys: &[&str]) -> Result<()> {
        if !keys.is_empty() {
            Aggregator::bitop(self, BitOp::Or, keys)?;
        }
        Aggregator::count(self).map(|_| ())
    }
}
