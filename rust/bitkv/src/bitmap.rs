//! The immediate bitmap API.

use std::sync::Arc;

use async_trait::async_trait;
use bitkv_common::{Result, error::Error, verify_arg};
use bitkv_store::{BitOp, Command, Connection, Reply, StoreAdapter};
use bitkv_vector::BitVector;

use crate::{aggregator::Aggregator, config::BitmapConfig, ops::BitmapOps};

/// Options for opening a [`Bitmap`].
pub struct BitmapOptions {
    connection: Arc<dyn Connection>,
    config: BitmapConfig,
}

impl BitmapOptions {
    /// Creates options over `connection` with the default configuration.
    pub fn new(connection: Arc<dyn Connection>) -> BitmapOptions {
        BitmapOptions {
            connection,
            config: BitmapConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: BitmapConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the scratch key used by derived operations.
    pub fn scratch_key(mut self, scratch_key: impl Into<String>) -> Self {
        self.config.scratch_key = scratch_key.into();
        self
    }

    /// Validates the configuration and the connection's reply mode and opens
    /// the bitmap.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid or the
    /// connection does not deliver raw buffers.
    pub fn open(self) -> Result<Bitmap> {
        self.config.validate()?;
        let adapter = StoreAdapter::new(self.connection)?;
        Ok(Bitmap {
            adapter,
            config: self.config,
        })
    }
}

/// Bit vectors stored under string keys, manipulated one call at a time.
///
/// Plain operations (`set_bit`, `get`, single-key `count`) map onto a single
/// store command. Derived operations (`bitop`, `count_bitop`, multi-key
/// `count`) reduce into the scratch key, read it and delete it, all within
/// one store transaction.
///
/// # Scratch key sharing
///
/// Bitmaps opened with the default configuration share one scratch key.
/// Each derived operation is atomic on its own, but nothing isolates two
/// callers that use the same scratch key through other means (for example
/// an aggregation writing to it). Use [`BitmapOptions::scratch_key`] or
/// [`Bitmap::aggregate_into`] with distinct keys when that matters.
#[derive(Clone)]
pub struct Bitmap {
    adapter: StoreAdapter,
    config: BitmapConfig,
}

impl Bitmap {
    /// Opens a bitmap over `connection` with the default configuration.
    pub fn new(connection: Arc<dyn Connection>) -> Result<Bitmap> {
        BitmapOptions::new(connection).open()
    }

    pub fn config(&self) -> &BitmapConfig {
        &self.config
    }

    pub fn adapter(&self) -> &StoreAdapter {
        &self.adapter
    }

    /// Sets or clears the bit at `offset` of `key`, returning its previous value.
    pub async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<bool> {
        self.adapter.set_bit(key, offset, value).await
    }

    pub async fn get_bit(&self, key: &str, offset: u64) -> Result<bool> {
        self.adapter.get_bit(key, offset).await
    }

    /// Reads `key` as a bit vector. An absent key reads as an empty vector.
    pub async fn get(&self, key: &str) -> Result<BitVector> {
        Ok(BitVector::decode(self.adapter.get_raw(key).await?))
    }

    /// Reads several keys in one round trip, one vector per key in input order.
    pub async fn get_many(&self, keys: &[&str]) -> Result<Vec<BitVector>> {
        verify_arg!(keys, !keys.is_empty());
        Ok(self
            .adapter
            .get_raw_many(keys)
            .await?
            .into_iter()
            .map(BitVector::decode)
            .collect())
    }

    /// Population count of `keys`.
    ///
    /// A single key is counted directly. Several keys are counted as their
    /// union: `OR` into the scratch key, count it and delete it in one
    /// transaction.
    pub async fn count(&self, keys: &[&str]) -> Result<u64> {
        match keys {
            [] => Err(Error::invalid_arg("keys", "at least one key is required")),
            [key] => self.adapter.count(key).await,
            _ => self.count_bitop(BitOp::Or, keys).await,
        }
    }

    /// Population count over the byte range `start..=end` of `key`.
    pub async fn count_range(&self, key: &str, start: i64, end: i64) -> Result<u64> {
        self.adapter.count_range(key, start, end).await
    }

    /// Reduces `keys` with `op` and returns the result as a bit vector.
    ///
    /// # Errors
    ///
    /// `NOT` with anything but one key, or any verb with zero keys, is
    /// rejected before the store is contacted.
    pub async fn bitop(&self, op: BitOp, keys: &[&str]) -> Result<BitVector> {
        let scratch = self.config.scratch_key.clone();
        let reply = self
            .reduce_and_read(op, keys, Command::Get { key: scratch })
            .await?;
        Ok(BitVector::decode(reply.into_buffer("GET")?))
    }

    /// Reduces `keys` with `op` and returns the population count of the result.
    pub async fn count_bitop(&self, op: BitOp, keys: &[&str]) -> Result<u64> {
        let scratch = self.config.scratch_key.clone();
        let reply = self
            .reduce_and_read(
                op,
                keys,
                Command::BitCount {
                    key: scratch,
                    range: None,
                },
            )
            .await?;
        reply.into_count("BITCOUNT")
    }

    /// Stores the `op` reduction of `keys` at `destination` and returns the
    /// byte length of the result. The destination is left in place.
    pub async fn bitop_into(&self, op: BitOp, destination: &str, keys: &[&str]) -> Result<u64> {
        self.adapter.bitop_into(op, destination, keys).await
    }

    /// Deletes `keys`, returning how many existed.
    pub async fn delete(&self, keys: &[&str]) -> Result<u64> {
        self.adapter.delete(keys).await
    }

    /// Starts an aggregation whose destination is the scratch key.
    pub fn aggregate(&self) -> Aggregator {
        Aggregator::new(&self.adapter, self.config.scratch_key.clone())
    }

    /// Starts an aggregation that materializes into `destination`.
    pub fn aggregate_into(&self, destination: impl Into<String>) -> Aggregator {
        Aggregator::new(&self.adapter, destination.into())
    }

    /// Runs `BITOP op scratch keys`, `read`, `DEL scratch` as one transaction
    /// and returns the reply to `read`.
    async fn reduce_and_read(&self, op: BitOp, keys: &[&str], read: Command) -> Result<Reply> {
        op.verify_arity(keys.len())?;
        let scratch = self.config.scratch_key.as_str();
        log::debug!("{op} over {} keys through scratch key '{scratch}'", keys.len());

        let mut batch = self.adapter.batch();
        batch.bitop(op, scratch, keys).push(read).delete(&[scratch]);
        batch.exec().await?.into_iter().nth(1).ok_or_else(|| {
            Error::unexpected_reply("exec", "missing reply for the scratch key read")
        })
    }
}

#[async_trait]
impl BitmapOps for Bitmap {
    type SetBitOutput = bool;
    type BitopOutput = BitVector;
    type CountOutput = u64;

    async fn set_bit(&mut self, key: &str, offset: u64, value: bool) -> Result<bool> {
        Bitmap::set_bit(self, key, offset, value).await
    }

    async fn bitop(&mut self, op: BitOp, keys: &[&str]) -> Result<BitVector> {
        Bitmap::bitop(self, op, keys).await
    }

    async fn count(&mut self, keys: &[&str]) -> Result<u64> {
        Bitmap::count(self, keys).await
    }
}
