//! Typed mapping from logical bitmap operations onto store commands.

use std::sync::Arc;

use bitkv_common::{Result, error::Error, verify_arg, verify_data};

use crate::{BitOp, Command, Connection, Reply, ReplyMode};

/// Maps logical operations (set a bit, read a vector, reduce, count, delete)
/// onto the commands of a [`Connection`] and converts the replies back into
/// raw buffers and integers.
///
/// A `StoreAdapter` can only be created over a connection operating in
/// [`ReplyMode::Buffers`]; see [`StoreAdapter::new`].
#[derive(Clone)]
pub struct StoreAdapter {
    connection: Arc<dyn Connection>,
}

impl StoreAdapter {
    /// Creates an adapter over `connection`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the connection decodes bulk replies
    /// into text. Bit vectors are arbitrary byte patterns and would be
    /// corrupted by text decoding.
    pub fn new(connection: Arc<dyn Connection>) -> Result<StoreAdapter> {
        let mode = connection.reply_mode();
        if mode != ReplyMode::Buffers {
            log::warn!("rejecting store connection in {mode:?} reply mode");
            return Err(Error::configuration(format!(
                "store connection must return raw buffers for bulk replies, \
                 but operates in {mode:?} mode"
            )));
        }
        Ok(StoreAdapter { connection })
    }

    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// Sets or clears the bit at `offset` and returns its previous value.
    pub async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<bool> {
        self.connection
            .execute(Command::SetBit {
                key: key.to_string(),
                offset,
                value,
            })
            .await?
            .into_bit("SETBIT")
    }

    pub async fn get_bit(&self, key: &str, offset: u64) -> Result<bool> {
        self.connection
            .execute(Command::GetBit {
                key: key.to_string(),
                offset,
            })
            .await?
            .into_bit("GETBIT")
    }

    /// Reads the raw value of `key`. An absent key yields an empty buffer.
    pub async fn get_raw(&self, key: &str) -> Result<Vec<u8>> {
        self.connection
            .execute(Command::Get {
                key: key.to_string(),
            })
            .await?
            .into_buffer("GET")
    }

    /// Reads several keys in one round trip, one buffer per key in input order.
    pub async fn get_raw_many(&self, keys: &[&str]) -> Result<Vec<Vec<u8>>> {
        verify_arg!(keys, !keys.is_empty());
        let mut batch = self.batch();
        for key in keys {
            batch.get(key);
        }
        batch
            .exec()
            .await?
            .into_iter()
            .map(|reply| reply.into_buffer("GET"))
            .collect()
    }

    /// Stores the `op` reduction of `sources` at `destination` and returns the
    /// byte length of the result.
    pub async fn bitop_into(&self, op: BitOp, destination: &str, sources: &[&str]) -> Result<u64> {
        op.verify_arity(sources.len())?;
        self.connection
            .execute(Command::BitOp {
                op,
                destination: destination.to_string(),
                sources: to_owned_keys(sources),
            })
            .await?
            .into_count("BITOP")
    }

    /// Population count of a single key. Counting several keys together is a
    /// derived operation and lives in the bitmap facade.
    pub async fn count(&self, key: &str) -> Result<u64> {
        self.connection
            .execute(Command::BitCount {
                key: key.to_string(),
                range: None,
            })
            .await?
            .into_count("BITCOUNT")
    }

    /// Population count over the byte range `start..=end` of `key`. Negative
    /// indices count from the end of the value.
    pub async fn count_range(&self, key: &str, start: i64, end: i64) -> Result<u64> {
        self.connection
            .execute(Command::BitCount {
                key: key.to_string(),
                range: Some((start, end)),
            })
            .await?
            .into_count("BITCOUNT")
    }

    /// Deletes `keys` and returns how many existed.
    pub async fn delete(&self, keys: &[&str]) -> Result<u64> {
        verify_arg!(keys, !keys.is_empty());
        self.connection
            .execute(Command::Del {
                keys: to_owned_keys(keys),
            })
            .await?
            .into_count("DEL")
    }

    /// Starts an empty batch on this adapter's connection.
    pub fn batch(&self) -> Batch {
        Batch {
            connection: self.connection.clone(),
            commands: Vec::new(),
        }
    }
}

/// A queue of commands submitted to the store as one atomic transaction.
pub struct Batch {
    connection: Arc<dyn Connection>,
    commands: Vec<Command>,
}

impl Batch {
    pub fn push(&mut self, command: Command) -> &mut Self {
        log::trace!("queued {command}");
        self.commands.push(command);
        self
    }

    pub fn set_bit(&mut self, key: &str, offset: u64, value: bool) -> &mut Self {
        self.push(Command::SetBit {
            key: key.to_string(),
            offset,
            value,
        })
    }

    pub fn get(&mut self, key: &str) -> &mut Self {
        self.push(Command::Get {
            key: key.to_string(),
        })
    }

    pub fn bitop(&mut self, op: BitOp, destination: &str, sources: &[&str]) -> &mut Self {
        self.push(Command::BitOp {
            op,
            destination: destination.to_string(),
            sources: to_owned_keys(sources),
        })
    }

    pub fn bit_count(&mut self, key: &str) -> &mut Self {
        self.push(Command::BitCount {
            key: key.to_string(),
            range: None,
        })
    }

    pub fn delete(&mut self, keys: &[&str]) -> &mut Self {
        self.push(Command::Del {
            keys: to_owned_keys(keys),
        })
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Submits the batch as one transaction and returns one reply per queued
    /// command, in order.
    ///
    /// # Errors
    ///
    /// Store errors are returned unchanged. A reply array whose length does not
    /// match the number of queued commands is reported as an unexpected reply.
    pub async fn exec(self) -> Result<Vec<Reply>> {
        let expected = self.commands.len();
        log::debug!("submitting batch of {expected} commands");
        let replies = self.connection.exec_batch(self.commands).await?;
        verify_data!(replies, replies.len() == expected);
        Ok(replies)
    }
}

fn to_owned_keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|key| key.to_string()).collect()
}
