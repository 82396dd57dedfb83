//! In-process reference store: an implementation of the `Connection` trait
//! that keeps every value in a hash map.

use std::collections::HashMap;

use async_trait::async_trait;
use bitkv_common::{Result, error::Error};
use tokio::sync::Mutex;

use crate::{BitOp, Command, Connection, Reply, ReplyMode};

/// Largest bit offset accepted by `SETBIT`/`GETBIT` (values are capped at 512 MiB).
pub const MAX_BIT_OFFSET: u64 = (1 << 32) - 1;

/// An in-memory key-value store with bitmap command semantics.
///
/// Bits are addressed big-endian within each byte: offset `n` lives in byte
/// `n / 8` under mask `0x80 >> (n % 8)`. Writes past the end of a value
/// zero-extend it, and `BITOP` treats shorter or absent sources as
/// zero-padded to the longest source.
///
/// A batch is applied to a snapshot of the data under a single lock and
/// committed only if every command succeeds, so batches are all-or-nothing
/// and serialized against every other command.
pub struct MemoryStore {
    data: Mutex<HashMap<String, Vec<u8>>>,
    reply_mode: ReplyMode,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::with_reply_mode(ReplyMode::Buffers)
    }

    /// Creates a store whose bulk replies are delivered in `reply_mode`.
    /// [`ReplyMode::Text`] mimics a misconfigured client connection.
    pub fn with_reply_mode(reply_mode: ReplyMode) -> MemoryStore {
        MemoryStore {
            data: Mutex::new(HashMap::new()),
            reply_mode,
        }
    }

    pub async fn contains_key(&self, key: &str) -> bool {
        self.data.lock().await.contains_key(key)
    }

    /// Returns all keys currently present, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn apply(&self, data: &mut HashMap<String, Vec<u8>>, command: &Command) -> Result<Reply> {
        match command {
            Command::SetBit { key, offset, value } => {
                check_offset(command, *offset)?;
                let value_bytes = data.entry(key.clone()).or_default();
                let (byte, mask) = bit_location(*offset);
                if byte >= value_bytes.len() {
                    value_bytes.resize(byte + 1, 0);
                }
                let prior = value_bytes[byte] & mask != 0;
                if *value {
                    value_bytes[byte] |= mask;
                } else {
                    value_bytes[byte] &= !mask;
                }
                Ok(Reply::Integer(prior as i64))
            }
            Command::GetBit { key, offset } => {
                check_offset(command, *offset)?;
                let (byte, mask) = bit_location(*offset);
                let bit = data
                    .get(key)
                    .and_then(|bytes| bytes.get(byte))
                    .is_some_and(|b| b & mask != 0);
                Ok(Reply::Integer(bit as i64))
            }
            Command::Get { key } => Ok(match data.get(key) {
                None => Reply::Nil,
                Some(bytes) => match self.reply_mode {
                    ReplyMode::Buffers => Reply::Bulk(bytes.clone()),
                    ReplyMode::Text => Reply::Text(String::from_utf8_lossy(bytes).into_owned()),
                },
            }),
            Command::BitOp {
                op,
                destination,
                sources,
            } => {
                op.verify_arity(sources.len())
                    .map_err(|e| Error::command_rejected(command.name(), e.to_string()))?;
                let operands: Vec<&[u8]> = sources
                    .iter()
                    .map(|key| data.get(key).map(Vec::as_slice).unwrap_or_default())
                    .collect();
                let result = reduce(*op, &operands);
                let len = result.len();
                if result.is_empty() {
                    data.remove(destination);
                } else {
                    data.insert(destination.clone(), result);
                }
                Ok(Reply::Integer(len as i64))
            }
            Command::BitCount { key, range } => {
                let bytes = data.get(key).map(Vec::as_slice).unwrap_or_default();
                let bytes = match range {
                    None => bytes,
                    Some((start, end)) => byte_range(bytes, *start, *end),
                };
                Ok(Reply::Integer(count_ones(bytes) as i64))
            }
            Command::Del { keys } => {
                if keys.is_empty() {
                    return Err(Error::command_rejected(
                        command.name(),
                        "wrong number of arguments",
                    ));
                }
                let removed = keys.iter().filter(|key| data.remove(*key).is_some()).count();
                Ok(Reply::Integer(removed as i64))
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

#[async_trait]
impl Connection for MemoryStore {
    fn reply_mode(&self) -> ReplyMode {
        self.reply_mode
    }

    async fn execute(&self, command: Command) -> Result<Reply> {
        let mut data = self.data.lock().await;
        self.apply(&mut data, &command)
    }

    async fn exec_batch(&self, commands: Vec<Command>) -> Result<Vec<Reply>> {
        let mut data = self.data.lock().await;
        let mut snapshot = data.clone();
        let replies = commands
            .iter()
            .map(|command| self.apply(&mut snapshot, command))
            .collect::<Result<Vec<_>>>()?;
        *data = snapshot;
        Ok(replies)
    }
}

fn check_offset(command: &Command, offset: u64) -> Result<()> {
    if offset > MAX_BIT_OFFSET {
        return Err(Error::command_rejected(
            command.name(),
            "bit offset is not an integer or out of range",
        ));
    }
    Ok(())
}

fn bit_location(offset: u64) -> (usize, u8) {
    ((offset / 8) as usize, 0x80u8 >> (offset % 8))
}

/// Reduces `operands` byte by byte, zero-padding every operand to the longest.
fn reduce(op: BitOp, operands: &[&[u8]]) -> Vec<u8> {
    let len = operands.iter().map(|o| o.len()).max().unwrap_or(0);
    let byte_at = |operand: &[u8], i: usize| operand.get(i).copied().unwrap_or(0);
    (0..len)
        .map(|i| {
            let mut bytes = operands.iter().map(|operand| byte_at(operand, i));
            match op {
                BitOp::And => bytes.fold(0xFF, |acc, b| acc & b),
                BitOp::Or => bytes.fold(0, |acc, b| acc | b),
                BitOp::Xor => bytes.fold(0, |acc, b| acc ^ b),
                BitOp::Not => !bytes.next().unwrap_or(0),
            }
        })
        .collect()
}

/// Population count of a value. A value holding every offset up to
/// [`MAX_BIT_OFFSET`] has 2^32 set bits, so the total is kept as `u64`.
fn count_ones(bytes: &[u8]) -> u64 {
    bytes.iter().map(|b| u64::from(b.count_ones())).sum()
}

/// Resolves an inclusive byte range where negative indices count from the end.
fn byte_range(bytes: &[u8], start: i64, end: i64) -> &[u8] {
    let len = bytes.len() as i64;
    if len == 0 {
        return bytes;
    }
    let resolve = |index: i64| if index < 0 { (len + index).max(0) } else { index };
    let start = resolve(start);
    let end = resolve(end).min(len - 1);
    if start > end {
        return &[];
    }
    &bytes[start as usize..=end as usize]
}
