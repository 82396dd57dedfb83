//! Store commands and replies.

use std::fmt;
use std::str::FromStr;

use bitkv_common::{Result, error::Error};

/// Bitwise reduction verb understood by the store's `BITOP` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitOp {
    And,
    Or,
    Xor,
    Not,
}

impl BitOp {
    pub fn verb(&self) -> &'static str {
        match self {
            BitOp::And => "AND",
            BitOp::Or => "OR",
            BitOp::Xor => "XOR",
            BitOp::Not => "NOT",
        }
    }

    /// Checks the number of source keys: `NOT` takes exactly one, the other
    /// verbs at least one.
    pub fn verify_arity(&self, source_count: usize) -> Result<()> {
        match self {
            BitOp::Not if source_count != 1 => Err(Error::invalid_arg(
                "keys",
                format!("NOT takes exactly one source key, got {source_count}"),
            )),
            _ if source_count == 0 => Err(Error::invalid_arg(
                "keys",
                format!("{} requires at least one source key", self.verb()),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for BitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

impl FromStr for BitOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<BitOp> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(BitOp::And),
            "OR" => Ok(BitOp::Or),
            "XOR" => Ok(BitOp::Xor),
            "NOT" => Ok(BitOp::Not),
            _ => Err(Error::invalid_arg("op", format!("unknown bitwise verb '{s}'"))),
        }
    }
}

/// A single store command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `SETBIT key offset value`: replies with the prior bit as an integer.
    SetBit { key: String, offset: u64, value: bool },
    /// `GETBIT key offset`
    GetBit { key: String, offset: u64 },
    /// `GET key`: replies with the raw value, or nil when absent.
    Get { key: String },
    /// `BITOP verb dest sources...`: replies with the byte length of the result.
    BitOp {
        op: BitOp,
        destination: String,
        sources: Vec<String>,
    },
    /// `BITCOUNT key [start end]`, where the range is in bytes and may be
    /// negative (counted from the end).
    BitCount {
        key: String,
        range: Option<(i64, i64)>,
    },
    /// `DEL keys...`: replies with the number of keys removed.
    Del { keys: Vec<String> },
}

impl Command {
    /// The command name as the store knows it.
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetBit { .. } => "SETBIT",
            Command::GetBit { .. } => "GETBIT",
            Command::Get { .. } => "GET",
            Command::BitOp { .. } => "BITOP",
            Command::BitCount { .. } => "BITCOUNT",
            Command::Del { .. } => "DEL",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetBit { key, offset, value } => {
                write!(f, "SETBIT {key} {offset} {}", u8::from(*value))
            }
            Command::GetBit { key, offset } => write!(f, "GETBIT {key} {offset}"),
            Command::Get { key } => write!(f, "GET {key}"),
            Command::BitOp {
                op,
                destination,
                sources,
            } => write!(f, "BITOP {op} {destination} {}", sources.join(" ")),
            Command::BitCount { key, range: None } => write!(f, "BITCOUNT {key}"),
            Command::BitCount {
                key,
                range: Some((start, end)),
            } => write!(f, "BITCOUNT {key} {start} {end}"),
            Command::Del { keys } => write!(f, "DEL {}", keys.join(" ")),
        }
    }
}

/// A single store reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Nil,
    Integer(i64),
    /// Raw bulk payload.
    Bulk(Vec<u8>),
    /// Bulk payload already decoded to text by the connection.
    Text(String),
}

impl Reply {
    /// Interprets the reply as a raw buffer. Nil maps to an empty buffer.
    ///
    /// A text reply is rejected: the bytes behind it are already lost.
    pub fn into_buffer(self, context: &str) -> Result<Vec<u8>> {
        match self {
            Reply::Bulk(buffer) => Ok(buffer),
            Reply::Nil => Ok(Vec::new()),
            Reply::Text(_) => Err(Error::unexpected_reply(
                context,
                "got a text-decoded bulk reply where a raw buffer was expected",
            )),
            Reply::Integer(value) => Err(Error::unexpected_reply(
                context,
                format!("expected a buffer, got integer {value}"),
            )),
        }
    }

    /// Interprets the reply as an integer. Bulk replies holding ASCII digits
    /// are parsed.
    pub fn into_integer(self, context: &str) -> Result<i64> {
        match self {
            Reply::Integer(value) => Ok(value),
            Reply::Bulk(bytes) => std::str::from_utf8(&bytes)
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or_else(|| {
                    Error::unexpected_reply(context, "bulk reply is not an integer")
                }),
            Reply::Text(text) => text.trim().parse().map_err(|_| {
                Error::unexpected_reply(context, format!("'{text}' is not an integer"))
            }),
            Reply::Nil => Err(Error::unexpected_reply(
                context,
                "expected an integer, got nil",
            )),
        }
    }

    /// Interprets the reply as a non-negative count.
    pub fn into_count(self, context: &str) -> Result<u64> {
        let value = self.into_integer(context)?;
        u64::try_from(value).map_err(|_| {
            Error::unexpected_reply(context, format!("negative count {value}"))
        })
    }

    /// Interprets the reply as a single bit.
    pub fn into_bit(self, context: &str) -> Result<bool> {
        match self.into_integer(context)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::unexpected_reply(
                context,
                format!("expected 0 or 1, got {other}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use bitkv_common::error::ErrorKind;

    use super::{BitOp, Command, Reply};

    #[test]
    fn test_bitop_arity() {
        assert!(BitOp::Not.verify_arity(1).is_ok());
        assert!(BitOp::Not.verify_arity(2).unwrap_err().is_caller_error());
        assert!(BitOp::Not.verify_arity(0).is_err());
        assert!(BitOp::And.verify_arity(0).unwrap_err().is_caller_error());
        assert!(BitOp::Xor.verify_arity(3).is_ok());
    }

    #[test]
    fn test_bitop_parse() {
        assert_eq!("or".parse::<BitOp>().unwrap(), BitOp::Or);
        assert_eq!("XOR".parse::<BitOp>().unwrap(), BitOp::Xor);
        assert!("nand".parse::<BitOp>().is_err());
        assert_eq!(BitOp::Not.to_string(), "NOT");
    }

    #[test]
    fn test_command_display() {
        let cmd = Command::BitOp {
            op: BitOp::And,
            destination: "dest".into(),
            sources: vec!["a".into(), "b".into()],
        };
        assert_eq!(cmd.to_string(), "BITOP AND dest a b");
        assert_eq!(cmd.name(), "BITOP");
        let cmd = Command::SetBit {
            key: "k".into(),
            offset: 7,
            value: true,
        };
        assert_eq!(cmd.to_string(), "SETBIT k 7 1");
    }

    #[test]
    fn test_reply_conversions() {
        assert_eq!(Reply::Nil.into_buffer("get").unwrap(), Vec::<u8>::new());
        assert_eq!(Reply::Bulk(vec![1, 2]).into_buffer("get").unwrap(), vec![1, 2]);
        let err = Reply::Text("x".into()).into_buffer("get").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnexpectedReply { .. }));

        assert_eq!(Reply::Integer(5).into_count("count").unwrap(), 5);
        assert_eq!(Reply::Bulk(b"42".to_vec()).into_count("count").unwrap(), 42);
        assert!(Reply::Integer(-1).into_count("count").is_err());
        assert!(Reply::Nil.into_integer("count").is_err());
        assert!(Reply::Integer(1).into_bit("bit").unwrap());
        assert!(Reply::Integer(2).into_bit("bit").is_err());
    }
}
