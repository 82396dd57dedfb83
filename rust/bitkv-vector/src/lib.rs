//! In-memory bit vectors as returned by the key-value store.
//!
//! A [`BitVector`] is decoded from the raw byte buffer a store returns for a
//! bitmap key: every byte expands to eight bits, most significant bit first,
//! so that index `n` matches the store's own bit offset `n`.
//!
//! The [`algebra`] module provides pure AND/OR/XOR/NOT over bit sequences of
//! unequal length (shorter operands are zero-extended), and [`popcount`]
//! holds the population-count helpers used by both the buffer-backed and the
//! plain-sequence paths.

pub mod algebra;
pub mod bit_vector;
pub mod popcount;

pub use bit_vector::BitVector;
