//! An ordered sequence of bits, optionally backed by the raw store buffer.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

use crate::{algebra, popcount};

/// An ordered sequence of bits, where index 0 is the first bit of the first
/// byte the store returned.
///
/// # Layout
///
/// When decoded from a store buffer, each byte expands to eight bits, most
/// significant bit first:
///
/// ```text
/// buffer: [0x80, 0x90]
/// bits:   1 0 0 0 0 0 0 0 | 1 0 0 1 0 0 0 0
/// ```
///
/// so `bits.len() == buffer.len() * 8` for buffer-backed vectors. Vectors built
/// from algebra results or with [`BitVector::from_bits`] have no buffer and are
/// not necessarily octet-aligned.
///
/// Equality compares the bit sequences only; the backing buffer is ignored.
#[derive(Debug, Clone, Default)]
pub struct BitVector {
    bits: Vec<bool>,
    buffer: Option<Vec<u8>>,
}

impl BitVector {
    /// Decodes a raw store buffer. An empty buffer yields an empty vector.
    pub fn decode(buffer: impl Into<Vec<u8>>) -> BitVector {
        let buffer = buffer.into();
        let bits = buffer
            .iter()
            .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1))
            .collect();
        BitVector {
            bits,
            buffer: Some(buffer),
        }
    }

    /// Wraps a plain bit sequence.
    pub fn from_bits(bits: Vec<bool>) -> BitVector {
        BitVector { bits, buffer: None }
    }

    /// Builds a vector with the given positions set. The length is one past
    /// the highest position.
    pub fn from_positions(positions: impl IntoIterator<Item = usize>) -> BitVector {
        let mut vector = BitVector::default();
        for position in positions {
            vector.set(position, true);
        }
        vector
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The bit sequence in store order.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn into_bits(self) -> Vec<bool> {
        self.bits
    }

    /// The raw buffer this vector was decoded from, if any.
    pub fn buffer(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }

    /// Reads bit `index`; positions past the end read as `false`.
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// Sets bit `index` in place, zero-extending the vector if needed.
    ///
    /// This is a local change only, nothing is written to the store. A
    /// buffer-backed vector grows by whole bytes and keeps its buffer in sync.
    ///
    /// # Panics
    ///
    /// Panics if `index` is `usize::MAX`, since the vector would need more
    /// than `usize::MAX` entries.
    pub fn set(&mut self, index: usize, value: bool) {
        assert!(index < usize::MAX, "bit index {index} out of range");
        match &mut self.buffer {
            Some(buffer) => {
                let byte = index / 8;
                if byte >= buffer.len() {
                    buffer.resize(byte + 1, 0);
                    self.bits.resize(buffer.len() * 8, false);
                }
                let mask = 0x80u8 >> (index % 8);
                if value {
                    buffer[byte] |= mask;
                } else {
                    buffer[byte] &= !mask;
                }
            }
            None => {
                if index >= self.bits.len() {
                    self.bits.resize(index + 1, false);
                }
            }
        }
        self.bits[index] = value;
    }

    /// Population count. Buffer-backed vectors are counted on the raw buffer.
    pub fn count(&self) -> u64 {
        match &self.buffer {
            Some(buffer) => popcount::popcount_buffer(buffer),
            None => popcount::popcount_sequence(&self.bits),
        }
    }

    /// Iterates the indices of the set bits in ascending order.
    pub fn positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(index, &bit)| bit.then_some(index))
    }

    /// Packs the bits into the store's byte layout, zero-padding the last byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        if let Some(buffer) = &self.buffer {
            return buffer.clone();
        }
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |byte, (i, &bit)| if bit { byte | (0x80 >> i) } else { byte })
            })
            .collect()
    }

    /// Textual form of the vector: the stored order reversed, so the last bit
    /// is printed first. This is a display transform only and does not parse
    /// back to the same vector.
    pub fn to_binary_string(&self) -> String {
        self.bits
            .iter()
            .rev()
            .map(|&bit| if bit { '1' } else { '0' })
            .collect()
    }
}

impl PartialEq for BitVector {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl Eq for BitVector {}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_binary_string())
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        BitVector::from_bits(iter.into_iter().collect())
    }
}

impl From<Vec<bool>> for BitVector {
    fn from(bits: Vec<bool>) -> Self {
        BitVector::from_bits(bits)
    }
}

impl BitAnd<&BitVector> for &BitVector {
    type Output = BitVector;

    fn bitand(self, rhs: &BitVector) -> BitVector {
        BitVector::from_bits(algebra::and(&[self.bits.as_slice(), rhs.bits.as_slice()]))
    }
}

impl BitOr<&BitVector> for &BitVector {
    type Output = BitVector;

    fn bitor(self, rhs: &BitVector) -> BitVector {
        BitVector::from_bits(algebra::or(&[self.bits.as_slice(), rhs.bits.as_slice()]))
    }
}

impl BitXor<&BitVector> for &BitVector {
    type Output = BitVector;

    fn bitxor(self, rhs: &BitVector) -> BitVector {
        BitVector::from_bits(algebra::xor(&self.bits, &rhs.bits))
    }
}

impl Not for &BitVector {
    type Output = BitVector;

    fn not(self) -> BitVector {
        BitVector::from_bits(algebra::not(&self.bits))
    }
}
