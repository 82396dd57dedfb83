//! Population count helpers.
//!
//! Two counting paths exist: [`popcount_buffer`] works directly on the raw
//! store buffer, four bytes at a time, and [`popcount_sequence`] scans an
//! unpacked bit sequence. Both must agree for any buffer and its decoded form.

/// Counts the set bits of a 32-bit word using the classic SWAR reduction
/// (pairs, nibbles, then a multiply to sum the byte counts).
#[inline]
pub fn popcount32(word: u32) -> u32 {
    let mut v = word;
    v -= (v >> 1) & 0x5555_5555;
    v = (v & 0x3333_3333) + ((v >> 2) & 0x3333_3333);
    (((v + (v >> 4)) & 0x0F0F_0F0F).wrapping_mul(0x0101_0101)) >> 24
}

/// Counts the set bits of a byte buffer.
///
/// The buffer is consumed in quartets, each reassembled into a little-endian
/// `u32` (`b0 | b1 << 8 | b2 << 16 | b3 << 24`). A trailing partial quartet is
/// zero-padded.
pub fn popcount_buffer(buffer: &[u8]) -> u64 {
    buffer
        .chunks(4)
        .map(|chunk| {
            let mut quartet = [0u8; 4];
            quartet[..chunk.len()].copy_from_slice(chunk);
            popcount32(u32::from_le_bytes(quartet)) as u64
        })
        .sum()
}

/// Counts the set entries of an unpacked bit sequence.
pub fn popcount_sequence(bits: &[bool]) -> u64 {
    bits.iter().filter(|&&bit| bit).count() as u64
}

#[cfg(test)]
mod tests {
    use bitkv_testkit::data_gen::random_words;

    use super::{popcount32, popcount_buffer, popcount_sequence};

    #[test]
    fn test_popcount32_small_values() {
        assert_eq!(popcount32(0), 0);
        assert_eq!(popcount32(128), 1);
        assert_eq!(popcount32(144), 2);
        assert_eq!(popcount32(0xFF), 8);
        assert_eq!(popcount32(u32::MAX), 32);
        assert_eq!(popcount32(0x8000_0001), 2);
    }

    #[test]
    fn test_popcount32_matches_count_ones() {
        for word in random_words(0x9E37_79B9, 100_000) {
            assert_eq!(popcount32(word), word.count_ones());
        }
        for word in (0..=u32::MAX).step_by(65_521) {
            assert_eq!(popcount32(word), word.count_ones());
        }
    }

    #[test]
    fn test_popcount_buffer_partial_quartet() {
        assert_eq!(popcount_buffer(&[]), 0);
        assert_eq!(popcount_buffer(&[128, 144]), 3);
        assert_eq!(popcount_buffer(&[0xFF, 0xFF, 0xFF, 0xFF, 0x01]), 33);
        assert_eq!(popcount_buffer(&[0, 0, 0, 0, 0, 0, 0x0F]), 4);
    }

    #[test]
    fn test_popcount_sequence() {
        assert_eq!(popcount_sequence(&[]), 0);
        assert_eq!(popcount_sequence(&[true, false, true, true]), 3);
    }
}
