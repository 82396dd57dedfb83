//! Static bitwise algebra over unpacked bit sequences.
//!
//! All operators accept operands of unequal length. The output is as long as
//! the longest operand and positions past the end of a shorter operand read
//! as 0. The functions never mutate their inputs.

/// Length of the longest operand, or 0 when there are none.
fn longest(seqs: &[&[bool]]) -> usize {
    seqs.iter().map(|seq| seq.len()).max().unwrap_or(0)
}

#[inline]
fn bit_at(seq: &[bool], index: usize) -> bool {
    seq.get(index).copied().unwrap_or(false)
}

/// Bitwise AND of one or more sequences.
///
/// Bit `i` of the output is set iff every operand has bit `i` set; a shorter
/// operand contributes 0 beyond its length, so e.g.
/// `and([1,1,1], [1,1]) == [1,1,0]`.
///
/// An empty operand list yields an empty sequence.
pub fn and(seqs: &[&[bool]]) -> Vec<bool> {
    if seqs.is_empty() {
        return Vec::new();
    }
    (0..longest(seqs))
        .map(|i| seqs.iter().all(|seq| bit_at(seq, i)))
        .collect()
}

/// Bitwise OR of one or more sequences.
///
/// Bit `i` of the output is set iff any operand has bit `i` set.
pub fn or(seqs: &[&[bool]]) -> Vec<bool> {
    (0..longest(seqs))
        .map(|i| seqs.iter().any(|seq| bit_at(seq, i)))
        .collect()
}

/// Pairwise boolean XOR of exactly two sequences.
pub fn xor(a: &[bool], b: &[bool]) -> Vec<bool> {
    (0..a.len().max(b.len()))
        .map(|i| bit_at(a, i) ^ bit_at(b, i))
        .collect()
}

/// Complement of a sequence over its own length.
pub fn not(seq: &[bool]) -> Vec<bool> {
    seq.iter().map(|&bit| !bit).collect()
}

#[cfg(test)]
mod tests {
    use super::{and, not, or, xor};

    fn bits(values: &[u8]) -> Vec<bool> {
        values.iter().map(|&v| v != 0).collect()
    }

    #[test]
    fn test_single_operand_identity() {
        let a = bits(&[1, 0, 1, 1, 0, 0, 1]);
        assert_eq!(and(&[&a]), a);
        assert_eq!(or(&[&a]), a);
    }

    #[test]
    fn test_and() {
        let (a, b, c) = (bits(&[1, 0, 0]), bits(&[1, 1, 0]), bits(&[1, 0, 1]));
        assert_eq!(and(&[&a, &b, &c]), bits(&[1, 0, 0]));
        assert_eq!(and(&[&bits(&[1, 1, 1]), &bits(&[1, 1])]), bits(&[1, 1, 0]));
        assert_eq!(and(&[&bits(&[1, 1]), &bits(&[1, 1, 1])]), bits(&[1, 1, 0]));
        assert!(and(&[]).is_empty());
    }

    #[test]
    fn test_or() {
        let (a, b, c) = (bits(&[1, 0, 0]), bits(&[0, 1, 0]), bits(&[0, 0, 1]));
        assert_eq!(or(&[&a, &b, &c]), bits(&[1, 1, 1]));
        assert_eq!(or(&[&bits(&[0, 1]), &bits(&[0, 0, 0, 1])]), bits(&[0, 1, 0, 1]));
        assert!(or(&[]).is_empty());
    }

    #[test]
    fn test_xor() {
        assert_eq!(xor(&bits(&[1, 0, 0]), &bits(&[1, 1, 1])), bits(&[0, 1, 1]));
        assert_eq!(xor(&bits(&[1]), &bits(&[1, 0, 1])), bits(&[0, 0, 1]));
        assert_eq!(xor(&[], &[]), Vec::<bool>::new());
    }

    #[test]
    fn test_not() {
        assert_eq!(not(&bits(&[1, 0, 0, 1])), bits(&[0, 1, 1, 0]));
        assert!(not(&[]).is_empty());
    }

    #[test]
    fn test_inputs_untouched() {
        let a = bits(&[1, 0, 1]);
        let b = bits(&[0, 1]);
        let _ = or(&[&a, &b]);
        let _ = xor(&a, &b);
        assert_eq!(a, bits(&[1, 0, 1]));
        assert_eq!(b, bits(&[0, 1]));
    }
}
