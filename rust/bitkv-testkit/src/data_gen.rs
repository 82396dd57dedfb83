//! Seeded data generation for tests.
//!
//! Every generator takes an explicit seed so that a failing case can be
//! reproduced from the test output.

/// Generates `len` random bytes, as a store would return them for a bitmap key.
pub fn random_buffer(seed: u64, len: usize) -> Vec<u8> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..len).map(|_| rng.u8(..)).collect()
}

/// Generates `len` random 32-bit words.
pub fn random_words(seed: u64, len: usize) -> Vec<u32> {
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..len).map(|_| rng.u32(..)).collect()
}

/// Generates a random bit sequence of `len` entries, where roughly
/// `density` (in `0.0..=1.0`) of them are set.
pub fn random_bits(seed: u64, len: usize, density: f64) -> Vec<bool> {
    assert!((0.0..=1.0).contains(&density));
    let mut rng = fastrand::Rng::with_seed(seed);
    (0..len).map(|_| rng.f64() < density).collect()
}

/// Generates up to `count` distinct bit offsets below `limit`, sorted ascending.
pub fn random_offsets(seed: u64, count: usize, limit: u64) -> Vec<u64> {
    assert_ne!(limit, 0);
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut offsets: Vec<u64> = (0..count).map(|_| rng.u64(0..limit)).collect();
    offsets.sort_unstable();
    offsets.dedup();
    offsets
}
