use keyhole_core::short_key::ALPHABET;
use keyhole_core::ShortKey;

/// Produces candidate short keys.
///
/// Implementations are pure generators that don't interact with storage.
/// Candidates are not unique by construction; the replenisher checks each
/// one against the store before it reaches the pool.
pub trait KeyGenerator: Send + Sync + 'static {
    /// Generates a candidate of exactly `size` characters.
    ///
    /// `size` must be in `1..=32`.
    fn generate(&self, size: usize) -> ShortKey;
}

/// Draws every character uniformly, with replacement, from [`ALPHABET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl RandomKeyGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self, size: usize) -> ShortKey {
        let key: String = (0..size)
            .map(|_| ALPHABET[rand::random_range(0..ALPHABET.len())] as char)
            .collect();
        ShortKey::new_unchecked(key)
    }
}
