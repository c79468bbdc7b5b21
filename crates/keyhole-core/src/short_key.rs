use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The symbols a short key is drawn from: `[A-Za-z0-9]`.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Key length used when a deployment does not configure one.
pub const DEFAULT_KEY_SIZE: usize = 7;

/// Shortest key accepted.
pub const MIN_KEY_SIZE: usize = 1;
/// Longest key accepted.
pub const MAX_KEY_SIZE: usize = 32;

/// A validated short key identifying a shortened URL.
///
/// Keys are 1-32 ASCII alphanumeric characters. Deployments mint keys of a
/// single fixed size, but the type accepts the whole range so keys minted
/// under an earlier size setting stay resolvable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortKey(String);

impl ShortKey {
    /// Creates a new `ShortKey` after validating the input.
    pub fn new(key: impl Into<String>) -> Result<Self, CoreError> {
        let key = key.into();
        Self::validate(&key)?;
        Ok(Self(key))
    }

    /// Creates a `ShortKey` without validation.
    ///
    /// Use this only for keys produced by trusted internal sources
    /// (e.g. the random generator, which only draws from [`ALPHABET`]).
    pub fn new_unchecked(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the short key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the number of characters in the key.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn validate(key: &str) -> Result<(), CoreError> {
        if key.len() < MIN_KEY_SIZE || key.len() > MAX_KEY_SIZE {
            return Err(CoreError::InvalidShortKey(format!(
                "length must be between {} and {}, got {}",
                MIN_KEY_SIZE,
                MAX_KEY_SIZE,
                key.len()
            )));
        }

        if !key.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(CoreError::InvalidShortKey(format!(
                "must contain only alphanumeric characters: '{}'",
                key
            )));
        }

        Ok(())
    }
}

impl TryFrom<String> for ShortKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortKey> for String {
    fn from(key: ShortKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ShortKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for ShortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
