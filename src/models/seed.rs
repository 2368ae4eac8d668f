use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::{AppError, AppResult};

/// Number of characters in a seed token
pub const SEED_LEN: usize = 4;

const SEED_RADIX: u32 = 36;

/// Size of the seed space, `36^4`
pub const SEED_SPACE: u64 = 1_679_616;

/// A room seed: four base-36 digits, always stored upper-case.
///
/// The seed doubles as the state of a deterministic random stream. Two parties
/// holding the same seed draw the same movie page, the same movie subset and
/// the same successor seed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Seed(String);

impl Seed {
    /// Validates a client token and canonicalizes it to upper-case
    pub fn parse(token: &str) -> AppResult<Self> {
        if token.len() != SEED_LEN || !token.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::InvalidSeed(format!(
                "'{}' must be exactly {} alphanumeric characters",
                token, SEED_LEN
            )));
        }
        Ok(Self(token.to_ascii_uppercase()))
    }

    /// Builds the seed whose base-36 value is `value`
    pub fn from_value(value: u64) -> AppResult<Self> {
        if value >= SEED_SPACE {
            return Err(AppError::InvalidSeed(format!(
                "{} is outside the seed range [0, {})",
                value, SEED_SPACE
            )));
        }
        Ok(Self(encode_in_range(value)))
    }

    /// Base-36 value of the seed
    pub fn value(&self) -> u64 {
        self.0
            .chars()
            .filter_map(|c| c.to_digit(SEED_RADIX))
            .fold(0, |acc, digit| acc * SEED_RADIX as u64 + digit as u64)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Random stream seeded by this seed's value
    pub fn rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.value())
    }

    /// Next seed in a room's sequence, a pure function of this seed
    pub fn successor(&self) -> Seed {
        let mut rng = self.rng();
        Seed(encode_in_range(rng.gen_range(0..SEED_SPACE)))
    }
}

/// Parses a token into its base-36 value
pub fn decode(token: &str) -> AppResult<u64> {
    Seed::parse(token).map(|seed| seed.value())
}

/// Renders a value in `[0, 36^4)` as a canonical seed token
pub fn encode(value: u64) -> AppResult<String> {
    Seed::from_value(value).map(String::from)
}

/// Derives the seed that follows `token` in a room's sequence
pub fn next_seed(token: &str) -> AppResult<Seed> {
    Seed::parse(token).map(|seed| seed.successor())
}

fn encode_in_range(mut value: u64) -> String {
    let mut digits = [b'0'; SEED_LEN];
    for slot in digits.iter_mut().rev() {
        let digit = (value % SEED_RADIX as u64) as u32;
        // digit < 36, always a valid base-36 digit
        *slot = char::from_digit(digit, SEED_RADIX)
            .map(|c| c.to_ascii_uppercase() as u8)
            .unwrap_or(b'0');
        value /= SEED_RADIX as u64;
    }
    digits.iter().map(|&b| b as char).collect()
}

impl Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Seed {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Seed {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Seed> for String {
    fn from(seed: Seed) -> Self {
        seed.0
    }
}
