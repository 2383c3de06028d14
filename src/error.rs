//! Library error type.

/// Errors returned by `FibVec`'s fallible public operations.
///
/// Internal invariant violations (buffer corruption reached through a path
/// `add`/`decode` should have prevented) are not represented here; they
/// surface as a `debug_assert!` in debug builds instead, since they indicate
/// a bug in this crate rather than bad caller input.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FibVecError {
    #[error("value {value} is out of the encodable range (max magnitude {max})")]
    OutOfRange { value: i64, max: i64 },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("invalid range [{start}, {end}) for length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    #[error("failed to deserialize vector: {0}")]
    Deserialize(String),
}
