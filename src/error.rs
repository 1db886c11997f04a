//! Error type for the fallible store operations.

use core::fmt;

/// Why an operation on an encoder handle was refused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncoderError {
    /// Handle is not below the configured capacity.
    OutOfRange,

    /// Handle is in range but `init` has not been called for it.
    Uninitialized,

    /// `min > max` was passed to `try_init`.
    InvertedBounds,
}

impl fmt::Display for EncoderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncoderError::OutOfRange => write!(f, "encoder handle out of range"),
            EncoderError::Uninitialized => write!(f, "encoder handle not initialized"),
            EncoderError::InvertedBounds => write!(f, "encoder min is greater than max"),
        }
    }
}

impl core::error::Error for EncoderError {}

#[cfg(feature = "defmt")]
impl defmt::Format for EncoderError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            EncoderError::OutOfRange => defmt::write!(f, "encoder handle out of range"),
            EncoderError::Uninitialized => defmt::write!(f, "encoder handle not initialized"),
            EncoderError::InvertedBounds => defmt::write!(f, "encoder min > max"),
        }
    }
}
