//! Errors raised while configuring the delay core.
//!
//! None of these ever reach the audio stream. They come out of the
//! lifecycle paths (`activate`, smoother construction) so the plugin can
//! log them and fall back to bypass.

use std::collections::TryReserveError;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DelayError {
    #[error("smoothing time constant must be a positive number of ms, got {0}")]
    InvalidTimeConstant(f32),

    #[error("sample rate must be a positive number of Hz, got {0}")]
    InvalidSampleRate(f32),

    #[error("delay buffer capacity is zero samples")]
    ZeroCapacity,

    #[error("failed to allocate a delay buffer of {capacity} samples")]
    Allocation {
        capacity: usize,
        #[source]
        source: TryReserveError,
    },
}
