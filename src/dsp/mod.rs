//! # DSP core
//!
//! - **`smoother`**: one-pole lowpass that de-zippers the delay length.
//! - **`delay_buffer`**: ring buffer with a single write cursor.
//! - **`parameters`**: lock-free settings shared with the control thread.
//! - **`engine`**: the per-sample read / mix / feedback / write loop.

pub mod delay_buffer;
pub mod engine;
pub mod parameters;
pub mod smoother;
