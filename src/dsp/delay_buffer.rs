//! # Delay Buffer (Ring Buffer)
//!
//! A delay buffer stores audio samples and lets you read them back after a
//! fixed number of samples. Picture a circular tape loop: a write head
//! records onto the tape, and a read head trails it by `lag` positions.
//!
//! ```text
//!            read head            write head
//!                │                    │
//!   ┌───┬───┬───┬▼──┬───┬───┬───┬───┬─▼─┬───┐
//!   │   │   │   │ x │   │   │   │   │   │   │   ← capacity C
//!   └───┴───┴───┴───┴───┴───┴───┴───┴───┴───┘
//!                 ◄──────── lag ────────►
//! ```
//!
//! The read index is `write_pos - lag`. When that goes below zero we add
//! `C` once, which lands back inside `[0, C)` as long as `lag <= C`.
//!
//! The storage is a `Vec<f32>` sized up front during activation. The
//! audio thread only ever indexes into it; reallocation happens on the
//! lifecycle path and drops the old storage on the way.

use crate::error::DelayError;

/// A fixed-capacity circular store of mono samples with one write cursor.
///
/// A capacity of zero is the "unusable" state: allocation either never
/// happened, was released, or failed. Callers check [`is_usable`] before
/// touching samples.
///
/// [`is_usable`]: Self::is_usable
#[derive(Debug, Default)]
pub struct DelayBuffer {
    samples: Vec<f32>,

    /// Index of the next sample to be overwritten.
    write_pos: usize,
}

impl DelayBuffer {
    /// An unallocated (unusable) buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `capacity` zeroed samples and reset the write cursor.
    ///
    /// Any previous storage is released first, so a failed call leaves the
    /// buffer unusable rather than half-initialized.
    pub fn allocate(&mut self, capacity: usize) -> Result<(), DelayError> {
        self.release();

        if capacity == 0 {
            return Err(DelayError::ZeroCapacity);
        }

        let mut samples = Vec::new();
        samples
            .try_reserve_exact(capacity)
            .map_err(|source| DelayError::Allocation { capacity, source })?;
        samples.resize(capacity, 0.0);

        self.samples = samples;
        Ok(())
    }

    /// Free the storage. Safe to call on an unallocated buffer.
    pub fn release(&mut self) {
        self.samples = Vec::new();
        self.write_pos = 0;
    }

    /// Zero every sample and rewind the cursor, keeping the allocation.
    pub fn clear(&mut self) {
        self.samples.fill(0.0);
        self.write_pos = 0;
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn is_usable(&self) -> bool {
        !self.samples.is_empty()
    }

    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Store `sample` at the write cursor and advance it by one, wrapping
    /// to 0 at the end of the buffer.
    ///
    /// Must not be called on an unusable buffer.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        let capacity = self.samples.len();
        nih_plug::nih_debug_assert!(capacity > 0, "write to an unallocated delay buffer");

        self.samples[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos >= capacity {
            self.write_pos = 0;
        }
    }

    /// Read the sample `lag` positions behind the write cursor.
    ///
    /// `lag` must not exceed the capacity. A lag of 0 and a lag of exactly
    /// `capacity` both land on the write cursor, which holds the oldest
    /// sample in the ring.
    #[inline]
    pub fn read_at(&self, lag: usize) -> f32 {
        self.samples[self.index_for(lag)]
    }

    #[inline]
    fn index_for(&self, lag: usize) -> usize {
        nih_plug::nih_debug_assert!(lag <= self.samples.len());

        if lag > self.write_pos {
            self.write_pos + self.samples.len() - lag
        } else {
            self.write_pos - lag
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
