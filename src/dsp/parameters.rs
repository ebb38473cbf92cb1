//! # Shared Delay Parameters
//!
//! The control thread (host automation, preset loads) and the audio thread
//! both touch the delay settings. Neither may wait for the other, so every
//! field is a single `AtomicF32` written with one relaxed store.
//!
//! There is no ordering between fields. The audio thread may see a new
//! feedback value together with last sample's mix value, or a delay length
//! computed from the old sample rate for one sample. That staleness is
//! tolerated: the delay length goes through the engine's smoother, and
//! the gains are bounded fractions, so the worst case is a one-sample
//! blend of old and new settings. A field is never observed half-written.

use std::sync::atomic::Ordering;

use atomic_float::AtomicF32;

/// Default delay time in milliseconds.
pub const DEFAULT_DELAY_MS: f32 = 240.0;
/// Default feedback in percent.
pub const DEFAULT_FEEDBACK_PERCENT: f32 = 20.0;
/// Default dry/wet control value in percent (`-100..=100`).
pub const DEFAULT_MIX_PERCENT: f32 = 0.0;

/// Parameters written by the control path and read by the audio path.
#[derive(Debug)]
pub struct DelayParameters {
    delay_ms: AtomicF32,
    /// Raw (unsmoothed) target delay in samples.
    delay_len_samples: AtomicF32,
    feedback: AtomicF32,
    dry_wet_mix: AtomicF32,
    /// Zero until the engine has been activated.
    sample_rate: AtomicF32,
}

impl Default for DelayParameters {
    fn default() -> Self {
        let params = Self {
            delay_ms: AtomicF32::new(0.0),
            delay_len_samples: AtomicF32::new(0.0),
            feedback: AtomicF32::new(0.0),
            dry_wet_mix: AtomicF32::new(0.0),
            sample_rate: AtomicF32::new(0.0),
        };
        params.set_delay_ms(DEFAULT_DELAY_MS);
        params.set_feedback_percent(DEFAULT_FEEDBACK_PERCENT);
        params.set_mix_percent(DEFAULT_MIX_PERCENT);
        params
    }
}

impl DelayParameters {
    /// Set the delay time and recompute its length in samples at the
    /// current sample rate. Non-finite values are ignored and negative
    /// ones clamp to 0.
    pub fn set_delay_ms(&self, ms: f32) {
        if !ms.is_finite() {
            return;
        }
        self.delay_ms.store(ms.max(0.0), Ordering::Relaxed);
        self.update_delay_len();
    }

    /// `feedback = percent / 100`.
    pub fn set_feedback_percent(&self, percent: f32) {
        self.set_feedback(percent / 100.0);
    }

    /// Map the `-100..=100` mix control to a dry/wet fraction.
    ///
    /// The divisor is 201, not 200, so +100 gives 200/201 rather than a
    /// fully wet 1.0. Presets saved against this mapping depend on it.
    pub fn set_mix_percent(&self, percent: f32) {
        self.set_dry_wet_mix((percent + 100.0) / 201.0);
    }

    /// Set the feedback fraction directly, clamped to `[0, 1]`. NaN is
    /// ignored.
    pub fn set_feedback(&self, fraction: f32) {
        if fraction.is_nan() {
            return;
        }
        self.feedback.store(fraction.clamp(0.0, 1.0), Ordering::Relaxed);
    }

    /// Set the dry/wet fraction directly, clamped to `[0, 1]`.
    /// 0 is fully dry, 1 is fully wet. NaN is ignored.
    pub fn set_dry_wet_mix(&self, fraction: f32) {
        if fraction.is_nan() {
            return;
        }
        self.dry_wet_mix.store(fraction.clamp(0.0, 1.0), Ordering::Relaxed);
    }

    /// Called by the engine on activation so the stored delay time is
    /// re-expressed in samples at the new rate.
    pub(crate) fn set_sample_rate(&self, sample_rate: f32) {
        self.sample_rate.store(sample_rate, Ordering::Relaxed);
        self.update_delay_len();
    }

    fn update_delay_len(&self) {
        let ms = self.delay_ms.load(Ordering::Relaxed);
        let rate = self.sample_rate.load(Ordering::Relaxed);
        self.delay_len_samples.store(ms / 1000.0 * rate, Ordering::Relaxed);
    }

    pub fn delay_ms(&self) -> f32 {
        self.delay_ms.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn delay_len_samples(&self) -> f32 {
        self.delay_len_samples.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dry_wet_mix(&self) -> f32 {
        self.dry_wet_mix.load(Ordering::Relaxed)
    }
}
