//! # Parameter Smoother
//!
//! A host moves a knob in steps: 240 ms, then 250 ms, then 260 ms. If the
//! delay engine jumped its read head by hundreds of samples at each step,
//! every jump would be an audible click. The smoother turns those steps
//! into a continuous glide by running the target value through a
//! single-pole lowpass filter at audio rate.
//!
//! ## The Filter Equation
//!
//! ```text
//! z[n] = b * target + a * z[n-1]      with  b = 1 - a
//! ```
//!
//! Each output is a convex blend of the new target and the previous
//! output, so `z` can never leave the range of targets it has seen.
//!
//! ## Computing the Coefficient from a Time Constant
//!
//! ```text
//! a = e^(-2π / (time_constant_seconds * sample_rate))
//! ```
//!
//! This is the same exponential mapping a one-pole lowpass uses for a
//! cutoff frequency, with the cutoff set to `1 / time_constant`.

use std::f64::consts::TAU;

use crate::error::DelayError;

/// One-pole lowpass used to de-zipper a control value.
///
/// `process()` must be called exactly once per sample. Calling it twice
/// with the same target shortens the effective time constant.
///
/// State and coefficients are `f64`. Delay lengths run to hundreds of
/// thousands of samples, and an `f32` accumulator stalls several samples
/// short of such targets once `(target - z) * b` drops below half an ulp.
#[derive(Debug, Clone)]
pub struct ParameterSmoother {
    /// Feedback coefficient, weight of the previous output.
    a: f64,
    /// Input coefficient, always `1 - a`.
    b: f64,
    /// Last smoothed output.
    z: f64,
}

impl ParameterSmoother {
    /// Create a smoother with the accumulator at zero.
    ///
    /// Fails if either argument is non-positive or not finite, since the
    /// exponent would be undefined and the filter would produce NaN.
    pub fn new(time_constant_ms: f32, sample_rate: f32) -> Result<Self, DelayError> {
        let (a, b) = coefficients(time_constant_ms, sample_rate)?;
        Ok(Self { a, b, z: 0.0 })
    }

    /// Recompute the coefficients for a new sample rate.
    ///
    /// The accumulator is left untouched so the smoothed value does not
    /// jump when the host changes rate. On error the smoother is unchanged.
    pub fn set_sample_rate(
        &mut self,
        time_constant_ms: f32,
        sample_rate: f32,
    ) -> Result<(), DelayError> {
        let (a, b) = coefficients(time_constant_ms, sample_rate)?;
        self.a = a;
        self.b = b;
        Ok(())
    }

    /// Advance the filter by one sample towards `target`.
    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.z = f64::from(target) * self.b + self.z * self.a;
        self.z as f32
    }

    /// The last smoothed value.
    #[inline]
    pub fn current(&self) -> f32 {
        self.z as f32
    }

    /// Snap the accumulator to `value`.
    pub fn reset(&mut self, value: f32) {
        self.z = f64::from(value);
    }
}

fn coefficients(time_constant_ms: f32, sample_rate: f32) -> Result<(f64, f64), DelayError> {
    if !(time_constant_ms.is_finite() && time_constant_ms > 0.0) {
        return Err(DelayError::InvalidTimeConstant(time_constant_ms));
    }
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(DelayError::InvalidSampleRate(sample_rate));
    }

    let samples = f64::from(time_constant_ms) * 0.001 * f64::from(sample_rate);
    let a = (-TAU / samples).exp();
    Ok((a, 1.0 - a))
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
