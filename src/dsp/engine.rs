//! # Delay Engine
//!
//! Ties the smoother, the ring buffer and the shared parameters together
//! into the per-sample delay algorithm.
//!
//! ```text
//! L ──┬───────────────────────────────── × (1 - mix) ──►(+)──► L out
//!     │                                                  ▲
//!     ├──► (L+R)/2 ──►(+)──► [DelayBuffer] ──┬── × mix ──┤
//!     │                ▲                     │           ▼
//! R ──┴──────────────  │  ─────────────────  │  ─ × (1 - mix) ──►(+)──► R out
//!                      │                     │
//!                      └──── × feedback ◄────┘
//! ```
//!
//! The buffer holds a mono mix of both inputs, so both outputs receive the
//! same wet signal. The dry path stays stereo.
//!
//! ## Lifecycle
//!
//! The engine starts **Inactive** with no storage. `activate()` sizes the
//! buffer for the maximum delay time at the given sample rate and moves it
//! to **Active**. `deactivate()` frees the storage again. Both take
//! `&mut self`, so they can never run concurrently with `process_sample()`.
//!
//! If the buffer could not be allocated the engine is still Active, keeps
//! accepting parameter changes, and passes audio through unchanged.

use std::sync::Arc;

use nih_plug::nih_debug_assert_eq;

use super::delay_buffer::DelayBuffer;
use super::parameters::DelayParameters;
use super::smoother::ParameterSmoother;
use crate::error::DelayError;

/// Longest delay the buffer is sized for, in milliseconds.
pub const MAX_DELAY_MS: f32 = 5000.0;

/// Time constant of the delay-length smoother, in milliseconds.
pub const SMOOTHING_TIME_MS: f32 = 20.0;

/// Fixed settings that shape the engine but are not exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Sizes the delay buffer: `max_delay_ms / 1000 * sample_rate` samples.
    pub max_delay_ms: f32,
    pub smoothing_time_ms: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_delay_ms: MAX_DELAY_MS,
            smoothing_time_ms: SMOOTHING_TIME_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Inactive,
    Active,
}

/// A single-tap stereo delay with mono feedback and a dry/wet blend.
pub struct DelayEngine {
    config: EngineConfig,
    params: Arc<DelayParameters>,
    /// Created on first activation, re-tuned on every later one.
    smoother: Option<ParameterSmoother>,
    buffer: DelayBuffer,
    state: EngineState,
}

impl Default for DelayEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl DelayEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_parameters(config, Arc::new(DelayParameters::default()))
    }

    /// Build an engine around an existing parameter block, e.g. one the
    /// plugin's parameter callbacks already write to.
    pub fn with_parameters(config: EngineConfig, params: Arc<DelayParameters>) -> Self {
        Self {
            config,
            params,
            smoother: None,
            buffer: DelayBuffer::new(),
            state: EngineState::Inactive,
        }
    }

    /// Handle for the control thread. Setters on it take effect on the
    /// next processed sample.
    pub fn parameters(&self) -> Arc<DelayParameters> {
        Arc::clone(&self.params)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether `process_sample()` will actually run the delay rather than
    /// bypass.
    pub fn is_processing(&self) -> bool {
        self.state == EngineState::Active && self.buffer.is_usable()
    }

    pub fn buffer_capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// The delay length the smoother last produced, in samples.
    pub fn smoothed_delay(&self) -> f32 {
        self.smoother.as_ref().map_or(0.0, ParameterSmoother::current)
    }

    /// Prepare for processing at `sample_rate`.
    ///
    /// Also used for sample rate changes: the buffer is reallocated (old
    /// contents are dropped) and the smoother is re-tuned without losing
    /// its current value.
    ///
    /// An invalid sample rate leaves the engine exactly as it was. An
    /// allocation failure leaves it Active but bypassing; the error is
    /// returned so the caller can report it.
    pub fn activate(&mut self, sample_rate: f32) -> Result<(), DelayError> {
        let time_ms = self.config.smoothing_time_ms;
        match self.smoother.as_mut() {
            Some(smoother) => smoother.set_sample_rate(time_ms, sample_rate)?,
            None => self.smoother = Some(ParameterSmoother::new(time_ms, sample_rate)?),
        }

        self.params.set_sample_rate(sample_rate);
        self.state = EngineState::Active;

        let capacity = (self.config.max_delay_ms / 1000.0 * sample_rate) as usize;
        self.buffer.allocate(capacity)
    }

    /// Release the buffer. Calling this while already Inactive is a no-op.
    pub fn deactivate(&mut self) {
        self.buffer.release();
        self.state = EngineState::Inactive;
    }

    /// Silence the buffer without reallocating, e.g. when the transport
    /// restarts. The smoother snaps to the current target so playback
    /// resumes at the set delay instead of gliding towards it.
    pub fn reset(&mut self) {
        self.buffer.clear();
        if let Some(smoother) = self.smoother.as_mut() {
            smoother.reset(self.params.delay_len_samples());
        }
    }

    pub fn set_delay_ms(&self, ms: f32) {
        self.params.set_delay_ms(ms);
    }

    pub fn set_feedback_percent(&self, percent: f32) {
        self.params.set_feedback_percent(percent);
    }

    pub fn set_mix_percent(&self, percent: f32) {
        self.params.set_mix_percent(percent);
    }

    /// Process one stereo frame.
    ///
    /// Reads the wet sample before writing the new one, so a delay of `N`
    /// samples returns what was written `N` calls ago.
    #[inline]
    pub fn process_sample(&mut self, left: f32, right: f32) -> (f32, f32) {
        if !self.is_processing() {
            return (left, right);
        }
        let Some(smoother) = self.smoother.as_mut() else {
            return (left, right);
        };

        let smoothed = smoother.process(self.params.delay_len_samples());
        // `as` saturates negatives and NaN to 0.
        let lag = (smoothed.round() as usize).min(self.buffer.capacity());

        let wet = self.buffer.read_at(lag);

        let mix = self.params.dry_wet_mix();
        let wet_signal = wet * mix;
        let out_left = left * (1.0 - mix) + wet_signal;
        let out_right = right * (1.0 - mix) + wet_signal;

        let feedback = self.params.feedback();
        self.buffer.write((left + right) / 2.0 + wet * feedback);

        (out_left, out_right)
    }

    /// Process a block of stereo audio in place.
    pub fn process_block(&mut self, left: &mut [f32], right: &mut [f32]) {
        nih_debug_assert_eq!(left.len(), right.len());

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.process_sample(*l, *r);
        }
    }

    /// How many samples of output remain after the input goes silent.
    ///
    /// Each echo is `feedback` times the previous one, so after `N` repeats
    /// the level is `feedback^N`. Solving for -60 dB gives
    /// `N = -3 / log10(feedback)`. Returns `None` when the echoes never
    /// decay.
    pub fn tail_length(&self) -> Option<u32> {
        let feedback = self.params.feedback();
        let delay_samples = self.params.delay_len_samples();

        if feedback >= 1.0 {
            None
        } else if feedback > 0.001 {
            let repeats = -3.0 / feedback.log10();
            Some(((repeats + 1.0) * delay_samples) as u32)
        } else {
            Some(delay_samples as u32)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Small buffer so tests stay fast: 100 ms at 1 kHz = 100 samples.
    fn small_engine() -> DelayEngine {
        let mut engine = DelayEngine::new(EngineConfig {
            max_delay_ms: 100.0,
            smoothing_time_ms: 1.0,
        });
        engine.activate(1000.0).unwrap();
        engine
    }

    /// Run silence until the smoother has settled on the target delay.
    fn settle(engine: &mut DelayEngine) {
        for _ in 0..engine.buffer_capacity() * 4 {
            engine.process_sample(0.0, 0.0);
        }
    }

    #[test]
    fn test_starts_inactive_and_bypasses() {
        let mut engine = DelayEngine::default();
        assert_eq!(engine.state(), EngineState::Inactive);
        assert!(!engine.is_processing());
        assert_eq!(engine.process_sample(0.3, -0.7), (0.3, -0.7));
    }

    #[test]
    fn test_activate_sizes_buffer() {
        let mut engine = DelayEngine::default();
        engine.activate(48000.0).unwrap();

        assert_eq!(engine.state(), EngineState::Active);
        assert_eq!(engine.buffer_capacity(), 240_000);
        assert!((engine.parameters().delay_len_samples() - 11520.0).abs() < 1e-2);
    }

    #[test]
    fn test_invalid_sample_rate_leaves_engine_inactive() {
        let mut engine = DelayEngine::default();
        assert!(matches!(
            engine.activate(0.0),
            Err(DelayError::InvalidSampleRate(_))
        ));
        assert_eq!(engine.state(), EngineState::Inactive);
        assert_eq!(engine.buffer_capacity(), 0);
    }

    /// A configuration whose buffer cannot be allocated must degrade to
    /// bypass rather than fail in the audio path.
    #[test]
    fn test_allocation_failure_bypasses() {
        let mut engine = DelayEngine::new(EngineConfig {
            max_delay_ms: f32::MAX,
            smoothing_time_ms: SMOOTHING_TIME_MS,
        });

        let result = engine.activate(48000.0);
        assert!(matches!(result, Err(DelayError::Allocation { .. })));
        assert_eq!(engine.state(), EngineState::Active);
        assert!(!engine.is_processing());

        engine.set_mix_percent(100.0);
        engine.set_feedback_percent(90.0);
        for i in 0..100 {
            let x = i as f32 * 0.01;
            assert_eq!(engine.process_sample(x, -x), (x, -x));
        }
    }

    /// A buffer shorter than one sample is the zero-capacity case.
    #[test]
    fn test_zero_capacity_bypasses() {
        let mut engine = DelayEngine::new(EngineConfig {
            max_delay_ms: 0.1,
            smoothing_time_ms: SMOOTHING_TIME_MS,
        });
        assert!(matches!(
            engine.activate(1000.0),
            Err(DelayError::ZeroCapacity)
        ));
        assert_eq!(engine.process_sample(0.5, 0.25), (0.5, 0.25));
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let mut engine = small_engine();
        engine.deactivate();
        engine.deactivate();

        assert_eq!(engine.state(), EngineState::Inactive);
        assert_eq!(engine.buffer_capacity(), 0);
        assert_eq!(engine.process_sample(1.0, 1.0), (1.0, 1.0));
    }

    /// Fully dry output is the input, whatever the other settings are.
    #[test]
    fn test_fully_dry_is_identity() {
        let mut engine = small_engine();
        engine.set_mix_percent(-100.0);
        engine.set_feedback_percent(100.0);
        engine.set_delay_ms(7.0);

        for i in 0..500 {
            let l = ((i as f32) * 0.37).sin();
            let r = ((i as f32) * 0.11).cos();
            let (out_l, out_r) = engine.process_sample(l, r);
            assert_eq!(out_l, l);
            assert_eq!(out_r, r);
        }
    }

    /// Wet signal is the mono mix of both inputs, delayed.
    #[test]
    fn test_wet_signal_is_mono_sum() {
        let mut engine = small_engine();
        let params = engine.parameters();
        params.set_dry_wet_mix(1.0);
        params.set_feedback(0.0);
        engine.set_delay_ms(10.0); // 10 samples at 1 kHz
        settle(&mut engine);

        engine.process_sample(1.0, 0.0);
        for _ in 0..9 {
            let (l, r) = engine.process_sample(0.0, 0.0);
            assert_eq!((l, r), (0.0, 0.0));
        }
        let (l, r) = engine.process_sample(0.0, 0.0);
        assert!((l - 0.5).abs() < 1e-6, "Expected 0.5 on left, got {l}");
        assert!((r - 0.5).abs() < 1e-6, "Expected 0.5 on right, got {r}");
    }

    /// Each echo is the previous one times the feedback.
    #[test]
    fn test_feedback_echo_train_decays() {
        let mut engine = small_engine();
        let params = engine.parameters();
        params.set_dry_wet_mix(1.0);
        params.set_feedback(0.5);
        engine.set_delay_ms(20.0);
        settle(&mut engine);

        let mut output = Vec::new();
        output.push(engine.process_sample(1.0, 1.0).0);
        for _ in 0..80 {
            output.push(engine.process_sample(0.0, 0.0).0);
        }

        for (tap, expected) in [(20, 1.0), (40, 0.5), (60, 0.25), (80, 0.125)] {
            assert!(
                (output[tap] - expected).abs() < 1e-6,
                "Echo at {tap} should be {expected}, got {}",
                output[tap]
            );
        }
        assert!(output[0].abs() < 1e-6);
        assert!(output[30].abs() < 1e-6);
    }

    /// The smoother glides between delay lengths instead of jumping.
    #[test]
    fn test_delay_change_is_smoothed() {
        let mut engine = small_engine();
        engine.set_delay_ms(10.0);
        settle(&mut engine);
        assert!((engine.smoothed_delay() - 10.0).abs() < 1e-3);

        engine.set_delay_ms(50.0);
        engine.process_sample(0.0, 0.0);
        let first = engine.smoothed_delay();
        assert!(
            first > 10.0 && first < 50.0,
            "First smoothed value should sit between old and new, got {first}"
        );
    }

    /// Reactivating at a new rate keeps the delay time in milliseconds.
    #[test]
    fn test_reactivation_rescales_delay() {
        let mut engine = small_engine();
        engine.set_delay_ms(50.0);
        assert!((engine.parameters().delay_len_samples() - 50.0).abs() < 1e-3);

        engine.activate(2000.0).unwrap();
        assert_eq!(engine.buffer_capacity(), 200);
        assert!((engine.parameters().delay_len_samples() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_reset_silences_buffer() {
        let mut engine = small_engine();
        let params = engine.parameters();
        params.set_dry_wet_mix(1.0);
        params.set_feedback(0.0);
        engine.set_delay_ms(5.0);
        settle(&mut engine);

        engine.process_sample(1.0, 1.0);
        engine.reset();
        for _ in 0..10 {
            let (l, _) = engine.process_sample(0.0, 0.0);
            assert_eq!(l, 0.0, "Reset should drop pending echoes");
        }
    }

    #[test]
    fn test_reset_snaps_smoother_to_target() {
        let mut engine = small_engine();
        engine.set_delay_ms(10.0);
        settle(&mut engine);

        engine.set_delay_ms(60.0);
        engine.reset();
        assert!(
            (engine.smoothed_delay() - 60.0).abs() < 1e-3,
            "Expected the smoother at 60 after reset, got {}",
            engine.smoothed_delay()
        );

        // No glide: the very next sample already uses the new delay.
        engine.process_sample(0.0, 0.0);
        assert!((engine.smoothed_delay() - 60.0).abs() < 1e-3);
    }

    /// A NaN delay from the host is dropped and cannot poison the smoother.
    #[test]
    fn test_non_finite_delay_is_ignored() {
        let mut engine = small_engine();
        engine.set_delay_ms(10.0);
        settle(&mut engine);

        engine.set_delay_ms(f32::NAN);
        engine.set_delay_ms(f32::INFINITY);
        engine.process_sample(0.0, 0.0);
        assert!(engine.smoothed_delay().is_finite());

        engine.set_delay_ms(30.0);
        settle(&mut engine);
        assert!(
            (engine.smoothed_delay() - 30.0).abs() < 1e-3,
            "Smoother should track valid values again, got {}",
            engine.smoothed_delay()
        );
    }

    #[test]
    fn test_process_block_matches_per_sample() {
        let mut a = small_engine();
        let mut b = small_engine();
        for engine in [&a, &b] {
            engine.set_delay_ms(3.0);
            engine.set_feedback_percent(40.0);
            engine.set_mix_percent(20.0);
        }

        let mut left: Vec<f32> = (0..64).map(|i| (i as f32 * 0.2).sin()).collect();
        let mut right: Vec<f32> = (0..64).map(|i| (i as f32 * 0.3).cos()).collect();
        let expected: Vec<(f32, f32)> = left
            .iter()
            .zip(&right)
            .map(|(&l, &r)| b.process_sample(l, r))
            .collect();

        a.process_block(&mut left, &mut right);
        for (i, (l, r)) in expected.into_iter().enumerate() {
            assert_eq!(left[i], l);
            assert_eq!(right[i], r);
        }
    }

    #[test]
    fn test_tail_length() {
        let mut engine = small_engine();
        engine.set_delay_ms(10.0);

        engine.set_feedback_percent(0.0);
        assert_eq!(engine.tail_length(), Some(10));

        engine.set_feedback_percent(10.0);
        // 3 repeats to -60 dB plus the first echo.
        let tail = engine.tail_length().unwrap();
        assert!((39..=40).contains(&tail), "Expected ~40 samples, got {tail}");

        engine.set_feedback_percent(100.0);
        assert_eq!(engine.tail_length(), None);

        engine.deactivate();
        engine.set_feedback_percent(50.0);
        assert!(engine.tail_length().is_some());
    }
}
