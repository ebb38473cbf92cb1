//! # Plugin Parameters
//!
//! The three knobs the host sees. Each has a stable string ID
//! (`#[id = "..."]`) that presets are stored under; never change them.
//!
//! None of these parameters use nih-plug's smoothers. Every change is
//! forwarded through a callback into the engine's lock-free
//! [`DelayParameters`], and the engine smooths the delay length itself.
//! The callbacks only perform atomic stores, so they are safe to run on
//! the audio thread during sample-accurate automation.

use std::sync::Arc;

use nih_plug::prelude::*;

use crate::dsp::engine::MAX_DELAY_MS;
use crate::dsp::parameters::{
    DelayParameters, DEFAULT_DELAY_MS, DEFAULT_FEEDBACK_PERCENT, DEFAULT_MIX_PERCENT,
};

#[derive(Params)]
pub struct SimpleDelayParams {
    /// **Delay** in milliseconds, 0 to 5000. Skewed so the short, musically
    /// busy end of the range gets more knob travel.
    #[id = "delay"]
    pub delay: FloatParam,

    /// **Feedback** in whole percent, 0 to 100. At 100 the echoes never
    /// decay.
    #[id = "feedback"]
    pub feedback: IntParam,

    /// **Dry/Wet Mix** in whole percent, -100 (dry) to 100 (wet).
    #[id = "mix"]
    pub mix: IntParam,
}

impl SimpleDelayParams {
    pub fn new(engine_params: Arc<DelayParameters>) -> Self {
        Self {
            delay: FloatParam::new(
                "Delay",
                DEFAULT_DELAY_MS,
                FloatRange::Skewed {
                    min: 0.0,
                    max: MAX_DELAY_MS,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" ms")
            .with_step_size(0.1)
            .with_callback({
                let engine_params = Arc::clone(&engine_params);
                Arc::new(move |ms: f32| engine_params.set_delay_ms(ms))
            }),

            feedback: IntParam::new(
                "Feedback",
                DEFAULT_FEEDBACK_PERCENT as i32,
                IntRange::Linear { min: 0, max: 100 },
            )
            .with_unit(" %")
            .with_callback({
                let engine_params = Arc::clone(&engine_params);
                Arc::new(move |percent: i32| {
                    engine_params.set_feedback_percent(percent as f32)
                })
            }),

            mix: IntParam::new(
                "Dry/Wet Mix",
                DEFAULT_MIX_PERCENT as i32,
                IntRange::Linear {
                    min: -100,
                    max: 100,
                },
            )
            .with_unit(" %")
            .with_callback(Arc::new(move |percent: i32| {
                engine_params.set_mix_percent(percent as f32)
            })),
        }
    }

    /// Push every current value into the engine.
    ///
    /// Callbacks only fire on change, so after a preset load or a fresh
    /// `initialize()` the engine may still hold stale values.
    pub fn sync_to(&self, engine_params: &DelayParameters) {
        engine_params.set_delay_ms(self.delay.value());
        engine_params.set_feedback_percent(self.feedback.value() as f32);
        engine_params.set_mix_percent(self.mix.value() as f32);
    }
}
