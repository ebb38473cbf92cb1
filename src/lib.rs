//! # Simple Delay — An AU/VST3/CLAP Stereo Delay
//!
//! A single-tap delay with feedback and a dry/wet blend, built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug). The DSP lives in
//! [`dsp`] and has no dependency on the plugin layer beyond logging; this
//! file only forwards host lifecycle calls into a [`DelayEngine`].
//!
//! ## Signal Flow
//!
//! ```text
//! L/R in ──┬──────────────────────────────────── × (1 - mix) ──►(+)──► L/R out
//!          │                                                     ▲
//!          └──► mono ──►(+)──► [Delay Buffer] ──┬───── × mix ────┘
//!                        ▲     (smoothed lag)   │
//!                        └───── × feedback ◄────┘
//! ```

pub mod dsp;
pub mod error;
mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use nih_plug::prelude::*;

pub use dsp::engine::{DelayEngine, EngineConfig, EngineState};
pub use dsp::parameters::DelayParameters;
pub use error::DelayError;
use params::SimpleDelayParams;

struct SimpleDelay {
    /// Host-facing parameters. Their callbacks write into the engine's
    /// shared [`DelayParameters`].
    params: Arc<SimpleDelayParams>,

    /// Owned by the audio thread; only touched from `initialize()`,
    /// `reset()`, `deactivate()` and `process()`, which the host never
    /// runs concurrently.
    engine: DelayEngine,
}

impl Default for SimpleDelay {
    fn default() -> Self {
        let engine = DelayEngine::default();
        let params = Arc::new(SimpleDelayParams::new(engine.parameters()));
        Self { params, engine }
    }
}

impl Plugin for SimpleDelay {
    const NAME: &'static str = "Simple Delay";
    const VENDOR: &'static str = "Simple Delay Authors";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo only: the feedback path is a mono mix of both channels.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[AudioIOLayout {
        main_input_channels: NonZeroU32::new(2),
        main_output_channels: NonZeroU32::new(2),
        aux_input_ports: &[],
        aux_output_ports: &[],
        names: PortNames::const_default(),
    }];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameter callbacks fire at the exact sample an automation point
    // lands on, so the engine sees changes with sample accuracy.
    const SAMPLE_ACCURATE_AUTOMATION: bool = true;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Allocate the delay buffer for the host's sample rate.
    ///
    /// The host calls this again on every sample rate change, which
    /// reallocates the buffer. An allocation failure is logged and the
    /// plugin runs in bypass; only an unusable sample rate is refused.
    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate;

        match self.engine.activate(sample_rate) {
            Ok(()) => nih_log!(
                "delay buffer ready: {} samples at {sample_rate} Hz",
                self.engine.buffer_capacity()
            ),
            Err(err @ (DelayError::InvalidSampleRate(_) | DelayError::InvalidTimeConstant(_))) => {
                nih_error!("cannot activate delay: {err}");
                return false;
            }
            Err(err) => nih_warn!("{err}, passing audio through unprocessed"),
        }

        self.params.sync_to(&self.engine.parameters());

        true
    }

    /// Clear pending echoes so stale audio doesn't bleed into the next
    /// playback.
    fn reset(&mut self) {
        self.engine.reset();
    }

    fn deactivate(&mut self) {
        self.engine.deactivate();
        nih_log!("delay buffer released");
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        if let [left, right, ..] = buffer.as_slice() {
            self.engine.process_block(left, right);
        }

        // Keep the host calling process() while echoes are still audible.
        match self.engine.tail_length() {
            Some(samples) => ProcessStatus::Tail(samples),
            None => ProcessStatus::KeepAlive,
        }
    }
}

impl ClapPlugin for SimpleDelay {
    const CLAP_ID: &'static str = "com.simple-delay.simple-delay";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Stereo delay with feedback and dry/wet mix");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for SimpleDelay {
    const VST3_CLASS_ID: [u8; 16] = *b"SimpleDelayPlug1";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

nih_export_clap!(SimpleDelay);
nih_export_vst3!(SimpleDelay);

// AUv2 entry point for Logic Pro, wrapping the CLAP build.
clap_wrapper::export_auv2!();
