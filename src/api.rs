//! # Trainer
//!
//! The host-facing surface: four commands and a poll, wired to a sample
//! provider, an audio output and a random source.
//!
//! ```rust
//! use vamp::api::Trainer;
//! use vamp::config::TrainerConfig;
//! use vamp::output::OfflineOutput;
//! use vamp::samples::{SampleBank, SynthLoader};
//!
//! let config = TrainerConfig::from_yaml("seed: 1\nqualities: [maj7]").unwrap();
//! let mut trainer = Trainer::new(&config, SampleBank::new(SynthLoader::default()), OfflineOutput::new());
//!
//! trainer.start_session(config.settings).unwrap();
//! assert!(trainer.current_label().unwrap().ends_with("maj7"));
//!
//! trainer.output_mut().advance(3.0);
//! trainer.poll();
//! trainer.stop_session();
//! assert!(trainer.current_label().is_none());
//! ```

use rand_pcg::Pcg32;

use crate::config::TrainerConfig;
use crate::error::TrainerError;
use crate::output::AudioOutput;
use crate::playback::{PlaybackSettings, ScheduledEvent};
use crate::samples::{Instrument, SampleProvider};
use crate::theory;
use crate::vamp::{LoopState, VampController};

pub struct Trainer<P, O> {
    controller: VampController,
    provider: P,
    output: O,
    rng: Pcg32,
    audio_ready: bool,
}

impl<P: SampleProvider, O: AudioOutput> Trainer<P, O> {
    pub fn new(config: &TrainerConfig, provider: P, output: O) -> Self {
        Self {
            controller: VampController::new(config.settings, config.selection(), config.voicing),
            provider,
            output,
            rng: config.rng(),
            audio_ready: false,
        }
    }

    /// Open the output and load the sample sets. Runs once; later calls are
    /// no-ops. Fails only when the output itself is unavailable.
    pub fn start_audio(&mut self) -> Result<(), TrainerError> {
        if self.audio_ready {
            return Ok(());
        }
        self.output.open()?;

        let piano = self.provider.preload(Instrument::Piano, Instrument::Piano.preload_range());
        let bass = self.provider.preload(Instrument::Bass, Instrument::Bass.preload_range());
        log::info!(target: "vamp::samples", "audio ready: {} piano, {} bass samples", piano, bass);
        if piano == 0 {
            log::warn!(target: "vamp::samples", "no piano samples found, chords will be silent");
        }

        self.audio_ready = true;
        Ok(())
    }

    pub fn is_audio_ready(&self) -> bool {
        self.audio_ready
    }

    /// Start a session with a fresh chord, opening audio first if needed.
    pub fn start_session(&mut self, settings: PlaybackSettings) -> Result<Vec<ScheduledEvent>, TrainerError> {
        self.start_audio()?;
        let now = self.output.now();
        let events = self.controller.start_session(settings, now, &mut self.rng, &mut self.provider);
        Ok(self.dispatch(events))
    }

    /// Move to a new chord. Ignored when no session is running.
    pub fn next_chord(&mut self) -> Vec<ScheduledEvent> {
        let now = self.output.now();
        let events = self.controller.next_chord(now, &mut self.rng, &mut self.provider);
        self.dispatch(events)
    }

    pub fn stop_session(&mut self) {
        self.controller.stop_session();
    }

    /// Schedule whatever loop iterations are due. Call regularly.
    pub fn poll(&mut self) -> Vec<ScheduledEvent> {
        let now = self.output.now();
        let events = self.controller.poll(now, &mut self.provider);
        self.dispatch(events)
    }

    /// Apply new settings, restarting the current chord's loop if one is running.
    pub fn update_settings(&mut self, settings: PlaybackSettings) -> Vec<ScheduledEvent> {
        let now = self.output.now();
        let events = self.controller.update_settings(settings, now, &mut self.provider);
        self.dispatch(events)
    }

    pub fn current_label(&self) -> Option<String> {
        self.controller.session().current_chord().map(|c| c.label())
    }

    /// Suggested scale for the chord that is playing.
    pub fn current_scale_hint(&self) -> Option<&'static str> {
        self.controller.session().current_chord().map(|c| c.scale_hint())
    }

    /// Suggested scale for a quality name, `None` if the name is unknown.
    pub fn scale_hint(&self, quality_name: &str) -> Option<&'static str> {
        theory::scale_hint(quality_name)
    }

    pub fn state(&self) -> LoopState {
        self.controller.state()
    }

    pub fn controller(&self) -> &VampController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut VampController {
        &mut self.controller
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn into_parts(self) -> (P, O) {
        (self.provider, self.output)
    }

    fn dispatch(&mut self, events: Vec<ScheduledEvent>) -> Vec<ScheduledEvent> {
        for event in &events {
            self.output.play(event);
        }
        events
    }
}
