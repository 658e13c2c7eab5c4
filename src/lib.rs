pub mod api;
pub mod chord;
pub mod config;
pub mod error;
pub mod output;
pub mod playback;
pub mod render;
pub mod samples;
pub mod theory;
pub mod vamp;
pub mod voicing;

pub use api::Trainer;
pub use chord::{generate, Chord};
pub use config::TrainerConfig;
pub use error::*;
pub use playback::{schedule, PlaybackSettings, ScheduledEvent};
pub use theory::{ChordQuality, PitchClass};
pub use vamp::{LoopState, VampController};
pub use voicing::{build, Voicing, VoicingOptions};

/// Generate one chord and voice it, without scheduling anything.
/// Handy for drilling chord spellings away from the audio loop.
pub fn voiced_chord<R: rand::Rng + ?Sized>(config: &TrainerConfig, rng: &mut R) -> (Chord, Voicing) {
    let chord = generate(&config.roots, &config.qualities, rng);
    let voicing = build(&chord, &config.voicing, rng);
    (chord, voicing)
}
