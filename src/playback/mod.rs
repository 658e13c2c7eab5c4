//! # Playback Module
//!
//! Schedule chord voicings, bass roots and metronome clicks against an audio clock.
//!
//! ## Sub-modules
//! - `types` - PlaybackSettings, ScheduledEvent, NoteEvent, ClickEvent, Envelope
//! - `scheduler` - Turns one voicing into the events of one loop iteration
//!
//! ## Entry Point
//! [`schedule()`] - Events for one loop iteration
//!
//! ## Articulation
//!
//! ### Block
//! Every pitch starts together at the iteration start.
//!
//! ### Arpeggio
//! Pitches start in ascending order, 0.12 s apart, with 90% of the block sustain.
//!
//! ### Both
//! Block and arpeggio are issued from the same start time, not one after the other.
//!
//! ## Timing
//! - Nothing starts earlier than 1 ms after the current audio clock
//! - The loop period is `max(sustain, bars × 4 × 60 / tempo)`; with the
//!   metronome on it is rounded up to whole bars so clicks stay on the beat
//! - Clicks fall on every beat of the loop's bars; downbeats are accented
//! - Swing pushes beats 2 and 4 late by 7% of a beat
//!
//! ## Envelope
//! Every note ramps linearly from near zero to its velocity over 10 ms, holds
//! for the sustain, then decays with a 0.3 s time constant. The decay keeps
//! retriggered chords from clicking.
//!
//! ## Related Modules
//! - `voicing` - Produces the pitches scheduled here
//! - `samples` - Resolves each pitch to a buffer; missing ones are skipped
//! - `vamp` - Calls [`schedule()`] once per loop iteration

mod scheduler;
mod types;

#[cfg(test)]
mod tests;

pub use scheduler::{
    beat_time, schedule, ARP_STEP, ARP_SUSTAIN_SCALE, ATTACK_SECS, BASS_SUSTAIN_SCALE,
    BLOCK_STAGGER, RELEASE_SECS, SAFETY_OFFSET, SWING_DELAY,
};
pub use types::{
    Articulation, ClickEvent, Envelope, NoteEvent, PlaybackSettings, ScheduledEvent,
    BEATS_PER_BAR, MAX_BARS_PER_LOOP, MIN_SUSTAIN_SECS, MIN_TEMPO_BPM,
};
