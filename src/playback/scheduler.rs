//! Playback scheduler
//!
//! Turns one voicing into the note and click events of one loop iteration,
//! stamped against the audio clock.

use crate::samples::{Instrument, SampleProvider};
use crate::voicing::Voicing;

use super::types::{
    ClickEvent, Envelope, NoteEvent, PlaybackSettings, ScheduledEvent, BEATS_PER_BAR,
};

/// Minimum lead over the audio clock for any start time, in seconds.
pub const SAFETY_OFFSET: f64 = 0.001;

/// Offset of block-chord notes from the iteration start. Same for every note.
pub const BLOCK_STAGGER: f64 = 0.0;

/// Seconds between successive arpeggio notes.
pub const ARP_STEP: f64 = 0.12;

/// Arpeggio notes ring a little shorter than block notes.
pub const ARP_SUSTAIN_SCALE: f64 = 0.9;

/// Bass notes ring past the chord.
pub const BASS_SUSTAIN_SCALE: f64 = 1.3;

/// Fraction of a beat that swung off-beats are pushed late.
pub const SWING_DELAY: f64 = 0.07;

pub const ATTACK_SECS: f64 = 0.01;
pub const RELEASE_SECS: f64 = 0.3;

const BLOCK_VELOCITY: f32 = 0.7;
const ARP_VELOCITY: f32 = 0.6;
const BASS_VELOCITY: f32 = 0.85;

const CLICK_ACCENT_HZ: f32 = 1_600.0;
const CLICK_HZ: f32 = 1_000.0;
const CLICK_ACCENT_GAIN: f32 = 0.5;
const CLICK_GAIN: f32 = 0.25;

/// Stereo spread: low notes lean left, high notes lean right.
fn pan_for(pitch: u8) -> f32 {
    ((pitch as f32 - 60.0) / 48.0).clamp(-0.4, 0.4)
}

/// Start time for beat `beat` of an iteration beginning at `start`.
///
/// With swing on, beats 2 and 4 of each bar (odd indices) land late.
pub fn beat_time(start: f64, beat: u32, settings: &PlaybackSettings) -> f64 {
    let seconds_per_beat = settings.seconds_per_beat();
    let mut t = start + beat as f64 * seconds_per_beat;
    if settings.swing_enabled && beat % 2 == 1 {
        t += SWING_DELAY * seconds_per_beat;
    }
    t
}

struct EventSink<'a, P: ?Sized> {
    provider: &'a mut P,
    earliest: f64,
    events: Vec<ScheduledEvent>,
}

impl<'a, P: SampleProvider + ?Sized> EventSink<'a, P> {
    fn note(&mut self, instrument: Instrument, pitch: u8, start: f64, sustain: f64, velocity: f32, pan: f32) {
        let Some(sample) = self.provider.load_pitch(instrument, pitch) else {
            log::debug!(target: "vamp::playback", "no sample for {:?} {}, skipping", instrument, pitch);
            return;
        };
        self.events.push(ScheduledEvent::Note(NoteEvent {
            instrument,
            pitch,
            start: start.max(self.earliest),
            sustain,
            envelope: Envelope {
                peak: velocity,
                attack: ATTACK_SECS,
                hold: sustain,
                release: RELEASE_SECS,
            },
            pan,
            sample,
        }));
    }

    fn click(&mut self, start: f64, beat: u32) {
        let accent = beat % BEATS_PER_BAR == 0;
        self.events.push(ScheduledEvent::Click(ClickEvent {
            start: start.max(self.earliest),
            beat,
            accent,
            frequency: if accent { CLICK_ACCENT_HZ } else { CLICK_HZ },
            gain: if accent { CLICK_ACCENT_GAIN } else { CLICK_GAIN },
        }));
    }
}

/// Schedule one loop iteration of `voicing` starting at `start`.
///
/// `now` is the current audio clock; nothing is scheduled earlier than
/// [`SAFETY_OFFSET`] after it. Pitches without a sample are skipped.
///
/// Event order: bass root, block notes ascending, arpeggio notes ascending,
/// then clicks.
///
/// # Example
/// ```rust
/// use vamp::playback::{schedule, Articulation, PlaybackSettings};
/// use vamp::samples::{SampleBank, SynthLoader};
/// use vamp::theory::PitchClass;
/// use vamp::voicing::Voicing;
///
/// let voicing = Voicing::new(PitchClass::C, vec![55, 59, 60, 64]);
/// let settings = PlaybackSettings { articulation: Articulation::Block, ..Default::default() };
/// let mut samples = SampleBank::new(SynthLoader::default());
///
/// let events = schedule(&voicing, 1.0, 0.5, &settings, &mut samples);
///
/// assert_eq!(events.len(), 4);
/// assert!(events.iter().all(|e| e.start() == 1.0));
/// ```
pub fn schedule<P: SampleProvider + ?Sized>(
    voicing: &Voicing,
    start: f64,
    now: f64,
    settings: &PlaybackSettings,
    provider: &mut P,
) -> Vec<ScheduledEvent> {
    let settings = settings.sanitized();
    let sustain = settings.sustain_seconds;
    let mut sink = EventSink {
        provider,
        earliest: now + SAFETY_OFFSET,
        events: Vec::new(),
    };

    if settings.bass_enabled {
        let pitch = voicing.root().bass_midi();
        sink.note(Instrument::Bass, pitch, start, sustain * BASS_SUSTAIN_SCALE, BASS_VELOCITY, 0.0);
    }

    if settings.articulation.plays_block() {
        for &pitch in voicing.notes() {
            sink.note(Instrument::Piano, pitch, start + BLOCK_STAGGER, sustain, BLOCK_VELOCITY, pan_for(pitch));
        }
    }

    if settings.articulation.plays_arpeggio() {
        let arp_sustain = sustain * ARP_SUSTAIN_SCALE;
        for (i, &pitch) in voicing.notes().iter().enumerate() {
            let t = start + i as f64 * ARP_STEP;
            sink.note(Instrument::Piano, pitch, t, arp_sustain, ARP_VELOCITY, pan_for(pitch));
        }
    }

    if settings.metronome_enabled {
        for beat in 0..settings.beats_per_loop() {
            sink.click(beat_time(start, beat, &settings), beat);
        }
    }

    log::debug!(
        target: "vamp::playback",
        "scheduled {} events at {:.3}",
        sink.events.len(),
        start
    );
    sink.events
}
