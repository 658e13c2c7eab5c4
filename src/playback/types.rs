//! Playback type definitions
//!
//! Settings consumed by the scheduler and the events it produces.

use serde::{Deserialize, Serialize};

use crate::samples::{Instrument, SampleRef};

/// Beats in every bar. Swing and metronome accents assume 4/4.
pub const BEATS_PER_BAR: u32 = 4;

/// Lowest tempo accepted in period math.
pub const MIN_TEMPO_BPM: f64 = 1.0;

/// Shortest sustain accepted in period math.
pub const MIN_SUSTAIN_SECS: f64 = 0.05;

/// Longest loop, in bars. Also bounds the clicks scheduled per iteration.
pub const MAX_BARS_PER_LOOP: u32 = 64;

/// How a voicing's pitches are spread in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Articulation {
    /// All pitches together
    Block,
    /// Ascending, one after another
    #[serde(alias = "arp")]
    Arpeggio,
    /// Block and arpeggio on top of each other
    #[default]
    Both,
}

impl Articulation {
    pub fn from_name(name: &str) -> Option<Articulation> {
        match name {
            "block" => Some(Articulation::Block),
            "arpeggio" | "arp" => Some(Articulation::Arpeggio),
            "both" => Some(Articulation::Both),
            _ => None,
        }
    }

    pub fn plays_block(self) -> bool {
        matches!(self, Articulation::Block | Articulation::Both)
    }

    pub fn plays_arpeggio(self) -> bool {
        matches!(self, Articulation::Arpeggio | Articulation::Both)
    }
}

/// Everything the scheduler needs to know about the loop.
///
/// # Fields
/// - `tempo_bpm`: Quarter-note tempo
/// - `sustain_seconds`: How long each chord rings before its release starts
/// - `articulation`: Block, arpeggio or both
/// - `bass_enabled`: Double the root in the bass register
/// - `metronome_enabled`: Click on every beat, accented on downbeats
/// - `swing_enabled`: Push beats 2 and 4 late
/// - `bars_per_loop`: Bars covered by one loop iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackSettings {
    pub tempo_bpm: f64,
    pub sustain_seconds: f64,
    pub articulation: Articulation,
    pub bass_enabled: bool,
    pub metronome_enabled: bool,
    pub swing_enabled: bool,
    pub bars_per_loop: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            tempo_bpm: 96.0,
            sustain_seconds: 3.0,
            articulation: Articulation::Both,
            bass_enabled: false,
            metronome_enabled: false,
            swing_enabled: false,
            bars_per_loop: 1,
        }
    }
}

impl PlaybackSettings {
    /// Copy with tempo, sustain and bar count clamped to usable values.
    ///
    /// # Examples
    /// ```
    /// use vamp::playback::PlaybackSettings;
    ///
    /// let settings = PlaybackSettings { tempo_bpm: 0.0, sustain_seconds: -1.0, ..Default::default() };
    /// let safe = settings.sanitized();
    ///
    /// assert_eq!(safe.tempo_bpm, 1.0);
    /// assert_eq!(safe.sustain_seconds, 0.05);
    /// ```
    pub fn sanitized(&self) -> PlaybackSettings {
        let mut safe = *self;
        if !safe.tempo_bpm.is_finite() || safe.tempo_bpm < MIN_TEMPO_BPM {
            log::warn!(target: "vamp::playback", "tempo {} clamped to {}", safe.tempo_bpm, MIN_TEMPO_BPM);
            safe.tempo_bpm = MIN_TEMPO_BPM;
        }
        if !safe.sustain_seconds.is_finite() || safe.sustain_seconds < MIN_SUSTAIN_SECS {
            log::warn!(
                target: "vamp::playback",
                "sustain {} clamped to {}",
                safe.sustain_seconds,
                MIN_SUSTAIN_SECS
            );
            safe.sustain_seconds = MIN_SUSTAIN_SECS;
        }
        if safe.bars_per_loop > MAX_BARS_PER_LOOP {
            log::warn!(
                target: "vamp::playback",
                "bars per loop {} clamped to {}",
                safe.bars_per_loop,
                MAX_BARS_PER_LOOP
            );
        }
        safe.bars_per_loop = safe.bars_per_loop.clamp(1, MAX_BARS_PER_LOOP);
        safe
    }

    pub fn seconds_per_beat(&self) -> f64 {
        60.0 / self.sanitized().tempo_bpm
    }

    pub fn seconds_per_bar(&self) -> f64 {
        BEATS_PER_BAR as f64 * self.seconds_per_beat()
    }

    /// Whole bars covered by one loop iteration.
    ///
    /// With the metronome on, a sustain longer than the configured bars
    /// stretches the loop to the next bar line so the click grid never
    /// restarts mid-bar.
    pub fn bars_per_iteration(&self) -> u32 {
        let safe = self.sanitized();
        if !safe.metronome_enabled {
            return safe.bars_per_loop;
        }
        let sustain_bars = (safe.sustain_seconds / safe.seconds_per_bar() - 1e-9).ceil() as u32;
        safe.bars_per_loop.max(sustain_bars).min(MAX_BARS_PER_LOOP)
    }

    /// Beats covered by one loop iteration.
    pub fn beats_per_loop(&self) -> u32 {
        self.bars_per_iteration().saturating_mul(BEATS_PER_BAR)
    }

    /// Time between chord retriggers: the longer of the sustain and the loop's bars.
    /// With the metronome on, the loop is a whole number of bars.
    ///
    /// # Examples
    /// ```
    /// use vamp::playback::PlaybackSettings;
    ///
    /// let settings = PlaybackSettings { tempo_bpm: 96.0, sustain_seconds: 3.0, ..Default::default() };
    /// assert_eq!(settings.loop_period(), 3.0);
    ///
    /// let clicking = PlaybackSettings { metronome_enabled: true, ..settings };
    /// assert_eq!(clicking.loop_period(), 5.0);
    /// ```
    pub fn loop_period(&self) -> f64 {
        let safe = self.sanitized();
        let bars_secs = safe.bars_per_iteration() as f64 * safe.seconds_per_bar();
        safe.sustain_seconds.max(bars_secs)
    }
}

/// Gain shape of one note, in seconds from the note's start.
///
/// Starts near zero, ramps linearly to `peak` over `attack`, holds until
/// `hold`, then decays with time constant `release`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub peak: f32,
    pub attack: f64,
    pub hold: f64,
    pub release: f64,
}

impl Envelope {
    /// Starting gain. Exponential ramps can't begin at zero.
    pub const FLOOR: f32 = 0.0001;

    /// Decay time constants after which a note is treated as silent.
    pub const TAIL_CONSTANTS: f64 = 5.0;

    pub fn gain_at(&self, elapsed: f64) -> f32 {
        if elapsed < 0.0 {
            return 0.0;
        }
        if elapsed < self.attack {
            let ramp = (elapsed / self.attack) as f32;
            return Self::FLOOR + (self.peak - Self::FLOOR) * ramp;
        }
        if elapsed < self.hold {
            return self.peak;
        }
        let decay = ((elapsed - self.hold) / self.release).min(50.0);
        self.peak * (-decay).exp() as f32
    }

    /// When the note has decayed to silence, relative to its start.
    pub fn length(&self) -> f64 {
        self.hold + self.release * Self::TAIL_CONSTANTS
    }
}

/// A sampled note to start at `start` on the audio clock.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEvent {
    pub instrument: Instrument,
    pub pitch: u8,
    pub start: f64,
    pub sustain: f64,
    pub envelope: Envelope,
    /// -1.0 (left) to 1.0 (right)
    pub pan: f32,
    pub sample: SampleRef,
}

/// A metronome click.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub start: f64,
    /// Beat index within the loop, 0-based
    pub beat: u32,
    pub accent: bool,
    pub frequency: f32,
    pub gain: f32,
}

/// One thing the audio output should do.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScheduledEvent {
    Note(NoteEvent),
    Click(ClickEvent),
}

impl ScheduledEvent {
    pub fn start(&self) -> f64 {
        match self {
            ScheduledEvent::Note(note) => note.start,
            ScheduledEvent::Click(click) => click.start,
        }
    }

    pub fn as_note(&self) -> Option<&NoteEvent> {
        match self {
            ScheduledEvent::Note(note) => Some(note),
            ScheduledEvent::Click(_) => None,
        }
    }

    pub fn as_click(&self) -> Option<&ClickEvent> {
        match self {
            ScheduledEvent::Click(click) => Some(click),
            ScheduledEvent::Note(_) => None,
        }
    }
}
