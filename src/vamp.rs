//! # Vamp Loop Controller
//!
//! Owns the playback session and repeats the scheduler on a fixed cadence.
//!
//! ## States
//! - **Idle** - No loop handle. `next_chord` does nothing here.
//! - **Looping** - Exactly one [`LoopHandle`]; `poll` emits its iterations.
//!
//! ## Loop handles
//! A handle is created by starting a loop and destroyed by cancelling it.
//! It is not `Clone`, and the session stores it in a single `Option`, so a
//! second live loop cannot exist. Starting a new loop always takes and
//! cancels the old handle first.
//!
//! ## Timing
//! The controller never sleeps. The host calls [`VampController::poll`] with
//! the audio clock; every iteration whose start falls inside the lookahead
//! window is scheduled then. One iteration per period:
//! `max(sustain, bars × 4 × 60 / tempo)`, in whole bars when the metronome
//! is on. A late poll skips iterations that are already past rather than
//! playing them on top of the next one.

use rand::Rng;
use serde::Serialize;

use crate::chord::{generate, Chord};
use crate::playback::{schedule, PlaybackSettings, ScheduledEvent};
use crate::samples::SampleProvider;
use crate::theory::{ChordQuality, PitchClass};
use crate::voicing::{self, Voicing, VoicingOptions};

/// How far ahead of the audio clock iterations are scheduled, in seconds.
pub const DEFAULT_LOOKAHEAD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Idle,
    Looping,
}

/// Token for the one running loop.
#[derive(Debug)]
pub struct LoopHandle {
    id: u64,
    period: f64,
    next_fire: f64,
}

impl LoopHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    /// Audio-clock time of the next iteration.
    pub fn next_fire(&self) -> f64 {
        self.next_fire
    }

    /// Stop the loop. Consumes the handle, so it can't fire afterwards.
    pub fn cancel(self) -> u64 {
        log::debug!(target: "vamp::loop", "loop {} cancelled", self.id);
        self.id
    }
}

/// Which roots and qualities chord generation picks from. Empty means all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub roots: Vec<PitchClass>,
    pub qualities: Vec<ChordQuality>,
}

/// Mutable session state owned by the controller.
#[derive(Debug, Default)]
pub struct PlaybackSession {
    active: bool,
    current_chord: Option<Chord>,
    voicing: Option<Voicing>,
    loop_handle: Option<LoopHandle>,
    last_chord: Option<Chord>,
}

impl PlaybackSession {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The chord being looped. Cleared on stop.
    pub fn current_chord(&self) -> Option<&Chord> {
        self.current_chord.as_ref()
    }

    pub fn voicing(&self) -> Option<&Voicing> {
        self.voicing.as_ref()
    }

    pub fn loop_handle(&self) -> Option<&LoopHandle> {
        self.loop_handle.as_ref()
    }

    /// Most recent chord, kept after stop for inspection.
    pub fn last_chord(&self) -> Option<&Chord> {
        self.last_chord.as_ref()
    }
}

pub struct VampController {
    session: PlaybackSession,
    settings: PlaybackSettings,
    selection: Selection,
    voicing_options: VoicingOptions,
    lookahead: f64,
    next_loop_id: u64,
}

impl Default for VampController {
    fn default() -> Self {
        Self::new(PlaybackSettings::default(), Selection::default(), VoicingOptions::default())
    }
}

impl VampController {
    pub fn new(settings: PlaybackSettings, selection: Selection, voicing_options: VoicingOptions) -> Self {
        Self {
            session: PlaybackSession::default(),
            settings: settings.sanitized(),
            selection,
            voicing_options,
            lookahead: DEFAULT_LOOKAHEAD,
            next_loop_id: 1,
        }
    }

    pub fn with_lookahead(mut self, lookahead: f64) -> Self {
        self.lookahead = lookahead.max(0.0);
        self
    }

    pub fn state(&self) -> LoopState {
        if self.session.loop_handle.is_some() {
            LoopState::Looping
        } else {
            LoopState::Idle
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn voicing_options(&self) -> &VoicingOptions {
        &self.voicing_options
    }

    /// Takes effect from the next chord.
    pub fn set_voicing_options(&mut self, options: VoicingOptions) {
        self.voicing_options = options;
    }

    /// Start (or restart) a session with `settings` and a fresh chord.
    pub fn start_session<R, P>(
        &mut self,
        settings: PlaybackSettings,
        now: f64,
        rng: &mut R,
        provider: &mut P,
    ) -> Vec<ScheduledEvent>
    where
        R: Rng + ?Sized,
        P: SampleProvider + ?Sized,
    {
        self.settings = settings.sanitized();
        self.session.active = true;
        log::info!(target: "vamp::loop", "session started at {:.1} BPM", self.settings.tempo_bpm);
        self.advance_chord(now, rng, provider)
    }

    /// Replace the chord and its loop. Does nothing while idle.
    pub fn next_chord<R, P>(&mut self, now: f64, rng: &mut R, provider: &mut P) -> Vec<ScheduledEvent>
    where
        R: Rng + ?Sized,
        P: SampleProvider + ?Sized,
    {
        if !self.session.active {
            log::debug!(target: "vamp::loop", "next chord ignored: no session");
            return Vec::new();
        }
        self.advance_chord(now, rng, provider)
    }

    /// Change settings. A running loop restarts on its current chord.
    pub fn update_settings<P>(&mut self, settings: PlaybackSettings, now: f64, provider: &mut P) -> Vec<ScheduledEvent>
    where
        P: SampleProvider + ?Sized,
    {
        self.settings = settings.sanitized();
        if !self.session.active || self.session.voicing.is_none() {
            return Vec::new();
        }
        self.start_loop(now, provider)
    }

    pub fn stop_session(&mut self) {
        self.cancel_loop();
        if self.session.active {
            log::info!(target: "vamp::loop", "session stopped");
        }
        self.session.active = false;
        if let Some(chord) = self.session.current_chord.take() {
            self.session.last_chord = Some(chord);
        }
        self.session.voicing = None;
    }

    /// Emit every iteration due within the lookahead window of `now`.
    ///
    /// Iterations that are already more than a lookahead window in the past
    /// are dropped, not played late: the loop stays on its grid and each
    /// poll fires at most the iterations ahead of `now`.
    pub fn poll<P>(&mut self, now: f64, provider: &mut P) -> Vec<ScheduledEvent>
    where
        P: SampleProvider + ?Sized,
    {
        let PlaybackSession { loop_handle, voicing, .. } = &mut self.session;
        let (Some(handle), Some(voicing)) = (loop_handle.as_mut(), voicing.as_ref()) else {
            return Vec::new();
        };

        let mut skipped = 0u32;
        while handle.next_fire + self.lookahead < now {
            handle.next_fire += handle.period;
            skipped += 1;
        }
        if skipped > 0 {
            log::warn!(
                target: "vamp::loop",
                "loop {} fell behind, skipped {} iteration(s)",
                handle.id,
                skipped
            );
        }

        let mut events = Vec::new();
        while handle.next_fire <= now + self.lookahead {
            events.extend(schedule(voicing, handle.next_fire, now, &self.settings, provider));
            handle.next_fire += handle.period;
        }
        events
    }

    fn advance_chord<R, P>(&mut self, now: f64, rng: &mut R, provider: &mut P) -> Vec<ScheduledEvent>
    where
        R: Rng + ?Sized,
        P: SampleProvider + ?Sized,
    {
        // The old loop must be gone before the new chord exists.
        self.cancel_loop();

        let chord = generate(&self.selection.roots, &self.selection.qualities, rng);
        let voicing = voicing::build(&chord, &self.voicing_options, rng);
        log::info!(target: "vamp::loop", "chord {} ({})", chord.label(), chord.scale_hint());

        if let Some(previous) = self.session.current_chord.replace(chord) {
            self.session.last_chord = Some(previous);
        }
        self.session.voicing = Some(voicing);
        self.start_loop(now, provider)
    }

    fn start_loop<P>(&mut self, now: f64, provider: &mut P) -> Vec<ScheduledEvent>
    where
        P: SampleProvider + ?Sized,
    {
        self.cancel_loop();

        let Some(voicing) = self.session.voicing.as_ref() else {
            return Vec::new();
        };
        let period = self.settings.loop_period();
        let events = schedule(voicing, now, now, &self.settings, provider);

        let handle = LoopHandle {
            id: self.next_loop_id,
            period,
            next_fire: now + period,
        };
        self.next_loop_id += 1;
        log::debug!(target: "vamp::loop", "loop {} armed, period {:.3}s", handle.id, period);
        self.session.loop_handle = Some(handle);
        events
    }

    fn cancel_loop(&mut self) {
        if let Some(handle) = self.session.loop_handle.take() {
            handle.cancel();
        }
    }
}
