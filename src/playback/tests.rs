use super::*;
use crate::samples::{Instrument, SampleBank, SampleBuffer, SampleProvider, SampleRef, SynthLoader};
use crate::theory::PitchClass;
use crate::voicing::Voicing;

fn bank() -> SampleBank<SynthLoader> {
    SampleBank::new(SynthLoader { sample_rate: 1_000, length_secs: 0.01 })
}

/// Provider with a hole in it.
struct Gappy {
    missing: Vec<u8>,
    buffer: SampleBuffer,
}

impl SampleProvider for Gappy {
    fn load_pitch(&mut self, instrument: Instrument, midi: u8) -> Option<SampleRef> {
        if self.missing.contains(&midi) {
            return None;
        }
        Some(SampleRef { instrument, source_pitch: midi, playback_rate: 1.0 })
    }

    fn buffer(&self, _sample: &SampleRef) -> Option<&SampleBuffer> {
        Some(&self.buffer)
    }
}

fn cmaj7() -> Voicing {
    Voicing::new(PitchClass::C, vec![55, 59, 60, 64])
}

fn notes(events: &[ScheduledEvent]) -> Vec<&NoteEvent> {
    events.iter().filter_map(|e| e.as_note()).collect()
}

fn clicks(events: &[ScheduledEvent]) -> Vec<&ClickEvent> {
    events.iter().filter_map(|e| e.as_click()).collect()
}

#[test]
fn test_block_notes_start_together() {
    let settings = PlaybackSettings { articulation: Articulation::Block, ..Default::default() };
    let events = schedule(&cmaj7(), 2.0, 1.0, &settings, &mut bank());

    let notes = notes(&events);
    assert_eq!(notes.len(), 4);
    assert_eq!(notes.iter().map(|n| n.pitch).collect::<Vec<_>>(), vec![55, 59, 60, 64]);
    assert!(notes.iter().all(|n| n.start == 2.0 + BLOCK_STAGGER));
    assert!(notes.iter().all(|n| n.sustain == 3.0));
}

#[test]
fn test_arpeggio_steps_upward() {
    let settings = PlaybackSettings { articulation: Articulation::Arpeggio, ..Default::default() };
    let events = schedule(&cmaj7(), 2.0, 1.0, &settings, &mut bank());

    let notes = notes(&events);
    assert_eq!(notes.len(), 4);
    for (i, note) in notes.iter().enumerate() {
        assert!((note.start - (2.0 + i as f64 * ARP_STEP)).abs() < 1e-9);
        assert!((note.sustain - 3.0 * ARP_SUSTAIN_SCALE).abs() < 1e-9);
    }
    assert!(notes.windows(2).all(|w| w[0].pitch < w[1].pitch));
}

#[test]
fn test_both_mode_shares_start_time() {
    let settings = PlaybackSettings { articulation: Articulation::Both, ..Default::default() };
    let events = schedule(&cmaj7(), 2.0, 1.0, &settings, &mut bank());

    let notes = notes(&events);
    assert_eq!(notes.len(), 8);
    // Block half, then arpeggio half; both begin at the iteration start.
    assert!(notes[..4].iter().all(|n| n.start == 2.0));
    assert_eq!(notes[4].start, 2.0);
    assert!((notes[7].start - (2.0 + 3.0 * ARP_STEP)).abs() < 1e-9);
}

#[test]
fn test_start_times_never_in_the_past() {
    let settings = PlaybackSettings {
        articulation: Articulation::Both,
        metronome_enabled: true,
        bass_enabled: true,
        ..Default::default()
    };
    // The host asks for a start that has already gone by.
    let events = schedule(&cmaj7(), 4.0, 5.0, &settings, &mut bank());
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| e.start() >= 5.0 + SAFETY_OFFSET));
}

#[test]
fn test_bass_doubles_root_low() {
    let settings = PlaybackSettings {
        articulation: Articulation::Block,
        bass_enabled: true,
        sustain_seconds: 2.0,
        ..Default::default()
    };
    let events = schedule(&cmaj7(), 1.0, 0.0, &settings, &mut bank());

    let bass: Vec<_> = notes(&events).into_iter().filter(|n| n.instrument == Instrument::Bass).collect();
    assert_eq!(bass.len(), 1);
    assert_eq!(bass[0].pitch, 36);
    assert_eq!(bass[0].start, 1.0);
    assert!((bass[0].sustain - 2.0 * BASS_SUSTAIN_SCALE).abs() < 1e-9);
    // Root comes first.
    assert_eq!(events[0].as_note().map(|n| n.instrument), Some(Instrument::Bass));
}

#[test]
fn test_bass_is_independent_of_articulation() {
    for articulation in [Articulation::Block, Articulation::Arpeggio, Articulation::Both] {
        let settings = PlaybackSettings { articulation, bass_enabled: true, ..Default::default() };
        let voicing = Voicing::new(PitchClass::A, vec![57, 60, 64, 67]);
        let events = schedule(&voicing, 1.0, 0.0, &settings, &mut bank());
        let bass: Vec<_> = notes(&events).into_iter().filter(|n| n.instrument == Instrument::Bass).collect();
        assert_eq!(bass.len(), 1);
        assert_eq!(bass[0].pitch, 45);
    }
}

#[test]
fn test_metronome_accents_downbeats() {
    let settings = PlaybackSettings {
        articulation: Articulation::Block,
        metronome_enabled: true,
        bars_per_loop: 2,
        tempo_bpm: 120.0,
        ..Default::default()
    };
    let events = schedule(&cmaj7(), 1.0, 0.0, &settings, &mut bank());

    let clicks = clicks(&events);
    assert_eq!(clicks.len(), 8);
    for (i, click) in clicks.iter().enumerate() {
        assert_eq!(click.beat, i as u32);
        assert!((click.start - (1.0 + i as f64 * 0.5)).abs() < 1e-9);
        assert_eq!(click.accent, i % 4 == 0);
    }
    assert!(clicks[0].frequency > clicks[1].frequency);
    assert!(clicks[0].gain > clicks[1].gain);
    assert!(clicks[4].accent);
}

#[test]
fn test_swing_delays_offbeats() {
    let settings = PlaybackSettings {
        articulation: Articulation::Block,
        metronome_enabled: true,
        swing_enabled: true,
        tempo_bpm: 60.0,
        ..Default::default()
    };
    let events = schedule(&cmaj7(), 0.0, 0.0, &settings, &mut bank());

    let starts: Vec<f64> = clicks(&events).iter().map(|c| c.start).collect();
    assert_eq!(starts.len(), 4);
    assert!((starts[0] - SAFETY_OFFSET).abs() < 1e-9);
    assert!((starts[1] - (1.0 + SWING_DELAY)).abs() < 1e-9);
    assert!((starts[2] - 2.0).abs() < 1e-9);
    assert!((starts[3] - (3.0 + SWING_DELAY)).abs() < 1e-9);
}

#[test]
fn test_no_clicks_without_metronome() {
    let settings = PlaybackSettings { swing_enabled: true, ..Default::default() };
    let events = schedule(&cmaj7(), 1.0, 0.0, &settings, &mut bank());
    assert!(clicks(&events).is_empty());
}

#[test]
fn test_missing_sample_is_skipped() {
    let mut provider = Gappy { missing: vec![59], buffer: SampleBuffer::new(1_000, vec![0.0; 10]) };
    let settings = PlaybackSettings { articulation: Articulation::Both, ..Default::default() };
    let events = schedule(&cmaj7(), 1.0, 0.0, &settings, &mut provider);

    let pitches: Vec<u8> = notes(&events).iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, vec![55, 60, 64, 55, 60, 64]);
}

#[test]
fn test_missing_everything_is_silent_not_an_error() {
    let mut provider = Gappy { missing: (0..=127).collect(), buffer: SampleBuffer::new(1_000, vec![]) };
    let settings = PlaybackSettings { bass_enabled: true, ..Default::default() };
    let events = schedule(&cmaj7(), 1.0, 0.0, &settings, &mut provider);
    assert!(events.is_empty());
}

#[test]
fn test_envelope_shape() {
    let settings = PlaybackSettings { articulation: Articulation::Block, ..Default::default() };
    let events = schedule(&cmaj7(), 1.0, 0.0, &settings, &mut bank());
    let env = notes(&events)[0].envelope;

    assert!(env.gain_at(0.0) <= Envelope::FLOOR);
    assert!(env.gain_at(ATTACK_SECS / 2.0) > env.gain_at(0.0));
    assert!(env.gain_at(ATTACK_SECS / 2.0) < env.peak);
    assert_eq!(env.gain_at(1.0), env.peak);
    // One time constant into the release.
    let decayed = env.gain_at(3.0 + RELEASE_SECS);
    assert!((decayed - env.peak * (-1.0f32).exp()).abs() < 1e-4);
    assert!(env.gain_at(env.length()) < env.peak * 0.01);
    assert_eq!(env.gain_at(-0.1), 0.0);
}

#[test]
fn test_loop_period_scenarios() {
    let settings = PlaybackSettings { tempo_bpm: 96.0, sustain_seconds: 3.0, ..Default::default() };
    assert_eq!(settings.loop_period(), 3.0);

    let slow = PlaybackSettings { tempo_bpm: 60.0, sustain_seconds: 3.0, ..Default::default() };
    assert_eq!(slow.loop_period(), 4.0);

    let long = PlaybackSettings { tempo_bpm: 120.0, sustain_seconds: 1.0, bars_per_loop: 4, ..Default::default() };
    assert_eq!(long.loop_period(), 8.0);
}

#[test]
fn test_invalid_settings_are_clamped() {
    let settings = PlaybackSettings {
        tempo_bpm: f64::NAN,
        sustain_seconds: 0.0,
        bars_per_loop: 0,
        ..Default::default()
    };
    let safe = settings.sanitized();
    assert_eq!(safe.tempo_bpm, MIN_TEMPO_BPM);
    assert_eq!(safe.sustain_seconds, MIN_SUSTAIN_SECS);
    assert_eq!(safe.bars_per_loop, 1);
    // 4 beats at 1 BPM.
    assert_eq!(settings.loop_period(), 240.0);
    assert!(settings.loop_period().is_finite());
}

#[test]
fn test_metronome_rounds_loop_to_whole_bars() {
    let settings = PlaybackSettings {
        articulation: Articulation::Block,
        metronome_enabled: true,
        ..Default::default()
    };
    // 3 s of sustain at 96 BPM spills into a second 2.5 s bar.
    assert_eq!(settings.bars_per_iteration(), 2);
    assert_eq!(settings.loop_period(), 5.0);

    let events = schedule(&cmaj7(), 0.0, 0.0, &settings, &mut bank());
    let clicks = clicks(&events);
    assert_eq!(clicks.len(), 8);
    let last = clicks[clicks.len() - 1].start;
    // The next iteration's downbeat lands exactly one beat after the last click.
    assert!((settings.loop_period() - last - settings.seconds_per_beat()).abs() < 1e-9);

    // Without clicks the period keeps tracking the sustain.
    let quiet = PlaybackSettings { metronome_enabled: false, ..settings };
    assert_eq!(quiet.loop_period(), 3.0);
}

#[test]
fn test_huge_bar_count_is_clamped() {
    let settings = PlaybackSettings {
        bars_per_loop: 1 << 30,
        metronome_enabled: true,
        articulation: Articulation::Block,
        ..Default::default()
    };
    assert_eq!(settings.sanitized().bars_per_loop, MAX_BARS_PER_LOOP);
    assert_eq!(settings.beats_per_loop(), MAX_BARS_PER_LOOP * BEATS_PER_BAR);
    assert_eq!(settings.loop_period(), MAX_BARS_PER_LOOP as f64 * 2.5);

    let events = schedule(&cmaj7(), 0.0, 0.0, &settings, &mut bank());
    assert_eq!(clicks(&events).len(), (MAX_BARS_PER_LOOP * BEATS_PER_BAR) as usize);
}

#[test]
fn test_settings_deserialize_from_json() {
    let json = r#"{"tempoBpm": 140, "articulation": "arp", "bassEnabled": true}"#;
    let settings: PlaybackSettings = serde_json::from_str(json).unwrap();
    assert_eq!(settings.tempo_bpm, 140.0);
    assert_eq!(settings.articulation, Articulation::Arpeggio);
    assert!(settings.bass_enabled);
    assert_eq!(settings.sustain_seconds, 3.0);
}

#[test]
fn test_events_serialize_with_kind_tag() {
    let settings = PlaybackSettings {
        articulation: Articulation::Block,
        metronome_enabled: true,
        ..Default::default()
    };
    let events = schedule(&Voicing::new(PitchClass::C, vec![60]), 1.0, 0.0, &settings, &mut bank());
    let json = serde_json::to_string(&events).unwrap();
    assert!(json.contains(r#""kind":"note""#));
    assert!(json.contains(r#""kind":"click""#));
    assert!(json.contains(r#""playbackRate":1.0"#));
}
