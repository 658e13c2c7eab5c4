//! # Sample Provider
//!
//! Resolves a pitch to decoded audio for the scheduler.
//!
//! ## Pieces
//! - [`SampleProvider`] - What the scheduler and renderer consume
//! - [`SampleBank`] - Append-only cache over a [`SampleLoader`], with nearest-sample
//!   pitch shifting for sparse sample sets
//! - [`WavDirLoader`] - Reads `.wav` files from a directory, trying several names per pitch
//! - [`MemoryLoader`] - Buffers handed over by the host (tests, browser)
//! - [`SynthLoader`] - A plain additive tone, so a session is audible without sample files
//!
//! ## Candidate locations
//! For pitch 63 on the piano, [`WavDirLoader`] tries, in order:
//! `piano/63.wav`, `piano/Ds4.wav`, `piano-samples/63.wav`, `piano-samples/Ds4.wav`,
//! then `63.wav` in the root itself.
//!
//! ## Cache policy
//! Entries are added, never removed or overwritten. A pitch that resolved as
//! unavailable stays unavailable for the life of the bank.

use std::collections::HashMap;
use std::f32::consts::PI;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TrainerError;

/// How far (in semitones) a recorded sample may be repitched to cover a missing one.
pub const MAX_PITCH_SHIFT: u8 = 6;

/// Pitches loaded up front for each instrument when audio starts.
pub const PIANO_RANGE: RangeInclusive<u8> = 36..=84;
pub const BASS_RANGE: RangeInclusive<u8> = 24..=48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    Piano,
    Bass,
}

impl Instrument {
    /// Directory names searched under a sample root.
    fn dir_names(self) -> &'static [&'static str] {
        match self {
            Instrument::Piano => &["piano", "piano-samples"],
            Instrument::Bass => &["bass", "bass-samples"],
        }
    }

    pub fn from_name(name: &str) -> Option<Instrument> {
        match name {
            "piano" => Some(Instrument::Piano),
            "bass" => Some(Instrument::Bass),
            _ => None,
        }
    }

    pub fn preload_range(self) -> RangeInclusive<u8> {
        match self {
            Instrument::Piano => PIANO_RANGE,
            Instrument::Bass => BASS_RANGE,
        }
    }
}

/// Decoded mono PCM.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub sample_rate: u32,
    pub frames: Vec<f32>,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32, frames: Vec<f32>) -> Self {
        Self { sample_rate, frames }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames.len() as f64 / self.sample_rate as f64
    }
}

/// Where a pitch's audio comes from: which recorded sample, and how fast to play it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRef {
    pub instrument: Instrument,
    pub source_pitch: u8,
    pub playback_rate: f64,
}

/// Resolves pitches to audio. Calls are idempotent.
pub trait SampleProvider {
    /// Resolve `midi` for `instrument`, or `None` if nothing can play it.
    fn load_pitch(&mut self, instrument: Instrument, midi: u8) -> Option<SampleRef>;

    /// Buffer behind a resolved sample.
    fn buffer(&self, sample: &SampleRef) -> Option<&SampleBuffer>;

    /// Resolve every pitch in `range`, returning how many are playable.
    fn preload(&mut self, instrument: Instrument, range: RangeInclusive<u8>) -> usize {
        range.filter(|midi| self.load_pitch(instrument, *midi).is_some()).count()
    }
}

/// Fetches raw buffers. Misses are `None`; the bank decides what to do about them.
pub trait SampleLoader {
    fn fetch(&mut self, instrument: Instrument, midi: u8) -> Option<SampleBuffer>;
}

impl<L: SampleLoader + ?Sized> SampleLoader for Box<L> {
    fn fetch(&mut self, instrument: Instrument, midi: u8) -> Option<SampleBuffer> {
        (**self).fetch(instrument, midi)
    }
}

/// Caching provider over any loader.
pub struct SampleBank<L> {
    loader: L,
    /// Raw fetch results per exact pitch.
    fetched: HashMap<(Instrument, u8), Option<SampleBuffer>>,
    /// Resolution per requested pitch, including repitched neighbours.
    resolved: HashMap<(Instrument, u8), Option<SampleRef>>,
}

impl<L: SampleLoader> SampleBank<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            fetched: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Number of exact pitches with audio.
    pub fn loaded_count(&self) -> usize {
        self.fetched.values().filter(|b| b.is_some()).count()
    }

    fn fetch_cached(&mut self, instrument: Instrument, midi: u8) -> bool {
        let loader = &mut self.loader;
        self.fetched
            .entry((instrument, midi))
            .or_insert_with(|| loader.fetch(instrument, midi))
            .is_some()
    }

    fn resolve(&mut self, instrument: Instrument, midi: u8) -> Option<SampleRef> {
        if self.fetch_cached(instrument, midi) {
            return Some(SampleRef { instrument, source_pitch: midi, playback_rate: 1.0 });
        }

        for distance in 1..=MAX_PITCH_SHIFT {
            let below = midi.checked_sub(distance);
            let above = midi.checked_add(distance).filter(|p| *p <= 127);
            for source in [below, above].into_iter().flatten() {
                if self.fetch_cached(instrument, source) {
                    let semitones = midi as f64 - source as f64;
                    return Some(SampleRef {
                        instrument,
                        source_pitch: source,
                        playback_rate: 2f64.powf(semitones / 12.0),
                    });
                }
            }
        }
        None
    }
}

impl<L: SampleLoader> SampleProvider for SampleBank<L> {
    fn load_pitch(&mut self, instrument: Instrument, midi: u8) -> Option<SampleRef> {
        if let Some(cached) = self.resolved.get(&(instrument, midi)) {
            return *cached;
        }
        let resolution = self.resolve(instrument, midi);
        if resolution.is_none() {
            log::debug!(target: "vamp::samples", "{:?} {} unavailable", instrument, midi);
        }
        *self.resolved.entry((instrument, midi)).or_insert(resolution)
    }

    fn buffer(&self, sample: &SampleRef) -> Option<&SampleBuffer> {
        self.fetched
            .get(&(sample.instrument, sample.source_pitch))
            .and_then(|b| b.as_ref())
    }
}

/// Read a `.wav` file into mono `f32` frames, averaging channels.
pub fn read_wav(path: &Path) -> Result<SampleBuffer, TrainerError> {
    let sample_error = |e: hound::Error| TrainerError::SampleError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = hound::WavReader::open(path).map_err(sample_error)?;
    let spec = reader.spec();
    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(sample_error)?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(sample_error)?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let frames = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok(SampleBuffer::new(spec.sample_rate, frames))
}

/// Loads `.wav` files from a sample directory.
#[derive(Debug, Clone)]
pub struct WavDirLoader {
    root: PathBuf,
}

impl WavDirLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every path tried for a pitch, in order. Piano also falls back to
    /// `<root>/<midi>.wav` for flat sample folders.
    pub fn candidates(&self, instrument: Instrument, midi: u8) -> Vec<PathBuf> {
        let note_name = crate::theory::sample_note_name(midi);
        let mut paths: Vec<PathBuf> = instrument
            .dir_names()
            .iter()
            .flat_map(|dir| {
                let dir = self.root.join(dir);
                [dir.join(format!("{}.wav", midi)), dir.join(format!("{}.wav", note_name))]
            })
            .collect();
        if instrument == Instrument::Piano {
            paths.push(self.root.join(format!("{}.wav", midi)));
        }
        paths
    }
}

impl SampleLoader for WavDirLoader {
    fn fetch(&mut self, instrument: Instrument, midi: u8) -> Option<SampleBuffer> {
        for path in self.candidates(instrument, midi) {
            if !path.is_file() {
                continue;
            }
            match read_wav(&path) {
                Ok(buffer) => return Some(buffer),
                Err(e) => log::warn!(target: "vamp::samples", "{}", e),
            }
        }
        None
    }
}

/// Buffers registered directly by the host.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    samples: HashMap<(Instrument, u8), SampleBuffer>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: Instrument, midi: u8, buffer: SampleBuffer) {
        self.samples.insert((instrument, midi), buffer);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl SampleLoader for MemoryLoader {
    fn fetch(&mut self, instrument: Instrument, midi: u8) -> Option<SampleBuffer> {
        self.samples.get(&(instrument, midi)).cloned()
    }
}

/// Additive stand-in tone: a few decaying partials per pitch.
#[derive(Debug, Clone, Copy)]
pub struct SynthLoader {
    pub sample_rate: u32,
    pub length_secs: f32,
}

impl Default for SynthLoader {
    fn default() -> Self {
        Self { sample_rate: 22_050, length_secs: 4.0 }
    }
}

impl SampleLoader for SynthLoader {
    fn fetch(&mut self, instrument: Instrument, midi: u8) -> Option<SampleBuffer> {
        let freq = 440.0 * 2f32.powf((midi as f32 - 69.0) / 12.0);
        // (harmonic, amplitude, decay per second)
        let partials: &[(f32, f32, f32)] = match instrument {
            Instrument::Piano => &[(1.0, 0.6, 1.2), (2.0, 0.25, 2.0), (3.0, 0.1, 3.5), (4.0, 0.05, 5.0)],
            Instrument::Bass => &[(1.0, 0.8, 0.9), (2.0, 0.15, 2.5)],
        };
        let rate = self.sample_rate as f32;
        let len = (self.length_secs * rate) as usize;
        let frames = (0..len)
            .map(|n| {
                let t = n as f32 / rate;
                partials
                    .iter()
                    .map(|(h, amp, decay)| amp * (-decay * t).exp() * (2.0 * PI * freq * h * t).sin())
                    .sum::<f32>()
            })
            .collect();
        Some(SampleBuffer::new(self.sample_rate, frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Loader that records how often it was asked for each pitch.
    #[derive(Default)]
    struct CountingLoader {
        inner: MemoryLoader,
        calls: HashMap<(Instrument, u8), usize>,
    }

    impl SampleLoader for CountingLoader {
        fn fetch(&mut self, instrument: Instrument, midi: u8) -> Option<SampleBuffer> {
            *self.calls.entry((instrument, midi)).or_default() += 1;
            self.inner.fetch(instrument, midi)
        }
    }

    fn tone() -> SampleBuffer {
        SampleBuffer::new(8_000, vec![0.5; 800])
    }

    #[test]
    fn test_exact_pitch_resolves_at_unit_rate() {
        let mut loader = MemoryLoader::new();
        loader.insert(Instrument::Piano, 60, tone());
        let mut bank = SampleBank::new(loader);

        let sample = bank.load_pitch(Instrument::Piano, 60).unwrap();
        assert_eq!(sample.source_pitch, 60);
        assert_eq!(sample.playback_rate, 1.0);
        assert_eq!(bank.buffer(&sample).unwrap().frames.len(), 800);
    }

    #[test]
    fn test_nearest_sample_is_repitched() {
        let mut loader = MemoryLoader::new();
        loader.insert(Instrument::Piano, 57, tone());
        let mut bank = SampleBank::new(loader);

        let sample = bank.load_pitch(Instrument::Piano, 60).unwrap();
        assert_eq!(sample.source_pitch, 57);
        assert!((sample.playback_rate - 2f64.powf(3.0 / 12.0)).abs() < 1e-9);

        // Too far from any recording.
        assert!(bank.load_pitch(Instrument::Piano, 70).is_none());
        // Instruments don't share samples.
        assert!(bank.load_pitch(Instrument::Bass, 57).is_none());
    }

    #[test]
    fn test_repeated_loads_hit_the_cache() {
        let mut loader = CountingLoader::default();
        loader.inner.insert(Instrument::Piano, 48, tone());
        let mut bank = SampleBank::new(loader);

        for _ in 0..5 {
            assert!(bank.load_pitch(Instrument::Piano, 48).is_some());
            assert!(bank.load_pitch(Instrument::Piano, 100).is_none());
        }
        assert_eq!(bank.loader().calls[&(Instrument::Piano, 48)], 1);
        assert_eq!(bank.loader().calls[&(Instrument::Piano, 100)], 1);
    }

    #[test]
    fn test_unavailable_stays_unavailable() {
        let mut bank = SampleBank::new(MemoryLoader::new());
        assert!(bank.load_pitch(Instrument::Piano, 60).is_none());

        bank.loader_mut().insert(Instrument::Piano, 60, tone());
        assert!(bank.load_pitch(Instrument::Piano, 60).is_none());
    }

    #[test]
    fn test_preload_counts_playable_pitches() {
        let mut loader = MemoryLoader::new();
        loader.insert(Instrument::Bass, 36, tone());
        let mut bank = SampleBank::new(loader);

        // 30..=42 all lie within six semitones of 36.
        assert_eq!(bank.preload(Instrument::Bass, 28..=44), 13);
        assert_eq!(bank.loaded_count(), 1);
    }

    #[test]
    fn test_wav_candidates_follow_sampler_naming() {
        let loader = WavDirLoader::new("/samples");
        let candidates = loader.candidates(Instrument::Piano, 63);
        assert_eq!(candidates[0], PathBuf::from("/samples/piano/63.wav"));
        assert_eq!(candidates[1], PathBuf::from("/samples/piano/Ds4.wav"));
        assert_eq!(candidates[3], PathBuf::from("/samples/piano-samples/Ds4.wav"));
        assert_eq!(candidates.last(), Some(&PathBuf::from("/samples/63.wav")));

        let bass = loader.candidates(Instrument::Bass, 36);
        assert_eq!(bass.len(), 4);
        assert!(bass.iter().all(|p| p.starts_with("/samples/bass") || p.starts_with("/samples/bass-samples")));
    }

    #[test]
    fn test_wav_dir_loader_reads_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let bass_dir = dir.path().join("bass");
        std::fs::create_dir_all(&bass_dir).unwrap();

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(bass_dir.join("C2.wav"), spec).unwrap();
        for _ in 0..100 {
            writer.write_sample(i16::MAX / 2).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut loader = WavDirLoader::new(dir.path());
        let buffer = loader.fetch(Instrument::Bass, 36).unwrap();
        assert_eq!(buffer.sample_rate, 16_000);
        assert_eq!(buffer.frames.len(), 100);
        assert!((buffer.frames[0] - 0.25).abs() < 0.01);

        assert!(loader.fetch(Instrument::Bass, 37).is_none());
    }

    #[test]
    fn test_corrupt_wav_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let piano_dir = dir.path().join("piano");
        std::fs::create_dir_all(&piano_dir).unwrap();
        std::fs::write(piano_dir.join("60.wav"), b"not a wav file").unwrap();

        assert!(read_wav(&piano_dir.join("60.wav")).is_err());
        let mut loader = WavDirLoader::new(dir.path());
        assert!(loader.fetch(Instrument::Piano, 60).is_none());
    }

    #[test]
    fn test_synth_loader_covers_every_pitch() {
        let mut bank = SampleBank::new(SynthLoader { sample_rate: 8_000, length_secs: 0.1 });
        let sample = bank.load_pitch(Instrument::Piano, 60).unwrap();
        let buffer = bank.buffer(&sample).unwrap();
        assert_eq!(buffer.frames.len(), 800);
        assert!(buffer.frames.iter().any(|f| f.abs() > 0.1));
    }
}
