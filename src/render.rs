//! Offline rendering of scheduled events to stereo PCM and WAV.

use std::f32::consts::{FRAC_PI_4, PI};
use std::path::Path;

use crate::error::TrainerError;
use crate::playback::{ClickEvent, NoteEvent, ScheduledEvent};
use crate::samples::SampleProvider;

/// Length of a metronome click, in seconds.
const CLICK_SECS: f32 = 0.05;

/// Decay time constant of a click.
const CLICK_DECAY: f32 = 0.012;

/// Rendered audio, one `Vec` per channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoOutput {
    pub sample_rate: u32,
    pub left: Vec<f32>,
    pub right: Vec<f32>,
}

impl StereoOutput {
    pub fn silent(sample_rate: u32, seconds: f64) -> Self {
        let len = (seconds.max(0.0) * sample_rate as f64).ceil() as usize;
        Self {
            sample_rate,
            left: vec![0.0; len],
            right: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn peak(&self) -> f32 {
        self.left
            .iter()
            .chain(self.right.iter())
            .map(|s| s.abs())
            .fold(0.0, f32::max)
    }

    fn add(&mut self, frame: usize, value: f32, pan: f32) {
        if frame >= self.left.len() {
            return;
        }
        // Equal-power pan law.
        let angle = (pan.clamp(-1.0, 1.0) + 1.0) * FRAC_PI_4;
        self.left[frame] += value * angle.cos();
        self.right[frame] += value * angle.sin();
    }
}

/// Soft knee above `threshold`, so overlapping chords don't hard-clip.
#[inline]
pub fn soft_clip(sample: f32, threshold: f32) -> f32 {
    let abs = sample.abs();
    if abs <= threshold {
        sample
    } else {
        let excess = abs - threshold;
        sample.signum() * (threshold + (1.0 - threshold) * (1.0 - (-excess * 3.0).exp()))
    }
}

/// Seconds until the last event has rung out.
pub fn events_end(events: &[ScheduledEvent]) -> f64 {
    events
        .iter()
        .map(|e| match e {
            ScheduledEvent::Note(note) => note.start + note.envelope.length(),
            ScheduledEvent::Click(click) => click.start + CLICK_SECS as f64,
        })
        .fold(0.0, f64::max)
}

fn mix_note<P: SampleProvider + ?Sized>(out: &mut StereoOutput, note: &NoteEvent, provider: &P) {
    let Some(buffer) = provider.buffer(&note.sample) else {
        return;
    };
    if buffer.frames.is_empty() || buffer.sample_rate == 0 {
        return;
    }

    let out_rate = out.sample_rate as f64;
    let step = note.sample.playback_rate * buffer.sample_rate as f64 / out_rate;
    let first = (note.start * out_rate).round() as usize;
    let length = (note.envelope.length() * out_rate).ceil() as usize;

    for n in 0..length {
        let position = n as f64 * step;
        let index = position as usize;
        if index + 1 >= buffer.frames.len() {
            break;
        }
        let frac = (position - index as f64) as f32;
        let value = buffer.frames[index] * (1.0 - frac) + buffer.frames[index + 1] * frac;
        let gain = note.envelope.gain_at(n as f64 / out_rate);
        out.add(first + n, value * gain, note.pan);
    }
}

fn mix_click(out: &mut StereoOutput, click: &ClickEvent) {
    let rate = out.sample_rate as f32;
    let first = (click.start * out.sample_rate as f64).round() as usize;
    let length = (CLICK_SECS * rate) as usize;
    for n in 0..length {
        let t = n as f32 / rate;
        let value = click.gain * (-t / CLICK_DECAY).exp() * (2.0 * PI * click.frequency * t).sin();
        out.add(first + n, value, 0.0);
    }
}

/// Mix `events` into a buffer long enough to hold all of them.
pub fn render<P: SampleProvider + ?Sized>(
    events: &[ScheduledEvent],
    provider: &P,
    sample_rate: u32,
) -> StereoOutput {
    let mut out = StereoOutput::silent(sample_rate, events_end(events));
    for event in events {
        match event {
            ScheduledEvent::Note(note) => mix_note(&mut out, note, provider),
            ScheduledEvent::Click(click) => mix_click(&mut out, click),
        }
    }
    for sample in out.left.iter_mut().chain(out.right.iter_mut()) {
        *sample = soft_clip(*sample, 0.8);
    }
    out
}

/// Write rendered audio as 16-bit stereo WAV.
pub fn write_wav(path: &Path, audio: &StereoOutput) -> Result<(), TrainerError> {
    let wav_error = |e: hound::Error| TrainerError::SampleError {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error)?;
    for (l, r) in audio.left.iter().zip(audio.right.iter()) {
        for s in [l, r] {
            let pcm = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer.write_sample(pcm).map_err(wav_error)?;
        }
    }
    writer.finalize().map_err(wav_error)
}
