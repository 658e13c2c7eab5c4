use serde::Serialize;
use wasm_bindgen::prelude::*;

use vamp::output::AudioOutput;
use vamp::samples::{Instrument, MemoryLoader, SampleBank, SampleBuffer};
use vamp::{PlaybackSettings, ScheduledEvent, Trainer, TrainerConfig, TrainerError};

#[derive(Serialize)]
struct HostError {
    message: String,
}

fn to_js_error(e: TrainerError) -> JsValue {
    let error = HostError { message: e.to_string() };
    let json = serde_json::to_string(&error).unwrap_or_else(|_| format!("{{\"message\":{:?}}}", error.message));
    JsValue::from_str(&json)
}

fn events_json(events: &[ScheduledEvent]) -> String {
    serde_json::to_string(events).unwrap_or_else(|_| "[]".to_string())
}

/// The page owns the real audio graph. The trainer only needs its clock;
/// scheduled events go back to the page as JSON.
#[derive(Default)]
struct HostOutput {
    clock: f64,
}

impl AudioOutput for HostOutput {
    fn open(&mut self) -> Result<(), TrainerError> {
        Ok(())
    }

    fn now(&self) -> f64 {
        self.clock
    }

    fn play(&mut self, _event: &ScheduledEvent) {}
}

#[wasm_bindgen]
pub struct VampTrainer {
    inner: Trainer<SampleBank<MemoryLoader>, HostOutput>,
    settings: PlaybackSettings,
}

#[wasm_bindgen]
impl VampTrainer {
    /// Create a trainer from YAML settings (empty string for defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(config_yaml: &str) -> Result<VampTrainer, JsValue> {
        let config = TrainerConfig::from_yaml(config_yaml).map_err(to_js_error)?;
        Ok(VampTrainer {
            inner: Trainer::new(&config, SampleBank::new(MemoryLoader::new()), HostOutput::default()),
            settings: config.settings,
        })
    }

    /// Register decoded mono PCM for one pitch. `instrument` is "piano" or "bass".
    /// Call before `start_audio`; samples registered later are picked up for
    /// pitches that have not been resolved yet.
    pub fn register_sample(&mut self, instrument: &str, midi: u8, sample_rate: u32, frames: Vec<f32>) -> Result<(), JsValue> {
        let instrument = Instrument::from_name(instrument)
            .ok_or_else(|| to_js_error(TrainerError::ConfigError(format!("Unknown instrument: {}", instrument))))?;
        self.inner
            .provider_mut()
            .loader_mut()
            .insert(instrument, midi, SampleBuffer::new(sample_rate, frames));
        Ok(())
    }

    pub fn start_audio(&mut self, now: f64) -> Result<(), JsValue> {
        self.tick(now);
        self.inner.start_audio().map_err(to_js_error)
    }

    pub fn start_session(&mut self, now: f64) -> Result<String, JsValue> {
        self.tick(now);
        let events = self.inner.start_session(self.settings).map_err(to_js_error)?;
        Ok(events_json(&events))
    }

    pub fn next_chord(&mut self, now: f64) -> String {
        self.tick(now);
        events_json(&self.inner.next_chord())
    }

    pub fn stop_session(&mut self) {
        self.inner.stop_session();
    }

    pub fn poll(&mut self, now: f64) -> String {
        self.tick(now);
        events_json(&self.inner.poll())
    }

    /// Apply a settings object (camelCase fields, any subset).
    pub fn update_settings(&mut self, settings: JsValue, now: f64) -> Result<String, JsValue> {
        let settings: PlaybackSettings = serde_wasm_bindgen::from_value(settings)
            .map_err(|e| to_js_error(TrainerError::ConfigError(e.to_string())))?;
        self.settings = settings;
        self.tick(now);
        Ok(events_json(&self.inner.update_settings(settings)))
    }

    pub fn current_label(&self) -> Option<String> {
        self.inner.current_label()
    }

    pub fn current_scale_hint(&self) -> Option<String> {
        self.inner.current_scale_hint().map(str::to_string)
    }

    pub fn scale_hint(&self, quality: &str) -> Option<String> {
        self.inner.scale_hint(quality).map(str::to_string)
    }
}

impl VampTrainer {
    /// Follow the page's audio clock forward.
    fn tick(&mut self, now: f64) {
        let output = self.inner.output_mut();
        if now > output.clock {
            output.clock = now;
        }
    }
}
