//! Audio output: the clock everything is scheduled against, and the sink
//! scheduled events go to.

use crate::error::TrainerError;
use crate::playback::ScheduledEvent;

/// Something that can play scheduled events.
pub trait AudioOutput {
    /// Check that audio can be produced at all. Called once before the first
    /// session; an error here means no session can start.
    fn open(&mut self) -> Result<(), TrainerError>;

    /// Current audio clock in seconds. Never decreases.
    fn now(&self) -> f64;

    fn play(&mut self, event: &ScheduledEvent);
}

/// Output with a virtual clock that the host advances by hand. Collects
/// everything played so it can be rendered or inspected afterwards.
#[derive(Debug, Default)]
pub struct OfflineOutput {
    clock: f64,
    events: Vec<ScheduledEvent>,
}

impl OfflineOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward. Negative steps are ignored.
    pub fn advance(&mut self, seconds: f64) {
        if seconds > 0.0 {
            self.clock += seconds;
        }
    }

    /// Move the clock to `time` if that is later than now.
    pub fn advance_to(&mut self, time: f64) {
        if time > self.clock {
            self.clock = time;
        }
    }

    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<ScheduledEvent> {
        std::mem::take(&mut self.events)
    }
}

impl AudioOutput for OfflineOutput {
    fn open(&mut self) -> Result<(), TrainerError> {
        Ok(())
    }

    fn now(&self) -> f64 {
        self.clock
    }

    fn play(&mut self, event: &ScheduledEvent) {
        self.events.push(event.clone());
    }
}
