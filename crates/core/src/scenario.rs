//! Reproducible run configuration.
//!
//! A [`Scenario`] captures everything needed to replay a headless run: engine
//! name, world size, parameter overrides, spawn seed, tick count and rate, and
//! a script of input events keyed by tick index. Scenarios are plain JSON so
//! they can live next to the snapshots they produce.

use crate::driver::{tick_interval, Driver};
use crate::error::EngineError;
use crate::input::InputEvent;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An input event to queue just before the given tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub tick: u64,
    pub event: InputEvent,
}

/// Reproducible specification for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub engine: String,
    pub width: usize,
    pub height: usize,
    #[serde(default = "empty_object")]
    pub params: serde_json::Value,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub ticks: u64,
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn default_tick_hz() -> f64 {
    Driver::DEFAULT_HZ
}

impl Scenario {
    /// Creates a scenario with empty params, no ticks, no events, and the default rate.
    pub fn new(engine: &str, width: usize, height: usize, seed: u64) -> Self {
        Self {
            engine: engine.to_string(),
            width,
            height,
            params: empty_object(),
            seed,
            ticks: 0,
            tick_hz: default_tick_hz(),
            events: Vec::new(),
        }
    }

    /// Loads and validates a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Io(format!("{}: {e}", path.display())))?;
        let scenario: Scenario = serde_json::from_str(&text)
            .map_err(|e| EngineError::InvalidInput(format!("{}: {e}", path.display())))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks world size (non-zero, `width * height` fits) and tick rate.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.width == 0 || self.height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        self.width
            .checked_mul(self.height)
            .ok_or(EngineError::InvalidDimensions)?;
        tick_interval(self.tick_hz)?;
        Ok(())
    }

    /// Events scheduled for tick `tick`, in script order.
    pub fn events_at(&self, tick: u64) -> impl Iterator<Item = &InputEvent> {
        self.events
            .iter()
            .filter(move |e| e.tick == tick)
            .map(|e| &e.event)
    }

    /// Queues the events scheduled for `tick` on `driver`.
    ///
    /// Meant as the per-tick hook of [`Driver::run_with`] and
    /// [`Driver::run_paced_with`].
    pub fn queue_events(&self, tick: u64, driver: &mut Driver) {
        for event in self.events_at(tick) {
            driver.queue(*event);
        }
    }
}
