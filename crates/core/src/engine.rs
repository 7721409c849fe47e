//! The `Engine` trait every physlets applet implements.
//!
//! The trait is object-safe so engines can be driven as `dyn Engine` and
//! swapped at runtime by the registry, the CLI, or a GUI front end.

use crate::error::EngineError;
use crate::input::InputEvent;
use crate::scene::Scene;
use serde_json::Value;

/// A fixed-tick simulation.
///
/// Each call to [`step`](Engine::step) advances the model by exactly one
/// driver tick. Parameter writes and input events arrive between ticks, and
/// renderers read [`scene`](Engine::scene) after the step has completed.
///
/// This trait is **object-safe**: you can use `Box<dyn Engine>` or `&mut dyn Engine`.
pub trait Engine {
    /// Advance the simulation by one tick.
    ///
    /// Numeric degeneracies are absorbed by softening and clamping inside the
    /// integrators, so this only fails on structural problems.
    fn step(&mut self) -> Result<(), EngineError>;

    /// Read-only render snapshot of the current state.
    fn scene(&self) -> Scene;

    /// Current simulation state (positions, angles, counters) as JSON.
    fn state(&self) -> Value;

    /// Current parameter values as a JSON object.
    fn params(&self) -> Value;

    /// Schema describing all parameters: type, range, default, description.
    fn param_schema(&self) -> Value;

    /// Writes one parameter, taking effect on the next step.
    ///
    /// Numbers are clamped into the schema range. On error the engine is
    /// left unchanged.
    fn set_param(&mut self, name: &str, value: &Value) -> Result<(), EngineError>;

    /// Applies one pointer or keyboard event. Engines ignore events they do not bind.
    fn handle_input(&mut self, event: &InputEvent) -> Result<(), EngineError> {
        let _ = event;
        Ok(())
    }

    /// Restores initial conditions, keeping current parameters.
    fn reset(&mut self);
}
