#![deny(unsafe_code)]
//! Engine registry: maps applet names to implementations and provides a
//! CPU-side scene rasterizer and PNG snapshots.
//!
//! This crate sits between `physlets-core` (which defines the `Engine` trait)
//! and the individual applet crates. The CLI and any GUI front end depend on
//! it so dispatch logic lives in one place.

pub mod raster;

#[cfg(feature = "png")]
pub mod snapshot;

use physlets_core::{Engine, EngineError, InputEvent, Scene};
use physlets_double_pendulum::DoublePendulum;
use physlets_fluid_drag::FluidDrag;
use physlets_freefall::Freefall;
use physlets_gravity::Gravity;
use physlets_momentum::Momentum;
use physlets_pendulum::Pendulum;
use physlets_projectile::Projectile;
use serde_json::Value;

/// All available engine names.
const ENGINE_NAMES: &[&str] = &[
    "double-pendulum",
    "gravity",
    "pendulum",
    "fluid-drag",
    "momentum",
    "projectile",
    "freefall",
];

/// Enumeration of all available physics applets.
///
/// Wraps each engine implementation and delegates `Engine` trait methods.
/// Use [`EngineKind::from_name`] for string-based construction.
pub enum EngineKind {
    /// Chaotic double pendulum.
    DoublePendulum(DoublePendulum),
    /// Interactive N-body particles with attract/repel fields.
    Gravity(Gravity),
    /// Damped simple pendulum.
    Pendulum(Pendulum),
    /// Objects falling through a viscous fluid.
    FluidDrag(FluidDrag),
    /// Two blocks colliding on a frictionless track.
    Momentum(Momentum),
    /// Slingshot launch with trajectory preview.
    Projectile(Projectile),
    /// Vertical drop with switchable drag and buoyancy.
    Freefall(Freefall),
}

macro_rules! dispatch {
    ($self:expr, $e:ident => $body:expr) => {
        match $self {
            EngineKind::DoublePendulum($e) => $body,
            EngineKind::Gravity($e) => $body,
            EngineKind::Pendulum($e) => $body,
            EngineKind::FluidDrag($e) => $body,
            EngineKind::Momentum($e) => $body,
            EngineKind::Projectile($e) => $body,
            EngineKind::Freefall($e) => $body,
        }
    };
}

impl EngineKind {
    /// Constructs an engine by name.
    ///
    /// Returns `EngineError::UnknownEngine` if the name is not recognized.
    pub fn from_name(
        name: &str,
        width: usize,
        height: usize,
        seed: u64,
        params: &Value,
    ) -> Result<Self, EngineError> {
        match name {
            "double-pendulum" => Ok(EngineKind::DoublePendulum(DoublePendulum::from_json(
                width, height, seed, params,
            )?)),
            "gravity" => Ok(EngineKind::Gravity(Gravity::from_json(width, height, seed, params)?)),
            "pendulum" => Ok(EngineKind::Pendulum(Pendulum::from_json(width, height, seed, params)?)),
            "fluid-drag" => Ok(EngineKind::FluidDrag(FluidDrag::from_json(width, height, seed, params)?)),
            "momentum" => Ok(EngineKind::Momentum(Momentum::from_json(width, height, seed, params)?)),
            "projectile" => Ok(EngineKind::Projectile(Projectile::from_json(width, height, seed, params)?)),
            "freefall" => Ok(EngineKind::Freefall(Freefall::from_json(width, height, seed, params)?)),
            _ => Err(EngineError::UnknownEngine(name.to_string())),
        }
    }

    /// Returns a slice of all recognized engine names.
    pub fn list_engines() -> &'static [&'static str] {
        ENGINE_NAMES
    }

    /// The registry name of the wrapped engine.
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::DoublePendulum(_) => "double-pendulum",
            EngineKind::Gravity(_) => "gravity",
            EngineKind::Pendulum(_) => "pendulum",
            EngineKind::FluidDrag(_) => "fluid-drag",
            EngineKind::Momentum(_) => "momentum",
            EngineKind::Projectile(_) => "projectile",
            EngineKind::Freefall(_) => "freefall",
        }
    }
}

impl Engine for EngineKind {
    fn step(&mut self) -> Result<(), EngineError> {
        dispatch!(self, e => e.step())
    }

    fn scene(&self) -> Scene {
        dispatch!(self, e => e.scene())
    }

    fn state(&self) -> Value {
        dispatch!(self, e => e.state())
    }

    fn params(&self) -> Value {
        dispatch!(self, e => e.params())
    }

    fn param_schema(&self) -> Value {
        dispatch!(self, e => e.param_schema())
    }

    fn set_param(&mut self, name: &str, value: &Value) -> Result<(), EngineError> {
        dispatch!(self, e => e.set_param(name, value))
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), EngineError> {
        dispatch!(self, e => e.handle_input(event))
    }

    fn reset(&mut self) {
        dispatch!(self, e => e.reset())
    }
}
