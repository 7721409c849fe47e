#![deny(unsafe_code)]
//! Freefall engine.
//!
//! A ball drops along the vertical centre line of the world between a
//! ceiling and a floor. Gravity always acts; air resistance and buoyancy can
//! be switched on and off while the ball moves. Each tick sums the vertical
//! forces and integrates with a fixed 16 ms step:
//!
//! ```text
//! a = ΣF / m
//! v += a·dt
//! y += v·dt·SCALE
//! ```
//!
//! Screen `y` grows downward, so a positive force or velocity points at the
//! floor. Hitting either boundary clamps the ball and reverses its velocity
//! at 80% speed.

use physlets_core::params::{expect_bool, expect_f64, param_bool, param_f64};
use physlets_core::{DVec2, Engine, EngineError, InputEvent, Scene, Shape, Tone};
use serde::Serialize;
use serde_json::{json, Value};

pub const GRAVITY: f64 = 9.81;
/// Pixels per metre.
pub const SCALE: f64 = 50.0;
pub const TICK_SECONDS: f64 = 0.016;
/// Fraction of speed kept when bouncing off the floor or ceiling.
pub const RESTITUTION: f64 = 0.8;
/// Quadratic drag: `½·v²·k`.
const DRAG_COEFFICIENT: f64 = 0.1;
/// Buoyancy as a share of weight.
const BUOYANCY_SHARE: f64 = 0.5;
const START_Y: f64 = 100.0;
/// Gap between each boundary and the ball's travel limit, capped at a
/// quarter of the height on small worlds.
const MARGIN: f64 = 50.0;
const MASS_RANGE: (f64, f64) = (0.1, 10.0);
/// Force arrow length per newton, pixels.
const ARROW_SCALE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceKind {
    Gravity,
    AirResistance,
    Buoyancy,
}

/// One force on the ball, reduced to its vertical component in newtons
/// (positive downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Force {
    pub kind: ForceKind,
    pub vertical: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct FreefallParams {
    /// Ball mass in kilograms.
    pub mass: f64,
    pub air_resistance: bool,
    pub buoyancy: bool,
}

impl Default for FreefallParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            air_resistance: false,
            buoyancy: false,
        }
    }
}

impl FreefallParams {
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            mass: param_f64(params, "mass", d.mass).clamp(MASS_RANGE.0, MASS_RANGE.1),
            air_resistance: param_bool(params, "air_resistance", d.air_resistance),
            buoyancy: param_bool(params, "buoyancy", d.buoyancy),
        }
    }
}

pub struct Freefall {
    width: usize,
    height: usize,
    params: FreefallParams,
    /// Ball centre, pixels from the top.
    position: f64,
    /// Metres per second, positive downward.
    velocity: f64,
    acceleration: f64,
    ticks: u64,
}

impl Freefall {
    /// Creates the engine with the ball at rest near the ceiling.
    ///
    /// Returns `EngineError::InvalidDimensions` if width or height is zero.
    pub fn new(width: usize, height: usize, params: FreefallParams) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let mut engine = Self {
            width,
            height,
            params,
            position: 0.0,
            velocity: 0.0,
            acceleration: 0.0,
            ticks: 0,
        };
        engine.reset();
        Ok(engine)
    }

    /// Creates the engine from a JSON params object. The seed is unused.
    pub fn from_json(width: usize, height: usize, _seed: u64, params: &Value) -> Result<Self, EngineError> {
        Self::new(width, height, FreefallParams::from_json(params))
    }

    fn margin(&self) -> f64 {
        MARGIN.min(self.height as f64 / 4.0)
    }

    /// Highest point the ball centre can reach.
    pub fn ceiling(&self) -> f64 {
        self.margin()
    }

    /// Lowest point the ball centre can reach.
    pub fn floor(&self) -> f64 {
        self.height as f64 - self.margin()
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    /// Height relative to the middle of the world, metres (positive below).
    pub fn position_meters(&self) -> f64 {
        (self.position - self.height as f64 / 2.0) / SCALE
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn acceleration(&self) -> f64 {
        self.acceleration
    }

    /// Forces acting right now, gravity first.
    pub fn forces(&self) -> Vec<Force> {
        let p = &self.params;
        let weight = p.mass * GRAVITY;
        let mut forces = vec![Force {
            kind: ForceKind::Gravity,
            vertical: weight,
        }];
        if p.air_resistance {
            // Opposes the direction of travel.
            forces.push(Force {
                kind: ForceKind::AirResistance,
                vertical: -0.5 * DRAG_COEFFICIENT * self.velocity * self.velocity.abs(),
            });
        }
        if p.buoyancy {
            forces.push(Force {
                kind: ForceKind::Buoyancy,
                vertical: -BUOYANCY_SHARE * weight,
            });
        }
        forces
    }

    pub fn net_force(&self) -> f64 {
        self.forces().iter().map(|f| f.vertical).sum()
    }

    fn ball_center(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.position)
    }
}

impl Engine for Freefall {
    fn step(&mut self) -> Result<(), EngineError> {
        self.acceleration = self.net_force() / self.params.mass;
        self.velocity += self.acceleration * TICK_SECONDS;
        self.position += self.velocity * TICK_SECONDS * SCALE;

        let (ceiling, floor) = (self.ceiling(), self.floor());
        if self.position > floor {
            self.position = floor;
            self.velocity = -self.velocity * RESTITUTION;
        }
        if self.position < ceiling {
            self.position = ceiling;
            self.velocity = -self.velocity * RESTITUTION;
        }
        self.ticks += 1;
        Ok(())
    }

    fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.width, self.height);
        let (w, h) = (self.width as f64, self.height as f64);
        let band = self.margin() * 0.4;
        for min in [DVec2::ZERO, DVec2::new(0.0, h - band)] {
            scene.push(Shape::Rect {
                min,
                size: DVec2::new(w, band),
                tone: Tone::Pivot,
            });
        }
        let center = self.ball_center();
        scene.disc(center, self.margin() * 0.5, Tone::Body);
        for force in self.forces() {
            scene.segment(center, center + DVec2::new(0.0, force.vertical * ARROW_SCALE), Tone::Force);
        }
        scene
    }

    fn state(&self) -> Value {
        json!({
            "ticks": self.ticks,
            "time": self.ticks as f64 * TICK_SECONDS,
            "position": self.position,
            "position_m": self.position_meters(),
            "velocity": self.velocity,
            "acceleration": self.acceleration,
            "net_force": self.net_force(),
            "forces": self.forces(),
        })
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "mass": p.mass,
            "air_resistance": p.air_resistance,
            "buoyancy": p.buoyancy,
        })
    }

    fn param_schema(&self) -> Value {
        let d = FreefallParams::default();
        json!({
            "mass": {"type": "number", "default": d.mass, "min": MASS_RANGE.0, "max": MASS_RANGE.1,
                "description": "Ball mass in kg"},
            "air_resistance": {"type": "boolean", "default": d.air_resistance,
                "description": "Quadratic drag opposing the motion (key a)"},
            "buoyancy": {"type": "boolean", "default": d.buoyancy,
                "description": "Upward force of half the ball's weight (key b)"}
        })
    }

    fn set_param(&mut self, name: &str, value: &Value) -> Result<(), EngineError> {
        let p = &mut self.params;
        match name {
            "mass" => p.mass = expect_f64(name, value, MASS_RANGE.0, MASS_RANGE.1)?,
            "air_resistance" => p.air_resistance = expect_bool(name, value)?,
            "buoyancy" => p.buoyancy = expect_bool(name, value)?,
            _ => return Err(EngineError::ParamNotFound(name.to_owned())),
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), EngineError> {
        if let InputEvent::KeyPress { key } = *event {
            let p = &mut self.params;
            if key.is_char('a') {
                p.air_resistance = !p.air_resistance;
            } else if key.is_char('b') {
                p.buoyancy = !p.buoyancy;
            } else if key.is_char('c') {
                p.air_resistance = false;
                p.buoyancy = false;
            } else if key.is_char('r') {
                self.reset();
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.position = START_Y.clamp(self.ceiling(), self.floor());
        self.velocity = 0.0;
        self.acceleration = 0.0;
        self.ticks = 0;
    }
}
