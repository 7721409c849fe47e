#![deny(unsafe_code)]
//! Damped simple pendulum engine.
//!
//! One bob on a rigid arm, integrated once per tick with semi-implicit Euler
//! and a unit time step:
//!
//! ```text
//! α = −(g/L)·sin θ − c·ω
//! ω += α
//! θ += ω
//! ```
//!
//! Alongside the motion the engine measures what a lab bench would: elapsed
//! time, the largest swing seen, completed oscillations, the period between
//! successive upward zero crossings, and kinetic/potential energy.
//!
//! The bob can be grabbed with the primary pointer. While held, physics and
//! the clock are suspended and the arm follows the pointer.

use physlets_core::params::{expect_bool, expect_f64, param_bool, param_f64};
use physlets_core::{DVec2, Engine, EngineError, InputEvent, PointerButton, Scene, Tone};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::f64::consts::FRAC_PI_4;

const DEFAULT_LENGTH: f64 = 200.0;
const DEFAULT_GRAVITY: f64 = 9.81;
const DEFAULT_DAMPING: f64 = 0.01;
const DEFAULT_MASS: f64 = 1.0;
/// Wall-clock seconds represented by one tick.
const TICK_SECONDS: f64 = 1.0 / 60.0;
const BOB_RADIUS: f64 = 20.0;
const TRAIL_CAPACITY: usize = 200;
/// Scene scale for force and velocity arrows.
const VECTOR_SCALE: f64 = 5.0;

/// Tunable parameters for the simple pendulum.
#[derive(Debug, Clone, Copy)]
pub struct PendulumParams {
    /// Arm length in pixels.
    pub length: f64,
    pub gravity: f64,
    /// Linear damping coefficient c.
    pub damping: f64,
    /// Bob mass, used only for energy readouts.
    pub mass: f64,
    pub trail: bool,
    pub show_vectors: bool,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            gravity: DEFAULT_GRAVITY,
            damping: DEFAULT_DAMPING,
            mass: DEFAULT_MASS,
            trail: true,
            show_vectors: true,
        }
    }
}

impl PendulumParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        Self {
            length: param_f64(params, "length", DEFAULT_LENGTH).clamp(100.0, 300.0),
            gravity: param_f64(params, "gravity", DEFAULT_GRAVITY).clamp(0.0, 20.0),
            damping: param_f64(params, "damping", DEFAULT_DAMPING).clamp(0.0, 0.1),
            mass: param_f64(params, "mass", DEFAULT_MASS).clamp(0.1, 10.0),
            trail: param_bool(params, "trail", true),
            show_vectors: param_bool(params, "show_vectors", true),
        }
    }
}

/// Single damped pendulum with measurement bookkeeping.
pub struct Pendulum {
    width: usize,
    height: usize,
    params: PendulumParams,
    angle: f64,
    velocity: f64,
    acceleration: f64,
    time: f64,
    max_angle: f64,
    oscillations: u64,
    last_crossing: Option<f64>,
    period: Option<f64>,
    trail: VecDeque<DVec2>,
    held: bool,
    ticks: u64,
}

impl Pendulum {
    /// Creates a pendulum released from rest at 45°.
    ///
    /// Returns `EngineError::InvalidDimensions` if width or height is zero.
    pub fn new(width: usize, height: usize, params: PendulumParams) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let mut engine = Self {
            width,
            height,
            params,
            angle: FRAC_PI_4,
            velocity: 0.0,
            acceleration: 0.0,
            time: 0.0,
            max_angle: FRAC_PI_4,
            oscillations: 0,
            last_crossing: None,
            period: None,
            trail: VecDeque::new(),
            held: false,
            ticks: 0,
        };
        engine.reset();
        Ok(engine)
    }

    /// Creates a pendulum from a JSON params object. The seed is unused.
    pub fn from_json(width: usize, height: usize, _seed: u64, params: &Value) -> Result<Self, EngineError> {
        Self::new(width, height, PendulumParams::from_json(params))
    }

    pub fn pivot(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.height as f64 / 6.0)
    }

    pub fn bob(&self) -> DVec2 {
        self.pivot() + self.params.length * DVec2::new(self.angle.sin(), self.angle.cos())
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn angular_velocity(&self) -> f64 {
        self.velocity
    }

    /// Seconds between the two most recent upward zero crossings.
    pub fn period(&self) -> Option<f64> {
        self.period
    }

    pub fn oscillations(&self) -> u64 {
        self.oscillations
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// `½·m·L²·ω²`
    pub fn kinetic_energy(&self) -> f64 {
        let p = &self.params;
        0.5 * p.mass * p.length * p.length * self.velocity * self.velocity
    }

    /// `m·g·L·(1 − cos θ)`, zero at the bottom of the swing.
    pub fn potential_energy(&self) -> f64 {
        let p = &self.params;
        p.mass * p.gravity * p.length * (1.0 - self.angle.cos())
    }

    fn follow_pointer(&mut self, pos: DVec2) {
        let d = pos - self.pivot();
        self.angle = d.x.atan2(d.y);
        self.velocity = 0.0;
    }
}

impl Engine for Pendulum {
    fn step(&mut self) -> Result<(), EngineError> {
        self.ticks += 1;
        if self.held {
            return Ok(());
        }
        let p = self.params;
        let previous = self.angle;

        self.acceleration = -(p.gravity / p.length) * self.angle.sin() - p.damping * self.velocity;
        self.velocity += self.acceleration;
        self.angle += self.velocity;
        self.time += TICK_SECONDS;
        self.max_angle = self.max_angle.max(self.angle.abs());

        if previous < 0.0 && self.angle >= 0.0 {
            if let Some(last) = self.last_crossing {
                self.period = Some(self.time - last);
            }
            self.last_crossing = Some(self.time);
            self.oscillations += 1;
        }

        if p.trail {
            self.trail.push_back(self.bob());
            while self.trail.len() > TRAIL_CAPACITY {
                self.trail.pop_front();
            }
        }
        Ok(())
    }

    fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.width, self.height);
        let pivot = self.pivot();
        let bob = self.bob();
        scene.polyline(self.trail.iter().copied(), Tone::Trail);
        scene.segment(pivot, bob, Tone::Pivot);
        scene.disc(pivot, 5.0, Tone::Pivot);
        if self.params.show_vectors {
            let p = &self.params;
            let weight = DVec2::new(0.0, p.mass * p.gravity);
            let tangent = DVec2::new(self.angle.cos(), -self.angle.sin());
            let velocity = tangent * self.velocity * p.length;
            scene.segment(bob, bob + weight * VECTOR_SCALE, Tone::Force);
            scene.segment(bob, bob + velocity * VECTOR_SCALE, Tone::Velocity);
        }
        scene.disc(bob, BOB_RADIUS, Tone::Body);
        scene
    }

    fn state(&self) -> Value {
        let bob = self.bob();
        json!({
            "ticks": self.ticks,
            "angle": self.angle,
            "angular_velocity": self.velocity,
            "angular_acceleration": self.acceleration,
            "time": self.time,
            "max_angle": self.max_angle,
            "oscillations": self.oscillations,
            "period": self.period,
            "kinetic_energy": self.kinetic_energy(),
            "potential_energy": self.potential_energy(),
            "bob": [bob.x, bob.y],
            "held": self.held,
        })
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "length": p.length,
            "gravity": p.gravity,
            "damping": p.damping,
            "mass": p.mass,
            "trail": p.trail,
            "show_vectors": p.show_vectors,
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "length": {"type": "number", "default": DEFAULT_LENGTH, "min": 100.0, "max": 300.0,
                "description": "Arm length in pixels"},
            "gravity": {"type": "number", "default": DEFAULT_GRAVITY, "min": 0.0, "max": 20.0,
                "description": "Gravitational acceleration"},
            "damping": {"type": "number", "default": DEFAULT_DAMPING, "min": 0.0, "max": 0.1,
                "description": "Linear damping on angular velocity"},
            "mass": {"type": "number", "default": DEFAULT_MASS, "min": 0.1, "max": 10.0,
                "description": "Bob mass (energy readouts only)"},
            "trail": {"type": "boolean", "default": true,
                "description": "Record the bob's recent path"},
            "show_vectors": {"type": "boolean", "default": true,
                "description": "Draw weight and velocity arrows"}
        })
    }

    fn set_param(&mut self, name: &str, value: &Value) -> Result<(), EngineError> {
        let p = &mut self.params;
        match name {
            "length" => p.length = expect_f64(name, value, 100.0, 300.0)?,
            "gravity" => p.gravity = expect_f64(name, value, 0.0, 20.0)?,
            "damping" => p.damping = expect_f64(name, value, 0.0, 0.1)?,
            "mass" => p.mass = expect_f64(name, value, 0.1, 10.0)?,
            "trail" => {
                p.trail = expect_bool(name, value)?;
                if !p.trail {
                    self.trail.clear();
                }
            }
            "show_vectors" => p.show_vectors = expect_bool(name, value)?,
            _ => return Err(EngineError::ParamNotFound(name.to_owned())),
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), EngineError> {
        match *event {
            InputEvent::PointerDown {
                button: PointerButton::Primary,
                pos,
            } if pos.distance(self.bob()) < BOB_RADIUS => {
                self.held = true;
                self.trail.clear();
            }
            InputEvent::PointerMove { pos } if self.held => self.follow_pointer(pos),
            InputEvent::PointerUp {
                button: PointerButton::Primary,
                ..
            } if self.held => {
                self.held = false;
                self.velocity = 0.0;
            }
            InputEvent::KeyPress { key } if key.is_char('r') => self.reset(),
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.angle = FRAC_PI_4;
        self.velocity = 0.0;
        self.acceleration = 0.0;
        self.time = 0.0;
        self.max_angle = FRAC_PI_4;
        self.oscillations = 0;
        self.last_crossing = None;
        self.period = None;
        self.trail.clear();
        self.held = false;
        self.ticks = 0;
    }
}
