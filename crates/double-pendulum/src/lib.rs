#![deny(unsafe_code)]
//! Double pendulum engine.
//!
//! Two rigid massless arms hang from a fixed pivot placed at one third of the
//! world height. The coupled equations of motion are integrated with several
//! explicit Euler substeps per tick (see [`dynamics`]), which keeps the
//! chaotic motion visually smooth without an adaptive integrator.
//!
//! Arm lengths, masses, and gravity are live parameters: a write between
//! ticks is picked up by the very next substep.

pub mod dynamics;

use dynamics::{PendulumState, DEFAULT_DT, DEFAULT_GRAVITY, DEFAULT_SUBSTEPS};
use physlets_core::params::{expect_f64, expect_usize, param_f64, param_usize};
use physlets_core::{DVec2, Engine, EngineError, InputEvent, PointerButton, Scene, Tone};
use serde_json::{json, Value};
use std::f64::consts::FRAC_PI_4;

const DEFAULT_LENGTH: f64 = 100.0;
const DEFAULT_MASS: f64 = 2.0;
const LENGTH_RANGE: (f64, f64) = (50.0, 200.0);
const MASS_RANGE: (f64, f64) = (1.0, 10.0);
const GRAVITY_RANGE: (f64, f64) = (0.0, 500.0);
const SUBSTEP_RANGE: (usize, usize) = (1, 64);
const DT_RANGE: (f64, f64) = (1.0 / 2000.0, 1.0 / 30.0);
/// Pivot disc radius in the scene.
const PIVOT_RADIUS: f64 = 5.0;
/// Bob radius scales with mass: `BOB_BASE_RADIUS + mass`.
const BOB_BASE_RADIUS: f64 = 6.0;

/// Tunable constants for the double pendulum.
#[derive(Debug, Clone, Copy)]
pub struct DoublePendulumParams {
    pub length1: f64,
    pub length2: f64,
    pub mass1: f64,
    pub mass2: f64,
    /// Visual gravity scale, not m/s².
    pub gravity: f64,
    /// Euler substeps per tick.
    pub substeps: usize,
    /// Substep length.
    pub dt: f64,
}

impl Default for DoublePendulumParams {
    fn default() -> Self {
        Self {
            length1: DEFAULT_LENGTH,
            length2: DEFAULT_LENGTH,
            mass1: DEFAULT_MASS,
            mass2: DEFAULT_MASS,
            gravity: DEFAULT_GRAVITY,
            substeps: DEFAULT_SUBSTEPS,
            dt: DEFAULT_DT,
        }
    }
}

impl DoublePendulumParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    ///
    /// Values are clamped into the same ranges `set_param` enforces, so
    /// lengths and masses are always positive.
    pub fn from_json(params: &Value) -> Self {
        let clamp = |v: f64, (lo, hi): (f64, f64)| v.clamp(lo, hi);
        Self {
            length1: clamp(param_f64(params, "length1", DEFAULT_LENGTH), LENGTH_RANGE),
            length2: clamp(param_f64(params, "length2", DEFAULT_LENGTH), LENGTH_RANGE),
            mass1: clamp(param_f64(params, "mass1", DEFAULT_MASS), MASS_RANGE),
            mass2: clamp(param_f64(params, "mass2", DEFAULT_MASS), MASS_RANGE),
            gravity: clamp(param_f64(params, "gravity", DEFAULT_GRAVITY), GRAVITY_RANGE),
            substeps: param_usize(params, "substeps", DEFAULT_SUBSTEPS)
                .clamp(SUBSTEP_RANGE.0, SUBSTEP_RANGE.1),
            dt: clamp(param_f64(params, "dt", DEFAULT_DT), DT_RANGE),
        }
    }
}

/// Chaotic double pendulum driven one tick at a time.
pub struct DoublePendulum {
    width: usize,
    height: usize,
    state: PendulumState,
    params: DoublePendulumParams,
    /// Primary pointer is held: moves keep re-aiming the upper arm.
    dragging: bool,
    ticks: u64,
}

impl DoublePendulum {
    /// Creates a pendulum at rest with both arms at 45°.
    ///
    /// Returns `EngineError::InvalidDimensions` if width or height is zero.
    pub fn new(width: usize, height: usize, params: DoublePendulumParams) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let mut engine = Self {
            width,
            height,
            state: PendulumState::default(),
            params,
            dragging: false,
            ticks: 0,
        };
        engine.reset();
        Ok(engine)
    }

    /// Creates a double pendulum from a JSON params object.
    ///
    /// The seed is accepted for registry uniformity; the model has no randomness.
    pub fn from_json(width: usize, height: usize, _seed: u64, params: &Value) -> Result<Self, EngineError> {
        Self::new(width, height, DoublePendulumParams::from_json(params))
    }

    /// Fixed pivot point in world coordinates.
    pub fn pivot(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.height as f64 / 3.0)
    }

    /// Current pendulum state.
    pub fn pendulum(&self) -> &PendulumState {
        &self.state
    }

    /// Mutable access for scripted setups.
    pub fn pendulum_mut(&mut self) -> &mut PendulumState {
        &mut self.state
    }

    fn sync_constants(&mut self) {
        self.state.length1 = self.params.length1;
        self.state.length2 = self.params.length2;
        self.state.mass1 = self.params.mass1;
        self.state.mass2 = self.params.mass2;
    }

    fn aim_at(&mut self, pos: DVec2) {
        let theta = dynamics::angle_toward(self.pivot(), pos);
        dynamics::grab(&mut self.state, theta);
    }
}

impl Engine for DoublePendulum {
    fn step(&mut self) -> Result<(), EngineError> {
        self.sync_constants();
        dynamics::step(&mut self.state, self.params.gravity, self.params.substeps, self.params.dt);
        self.ticks += 1;
        Ok(())
    }

    fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.width, self.height);
        let pivot = self.pivot();
        let (bob1, bob2) = dynamics::bob_positions(&self.state, pivot);
        scene.segment(pivot, bob1, Tone::Pivot);
        scene.segment(bob1, bob2, Tone::Pivot);
        scene.disc(pivot, PIVOT_RADIUS, Tone::Pivot);
        scene.disc(bob1, BOB_BASE_RADIUS + self.state.mass1, Tone::Body);
        scene.disc(bob2, BOB_BASE_RADIUS + self.state.mass2, Tone::Secondary);
        scene
    }

    fn state(&self) -> Value {
        let s = &self.state;
        let e = dynamics::energy(s, self.params.gravity);
        let (bob1, bob2) = dynamics::bob_positions(s, self.pivot());
        json!({
            "ticks": self.ticks,
            "theta1": s.theta1,
            "theta2": s.theta2,
            "omega1": s.omega1,
            "omega2": s.omega2,
            "alpha1": s.alpha1,
            "alpha2": s.alpha2,
            "bob1": [bob1.x, bob1.y],
            "bob2": [bob2.x, bob2.y],
            "kinetic_energy": e.kinetic,
            "potential_energy": e.potential,
            "total_energy": e.total(),
        })
    }

    fn params(&self) -> Value {
        json!({
            "length1": self.params.length1,
            "length2": self.params.length2,
            "mass1": self.params.mass1,
            "mass2": self.params.mass2,
            "gravity": self.params.gravity,
            "substeps": self.params.substeps,
            "dt": self.params.dt,
        })
    }

    fn param_schema(&self) -> Value {
        json!({
            "length1": {
                "type": "number",
                "default": DEFAULT_LENGTH,
                "min": LENGTH_RANGE.0,
                "max": LENGTH_RANGE.1,
                "description": "Upper arm length in pixels"
            },
            "length2": {
                "type": "number",
                "default": DEFAULT_LENGTH,
                "min": LENGTH_RANGE.0,
                "max": LENGTH_RANGE.1,
                "description": "Lower arm length in pixels"
            },
            "mass1": {
                "type": "number",
                "default": DEFAULT_MASS,
                "min": MASS_RANGE.0,
                "max": MASS_RANGE.1,
                "description": "Upper bob mass"
            },
            "mass2": {
                "type": "number",
                "default": DEFAULT_MASS,
                "min": MASS_RANGE.0,
                "max": MASS_RANGE.1,
                "description": "Lower bob mass"
            },
            "gravity": {
                "type": "number",
                "default": DEFAULT_GRAVITY,
                "min": GRAVITY_RANGE.0,
                "max": GRAVITY_RANGE.1,
                "description": "Gravity scale (visual, not m/s²)"
            },
            "substeps": {
                "type": "integer",
                "default": DEFAULT_SUBSTEPS,
                "min": SUBSTEP_RANGE.0,
                "max": SUBSTEP_RANGE.1,
                "description": "Explicit Euler substeps per tick"
            },
            "dt": {
                "type": "number",
                "default": DEFAULT_DT,
                "min": DT_RANGE.0,
                "max": DT_RANGE.1,
                "description": "Integration step per substep"
            }
        })
    }

    fn set_param(&mut self, name: &str, value: &Value) -> Result<(), EngineError> {
        let p = &mut self.params;
        match name {
            "length1" => p.length1 = expect_f64(name, value, LENGTH_RANGE.0, LENGTH_RANGE.1)?,
            "length2" => p.length2 = expect_f64(name, value, LENGTH_RANGE.0, LENGTH_RANGE.1)?,
            "mass1" => p.mass1 = expect_f64(name, value, MASS_RANGE.0, MASS_RANGE.1)?,
            "mass2" => p.mass2 = expect_f64(name, value, MASS_RANGE.0, MASS_RANGE.1)?,
            "gravity" => p.gravity = expect_f64(name, value, GRAVITY_RANGE.0, GRAVITY_RANGE.1)?,
            "substeps" => p.substeps = expect_usize(name, value, SUBSTEP_RANGE.0, SUBSTEP_RANGE.1)?,
            "dt" => p.dt = expect_f64(name, value, DT_RANGE.0, DT_RANGE.1)?,
            _ => return Err(EngineError::ParamNotFound(name.to_owned())),
        }
        self.sync_constants();
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), EngineError> {
        match *event {
            InputEvent::PointerDown {
                button: PointerButton::Primary,
                pos,
            } => {
                self.dragging = true;
                self.aim_at(pos);
            }
            InputEvent::PointerMove { pos } if self.dragging => self.aim_at(pos),
            InputEvent::PointerUp {
                button: PointerButton::Primary,
                ..
            } => self.dragging = false,
            InputEvent::KeyPress { key } if key.is_char('r') => self.reset(),
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.state = PendulumState {
            theta1: FRAC_PI_4,
            theta2: FRAC_PI_4,
            ..PendulumState::default()
        };
        self.sync_constants();
        self.dragging = false;
        self.ticks = 0;
    }
}
