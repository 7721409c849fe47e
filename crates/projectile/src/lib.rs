#![deny(unsafe_code)]
//! Slingshot projectile engine.
//!
//! A bird sits in a slingshot. Dragging it back with the primary pointer
//! stretches the rubber band (up to a fixed length) and releasing launches it
//! with a velocity proportional to the pull:
//!
//! ```text
//! v₀ = −(bird − sling)·0.1
//! ```
//!
//! In flight each tick applies optional quadratic air drag, then gravity,
//! then moves the bird by its velocity (pixels per tick). Touching the
//! ground reflects the vertical velocity with the bounce factor and scales
//! the horizontal one by friction until both settle below 0.1.
//!
//! While the bird is still in the slingshot the engine predicts its path
//! with the same integrator, stopping at the first ground contact.

use physlets_core::params::{expect_bool, expect_f64, param_bool, param_f64};
use physlets_core::{DVec2, Engine, EngineError, InputEvent, Key, PointerButton, Scene, Shape, Tone};
use serde_json::{json, Value};

pub const BIRD_RADIUS: f64 = 25.0;
/// Bird mass in kilograms.
pub const BIRD_MASS: f64 = 1.0;
/// Pixels per metre for the height, range and energy readouts.
pub const SCALE: f64 = 20.0;
pub const TICK_SECONDS: f64 = 0.016;
const AIR_DENSITY: f64 = 1.225;
const DRAG_COEFFICIENT: f64 = 0.001;
/// Launch speed per pixel of pull.
const LAUNCH_FACTOR: f64 = 0.1;
const BAND_LENGTH: f64 = 150.0;
const GROUND_HEIGHT: f64 = 150.0;
const SLING_X: f64 = 150.0;
/// Height of the slingshot post above the ground.
const POST_HEIGHT: f64 = 250.0;
const POST_WIDTH: f64 = 30.0;
const MAX_PATH_POINTS: usize = 100;
const PREDICTION_STEPS: usize = 100;
/// Both velocity components below this on a ground contact stop the bird.
const SETTLE_SPEED: f64 = 0.1;

const GRAVITY_RANGE: (f64, f64) = (0.0, 2.0);
const BOUNCE_RANGE: (f64, f64) = (0.0, 1.0);
const FRICTION_RANGE: (f64, f64) = (0.5, 1.0);

#[derive(Debug, Clone, Copy)]
pub struct ProjectileParams {
    /// Downward acceleration, pixels per tick².
    pub gravity: f64,
    pub air_resistance: bool,
    /// Share of vertical speed kept on a ground bounce.
    pub bounce: f64,
    /// Share of horizontal speed kept on each ground contact.
    pub friction: f64,
}

impl Default for ProjectileParams {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            air_resistance: false,
            bounce: 0.7,
            friction: 0.99,
        }
    }
}

impl ProjectileParams {
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            gravity: param_f64(params, "gravity", d.gravity).clamp(GRAVITY_RANGE.0, GRAVITY_RANGE.1),
            air_resistance: param_bool(params, "air_resistance", d.air_resistance),
            bounce: param_f64(params, "bounce", d.bounce).clamp(BOUNCE_RANGE.0, BOUNCE_RANGE.1),
            friction: param_f64(params, "friction", d.friction).clamp(FRICTION_RANGE.0, FRICTION_RANGE.1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Resting in the slingshot.
    Loaded,
    /// Held by the pointer, band stretched.
    Pulling,
    /// Released; stays in this phase after landing until reset.
    Flying,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Loaded => "loaded",
            Phase::Pulling => "pulling",
            Phase::Flying => "flying",
        }
    }
}

/// Velocity after one tick of quadratic drag.
fn drag(velocity: DVec2) -> DVec2 {
    let speed = velocity.length();
    if speed == 0.0 {
        return velocity;
    }
    let force = 0.5 * AIR_DENSITY * speed * speed * DRAG_COEFFICIENT;
    velocity - velocity * (force / (speed * BIRD_MASS))
}

/// One unclamped flight tick: drag, gravity, move.
fn advance(pos: DVec2, velocity: DVec2, params: &ProjectileParams) -> (DVec2, DVec2) {
    let mut velocity = if params.air_resistance { drag(velocity) } else { velocity };
    velocity.y += params.gravity;
    (pos + velocity, velocity)
}

pub struct Projectile {
    width: usize,
    height: usize,
    params: ProjectileParams,
    phase: Phase,
    pos: DVec2,
    velocity: DVec2,
    on_ground: bool,
    /// Highest point reached (smallest screen y) since launch.
    peak_y: f64,
    /// Furthest horizontal distance from the slingshot since launch.
    range: f64,
    path: Vec<DVec2>,
    flight_ticks: u64,
}

impl Projectile {
    /// Creates the engine with the bird loaded in the slingshot.
    ///
    /// Returns `EngineError::InvalidDimensions` if width or height is zero.
    pub fn new(width: usize, height: usize, params: ProjectileParams) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let mut engine = Self {
            width,
            height,
            params,
            phase: Phase::Loaded,
            pos: DVec2::ZERO,
            velocity: DVec2::ZERO,
            on_ground: false,
            peak_y: 0.0,
            range: 0.0,
            path: Vec::with_capacity(MAX_PATH_POINTS),
            flight_ticks: 0,
        };
        engine.reset();
        Ok(engine)
    }

    /// Creates the engine from a JSON params object. The seed is unused.
    pub fn from_json(width: usize, height: usize, _seed: u64, params: &Value) -> Result<Self, EngineError> {
        Self::new(width, height, ProjectileParams::from_json(params))
    }

    /// Top edge of the ground.
    pub fn ground(&self) -> f64 {
        let h = self.height as f64;
        h - GROUND_HEIGHT.min(h / 4.0)
    }

    /// Bird centre height when touching the ground.
    fn rest_y(&self) -> f64 {
        self.ground() - BIRD_RADIUS
    }

    /// Anchor point of the rubber band.
    pub fn sling(&self) -> DVec2 {
        let x = SLING_X.min(self.width as f64 / 4.0);
        let y = (self.ground() - POST_HEIGHT).max(2.0 * BIRD_RADIUS).min(self.rest_y());
        DVec2::new(x, y)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> DVec2 {
        self.pos
    }

    pub fn velocity(&self) -> DVec2 {
        self.velocity
    }

    /// Velocity the bird would leave with if released now.
    fn launch_velocity(&self) -> DVec2 {
        -(self.pos - self.sling()) * LAUNCH_FACTOR
    }

    /// Aim angle in degrees above the horizontal, while not flying.
    pub fn launch_angle(&self) -> Option<f64> {
        if self.phase == Phase::Flying {
            return None;
        }
        let v = self.launch_velocity();
        Some((-v.y).atan2(v.x).to_degrees())
    }

    /// Predicted path from the current pull, starting at the bird. Empty once
    /// the bird has been launched.
    pub fn predicted_path(&self) -> Vec<DVec2> {
        if self.phase == Phase::Flying {
            return Vec::new();
        }
        let rest = self.rest_y();
        let mut points = Vec::with_capacity(PREDICTION_STEPS + 1);
        let (mut pos, mut velocity) = (self.pos, self.launch_velocity());
        points.push(pos);
        for _ in 0..PREDICTION_STEPS {
            (pos, velocity) = advance(pos, velocity, &self.params);
            let landed = pos.y >= rest;
            if landed {
                pos.y = rest;
            }
            points.push(pos);
            if landed {
                break;
            }
        }
        points
    }

    /// Maximum height above the ground since launch, metres.
    pub fn max_height(&self) -> f64 {
        if self.phase == Phase::Flying {
            (self.ground() - self.peak_y) / SCALE
        } else {
            0.0
        }
    }

    /// Furthest horizontal distance from the slingshot since launch, metres.
    pub fn range(&self) -> f64 {
        self.range / SCALE
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * BIRD_MASS * self.velocity.length_squared()
    }

    pub fn potential_energy(&self) -> f64 {
        BIRD_MASS * self.params.gravity * (self.ground() - self.pos.y) / SCALE
    }

    fn pull_to(&mut self, target: DVec2) {
        let sling = self.sling();
        let offset = target - sling;
        self.pos = if offset.length() > BAND_LENGTH {
            sling + offset.normalize() * BAND_LENGTH
        } else {
            target
        };
    }

    fn launch(&mut self) {
        self.velocity = self.launch_velocity();
        self.phase = Phase::Flying;
        self.peak_y = self.pos.y;
        self.range = 0.0;
        self.flight_ticks = 0;
        self.path.clear();
        self.path.push(self.pos);
    }
}

impl Engine for Projectile {
    fn step(&mut self) -> Result<(), EngineError> {
        if self.phase != Phase::Flying {
            return Ok(());
        }
        (self.pos, self.velocity) = advance(self.pos, self.velocity, &self.params);
        self.flight_ticks += 1;
        self.peak_y = self.peak_y.min(self.pos.y);
        self.range = self.range.max(self.pos.x - self.sling().x);
        if self.path.len() < MAX_PATH_POINTS {
            self.path.push(self.pos);
        }

        let rest = self.rest_y();
        self.on_ground = self.pos.y >= rest;
        if self.on_ground {
            self.pos.y = rest;
            self.velocity.y = -self.velocity.y * self.params.bounce;
            self.velocity.x *= self.params.friction;
            if self.velocity.x.abs() < SETTLE_SPEED && self.velocity.y.abs() < SETTLE_SPEED {
                self.velocity = DVec2::ZERO;
            }
        }
        Ok(())
    }

    fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.width, self.height);
        let (w, h) = (self.width as f64, self.height as f64);
        let ground = self.ground();
        let sling = self.sling();
        scene.push(Shape::Rect {
            min: DVec2::new(0.0, ground),
            size: DVec2::new(w, h - ground),
            tone: Tone::Pivot,
        });
        scene.push(Shape::Rect {
            min: DVec2::new(sling.x - POST_WIDTH / 2.0, sling.y),
            size: DVec2::new(POST_WIDTH, ground - sling.y),
            tone: Tone::Pivot,
        });
        if self.phase == Phase::Flying {
            scene.polyline(self.path.iter().copied(), Tone::Trail);
        } else {
            for anchor in [sling, DVec2::new(sling.x, ground)] {
                scene.segment(anchor, self.pos, Tone::Secondary);
            }
            scene.polyline(self.predicted_path(), Tone::Velocity);
        }
        scene.disc(self.pos, BIRD_RADIUS, Tone::Body);
        scene
    }

    fn state(&self) -> Value {
        let ke = self.kinetic_energy();
        let pe = self.potential_energy();
        json!({
            "phase": self.phase.name(),
            "position": [self.pos.x, self.pos.y],
            "velocity": [self.velocity.x, self.velocity.y],
            "speed": self.velocity.length(),
            "launch_angle": self.launch_angle(),
            "on_ground": self.on_ground,
            "time": self.flight_ticks as f64 * TICK_SECONDS,
            "max_height": self.max_height(),
            "range": self.range(),
            "kinetic_energy": ke,
            "potential_energy": pe,
            "total_energy": ke + pe,
            "path_points": self.path.len(),
        })
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "gravity": p.gravity,
            "air_resistance": p.air_resistance,
            "bounce": p.bounce,
            "friction": p.friction,
        })
    }

    fn param_schema(&self) -> Value {
        let d = ProjectileParams::default();
        json!({
            "gravity": {"type": "number", "default": d.gravity, "min": GRAVITY_RANGE.0, "max": GRAVITY_RANGE.1,
                "description": "Downward acceleration in pixels per tick squared"},
            "air_resistance": {"type": "boolean", "default": d.air_resistance,
                "description": "Quadratic air drag in flight and in the prediction (key a)"},
            "bounce": {"type": "number", "default": d.bounce, "min": BOUNCE_RANGE.0, "max": BOUNCE_RANGE.1,
                "description": "Vertical speed kept on each ground bounce"},
            "friction": {"type": "number", "default": d.friction, "min": FRICTION_RANGE.0, "max": FRICTION_RANGE.1,
                "description": "Horizontal speed kept on each ground contact"}
        })
    }

    fn set_param(&mut self, name: &str, value: &Value) -> Result<(), EngineError> {
        let p = &mut self.params;
        match name {
            "gravity" => p.gravity = expect_f64(name, value, GRAVITY_RANGE.0, GRAVITY_RANGE.1)?,
            "air_resistance" => p.air_resistance = expect_bool(name, value)?,
            "bounce" => p.bounce = expect_f64(name, value, BOUNCE_RANGE.0, BOUNCE_RANGE.1)?,
            "friction" => p.friction = expect_f64(name, value, FRICTION_RANGE.0, FRICTION_RANGE.1)?,
            _ => return Err(EngineError::ParamNotFound(name.to_owned())),
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), EngineError> {
        match *event {
            InputEvent::PointerDown {
                button: PointerButton::Primary,
                pos,
            } if self.phase == Phase::Loaded && pos.distance(self.pos) <= BIRD_RADIUS => {
                self.phase = Phase::Pulling;
            }
            InputEvent::PointerMove { pos } if self.phase == Phase::Pulling => self.pull_to(pos),
            InputEvent::PointerUp {
                button: PointerButton::Primary,
                ..
            } if self.phase == Phase::Pulling => self.launch(),
            InputEvent::KeyPress { key } if key.is_char('a') => {
                self.params.air_resistance = !self.params.air_resistance;
            }
            InputEvent::KeyPress { key } if key == Key::Space || key.is_char('r') => {
                self.reset();
            }
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.phase = Phase::Loaded;
        self.pos = self.sling();
        self.velocity = DVec2::ZERO;
        self.on_ground = false;
        self.peak_y = self.pos.y;
        self.range = 0.0;
        self.path.clear();
        self.flight_ticks = 0;
    }
}
