#![deny(unsafe_code)]
//! Colliding blocks engine.
//!
//! A light block and a heavy block slide on a frictionless floor between two
//! walls. Block-block contacts use the one-dimensional elastic result blended
//! toward "no exchange" by the elasticity `e`:
//!
//! ```text
//! v' = v + (v_elastic − v)·e
//! ```
//!
//! Wall contacts reverse velocity and scale it by `e`. With `e = 1`, the small
//! block starting at rest, and the large block approaching, the collision
//! count spells out digits of π for mass ratios of 100ⁿ.

use physlets_core::params::{expect_f64, param_f64};
use physlets_core::{DVec2, Engine, EngineError, InputEvent, Scene, Shape, Tone};
use serde::Serialize;
use serde_json::{json, Value};

/// Seconds per tick.
pub const TICK_SECONDS: f64 = 0.01;
pub const PIXELS_PER_METER: f64 = 100.0;
const SMALL_MASS: f64 = 1.0;
const SMALL_WIDTH: f64 = 0.5;
const SMALL_START: f64 = 2.0;
const LARGE_WIDTH: f64 = 1.0;
const LARGE_START: f64 = 5.0;
const MASS_RATIO_RANGE: (f64, f64) = (0.01, 10_000.0);
const VELOCITY_RANGE: (f64, f64) = (-2.0, 2.0);
/// Floor sits at this fraction of the world height.
const FLOOR_FRACTION: f64 = 0.75;
/// Velocity arrow length per m/s, pixels.
const ARROW_SCALE: f64 = 25.0;

/// Tunable parameters. Masses and velocities apply on reset; elasticity is live.
#[derive(Debug, Clone, Copy)]
pub struct MomentumParams {
    /// Large block mass over small block mass.
    pub mass_ratio: f64,
    /// Initial velocity of the small block, m/s.
    pub velocity1: f64,
    /// Initial velocity of the large block, m/s.
    pub velocity2: f64,
    /// Restitution, 0 (no exchange) to 1 (elastic).
    pub elasticity: f64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            mass_ratio: 1.0,
            velocity1: 2.0,
            velocity2: 0.0,
            elasticity: 1.0,
        }
    }
}

impl MomentumParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        Self {
            mass_ratio: param_f64(params, "mass_ratio", d.mass_ratio).clamp(MASS_RATIO_RANGE.0, MASS_RATIO_RANGE.1),
            velocity1: param_f64(params, "velocity1", d.velocity1).clamp(VELOCITY_RANGE.0, VELOCITY_RANGE.1),
            velocity2: param_f64(params, "velocity2", d.velocity2).clamp(VELOCITY_RANGE.0, VELOCITY_RANGE.1),
            elasticity: param_f64(params, "elasticity", d.elasticity).clamp(0.0, 1.0),
        }
    }
}

/// One block on the line. Positions and widths are metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Block {
    /// Left edge.
    pub x: f64,
    pub width: f64,
    pub mass: f64,
    pub velocity: f64,
}

impl Block {
    pub fn momentum(&self) -> f64 {
        self.mass * self.velocity
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity * self.velocity
    }

    fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// Post-collision velocities `(v1', v2')` for masses `m1`, `m2` with
/// restitution blend `e`.
pub fn collide(m1: f64, v1: f64, m2: f64, v2: f64, e: f64) -> (f64, f64) {
    let total = m1 + m2;
    let v1_elastic = ((m1 - m2) * v1 + 2.0 * m2 * v2) / total;
    let v2_elastic = ((m2 - m1) * v2 + 2.0 * m1 * v1) / total;
    (v1 + (v1_elastic - v1) * e, v2 + (v2_elastic - v2) * e)
}

/// Two blocks between walls at 0 and the world width.
pub struct Momentum {
    width: usize,
    height: usize,
    params: MomentumParams,
    small: Block,
    large: Block,
    collisions: u64,
    ticks: u64,
}

impl Momentum {
    /// Creates the blocks at their start positions.
    ///
    /// Returns `EngineError::InvalidDimensions` if either dimension is zero or
    /// the world is too narrow to hold both blocks side by side at their start.
    pub fn new(width: usize, height: usize, params: MomentumParams) -> Result<Self, EngineError> {
        if width == 0 || height == 0 || (width as f64) / PIXELS_PER_METER < LARGE_START + LARGE_WIDTH {
            return Err(EngineError::InvalidDimensions);
        }
        let mut engine = Self {
            width,
            height,
            params,
            small: Block {
                x: SMALL_START,
                width: SMALL_WIDTH,
                mass: SMALL_MASS,
                velocity: 0.0,
            },
            large: Block {
                x: LARGE_START,
                width: LARGE_WIDTH,
                mass: SMALL_MASS,
                velocity: 0.0,
            },
            collisions: 0,
            ticks: 0,
        };
        engine.reset();
        Ok(engine)
    }

    /// Creates the engine from a JSON params object. The seed is unused.
    pub fn from_json(width: usize, height: usize, _seed: u64, params: &Value) -> Result<Self, EngineError> {
        Self::new(width, height, MomentumParams::from_json(params))
    }

    pub fn blocks(&self) -> (&Block, &Block) {
        (&self.small, &self.large)
    }

    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    pub fn total_momentum(&self) -> f64 {
        self.small.momentum() + self.large.momentum()
    }

    pub fn total_energy(&self) -> f64 {
        self.small.kinetic_energy() + self.large.kinetic_energy()
    }

    fn world_width(&self) -> f64 {
        self.width as f64 / PIXELS_PER_METER
    }

    /// Reflects a block off either wall, counting a collision only when it
    /// was moving into the wall.
    fn bounce_walls(block: &mut Block, world: f64, e: f64) -> u64 {
        if block.x <= 0.0 {
            block.x = 0.0;
            if block.velocity < 0.0 {
                block.velocity = -block.velocity * e;
                return 1;
            }
        } else if block.right() >= world {
            block.x = world - block.width;
            if block.velocity > 0.0 {
                block.velocity = -block.velocity * e;
                return 1;
            }
        }
        0
    }
}

impl Engine for Momentum {
    fn step(&mut self) -> Result<(), EngineError> {
        let e = self.params.elasticity;
        let world = self.world_width();

        self.small.x += self.small.velocity * TICK_SECONDS;
        self.large.x += self.large.velocity * TICK_SECONDS;

        self.collisions += Self::bounce_walls(&mut self.small, world, e);
        self.collisions += Self::bounce_walls(&mut self.large, world, e);

        // The small block always stays left of the large one; any overlap,
        // including a tunnel straight through, is a contact.
        if self.small.right() > self.large.x {
            if self.small.velocity > self.large.velocity {
                let (v1, v2) = collide(
                    self.small.mass,
                    self.small.velocity,
                    self.large.mass,
                    self.large.velocity,
                    e,
                );
                self.small.velocity = v1;
                self.large.velocity = v2;
                self.collisions += 1;
            }
            self.small.x = self.large.x - self.small.width;
            if self.small.x < 0.0 {
                self.small.x = 0.0;
                self.large.x = self.small.width;
            }
        }

        self.ticks += 1;
        Ok(())
    }

    fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.width, self.height);
        let floor = self.height as f64 * FLOOR_FRACTION;
        scene.segment(DVec2::new(0.0, floor), DVec2::new(self.width as f64, floor), Tone::Pivot);
        for (block, tone) in [(&self.small, Tone::Body), (&self.large, Tone::Secondary)] {
            let side = block.width * PIXELS_PER_METER;
            let min = DVec2::new(block.x * PIXELS_PER_METER, floor - side);
            scene.push(Shape::Rect {
                min,
                size: DVec2::splat(side),
                tone,
            });
            let mid = min + DVec2::splat(side / 2.0);
            scene.segment(mid, mid + DVec2::new(block.velocity * ARROW_SCALE, 0.0), Tone::Velocity);
        }
        scene
    }

    fn state(&self) -> Value {
        json!({
            "ticks": self.ticks,
            "collisions": self.collisions,
            "total_momentum": self.total_momentum(),
            "total_energy": self.total_energy(),
            "small": self.small,
            "large": self.large,
        })
    }

    fn params(&self) -> Value {
        json!({
            "mass_ratio": self.params.mass_ratio,
            "velocity1": self.params.velocity1,
            "velocity2": self.params.velocity2,
            "elasticity": self.params.elasticity,
        })
    }

    fn param_schema(&self) -> Value {
        let d = MomentumParams::default();
        json!({
            "mass_ratio": {"type": "number", "default": d.mass_ratio,
                "min": MASS_RATIO_RANGE.0, "max": MASS_RATIO_RANGE.1,
                "description": "Large block mass in units of the small block (applied on reset)"},
            "velocity1": {"type": "number", "default": d.velocity1,
                "min": VELOCITY_RANGE.0, "max": VELOCITY_RANGE.1,
                "description": "Small block initial velocity, m/s (applied on reset)"},
            "velocity2": {"type": "number", "default": d.velocity2,
                "min": VELOCITY_RANGE.0, "max": VELOCITY_RANGE.1,
                "description": "Large block initial velocity, m/s (applied on reset)"},
            "elasticity": {"type": "number", "default": d.elasticity, "min": 0.0, "max": 1.0,
                "description": "Restitution for block and wall contacts"}
        })
    }

    fn set_param(&mut self, name: &str, value: &Value) -> Result<(), EngineError> {
        let p = &mut self.params;
        match name {
            "mass_ratio" => p.mass_ratio = expect_f64(name, value, MASS_RATIO_RANGE.0, MASS_RATIO_RANGE.1)?,
            "velocity1" => p.velocity1 = expect_f64(name, value, VELOCITY_RANGE.0, VELOCITY_RANGE.1)?,
            "velocity2" => p.velocity2 = expect_f64(name, value, VELOCITY_RANGE.0, VELOCITY_RANGE.1)?,
            "elasticity" => p.elasticity = expect_f64(name, value, 0.0, 1.0)?,
            _ => return Err(EngineError::ParamNotFound(name.to_owned())),
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), EngineError> {
        if let InputEvent::KeyPress { key } = event {
            if key.is_char('r') {
                self.reset();
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        let p = self.params;
        self.small = Block {
            x: SMALL_START,
            width: SMALL_WIDTH,
            mass: SMALL_MASS,
            velocity: p.velocity1,
        };
        self.large = Block {
            x: LARGE_START,
            width: LARGE_WIDTH,
            mass: SMALL_MASS * p.mass_ratio,
            velocity: p.velocity2,
        };
        self.collisions = 0;
        self.ticks = 0;
    }
}
