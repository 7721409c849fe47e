//! Falling bodies and the quadratic drag model.
//!
//! Sizes and positions are in pixels, physics in SI units. One metre is
//! [`PIXELS_PER_METER`] pixels.

use crate::fluid::FluidProperties;
use serde::Serialize;
use std::f64::consts::PI;

pub const PIXELS_PER_METER: f64 = 100.0;
pub const GRAVITY: f64 = 9.81;
/// Body density, kg/m³. Every object is as dense as water.
pub const BODY_DENSITY: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Sphere,
    Cube,
}

/// Frontal area in m² for a body whose size (diameter or side) is `size_m`.
pub fn cross_section_area(kind: ShapeKind, size_m: f64) -> f64 {
    match kind {
        ShapeKind::Sphere => PI * (size_m / 2.0).powi(2),
        ShapeKind::Cube => size_m * size_m,
    }
}

/// One body falling through the fluid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FallingObject {
    pub shape: ShapeKind,
    /// Diameter (sphere) or side (cube), pixels.
    pub size_px: f64,
    pub x: f64,
    pub y: f64,
    /// Downward velocity, m/s.
    pub velocity: f64,
}

/// Per-object readouts from the latest tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DragReport {
    /// Newtons, opposing motion.
    pub drag_force: f64,
    pub reynolds: f64,
}

impl FallingObject {
    /// A body at rest at `(x, y)`.
    pub fn new(shape: ShapeKind, size_px: f64, x: f64, y: f64) -> Self {
        Self {
            shape,
            size_px,
            x,
            y,
            velocity: 0.0,
        }
    }

    /// Characteristic length in metres.
    pub fn size_m(&self) -> f64 {
        self.size_px / PIXELS_PER_METER
    }

    /// `size³ · 1000` kg for both shapes.
    pub fn mass(&self) -> f64 {
        self.size_m().powi(3) * BODY_DENSITY
    }

    pub fn area(&self) -> f64 {
        cross_section_area(self.shape, self.size_m())
    }

    /// Speed at which drag balances weight: `√(2mg / ρ·Cd·A)`.
    pub fn terminal_velocity(&self, fluid: &FluidProperties) -> f64 {
        (2.0 * self.mass() * GRAVITY / (fluid.density * fluid.drag_coefficient * self.area())).sqrt()
    }

    /// Drag force and Reynolds number at the current velocity.
    pub fn drag(&self, fluid: &FluidProperties) -> DragReport {
        let v = self.velocity;
        DragReport {
            drag_force: 0.5 * fluid.density * v * v.abs() * fluid.drag_coefficient * self.area(),
            reynolds: fluid.density * v.abs() * self.size_m() / fluid.viscosity,
        }
    }

    /// Advances by `dt` seconds with one explicit Euler step.
    ///
    /// Returns the readouts computed from the velocity at the start of the step.
    pub fn advance(&mut self, fluid: &FluidProperties, dt: f64) -> DragReport {
        let report = self.drag(fluid);
        let acceleration = GRAVITY - report.drag_force / self.mass();
        self.velocity += acceleration * dt;
        self.y += self.velocity * dt * PIXELS_PER_METER;
        report
    }
}
