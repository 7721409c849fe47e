//! Bodies, fields, and the visual traces kept alongside them.
//!
//! Physics state ([`Body`]) and visualization state ([`Trace`]) are stored in
//! parallel vectors inside [`ParticleSystem`] so the integrator can run over
//! plain bodies without knowing trails exist.

use crate::physics::{self, ForceLaw};
use glam::DVec2;
use serde::Serialize;
use std::collections::VecDeque;

/// Position and velocity of one particle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Body {
    pub pos: DVec2,
    pub vel: DVec2,
}

impl Body {
    /// A body at rest.
    pub fn at(pos: DVec2) -> Self {
        Self {
            pos,
            vel: DVec2::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Attract,
    Repel,
}

impl Polarity {
    /// +1 toward the source, −1 away from it.
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Attract => 1.0,
            Polarity::Repel => -1.0,
        }
    }
}

/// A fixed point source of attraction or repulsion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Field {
    pub pos: DVec2,
    pub polarity: Polarity,
}

impl Field {
    pub fn new(pos: DVec2, polarity: Polarity) -> Self {
        Self { pos, polarity }
    }
}

/// Render-only history for one particle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trace {
    /// Net force from the latest tick.
    pub last_force: DVec2,
    /// Recent positions, oldest first.
    pub trail: VecDeque<DVec2>,
}

impl Trace {
    /// Records one tick, evicting the oldest points beyond `capacity`.
    pub fn record(&mut self, pos: DVec2, force: DVec2, capacity: usize) {
        self.last_force = force;
        self.trail.push_back(pos);
        while self.trail.len() > capacity {
            self.trail.pop_front();
        }
    }
}

/// All particles and fields of one simulation.
///
/// `bodies[i]` and `traces[i]` always describe the same particle.
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    bodies: Vec<Body>,
    traces: Vec<Trace>,
    fields: Vec<Field>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Adds a particle with an empty trail.
    pub fn spawn(&mut self, pos: DVec2, vel: DVec2) {
        self.bodies.push(Body { pos, vel });
        self.traces.push(Trace::default());
    }

    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn clear_particles(&mut self) {
        self.bodies.clear();
        self.traces.clear();
    }

    pub fn clear_fields(&mut self) {
        self.fields.clear();
    }

    pub fn clear(&mut self) {
        self.clear_particles();
        self.clear_fields();
    }

    /// Integrates one tick, then appends each new position to its trail.
    pub fn step(&mut self, pointer: Option<&Field>, law: &ForceLaw, bounds: DVec2, trail_capacity: usize) {
        let forces = physics::step(&mut self.bodies, &self.fields, pointer, law, bounds);
        for ((trace, body), force) in self.traces.iter_mut().zip(&self.bodies).zip(forces) {
            trace.record(body.pos, force, trail_capacity);
        }
    }
}
