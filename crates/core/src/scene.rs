//! Toolkit-independent render snapshot.
//!
//! Engines describe what to draw as a flat list of [`Shape`]s in world
//! (pixel) coordinates, tagged with a semantic [`Tone`]. Backends own the
//! drawing surface and decide actual colours. A `Scene` is built fresh from
//! engine state each frame, so a renderer never observes a half-written step.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Semantic colour role. Backends map each tone to a concrete colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Background,
    /// Primary simulated body (bob, particle, falling object).
    Body,
    /// Second body where an applet distinguishes two.
    Secondary,
    /// Fixed anchor points and rods.
    Pivot,
    Attract,
    Repel,
    Trail,
    Force,
    Velocity,
    /// Ambient medium (fluid tracers, floor).
    Fluid,
}

/// A single drawable primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Shape {
    /// Filled circle.
    Disc { center: DVec2, radius: f64, tone: Tone },
    /// Circle outline.
    Ring { center: DVec2, radius: f64, tone: Tone },
    /// Filled axis-aligned rectangle with `min` as its top-left corner.
    Rect { min: DVec2, size: DVec2, tone: Tone },
    /// Straight line.
    Segment { from: DVec2, to: DVec2, tone: Tone },
    /// Open polyline through `points` in order.
    Polyline { points: Vec<DVec2>, tone: Tone },
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    pub shapes: Vec<Shape>,
}

impl Scene {
    /// Creates an empty scene of the given world size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            shapes: Vec::new(),
        }
    }

    /// Appends a shape.
    pub fn push(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Appends a filled disc.
    pub fn disc(&mut self, center: DVec2, radius: f64, tone: Tone) {
        self.push(Shape::Disc {
            center,
            radius,
            tone,
        });
    }

    /// Appends a line segment.
    pub fn segment(&mut self, from: DVec2, to: DVec2, tone: Tone) {
        self.push(Shape::Segment { from, to, tone });
    }

    /// Appends a polyline. Fewer than two points draws nothing, so it is skipped.
    pub fn polyline(&mut self, points: impl IntoIterator<Item = DVec2>, tone: Tone) {
        let points: Vec<DVec2> = points.into_iter().collect();
        if points.len() >= 2 {
            self.push(Shape::Polyline { points, tone });
        }
    }

    /// Number of shapes with the given tone.
    pub fn count_tone(&self, tone: Tone) -> usize {
        self.shapes.iter().filter(|s| s.tone() == tone).count()
    }
}

impl Shape {
    /// The tone this shape is drawn with.
    pub fn tone(&self) -> Tone {
        match self {
            Shape::Disc { tone, .. }
            | Shape::Ring { tone, .. }
            | Shape::Rect { tone, .. }
            | Shape::Segment { tone, .. }
            | Shape::Polyline { tone, .. } => *tone,
        }
    }
}
