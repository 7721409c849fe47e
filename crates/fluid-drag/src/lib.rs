#![deny(unsafe_code)]
//! Fluid resistance engine.
//!
//! Spheres and cubes are dropped into a tank of a selectable fluid and fall
//! under gravity against quadratic drag `½·ρ·v²·Cd·A` until they approach
//! terminal velocity or leave the bottom of the tank. A cloud of tracer
//! particles drifts through the fluid for visual context; tracers never
//! interact with the falling bodies.

pub mod fluid;
pub mod object;

use fluid::{Fluid, FluidProperties, REFERENCE_TEMPERATURE};
use object::{DragReport, FallingObject, ShapeKind};
use physlets_core::params::{expect_f64, expect_str, expect_usize, param_f64, param_string, param_usize};
use physlets_core::{DVec2, Engine, EngineError, InputEvent, Key, PointerButton, Scene, Shape, Tone, Xorshift64};
use serde_json::{json, Value};

/// Seconds of simulated time per tick.
pub const TICK_SECONDS: f64 = 0.016;
const DEFAULT_OBJECT_SIZE: f64 = 50.0;
const DEFAULT_TRACERS: usize = 200;
/// Objects spawn this far below the top edge.
const SPAWN_HEIGHT: f64 = 50.0;
/// Objects are removed once they fall within this distance of the bottom.
const FLOOR_MARGIN: f64 = 100.0;
/// Horizontal spawn margin, capped at a quarter of the width.
const SIDE_MARGIN: f64 = 100.0;
/// Tracer speed per axis is uniform in ±this, px/tick.
const TRACER_SPEED: f64 = 0.25;
const TRACER_RADIUS: f64 = 2.0;

/// Tunable parameters for the fluid-drag engine.
#[derive(Debug, Clone, Copy)]
pub struct FluidDragParams {
    pub fluid: Fluid,
    /// °C, 0 to 100.
    pub temperature: f64,
    /// Size of newly added objects, pixels.
    pub object_size: f64,
    pub tracers: usize,
}

impl Default for FluidDragParams {
    fn default() -> Self {
        Self {
            fluid: Fluid::Air,
            temperature: REFERENCE_TEMPERATURE,
            object_size: DEFAULT_OBJECT_SIZE,
            tracers: DEFAULT_TRACERS,
        }
    }
}

impl FluidDragParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    ///
    /// Unlike the numeric fields, an unrecognised fluid name is an error.
    pub fn from_json(params: &Value) -> Result<Self, EngineError> {
        Ok(Self {
            fluid: Fluid::from_name(&param_string(params, "fluid", Fluid::Air.name()))?,
            temperature: param_f64(params, "temperature", REFERENCE_TEMPERATURE).clamp(0.0, 100.0),
            object_size: param_f64(params, "object_size", DEFAULT_OBJECT_SIZE).clamp(20.0, 100.0),
            tracers: param_usize(params, "tracers", DEFAULT_TRACERS).min(2000),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Tracer {
    pos: DVec2,
    vel: DVec2,
}

/// Falling objects in a fluid tank.
pub struct FluidDrag {
    width: usize,
    height: usize,
    seed: u64,
    rng: Xorshift64,
    params: FluidDragParams,
    properties: FluidProperties,
    objects: Vec<FallingObject>,
    reports: Vec<DragReport>,
    tracers: Vec<Tracer>,
    removed: u64,
    ticks: u64,
}

impl FluidDrag {
    /// Creates an empty tank with tracers scattered from `seed`.
    ///
    /// Returns `EngineError::InvalidDimensions` if width or height is zero.
    pub fn new(width: usize, height: usize, seed: u64, params: FluidDragParams) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let mut engine = Self {
            width,
            height,
            seed,
            rng: Xorshift64::new(seed),
            params,
            properties: params.fluid.at_temperature(params.temperature),
            objects: Vec::new(),
            reports: Vec::new(),
            tracers: Vec::new(),
            removed: 0,
            ticks: 0,
        };
        engine.reset();
        Ok(engine)
    }

    /// Creates a fluid-drag engine from a JSON params object.
    pub fn from_json(width: usize, height: usize, seed: u64, params: &Value) -> Result<Self, EngineError> {
        Self::new(width, height, seed, FluidDragParams::from_json(params)?)
    }

    pub fn objects(&self) -> &[FallingObject] {
        &self.objects
    }

    /// Effective fluid properties at the current temperature.
    pub fn properties(&self) -> &FluidProperties {
        &self.properties
    }

    /// Drops a new object at a random horizontal position near the top.
    pub fn add_object(&mut self, shape: ShapeKind) {
        let w = self.width as f64;
        let margin = SIDE_MARGIN.min(w / 4.0);
        let x = self.rng.next_range(margin, w - margin);
        self.add_object_at(shape, x);
    }

    /// Drops a new object at horizontal position `x`.
    pub fn add_object_at(&mut self, shape: ShapeKind, x: f64) {
        let obj = FallingObject::new(shape, self.params.object_size, x, SPAWN_HEIGHT);
        self.reports.push(obj.drag(&self.properties));
        self.objects.push(obj);
    }

    pub fn clear_objects(&mut self) {
        self.objects.clear();
        self.reports.clear();
    }

    fn refresh_properties(&mut self) {
        self.properties = self.params.fluid.at_temperature(self.params.temperature);
    }

    fn scatter_tracers(&mut self) {
        let (w, h) = (self.width as f64, self.height as f64);
        self.tracers = (0..self.params.tracers)
            .map(|_| Tracer {
                pos: self.rng.next_point(w, h),
                vel: DVec2::new(self.rng.next_signed(), self.rng.next_signed()) * TRACER_SPEED,
            })
            .collect();
    }

    fn drift_tracers(&mut self) {
        let bounds = DVec2::new(self.width as f64, self.height as f64);
        for t in &mut self.tracers {
            t.pos += t.vel;
            for axis in 0..2 {
                if t.pos[axis] < 0.0 || t.pos[axis] > bounds[axis] {
                    t.vel[axis] = -t.vel[axis];
                }
                t.pos[axis] = t.pos[axis].clamp(0.0, bounds[axis]);
            }
        }
    }
}

impl Engine for FluidDrag {
    fn step(&mut self) -> Result<(), EngineError> {
        self.drift_tracers();

        let floor = self.height as f64 - FLOOR_MARGIN;
        let properties = self.properties;
        for (obj, report) in self.objects.iter_mut().zip(self.reports.iter_mut()) {
            *report = obj.advance(&properties, TICK_SECONDS);
        }

        let mut i = 0;
        while i < self.objects.len() {
            if self.objects[i].y > floor {
                self.objects.remove(i);
                self.reports.remove(i);
                self.removed += 1;
            } else {
                i += 1;
            }
        }

        self.ticks += 1;
        Ok(())
    }

    fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.width, self.height);
        for t in &self.tracers {
            scene.disc(t.pos, TRACER_RADIUS, Tone::Fluid);
        }
        let floor = self.height as f64 - FLOOR_MARGIN;
        scene.segment(DVec2::new(0.0, floor), DVec2::new(self.width as f64, floor), Tone::Pivot);
        for obj in &self.objects {
            let center = DVec2::new(obj.x, obj.y);
            match obj.shape {
                ShapeKind::Sphere => scene.disc(center, obj.size_px / 2.0, Tone::Body),
                ShapeKind::Cube => scene.push(Shape::Rect {
                    min: center - DVec2::splat(obj.size_px / 2.0),
                    size: DVec2::splat(obj.size_px),
                    tone: Tone::Secondary,
                }),
            }
        }
        scene
    }

    fn state(&self) -> Value {
        let objects: Vec<Value> = self
            .objects
            .iter()
            .zip(&self.reports)
            .map(|(obj, report)| {
                json!({
                    "shape": obj.shape,
                    "size_px": obj.size_px,
                    "x": obj.x,
                    "y": obj.y,
                    "velocity": obj.velocity,
                    "mass": obj.mass(),
                    "drag_force": report.drag_force,
                    "reynolds": report.reynolds,
                    "terminal_velocity": obj.terminal_velocity(&self.properties),
                })
            })
            .collect();
        json!({
            "ticks": self.ticks,
            "fluid": self.params.fluid,
            "properties": self.properties,
            "object_count": self.objects.len(),
            "removed": self.removed,
            "objects": objects,
        })
    }

    fn params(&self) -> Value {
        json!({
            "fluid": self.params.fluid.name(),
            "temperature": self.params.temperature,
            "object_size": self.params.object_size,
            "tracers": self.params.tracers,
        })
    }

    fn param_schema(&self) -> Value {
        let names: Vec<&str> = Fluid::ALL.iter().map(|f| f.name()).collect();
        json!({
            "fluid": {"type": "string", "default": Fluid::Air.name(), "options": names,
                "description": "Fluid preset"},
            "temperature": {"type": "number", "default": REFERENCE_TEMPERATURE, "min": 0.0, "max": 100.0,
                "description": "Temperature in °C; scales density up and viscosity down"},
            "object_size": {"type": "number", "default": DEFAULT_OBJECT_SIZE, "min": 20.0, "max": 100.0,
                "description": "Diameter or side of new objects, pixels"},
            "tracers": {"type": "integer", "default": DEFAULT_TRACERS, "min": 0, "max": 2000,
                "description": "Cosmetic fluid particles (applied on reset)"}
        })
    }

    fn set_param(&mut self, name: &str, value: &Value) -> Result<(), EngineError> {
        match name {
            "fluid" => self.params.fluid = Fluid::from_name(expect_str(name, value)?)?,
            "temperature" => self.params.temperature = expect_f64(name, value, 0.0, 100.0)?,
            "object_size" => self.params.object_size = expect_f64(name, value, 20.0, 100.0)?,
            "tracers" => self.params.tracers = expect_usize(name, value, 0, 2000)?,
            _ => return Err(EngineError::ParamNotFound(name.to_owned())),
        }
        self.refresh_properties();
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), EngineError> {
        match *event {
            InputEvent::PointerDown {
                button: PointerButton::Primary,
                pos,
            } => self.add_object_at(ShapeKind::Sphere, pos.x),
            InputEvent::PointerDown {
                button: PointerButton::Secondary,
                pos,
            } => self.add_object_at(ShapeKind::Cube, pos.x),
            InputEvent::KeyPress { key } => match key {
                k if k.is_char('s') => self.add_object(ShapeKind::Sphere),
                k if k.is_char('b') => self.add_object(ShapeKind::Cube),
                k if k.is_char('c') => self.clear_objects(),
                Key::Char(_) | Key::Space => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.rng = Xorshift64::new(self.seed);
        self.refresh_properties();
        self.clear_objects();
        self.scatter_tracers();
        self.removed = 0;
        self.ticks = 0;
    }
}
