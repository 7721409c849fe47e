#![deny(unsafe_code)]
//! Interactive particle gravity engine.
//!
//! Point particles attract each other with a softened inverse-square law and
//! respond to fixed attract/repel fields placed by the user, plus a transient
//! field that follows the pointer while a button is held. Forces, speeds, and
//! positions are all clamped (see [`physics`]) so dense clusters degrade into
//! slow, sticky motion instead of numeric blow-up.
//!
//! Three pointer modes share the buttons. Interactive mode (the default)
//! holds an attract/repel field on the pointer. Field placement drops
//! permanent fields. Orbital mode launches particles with a drag gesture.

pub mod particle;
pub mod physics;

use particle::{Field, ParticleSystem, Polarity};
use physics::ForceLaw;
use physlets_core::params::{expect_bool, expect_f64, expect_usize, param_bool, param_f64, param_usize};
use physlets_core::{DVec2, Engine, EngineError, InputEvent, Key, PointerButton, Scene, Shape, Tone, Xorshift64};
use serde_json::{json, Value};

const DEFAULT_TRAIL_LENGTH: usize = 50;
/// Particles spawned by one Space press.
const SPAWN_BATCH: usize = 10;
/// Orbital launch velocity per pixel of drag.
const LAUNCH_SCALE: f64 = 0.1;
/// Scene length of force arrows per unit force.
const FORCE_ARROW_SCALE: f64 = 20.0;
/// Scene length of velocity arrows per unit speed.
const VELOCITY_ARROW_SCALE: f64 = 10.0;
/// Radius of the dot drawn at a field's centre.
const FIELD_MARKER_RADIUS: f64 = 5.0;

/// Tunable parameters for the gravity engine.
#[derive(Debug, Clone, Copy)]
pub struct GravityParams {
    pub law: ForceLaw,
    pub trail_length: usize,
    /// Primary/secondary clicks place permanent fields.
    pub field_placement: bool,
    /// Primary drag launches a particle. Exclusive with `field_placement`.
    pub orbital_mode: bool,
    pub show_forces: bool,
    pub show_velocities: bool,
    /// Particles scattered from the seed on construction and reset.
    pub initial_particles: usize,
}

impl Default for GravityParams {
    fn default() -> Self {
        Self {
            law: ForceLaw::default(),
            trail_length: DEFAULT_TRAIL_LENGTH,
            field_placement: false,
            orbital_mode: false,
            show_forces: true,
            show_velocities: true,
            initial_particles: 0,
        }
    }
}

impl GravityParams {
    /// Extracts parameters from a JSON object, falling back to defaults.
    ///
    /// If both modes are requested, field placement wins.
    pub fn from_json(params: &Value) -> Self {
        let d = Self::default();
        let field_placement = param_bool(params, "field_placement", d.field_placement);
        Self {
            law: ForceLaw {
                gravity: param_f64(params, "gravity", d.law.gravity).clamp(0.0, 10_000.0),
                dampening: param_f64(params, "dampening", d.law.dampening).clamp(0.9, 1.0),
                speed_damping: param_f64(params, "speed_damping", d.law.speed_damping).clamp(0.0, 0.1),
                max_force: param_f64(params, "max_force", d.law.max_force).clamp(1.0, 200.0),
                soft_radius: param_f64(params, "soft_radius", d.law.soft_radius).clamp(1.0, 100.0),
                restitution: param_f64(params, "restitution", d.law.restitution).clamp(0.0, 1.0),
                time_scale: param_f64(params, "time_scale", d.law.time_scale).clamp(0.0, 2.0),
                ..d.law
            },
            trail_length: param_usize(params, "trail_length", d.trail_length).min(500),
            field_placement,
            orbital_mode: !field_placement && param_bool(params, "orbital_mode", d.orbital_mode),
            show_forces: param_bool(params, "show_forces", d.show_forces),
            show_velocities: param_bool(params, "show_velocities", d.show_velocities),
            initial_particles: param_usize(params, "initial_particles", d.initial_particles).min(1000),
        }
    }
}

/// N-body particle gravity engine.
pub struct Gravity {
    width: usize,
    height: usize,
    seed: u64,
    rng: Xorshift64,
    system: ParticleSystem,
    params: GravityParams,
    pointer: Option<DVec2>,
    attracting: bool,
    repelling: bool,
    drag_start: Option<DVec2>,
    ticks: u64,
}

impl Gravity {
    /// Creates the engine and scatters `initial_particles` at rest.
    ///
    /// Returns `EngineError::InvalidDimensions` if width or height is zero.
    pub fn new(width: usize, height: usize, seed: u64, params: GravityParams) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions);
        }
        let mut engine = Self {
            width,
            height,
            seed,
            rng: Xorshift64::new(seed),
            system: ParticleSystem::new(),
            params,
            pointer: None,
            attracting: false,
            repelling: false,
            drag_start: None,
            ticks: 0,
        };
        engine.reset();
        Ok(engine)
    }

    /// Creates a gravity engine from a JSON params object.
    pub fn from_json(width: usize, height: usize, seed: u64, params: &Value) -> Result<Self, EngineError> {
        Self::new(width, height, seed, GravityParams::from_json(params))
    }

    /// Read-only access to particles and fields.
    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    /// Mutable access for scripted setups.
    pub fn system_mut(&mut self) -> &mut ParticleSystem {
        &mut self.system
    }

    pub fn law(&self) -> &ForceLaw {
        &self.params.law
    }

    fn bounds(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64)
    }

    /// The field following the pointer, if a button is holding one.
    fn pointer_field(&self) -> Option<Field> {
        let pos = self.pointer?;
        if self.attracting {
            Some(Field::new(pos, Polarity::Attract))
        } else if self.repelling {
            Some(Field::new(pos, Polarity::Repel))
        } else {
            None
        }
    }

    fn spawn_random(&mut self, count: usize) {
        let (w, h) = (self.width as f64, self.height as f64);
        for _ in 0..count {
            let pos = self.rng.next_point(w, h);
            self.system.spawn(pos, DVec2::ZERO);
        }
    }

    fn spawn_jittered(&mut self, pos: DVec2) {
        let vel = DVec2::new(self.rng.next_signed(), self.rng.next_signed());
        self.system.spawn(pos, vel);
    }

    fn set_field_placement(&mut self, on: bool) {
        self.params.field_placement = on;
        if on {
            self.params.orbital_mode = false;
            self.drag_start = None;
        }
    }

    fn set_orbital_mode(&mut self, on: bool) {
        self.params.orbital_mode = on;
        if on {
            self.params.field_placement = false;
        } else {
            self.drag_start = None;
        }
    }

    fn pointer_down(&mut self, button: PointerButton, pos: DVec2) {
        self.pointer = Some(pos);
        match button {
            PointerButton::Primary if self.params.field_placement => {
                self.system.add_field(Field::new(pos, Polarity::Attract));
            }
            PointerButton::Primary if self.params.orbital_mode => self.drag_start = Some(pos),
            PointerButton::Primary => self.attracting = true,
            PointerButton::Secondary if self.params.field_placement => {
                self.system.add_field(Field::new(pos, Polarity::Repel));
            }
            PointerButton::Secondary => self.repelling = true,
            PointerButton::Middle => self.spawn_jittered(pos),
        }
    }

    fn pointer_up(&mut self, button: PointerButton, pos: DVec2) {
        self.pointer = Some(pos);
        match button {
            PointerButton::Primary => {
                if let Some(start) = self.drag_start.take() {
                    if self.params.orbital_mode {
                        self.system.spawn(start, (pos - start) * LAUNCH_SCALE);
                    }
                }
                self.attracting = false;
            }
            PointerButton::Secondary => self.repelling = false,
            PointerButton::Middle => {}
        }
    }

    fn key_press(&mut self, key: Key) {
        match key {
            Key::Space => self.spawn_random(SPAWN_BATCH),
            k if k.is_char('c') => self.system.clear_particles(),
            k if k.is_char('f') => self.system.clear_fields(),
            k if k.is_char('x') => self.system.clear(),
            k if k.is_char('o') => self.set_orbital_mode(!self.params.orbital_mode),
            _ => {}
        }
    }
}

impl Engine for Gravity {
    fn step(&mut self) -> Result<(), EngineError> {
        let pointer = self.pointer_field();
        let bounds = self.bounds();
        self.system
            .step(pointer.as_ref(), &self.params.law, bounds, self.params.trail_length);
        self.ticks += 1;
        Ok(())
    }

    fn scene(&self) -> Scene {
        let mut scene = Scene::new(self.width, self.height);
        let law = &self.params.law;

        for field in self.system.fields() {
            let tone = polarity_tone(field.polarity);
            scene.push(Shape::Ring {
                center: field.pos,
                radius: law.field_falloff,
                tone,
            });
            scene.disc(field.pos, FIELD_MARKER_RADIUS, tone);
        }
        if let Some(ptr) = self.pointer_field() {
            scene.push(Shape::Ring {
                center: ptr.pos,
                radius: law.field_falloff,
                tone: polarity_tone(ptr.polarity),
            });
        }
        if let (Some(start), Some(pos)) = (self.drag_start, self.pointer) {
            scene.segment(start, pos, Tone::Velocity);
        }

        for (body, trace) in self.system.bodies().iter().zip(self.system.traces()) {
            scene.polyline(trace.trail.iter().copied(), Tone::Trail);
            if self.params.show_forces {
                scene.segment(body.pos, body.pos + trace.last_force * FORCE_ARROW_SCALE, Tone::Force);
            }
            if self.params.show_velocities {
                scene.segment(body.pos, body.pos + body.vel * VELOCITY_ARROW_SCALE, Tone::Velocity);
            }
            scene.disc(body.pos, law.particle_radius, Tone::Body);
        }
        scene
    }

    fn state(&self) -> Value {
        let bodies = self.system.bodies();
        let kinetic: f64 = bodies.iter().map(|b| 0.5 * b.vel.length_squared()).sum();
        let mode = if self.params.field_placement {
            "field_placement"
        } else if self.params.orbital_mode {
            "orbital"
        } else {
            "interactive"
        };
        json!({
            "ticks": self.ticks,
            "particle_count": bodies.len(),
            "field_count": self.system.fields().len(),
            "mode": mode,
            "kinetic_energy": kinetic,
            "particles": bodies,
            "fields": self.system.fields(),
        })
    }

    fn params(&self) -> Value {
        let p = &self.params;
        json!({
            "gravity": p.law.gravity,
            "dampening": p.law.dampening,
            "speed_damping": p.law.speed_damping,
            "max_force": p.law.max_force,
            "soft_radius": p.law.soft_radius,
            "restitution": p.law.restitution,
            "time_scale": p.law.time_scale,
            "trail_length": p.trail_length,
            "field_placement": p.field_placement,
            "orbital_mode": p.orbital_mode,
            "show_forces": p.show_forces,
            "show_velocities": p.show_velocities,
            "initial_particles": p.initial_particles,
        })
    }

    fn param_schema(&self) -> Value {
        let d = GravityParams::default();
        json!({
            "gravity": {"type": "number", "default": d.law.gravity, "min": 0.0, "max": 10000.0,
                "description": "Gravity constant G for fields; particle pairs use 0.1·G"},
            "dampening": {"type": "number", "default": d.law.dampening, "min": 0.9, "max": 1.0,
                "description": "Per-tick velocity decay base"},
            "speed_damping": {"type": "number", "default": d.law.speed_damping, "min": 0.0, "max": 0.1,
                "description": "Extra decay per unit speed (exponent 1 + |v|·k)"},
            "max_force": {"type": "number", "default": d.law.max_force, "min": 1.0, "max": 200.0,
                "description": "Cap on field force and particle speed"},
            "soft_radius": {"type": "number", "default": d.law.soft_radius, "min": 1.0, "max": 100.0,
                "description": "Softening length in force denominators"},
            "restitution": {"type": "number", "default": d.law.restitution, "min": 0.0, "max": 1.0,
                "description": "Velocity kept on wall bounce"},
            "time_scale": {"type": "number", "default": d.law.time_scale, "min": 0.0, "max": 2.0,
                "description": "Multiplier on velocity and position increments"},
            "trail_length": {"type": "integer", "default": d.trail_length, "min": 0, "max": 500,
                "description": "Trail points kept per particle"},
            "field_placement": {"type": "boolean", "default": d.field_placement,
                "description": "Clicks place permanent fields (disables orbital mode)"},
            "orbital_mode": {"type": "boolean", "default": d.orbital_mode,
                "description": "Primary drag launches particles (disables field placement)"},
            "show_forces": {"type": "boolean", "default": d.show_forces,
                "description": "Draw net force arrows"},
            "show_velocities": {"type": "boolean", "default": d.show_velocities,
                "description": "Draw velocity arrows"},
            "initial_particles": {"type": "integer", "default": d.initial_particles, "min": 0, "max": 1000,
                "description": "Particles scattered on reset"}
        })
    }

    fn set_param(&mut self, name: &str, value: &Value) -> Result<(), EngineError> {
        let law = &mut self.params.law;
        match name {
            "gravity" => law.gravity = expect_f64(name, value, 0.0, 10_000.0)?,
            "dampening" => law.dampening = expect_f64(name, value, 0.9, 1.0)?,
            "speed_damping" => law.speed_damping = expect_f64(name, value, 0.0, 0.1)?,
            "max_force" => law.max_force = expect_f64(name, value, 1.0, 200.0)?,
            "soft_radius" => law.soft_radius = expect_f64(name, value, 1.0, 100.0)?,
            "restitution" => law.restitution = expect_f64(name, value, 0.0, 1.0)?,
            "time_scale" => law.time_scale = expect_f64(name, value, 0.0, 2.0)?,
            "trail_length" => self.params.trail_length = expect_usize(name, value, 0, 500)?,
            "field_placement" => {
                let on = expect_bool(name, value)?;
                self.set_field_placement(on);
            }
            "orbital_mode" => {
                let on = expect_bool(name, value)?;
                self.set_orbital_mode(on);
            }
            "show_forces" => self.params.show_forces = expect_bool(name, value)?,
            "show_velocities" => self.params.show_velocities = expect_bool(name, value)?,
            "initial_particles" => self.params.initial_particles = expect_usize(name, value, 0, 1000)?,
            _ => return Err(EngineError::ParamNotFound(name.to_owned())),
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) -> Result<(), EngineError> {
        match *event {
            InputEvent::PointerDown { button, pos } => self.pointer_down(button, pos),
            InputEvent::PointerMove { pos } => self.pointer = Some(pos),
            InputEvent::PointerUp { button, pos } => self.pointer_up(button, pos),
            InputEvent::KeyPress { key } => self.key_press(key),
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.system.clear();
        self.rng = Xorshift64::new(self.seed);
        self.pointer = None;
        self.attracting = false;
        self.repelling = false;
        self.drag_start = None;
        self.ticks = 0;
        self.spawn_random(self.params.initial_particles);
    }
}

fn polarity_tone(polarity: Polarity) -> Tone {
    match polarity {
        Polarity::Attract => Tone::Attract,
        Polarity::Repel => Tone::Repel,
    }
}
