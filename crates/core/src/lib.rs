#![deny(unsafe_code)]
//! Core types and traits for the physlets simulation applets.
//!
//! Provides the `Engine` trait, the fixed-rate `Driver` with its `Renderer`
//! and `Clock` seams, `InputEvent`s, the `Scene` render snapshot, the
//! `Xorshift64` PRNG, `Scenario` run configuration, and parameter helpers.

pub mod driver;
pub mod engine;
pub mod error;
pub mod input;
pub mod params;
pub mod prng;
pub mod scenario;
pub mod scene;

pub use driver::{tick_interval, Clock, Driver, Renderer, SystemClock, Tick};
pub use engine::Engine;
pub use error::EngineError;
pub use glam::DVec2;
pub use input::{InputEvent, Key, PointerButton};
pub use prng::Xorshift64;
pub use scenario::{Scenario, ScriptedEvent};
pub use scene::{Scene, Shape, Tone};
