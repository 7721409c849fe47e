//! Error types shared by every physlets crate.

use thiserror::Error;

/// Errors produced by engine, driver, and configuration operations.
///
/// Numeric trouble inside a `step` is never reported through this type:
/// integrators clamp or soften instead of failing.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Width or height was zero (or their product overflowed) when sizing a world.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A driver was asked to tick at a rate that is zero, negative, or not finite.
    #[error("invalid tick rate: {0} Hz (must be positive, finite, and give a representable period)")]
    InvalidTickRate(f64),

    /// A requested parameter name is not recognized by the engine.
    #[error("parameter not found: {0}")]
    ParamNotFound(String),

    /// A parameter existed but had the wrong JSON type.
    #[error("parameter type mismatch for '{name}': expected {expected}, got {got}")]
    ParamTypeMismatch {
        name: String,
        expected: String,
        got: String,
    },

    /// User-supplied input was rejected (non-numeric text, unknown preset, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No engine is registered under this name.
    #[error("unknown engine: {0}")]
    UnknownEngine(String),

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(String),
}
