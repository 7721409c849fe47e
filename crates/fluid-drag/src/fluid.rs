//! Fluid presets and their temperature adjustment.

use physlets_core::EngineError;
use serde::Serialize;

/// Drag coefficient shared by every preset (smooth sphere, subcritical flow).
pub const DRAG_COEFFICIENT: f64 = 0.47;
/// Reference temperature of the presets, °C.
pub const REFERENCE_TEMPERATURE: f64 = 25.0;
/// Fractional property change per °C away from the reference.
const TEMPERATURE_SENSITIVITY: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fluid {
    Air,
    Water,
    Oil,
    Honey,
    Glycerin,
}

/// Bulk properties the drag model reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluidProperties {
    /// kg/m³
    pub density: f64,
    /// Dynamic viscosity, Pa·s.
    pub viscosity: f64,
    pub drag_coefficient: f64,
}

impl Fluid {
    pub const ALL: [Fluid; 5] = [Fluid::Air, Fluid::Water, Fluid::Oil, Fluid::Honey, Fluid::Glycerin];

    /// Looks up a preset by name, ignoring case.
    pub fn from_name(name: &str) -> Result<Self, EngineError> {
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|f| f.name()).collect();
                EngineError::InvalidInput(format!("unknown fluid '{name}' (expected one of: {})", known.join(", ")))
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            Fluid::Air => "air",
            Fluid::Water => "water",
            Fluid::Oil => "oil",
            Fluid::Honey => "honey",
            Fluid::Glycerin => "glycerin",
        }
    }

    /// Properties at the 25 °C reference.
    pub fn properties(self) -> FluidProperties {
        let (density, viscosity) = match self {
            Fluid::Air => (1.225, 1.81e-5),
            Fluid::Water => (997.0, 8.9e-4),
            Fluid::Oil => (850.0, 0.1),
            Fluid::Honey => (1420.0, 10.0),
            Fluid::Glycerin => (1261.0, 1.41),
        };
        FluidProperties {
            density,
            viscosity,
            drag_coefficient: DRAG_COEFFICIENT,
        }
    }

    /// Preset properties scaled for `celsius`.
    ///
    /// With `f = 1 + (T − 25)·0.01`, density is multiplied by `f` and
    /// viscosity divided by it. Always derived from the preset, so repeated
    /// temperature changes do not compound.
    pub fn at_temperature(self, celsius: f64) -> FluidProperties {
        let base = self.properties();
        let factor = 1.0 + (celsius - REFERENCE_TEMPERATURE) * TEMPERATURE_SENSITIVITY;
        FluidProperties {
            density: base.density * factor,
            viscosity: base.viscosity / factor,
            ..base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(Fluid::from_name("Honey").unwrap(), Fluid::Honey);
        assert_eq!(Fluid::from_name(" WATER ").unwrap(), Fluid::Water);
    }

    #[test]
    fn from_name_rejects_unknown_fluid() {
        let err = Fluid::from_name("mercury").unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(ref m) if m.contains("glycerin")));
    }

    #[test]
    fn reference_temperature_leaves_preset_unchanged() {
        for fluid in Fluid::ALL {
            assert_eq!(fluid.at_temperature(REFERENCE_TEMPERATURE), fluid.properties());
        }
    }

    #[test]
    fn warmer_fluid_is_denser_and_thinner() {
        let cold = Fluid::Water.at_temperature(25.0);
        let warm = Fluid::Water.at_temperature(75.0);
        assert!((warm.density - 997.0 * 1.5).abs() < 1e-9);
        assert!((warm.viscosity - 8.9e-4 / 1.5).abs() < 1e-15);
        assert!(warm.viscosity < cold.viscosity);
    }

    #[test]
    fn temperature_changes_do_not_compound() {
        let once = Fluid::Oil.at_temperature(60.0);
        let _ = Fluid::Oil.at_temperature(90.0);
        assert_eq!(Fluid::Oil.at_temperature(60.0), once);
    }
}
