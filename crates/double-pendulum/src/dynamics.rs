//! Equations of motion for the planar double pendulum.
//!
//! Angles are measured from the downward vertical, so a bob hangs straight
//! down at θ = 0. Lengths are in world units (pixels) and the gravity constant
//! is a free visual scale rather than 9.81 m/s².
//!
//! Everything here is a pure function of its inputs. There is no divergence
//! guard: near-singular configurations and large excursions are accepted
//! behaviour of explicit Euler on a chaotic system.

use physlets_core::DVec2;
use std::f64::consts::FRAC_PI_4;

/// Gravity scale tuned for visually pleasing motion at ~100 px arm lengths.
pub const DEFAULT_GRAVITY: f64 = 100.0;
/// Integration step per substep.
pub const DEFAULT_DT: f64 = 1.0 / 240.0;
/// Substeps per driver tick.
pub const DEFAULT_SUBSTEPS: usize = 6;

/// Generalized coordinates, velocities, and the mutable physical constants.
///
/// `alpha1`/`alpha2` hold the accelerations from the most recent substep.
/// They are kept for display only and never feed back into integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendulumState {
    pub theta1: f64,
    pub theta2: f64,
    pub omega1: f64,
    pub omega2: f64,
    pub alpha1: f64,
    pub alpha2: f64,
    pub length1: f64,
    pub length2: f64,
    pub mass1: f64,
    pub mass2: f64,
}

impl Default for PendulumState {
    /// Both arms at 45°, at rest, l = 100, m = 2.
    fn default() -> Self {
        Self {
            theta1: FRAC_PI_4,
            theta2: FRAC_PI_4,
            omega1: 0.0,
            omega2: 0.0,
            alpha1: 0.0,
            alpha2: 0.0,
            length1: 100.0,
            length2: 100.0,
            mass1: 2.0,
            mass2: 2.0,
        }
    }
}

/// Kinetic and potential energy, with potential measured from the pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Energy {
    pub kinetic: f64,
    pub potential: f64,
}

impl Energy {
    pub fn total(&self) -> f64 {
        self.kinetic + self.potential
    }
}

/// Closed-form angular accelerations (α1, α2) for the current state.
///
/// Both share the denominator factor `2m1 + m2 − m2·cos(2θ1 − 2θ2)`, which
/// stays ≥ 2m1 for positive masses.
pub fn accelerations(s: &PendulumState, gravity: f64) -> (f64, f64) {
    let (t1, t2) = (s.theta1, s.theta2);
    let (w1, w2) = (s.omega1, s.omega2);
    let (l1, l2) = (s.length1, s.length2);
    let (m1, m2) = (s.mass1, s.mass2);
    let g = gravity;

    let delta = t1 - t2;
    let shared = 2.0 * m1 + m2 - m2 * (2.0 * t1 - 2.0 * t2).cos();

    let alpha1 = (-g * (2.0 * m1 + m2) * t1.sin()
        - m2 * g * (t1 - 2.0 * t2).sin()
        - 2.0 * delta.sin() * m2 * (w2 * w2 * l2 + w1 * w1 * l1 * delta.cos()))
        / (l1 * shared);

    let alpha2 = (2.0
        * delta.sin()
        * (w1 * w1 * l1 * (m1 + m2) + g * (m1 + m2) * t1.cos() + w2 * w2 * l2 * m2 * delta.cos()))
        / (l2 * shared);

    (alpha1, alpha2)
}

/// Advances `s` by `substeps` explicit Euler substeps of length `dt`.
///
/// Each substep updates velocities first, then angles from the new
/// velocities. Lengths and masses are re-read every substep, so parameter
/// writes between ticks take effect immediately. Zero substeps is a no-op.
pub fn step(s: &mut PendulumState, gravity: f64, substeps: usize, dt: f64) {
    for _ in 0..substeps {
        let (alpha1, alpha2) = accelerations(s, gravity);
        s.alpha1 = alpha1;
        s.alpha2 = alpha2;
        s.omega1 += alpha1 * dt;
        s.omega2 += alpha2 * dt;
        s.theta1 += s.omega1 * dt;
        s.theta2 += s.omega2 * dt;
    }
}

/// Total mechanical energy of the system.
pub fn energy(s: &PendulumState, gravity: f64) -> Energy {
    let (l1, l2) = (s.length1, s.length2);
    let (m1, m2) = (s.mass1, s.mass2);
    let (w1, w2) = (s.omega1, s.omega2);

    let kinetic = 0.5 * (m1 + m2) * l1 * l1 * w1 * w1
        + 0.5 * m2 * l2 * l2 * w2 * w2
        + m2 * l1 * l2 * w1 * w2 * (s.theta1 - s.theta2).cos();
    let potential = -(m1 + m2) * gravity * l1 * s.theta1.cos() - m2 * gravity * l2 * s.theta2.cos();

    Energy { kinetic, potential }
}

/// Screen positions of both bobs for a pivot at `pivot` (y grows downward).
pub fn bob_positions(s: &PendulumState, pivot: DVec2) -> (DVec2, DVec2) {
    let bob1 = pivot + s.length1 * DVec2::new(s.theta1.sin(), s.theta1.cos());
    let bob2 = bob1 + s.length2 * DVec2::new(s.theta2.sin(), s.theta2.cos());
    (bob1, bob2)
}

/// Angle of the upper arm that points from `pivot` toward `pointer`.
pub fn angle_toward(pivot: DVec2, pointer: DVec2) -> f64 {
    let d = pointer - pivot;
    d.x.atan2(d.y)
}

/// Direct manipulation: sets θ1 and stops both arms.
///
/// A discontinuous reset, outside the continuous-time contract of [`step`].
pub fn grab(s: &mut PendulumState, theta1: f64) {
    s.theta1 = theta1;
    s.omega1 = 0.0;
    s.omega2 = 0.0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn rest_state() -> PendulumState {
        PendulumState::default()
    }

    // ---- Accelerations ----

    #[test]
    fn accelerations_at_rest_45_degrees_match_closed_form() {
        let (a1, a2) = accelerations(&rest_state(), DEFAULT_GRAVITY);
        // (-600·sin45 + 200·sin45) / 400 = -sin45
        assert!((a1 + FRAC_PI_4.sin()).abs() < 1e-12, "alpha1 = {a1}");
        assert!(a2.abs() < 1e-12, "aligned arms at rest: alpha2 = {a2}");
    }

    #[test]
    fn hanging_straight_down_is_an_equilibrium() {
        let s = PendulumState {
            theta1: 0.0,
            theta2: 0.0,
            ..rest_state()
        };
        let (a1, a2) = accelerations(&s, DEFAULT_GRAVITY);
        assert_eq!(a1, 0.0);
        assert_eq!(a2, 0.0);
    }

    #[test]
    fn zero_gravity_at_rest_does_not_accelerate() {
        let (a1, a2) = accelerations(&rest_state(), 0.0);
        assert_eq!(a1, 0.0);
        assert_eq!(a2, 0.0);
    }

    // ---- Step ----

    #[test]
    fn one_tick_from_45_degrees_moves_both_arms() {
        let mut s = rest_state();
        step(&mut s, DEFAULT_GRAVITY, 6, DEFAULT_DT);
        assert!(s.omega1 != 0.0, "omega1 should be nonzero");
        assert!(s.omega2 != 0.0, "omega2 should be nonzero");
        assert!(s.theta1 != FRAC_PI_4, "theta1 should have moved");
        assert!(s.theta2 != FRAC_PI_4, "theta2 should have moved");
        // Dominant term -g(2m1+m2)sin(pi/4) is negative.
        assert!(s.alpha1 < 0.0, "alpha1 = {}", s.alpha1);
        assert!(s.omega1 < 0.0, "omega1 = {}", s.omega1);
    }

    #[test]
    fn zero_substeps_is_a_no_op() {
        let mut s = rest_state();
        step(&mut s, DEFAULT_GRAVITY, 0, DEFAULT_DT);
        assert_eq!(s, rest_state());
    }

    #[test]
    fn velocities_update_before_angles() {
        // With omega = 0, a single substep must still move theta1 because the
        // freshly updated omega1 is used for the position update.
        let mut s = rest_state();
        step(&mut s, DEFAULT_GRAVITY, 1, DEFAULT_DT);
        let expected_omega1 = -FRAC_PI_4.sin() * DEFAULT_DT;
        assert!((s.omega1 - expected_omega1).abs() < 1e-15);
        assert!((s.theta1 - (FRAC_PI_4 + expected_omega1 * DEFAULT_DT)).abs() < 1e-15);
    }

    #[test]
    fn step_is_deterministic() {
        let mut a = PendulumState {
            theta1: 2.9,
            theta2: -1.1,
            ..rest_state()
        };
        let mut b = a;
        for _ in 0..500 {
            step(&mut a, DEFAULT_GRAVITY, DEFAULT_SUBSTEPS, DEFAULT_DT);
            step(&mut b, DEFAULT_GRAVITY, DEFAULT_SUBSTEPS, DEFAULT_DT);
        }
        assert_eq!(a.theta1.to_bits(), b.theta1.to_bits());
        assert_eq!(a.theta2.to_bits(), b.theta2.to_bits());
    }

    #[test]
    fn angles_are_not_wrapped() {
        let mut s = PendulumState {
            theta1: PI,
            theta2: PI,
            omega1: 20.0,
            omega2: 20.0,
            ..rest_state()
        };
        for _ in 0..200 {
            step(&mut s, DEFAULT_GRAVITY, DEFAULT_SUBSTEPS, DEFAULT_DT);
        }
        assert!(
            s.theta1.abs() > 2.0 * PI || s.theta2.abs() > 2.0 * PI,
            "fast spin should carry an angle past 2π: ({}, {})",
            s.theta1,
            s.theta2
        );
    }

    // ---- Energy ----

    #[test]
    fn energy_drift_stays_within_five_percent_over_1000_ticks() {
        let mut s = rest_state();
        let e0 = energy(&s, DEFAULT_GRAVITY).total();
        for i in 0..1000 {
            step(&mut s, DEFAULT_GRAVITY, DEFAULT_SUBSTEPS, DEFAULT_DT);
            let e = energy(&s, DEFAULT_GRAVITY).total();
            let drift = (e - e0).abs() / e0.abs();
            assert!(drift < 0.05, "energy drift {drift} at tick {i}");
        }
    }

    #[test]
    fn energy_at_rest_is_all_potential() {
        let e = energy(&rest_state(), DEFAULT_GRAVITY);
        assert_eq!(e.kinetic, 0.0);
        let expected = -(4.0 * 100.0 * 100.0 + 2.0 * 100.0 * 100.0) * FRAC_PI_4.cos();
        assert!((e.potential - expected).abs() < 1e-9);
    }

    // ---- Geometry & manipulation ----

    #[test]
    fn bob_positions_hang_below_pivot_at_zero_angle() {
        let s = PendulumState {
            theta1: 0.0,
            theta2: 0.0,
            ..rest_state()
        };
        let (b1, b2) = bob_positions(&s, DVec2::new(400.0, 200.0));
        assert!((b1 - DVec2::new(400.0, 300.0)).length() < 1e-12);
        assert!((b2 - DVec2::new(400.0, 400.0)).length() < 1e-12);
    }

    #[test]
    fn angle_toward_matches_bob_geometry() {
        let pivot = DVec2::new(100.0, 100.0);
        assert!(angle_toward(pivot, DVec2::new(100.0, 200.0)).abs() < 1e-12);
        assert!((angle_toward(pivot, DVec2::new(200.0, 100.0)) - FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn grab_sets_angle_and_zeroes_velocities() {
        let mut s = PendulumState {
            omega1: 3.0,
            omega2: -2.0,
            ..rest_state()
        };
        grab(&mut s, 1.25);
        assert_eq!(s.theta1, 1.25);
        assert_eq!(s.omega1, 0.0);
        assert_eq!(s.omega2, 0.0);
        assert_eq!(s.theta2, FRAC_PI_4, "theta2 is left alone");
    }

    // ---- Property-based tests ----

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn any_state() -> impl Strategy<Value = PendulumState> {
            (
                (-10.0_f64..10.0, -10.0_f64..10.0, -5.0_f64..5.0, -5.0_f64..5.0),
                (50.0_f64..=200.0, 50.0_f64..=200.0, 1.0_f64..=10.0, 1.0_f64..=10.0),
            )
                .prop_map(|((t1, t2, w1, w2), (l1, l2, m1, m2))| PendulumState {
                    theta1: t1,
                    theta2: t2,
                    omega1: w1,
                    omega2: w2,
                    alpha1: 0.0,
                    alpha2: 0.0,
                    length1: l1,
                    length2: l2,
                    mass1: m1,
                    mass2: m2,
                })
        }

        proptest! {
            #[test]
            fn accelerations_are_finite_for_positive_constants(
                s in any_state(),
                g in 0.0_f64..500.0,
            ) {
                let (a1, a2) = accelerations(&s, g);
                prop_assert!(a1.is_finite(), "alpha1 = {a1}");
                prop_assert!(a2.is_finite(), "alpha2 = {a2}");
            }

            #[test]
            fn one_tick_keeps_state_finite(s in any_state()) {
                let mut s = s;
                step(&mut s, DEFAULT_GRAVITY, DEFAULT_SUBSTEPS, DEFAULT_DT);
                for v in [s.theta1, s.theta2, s.omega1, s.omega2, s.alpha1, s.alpha2] {
                    prop_assert!(v.is_finite(), "non-finite value {v} in {s:?}");
                }
            }

            #[test]
            fn step_never_touches_constants(s in any_state()) {
                let mut after = s;
                step(&mut after, DEFAULT_GRAVITY, 3, DEFAULT_DT);
                prop_assert_eq!(after.length1, s.length1);
                prop_assert_eq!(after.length2, s.length2);
                prop_assert_eq!(after.mass1, s.mass1);
                prop_assert_eq!(after.mass2, s.mass2);
            }
        }
    }
}
