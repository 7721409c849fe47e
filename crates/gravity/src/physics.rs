//! Force laws and the per-tick integrator for the particle system.
//!
//! [`step`] is pure over its inputs: it reads a snapshot of all body
//! positions, accumulates every net force from that snapshot, and only then
//! integrates. Visual bookkeeping (trails, force arrows) lives elsewhere and
//! consumes the returned forces.

use crate::particle::{Body, Field, Polarity};
use glam::DVec2;
use serde::Serialize;

/// Separations below this are treated as coincident and exert no field force.
const COINCIDENT_EPSILON: f64 = 1e-9;
/// Pairwise forces are capped at this fraction of `max_force`.
const PAIR_FORCE_SHARE: f64 = 0.1;
/// Pairwise gravity runs at this fraction of `gravity`.
const PAIR_GRAVITY_SHARE: f64 = 0.1;

/// Every constant the integrator reads, in screen-space units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForceLaw {
    /// Gravity constant G.
    pub gravity: f64,
    /// Base of the per-tick velocity decay.
    pub dampening: f64,
    /// Speed coefficient k in the decay exponent `1 + |v|·k`.
    pub speed_damping: f64,
    /// Cap on field force magnitude and on particle speed.
    pub max_force: f64,
    /// Softening length added in quadrature to every separation.
    pub soft_radius: f64,
    /// Particle radius; pairs closer than two radii do not interact.
    pub particle_radius: f64,
    /// Field forces fade linearly to zero inside this distance.
    pub field_falloff: f64,
    /// Fraction of velocity kept (and reversed) on wall contact.
    pub restitution: f64,
    /// Multiplies both velocity and position increments.
    pub time_scale: f64,
}

impl Default for ForceLaw {
    fn default() -> Self {
        Self {
            gravity: 1000.0,
            dampening: 0.995,
            speed_damping: 0.01,
            max_force: 50.0,
            soft_radius: 20.0,
            particle_radius: 5.0,
            field_falloff: 100.0,
            restitution: 0.8,
            time_scale: 1.0,
        }
    }
}

/// Force on a body at `p` from a body at `q`.
///
/// Magnitude `0.1·G / (d² + soft²)` capped at `0.1·max_force`, directed
/// along `q − p`. Returns zero when the bodies are in contact (d ≤ 2R), which
/// also covers coincident positions. Swapping `p` and `q` negates the result
/// exactly.
pub fn pair_force(p: DVec2, q: DVec2, law: &ForceLaw) -> DVec2 {
    let delta = q - p;
    let d_sq = delta.length_squared();
    let d = d_sq.sqrt();
    if d <= 2.0 * law.particle_radius {
        return DVec2::ZERO;
    }
    let magnitude = (PAIR_GRAVITY_SHARE * law.gravity / (d_sq + law.soft_radius * law.soft_radius))
        .min(PAIR_FORCE_SHARE * law.max_force);
    delta / d * magnitude
}

/// Force on a body at `p` from a point field at `center`.
///
/// Magnitude `G / (d² + soft²)` capped at `max_force`, then scaled by
/// `min(1, d / field_falloff)` so bodies are not flung about near the centre.
/// Repelling fields flip the direction.
pub fn field_force(p: DVec2, center: DVec2, polarity: Polarity, law: &ForceLaw) -> DVec2 {
    let delta = center - p;
    let d_sq = delta.length_squared();
    let d = d_sq.sqrt();
    if d < COINCIDENT_EPSILON {
        return DVec2::ZERO;
    }
    let magnitude = (law.gravity / (d_sq + law.soft_radius * law.soft_radius)).min(law.max_force);
    let proximity = if law.field_falloff > 0.0 {
        (d / law.field_falloff).min(1.0)
    } else {
        1.0
    };
    delta / d * (magnitude * proximity * polarity.sign())
}

/// Net force on body `index` from every other body, every field, and the
/// pointer when it is held.
pub fn net_force(
    bodies: &[Body],
    index: usize,
    fields: &[Field],
    pointer: Option<&Field>,
    law: &ForceLaw,
) -> DVec2 {
    let p = bodies[index].pos;
    let mut force = DVec2::ZERO;
    if let Some(ptr) = pointer {
        force += field_force(p, ptr.pos, ptr.polarity, law);
    }
    for field in fields {
        force += field_force(p, field.pos, field.polarity, law);
    }
    for (j, other) in bodies.iter().enumerate() {
        if j != index {
            force += pair_force(p, other.pos, law);
        }
    }
    force
}

/// Rescales `v` so `|v| ≤ max` holds exactly in floating point.
pub fn clamp_speed(v: DVec2, max: f64) -> DVec2 {
    let speed = v.length();
    if speed <= max {
        return v;
    }
    let mut clamped = v * (max / speed);
    // Rounding in the rescale can leave |v| one ulp above the cap.
    while clamped.length() > max {
        clamped *= 1.0 - 1e-15;
    }
    clamped
}

/// Advances every body by one tick inside `[0, bounds.x] × [0, bounds.y]`.
///
/// Phase one computes all net forces from the current positions. Phase two
/// applies, per body: `v += F·time_scale`, speed-dependent damping
/// `dampening^(1 + |v₀|·k)` where `v₀` is the speed before the force update,
/// the hard speed clamp, `pos += v·time_scale`, and wall reflection.
///
/// Returns the net force applied to each body, in body order.
pub fn step(
    bodies: &mut [Body],
    fields: &[Field],
    pointer: Option<&Field>,
    law: &ForceLaw,
    bounds: DVec2,
) -> Vec<DVec2> {
    let forces: Vec<DVec2> = (0..bodies.len())
        .map(|i| net_force(bodies, i, fields, pointer, law))
        .collect();

    for (body, force) in bodies.iter_mut().zip(&forces) {
        let damp = law.dampening.powf(1.0 + body.vel.length() * law.speed_damping);
        body.vel += *force * law.time_scale;
        body.vel *= damp;
        body.vel = clamp_speed(body.vel, law.max_force);
        body.pos += body.vel * law.time_scale;
        reflect_walls(body, bounds, law.restitution);
    }

    forces
}

/// Clamps a body into the box and bounces the velocity on each crossed axis.
pub fn reflect_walls(body: &mut Body, bounds: DVec2, restitution: f64) {
    for axis in 0..2 {
        let limit = bounds[axis];
        if body.pos[axis] < 0.0 {
            body.pos[axis] = 0.0;
            body.vel[axis] *= -restitution;
        } else if body.pos[axis] > limit {
            body.pos[axis] = limit;
            body.vel[axis] *= -restitution;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn law() -> ForceLaw {
        ForceLaw::default()
    }

    fn body(x: f64, y: f64) -> Body {
        Body::at(DVec2::new(x, y))
    }

    const BOUNDS: DVec2 = DVec2::new(1200.0, 800.0);

    // ---- Force laws ----

    #[test]
    fn pair_force_obeys_newtons_third_law() {
        let p = DVec2::new(100.0, 130.0);
        let q = DVec2::new(173.5, 88.25);
        let on_p = pair_force(p, q, &law());
        let on_q = pair_force(q, p, &law());
        assert!(on_p.length() > 0.0);
        assert_eq!(on_p, -on_q);
    }

    #[test]
    fn pair_force_is_skipped_at_contact() {
        let p = DVec2::new(50.0, 50.0);
        assert_eq!(pair_force(p, p, &law()), DVec2::ZERO);
        assert_eq!(pair_force(p, p + DVec2::new(10.0, 0.0), &law()), DVec2::ZERO);
        assert!(pair_force(p, p + DVec2::new(10.5, 0.0), &law()).length() > 0.0);
    }

    #[test]
    fn pair_force_is_capped_at_a_tenth_of_max() {
        let strong = ForceLaw {
            gravity: 1e9,
            ..law()
        };
        let f = pair_force(DVec2::ZERO, DVec2::new(30.0, 0.0), &strong);
        assert!((f.length() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn field_force_attracts_and_repels() {
        let p = DVec2::new(0.0, 0.0);
        let c = DVec2::new(0.0, 200.0);
        let attract = field_force(p, c, Polarity::Attract, &law());
        let repel = field_force(p, c, Polarity::Repel, &law());
        assert!(attract.y > 0.0);
        assert_eq!(attract, -repel);
        assert!((attract.y - 1000.0 / (40_000.0 + 400.0)).abs() < 1e-12);
    }

    #[test]
    fn field_force_fades_inside_falloff_radius() {
        let c = DVec2::ZERO;
        let near = field_force(DVec2::new(25.0, 0.0), c, Polarity::Attract, &law());
        let unscaled = 1000.0 / (625.0 + 400.0);
        assert!((near.length() - unscaled * 0.25).abs() < 1e-12);
    }

    #[test]
    fn field_force_at_center_is_zero() {
        let c = DVec2::new(3.0, 4.0);
        assert_eq!(field_force(c, c, Polarity::Repel, &law()), DVec2::ZERO);
    }

    // ---- Integration ----

    #[test]
    fn particle_is_pulled_straight_toward_aligned_field() {
        let mut bodies = vec![body(100.0, 100.0)];
        let fields = [Field::new(DVec2::new(100.0, 200.0), Polarity::Attract)];
        step(&mut bodies, &fields, None, &law(), BOUNDS);
        assert!(bodies[0].vel.y > 0.0);
        assert_eq!(bodies[0].vel.x, 0.0);
    }

    #[test]
    fn two_body_forces_are_equal_and_opposite() {
        let mut bodies = vec![body(300.0, 400.0), body(420.0, 310.0)];
        let forces = step(&mut bodies, &[], None, &law(), BOUNDS);
        assert_eq!(forces[0], -forces[1]);
        assert!(forces[0].x > 0.0 && forces[0].y < 0.0);
    }

    #[test]
    fn pointer_force_is_applied_while_held() {
        let pointer = Field::new(DVec2::new(600.0, 400.0), Polarity::Repel);
        let mut with = vec![body(500.0, 400.0)];
        let mut without = with.clone();
        step(&mut with, &[], Some(&pointer), &law(), BOUNDS);
        step(&mut without, &[], None, &law(), BOUNDS);
        assert!(with[0].vel.x < 0.0, "repelled away from pointer");
        assert_eq!(without[0].vel, DVec2::ZERO);
    }

    #[test]
    fn wall_contact_clamps_and_reflects() {
        let undamped = ForceLaw {
            dampening: 1.0,
            ..law()
        };
        let mut bodies = vec![Body {
            pos: DVec2::new(1200.0, 400.0),
            vel: DVec2::new(5.0, 0.0),
        }];
        step(&mut bodies, &[], None, &undamped, BOUNDS);
        assert_eq!(bodies[0].pos.x, 1200.0);
        assert!((bodies[0].vel.x + 4.0).abs() < 1e-12);
        assert_eq!(bodies[0].vel.y, 0.0);
    }

    #[test]
    fn lower_walls_reflect_too() {
        let mut b = Body {
            pos: DVec2::new(-3.0, -1.0),
            vel: DVec2::new(-2.0, -10.0),
        };
        reflect_walls(&mut b, BOUNDS, 0.8);
        assert_eq!(b.pos, DVec2::ZERO);
        assert!((b.vel.x - 1.6).abs() < 1e-12);
        assert!((b.vel.y - 8.0).abs() < 1e-12);
    }

    #[test]
    fn damping_uses_speed_before_force_update() {
        let mut bodies = vec![Body {
            pos: DVec2::new(600.0, 400.0),
            vel: DVec2::new(10.0, 0.0),
        }];
        step(&mut bodies, &[], None, &law(), BOUNDS);
        let expected = 10.0 * 0.995_f64.powf(1.0 + 10.0 * 0.01);
        assert!((bodies[0].vel.x - expected).abs() < 1e-12);
    }

    #[test]
    fn zero_time_scale_freezes_motion() {
        let frozen = ForceLaw {
            time_scale: 0.0,
            ..law()
        };
        let mut bodies = vec![body(10.0, 10.0), body(60.0, 10.0)];
        step(&mut bodies, &[], None, &frozen, BOUNDS);
        assert_eq!(bodies[0].pos, DVec2::new(10.0, 10.0));
        assert_eq!(bodies[1].pos, DVec2::new(60.0, 10.0));
    }

    #[test]
    fn clamp_speed_hits_the_cap_exactly() {
        let v = clamp_speed(DVec2::new(3e8, -7e7), 50.0);
        assert!(v.length() <= 50.0);
        assert!(v.length() > 49.999);
        assert_eq!(clamp_speed(DVec2::new(1.0, 1.0), 50.0), DVec2::new(1.0, 1.0));
    }

    // ---- Property-based tests ----

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn coord() -> impl Strategy<Value = DVec2> {
            (0.0_f64..1200.0, 0.0_f64..800.0).prop_map(|(x, y)| DVec2::new(x, y))
        }

        fn velocity() -> impl Strategy<Value = DVec2> {
            (-1e6_f64..1e6, -1e6_f64..1e6).prop_map(|(x, y)| DVec2::new(x, y))
        }

        proptest! {
            #[test]
            fn speed_never_exceeds_cap_after_step(
                states in prop::collection::vec((coord(), velocity()), 1..12),
                field_pos in coord(),
                gravity in 0.0_f64..1e7,
            ) {
                let strong = ForceLaw { gravity, ..ForceLaw::default() };
                let mut bodies: Vec<Body> = states
                    .into_iter()
                    .map(|(pos, vel)| Body { pos, vel })
                    .collect();
                let fields = [Field::new(field_pos, Polarity::Attract)];
                step(&mut bodies, &fields, None, &strong, BOUNDS);
                for b in &bodies {
                    prop_assert!(b.vel.length() <= strong.max_force, "speed {}", b.vel.length());
                    prop_assert!(b.pos.is_finite());
                }
            }

            #[test]
            fn bodies_stay_inside_bounds(
                states in prop::collection::vec((coord(), velocity()), 1..8),
            ) {
                let mut bodies: Vec<Body> = states
                    .into_iter()
                    .map(|(pos, vel)| Body { pos, vel })
                    .collect();
                step(&mut bodies, &[], None, &ForceLaw::default(), BOUNDS);
                for b in &bodies {
                    prop_assert!((0.0..=BOUNDS.x).contains(&b.pos.x));
                    prop_assert!((0.0..=BOUNDS.y).contains(&b.pos.y));
                }
            }

            #[test]
            fn pair_force_is_antisymmetric(p in coord(), q in coord()) {
                let law = ForceLaw::default();
                prop_assert_eq!(pair_force(p, q, &law), -pair_force(q, p, &law));
            }

            #[test]
            fn clamp_speed_is_exact(v in velocity(), max in 0.001_f64..1e3) {
                prop_assert!(clamp_speed(v, max).length() <= max);
            }
        }
    }
}
