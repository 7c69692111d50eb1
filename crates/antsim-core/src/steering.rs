use crate::agent::{Agent, Home};
use crate::config::{FieldConfig, MotionCoefficients, SteeringMode};
use crate::field::{Channel, SpatialField};
use crate::vector;
use rand::Rng;
use std::f64::consts::FRAC_PI_2;

/// Half-width of the exploration cone around the current heading.
pub const EXPLORATION_SPREAD: f64 = FRAC_PI_2;

/// Exponential fall-off of a food item's pull with distance.
pub const FOOD_DECAY_RATE: f64 = 0.1;

/// Everything an agent reads while moving. Borrowed immutably, so every agent
/// in a tick sees the same field and food.
#[derive(Clone, Copy)]
pub struct SteeringContext<'a> {
    pub mode: SteeringMode,
    pub coefficients: MotionCoefficients,
    pub field: &'a SpatialField,
    pub sensing: &'a FieldConfig,
    pub food: &'a [[f64; 2]],
    pub home: Home,
    pub width: f64,
    pub height: f64,
}

/// Sum of `(item - position) * exp(-FOOD_DECAY_RATE * |item - position|)` over
/// all items, capped to unit length.
pub fn food_gradient(position: [f64; 2], food: &[[f64; 2]]) -> [f64; 2] {
    let mut sum = [0.0, 0.0];
    for &item in food {
        let offset = vector::sub(item, position);
        let weight = (-FOOD_DECAY_RATE * vector::length(offset)).exp();
        sum = vector::add(sum, vector::scale(offset, weight));
    }
    if vector::length(sum) > 1.0 {
        vector::normalize_or_zero(sum)
    } else {
        sum
    }
}

fn home_direction(position: [f64; 2], home: &Home) -> [f64; 2] {
    vector::normalize_or_zero(vector::sub(home.position, position))
}

impl Agent {
    fn direct_attractant(&self, ctx: &SteeringContext<'_>) -> [f64; 2] {
        if self.carrying_food {
            vector::scale(
                home_direction(self.position, &ctx.home),
                ctx.coefficients.home_coeff,
            )
        } else {
            vector::scale(
                food_gradient(self.position, ctx.food),
                ctx.coefficients.food_coeff,
            )
        }
    }

    fn trail_attractant(&self, ctx: &SteeringContext<'_>) -> [f64; 2] {
        let (channel, coeff) = if self.carrying_food {
            (Channel::Home, ctx.coefficients.home_coeff)
        } else {
            (Channel::Food, ctx.coefficients.food_coeff)
        };
        let signal = ctx.field.sample_directional(
            channel,
            self.position,
            self.heading,
            ctx.sensing.search_radius_cells,
            ctx.sensing.field_of_view,
        );
        let mut attract = vector::scale(vector::normalize_or_zero(signal), coeff);

        let residual = vector::scale(self.direct_attractant(ctx), ctx.sensing.fallback_weight);
        attract = vector::add(attract, residual);

        if self.carrying_food {
            let beacon = ctx.sensing.home_beacon_factor * ctx.home.radius;
            if vector::distance(self.position, ctx.home.position) < beacon {
                attract = vector::add(
                    attract,
                    vector::scale(home_direction(self.position, &ctx.home), coeff),
                );
            }
        }
        attract
    }

    /// Move one tick: compose momentum, exploration and attraction, walk
    /// `speed` along the result, clamp into the plane and take the heading from
    /// the displacement actually made. Returns that displacement.
    pub fn step(&mut self, ctx: &SteeringContext<'_>) -> [f64; 2] {
        let coeffs = ctx.coefficients;
        let base = vector::scale(self.heading, coeffs.momentum);

        let heading_angle = vector::angle_of(self.heading);
        let angle = self.rng.random_range(
            heading_angle - EXPLORATION_SPREAD..=heading_angle + EXPLORATION_SPREAD,
        );
        let explore = vector::scale(vector::from_angle(angle), coeffs.randomness);

        let attract = match ctx.mode {
            SteeringMode::Direct => self.direct_attractant(ctx),
            SteeringMode::Trail => self.trail_attractant(ctx),
        };

        let composed = vector::add(vector::add(base, explore), attract);
        let direction = vector::try_normalize(composed).unwrap_or(self.heading);
        let target = vector::add(self.position, vector::scale(direction, self.speed));
        let new_position = vector::clamp_to_plane(target, ctx.width, ctx.height);

        let displacement = vector::sub(new_position, self.position);
        if let Some(heading) = vector::try_normalize(displacement) {
            self.heading = heading;
        }
        self.position = new_position;

        debug_assert!(
            (0.0..=ctx.width).contains(&self.position[0])
                && (0.0..=ctx.height).contains(&self.position[1]),
            "agent {} left the plane: {:?}",
            self.id,
            self.position
        );
        debug_assert!((vector::length(self.heading) - 1.0).abs() < 1e-9);
        displacement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    const STILL: MotionCoefficients = MotionCoefficients {
        momentum: 0.0,
        randomness: 0.0,
        food_coeff: 1.0,
        home_coeff: 1.0,
    };

    fn agent(position: [f64; 2], heading: [f64; 2], speed: f64) -> Agent {
        Agent::with_heading(0, position, heading, speed, ChaCha12Rng::seed_from_u64(1))
    }

    fn context<'a>(
        mode: SteeringMode,
        coefficients: MotionCoefficients,
        field: &'a SpatialField,
        sensing: &'a FieldConfig,
        food: &'a [[f64; 2]],
    ) -> SteeringContext<'a> {
        SteeringContext {
            mode,
            coefficients,
            field,
            sensing,
            food,
            home: Home {
                position: [0.0, 0.0],
                radius: 5.0,
            },
            width: 200.0,
            height: 200.0,
        }
    }

    #[test]
    fn gradient_bisects_symmetric_items() {
        let g = food_gradient([50.0, 50.0], &[[60.0, 60.0], [60.0, 40.0]]);
        assert!(g[0] > 0.0);
        assert!(g[1].abs() < 1e-12, "got {g:?}");
    }

    #[test]
    fn gradient_weights_nearer_items_more() {
        // equal angles, unequal distances: the near item dominates
        let g = food_gradient([0.0, 0.0], &[[5.0, 0.0], [-50.0, 0.0]]);
        assert!(g[0] > 0.0, "got {g:?}");
    }

    #[test]
    fn gradient_is_capped_but_weak_signal_is_not_amplified() {
        let strong = food_gradient([0.0, 0.0], &[[3.0, 4.0]]);
        assert!((vector::length(strong) - 1.0).abs() < 1e-12);
        let weak = food_gradient([0.0, 0.0], &[[100.0, 0.0]]);
        assert!(vector::length(weak) < 0.01);
        assert_eq!(food_gradient([1.0, 1.0], &[]), [0.0, 0.0]);
    }

    #[test]
    fn cancelled_terms_keep_previous_heading() {
        let sensing = FieldConfig::default();
        let field = SpatialField::new(200.0, 200.0, &sensing);
        let heading = vector::normalize_or_zero([1.0, 2.0]);
        let mut a = agent([100.0, 100.0], heading, 2.0);
        let ctx = context(SteeringMode::Direct, STILL, &field, &sensing, &[]);
        let d = a.step(&ctx);
        assert!(d[0].is_finite() && d[1].is_finite());
        assert!((a.heading()[0] - heading[0]).abs() < 1e-12);
        assert!((vector::length(d) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn heading_follows_realized_displacement_at_walls() {
        let sensing = FieldConfig::default();
        let field = SpatialField::new(200.0, 200.0, &sensing);
        let coeffs = MotionCoefficients {
            momentum: 1.0,
            ..STILL
        };
        let mut a = agent([199.0, 100.0], [1.0, 1.0], 4.0);
        let ctx = context(SteeringMode::Direct, coeffs, &field, &sensing, &[]);

        let before = a.position();
        a.step(&ctx);
        assert_eq!(a.position()[0], 200.0);
        let expected = vector::normalize_or_zero(vector::sub(a.position(), before));
        assert!((a.heading()[0] - expected[0]).abs() < 1e-12);
        assert!(a.heading()[0] < std::f64::consts::FRAC_1_SQRT_2);

        a.step(&ctx);
        assert_eq!(a.position()[0], 200.0);
        assert!(a.heading()[0].abs() < 1e-12, "heading should run along the wall");
        assert!((a.heading()[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn direct_returning_heads_home() {
        let sensing = FieldConfig::default();
        let field = SpatialField::new(200.0, 200.0, &sensing);
        let mut a = agent([30.0, 40.0], [1.0, 0.0], 5.0);
        a.carrying_food = true;
        let ctx = context(SteeringMode::Direct, STILL, &field, &sensing, &[]);
        a.step(&ctx);
        assert!((a.position()[0] - 27.0).abs() < 1e-9);
        assert!((a.position()[1] - 36.0).abs() < 1e-9);
    }

    #[test]
    fn exploration_stays_within_spread() {
        let sensing = FieldConfig::default();
        let field = SpatialField::new(200.0, 200.0, &sensing);
        let coeffs = MotionCoefficients {
            momentum: 0.0,
            randomness: 1.0,
            food_coeff: 0.0,
            home_coeff: 0.0,
        };
        let ctx = context(SteeringMode::Direct, coeffs, &field, &sensing, &[]);
        let mut a = agent([100.0, 100.0], [0.0, 1.0], 0.25);
        for _ in 0..200 {
            let prev = vector::angle_of(a.heading());
            a.step(&ctx);
            let turn = vector::wrapped_angle_diff(vector::angle_of(a.heading()), prev);
            assert!(turn.abs() <= EXPLORATION_SPREAD + 1e-9, "turned {turn}");
        }
    }

    #[test]
    fn trail_signal_dominates_residual() {
        let sensing = FieldConfig {
            field_of_view: FRAC_PI_2,
            ..FieldConfig::default()
        };
        let mut field = SpatialField::new(200.0, 200.0, &sensing);
        field.emit(Channel::Food, [135.0, 135.0], 1.0);
        let food = [[70.0, 100.0]];
        let mut a = agent([100.0, 100.0], [0.0, 1.0], 2.0);
        let ctx = context(SteeringMode::Trail, STILL, &field, &sensing, &food);
        a.step(&ctx);
        assert!(a.position()[0] > 100.0 && a.position()[1] > 100.0, "{:?}", a.position());
    }

    #[test]
    fn trail_falls_back_to_direct_sensing_on_empty_field() {
        let sensing = FieldConfig::default();
        let field = SpatialField::new(200.0, 200.0, &sensing);
        let food = [[150.0, 100.0]];
        let mut a = agent([100.0, 100.0], [0.0, 1.0], 2.0);
        let ctx = context(SteeringMode::Trail, STILL, &field, &sensing, &food);
        a.step(&ctx);
        assert!((a.position()[0] - 102.0).abs() < 1e-9);
        assert!((a.position()[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn trail_returning_uses_home_beacon_near_home() {
        let sensing = FieldConfig {
            fallback_weight: 0.0,
            ..FieldConfig::default()
        };
        let field = SpatialField::new(200.0, 200.0, &sensing);
        let ctx = context(SteeringMode::Trail, STILL, &field, &sensing, &[]);

        // outside the beacon radius an empty field gives no pull at all
        let mut far = agent([30.0, 40.0], [1.0, 0.0], 1.0);
        far.carrying_food = true;
        far.step(&ctx);
        assert_eq!(far.position(), [31.0, 40.0]);

        let mut near = agent([6.0, 8.0], [1.0, 0.0], 1.0);
        near.carrying_food = true;
        near.step(&ctx);
        assert!((near.position()[0] - 5.4).abs() < 1e-9);
        assert!((near.position()[1] - 7.2).abs() < 1e-9);
    }
}
