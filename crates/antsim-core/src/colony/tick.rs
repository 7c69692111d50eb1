use super::metrics::TickSummary;
use super::Colony;
use crate::agent::Pickup;
use crate::food::FoodSource;
use crate::steering::SteeringContext;
use rayon::prelude::*;
use tracing::trace;

impl<F: FoodSource> Colony<F> {
    /// Move every agent against a frozen copy of the food list and the field
    /// as they stood at the start of the phase.
    fn movement_phase(&mut self) {
        let food = self.food.remaining_food();
        let ctx = SteeringContext {
            mode: self.mode,
            coefficients: self.config.coefficients(self.mode),
            field: &self.field,
            sensing: &self.config.field,
            food: &food,
            home: self.home,
            width: self.config.width,
            height: self.config.height,
        };
        if self.config.parallel {
            self.agents.par_iter_mut().for_each(|agent| {
                agent.step(&ctx);
            });
        } else {
            for agent in &mut self.agents {
                agent.step(&ctx);
            }
        }
    }

    /// Pickup then drop-off for each agent in id order. Returns
    /// `(picked_up, delivered)` for this tick.
    fn foraging_phase(&mut self) -> (usize, usize) {
        let pickup_radius = self.config.pickup_radius;
        let mut picked_up = 0;
        let mut delivered = 0;
        for agent in &mut self.agents {
            if let Pickup::PickedUp(_) = agent.try_pickup(&mut self.food, pickup_radius) {
                picked_up += 1;
            }
            if agent.try_dropoff(&self.home) {
                delivered += 1;
            }
        }
        (picked_up, delivered)
    }

    /// Emission by every agent, then a single evaporation of the whole field.
    fn pheromone_phase(&mut self) {
        let home_decay = self.config.field.home_decay;
        let food_decay = self.config.field.food_decay;
        for agent in &mut self.agents {
            agent.emit_pheromones(&mut self.field, home_decay, food_decay);
        }
        if self.config.parallel {
            self.field.par_evaporate();
        } else {
            self.field.evaporate();
        }
        debug_assert!(self.field.within_bounds(), "field intensity out of range");
    }

    /// Advance the simulation by one tick.
    ///
    /// Order: food schedule, movement, pickup/drop-off, then (trail mode only)
    /// emission and evaporation.
    pub fn tick(&mut self) -> TickSummary {
        self.tick_index = self.tick_index.saturating_add(1);

        self.food.advance_schedule();
        self.movement_phase();
        let (picked_up, delivered) = self.foraging_phase();
        if self.mode.emits_pheromones() {
            self.pheromone_phase();
        }
        self.total_delivered += delivered as u64;

        let summary = TickSummary {
            tick: self.tick_index,
            mode: self.mode,
            picked_up,
            delivered,
            total_delivered: self.total_delivered,
            remaining_food: self.food.remaining_count(),
            carrying: self.carrying_count(),
        };
        trace!(?summary, "tick");
        summary
    }
}
