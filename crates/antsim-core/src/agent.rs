use crate::field::{Channel, SpatialField};
use crate::food::FoodSource;
use crate::vector;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// The fixed home location agents deliver food to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Home {
    pub position: [f64; 2],
    pub radius: f64,
}

impl Home {
    pub fn contains(&self, position: [f64; 2]) -> bool {
        vector::distance(self.position, position) < self.radius
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Searching,
    Returning,
}

/// Result of a pickup attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Pickup {
    AlreadyCarrying,
    PickedUp([f64; 2]),
    NothingInRange,
}

impl Pickup {
    /// Whether the agent holds food after the attempt.
    pub fn is_carrying(self) -> bool {
        !matches!(self, Pickup::NothingInRange)
    }
}

/// One forager. Each agent owns an independent RNG stream so that the
/// movement phase gives the same result in any evaluation order.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: u32,
    pub(crate) position: [f64; 2],
    pub(crate) heading: [f64; 2],
    pub(crate) speed: f64,
    pub(crate) carrying_food: bool,
    pub(crate) home_freshness: f64,
    pub(crate) food_freshness: f64,
    pub(crate) rng: ChaCha12Rng,
}

impl Agent {
    /// Create an agent with a random heading drawn from its own stream of `seed`.
    pub fn new(id: u32, position: [f64; 2], speed: f64, seed: u64) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        rng.set_stream(id as u64);
        let heading = vector::from_angle(rng.random::<f64>() * TAU);
        Self::with_heading(id, position, heading, speed, rng)
    }

    pub fn with_heading(
        id: u32,
        position: [f64; 2],
        heading: [f64; 2],
        speed: f64,
        rng: ChaCha12Rng,
    ) -> Self {
        Self {
            id,
            position,
            heading: vector::try_normalize(heading).unwrap_or([1.0, 0.0]),
            speed,
            carrying_food: false,
            home_freshness: 1.0,
            food_freshness: 1.0,
            rng,
        }
    }

    pub fn position(&self) -> [f64; 2] {
        self.position
    }

    pub fn heading(&self) -> [f64; 2] {
        self.heading
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn carrying_food(&self) -> bool {
        self.carrying_food
    }

    pub fn home_freshness(&self) -> f64 {
        self.home_freshness
    }

    pub fn food_freshness(&self) -> f64 {
        self.food_freshness
    }

    pub fn state(&self) -> AgentState {
        if self.carrying_food {
            AgentState::Returning
        } else {
            AgentState::Searching
        }
    }

    /// Pick up the first food item within `radius`, unless already carrying.
    pub fn try_pickup<F: FoodSource + ?Sized>(&mut self, food: &mut F, radius: f64) -> Pickup {
        if self.carrying_food {
            return Pickup::AlreadyCarrying;
        }
        match food.consume_within(self.position, radius) {
            Some(item) => {
                self.carrying_food = true;
                self.food_freshness = 1.0;
                Pickup::PickedUp(item)
            }
            None => Pickup::NothingInRange,
        }
    }

    /// Inside the home radius the home freshness is refreshed; carried food is
    /// dropped off. Returns true when a unit was delivered.
    pub fn try_dropoff(&mut self, home: &Home) -> bool {
        if !home.contains(self.position) {
            return false;
        }
        self.home_freshness = 1.0;
        if self.carrying_food {
            self.carrying_food = false;
            return true;
        }
        false
    }

    /// Mark the current cell with the trail matching the carrying state, then
    /// weaken both freshness scalars.
    pub fn emit_pheromones(&mut self, field: &mut SpatialField, home_decay: f64, food_decay: f64) {
        if self.carrying_food {
            field.emit(Channel::Food, self.position, self.food_freshness);
        } else {
            field.emit(Channel::Home, self.position, self.home_freshness);
        }
        self.home_freshness *= home_decay;
        self.food_freshness *= food_decay;
    }
}
