use super::Colony;
use crate::agent::Home;
use crate::config::SteeringMode;
use crate::field::{Channel, FieldSnapshot};
use crate::food::FoodSource;
use serde::{Deserialize, Serialize};

/// What happened during one tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TickSummary {
    pub tick: u64,
    pub mode: SteeringMode,
    pub picked_up: usize,
    pub delivered: usize,
    pub total_delivered: u64,
    pub remaining_food: usize,
    pub carrying: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ColonyMetrics {
    pub tick: u64,
    pub mode: SteeringMode,
    pub total_delivered: u64,
    pub delivered_last_tick: usize,
    pub remaining_food: usize,
    pub carrying_count: usize,
    pub mean_home_freshness: f64,
    pub mean_food_freshness: f64,
    pub home_trail_total: f64,
    pub food_trail_total: f64,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub ticks: u64,
    pub sample_every: u64,
    pub total_delivered: u64,
    pub final_mode: SteeringMode,
    pub samples: Vec<ColonyMetrics>,
}

/// Food units split by where they currently are.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodAccounting {
    pub placed: usize,
    pub remaining: usize,
    pub carried: usize,
    pub delivered: u64,
}

impl FoodAccounting {
    /// Every placed unit is either on the ground, carried, or delivered.
    pub fn is_balanced(&self) -> bool {
        self.placed as u64 == self.remaining as u64 + self.carried as u64 + self.delivered
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u32,
    pub position: [f64; 2],
    pub heading: [f64; 2],
    pub carrying_food: bool,
}

/// Everything a renderer may read after a tick.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColonySnapshot {
    pub tick: u64,
    pub mode: SteeringMode,
    pub home: Home,
    pub total_delivered: u64,
    pub agents: Vec<AgentSnapshot>,
    pub food: Vec<[f64; 2]>,
    /// Present only while trails are active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldSnapshot>,
}

impl<F: FoodSource> Colony<F> {
    pub fn carrying_count(&self) -> usize {
        self.agents.iter().filter(|a| a.carrying_food()).count()
    }

    pub fn food_accounting(&self) -> FoodAccounting {
        FoodAccounting {
            placed: self.food.total_placed(),
            remaining: self.food.remaining_count(),
            carried: self.carrying_count(),
            delivered: self.total_delivered,
        }
    }

    pub fn agent_snapshots(&self) -> Vec<AgentSnapshot> {
        self.agents
            .iter()
            .map(|a| AgentSnapshot {
                id: a.id,
                position: a.position(),
                heading: a.heading(),
                carrying_food: a.carrying_food(),
            })
            .collect()
    }

    pub fn field_snapshot(&self) -> Option<FieldSnapshot> {
        self.mode
            .emits_pheromones()
            .then(|| self.field.snapshot())
    }

    pub fn snapshot(&self) -> ColonySnapshot {
        ColonySnapshot {
            tick: self.tick_index,
            mode: self.mode,
            home: self.home,
            total_delivered: self.total_delivered,
            agents: self.agent_snapshots(),
            food: self.food.remaining_food(),
            field: self.field_snapshot(),
        }
    }

    pub(crate) fn collect_metrics(&self, delivered_last_tick: usize) -> ColonyMetrics {
        let n = self.agents.len().max(1) as f64;
        let (home_sum, food_sum) = self.agents.iter().fold((0.0, 0.0), |(h, f), a| {
            (h + a.home_freshness(), f + a.food_freshness())
        });
        ColonyMetrics {
            tick: self.tick_index,
            mode: self.mode,
            total_delivered: self.total_delivered,
            delivered_last_tick,
            remaining_food: self.food.remaining_count(),
            carrying_count: self.carrying_count(),
            mean_home_freshness: home_sum / n,
            mean_food_freshness: food_sum / n,
            home_trail_total: self.field.total(Channel::Home),
            food_trail_total: self.field.total(Channel::Food),
        }
    }
}
