pub mod metrics;
mod tick;

pub use metrics::*;

use crate::agent::{Agent, Home};
use crate::config::{ColonyConfig, ConfigError, SpawnPolicy, SteeringMode};
use crate::field::SpatialField;
use crate::food::{FoodSource, FoodStore};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use thiserror::Error;
use tracing::{debug, info};

/// The agents, the pheromone field, the food collaborator and the home,
/// advanced together one tick at a time.
pub struct Colony<F = FoodStore> {
    pub(crate) agents: Vec<Agent>,
    pub(crate) field: SpatialField,
    pub(crate) food: F,
    pub(crate) home: Home,
    pub(crate) config: ColonyConfig,
    pub(crate) mode: SteeringMode,
    pub(crate) tick_index: u64,
    pub(crate) total_delivered: u64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColonyError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("sample_every must be positive")]
    InvalidSampleEvery,
    #[error("ticks ({actual}) exceed supported maximum ({max})")]
    TooManyTicks { max: u64, actual: u64 },
    #[error("sample count ({actual}) exceeds supported maximum ({max})")]
    TooManySamples { max: u64, actual: u64 },
}

impl Colony<FoodStore> {
    pub fn new(config: ColonyConfig) -> Self {
        Self::try_new(config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Build a colony whose food comes from a [`FoodStore`] configured by `config.food`.
    pub fn try_new(config: ColonyConfig) -> Result<Self, ColonyError> {
        config.validate()?;
        let food = FoodStore::from_config(&config.food, config.width, config.height, config.seed);
        Self::with_food(config, food)
    }
}

impl<F: FoodSource> Colony<F> {
    /// Stream reserved for setup draws (home placement, spawn points, speeds).
    const SETUP_STREAM: u64 = u64::MAX - 1;

    pub const MAX_RUN_TICKS: u64 = 10_000_000;
    pub const MAX_RUN_SAMPLES: u64 = 100_000;

    /// Build a colony around an externally supplied food collaborator.
    pub fn with_food(config: ColonyConfig, food: F) -> Result<Self, ColonyError> {
        config.validate()?;
        let mut rng = ChaCha12Rng::seed_from_u64(config.seed);
        rng.set_stream(Self::SETUP_STREAM);

        let home_position = config.home_position.unwrap_or_else(|| {
            [
                rng.random::<f64>() * config.width,
                rng.random::<f64>() * config.height,
            ]
        });
        let home = Home {
            position: home_position,
            radius: config.home_radius,
        };

        let agents: Vec<Agent> = (0..config.agent_count)
            .map(|i| {
                let position = match config.spawn {
                    SpawnPolicy::Home => home.position,
                    SpawnPolicy::Uniform => [
                        rng.random::<f64>() * config.width,
                        rng.random::<f64>() * config.height,
                    ],
                };
                let jitter = if config.speed_variation > 0.0 {
                    rng.random_range(-config.speed_variation..=config.speed_variation)
                } else {
                    0.0
                };
                let speed = config.agent_speed * (1.0 + jitter);
                Agent::new(i as u32, position, speed, config.seed)
            })
            .collect();

        let field = SpatialField::new(config.width, config.height, &config.field);
        let (cells_x, cells_y) = field.dims();
        debug!(
            agents = agents.len(),
            cells_x,
            cells_y,
            home = ?home.position,
            mode = ?config.initial_mode,
            "colony initialized"
        );

        Ok(Self {
            agents,
            field,
            food,
            home,
            mode: config.initial_mode,
            config,
            tick_index: 0,
            total_delivered: 0,
        })
    }

    pub fn config(&self) -> &ColonyConfig {
        &self.config
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn field(&self) -> &SpatialField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut SpatialField {
        &mut self.field
    }

    pub fn food(&self) -> &F {
        &self.food
    }

    pub fn food_mut(&mut self) -> &mut F {
        &mut self.food
    }

    pub fn home(&self) -> Home {
        self.home
    }

    pub fn mode(&self) -> SteeringMode {
        self.mode
    }

    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }

    pub fn total_delivered(&self) -> u64 {
        self.total_delivered
    }

    /// Switch every agent to `mode` from the next tick on. The field keeps its
    /// contents; it simply stops being written and evaporated in direct mode.
    pub fn set_mode(&mut self, mode: SteeringMode) {
        if mode != self.mode {
            info!(tick = self.tick_index, from = ?self.mode, to = ?mode, "steering mode switched");
            self.mode = mode;
        }
    }

    pub fn toggle_mode(&mut self) -> SteeringMode {
        self.set_mode(self.mode.toggled());
        self.mode
    }

    pub fn run(&mut self, ticks: u64, sample_every: u64) -> RunSummary {
        self.try_run(ticks, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Run `ticks` ticks, sampling metrics every `sample_every` ticks and at the end.
    pub fn try_run(&mut self, ticks: u64, sample_every: u64) -> Result<RunSummary, RunError> {
        self.try_run_with(ticks, sample_every, |_, _| {})
    }

    /// Like [`Colony::try_run`], calling `between_ticks` after every tick so a
    /// host can toggle modes or inspect state.
    pub fn try_run_with(
        &mut self,
        ticks: u64,
        sample_every: u64,
        mut between_ticks: impl FnMut(&mut Self, &TickSummary),
    ) -> Result<RunSummary, RunError> {
        if sample_every == 0 {
            return Err(RunError::InvalidSampleEvery);
        }
        if ticks > Self::MAX_RUN_TICKS {
            return Err(RunError::TooManyTicks {
                max: Self::MAX_RUN_TICKS,
                actual: ticks,
            });
        }
        let estimated_samples = if ticks == 0 {
            0
        } else {
            ((ticks - 1) / sample_every) + 1
        };
        if estimated_samples > Self::MAX_RUN_SAMPLES {
            return Err(RunError::TooManySamples {
                max: Self::MAX_RUN_SAMPLES,
                actual: estimated_samples,
            });
        }

        let delivered_before = self.total_delivered;
        let mut samples = Vec::with_capacity(estimated_samples as usize);
        for step in 1..=ticks {
            let summary = self.tick();
            if step % sample_every == 0 || step == ticks {
                samples.push(self.collect_metrics(summary.delivered));
            }
            between_ticks(self, &summary);
        }
        Ok(RunSummary {
            schema_version: 1,
            ticks,
            sample_every,
            total_delivered: self.total_delivered - delivered_before,
            final_mode: self.mode,
            samples,
        })
    }
}
