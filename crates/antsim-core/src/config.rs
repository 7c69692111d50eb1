use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_4, PI};
use thiserror::Error;

/// Which steering variant every agent uses during a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SteeringMode {
    /// Agents sense food and home directly.
    #[default]
    Direct,
    /// Agents follow the pheromone field and write to it.
    Trail,
}

impl SteeringMode {
    pub fn toggled(self) -> Self {
        match self {
            SteeringMode::Direct => SteeringMode::Trail,
            SteeringMode::Trail => SteeringMode::Direct,
        }
    }

    pub fn emits_pheromones(self) -> bool {
        matches!(self, SteeringMode::Trail)
    }
}

/// Where agents are placed at setup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPolicy {
    #[default]
    Home,
    Uniform,
}

/// Weights of the four terms composed by the movement rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionCoefficients {
    pub momentum: f64,
    pub randomness: f64,
    pub food_coeff: f64,
    pub home_coeff: f64,
}

impl MotionCoefficients {
    /// Preset tuned for direct sensing.
    pub const DIRECT: Self = Self {
        momentum: 0.65,
        randomness: 0.15,
        food_coeff: 0.2,
        home_coeff: 0.2,
    };

    /// Preset tuned for trail following.
    pub const TRAIL: Self = Self {
        momentum: 0.2,
        randomness: 0.2,
        food_coeff: 0.4,
        home_coeff: 0.7,
    };

    fn validate(&self, preset: &'static str) -> Result<(), ConfigError> {
        let values = [
            ("momentum", self.momentum),
            ("randomness", self.randomness),
            ("food_coeff", self.food_coeff),
            ("home_coeff", self.home_coeff),
        ];
        for (name, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidCoefficient {
                    preset,
                    name,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Pheromone grid and trail-sensing parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Side length of one cell in plane units.
    pub resolution: f64,
    /// Half-width (in cells) of the square window scanned by trail sensing.
    pub search_radius_cells: usize,
    /// Angular half-width of the sensing cone, radians.
    pub field_of_view: f64,
    pub home_ttl: f64,
    pub food_ttl: f64,
    /// Per-tick multiplier applied to an agent's home freshness.
    pub home_decay: f64,
    /// Per-tick multiplier applied to an agent's food freshness.
    pub food_decay: f64,
    /// Linear decrement applied to every cell once per tick.
    pub evaporation_step: f64,
    /// Cells at or below this intensity are ignored by sensing.
    pub intensity_threshold: f64,
    /// Share of the direct-sensing attractant blended into trail steering.
    pub fallback_weight: f64,
    /// Returning agents within `home_beacon_factor * home_radius` also steer straight home.
    pub home_beacon_factor: f64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            resolution: 10.0,
            search_radius_cells: 25,
            field_of_view: FRAC_PI_4,
            home_ttl: 250_000.0,
            food_ttl: 50_000.0,
            home_decay: 0.99,
            food_decay: 0.99,
            evaporation_step: 1.0,
            intensity_threshold: 1.0,
            fallback_weight: 0.1,
            home_beacon_factor: 3.0,
        }
    }
}

/// How new food items are positioned.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementConfig {
    Uniform,
    Clustered {
        /// Number of cluster centres.
        places: usize,
        /// Maximum scatter distance as a fraction of the plane width.
        spread: f64,
        /// Ticks between re-drawing the centres; 0 keeps them forever.
        relocate_every: u64,
    },
}

impl Default for PlacementConfig {
    fn default() -> Self {
        PlacementConfig::Clustered {
            places: 3,
            spread: 0.1,
            relocate_every: 60 * 30,
        }
    }
}

/// Food collaborator parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    /// Batch size placed at setup (per cluster when clustered).
    pub initial_quantity: usize,
    /// Ticks between replenishments; 0 disables replenishment.
    pub rate: u64,
    /// Batch size placed on each replenishment (per cluster when clustered).
    pub refill: usize,
    pub placement: PlacementConfig,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            initial_quantity: 20,
            rate: 60,
            refill: 2,
            placement: PlacementConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColonyConfig {
    pub width: f64,
    pub height: f64,
    pub agent_count: usize,
    pub agent_speed: f64,
    /// Per-agent speed is drawn uniformly from `agent_speed * (1 ± speed_variation)`.
    pub speed_variation: f64,
    /// Only used by renderers.
    pub agent_radius: f64,
    pub spawn: SpawnPolicy,
    /// Fixed home location; `None` picks a uniform random point at setup.
    pub home_position: Option<[f64; 2]>,
    pub home_radius: f64,
    pub pickup_radius: f64,
    pub direct: MotionCoefficients,
    pub trail: MotionCoefficients,
    pub initial_mode: SteeringMode,
    pub field: FieldConfig,
    pub food: FoodConfig,
    pub seed: u64,
    /// Run movement and evaporation on the rayon pool.
    pub parallel: bool,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            agent_count: 100,
            agent_speed: 4.0,
            speed_variation: 0.0,
            agent_radius: 8.0,
            spawn: SpawnPolicy::Home,
            home_position: None,
            home_radius: 25.0,
            pickup_radius: 10.0,
            direct: MotionCoefficients::DIRECT,
            trail: MotionCoefficients::TRAIL,
            initial_mode: SteeringMode::Direct,
            field: FieldConfig::default(),
            food: FoodConfig::default(),
            seed: 42,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("plane dimensions must be finite and positive (got {width} x {height})")]
    InvalidPlane { width: f64, height: f64 },
    #[error("agent_count ({actual}) exceeds supported maximum ({max})")]
    TooManyAgents { max: usize, actual: usize },
    #[error("{name} must be finite and non-negative (got {value})")]
    NegativeValue { name: &'static str, value: f64 },
    #[error("speed_variation must be in [0, 1) (got {0})")]
    InvalidSpeedVariation(f64),
    #[error("{preset} preset: {name} must be finite and non-negative (got {value})")]
    InvalidCoefficient {
        preset: &'static str,
        name: &'static str,
        value: f64,
    },
    #[error("home position ({x}, {y}) lies outside the plane")]
    HomeOutsidePlane { x: f64, y: f64 },
    #[error("field resolution must be finite and positive (got {0})")]
    InvalidResolution(f64),
    #[error("{name} must be finite and positive (got {value})")]
    InvalidTtl { name: &'static str, value: f64 },
    #[error("{name} must be in (0, 1] (got {value})")]
    InvalidDecay { name: &'static str, value: f64 },
    #[error("field_of_view must be in (0, pi] (got {0})")]
    InvalidFieldOfView(f64),
    #[error("clustered placement needs at least one place")]
    NoClusterPlaces,
    #[error("clustered spread must be in [0, 1] (got {0})")]
    InvalidSpread(f64),
    #[error("search_radius_cells ({actual}) exceeds supported maximum ({max})")]
    SearchRadiusTooLarge { max: usize, actual: usize },
    #[error("{name} ({actual}) exceeds supported maximum ({max})")]
    FoodBatchTooLarge {
        name: &'static str,
        max: usize,
        actual: usize,
    },
    #[error("clustered places ({actual}) exceeds supported maximum ({max})")]
    TooManyClusterPlaces { max: usize, actual: usize },
}

impl ColonyConfig {
    pub const MAX_AGENTS: usize = 1_000_000;
    pub const MAX_FIELD_CELLS: usize = 64_000_000;
    pub const MAX_SEARCH_RADIUS_CELLS: usize = 4_096;
    /// Per cluster when clustered.
    pub const MAX_FOOD_BATCH: usize = 10_000;
    pub const MAX_CLUSTER_PLACES: usize = 1_024;

    /// Coefficient preset for the given steering mode.
    pub fn coefficients(&self, mode: SteeringMode) -> MotionCoefficients {
        match mode {
            SteeringMode::Direct => self.direct,
            SteeringMode::Trail => self.trail,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(ConfigError::InvalidPlane {
                width: self.width,
                height: self.height,
            });
        }
        if self.agent_count > Self::MAX_AGENTS {
            return Err(ConfigError::TooManyAgents {
                max: Self::MAX_AGENTS,
                actual: self.agent_count,
            });
        }
        let non_negative = [
            ("agent_speed", self.agent_speed),
            ("agent_radius", self.agent_radius),
            ("home_radius", self.home_radius),
            ("pickup_radius", self.pickup_radius),
            ("evaporation_step", self.field.evaporation_step),
            ("intensity_threshold", self.field.intensity_threshold),
            ("fallback_weight", self.field.fallback_weight),
            ("home_beacon_factor", self.field.home_beacon_factor),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeValue { name, value });
            }
        }
        if !(0.0..1.0).contains(&self.speed_variation) {
            return Err(ConfigError::InvalidSpeedVariation(self.speed_variation));
        }
        self.direct.validate("direct")?;
        self.trail.validate("trail")?;
        if let Some([x, y]) = self.home_position {
            if !(0.0..=self.width).contains(&x) || !(0.0..=self.height).contains(&y) {
                return Err(ConfigError::HomeOutsidePlane { x, y });
            }
        }

        let field = &self.field;
        if !field.resolution.is_finite() || field.resolution <= 0.0 {
            return Err(ConfigError::InvalidResolution(field.resolution));
        }
        let cells = (self.width / field.resolution).ceil() * (self.height / field.resolution).ceil();
        if cells > Self::MAX_FIELD_CELLS as f64 {
            return Err(ConfigError::InvalidResolution(field.resolution));
        }
        for (name, value) in [("home_ttl", field.home_ttl), ("food_ttl", field.food_ttl)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidTtl { name, value });
            }
        }
        for (name, value) in [
            ("home_decay", field.home_decay),
            ("food_decay", field.food_decay),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::InvalidDecay { name, value });
            }
        }
        if !(field.field_of_view > 0.0 && field.field_of_view <= PI) {
            return Err(ConfigError::InvalidFieldOfView(field.field_of_view));
        }
        if field.search_radius_cells > Self::MAX_SEARCH_RADIUS_CELLS {
            return Err(ConfigError::SearchRadiusTooLarge {
                max: Self::MAX_SEARCH_RADIUS_CELLS,
                actual: field.search_radius_cells,
            });
        }

        for (name, actual) in [
            ("initial_quantity", self.food.initial_quantity),
            ("refill", self.food.refill),
        ] {
            if actual > Self::MAX_FOOD_BATCH {
                return Err(ConfigError::FoodBatchTooLarge {
                    name,
                    max: Self::MAX_FOOD_BATCH,
                    actual,
                });
            }
        }

        if let PlacementConfig::Clustered { places, spread, .. } = self.food.placement {
            if places == 0 {
                return Err(ConfigError::NoClusterPlaces);
            }
            if places > Self::MAX_CLUSTER_PLACES {
                return Err(ConfigError::TooManyClusterPlaces {
                    max: Self::MAX_CLUSTER_PLACES,
                    actual: places,
                });
            }
            if !(0.0..=1.0).contains(&spread) {
                return Err(ConfigError::InvalidSpread(spread));
            }
        }
        Ok(())
    }
}
