pub mod agent;
pub mod colony;
pub mod config;
pub mod field;
pub mod food;
pub mod steering;
pub mod vector;

pub use agent::{Agent, AgentState, Home, Pickup};
pub use colony::{Colony, ColonyError, RunError};
pub use config::{ColonyConfig, ConfigError, MotionCoefficients, SteeringMode};
pub use field::{Channel, SpatialField};
pub use food::{FoodSource, FoodStore};
