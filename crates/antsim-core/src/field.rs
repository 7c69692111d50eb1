use crate::config::FieldConfig;
use crate::vector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Laid by agents walking away from home.
    Home,
    /// Laid by agents carrying food.
    Food,
}

/// Two-channel pheromone grid over the plane. Each cell holds a non-negative
/// intensity bounded by the channel's TTL.
#[derive(Clone, Debug)]
pub struct SpatialField {
    cells_x: usize,
    cells_y: usize,
    resolution: f64,
    home_ttl: f64,
    food_ttl: f64,
    evaporation_step: f64,
    threshold: f64,
    home: Vec<f64>,
    food: Vec<f64>,
}

/// Read-only copy of the field for renderers, intensities scaled to `[0, 1]`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub cells_x: usize,
    pub cells_y: usize,
    pub resolution: f64,
    /// Row-major by `j` (`index = j * cells_x + i`).
    pub home: Vec<f32>,
    pub food: Vec<f32>,
}

impl SpatialField {
    pub fn new(width: f64, height: f64, config: &FieldConfig) -> Self {
        let cells_x = ((width / config.resolution).ceil() as usize).max(1);
        let cells_y = ((height / config.resolution).ceil() as usize).max(1);
        Self {
            cells_x,
            cells_y,
            resolution: config.resolution,
            home_ttl: config.home_ttl,
            food_ttl: config.food_ttl,
            evaporation_step: config.evaporation_step,
            threshold: config.intensity_threshold,
            home: vec![0.0; cells_x * cells_y],
            food: vec![0.0; cells_x * cells_y],
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.cells_x, self.cells_y)
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn ttl(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Home => self.home_ttl,
            Channel::Food => self.food_ttl,
        }
    }

    fn data(&self, channel: Channel) -> &[f64] {
        match channel {
            Channel::Home => &self.home,
            Channel::Food => &self.food,
        }
    }

    fn index(&self, i: usize, j: usize) -> usize {
        j * self.cells_x + i
    }

    /// Cell containing `position`, clamped into the grid.
    pub fn cell_of(&self, position: [f64; 2]) -> (usize, usize) {
        (
            Self::clamp_axis(position[0] / self.resolution, self.cells_x),
            Self::clamp_axis(position[1] / self.resolution, self.cells_y),
        )
    }

    fn clamp_axis(scaled: f64, cells: usize) -> usize {
        let max = (cells - 1) as f64;
        // NaN falls through to 0
        scaled.floor().clamp(0.0, max).max(0.0) as usize
    }

    pub fn cell_center(&self, i: usize, j: usize) -> [f64; 2] {
        [
            (i as f64 + 0.5) * self.resolution,
            (j as f64 + 0.5) * self.resolution,
        ]
    }

    pub fn intensity(&self, channel: Channel, i: usize, j: usize) -> f64 {
        let i = i.min(self.cells_x - 1);
        let j = j.min(self.cells_y - 1);
        self.data(channel)[self.index(i, j)]
    }

    pub fn intensity_at(&self, channel: Channel, position: [f64; 2]) -> f64 {
        let (i, j) = self.cell_of(position);
        self.intensity(channel, i, j)
    }

    /// Overwrite the cell under `position` with `ttl * strength`.
    pub fn emit(&mut self, channel: Channel, position: [f64; 2], strength: f64) {
        let (i, j) = self.cell_of(position);
        let idx = self.index(i, j);
        let ttl = self.ttl(channel);
        let value = ttl * strength.clamp(0.0, 1.0);
        match channel {
            Channel::Home => self.home[idx] = value,
            Channel::Food => self.food[idx] = value,
        }
    }

    /// Linear decay of every cell in both channels, floored at zero.
    /// Call exactly once per tick.
    pub fn evaporate(&mut self) {
        let step = self.evaporation_step;
        self.home
            .iter_mut()
            .chain(self.food.iter_mut())
            .for_each(|v| *v = (*v - step).max(0.0));
    }

    /// [`SpatialField::evaporate`] on the rayon pool.
    pub fn par_evaporate(&mut self) {
        let step = self.evaporation_step;
        self.home
            .par_iter_mut()
            .chain(self.food.par_iter_mut())
            .for_each(|v| *v = (*v - step).max(0.0));
    }

    /// Weighted sum of unit vectors toward every sufficiently strong cell inside
    /// the sensing cone. The result is not normalized.
    pub fn sample_directional(
        &self,
        channel: Channel,
        position: [f64; 2],
        heading: [f64; 2],
        search_radius_cells: usize,
        field_of_view: f64,
    ) -> [f64; 2] {
        let (ci, cj) = self.cell_of(position);
        let start_x = ci.saturating_sub(search_radius_cells);
        let start_y = cj.saturating_sub(search_radius_cells);
        let end_x = ci.saturating_add(search_radius_cells).min(self.cells_x - 1);
        let end_y = cj.saturating_add(search_radius_cells).min(self.cells_y - 1);
        let heading_angle = vector::angle_of(heading);
        let ttl = self.ttl(channel);
        let data = self.data(channel);

        let mut sum = [0.0, 0.0];
        for j in start_y..=end_y {
            for i in start_x..=end_x {
                let value = data[self.index(i, j)];
                if value <= self.threshold {
                    continue;
                }
                let offset = vector::sub(self.cell_center(i, j), position);
                let Some(dir) = vector::try_normalize(offset) else {
                    continue;
                };
                let delta = vector::wrapped_angle_diff(vector::angle_of(dir), heading_angle);
                if delta.abs() > field_of_view {
                    continue;
                }
                sum = vector::add(sum, vector::scale(dir, value / ttl));
            }
        }
        sum
    }

    pub fn total(&self, channel: Channel) -> f64 {
        self.data(channel).iter().sum()
    }

    pub fn snapshot(&self) -> FieldSnapshot {
        let normalize = |data: &[f64], ttl: f64| -> Vec<f32> {
            data.iter()
                .map(|v| (v / ttl).clamp(0.0, 1.0) as f32)
                .collect()
        };
        FieldSnapshot {
            cells_x: self.cells_x,
            cells_y: self.cells_y,
            resolution: self.resolution,
            home: normalize(&self.home, self.home_ttl),
            food: normalize(&self.food, self.food_ttl),
        }
    }

    /// Every cell in `[0, ttl]` for its channel.
    pub fn within_bounds(&self) -> bool {
        let ok = |data: &[f64], ttl: f64| data.iter().all(|v| (0.0..=ttl).contains(v));
        ok(&self.home, self.home_ttl) && ok(&self.food, self.food_ttl)
    }
}
