use crate::config::{FoodConfig, PlacementConfig};
use crate::vector;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::f64::consts::TAU;
use tracing::debug;

/// What the colony needs from whoever owns the food.
pub trait FoodSource {
    /// Remaining items in iteration order (oldest first).
    fn remaining_food(&self) -> Vec<[f64; 2]>;

    /// Remove and return the first item (in iteration order) within `radius` of
    /// `position`. An item can be consumed only once.
    fn consume_within(&mut self, position: [f64; 2], radius: f64) -> Option<[f64; 2]>;

    /// Advance the replenishment schedule by one tick.
    fn advance_schedule(&mut self);

    fn remaining_count(&self) -> usize;

    /// Items ever placed, initial batch included.
    fn total_placed(&self) -> usize;
}

/// Decides where new food items go.
pub trait PlacementStrategy: Send + Sync {
    fn place(&mut self, rng: &mut ChaCha12Rng, width: f64, height: f64, batch: usize)
        -> Vec<[f64; 2]>;

    /// Called once per schedule tick before any placement.
    fn on_tick(&mut self, _tick: u64, _rng: &mut ChaCha12Rng, _width: f64, _height: f64) {}
}

/// Uniformly random points over the whole plane.
#[derive(Clone, Debug, Default)]
pub struct UniformPlacement;

impl PlacementStrategy for UniformPlacement {
    fn place(
        &mut self,
        rng: &mut ChaCha12Rng,
        width: f64,
        height: f64,
        batch: usize,
    ) -> Vec<[f64; 2]> {
        (0..batch)
            .map(|_| {
                [
                    rng.random::<f64>() * width,
                    rng.random::<f64>() * height,
                ]
            })
            .collect()
    }
}

/// Points scattered around a few centres that move every `relocate_every` ticks.
/// A batch of `n` places `n` items around each centre.
#[derive(Clone, Debug)]
pub struct ClusteredPlacement {
    places: usize,
    spread: f64,
    relocate_every: u64,
    centres: Vec<[f64; 2]>,
}

impl ClusteredPlacement {
    pub fn new(places: usize, spread: f64, relocate_every: u64) -> Self {
        Self {
            places,
            spread,
            relocate_every,
            centres: Vec::new(),
        }
    }

    pub fn centres(&self) -> &[[f64; 2]] {
        &self.centres
    }

    fn relocate(&mut self, rng: &mut ChaCha12Rng, width: f64, height: f64) {
        self.centres = (0..self.places)
            .map(|_| {
                [
                    rng.random::<f64>() * width,
                    rng.random::<f64>() * height,
                ]
            })
            .collect();
        debug!(centres = ?self.centres, "food clusters relocated");
    }
}

impl PlacementStrategy for ClusteredPlacement {
    fn place(
        &mut self,
        rng: &mut ChaCha12Rng,
        width: f64,
        height: f64,
        batch: usize,
    ) -> Vec<[f64; 2]> {
        if self.centres.is_empty() {
            self.relocate(rng, width, height);
        }
        let max_offset = width * self.spread;
        let mut items = Vec::with_capacity(self.centres.len().saturating_mul(batch));
        for &centre in &self.centres {
            for _ in 0..batch {
                let dir = vector::from_angle(rng.random::<f64>() * TAU);
                let offset = vector::scale(dir, rng.random::<f64>() * max_offset);
                items.push(vector::clamp_to_plane(
                    vector::add(centre, offset),
                    width,
                    height,
                ));
            }
        }
        items
    }

    fn on_tick(&mut self, tick: u64, rng: &mut ChaCha12Rng, width: f64, height: f64) {
        if self.relocate_every > 0 && tick % self.relocate_every == 0 {
            self.relocate(rng, width, height);
        }
    }
}

type FoodItem = GeomWithData<[f64; 2], u64>;

/// R*-tree backed food store with a fixed replenishment schedule.
pub struct FoodStore {
    tree: RTree<FoodItem>,
    next_id: u64,
    placed: usize,
    width: f64,
    height: f64,
    rate: u64,
    refill: usize,
    counter: u64,
    placement: Box<dyn PlacementStrategy>,
    rng: ChaCha12Rng,
}

impl FoodStore {
    /// Stream used for the food RNG so it never overlaps agent streams.
    const RNG_STREAM: u64 = u64::MAX;

    pub fn from_config(config: &FoodConfig, width: f64, height: f64, seed: u64) -> Self {
        let placement: Box<dyn PlacementStrategy> = match config.placement {
            PlacementConfig::Uniform => Box::new(UniformPlacement),
            PlacementConfig::Clustered {
                places,
                spread,
                relocate_every,
            } => Box::new(ClusteredPlacement::new(places, spread, relocate_every)),
        };
        let mut store = Self::with_strategy(placement, width, height, config.rate, config.refill, seed);
        store.place_batch(config.initial_quantity);
        store
    }

    /// Empty store with the given strategy and schedule.
    pub fn with_strategy(
        placement: Box<dyn PlacementStrategy>,
        width: f64,
        height: f64,
        rate: u64,
        refill: usize,
        seed: u64,
    ) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(seed);
        rng.set_stream(Self::RNG_STREAM);
        Self {
            tree: RTree::new(),
            next_id: 0,
            placed: 0,
            width,
            height,
            rate,
            refill,
            counter: 0,
            placement,
            rng,
        }
    }

    /// Fixed items and no replenishment.
    pub fn with_items(items: impl IntoIterator<Item = [f64; 2]>, width: f64, height: f64) -> Self {
        let mut store = Self::with_strategy(Box::new(UniformPlacement), width, height, 0, 0, 0);
        for item in items {
            store.insert(item);
        }
        store
    }

    pub fn insert(&mut self, position: [f64; 2]) {
        let position = vector::clamp_to_plane(position, self.width, self.height);
        self.tree.insert(GeomWithData::new(position, self.next_id));
        self.next_id += 1;
        self.placed += 1;
    }

    fn place_batch(&mut self, batch: usize) {
        if batch == 0 {
            return;
        }
        let items = self
            .placement
            .place(&mut self.rng, self.width, self.height, batch);
        for item in items {
            self.insert(item);
        }
    }
}

impl FoodSource for FoodStore {
    fn remaining_food(&self) -> Vec<[f64; 2]> {
        let mut items: Vec<&FoodItem> = self.tree.iter().collect();
        items.sort_unstable_by_key(|item| item.data);
        items.into_iter().map(|item| *item.geom()).collect()
    }

    fn consume_within(&mut self, position: [f64; 2], radius: f64) -> Option<[f64; 2]> {
        let found = *self
            .tree
            .locate_within_distance(position, radius * radius)
            .min_by_key(|item| item.data)?;
        self.tree.remove(&found).map(|item| *item.geom())
    }

    fn advance_schedule(&mut self) {
        self.counter += 1;
        self.placement
            .on_tick(self.counter, &mut self.rng, self.width, self.height);
        if self.rate > 0 && self.counter % self.rate == 0 {
            self.place_batch(self.refill);
        }
    }

    fn remaining_count(&self) -> usize {
        self.tree.size()
    }

    fn total_placed(&self) -> usize {
        self.placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_takes_first_inserted_match() {
        let mut store = FoodStore::with_items([[12.0, 10.0], [10.5, 10.0], [50.0, 50.0]], 100.0, 100.0);
        // the second item is nearer but the first was placed earlier
        assert_eq!(store.consume_within([10.0, 10.0], 5.0), Some([12.0, 10.0]));
        assert_eq!(store.consume_within([10.0, 10.0], 5.0), Some([10.5, 10.0]));
        assert_eq!(store.consume_within([10.0, 10.0], 5.0), None);
        assert_eq!(store.remaining_food(), vec![[50.0, 50.0]]);
        assert_eq!(store.total_placed(), 3);
    }

    #[test]
    fn item_is_consumed_once() {
        let mut store = FoodStore::with_items([[20.0, 20.0]], 100.0, 100.0);
        assert!(store.consume_within([21.0, 20.0], 2.0).is_some());
        assert!(store.consume_within([19.0, 20.0], 2.0).is_none());
        assert_eq!(store.remaining_count(), 0);
    }

    #[test]
    fn radius_is_inclusive() {
        let mut store = FoodStore::with_items([[30.0, 0.0]], 100.0, 100.0);
        assert_eq!(store.consume_within([20.0, 0.0], 10.0), Some([30.0, 0.0]));
    }

    #[test]
    fn remaining_food_keeps_insertion_order() {
        let points = [[90.0, 5.0], [1.0, 1.0], [45.0, 80.0], [10.0, 60.0]];
        let store = FoodStore::with_items(points, 100.0, 100.0);
        assert_eq!(store.remaining_food(), points.to_vec());
    }

    #[test]
    fn schedule_refills_every_rate_ticks() {
        let config = FoodConfig {
            initial_quantity: 5,
            rate: 3,
            refill: 2,
            placement: PlacementConfig::Uniform,
        };
        let mut store = FoodStore::from_config(&config, 200.0, 100.0, 7);
        assert_eq!(store.remaining_count(), 5);
        store.advance_schedule();
        store.advance_schedule();
        assert_eq!(store.remaining_count(), 5);
        store.advance_schedule();
        assert_eq!(store.remaining_count(), 7);
        for _ in 0..3 {
            store.advance_schedule();
        }
        assert_eq!(store.total_placed(), 9);
        assert!(store
            .remaining_food()
            .iter()
            .all(|p| (0.0..=200.0).contains(&p[0]) && (0.0..=100.0).contains(&p[1])));
    }

    #[test]
    fn zero_rate_never_refills() {
        let config = FoodConfig {
            initial_quantity: 1,
            rate: 0,
            refill: 10,
            placement: PlacementConfig::Uniform,
        };
        let mut store = FoodStore::from_config(&config, 100.0, 100.0, 1);
        for _ in 0..100 {
            store.advance_schedule();
        }
        assert_eq!(store.total_placed(), 1);
    }

    #[test]
    fn clustered_batches_scale_with_places_and_stay_near_centres() {
        let mut placement = ClusteredPlacement::new(3, 0.1, 0);
        let mut rng = ChaCha12Rng::seed_from_u64(11);
        let items = placement.place(&mut rng, 500.0, 300.0, 4);
        assert_eq!(items.len(), 12);
        assert_eq!(placement.centres().len(), 3);
        for item in &items {
            assert!((0.0..=500.0).contains(&item[0]) && (0.0..=300.0).contains(&item[1]));
            let nearest = placement
                .centres()
                .iter()
                .map(|c| vector::distance(*c, *item))
                .fold(f64::INFINITY, f64::min);
            assert!(nearest <= 50.0 + 1e-9, "item {item:?} is {nearest} from any centre");
        }
    }

    #[test]
    fn clustered_centres_relocate_on_schedule() {
        let mut placement = ClusteredPlacement::new(2, 0.1, 5);
        let mut rng = ChaCha12Rng::seed_from_u64(3);
        placement.place(&mut rng, 500.0, 500.0, 1);
        let before = placement.centres().to_vec();
        for tick in 1..5 {
            placement.on_tick(tick, &mut rng, 500.0, 500.0);
        }
        assert_eq!(placement.centres(), before.as_slice());
        placement.on_tick(5, &mut rng, 500.0, 500.0);
        assert_ne!(placement.centres(), before.as_slice());
    }

    #[test]
    fn same_seed_places_same_food() {
        let config = FoodConfig::default();
        let a = FoodStore::from_config(&config, 640.0, 480.0, 99);
        let b = FoodStore::from_config(&config, 640.0, 480.0, 99);
        assert_eq!(a.remaining_food(), b.remaining_food());
        assert_eq!(a.remaining_count(), 60);
    }
}
