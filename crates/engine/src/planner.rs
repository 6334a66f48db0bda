//! Placement planner: assigns items to containers and positions.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Instant;

use nalgebra::Vector3;
use rayon::prelude::*;
use stowage_core::{
    fits, orientations, Config, Cuboid, Error, Inventory, Item, Orientation, Placement,
    PlacementResult, Result, Unplaced, UnplacedReason,
};

use crate::container::{ensure_distinct_models, models_from_inventory, ContainerModel};
use crate::strategy::{strategy_for, Candidate, PlacementStrategy};

/// Best-effort placement planner.
///
/// Items are handled one at a time in priority order. Each accepted placement
/// is applied to the planner's working copy of the containers, so items of the
/// same batch never overlap. The caller's models are left untouched.
pub struct PlacementPlanner {
    config: Config,
    strategy: Box<dyn PlacementStrategy>,
}

impl PlacementPlanner {
    /// Creates a planner with the strategy selected by the configuration.
    pub fn new(config: Config) -> Self {
        let strategy = strategy_for(&config);
        Self { config, strategy }
    }

    /// Creates a planner with default configuration.
    pub fn default_config() -> Self {
        Self::new(Config::default())
    }

    /// Replaces the placement strategy.
    pub fn with_strategy(mut self, strategy: Box<dyn PlacementStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the placement strategy.
    pub fn strategy(&self) -> &dyn PlacementStrategy {
        self.strategy.as_ref()
    }

    /// Plans placements for `items` across `models`.
    ///
    /// Malformed input (bad dimensions, duplicate item or container IDs,
    /// items that are already placed) fails the whole call. Items that cannot be placed are
    /// reported in [`PlacementResult::unplaced`].
    pub fn plan(&self, items: &[Item], models: &[ContainerModel]) -> Result<PlacementResult> {
        let start = Instant::now();
        validate_batch(items, models)?;

        let mut working: Vec<ContainerModel> = models.to_vec();
        let mut result = PlacementResult::new().with_strategy(self.strategy.name());

        for idx in placement_order(items) {
            let item = &items[idx];
            let allowed = orientations(&item.dimensions)?;
            let candidates = candidate_containers(&working, item.preferred_zone.as_deref(), None);

            match self.search(&working, &candidates, &item.dimensions, &allowed) {
                Some((container_idx, candidate)) => {
                    let model = &mut working[container_idx];
                    let placement = Placement::new(
                        item.id.clone(),
                        model.id(),
                        candidate.orientation,
                        candidate.start(),
                        &item.dimensions,
                    );
                    model.insert(placement.clone())?;

                    log::debug!(
                        "Placed '{}' in '{}' at ({}, {}, {})",
                        item.id,
                        placement.container_id,
                        placement.start.x,
                        placement.start.y,
                        placement.start.z
                    );
                    result.push(placement);
                }
                None => {
                    let reason = if exceeds_every_container(&working, &item.dimensions, &allowed) {
                        UnplacedReason::Overcapacity
                    } else {
                        UnplacedReason::InsufficientSpace
                    };
                    log::debug!("Could not place '{}': {}", item.id, reason.message());
                    result.unplaced.push(Unplaced::new(item.id.clone(), reason));
                }
            }
        }

        result.computation_time_ms = start.elapsed().as_millis() as u64;
        log::debug!(
            "Placement planned: {} placed, {} unplaced in {}ms",
            result.placed_count(),
            result.unplaced_count(),
            result.computation_time_ms
        );
        Ok(result)
    }

    /// Plans placements against the containers of an inventory snapshot.
    pub fn plan_inventory(&self, items: &[Item], inventory: &Inventory) -> Result<PlacementResult> {
        let models = models_from_inventory(inventory)?;
        self.plan(items, &models)
    }

    /// Searches the candidate containers in order; the first one where the
    /// strategy finds a position wins.
    ///
    /// Above the configured threshold the per-container search runs on the
    /// rayon pool. `find_map_first` keeps the winner identical to the
    /// sequential scan.
    pub fn search(
        &self,
        models: &[ContainerModel],
        candidates: &[usize],
        dims: &Vector3<f64>,
        allowed: &[Orientation],
    ) -> Option<(usize, Candidate)> {
        let probe = |idx: &usize| {
            self.strategy
                .find_position(&models[*idx], dims, allowed)
                .map(|candidate| (*idx, candidate))
        };

        if self.config.is_parallel(candidates.len()) {
            candidates.par_iter().find_map_first(probe)
        } else {
            candidates.iter().find_map(probe)
        }
    }
}

fn validate_batch(items: &[Item], models: &[ContainerModel]) -> Result<()> {
    ensure_distinct_models(models)?;

    let mut seen = HashSet::new();
    for item in items {
        item.validate()?;

        if !seen.insert(item.id.as_str()) {
            return Err(Error::InvalidInput(format!(
                "Item '{}' appears more than once in the batch",
                item.id
            )));
        }

        if let Some(model) = models.iter().find(|m| m.get(&item.id).is_some()) {
            return Err(Error::InvalidInput(format!(
                "Item '{}' is already placed in container '{}'",
                item.id,
                model.id()
            )));
        }
    }
    Ok(())
}

/// Processing order: priority descending, then volume ascending, then input order.
pub fn placement_order(items: &[Item]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| {
        items[b]
            .priority
            .cmp(&items[a].priority)
            .then(items[a].volume().total_cmp(&items[b].volume()))
    });
    order
}

/// Candidate container order for an item.
///
/// Containers in the preferred zone come first, then all others; each group
/// is ordered by available volume descending, ties kept in input order.
/// `exclude` drops one container (the source of a relocation).
pub fn candidate_containers(
    models: &[ContainerModel],
    preferred_zone: Option<&str>,
    exclude: Option<&str>,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..models.len())
        .filter(|&i| Some(models[i].id()) != exclude)
        .collect();

    let in_zone = |i: usize| preferred_zone == Some(models[i].zone());
    order.sort_by(|&a, &b| match (in_zone(a), in_zone(b)) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => models[b]
            .available_volume()
            .total_cmp(&models[a].available_volume()),
    });
    order
}

/// Returns true if the item fits no container, even empty, in any orientation.
pub fn exceeds_every_container(
    models: &[ContainerModel],
    dims: &Vector3<f64>,
    allowed: &[Orientation],
) -> bool {
    !models.iter().any(|m| {
        allowed
            .iter()
            .any(|o| fits(&Cuboid::at(Vector3::zeros(), o.apply(dims)), m.dimensions()))
    })
}

/// Writes planned placements into an inventory snapshot.
pub fn commit_placements(result: &PlacementResult, inventory: &mut Inventory) {
    for placement in &result.placements {
        inventory.set_placement(placement.clone());
    }
}
