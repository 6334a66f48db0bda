//! Rearrangement planner: frees room in a container for a pending item.
//!
//! The policy is greedy and not globally optimal. Items with the lowest
//! priority are relocated first; each is rotated in place when that alone
//! makes room, otherwise moved to another container chosen with the same
//! candidate ordering as the placement planner. Items whose priority is not
//! strictly lower than the pending item's are never touched.

use std::collections::HashSet;

use stowage_core::{
    orientations, Config, Cuboid, Error, Inventory, Item, Orientation, Placement, Result,
};

use crate::container::{models_from_inventory, ContainerModel};
use crate::planner::{candidate_containers, exceeds_every_container, PlacementPlanner};

/// A single step of a rearrangement plan.
#[derive(Debug, Clone, PartialEq)]
pub enum RearrangementStep {
    /// Move an item to another container.
    Move {
        /// Item being moved.
        item_id: String,
        /// Container it leaves.
        from_container: String,
        /// Container it goes to.
        to_container: String,
        /// Its new placement.
        destination: Placement,
        /// Why the move is needed.
        reason: String,
    },
    /// Re-orient an item where it stands.
    Rotate {
        /// Item being rotated.
        item_id: String,
        /// Container holding it.
        container_id: String,
        /// Orientation after the rotation.
        new_orientation: Orientation,
        /// Its placement after the rotation.
        placement: Placement,
        /// Why the rotation is needed.
        reason: String,
    },
}

impl RearrangementStep {
    /// Item the step applies to.
    pub fn item_id(&self) -> &str {
        match self {
            RearrangementStep::Move { item_id, .. } | RearrangementStep::Rotate { item_id, .. } => {
                item_id
            }
        }
    }

    /// Human-readable reason.
    pub fn reason(&self) -> &str {
        match self {
            RearrangementStep::Move { reason, .. } | RearrangementStep::Rotate { reason, .. } => {
                reason
            }
        }
    }

    /// Returns true for a move step.
    pub fn is_move(&self) -> bool {
        matches!(self, RearrangementStep::Move { .. })
    }

    /// Placement of the item once the step is applied.
    pub fn resulting_placement(&self) -> &Placement {
        match self {
            RearrangementStep::Move { destination, .. } => destination,
            RearrangementStep::Rotate { placement, .. } => placement,
        }
    }
}

/// A proposed rearrangement of one container.
#[derive(Debug, Clone, PartialEq)]
pub struct RearrangementPlan {
    /// Container being rearranged.
    pub container_id: String,
    /// Item the room is made for.
    pub pending_item_id: String,
    /// Volume missing before any step (pending volume minus available volume).
    pub required_volume: f64,
    /// Ordered steps.
    pub steps: Vec<RearrangementStep>,
    /// Volume vacated by move steps.
    pub space_freed: f64,
    /// Estimated duration in minutes.
    pub estimated_minutes: f64,
    /// True once the pending item fits; false for a partial plan.
    pub success: bool,
}

impl RearrangementPlan {
    fn new(container_id: &str, pending: &Item, required_volume: f64) -> Self {
        Self {
            container_id: container_id.to_string(),
            pending_item_id: pending.id.clone(),
            required_volume,
            steps: Vec::new(),
            space_freed: 0.0,
            estimated_minutes: 0.0,
            success: false,
        }
    }

    /// Number of move steps.
    pub fn move_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_move()).count()
    }

    /// Number of rotate steps.
    pub fn rotation_count(&self) -> usize {
        self.steps.len() - self.move_count()
    }
}

/// Outcome of applying a plan to an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RearrangementOutcome {
    /// Number of items moved or rotated.
    pub items_moved: usize,
    /// Whether the applied plan makes room for the pending item.
    pub success: bool,
}

/// Greedy rearrangement planner.
pub struct RearrangementPlanner {
    planner: PlacementPlanner,
}

impl RearrangementPlanner {
    /// Creates a planner with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            planner: PlacementPlanner::new(config),
        }
    }

    /// Creates a planner reusing a placement planner (and its strategy).
    pub fn from_planner(planner: PlacementPlanner) -> Self {
        Self { planner }
    }

    /// Plans how to make room for `pending` in `container_id`.
    pub fn plan(
        &self,
        container_id: &str,
        pending: &Item,
        inventory: &Inventory,
    ) -> Result<RearrangementPlan> {
        pending.validate()?;
        let mut models = models_from_inventory(inventory)?;
        let target = models
            .iter()
            .position(|m| m.id() == container_id)
            .ok_or_else(|| Error::ContainerNotFound(container_id.to_string()))?;

        let allowed = orientations(&pending.dimensions)?;
        if exceeds_every_container(&models[target..=target], &pending.dimensions, &allowed) {
            return Err(Error::Overcapacity(format!(
                "Item '{}' does not fit container '{}' in any orientation",
                pending.id, container_id
            )));
        }

        let required = (pending.volume() - models[target].available_volume()).max(0.0);
        let mut plan = RearrangementPlan::new(container_id, pending, required);

        if models[target].get(&pending.id).is_some() || self.pending_fits(&models[target], pending, &allowed) {
            plan.success = true;
            return Ok(plan);
        }

        for placement in relocation_candidates(&models[target], pending, inventory) {
            let item = inventory.item(&placement.item_id)?;

            if let Some(step) = self.try_rotate(&mut models[target], item, &placement, pending, &allowed)? {
                plan.steps.push(step);
                plan.success = true;
                break;
            }

            match self.try_move(&mut models, target, item, pending)? {
                Some(step) => {
                    plan.space_freed += placement.volume();
                    plan.steps.push(step);
                    if self.pending_fits(&models[target], pending, &allowed) {
                        plan.success = true;
                        break;
                    }
                }
                None => log::debug!("No room elsewhere for '{}', keeping it in place", item.id),
            }
        }

        let config = self.planner.config();
        plan.estimated_minutes = plan.move_count() as f64 * config.minutes_per_move
            + plan.rotation_count() as f64 * config.minutes_per_rotation;

        if !plan.success {
            log::warn!(
                "Rearrangement of '{}' for '{}' is partial after {} steps",
                container_id,
                pending.id,
                plan.steps.len()
            );
        }
        Ok(plan)
    }

    /// Applies a plan to an inventory.
    ///
    /// Every step is checked against the current contents; a step that no
    /// longer applies fails the call and leaves the inventory unchanged.
    pub fn execute(
        &self,
        plan: &RearrangementPlan,
        inventory: &mut Inventory,
    ) -> Result<RearrangementOutcome> {
        let mut models = models_from_inventory(inventory)?;
        let mut touched = HashSet::new();

        for step in &plan.steps {
            let (from, to) = match step {
                RearrangementStep::Move {
                    from_container,
                    to_container,
                    ..
                } => (from_container.as_str(), to_container.as_str()),
                RearrangementStep::Rotate { container_id, .. } => {
                    (container_id.as_str(), container_id.as_str())
                }
            };

            let from_idx = model_index(&models, from)?;
            models[from_idx].remove(step.item_id()).ok_or_else(|| {
                Error::ItemNotFound(format!("{} is not in container {}", step.item_id(), from))
            })?;

            let to_idx = model_index(&models, to)?;
            models[to_idx].insert(step.resulting_placement().clone())?;
            touched.insert(step.item_id().to_string());
        }

        for step in &plan.steps {
            inventory.set_placement(step.resulting_placement().clone());
        }

        Ok(RearrangementOutcome {
            items_moved: touched.len(),
            success: plan.success,
        })
    }

    fn pending_fits(&self, model: &ContainerModel, pending: &Item, allowed: &[Orientation]) -> bool {
        self.planner
            .strategy()
            .find_position(model, &pending.dimensions, allowed)
            .is_some()
    }

    /// Tries each other orientation of `item` at its current start corner.
    /// Accepted only if the pending item fits afterwards.
    fn try_rotate(
        &self,
        model: &mut ContainerModel,
        item: &Item,
        current: &Placement,
        pending: &Item,
        allowed: &[Orientation],
    ) -> Result<Option<RearrangementStep>> {
        for orientation in orientations(&item.dimensions)? {
            if orientation == current.orientation {
                continue;
            }

            let rotated = Cuboid::at(current.start, orientation.apply(&item.dimensions));
            if !model.would_fit_ignoring(&rotated, Some(item.id.as_str())) {
                continue;
            }

            let placement = current.relocated(model.id(), orientation, current.start, &item.dimensions);
            let mut trial = model.clone();
            trial.remove(&item.id);
            trial.insert(placement.clone())?;

            if self.pending_fits(&trial, pending, allowed) {
                *model = trial;
                return Ok(Some(RearrangementStep::Rotate {
                    item_id: item.id.clone(),
                    container_id: model.id().to_string(),
                    new_orientation: orientation,
                    placement,
                    reason: "Reduce footprint".to_string(),
                }));
            }
        }
        Ok(None)
    }

    /// Moves `item` out of `models[source]` into the first other container
    /// with room for it.
    fn try_move(
        &self,
        models: &mut [ContainerModel],
        source: usize,
        item: &Item,
        pending: &Item,
    ) -> Result<Option<RearrangementStep>> {
        let allowed = orientations(&item.dimensions)?;
        let source_id = models[source].id().to_string();
        let candidates = candidate_containers(models, item.preferred_zone.as_deref(), Some(source_id.as_str()));

        let Some((dest, candidate)) =
            self.planner
                .search(models, &candidates, &item.dimensions, &allowed)
        else {
            return Ok(None);
        };

        let destination = Placement::new(
            item.id.clone(),
            models[dest].id(),
            candidate.orientation,
            candidate.start(),
            &item.dimensions,
        );
        models[dest].insert(destination.clone())?;
        models[source].remove(&item.id);

        let mut reason = format!(
            "Make space for high priority item {} (priority {})",
            pending.id, pending.priority
        );
        if let Some(preferred) = item.preferred_zone.as_deref() {
            if preferred != models[dest].zone() {
                reason.push_str(&format!(
                    "; zone mismatch: prefers {}, moved to {}",
                    preferred,
                    models[dest].zone()
                ));
            }
        }

        Ok(Some(RearrangementStep::Move {
            item_id: item.id.clone(),
            from_container: source_id,
            to_container: models[dest].id().to_string(),
            destination,
            reason,
        }))
    }
}

impl Default for RearrangementPlanner {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Placements in the container that may be relocated for `pending`:
/// strictly lower priority, lowest first, then larger volume, then ID.
fn relocation_candidates(
    model: &ContainerModel,
    pending: &Item,
    inventory: &Inventory,
) -> Vec<Placement> {
    let mut candidates: Vec<(u8, Placement)> = model
        .placements()
        .iter()
        .filter_map(|p| match inventory.item(&p.item_id) {
            Ok(item) if item.priority < pending.priority => Some((item.priority, p.clone())),
            Ok(_) => None,
            Err(_) => {
                log::warn!("Placement of unknown item '{}' is never relocated", p.item_id);
                None
            }
        })
        .collect();

    candidates.sort_by(|(pa, a), (pb, b)| {
        pa.cmp(pb)
            .then(b.volume().total_cmp(&a.volume()))
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    candidates.into_iter().map(|(_, p)| p).collect()
}

fn model_index(models: &[ContainerModel], id: &str) -> Result<usize> {
    models
        .iter()
        .position(|m| m.id() == id)
        .ok_or_else(|| Error::ContainerNotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use stowage_core::Container;

    fn put(inv: &mut Inventory, item: Item, container: &str, start: Vector3<f64>) {
        inv.placements.push(Placement::new(
            item.id.clone(),
            container,
            Orientation::IDENTITY,
            start,
            &item.dimensions,
        ));
        inv.items.push(item);
    }

    fn crowded() -> Inventory {
        let mut inv = Inventory::new()
            .with_container(Container::new("A", "Lab", 10.0, 10.0, 10.0))
            .with_container(Container::new("B", "Storage", 10.0, 10.0, 10.0));
        put(&mut inv, Item::new("low", "Spare Bolts", 10.0, 10.0, 5.0).with_priority(10), "A", Vector3::zeros());
        put(
            &mut inv,
            Item::new("mid", "Medkit", 10.0, 10.0, 5.0).with_priority(60),
            "A",
            Vector3::new(0.0, 0.0, 5.0),
        );
        inv
    }

    #[test]
    fn test_moves_lowest_priority_first() {
        let inv = crowded();
        let pending = Item::new("urgent", "Oxygen", 10.0, 10.0, 5.0).with_priority(90);

        let plan = RearrangementPlanner::default().plan("A", &pending, &inv).unwrap();

        assert!(plan.success);
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].item_id(), "low");
        assert!(plan.steps[0].is_move());
        assert!((plan.space_freed - 500.0).abs() < 1e-9);
        assert!((plan.estimated_minutes - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_never_moves_equal_or_higher_priority() {
        let inv = crowded();
        let pending = Item::new("p", "Pump", 10.0, 10.0, 10.0).with_priority(60);

        let plan = RearrangementPlanner::default().plan("A", &pending, &inv).unwrap();

        assert!(!plan.success);
        assert!(plan.steps.iter().all(|s| s.item_id() == "low"));
    }

    #[test]
    fn test_rotation_in_place() {
        // Flat tray: a 1 x 3 strip at the origin leaves no 4 x 4 gap until it
        // is turned to lie along the front edge.
        let mut inv = Inventory::new().with_container(Container::new("A", "Lab", 4.0, 5.0, 1.0));
        put(&mut inv, Item::new("strip", "Cable Tray", 1.0, 3.0, 1.0).with_priority(5), "A", Vector3::zeros());
        let pending = Item::new("panel", "Solar Panel", 4.0, 4.0, 1.0).with_priority(80);

        let planner = RearrangementPlanner::default();
        let plan = planner.plan("A", &pending, &inv).unwrap();

        assert!(plan.success);
        assert_eq!(plan.rotation_count(), 1);
        assert_eq!(plan.steps[0].reason(), "Reduce footprint");
        assert_eq!(plan.steps[0].resulting_placement().size(), Vector3::new(3.0, 1.0, 1.0));
        assert!((plan.estimated_minutes - 2.0).abs() < 1e-9);
        assert!(plan.space_freed.abs() < 1e-9);

        planner.execute(&plan, &mut inv).unwrap();
        let result = PlacementPlanner::default_config()
            .plan_inventory(&[pending], &inv)
            .unwrap();
        assert!(result.all_placed());
    }

    #[test]
    fn test_zone_mismatch_is_flagged() {
        let mut inv = crowded();
        inv.items[0].preferred_zone = Some("Lab".to_string());
        let pending = Item::new("urgent", "Oxygen", 10.0, 10.0, 5.0).with_priority(90);

        let plan = RearrangementPlanner::default().plan("A", &pending, &inv).unwrap();
        assert!(plan.steps[0].reason().contains("zone mismatch"));
    }

    #[test]
    fn test_errors() {
        let inv = crowded();
        let planner = RearrangementPlanner::default();

        assert!(matches!(
            planner.plan("Z", &Item::new("x", "x", 1.0, 1.0, 1.0), &inv),
            Err(Error::ContainerNotFound(_))
        ));
        assert!(matches!(
            planner.plan("A", &Item::new("x", "x", 11.0, 11.0, 1.0), &inv),
            Err(Error::Overcapacity(_))
        ));
    }

    #[test]
    fn test_execute_applies_moves() {
        let mut inv = crowded();
        let pending = Item::new("urgent", "Oxygen", 10.0, 10.0, 5.0).with_priority(90);
        let planner = RearrangementPlanner::default();
        let plan = planner.plan("A", &pending, &inv).unwrap();

        let outcome = planner.execute(&plan, &mut inv).unwrap();

        assert_eq!(outcome, RearrangementOutcome { items_moved: 1, success: true });
        assert_eq!(inv.placement_of("low").unwrap().container_id, "B");
        assert_eq!(ContainerModel::from_inventory(&inv, "A").unwrap().placed_count(), 1);
    }
}
