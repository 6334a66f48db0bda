//! Retrieval analysis: which items stand between the open face and a target.
//!
//! An item B blocks item A when B lies entirely between the open face and A
//! along the access axis and B's width/height projection overlaps A's. A
//! blocker must itself be pulled out through the open face, so the removal
//! set is the transitive closure of that relation.

use std::collections::HashSet;
use std::fmt;

use stowage_core::geometry::{HEIGHT_AXIS, WIDTH_AXIS};
use stowage_core::{Cuboid, Error, Inventory, Item, OpenFace, Placement, Result, EPSILON};

use crate::container::ContainerModel;

/// What a retrieval step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalAction {
    /// Temporarily take a blocking item out.
    Remove,
    /// Take the requested item out.
    Retrieve,
    /// Put a previously removed blocker back.
    PlaceBack,
}

/// One instruction in a retrieval sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalStep {
    /// 1-based step number.
    pub step: usize,
    /// Action to perform.
    pub action: RetrievalAction,
    /// Item the action applies to.
    pub item_id: String,
    /// Name of that item.
    pub item_name: String,
}

impl fmt::Display for RetrievalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.action {
            RetrievalAction::Remove => "Remove",
            RetrievalAction::Retrieve => "Retrieve",
            RetrievalAction::PlaceBack => "Place back",
        };
        write!(f, "{}. {} {} (ID: {})", self.step, verb, self.item_name, self.item_id)
    }
}

/// Result of analysing how to reach an item.
#[derive(Debug, Clone)]
pub struct RetrievalReport {
    /// Snapshot of the requested item.
    pub item: Item,
    /// Current placement of the requested item.
    pub placement: Placement,
    /// Container holding the item.
    pub container_id: String,
    /// Zone of that container.
    pub zone: String,
    /// Items that must be removed first, nearest the open face first.
    pub blockers: Vec<Placement>,
    /// Number of steps: `2 * blockers + 1`.
    pub steps: usize,
    /// Ordered instructions.
    pub instructions: Vec<RetrievalStep>,
}

impl RetrievalReport {
    /// Returns the instructions as display lines.
    pub fn instruction_lines(&self) -> Vec<String> {
        self.instructions.iter().map(ToString::to_string).collect()
    }

    /// IDs of the blocking items in removal order.
    pub fn blocker_ids(&self) -> Vec<&str> {
        self.blockers.iter().map(|p| p.item_id.as_str()).collect()
    }
}

/// Checks if `blocker` stands between the open face and `target`.
pub fn blocks(face: OpenFace, blocker: &Cuboid, target: &Cuboid) -> bool {
    let axis = face.axis();
    blocker.max[axis] <= target.min[axis] + EPSILON
        && blocker.overlaps_on(target, WIDTH_AXIS)
        && blocker.overlaps_on(target, HEIGHT_AXIS)
}

/// Retrieval analyzer for containers with a single open face.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalAnalyzer {
    face: OpenFace,
}

impl RetrievalAnalyzer {
    /// Creates an analyzer for the given open face.
    pub fn new(face: OpenFace) -> Self {
        Self { face }
    }

    /// Returns every placement that must be removed to reach `target`,
    /// ordered nearest the open face first.
    pub fn removal_set<'a>(&self, target: &Placement, placed: &'a [Placement]) -> Vec<&'a Placement> {
        let mut chosen: HashSet<&str> = HashSet::new();
        let mut frontier: Vec<Cuboid> = vec![target.cuboid()];
        let mut removal: Vec<&Placement> = Vec::new();

        while let Some(current) = frontier.pop() {
            for p in placed {
                if p.item_id == target.item_id || chosen.contains(p.item_id.as_str()) {
                    continue;
                }
                if blocks(self.face, &p.cuboid(), &current) {
                    chosen.insert(p.item_id.as_str());
                    frontier.push(p.cuboid());
                    removal.push(p);
                }
            }
        }

        let face = self.face;
        removal.sort_by(|a, b| {
            face.distance(&a.cuboid())
                .total_cmp(&face.distance(&b.cuboid()))
                .then(a.start.x.total_cmp(&b.start.x))
                .then(a.start.z.total_cmp(&b.start.z))
                .then(a.item_id.cmp(&b.item_id))
        });
        removal
    }

    /// Analyses retrieval of `target` from the container it is placed in.
    ///
    /// `inventory` is only used to resolve item names for the instructions.
    pub fn analyze_in(
        &self,
        target: &Item,
        model: &ContainerModel,
        inventory: &Inventory,
    ) -> Result<RetrievalReport> {
        let placement = model
            .get(&target.id)
            .ok_or_else(|| Error::ItemNotFound(target.id.clone()))?
            .clone();

        let blockers: Vec<Placement> = self
            .removal_set(&placement, model.placements())
            .into_iter()
            .cloned()
            .collect();

        let name_of = |id: &str| {
            inventory
                .item(id)
                .map(|i| i.name.clone())
                .unwrap_or_else(|_| id.to_string())
        };

        let mut instructions = Vec::with_capacity(blockers.len() * 2 + 1);
        let mut push = |action: RetrievalAction, item_id: &str, item_name: String| {
            instructions.push(RetrievalStep {
                step: instructions.len() + 1,
                action,
                item_id: item_id.to_string(),
                item_name,
            });
        };

        for b in &blockers {
            push(RetrievalAction::Remove, &b.item_id, name_of(&b.item_id));
        }
        push(RetrievalAction::Retrieve, &target.id, target.name.clone());
        for b in blockers.iter().rev() {
            push(RetrievalAction::PlaceBack, &b.item_id, name_of(&b.item_id));
        }

        log::debug!(
            "Retrieving '{}' from '{}' needs {} removals",
            target.id,
            model.id(),
            blockers.len()
        );

        Ok(RetrievalReport {
            item: target.clone(),
            placement,
            container_id: model.id().to_string(),
            zone: model.zone().to_string(),
            steps: 2 * blockers.len() + 1,
            blockers,
            instructions,
        })
    }

    /// Locates an item in the inventory and analyses its retrieval.
    pub fn analyze(&self, item_id: &str, inventory: &Inventory) -> Result<RetrievalReport> {
        let item = inventory.item(item_id)?;
        let placement = inventory
            .placement_of(item_id)
            .ok_or_else(|| Error::ItemNotFound(format!("{} is not placed in any container", item_id)))?;
        let model = ContainerModel::from_inventory(inventory, &placement.container_id)?;
        self.analyze_in(item, &model, inventory)
    }
}

/// Finds the first item whose name contains `fragment`, ignoring case.
pub fn find_by_name<'a>(inventory: &'a Inventory, fragment: &str) -> Option<&'a Item> {
    let needle = fragment.to_lowercase();
    inventory
        .items
        .iter()
        .find(|i| i.name.to_lowercase().contains(&needle))
}
