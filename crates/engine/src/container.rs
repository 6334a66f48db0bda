//! Per-container occupancy tracking.

use std::collections::HashSet;

use nalgebra::Vector3;
use stowage_core::geometry::{fits, validate_dimensions, Cuboid, EPSILON};
use stowage_core::{Container, Error, Inventory, Placement, Result};

/// A container together with the items currently placed in it.
///
/// Available volume is always derived from the placements; nothing is cached.
#[derive(Debug, Clone)]
pub struct ContainerModel {
    container: Container,
    placed: Vec<Placement>,
}

impl ContainerModel {
    /// Creates an empty model for a container.
    pub fn new(container: Container) -> Result<Self> {
        container.validate()?;
        Ok(Self {
            container,
            placed: Vec::new(),
        })
    }

    /// Creates a model and inserts existing placements, validating each.
    pub fn with_placements(
        container: Container,
        placements: impl IntoIterator<Item = Placement>,
    ) -> Result<Self> {
        let mut model = Self::new(container)?;
        for placement in placements {
            model.insert(placement)?;
        }
        Ok(model)
    }

    /// Builds the model of one container from an inventory snapshot.
    pub fn from_inventory(inventory: &Inventory, container_id: &str) -> Result<Self> {
        let container = inventory.container(container_id)?.clone();
        Self::with_placements(container, inventory.placements_in(container_id).cloned())
    }

    /// Returns the container record.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Returns the container ID.
    pub fn id(&self) -> &str {
        &self.container.id
    }

    /// Returns the container zone.
    pub fn zone(&self) -> &str {
        &self.container.zone
    }

    /// Returns the interior dimensions.
    pub fn dimensions(&self) -> &Vector3<f64> {
        &self.container.dimensions
    }

    /// Returns the placements in this container.
    pub fn placements(&self) -> &[Placement] {
        &self.placed
    }

    /// Returns the number of placed items.
    pub fn placed_count(&self) -> usize {
        self.placed.len()
    }

    /// Returns the placement of an item in this container.
    pub fn get(&self, item_id: &str) -> Option<&Placement> {
        self.placed.iter().find(|p| p.item_id == item_id)
    }

    /// Returns the interior volume.
    pub fn total_volume(&self) -> f64 {
        self.container.volume()
    }

    /// Returns the volume occupied by placed items.
    pub fn used_volume(&self) -> f64 {
        self.placed.iter().map(Placement::volume).sum()
    }

    /// Returns the interior volume not occupied by any item.
    pub fn available_volume(&self) -> f64 {
        (self.total_volume() - self.used_volume()).max(0.0)
    }

    /// Returns the occupied fraction (0.0 - 1.0).
    pub fn utilization(&self) -> f64 {
        self.used_volume() / self.total_volume()
    }

    /// Checks if a cuboid is within bounds and free of every placed item.
    pub fn would_fit(&self, candidate: &Cuboid) -> bool {
        self.would_fit_ignoring(candidate, None)
    }

    /// Same as [`Self::would_fit`], but ignores one item (used when an item
    /// is re-oriented where it stands).
    pub fn would_fit_ignoring(&self, candidate: &Cuboid, ignore: Option<&str>) -> bool {
        fits(candidate, self.dimensions())
            && self
                .placed
                .iter()
                .filter(|p| Some(p.item_id.as_str()) != ignore)
                .all(|p| !p.cuboid().intersects(candidate))
    }

    /// Inserts a placement after validating container, bounds and overlap.
    pub fn insert(&mut self, placement: Placement) -> Result<()> {
        if placement.container_id != self.container.id {
            return Err(Error::InvalidInput(format!(
                "Placement of '{}' targets container '{}', not '{}'",
                placement.item_id, placement.container_id, self.container.id
            )));
        }

        validate_dimensions(&placement.item_id, &placement.size())?;

        if self.get(&placement.item_id).is_some() {
            return Err(Error::InvalidInput(format!(
                "Item '{}' is already placed in container '{}'",
                placement.item_id, self.container.id
            )));
        }

        let cuboid = placement.cuboid();
        if !fits(&cuboid, self.dimensions()) {
            return Err(Error::InvalidInput(format!(
                "Item '{}' exceeds the bounds of container '{}'",
                placement.item_id, self.container.id
            )));
        }

        if let Some(other) = self.placed.iter().find(|p| p.cuboid().intersects(&cuboid)) {
            return Err(Error::InvalidInput(format!(
                "Item '{}' overlaps '{}' in container '{}'",
                placement.item_id, other.item_id, self.container.id
            )));
        }

        self.placed.push(placement);
        Ok(())
    }

    /// Removes an item from the container.
    pub fn remove(&mut self, item_id: &str) -> Option<Placement> {
        let idx = self.placed.iter().position(|p| p.item_id == item_id)?;
        Some(self.placed.remove(idx))
    }

    /// Candidate anchor points for new items.
    ///
    /// The origin plus, for every placed item, its start corner pushed to its
    /// end on one axis at a time. Points on or beyond the far walls are
    /// dropped. The result is deduplicated and ordered by depth, then width,
    /// then height, so anchors nearest the open face come first.
    pub fn anchor_points(&self) -> Vec<Vector3<f64>> {
        let dims = *self.dimensions();
        let mut anchors = vec![Vector3::zeros()];

        for p in &self.placed {
            anchors.push(Vector3::new(p.end.x, p.start.y, p.start.z));
            anchors.push(Vector3::new(p.start.x, p.end.y, p.start.z));
            anchors.push(Vector3::new(p.start.x, p.start.y, p.end.z));
        }

        anchors.retain(|a| (0..3).all(|axis| a[axis] < dims[axis] - EPSILON));
        anchors.sort_by(|a, b| {
            a.y.total_cmp(&b.y)
                .then(a.x.total_cmp(&b.x))
                .then(a.z.total_cmp(&b.z))
        });
        anchors.dedup_by(|a, b| (*a - *b).norm() < EPSILON);
        anchors
    }
}

/// Returns the first ID that occurs twice.
fn first_duplicate<'a>(ids: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    ids.into_iter().find(|id| !seen.insert(*id))
}

/// Fails with `InvalidInput` on the first `kind` ID that occurs twice.
pub fn ensure_unique<'a>(kind: &str, ids: impl IntoIterator<Item = &'a str>) -> Result<()> {
    match first_duplicate(ids) {
        Some(id) => Err(Error::InvalidInput(format!("Duplicate {} ID '{}'", kind, id))),
        None => Ok(()),
    }
}

fn ensure_placed_once<'a>(placements: impl IntoIterator<Item = &'a Placement>) -> Result<()> {
    match first_duplicate(placements.into_iter().map(|p| p.item_id.as_str())) {
        Some(id) => Err(Error::InvalidInput(format!(
            "Item '{}' is placed more than once",
            id
        ))),
        None => Ok(()),
    }
}

/// Checks that container IDs are unique and that no item is placed twice.
pub fn ensure_distinct_models(models: &[ContainerModel]) -> Result<()> {
    ensure_unique("container", models.iter().map(|m| m.id()))?;
    ensure_placed_once(models.iter().flat_map(|m| m.placements()))
}

/// Builds the models of every container in an inventory.
///
/// Fails on duplicate container or item IDs, on an item placed more than
/// once, and on a placement that references an unknown container or
/// violates the bounds/overlap invariants.
pub fn models_from_inventory(inventory: &Inventory) -> Result<Vec<ContainerModel>> {
    ensure_unique("container", inventory.containers.iter().map(|c| c.id.as_str()))?;
    ensure_unique("item", inventory.items.iter().map(|i| i.id.as_str()))?;
    ensure_placed_once(&inventory.placements)?;

    if let Some(orphan) = inventory
        .placements
        .iter()
        .find(|p| inventory.container(&p.container_id).is_err())
    {
        return Err(Error::ContainerNotFound(orphan.container_id.clone()));
    }

    inventory
        .containers
        .iter()
        .map(|c| ContainerModel::from_inventory(inventory, &c.id))
        .collect()
}
