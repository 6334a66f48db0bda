//! JSON request and response shapes, and the operations behind them.
//!
//! Every operation takes the caller's inventory snapshot explicitly. Wire
//! names are camelCase; container records also carry `available_volume`,
//! which is always recomputed from placements on output and ignored on input.

use chrono::{DateTime, NaiveDate, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use stowage_core::{
    Config, Container, Cuboid, Error, Inventory, Item, Orientation, Placement, Result, Strategy,
};

use crate::container::{ensure_unique, models_from_inventory, ContainerModel};
use crate::lifecycle::{consume_use, Simulator, UsageRequest, UseOutcome};
use crate::planner::{commit_placements, PlacementPlanner};
use crate::rearrange::{RearrangementPlan, RearrangementPlanner, RearrangementStep};
use crate::retrieval::{find_by_name, RetrievalAnalyzer, RetrievalStep};
use crate::waste::{self, ReturnRequest, WasteRecord};

/// A point or extent in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Offset along the width axis.
    pub width: f64,
    /// Offset along the depth axis (0 is the open face).
    pub depth: f64,
    /// Offset along the height axis.
    pub height: f64,
}

impl From<Vector3<f64>> for Coordinates {
    fn from(v: Vector3<f64>) -> Self {
        Self {
            width: v.x,
            depth: v.y,
            height: v.z,
        }
    }
}

impl From<Coordinates> for Vector3<f64> {
    fn from(c: Coordinates) -> Self {
        Vector3::new(c.width, c.depth, c.height)
    }
}

/// Start and end corners of a placed item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Corner nearest the origin.
    pub start_coordinates: Coordinates,
    /// Opposite corner.
    pub end_coordinates: Coordinates,
}

impl From<&Placement> for Position {
    fn from(p: &Placement) -> Self {
        Self {
            start_coordinates: p.start.into(),
            end_coordinates: p.end.into(),
        }
    }
}

/// Container record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    /// Container ID.
    #[serde(alias = "containerId")]
    pub id: String,
    /// Zone the container belongs to.
    pub zone: String,
    /// Interior width.
    pub width: f64,
    /// Interior depth.
    pub depth: f64,
    /// Interior height.
    pub height: f64,
    /// Recomputed on output, ignored on input.
    #[serde(rename = "available_volume", default, skip_serializing_if = "Option::is_none")]
    pub available_volume: Option<f64>,
}

impl ContainerRecord {
    fn to_container(&self) -> Container {
        Container::new(self.id.clone(), self.zone.clone(), self.width, self.depth, self.height)
    }
}

impl From<&ContainerModel> for ContainerRecord {
    fn from(model: &ContainerModel) -> Self {
        let dims = model.dimensions();
        Self {
            id: model.id().to_string(),
            zone: model.zone().to_string(),
            width: dims.x,
            depth: dims.y,
            height: dims.z,
            available_volume: Some(model.available_volume()),
        }
    }
}

fn default_priority() -> u8 {
    50
}

/// Item record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// Item ID.
    #[serde(alias = "itemId")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Width.
    pub width: f64,
    /// Depth.
    pub depth: f64,
    /// Height.
    pub height: f64,
    /// Priority from 0 to 100, 50 when omitted.
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Zone to try first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_zone: Option<String>,
    /// Last date on which the item is usable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    /// Remaining uses; absent for unlimited items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    /// Mass in kg.
    #[serde(default)]
    pub mass: f64,
}

impl ItemRecord {
    /// Converts to a validated item.
    pub fn to_item(&self) -> Result<Item> {
        let item = Item {
            id: self.id.clone(),
            name: self.name.clone(),
            dimensions: Vector3::new(self.width, self.depth, self.height),
            priority: self.priority,
            preferred_zone: self.preferred_zone.clone(),
            expiry_date: self.expiry_date,
            usage_limit: self.usage_limit,
            mass: self.mass,
        };
        item.validate()?;
        Ok(item)
    }
}

impl From<&Item> for ItemRecord {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            width: item.dimensions.x,
            depth: item.dimensions.y,
            height: item.dimensions.z,
            priority: item.priority,
            preferred_zone: item.preferred_zone.clone(),
            expiry_date: item.expiry_date,
            usage_limit: item.usage_limit,
            mass: item.mass,
        }
    }
}

/// Placement record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    /// Placed item.
    pub item_id: String,
    /// Container holding it.
    pub container_id: String,
    /// Occupied box.
    pub position: Position,
}

impl From<&Placement> for PlacementRecord {
    fn from(p: &Placement) -> Self {
        Self {
            item_id: p.item_id.clone(),
            container_id: p.container_id.clone(),
            position: p.into(),
        }
    }
}

/// Builds a placement for `item` from a start/end position.
///
/// The orientation is recovered from the extent; a position whose extent is
/// not a permutation of the item's dimensions is rejected.
pub fn placement_from_position(item: &Item, container_id: &str, position: &Position) -> Result<Placement> {
    let start: Vector3<f64> = position.start_coordinates.into();
    let end: Vector3<f64> = position.end_coordinates.into();
    let orientation = Orientation::matching(&item.dimensions, &(end - start)).ok_or_else(|| {
        Error::InvalidInput(format!(
            "Position of '{}' does not match its dimensions in any orientation",
            item.id
        ))
    })?;
    Ok(Placement::new(
        item.id.clone(),
        container_id,
        orientation,
        start,
        &item.dimensions,
    ))
}

/// JSON form of an inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySnapshot {
    /// All containers.
    #[serde(default)]
    pub containers: Vec<ContainerRecord>,
    /// All items, placed or not.
    #[serde(default)]
    pub items: Vec<ItemRecord>,
    /// At most one placement per item.
    #[serde(default)]
    pub placements: Vec<PlacementRecord>,
}

impl InventorySnapshot {
    /// Parses a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::SerializationError(e.to_string()))
    }

    /// Serializes the snapshot as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::SerializationError(e.to_string()))
    }

    /// Converts to an inventory, validating every record and placement.
    pub fn into_inventory(self) -> Result<Inventory> {
        let mut inventory = Inventory::new();
        for record in &self.containers {
            let container = record.to_container();
            container.validate()?;
            inventory.containers.push(container);
        }
        for record in &self.items {
            inventory.items.push(record.to_item()?);
        }
        for record in &self.placements {
            let item = inventory.item(&record.item_id)?;
            let placement = placement_from_position(item, &record.container_id, &record.position)?;
            inventory.placements.push(placement);
        }
        models_from_inventory(&inventory)?;
        Ok(inventory)
    }

    /// Builds the snapshot of an inventory.
    pub fn from_inventory(inventory: &Inventory) -> Result<Self> {
        let models = models_from_inventory(inventory)?;
        Ok(Self {
            containers: models.iter().map(ContainerRecord::from).collect(),
            items: inventory.items.iter().map(ItemRecord::from).collect(),
            placements: inventory.placements.iter().map(PlacementRecord::from).collect(),
        })
    }
}

/// Optional configuration overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    /// Placement strategy name.
    pub strategy: Option<String>,
    /// Anchor points examined per container.
    pub max_anchor_points: Option<usize>,
    /// Container count at which search goes parallel.
    pub parallel_threshold: Option<usize>,
    /// Estimated minutes per move step.
    pub minutes_per_move: Option<f64>,
    /// Estimated minutes per rotate step.
    pub minutes_per_rotation: Option<f64>,
}

/// Applies overrides on top of the default configuration.
pub fn build_config(request: Option<ConfigRequest>) -> Config {
    let mut config = Config::default();

    if let Some(req) = request {
        if let Some(strategy) = req.strategy {
            config = config.with_strategy(match strategy.to_lowercase().as_str() {
                "ff" | "firstfit" | "first_fit" => Strategy::FirstFit,
                _ => Strategy::CornerPoint,
            });
        }
        if let Some(n) = req.max_anchor_points {
            config = config.with_max_anchor_points(n);
        }
        if let Some(n) = req.parallel_threshold {
            config = config.with_parallel_threshold(n);
        }
        let per_move = req.minutes_per_move.unwrap_or(config.minutes_per_move);
        let per_rotation = req.minutes_per_rotation.unwrap_or(config.minutes_per_rotation);
        config = config.with_step_minutes(per_move, per_rotation);
    }

    config
}

/// Response for a failed operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always false.
    pub success: bool,
    /// Error category, e.g. `InvalidInput`.
    pub kind: String,
    /// Human-readable message.
    pub error: String,
}

impl From<&Error> for ErrorResponse {
    fn from(e: &Error) -> Self {
        Self {
            success: false,
            kind: e.kind().to_string(),
            error: e.to_string(),
        }
    }
}

/// Batch placement request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequest {
    /// Items to place.
    pub items: Vec<ItemRecord>,
    /// Containers to add to the inventory before planning.
    #[serde(default)]
    pub containers: Vec<ContainerRecord>,
}

/// An item that could not be placed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RearrangementNotice {
    /// Item left unplaced.
    pub item_id: String,
    /// Why it was left unplaced.
    pub message: String,
}

/// Batch placement response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResponse {
    /// True unless the request was rejected.
    pub success: bool,
    /// Accepted placements.
    pub placements: Vec<PlacementRecord>,
    /// Items that need a rearrangement to fit.
    pub rearrangements: Vec<RearrangementNotice>,
}

/// Inventory with the request's containers and items merged in.
/// Request records replace inventory records with the same ID.
fn merge_request(request: &PlacementRequest, inventory: &Inventory) -> Result<(Inventory, Vec<Item>)> {
    ensure_unique("container", request.containers.iter().map(|c| c.id.as_str()))?;
    ensure_unique("item", request.items.iter().map(|i| i.id.as_str()))?;

    let mut working = inventory.clone();
    for record in &request.containers {
        let container = record.to_container();
        container.validate()?;
        working.containers.retain(|c| c.id != container.id);
        working.containers.push(container);
    }

    let items = request
        .items
        .iter()
        .map(ItemRecord::to_item)
        .collect::<Result<Vec<_>>>()?;
    for item in &items {
        working.items.retain(|i| i.id != item.id);
        working.items.push(item.clone());
    }
    Ok((working, items))
}

fn run_placement(
    request: &PlacementRequest,
    inventory: &Inventory,
    config: &Config,
) -> Result<(Inventory, stowage_core::PlacementResult)> {
    let (working, items) = merge_request(request, inventory)?;
    let result = PlacementPlanner::new(config.clone()).plan_inventory(&items, &working)?;
    Ok((working, result))
}

fn placement_response(result: &stowage_core::PlacementResult) -> PlacementResponse {
    PlacementResponse {
        success: true,
        placements: result.placements.iter().map(PlacementRecord::from).collect(),
        rearrangements: result
            .unplaced
            .iter()
            .map(|u| RearrangementNotice {
                item_id: u.item_id.clone(),
                message: u.message().to_string(),
            })
            .collect(),
    }
}

/// Plans placements without changing the inventory.
pub fn plan_placement(
    request: &PlacementRequest,
    inventory: &Inventory,
    config: &Config,
) -> Result<PlacementResponse> {
    let (_, result) = run_placement(request, inventory, config)?;
    Ok(placement_response(&result))
}

/// Plans placements and commits them, together with the request's
/// containers and items, to the inventory.
pub fn commit_placement(
    request: &PlacementRequest,
    inventory: &mut Inventory,
    config: &Config,
) -> Result<PlacementResponse> {
    let (mut working, result) = run_placement(request, inventory, config)?;
    commit_placements(&result, &mut working);
    *inventory = working;
    Ok(placement_response(&result))
}

/// Search by ID or by name fragment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalRequest {
    /// Exact item ID.
    pub item_id: Option<String>,
    /// Case-insensitive name fragment.
    pub item_name: Option<String>,
}

/// Where an item is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
    /// Container holding the item.
    pub container_id: String,
    /// Zone of that container.
    pub zone: String,
    /// Occupied box.
    pub position: Position,
}

/// One retrieval instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalStepRecord {
    /// 1-based step number.
    pub step: usize,
    /// `remove`, `retrieve` or `placeBack`.
    pub action: String,
    /// Item handled by the step.
    pub item_id: String,
    /// Its name.
    pub item_name: String,
}

impl From<&RetrievalStep> for RetrievalStepRecord {
    fn from(s: &RetrievalStep) -> Self {
        let action = match s.action {
            crate::retrieval::RetrievalAction::Remove => "remove",
            crate::retrieval::RetrievalAction::Retrieve => "retrieve",
            crate::retrieval::RetrievalAction::PlaceBack => "placeBack",
        };
        Self {
            step: s.step,
            action: action.to_string(),
            item_id: s.item_id.clone(),
            item_name: s.item_name.clone(),
        }
    }
}

/// Search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// True unless the request was rejected.
    pub success: bool,
    /// Whether a matching item exists.
    pub found: bool,
    /// The matching item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<ItemRecord>,
    /// Where it is stored, if placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<StorageLocation>,
    /// Number of items to remove first.
    pub retrieval_steps: usize,
    /// Plain-text instructions.
    pub instructions: Vec<String>,
    /// Structured steps.
    #[serde(default)]
    pub steps: Vec<RetrievalStepRecord>,
}

/// Finds an item and describes how to retrieve it.
///
/// An unknown item yields `found: false`. A known but unplaced item is
/// found without a location.
pub fn search(request: &RetrievalRequest, inventory: &Inventory) -> Result<SearchResponse> {
    let item = match (&request.item_id, &request.item_name) {
        (Some(id), _) => inventory.items.iter().find(|i| &i.id == id),
        (None, Some(name)) => find_by_name(inventory, name),
        (None, None) => {
            return Err(Error::InvalidInput(
                "Provide itemId or itemName".to_string(),
            ))
        }
    };

    let Some(item) = item else {
        return Ok(SearchResponse {
            success: true,
            found: false,
            item: None,
            placement: None,
            retrieval_steps: 0,
            instructions: Vec::new(),
            steps: Vec::new(),
        });
    };

    if inventory.placement_of(&item.id).is_none() {
        return Ok(SearchResponse {
            success: true,
            found: true,
            item: Some(item.into()),
            placement: None,
            retrieval_steps: 0,
            instructions: Vec::new(),
            steps: Vec::new(),
        });
    }

    let report = RetrievalAnalyzer::default().analyze(&item.id, inventory)?;
    Ok(SearchResponse {
        success: true,
        found: true,
        item: Some(item.into()),
        placement: Some(StorageLocation {
            container_id: report.container_id.clone(),
            zone: report.zone.clone(),
            position: (&report.placement).into(),
        }),
        retrieval_steps: report.steps,
        instructions: report.instruction_lines(),
        steps: report.instructions.iter().map(RetrievalStepRecord::from).collect(),
    })
}

/// Retrieve request: consumes one use of the item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveRequest {
    /// Item to retrieve.
    pub item_id: String,
    /// Who retrieves it.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Retrieve response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResponse {
    /// True once the item is retrieved.
    pub success: bool,
    /// Outcome message.
    pub message: String,
    /// Number of blockers moved aside.
    pub steps: usize,
    /// Uses left; absent for unlimited items.
    pub remaining_uses: Option<u32>,
}

/// Retrieves a placed item, consuming one use. The placement is kept.
pub fn retrieve(request: &RetrieveRequest, inventory: &mut Inventory) -> Result<RetrieveResponse> {
    let report = RetrievalAnalyzer::default().analyze(&request.item_id, inventory)?;
    let item = inventory.item_mut(&request.item_id)?;

    let remaining_uses = match consume_use(item, 1) {
        UseOutcome::Unlimited => None,
        UseOutcome::AlreadyDepleted => Some(0),
        UseOutcome::Used { remaining, .. } => Some(remaining),
    };

    log::debug!(
        "Retrieved '{}'{} in {} steps",
        item.id,
        request
            .user_id
            .as_deref()
            .map(|u| format!(" for {}", u))
            .unwrap_or_default(),
        report.steps
    );

    Ok(RetrieveResponse {
        success: true,
        message: format!("Item {} retrieved successfully", item.name),
        steps: report.steps,
        remaining_uses,
    })
}

/// Manual placement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceRequest {
    /// Item to place.
    pub item_id: String,
    /// Who places it.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Target container.
    pub container_id: String,
    /// Requested box.
    pub position: Position,
}

/// Outcome of a simple state-changing call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Whether the operation was applied.
    pub success: bool,
    /// Outcome message.
    pub message: String,
}

/// Places an item at an explicit position if it is in bounds and does not
/// overlap anything else. An item already placed elsewhere is moved.
pub fn place(request: &PlaceRequest, inventory: &mut Inventory) -> Result<StatusResponse> {
    let item = inventory.item(&request.item_id)?;
    let placement = placement_from_position(item, &request.container_id, &request.position)?;
    let model = ContainerModel::from_inventory(inventory, &request.container_id)?;

    if !model.would_fit_ignoring(&placement.cuboid(), Some(request.item_id.as_str())) {
        return Ok(StatusResponse {
            success: false,
            message: "Not enough space in container at the requested position".to_string(),
        });
    }

    inventory.set_placement(placement);
    Ok(StatusResponse {
        success: true,
        message: format!("Item placed in container {}", request.container_id),
    })
}

/// Rearrangement request.
///
/// The pending item is `item` if given, else the inventory item `itemId`;
/// with neither, the highest-priority unplaced item is chosen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RearrangementRequest {
    /// Container to make room in.
    pub container_id: String,
    /// Known item to make room for.
    #[serde(default)]
    pub item_id: Option<String>,
    /// New item to make room for.
    #[serde(default)]
    pub item: Option<ItemRecord>,
}

/// One rearrangement step on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RearrangementStepRecord {
    /// `move` or `rotate`.
    pub action: String,
    /// Item handled by the step.
    pub item_id: String,
    /// Source container of a move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Destination container of a move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Axis permutation of a rotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_orientation: Option<[usize; 3]>,
    /// Box occupied after the step.
    pub position: Position,
    /// Why the step is needed.
    pub reason: String,
}

impl From<&RearrangementStep> for RearrangementStepRecord {
    fn from(step: &RearrangementStep) -> Self {
        match step {
            RearrangementStep::Move {
                item_id,
                from_container,
                to_container,
                destination,
                reason,
            } => Self {
                action: "move".to_string(),
                item_id: item_id.clone(),
                from: Some(from_container.clone()),
                to: Some(to_container.clone()),
                new_orientation: None,
                position: destination.into(),
                reason: reason.clone(),
            },
            RearrangementStep::Rotate {
                item_id,
                new_orientation,
                placement,
                reason,
                ..
            } => Self {
                action: "rotate".to_string(),
                item_id: item_id.clone(),
                from: None,
                to: None,
                new_orientation: Some(new_orientation.axes()),
                position: placement.into(),
                reason: reason.clone(),
            },
        }
    }
}

/// Rearrangement plan on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RearrangementPlanRecord {
    /// Container being rearranged.
    pub container_id: String,
    /// Item the room is made for.
    pub pending_item_id: Option<String>,
    /// Ordered steps.
    pub steps: Vec<RearrangementStepRecord>,
    /// Volume vacated by moves.
    pub space_gained: f64,
    /// Estimated duration.
    pub estimated_time_minutes: f64,
}

/// Rearrangement planning response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RearrangementResponse {
    /// False for a partial plan.
    pub success: bool,
    /// The plan.
    pub plan: RearrangementPlanRecord,
}

/// Rearrangement execution response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    /// Whether the pending item now fits.
    pub success: bool,
    /// Items moved or rotated.
    pub items_moved: usize,
}

fn pending_item(request: &RearrangementRequest, inventory: &Inventory) -> Result<Option<Item>> {
    if let Some(record) = &request.item {
        return record.to_item().map(Some);
    }
    if let Some(id) = &request.item_id {
        return inventory.item(id).cloned().map(Some);
    }

    let zone = inventory.container(&request.container_id)?.zone.clone();
    Ok(inventory
        .unplaced_items()
        .max_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.prefers_zone(&zone).cmp(&b.prefers_zone(&zone)))
                .then_with(|| b.id.cmp(&a.id))
        })
        .cloned())
}

fn plan_for(
    request: &RearrangementRequest,
    inventory: &Inventory,
    planner: &RearrangementPlanner,
) -> Result<Option<RearrangementPlan>> {
    match pending_item(request, inventory)? {
        Some(item) => planner.plan(&request.container_id, &item, inventory).map(Some),
        None => Ok(None),
    }
}

/// Proposes a rearrangement; the inventory is not changed.
pub fn plan_rearrangement(
    request: &RearrangementRequest,
    inventory: &Inventory,
    config: &Config,
) -> Result<RearrangementResponse> {
    let planner = RearrangementPlanner::new(config.clone());
    let Some(plan) = plan_for(request, inventory, &planner)? else {
        log::debug!("Nothing pending for '{}'", request.container_id);
        return Ok(RearrangementResponse {
            success: true,
            plan: RearrangementPlanRecord {
                container_id: request.container_id.clone(),
                pending_item_id: None,
                steps: Vec::new(),
                space_gained: 0.0,
                estimated_time_minutes: 0.0,
            },
        });
    };

    Ok(RearrangementResponse {
        success: plan.success,
        plan: RearrangementPlanRecord {
            container_id: plan.container_id.clone(),
            pending_item_id: Some(plan.pending_item_id.clone()),
            steps: plan.steps.iter().map(RearrangementStepRecord::from).collect(),
            space_gained: plan.space_freed,
            estimated_time_minutes: plan.estimated_minutes,
        },
    })
}

/// Plans a rearrangement and applies it to the inventory.
pub fn execute_rearrangement(
    request: &RearrangementRequest,
    inventory: &mut Inventory,
    config: &Config,
) -> Result<ExecutionResponse> {
    let planner = RearrangementPlanner::new(config.clone());
    let Some(plan) = plan_for(request, inventory, &planner)? else {
        return Ok(ExecutionResponse {
            success: true,
            items_moved: 0,
        });
    };

    let outcome = planner.execute(&plan, inventory)?;
    Ok(ExecutionResponse {
        success: outcome.success,
        items_moved: outcome.items_moved,
    })
}

fn default_uses() -> u32 {
    1
}

fn default_days() -> u32 {
    1
}

/// Daily usage of one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Item used each day.
    pub item_id: String,
    /// Uses per day, 1 when omitted.
    #[serde(default = "default_uses")]
    pub uses: u32,
}

/// Simulation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    /// Days to simulate.
    #[serde(default = "default_days")]
    pub num_of_days: u32,
    /// Usage applied every day.
    #[serde(default)]
    pub items_to_be_used_per_day: Vec<UsageRecord>,
    /// Defaults to the caller's current date.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUsedRecord {
    /// Simulated day.
    pub day: u32,
    /// Item used.
    pub item_id: String,
    /// Its name.
    pub name: String,
    /// Uses left after that day.
    pub remaining_uses: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsExpiredRecord {
    /// Simulated day.
    pub day: u32,
    /// Items that expired that day.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDepletedRecord {
    /// Day the last use was consumed.
    pub day: u32,
    /// Depleted item.
    pub item_id: String,
    /// Its name.
    pub name: String,
}

/// Changes produced by a simulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationChanges {
    /// Every use applied.
    pub items_used: Vec<ItemUsedRecord>,
    /// Expirations per day.
    pub items_expired: Vec<ItemsExpiredRecord>,
    /// Items that ran out of uses.
    pub items_depleted_today: Vec<ItemDepletedRecord>,
}

/// Simulation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    /// Always true for a completed run.
    pub success: bool,
    /// Days simulated.
    pub days_simulated: u32,
    /// Date of the last simulated day.
    pub end_date: NaiveDate,
    /// What changed.
    pub changes: SimulationChanges,
}

/// Advances time, applying expiry and usage to the inventory's items.
pub fn simulate(
    request: &SimulationRequest,
    inventory: &mut Inventory,
    today: NaiveDate,
) -> Result<SimulationResponse> {
    let usage: Vec<UsageRequest> = request
        .items_to_be_used_per_day
        .iter()
        .map(|u| UsageRequest::new(u.item_id.clone()).with_uses(u.uses))
        .collect();

    let simulator = Simulator::new(request.start_date.unwrap_or(today));
    let report = simulator.run_inventory(request.num_of_days, &usage, inventory);

    Ok(SimulationResponse {
        success: true,
        days_simulated: report.days_simulated,
        end_date: report.end_date,
        changes: SimulationChanges {
            items_used: report
                .items_used
                .into_iter()
                .map(|u| ItemUsedRecord {
                    day: u.day,
                    item_id: u.item_id,
                    name: u.name,
                    remaining_uses: u.remaining_uses,
                })
                .collect(),
            items_expired: report
                .items_expired
                .into_iter()
                .map(|e| ItemsExpiredRecord {
                    day: e.day,
                    count: e.count,
                })
                .collect(),
            items_depleted_today: report
                .items_depleted_today
                .into_iter()
                .map(|d| ItemDepletedRecord {
                    day: d.day,
                    item_id: d.item_id,
                    name: d.name,
                })
                .collect(),
        },
    })
}

/// Waste item on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteItemRecord {
    /// Waste item.
    pub item_id: String,
    /// Its name.
    pub name: String,
    /// `expired` or `depleted`.
    pub reason: String,
    /// Mass in kg.
    pub mass: f64,
    /// Volume.
    pub volume: f64,
    /// When it was marked as waste.
    pub marked_at: DateTime<Utc>,
    /// Container holding it, if placed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
}

fn waste_record(record: &WasteRecord, inventory: &Inventory) -> WasteItemRecord {
    WasteItemRecord {
        item_id: record.item_id.clone(),
        name: record.name.clone(),
        reason: record.reason.as_str().to_string(),
        mass: record.mass,
        volume: record.volume,
        marked_at: record.marked_at,
        container_id: inventory
            .placement_of(&record.item_id)
            .map(|p| p.container_id.clone()),
    }
}

/// Waste identification response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteResponse {
    /// Always true.
    pub success: bool,
    /// Expired and depleted items.
    pub waste_items: Vec<WasteItemRecord>,
}

/// Lists every expired or depleted item.
pub fn identify_waste(inventory: &Inventory, today: NaiveDate, now: DateTime<Utc>) -> WasteResponse {
    let waste = waste::identify_waste(&inventory.items, today, now);
    WasteResponse {
        success: true,
        waste_items: waste.iter().map(|w| waste_record(w, inventory)).collect(),
    }
}

/// Return plan request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPlanRequest {
    /// Container leaving with the waste.
    pub undocking_container_id: String,
    /// Undocking date.
    pub undocking_date: NaiveDate,
    /// Weight cap in kg.
    pub max_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPlanSummary {
    /// Items selected.
    pub items_to_return: usize,
    /// Their volume.
    pub total_volume: f64,
    /// Their mass.
    pub total_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnManifestRecord {
    /// Container leaving with the waste.
    pub undocking_container_id: String,
    /// Undocking date.
    pub undocking_date: NaiveDate,
    /// Items selected.
    pub return_items: Vec<WasteItemRecord>,
    /// Their volume.
    pub total_volume: f64,
    /// Their mass.
    pub total_weight: f64,
}

/// Return plan response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPlanResponse {
    /// True when every waste item fits.
    pub success: bool,
    /// Summary.
    pub return_plan: ReturnPlanSummary,
    /// Steps to get the selected items out.
    pub retrieval_steps: Vec<RetrievalStepRecord>,
    /// Full manifest.
    pub return_manifest: ReturnManifestRecord,
}

/// Plans which waste goes into the undocking container.
pub fn return_plan(
    request: &ReturnPlanRequest,
    inventory: &Inventory,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<ReturnPlanResponse> {
    let waste = waste::identify_waste(&inventory.items, today, now);
    let plan = waste::plan_return(
        &ReturnRequest {
            undocking_container_id: request.undocking_container_id.clone(),
            undocking_date: request.undocking_date,
            max_weight: request.max_weight,
        },
        &waste,
        inventory,
    )?;

    let manifest = &plan.manifest;
    Ok(ReturnPlanResponse {
        success: true,
        return_plan: ReturnPlanSummary {
            items_to_return: plan.items_to_return(),
            total_volume: manifest.total_volume,
            total_weight: manifest.total_weight,
        },
        retrieval_steps: plan
            .retrievals
            .iter()
            .flat_map(|r| r.instructions.iter().map(RetrievalStepRecord::from))
            .collect(),
        return_manifest: ReturnManifestRecord {
            undocking_container_id: manifest.undocking_container_id.clone(),
            undocking_date: manifest.undocking_date,
            return_items: manifest.items.iter().map(|w| waste_record(w, inventory)).collect(),
            total_volume: manifest.total_volume,
            total_weight: manifest.total_weight,
        },
    })
}

/// Undocking completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndockingRequest {
    /// Items leaving with the container.
    pub item_ids: Vec<String>,
}

/// Undocking completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndockingResponse {
    /// Always true.
    pub success: bool,
    /// Items removed from the inventory.
    pub items_removed: usize,
    /// Outcome message.
    pub message: String,
}

/// Removes undocked items from the inventory.
pub fn complete_undocking(request: &UndockingRequest, inventory: &mut Inventory) -> UndockingResponse {
    let removed = waste::complete_undocking(&request.item_ids, inventory);
    UndockingResponse {
        success: true,
        items_removed: removed,
        message: format!("Successfully undocked {} waste items", removed),
    }
}

/// Checks if a cuboid at `position` would fit the container.
pub fn position_is_free(inventory: &Inventory, container_id: &str, position: &Position) -> Result<bool> {
    let model = ContainerModel::from_inventory(inventory, container_id)?;
    let cuboid = Cuboid::new(position.start_coordinates.into(), position.end_coordinates.into());
    Ok(model.would_fit(&cuboid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot() -> Inventory {
        let value = json!({
            "containers": [
                {"containerId": "contA", "zone": "Crew Quarters", "width": 100.0, "depth": 85.0, "height": 200.0, "available_volume": 1.0},
                {"id": "contB", "zone": "Airlock", "width": 50.0, "depth": 85.0, "height": 200.0}
            ],
            "items": [
                {"itemId": "001", "name": "Food Packet", "width": 10.0, "depth": 10.0, "height": 20.0, "priority": 80,
                 "expiryDate": "2025-05-20", "usageLimit": 30, "preferredZone": "Crew Quarters", "mass": 5.0},
                {"itemId": "002", "name": "Oxygen Cylinder", "width": 15.0, "depth": 15.0, "height": 50.0, "priority": 95,
                 "usageLimit": 100, "preferredZone": "Airlock", "mass": 30.0}
            ],
            "placements": [
                {"itemId": "001", "containerId": "contA", "position": {
                    "startCoordinates": {"width": 0.0, "depth": 0.0, "height": 0.0},
                    "endCoordinates": {"width": 10.0, "depth": 10.0, "height": 20.0}}}
            ]
        });
        let snapshot: InventorySnapshot = serde_json::from_value(value).unwrap();
        snapshot.into_inventory().unwrap()
    }

    #[test]
    fn test_snapshot_recomputes_available_volume() {
        let inv = snapshot();
        let out = InventorySnapshot::from_inventory(&inv).unwrap();

        let a = &out.containers[0];
        assert_eq!(a.available_volume, Some(100.0 * 85.0 * 200.0 - 2000.0));
        assert_eq!(out.placements.len(), 1);
        assert_eq!(inv.item("001").unwrap().priority, 80);

        let reparsed = InventorySnapshot::from_json(&out.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, out);
        assert!(matches!(
            InventorySnapshot::from_json("{\"containers\": 3}"),
            Err(Error::SerializationError(_))
        ));
    }

    #[test]
    fn test_snapshot_rejects_mismatched_position() {
        let value = json!({
            "containers": [{"id": "c", "zone": "z", "width": 10.0, "depth": 10.0, "height": 10.0}],
            "items": [{"id": "i", "name": "n", "width": 1.0, "depth": 2.0, "height": 3.0}],
            "placements": [{"itemId": "i", "containerId": "c", "position": {
                "startCoordinates": {"width": 0.0, "depth": 0.0, "height": 0.0},
                "endCoordinates": {"width": 1.0, "depth": 1.0, "height": 1.0}}}]
        });
        let snapshot: InventorySnapshot = serde_json::from_value(value).unwrap();
        assert!(matches!(snapshot.into_inventory(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_snapshot_rejects_duplicates() {
        let container = json!({"id": "C", "zone": "z", "width": 10.0, "depth": 10.0, "height": 10.0});
        let value = json!({"containers": [container.clone(), container]});
        let snapshot: InventorySnapshot = serde_json::from_value(value).unwrap();
        assert!(matches!(snapshot.into_inventory(), Err(Error::InvalidInput(_))));

        let placed_at = |container: &str| {
            json!({"itemId": "X", "containerId": container, "position": {
                "startCoordinates": {"width": 0.0, "depth": 0.0, "height": 0.0},
                "endCoordinates": {"width": 1.0, "depth": 1.0, "height": 1.0}}})
        };
        let value = json!({
            "containers": [
                {"id": "A", "zone": "z", "width": 10.0, "depth": 10.0, "height": 10.0},
                {"id": "B", "zone": "z", "width": 10.0, "depth": 10.0, "height": 10.0}
            ],
            "items": [{"id": "X", "name": "x", "width": 1.0, "depth": 1.0, "height": 1.0}],
            "placements": [placed_at("A"), placed_at("B")]
        });
        let snapshot: InventorySnapshot = serde_json::from_value(value).unwrap();
        assert!(matches!(snapshot.into_inventory(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_commit_rejects_duplicate_containers() {
        let mut inv = Inventory::new();
        let container = json!({"id": "C", "zone": "Lab", "width": 10.0, "depth": 10.0, "height": 10.0});
        let request: PlacementRequest = serde_json::from_value(json!({
            "containers": [container.clone(), container],
            "items": [
                {"id": "X", "name": "x", "width": 10.0, "depth": 10.0, "height": 10.0},
                {"id": "Y", "name": "y", "width": 10.0, "depth": 10.0, "height": 10.0}
            ]
        }))
        .unwrap();

        assert!(matches!(
            commit_placement(&request, &mut inv, &Config::default()),
            Err(Error::InvalidInput(_))
        ));
        assert!(inv.placements.is_empty());
    }

    #[test]
    fn test_plan_placement_wire_shape() {
        let inv = snapshot();
        let request: PlacementRequest = serde_json::from_value(json!({
            "items": [
                {"itemId": "003", "name": "First Aid Kit", "width": 20.0, "depth": 20.0, "height": 10.0, "priority": 100, "preferredZone": "Airlock"},
                {"itemId": "004", "name": "Hull Panel", "width": 300.0, "depth": 300.0, "height": 300.0}
            ]
        }))
        .unwrap();

        let response = plan_placement(&request, &inv, &Config::default()).unwrap();
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["placements"][0]["itemId"], "003");
        assert_eq!(value["placements"][0]["containerId"], "contB");
        assert_eq!(value["placements"][0]["position"]["startCoordinates"]["depth"], 0.0);
        assert_eq!(value["rearrangements"][0]["itemId"], "004");
        // Inventory is untouched by planning
        assert!(inv.item("003").is_err());
    }

    #[test]
    fn test_commit_placement_updates_inventory() {
        let mut inv = snapshot();
        let request = PlacementRequest {
            items: vec![ItemRecord::from(&Item::new("005", "Water", 10.0, 10.0, 10.0))],
            containers: Vec::new(),
        };

        commit_placement(&request, &mut inv, &Config::default()).unwrap();

        assert!(inv.placement_of("005").is_some());
        assert!(inv.item("005").is_ok());
    }

    #[test]
    fn test_search_by_name_and_retrieve() {
        let mut inv = snapshot();

        let found = search(
            &RetrievalRequest {
                item_id: None,
                item_name: Some("food".to_string()),
            },
            &inv,
        )
        .unwrap();
        assert!(found.found);
        assert_eq!(found.retrieval_steps, 1);
        assert_eq!(found.placement.as_ref().map(|p| p.zone.as_str()), Some("Crew Quarters"));

        let missing = search(
            &RetrievalRequest {
                item_id: Some("nope".to_string()),
                item_name: None,
            },
            &inv,
        )
        .unwrap();
        assert!(!missing.found);
        assert!(search(&RetrievalRequest::default(), &inv).is_err());

        let retrieved = retrieve(
            &RetrieveRequest {
                item_id: "001".to_string(),
                user_id: Some("astronaut".to_string()),
            },
            &mut inv,
        )
        .unwrap();
        assert_eq!(retrieved.remaining_uses, Some(29));
    }

    #[test]
    fn test_place_checks_overlap() {
        let mut inv = snapshot();
        let at = |x: f64| Position {
            start_coordinates: Coordinates { width: x, depth: 0.0, height: 0.0 },
            end_coordinates: Coordinates { width: x + 15.0, depth: 15.0, height: 50.0 },
        };

        let blocked = place(
            &PlaceRequest {
                item_id: "002".to_string(),
                user_id: None,
                container_id: "contA".to_string(),
                position: at(5.0),
            },
            &mut inv,
        )
        .unwrap();
        assert!(!blocked.success);
        assert!(!position_is_free(&inv, "contA", &at(5.0)).unwrap());

        let ok = place(
            &PlaceRequest {
                item_id: "002".to_string(),
                user_id: None,
                container_id: "contA".to_string(),
                position: at(10.0),
            },
            &mut inv,
        )
        .unwrap();
        assert!(ok.success);
        assert_eq!(inv.placement_of("002").map(|p| p.container_id.as_str()), Some("contA"));
    }

    #[test]
    fn test_simulate_and_waste() {
        let mut inv = snapshot();
        let request: SimulationRequest = serde_json::from_value(json!({
            "numOfDays": 3,
            "itemsToBeUsedPerDay": [{"itemId": "001"}, {"itemId": "002", "uses": 40}],
            "startDate": "2025-05-18"
        }))
        .unwrap();

        let response = simulate(&request, &mut inv, date(2000, 1, 1)).unwrap();

        assert_eq!(response.end_date, date(2025, 5, 21));
        assert_eq!(response.changes.items_expired, vec![ItemsExpiredRecord { day: 2, count: 1 }]);
        assert_eq!(response.changes.items_depleted_today.len(), 1);
        assert_eq!(response.changes.items_depleted_today[0].item_id, "002");
        assert_eq!(inv.item("001").unwrap().usage_limit, Some(29));

        let now = Utc::now();
        let waste = identify_waste(&inv, date(2025, 5, 21), now);
        let reasons: Vec<(&str, &str)> = waste
            .waste_items
            .iter()
            .map(|w| (w.item_id.as_str(), w.reason.as_str()))
            .collect();
        assert_eq!(reasons, vec![("001", "expired"), ("002", "depleted")]);
    }

    #[test]
    fn test_return_plan_and_undocking() {
        let mut inv = snapshot();
        inv.item_mut("001").unwrap().usage_limit = Some(0);
        let now = Utc::now();

        let response = return_plan(
            &ReturnPlanRequest {
                undocking_container_id: "contB".to_string(),
                undocking_date: date(2025, 6, 1),
                max_weight: 100.0,
            },
            &inv,
            date(2025, 1, 1),
            now,
        )
        .unwrap();

        assert_eq!(response.return_plan.items_to_return, 1);
        assert_eq!(response.retrieval_steps.len(), 1);
        assert_eq!(response.return_manifest.return_items[0].container_id.as_deref(), Some("contA"));

        let undocked = complete_undocking(
            &UndockingRequest {
                item_ids: vec!["001".to_string()],
            },
            &mut inv,
        );
        assert_eq!(undocked.items_removed, 1);
        assert!(inv.placement_of("001").is_none());
    }

    #[test]
    fn test_rearrangement_picks_pending_item() {
        let mut inv = Inventory::new()
            .with_container(Container::new("A", "Lab", 10.0, 10.0, 10.0))
            .with_container(Container::new("B", "Storage", 10.0, 10.0, 10.0));
        let filler = Item::new("low", "Spare Bolts", 10.0, 10.0, 10.0).with_priority(5);
        inv = inv
            .with_placement(Placement::new("low", "A", Orientation::IDENTITY, Vector3::zeros(), &filler.dimensions))
            .with_item(filler)
            .with_item(Item::new("urgent", "Oxygen", 10.0, 10.0, 10.0).with_priority(90));

        let request = RearrangementRequest {
            container_id: "A".to_string(),
            ..Default::default()
        };
        let planned = plan_rearrangement(&request, &inv, &Config::default()).unwrap();
        assert!(planned.success);
        assert_eq!(planned.plan.pending_item_id.as_deref(), Some("urgent"));
        assert_eq!(planned.plan.steps[0].action, "move");
        assert_eq!(planned.plan.steps[0].to.as_deref(), Some("B"));

        let executed = execute_rearrangement(&request, &mut inv, &Config::default()).unwrap();
        assert_eq!(executed.items_moved, 1);
        assert_eq!(inv.placement_of("low").map(|p| p.container_id.as_str()), Some("B"));
    }

    #[test]
    fn test_build_config_overrides() {
        let config = build_config(Some(ConfigRequest {
            strategy: Some("FirstFit".to_string()),
            minutes_per_move: Some(3.0),
            ..Default::default()
        }));
        assert_eq!(config.strategy, Strategy::FirstFit);
        assert_eq!(config.minutes_per_move, 3.0);
        assert_eq!(config.minutes_per_rotation, 2.0);
        assert_eq!(build_config(None).strategy, Strategy::CornerPoint);
    }

    #[test]
    fn test_error_response() {
        let e = Error::ItemNotFound("x".to_string());
        let response = ErrorResponse::from(&e);
        assert!(!response.success);
        assert_eq!(response.kind, e.kind());
    }
}
