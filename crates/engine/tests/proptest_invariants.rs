//! Property-based tests for placement, rearrangement and simulation invariants.
//!
//! Run with: cargo test -p stowage-engine -- proptest

use chrono::NaiveDate;
use nalgebra::Vector3;
use proptest::prelude::*;
use stowage_core::{Container, Inventory, Item, Orientation, Placement};
use stowage_engine::{ContainerModel, PlacementPlanner, RearrangementPlanner, Simulator, UsageRequest};

// =============================================================================
// Strategies
// =============================================================================

fn arb_dims(max: f64) -> impl Strategy<Value = (f64, f64, f64)> {
    (1.0..max, 1.0..max, 1.0..max)
}

fn arb_items(max_side: f64, max_count: usize) -> impl Strategy<Value = Vec<Item>> {
    prop::collection::vec((arb_dims(max_side), 0u8..=100), 1..max_count).prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, ((w, d, h), priority))| {
                Item::new(format!("I{}", i), "Box", w, d, h).with_priority(priority)
            })
            .collect()
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_placements_in_bounds_and_disjoint(
        items in arb_items(45.0, 30),
        (cw, cd, ch) in arb_dims(100.0),
    ) {
        let models = vec![
            ContainerModel::new(Container::new("C1", "Lab", cw.max(20.0), cd.max(20.0), ch.max(20.0))).unwrap(),
            ContainerModel::new(Container::new("C2", "Storage", 60.0, 60.0, 60.0)).unwrap(),
        ];

        let result = PlacementPlanner::default_config().plan(&items, &models).unwrap();
        prop_assert_eq!(result.placed_count() + result.unplaced_count(), items.len());

        for model in &models {
            let mine: Vec<&Placement> = result
                .placements
                .iter()
                .filter(|p| p.container_id == model.id())
                .collect();
            for (i, a) in mine.iter().enumerate() {
                prop_assert!(a.cuboid().within(model.dimensions()));
                for b in mine.iter().skip(i + 1) {
                    prop_assert!(!a.cuboid().intersects(&b.cuboid()));
                }
            }
        }
    }

    #[test]
    fn proptest_rearrangement_respects_priority(
        priorities in prop::collection::vec(0u8..=100, 1..8),
        pending_priority in 0u8..=100,
    ) {
        let mut inv = Inventory::new()
            .with_container(Container::new("A", "Lab", 40.0, 10.0, 10.0))
            .with_container(Container::new("B", "Storage", 40.0, 40.0, 40.0));
        for (i, priority) in priorities.iter().enumerate() {
            let item = Item::new(format!("S{}", i), "Slot", 5.0, 10.0, 10.0).with_priority(*priority);
            inv.placements.push(Placement::new(
                item.id.clone(),
                "A",
                Orientation::IDENTITY,
                Vector3::new(i as f64 * 5.0, 0.0, 0.0),
                &item.dimensions,
            ));
            inv.items.push(item);
        }
        let pending = Item::new("P", "Pending", 40.0, 10.0, 10.0).with_priority(pending_priority);

        let plan = RearrangementPlanner::default().plan("A", &pending, &inv).unwrap();

        for step in &plan.steps {
            prop_assert!(inv.item(step.item_id()).unwrap().priority < pending_priority);
        }
    }

    #[test]
    fn proptest_usage_never_increases_or_goes_negative(
        limit in 0u32..10,
        uses in 1u32..4,
        days in 1u32..10,
    ) {
        let mut items = vec![Item::new("x", "Consumable", 1.0, 1.0, 1.0).with_usage_limit(limit)];
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let report = Simulator::new(start).run(days, &[UsageRequest::new("x").with_uses(uses)], &mut items);

        let mut previous = limit;
        for used in &report.items_used {
            prop_assert!(used.remaining_uses <= previous);
            previous = used.remaining_uses;
        }
        if let Some(depleted) = report.items_depleted_today.first() {
            prop_assert!(report.items_used.iter().all(|u| u.day <= depleted.day));
        }
        prop_assert!(report.items_depleted_today.len() <= 1);
    }
}
