//! Integration tests for stowage-core.

use chrono::NaiveDate;
use nalgebra::Vector3;
use stowage_core::geometry::{Cuboid, Orientation};
use stowage_core::model::{Container, Inventory, Item};
use stowage_core::placement::Placement;
use stowage_core::result::{PlacementResult, Unplaced, UnplacedReason};
use stowage_core::{fits, intersects, orientations, Error};

mod geometry_tests {
    use super::*;

    #[test]
    fn test_every_orientation_preserves_volume() {
        let dims = Vector3::new(3.0, 5.0, 7.0);
        for o in orientations(&dims).unwrap() {
            let oriented = o.apply(&dims);
            assert!((oriented.x * oriented.y * oriented.z - 105.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_orientations_are_distinct() {
        let dims = Vector3::new(4.0, 4.0, 9.0);
        let all = orientations(&dims).unwrap();
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(a.apply(&dims), b.apply(&dims));
            }
        }
    }

    #[test]
    fn test_overlap_on_two_axes_only_is_not_intersection() {
        let a = Cuboid::at(Vector3::zeros(), Vector3::new(10.0, 10.0, 10.0));
        let b = Cuboid::at(Vector3::new(5.0, 5.0, 10.0), Vector3::new(10.0, 10.0, 10.0));
        assert!(!intersects(&a, &b));
    }

    #[test]
    fn test_fits_respects_each_axis() {
        let bounds = Vector3::new(10.0, 20.0, 30.0);
        assert!(fits(&Cuboid::at(Vector3::zeros(), bounds), &bounds));
        assert!(!fits(
            &Cuboid::at(Vector3::new(0.0, 0.5, 0.0), bounds),
            &bounds
        ));
        assert!(!fits(
            &Cuboid::at(Vector3::new(-1.0, 0.0, 0.0), Vector3::new(1.0, 1.0, 1.0)),
            &bounds
        ));
    }
}

mod placement_tests {
    use super::*;

    #[test]
    fn test_placement_matches_oriented_size() {
        let dims = Vector3::new(2.0, 4.0, 6.0);
        for o in Orientation::ALL {
            let p = Placement::new("I", "C", o, Vector3::new(1.0, 1.0, 1.0), &dims);
            assert_eq!(Orientation::matching(&dims, &p.size()).map(|m| m.apply(&dims)), Some(p.size()));
        }
    }

    #[test]
    fn test_result_residuals() {
        let mut result = PlacementResult::new();
        result.unplaced.push(Unplaced::new("big", UnplacedReason::Overcapacity));

        assert!(!result.all_placed());
        assert_eq!(result.unplaced_count(), 1);
        assert_eq!(result.placed_count(), 0);
    }
}

mod inventory_tests {
    use super::*;

    fn sample() -> Inventory {
        let dims = Vector3::new(1.0, 1.0, 1.0);
        Inventory::new()
            .with_container(Container::new("C1", "Lab", 10.0, 10.0, 10.0))
            .with_container(Container::new("C2", "Airlock", 5.0, 5.0, 5.0))
            .with_item(Item::new("I1", "Wrench", 1.0, 1.0, 1.0))
            .with_item(Item::new("I2", "Tape", 1.0, 1.0, 1.0))
            .with_placement(Placement::new("I1", "C1", Orientation::IDENTITY, Vector3::zeros(), &dims))
    }

    #[test]
    fn test_placements_in_container() {
        let inv = sample();
        assert_eq!(inv.placements_in("C1").count(), 1);
        assert_eq!(inv.placements_in("C2").count(), 0);
        assert_eq!(inv.unplaced_items().map(|i| i.id.as_str()).collect::<Vec<_>>(), vec!["I2"]);
    }

    #[test]
    fn test_remove_item_drops_placement() {
        let mut inv = sample();
        let removed = inv.remove_item("I1").unwrap();

        assert_eq!(removed.name, "Wrench");
        assert!(inv.placement_of("I1").is_none());
        assert!(matches!(inv.item("I1"), Err(Error::ItemNotFound(_))));
    }

    #[test]
    fn test_set_placement_replaces_previous() {
        let mut inv = sample();
        let dims = Vector3::new(1.0, 1.0, 1.0);
        inv.set_placement(Placement::new("I1", "C2", Orientation::IDENTITY, Vector3::zeros(), &dims));

        assert_eq!(inv.placements.len(), 1);
        assert_eq!(inv.placement_of("I1").unwrap().container_id, "C2");
    }

    #[test]
    fn test_waste_eligibility() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let depleted = Item::new("I3", "Filter", 1.0, 1.0, 1.0).with_usage_limit(0);
        let fresh = Item::new("I4", "Snack", 1.0, 1.0, 1.0)
            .with_expiry(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());

        assert!(depleted.is_waste_eligible(today));
        assert!(!fresh.is_waste_eligible(today));
    }
}
