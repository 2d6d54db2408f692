//! Save/restore integration tests

use glam::Vec3;
use police_pursuit::core::types::{Role, VehicleId};
use police_pursuit::core::PursuitVariables;
use police_pursuit::host::TrafficControl;
use police_pursuit::pursuit::{PersistedState, PursuitSubsystem};
use police_pursuit::sandbox::{SandboxVehicle, SandboxWorld};

fn world() -> SandboxWorld {
    let mut world = SandboxWorld::new();
    world.add_vehicle(SandboxVehicle::new(VehicleId(1), Vec3::ZERO));
    world.add_vehicle(SandboxVehicle::new(VehicleId(10), Vec3::new(40.0, 0.0, 0.0)).police());
    world.add_vehicle(SandboxVehicle::new(VehicleId(11), Vec3::new(80.0, 0.0, 0.0)).police());
    world.add_prop(SandboxVehicle::new(VehicleId(50), Vec3::new(0.0, -200.0, 0.0)));
    world.add_prop(SandboxVehicle::new(VehicleId(51), Vec3::new(5.0, -200.0, 0.0)));
    world
}

#[test]
fn test_json_round_trip_restores_configuration() {
    let world = world();
    let mut original = PursuitSubsystem::with_seed(1);
    original
        .merge_variables_json(&serde_json::json!({
            "strictness": 0.9,
            "score_levels": [50.0, 300.0, 900.0],
            "auto_release": false,
        }))
        .unwrap();
    original.add_prop(&world, VehicleId(51)).unwrap();
    original.add_prop(&world, VehicleId(50)).unwrap();

    let json = original.save_json().unwrap();
    let mut restored = PursuitSubsystem::with_seed(2);
    restored.restore_json(&json).unwrap();

    assert_eq!(restored.variables(), original.variables());
    assert_eq!(restored.props().ids(), &[VehicleId(51), VehicleId(50)]);
    assert_eq!(restored.save(), original.save());
}

#[test]
fn test_restore_does_not_carry_roster() {
    let mut world = world();
    let mut original = PursuitSubsystem::with_seed(1);
    for id in world.tracked_vehicles() {
        original.on_vehicle_added(&world, id);
    }
    assert_eq!(original.police_ids(), vec![VehicleId(10), VehicleId(11)]);

    let json = original.save_json().unwrap();
    let mut restored = PursuitSubsystem::with_seed(1);
    restored.restore_json(&json).unwrap();
    assert!(restored.police_ids().is_empty());

    // Roles changed while the game was saved
    world.set_role(VehicleId(11), Role::Standard);
    world.set_role(VehicleId(1), Role::Police);
    restored.rebuild_roster(&world);
    assert_eq!(restored.police_ids(), vec![VehicleId(1), VehicleId(10)]);
}

#[test]
fn test_restored_props_can_be_activated() {
    let mut world = world();
    let mut original = PursuitSubsystem::with_seed(1);
    original.add_prop(&world, VehicleId(50)).unwrap();

    let mut restored = PursuitSubsystem::with_seed(1);
    restored.restore(original.save()).unwrap();
    restored.activate_props(&mut world, true);
    assert!(world.get(VehicleId(50)).unwrap().active);
    assert!(!world.get(VehicleId(51)).unwrap().active);
}

#[test]
fn test_corrupt_save_leaves_state_alone() {
    let mut subsystem = PursuitSubsystem::with_seed(1);
    subsystem
        .merge_variables_json(&serde_json::json!({ "arrest_limit": 3.0 }))
        .unwrap();

    assert!(subsystem.restore_json("{ not json").is_err());
    let descending = PersistedState {
        variables: PursuitVariables {
            score_levels: [500.0, 100.0, 2000.0],
            ..Default::default()
        },
        prop_ids: vec![VehicleId(50)],
    };
    assert!(subsystem.restore(descending).is_err());

    assert_eq!(subsystem.variables().arrest_limit, 3.0);
    assert!(subsystem.props().is_empty());
}

#[test]
fn test_session_end_resets_everything_saved() {
    let mut world = world();
    let mut subsystem = PursuitSubsystem::with_seed(1);
    subsystem
        .merge_variables_json(&serde_json::json!({ "evade_limit": 10.0 }))
        .unwrap();
    subsystem.add_prop(&world, VehicleId(50)).unwrap();
    subsystem.activate_props(&mut world, true);

    subsystem.on_session_end(&mut world);
    let saved = subsystem.save();
    assert_eq!(saved.variables, PursuitVariables::default());
    assert!(saved.prop_ids.is_empty());
    assert!(!world.get(VehicleId(50)).unwrap().active);
}
