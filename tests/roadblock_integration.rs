//! Roadblock integration tests
//!
//! Level 3 pursuits driven through the tick loop with a sandbox road.

use glam::Vec3;
use police_pursuit::core::types::{RoleAction, RoleState, VehicleId};
use police_pursuit::host::{PlacementKind, SpawnPoint, TrafficControl};
use police_pursuit::pursuit::{PursuitActionKind, PursuitSubsystem};
use police_pursuit::roadblock::FootprintAxis;
use police_pursuit::sandbox::{SandboxVehicle, SandboxWorld};

const SUSPECT: VehicleId = VehicleId(1);
const DT: f32 = 0.1;

fn spawn() -> SpawnPoint {
    SpawnPoint {
        pos: Vec3::new(0.0, 300.0, 0.0),
        dir: Vec3::Y,
        normal: Vec3::Z,
        radius: 5.0,
    }
}

/// Suspect heading north at level 3, police parked far out of sight
fn level_three(police: &[VehicleId]) -> (PursuitSubsystem, SandboxWorld) {
    let mut world = SandboxWorld::new();
    world.set_sight_range(200.0);
    world.set_spawn_point(Some(spawn()));
    world.settings_mut().random_events = false;
    world.add_vehicle(SandboxVehicle::new(SUSPECT, Vec3::ZERO).moving(Vec3::new(0.0, 20.0, 0.0)));
    for (i, &id) in police.iter().enumerate() {
        world.add_vehicle(SandboxVehicle::new(id, Vec3::new(900.0 + 10.0 * i as f32, 0.0, 0.0)).police());
    }

    let mut subsystem = PursuitSubsystem::with_seed(77);
    for id in world.tracked_vehicles() {
        subsystem.on_vehicle_added(&world, id);
    }
    subsystem.set_pursuit_mode(&mut world, 3, SUSPECT, None).unwrap();
    (subsystem, world)
}

fn arm_roadblock(subsystem: &mut PursuitSubsystem, seconds: f32) {
    subsystem.pursuit_mut(SUSPECT).unwrap().timers.roadblock = seconds;
}

#[test]
fn test_roadblock_fires_when_timer_expires() {
    let units = [VehicleId(10), VehicleId(11)];
    let (mut subsystem, mut world) = level_three(&units);
    assert_eq!(subsystem.pursuit(SUSPECT).unwrap().timers.roadblock, 30.0);

    arm_roadblock(&mut subsystem, 0.05);
    subsystem.update(&mut world, DT);

    let pursuit = subsystem.pursuit(SUSPECT).unwrap();
    assert_eq!(pursuit.roadblock_pos, Some(spawn().pos));
    assert_eq!(pursuit.timers.roadblock, 30.0);

    let placed = world.placements_of(PlacementKind::RoadblockVehicles);
    assert_eq!(placed.len(), 2);
    for placement in &placed {
        assert!(placement.position.distance(spawn().pos) <= spawn().radius);
        assert_eq!(
            world.traffic_info(placement.id).unwrap().state,
            RoleState::Roadblock
        );
        assert!(world.actions_for(placement.id).contains(&RoleAction::Roadblock {
            position: spawn().pos
        }));
    }
    assert_eq!(
        world
            .events()
            .iter()
            .filter(|event| event.action() == Some(PursuitActionKind::Roadblock))
            .count(),
        1
    );
}

#[test]
fn test_single_candidate_exception() {
    let (mut subsystem, mut world) = level_three(&[VehicleId(10)]);
    arm_roadblock(&mut subsystem, 0.05);
    subsystem.update(&mut world, DT);

    // max(10, 60 - 0.5 * 60) + 20
    assert_eq!(subsystem.pursuit(SUSPECT).unwrap().timers.roadblock, 50.0);
    assert_eq!(world.placements_of(PlacementKind::RoadblockVehicles).len(), 1);
}

#[test]
fn test_no_spawn_point_retries_every_second() {
    let (mut subsystem, mut world) = level_three(&[VehicleId(10), VehicleId(11)]);
    world.set_spawn_point(None);
    arm_roadblock(&mut subsystem, 0.05);

    subsystem.update(&mut world, DT);
    let timer = subsystem.pursuit(SUSPECT).unwrap().timers.roadblock;
    assert_eq!(timer, 1.0);

    world.set_spawn_point(Some(spawn()));
    for _ in 0..15 {
        subsystem.update(&mut world, DT);
    }
    assert!(subsystem.pursuit(SUSPECT).unwrap().roadblock_pos.is_some());
}

#[test]
fn test_roadblock_frequency_shortens_interval() {
    let (mut subsystem, mut world) = level_three(&[VehicleId(10), VehicleId(11)]);
    subsystem
        .merge_variables_json(&serde_json::json!({ "roadblock_frequency": 1.0 }))
        .unwrap();
    arm_roadblock(&mut subsystem, 0.05);
    subsystem.update(&mut world, DT);
    assert_eq!(subsystem.pursuit(SUSPECT).unwrap().timers.roadblock, 10.0);
}

#[test]
fn test_passing_roadblock_counts_once() {
    let (mut subsystem, mut world) = level_three(&[VehicleId(10), VehicleId(11)]);
    arm_roadblock(&mut subsystem, 0.05);
    subsystem.update(&mut world, DT);

    world.set_position(SUSPECT, Vec3::new(0.0, 285.0, 0.0));
    subsystem.update(&mut world, DT);
    world.set_position(SUSPECT, Vec3::new(0.0, 300.0, 0.0));
    subsystem.update(&mut world, DT);

    let pursuit = subsystem.pursuit(SUSPECT).unwrap();
    assert!(pursuit.roadblock_near);
    assert_eq!(pursuit.roadblocks, 1);
}

#[test]
fn test_props_join_active_roadblock() {
    let (mut subsystem, mut world) = level_three(&[VehicleId(10), VehicleId(11)]);
    for id in [VehicleId(50), VehicleId(51)] {
        world.add_prop(
            SandboxVehicle::new(id, Vec3::new(-500.0, 0.0, 0.0)).with_extents(Vec3::new(0.6, 2.0, 1.0)),
        );
        subsystem.add_prop(&world, id).unwrap();
    }
    subsystem.activate_props(&mut world, true);

    arm_roadblock(&mut subsystem, 0.05);
    subsystem.update(&mut world, DT);

    let props = world.placements_of(PlacementKind::RoadblockProps);
    assert_eq!(props.len(), 2);
    for prop in &props {
        // Half the longest prop behind the vehicle line
        assert!((prop.position.y - 301.0).abs() < 1e-3);
    }
}

#[test]
fn test_geometry_queries_use_host_footprints() {
    let (subsystem, mut world) = level_three(&[]);
    world.add_vehicle(SandboxVehicle::new(VehicleId(20), Vec3::ZERO).with_extents(Vec3::new(2.0, 6.0, 2.0)));
    world.add_vehicle(SandboxVehicle::new(VehicleId(21), Vec3::ZERO).with_extents(Vec3::new(2.0, 4.0, 2.0)));

    let (fits, used) = subsystem.fitting_vehicles(
        &world,
        &[VehicleId(20), VehicleId(21)],
        8.0,
        FootprintAxis::Auto,
    );
    assert_eq!(fits, vec![VehicleId(21)]);
    assert_eq!(used, 4.0);

    let (fits, _) = subsystem.fitting_vehicles(
        &world,
        &[VehicleId(20), VehicleId(21)],
        8.0,
        FootprintAxis::Width,
    );
    assert_eq!(fits.len(), 2);
}
