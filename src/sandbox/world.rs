//! In-memory host world
//!
//! Keeps vehicles in plain maps, applies role actions with simple semantics
//! (arrest freezes, roadblock parks, pursuit steers toward the target) and
//! records everything the pursuit subsystem tells it.

use std::collections::BTreeMap;

use glam::Vec3;

use crate::core::types::{Role, RoleAction, RoleState, VehicleId};
use crate::host::{
    EventSink, Message, MessageSink, PlacementKind, PlacementOptions, RoadNetwork, SpawnPoint,
    SpawnQuery, SpawnService, TrafficControl, TrafficInfo, TrafficSettings, VehicleInfo,
    VehicleQuery,
};
use crate::pursuit::events::PursuitEvent;
use crate::roadblock::geometry::Placement;

/// Default bounding box of a sandbox car (width, length, height)
pub const DEFAULT_EXTENTS: Vec3 = Vec3::new(2.0, 4.5, 1.5);
pub const DEFAULT_CRUISE_SPEED: f32 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SandboxVehicle {
    pub id: VehicleId,
    pub position: Vec3,
    pub direction: Vec3,
    pub velocity: Vec3,
    pub extents: Vec3,
    pub ref_offset: Vec3,
    pub active: bool,
    pub on_screen: bool,
    pub player_controlled: bool,
    pub frozen: bool,
    pub role: Role,
    pub default_role: Role,
    pub state: RoleState,
    pub busy: bool,
    pub respawning: bool,
    /// Vehicle this one is chasing
    pub target: Option<VehicleId>,
    /// Speed used when chasing
    pub cruise_speed: f32,
}

impl SandboxVehicle {
    pub fn new(id: VehicleId, position: Vec3) -> Self {
        Self {
            id,
            position,
            direction: Vec3::Y,
            velocity: Vec3::ZERO,
            extents: DEFAULT_EXTENTS,
            ref_offset: Vec3::ZERO,
            active: true,
            on_screen: false,
            player_controlled: false,
            frozen: false,
            role: Role::Standard,
            default_role: Role::Standard,
            state: RoleState::Idle,
            busy: false,
            respawning: false,
            target: None,
            cruise_speed: DEFAULT_CRUISE_SPEED,
        }
    }

    pub fn police(mut self) -> Self {
        self.role = Role::Police;
        self.default_role = Role::Police;
        self
    }

    pub fn player(mut self) -> Self {
        self.player_controlled = true;
        self
    }

    pub fn moving(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        if let Some(direction) = velocity.try_normalize() {
            self.direction = direction;
        }
        self
    }

    pub fn with_extents(mut self, extents: Vec3) -> Self {
        self.extents = extents;
        self
    }

    pub fn with_cruise_speed(mut self, speed: f32) -> Self {
        self.cruise_speed = speed;
        self
    }

    fn info(&self) -> VehicleInfo {
        VehicleInfo {
            id: self.id,
            position: self.position,
            direction: self.direction,
            velocity: self.velocity,
            extents: self.extents,
            ref_offset: self.ref_offset,
            active: self.active,
            on_screen: self.on_screen,
            player_controlled: self.player_controlled,
            frozen: self.frozen,
        }
    }
}

/// Where `find_spawn_point` answers from
#[derive(Debug, Clone, Copy, PartialEq)]
enum SpawnSource {
    Fixed(SpawnPoint),
    /// Straight road of the given half width, midway through the search window
    Ahead(f32),
    Nowhere,
}

pub struct SandboxWorld {
    vehicles: BTreeMap<VehicleId, SandboxVehicle>,
    props: BTreeMap<VehicleId, SandboxVehicle>,
    running: bool,
    settings: TrafficSettings,
    player: Option<VehicleId>,
    line_of_sight: bool,
    sight_range: f32,
    spawn: SpawnSource,
    drives_on_right: bool,
    actions: Vec<(VehicleId, RoleAction)>,
    events: Vec<PursuitEvent>,
    messages: Vec<Message>,
    placements: Vec<(PlacementKind, Vec<Placement>)>,
    respawn_resets: Vec<VehicleId>,
}

impl Default for SandboxWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self {
            vehicles: BTreeMap::new(),
            props: BTreeMap::new(),
            running: true,
            settings: TrafficSettings::default(),
            player: None,
            line_of_sight: true,
            sight_range: f32::INFINITY,
            spawn: SpawnSource::Nowhere,
            drives_on_right: true,
            actions: Vec::new(),
            events: Vec::new(),
            messages: Vec::new(),
            placements: Vec::new(),
            respawn_resets: Vec::new(),
        }
    }

    // === POPULATION ===

    /// Add a traffic vehicle
    pub fn add_vehicle(&mut self, vehicle: SandboxVehicle) {
        if vehicle.player_controlled {
            self.player = Some(vehicle.id);
        }
        self.vehicles.insert(vehicle.id, vehicle);
    }

    /// Add an object that exists in the world but is not part of traffic
    pub fn add_prop(&mut self, mut prop: SandboxVehicle) {
        prop.active = false;
        self.props.insert(prop.id, prop);
    }

    pub fn remove_vehicle(&mut self, id: VehicleId) -> Option<SandboxVehicle> {
        if self.player == Some(id) {
            self.player = None;
        }
        self.vehicles.remove(&id).or_else(|| self.props.remove(&id))
    }

    pub fn get(&self, id: VehicleId) -> Option<&SandboxVehicle> {
        self.vehicles.get(&id).or_else(|| self.props.get(&id))
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut SandboxVehicle> {
        match self.vehicles.get_mut(&id) {
            Some(vehicle) => Some(vehicle),
            None => self.props.get_mut(&id),
        }
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn set_player(&mut self, id: Option<VehicleId>) {
        for vehicle in self.vehicles.values_mut() {
            vehicle.player_controlled = Some(vehicle.id) == id;
        }
        self.player = id;
    }

    // === KNOBS ===

    pub fn set_position(&mut self, id: VehicleId, position: Vec3) {
        if let Some(vehicle) = self.get_mut(id) {
            vehicle.position = position;
        }
    }

    pub fn set_velocity(&mut self, id: VehicleId, velocity: Vec3) {
        if let Some(vehicle) = self.get_mut(id) {
            vehicle.velocity = velocity;
            if let Some(direction) = velocity.try_normalize() {
                vehicle.direction = direction;
            }
        }
    }

    pub fn set_state(&mut self, id: VehicleId, state: RoleState) {
        if let Some(vehicle) = self.vehicles.get_mut(&id) {
            vehicle.state = state;
        }
    }

    pub fn set_on_screen(&mut self, id: VehicleId, on_screen: bool) {
        if let Some(vehicle) = self.get_mut(id) {
            vehicle.on_screen = on_screen;
        }
    }

    pub fn set_frozen(&mut self, id: VehicleId, frozen: bool) {
        if let Some(vehicle) = self.get_mut(id) {
            vehicle.frozen = frozen;
        }
    }

    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    pub fn settings_mut(&mut self) -> &mut TrafficSettings {
        &mut self.settings
    }

    /// Toggle every sight line at once
    pub fn set_line_of_sight(&mut self, clear: bool) {
        self.line_of_sight = clear;
    }

    /// Sight lines longer than `range` are blocked
    pub fn set_sight_range(&mut self, range: f32) {
        self.sight_range = range;
    }

    pub fn set_spawn_point(&mut self, spawn: Option<SpawnPoint>) {
        self.spawn = spawn.map_or(SpawnSource::Nowhere, SpawnSource::Fixed);
    }

    /// Answer spawn queries with a straight road of `half_width` ahead of the origin
    pub fn set_road_ahead(&mut self, half_width: f32) {
        self.spawn = SpawnSource::Ahead(half_width);
    }

    pub fn set_drives_on_right(&mut self, drives_on_right: bool) {
        self.drives_on_right = drives_on_right;
    }

    // === RECORDS ===

    pub fn events(&self) -> &[PursuitEvent] {
        &self.events
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn actions(&self) -> &[(VehicleId, RoleAction)] {
        &self.actions
    }

    pub fn actions_for(&self, id: VehicleId) -> Vec<RoleAction> {
        self.actions
            .iter()
            .filter(|(vehicle, _)| *vehicle == id)
            .map(|(_, action)| *action)
            .collect()
    }

    /// Every placement of a kind, in the order they were issued
    pub fn placements_of(&self, kind: PlacementKind) -> Vec<Placement> {
        self.placements
            .iter()
            .filter(|(k, _)| *k == kind)
            .flat_map(|(_, group)| group.iter().copied())
            .collect()
    }

    pub fn respawn_resets(&self) -> &[VehicleId] {
        &self.respawn_resets
    }

    pub fn clear_records(&mut self) {
        self.actions.clear();
        self.events.clear();
        self.messages.clear();
        self.placements.clear();
        self.respawn_resets.clear();
    }

    // === MOTION ===

    /// Move every free vehicle by `dt`; chasing units steer toward their target
    pub fn advance(&mut self, dt: f32) {
        let positions: BTreeMap<VehicleId, Vec3> = self
            .vehicles
            .values()
            .map(|vehicle| (vehicle.id, vehicle.position))
            .collect();

        for vehicle in self.vehicles.values_mut() {
            if !vehicle.active || vehicle.frozen || vehicle.state == RoleState::Roadblock {
                continue;
            }
            if vehicle.state == RoleState::Pursuing {
                let goal = vehicle.target.and_then(|target| positions.get(&target));
                if let Some(&goal) = goal {
                    // Ease off on approach instead of overshooting
                    let offset = goal - vehicle.position;
                    let speed = vehicle.cruise_speed.min(offset.length());
                    vehicle.velocity = offset.normalize_or_zero() * speed;
                }
            }
            vehicle.position += vehicle.velocity * dt;
            if let Some(direction) = vehicle.velocity.try_normalize() {
                vehicle.direction = direction;
            }
        }
    }
}

impl VehicleQuery for SandboxWorld {
    fn vehicle(&self, id: VehicleId) -> Option<VehicleInfo> {
        self.get(id).map(SandboxVehicle::info)
    }

    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        self.line_of_sight && from.distance(to) <= self.sight_range
    }
}

impl TrafficControl for SandboxWorld {
    fn is_running(&self) -> bool {
        self.running
    }

    fn settings(&self) -> TrafficSettings {
        self.settings
    }

    fn tracked_vehicles(&self) -> Vec<VehicleId> {
        self.vehicles.keys().copied().collect()
    }

    fn traffic_info(&self, id: VehicleId) -> Option<TrafficInfo> {
        self.vehicles.get(&id).map(|vehicle| TrafficInfo {
            role: vehicle.role,
            default_role: vehicle.default_role,
            state: vehicle.state,
            busy: vehicle.busy,
            respawning: vehicle.respawning,
        })
    }

    fn player_vehicle(&self) -> Option<VehicleId> {
        self.player
    }

    fn set_role(&mut self, id: VehicleId, role: Role) {
        if let Some(vehicle) = self.vehicles.get_mut(&id) {
            vehicle.role = role;
        }
    }

    fn set_action(&mut self, id: VehicleId, action: RoleAction) {
        self.actions.push((id, action));
        let Some(vehicle) = self.vehicles.get_mut(&id) else {
            return;
        };
        match action {
            RoleAction::Flee => vehicle.state = RoleState::Flee,
            RoleAction::Watch => vehicle.state = RoleState::Watch,
            RoleAction::Arrest => {
                vehicle.state = RoleState::Arrested;
                vehicle.frozen = true;
                vehicle.velocity = Vec3::ZERO;
            }
            RoleAction::PursuitStart { target, .. } => {
                vehicle.state = RoleState::Pursuing;
                vehicle.target = Some(target);
            }
            RoleAction::PursuitEnd => {
                vehicle.state = RoleState::Idle;
                vehicle.target = None;
            }
            RoleAction::Roadblock { .. } => {
                vehicle.state = RoleState::Roadblock;
                vehicle.velocity = Vec3::ZERO;
            }
        }
    }

    fn reset_action(&mut self, id: VehicleId) {
        if let Some(vehicle) = self.vehicles.get_mut(&id) {
            vehicle.state = RoleState::Idle;
            vehicle.frozen = false;
            vehicle.target = None;
        }
    }

    fn set_target(&mut self, id: VehicleId, target: VehicleId) {
        if let Some(vehicle) = self.vehicles.get_mut(&id) {
            vehicle.target = Some(target);
        }
    }

    fn reset_respawn(&mut self, id: VehicleId) {
        self.respawn_resets.push(id);
    }

    fn set_vehicle_active(&mut self, id: VehicleId, active: bool) {
        if let Some(vehicle) = self.get_mut(id) {
            vehicle.active = active;
        }
    }
}

impl SpawnService for SandboxWorld {
    fn find_spawn_point(&self, query: &SpawnQuery) -> Option<SpawnPoint> {
        match self.spawn {
            SpawnSource::Fixed(point) => Some(point),
            SpawnSource::Ahead(half_width) => {
                let dir = query.forward.try_normalize()?;
                let distance = (query.min_radius + query.max_radius) / 2.0;
                Some(SpawnPoint {
                    pos: query.origin + dir * distance,
                    dir,
                    normal: Vec3::Z,
                    radius: half_width,
                })
            }
            SpawnSource::Nowhere => None,
        }
    }

    fn place_group(&mut self, placements: &[Placement], options: &PlacementOptions) {
        for placement in placements {
            if let Some(vehicle) = self.get_mut(placement.id) {
                vehicle.position = placement.position;
                vehicle.direction = placement.rotation * Vec3::Y;
                vehicle.velocity = Vec3::ZERO;
            }
        }
        self.placements.push((options.kind, placements.to_vec()));
    }
}

impl RoadNetwork for SandboxWorld {
    fn drives_on_right(&self) -> bool {
        self.drives_on_right
    }
}

impl EventSink for SandboxWorld {
    fn notify(&mut self, event: PursuitEvent) {
        self.events.push(event);
    }
}

impl MessageSink for SandboxWorld {
    fn show_message(&mut self, message: &Message) {
        self.messages.push(message.clone());
    }
}
