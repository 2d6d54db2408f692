//! Collaborator interfaces implemented by the simulation host
//!
//! The pursuit core never simulates physics or owns vehicles. Everything it
//! needs to know about the world is read through these traits, and every
//! command it issues goes back out through them.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{Role, RoleAction, RoleState, VehicleId};
use crate::pursuit::events::PursuitEvent;
use crate::roadblock::geometry::Placement;

/// Physical facts about a vehicle at the current tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleInfo {
    pub id: VehicleId,
    pub position: Vec3,
    /// Unit forward vector
    pub direction: Vec3,
    pub velocity: Vec3,
    /// Bounding box extents (width, length, height)
    pub extents: Vec3,
    /// Offset of the vehicle origin from its bounding box reference point
    pub ref_offset: Vec3,
    pub active: bool,
    /// Currently rendered on screen
    pub on_screen: bool,
    pub player_controlled: bool,
    pub frozen: bool,
}

impl VehicleInfo {
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }
}

/// Role record the traffic population keeps for a tracked vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficInfo {
    pub role: Role,
    /// Role restored when a pursuit ends
    pub default_role: Role,
    pub state: RoleState,
    pub busy: bool,
    pub respawning: bool,
}

/// Global traffic tunables owned by the traffic population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrafficSettings {
    pub random_events: bool,
    pub show_messages: bool,
}

impl Default for TrafficSettings {
    fn default() -> Self {
        Self {
            random_events: true,
            show_messages: true,
        }
    }
}

/// Request for a roadside spawn location ahead of a viewpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnQuery {
    pub origin: Vec3,
    pub forward: Vec3,
    pub min_radius: f32,
    pub max_radius: f32,
    /// Maximum angle between `forward` and the spawn direction (degrees)
    pub max_angle: f32,
}

/// Spawn location returned by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub pos: Vec3,
    /// Road direction at the spawn point
    pub dir: Vec3,
    pub normal: Vec3,
    /// Half the usable road width
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementKind {
    RoadblockVehicles,
    RoadblockProps,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementOptions {
    pub kind: PlacementKind,
    /// Fade vehicles in instead of popping them into place
    pub fade_in: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageCategory {
    Pursuit,
    Arrest,
    Evade,
    Roadblock,
}

/// Transient user-facing message, keyed for localization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub key: String,
    pub category: MessageCategory,
    pub vehicle: VehicleId,
}

impl Message {
    pub fn new(key: &str, category: MessageCategory, vehicle: VehicleId) -> Self {
        Self {
            key: key.to_string(),
            category,
            vehicle,
        }
    }
}

/// Vehicle lookup and sight queries
pub trait VehicleQuery {
    fn vehicle(&self, id: VehicleId) -> Option<VehicleInfo>;

    /// Unobstructed line between two points
    fn has_line_of_sight(&self, from: Vec3, to: Vec3) -> bool;
}

/// Traffic population and role/action control
pub trait TrafficControl {
    fn is_running(&self) -> bool;
    fn settings(&self) -> TrafficSettings;
    fn tracked_vehicles(&self) -> Vec<VehicleId>;
    fn traffic_info(&self, id: VehicleId) -> Option<TrafficInfo>;
    fn player_vehicle(&self) -> Option<VehicleId>;

    fn set_role(&mut self, id: VehicleId, role: Role);
    fn set_action(&mut self, id: VehicleId, action: RoleAction);
    fn reset_action(&mut self, id: VehicleId);
    fn set_target(&mut self, id: VehicleId, target: VehicleId);
    /// Restore the respawn-suppression budget of a vehicle
    fn reset_respawn(&mut self, id: VehicleId);
    /// Show or hide a vehicle (used for props)
    fn set_vehicle_active(&mut self, id: VehicleId, active: bool);

    fn is_tracked(&self, id: VehicleId) -> bool {
        self.traffic_info(id).is_some()
    }
}

/// Spawn and placement service
pub trait SpawnService {
    fn find_spawn_point(&self, query: &SpawnQuery) -> Option<SpawnPoint>;
    fn place_group(&mut self, placements: &[Placement], options: &PlacementOptions);
}

/// Road network queries
pub trait RoadNetwork {
    fn surface_normal(&self, _pos: Vec3) -> Vec3 {
        Vec3::Z
    }

    fn drives_on_right(&self) -> bool {
        true
    }
}

/// Receives pursuit notifications; nothing is returned to the core
pub trait EventSink {
    fn notify(&mut self, event: PursuitEvent);
}

/// Displays narration to the user; safe to leave as a no-op
pub trait MessageSink {
    fn show_message(&mut self, _message: &Message) {}
}

/// Everything the pursuit subsystem needs from its host
pub trait PursuitHost:
    VehicleQuery + TrafficControl + SpawnService + RoadNetwork + EventSink + MessageSink
{
}

impl<T> PursuitHost for T where
    T: VehicleQuery + TrafficControl + SpawnService + RoadNetwork + EventSink + MessageSink
{
}
