//! Police roster: vehicles currently holding the police role

use std::collections::BTreeMap;

use glam::Vec3;

use crate::core::types::{Role, RoleState, VehicleId};
use crate::host::{TrafficControl, VehicleInfo, VehicleQuery};

/// Lookahead used for the interactive distance (seconds)
pub const LOOKAHEAD_SECONDS: f32 = 1.0;

/// Roster entry for a police vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoliceUnit {
    pub id: VehicleId,
    /// Vehicle this unit was last told to pursue
    pub target: Option<VehicleId>,
}

/// Result of a nearest-police query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPolice {
    pub id: VehicleId,
    /// Squared distance from the target position
    pub dist_sq: f32,
    /// Squared distance from the target's lookahead point
    pub inter_dist_sq: f32,
    pub speed: f32,
    pub visible: bool,
}

impl NearestPolice {
    pub fn distance(&self) -> f32 {
        self.dist_sq.sqrt()
    }

    pub fn inter_distance(&self) -> f32 {
        self.inter_dist_sq.sqrt()
    }
}

/// Nearest usable police unit, and nearest one with line of sight
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoliceContact {
    pub nearest: Option<NearestPolice>,
    pub nearest_visible: Option<NearestPolice>,
}

/// Set of police vehicles, kept in id order so ties resolve the same way every run
#[derive(Debug, Clone, Default)]
pub struct PoliceRoster {
    units: BTreeMap<VehicleId, PoliceUnit>,
}

impl PoliceRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit, returns false if it was already present
    pub fn insert(&mut self, id: VehicleId) -> bool {
        if self.units.contains_key(&id) {
            return false;
        }
        self.units.insert(id, PoliceUnit { id, target: None });
        true
    }

    pub fn remove(&mut self, id: VehicleId) -> Option<PoliceUnit> {
        self.units.remove(&id)
    }

    pub fn contains(&self, id: VehicleId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn get(&self, id: VehicleId) -> Option<&PoliceUnit> {
        self.units.get(&id)
    }

    pub fn get_mut(&mut self, id: VehicleId) -> Option<&mut PoliceUnit> {
        self.units.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn clear(&mut self) {
        self.units.clear();
    }

    pub fn ids(&self) -> Vec<VehicleId> {
        self.units.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoliceUnit> {
        self.units.values()
    }

    pub fn target_of(&self, id: VehicleId) -> Option<VehicleId> {
        self.units.get(&id).and_then(|unit| unit.target)
    }

    /// Units currently assigned to `target`
    pub fn units_targeting(&self, target: VehicleId) -> Vec<VehicleId> {
        self.units
            .values()
            .filter(|unit| unit.target == Some(target))
            .map(|unit| unit.id)
            .collect()
    }

    /// Track a role change; returns true if membership changed
    pub fn on_role_changed(&mut self, id: VehicleId, role: Role) -> bool {
        if role == Role::Police {
            self.insert(id)
        } else {
            self.remove(id).is_some()
        }
    }

    /// Recompute membership from role data alone
    pub fn rebuild<H>(&mut self, host: &H)
    where
        H: TrafficControl + ?Sized,
    {
        self.units.clear();
        for id in host.tracked_vehicles() {
            if host.traffic_info(id).is_some_and(|info| info.role == Role::Police) {
                self.insert(id);
            }
        }
    }

    /// Whether a unit can take part in pursuits right now
    pub fn is_usable<H>(host: &H, id: VehicleId) -> bool
    where
        H: VehicleQuery + TrafficControl + ?Sized,
    {
        let active = host.vehicle(id).is_some_and(|info| info.active);
        let enabled = host
            .traffic_info(id)
            .is_some_and(|info| info.state != RoleState::Disabled);
        active && enabled
    }

    /// Nearest usable police unit to `target`, plus the nearest one in sight
    pub fn contact<H>(&self, host: &H, target: &VehicleInfo) -> PoliceContact
    where
        H: VehicleQuery + TrafficControl + ?Sized,
    {
        let lookahead = target.position + target.velocity * LOOKAHEAD_SECONDS;
        let mut contact = PoliceContact::default();

        for unit in self.units.values() {
            if unit.id == target.id || !Self::is_usable(host, unit.id) {
                continue;
            }
            let Some(police) = host.vehicle(unit.id) else {
                continue;
            };

            let candidate = NearestPolice {
                id: unit.id,
                dist_sq: target.position.distance_squared(police.position),
                inter_dist_sq: lookahead.distance_squared(police.position),
                speed: police.speed(),
                visible: host.has_line_of_sight(police.position, target.position),
            };

            if contact.nearest.map_or(true, |best| candidate.dist_sq < best.dist_sq) {
                contact.nearest = Some(candidate);
            }
            if candidate.visible
                && contact
                    .nearest_visible
                    .map_or(true, |best| candidate.dist_sq < best.dist_sq)
            {
                contact.nearest_visible = Some(candidate);
            }
        }

        contact
    }

    /// Nearest usable police unit to an arbitrary point
    pub fn nearest_to<H>(
        &self,
        host: &H,
        position: Vec3,
        exclude: Option<VehicleId>,
    ) -> Option<(VehicleId, f32)>
    where
        H: VehicleQuery + TrafficControl + ?Sized,
    {
        self.units
            .values()
            .filter(|unit| Some(unit.id) != exclude && Self::is_usable(host, unit.id))
            .filter_map(|unit| host.vehicle(unit.id))
            .map(|police| (police.id, position.distance(police.position)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}
