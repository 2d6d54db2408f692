//! Core type definitions shared by the pursuit subsystem and its host

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Identifier of a simulated vehicle (traffic vehicle, police unit or prop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub u32);

impl VehicleId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pursuit mode of a busted (arrested) vehicle
pub const MODE_BUSTED: i8 = -1;
/// Pursuit mode of a vehicle that is not being pursued
pub const MODE_NONE: i8 = 0;
/// Highest pursuit escalation level
pub const MODE_MAX: i8 = 3;

/// Traffic role assigned to a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Standard,
    Suspect,
    Police,
    /// Vehicle without AI control (usually the player's)
    Empty,
}

/// High-level state the role AI currently reports for a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoleState {
    #[default]
    Idle,
    /// Suspect passively waiting to commit an offense
    Watch,
    /// Wanted for reasons outside the current pursuit
    Wanted,
    Flee,
    Pursuing,
    Roadblock,
    Arrested,
    Disabled,
}

impl RoleState {
    /// States that keep a suspect worth tracking
    pub fn is_interesting(&self) -> bool {
        matches!(self, Self::Watch | Self::Wanted | Self::Flee)
    }
}

/// Command issued to a vehicle's role AI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoleAction {
    Flee,
    Arrest,
    Watch,
    PursuitStart { target: VehicleId, mode: i8 },
    PursuitEnd,
    Roadblock { position: Vec3 },
}
