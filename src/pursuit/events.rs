//! Notifications emitted by the pursuit subsystem

use serde::{Deserialize, Serialize};

use crate::core::types::VehicleId;
use crate::pursuit::state::PursuitState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PursuitActionKind {
    Start,
    Arrest,
    Evade,
    Reset,
    Roadblock,
}

/// Copy of a pursuit at the moment an event fired
///
/// Owned so that later ticks cannot change what a listener sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PursuitSnapshot {
    pub state: PursuitState,
    pub arrest_value: f32,
    pub evade_value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PursuitEvent {
    Action {
        vehicle: VehicleId,
        action: PursuitActionKind,
        pursuit: PursuitSnapshot,
    },
    ModeUpdate {
        vehicle: VehicleId,
        mode: i8,
        previous: i8,
        pursuit: PursuitSnapshot,
    },
}

impl PursuitEvent {
    /// Hook name the host dispatches this event under
    pub fn name(&self) -> &'static str {
        match self {
            Self::Action { .. } => "onPursuitAction",
            Self::ModeUpdate { .. } => "onPursuitModeUpdate",
        }
    }

    pub fn vehicle(&self) -> VehicleId {
        match self {
            Self::Action { vehicle, .. } | Self::ModeUpdate { vehicle, .. } => *vehicle,
        }
    }

    pub fn pursuit(&self) -> &PursuitSnapshot {
        match self {
            Self::Action { pursuit, .. } | Self::ModeUpdate { pursuit, .. } => pursuit,
        }
    }

    pub fn action(&self) -> Option<PursuitActionKind> {
        match self {
            Self::Action { action, .. } => Some(*action),
            Self::ModeUpdate { .. } => None,
        }
    }
}
