//! Host lifecycle hooks and suspect promotion

use crate::core::error::{PursuitError, Result};
use crate::core::types::{Role, RoleAction, RoleState, VehicleId, MODE_NONE};
use crate::host::{PursuitHost, TrafficControl, VehicleQuery};
use crate::police::PoliceRoster;
use crate::pursuit::state::PursuitState;
use crate::pursuit::subsystem::PursuitSubsystem;

impl PursuitSubsystem {
    /// A vehicle joined the traffic population
    pub fn on_vehicle_added<H>(&mut self, host: &H, id: VehicleId)
    where
        H: VehicleQuery + TrafficControl + ?Sized,
    {
        let Some(info) = host.traffic_info(id) else {
            return;
        };
        self.pursuits.entry(id).or_default();
        if info.role == Role::Police && self.roster.insert(id) {
            tracing::debug!("Police unit {} joined the roster", id);
        }
    }

    /// A vehicle left the world; forget everything tied to it
    pub fn on_vehicle_removed<H>(&mut self, host: &mut H, id: VehicleId)
    where
        H: PursuitHost + ?Sized,
    {
        self.pursuits.remove(&id);
        self.roster.remove(id);
        self.props.remove(id);

        for unit in self.roster.units_targeting(id) {
            if PoliceRoster::is_usable(host, unit) {
                host.reset_action(unit);
            }
            if let Some(entry) = self.roster.get_mut(unit) {
                entry.target = None;
            }
        }
        if self.scheduler.suspect() == Some(id) {
            self.scheduler.clear_suspect();
            tracing::debug!("Suspect {} removed", id);
        }
    }

    pub fn on_role_changed(&mut self, id: VehicleId, role: Role) {
        if self.roster.on_role_changed(id, role) {
            tracing::debug!("Roster membership of {} changed ({:?})", id, role);
        }
    }

    /// Recompute the roster from role data alone
    pub fn rebuild_roster<H>(&mut self, host: &H)
    where
        H: TrafficControl + ?Sized,
    {
        self.roster.rebuild(host);
    }

    /// The player moved from `old` to `new`; an active pursuit follows them
    pub fn on_vehicle_switched<H>(&mut self, host: &mut H, old: Option<VehicleId>, new: Option<VehicleId>)
    where
        H: PursuitHost + ?Sized,
    {
        let (Some(old), Some(new)) = (old, new) else {
            return;
        };
        if old == new {
            return;
        }
        let Some(carried) = self.pursuits.get(&old).filter(|p| p.is_pursued()).cloned() else {
            return;
        };
        if host
            .traffic_info(new)
            .map_or(true, |info| info.role == Role::Police)
        {
            return;
        }

        if let Err(err) = self.set_pursuit_mode(host, MODE_NONE.into(), old, None) {
            tracing::debug!("Could not clear pursuit of {}: {}", old, err);
        }
        if let Err(err) = self.set_pursuit_mode(host, carried.mode.into(), new, None) {
            tracing::debug!("Could not hand pursuit to {}: {}", new, err);
            return;
        }
        if let Some(pursuit) = self.pursuits.get_mut(&new) {
            pursuit.score = carried.score;
            pursuit.offenses = carried.offenses;
        }
        tracing::info!("Pursuit handed from {} to {}", old, new);
    }

    /// A vehicle respawned; it may be drafted as the next random suspect
    pub fn on_vehicle_reset<H>(&mut self, host: &mut H, id: VehicleId)
    where
        H: PursuitHost + ?Sized,
    {
        if !self.enabled || !self.scheduler.is_ready() {
            return;
        }
        let (Some(vehicle), Some(info)) = (host.vehicle(id), host.traffic_info(id)) else {
            return;
        };
        let idle = self.pursuits.get(&id).map_or(true, |p| p.mode == MODE_NONE);
        let eligible = !vehicle.player_controlled
            && vehicle.active
            && info.role == Role::Standard
            && !info.busy
            && idle;
        if !eligible {
            return;
        }

        self.promote_suspect(host, id);
    }

    /// The role AI of `id` switched to `state`
    pub fn on_traffic_action<H>(&mut self, host: &mut H, id: VehicleId, state: RoleState)
    where
        H: PursuitHost + ?Sized,
    {
        if !self.scheduler.is_active() || state.is_interesting() {
            return;
        }
        let Some(info) = host.traffic_info(id) else {
            return;
        };
        let idle = self.pursuits.get(&id).map_or(true, |p| p.mode == MODE_NONE);
        if info.role != Role::Suspect || !idle {
            return;
        }

        host.set_role(id, Role::Standard);
        if self.scheduler.suspect().map_or(true, |suspect| suspect == id) {
            self.scheduler.clear_suspect();
        }
        tracing::info!("Suspect {} lost interest, demoted", id);
    }

    /// Traffic was switched off; police and suspects are gone with it
    pub fn on_traffic_stopped(&mut self) {
        self.roster.clear();
        self.scheduler.reset_idle();
    }

    /// Mission or session ended
    pub fn on_session_end<H>(&mut self, host: &mut H)
    where
        H: TrafficControl + ?Sized,
    {
        self.reset_variables();
        self.props.reset(host);
        self.scheduler.reset();
        for pursuit in self.pursuits.values_mut() {
            *pursuit = PursuitState::new();
        }
        for id in self.roster.ids() {
            if let Some(unit) = self.roster.get_mut(id) {
                unit.target = None;
            }
        }
        tracing::info!("Pursuit session ended");
    }

    /// Make `id` the active suspect right away
    pub fn set_suspect<H>(&mut self, host: &mut H, id: VehicleId) -> Result<()>
    where
        H: PursuitHost + ?Sized,
    {
        host.vehicle(id).ok_or(PursuitError::VehicleNotFound(id))?;
        let info = host.traffic_info(id).ok_or(PursuitError::NotTracked(id))?;
        if info.role == Role::Police {
            return Err(PursuitError::PoliceTarget(id));
        }
        self.promote_suspect(host, id);
        Ok(())
    }

    fn promote_suspect<H>(&mut self, host: &mut H, id: VehicleId)
    where
        H: PursuitHost + ?Sized,
    {
        host.set_role(id, Role::Suspect);
        host.set_action(id, RoleAction::Watch);
        self.pursuits.entry(id).or_default();
        self.scheduler.activate(id);
        tracing::info!("{} is now a suspect", id);
    }
}
