//! Per-tick pursuit update
//!
//! Each tick runs in phases. Observation (sight, score, escalation) and timer
//! bookkeeping only touch the vehicle's own record and return what should
//! happen next; mode transitions and roadblocks are executed afterwards so
//! they are free to reach into the rest of the subsystem and the host.

use crate::core::config::PursuitVariables;
use crate::core::types::{Role, VehicleId, MODE_BUSTED, MODE_NONE};
use crate::host::{PursuitHost, TrafficInfo, VehicleInfo};
use crate::police::{NearestPolice, PoliceContact};
use crate::pursuit::constants::*;
use crate::pursuit::state::{DeferredAction, PursuitState, ScheduledAction};
use crate::pursuit::subsystem::PursuitSubsystem;

/// Transition decided by the timer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickOutcome {
    Arrest(VehicleId),
    Release,
    Evade,
    Roadblock,
}

impl PursuitSubsystem {
    /// Advance every tracked vehicle by `dt` seconds
    pub fn update<H>(&mut self, host: &mut H, dt: f32)
    where
        H: PursuitHost + ?Sized,
    {
        if !self.enabled || !host.is_running() {
            if self.scheduler.is_active() || self.scheduler.is_scheduled() {
                self.scheduler.reset_idle();
            }
            return;
        }
        let dt = dt.max(0.0);

        let settings = host.settings();
        let player_is_police = host
            .player_vehicle()
            .and_then(|id| host.traffic_info(id))
            .is_some_and(|info| info.role == Role::Police);
        self.scheduler.update(
            dt,
            &self.variables,
            settings.random_events,
            player_is_police,
            &mut self.rng,
        );

        for id in host.tracked_vehicles() {
            self.update_vehicle(host, id, dt);
        }
    }

    fn update_vehicle<H>(&mut self, host: &mut H, id: VehicleId, dt: f32)
    where
        H: PursuitHost + ?Sized,
    {
        let Some(info) = host.traffic_info(id) else {
            return;
        };
        if info.role == Role::Police {
            return;
        }
        let Some(vehicle) = host.vehicle(id) else {
            return;
        };
        if !vehicle.active {
            return;
        }

        let due = self.pursuits.entry(id).or_default().take_due_actions(dt);
        for action in due {
            match action {
                DeferredAction::SetMode { mode, police } => {
                    if let Err(err) = self.set_pursuit_mode(host, mode.into(), id, police) {
                        tracing::debug!("Deferred mode change for {} failed: {}", id, err);
                    }
                }
            }
        }

        // Deferred actions may have changed position or state
        let Some(vehicle) = host.vehicle(id) else {
            return;
        };
        let contact = self.roster.contact(host, &vehicle);

        if let Some(level) = self.observe(id, &info, &vehicle, &contact, dt) {
            if let Err(err) = self.set_pursuit_mode(host, level.into(), id, None) {
                tracing::debug!("Escalation of {} failed: {}", id, err);
            }
        }

        match self.advance_timers(id, &vehicle, &contact, dt) {
            Some(TickOutcome::Arrest(police)) => {
                if let Err(err) = self.arrest_vehicle(host, id, Some(police)) {
                    tracing::warn!("Arrest of {} failed: {}", id, err);
                }
            }
            Some(TickOutcome::Release) => {
                if let Err(err) = self.release_vehicle(host, id) {
                    tracing::warn!("Release of {} failed: {}", id, err);
                }
            }
            Some(TickOutcome::Evade) => {
                if let Err(err) = self.evade_vehicle(host, id) {
                    tracing::warn!("Evade of {} failed: {}", id, err);
                }
            }
            Some(TickOutcome::Roadblock) => self.try_roadblock(host, id),
            None => {}
        }
    }

    /// Sight, score and escalation; returns an immediate escalation level
    fn observe(
        &mut self,
        id: VehicleId,
        info: &TrafficInfo,
        vehicle: &VehicleInfo,
        contact: &PoliceContact,
        dt: f32,
    ) -> Option<i8> {
        let vars = &self.variables;
        let pursuit = self.pursuits.get_mut(&id)?;
        let speed = vehicle.speed();

        let coef = if pursuit.is_pursued() {
            SIGHT_COEF_PURSUING
        } else {
            SIGHT_COEF_IDLE
        };
        let closest = contact
            .nearest_visible
            .map(|police| police.distance().min(police.inter_distance()));
        pursuit.update_sight(closest, dt, vars.strictness, coef);

        // Nothing scores while cooling down, including the tick it lifts
        let injected = pursuit.add_score.take();
        if pursuit.cooldown {
            if speed >= COOLDOWN_CLEAR_SPEED {
                pursuit.cooldown = false;
            }
        } else if let Some(amount) = injected {
            pursuit.score += amount;
        } else if pursuit.is_pursued() || (pursuit.mode == MODE_NONE && info.role == Role::Suspect) {
            pursuit.score += vars.strictness * speed.min(SCORE_SPEED_CAP) * dt * SCORE_RATE;
        }
        pursuit.score = pursuit.score.max(0.0);

        if pursuit.mode < MODE_NONE || pursuit.has_pending_escalation() {
            return None;
        }
        let level = next_level(pursuit, vars)?;

        if pursuit.mode == MODE_NONE {
            // Only a unit that can actually respond starts a pursuit
            let police = contact.nearest?;
            let delay = (ESCALATION_DELAY_FACTOR / speed.max(0.1)).min(MAX_ESCALATION_DELAY);
            pursuit.scheduled.push(ScheduledAction {
                delay,
                action: DeferredAction::SetMode {
                    mode: level,
                    police: Some(police.id),
                },
            });
            tracing::debug!("{} reported to {}, pursuit in {:.2}s", id, police.id, delay);
            None
        } else {
            Some(level)
        }
    }

    /// PIT cooldown, arrest/evade/roadblock timers and roadblock proximity
    fn advance_timers(
        &mut self,
        id: VehicleId,
        vehicle: &VehicleInfo,
        contact: &PoliceContact,
        dt: f32,
    ) -> Option<TickOutcome> {
        let vars = &self.variables;
        let roster = &self.roster;
        let pursuit = self.pursuits.get_mut(&id)?;

        if pursuit.mode >= 2 {
            pursuit.timers.pit = (pursuit.timers.pit - dt).max(0.0);
        } else {
            pursuit.timers.pit = PIT_COOLDOWN;
        }

        if pursuit.mode == MODE_NONE {
            pursuit.police_attack = false;
            return None;
        }

        let nearest = contact.nearest;
        let arrest_dist = if pursuit.police_visible {
            vars.arrest_radius
        } else {
            FALLBACK_ARREST_DISTANCE
        };
        pursuit.police_attack = nearest.is_some_and(|police| {
            police.visible && roster.target_of(police.id) == Some(id)
        });

        if pursuit.mode == MODE_BUSTED {
            if vars.auto_release {
                if vehicle.frozen {
                    pursuit.timers.arrest = (pursuit.timers.arrest - dt).max(RELEASE_COUNTDOWN);
                }
            } else {
                pursuit.timers.arrest = 0.0;
            }
            if pursuit.timers.arrest <= RELEASE_COUNTDOWN || !vehicle.frozen {
                return Some(TickOutcome::Release);
            }
            return None;
        }

        pursuit.timers.main += dt;
        let outcome = step_pursuit(pursuit, vars, nearest, arrest_dist, vehicle.speed(), dt);
        track_roadblock(pursuit, vehicle);

        tracing::trace!(
            "{} mode {} score {:.1} arrest {:.2} evade {:.2}",
            id,
            pursuit.mode,
            pursuit.score,
            pursuit.arrest_value(vars),
            pursuit.evade_value(vars)
        );
        outcome
    }
}

/// First level above the current mode whose score threshold is met
fn next_level(pursuit: &PursuitState, vars: &PursuitVariables) -> Option<i8> {
    vars.score_levels
        .iter()
        .enumerate()
        .map(|(i, &threshold)| (i as i8 + 1, threshold))
        .find(|&(level, threshold)| pursuit.mode < level && pursuit.score >= threshold)
        .map(|(level, _)| level)
}

/// Arrest, evade and roadblock timers for an active pursuit
fn step_pursuit(
    pursuit: &mut PursuitState,
    vars: &PursuitVariables,
    nearest: Option<NearestPolice>,
    arrest_dist: f32,
    speed: f32,
    dt: f32,
) -> Option<TickOutcome> {
    let in_arrest_range = nearest.filter(|police| police.dist_sq <= arrest_dist * arrest_dist);

    if let Some(police) = in_arrest_range {
        pursuit.timers.evade = 0.0;
        if speed <= ARREST_MAX_TARGET_SPEED && police.speed <= ARREST_MAX_POLICE_SPEED {
            pursuit.timers.arrest += dt;
        } else {
            pursuit.timers.arrest = 0.0;
        }
        if pursuit.timers.arrest >= vars.arrest_limit {
            return Some(TickOutcome::Arrest(police.id));
        }
        return None;
    }

    pursuit.timers.arrest = 0.0;
    let mut outcome = None;

    if pursuit.mode == 3 && pursuit.evade_value(vars) < ROADBLOCK_EVADE_PRESSURE {
        pursuit.timers.roadblock -= dt;
        if pursuit.timers.roadblock <= 0.0 {
            outcome = Some(TickOutcome::Roadblock);
        }
    }

    let evade_radius_sq = vars.evade_radius * vars.evade_radius;
    let held = pursuit.police_attack && nearest.is_some_and(|p| p.dist_sq <= evade_radius_sq);
    if held {
        pursuit.timers.evade = 0.0;
    } else {
        pursuit.timers.evade += dt;
        if pursuit.timers.evade >= vars.evade_limit {
            outcome = Some(TickOutcome::Evade);
        }
    }
    outcome
}

/// Latch the first close approach to the current roadblock
fn track_roadblock(pursuit: &mut PursuitState, vehicle: &VehicleInfo) {
    let Some(position) = pursuit.roadblock_pos else {
        return;
    };
    let near_sq = ROADBLOCK_NEAR_DISTANCE * ROADBLOCK_NEAR_DISTANCE;
    if !pursuit.roadblock_near && vehicle.position.distance_squared(position) <= near_sq {
        pursuit.roadblock_near = true;
        pursuit.roadblocks += 1;
        tracing::debug!("{} reached roadblock #{}", vehicle.id, pursuit.roadblocks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn police(distance: f32, speed: f32) -> NearestPolice {
        NearestPolice {
            id: VehicleId(9),
            dist_sq: distance * distance,
            inter_dist_sq: distance * distance,
            speed,
            visible: true,
        }
    }

    fn pursued(mode: i8) -> PursuitState {
        let mut state = PursuitState::new();
        state.mode = mode;
        state
    }

    #[test]
    fn test_next_level_picks_first_qualifying() {
        let vars = PursuitVariables::default();
        let mut state = pursued(0);
        state.score = 600.0;
        assert_eq!(next_level(&state, &vars), Some(1));
        state.mode = 1;
        assert_eq!(next_level(&state, &vars), Some(2));
        state.mode = 2;
        assert_eq!(next_level(&state, &vars), None);
    }

    #[test]
    fn test_arrest_accrues_only_when_slow() {
        let vars = PursuitVariables::default();
        let mut state = pursued(2);
        step_pursuit(&mut state, &vars, Some(police(8.0, 0.0)), 15.0, 1.0, 1.0);
        assert_eq!(state.timers.arrest, 1.0);

        step_pursuit(&mut state, &vars, Some(police(8.0, 0.0)), 15.0, 5.0, 1.0);
        assert_eq!(state.timers.arrest, 0.0);
    }

    #[test]
    fn test_arrest_triggers_at_limit() {
        let vars = PursuitVariables::default();
        let mut state = pursued(1);
        state.timers.arrest = 4.5;
        let outcome = step_pursuit(&mut state, &vars, Some(police(3.0, 0.0)), 5.0, 0.0, 0.5);
        assert_eq!(outcome, Some(TickOutcome::Arrest(VehicleId(9))));
    }

    #[test]
    fn test_evade_held_by_attacking_police() {
        let vars = PursuitVariables::default();
        let mut state = pursued(1);
        state.police_attack = true;
        state.timers.evade = 3.0;
        step_pursuit(&mut state, &vars, Some(police(50.0, 20.0)), 15.0, 20.0, 1.0);
        assert_eq!(state.timers.evade, 0.0);

        state.police_attack = false;
        step_pursuit(&mut state, &vars, Some(police(50.0, 20.0)), 15.0, 20.0, 1.0);
        assert_eq!(state.timers.evade, 1.0);
    }

    #[test]
    fn test_evade_triggers_at_limit() {
        let vars = PursuitVariables::default();
        let mut state = pursued(2);
        state.timers.evade = 44.5;
        let outcome = step_pursuit(&mut state, &vars, None, FALLBACK_ARREST_DISTANCE, 30.0, 1.0);
        assert_eq!(outcome, Some(TickOutcome::Evade));
    }

    #[test]
    fn test_roadblock_countdown_pauses_under_evade_pressure() {
        let vars = PursuitVariables::default();
        let mut state = pursued(3);
        state.police_attack = true;
        state.timers.roadblock = 0.5;
        let outcome = step_pursuit(&mut state, &vars, Some(police(60.0, 20.0)), 15.0, 20.0, 1.0);
        assert_eq!(outcome, Some(TickOutcome::Roadblock));

        state.timers.roadblock = 5.0;
        state.timers.evade = 30.0;
        state.police_attack = false;
        step_pursuit(&mut state, &vars, Some(police(60.0, 20.0)), 15.0, 20.0, 1.0);
        assert_eq!(state.timers.roadblock, 5.0);
    }

    #[test]
    fn test_roadblock_latch_counts_once() {
        let mut state = pursued(3);
        state.roadblock_pos = Some(Vec3::new(0.0, 15.0, 0.0));
        let vehicle = VehicleInfo {
            id: VehicleId(1),
            position: Vec3::ZERO,
            direction: Vec3::Y,
            velocity: Vec3::ZERO,
            extents: Vec3::new(2.0, 4.5, 1.5),
            ref_offset: Vec3::ZERO,
            active: true,
            on_screen: true,
            player_controlled: false,
            frozen: false,
        };
        track_roadblock(&mut state, &vehicle);
        track_roadblock(&mut state, &vehicle);
        assert!(state.roadblock_near);
        assert_eq!(state.roadblocks, 1);
    }
}
