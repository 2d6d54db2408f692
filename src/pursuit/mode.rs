//! Pursuit mode transitions: escalation, arrest, evasion and release

use crate::core::error::{PursuitError, Result};
use crate::core::types::{Role, RoleAction, RoleState, VehicleId, MODE_BUSTED, MODE_MAX, MODE_NONE};
use crate::host::{MessageCategory, PursuitHost};
use crate::police::PoliceRoster;
use crate::pursuit::events::{PursuitActionKind, PursuitEvent};
use crate::pursuit::subsystem::PursuitSubsystem;

impl PursuitSubsystem {
    /// Move `target` to a pursuit mode
    ///
    /// `mode` is clamped to -1..=3. `police` restricts the roster broadcast
    /// to a single unit; `None` addresses every usable unit.
    pub fn set_pursuit_mode<H>(
        &mut self,
        host: &mut H,
        mode: i32,
        target: VehicleId,
        police: Option<VehicleId>,
    ) -> Result<()>
    where
        H: PursuitHost + ?Sized,
    {
        if police == Some(target) {
            return Err(PursuitError::SelfTarget(target));
        }
        let vehicle = host
            .vehicle(target)
            .ok_or(PursuitError::VehicleNotFound(target))?;
        let info = host
            .traffic_info(target)
            .ok_or(PursuitError::NotTracked(target))?;

        let mode = mode.clamp(MODE_BUSTED as i32, MODE_MAX as i32) as i8;
        let previous = self.pursuits.entry(target).or_default().mode;
        let mut action = None;

        match mode {
            MODE_BUSTED if previous == MODE_BUSTED => {}
            MODE_BUSTED => {
                host.set_action(target, RoleAction::Arrest);
                if let Some(pursuit) = self.pursuits.get_mut(&target) {
                    pursuit.timers.main = 0.0;
                    pursuit.timers.arrest = 0.0;
                    pursuit.scheduled.clear();
                }

                // One bust at a time; low level pursuits elsewhere are dropped
                let mut others: Vec<VehicleId> = self
                    .pursuits
                    .iter()
                    .filter(|(&id, pursuit)| id != target && pursuit.mode == 1)
                    .map(|(&id, _)| id)
                    .collect();
                others.sort();
                for id in others {
                    if let Err(err) = self.set_pursuit_mode(host, MODE_NONE as i32, id, None) {
                        tracing::debug!("Could not drop pursuit of {}: {}", id, err);
                    }
                }
            }
            MODE_NONE => {
                host.reset_action(target);
                let role = match info.default_role {
                    Role::Suspect => Role::Standard,
                    role => role,
                };
                if info.role != role {
                    host.set_role(target, role);
                }
                if let Some(pursuit) = self.pursuits.get_mut(&target) {
                    pursuit.clear_pursuit();
                    if previous == MODE_BUSTED {
                        pursuit.cooldown = true;
                        action = Some(PursuitActionKind::Reset);
                    }
                }
            }
            _ => {
                if info.role != Role::Suspect {
                    host.set_role(target, Role::Suspect);
                }
                if info.state != RoleState::Flee {
                    host.set_action(target, RoleAction::Flee);
                    let key = if vehicle.player_controlled {
                        "pursuit.start.player"
                    } else if info.state == RoleState::Wanted {
                        "pursuit.start.wanted"
                    } else {
                        "pursuit.start.flee"
                    };
                    self.message(host, key, MessageCategory::Pursuit, target);
                }

                let interval = self.variables.roadblock_interval();
                let levels = self.variables.score_levels;
                if let Some(pursuit) = self.pursuits.get_mut(&target) {
                    if previous <= MODE_NONE {
                        pursuit.timers.main = 0.0;
                        pursuit.timers.arrest = 0.0;
                        pursuit.timers.evade = 0.0;
                        pursuit.timers.roadblock = interval;
                        pursuit.target_id = police;
                        action = Some(PursuitActionKind::Start);
                    }

                    // Keep the score consistent with the level just entered
                    let level = levels[(mode - 1) as usize];
                    if mode > previous {
                        pursuit.score = pursuit.score.max(level);
                    } else if mode < previous {
                        pursuit.score = pursuit.score.min(level);
                    }
                }
            }
        }

        if let Some(pursuit) = self.pursuits.get_mut(&target) {
            pursuit.mode = mode;
        }
        self.broadcast_to_police(host, mode, target, police);

        if previous != mode {
            tracing::info!("Pursuit mode of {}: {} -> {}", target, previous, mode);
        }
        if let Some(action) = action {
            self.notify_action(host, target, action);
        }
        if let Some(pursuit) = self.snapshot(target) {
            host.notify(PursuitEvent::ModeUpdate {
                vehicle: target,
                mode,
                previous,
                pursuit,
            });
        }
        Ok(())
    }

    /// Hand the new mode to every matching police unit
    fn broadcast_to_police<H>(
        &mut self,
        host: &mut H,
        mode: i8,
        target: VehicleId,
        police: Option<VehicleId>,
    ) where
        H: PursuitHost + ?Sized,
    {
        for id in self.roster.ids() {
            if id == target || police.is_some_and(|only| only != id) {
                continue;
            }
            if !PoliceRoster::is_usable(host, id) {
                continue;
            }
            let assigned = self.roster.target_of(id) == Some(target);

            match mode {
                MODE_BUSTED if assigned => {
                    host.set_action(id, RoleAction::PursuitEnd);
                }
                MODE_NONE if assigned => {
                    host.reset_action(id);
                }
                MODE_BUSTED | MODE_NONE => continue,
                _ => {
                    host.set_target(id, target);
                    host.set_action(id, RoleAction::PursuitStart { target, mode });
                    if let Some(unit) = self.roster.get_mut(id) {
                        unit.target = Some(target);
                    }
                    continue;
                }
            }

            if let Some(unit) = self.roster.get_mut(id) {
                unit.target = None;
            }
        }
    }

    /// Bust `target`; no-op if it is already busted
    pub fn arrest_vehicle<H>(
        &mut self,
        host: &mut H,
        target: VehicleId,
        police: Option<VehicleId>,
    ) -> Result<()>
    where
        H: PursuitHost + ?Sized,
    {
        if police == Some(target) {
            return Err(PursuitError::SelfTarget(target));
        }
        if self.pursuits.get(&target).is_some_and(|p| p.is_busted()) {
            return Ok(());
        }

        // Every unit on this target stands down, not just the arresting one
        self.set_pursuit_mode(host, MODE_BUSTED as i32, target, None)?;
        self.scheduler.clear_suspect();
        self.message(host, "pursuit.arrest", MessageCategory::Arrest, target);
        self.notify_action(host, target, PursuitActionKind::Arrest);
        tracing::info!(
            "{} arrested{}",
            target,
            police.map(|id| format!(" by {}", id)).unwrap_or_default()
        );
        Ok(())
    }

    /// End the pursuit of `target` as an escape; no-op unless pursued
    pub fn evade_vehicle<H>(&mut self, host: &mut H, target: VehicleId) -> Result<()>
    where
        H: PursuitHost + ?Sized,
    {
        if !self.pursuits.get(&target).is_some_and(|p| p.is_pursued()) {
            return Ok(());
        }
        let player = host
            .vehicle(target)
            .ok_or(PursuitError::VehicleNotFound(target))?
            .player_controlled;

        self.message(host, "pursuit.evade", MessageCategory::Evade, target);
        self.notify_action(host, target, PursuitActionKind::Evade);
        self.set_pursuit_mode(host, MODE_NONE as i32, target, None)?;

        self.scheduler.clear_suspect();
        if !player {
            self.scheduler.on_ai_evaded();
        }
        tracing::info!("{} evaded police", target);
        Ok(())
    }

    /// Let a busted vehicle go; no-op unless busted
    pub fn release_vehicle<H>(&mut self, host: &mut H, target: VehicleId) -> Result<()>
    where
        H: PursuitHost + ?Sized,
    {
        if !self.pursuits.get(&target).is_some_and(|p| p.is_busted()) {
            return Ok(());
        }
        self.set_pursuit_mode(host, MODE_NONE as i32, target, None)?;
        tracing::debug!("{} released", target);
        Ok(())
    }
}
