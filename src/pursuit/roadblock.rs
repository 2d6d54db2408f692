//! Roadblock trigger
//!
//! Pulls out-of-sight police units ahead of a level 3 suspect and lines them
//! (and any active props) up across the road.

use glam::Vec3;
use rand::Rng;
use thiserror::Error;

use crate::core::types::{RoleAction, VehicleId};
use crate::host::{
    MessageCategory, PlacementKind, PlacementOptions, PursuitHost, SpawnPoint, SpawnQuery,
    VehicleInfo,
};
use crate::police::PoliceRoster;
use crate::pursuit::constants::*;
use crate::pursuit::events::PursuitActionKind;
use crate::pursuit::subsystem::PursuitSubsystem;
use crate::roadblock::geometry::{
    compute_placement, rotation_from_basis, select_fitting_subset, Footprint, FootprintAxis,
};

/// Why a roadblock attempt was skipped
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoadblockSkip {
    #[error("target {0} is gone")]
    TargetGone(VehicleId),
    #[error("previous roadblock is still ahead")]
    RecentRoadblock,
    #[error("{found} free units, {needed} needed")]
    NotEnoughUnits { found: usize, needed: usize },
    #[error("no spawn point ahead")]
    NoSpawnPoint,
    #[error("no unit fits a {0:.1}m road")]
    NothingFits(f32),
}

impl PursuitSubsystem {
    /// Attempt a roadblock for `target` and reschedule the next attempt
    pub(crate) fn try_roadblock<H>(&mut self, host: &mut H, target: VehicleId)
    where
        H: PursuitHost + ?Sized,
    {
        let result = self.place_roadblock(host, target);
        let interval = self.variables.roadblock_interval();
        let Some(pursuit) = self.pursuits.get_mut(&target) else {
            return;
        };

        match result {
            Ok(units) => {
                pursuit.timers.roadblock = if units == 1 {
                    interval + ROADBLOCK_SINGLE_UNIT_PENALTY
                } else {
                    interval
                };
            }
            Err(reason) => {
                tracing::debug!("Roadblock for {} skipped: {}", target, reason);
                pursuit.timers.roadblock = ROADBLOCK_RETRY_DELAY;
            }
        }
    }

    /// Place a roadblock ahead of `target`, returning how many candidates were available
    fn place_roadblock<H>(&mut self, host: &mut H, target: VehicleId) -> Result<usize, RoadblockSkip>
    where
        H: PursuitHost + ?Sized,
    {
        let vehicle = host
            .vehicle(target)
            .ok_or(RoadblockSkip::TargetGone(target))?;

        let last = self.pursuits.get(&target).and_then(|p| p.roadblock_pos);
        let reuse_sq = ROADBLOCK_REUSE_DISTANCE * ROADBLOCK_REUSE_DISTANCE;
        if last.is_some_and(|pos| pos.distance_squared(vehicle.position) <= reuse_sq) {
            return Err(RoadblockSkip::RecentRoadblock);
        }

        let candidates: Vec<VehicleId> = self
            .roster
            .ids()
            .into_iter()
            .filter(|&id| is_roadblock_candidate(host, id, &vehicle))
            .collect();
        let needed = if self.roster.len() == 1 { 1 } else { 2 };
        if candidates.len() < needed {
            return Err(RoadblockSkip::NotEnoughUnits {
                found: candidates.len(),
                needed,
            });
        }

        let forward = vehicle
            .velocity
            .try_normalize()
            .unwrap_or(vehicle.direction);
        let spawn = host
            .find_spawn_point(&SpawnQuery {
                origin: vehicle.position,
                forward,
                min_radius: ROADBLOCK_MIN_RADIUS,
                max_radius: ROADBLOCK_MAX_RADIUS,
                max_angle: ROADBLOCK_MAX_ANGLE,
            })
            .ok_or(RoadblockSkip::NoSpawnPoint)?;

        let width = spawn.radius * 2.0;
        let footprints: Vec<Footprint> = candidates
            .iter()
            .filter_map(|&id| host.vehicle(id))
            .map(|info| Footprint::new(info.id, info.extents).with_ref_offset(info.ref_offset))
            .collect();
        let (members, used) = select_fitting_subset(&footprints, width, FootprintAxis::Auto);
        if members.is_empty() {
            return Err(RoadblockSkip::NothingFits(width));
        }

        let (angle, center_angle) = self.roadblock_angle(width - used, host.drives_on_right());
        let rotation = rotation_from_basis(spawn.dir, spawn.normal);
        let placements = compute_placement(&members, spawn.pos, rotation, width, angle, center_angle);

        for member in &members {
            host.reset_respawn(member.id);
            host.set_target(member.id, target);
            host.set_action(member.id, RoleAction::Roadblock { position: spawn.pos });
            if let Some(unit) = self.roster.get_mut(member.id) {
                unit.target = Some(target);
            }
        }
        host.place_group(
            &placements,
            &PlacementOptions {
                kind: PlacementKind::RoadblockVehicles,
                fade_in: true,
            },
        );
        self.place_props(host, &spawn, vehicle.position, width);

        if let Some(pursuit) = self.pursuits.get_mut(&target) {
            pursuit.roadblock_pos = Some(spawn.pos);
            pursuit.roadblock_near = false;
        }
        self.message(host, "pursuit.roadblock", MessageCategory::Roadblock, target);
        self.notify_action(host, target, PursuitActionKind::Roadblock);
        tracing::info!(
            "Roadblock of {} units placed for {} at {:?}",
            members.len(),
            target,
            spawn.pos
        );
        Ok(candidates.len())
    }

    /// Line the active props up behind the vehicles, away from the approaching target
    fn place_props<H>(&self, host: &mut H, spawn: &SpawnPoint, approach: Vec3, width: f32)
    where
        H: PursuitHost + ?Sized,
    {
        if !self.props.is_active() || self.props.is_empty() {
            return;
        }
        let (props, _) =
            select_fitting_subset(&self.props.footprints(host), width, FootprintAxis::Length);
        let Some(longest) = props
            .iter()
            .map(|prop| prop.length(FootprintAxis::Length))
            .reduce(f32::max)
        else {
            return;
        };

        let dir = spawn.dir.normalize_or_zero();
        let away = if (spawn.pos - approach).dot(dir) >= 0.0 { dir } else { -dir };
        let center = spawn.pos + away * (longest / 2.0);
        let rotation = rotation_from_basis(spawn.dir, host.surface_normal(center));

        let placements = compute_placement(&props, center, rotation, width, 0.0, None);
        host.place_group(
            &placements,
            &PlacementOptions {
                kind: PlacementKind::RoadblockProps,
                fade_in: false,
            },
        );
    }

    /// Member heading offset and centre override, picked from the spare road width
    fn roadblock_angle(&mut self, spare: f32, drives_on_right: bool) -> (f32, Option<f32>) {
        if spare < ROADBLOCK_TIGHT_SPARE {
            let side = if drives_on_right { 1.0 } else { -1.0 };
            let sign = if self.rng.gen_bool(ROADBLOCK_SIDE_BIAS) { side } else { -side };
            (sign * self.rng.gen_range(30.0..=50.0), None)
        } else if spare > ROADBLOCK_GENEROUS_SPARE {
            (self.rng.gen_range(-20.0..=20.0), Some(0.0))
        } else {
            (self.rng.gen_range(-5.0..=5.0), Some(0.0))
        }
    }
}

/// Free police unit that can be moved without the target seeing it happen
fn is_roadblock_candidate<H>(host: &H, id: VehicleId, target: &VehicleInfo) -> bool
where
    H: PursuitHost + ?Sized,
{
    if id == target.id || !PoliceRoster::is_usable(host, id) {
        return false;
    }
    let (Some(police), Some(traffic)) = (host.vehicle(id), host.traffic_info(id)) else {
        return false;
    };
    !police.on_screen
        && !traffic.respawning
        && !host.has_line_of_sight(police.position, target.position)
}
