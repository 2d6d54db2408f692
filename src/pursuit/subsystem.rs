//! The pursuit subsystem context
//!
//! Owns every piece of session state: tuning variables, police roster, prop
//! registry, suspect scheduler and per-vehicle pursuit records. The host
//! creates one per simulation session and passes itself in on every call.

use std::path::Path;

use ahash::AHashMap;
use glam::{Quat, Vec3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::{PursuitVariables, PursuitVariablesPatch};
use crate::core::error::{PursuitError, Result};
use crate::core::types::VehicleId;
use crate::host::{Message, MessageCategory, PursuitHost, TrafficControl, VehicleQuery};
use crate::police::PoliceRoster;
use crate::pursuit::events::{PursuitActionKind, PursuitEvent, PursuitSnapshot};
use crate::pursuit::state::PursuitState;
use crate::roadblock::geometry::{
    compute_placement, select_fitting_subset, Footprint, FootprintAxis, Placement,
};
use crate::roadblock::props::RoadblockProps;
use crate::suspect::SuspectScheduler;

pub struct PursuitSubsystem {
    pub(crate) enabled: bool,
    pub(crate) variables: PursuitVariables,
    pub(crate) roster: PoliceRoster,
    pub(crate) props: RoadblockProps,
    pub(crate) scheduler: SuspectScheduler,
    pub(crate) pursuits: AHashMap<VehicleId, PursuitState>,
    pub(crate) rng: ChaCha8Rng,
}

impl Default for PursuitSubsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl PursuitSubsystem {
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    /// Deterministic subsystem for tests and replays
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            enabled: true,
            variables: PursuitVariables::default(),
            roster: PoliceRoster::new(),
            props: RoadblockProps::new(),
            scheduler: SuspectScheduler::new(),
            pursuits: AHashMap::new(),
            rng,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            tracing::info!("Pursuit subsystem {}", if enabled { "enabled" } else { "disabled" });
        }
        self.enabled = enabled;
    }

    // === CONFIGURATION ===

    pub fn variables(&self) -> &PursuitVariables {
        &self.variables
    }

    /// Replace the configuration wholesale
    pub fn set_variables(&mut self, variables: PursuitVariables) -> Result<()> {
        let variables = variables.sanitized();
        variables.validate()?;
        self.variables = variables;
        Ok(())
    }

    /// Overwrite only the fields present in `patch`
    pub fn merge_variables(&mut self, patch: &PursuitVariablesPatch) -> Result<()> {
        match patch.apply_to(&self.variables) {
            Ok(merged) => {
                self.variables = merged;
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Rejected pursuit variable merge: {}", err);
                Err(err)
            }
        }
    }

    /// Merge an untyped value; anything but an object is ignored
    ///
    /// Returns whether a merge happened.
    pub fn merge_variables_json(&mut self, value: &serde_json::Value) -> Result<bool> {
        let Some(patch) = PursuitVariablesPatch::from_json(value)? else {
            tracing::debug!("Ignoring non-object pursuit variable merge");
            return Ok(false);
        };
        self.merge_variables(&patch)?;
        Ok(true)
    }

    pub fn load_variables(&mut self, path: &Path) -> Result<()> {
        self.variables = PursuitVariables::load(path)?;
        tracing::info!("Loaded pursuit variables from {:?}", path);
        Ok(())
    }

    pub fn reset_variables(&mut self) {
        self.variables = PursuitVariables::default();
    }

    // === QUERIES ===

    pub fn roster(&self) -> &PoliceRoster {
        &self.roster
    }

    pub fn police_ids(&self) -> Vec<VehicleId> {
        self.roster.ids()
    }

    /// Nearest usable police unit to a point and its distance
    pub fn nearest_police<H>(
        &self,
        host: &H,
        position: Vec3,
        exclude: Option<VehicleId>,
    ) -> Option<(VehicleId, f32)>
    where
        H: VehicleQuery + TrafficControl + ?Sized,
    {
        self.roster.nearest_to(host, position, exclude)
    }

    pub fn pursuit(&self, id: VehicleId) -> Option<&PursuitState> {
        self.pursuits.get(&id)
    }

    /// Direct access for host overrides and tests
    pub fn pursuit_mut(&mut self, id: VehicleId) -> Option<&mut PursuitState> {
        self.pursuits.get_mut(&id)
    }

    pub fn pursuits(&self) -> impl Iterator<Item = (&VehicleId, &PursuitState)> {
        self.pursuits.iter()
    }

    /// Pursuit state together with its derived values
    pub fn snapshot(&self, id: VehicleId) -> Option<PursuitSnapshot> {
        self.pursuits.get(&id).map(|state| PursuitSnapshot {
            state: state.clone(),
            arrest_value: state.arrest_value(&self.variables),
            evade_value: state.evade_value(&self.variables),
        })
    }

    /// Record an infraction and queue its score for the next tick
    pub fn report_offense(&mut self, id: VehicleId, tag: &str, score: f32) -> Result<()> {
        let state = self
            .pursuits
            .get_mut(&id)
            .ok_or(PursuitError::NotTracked(id))?;
        state.add_offense(tag);
        state.inject_score(score);
        tracing::debug!("Offense {} reported for {} (+{:.1})", tag, id, score);
        Ok(())
    }

    // === ROADBLOCK GEOMETRY ===

    fn footprints<H>(host: &H, ids: &[VehicleId]) -> Vec<Footprint>
    where
        H: VehicleQuery + ?Sized,
    {
        ids.iter()
            .filter_map(|&id| host.vehicle(id))
            .map(|info| Footprint::new(info.id, info.extents).with_ref_offset(info.ref_offset))
            .collect()
    }

    /// Which of `ids` fit across `width`, smallest first, and their total length
    pub fn fitting_vehicles<H>(
        &self,
        host: &H,
        ids: &[VehicleId],
        width: f32,
        axis: FootprintAxis,
    ) -> (Vec<VehicleId>, f32)
    where
        H: VehicleQuery + ?Sized,
    {
        let (selected, total) = select_fitting_subset(&Self::footprints(host, ids), width, axis);
        (selected.iter().map(|f| f.id).collect(), total)
    }

    /// Placement transforms for `ids` laid across a roadblock line
    #[allow(clippy::too_many_arguments)]
    pub fn roadblock_placement<H>(
        &self,
        host: &H,
        ids: &[VehicleId],
        center: Vec3,
        rotation: Quat,
        width: f32,
        angle_offset: f32,
        center_angle: Option<f32>,
    ) -> Vec<Placement>
    where
        H: VehicleQuery + ?Sized,
    {
        compute_placement(
            &Self::footprints(host, ids),
            center,
            rotation,
            width,
            angle_offset,
            center_angle,
        )
    }

    // === PROPS ===

    pub fn props(&self) -> &RoadblockProps {
        &self.props
    }

    pub fn add_prop<H>(&mut self, host: &H, id: VehicleId) -> Result<()>
    where
        H: VehicleQuery + TrafficControl + ?Sized,
    {
        self.props.add(host, id)?;
        tracing::debug!("Registered roadblock prop {}", id);
        Ok(())
    }

    pub fn remove_prop(&mut self, id: VehicleId) -> bool {
        self.props.remove(id)
    }

    pub fn activate_props<H>(&mut self, host: &mut H, active: bool)
    where
        H: TrafficControl + ?Sized,
    {
        self.props.activate(host, active);
    }

    pub fn reset_props<H>(&mut self, host: &mut H)
    where
        H: TrafficControl + ?Sized,
    {
        self.props.reset(host);
    }

    // === SUSPECTS ===

    pub fn suspect_active(&self) -> bool {
        self.scheduler.is_active()
    }

    pub fn scheduler(&self) -> &SuspectScheduler {
        &self.scheduler
    }

    /// Force the suspect countdown to `delay` seconds
    pub fn arm_suspect_timer(&mut self, delay: f32) {
        self.scheduler.arm(delay);
    }

    // === NOTIFICATIONS ===

    pub(crate) fn notify_action<H>(&self, host: &mut H, id: VehicleId, action: PursuitActionKind)
    where
        H: PursuitHost + ?Sized,
    {
        if let Some(pursuit) = self.snapshot(id) {
            host.notify(PursuitEvent::Action {
                vehicle: id,
                action,
                pursuit,
            });
        }
    }

    pub(crate) fn message<H>(&self, host: &mut H, key: &str, category: MessageCategory, id: VehicleId)
    where
        H: PursuitHost + ?Sized,
    {
        if host.settings().show_messages {
            host.show_message(&Message::new(key, category, id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_subsystem_defaults() {
        let subsystem = PursuitSubsystem::with_seed(1);
        assert!(subsystem.is_enabled());
        assert_eq!(subsystem.variables(), &PursuitVariables::default());
        assert!(subsystem.roster().is_empty());
        assert!(!subsystem.suspect_active());
    }

    #[test]
    fn test_merge_json_ignores_non_objects() {
        let mut subsystem = PursuitSubsystem::with_seed(1);
        assert!(!subsystem.merge_variables_json(&json!(12)).unwrap());
        assert!(!subsystem.merge_variables_json(&json!(null)).unwrap());
        assert_eq!(subsystem.variables(), &PursuitVariables::default());
    }

    #[test]
    fn test_merge_json_overwrites_present_keys() {
        let mut subsystem = PursuitSubsystem::with_seed(1);
        let merged = subsystem
            .merge_variables_json(&json!({ "arrest_radius": 25.0, "auto_release": false }))
            .unwrap();
        assert!(merged);
        assert_eq!(subsystem.variables().arrest_radius, 25.0);
        assert!(!subsystem.variables().auto_release);
        assert_eq!(subsystem.variables().evade_radius, 80.0);
    }

    #[test]
    fn test_rejected_merge_leaves_state() {
        let mut subsystem = PursuitSubsystem::with_seed(1);
        let result = subsystem.merge_variables_json(&json!({ "score_levels": [300.0, 200.0, 100.0] }));
        assert!(result.is_err());
        assert_eq!(subsystem.variables(), &PursuitVariables::default());
    }

    #[test]
    fn test_reset_variables() {
        let mut subsystem = PursuitSubsystem::with_seed(1);
        subsystem
            .merge_variables(&PursuitVariablesPatch {
                strictness: Some(1.0),
                ..Default::default()
            })
            .unwrap();
        subsystem.reset_variables();
        assert_eq!(subsystem.variables().strictness, 0.5);
    }

    #[test]
    fn test_report_offense_requires_tracking() {
        let mut subsystem = PursuitSubsystem::with_seed(1);
        assert!(subsystem.report_offense(VehicleId(1), "speeding", 10.0).is_err());

        subsystem.pursuits.insert(VehicleId(1), PursuitState::new());
        subsystem.report_offense(VehicleId(1), "speeding", 10.0).unwrap();
        let state = subsystem.pursuit(VehicleId(1)).unwrap();
        assert_eq!(state.offenses, vec!["speeding"]);
        assert_eq!(state.add_score, Some(10.0));
    }
}
