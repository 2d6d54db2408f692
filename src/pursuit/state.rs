//! Per-vehicle pursuit state

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::core::config::PursuitVariables;
use crate::core::types::{VehicleId, MODE_BUSTED, MODE_NONE};
use crate::pursuit::constants::{
    PIT_COOLDOWN, SIGHT_DECAY_RATE, SIGHT_GAIN, SIGHT_MIN_DISTANCE, SIGHT_VISIBLE_THRESHOLD,
};

/// Named pursuit counters (seconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PursuitTimers {
    /// Elapsed pursuit time
    pub main: f32,
    /// Qualifying arrest time; counts down toward release while busted
    pub arrest: f32,
    /// Time without qualifying police contact
    pub evade: f32,
    /// Countdown to the next roadblock attempt
    pub roadblock: f32,
    /// Countdown before police may attempt a PIT maneuver
    pub pit: f32,
}

impl Default for PursuitTimers {
    fn default() -> Self {
        Self {
            main: 0.0,
            arrest: 0.0,
            evade: 0.0,
            roadblock: 0.0,
            pit: PIT_COOLDOWN,
        }
    }
}

/// Action queued on a vehicle, run once its delay elapses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DeferredAction {
    SetMode {
        mode: i8,
        police: Option<VehicleId>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub delay: f32,
    pub action: DeferredAction,
}

/// Pursuit bookkeeping for one tracked vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PursuitState {
    /// -1 busted, 0 none, 1..=3 pursuit level
    pub mode: i8,
    pub score: f32,
    /// Smoothed police visibility in [0, 1]
    pub sight_value: f32,
    pub police_visible: bool,
    pub police_attack: bool,
    /// Suppresses score accrual until the vehicle regains speed
    pub cooldown: bool,
    pub timers: PursuitTimers,
    pub roadblock_pos: Option<Vec3>,
    pub roadblock_near: bool,
    /// Roadblocks approached during this pursuit
    pub roadblocks: u32,
    pub target_id: Option<VehicleId>,
    /// One-shot score injection consumed on the next tick
    pub add_score: Option<f32>,
    pub offenses: Vec<String>,
    pub scheduled: Vec<ScheduledAction>,
}

impl Default for PursuitState {
    fn default() -> Self {
        Self {
            mode: MODE_NONE,
            score: 0.0,
            sight_value: 0.0,
            police_visible: false,
            police_attack: false,
            cooldown: false,
            timers: PursuitTimers::default(),
            roadblock_pos: None,
            roadblock_near: false,
            roadblocks: 0,
            target_id: None,
            add_score: None,
            offenses: Vec::new(),
            scheduled: Vec::new(),
        }
    }
}

impl PursuitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pursued(&self) -> bool {
        self.mode >= 1
    }

    pub fn is_busted(&self) -> bool {
        self.mode == MODE_BUSTED
    }

    /// Arrest timer normalized to the arrest limit
    pub fn arrest_value(&self, vars: &PursuitVariables) -> f32 {
        if self.is_busted() {
            return 1.0;
        }
        (self.timers.arrest / vars.arrest_limit).clamp(0.0, 1.0)
    }

    /// Evade timer normalized to the evade limit
    pub fn evade_value(&self, vars: &PursuitVariables) -> f32 {
        (self.timers.evade / vars.evade_limit).clamp(0.0, 1.0)
    }

    /// Police may attempt a PIT maneuver on this vehicle
    pub fn pit_ready(&self) -> bool {
        self.mode >= 2 && self.timers.pit <= 0.0
    }

    /// Feed the sight filter for one tick
    ///
    /// `closest` is the nearer of the direct and lookahead distances to the
    /// nearest visible police unit, or `None` when none is visible.
    pub fn update_sight(&mut self, closest: Option<f32>, dt: f32, strictness: f32, coef: f32) {
        let delta = match closest {
            Some(distance) => {
                SIGHT_GAIN / distance.max(SIGHT_MIN_DISTANCE) * dt * strictness * coef
            }
            None => -SIGHT_DECAY_RATE * dt,
        };
        let value = self.sight_value + delta;
        self.sight_value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        self.police_visible = self.sight_value >= SIGHT_VISIBLE_THRESHOLD;
    }

    /// Record an infraction tag once, keeping first-seen order
    pub fn add_offense(&mut self, tag: &str) {
        if !self.offenses.iter().any(|offense| offense == tag) {
            self.offenses.push(tag.to_string());
        }
    }

    /// Queue a score bump for the next tick
    pub fn inject_score(&mut self, amount: f32) {
        self.add_score = Some(self.add_score.unwrap_or(0.0) + amount);
    }

    pub fn has_pending_escalation(&self) -> bool {
        self.scheduled
            .iter()
            .any(|s| matches!(s.action, DeferredAction::SetMode { .. }))
    }

    /// Advance queued actions, returning the ones that are due
    pub fn take_due_actions(&mut self, dt: f32) -> Vec<DeferredAction> {
        let mut due = Vec::new();
        self.scheduled.retain_mut(|scheduled| {
            scheduled.delay -= dt;
            if scheduled.delay <= 0.0 {
                due.push(scheduled.action);
                false
            } else {
                true
            }
        });
        due
    }

    /// Clear everything tied to a single pursuit
    pub fn clear_pursuit(&mut self) {
        self.score = 0.0;
        self.police_attack = false;
        self.timers = PursuitTimers::default();
        self.roadblock_pos = None;
        self.roadblock_near = false;
        self.roadblocks = 0;
        self.target_id = None;
        self.offenses.clear();
        self.scheduled.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = PursuitState::new();
        assert_eq!(state.mode, MODE_NONE);
        assert_eq!(state.timers.pit, PIT_COOLDOWN);
        assert!(!state.police_visible);
    }

    #[test]
    fn test_derived_values() {
        let vars = PursuitVariables::default();
        let mut state = PursuitState::new();
        state.mode = 1;
        state.timers.arrest = 2.5;
        state.timers.evade = 90.0;
        assert_eq!(state.arrest_value(&vars), 0.5);
        assert_eq!(state.evade_value(&vars), 1.0);

        state.timers.arrest = -3.0;
        assert_eq!(state.arrest_value(&vars), 0.0);
        state.mode = MODE_BUSTED;
        assert_eq!(state.arrest_value(&vars), 1.0);
    }

    #[test]
    fn test_sight_rises_and_decays() {
        let mut state = PursuitState::new();
        state.update_sight(Some(40.0), 0.1, 0.5, 2.0);
        assert!((state.sight_value - 0.25).abs() < 1e-5);
        assert!(!state.police_visible);

        state.update_sight(Some(10.0), 0.1, 0.5, 2.0);
        assert_eq!(state.sight_value, 1.0);
        assert!(state.police_visible);

        state.update_sight(None, 6.0, 0.5, 2.0);
        assert!((state.sight_value - 0.4).abs() < 1e-5);
        assert!(!state.police_visible);
    }

    #[test]
    fn test_sight_clamped() {
        let mut state = PursuitState::new();
        state.update_sight(Some(0.0), 10.0, 1.0, 5.0);
        assert_eq!(state.sight_value, 1.0);
        state.update_sight(None, 100.0, 1.0, 5.0);
        assert_eq!(state.sight_value, 0.0);
    }

    #[test]
    fn test_offenses_deduplicated() {
        let mut state = PursuitState::new();
        state.add_offense("speeding");
        state.add_offense("collision");
        state.add_offense("speeding");
        assert_eq!(state.offenses, vec!["speeding", "collision"]);
    }

    #[test]
    fn test_inject_score_accumulates() {
        let mut state = PursuitState::new();
        state.inject_score(10.0);
        state.inject_score(5.0);
        assert_eq!(state.add_score, Some(15.0));
    }

    #[test]
    fn test_scheduled_actions_fire_once() {
        let mut state = PursuitState::new();
        state.scheduled.push(ScheduledAction {
            delay: 0.5,
            action: DeferredAction::SetMode { mode: 1, police: None },
        });
        assert!(state.has_pending_escalation());
        assert!(state.take_due_actions(0.3).is_empty());
        assert_eq!(state.take_due_actions(0.3).len(), 1);
        assert!(!state.has_pending_escalation());
        assert!(state.take_due_actions(1.0).is_empty());
    }
}
