//! Random suspect scheduler
//!
//! While no pursuit-worthy suspect exists, a countdown runs. Once it expires
//! the next eligible vehicle that resets becomes a suspect.

use rand::Rng;

use crate::core::config::PursuitVariables;
use crate::core::types::VehicleId;

/// Base delay before the first random suspect (seconds)
pub const DEFAULT_SUSPECT_DELAY: f32 = 60.0;
/// Added to the base delay each time an AI suspect escapes
pub const SUSPECT_DELAY_GROWTH: f32 = 30.0;
pub const MAX_SUSPECT_DELAY: f32 = 300.0;
/// Upper bound of the random jitter added when arming (seconds)
pub const SUSPECT_JITTER: f32 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SuspectScheduler {
    /// Current suspect, if any
    suspect: Option<VehicleId>,
    /// Explicitly marked active without a known vehicle
    active: bool,
    /// Countdown; `f32::INFINITY` means not scheduled
    timer: f32,
    base_delay: f32,
}

impl Default for SuspectScheduler {
    fn default() -> Self {
        Self {
            suspect: None,
            active: false,
            timer: f32::INFINITY,
            base_delay: DEFAULT_SUSPECT_DELAY,
        }
    }
}

impl SuspectScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active || self.suspect.is_some()
    }

    pub fn suspect(&self) -> Option<VehicleId> {
        self.suspect
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn base_delay(&self) -> f32 {
        self.base_delay
    }

    pub fn is_scheduled(&self) -> bool {
        self.timer.is_finite()
    }

    /// Countdown has run out and no suspect is active
    pub fn is_ready(&self) -> bool {
        !self.is_active() && self.timer <= 0.0
    }

    /// Advance the countdown, arming it when it is idle
    pub fn update<R: Rng>(
        &mut self,
        dt: f32,
        vars: &PursuitVariables,
        random_events: bool,
        player_is_police: bool,
        rng: &mut R,
    ) {
        if self.is_active() {
            return;
        }
        if !random_events || vars.suspect_frequency <= 0.0 {
            self.timer = f32::INFINITY;
            return;
        }

        if self.timer.is_infinite() {
            let delay = self.next_delay(vars, player_is_police, rng);
            tracing::debug!("Suspect timer armed for {:.1}s", delay);
            self.timer = delay;
        } else {
            self.timer = (self.timer - dt).max(0.0);
        }
    }

    /// `lerp(base_delay, 0, frequency) + jitter`, doubled for non-police players
    pub fn next_delay<R: Rng>(
        &self,
        vars: &PursuitVariables,
        player_is_police: bool,
        rng: &mut R,
    ) -> f32 {
        let frequency = vars.suspect_frequency.clamp(0.0, 1.0);
        let mut delay = self.base_delay * (1.0 - frequency) + rng.gen_range(0.0..SUSPECT_JITTER);
        if !player_is_police {
            delay *= 2.0;
        }
        delay
    }

    /// Force the countdown to a specific value
    pub fn arm(&mut self, delay: f32) {
        self.timer = delay.max(0.0);
    }

    /// Mark a vehicle as the active suspect and stop the countdown
    pub fn activate(&mut self, id: VehicleId) {
        self.suspect = Some(id);
        self.active = true;
        self.timer = f32::INFINITY;
    }

    /// Forget the active suspect; the countdown rearms on the next update
    pub fn clear_suspect(&mut self) {
        self.suspect = None;
        self.active = false;
        self.timer = f32::INFINITY;
    }

    /// Make repeat suspects rarer after an AI escapes
    pub fn on_ai_evaded(&mut self) {
        self.base_delay = (self.base_delay + SUSPECT_DELAY_GROWTH).min(MAX_SUSPECT_DELAY);
    }

    /// Back to idle without touching the learned base delay
    pub fn reset_idle(&mut self) {
        self.clear_suspect();
    }

    /// Full reset, used at session end
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
