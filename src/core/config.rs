//! Pursuit tuning variables
//!
//! One `PursuitVariables` value lives in each `PursuitSubsystem`. It starts
//! from defaults, can be replaced wholesale or merged field by field, and is
//! reset when the session ends.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{PursuitError, Result};

/// Tunable configuration read by the pursuit coordinator every tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitVariables {
    /// Score thresholds for pursuit levels 1, 2 and 3 (ascending)
    pub score_levels: [f32; 3],

    /// How quickly police notice and score a vehicle (0.0 to 1.0)
    ///
    /// Scales both the sight filter and passive score accrual.
    pub strictness: f32,

    /// Seconds of qualifying arrest conditions before a vehicle is busted
    pub arrest_limit: f32,

    /// Distance from police within which an arrest can happen (world units)
    pub arrest_radius: f32,

    /// Seconds without police contact before a vehicle escapes
    pub evade_limit: f32,

    /// Police beyond this distance never count as in contact (world units)
    pub evade_radius: f32,

    /// How often random suspects appear (0.0 disables them)
    pub suspect_frequency: f32,

    /// How often roadblocks are attempted at pursuit level 3 (0.0 to 1.0)
    pub roadblock_frequency: f32,

    /// Release busted vehicles automatically after a short countdown
    pub auto_release: bool,
}

impl Default for PursuitVariables {
    fn default() -> Self {
        Self {
            score_levels: [100.0, 500.0, 2000.0],
            strictness: 0.5,
            arrest_limit: 5.0,
            arrest_radius: 15.0,
            evade_limit: 45.0,
            evade_radius: 80.0,
            suspect_frequency: 0.5,
            roadblock_frequency: 0.5,
            auto_release: true,
        }
    }
}

impl PursuitVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score threshold for a pursuit level in 1..=3
    pub fn score_level(&self, mode: i8) -> Option<f32> {
        let index = usize::try_from(mode).ok()?.checked_sub(1)?;
        self.score_levels.get(index).copied()
    }

    /// Seconds between roadblock attempts
    pub fn roadblock_interval(&self) -> f32 {
        (60.0 - self.roadblock_frequency * 60.0).max(10.0)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.score_levels.iter().any(|level| !level.is_finite() || *level < 0.0) {
            return Err(PursuitError::InvalidConfig(format!(
                "score_levels must be finite and non-negative: {:?}",
                self.score_levels
            )));
        }
        if self.score_levels.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(PursuitError::InvalidConfig(format!(
                "score_levels must be strictly ascending: {:?}",
                self.score_levels
            )));
        }
        if self.arrest_limit <= 0.0 || self.evade_limit <= 0.0 {
            return Err(PursuitError::InvalidConfig(format!(
                "arrest_limit ({}) and evade_limit ({}) must be positive",
                self.arrest_limit, self.evade_limit
            )));
        }
        if self.arrest_radius < 0.0 || self.evade_radius < 0.0 {
            return Err(PursuitError::InvalidConfig(format!(
                "arrest_radius ({}) and evade_radius ({}) must not be negative",
                self.arrest_radius, self.evade_radius
            )));
        }
        Ok(())
    }

    /// Copy with ratio fields clamped to [0, 1]
    pub fn sanitized(mut self) -> Self {
        self.strictness = self.strictness.clamp(0.0, 1.0);
        self.suspect_frequency = self.suspect_frequency.clamp(0.0, 1.0);
        self.roadblock_frequency = self.roadblock_frequency.clamp(0.0, 1.0);
        self
    }

    /// Parse variables from TOML, missing keys take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let vars: PursuitVariables = toml::from_str(contents)?;
        let vars = vars.sanitized();
        vars.validate()?;
        Ok(vars)
    }

    /// Load variables from a TOML tuning file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

/// Partial update for `PursuitVariables`; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitVariablesPatch {
    pub score_levels: Option<[f32; 3]>,
    pub strictness: Option<f32>,
    pub arrest_limit: Option<f32>,
    pub arrest_radius: Option<f32>,
    pub evade_limit: Option<f32>,
    pub evade_radius: Option<f32>,
    pub suspect_frequency: Option<f32>,
    pub roadblock_frequency: Option<f32>,
    pub auto_release: Option<bool>,
}

impl PursuitVariablesPatch {
    /// Build a patch from an untyped value
    ///
    /// Returns `Ok(None)` for anything that is not an object.
    pub fn from_json(value: &serde_json::Value) -> Result<Option<Self>> {
        if !value.is_object() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(value.clone())?))
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge into `base`, producing a new validated configuration
    pub fn apply_to(&self, base: &PursuitVariables) -> Result<PursuitVariables> {
        let mut vars = base.clone();
        if let Some(levels) = self.score_levels {
            vars.score_levels = levels;
        }
        if let Some(v) = self.strictness {
            vars.strictness = v;
        }
        if let Some(v) = self.arrest_limit {
            vars.arrest_limit = v;
        }
        if let Some(v) = self.arrest_radius {
            vars.arrest_radius = v;
        }
        if let Some(v) = self.evade_limit {
            vars.evade_limit = v;
        }
        if let Some(v) = self.evade_radius {
            vars.evade_radius = v;
        }
        if let Some(v) = self.suspect_frequency {
            vars.suspect_frequency = v;
        }
        if let Some(v) = self.roadblock_frequency {
            vars.roadblock_frequency = v;
        }
        if let Some(v) = self.auto_release {
            vars.auto_release = v;
        }
        let vars = vars.sanitized();
        vars.validate()?;
        Ok(vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_are_valid() {
        let vars = PursuitVariables::default();
        assert!(vars.validate().is_ok());
        assert_eq!(vars.score_levels, [100.0, 500.0, 2000.0]);
        assert!(vars.auto_release);
    }

    #[test]
    fn test_score_level_lookup() {
        let vars = PursuitVariables::default();
        assert_eq!(vars.score_level(1), Some(100.0));
        assert_eq!(vars.score_level(3), Some(2000.0));
        assert_eq!(vars.score_level(0), None);
        assert_eq!(vars.score_level(-1), None);
        assert_eq!(vars.score_level(4), None);
    }

    #[test]
    fn test_roadblock_interval_floor() {
        let mut vars = PursuitVariables::default();
        assert_eq!(vars.roadblock_interval(), 30.0);
        vars.roadblock_frequency = 1.0;
        assert_eq!(vars.roadblock_interval(), 10.0);
        vars.roadblock_frequency = 0.0;
        assert_eq!(vars.roadblock_interval(), 60.0);
    }

    #[test]
    fn test_descending_levels_rejected() {
        let vars = PursuitVariables {
            score_levels: [500.0, 100.0, 2000.0],
            ..Default::default()
        };
        assert!(vars.validate().is_err());
    }

    #[test]
    fn test_patch_only_overwrites_present_fields() {
        let base = PursuitVariables::default();
        let patch = PursuitVariablesPatch {
            strictness: Some(0.9),
            auto_release: Some(false),
            ..Default::default()
        };
        let merged = patch.apply_to(&base).unwrap();
        assert_eq!(merged.strictness, 0.9);
        assert!(!merged.auto_release);
        assert_eq!(merged.arrest_limit, base.arrest_limit);
        assert_eq!(merged.score_levels, base.score_levels);
    }

    #[test]
    fn test_patch_clamps_ratios() {
        let patch = PursuitVariablesPatch {
            strictness: Some(4.0),
            suspect_frequency: Some(-1.0),
            ..Default::default()
        };
        let merged = patch.apply_to(&PursuitVariables::default()).unwrap();
        assert_eq!(merged.strictness, 1.0);
        assert_eq!(merged.suspect_frequency, 0.0);
    }

    #[test]
    fn test_invalid_patch_rejected() {
        let patch = PursuitVariablesPatch {
            arrest_limit: Some(0.0),
            ..Default::default()
        };
        assert!(patch.apply_to(&PursuitVariables::default()).is_err());
    }

    #[test]
    fn test_patch_from_non_object_is_none() {
        assert!(PursuitVariablesPatch::from_json(&json!(5)).unwrap().is_none());
        assert!(PursuitVariablesPatch::from_json(&json!("strict")).unwrap().is_none());
        assert!(PursuitVariablesPatch::from_json(&json!([1, 2])).unwrap().is_none());
    }

    #[test]
    fn test_patch_from_object() {
        let patch = PursuitVariablesPatch::from_json(&json!({ "evade_limit": 30.0 }))
            .unwrap()
            .unwrap();
        assert_eq!(patch.evade_limit, Some(30.0));
        assert!(patch.strictness.is_none());
    }

    #[test]
    fn test_from_toml_partial() {
        let vars = PursuitVariables::from_toml_str(
            r#"
            strictness = 0.8
            score_levels = [50.0, 250.0, 1000.0]
            "#,
        )
        .unwrap();
        assert_eq!(vars.strictness, 0.8);
        assert_eq!(vars.score_levels, [50.0, 250.0, 1000.0]);
        assert_eq!(vars.evade_radius, 80.0);
    }
}
