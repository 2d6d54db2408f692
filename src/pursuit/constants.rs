//! Pursuit tuning constants that are not exposed through `PursuitVariables`

// Sight filter
pub const SIGHT_GAIN: f32 = 100.0;
pub const SIGHT_COEF_PURSUING: f32 = 5.0;
pub const SIGHT_COEF_IDLE: f32 = 2.0;
pub const SIGHT_DECAY_RATE: f32 = 0.1;
pub const SIGHT_VISIBLE_THRESHOLD: f32 = 0.5;
/// Keeps the sight gain finite when police sit on top of the target
pub const SIGHT_MIN_DISTANCE: f32 = 1.0;

// Score
pub const SCORE_SPEED_CAP: f32 = 10.0;
pub const SCORE_RATE: f32 = 2.0;
/// Speed at which the post-arrest cooldown lifts
pub const COOLDOWN_CLEAR_SPEED: f32 = 6.0;

// Escalation from mode 0 waits for lights and sirens
pub const ESCALATION_DELAY_FACTOR: f32 = 5.0;
pub const MAX_ESCALATION_DELAY: f32 = 1.0;

// PIT maneuver gating
pub const PIT_COOLDOWN: f32 = 30.0;

// Arrest
pub const FALLBACK_ARREST_DISTANCE: f32 = 5.0;
pub const ARREST_MAX_TARGET_SPEED: f32 = 2.5;
pub const ARREST_MAX_POLICE_SPEED: f32 = 9.0;
/// Countdown value at which a busted vehicle is released
pub const RELEASE_COUNTDOWN: f32 = -5.0;

// Roadblocks
pub const ROADBLOCK_RETRY_DELAY: f32 = 1.0;
pub const ROADBLOCK_SINGLE_UNIT_PENALTY: f32 = 20.0;
/// A previous roadblock closer than this is still considered current
pub const ROADBLOCK_REUSE_DISTANCE: f32 = 100.0;
pub const ROADBLOCK_NEAR_DISTANCE: f32 = 20.0;
pub const ROADBLOCK_MIN_RADIUS: f32 = 150.0;
pub const ROADBLOCK_MAX_RADIUS: f32 = 400.0;
pub const ROADBLOCK_MAX_ANGLE: f32 = 30.0;
/// Roadblock countdown only runs while evade pressure is below this
pub const ROADBLOCK_EVADE_PRESSURE: f32 = 0.5;
pub const ROADBLOCK_TIGHT_SPARE: f32 = 2.0;
pub const ROADBLOCK_GENEROUS_SPARE: f32 = 6.0;
/// Chance that a tight roadblock leans toward the road-rule side
pub const ROADBLOCK_SIDE_BIAS: f64 = 0.75;
