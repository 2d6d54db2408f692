//! Pursuit coordination
//!
//! `PursuitSubsystem` owns all per-session state. Mode transitions, the
//! per-tick update, roadblocks, lifecycle hooks and persistence are split
//! across the submodules as separate `impl` blocks.

pub mod constants;
pub mod events;
pub mod lifecycle;
pub mod mode;
pub mod persistence;
pub mod roadblock;
pub mod state;
pub mod subsystem;
pub mod tick;

pub use events::{PursuitActionKind, PursuitEvent, PursuitSnapshot};
pub use persistence::PersistedState;
pub use roadblock::RoadblockSkip;
pub use state::{DeferredAction, PursuitState, PursuitTimers, ScheduledAction};
pub use subsystem::PursuitSubsystem;
