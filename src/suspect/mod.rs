//! Emergent random suspects

pub mod scheduler;

pub use scheduler::SuspectScheduler;
