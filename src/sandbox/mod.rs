//! Self-contained host for scenarios, tests and the headless runner

pub mod world;

pub use world::{SandboxVehicle, SandboxWorld};
