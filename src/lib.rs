//! Police Pursuit - pursuit simulation core for traffic police

pub mod core;
pub mod host;
pub mod police;
pub mod pursuit;
pub mod roadblock;
pub mod sandbox;
pub mod suspect;
