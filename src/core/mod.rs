pub mod config;
pub mod error;
pub mod types;

pub use config::{PursuitVariables, PursuitVariablesPatch};
pub use error::{PursuitError, Result};
pub use types::{Role, RoleAction, RoleState, VehicleId};
