//! Save and restore of session configuration
//!
//! Only the tuning variables and the prop list are persisted. The police
//! roster is rebuilt from role data after loading.

use serde::{Deserialize, Serialize};

use crate::core::config::PursuitVariables;
use crate::core::error::Result;
use crate::core::types::VehicleId;
use crate::pursuit::subsystem::PursuitSubsystem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub variables: PursuitVariables,
    pub prop_ids: Vec<VehicleId>,
}

impl PursuitSubsystem {
    pub fn save(&self) -> PersistedState {
        PersistedState {
            variables: self.variables.clone(),
            prop_ids: self.props.ids().to_vec(),
        }
    }

    /// Replace the current configuration and prop list with a saved one
    pub fn restore(&mut self, state: PersistedState) -> Result<()> {
        state.variables.validate()?;
        self.variables = state.variables;
        self.props.replace(state.prop_ids);
        tracing::info!("Restored pursuit state ({} props)", self.props.len());
        Ok(())
    }

    pub fn save_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.save())?)
    }

    pub fn restore_json(&mut self, json: &str) -> Result<()> {
        let state: PersistedState = serde_json::from_str(json)?;
        self.restore(state)
    }
}
