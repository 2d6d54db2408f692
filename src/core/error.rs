use thiserror::Error;

use crate::core::types::VehicleId;

#[derive(Error, Debug)]
pub enum PursuitError {
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(VehicleId),

    #[error("Vehicle is not tracked by traffic: {0}")]
    NotTracked(VehicleId),

    #[error("Vehicle {0} cannot pursue itself")]
    SelfTarget(VehicleId),

    #[error("Police unit cannot be made a suspect: {0}")]
    PoliceTarget(VehicleId),

    #[error("Prop already registered: {0}")]
    DuplicateProp(VehicleId),

    #[error("Traffic vehicle cannot be used as a prop: {0}")]
    PropIsTrafficVehicle(VehicleId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, PursuitError>;
