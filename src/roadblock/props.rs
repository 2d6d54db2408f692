//! Registry of static props usable as roadblock obstacles

use serde::{Deserialize, Serialize};

use crate::core::error::{PursuitError, Result};
use crate::core::types::VehicleId;
use crate::host::{TrafficControl, VehicleQuery};
use crate::roadblock::geometry::Footprint;

/// Ordered set of prop ids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadblockProps {
    ids: Vec<VehicleId>,
    /// Props only join roadblocks while active
    active: bool,
}

impl RoadblockProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prop. It must exist, be unique and not be a traffic vehicle.
    pub fn add<H>(&mut self, host: &H, id: VehicleId) -> Result<()>
    where
        H: VehicleQuery + TrafficControl + ?Sized,
    {
        if host.vehicle(id).is_none() {
            return Err(PursuitError::VehicleNotFound(id));
        }
        if self.ids.contains(&id) {
            return Err(PursuitError::DuplicateProp(id));
        }
        if host.is_tracked(id) {
            return Err(PursuitError::PropIsTrafficVehicle(id));
        }
        self.ids.push(id);
        Ok(())
    }

    /// Unregister a prop, returns false if it was not registered
    pub fn remove(&mut self, id: VehicleId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|&prop| prop != id);
        self.ids.len() != before
    }

    pub fn contains(&self, id: VehicleId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[VehicleId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Show or hide every registered prop
    pub fn activate<H>(&mut self, host: &mut H, active: bool)
    where
        H: TrafficControl + ?Sized,
    {
        for &id in &self.ids {
            host.set_vehicle_active(id, active);
        }
        self.active = active;
    }

    /// Hide every prop and forget them
    pub fn reset<H>(&mut self, host: &mut H)
    where
        H: TrafficControl + ?Sized,
    {
        self.activate(host, false);
        self.ids.clear();
    }

    /// Replace the id list verbatim (used when restoring a save)
    pub fn replace(&mut self, ids: Vec<VehicleId>) {
        self.ids = ids;
    }

    /// Footprints of every prop the host still knows about
    pub fn footprints<H>(&self, host: &H) -> Vec<Footprint>
    where
        H: VehicleQuery + ?Sized,
    {
        self.ids
            .iter()
            .filter_map(|&id| host.vehicle(id))
            .map(|info| Footprint::new(info.id, info.extents).with_ref_offset(info.ref_offset))
            .collect()
    }
}
