//! Roadblocks: layout geometry and the static prop registry

pub mod geometry;
pub mod props;

pub use geometry::{
    compute_placement, rotation_from_basis, select_fitting_subset, Footprint, FootprintAxis,
    Placement,
};
pub use props::RoadblockProps;
