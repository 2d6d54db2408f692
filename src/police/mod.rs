pub mod roster;

pub use roster::{NearestPolice, PoliceContact, PoliceRoster, PoliceUnit, LOOKAHEAD_SECONDS};
