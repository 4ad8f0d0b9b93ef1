pub mod directory;
pub mod payments;
pub mod trips;
