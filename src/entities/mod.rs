mod location;
mod payment;
mod profile;
mod trip;

pub use location::ContactPoint;
pub use payment::{order_reference, settle, Payment, PaymentStatus};
pub use profile::{Profile, Role};
pub use trip::{
    MonthlyCount, Party, Status, Trip, TripList, TripRequest, TripStatusView, VehicleClass,
};
