use serde::{Deserialize, Serialize};
use validator::Validate;

/// A pickup or dropoff point: a street address plus the phone number of
/// whoever hands the cargo over (or receives it) there.
#[derive(Clone, Debug, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct ContactPoint {
    #[validate(length(min = 1, max = 300))]
    pub address: String,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
}
