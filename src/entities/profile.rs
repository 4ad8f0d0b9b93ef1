use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::VehicleClass;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Driver,
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Driver => "driver",
            Self::Operator => "operator",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "driver" => Ok(Self::Driver),
            "operator" => Ok(Self::Operator),
            other => Err(crate::error::Error::Validation(format!(
                "unknown role: {other}"
            ))),
        }
    }
}

/// A directory entry mirroring the external identity provider. The engine
/// only ever reads these; rows arrive through the profile sync operation
/// and acceptance statistics are computed upstream.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct Profile {
    pub id: Uuid,
    pub role: Role,
    #[validate(email)]
    pub email: String,
    pub verified: bool,
    pub vehicle_type: Option<VehicleClass>,
    pub accepted_trips: i32,
    pub total_trips: i32,
}

impl Profile {
    /// Share of offered trips this driver accepted, as a fraction in
    /// [0, 1]. Used only as a read input to dispatch decisions.
    pub fn acceptance_rate(&self) -> Option<Decimal> {
        if self.total_trips <= 0 {
            return None;
        }

        Some(Decimal::from(self.accepted_trips) / Decimal::from(self.total_trips))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn driver() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            role: Role::Driver,
            email: "driver@example.com".into(),
            verified: true,
            vehicle_type: Some(VehicleClass::TwoTon),
            accepted_trips: 3,
            total_trips: 4,
        }
    }

    #[test]
    fn acceptance_rate_is_a_fraction_of_offers() {
        assert_eq!(driver().acceptance_rate(), Some(dec!(0.75)));
    }

    #[test]
    fn acceptance_rate_is_undefined_without_offers() {
        let mut fresh = driver();
        fresh.accepted_trips = 0;
        fresh.total_trips = 0;

        assert_eq!(fresh.acceptance_rate(), None);
    }
}
