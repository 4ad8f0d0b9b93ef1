use chrono::{DateTime, Utc};
use oso::PolarClass;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::ContactPoint;
use crate::error::Error;

/// The vehicle classes a trip may require and a driver may operate.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum VehicleClass {
    #[serde(rename = "bakkie")]
    Bakkie,
    #[serde(rename = "1_ton_truck")]
    OneTon,
    #[serde(rename = "1.5_ton_truck")]
    OneAndHalfTon,
    #[serde(rename = "2_ton_truck")]
    TwoTon,
    #[serde(rename = "4_ton_truck")]
    FourTon,
    #[serde(rename = "8_ton_truck")]
    EightTon,
}

impl VehicleClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bakkie => "bakkie",
            Self::OneTon => "1_ton_truck",
            Self::OneAndHalfTon => "1.5_ton_truck",
            Self::TwoTon => "2_ton_truck",
            Self::FourTon => "4_ton_truck",
            Self::EightTon => "8_ton_truck",
        }
    }
}

impl std::str::FromStr for VehicleClass {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bakkie" => Ok(Self::Bakkie),
            "1_ton_truck" => Ok(Self::OneTon),
            "1.5_ton_truck" => Ok(Self::OneAndHalfTon),
            "2_ton_truck" => Ok(Self::TwoTon),
            "4_ton_truck" => Ok(Self::FourTon),
            "8_ton_truck" => Ok(Self::EightTon),
            other => Err(Error::Validation(format!(
                "unknown vehicle class: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Status {
    Requested,
    Accepted,
    InProgress,
    Completed {
        completed_at: DateTime<Utc>,
    },
    Cancelled {
        cancelled_by: Party,
        reason: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    User,
    Driver,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Accepted => "ACCEPTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed { .. } => "COMPLETED",
            Self::Cancelled { .. } => "CANCELLED",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub status: Status,
    pub user_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup: ContactPoint,
    pub dropoff: ContactPoint,
    pub pickup_time: DateTime<Utc>,
    pub cargo_description: String,
    pub vehicle_type: VehicleClass,
    pub bid: Decimal,
    pub floor_count: u32,
    pub rating: Option<u8>,
    pub created: DateTime<Utc>,
}

/// Payload for trip creation. Validated at the handler edge before the
/// engine ever sees it.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct TripRequest {
    #[validate]
    pub pickup: ContactPoint,
    #[validate]
    pub dropoff: ContactPoint,
    pub pickup_time: DateTime<Utc>,
    #[validate(length(min = 1, max = 500))]
    pub cargo_description: String,
    pub vehicle_type: VehicleClass,
    #[validate(custom = "validate_bid")]
    pub bid: Decimal,
    pub floor_count: u32,
}

fn validate_bid(bid: &Decimal) -> Result<(), ValidationError> {
    if bid.is_sign_negative() {
        return Err(ValidationError::new("bid must not be negative"));
    }

    Ok(())
}

/// Read-only projection served by `GET /trips/{id}/status`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripStatusView {
    pub id: Uuid,
    pub status: String,
    pub vehicle_type: VehicleClass,
    pub driver_id: Option<Uuid>,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub pickup_time: DateTime<Utc>,
    pub cargo_description: String,
    pub rating: Option<u8>,
}

/// Listing payload: the visible trips plus the headline counts shown
/// alongside them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripList {
    pub trips: Vec<Trip>,
    pub in_progress_count: usize,
    pub completed_count: usize,
}

impl TripList {
    pub fn new(trips: Vec<Trip>) -> Self {
        let in_progress_count = trips
            .iter()
            .filter(|trip| matches!(trip.status, Status::InProgress))
            .count();
        let completed_count = trips
            .iter()
            .filter(|trip| matches!(trip.status, Status::Completed { .. }))
            .count();

        Self {
            trips,
            in_progress_count,
            completed_count,
        }
    }
}

/// One bucket of the monthly completed-trip report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub month: String,
    pub completed_trips: i64,
}

impl Trip {
    pub fn new(user_id: Uuid, request: TripRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: Status::Requested,
            user_id,
            driver_id: None,
            pickup: request.pickup,
            dropoff: request.dropoff,
            pickup_time: request.pickup_time,
            cargo_description: request.cargo_description,
            vehicle_type: request.vehicle_type,
            bid: request.bid,
            floor_count: request.floor_count,
            rating: None,
            created: Utc::now(),
        }
    }

    pub fn is_requested(&self) -> bool {
        matches!(self.status, Status::Requested)
    }

    fn invalid_transition(&self, requested: &'static str) -> Error {
        Error::InvalidTransition {
            from: self.status.name(),
            requested,
        }
    }

    /// The in-memory half of the accept compare-and-swap: re-tests
    /// `status == REQUESTED && driver_id == NULL` and only then assigns.
    /// Callers must hold the row lock so the test and the write are one
    /// atomic unit.
    #[tracing::instrument]
    pub fn accept(&mut self, driver_id: Uuid) -> Result<(), Error> {
        match self.status {
            Status::Requested if self.driver_id.is_none() => {
                self.driver_id = Some(driver_id);
                self.status = Status::Accepted;
                Ok(())
            }
            Status::Requested | Status::Accepted | Status::InProgress | Status::Completed { .. } => {
                Err(Error::AlreadyAccepted)
            }
            Status::Cancelled { .. } => Err(self.invalid_transition("ACCEPTED")),
        }
    }

    #[tracing::instrument]
    pub fn start(&mut self) -> Result<(), Error> {
        match self.status {
            Status::Accepted => {
                self.status = Status::InProgress;
                Ok(())
            }
            _ => Err(self.invalid_transition("IN_PROGRESS")),
        }
    }

    #[tracing::instrument]
    pub fn complete(&mut self) -> Result<(), Error> {
        match self.status {
            Status::InProgress => {
                self.status = Status::Completed {
                    completed_at: Utc::now(),
                };
                Ok(())
            }
            _ => Err(self.invalid_transition("COMPLETED")),
        }
    }

    #[tracing::instrument]
    pub fn cancel(&mut self, cancelled_by: Party, reason: Option<String>) -> Result<(), Error> {
        match self.status {
            Status::Requested | Status::Accepted | Status::InProgress => {
                self.status = Status::Cancelled {
                    cancelled_by,
                    reason,
                };
                Ok(())
            }
            _ => Err(self.invalid_transition("CANCELLED")),
        }
    }

    #[tracing::instrument]
    pub fn rate(&mut self, rating: u8) -> Result<(), Error> {
        if rating > 5 {
            return Err(Error::Validation(
                "rating must be between 0 and 5".to_string(),
            ));
        }

        match self.status {
            Status::Completed { .. } => {
                if self.rating.is_some() {
                    return Err(Error::Validation("trip has already been rated".to_string()));
                }

                self.rating = Some(rating);
                Ok(())
            }
            _ => Err(Error::Validation(
                "rating can only be set on a completed trip".to_string(),
            )),
        }
    }

    pub fn status_view(&self) -> TripStatusView {
        TripStatusView {
            id: self.id,
            status: self.status.name().to_string(),
            vehicle_type: self.vehicle_type,
            driver_id: self.driver_id,
            pickup_address: self.pickup.address.clone(),
            dropoff_address: self.dropoff.address.clone(),
            pickup_time: self.pickup_time,
            cargo_description: self.cargo_description.clone(),
            rating: self.rating,
        }
    }
}

impl PolarClass for Trip {
    fn get_polar_class_builder() -> oso::ClassBuilder<Trip> {
        oso::Class::builder()
            .name("Trip")
            .add_attribute_getter("user_id", |recv: &Trip| recv.user_id)
            .add_attribute_getter("driver_id", |recv: &Trip| recv.driver_id)
            .add_attribute_getter("vehicle_type", |recv: &Trip| {
                recv.vehicle_type.as_str().to_string()
            })
    }

    fn get_polar_class() -> oso::Class {
        let builder = Trip::get_polar_class_builder();
        builder.build()
    }
}
