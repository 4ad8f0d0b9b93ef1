use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Principal;
use crate::entities::{
    MonthlyCount, Payment, PaymentStatus, Profile, Trip, TripList, TripRequest, TripStatusView,
};
use crate::error::Error;

#[async_trait]
pub trait TripAPI {
    async fn create_trip(&self, principal: Principal, request: TripRequest)
        -> Result<Trip, Error>;

    async fn find_trip(&self, principal: Principal, id: Uuid) -> Result<Trip, Error>;

    async fn list_trips(&self, principal: Principal) -> Result<TripList, Error>;

    async fn trip_status(&self, principal: Principal, id: Uuid) -> Result<TripStatusView, Error>;

    async fn accept_trip(&self, principal: Principal, id: Uuid) -> Result<Trip, Error>;

    async fn start_trip(&self, principal: Principal, id: Uuid) -> Result<Trip, Error>;

    async fn complete_trip(&self, principal: Principal, id: Uuid) -> Result<Trip, Error>;

    async fn cancel_trip(
        &self,
        principal: Principal,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Trip, Error>;

    async fn rate_trip(&self, principal: Principal, id: Uuid, rating: u8) -> Result<Trip, Error>;

    async fn monthly_stats(&self, principal: Principal) -> Result<Vec<MonthlyCount>, Error>;
}

#[async_trait]
pub trait PaymentAPI {
    async fn create_payment(
        &self,
        principal: Principal,
        trip_id: Uuid,
        amount_paid: Decimal,
    ) -> Result<Payment, Error>;

    async fn find_payment(&self, principal: Principal, id: Uuid) -> Result<Payment, Error>;

    async fn update_payment(
        &self,
        principal: Principal,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Payment, Error>;
}

#[async_trait]
pub trait DispatchAPI {
    async fn eligible_drivers(
        &self,
        principal: Principal,
        trip_id: Uuid,
    ) -> Result<Vec<Profile>, Error>;

    async fn sync_profile(&self, principal: Principal, profile: Profile)
        -> Result<Profile, Error>;
}

pub trait API: TripAPI + PaymentAPI + DispatchAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
