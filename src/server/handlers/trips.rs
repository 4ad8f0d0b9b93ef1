use axum::{
    extract::{Extension, Path, Query},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::DynAPI,
    auth::Principal,
    entities::{Profile, Trip, TripRequest, TripStatusView},
    error::Error,
};

pub async fn create(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Json(request): Json<TripRequest>,
) -> Result<Json<Trip>, Error> {
    let trip = api.create_trip(principal, request).await?;

    Ok(trip.into())
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    stats: Option<String>,
}

/// Plain GET lists the caller's trips with their in-progress/completed
/// headline counts; `?stats=monthly` switches the response to the
/// caller's completed-trip counts per month.
pub async fn list(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Query(params): Query<ListParams>,
) -> Result<Response, Error> {
    match params.stats.as_deref() {
        None => Ok(Json(api.list_trips(principal).await?).into_response()),
        Some("monthly") => Ok(Json(api.monthly_stats(principal).await?).into_response()),
        Some(other) => Err(Error::Validation(format!(
            "unsupported stats window: {}",
            other
        ))),
    }
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.find_trip(principal, id).await?;

    Ok(trip.into())
}

pub async fn status(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<TripStatusView>, Error> {
    let view = api.trip_status(principal, id).await?;

    Ok(view.into())
}

pub async fn eligible_drivers(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Profile>>, Error> {
    let drivers = api.eligible_drivers(principal, id).await?;

    Ok(drivers.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.accept_trip(principal, id).await?;

    Ok(trip.into())
}

pub async fn start(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.start_trip(principal, id).await?;

    Ok(trip.into())
}

pub async fn complete(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, Error> {
    let trip = api.complete_trip(principal, id).await?;

    Ok(trip.into())
}

#[derive(Debug, Deserialize)]
pub struct CancelParams {
    reason: Option<String>,
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
    params: Option<Json<CancelParams>>,
) -> Result<Json<Trip>, Error> {
    let reason = params.and_then(|Json(params)| params.reason);

    let trip = api.cancel_trip(principal, id, reason).await?;

    Ok(trip.into())
}

#[derive(Debug, Deserialize)]
pub struct RateParams {
    rating: u8,
}

pub async fn rate(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(params): Json<RateParams>,
) -> Result<Json<Trip>, Error> {
    let trip = api.rate_trip(principal, id, params.rating).await?;

    Ok(trip.into())
}
