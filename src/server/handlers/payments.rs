use axum::{
    extract::{Extension, Path},
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::DynAPI,
    auth::Principal,
    entities::{Payment, PaymentStatus},
    error::Error,
};

#[derive(Debug, Deserialize)]
pub struct CreateParams {
    trip_id: Uuid,
    amount_paid: Decimal,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Json(params): Json<CreateParams>,
) -> Result<Json<Payment>, Error> {
    let payment = api
        .create_payment(principal, params.trip_id, params.amount_paid)
        .await?;

    Ok(payment.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, Error> {
    let payment = api.find_payment(principal, id).await?;

    Ok(payment.into())
}

#[derive(Debug, Deserialize)]
pub struct UpdateParams {
    status: PaymentStatus,
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateParams>,
) -> Result<Json<Payment>, Error> {
    let payment = api.update_payment(principal, id, params.status).await?;

    Ok(payment.into())
}
