use super::helpers::{
    fetch_payment_for_update, fetch_trip_for_update, insert_payment, unique_order_reference,
    update_payment,
};
use super::Engine;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::PaymentAPI,
    auth::{Platform, Principal},
    entities::{Payment, PaymentStatus},
    error::Error,
};

#[async_trait]
impl PaymentAPI for Engine {
    /// Operator-created payment, the manual settlement valve for trips
    /// whose charge diverges from the automatic completion settlement.
    #[tracing::instrument(skip(self))]
    async fn create_payment(
        &self,
        principal: Principal,
        trip_id: Uuid,
        amount_paid: Decimal,
    ) -> Result<Payment, Error> {
        self.authorize(principal, "create_payment", Platform::default())?;

        if amount_paid.is_sign_negative() {
            return Err(Error::Validation(
                "amount_paid must not be negative".to_string(),
            ));
        }

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let trip = fetch_trip_for_update(&mut tx, &trip_id).await?;

        let driver_id = trip.driver_id.ok_or_else(|| {
            Error::Validation("trip has no driver to pay".to_string())
        })?;

        let reference = unique_order_reference(&mut tx).await?;
        let payment = Payment::new(trip.id, driver_id, amount_paid, reference);

        insert_payment(&mut tx, &payment).await?;

        tx.commit().await?;

        Ok(payment)
    }

    #[tracing::instrument(skip(self))]
    async fn find_payment(&self, principal: Principal, id: Uuid) -> Result<Payment, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(payment): Json<Payment> = conn
            .fetch_optional(sqlx::query("SELECT data FROM payments WHERE id = $1").bind(&id))
            .await?
            .ok_or(Error::NotFound)?
            .try_get("data")?;

        self.authorize(principal, "read", payment.clone())?;

        Ok(payment)
    }

    #[tracing::instrument(skip(self))]
    async fn update_payment(
        &self,
        principal: Principal,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Payment, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut payment = fetch_payment_for_update(&mut tx, &id).await?;

        self.authorize(principal, "update", payment.clone())?;

        payment.transition(status)?;

        update_payment(&mut tx, &payment).await?;

        tx.commit().await?;

        Ok(payment)
    }
}
