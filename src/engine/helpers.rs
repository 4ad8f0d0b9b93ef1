use super::Database;

use rand::thread_rng;
use sqlx::{types::Json, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{
    entities::{order_reference, Payment, Trip},
    error::Error,
};

const REFERENCE_ATTEMPTS: usize = 8;

#[tracing::instrument(skip(tx))]
pub async fn fetch_trip_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Trip, Error> {
    let Json(trip): Json<Trip> = tx
        .fetch_optional(sqlx::query("SELECT data FROM trips WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or(Error::NotFound)?
        .try_get("data")?;

    Ok(trip)
}

#[tracing::instrument(skip(tx))]
pub async fn update_trip(tx: &mut Transaction<'_, Database>, trip: &Trip) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE trips SET status = $2, driver_id = $3, data = $4 WHERE id = $1")
            .bind(&trip.id)
            .bind(trip.status.name())
            .bind(&trip.driver_id)
            .bind(Json(trip)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx))]
pub async fn insert_payment(
    tx: &mut Transaction<'_, Database>,
    payment: &Payment,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "INSERT INTO payments (id, status, trip_id, driver_id, order_reference, data)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&payment.id)
        .bind(payment.status.name())
        .bind(&payment.trip_id)
        .bind(&payment.driver_id)
        .bind(&payment.order_reference)
        .bind(Json(payment)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_payment_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Payment, Error> {
    let Json(payment): Json<Payment> = tx
        .fetch_optional(
            sqlx::query("SELECT data FROM payments WHERE id = $1 FOR UPDATE").bind(id),
        )
        .await?
        .ok_or(Error::NotFound)?
        .try_get("data")?;

    Ok(payment)
}

#[tracing::instrument(skip(tx))]
pub async fn update_payment(
    tx: &mut Transaction<'_, Database>,
    payment: &Payment,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE payments SET status = $2, data = $3 WHERE id = $1")
            .bind(&payment.id)
            .bind(payment.status.name())
            .bind(Json(payment)),
    )
    .await?;

    Ok(())
}

/// Draws a bounded batch of order reference candidates, rules out the
/// ones already taken in one query, and picks the first free candidate.
/// The payments table's UNIQUE constraint remains the last line of
/// defence.
#[tracing::instrument(skip(tx))]
pub async fn unique_order_reference(
    tx: &mut Transaction<'_, Database>,
) -> Result<String, Error> {
    let candidates: Vec<String> = {
        let mut rng = thread_rng();
        (0..REFERENCE_ATTEMPTS)
            .map(|_| order_reference(&mut rng))
            .collect()
    };

    let rows = tx
        .fetch_all(
            sqlx::query("SELECT order_reference FROM payments WHERE order_reference = ANY($1)")
                .bind(&candidates),
        )
        .await?;

    let mut taken: Vec<String> = Vec::with_capacity(rows.len());

    for row in rows.iter() {
        taken.push(row.try_get("order_reference")?);
    }

    if !taken.is_empty() {
        tracing::warn!(
            collisions = taken.len(),
            "order reference collisions in candidate batch"
        );
    }

    select_reference(&candidates, &taken)
}

/// First candidate not already taken; a fully colliding batch is an
/// allocation failure.
fn select_reference(candidates: &[String], taken: &[String]) -> Result<String, Error> {
    candidates
        .iter()
        .find(|&candidate| !taken.contains(candidate))
        .cloned()
        .ok_or_else(|| Error::Internal("could not allocate a unique order reference".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(references: &[&str]) -> Vec<String> {
        references.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn a_clean_batch_yields_its_first_candidate() {
        let candidates = batch(&["AAAA1111", "BBBB2222"]);

        assert_eq!(select_reference(&candidates, &[]).unwrap(), "AAAA1111");
    }

    #[test]
    fn a_colliding_first_candidate_is_skipped() {
        let candidates = batch(&["AAAA1111", "BBBB2222"]);
        let taken = batch(&["AAAA1111"]);

        assert_eq!(select_reference(&candidates, &taken).unwrap(), "BBBB2222");
    }

    #[test]
    fn a_fully_colliding_batch_is_a_typed_failure() {
        let candidates = batch(&["AAAA1111", "BBBB2222"]);
        let taken = batch(&["BBBB2222", "AAAA1111"]);

        let err = select_reference(&candidates, &taken).unwrap_err();
        assert_eq!(err.kind(), "internal");
    }
}
