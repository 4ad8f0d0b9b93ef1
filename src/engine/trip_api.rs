use super::helpers::{
    fetch_trip_for_update, insert_payment, unique_order_reference, update_trip,
};
use super::{Engine, TripEvent};

use async_trait::async_trait;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::TripAPI,
    auth::{Platform, Principal},
    entities::{MonthlyCount, Party, Payment, Role, Trip, TripList, TripRequest, TripStatusView},
    error::Error,
};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const SETTLEMENT_ATTEMPTS: usize = 2;

/// Two completions can pass the in-transaction reference check and then
/// collide on the UNIQUE constraint; that loser deserves a retry, not a
/// failed completion.
fn retry_settlement(attempt: usize, err: &Error) -> bool {
    attempt < SETTLEMENT_ATTEMPTS && err.is_unique_violation()
}

/// Expands sparse month/count rows into the full zero-filled year the
/// monthly report returns.
fn fill_months(counts: &[(i32, i64)]) -> Vec<MonthlyCount> {
    (1..=12)
        .map(|month| MonthlyCount {
            month: MONTH_NAMES[month as usize - 1].to_string(),
            completed_trips: counts
                .iter()
                .find(|(m, _)| *m == month)
                .map(|(_, count)| *count)
                .unwrap_or(0),
        })
        .collect()
}

#[async_trait]
impl TripAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_trip(
        &self,
        principal: Principal,
        request: TripRequest,
    ) -> Result<Trip, Error> {
        self.authorize(principal.clone(), "create_trip", Platform::default())?;
        request.validate()?;

        let trip = Trip::new(principal.id, request);

        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO trips (id, status, user_id, driver_id, vehicle_type, pickup_time, data)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(&trip.id)
            .bind(trip.status.name())
            .bind(&trip.user_id)
            .bind(&trip.driver_id)
            .bind(trip.vehicle_type.as_str())
            .bind(&trip.pickup_time)
            .bind(Json(&trip)),
        )
        .await?;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn find_trip(&self, principal: Principal, id: Uuid) -> Result<Trip, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(trip): Json<Trip> = conn
            .fetch_optional(sqlx::query("SELECT data FROM trips WHERE id = $1").bind(&id))
            .await?
            .ok_or(Error::NotFound)?
            .try_get("data")?;

        self.authorize(principal, "read", trip.clone())?;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn list_trips(&self, principal: Principal) -> Result<TripList, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = match principal.role {
            Role::Operator => {
                conn.fetch_all(sqlx::query("SELECT data FROM trips ORDER BY pickup_time DESC"))
                    .await?
            }
            _ => {
                conn.fetch_all(
                    sqlx::query(
                        "SELECT data FROM trips
                         WHERE user_id = $1 OR driver_id = $1
                         ORDER BY pickup_time DESC",
                    )
                    .bind(&principal.id),
                )
                .await?
            }
        };

        let mut trips = Vec::with_capacity(rows.len());

        for row in rows.iter() {
            let Json(trip): Json<Trip> = row.try_get("data")?;
            trips.push(trip);
        }

        Ok(TripList::new(trips))
    }

    #[tracing::instrument(skip(self))]
    async fn trip_status(&self, principal: Principal, id: Uuid) -> Result<TripStatusView, Error> {
        let trip = self.find_trip(principal, id).await?;

        Ok(trip.status_view())
    }

    /// The accept compare-and-swap: the row lock serializes concurrent
    /// attempts and the entity re-tests the REQUESTED/unassigned condition
    /// under it, so exactly one driver wins and losers get a typed
    /// rejection.
    #[tracing::instrument(skip(self))]
    async fn accept_trip(&self, principal: Principal, id: Uuid) -> Result<Trip, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut trip = fetch_trip_for_update(&mut tx, &id).await?;

        self.authorize(principal.clone(), "accept", trip.clone())?;

        trip.accept(principal.id)?;

        update_trip(&mut tx, &trip).await?;

        tx.commit().await?;

        self.notify_trip_event(&trip, TripEvent::Accepted).await;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn start_trip(&self, principal: Principal, id: Uuid) -> Result<Trip, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut trip = fetch_trip_for_update(&mut tx, &id).await?;

        self.authorize(principal.clone(), "start", trip.clone())?;

        trip.start()?;

        update_trip(&mut tx, &trip).await?;

        tx.commit().await?;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn complete_trip(&self, principal: Principal, id: Uuid) -> Result<Trip, Error> {
        let mut attempt = 1;

        let trip = loop {
            match self.settle_completion(principal.clone(), id).await {
                Err(err) if retry_settlement(attempt, &err) => {
                    tracing::warn!(
                        error = %err,
                        trip_id = %id,
                        "order reference collided at settlement, retrying"
                    );
                    attempt += 1;
                }
                result => break result?,
            }
        };

        self.notify_trip_event(&trip, TripEvent::Completed).await;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_trip(
        &self,
        principal: Principal,
        id: Uuid,
        reason: Option<String>,
    ) -> Result<Trip, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut trip = fetch_trip_for_update(&mut tx, &id).await?;

        self.authorize(principal.clone(), "cancel", trip.clone())?;

        let cancelled_by = if principal.id == trip.user_id {
            Party::User
        } else {
            Party::Driver
        };

        trip.cancel(cancelled_by, reason)?;

        update_trip(&mut tx, &trip).await?;

        tx.commit().await?;

        self.notify_trip_event(&trip, TripEvent::Cancelled).await;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn rate_trip(&self, principal: Principal, id: Uuid, rating: u8) -> Result<Trip, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut trip = fetch_trip_for_update(&mut tx, &id).await?;

        self.authorize(principal.clone(), "rate", trip.clone())?;

        trip.rate(rating)?;

        update_trip(&mut tx, &trip).await?;

        tx.commit().await?;

        Ok(trip)
    }

    #[tracing::instrument(skip(self))]
    async fn monthly_stats(&self, principal: Principal) -> Result<Vec<MonthlyCount>, Error> {
        let mut conn = self.pool.acquire().await?;

        let rows = conn
            .fetch_all(
                sqlx::query(
                    "SELECT EXTRACT(MONTH FROM pickup_time)::INT4 AS month, COUNT(*) AS completed
                     FROM trips
                     WHERE status = 'COMPLETED' AND user_id = $1
                     GROUP BY 1",
                )
                .bind(&principal.id),
            )
            .await?;

        let mut counts = Vec::with_capacity(rows.len());

        for row in rows.iter() {
            counts.push((row.try_get("month")?, row.try_get("completed")?));
        }

        Ok(fill_months(&counts))
    }
}

impl Engine {
    /// One settlement attempt: transition, reference allocation, payment
    /// insert and trip update in a single transaction.
    async fn settle_completion(&self, principal: Principal, id: Uuid) -> Result<Trip, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut trip = fetch_trip_for_update(&mut tx, &id).await?;

        self.authorize(principal.clone(), "complete", trip.clone())?;

        trip.complete()?;

        // settle in the same transaction: the trip's bid becomes the
        // amount paid, split by the fixed commission
        let reference = unique_order_reference(&mut tx).await?;
        let payment = Payment::new(trip.id, principal.id, trip.bid, reference);

        insert_payment(&mut tx, &payment).await?;
        update_trip(&mut tx, &trip).await?;

        tx.commit().await?;

        Ok(trip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::test_support;

    #[test]
    fn settlement_retries_reference_collisions_once() {
        let collision = test_support::unique_violation();

        assert!(retry_settlement(1, &collision));
        assert!(!retry_settlement(2, &collision));
        assert!(!retry_settlement(1, &Error::NotFound));
        assert!(!retry_settlement(1, &Error::AlreadyAccepted));
    }

    #[test]
    fn fill_months_zero_fills_the_whole_year() {
        let report = fill_months(&[]);

        assert_eq!(report.len(), 12);
        assert!(report.iter().all(|bucket| bucket.completed_trips == 0));
        assert_eq!(report[0].month, "January");
        assert_eq!(report[11].month, "December");
    }

    #[test]
    fn fill_months_places_counts_in_their_buckets() {
        let report = fill_months(&[(2, 3), (12, 7)]);

        assert_eq!(report[1].month, "February");
        assert_eq!(report[1].completed_trips, 3);
        assert_eq!(report[11].completed_trips, 7);
        assert_eq!(report[5].completed_trips, 0);
    }
}
