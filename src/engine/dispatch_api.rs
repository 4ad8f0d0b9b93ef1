use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Executor, Row};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::DispatchAPI,
    auth::{Platform, Principal},
    dispatch,
    entities::{Profile, Trip},
    error::Error,
};

#[async_trait]
impl DispatchAPI for Engine {
    /// Candidate drivers for a REQUESTED trip: the stock vehicle-match
    /// predicate over the directory. No ranking.
    #[tracing::instrument(skip(self))]
    async fn eligible_drivers(
        &self,
        principal: Principal,
        trip_id: Uuid,
    ) -> Result<Vec<Profile>, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(trip): Json<Trip> = conn
            .fetch_optional(sqlx::query("SELECT data FROM trips WHERE id = $1").bind(&trip_id))
            .await?
            .ok_or(Error::NotFound)?
            .try_get("data")?;

        self.authorize(principal, "dispatch", trip.clone())?;

        let rows = conn
            .fetch_all(sqlx::query("SELECT data FROM directory WHERE role = 'driver'"))
            .await?;

        let mut profiles = Vec::with_capacity(rows.len());

        for row in rows.iter() {
            let Json(profile): Json<Profile> = row.try_get("data")?;
            profiles.push(profile);
        }

        Ok(dispatch::eligible(
            &trip,
            profiles,
            dispatch::vehicle_match(&trip),
        ))
    }

    /// Provider-push seam: the identity provider upserts directory rows
    /// here. The engine itself only ever reads them.
    #[tracing::instrument(skip(self))]
    async fn sync_profile(
        &self,
        principal: Principal,
        profile: Profile,
    ) -> Result<Profile, Error> {
        self.authorize(principal, "sync_profile", Platform::default())?;
        profile.validate()?;

        let mut conn = self.pool.acquire().await?;

        conn.execute(
            sqlx::query(
                "INSERT INTO directory (id, role, verified, vehicle_type, data)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (id) DO UPDATE SET
                     role = EXCLUDED.role,
                     verified = EXCLUDED.verified,
                     vehicle_type = EXCLUDED.vehicle_type,
                     data = EXCLUDED.data",
            )
            .bind(&profile.id)
            .bind(profile.role.as_str())
            .bind(profile.verified)
            .bind(profile.vehicle_type.map(|v| v.as_str()))
            .bind(Json(&profile)),
        )
        .await?;

        Ok(profile)
    }
}
