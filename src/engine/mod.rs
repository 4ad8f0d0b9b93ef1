mod dispatch_api;
mod helpers;
mod notify;
mod payment_api;
mod trip_api;

pub use notify::TripEvent;

use std::sync::Arc;

use oso::Oso;
use sqlx::{Executor, Pool, Postgres};

use crate::{
    api::API,
    auth::authorizor,
    error::Error,
    external::mailer::Mailer,
};

type Database = Postgres;

pub struct Engine {
    pool: Pool<Database>,
    authorizor: Oso,
    mailer: Arc<dyn Mailer>,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub async fn new(pool: Pool<Database>, mailer: Arc<dyn Mailer>) -> Result<Self, Error> {
        // trip service
        pool.execute(
            "CREATE TABLE IF NOT EXISTS trips (
                id UUID PRIMARY KEY,
                status VARCHAR NOT NULL,
                user_id UUID NOT NULL,
                driver_id UUID,
                vehicle_type VARCHAR NOT NULL,
                pickup_time TIMESTAMPTZ NOT NULL,
                data JSONB NOT NULL
            )",
        )
        .await?;

        // payment service; the UNIQUE constraint backstops the
        // collision-checked reference generator
        pool.execute(
            "CREATE TABLE IF NOT EXISTS payments (
                id UUID PRIMARY KEY,
                status VARCHAR NOT NULL,
                trip_id UUID NOT NULL,
                driver_id UUID NOT NULL,
                order_reference VARCHAR(8) NOT NULL UNIQUE,
                data JSONB NOT NULL
            )",
        )
        .await?;

        // read-only mirror of the identity provider's directory
        pool.execute(
            "CREATE TABLE IF NOT EXISTS directory (
                id UUID PRIMARY KEY,
                role VARCHAR NOT NULL,
                verified BOOLEAN NOT NULL,
                vehicle_type VARCHAR,
                data JSONB NOT NULL
            )",
        )
        .await?;

        Ok(Self {
            pool,
            authorizor: authorizor::new(),
            mailer,
        })
    }
}

impl Engine {
    pub fn authorize<Actor, Action, Resource>(
        &self,
        actor: Actor,
        action: Action,
        resource: Resource,
    ) -> Result<(), Error>
    where
        Actor: oso::ToPolar,
        Action: oso::ToPolar,
        Resource: oso::ToPolar,
    {
        if self.authorizor.is_allowed(actor, action, resource)? {
            return Ok(());
        }

        Err(Error::Unauthorized)
    }
}

impl API for Engine {}
