use async_trait::async_trait;
use axum::extract::{FromRequest, RequestParts};
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::auth::Principal;
use crate::entities::{Role, VehicleClass};
use crate::error::Error;

/// Builds the request's `Principal` from the identity headers asserted by
/// the upstream identity gateway. Handlers receive it as an explicit
/// argument; there is no ambient current-user state.
#[async_trait]
impl<B: Send> FromRequest<B> for Principal {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let headers = req.headers();

        let id = required(headers, "x-principal-id")?
            .parse::<Uuid>()
            .map_err(|_| Error::Unauthorized)?;

        let role = required(headers, "x-principal-role")?
            .parse::<Role>()
            .map_err(|_| Error::Unauthorized)?;

        let is_verified = optional(headers, "x-principal-verified")
            .map(|value| value == "true")
            .unwrap_or(false);

        let vehicle_type = match optional(headers, "x-principal-vehicle") {
            Some(value) => Some(
                value
                    .parse::<VehicleClass>()
                    .map_err(|_| Error::Unauthorized)?,
            ),
            None => None,
        };

        Ok(Principal {
            id,
            role,
            is_verified,
            vehicle_type,
        })
    }
}

fn required<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, Error> {
    optional(headers, name).ok_or(Error::Unauthorized)
}

fn optional<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
