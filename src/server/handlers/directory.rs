use axum::{
    extract::{Extension, Path},
    Json,
};
use uuid::Uuid;

use crate::{api::DynAPI, auth::Principal, entities::Profile, error::Error};

pub async fn sync(
    Extension(api): Extension<DynAPI>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(profile): Json<Profile>,
) -> Result<Json<Profile>, Error> {
    if profile.id != id {
        return Err(Error::Validation(
            "profile id does not match the path".to_string(),
        ));
    }

    let profile = api.sync_profile(principal, profile).await?;

    Ok(profile.into())
}
