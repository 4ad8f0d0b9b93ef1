mod extract;
mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post, put},
    Router,
};

use crate::api::{DynAPI, API};
use crate::server::handlers::{directory, payments, trips};

pub async fn serve<T: API + Sync + Send + 'static>(api: T, addr: SocketAddr) {
    let api = Arc::new(api) as DynAPI;

    let app = Router::new()
        .route("/trips", post(trips::create).get(trips::list))
        .route("/trips/:id", get(trips::find))
        .route("/trips/:id/status", get(trips::status))
        .route("/trips/:id/drivers", get(trips::eligible_drivers))
        .route("/trips/:id/accept", post(trips::accept))
        .route("/trips/:id/start", post(trips::start))
        .route("/trips/:id/complete", post(trips::complete))
        .route("/trips/:id/cancel", post(trips::cancel))
        .route("/trips/:id/rate", post(trips::rate))
        .route("/payments", post(payments::create))
        .route("/payments/:id", get(payments::find).patch(payments::update))
        .route("/directory/:id", put(directory::sync))
        .layer(Extension(api));

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
