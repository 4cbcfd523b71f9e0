use crate::gate::write_gate;
use crate::handlers;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    let gate = state.gate;
    Router::new()
        .route(
            "/activities",
            get(handlers::list_activities)
                .post(handlers::create_activity)
                .put(handlers::update_activity)
                .delete(handlers::delete_activity),
        )
        .route("/activities/:id/complete", post(handlers::complete_activity))
        .route("/env-check", get(handlers::env_check))
        .layer(middleware::from_fn_with_state(gate, write_gate))
        .with_state(state)
}
