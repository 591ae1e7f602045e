//! Route-Definitionen fuer die REST-API (/v1/...)

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::rest::{handlers, CommanderState};

/// Erstellt den vollstaendigen /v1/-Router
pub fn v1_router() -> Router<CommanderState> {
    Router::new()
        // Controller
        .route("/v1/loops", get(handlers::loops::list_loops))
        .route("/v1/loops/:name/click", post(handlers::loops::click_loop))
        .route("/v1/loops/:name/off", post(handlers::loops::off_loop))
        .route("/v1/loops/:name/state", put(handlers::loops::put_state))
        .route(
            "/v1/loops/:name/volume",
            put(handlers::loops::put_volume).post(handlers::loops::put_volume),
        )
        .route("/v1/delay", post(handlers::loops::post_delay))
        .route("/v1/devices", post(handlers::loops::post_devices))
        // Bots
        .route("/v1/bots", get(handlers::bots::list_bots))
        .route("/v1/bots/:id/join", post(handlers::bots::join))
        .route("/v1/bots/:id/leave", post(handlers::bots::leave))
        .route("/v1/bots/:id/talk", post(handlers::bots::talk))
        .route("/v1/bots/:id/mute", post(handlers::bots::mute))
        .route("/v1/bots/:id/device_in", post(handlers::bots::device_in))
        .route("/v1/bots/:id/device_out", post(handlers::bots::device_out))
        .route("/v1/bots/:id/set_volume", post(handlers::bots::set_volume))
        .route("/v1/bots/:id/delay_on", post(handlers::bots::delay_on))
        .route("/v1/bots/:id/delay_off", post(handlers::bots::delay_off))
        .route(
            "/v1/bots/:id/leave_after_delay",
            post(handlers::bots::leave_after_delay),
        )
        .route(
            "/v1/bots/:id/mute_after_delay",
            post(handlers::bots::mute_after_delay),
        )
        .route("/v1/bots/:id/stop", post(handlers::bots::stop))
        .route("/v1/bots/:id/status", get(handlers::bots::status))
        .route("/v1/bots/:id/users", get(handlers::bots::users))
}
