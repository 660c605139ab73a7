pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use state::AppState;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/me", get(routes::auth::me));

    let project_routes = Router::new()
        .route("/", get(routes::project::list).post(routes::project::create))
        .route(
            "/{project_id}",
            get(routes::project::get)
                .put(routes::project::update)
                .delete(routes::project::delete),
        );

    let member_routes = Router::new()
        .route("/", get(routes::member::list).post(routes::member::add))
        .route(
            "/{user_id}",
            put(routes::member::update).delete(routes::member::remove),
        );

    let task_routes = Router::new()
        .route("/", get(routes::task::list).post(routes::task::create))
        .route(
            "/{task_id}",
            get(routes::task::get)
                .put(routes::task::update)
                .delete(routes::task::delete),
        )
        .route("/{task_id}/status", post(routes::task::change_status))
        .route("/{task_id}/status-request", get(routes::task::status_history))
        .route(
            "/{task_id}/comment",
            get(routes::comment::list).post(routes::comment::create),
        )
        .route(
            "/{task_id}/comment/{comment_id}",
            axum::routing::delete(routes::comment::delete),
        );

    let proposal_routes = Router::new()
        .route("/", get(routes::proposal::list).post(routes::proposal::create));

    let message_routes = Router::new()
        .route("/", get(routes::message::list).post(routes::message::send));

    // Review queues span every project the caller administers.
    let status_request_routes = Router::new()
        .route("/pending", get(routes::status_request::pending))
        .route("/{request_id}/approve", post(routes::status_request::approve))
        .route("/{request_id}/reject", post(routes::status_request::reject));

    let review_proposal_routes = Router::new()
        .route("/pending", get(routes::proposal::pending))
        .route("/{proposal_id}/approve", post(routes::proposal::approve))
        .route("/{proposal_id}/reject", post(routes::proposal::reject));

    let notification_routes = Router::new()
        .route("/", get(routes::notification::list))
        .route("/unread-count", get(routes::notification::unread_count))
        .route("/read-all", put(routes::notification::mark_all_read))
        .route("/{notification_id}/read", put(routes::notification::mark_read))
        .route(
            "/{notification_id}",
            axum::routing::delete(routes::notification::delete),
        );

    let admin_routes = Router::new()
        .route("/user", get(routes::admin::list_users))
        .route(
            "/user/{user_id}",
            put(routes::admin::update_user).delete(routes::admin::delete_user),
        );

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/project", project_routes)
        .nest("/project/{project_id}/member", member_routes)
        .nest("/project/{project_id}/task", task_routes)
        .nest("/project/{project_id}/proposal", proposal_routes)
        .nest("/project/{project_id}/message", message_routes)
        .nest("/status-request", status_request_routes)
        .nest("/proposal", review_proposal_routes)
        .nest("/notification", notification_routes)
        .route("/dashboard", get(routes::dashboard::summary))
        .nest("/admin", admin_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
