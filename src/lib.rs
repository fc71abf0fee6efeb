use axum::Router;
use axum::extract::State;
use std::sync::Arc;

pub mod api;
pub mod app_env;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod persistence;
pub mod routing_utils;
pub mod security;

/// State shared by all request handlers
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
    pub tokens: security::TokenAuthority,
}

/// Extractor alias for pulling [SharedData] out of the request in handlers
pub type AppState = State<Arc<SharedData>>;

/// Assembles the application router: the API routes, the swagger UI, and the
/// HTTP tracing middleware
pub fn router(shared_data: Arc<SharedData>) -> Router {
    let app_routes = Router::new()
        .nest("/login", api::auth::auth_routes())
        .nest("/users", api::user::user_routes())
        .nest("/todos", api::todo::task_routes())
        .merge(api::swagger_main::build_documentation());

    logging::attach_tracing_http(app_routes).with_state(shared_data)
}
