pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;

use state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::dashboard))
        .nest_service("/static", ServeDir::new("templates/static"))
        .with_state(state)
}
