use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/activities", post(handlers::submit_form))
        .route(
            "/api/activities",
            get(handlers::list_activities).post(handlers::create_activity),
        )
        .route("/api/breakdown/category", get(handlers::get_category_breakdown))
        .route("/api/breakdown/day", get(handlers::get_heatmap))
        .route("/api/days/:date", get(handlers::get_day))
        .route("/api/series", get(handlers::get_series))
        .route("/api/draft", get(handlers::get_draft).put(handlers::put_draft))
        .route(
            "/api/preferences",
            get(handlers::get_preferences).put(handlers::put_preferences),
        )
        .route(
            "/api/preferences/dark-mode/toggle",
            post(handlers::toggle_dark_mode),
        )
        .route("/api/events", get(handlers::events))
        .with_state(state)
}
