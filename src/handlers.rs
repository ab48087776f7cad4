use crate::collector::{self, SubmitError};
use crate::errors::AppError;
use crate::models::{
    Activity, ActivityDraft, CategoryOverview, DailyTotal, HeatmapResponse, Preferences,
    SeriesPoint,
};
use crate::state::AppState;
use crate::stats::{category_overview, daily_series, day_details, heatmap};
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, Redirect,
    },
    Form, Json,
};
use chrono::NaiveDate;
use std::convert::Infallible;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let dark_mode = state.store.dark_mode().await;
    let draft = state.store.draft().await.unwrap_or_default();
    Html(render_index(dark_mode, &draft))
}

pub async fn list_activities(State(state): State<AppState>) -> Json<Vec<Activity>> {
    Json(state.store.activities().await)
}

pub async fn create_activity(
    State(state): State<AppState>,
    Json(draft): Json<ActivityDraft>,
) -> Result<(StatusCode, Json<Activity>), AppError> {
    let activity = collector::submit(&state.store, &draft).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// Plain HTML form post. A rejected draft is saved and the page re-renders
/// it, so both outcomes redirect home.
pub async fn submit_form(
    State(state): State<AppState>,
    Form(draft): Form<ActivityDraft>,
) -> Result<Redirect, AppError> {
    match collector::submit(&state.store, &draft).await {
        Ok(_) => Ok(Redirect::to("/")),
        Err(SubmitError::Invalid(_)) => {
            state.store.save_draft(draft).await?;
            Ok(Redirect::to("/"))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn get_category_breakdown(State(state): State<AppState>) -> Json<CategoryOverview> {
    let activities = state.store.activities().await;
    Json(category_overview(&activities))
}

pub async fn get_heatmap(State(state): State<AppState>) -> Json<HeatmapResponse> {
    let activities = state.store.activities().await;
    Json(heatmap(&activities))
}

pub async fn get_day(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DailyTotal>, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("date must be YYYY-MM-DD"))?;
    let activities = state.store.activities().await;
    day_details(&activities, date)
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no activities on {date}")))
}

pub async fn get_series(State(state): State<AppState>) -> Json<Vec<SeriesPoint>> {
    let activities = state.store.activities().await;
    Json(daily_series(&activities))
}

pub async fn get_draft(State(state): State<AppState>) -> Json<ActivityDraft> {
    Json(state.store.draft().await.unwrap_or_default())
}

pub async fn put_draft(
    State(state): State<AppState>,
    Json(draft): Json<ActivityDraft>,
) -> Result<StatusCode, AppError> {
    state.store.save_draft(draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_preferences(State(state): State<AppState>) -> Json<Preferences> {
    Json(Preferences {
        dark_mode: state.store.dark_mode().await,
    })
}

pub async fn put_preferences(
    State(state): State<AppState>,
    Json(preferences): Json<Preferences>,
) -> Result<Json<Preferences>, AppError> {
    state.store.set_dark_mode(preferences.dark_mode).await?;
    Ok(Json(preferences))
}

pub async fn toggle_dark_mode(State(state): State<AppState>) -> Result<Json<Preferences>, AppError> {
    let dark_mode = state.store.toggle_dark_mode().await?;
    Ok(Json(Preferences { dark_mode }))
}

/// Server-sent change notifications. Lagged receivers just skip ahead.
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.store.subscribe())
        .filter_map(|event| event.ok())
        .map(|event| Ok(Event::default().event(event.name()).data(event.name())));

    Sse::new(stream).keep_alive(KeepAlive::default())
}
