//! HTTP routes and handlers for the recommender front end.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use flick_core::ChatError;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use super::pages::{self, FormKind};
use super::state::AppState;
use crate::recommend::{Explainer, RecommendError};

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route(
            "/recommend_movies",
            get(recommend_form).post(recommend_movies),
        )
        .route(
            "/recommend_movies_llm",
            get(explain_form).post(recommend_movies_llm),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Submitted form fields. Both default to empty so a missing field renders
/// the form with an error instead of a bare rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendForm {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub num_recommendations: String,
}

impl RecommendForm {
    fn validate(&self) -> Result<(String, usize), String> {
        let description = self.description.trim();
        if description.is_empty() {
            return Err(RecommendError::EmptyQuery.to_string());
        }
        let raw = self.num_recommendations.trim();
        let count: i64 = raw.parse().map_err(|_| {
            format!(
                "Number of recommendations must be a positive integer, got '{}'",
                raw
            )
        })?;
        if count <= 0 {
            return Err(RecommendError::InvalidTopN(count).to_string());
        }
        let count = usize::try_from(count)
            .map_err(|_| RecommendError::InvalidTopN(count).to_string())?;
        Ok((description.to_string(), count))
    }
}

// =============================================================================
// Pages
// =============================================================================

async fn home() -> Html<String> {
    Html(pages::landing())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "flick"
    }))
}

async fn recommend_form() -> Html<String> {
    Html(pages::form(FormKind::Recommend, None, "", ""))
}

async fn explain_form() -> Html<String> {
    Html(pages::form(FormKind::Explain, None, "", ""))
}

// =============================================================================
// Recommendations
// =============================================================================

async fn recommend_movies(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RecommendForm>,
) -> Response {
    let start = Instant::now();
    let (description, count) = match form.validate() {
        Ok(valid) => valid,
        Err(message) => return invalid_form(FormKind::Recommend, &message, &form),
    };

    let recommender = state.recommender.clone();
    let query = description.clone();
    let result = tokio::task::spawn_blocking(move || recommender.recommend(&query, count)).await;

    match flatten(result) {
        Ok(results) => {
            info!(
                "recommend_movies: {} results in {}ms",
                results.len(),
                start.elapsed().as_millis()
            );
            Html(pages::recommendations(&description, &form.num_recommendations, &results))
                .into_response()
        }
        Err(e) => failure(FormKind::Recommend, e, &form),
    }
}

async fn recommend_movies_llm(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RecommendForm>,
) -> Response {
    let start = Instant::now();
    let (description, count) = match form.validate() {
        Ok(valid) => valid,
        Err(message) => return invalid_form(FormKind::Explain, &message, &form),
    };

    let chat = match state.llm.get().await {
        Ok(chat) => chat,
        Err(e) => return failure(FormKind::Explain, RecommendError::Chat(e), &form),
    };

    let explainer =
        Explainer::new(state.recommender.clone(), chat).with_marker(state.reasoning_marker.clone());
    let query = description.clone();
    let result =
        tokio::task::spawn_blocking(move || explainer.recommend_and_explain(&query, count)).await;

    match flatten(result) {
        Ok(explanation) => {
            info!(
                "recommend_movies_llm: {} movies explained in {}ms",
                explanation.recommendations.len(),
                start.elapsed().as_millis()
            );
            Html(pages::explanation(
                &description,
                &form.num_recommendations,
                &explanation.narrative,
                &explanation.recommendations,
            ))
            .into_response()
        }
        Err(e) => failure(FormKind::Explain, e, &form),
    }
}

// =============================================================================
// Errors
// =============================================================================

enum Failure {
    Recommend(RecommendError),
    Task(tokio::task::JoinError),
}

fn flatten<T>(
    result: Result<Result<T, RecommendError>, tokio::task::JoinError>,
) -> Result<T, Failure> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(Failure::Recommend(e)),
        Err(e) => Err(Failure::Task(e)),
    }
}

impl From<RecommendError> for Failure {
    fn from(e: RecommendError) -> Self {
        Failure::Recommend(e)
    }
}

fn invalid_form(kind: FormKind, message: &str, form: &RecommendForm) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Html(pages::form(
            kind,
            Some(message),
            &form.description,
            &form.num_recommendations,
        )),
    )
        .into_response()
}

fn failure(kind: FormKind, failure: impl Into<Failure>, form: &RecommendForm) -> Response {
    match failure.into() {
        Failure::Recommend(e) if e.is_user_error() => invalid_form(kind, &e.to_string(), form),
        Failure::Recommend(RecommendError::Chat(ChatError::ModelNotLoaded(message))) => {
            error!("Language model unavailable: {}", message);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(pages::error_page(&format!(
                    "The language model is not available: {}",
                    message
                ))),
            )
                .into_response()
        }
        Failure::Recommend(e) => {
            error!("Request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::error_page(&e.to_string())),
            )
                .into_response()
        }
        Failure::Task(e) => {
            error!("Worker task failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::error_page("The request could not be completed.")),
            )
                .into_response()
        }
    }
}
