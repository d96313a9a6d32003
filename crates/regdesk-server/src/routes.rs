use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::Html,
    routing::any,
};
use serde::Deserialize;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use regdesk_db::Database;

use crate::templates::Templates;

/// Per-request read/write bound to keep slow clients from pinning workers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub templates: Templates,
}

/// Full application router: registration handler at `/`, everything else
/// falls through to the static file directory.
pub fn app(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", any(register))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Deserialize)]
pub struct RegistrationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// Handles every method on `/`. A submission with both fields non-empty is
/// persisted and answered with the confirmation view; anything else gets the
/// home form. A malformed form body is rejected by the extractor with a 4xx
/// before this body runs.
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Result<Html<String>, StatusCode> {
    if !form.name.is_empty() && !form.phone.is_empty() {
        let id = Uuid::new_v4();
        let created_on = chrono::Utc::now().timestamp();

        state
            .db
            .insert_registration(&id.to_string(), &form.name, &form.phone, created_on)
            .map_err(|e| {
                error!("failed to insert registration: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            })?;

        render(&state, "registration")
    } else {
        render(&state, "home")
    }
}

fn render(state: &AppState, name: &str) -> Result<Html<String>, StatusCode> {
    state.templates.render(name).map(Html).map_err(|e| {
        error!("failed to render '{name}' template: {e:#}");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}
