//! HTTP API for the plant onboarding wizard
//!
//! Thin glue over the workspace crates: formula validation, payload
//! validation + upsert, the parameter registry, and named templates.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use formula_core::{validate_formula, FormulaValidation};
use onboarding_core::{
    validate_payload, OnboardingPayload, ParameterEntry, ParameterRegistry, SubmissionMeta,
    SubmissionRecord, SubmissionStore, TemplateStore,
};

// Application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ParameterRegistry>,
    pub templates: Arc<TemplateStore>,
    pub store: Arc<SubmissionStore>,
}

// API types
#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Deserialize)]
pub struct FormulaValidationRequest {
    pub expression: String,
    #[serde(default)]
    pub enabled_parameters: Vec<String>,
    #[serde(default)]
    pub target_parameter: Option<String>,
}

#[derive(Deserialize)]
pub struct ParameterQuery {
    #[serde(default)]
    pub asset_type: Option<String>,
}

#[derive(Deserialize)]
pub struct TemplatePayload {
    pub name: String,
    pub data: Value,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onboarding_web_server=info,tower_http=info".into()),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let registry = match std::env::var("REGISTRY_PATH") {
        Ok(path) => ParameterRegistry::from_path(&path)?,
        Err(_) => ParameterRegistry::builtin(),
    };

    let data_dir =
        std::env::var("DATA_DIR").unwrap_or_else(|_| "data/submissions".to_string());
    info!("Storing submissions under {}", data_dir);

    let state = AppState {
        registry: Arc::new(registry),
        templates: Arc::new(TemplateStore::new()),
        store: Arc::new(SubmissionStore::new(&data_dir)),
    };

    let app = create_router(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|raw| raw.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/parameters", get(get_parameters))
        .route("/api/formulas/validate", post(validate_formula_endpoint))
        .route("/api/onboarding", post(submit_onboarding))
        .route("/api/submissions", get(list_submissions))
        .route(
            "/api/submissions/:submission_id",
            get(get_submission).delete(delete_submission),
        )
        .route("/api/templates", get(list_templates).post(save_template))
        .route("/api/templates/:name", get(get_template))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    warn!("Internal error: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal error".to_string(),
        }),
    )
}

fn not_found(message: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// Fetch parameters, optionally filtered by asset type
async fn get_parameters(
    Query(query): Query<ParameterQuery>,
    State(state): State<AppState>,
) -> Json<Vec<ParameterEntry>> {
    match query.asset_type.as_deref() {
        Some(asset_type) if !asset_type.is_empty() => {
            Json(state.registry.for_asset_type(asset_type))
        }
        _ => Json(state.registry.all().to_vec()),
    }
}

// Validate a formula expression against enabled parameters
async fn validate_formula_endpoint(
    Json(request): Json<FormulaValidationRequest>,
) -> Json<FormulaValidation> {
    Json(validate_formula(
        &request.expression,
        &request.enabled_parameters,
        request.target_parameter.as_deref(),
    ))
}

// Accept, validate, and save the complete onboarding configuration
async fn submit_onboarding(
    State(state): State<AppState>,
    Json(payload): Json<OnboardingPayload>,
) -> Result<Json<Value>, ApiError> {
    let validated = validate_payload(payload).map_err(|e| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    let outcome = state.store.save(&validated).map_err(internal_error)?;

    let mut body = serde_json::to_value(&validated).map_err(internal_error)?;
    if let Value::Object(ref mut fields) = body {
        fields.insert(
            "submission".to_string(),
            serde_json::to_value(&outcome).map_err(internal_error)?,
        );
    }
    Ok(Json(body))
}

// List all saved submissions (metadata only)
async fn list_submissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SubmissionMeta>>, ApiError> {
    state.store.list().map(Json).map_err(internal_error)
}

// Load a single submission by id prefix
async fn get_submission(
    Path(submission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<SubmissionRecord>, ApiError> {
    match state.store.get(&submission_id) {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(not_found("Submission not found")),
        Err(e) => Err(internal_error(e)),
    }
}

// Delete a submission by id prefix
async fn delete_submission(
    Path(submission_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    match state.store.delete(&submission_id) {
        Ok(true) => Ok(Json(json!({ "deleted": true, "id": submission_id }))),
        Ok(false) => Err(not_found("Submission not found")),
        Err(e) => Err(internal_error(e)),
    }
}

// Save a named template
async fn save_template(
    State(state): State<AppState>,
    Json(payload): Json<TemplatePayload>,
) -> Json<Value> {
    state.templates.save(&payload.name, payload.data);
    Json(json!({ "name": payload.name, "saved": true }))
}

// List all saved template names
async fn list_templates(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.templates.names())
}

// Load a template by name
async fn get_template(
    Path(name): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    match state.templates.load(&name) {
        Some(data) => Ok(Json(json!({ "name": name, "data": data }))),
        None => Err(not_found(format!("Template '{}' not found", name))),
    }
}
