//! HTTP surface for launchpad using Axum.
//!
//! JSON endpoints for signup/login and the authenticated deploy API, plus the
//! two path-based static-serving routes for deployed projects. Session tokens
//! are validated by a middleware layer on the authenticated subrouter; the
//! static routes stay public and database-free.

use axum::{
    extract::{Form, Path, State},
    http::{header, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth;
use crate::config::AppConfig;
use crate::error::{PublishError, StoreError};
use crate::models::SessionClaims;
use crate::publish::Publisher;
use crate::serve;
use crate::storage::Storage;

/// Shared app state for handlers (Arc-wrapped for concurrency).
pub struct AppState {
    storage: Storage,
    publisher: Publisher,
    config: AppConfig,
}

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// Generic success envelope for endpoints without a payload.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiMessage {
    pub success: bool,
    pub message: String,
}

/// The deploy form posted by the editor. Missing code fields default to
/// empty, matching what an empty editor tab submits.
#[derive(Deserialize, ToSchema)]
pub struct DeployForm {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub html_code: String,
    #[serde(default)]
    pub css_code: String,
    #[serde(default)]
    pub js_code: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct DeployResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ProjectSummary {
    pub name: String,
    pub url: String,
}

/// JSON error envelope: `{success: false, error}` with a consistent status
/// code per failure class (validation 400, auth 401, duplicate 409, backend
/// faults 500 with details kept to the log).
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::DuplicateUsername(_) => Self::new(StatusCode::CONFLICT, err.to_string()),
            StoreError::InvalidUsername(_) => Self::new(StatusCode::BAD_REQUEST, err.to_string()),
            StoreError::InvalidCredentials => Self::new(StatusCode::UNAUTHORIZED, err.to_string()),
            _ => {
                tracing::error!(error = %err, "storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::EmptyProjectName | PublishError::InvalidProjectName(_) => {
                Self::new(StatusCode::BAD_REQUEST, err.to_string())
            }
            PublishError::Registry(inner) => inner.into(),
            PublishError::PublishFailed(io) => {
                tracing::error!(error = %io, "artifact write failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "publish failed")
            }
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        signup_handler,
        login_handler,
        deploy_handler,
        list_projects_handler,
        health_handler
    ),
    components(schemas(
        SignupRequest,
        LoginRequest,
        LoginResponse,
        ApiMessage,
        DeployForm,
        DeployResponse,
        ProjectSummary
    )),
    tags((name = "launchpad", description = "Static mini-site publishing API"))
)]
struct ApiDoc;

async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = auth::validate_session_token(token, state.config.session_secret.as_bytes())
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Create the Axum router over storage, publisher and config.
pub fn create_router(storage: Storage, publisher: Publisher, config: AppConfig) -> Router {
    let state = Arc::new(AppState {
        storage,
        publisher,
        config,
    });

    let auth_routes = Router::new()
        .route("/deploy_api", post(deploy_handler))
        .route("/projects", get(list_projects_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/signup", post(signup_handler))
        .route("/login", post(login_handler))
        .route("/health", get(health_handler))
        .merge(auth_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Static serving goes last; every static/API path above wins over the
        // capture segments.
        .route("/:username/:project", get(project_entry_handler))
        .route("/:username/:project/:filename", get(project_file_handler))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = ApiMessage),
        (status = 400, description = "Username not usable"),
        (status = 409, description = "Username already taken"),
    )
)]
async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<ApiMessage>, ApiError> {
    let user = state
        .storage
        .create_user(&payload.username, &payload.password)?;
    tracing::info!(username = %user.username, "user registered");
    Ok(Json(ApiMessage {
        success: true,
        message: "account created".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .storage
        .authenticate(&payload.username, &payload.password)?;
    let token = auth::create_session_token(
        &user,
        state.config.session_secret.as_bytes(),
        state.config.token_ttl_secs,
    )
    .map_err(|err| {
        tracing::error!(error = %err, "token signing failure");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
    })?;
    Ok(Json(LoginResponse { token }))
}

#[utoipa::path(
    post,
    path = "/deploy_api",
    request_body(content = DeployForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Project deployed", body = DeployResponse),
        (status = 400, description = "Invalid project name"),
        (status = 401, description = "Missing or invalid session token"),
    )
)]
async fn deploy_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
    Form(form): Form<DeployForm>,
) -> Result<Json<DeployResponse>, ApiError> {
    let owner = state
        .storage
        .get_user(claims.sub)?
        .ok_or_else(ApiError::unauthorized)?;

    let result = state
        .publisher
        .publish(
            &state.storage,
            &owner,
            &form.project_name,
            &form.html_code,
            &form.css_code,
            &form.js_code,
        )
        .await?;

    tracing::info!(owner = %owner.username, url = %result.url, "project deployed");
    Ok(Json(DeployResponse {
        success: true,
        url: Some(result.url),
        error: None,
    }))
}

#[utoipa::path(
    get,
    path = "/projects",
    responses(
        (status = 200, description = "The caller's projects", body = [ProjectSummary]),
        (status = 401, description = "Missing or invalid session token"),
    )
)]
async fn list_projects_handler(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    let owner = state
        .storage
        .get_user(claims.sub)?
        .ok_or_else(ApiError::unauthorized)?;
    let projects = state.storage.list_projects(owner.id)?;
    let summaries = projects
        .into_iter()
        .map(|project| ProjectSummary {
            url: format!("/{}/{}", owner.username, project.name),
            name: project.name,
        })
        .collect();
    Ok(Json(summaries))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service healthy", body = ApiMessage))
)]
async fn health_handler() -> Json<ApiMessage> {
    Json(ApiMessage {
        success: true,
        message: "launchpad healthy".to_string(),
    })
}

async fn project_entry_handler(
    State(state): State<Arc<AppState>>,
    Path((username, project)): Path<(String, String)>,
) -> Response {
    serve_resolved(&state, &username, &project, None).await
}

async fn project_file_handler(
    State(state): State<Arc<AppState>>,
    Path((username, project, filename)): Path<(String, String, String)>,
) -> Response {
    serve_resolved(&state, &username, &project, Some(&filename)).await
}

/// Stream a resolved artifact back, or a plain-text 404. Resolution never
/// touches the database.
async fn serve_resolved(
    state: &AppState,
    username: &str,
    project: &str,
    filename: Option<&str>,
) -> Response {
    let Some(resolved) = serve::resolve(state.publisher.root(), username, project, filename)
    else {
        return not_found();
    };
    match tokio::fs::read(&resolved.path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, resolved.content_type)], bytes).into_response(),
        // The file vanished between resolve and read (republish swap); the
        // next request will see the new set.
        Err(_) => not_found(),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Project not found").into_response()
}
