use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;
pub mod upload;
pub mod validation;

// Routers grouped by the gate that protects them.
pub mod routes;
use routes::{librarian, public, reader};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{LocalImageStore, MockImageStore, StorageState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` with the
/// Swagger UI at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(title = "Library Management Api", version = "1.0.0"),
    paths(
        handlers::signup, handlers::signin,
        handlers::add_book, handlers::update_book, handlers::delete_book,
        handlers::change_book_status, handlers::get_books, handlers::get_book,
    ),
    components(
        schemas(
            models::Role, models::UserProfile, models::SignupRequest, models::SignupResponse,
            models::LoginRequest, models::LoginResponse, models::BookResponse, models::BookUploadForm,
            models::StatusRequest, models::BookCreatedResponse, models::BookUpdatedResponse,
            models::BookDeletedResponse, models::BookId, models::StatusChangedResponse,
            error::ErrorEnvelope, error::ErrorDetail,
        )
    ),
    modifiers(&BearerSchemes),
    tags(
        (name = "User", description = "Signup and signin"),
        (name = "Librarian", description = "Catalog management"),
        (name = "Student", description = "Catalog reads"),
    )
)]
pub struct ApiDoc;

/// Declares one bearer scheme per role; each is signed with its own secret.
struct BearerSchemes;

impl Modify for BearerSchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        for name in ["librarian_token", "student_token"] {
            components.add_security_scheme(
                name,
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// Everything a handler may need, injected through axum `State`. Cloning is
/// cheap: the services sit behind `Arc`s and the config is small.
#[derive(Clone)]
pub struct AppState {
    /// Accounts and catalog persistence.
    pub repo: RepositoryState,
    /// Cover image files.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// The gates only need the config.
impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, attaches each gate to its router, and wraps
/// everything in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // Uploaded images are served as `/images/<file>`, matching their stored reference.
    let static_files = ServeDir::new(state.config.images_dir());

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            librarian::librarian_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_librarian,
            )),
        )
        .merge(
            reader::reader_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_reader,
            )),
        )
        .nest_service("/images", static_files)
        // Wrong methods on known paths answer like unknown paths. Must follow
        // every `merge` so it reaches all routes.
        .method_not_allowed_fallback(handlers::route_not_found)
        .fallback(handlers::route_not_found)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span so every log line of a request carries its id.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
