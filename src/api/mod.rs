//! HTTP API Module
//!
//! Maps REST requests onto the workflow store and the generator.
//!
//! | Method   | Path                      | Handler                         |
//! |----------|---------------------------|---------------------------------|
//! | `POST`   | `/api/workflows/`         | [`handlers::create_workflow`]   |
//! | `GET`    | `/api/workflows/`         | [`handlers::list_workflows`]    |
//! | `GET`    | `/api/workflows/{id}`     | [`handlers::get_workflow`]      |
//! | `PUT`    | `/api/workflows/{id}`     | [`handlers::update_workflow`]   |
//! | `DELETE` | `/api/workflows/{id}`     | [`handlers::delete_workflow`]   |
//! | `POST`   | `/api/generate-workflow/` | [`handlers::generate_workflow`] |
//! | `GET`    | `/health`                 | [`handlers::health`]            |

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

use std::path::Path;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use log::info;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::generation::Generator;
use crate::storage::WorkflowStore;

pub use error::{ApiError, ApiResult};
pub use server::{serve, ServerError};

/// State shared by all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: WorkflowStore,
    pub generator: Arc<Generator>,
}

impl AppState {
    pub fn new(store: WorkflowStore, generator: Generator) -> Self {
        Self {
            store,
            generator: Arc::new(generator),
        }
    }
}

/// Returns the API routes bound to `state`.
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/workflows/",
            get(handlers::list_workflows).post(handlers::create_workflow),
        )
        .route(
            "/api/workflows/{id}",
            get(handlers::get_workflow)
                .put(handlers::update_workflow)
                .delete(handlers::delete_workflow),
        )
        .route("/api/generate-workflow/", post(handlers::generate_workflow))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Returns the complete application: API routes, optional static
/// frontend at `/`, permissive CORS and request logging.
pub fn app(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = routes(state);

    if let Some(dir) = static_dir {
        info!("Serving static files from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(cors)
}
