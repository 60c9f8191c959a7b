//! HTTP transport for the organization tree service.
//!
//! # Responsibility
//! - Decode requests, call `orgtree_core` services, encode responses.
//! - Map service failures to HTTP status codes.
//!
//! # Invariants
//! - Every store call runs on the blocking pool while holding the shared
//!   connection lock; async workers never block on SQLite.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use axum::{
    routing::{get, post},
    Router,
};
use log::debug;
use rusqlite::Connection;

pub mod config;
pub mod error;
pub mod handlers;

pub use error::{ApiError, ApiResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Wraps a migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `work` against the shared connection on the blocking pool.
    pub async fn with_conn<T, F>(&self, op: &'static str, work: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> ApiResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let started_at = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            let conn = db.lock().unwrap_or_else(PoisonError::into_inner);
            work(&conn)
        })
        .await
        .map_err(|err| ApiError::internal(op, format!("blocking task failed: {err}")))?;

        if result.is_ok() {
            debug!(
                "event={op} module=api status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            );
        }
        result
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/departments", post(handlers::departments::create_department))
        .route(
            "/departments/{id}",
            get(handlers::departments::get_department)
                .patch(handlers::departments::update_department)
                .delete(handlers::departments::delete_department),
        )
        .route(
            "/departments/{id}/employees",
            post(handlers::employees::create_employee),
        )
        .with_state(state)
}
