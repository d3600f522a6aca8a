//! HTTP handlers for ID generation.
//!
//! [`router`] wires a single generator into an [`axum::Router`]:
//!
//! - `GET /nextid` issues one ID.
//! - `GET /health` reports whether the instance still issues IDs.
//! - Anything else is `404 Not Found`.
//!
//! The generator is owned by the router state. There is no process-wide
//! instance, so tests and embedders can run several routers side by side.

use core::time::Duration;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use nextid::{SnowflakeGenerator, SnowflakeGeneratorAsyncTokioExt, SnowflakeId};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::server::{
    service::error::ApiError,
    telemetry::{
        increment_id_errors, increment_ids_generated, increment_requests, record_request_duration,
    },
};

/// Body of every `/nextid` response. `id` is omitted when `error` is true.
#[derive(Debug, Serialize)]
pub struct NextIdResponse {
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<SnowflakeId>,
}

impl NextIdResponse {
    pub fn issued(id: SnowflakeId) -> Self {
        Self {
            error: false,
            id: Some(id),
        }
    }

    pub fn failed() -> Self {
        Self {
            error: true,
            id: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Shared state handed to every request.
///
/// Cloning is cheap and shares the generator and the retired flag.
pub struct AppState<G> {
    generator: Arc<G>,
    retired: Arc<AtomicBool>,
    request_timeout: Duration,
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            retired: Arc::clone(&self.retired),
            request_timeout: self.request_timeout,
        }
    }
}

impl<G> AppState<G>
where
    G: SnowflakeGenerator,
{
    pub fn new(generator: G, request_timeout: Duration) -> Self {
        Self {
            generator: Arc::new(generator),
            retired: Arc::new(AtomicBool::new(false)),
            request_timeout,
        }
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    fn retire(&self, err: &nextid::Error) {
        if !self.retired.swap(true, Ordering::AcqRel) {
            tracing::error!(
                error = %err,
                machine_id = self.generator.config().machine_id(),
                "generator retired; this instance must be reconfigured"
            );
        }
    }
}

/// Builds the router for one generator.
pub fn router<G>(state: AppState<G>) -> Router
where
    G: SnowflakeGenerator + Send + Sync + 'static,
{
    Router::new()
        .route("/nextid", get(next_id::<G>))
        .route("/health", get(health::<G>))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn next_id<G>(State(state): State<AppState<G>>) -> Result<Json<NextIdResponse>, ApiError>
where
    G: SnowflakeGenerator + Send + Sync + 'static,
{
    increment_requests();
    if state.is_retired() {
        increment_id_errors(true);
        return Err(ApiError::Retired);
    }

    let start = Instant::now();
    let deadline = start + state.request_timeout;
    let result = state.generator.next_id_async_until(deadline).await;
    record_request_duration(start.elapsed().as_secs_f64() * 1_000.0);

    match result {
        Ok(id) => {
            increment_ids_generated();
            Ok(Json(NextIdResponse::issued(id)))
        }
        Err(err) => {
            let fatal = err.is_fatal();
            if fatal {
                state.retire(&err);
            } else {
                tracing::warn!(error = %err, "failed to issue an ID");
            }
            increment_id_errors(fatal);
            Err(ApiError::from(err))
        }
    }
}

async fn health<G>(State(state): State<AppState<G>>) -> (StatusCode, Json<HealthResponse>)
where
    G: SnowflakeGenerator + Send + Sync + 'static,
{
    if state.is_retired() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "retired" }),
        )
    } else {
        (StatusCode::OK, Json(HealthResponse { status: "serving" }))
    }
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use nextid::{
        DEFAULT_EPOCH, GeneratorConfig, Layout, LockSnowflakeGenerator, ManualClock,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn app_with(config: GeneratorConfig, clock: ManualClock, timeout: Duration) -> Router {
        let generator = LockSnowflakeGenerator::new(config, clock).unwrap();
        router(AppState::new(generator, timeout))
    }

    async fn get_json(app: &Router, path: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn nextid_returns_the_packed_id() {
        let config = GeneratorConfig::builder().machine_id(5).build().unwrap();
        let clock = ManualClock::at(DEFAULT_EPOCH + ms(20));
        let app = app_with(config.clone(), clock, ms(500));

        for sequence in 0..3 {
            let (status, body) = get_json(&app, "/nextid").await;
            assert_eq!(status, StatusCode::OK);
            let expected = config.pack(2, sequence).to_raw();
            assert_eq!(body, json!({ "error": false, "id": expected }));
        }
    }

    #[tokio::test]
    async fn rollback_is_a_transient_failure() {
        let config = GeneratorConfig::builder().max_wait(ms(20)).build().unwrap();
        let clock = ManualClock::at(DEFAULT_EPOCH + ms(1_000));
        let app = app_with(config, clock.clone(), ms(500));

        assert_eq!(get_json(&app, "/nextid").await.0, StatusCode::OK);
        clock.rewind(ms(100));
        let (status, body) = get_json(&app, "/nextid").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": true }));

        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "serving" }));

        clock.advance(ms(100));
        assert_eq!(get_json(&app, "/nextid").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn deadline_is_a_transient_failure() {
        let config = GeneratorConfig::builder()
            .layout(Layout::new(39, 8, 1).unwrap())
            .build()
            .unwrap();
        let clock = ManualClock::at(DEFAULT_EPOCH + ms(20));
        let app = app_with(config, clock.clone(), ms(1));

        assert_eq!(get_json(&app, "/nextid").await.0, StatusCode::OK);
        assert_eq!(get_json(&app, "/nextid").await.0, StatusCode::OK);
        let (status, body) = get_json(&app, "/nextid").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": true }));
        assert_eq!(get_json(&app, "/health").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn timestamp_overflow_retires_the_instance() {
        let config = GeneratorConfig::builder()
            .layout(Layout::new(2, 8, 16).unwrap())
            .build()
            .unwrap();
        let clock = ManualClock::at(DEFAULT_EPOCH + ms(30));
        let app = app_with(config, clock.clone(), ms(500));

        assert_eq!(get_json(&app, "/nextid").await.0, StatusCode::OK);
        clock.advance(ms(10));
        let (status, body) = get_json(&app, "/nextid").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": true }));

        let (status, body) = get_json(&app, "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({ "status": "retired" }));

        clock.rewind(ms(10));
        assert_eq!(
            get_json(&app, "/nextid").await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn unknown_paths_are_not_found() {
        let clock = ManualClock::at(DEFAULT_EPOCH + ms(20));
        let app = app_with(GeneratorConfig::default(), clock, ms(500));

        for path in ["/", "/uuid", "/nextid/extra"] {
            let response = app
                .clone()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(&body[..], b"Not Found");
        }
    }
}
