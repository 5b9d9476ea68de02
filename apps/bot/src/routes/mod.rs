pub mod health;
pub mod trigger;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health_handler))
        .route("/health", get(health::health_handler))
        // Manual triggers
        .route("/api/v1/trigger/idea", post(trigger::handle_trigger_idea))
        .route("/api/v1/trigger/meal", post(trigger::handle_trigger_meal))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use super::*;
    use crate::testing::{idea_text, test_bot, RecordingChannel, ScriptedLlm};

    fn app(dir: &TempDir, channel: RecordingChannel, cancel: CancellationToken) -> Router {
        let llm = Arc::new(
            ScriptedLlm::new()
                .draft(Ok(idea_text("앱A", "설명")))
                .draft(Ok("*1️⃣ [굴국밥]*".into())),
        );
        let bot = test_bot(dir, llm, Arc::new(channel), cancel);
        build_router(AppState { bot: Arc::new(bot) })
    }

    async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_on_both_paths() {
        let dir = TempDir::new().unwrap();
        for path in ["/", "/health"] {
            let app = app(&dir, RecordingChannel::accepting(), CancellationToken::new());
            let (status, body) = call(app, "GET", path).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], "ok");
        }
    }

    #[tokio::test]
    async fn test_trigger_idea_delivers() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, RecordingChannel::accepting(), CancellationToken::new());

        let (status, body) = call(app, "POST", "/api/v1/trigger/idea").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["delivered"], true);
        assert_eq!(body["kind"], "idea");
    }

    #[tokio::test]
    async fn test_trigger_meal_delivery_failure_is_502() {
        let dir = TempDir::new().unwrap();
        let app = app(&dir, RecordingChannel::rejecting(), CancellationToken::new());

        let (status, body) = call(app, "POST", "/api/v1/trigger/meal").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "DELIVERY_ERROR");
    }

    #[tokio::test]
    async fn test_trigger_during_shutdown_is_503() {
        let dir = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let app = app(&dir, RecordingChannel::accepting(), cancel);

        let (status, body) = call(app, "POST", "/api/v1/trigger/idea").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SHUTTING_DOWN");
    }
}
