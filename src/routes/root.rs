use crate::config::parameter::ServerSettings;
use crate::realtime::socket;
use crate::routes::{history, queue, rank};
use crate::service::AppServices;
use crate::state::history_state::HistoryState;
use crate::state::queue_state::QueueState;
use crate::state::rank_state::RankState;
use crate::state::realtime_state::RealtimeState;
use axum::routing::{get, IntoMakeService};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn app(services: &AppServices, settings: &ServerSettings) -> Router {
    let api_router = Router::new()
        .merge(queue::routes().with_state(QueueState::new(services)))
        .merge(history::routes().with_state(HistoryState::new(services)))
        .merge(rank::routes().with_state(RankState::new(services)));

    Router::new()
        .nest("/api", api_router)
        .merge(
            Router::new()
                .route("/ws", get(socket::ws_handler))
                .with_state(RealtimeState::new(services)),
        )
        .merge(Router::new().route("/health", get(|| async move { "Healthy..." })))
        // 上传目录的静态文件
        .nest_service("/uploads", ServeDir::new(&settings.upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

pub fn routes(services: &AppServices, settings: &ServerSettings) -> IntoMakeService<Router> {
    app(services, settings).into_make_service()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn anonymous_image_waits_first_in_line() {
        let ctx = test_support::context().await;
        let app = app(&ctx.services, &ctx.settings);

        let (status, created) = call(
            &app,
            Method::POST,
            "/api/submissions",
            Some(json!({
                "type": "image",
                "durationSeconds": 30,
                "amount": 0,
                "sender": "Walk-in",
                "mediaPath": "/uploads/walk-in.jpg"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["success"], true);
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let (_, queue) = call(&app, Method::GET, "/api/queue", None).await;
        let records = queue["data"].as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], id.as_str());
        assert_eq!(records[0]["status"], "pending");
        assert_eq!(records[0]["type"], "image");

        let (_, order) = call(&app, Method::GET, &format!("/api/order-status/{id}"), None).await;
        assert_eq!(order["data"], json!({ "state": "pending", "position": 1 }));

        let (_, rankings) = call(&app, Method::GET, "/api/rankings", None).await;
        assert_eq!(rankings["data"]["total"], 0);
    }

    #[tokio::test]
    async fn lifecycle_over_http() {
        let ctx = test_support::context().await;
        let app = app(&ctx.services, &ctx.settings);
        let record = ctx.pending_image("http.jpg").await;
        let base = format!("/api/queue/{}", record.id);

        let (status, approved) =
            call(&app, Method::POST, &format!("{base}/approve"), Some(json!({ "width": 720 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["data"]["status"], "approved");
        assert_eq!(approved["data"]["width"], 720);

        let (status, _) = call(&app, Method::POST, &format!("{base}/playing"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, snapshot) = call(&app, Method::GET, "/api/status", None).await;
        assert_eq!(snapshot["data"]["queue"]["playing"], record.id.as_str());

        let (status, _) = call(&app, Method::POST, &format!("{base}/complete"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, again) = call(&app, Method::POST, &format!("{base}/complete"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(again["success"], false);

        let (_, history) = call(&app, Method::GET, "/api/history", None).await;
        let entries = history["data"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["outcome"], "completed");
        let history_id = entries[0]["id"].as_str().unwrap().to_string();

        let (status, restored) = call(
            &app,
            Method::POST,
            &format!("/api/history/{history_id}/restore"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_ne!(restored["data"]["id"], record.id.as_str());

        let (_, cleared) = call(&app, Method::DELETE, "/api/history", None).await;
        assert_eq!(cleared["data"]["deleted"], 1);
    }

    #[tokio::test]
    async fn reject_with_empty_body_archives_the_item() {
        let ctx = test_support::context().await;
        let app = app(&ctx.services, &ctx.settings);
        let record = ctx.pending_image("nope.jpg").await;

        let (status, _) =
            call(&app, Method::POST, &format!("/api/queue/{}/reject", record.id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, queue) = call(&app, Method::GET, "/api/queue", None).await;
        assert!(queue["data"].as_array().unwrap().is_empty());
        let (_, history) = call(&app, Method::GET, "/api/history", None).await;
        assert_eq!(history["data"][0]["outcome"], "rejected");
        assert!(history["data"][0]["decisionAt"].is_string());
        assert!(!ctx.upload_dir().join("nope.jpg").exists());
    }

    #[tokio::test]
    async fn invalid_requests_get_error_envelopes() {
        let ctx = test_support::context().await;
        let app = app(&ctx.services, &ctx.settings);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/submissions",
            Some(json!({ "type": "text", "durationSeconds": 0, "sender": "X", "text": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, _) = call(&app, Method::POST, "/api/queue/missing/approve", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::GET, "/api/rankings?limit=500", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::DELETE, "/api/history/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
