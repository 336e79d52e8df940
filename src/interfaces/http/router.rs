//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{ChargingSessionService, SharedGate};
use crate::config::ServerConfig;
use crate::interfaces::http::common::{ErrorResponse, MessageResponse};
use crate::interfaces::http::middleware::require_unlock;
use crate::interfaces::http::modules::metrics::http_metrics_middleware;
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::{auth, health, metrics, sessions};

/// Unified router state. Axum extracts the specific handler state via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<ChargingSessionService>,
    pub gate: SharedGate,
    pub metrics: PrometheusHandle,
}

impl FromRef<AppState> for sessions::SessionAppState {
    fn from_ref(s: &AppState) -> Self {
        sessions::SessionAppState {
            service: Arc::clone(&s.sessions),
        }
    }
}

impl FromRef<AppState> for SharedGate {
    fn from_ref(s: &AppState) -> Self {
        Arc::clone(&s.gate)
    }
}

impl FromRef<AppState> for PrometheusHandle {
    fn from_ref(s: &AppState) -> Self {
        s.metrics.clone()
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::unlock,
        sessions::get_status,
        sessions::list_sessions,
        sessions::record_session,
        sessions::export_csv,
        sessions::delete_session,
        sessions::delete_all_sessions,
    ),
    components(
        schemas(
            ErrorResponse,
            MessageResponse,
            health::HealthResponse,
            auth::UnlockRequest,
            auth::UnlockResponse,
            sessions::RecordSessionRequest,
            sessions::RecordSessionResponse,
            sessions::RecordedSession,
            sessions::SessionDto,
            sessions::StartedSessionDto,
            sessions::SessionListResponse,
            sessions::StatusResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness check"),
        (name = "Authentication", description = "Passphrase unlock; issues the session cookie"),
        (name = "Sessions", description = "Charging session recording, history and export"),
    ),
    info(
        title = "Charge Recorder API",
        description = "Records EV charging sessions as start/end battery percentages",
    )
)]
pub struct ApiDoc;

/// CORS for the configured origins. Credentials are allowed so the browser
/// sends the session cookie; a `*` entry opens CORS without credentials.
pub fn build_cors(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
        .allow_credentials(true)
}

pub fn create_api_router(
    service: Arc<ChargingSessionService>,
    gate: SharedGate,
    server: &ServerConfig,
    metrics_handle: PrometheusHandle,
) -> Router {
    let state = AppState {
        sessions: service,
        gate: gate.clone(),
        metrics: metrics_handle,
    };

    // Everything except unlock/health/metrics sits behind the gate
    let protected_routes = Router::new()
        .route("/api/status", get(sessions::get_status))
        .route(
            "/api/sessions",
            get(sessions::list_sessions)
                .post(sessions::record_session)
                .delete(sessions::delete_all_sessions),
        )
        .route("/api/sessions/csv", get(sessions::export_csv))
        .route("/api/sessions/{id}", delete(sessions::delete_session))
        .route_layer(middleware::from_fn_with_state(gate, require_unlock));

    let public_routes = Router::new()
        .route("/api/unlock", post(auth::unlock))
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .merge(swagger_routes)
        // Per-route metrics need the matched path, so they run after routing
        .route_layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(build_cors(&server.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, Bytes};
    use axum::http::{HeaderMap, Request, StatusCode};
    use http_body_util::BodyExt;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::application::PassphraseGate;
    use crate::config::AppConfig;
    use crate::infrastructure::database::{connect_and_migrate, DatabaseConfig};
    use crate::infrastructure::SeaOrmSessionRepository;
    use crate::interfaces::http::middleware::SESSION_COOKIE_NAME;

    const PHRASE: &str = "open sesame";

    async fn app(phrase: &str) -> Router {
        let db = connect_and_migrate(&DatabaseConfig::in_memory())
            .await
            .unwrap();
        let service = Arc::new(ChargingSessionService::new(Arc::new(
            SeaOrmSessionRepository::new(db),
        )));
        let mut cfg = AppConfig::default();
        cfg.security.unlock_phrase = phrase.to_string();
        let gate = PassphraseGate::shared(&cfg.security);
        let handle = PrometheusBuilder::new().build_recorder().handle();
        create_api_router(service, gate, &cfg.server, handle)
    }

    struct TestResponse {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    }

    impl TestResponse {
        fn json(&self) -> Value {
            serde_json::from_slice(&self.body).unwrap()
        }

        fn text(&self) -> String {
            String::from_utf8(self.body.to_vec()).unwrap()
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> TestResponse {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = cookie {
            builder = builder.header("cookie", format!("{}={}", SESSION_COOKIE_NAME, token));
        }
        match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn record(app: &Router, kind: &str, percentage: i64) -> TestResponse {
        send(
            app,
            request(
                "POST",
                "/api/sessions",
                None,
                Some(json!({"percentage": percentage, "type": kind})),
            ),
        )
        .await
    }

    /// Unlock and return the issued cookie value
    async fn unlock(app: &Router, phrase: &str) -> Option<String> {
        let resp = send(
            app,
            request("POST", "/api/unlock", None, Some(json!({"phrase": phrase}))),
        )
        .await;
        assert_eq!(resp.status, StatusCode::OK);
        resp.headers
            .get("set-cookie")
            .map(|v| v.to_str().unwrap().to_string())
            .map(|c| {
                c.split(';')
                    .next()
                    .unwrap()
                    .trim_start_matches(&format!("{}=", SESSION_COOKIE_NAME))
                    .to_string()
            })
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = app(PHRASE).await;
        let resp = send(&app, request("GET", "/health", None, None)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.json(), json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn open_gate_serves_requests_without_cookie() {
        let app = app("").await;
        let resp = send(&app, request("GET", "/api/status", None, None)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.json(), json!({"status": "idle"}));

        let resp = send(
            &app,
            request("POST", "/api/unlock", None, Some(json!({"phrase": "anything"}))),
        )
        .await;
        assert_eq!(
            resp.json(),
            json!({"success": true, "message": "No passphrase configured"})
        );
        assert!(resp.headers.get("set-cookie").is_none());
    }

    #[tokio::test]
    async fn locked_gate_rejects_every_protected_route() {
        let app = app(PHRASE).await;
        let cases = [
            ("GET", "/api/status", None),
            ("GET", "/api/sessions", None),
            ("POST", "/api/sessions", Some(json!({"percentage": 50, "type": "start"}))),
            ("GET", "/api/sessions/csv", None),
            ("DELETE", "/api/sessions/1", None),
            ("DELETE", "/api/sessions", None),
        ];
        for (method, uri, body) in cases {
            let resp = send(&app, request(method, uri, None, body)).await;
            assert_eq!(resp.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
            assert_eq!(resp.json(), json!({"detail": "Unauthorized"}));
        }
    }

    #[tokio::test]
    async fn rejected_request_has_no_side_effects() {
        let app = app(PHRASE).await;
        let resp = record(&app, "start", 50).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

        let token = unlock(&app, PHRASE).await.unwrap();
        let resp = send(&app, request("GET", "/api/sessions", Some(&token), None)).await;
        assert_eq!(resp.json(), json!({"sessions": []}));
    }

    #[tokio::test]
    async fn wrong_phrase_sets_no_cookie_and_stays_locked() {
        let app = app(PHRASE).await;
        let resp = send(
            &app,
            request("POST", "/api/unlock", None, Some(json!({"phrase": "nope"}))),
        )
        .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(
            resp.json(),
            json!({"success": false, "message": "Incorrect passphrase"})
        );
        assert!(resp.headers.get("set-cookie").is_none());

        let resp = send(&app, request("GET", "/api/status", Some(PHRASE), None)).await;
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn correct_phrase_sets_cookie_that_unlocks() {
        let app = app(PHRASE).await;
        let resp = send(
            &app,
            request("POST", "/api/unlock", None, Some(json!({"phrase": PHRASE}))),
        )
        .await;
        assert_eq!(resp.json(), json!({"success": true, "message": "Unlocked"}));
        let cookie = resp.headers.get("set-cookie").unwrap().to_str().unwrap();
        assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE_NAME)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains(PHRASE));

        let token = unlock(&app, PHRASE).await.unwrap();
        let resp = send(&app, request("GET", "/api/status", Some(&token), None)).await;
        assert_eq!(resp.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn bearer_token_is_accepted() {
        let app = app(PHRASE).await;
        let token = unlock(&app, PHRASE).await.unwrap();
        let req = Request::builder()
            .uri("/api/status")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, req).await.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn start_end_flow_updates_status_list_and_export() {
        let app = app("").await;

        let resp = record(&app, "start", 50).await;
        assert_eq!(resp.status, StatusCode::OK);
        let body = resp.json();
        assert_eq!(body["message"], "Recorded 50% as start charge");
        assert_eq!(body["session"]["start_percentage"], 50);
        assert!(body["session"].get("end_percentage").is_none());
        let id = body["session"]["id"].as_i64().unwrap();

        let status = send(&app, request("GET", "/api/status", None, None)).await.json();
        assert_eq!(status["status"], "charging");
        assert_eq!(status["start_percentage"], 50);
        assert_eq!(status["start_time"], body["session"]["start_time"]);

        let resp = record(&app, "end", 80).await;
        assert_eq!(resp.status, StatusCode::OK);
        let ended = resp.json();
        assert_eq!(ended["message"], "Recorded 80% as end charge");
        assert_eq!(ended["session"]["id"], id);
        assert_eq!(ended["session"]["end_percentage"], 80);

        let status = send(&app, request("GET", "/api/status", None, None)).await.json();
        assert_eq!(status, json!({"status": "idle"}));

        let list = send(&app, request("GET", "/api/sessions", None, None)).await.json();
        let sessions = list["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["start_percentage"], 50);
        assert_eq!(sessions[0]["end_percentage"], 80);

        let csv = send(&app, request("GET", "/api/sessions/csv", None, None)).await;
        assert_eq!(csv.status, StatusCode::OK);
        let text = csv.text();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], "start_percentage,start_datetime,end_percentage,end_datetime");
        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "50");
        assert_eq!(fields[1], sessions[0]["start_time"].as_str().unwrap());
        assert_eq!(fields[2], "80");
        assert_eq!(fields[3], sessions[0]["end_time"].as_str().unwrap());
        assert_eq!(lines[2], "");
    }

    #[tokio::test]
    async fn csv_export_headers_and_empty_body() {
        let app = app("").await;
        let resp = send(&app, request("GET", "/api/sessions/csv", None, None)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        assert_eq!(
            resp.headers["content-disposition"],
            "attachment; filename=charging_sessions.csv"
        );
        assert_eq!(
            resp.text(),
            "start_percentage,start_datetime,end_percentage,end_datetime\r\n"
        );
    }

    #[tokio::test]
    async fn list_is_newest_first_and_export_oldest_first() {
        let app = app("").await;
        record(&app, "start", 10).await;
        record(&app, "end", 40).await;
        record(&app, "start", 20).await;

        let list = send(&app, request("GET", "/api/sessions", None, None)).await.json();
        let starts: Vec<i64> = list["sessions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["start_percentage"].as_i64().unwrap())
            .collect();
        assert_eq!(starts, vec![20, 10]);
        assert!(list["sessions"][0]["end_percentage"].is_null());
        assert!(list["sessions"][0]["end_time"].is_null());

        let text = send(&app, request("GET", "/api/sessions/csv", None, None)).await.text();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert!(lines[1].starts_with("10,"));
        assert!(lines[2].starts_with("20,"));
        assert!(lines[2].ends_with(",,"));
    }

    #[tokio::test]
    async fn end_without_open_session_is_400() {
        let app = app("").await;
        let resp = record(&app, "end", 80).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json(), json!({"detail": "No active charging session found"}));
    }

    #[tokio::test]
    async fn invalid_percentage_and_type_are_400() {
        let app = app("").await;

        let resp = record(&app, "start", 101).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json()["detail"], "Percentage must be between 0 and 100");

        let resp = record(&app, "end", -1).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);

        let resp = record(&app, "pause", 50).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json()["detail"], "Type must be 'start' or 'end'");

        let resp = send(
            &app,
            request("POST", "/api/sessions", None, Some(json!({"percentage": "fifty", "type": "start"}))),
        )
        .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);

        let list = send(&app, request("GET", "/api/sessions", None, None)).await.json();
        assert_eq!(list, json!({"sessions": []}));
    }

    #[tokio::test]
    async fn percentage_is_checked_before_type() {
        let app = app("").await;
        let resp = record(&app, "", 150).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.json(),
            json!({"detail": "Percentage must be between 0 and 100"})
        );

        let resp = record(&app, "", 50).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json(), json!({"detail": "Type must be 'start' or 'end'"}));
    }

    #[tokio::test]
    async fn long_unknown_type_gets_type_message() {
        let app = app("").await;
        let resp = record(&app, "stopstopstopstopstop", 50).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.json(), json!({"detail": "Type must be 'start' or 'end'"}));
    }

    #[tokio::test]
    async fn malformed_session_id_is_json_400() {
        let app = app("").await;
        let resp = send(&app, request("DELETE", "/api/sessions/abc", None, None)).await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert!(resp.headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        assert!(resp.json()["detail"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn out_of_range_session_id_is_404() {
        let app = app("").await;
        record(&app, "start", 10).await;
        let resp = send(
            &app,
            request("DELETE", "/api/sessions/99999999999", None, None),
        )
        .await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.json(), json!({"detail": "Session not found"}));

        let list = send(&app, request("GET", "/api/sessions", None, None)).await.json();
        assert_eq!(list["sessions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn second_start_is_409() {
        let app = app("").await;
        assert_eq!(record(&app, "start", 30).await.status, StatusCode::OK);
        let resp = record(&app, "start", 35).await;
        assert_eq!(resp.status, StatusCode::CONFLICT);
        assert!(resp.json()["detail"]
            .as_str()
            .unwrap()
            .contains("already in progress"));
    }

    #[tokio::test]
    async fn delete_one_and_delete_all() {
        let app = app("").await;
        let id = record(&app, "start", 10).await.json()["session"]["id"]
            .as_i64()
            .unwrap();

        let resp = send(&app, request("DELETE", &format!("/api/sessions/{}", id), None, None)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.json(), json!({"message": "Session deleted"}));

        let resp = send(&app, request("DELETE", &format!("/api/sessions/{}", id), None, None)).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.json(), json!({"detail": "Session not found"}));

        record(&app, "start", 20).await;
        record(&app, "end", 30).await;
        let resp = send(&app, request("DELETE", "/api/sessions", None, None)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.json(), json!({"message": "All sessions deleted"}));

        let list = send(&app, request("GET", "/api/sessions", None, None)).await.json();
        assert_eq!(list, json!({"sessions": []}));
    }

    #[tokio::test]
    async fn metrics_and_docs_are_public() {
        let app = app(PHRASE).await;
        let resp = send(&app, request("GET", "/metrics", None, None)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let resp = send(&app, request("GET", "/api-doc/openapi.json", None, None)).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.json()["paths"].get("/api/sessions").is_some());
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = app("").await;
        let resp = send(&app, request("GET", "/health", None, None)).await;
        assert!(resp.headers.get("x-request-id").is_some());
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin_with_credentials() {
        let app = app(PHRASE).await;
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/sessions")
            .header("origin", "http://localhost:8080")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let resp = send(&app, req).await;
        assert_eq!(
            resp.headers["access-control-allow-origin"],
            "http://localhost:8080"
        );
        assert_eq!(resp.headers["access-control-allow-credentials"], "true");

        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/sessions")
            .header("origin", "https://evil.example")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let resp = send(&app, req).await;
        assert!(resp.headers.get("access-control-allow-origin").is_none());
    }
}
