use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::Method,
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rand::Rng;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use protectme_shared::constants::{
    ALERTS_SYNC_PATH, HEALTH_PATH, METRICS_PATH, REPORTS_SYNC_PATH, RESOURCES_PATH,
};
use protectme_shared::protocol::{
    HealthResponse, ResourceRecord, SyncAck, SyncAlertRequest, SyncReportRequest,
};
use protectme_shared::ResourceCategory;

use crate::auth::require_api_key;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::metrics::{MetricsSnapshot, SyncKind, SyncMetrics};

/// Records received so far.  Demo only: lost on restart.
#[derive(Default)]
pub struct SyncedRecords {
    pub reports: Vec<SyncReportRequest>,
    pub alerts: Vec<SyncAlertRequest>,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub records: Arc<Mutex<SyncedRecords>>,
    pub metrics: Arc<SyncMetrics>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            records: Arc::new(Mutex::new(SyncedRecords::default())),
            metrics: Arc::new(SyncMetrics::default()),
            started_at: Instant::now(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route(HEALTH_PATH, get(health_check))
        .route(METRICS_PATH, get(metrics))
        .route(REPORTS_SYNC_PATH, post(sync_report))
        .route(ALERTS_SYNC_PATH, post(sync_alert))
        .route(RESOURCES_PATH, get(resources))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            require_api_key,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsResponse {
    uptime_secs: u64,
    sync_operations: MetricsSnapshot,
    reports_stored: usize,
    alerts_stored: usize,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let records = state.records.lock().await;
    Json(MetricsResponse {
        uptime_secs: state.started_at.elapsed().as_secs(),
        sync_operations: state.metrics.snapshot(),
        reports_stored: records.reports.len(),
        alerts_stored: records.alerts.len(),
    })
}

async fn sync_report(
    State(state): State<AppState>,
    payload: Result<Json<SyncReportRequest>, JsonRejection>,
) -> Result<Json<SyncAck>, ServerError> {
    let Json(report) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    info!(report_id = report.id, "Syncing report");

    if simulate_failure(state.config.report_failure_rate) {
        return Err(failed(&state, SyncKind::Report, report.id));
    }

    let id = {
        let mut records = state.records.lock().await;
        records.reports.push(report.clone());
        format!("report-{}", records.reports.len())
    };
    state.metrics.record(SyncKind::Report, true);
    info!(report_id = report.id, remote_id = %id, "Report synced");

    Ok(Json(SyncAck { id: id.into() }))
}

async fn sync_alert(
    State(state): State<AppState>,
    payload: Result<Json<SyncAlertRequest>, JsonRejection>,
) -> Result<Json<SyncAck>, ServerError> {
    let Json(alert) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    info!(alert_id = alert.id, "Syncing alert");

    if simulate_failure(state.config.alert_failure_rate) {
        return Err(failed(&state, SyncKind::Alert, alert.id));
    }

    let id = {
        let mut records = state.records.lock().await;
        records.alerts.push(alert.clone());
        format!("alert-{}", records.alerts.len())
    };
    state.metrics.record(SyncKind::Alert, true);
    info!(alert_id = alert.id, remote_id = %id, "Alert synced");

    Ok(Json(SyncAck { id: id.into() }))
}

async fn resources() -> Json<Vec<ResourceRecord>> {
    Json(static_resources())
}

fn simulate_failure(rate: f64) -> bool {
    rate > 0.0 && rand::thread_rng().gen_bool(rate.min(1.0))
}

fn failed(state: &AppState, kind: SyncKind, id: i64) -> ServerError {
    state.metrics.record(kind, false);
    warn!(kind = kind.as_str(), id, "Simulated sync failure");
    ServerError::SyncFailed
}

/// The directory served to clients.
fn static_resources() -> Vec<ResourceRecord> {
    vec![
        ResourceRecord {
            id: 1,
            name: "Nairobi Women's Hospital GVRC – Adams".to_string(),
            category: ResourceCategory::GbvCentre,
            phone: "+254 709 667 000".to_string(),
            address: "Ngong Rd, Adams Arcade, Nairobi, Kenya".to_string(),
            latitude: Some(-1.2987),
            longitude: Some(36.7819),
            is_open_24h: true,
        },
        ResourceRecord {
            id: 2,
            name: "Kenya National GBV Helpline 1195".to_string(),
            category: ResourceCategory::Helpline,
            phone: "+254 780 119 500".to_string(),
            address: "24/7 toll-free helpline within Kenya".to_string(),
            latitude: None,
            longitude: None,
            is_open_24h: true,
        },
    ]
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, shutting down");
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use protectme_shared::constants::API_KEY_HEADER;

    use super::*;

    fn state_with_rates(report: f64, alert: f64) -> AppState {
        AppState::new(ServerConfig {
            api_key: "test-key".into(),
            report_failure_rate: report,
            alert_failure_rate: alert,
            ..Default::default()
        })
    }

    async fn call(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
        let resp = build_router(state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_req(path: &str, key: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(path);
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(path: &str, body: Value) -> Request<Body> {
        Request::post(path)
            .header(API_KEY_HEADER, "test-key")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn report_body(id: i64) -> Value {
        json!({
            "id": id,
            "title": "Unwanted contact",
            "description": "Details here",
            "isAnonymous": true,
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-01T10:00:00.000Z"
        })
    }

    #[tokio::test]
    async fn health_is_public() {
        let state = state_with_rates(0.0, 0.0);
        let (status, body) = call(&state, get_req("/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn metrics_are_public() {
        let state = state_with_rates(0.0, 0.0);
        let (status, body) = call(&state, get_req("/metrics", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["syncOperations"]["report"]["success"], 0);
    }

    #[tokio::test]
    async fn missing_or_wrong_key_is_unauthorized() {
        let state = state_with_rates(0.0, 0.0);

        let (status, body) = call(&state, get_req("/resources", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Unauthorized" }));

        let (status, _) = call(&state, get_req("/resources", Some("nope"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn resources_are_served_with_key() {
        let state = state_with_rates(0.0, 0.0);
        let (status, body) = call(&state, get_req("/resources", Some("test-key"))).await;
        assert_eq!(status, StatusCode::OK);

        let resources: Vec<ResourceRecord> = serde_json::from_value(body).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].category, ResourceCategory::GbvCentre);
        assert_eq!(resources[1].latitude, None);
    }

    #[tokio::test]
    async fn report_sync_stores_and_counts() {
        let state = state_with_rates(0.0, 0.0);
        let (status, body) = call(&state, post_json("/reports/sync", report_body(7))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["id"].is_string());

        assert_eq!(state.records.lock().await.reports[0].id, 7);
        assert_eq!(state.metrics.snapshot().report.success, 1);
    }

    #[tokio::test]
    async fn simulated_failure_answers_500() {
        let state = state_with_rates(1.0, 1.0);

        let (status, body) = call(&state, post_json("/reports/sync", report_body(1))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Sync failed" }));

        let alert = json!({ "id": 3, "phoneNumber": "112", "createdAt": "2024-05-01T10:00:00Z" });
        let (status, _) = call(&state, post_json("/alerts/sync", alert)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let snap = state.metrics.snapshot();
        assert_eq!(snap.report.failed, 1);
        assert_eq!(snap.alert.failed, 1);
        assert!(state.records.lock().await.reports.is_empty());
    }

    #[tokio::test]
    async fn alert_sync_acknowledges() {
        let state = state_with_rates(0.0, 0.0);
        let alert = json!({ "id": 3, "phoneNumber": "112", "createdAt": "2024-05-01T10:00:00Z" });
        let (status, body) = call(&state, post_json("/alerts/sync", alert)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "alert-1");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let state = state_with_rates(0.0, 0.0);
        let (status, body) = call(&state, post_json("/reports/sync", json!({ "id": "x" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
    }
}
