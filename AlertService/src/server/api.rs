//! api.rs — HTTP routes: /traffic-data/{road_id}, /sms/callback, /roads, /health

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::{
    alerts,
    models::types::{Ack, SmsCallback, TrafficReport},
    sms::{SmsError, SmsGateway},
    store::{RoadStore, StoreError},
};

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<RoadStore>,
    pub sms: Arc<dyn SmsGateway>,
    pub personnel: Arc<Vec<String>>,
    pub help_roads: Arc<Vec<String>>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/roads", get(get_roads))
        .route("/traffic-data/:road_id", post(receive_traffic_data))
        .route("/sms/callback", post(sms_callback))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Failures of the ingestion endpoint. Every variant answers HTTP 200 with
/// `{"status":"error","message":..}`; the variant only shows up in the log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid traffic report: {0}")]
    Validation(#[from] serde_json::Error),
    #[error(transparent)]
    Sms(#[from] SmsError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Sms(_) => "sms",
            ApiError::Storage(_) => "storage",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(kind = self.kind(), "Error processing traffic data: {self}");
        (StatusCode::OK, Json(Ack::error(self.to_string()))).into_response()
    }
}

/// Alerts personnel unconditionally, then records the reading.
///
/// The body is parsed by hand so a malformed payload still gets the
/// uniform error body instead of axum's rejection text.
async fn receive_traffic_data(
    State(st): State<ApiState>,
    Path(road_id): Path<String>,
    body: Bytes,
) -> Result<Json<Ack>, ApiError> {
    let report: TrafficReport = serde_json::from_slice(&body)?;
    if let Some(body_road) = report.road_id.as_deref().filter(|r| *r != road_id) {
        debug!("body road_id '{body_road}' ignored, using path '{road_id}'");
    }
    let message = alerts::alert_message(&road_id, &report);

    st.sms.send(&message, &st.personnel).await?;
    info!("SMS sent to traffic personnel: {}", message.replace('\n', " | "));

    st.store.record(&road_id, &report).await?;
    Ok(Json(Ack::success(message)))
}

/// Inbound SMS webhook. Always answers success; a failed reply is only logged.
///
/// The form is read from the raw body whatever the content type, and an
/// unreadable body is treated as an empty message.
async fn sms_callback(State(st): State<ApiState>, body: Bytes) -> Json<Ack> {
    let form = serde_urlencoded::from_bytes::<SmsCallback>(&body).unwrap_or_else(|e| {
        warn!("Unreadable SMS callback body: {e}");
        SmsCallback::default()
    });
    info!("Received SMS from '{}': {:?}", form.from, form.text);
    let query = alerts::normalize_query(&form.text);

    let reply = match st.store.road(&query).await {
        Some(history) => alerts::road_reply(&query, &history),
        None => alerts::help_message(st.help_roads.as_slice()),
    };

    if let Err(e) = st.sms.send(&reply, std::slice::from_ref(&form.from)).await {
        warn!("Error sending SMS: {e}");
    }
    Json(Ack::success(reply))
}

async fn get_roads(State(st): State<ApiState>) -> impl IntoResponse {
    Json(st.store.snapshot().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::types::DEFAULT_HELP_ROADS, sms::testing::RecordingSms};
    use axum::{body::Body, http::Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const EAST: &str = r#"{"vehicle_count":5,"timestamp":"2024-02-22T10:30:45.123456","vehicle_types":{"car":3,"truck":1,"bus":1,"motorbike":0}}"#;

    struct Harness {
        _dir: tempfile::TempDir,
        store: Arc<RoadStore>,
        sms: Arc<RecordingSms>,
        app: Router,
    }

    async fn harness_with(sms: RecordingSms) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RoadStore::open(dir.path().join("traffic_data.json")).await.unwrap());
        let sms = Arc::new(sms);
        let app = router(ApiState {
            store: store.clone(),
            sms: sms.clone(),
            personnel: Arc::new(vec!["+255741827924".into()]),
            help_roads: Arc::new(DEFAULT_HELP_ROADS.iter().map(|r| r.to_string()).collect()),
        });
        Harness { _dir: dir, store, sms, app }
    }

    async fn harness() -> Harness {
        harness_with(RecordingSms::default()).await
    }

    async fn post_json(app: &Router, road: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::post(format!("/traffic-data/{road}"))
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, req).await
    }

    async fn post_sms(app: &Router, form: &str) -> (StatusCode, Value) {
        let req = Request::post("/sms/callback")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        send(app, req).await
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn ingestion_stores_reading_and_alerts() {
        let h = harness().await;
        let (status, body) = post_json(&h.app, "east", EAST).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let history = h.store.road("east").await.unwrap();
        assert_eq!(history.len(), 1);
        let rec = serde_json::to_value(&history["2024-02-22T10:30:45.123456"]).unwrap();
        assert_eq!(
            rec,
            json!({"congestion":"Unknown","number_of_cars":3,"number_of_trucks":1,"time":"2024-02-22T10:30:45.123456"})
        );

        let sent = h.sms.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].0.contains("EAST Road"));
        assert!(sent[0].0.contains("Total Vehicles: 5"));
        assert_eq!(sent[0].1, vec!["+255741827924".to_string()]);
        assert_eq!(body["message"], sent[0].0.as_str());
    }

    #[tokio::test]
    async fn alert_is_sent_below_any_threshold() {
        let h = harness().await;
        let body = r#"{"vehicle_count":0,"timestamp":"t0","vehicle_types":{"car":0,"truck":0,"bus":0,"motorbike":0}}"#;
        let (status, _) = post_json(&h.app, "north", body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(h.sms.sent().len(), 1);
    }

    #[tokio::test]
    async fn reposting_same_timestamp_overwrites() {
        let h = harness().await;
        post_json(&h.app, "east", EAST).await;
        let again = EAST.replace(r#""car":3"#, r#""car":9"#);
        post_json(&h.app, "east", &again).await;

        let history = h.store.road("east").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history["2024-02-22T10:30:45.123456"].number_of_cars, 9);
    }

    #[tokio::test]
    async fn missing_vehicle_class_is_rejected_without_side_effects() {
        let h = harness().await;
        let body = r#"{"vehicle_count":5,"timestamp":"t","vehicle_types":{"car":3,"truck":1,"motorbike":0}}"#;
        let (status, resp) = post_json(&h.app, "east", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "error");
        assert!(resp["message"].as_str().unwrap().contains("bus"));
        assert!(h.store.snapshot().await.is_empty());
        assert!(h.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn garbage_body_is_a_validation_error() {
        let h = harness().await;
        let (status, resp) = post_json(&h.app, "east", "not json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "error");
        assert!(resp["message"].as_str().unwrap().starts_with("invalid traffic report"));
    }

    #[tokio::test]
    async fn gateway_failure_answers_ok_and_nothing_is_stored() {
        let h = harness_with(RecordingSms::failing()).await;
        let (status, resp) = post_json(&h.app, "east", EAST).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "error");
        assert!(h.store.road("east").await.is_none());
        assert!(h.sms.sent().is_empty());
    }

    #[tokio::test]
    async fn storage_failure_answers_ok_with_error_body() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RoadStore::open(dir.path().join("gone").join("t.json")).await.unwrap());
        let app = router(ApiState {
            store,
            sms: Arc::new(RecordingSms::default()),
            personnel: Arc::new(vec![]),
            help_roads: Arc::new(vec![]),
        });

        let (status, resp) = post_json(&app, "east", EAST).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "error");
        assert!(resp["message"].as_str().unwrap().contains("I/O error"));
    }

    #[tokio::test]
    async fn webhook_hit_replies_with_every_reading() {
        let h = harness().await;
        post_json(&h.app, "EAST", EAST).await;
        let second = EAST.replace("10:30:45", "10:40:00").replace(r#""car":3"#, r#""car":6"#);
        post_json(&h.app, "EAST", &second).await;

        let (status, resp) = post_sms(&h.app, "text=+east+&from=%2B255700000009").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "success");

        let reply = resp["message"].as_str().unwrap();
        assert!(reply.starts_with("Road Info for EAST:"));
        assert!(reply.contains("Number of Cars: 3"));
        assert!(reply.contains("Number of Cars: 6"));
        assert!(reply.contains("Time: 2024-02-22T10:40:00.123456"));

        let sent = h.sms.sent();
        let last = sent.last().unwrap();
        assert_eq!(last.0, reply);
        assert_eq!(last.1, vec!["+255700000009".to_string()]);
    }

    #[tokio::test]
    async fn webhook_lookup_is_case_sensitive_on_stored_keys() {
        let h = harness().await;
        post_json(&h.app, "east", EAST).await;

        let (_, resp) = post_sms(&h.app, "text=east&from=x").await;
        assert_eq!(resp["message"], alerts::help_message(&DEFAULT_HELP_ROADS[..]));
    }

    #[tokio::test]
    async fn webhook_miss_returns_help_even_if_sms_fails() {
        let h = harness_with(RecordingSms::failing()).await;
        let (status, resp) = post_sms(&h.app, "text=hello").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "success");
        assert_eq!(resp["message"], alerts::help_message(&DEFAULT_HELP_ROADS[..]));
        // `from` defaults to an empty recipient
        assert_eq!(h.sms.sent()[0].1, vec![String::new()]);
    }

    #[tokio::test]
    async fn webhook_reads_form_without_content_type() {
        let h = harness().await;
        post_json(&h.app, "EAST", EAST).await;

        let req = Request::post("/sms/callback").body(Body::from("text=EAST&from=x")).unwrap();
        let (status, resp) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "success");
        assert!(resp["message"].as_str().unwrap().starts_with("Road Info for EAST:"));
        assert_eq!(h.sms.sent().last().unwrap().1, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn webhook_non_form_body_gets_help() {
        let h = harness().await;
        let req = Request::post("/sms/callback")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text":"EAST"}"#))
            .unwrap();
        let (status, resp) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["status"], "success");
        assert_eq!(resp["message"], alerts::help_message(&DEFAULT_HELP_ROADS[..]));
    }

    #[tokio::test]
    async fn roads_endpoint_returns_document() {
        let h = harness().await;
        post_json(&h.app, "east", EAST).await;

        let req = Request::get("/roads").body(Body::empty()).unwrap();
        let (status, doc) = send(&h.app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(doc["east"]["2024-02-22T10:30:45.123456"]["number_of_trucks"], 1);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let h = harness().await;
        let resp = h
            .app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
