//! Tests d'intégration : clients HTTP contre un backend axum local

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use ndvi_core::{DrawEvent, HeadlessSurface, LatLng, Region};
use ndvi_explorer::api::{AnalysisOptions, NdviRequest, SatelliteSource};
use ndvi_explorer::chat::{ChatClient, ChatContext, Conversation, FALLBACK_REPLY};
use ndvi_explorer::{AnalysisBackend, AnalysisClient, AnalysisSession, ApiError, FetchStatus};

type Received = Arc<Mutex<Vec<Value>>>;

async fn ndvi_tiles(State(received): State<Received>, Json(body): Json<Value>) -> Response {
    received.lock().unwrap().push(body.clone());

    // longitude du premier sommet > 100 : zone refusée
    let lng = body["polygon"]["coordinates"][0][0][0].as_f64().unwrap_or(0.0);
    if lng > 100.0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "Polygon outside the supported area"})),
        )
            .into_response();
    }
    if lng < -100.0 {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    Json(json!({
        "ndvi_tiles": {
            "url": "https://ee/median/{z}/{x}/{y}",
            "attribution": "Google Earth Engine | sentinel-2",
            "min": 0, "max": 1,
            "satellite": body["satellite_source"],
            "start_date": body["start_date"],
            "end_date": body["end_date"]
        },
        "time_series": {
            "data": [
                {"date": "2024-11-05", "ndvi": 0.31, "url": "https://ee/t1/{z}/{x}/{y}"},
                {"date": "2024-11-15", "ndvi": 0.35, "url": "https://ee/t2/{z}/{x}/{y}"},
                {"date": "2024-11-25", "ndvi": 0.42, "url": "https://ee/t3/{z}/{x}/{y}"}
            ],
            "count": 3,
            "timestamps": ["2024-11-05", "2024-11-15", "2024-11-25"],
            "summary": {"min_ndvi": 0.31, "max_ndvi": 0.42, "mean_ndvi": 0.36},
            "rgb_visualization": {
                "url": "https://ee/rgb/{z}/{x}/{y}",
                "dates": ["2024-11-05", "2024-11-15", "2024-11-25"]
            }
        },
        "weather": {
            "data": [{"date": "2024-11-15", "temperature_celsius": 9.1, "precipitation_mm": 3.4}],
            "count": 1
        }
    }))
    .into_response()
}

async fn auth_status() -> Json<Value> {
    Json(json!({
        "authenticated": true,
        "message": "Earth Engine authenticated",
        "instructions": ["Service account in use"]
    }))
}

async fn chat(Json(body): Json<Value>) -> Response {
    if body["message"] == "fail" {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "Internal Server Error"})))
            .into_response();
    }
    let reply = format!(
        "{} / NDVI {}",
        body["context"]["selectedRegion"]["name"].as_str().unwrap_or("none"),
        body["context"]["currentNdvi"]
    );
    Json(json!({ "message": reply })).into_response()
}

async fn spawn_backend() -> (SocketAddr, Received) {
    let received: Received = Arc::default();
    let app = Router::new()
        .route("/ndvi-tiles/", post(ndvi_tiles))
        .route("/auth-status/", get(auth_status))
        .route("/api/chat", post(chat))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, received)
}

fn client(addr: SocketAddr) -> AnalysisClient {
    AnalysisClient::new(format!("http://{addr}/"), Duration::from_secs(5)).unwrap()
}

fn request(lng: f64) -> NdviRequest {
    let region = Region::from_vertices(vec![
        LatLng::new(45.0, lng),
        LatLng::new(45.0, lng + 0.1),
        LatLng::new(45.1, lng + 0.1),
    ])
    .unwrap();
    NdviRequest::new(region.to_geojson(), AnalysisOptions::default())
}

#[tokio::test]
async fn test_fetch_ndvi_success() {
    let (addr, received) = spawn_backend().await;
    let response = client(addr).fetch_ndvi(request(5.0)).await.unwrap();

    assert_eq!(response.ndvi_tiles.satellite, "sentinel-2");
    let series = response.time_series.unwrap();
    assert_eq!(series.data.len(), 3);
    assert_eq!(series.rgb_visualization.unwrap().dates.len(), 3);

    let body = received.lock().unwrap()[0].clone();
    assert_eq!(body["polygon"]["type"], "Polygon");
    assert_eq!(body["polygon"]["coordinates"][0][0], json!([5.0, 45.0]));
    assert_eq!(body["polygon"]["coordinates"][0][3], json!([5.0, 45.0]));
    assert_eq!(body["include_landcover"], true);
}

#[tokio::test]
async fn test_fetch_ndvi_detail_surfaced_verbatim() {
    let (addr, _) = spawn_backend().await;
    let err = client(addr).fetch_ndvi(request(120.0)).await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 400, .. }));
    assert_eq!(err.user_message(), "Polygon outside the supported area");
}

#[tokio::test]
async fn test_fetch_ndvi_without_detail() {
    let (addr, _) = spawn_backend().await;
    let err = client(addr).fetch_ndvi(request(-120.0)).await.unwrap_err();
    assert_eq!(err.user_message(), "API error: 500");
}

#[tokio::test]
async fn test_auth_status() {
    let (addr, _) = spawn_backend().await;
    let status = client(addr).auth_status().await;

    assert!(status.authenticated);
    assert_eq!(status.instructions.unwrap(), vec!["Service account in use"]);
}

#[tokio::test]
async fn test_auth_status_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let status = client(addr).auth_status().await;
    assert!(!status.authenticated);
    assert_eq!(status.message, "Could not connect to API server");
}

#[tokio::test]
async fn test_session_against_http_backend() {
    let (addr, received) = spawn_backend().await;
    let options = AnalysisOptions {
        satellite_source: SatelliteSource::Landsat8,
        ..AnalysisOptions::default()
    };
    let session = AnalysisSession::new(HeadlessSurface::new(), Arc::new(client(addr)), options);

    session.handle_draw_event(DrawEvent::Created(vec![
        LatLng::new(45.0, 5.0),
        LatLng::new(45.0, 5.1),
        LatLng::new(45.1, 5.1),
    ]));
    let request = session.confirm().unwrap();

    assert_eq!(
        session.wait_for_fetch(request).await,
        FetchStatus::Ready { request, frames: 3 }
    );
    assert_eq!(received.lock().unwrap()[0]["satellite_source"], "landsat-8");

    let frames = session.frames();
    assert_eq!(frames[1].temperature, Some(9.1));
    assert_eq!(frames[0].temperature, None);
    assert_eq!(session.summary().unwrap().mean_ndvi, Some(0.36));
}

#[tokio::test]
async fn test_chat_relay() {
    let (addr, _) = spawn_backend().await;
    let url = format!("http://{addr}/api/chat");
    let relay = Arc::new(ChatClient::new(url, Duration::from_secs(5)).unwrap());
    let mut conversation = Conversation::new(relay);

    let context = ChatContext {
        current_ndvi: Some(0.5),
        ..ChatContext::default()
    };
    let reply = conversation.send("How healthy?", &context).await.cloned().unwrap();
    assert_eq!(reply.content, "none / NDVI 0.5");

    let reply = conversation.send("fail", &context).await.cloned().unwrap();
    assert_eq!(reply.content, FALLBACK_REPLY);
    assert_eq!(conversation.messages().len(), 5);
}
