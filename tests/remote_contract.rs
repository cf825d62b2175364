//! Contract tests for the outbound queries, run with the real HTTP fetcher
//! against a fake remote service on an ephemeral port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use arcgis_connector::arcgis::{Dispatcher, HttpFetcher, Intent};
use arcgis_connector::config::Settings;
use arcgis_connector::server::{create_router, AppState};
use arcgis_connector::ErrorKind;
use axum::{
    body::Body,
    extract::Query,
    http::{header, Method, Request, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

type Received = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

/// Fake remote answering every GET with `status` and `body`.
async fn spawn_remote(status: StatusCode, body: &'static str) -> (String, Received) {
    let received: Received = Arc::default();
    let log = received.clone();
    let app = Router::new().fallback(
        move |uri: Uri, Query(params): Query<HashMap<String, String>>| {
            let log = log.clone();
            async move {
                log.lock().unwrap().push((uri.path().to_string(), params));
                (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), received)
}

fn dispatcher() -> Dispatcher {
    let settings = Settings::default();
    Dispatcher::new(Arc::new(HttpFetcher::new(&settings).unwrap()), &settings)
}

fn only_request(received: &Received) -> (String, HashMap<String, String>) {
    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1, "expected exactly one outbound call");
    received[0].clone()
}

#[tokio::test]
async fn statistics_query_parameters() {
    let (base, received) = spawn_remote(
        StatusCode::OK,
        r#"{"features": [{"attributes": {"sum_population": 1200, "avg_area": 3.5}}]}"#,
    )
    .await;

    let result = dispatcher()
        .dispatch(
            Intent::GetStatistics,
            json!({
                "layer_url": format!("{}/arcgis/rest/services/Districts/FeatureServer/0/", base),
                "token": "secret",
                "statFields": "population:sum,area:avg"
            }),
        )
        .await
        .unwrap();

    let (path, params) = only_request(&received);
    assert_eq!(path, "/arcgis/rest/services/Districts/FeatureServer/0/query");
    assert_eq!(params["f"], "json");
    assert_eq!(params["where"], "1=1");
    assert_eq!(params["returnGeometry"], "false");
    assert_eq!(params["token"], "secret");
    let out: Value = serde_json::from_str(&params["outStatistics"]).unwrap();
    assert_eq!(
        out,
        json!([
            {"statisticType": "sum", "onStatisticField": "population"},
            {"statisticType": "avg", "onStatisticField": "area"}
        ])
    );
    assert_eq!(
        result["statistics"][0]["attributes"]["sum_population"],
        1200
    );
}

#[tokio::test]
async fn layer_search_parameters() {
    let (base, received) = spawn_remote(
        StatusCode::OK,
        r#"{"results": [{"id": "a1", "title": "Clinics", "url": ""}]}"#,
    )
    .await;

    let result = dispatcher()
        .dispatch(Intent::ListLayers, json!({"portal_url": base, "token": "T"}))
        .await
        .unwrap();

    let (path, params) = only_request(&received);
    assert_eq!(path, "/sharing/rest/search");
    assert_eq!(params["q"], r#"type:"Feature Service" OR type:"Map Service""#);
    assert_eq!(params["num"], "100");
    assert_eq!(
        result,
        json!({"items": [{"id": "a1", "title": "Clinics", "url": null}]})
    );
}

#[tokio::test]
async fn export_forwards_bbox() {
    let (base, received) =
        spawn_remote(StatusCode::OK, r#"{"href": "https://img.example.com/x.png"}"#).await;

    let result = dispatcher()
        .dispatch(
            Intent::ExportMap,
            json!({
                "map_service_url": format!("{}/MapServer", base),
                "token": "T",
                "bbox": [-10, -5, 10, 5]
            }),
        )
        .await
        .unwrap();

    let (path, params) = only_request(&received);
    assert_eq!(path, "/MapServer/export");
    assert_eq!(params["bbox"], "-10,-5,10,5");
    assert_eq!(params["size"], "1024,768");
    assert_eq!(params["format"], "png32");
    assert_eq!(result, json!({"image": "https://img.example.com/x.png"}));
}

#[tokio::test]
async fn remote_error_with_http_error_status() {
    let (base, _received) = spawn_remote(
        StatusCode::BAD_REQUEST,
        r#"{"error": {"code": 400, "message": "Invalid field"}}"#,
    )
    .await;

    let err = dispatcher()
        .dispatch(
            Intent::QueryFeatures,
            json!({"layer_url": format!("{}/FeatureServer/0", base), "token": "T"}),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Service);
}

#[tokio::test]
async fn malformed_body_is_transport_failure() {
    let (base, _received) = spawn_remote(StatusCode::OK, "<html>gateway</html>").await;

    let err = dispatcher()
        .dispatch(
            Intent::QueryFeatures,
            json!({"layer_url": format!("{}/FeatureServer/0", base), "token": "T"}),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn unreachable_service_is_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = dispatcher()
        .dispatch(
            Intent::QueryFeatures,
            json!({"layer_url": format!("http://{}/FeatureServer/0", addr), "token": "T"}),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn transport_errors_do_not_reveal_token() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = dispatcher()
        .dispatch(
            Intent::QueryFeatures,
            json!({"layer_url": format!("http://{}/FeatureServer/0", addr), "token": "SUPERSECRET"}),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(!err.to_string().contains("SUPERSECRET"), "{}", err);
    assert!(!format!("{:?}", err).contains("SUPERSECRET"));
}

#[tokio::test]
async fn nearest_facility_end_to_end() {
    let (base, received) = spawn_remote(
        StatusCode::OK,
        r#"{"features": [
            {"attributes": {"name": "Far"}, "geometry": {"x": 1.009, "y": 2.0}},
            {"attributes": {"name": "Near"}, "geometry": {"x": 1.001, "y": 2.001}}
        ]}"#,
    )
    .await;

    let settings = Settings::default();
    let app = create_router(AppState::new(&settings).unwrap());
    let body = json!({
        "feature_service_url": format!("{}/FeatureServer/0", base),
        "token": "T",
        "x": 1.0,
        "y": 2.0
    });

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/mcp/get_nearest_facility")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["attributes"]["name"], "Near");

    let (path, params) = only_request(&received);
    assert_eq!(path, "/FeatureServer/0/query");
    assert_eq!(params["geometryType"], "esriGeometryEnvelope");
    assert_eq!(params["spatialRel"], "esriSpatialRelIntersects");
    assert_eq!(params["returnGeometry"], "true");
    assert_eq!(params["inSR"], "4326");
    assert_eq!(params["outSR"], "4326");
    let envelope: Value = serde_json::from_str(&params["geometry"]).unwrap();
    assert!((envelope["xmin"].as_f64().unwrap() - 0.99).abs() < 1e-9);
    assert!((envelope["ymax"].as_f64().unwrap() - 2.01).abs() < 1e-9);
    assert_eq!(envelope["spatialReference"]["wkid"], 4326);
}
