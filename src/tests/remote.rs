//! The HTTP client against a local stand-in for the search service.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::png_bytes;
use crate::{
    app::{
        remote::{AppRemote, RemoteAuth},
        RefineRequest, SearchBackend, ServiceError,
    },
    session::{
        types::{Embedding, ImageUpload},
        Orchestrator, Outcome, Phase, Surface,
    },
    shell,
};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn search(
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let k = params
        .get("k")
        .and_then(|k| k.parse::<f32>().ok())
        .unwrap_or(0.0);

    Json(json!({
        "text_results": [{
            "title": params.get("q").cloned().unwrap_or_default(),
            "text": auth,
            "url": "https://en.wikipedia.org/wiki/Cat",
            "score": 0.42,
        }],
        "image_results": [{
            "title": "Cat",
            "filename": "cat.jpg",
            "caption": null,
            "url": null,
            "score": 0.3,
        }],
        "embedding": [k, 0.5],
    }))
}

async fn image_search(mut multipart: Multipart) -> Json<serde_json::Value> {
    let mut fields = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let len = field.bytes().await.unwrap().len();
        fields.push(format!("{name}:{file_name}:{content_type}:{len}"));
    }

    Json(json!({
        "text_results": [],
        "image_results": [{ "title": fields.join(","), "filename": "match.jpg" }],
        "embedding": [0.7],
    }))
}

async fn refine(Json(request): Json<RefineRequest>) -> Json<serde_json::Value> {
    let blended: Vec<f32> = request
        .base_embedding
        .as_slice()
        .iter()
        .map(|v| v * (1.0 - request.alpha))
        .collect();

    Json(json!({
        "text_results": [{ "title": request.refinement, "text": "" }],
        "image_results": [],
        "embedding": blended,
    }))
}

fn service() -> Router {
    Router::new()
        .route("/search", get(search))
        .route("/search/image/unified", post(image_search))
        .route("/search/refine", post(refine))
}

#[tokio::test]
async fn test_text_search_sends_query_and_k() {
    let addr = serve(service()).await;
    let remote = AppRemote::new(&addr, 7, RemoteAuth::None, None).unwrap();

    let resp = remote.search_text("black & white cats").await.unwrap();

    assert_eq!(resp.results.text_results[0].title, "black & white cats");
    assert_eq!(resp.results.text_results[0].score, Some(0.42));
    assert_eq!(resp.results.image_results[0].filename, "cat.jpg");
    assert_eq!(resp.embedding, Embedding::new(vec![7.0, 0.5]));
}

#[tokio::test]
async fn test_auth_header() {
    let addr = serve(service()).await;

    let remote = AppRemote::new(&addr, 5, RemoteAuth::Bearer("tok".into()), None).unwrap();
    let resp = remote.search_text("cats").await.unwrap();
    assert_eq!(resp.results.text_results[0].text, "Bearer tok");

    let remote = AppRemote::new(
        &addr,
        5,
        RemoteAuth::Basic("alice".into(), Some("secret".into())),
        None,
    )
    .unwrap();
    let resp = remote.search_text("cats").await.unwrap();
    assert!(resp.results.text_results[0].text.starts_with("Basic "));
}

#[tokio::test]
async fn test_image_search_uploads_file_field() {
    let addr = serve(service()).await;
    let remote = AppRemote::new(&addr, 5, RemoteAuth::None, None).unwrap();

    let upload = ImageUpload::new("kitten.png", png_bytes());
    let resp = remote.search_image(&upload).await.unwrap();

    assert_eq!(
        resp.results.image_results[0].title.as_deref(),
        Some(format!("file:kitten.png:image/png:{}", png_bytes().len()).as_str())
    );
}

#[tokio::test]
async fn test_refine_posts_json_body() {
    let addr = serve(service()).await;
    let remote = AppRemote::new(&addr, 5, RemoteAuth::None, None).unwrap();

    let resp = remote
        .refine(&RefineRequest {
            base_embedding: Embedding::new(vec![1.0, 2.0]),
            refinement: "at night".into(),
            alpha: 0.5,
        })
        .await
        .unwrap();

    assert_eq!(resp.results.text_results[0].title, "at night");
    assert_eq!(resp.embedding, Embedding::new(vec![0.5, 1.0]));
}

#[tokio::test]
async fn test_error_status_carries_detail() {
    let router = Router::new().route(
        "/search",
        get(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": "query too short" })),
            )
                .into_response()
        }),
    );
    let addr = serve(router).await;
    let remote = AppRemote::new(&addr, 5, RemoteAuth::None, None).unwrap();

    match remote.search_text("x").await {
        Err(ServiceError::Status { status, detail }) => {
            assert_eq!(status, 422);
            assert_eq!(detail, "query too short");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let router = Router::new().route("/search", get(|| async { "<html>oops</html>" }));
    let addr = serve(router).await;
    let remote = AppRemote::new(&addr, 5, RemoteAuth::None, None).unwrap();

    assert!(matches!(
        remote.search_text("cats").await,
        Err(ServiceError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_unreachable_service() {
    // nothing listens on the discard port
    let remote = AppRemote::new("http://127.0.0.1:9", 5, RemoteAuth::None, None).unwrap();
    assert!(matches!(
        remote.search_text("cats").await,
        Err(ServiceError::Reqwest(_))
    ));
}

#[tokio::test]
async fn test_session_against_service() {
    let addr = serve(service()).await;
    let remote = AppRemote::new(&addr, 5, RemoteAuth::None, None).unwrap();
    let mut orch = Orchestrator::new(remote, Surface::default(), super::options());

    let call = orch.text_search("cats").unwrap();
    shell::drive(&mut orch, call, &["black and white".to_string(), "  ".to_string()])
        .await
        .unwrap();

    let session = orch.session();
    assert_eq!(session.phase(), Phase::Showing);
    assert_eq!(session.query_label(), "cats → black and white");
    assert_eq!(session.results().text_results[0].title, "black and white");
    // [5.0, 0.5] blended with alpha 0.6
    let embedding = session.continuity_embedding().unwrap().as_slice().to_vec();
    assert!((embedding[0] - 2.0).abs() < 1e-5);
    assert!((embedding[1] - 0.2).abs() < 1e-5);
}

#[tokio::test]
async fn test_drive_stops_on_failure() {
    let addr = serve(Router::new()).await;
    let remote = AppRemote::new(&addr, 5, RemoteAuth::None, None).unwrap();
    let mut orch = Orchestrator::new(remote, Surface::default(), super::options());

    let call = orch.text_search("cats").unwrap();
    let err = shell::drive(&mut orch, call, &["never sent".to_string()])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("404"));
    assert_eq!(orch.session().phase(), Phase::Idle);
}

#[tokio::test]
async fn test_gate_with_real_client() {
    let addr = serve(service()).await;
    let remote = AppRemote::new(&addr, 5, RemoteAuth::None, None).unwrap();
    let mut orch = Orchestrator::new(remote, Surface::default(), super::options());

    let first = orch.text_search("cats").unwrap();
    let second = orch.text_search("dogs").unwrap();

    let (a, b) = futures::join!(first, second);
    assert_eq!(orch.complete(b), Outcome::Applied);
    assert_eq!(orch.complete(a), Outcome::Stale);
    assert_eq!(orch.session().query_label(), "dogs");
}
