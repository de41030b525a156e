//! Router behaviour with stub models.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{three_movies, CannedChat};
use flick_core::{ChatError, ChatModel};
use flick_server::{build_index, create_router, AppState, ChatLoader, LlmHandle, Recommender};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn recommender() -> Recommender {
    let (movies, embedder) = three_movies();
    let store = build_index(movies, &embedder, 8, |_| {}).unwrap();
    Recommender::new(store, Arc::new(embedder)).unwrap()
}

fn canned_loader(reply: &'static str, loads: Arc<AtomicUsize>) -> ChatLoader {
    Arc::new(move || {
        loads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        Ok(Arc::new(CannedChat::new(reply)) as Arc<dyn ChatModel>)
    })
}

fn app(llm: LlmHandle) -> Router {
    create_router(AppState::new(recommender(), llm))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post_form(app: Router, uri: &str, body: &str) -> (StatusCode, String) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_landing_page() {
    let (status, body) = get(app(LlmHandle::disabled()), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Welcome to the Movie Recommender API!"));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get(app(LlmHandle::disabled()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"ok\""));
}

#[tokio::test]
async fn test_forms_render() {
    for uri in ["/recommend_movies", "/recommend_movies_llm"] {
        let (status, body) = get(app(LlmHandle::disabled()), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(&format!(r#"action="{}""#, uri)));
        assert!(body.contains(r#"name="num_recommendations""#));
    }
}

#[tokio::test]
async fn test_recommend_movies_lists_nearest_first() {
    let (status, body) = post_form(
        app(LlmHandle::disabled()),
        "/recommend_movies",
        "description=q&num_recommendations=2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let bravo = body.find("Bravo").unwrap();
    let alpha = body.find("Alpha").unwrap();
    assert!(bravo < alpha);
    assert!(!body.contains("Charlie"));
    assert!(body.contains("1.0000"));
}

#[tokio::test]
async fn test_invalid_count_is_bad_request() {
    for count in ["0", "-1", "lots", ""] {
        let (status, body) = post_form(
            app(LlmHandle::disabled()),
            "/recommend_movies",
            &format!("description=q&num_recommendations={}", count),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "count {:?}", count);
        assert!(body.contains("positive integer"));
        assert!(body.contains("<form"));
    }
}

#[tokio::test]
async fn test_missing_description_is_bad_request() {
    let (status, _) = post_form(
        app(LlmHandle::disabled()),
        "/recommend_movies_llm",
        "num_recommendations=2",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_llm_page_shows_answer_after_marker() {
    let loads = Arc::new(AtomicUsize::new(0));
    let llm = LlmHandle::new(canned_loader(
        "<think>they asked for q</think>\nBravo\nClosest <match>.",
        loads.clone(),
    ));

    let (status, body) = post_form(
        app(llm),
        "/recommend_movies_llm",
        "description=q&num_recommendations=2",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Closest &lt;match&gt;."));
    assert!(!body.contains("they asked for q"));
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_llm_unconfigured_is_service_unavailable() {
    let (status, body) = post_form(
        app(LlmHandle::disabled()),
        "/recommend_movies_llm",
        "description=q&num_recommendations=1",
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body.contains("not available"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_llm_loads_once_under_concurrent_requests() {
    let loads = Arc::new(AtomicUsize::new(0));
    let router = app(LlmHandle::new(canned_loader("</think>ok", loads.clone())));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let router = router.clone();
            tokio::spawn(async move {
                post_form(
                    router,
                    "/recommend_movies_llm",
                    "description=q&num_recommendations=1",
                )
                .await
            })
        })
        .collect();

    for handle in handles {
        let (status, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_load_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let loader: ChatLoader = Arc::new(move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(ChatError::ModelNotLoaded("disk busy".to_string()))
        } else {
            Ok(Arc::new(CannedChat::new("</think>fine")) as Arc<dyn ChatModel>)
        }
    });
    let handle = LlmHandle::new(loader);

    assert!(handle.get().await.is_err());
    assert!(!handle.is_loaded());
    assert!(handle.get().await.is_ok());
    assert_eq!(handle.load_count(), 2);
}
