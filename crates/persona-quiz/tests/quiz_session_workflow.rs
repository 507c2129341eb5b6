//! End-to-end quiz attempts driven through the public service facade and HTTP router.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use persona_quiz::config::QuizConfig;
    use persona_quiz::quiz::{
        Locale, QuizCatalog, QuizService, RepositoryError, SessionId, SessionRecord,
        SessionRepository,
    };

    #[derive(Default, Clone)]
    pub struct MemoryRepository {
        records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
    }

    impl SessionRepository for MemoryRepository {
        fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
            let mut guard = self.records.lock().expect("repository mutex poisoned");
            if guard.contains_key(&record.id) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(record.id.clone(), record.clone());
            Ok(record)
        }

        fn update(&self, record: SessionRecord) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("repository mutex poisoned");
            guard.insert(record.id.clone(), record);
            Ok(())
        }

        fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
            let guard = self.records.lock().expect("repository mutex poisoned");
            Ok(guard.get(id).cloned())
        }

        fn remove(&self, id: &SessionId) -> Result<(), RepositoryError> {
            let mut guard = self.records.lock().expect("repository mutex poisoned");
            guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
        }
    }

    pub fn service() -> Arc<QuizService<MemoryRepository>> {
        let config = QuizConfig {
            public_origin: "https://quiz.example".to_string(),
            loading_override: Some(Duration::from_millis(30)),
            default_locale: Locale::En,
            session_ttl: None,
        };
        Arc::new(QuizService::new(
            Arc::new(MemoryRepository::default()),
            Arc::new(QuizCatalog::standard()),
            &config,
        ))
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use persona_quiz::quiz::{quiz_router, ClientCapabilities, Locale, QuizPhase};

async fn call(router: &axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
        .expect("valid request");
    let response = router.clone().oneshot(request).await.expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json payload")
    };
    (status, payload)
}

#[tokio::test]
async fn played_result_reopens_from_its_share_link() {
    let service = common::service();

    let record = service.create(Some("en"), None).expect("session");
    let id = record.id.clone();
    service.start(&id).expect("start");
    for (question_id, option) in [(1, 2), (2, 1), (3, 0), (4, 2), (5, 0)] {
        service.answer(&id, question_id, option).expect("answer");
    }
    let record = service.complete(&id).await.expect("scored");
    assert_eq!(record.controller.phase(), QuizPhase::Result);

    let capabilities = ClientCapabilities {
        clipboard: true,
        ..ClientCapabilities::default()
    };
    let shared = service.share(&id, &capabilities, &[]).expect("share");
    assert_eq!(
        shared.url,
        "https://quiz.example/?result=50&type=2&shared=true&lang=en"
    );

    let query = shared.url.split_once('?').map(|(_, query)| query);
    let reopened = service.create(None, query).expect("shared session");
    assert!(reopened.controller.is_shared());
    assert_eq!(reopened.controller.locale(), Locale::En);
    assert_eq!(reopened.controller.result(), record.controller.result());

    let restarted = service.restart(&reopened.id).expect("restart");
    assert_eq!(restarted.controller.phase(), QuizPhase::Intro);
    assert_eq!(restarted.view(service.timer()).location, "/");
}

#[tokio::test]
async fn http_attempt_in_korean_switches_to_english_mid_quiz() {
    let service = common::service();
    let router = quiz_router(service);

    let (status, created) = call(&router, "POST", "/api/v1/sessions", json!({ "lang": "ko" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["location"], "/ko.html");
    let id = created["session_id"].as_str().expect("id").to_string();

    let (_, view) = call(&router, "POST", &format!("/api/v1/sessions/{id}/start"), json!({})).await;
    let korean_text = view["question"]["text"].as_str().expect("text").to_string();

    let (status, view) = call(
        &router,
        "POST",
        &format!("/api/v1/sessions/{id}/locale"),
        json!({ "lang": "en-US" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["locale"], "en");
    assert_eq!(view["question"]["index"], 0);
    assert_ne!(view["question"]["text"].as_str(), Some(korean_text.as_str()));

    for question_id in 1..=5 {
        let (status, _) = call(
            &router,
            "POST",
            &format!("/api/v1/sessions/{id}/answers"),
            json!({ "question_id": question_id, "selected_option": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, view) = call(&router, "POST", &format!("/api/v1/sessions/{id}/complete"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["result"]["percentage"], 50);

    let (status, delivery) = call(
        &router,
        "POST",
        &format!("/api/v1/sessions/{id}/export"),
        json!({ "capabilities": { "file_system_access": true } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(delivery["strategy"], "save_file_picker");
    assert_eq!(
        delivery["instruction"]["suggested_name"],
        "psychopath-test-result-50%.png"
    );
    assert_eq!(delivery["notice"], "Your result image was saved!");

    let (status, _) = call(&router, "POST", &format!("/api/v1/sessions/{id}/complete"), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
