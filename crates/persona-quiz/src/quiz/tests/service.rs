use std::sync::Arc;
use std::time::Duration;

use super::common::*;
use crate::config::QuizConfig;
use crate::quiz::delivery::{ClientCapabilities, DeliveryInstruction};
use crate::quiz::locale::Locale;
use crate::quiz::navigation::Navigator;
use crate::quiz::repository::{RepositoryError, SessionId, SessionRepository};
use crate::quiz::session::{QuizPhase, SessionError};
use crate::quiz::{QuizService, QuizServiceError};

#[test]
fn create_defaults_to_configured_locale_entry() {
    let (service, repository) = build_service();

    let record = service.create(None, None).expect("session created");

    assert_eq!(record.controller.phase(), QuizPhase::Intro);
    assert_eq!(record.controller.locale(), Locale::Ko);
    assert_eq!(record.navigator.current_url(), "/ko.html");
    assert_eq!(repository.len(), 1);
}

#[test]
fn create_from_share_query_opens_result() {
    let (service, _) = build_service();

    let record = service
        .create(Some("en-GB"), Some("?result=75&type=3&shared=true&lang=en"))
        .expect("session created");

    assert_eq!(record.controller.phase(), QuizPhase::Result);
    assert!(record.controller.is_shared());
    assert_eq!(record.controller.locale(), Locale::En);
    assert_eq!(
        record.navigator.current_url(),
        "/?result=75&type=3&shared=true&lang=en"
    );

    let view = record.view(service.timer());
    let result = view.result.expect("result view");
    assert_eq!(result.percentage, 75);
    assert_eq!(result.accent_color, "#f97316");
}

#[test]
fn invalid_share_query_falls_back_to_intro() {
    let (service, _) = build_service();
    let record = service
        .create(Some("en"), Some("result=abc&type=1&shared=true"))
        .expect("session created");
    assert_eq!(record.controller.phase(), QuizPhase::Intro);
    assert!(!record.controller.is_shared());
}

#[tokio::test]
async fn full_attempt_scores_and_shares() {
    let (service, repository) = build_service();
    let id = service.create(None, None).expect("session").id;

    let record = answer_all(&service, &id, &[2, 1, 0, 2, 2]);
    assert_eq!(record.controller.phase(), QuizPhase::Loading);

    let record = service.complete(&id).await.expect("scored");
    let result = record.controller.result().expect("result present");
    assert_eq!(result.percentage, 70);
    assert_eq!(result.band_index, 3);

    let stored = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("record present");
    assert_eq!(stored.controller.phase(), QuizPhase::Result);

    let capabilities = ClientCapabilities {
        clipboard: true,
        ..ClientCapabilities::default()
    };
    let outcome = service
        .share(&id, &capabilities, &[])
        .expect("share planned");
    assert_eq!(
        outcome.url,
        "https://quiz.example/ko.html?result=70&type=3&shared=true&lang=ko"
    );
    assert_eq!(outcome.delivery.strategy, "clipboard");

    let delivery = service
        .export(&id, &ClientCapabilities::default(), &[])
        .expect("export planned");
    assert_eq!(
        delivery.instruction,
        DeliveryInstruction::Download {
            filename: "psychopath-test-result-70%.png".to_string(),
            mime_type: "image/png",
        }
    );
}

#[tokio::test(start_paused = true)]
async fn complete_waits_out_the_loading_animation() {
    let repository = Arc::new(MemoryRepository::default());
    let config = QuizConfig {
        loading_override: None,
        ..quiz_config()
    };
    let service = QuizService::new(repository, standard(), &config);
    let id = service.create(Some("en"), None).expect("session").id;

    answer_all(&service, &id, &[0, 0, 0, 0, 1]);
    let started = tokio::time::Instant::now();

    let record = service.complete(&id).await.expect("scored");

    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert_eq!(record.controller.phase(), QuizPhase::Result);
    assert_eq!(record.controller.result().map(|r| r.percentage), Some(10));
}

#[tokio::test]
async fn complete_outside_loading_is_rejected() {
    let (service, _) = build_service();
    let id = service.create(None, None).expect("session").id;

    match service.complete(&id).await {
        Err(QuizServiceError::Session(SessionError::InvalidTransition {
            phase: QuizPhase::Intro,
            ..
        })) => {}
        other => panic!("expected invalid transition, got {other:?}"),
    }
}

#[test]
fn rejected_answers_are_not_persisted() {
    let (service, repository) = build_service();
    let id = service.create(None, None).expect("session").id;
    service.start(&id).expect("start");

    match service.answer(&id, 1, 7) {
        Err(QuizServiceError::Session(SessionError::OptionOutOfRange { .. })) => {}
        other => panic!("expected option error, got {other:?}"),
    }

    let stored = repository
        .fetch(&id)
        .expect("fetch succeeds")
        .expect("record present");
    assert!(stored.controller.answers().is_empty());
}

#[test]
fn concurrent_answers_to_one_question_are_applied_once() {
    let (service, repository) = build_service();
    let id = service.create(Some("en"), None).expect("session").id;
    service.start(&id).expect("start succeeds");
    let question_id = service
        .get(&id)
        .expect("session exists")
        .controller
        .current_question()
        .expect("question phase")
        .id;

    let barrier = std::sync::Barrier::new(8);
    let accepted = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    barrier.wait();
                    service.answer(&id, question_id, 1).is_ok()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("thread finished"))
            .filter(|accepted| *accepted)
            .count()
    });

    assert_eq!(accepted, 1);
    let stored = repository
        .fetch(&id)
        .expect("fetch")
        .expect("session stored");
    assert_eq!(stored.controller.answers().len(), 1);
}

#[test]
fn records_report_idle_time_against_a_ttl() {
    let (service, _) = build_service();
    let mut record = service.create(None, None).expect("session");
    let now = record.updated_at;
    let ttl = Duration::from_secs(30 * 60);

    assert!(!record.is_idle_longer_than(ttl, now));
    assert!(!record.is_idle_longer_than(ttl, now + chrono::Duration::minutes(30)));
    assert!(record.is_idle_longer_than(ttl, now + chrono::Duration::minutes(31)));

    record.touch();
    assert!(!record.is_expired(ttl));
}

#[test]
fn restart_strips_shared_markers_from_location() {
    let (service, _) = build_service();
    let id = service
        .create(Some("ko"), Some("result=20&type=1&shared=true&lang=ko"))
        .expect("session")
        .id;

    let record = service.restart(&id).expect("restart");

    assert_eq!(record.controller.phase(), QuizPhase::Intro);
    assert!(!record.controller.is_shared());
    assert_eq!(record.view(service.timer()).location, "/ko.html");
    assert_eq!(record.navigator.history_len(), 1);
}

#[test]
fn set_locale_normalizes_input() {
    let (service, _) = build_service();
    let id = service.create(None, None).expect("session").id;

    let record = service.set_locale(&id, "en-US").expect("locale switched");
    assert_eq!(record.controller.locale(), Locale::En);

    let record = service.set_locale(&id, "fr").expect("locale switched");
    assert_eq!(record.controller.locale(), Locale::Ko);
}

#[test]
fn share_and_export_require_a_result() {
    let (service, _) = build_service();
    let id = service.create(None, None).expect("session").id;

    assert!(matches!(
        service.share(&id, &ClientCapabilities::default(), &[]),
        Err(QuizServiceError::Session(SessionError::InvalidTransition { .. }))
    ));
    assert!(matches!(
        service.export(&id, &ClientCapabilities::default(), &[]),
        Err(QuizServiceError::Session(SessionError::InvalidTransition { .. }))
    ));
}

#[test]
fn unknown_sessions_are_not_found() {
    let (service, _) = build_service();
    let missing = SessionId("quiz-missing".to_string());

    assert!(matches!(
        service.get(&missing),
        Err(QuizServiceError::Repository(RepositoryError::NotFound))
    ));
    assert!(matches!(
        service.start(&missing),
        Err(QuizServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn discard_removes_the_session() {
    let (service, repository) = build_service();
    let id = service.create(None, None).expect("session").id;

    service.discard(&id).expect("discarded");

    assert_eq!(repository.len(), 0);
    assert!(matches!(
        service.discard(&id),
        Err(QuizServiceError::Repository(RepositoryError::NotFound))
    ));
}

#[test]
fn repository_failures_propagate() {
    let service = QuizService::new(
        Arc::new(UnavailableRepository),
        standard(),
        &quiz_config(),
    );

    assert!(matches!(
        service.create(None, None),
        Err(QuizServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}
