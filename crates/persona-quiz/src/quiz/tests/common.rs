use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::config::QuizConfig;
use crate::quiz::catalog::{Question, QuestionCatalog, QuizCatalog, ResultBand, ResultCatalog};
use crate::quiz::locale::{Locale, LocalizedOptions, LocalizedText};
use crate::quiz::repository::{RepositoryError, SessionId, SessionRecord, SessionRepository};
use crate::quiz::scoring::UserAnswer;
use crate::quiz::{quiz_router, QuizService};

pub(super) fn standard() -> Arc<QuizCatalog> {
    Arc::new(QuizCatalog::standard())
}

pub(super) fn band(percentage: u8, title: &str) -> ResultBand {
    ResultBand {
        percentage,
        title: LocalizedText::new(format!("{title} (ko)"), title),
        description: LocalizedText::new("설명", "Description"),
        image: format!("/images/{percentage}.png"),
    }
}

pub(super) fn question(id: u32, scoring: Vec<u32>) -> Question {
    let labels: Vec<String> = (0..scoring.len()).map(|i| format!("option {i}")).collect();
    Question {
        id,
        text: LocalizedText::new(format!("질문 {id}"), format!("Question {id}")),
        options: LocalizedOptions::new(labels.clone(), labels),
        scoring,
        image: String::new(),
    }
}

/// `count` questions scored `[0, 1, 2]` over the five reference bands.
pub(super) fn uniform_catalog(count: u32) -> QuizCatalog {
    let questions = QuestionCatalog::new((1..=count).map(|id| question(id, vec![0, 1, 2])).collect())
        .expect("valid questions");
    QuizCatalog::new(questions, ResultCatalog::standard())
}

pub(super) fn custom_catalog(questions: Vec<Question>, bands: Vec<ResultBand>) -> QuizCatalog {
    QuizCatalog::new(
        QuestionCatalog::new(questions).expect("valid questions"),
        ResultCatalog::new(bands).expect("valid bands"),
    )
}

pub(super) fn answers(scores: &[u32]) -> Vec<UserAnswer> {
    scores
        .iter()
        .enumerate()
        .map(|(index, score)| UserAnswer {
            question_id: index as u32 + 1,
            selected_option: *score as usize,
            score: *score,
        })
        .collect()
}

pub(super) fn quiz_config() -> QuizConfig {
    QuizConfig {
        public_origin: "https://quiz.example".to_string(),
        loading_override: Some(Duration::ZERO),
        default_locale: Locale::Ko,
        session_ttl: None,
    }
}

pub(super) fn build_service() -> (QuizService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = QuizService::new(repository.clone(), standard(), &quiz_config());
    (service, repository)
}

/// Starts a session and answers every question with the given option.
pub(super) fn answer_all(
    service: &QuizService<MemoryRepository>,
    id: &SessionId,
    picks: &[usize],
) -> SessionRecord {
    service.start(id).expect("start succeeds");
    let mut record = service.get(id).expect("session exists");
    for pick in picks {
        let question_id = record
            .controller
            .current_question()
            .expect("question phase")
            .id;
        record = service
            .answer(id, question_id, *pick)
            .expect("answer accepted");
    }
    record
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
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

    fn update_with<F, E>(&self, id: &SessionId, change: F) -> Result<SessionRecord, E>
    where
        F: FnOnce(&mut SessionRecord) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let stored = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        let mut record = stored.clone();
        change(&mut record)?;
        *stored = record.clone();
        Ok(record)
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _record: SessionRecord) -> Result<SessionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: SessionRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn remove(&self, _id: &SessionId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: QuizService<MemoryRepository>) -> axum::Router {
    quiz_router(Arc::new(service))
}
