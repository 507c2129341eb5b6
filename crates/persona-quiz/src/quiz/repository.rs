use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{accent_color, QuestionView};
use super::loading::LoadingTimer;
use super::locale::Locale;
use super::navigation::{MemoryNavigator, Navigator};
use super::session::{QuizPhase, SessionController};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored quiz attempt: the state machine plus the page history it drives.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: SessionId,
    pub controller: SessionController,
    pub navigator: MemoryNavigator,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(id: SessionId, controller: SessionController, navigator: MemoryNavigator) -> Self {
        let now = Utc::now();
        Self {
            id,
            controller,
            navigator,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether the record has gone untouched for longer than `ttl` as of `now`.
    pub fn is_idle_longer_than(&self, ttl: std::time::Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.updated_at)
            .to_std()
            .map(|idle| idle > ttl)
            .unwrap_or(false)
    }

    pub fn is_expired(&self, ttl: std::time::Duration) -> bool {
        self.is_idle_longer_than(ttl, Utc::now())
    }

    pub fn view(&self, timer: &LoadingTimer) -> SessionView {
        let controller = &self.controller;
        let locale = controller.locale();

        let loading = controller
            .loading_elapsed()
            .map(|elapsed| LoadingView {
                progress: timer.progress_at(elapsed),
                remaining_ms: duration_millis(timer.remaining(elapsed)),
            });

        let result = controller.result().map(|resolved| {
            let band = resolved.band.view(locale);
            ResultView {
                percentage: resolved.percentage,
                band_index: resolved.band_index,
                title: band.title,
                description: band.description,
                image: band.image,
                accent_color: accent_color(resolved.percentage),
            }
        });

        SessionView {
            session_id: self.id.clone(),
            phase: controller.phase(),
            locale,
            is_shared: controller.is_shared(),
            answered: controller.answers().len(),
            total_questions: controller.catalog().questions.len(),
            question: controller.current_question(),
            loading,
            result,
            location: self.navigator.current_url(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn duration_millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Storage abstraction so the service can be exercised in isolation.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, record: SessionRecord) -> Result<SessionRecord, RepositoryError>;
    fn update(&self, record: SessionRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<SessionRecord>, RepositoryError>;
    fn remove(&self, id: &SessionId) -> Result<(), RepositoryError>;

    /// Applies `change` to the stored record and persists it as one step. A
    /// failed change leaves the stored record untouched. Stores guarding
    /// records with a lock should hold it for the whole change.
    fn update_with<F, E>(&self, id: &SessionId, change: F) -> Result<SessionRecord, E>
    where
        Self: Sized,
        F: FnOnce(&mut SessionRecord) -> Result<(), E>,
        E: From<RepositoryError>,
    {
        let mut record = self.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        change(&mut record)?;
        self.update(record.clone())?;
        Ok(record)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Client-facing snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub phase: QuizPhase,
    pub locale: Locale,
    pub is_shared: bool,
    pub answered: usize,
    pub total_questions: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loading: Option<LoadingView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultView>,
    /// Page URL the client should show; share markers are gone after a restart.
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadingView {
    pub progress: u8,
    pub remaining_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultView {
    pub percentage: u8,
    pub band_index: usize,
    pub title: String,
    pub description: String,
    pub image: String,
    pub accent_color: &'static str,
}
