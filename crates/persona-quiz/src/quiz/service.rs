use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::QuizConfig;

use super::catalog::QuizCatalog;
use super::delivery::{
    export_chain, share_chain, ClientCapabilities, Delivery, DeliveryError, ExportPayload,
    FallbackChain, SharePayload,
};
use super::loading::LoadingTimer;
use super::locale::Locale;
use super::navigation::MemoryNavigator;
use super::repository::{RepositoryError, SessionId, SessionRecord, SessionRepository};
use super::scoring::RoundingPolicy;
use super::session::{QuizPhase, SessionController, SessionError};
use super::share::ShareCodec;

/// Service composing the catalog, share codec, delivery chains, and session storage.
pub struct QuizService<R> {
    repository: Arc<R>,
    catalog: Arc<QuizCatalog>,
    codec: ShareCodec,
    timer: LoadingTimer,
    rounding: RoundingPolicy,
    default_locale: Locale,
    share_chain: FallbackChain<SharePayload>,
    export_chain: FallbackChain<ExportPayload>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("quiz-{id:06}"))
}

/// Share link plus the way the client should hand it to the user.
#[derive(Debug, Clone, Serialize)]
pub struct ShareOutcome {
    pub url: String,
    pub delivery: Delivery,
}

impl<R> QuizService<R>
where
    R: SessionRepository + 'static,
{
    pub fn new(repository: Arc<R>, catalog: Arc<QuizCatalog>, config: &QuizConfig) -> Self {
        let codec = ShareCodec::new(config.public_origin.clone(), catalog.results.len());
        Self {
            repository,
            catalog,
            codec,
            timer: config.loading_timer(),
            rounding: RoundingPolicy::default(),
            default_locale: config.default_locale,
            share_chain: share_chain(),
            export_chain: export_chain(),
        }
    }

    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn catalog(&self) -> &QuizCatalog {
        &self.catalog
    }

    pub fn codec(&self) -> &ShareCodec {
        &self.codec
    }

    pub fn timer(&self) -> &LoadingTimer {
        &self.timer
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    /// Opens a session. A `share_query` carrying valid share markers opens it
    /// straight on the shared result.
    pub fn create(
        &self,
        locale: Option<&str>,
        share_query: Option<&str>,
    ) -> Result<SessionRecord, QuizServiceError> {
        let locale = locale
            .filter(|raw| !raw.trim().is_empty())
            .map(Locale::normalize)
            .unwrap_or(self.default_locale);

        let entry = self.codec.entry_path(Some(locale.as_str()));
        let location = match share_query
            .map(|query| query.trim_start_matches('?'))
            .filter(|query| !query.is_empty())
        {
            Some(query) => format!("{entry}?{query}"),
            None => entry,
        };

        let navigator = MemoryNavigator::new(location);
        let mut controller =
            SessionController::new(self.catalog.clone(), locale).with_rounding(self.rounding);
        let shared = controller.bootstrap(&navigator);

        let record = SessionRecord::new(next_session_id(), controller, navigator);
        let stored = self.repository.insert(record)?;
        info!(session_id = %stored.id, locale = %locale, shared, "quiz session created");
        Ok(stored)
    }

    pub fn get(&self, id: &SessionId) -> Result<SessionRecord, QuizServiceError> {
        let record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn start(&self, id: &SessionId) -> Result<SessionRecord, QuizServiceError> {
        self.modify(id, |record| record.controller.start())
    }

    pub fn answer(
        &self,
        id: &SessionId,
        question_id: u32,
        selected_option: usize,
    ) -> Result<SessionRecord, QuizServiceError> {
        self.modify(id, |record| {
            record
                .controller
                .answer(question_id, selected_option)
                .map(|_| ())
        })
    }

    /// Waits out whatever is left of the loading animation, then scores.
    pub async fn complete(&self, id: &SessionId) -> Result<SessionRecord, QuizServiceError> {
        let record = self.get(id)?;
        if record.controller.phase() != QuizPhase::Loading {
            return Err(SessionError::InvalidTransition {
                action: "finish loading",
                phase: record.controller.phase(),
            }
            .into());
        }

        if let Some(remaining) = record.controller.loading_remaining(&self.timer) {
            if !remaining.is_zero() {
                debug!(session_id = %id, remaining_ms = remaining.as_millis() as u64, "waiting for loading to finish");
                tokio::time::sleep(remaining).await;
            }
        }

        self.modify(id, |record| record.controller.complete_loading().map(|_| ()))
    }

    pub fn restart(&self, id: &SessionId) -> Result<SessionRecord, QuizServiceError> {
        self.modify(id, |record| {
            let navigator = record.navigator.clone();
            record.controller.restart(&navigator);
            Ok(())
        })
    }

    pub fn set_locale(&self, id: &SessionId, raw: &str) -> Result<SessionRecord, QuizServiceError> {
        let locale = Locale::normalize(raw);
        self.modify(id, |record| {
            record.controller.set_locale(locale);
            Ok(())
        })
    }

    pub fn share(
        &self,
        id: &SessionId,
        capabilities: &ClientCapabilities,
        failed: &[String],
    ) -> Result<ShareOutcome, QuizServiceError> {
        let record = self.get(id)?;
        let controller = &record.controller;
        let url = controller.share_url(&self.codec)?;
        let result = controller.result().ok_or(SessionError::InvalidTransition {
            action: "share",
            phase: controller.phase(),
        })?;

        let payload = SharePayload::for_result(result, controller.locale(), url.clone());
        let delivery = self
            .share_chain
            .run(&payload, controller.locale(), capabilities, failed)?;
        info!(session_id = %id, strategy = delivery.strategy, "share planned");
        Ok(ShareOutcome { url, delivery })
    }

    pub fn export(
        &self,
        id: &SessionId,
        capabilities: &ClientCapabilities,
        failed: &[String],
    ) -> Result<Delivery, QuizServiceError> {
        let record = self.get(id)?;
        let controller = &record.controller;
        let result = match (controller.phase(), controller.result()) {
            (QuizPhase::Result, Some(result)) => result,
            (phase, _) => {
                return Err(SessionError::InvalidTransition {
                    action: "export",
                    phase,
                }
                .into())
            }
        };

        let payload = ExportPayload::for_result(result);
        let delivery = self
            .export_chain
            .run(&payload, controller.locale(), capabilities, failed)?;
        info!(session_id = %id, strategy = delivery.strategy, "export planned");
        Ok(delivery)
    }

    pub fn discard(&self, id: &SessionId) -> Result<(), QuizServiceError> {
        self.repository.remove(id)?;
        info!(session_id = %id, "quiz session discarded");
        Ok(())
    }

    /// Applies `change` to a stored session and persists it. Failed changes
    /// are not written back.
    fn modify<F>(&self, id: &SessionId, change: F) -> Result<SessionRecord, QuizServiceError>
    where
        F: FnOnce(&mut SessionRecord) -> Result<(), SessionError>,
    {
        self.repository
            .update_with(id, |record| -> Result<(), QuizServiceError> {
                change(&mut *record)?;
                record.touch();
                Ok(())
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuizServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
