use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::catalog::{QuestionView, QuizCatalog};
use super::loading::LoadingTimer;
use super::locale::Locale;
use super::navigation::Navigator;
use super::scoring::{ResolvedResult, RoundingPolicy, Scorer, UserAnswer};
use super::share::{self, EntryPathResolver, ShareCodec};

/// Screens a quiz attempt moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhase {
    Intro,
    Question,
    Loading,
    Result,
}

impl QuizPhase {
    pub const fn label(self) -> &'static str {
        match self {
            QuizPhase::Intro => "intro",
            QuizPhase::Question => "question",
            QuizPhase::Loading => "loading",
            QuizPhase::Result => "result",
        }
    }
}

impl fmt::Display for QuizPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} while in the {phase} phase")]
    InvalidTransition {
        action: &'static str,
        phase: QuizPhase,
    },
    #[error("expected an answer to question {expected}, got question {received}")]
    UnexpectedQuestion { expected: u32, received: u32 },
    #[error("option {selected} is out of range for question {question_id} ({available} options)")]
    OptionOutOfRange {
        question_id: u32,
        selected: usize,
        available: usize,
    },
}

/// State machine for one quiz attempt: intro, questions, loading, result.
///
/// The controller owns the answer sequence and the active locale. Time only
/// matters for the loading phase, whose start is recorded with tokio's clock.
#[derive(Debug, Clone)]
pub struct SessionController {
    catalog: Arc<QuizCatalog>,
    rounding: RoundingPolicy,
    locale: Locale,
    phase: QuizPhase,
    question_index: usize,
    answers: Vec<UserAnswer>,
    result: Option<ResolvedResult>,
    is_shared: bool,
    loading_started: Option<Instant>,
}

impl SessionController {
    pub fn new(catalog: Arc<QuizCatalog>, locale: Locale) -> Self {
        Self {
            catalog,
            rounding: RoundingPolicy::default(),
            locale,
            phase: QuizPhase::Intro,
            question_index: 0,
            answers: Vec::new(),
            result: None,
            is_shared: false,
            loading_started: None,
        }
    }

    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    pub fn result(&self) -> Option<&ResolvedResult> {
        self.result.as_ref()
    }

    pub fn is_shared(&self) -> bool {
        self.is_shared
    }

    pub fn catalog(&self) -> &QuizCatalog {
        &self.catalog
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Jumps straight to the result screen when the current URL is a valid
    /// share link. Returns whether a shared result was adopted.
    pub fn bootstrap(&mut self, navigator: &dyn Navigator) -> bool {
        let Some(shared) = share::decode_current(navigator, self.catalog.results.len()) else {
            return false;
        };
        let Some(band) = self.catalog.results.get(shared.result_index) else {
            return false;
        };

        if let Some(language) = shared.language.as_deref() {
            self.locale = Locale::normalize(language);
        }
        self.result = Some(ResolvedResult {
            percentage: shared.percentage,
            band_index: shared.result_index,
            band: band.clone(),
        });
        self.phase = QuizPhase::Result;
        self.is_shared = true;

        info!(
            percentage = shared.percentage,
            result_index = shared.result_index,
            locale = %self.locale,
            "restored shared result"
        );
        true
    }

    pub fn start(&mut self) -> Result<(), SessionError> {
        self.expect_phase(QuizPhase::Intro, "start")?;

        self.phase = QuizPhase::Question;
        self.question_index = 0;
        self.answers.clear();
        Ok(())
    }

    pub fn current_question(&self) -> Option<QuestionView> {
        if self.phase != QuizPhase::Question {
            return None;
        }
        self.catalog
            .questions
            .get(self.question_index)
            .map(|question| {
                question.view(self.locale, self.question_index, self.catalog.questions.len())
            })
    }

    /// Records an answer to the current question and advances. Invalid input
    /// leaves the session untouched.
    pub fn answer(
        &mut self,
        question_id: u32,
        selected_option: usize,
    ) -> Result<QuizPhase, SessionError> {
        self.expect_phase(QuizPhase::Question, "answer")?;

        let question = self
            .catalog
            .questions
            .get(self.question_index)
            .ok_or(SessionError::InvalidTransition {
                action: "answer",
                phase: self.phase,
            })?;

        if question.id != question_id {
            return Err(SessionError::UnexpectedQuestion {
                expected: question.id,
                received: question_id,
            });
        }

        let score =
            question
                .score_for(selected_option)
                .ok_or_else(|| SessionError::OptionOutOfRange {
                    question_id,
                    selected: selected_option,
                    available: question.scoring.len(),
                })?;

        debug!(question_id, selected_option, score, "answer recorded");
        self.answers.push(UserAnswer {
            question_id,
            selected_option,
            score,
        });

        if self.question_index + 1 < self.catalog.questions.len() {
            self.question_index += 1;
        } else {
            self.phase = QuizPhase::Loading;
            self.loading_started = Some(Instant::now());
        }

        Ok(self.phase)
    }

    pub fn loading_elapsed(&self) -> Option<Duration> {
        match (self.phase, self.loading_started) {
            (QuizPhase::Loading, Some(started)) => Some(started.elapsed()),
            _ => None,
        }
    }

    pub fn loading_progress(&self, timer: &LoadingTimer) -> Option<u8> {
        self.loading_elapsed()
            .map(|elapsed| timer.progress_at(elapsed))
    }

    pub fn loading_remaining(&self, timer: &LoadingTimer) -> Option<Duration> {
        self.loading_elapsed().map(|elapsed| timer.remaining(elapsed))
    }

    /// Fired when the loading timer finishes: scores the answers and shows the result.
    pub fn complete_loading(&mut self) -> Result<&ResolvedResult, SessionError> {
        self.expect_phase(QuizPhase::Loading, "finish loading")?;

        let outcome = Scorer::new(&self.catalog)
            .with_rounding(self.rounding)
            .calculate(&self.answers);

        info!(
            total_score = outcome.total_score,
            max_score = outcome.max_score,
            percentage = outcome.result.percentage,
            band = outcome.result.band_index,
            "quiz scored"
        );

        self.loading_started = None;
        self.phase = QuizPhase::Result;
        Ok(&*self.result.insert(outcome.result))
    }

    /// Returns to the intro from any phase and strips share markers from the URL.
    pub fn restart(&mut self, navigator: &dyn Navigator) {
        if self.phase != QuizPhase::Result {
            warn!(phase = %self.phase, "restarting an unfinished quiz");
        }

        self.phase = QuizPhase::Intro;
        self.question_index = 0;
        self.answers.clear();
        self.result = None;
        self.is_shared = false;
        self.loading_started = None;

        clear_share_markers(navigator);
    }

    pub fn share_url<P: EntryPathResolver>(
        &self,
        codec: &ShareCodec<P>,
    ) -> Result<String, SessionError> {
        self.expect_phase(QuizPhase::Result, "share")?;
        let result = self.result.as_ref().ok_or(SessionError::InvalidTransition {
            action: "share",
            phase: self.phase,
        })?;

        Ok(codec.encode(
            result.percentage,
            result.band_index,
            Some(self.locale.as_str()),
        ))
    }

    fn expect_phase(&self, expected: QuizPhase, action: &'static str) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                phase: self.phase,
            })
        }
    }
}

/// Replaces the current history entry with its query-less form.
pub fn clear_share_markers(navigator: &dyn Navigator) {
    let current = navigator.current_url();
    let cleared = share::clear_query(&current);
    if cleared != current {
        navigator.replace(&cleared);
    }
}
