//! Bilingual personality quiz: catalogs, scoring, share links, and the
//! session state machine, plus the HTTP surface that drives them.

pub mod catalog;
pub mod delivery;
pub mod loading;
pub mod locale;
pub mod navigation;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod session;
pub mod share;

#[cfg(test)]
mod tests;

pub use catalog::{
    accent_color, standard_catalog, CatalogError, Question, QuestionCatalog, QuestionView,
    QuizCatalog, ResultBand, ResultBandView, ResultCatalog,
};
pub use delivery::{
    export_chain, export_filename, share_chain, ClientCapabilities, Delivery, DeliveryError,
    DeliveryInstruction, DeliveryStrategy, ExportPayload, FallbackChain, SharePayload,
};
pub use loading::LoadingTimer;
pub use locale::{Locale, LocalizedOptions, LocalizedText, Message};
pub use navigation::{MemoryNavigator, Navigator};
pub use repository::{
    RepositoryError, SessionId, SessionRecord, SessionRepository, SessionView,
};
pub use router::quiz_router;
pub use scoring::{
    calculate_result, resolve_band, ResolvedResult, RoundingPolicy, ScoreOutcome, Scorer,
    UserAnswer,
};
pub use service::{QuizService, QuizServiceError, ShareOutcome};
pub use session::{clear_share_markers, QuizPhase, SessionController, SessionError};
pub use share::{EntryPathResolver, LocaleEntryPaths, ShareCodec, SharedResultData};
