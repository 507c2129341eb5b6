use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::catalog::{QuestionView, ResultBandView};
use super::delivery::{ClientCapabilities, DeliveryError};
use super::locale::{Locale, Message};
use super::repository::{RepositoryError, SessionId, SessionRecord, SessionRepository};
use super::service::{QuizService, QuizServiceError};
use super::session::SessionError;

/// Router exposing the quiz session lifecycle, share links, and the catalog.
pub fn quiz_router<R>(service: Arc<QuizService<R>>) -> Router
where
    R: SessionRepository + 'static,
{
    Router::new()
        .route("/api/v1/sessions", post(create_handler::<R>))
        .route(
            "/api/v1/sessions/:session_id",
            get(session_handler::<R>).delete(discard_handler::<R>),
        )
        .route("/api/v1/sessions/:session_id/start", post(start_handler::<R>))
        .route(
            "/api/v1/sessions/:session_id/answers",
            post(answer_handler::<R>),
        )
        .route(
            "/api/v1/sessions/:session_id/complete",
            post(complete_handler::<R>),
        )
        .route(
            "/api/v1/sessions/:session_id/restart",
            post(restart_handler::<R>),
        )
        .route(
            "/api/v1/sessions/:session_id/locale",
            post(locale_handler::<R>),
        )
        .route("/api/v1/sessions/:session_id/share", post(share_handler::<R>))
        .route(
            "/api/v1/sessions/:session_id/export",
            post(export_handler::<R>),
        )
        .route("/api/v1/shared", get(shared_handler::<R>))
        .route("/api/v1/catalog", get(catalog_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub lang: Option<String>,
    /// Query string of the page the client was opened on.
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: u32,
    pub selected_option: usize,
}

#[derive(Debug, Deserialize)]
pub struct LocaleRequest {
    pub lang: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliveryRequest {
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    /// Strategies the client already tried without success.
    #[serde(default)]
    pub failed: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub locale: Locale,
    pub max_score: u32,
    pub questions: Vec<QuestionView>,
    pub results: Vec<ResultBandView>,
}

/// A request without a JSON body opens a session with the defaults.
pub(crate) async fn create_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    payload: Result<axum::Json<CreateSessionRequest>, JsonRejection>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => CreateSessionRequest::default(),
        Err(rejection) => return rejection.into_response(),
    };

    match service.create(request.lang.as_deref(), request.query.as_deref()) {
        Ok(record) => {
            let view = record.view(service.timer());
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn session_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.get(&SessionId(session_id)) {
        Ok(record) => {
            let view = record.view(service.timer());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn discard_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.discard(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn start_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let result = service.start(&SessionId(session_id));
    view_response(&service, result)
}

pub(crate) async fn answer_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<AnswerRequest>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let result = service.answer(
        &SessionId(session_id),
        request.question_id,
        request.selected_option,
    );
    view_response(&service, result)
}

pub(crate) async fn complete_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let result = service.complete(&SessionId(session_id)).await;
    view_response(&service, result)
}

pub(crate) async fn restart_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let result = service.restart(&SessionId(session_id));
    view_response(&service, result)
}

pub(crate) async fn locale_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<LocaleRequest>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let result = service.set_locale(&SessionId(session_id), &request.lang);
    view_response(&service, result)
}

pub(crate) async fn share_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<DeliveryRequest>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match service.share(
        &SessionId(session_id),
        &request.capabilities,
        &request.failed,
    ) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(request): axum::Json<DeliveryRequest>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let id = SessionId(session_id);
    match service.export(&id, &request.capabilities, &request.failed) {
        Ok(delivery) => (StatusCode::OK, axum::Json(delivery)).into_response(),
        Err(QuizServiceError::Delivery(error)) => {
            let locale = service
                .get(&id)
                .map(|record| record.controller.locale())
                .unwrap_or(service.default_locale());
            let payload = json!({
                "error": error.to_string(),
                "notice": Message::SaveError.template(locale),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

/// Decodes share markers from the request's own query string.
pub(crate) async fn shared_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    RawQuery(query): RawQuery,
) -> Response
where
    R: SessionRepository + 'static,
{
    let query = query.unwrap_or_default();
    let Some(shared) = service.codec().decode_query(&query) else {
        let payload = json!({
            "error": "no valid shared result in query",
        });
        return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
    };

    let locale = shared
        .language
        .as_deref()
        .map(Locale::normalize)
        .unwrap_or(service.default_locale());
    let Some(band) = service
        .catalog()
        .results
        .band_or_highest(shared.result_index)
        .map(|band| band.view(locale))
    else {
        let payload = json!({ "error": "result catalog is empty" });
        return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
    };

    let payload = json!({
        "percentage": shared.percentage,
        "result_index": shared.result_index,
        "language": shared.language,
        "locale": locale,
        "result": band,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn catalog_handler<R>(
    State(service): State<Arc<QuizService<R>>>,
    Query(query): Query<CatalogQuery>,
) -> Response
where
    R: SessionRepository + 'static,
{
    let locale = query
        .lang
        .as_deref()
        .map(Locale::normalize)
        .unwrap_or(service.default_locale());
    let catalog = service.catalog();
    let total = catalog.questions.len();

    let view = CatalogView {
        locale,
        max_score: catalog.questions.max_score(),
        questions: catalog
            .questions
            .questions()
            .iter()
            .enumerate()
            .map(|(index, question)| question.view(locale, index, total))
            .collect(),
        results: catalog
            .results
            .bands()
            .iter()
            .map(|band| band.view(locale))
            .collect(),
    };
    (StatusCode::OK, axum::Json(view)).into_response()
}

fn view_response<R>(
    service: &QuizService<R>,
    result: Result<SessionRecord, QuizServiceError>,
) -> Response
where
    R: SessionRepository + 'static,
{
    match result {
        Ok(record) => {
            let view = record.view(service.timer());
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: QuizServiceError) -> Response {
    let status = match &error {
        QuizServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        QuizServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        QuizServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        QuizServiceError::Session(SessionError::InvalidTransition { .. }) => StatusCode::CONFLICT,
        QuizServiceError::Session(
            SessionError::UnexpectedQuestion { .. } | SessionError::OptionOutOfRange { .. },
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        QuizServiceError::Delivery(
            DeliveryError::Exhausted { .. } | DeliveryError::Rejected { .. },
        ) => StatusCode::UNPROCESSABLE_ENTITY,
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
