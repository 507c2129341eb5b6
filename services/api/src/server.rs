use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySessionRepository};
use crate::routes::with_quiz_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use persona_quiz::config::AppConfig;
use persona_quiz::error::AppError;
use persona_quiz::quiz::{QuizCatalog, QuizService};
use persona_quiz::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let catalog = QuizCatalog::standard();
    catalog.validate()?;
    info!(
        questions = catalog.questions.len(),
        results = catalog.results.len(),
        max_score = catalog.questions.max_score(),
        "quiz catalog loaded"
    );

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemorySessionRepository::with_ttl(config.quiz.session_ttl));
    let quiz_service = Arc::new(QuizService::new(
        repository,
        Arc::new(catalog),
        &config.quiz,
    ));

    let app = with_quiz_routes(quiz_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        default_locale = %config.quiz.default_locale,
        loading_ms = config.quiz.loading_timer().duration().as_millis() as u64,
        session_ttl_secs = config.quiz.session_ttl.map(|ttl| ttl.as_secs()),
        "persona quiz service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
