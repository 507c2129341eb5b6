use std::sync::Arc;

use clap::{Args, ValueEnum};
use persona_quiz::error::AppError;
use persona_quiz::quiz::{
    accent_color, export_filename, standard_catalog, Locale, MemoryNavigator, QuizCatalog,
    ResolvedResult, RoundingPolicy, SessionController, ShareCodec, SharePayload,
};

#[derive(Args, Debug)]
pub(crate) struct PlayArgs {
    /// Selected option per question, zero-based and comma separated (e.g. 2,1,0,2,2)
    #[arg(long, value_delimiter = ',', required = true)]
    pub(crate) answers: Vec<usize>,
    /// Display language (ko or en). Defaults to Korean.
    #[arg(long)]
    pub(crate) lang: Option<String>,
    /// How half percentages are rounded
    #[arg(long, value_enum, default_value_t = RoundingArg::HalfUp)]
    pub(crate) rounding: RoundingArg,
    /// Origin prepended to the printed share link
    #[arg(long, default_value = "")]
    pub(crate) origin: String,
}

#[derive(Args, Debug)]
pub(crate) struct DecodeArgs {
    /// Share link, or just its query string
    pub(crate) url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum RoundingArg {
    HalfUp,
    HalfEven,
}

impl From<RoundingArg> for RoundingPolicy {
    fn from(value: RoundingArg) -> Self {
        match value {
            RoundingArg::HalfUp => RoundingPolicy::HalfAwayFromZero,
            RoundingArg::HalfEven => RoundingPolicy::HalfEven,
        }
    }
}

/// Result of a non-interactive attempt.
#[derive(Debug)]
pub(crate) struct PlayedAttempt {
    pub(crate) locale: Locale,
    pub(crate) result: ResolvedResult,
    pub(crate) share_url: String,
}

pub(crate) fn play(args: &PlayArgs) -> Result<PlayedAttempt, AppError> {
    let catalog: Arc<QuizCatalog> = Arc::new(standard_catalog().clone());
    let question_count = catalog.questions.len();
    if args.answers.len() != question_count {
        return Err(AppError::InvalidInput(format!(
            "expected {question_count} answers, got {}",
            args.answers.len()
        )));
    }

    let locale = args
        .lang
        .as_deref()
        .map(Locale::normalize)
        .unwrap_or_default();
    let codec = ShareCodec::new(args.origin.clone(), catalog.results.len());
    let mut controller =
        SessionController::new(catalog, locale).with_rounding(args.rounding.into());

    controller.start()?;
    for option in &args.answers {
        let question = controller.current_question().ok_or_else(|| {
            AppError::InvalidInput("quiz ended before all answers were used".to_string())
        })?;
        controller.answer(question.id, *option)?;
    }
    let result = controller.complete_loading()?.clone();
    let share_url = controller.share_url(&codec)?;

    Ok(PlayedAttempt {
        locale,
        result,
        share_url,
    })
}

pub(crate) fn run_play(args: PlayArgs) -> Result<(), AppError> {
    let attempt = play(&args)?;
    let locale = attempt.locale;
    let band = attempt.result.band.view(locale);

    println!("Persona quiz result ({locale})");
    println!("  Answers: {:?}", args.answers);
    println!(
        "  Score: {}% (band {}, accent {})",
        attempt.result.percentage,
        attempt.result.band_index,
        accent_color(attempt.result.percentage)
    );
    println!("  Title: {}", band.title);
    println!("  {}", band.description);

    let share = SharePayload::for_result(&attempt.result, locale, attempt.share_url);
    println!("\nShare text: {}", share.text);
    println!("Share link: {}", share.url);
    println!(
        "Result card file: {}",
        export_filename(attempt.result.percentage)
    );
    Ok(())
}

pub(crate) fn run_decode(args: DecodeArgs) -> Result<(), AppError> {
    let catalog = standard_catalog();
    let codec = ShareCodec::new("", catalog.results.len());
    let decoded = if args.url.contains('?') {
        codec.decode_url(&args.url)
    } else {
        codec.decode_query(&args.url)
    }
    .ok_or_else(|| AppError::InvalidInput(format!("'{}' is not a valid share link", args.url)))?;

    let locale = decoded
        .language
        .as_deref()
        .map(Locale::normalize)
        .unwrap_or_default();
    let band = catalog
        .results
        .band_or_highest(decoded.result_index)
        .map(|band| band.view(locale))
        .ok_or_else(|| AppError::InvalidInput("result catalog is empty".to_string()))?;

    println!("Shared result");
    println!("  Percentage: {}%", decoded.percentage);
    println!("  Result type: {}", decoded.result_index);
    println!(
        "  Language: {} (displayed as {locale})",
        decoded.language.as_deref().unwrap_or("unspecified")
    );
    println!("  Title: {}", band.title);
    println!("  {}", band.description);
    println!(
        "  Clean link: {}",
        codec.entry_path(decoded.language.as_deref())
    );
    Ok(())
}
