use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::catalog::{standard_catalog, QuizCatalog, ResultBand, ResultCatalog};

/// One recorded pick. `score` is copied from the catalog when the answer is
/// given and is what the scorer sums, even if the catalog changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: u32,
    pub selected_option: usize,
    pub score: u32,
}

/// How a fractional percentage is turned into a whole number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// 12.5 becomes 13.
    #[default]
    HalfAwayFromZero,
    /// 12.5 becomes 12, 13.5 becomes 14.
    HalfEven,
}

impl RoundingPolicy {
    /// Rounds `numerator / denominator`. `denominator` must be non-zero.
    pub fn divide(self, numerator: u64, denominator: u64) -> u64 {
        let quotient = numerator / denominator;
        let remainder = numerator % denominator;

        match (remainder * 2).cmp(&denominator) {
            Ordering::Less => quotient,
            Ordering::Greater => quotient + 1,
            Ordering::Equal => match self {
                RoundingPolicy::HalfAwayFromZero => quotient + 1,
                RoundingPolicy::HalfEven if quotient % 2 == 0 => quotient,
                RoundingPolicy::HalfEven => quotient + 1,
            },
        }
    }
}

/// The band a percentage resolved to, as shown on a result card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedResult {
    pub percentage: u8,
    pub band_index: usize,
    pub band: ResultBand,
}

/// Scorer output with the arithmetic that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreOutcome {
    pub total_score: u32,
    pub max_score: u32,
    pub result: ResolvedResult,
}

/// Index of the band `percentage` falls in.
///
/// Bands are walked in ascending order and the first threshold `>=` the
/// percentage wins. Zero always lands in the lowest band, and anything above
/// the highest threshold lands in the highest band.
pub fn resolve_band(results: &ResultCatalog, percentage: u8) -> usize {
    if percentage == 0 {
        return 0;
    }

    results
        .bands()
        .iter()
        .position(|band| band.percentage >= percentage)
        .unwrap_or_else(|| results.len().saturating_sub(1))
}

/// Reduces answers to a percentage and a result band.
pub struct Scorer<'a> {
    catalog: &'a QuizCatalog,
    rounding: RoundingPolicy,
}

impl<'a> Scorer<'a> {
    pub fn new(catalog: &'a QuizCatalog) -> Self {
        Self {
            catalog,
            rounding: RoundingPolicy::default(),
        }
    }

    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn calculate(&self, answers: &[UserAnswer]) -> ScoreOutcome {
        let max_score = self.catalog.questions.max_score();

        if answers.is_empty() {
            warn!("scoring an empty answer sequence, defaulting to the lowest band");
            return self.lowest(0, max_score);
        }

        if answers.len() != self.catalog.questions.len() {
            warn!(
                answers = answers.len(),
                questions = self.catalog.questions.len(),
                "answer count does not match the question catalog"
            );
        }

        let total: u64 = answers.iter().map(|answer| u64::from(answer.score)).sum();
        let total_score = u32::try_from(total).unwrap_or(u32::MAX);

        if max_score == 0 {
            warn!("question catalog has no attainable score, defaulting to the lowest band");
            return self.lowest(total_score, max_score);
        }

        let rounded = self.rounding.divide(total * 100, u64::from(max_score));
        let percentage = u8::try_from(rounded.min(100)).unwrap_or(100);
        let band_index = resolve_band(&self.catalog.results, percentage);

        ScoreOutcome {
            total_score,
            max_score,
            result: self.resolved(percentage, band_index),
        }
    }

    fn lowest(&self, total_score: u32, max_score: u32) -> ScoreOutcome {
        ScoreOutcome {
            total_score,
            max_score,
            result: self.resolved(0, 0),
        }
    }

    fn resolved(&self, percentage: u8, band_index: usize) -> ResolvedResult {
        ResolvedResult {
            percentage,
            band_index,
            band: self
                .catalog
                .results
                .band_or_highest(band_index)
                .cloned()
                .unwrap_or_else(|| {
                    warn!(band_index, "result catalog has no bands");
                    ResultBand::default()
                }),
        }
    }
}

/// Scores answers against the reference catalog with the default rounding.
pub fn calculate_result(answers: &[UserAnswer]) -> ScoreOutcome {
    Scorer::new(standard_catalog()).calculate(answers)
}
