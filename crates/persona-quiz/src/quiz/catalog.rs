use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::locale::{Locale, LocalizedOptions, LocalizedText};

/// A multiple-choice prompt. `scoring[i]` is the value of picking `options[i]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: LocalizedText,
    pub options: LocalizedOptions,
    pub scoring: Vec<u32>,
    pub image: String,
}

impl Question {
    pub fn score_for(&self, option: usize) -> Option<u32> {
        self.scoring.get(option).copied()
    }

    pub fn max_score(&self) -> u32 {
        self.scoring.iter().copied().max().unwrap_or(0)
    }

    pub fn view(&self, locale: Locale, index: usize, total: usize) -> QuestionView {
        QuestionView {
            id: self.id,
            index,
            total,
            text: self.text.get(locale).to_string(),
            options: self.options.get(locale).to_vec(),
            image: self.image.clone(),
        }
    }
}

/// Localized projection of a question for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub id: u32,
    pub index: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<String>,
    pub image: String,
}

/// One result narrative. `percentage` is the inclusive upper bound of its band.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBand {
    pub percentage: u8,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub image: String,
}

impl ResultBand {
    pub fn view(&self, locale: Locale) -> ResultBandView {
        ResultBandView {
            threshold: self.percentage,
            title: self.title.get(locale).to_string(),
            description: self.description.get(locale).to_string(),
            image: self.image.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultBandView {
    pub threshold: u8,
    pub title: String,
    pub description: String,
    pub image: String,
}

/// Accent colour used by result cards for a given percentage.
pub fn accent_color(percentage: u8) -> &'static str {
    match percentage {
        0 => "#4ade80",
        1..=25 => "#60a5fa",
        26..=50 => "#fbbf24",
        51..=75 => "#f97316",
        _ => "#ef4444",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("question catalog is empty")]
    NoQuestions,
    #[error("question id {0} appears more than once")]
    DuplicateQuestionId(u32),
    #[error("question {0} has no options")]
    NoOptions(u32),
    #[error("question {0} has a different number of options per locale")]
    OptionCountMismatch(u32),
    #[error("question {question_id} has {options} options but {scoring} scores")]
    ScoringLengthMismatch {
        question_id: u32,
        options: usize,
        scoring: usize,
    },
    #[error("result catalog is empty")]
    NoResults,
    #[error("result threshold {0} lies outside 0..=100")]
    ThresholdOutOfRange(u8),
    #[error("result thresholds must be strictly ascending ({previous} then {next})")]
    ThresholdsNotAscending { previous: u8, next: u8 },
    #[error("highest result threshold is {0}, expected 100")]
    IncompleteCoverage(u8),
    #[error("question scores add up past {}", u32::MAX)]
    ScoreOverflow,
}

/// Ordered, validated list of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        let catalog = Self { questions };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn standard() -> Self {
        Self {
            questions: standard_questions(),
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.questions.is_empty() {
            return Err(CatalogError::NoQuestions);
        }

        let mut seen = BTreeSet::new();
        for question in &self.questions {
            if !seen.insert(question.id) {
                return Err(CatalogError::DuplicateQuestionId(question.id));
            }
            let options = question
                .options
                .uniform_len()
                .ok_or(CatalogError::OptionCountMismatch(question.id))?;
            if options == 0 {
                return Err(CatalogError::NoOptions(question.id));
            }
            if options != question.scoring.len() {
                return Err(CatalogError::ScoringLengthMismatch {
                    question_id: question.id,
                    options,
                    scoring: question.scoring.len(),
                });
            }
        }

        self.questions
            .iter()
            .try_fold(0u32, |sum, question| sum.checked_add(question.max_score()))
            .ok_or(CatalogError::ScoreOverflow)?;

        Ok(())
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Sum of each question's best option; the denominator of every percentage.
    pub fn max_score(&self) -> u32 {
        self.questions
            .iter()
            .fold(0u32, |sum, question| sum.saturating_add(question.max_score()))
    }
}

/// Ordered result bands partitioning 0..=100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCatalog {
    bands: Vec<ResultBand>,
}

impl ResultCatalog {
    pub fn new(bands: Vec<ResultBand>) -> Result<Self, CatalogError> {
        let catalog = Self { bands };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn standard() -> Self {
        Self {
            bands: standard_results(),
        }
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut previous: Option<u8> = None;
        for band in &self.bands {
            if band.percentage > 100 {
                return Err(CatalogError::ThresholdOutOfRange(band.percentage));
            }
            if let Some(previous) = previous {
                if band.percentage <= previous {
                    return Err(CatalogError::ThresholdsNotAscending {
                        previous,
                        next: band.percentage,
                    });
                }
            }
            previous = Some(band.percentage);
        }

        match previous {
            None => Err(CatalogError::NoResults),
            Some(100) => Ok(()),
            Some(highest) => Err(CatalogError::IncompleteCoverage(highest)),
        }
    }

    pub fn bands(&self) -> &[ResultBand] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ResultBand> {
        self.bands.get(index)
    }

    /// Band at `index`, or the highest band when `index` is past the end.
    pub fn band_or_highest(&self, index: usize) -> Option<&ResultBand> {
        self.bands.get(index).or_else(|| self.bands.last())
    }
}

/// Both catalogs a quiz attempt is scored against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizCatalog {
    pub questions: QuestionCatalog,
    pub results: ResultCatalog,
}

impl QuizCatalog {
    pub fn new(questions: QuestionCatalog, results: ResultCatalog) -> Self {
        Self { questions, results }
    }

    pub fn standard() -> Self {
        Self::new(QuestionCatalog::standard(), ResultCatalog::standard())
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        self.questions.validate()?;
        self.results.validate()
    }
}

/// Process-wide copy of the reference catalog.
pub fn standard_catalog() -> &'static QuizCatalog {
    static CATALOG: OnceLock<QuizCatalog> = OnceLock::new();
    CATALOG.get_or_init(QuizCatalog::standard)
}

const RESULT_IMAGE: &str =
    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=500&h=300&fit=crop";

fn standard_questions() -> Vec<Question> {
    vec![
        Question {
            id: 1,
            text: LocalizedText::new(
                "깊은 밤, 당신은 혼자 집에 있습니다. 갑자기 정전이 되고 어둠 속에서 낯선 발소리가 들립니다. 낯선 발소리는 누구인가?",
                "Late at night, you're alone at home. Suddenly there's a power outage and you hear strange footsteps in the darkness. Who do you think is making the strange footsteps?",
            ),
            options: LocalizedOptions::new(
                ["도둑", "바람 소리", "직장 상사"],
                ["A thief", "Wind sounds", "My boss"],
            ),
            scoring: vec![0, 1, 2],
            image: "/images/house-2601655_1280.jpg".to_string(),
        },
        Question {
            id: 2,
            text: LocalizedText::new(
                "당신이 가장 소중히 여기는 사람이 배신했습니다. 그들은 당신의 비밀을 모든 사람에게 퍼뜨렸습니다. 당신은 어떻게 하시겠습니까?",
                "The person you cherish most has betrayed you. They've spread your secrets to everyone. What would you do?",
            ),
            options: LocalizedOptions::new(
                [
                    "관계를 끊고 멀어진다",
                    "그들도 같은 고통을 느껴야 한다",
                    "친하게 지내려고 노력한다",
                ],
                [
                    "Cut ties and distance myself",
                    "They should feel the same pain",
                    "Try to maintain a friendly relationship",
                ],
            ),
            scoring: vec![0, 1, 2],
            image: "/images/mask-1641264_1280.jpg".to_string(),
        },
        Question {
            id: 3,
            text: LocalizedText::new(
                "병원에서 당신은 우연히 한 의사가 환자의 차트를 조작하는 것을 목격했습니다. 그 환자는 당신이 싫어하는 사람입니다. 당신의 행동은?",
                "At a hospital, you accidentally witness a doctor manipulating a patient's chart. The patient is someone you dislike. What is your action?",
            ),
            options: LocalizedOptions::new(
                ["즉시 신고한다", "모른 척하고 지나간다", "몰래 녹화한다"],
                [
                    "Report it immediately",
                    "Pretend not to know and pass by",
                    "Secretly record it",
                ],
            ),
            scoring: vec![0, 1, 2],
            image: "/images/hospital-921034_1280.jpg".to_string(),
        },
        Question {
            id: 4,
            text: LocalizedText::new(
                "깊은 숲 속에서 길을 잃었습니다. 멀리서 누군가의 비명소리가 들립니다. 비명소리는 누구인가?",
                "You're lost deep in the forest. You hear someone screaming in the distance. Who is making the screaming sound?",
            ),
            options: LocalizedOptions::new(
                [
                    "주위를 두리번 거리는 사람",
                    "다리를 부여잡고 있는 사람",
                    "당신을 쳐다보고 있는 사람",
                ],
                [
                    "A person looking around anxiously",
                    "A person clutching their leg",
                    "A person staring at you",
                ],
            ),
            scoring: vec![0, 1, 2],
            image: "/images/forest-7543646_1280.jpg".to_string(),
        },
        Question {
            id: 5,
            text: LocalizedText::new(
                "당신은 완벽한 범죄를 계획할 수 있는 천재적인 능력을 갖게 되었습니다. 하지만 이 능력을 사용하면 무고한 사람들이 피해를 볼 수 있습니다. 당신은?",
                "You've gained the genius ability to plan perfect crimes. But using this ability could harm innocent people. You:",
            ),
            options: LocalizedOptions::new(
                [
                    "능력을 사용하지 않는다",
                    "원하는 것을 얻기 위해 사용한다",
                    "호기심에 능력을 사용해본다",
                ],
                [
                    "Don't use the ability",
                    "Use it to get what you want",
                    "Use it out of curiosity",
                ],
            ),
            scoring: vec![0, 1, 2],
            image: "/images/hacker-3342696_1280.jpg".to_string(),
        },
    ]
}

fn standard_results() -> Vec<ResultBand> {
    vec![
        ResultBand {
            percentage: 0,
            title: LocalizedText::new("순수한 영혼", "Pure Soul"),
            description: LocalizedText::new(
                "당신은 매우 순수하고 선량한 마음을 가지고 있습니다. 타인에 대한 공감 능력이 뛰어나며, 항상 도덕적인 선택을 하려고 노력합니다. 때로는 너무 순수해서 현실의 어두운 면을 보지 못할 수도 있지만, 이런 당신의 선함이 세상을 더 밝게 만들어갑니다. 앞으로도 이 아름다운 마음을 잃지 마세요.",
                "You have a very pure and kind heart. You have excellent empathy for others and always try to make moral choices. Sometimes you might be too pure to see the dark side of reality, but your goodness makes the world brighter. Don't lose this beautiful heart.",
            ),
            image: RESULT_IMAGE.to_string(),
        },
        ResultBand {
            percentage: 25,
            title: LocalizedText::new("현실적 사고", "Realistic Thinking"),
            description: LocalizedText::new(
                "당신은 현실적이고 실용적인 사고를 가지고 있습니다. 감정보다는 논리를 우선시하며, 상황을 객관적으로 판단하는 능력이 뛰어납니다. 때로는 냉정해 보일 수 있지만, 이는 합리적인 결정을 내리기 위한 것입니다. 균형 잡힌 사고로 어려운 상황들을 잘 헤쳐나갈 수 있는 사람입니다.",
                "You have realistic and practical thinking. You prioritize logic over emotion and have excellent ability to judge situations objectively. Sometimes you might seem cold, but this is for making rational decisions. You're someone who can navigate difficult situations well with balanced thinking.",
            ),
            image: RESULT_IMAGE.to_string(),
        },
        ResultBand {
            percentage: 50,
            title: LocalizedText::new("양면의 그림자", "Shadow of Duality"),
            description: LocalizedText::new(
                "당신의 내면에는 선과 악의 균형이 존재합니다. 상황에 따라 따뜻한 공감과 차가운 계산 사이를 오갈 수 있는 복합적인 성격을 가지고 있습니다. 이는 인간의 자연스러운 모습이기도 하지만, 때로는 자신의 어두운 면을 경계해야 할 필요가 있습니다. 균형을 유지하며 선한 선택을 하려 노력하세요.",
                "There's a balance of good and evil within you. You have a complex personality that can move between warm empathy and cold calculation depending on the situation. This is a natural aspect of humans, but sometimes you need to be wary of your dark side. Try to maintain balance and make good choices.",
            ),
            image: RESULT_IMAGE.to_string(),
        },
        ResultBand {
            percentage: 75,
            title: LocalizedText::new("어둠의 속삭임", "Whisper of Darkness"),
            description: LocalizedText::new(
                "당신의 내면에는 상당한 어둠이 자리잡고 있습니다. 목적 달성을 위해서는 수단과 방법을 가리지 않을 수 있으며, 타인의 감정에 대한 공감이 제한적일 수 있습니다. 하지만 이것이 반드시 나쁜 것만은 아닙니다. 중요한 것은 이런 성향을 인식하고 통제하는 것입니다. 당신의 강인함을 선한 방향으로 활용해보세요.",
                "There's considerable darkness within you. You might not be particular about means and methods to achieve your goals, and your empathy for others' emotions might be limited. But this isn't necessarily all bad. The important thing is recognizing and controlling these tendencies. Try to use your strength in a good direction.",
            ),
            image: RESULT_IMAGE.to_string(),
        },
        ResultBand {
            percentage: 100,
            title: LocalizedText::new("완전한 어둠", "Complete Darkness"),
            description: LocalizedText::new(
                "당신은 매우 강한 사이코패스적 성향을 보입니다. 감정적 공감이 거의 없으며, 자신의 목적을 위해서는 어떤 수단도 마다하지 않을 수 있습니다. 하지만 이는 단순한 테스트 결과일 뿐입니다. 진정한 변화는 자신을 돌아보고 개선하려는 의지에서 시작됩니다. 전문가의 도움을 받아 건강한 관계를 만들어가는 것을 고려해보세요.",
                "You show very strong psychopathic tendencies. You have almost no emotional empathy and might not hesitate to use any means for your purposes. But this is just a test result. True change begins with the will to reflect on yourself and improve. Consider seeking professional help to build healthy relationships.",
            ),
            image: RESULT_IMAGE.to_string(),
        },
    ]
}
