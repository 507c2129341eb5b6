use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported content locales. Korean is the fallback for unknown tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ko,
    En,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::Ko, Locale::En];

    pub const fn as_str(self) -> &'static str {
        match self {
            Locale::Ko => "ko",
            Locale::En => "en",
        }
    }

    /// Strict lookup on the primary subtag: `ko`, `ko-KR` and `en_us` match,
    /// `kok` or `english` do not.
    pub fn parse(raw: &str) -> Option<Self> {
        let primary = raw.trim().split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("ko") {
            Some(Locale::Ko)
        } else if primary.eq_ignore_ascii_case("en") {
            Some(Locale::En)
        } else {
            None
        }
    }

    /// Lenient lookup used for browser and URL supplied tags.
    pub fn normalize(raw: &str) -> Self {
        Self::parse(raw).unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A display string carried in every supported locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub ko: String,
    pub en: String,
}

impl LocalizedText {
    pub fn new(ko: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            ko: ko.into(),
            en: en.into(),
        }
    }

    pub fn get(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ko => &self.ko,
            Locale::En => &self.en,
        }
    }
}

/// Ordered option labels per locale; positions line up with a question's scoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedOptions {
    pub ko: Vec<String>,
    pub en: Vec<String>,
}

impl LocalizedOptions {
    pub fn new<K, E>(ko: K, en: E) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            ko: ko.into_iter().map(Into::into).collect(),
            en: en.into_iter().map(Into::into).collect(),
        }
    }

    pub fn get(&self, locale: Locale) -> &[String] {
        match locale {
            Locale::Ko => &self.ko,
            Locale::En => &self.en,
        }
    }

    /// Option count shared by every locale, or `None` when the locales disagree.
    pub fn uniform_len(&self) -> Option<usize> {
        let counts: Vec<usize> = Locale::ALL
            .iter()
            .map(|locale| self.get(*locale).len())
            .collect();
        let first = counts[0];
        counts.iter().all(|count| *count == first).then_some(first)
    }
}

/// User-facing notices raised by the share and export flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    ShareTitle,
    ShareText,
    ClipboardCopied,
    ManualCopyPrompt,
    SaveSuccess,
    DownloadSuccess,
    MobileDownloadTip,
    SaveError,
}

impl Message {
    pub const fn template(self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Message::ShareTitle, Locale::Ko) => "사이코패스 테스트",
            (Message::ShareTitle, Locale::En) => "Psychopath Test",
            (Message::ShareText, Locale::Ko) => {
                "나의 사이코패스 지수는 {percentage}%! 결과: {title}"
            }
            (Message::ShareText, Locale::En) => {
                "My psychopath score is {percentage}%! Result: {title}"
            }
            (Message::ClipboardCopied, Locale::Ko) => "링크가 클립보드에 복사되었습니다!",
            (Message::ClipboardCopied, Locale::En) => "The link was copied to your clipboard!",
            (Message::ManualCopyPrompt, Locale::Ko) => "아래 링크를 복사해서 공유하세요.",
            (Message::ManualCopyPrompt, Locale::En) => "Copy the link below to share it.",
            (Message::SaveSuccess, Locale::Ko) => "결과 이미지가 저장되었습니다!",
            (Message::SaveSuccess, Locale::En) => "Your result image was saved!",
            (Message::DownloadSuccess, Locale::Ko) => "결과 이미지가 다운로드되었습니다!",
            (Message::DownloadSuccess, Locale::En) => "Your result image was downloaded!",
            (Message::MobileDownloadTip, Locale::Ko) => {
                "다운로드한 이미지를 열어 사진첩에 저장하세요."
            }
            (Message::MobileDownloadTip, Locale::En) => {
                "Open the downloaded image to keep it in your photo gallery."
            }
            (Message::SaveError, Locale::Ko) => "이미지 저장에 실패했습니다.",
            (Message::SaveError, Locale::En) => "The result image could not be saved.",
        }
    }

    /// Renders the template, substituting `{name}` placeholders in order.
    pub fn render(self, locale: Locale, args: &[(&str, String)]) -> String {
        args.iter()
            .fold(self.template(locale).to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}
