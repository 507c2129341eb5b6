//! Ordered fallback chains for sharing a result and exporting the result card.
//!
//! Clients report what their browser can do; each strategy checks those
//! capabilities and the chain picks the first one that is available and has
//! not already failed on the client. Every delivery carries the notice the
//! user should see.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::locale::{Locale, Message};
use super::scoring::ResolvedResult;

pub const RESULT_IMAGE_MIME: &str = "image/png";

/// Browser features a client reports when asking how to share or export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(default)]
    pub web_share: bool,
    #[serde(default)]
    pub clipboard: bool,
    #[serde(default)]
    pub file_system_access: bool,
    #[serde(default)]
    pub mobile: bool,
}

/// What the client should do to complete a delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryInstruction {
    NativeShare {
        title: String,
        text: String,
        url: String,
    },
    CopyToClipboard {
        text: String,
    },
    ShowPrompt {
        text: String,
    },
    SaveFilePicker {
        suggested_name: String,
        mime_type: &'static str,
    },
    Download {
        filename: String,
        mime_type: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub strategy: &'static str,
    pub instruction: DeliveryInstruction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("{strategy} rejected the request: {reason}")]
    Rejected {
        strategy: &'static str,
        reason: String,
    },
    #[error("no delivery strategy left to try (attempted: {})", attempted.join(", "))]
    Exhausted { attempted: Vec<&'static str> },
}

/// One way of getting a payload to the user.
pub trait DeliveryStrategy<P>: Send + Sync {
    fn name(&self) -> &'static str;
    fn is_available(&self, capabilities: &ClientCapabilities) -> bool;
    fn deliver(&self, payload: &P, locale: Locale) -> Result<Delivery, DeliveryError>;
}

/// Strategies tried in order until one succeeds.
pub struct FallbackChain<P> {
    strategies: Vec<Box<dyn DeliveryStrategy<P>>>,
}

impl<P> Default for FallbackChain<P> {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }
}

impl<P> FallbackChain<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, strategy: impl DeliveryStrategy<P> + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    /// Runs the chain. Strategies named in `failed` were already tried by the
    /// client and are skipped.
    pub fn run(
        &self,
        payload: &P,
        locale: Locale,
        capabilities: &ClientCapabilities,
        failed: &[String],
    ) -> Result<Delivery, DeliveryError> {
        let mut attempted = Vec::new();

        for strategy in &self.strategies {
            let name = strategy.name();
            if failed.iter().any(|failed| failed == name) {
                attempted.push(name);
                continue;
            }
            if !strategy.is_available(capabilities) {
                debug!(strategy = name, "delivery strategy unavailable");
                continue;
            }

            attempted.push(name);
            match strategy.deliver(payload, locale) {
                Ok(delivery) => return Ok(delivery),
                Err(err) => warn!(strategy = name, error = %err, "delivery strategy failed"),
            }
        }

        Err(DeliveryError::Exhausted { attempted })
    }
}

/// Text and link handed to the share chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: String,
}

impl SharePayload {
    pub fn for_result(result: &ResolvedResult, locale: Locale, url: String) -> Self {
        let text = Message::ShareText.render(
            locale,
            &[
                ("percentage", result.percentage.to_string()),
                ("title", result.band.title.get(locale).to_string()),
            ],
        );
        Self {
            title: Message::ShareTitle.template(locale).to_string(),
            text,
            url,
        }
    }

    pub fn clipboard_text(&self) -> String {
        format!("{} {}", self.text, self.url)
    }
}

pub struct WebShare;

impl DeliveryStrategy<SharePayload> for WebShare {
    fn name(&self) -> &'static str {
        "web_share"
    }

    fn is_available(&self, capabilities: &ClientCapabilities) -> bool {
        capabilities.web_share
    }

    fn deliver(&self, payload: &SharePayload, _locale: Locale) -> Result<Delivery, DeliveryError> {
        Ok(Delivery {
            strategy: self.name(),
            instruction: DeliveryInstruction::NativeShare {
                title: payload.title.clone(),
                text: payload.text.clone(),
                url: payload.url.clone(),
            },
            notice: None,
        })
    }
}

pub struct Clipboard;

impl DeliveryStrategy<SharePayload> for Clipboard {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    fn is_available(&self, capabilities: &ClientCapabilities) -> bool {
        capabilities.clipboard
    }

    fn deliver(&self, payload: &SharePayload, locale: Locale) -> Result<Delivery, DeliveryError> {
        Ok(Delivery {
            strategy: self.name(),
            instruction: DeliveryInstruction::CopyToClipboard {
                text: payload.clipboard_text(),
            },
            notice: Some(Message::ClipboardCopied.template(locale).to_string()),
        })
    }
}

pub struct ManualPrompt;

impl DeliveryStrategy<SharePayload> for ManualPrompt {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn is_available(&self, _capabilities: &ClientCapabilities) -> bool {
        true
    }

    fn deliver(&self, payload: &SharePayload, locale: Locale) -> Result<Delivery, DeliveryError> {
        Ok(Delivery {
            strategy: self.name(),
            instruction: DeliveryInstruction::ShowPrompt {
                text: payload.clipboard_text(),
            },
            notice: Some(Message::ManualCopyPrompt.template(locale).to_string()),
        })
    }
}

/// Web Share, then clipboard, then a manual copy prompt.
pub fn share_chain() -> FallbackChain<SharePayload> {
    FallbackChain::new()
        .with(WebShare)
        .with(Clipboard)
        .with(ManualPrompt)
}

/// Result card export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub filename: String,
}

impl ExportPayload {
    pub fn for_result(result: &ResolvedResult) -> Self {
        Self {
            filename: export_filename(result.percentage),
        }
    }
}

pub fn export_filename(percentage: u8) -> String {
    format!("psychopath-test-result-{percentage}%.png")
}

/// Plain download followed by a tip on saving to the photo gallery.
pub struct MobileDownload;

impl DeliveryStrategy<ExportPayload> for MobileDownload {
    fn name(&self) -> &'static str {
        "mobile_download"
    }

    fn is_available(&self, capabilities: &ClientCapabilities) -> bool {
        capabilities.mobile
    }

    fn deliver(&self, payload: &ExportPayload, locale: Locale) -> Result<Delivery, DeliveryError> {
        Ok(Delivery {
            strategy: self.name(),
            instruction: DeliveryInstruction::Download {
                filename: payload.filename.clone(),
                mime_type: RESULT_IMAGE_MIME,
            },
            notice: Some(Message::MobileDownloadTip.template(locale).to_string()),
        })
    }
}

pub struct SaveFilePicker;

impl DeliveryStrategy<ExportPayload> for SaveFilePicker {
    fn name(&self) -> &'static str {
        "save_file_picker"
    }

    fn is_available(&self, capabilities: &ClientCapabilities) -> bool {
        capabilities.file_system_access && !capabilities.mobile
    }

    fn deliver(&self, payload: &ExportPayload, locale: Locale) -> Result<Delivery, DeliveryError> {
        Ok(Delivery {
            strategy: self.name(),
            instruction: DeliveryInstruction::SaveFilePicker {
                suggested_name: payload.filename.clone(),
                mime_type: RESULT_IMAGE_MIME,
            },
            notice: Some(Message::SaveSuccess.template(locale).to_string()),
        })
    }
}

pub struct AnchorDownload;

impl DeliveryStrategy<ExportPayload> for AnchorDownload {
    fn name(&self) -> &'static str {
        "download"
    }

    fn is_available(&self, _capabilities: &ClientCapabilities) -> bool {
        true
    }

    fn deliver(&self, payload: &ExportPayload, locale: Locale) -> Result<Delivery, DeliveryError> {
        Ok(Delivery {
            strategy: self.name(),
            instruction: DeliveryInstruction::Download {
                filename: payload.filename.clone(),
                mime_type: RESULT_IMAGE_MIME,
            },
            notice: Some(Message::DownloadSuccess.template(locale).to_string()),
        })
    }
}

/// Mobile download, then the save-file picker, then a plain download.
pub fn export_chain() -> FallbackChain<ExportPayload> {
    FallbackChain::new()
        .with(MobileDownload)
        .with(SaveFilePicker)
        .with(AnchorDownload)
}
