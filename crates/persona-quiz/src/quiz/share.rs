//! Shareable result links.
//!
//! A shared link carries the resolved result in four query parameters:
//! `result` (percentage 0..=100), `type` (result catalog index), `shared`
//! (presence flag) and an optional `lang`. Decoding never fails loudly; any
//! missing or malformed marker simply yields `None`.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

use super::locale::Locale;
use super::navigation::Navigator;

pub const RESULT_KEY: &str = "result";
pub const TYPE_KEY: &str = "type";
pub const SHARED_KEY: &str = "shared";
pub const LANG_KEY: &str = "lang";

/// Result reference reconstructed from a share link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedResultData {
    pub percentage: u8,
    pub result_index: usize,
    /// Raw `lang` value; normalizing it is left to [`Locale::normalize`].
    pub language: Option<String>,
}

/// Maps a locale to the entry page a share link should open.
pub trait EntryPathResolver: Send + Sync {
    fn entry_path(&self, language: Option<&str>) -> String;
}

impl<F> EntryPathResolver for F
where
    F: Fn(Option<&str>) -> String + Send + Sync,
{
    fn entry_path(&self, language: Option<&str>) -> String {
        self(language)
    }
}

/// Korean links open `/ko.html`; every other locale opens the root page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocaleEntryPaths;

impl EntryPathResolver for LocaleEntryPaths {
    fn entry_path(&self, language: Option<&str>) -> String {
        match language.and_then(Locale::parse) {
            Some(Locale::Ko) => "/ko.html".to_string(),
            _ => "/".to_string(),
        }
    }
}

/// Builds and reads share links for a result catalog of `result_count` bands.
#[derive(Debug, Clone)]
pub struct ShareCodec<P = LocaleEntryPaths> {
    origin: String,
    result_count: usize,
    paths: P,
}

impl ShareCodec<LocaleEntryPaths> {
    pub fn new(origin: impl Into<String>, result_count: usize) -> Self {
        Self {
            origin: origin.into(),
            result_count,
            paths: LocaleEntryPaths,
        }
    }
}

impl<P: EntryPathResolver> ShareCodec<P> {
    pub fn with_paths<Q: EntryPathResolver>(self, paths: Q) -> ShareCodec<Q> {
        ShareCodec {
            origin: self.origin,
            result_count: self.result_count,
            paths,
        }
    }

    pub fn entry_path(&self, language: Option<&str>) -> String {
        self.paths.entry_path(language)
    }

    /// Builds the share URL. Pure: nothing is pushed into any history.
    pub fn encode(&self, percentage: u8, result_index: usize, language: Option<&str>) -> String {
        let language = language.filter(|lang| !lang.is_empty());

        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair(RESULT_KEY, &percentage.to_string());
        query.append_pair(TYPE_KEY, &result_index.to_string());
        query.append_pair(SHARED_KEY, "true");
        if let Some(lang) = language {
            query.append_pair(LANG_KEY, lang);
        }

        format!(
            "{}{}?{}",
            self.origin.trim_end_matches('/'),
            self.paths.entry_path(language),
            query.finish()
        )
    }

    pub fn decode_query(&self, query: &str) -> Option<SharedResultData> {
        decode_query(query, self.result_count)
    }

    pub fn decode_url(&self, url: &str) -> Option<SharedResultData> {
        decode_url(url, self.result_count)
    }
}

/// Reads share markers from a raw query string (leading `?` tolerated).
pub fn decode_query(query: &str, result_count: usize) -> Option<SharedResultData> {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut percentage = None;
    let mut result_index = None;
    let mut shared = false;
    let mut language = None;

    // First occurrence of a key wins.
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            RESULT_KEY if percentage.is_none() => percentage = Some(value.into_owned()),
            TYPE_KEY if result_index.is_none() => result_index = Some(value.into_owned()),
            SHARED_KEY => shared = true,
            LANG_KEY if language.is_none() => language = Some(value.into_owned()),
            _ => {}
        }
    }

    let (Some(raw_percentage), Some(raw_index), true) = (percentage, result_index, shared) else {
        return None;
    };

    let percentage = match raw_percentage.parse::<i64>() {
        Ok(value @ 0..=100) => value as u8,
        _ => {
            debug!(value = %raw_percentage, "ignoring share link with invalid percentage");
            return None;
        }
    };

    let result_index = match raw_index.parse::<i64>() {
        Ok(value) if value >= 0 && (value as u64) < result_count as u64 => value as usize,
        _ => {
            debug!(value = %raw_index, result_count, "ignoring share link with invalid result type");
            return None;
        }
    };

    Some(SharedResultData {
        percentage,
        result_index,
        language: language.filter(|lang| !lang.is_empty()),
    })
}

/// Reads share markers from a full or relative URL.
pub fn decode_url(url: &str, result_count: usize) -> Option<SharedResultData> {
    let without_fragment = url.split('#').next().unwrap_or_default();
    let query = without_fragment
        .split_once('?')
        .map(|(_, query)| query)
        .unwrap_or_default();
    decode_query(query, result_count)
}

/// Reads share markers from the navigator's current entry.
pub fn decode_current(navigator: &dyn Navigator, result_count: usize) -> Option<SharedResultData> {
    decode_url(&navigator.current_url(), result_count)
}

/// Drops the query string, keeping the path and any fragment.
pub fn clear_query(url: &str) -> String {
    let (before_fragment, fragment) = match url.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (url, None),
    };
    let path = before_fragment
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(before_fragment);

    match fragment {
        Some(fragment) => format!("{path}#{fragment}"),
        None => path.to_string(),
    }
}
