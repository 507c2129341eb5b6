//! Bilingual personality quiz engine.
//!
//! The [`quiz`] module holds the static question/result catalogs, the scorer that
//! turns answers into a result band, the share-link codec, and the session state
//! machine that drives a single quiz attempt. [`config`], [`error`], and
//! [`telemetry`] carry the service plumbing shared with the HTTP binary.

pub mod config;
pub mod error;
pub mod quiz;
pub mod telemetry;
