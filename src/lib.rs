//! Translation and reply-suggestion pipeline for a multilingual care
//! assistant.
//!
//! Every text a provider produces is checked against the target language
//! before it reaches a user; rejected drafts are retried with tighter
//! instructions or replaced with safe localized fallbacks.

pub mod app;
pub mod config;
pub mod error;
pub mod explain;
pub mod google;
pub mod i18n;
pub mod normalizer;
pub mod openai;
pub mod providers;
pub mod retry;
pub mod server;
pub mod suggestion;
pub mod translation;
