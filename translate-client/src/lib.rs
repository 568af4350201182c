//! Shared translation client library for the pdf-audio workspace
//!
//! Provides a unified interface for machine translation backends:
//! - Google Translate (public web endpoint)
//! - LibreTranslate (self-hosted or public instance)
//! - Mock provider for tests

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::{Config, ProviderConfig};
pub use error::{Result, TranslateError};
pub use provider::{TranslateProvider, TranslateRequest, TranslateResponse};
pub use providers::{MockProvider, ProviderKind, get_provider};
