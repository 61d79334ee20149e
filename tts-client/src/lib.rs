//! Speech synthesis client library for the thesis-narrator workspace
//!
//! Provides a provider-agnostic interface to remote TTS backends:
//! - Google Cloud Text-to-Speech (REST)
//! - Mock provider for tests
//!
//! Credentials are resolved once from config and injected into the provider at
//! construction; there is no process-wide client state.

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::{Credential, ProviderConfig};
pub use error::{Result, SynthesisError};
pub use provider::{AudioEncoding, SpeechSynthesizer, SynthesisRequest, VoiceSelection};
pub use providers::{MockSynthesizer, ProviderKind, RetryingSynthesizer, get_synthesizer};
