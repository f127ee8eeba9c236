//! topicgen: research topic suggestions from an LLM backend.
//!
//! ```text
//! topicgen/
//! ├── src/
//! │   ├── lib.rs          # Re-exports
//! │   ├── error.rs        # Normalized error type
//! │   ├── config.rs       # Backend selection and credential
//! │   ├── request.rs      # Form input and outbound request
//! │   ├── prompt.rs       # Template and request builder
//! │   ├── client.rs       # Completion client and lifecycle
//! │   └── providers/      # One strategy per backend wire format
//! │       ├── gemini.rs
//! │       └── openai.rs
//! └── tests/
//! ```

pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod prompt;
pub mod client;

pub use client::{CompletionClient, Lifecycle};
pub use config::{BackendConfig, BackendKind, ClientConfig, Credential};
pub use error::{Error, ErrorKind};
pub use prompt::{build_prompt, PromptTemplate, SYSTEM_INSTRUCTION};
pub use providers::CompletionBackend;
pub use request::{
  AcademicLevel, CompletionRequest, GenerationRequest, SelectOption
, ACADEMIC_LEVEL_OPTIONS, FIELD_OF_STUDY_OPTIONS
};

/// Install an env_logger driven by `RUST_LOG`.
/// Safe to call more than once.
pub fn init_logging()
{   let _ = env_logger::Builder::from_env(
      env_logger::Env::default().default_filter_or("info")
    ).try_init();
}
