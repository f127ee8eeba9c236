//! Backend strategies for the completion client

pub mod gemini;
pub mod openai;

use async_trait::async_trait;
use log::{debug, trace};
use serde::de::DeserializeOwned;
use crate::config::Credential;
use crate::error::Error;
use crate::request::CompletionRequest;

// Re-export for convenience
pub use gemini::GeminiClient;
pub use openai::OpenAiCompatClient;

/// One way of turning a completion request into text.
///
/// Implementations own the wire format of a single backend and
/// must return crate errors only: transport and decoding errors
/// are mapped before they leave the strategy.
#[async_trait]
pub trait CompletionBackend: Send + Sync
{   /// Short name used in logs and error messages
    fn name(&self) -> &str;

    /// Issue exactly one call and return the generated text
    async fn send_completion(
      &self
    , credential: &Credential
    , request: &CompletionRequest
    ) -> Result<String, Error>;
}

/// Map a reqwest failure that happened before a response
/// arrived
pub(crate) fn transport_error(
  backend: &str
, e: reqwest::Error
) -> Error
{   debug!("{} HTTP error: {}", backend, e);
    Error::Transport(e.to_string())
}

/// Check the status and decode the body of a backend response.
/// An `error` object in a 2xx body is still a backend error.
pub(crate) async fn read_envelope<T: DeserializeOwned>(
  backend: &str
, response: reqwest::Response
) -> Result<T, Error>
{   let status = response.status();
    trace!("{} response status: {}", backend, status);

    let body = response.bytes().await
      .map_err(|e| transport_error(backend, e))?;

    if !status.is_success()
    {   let message = extract_error_message(&body)
          .or_else(|| status.canonical_reason().map(String::from))
          .unwrap_or_else(|| "Unknown error".to_string());
        debug!("{} API error {}: {}", backend, status, message);
        return Err(Error::backend(Some(status.as_u16()), message));
    }

    trace!("{} response body: {}", backend,
      String::from_utf8_lossy(&body));
    let value: serde_json::Value = serde_json::from_slice(&body)
      .map_err(|e| {
        debug!("{} parse error: {}", backend, e);
        Error::MalformedResponse(e.to_string())
      })?;

    if value.get("error").map_or(false, |e| !e.is_null())
    {   let message = error_message_in(&value)
          .unwrap_or_else(|| "Unknown error".to_string());
        debug!("{} error payload with {}: {}", backend, status, message);
        return Err(Error::backend(Some(status.as_u16()), message));
    }

    serde_json::from_value(value).map_err(|e| {
      debug!("{} envelope error: {}", backend, e);
      Error::MalformedResponse(e.to_string())
    })
}

/// Pull a human readable message out of an error payload.
/// Understands `{"error": {"message": ..}}` as sent by OpenAI
/// and Gemini, `{"error": ".."}`, and the proxy's flat
/// `{"message": ..}`.
pub(crate) fn extract_error_message(body: &[u8]) -> Option<String>
{   let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    error_message_in(&value)
}

fn error_message_in(value: &serde_json::Value) -> Option<String>
{   let message = match value.get("error")
    {   Some(serde_json::Value::String(s)) => Some(s.as_str())
      , Some(obj) => obj.get("message").and_then(|m| m.as_str())
      , None => value.get("message").and_then(|m| m.as_str())
    };
    message
      .map(str::trim)
      .filter(|m| !m.is_empty())
      .map(String::from)
}
