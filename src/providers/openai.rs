use serde::{Deserialize, Serialize};
use async_trait::async_trait;
use log::{debug, trace};
use crate::config::{BackendConfig, BackendKind, Credential};
use crate::error::Error;
use crate::request::CompletionRequest;
use super::CompletionBackend;

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionPayload
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f32
  , pub max_tokens: u32
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
  , #[serde(default)]
    pub usage: Option<Usage>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   #[serde(default)]
    pub message: Option<ResponseMessage>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage
{   #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage
{   pub prompt_tokens: Option<u64>
  , pub completion_tokens: Option<u64>
  , pub total_tokens: Option<u64>
}

impl ChatCompletionResponse
{   /// Text of the first choice, if it has any
    pub fn first_text(&self) -> Option<&str>
    {   self.choices.first()
          .and_then(|c| c.message.as_ref())
          .and_then(|m| m.content.as_deref())
          .filter(|t| !t.is_empty())
    }
}

// ===== Client =====

/// Client for OpenAI-compatible chat completion endpoints,
/// including the AvalAI proxy
pub struct OpenAiCompatClient
{   http_client: reqwest::Client
  , url: String
  , model: String
  , label: &'static str
}

impl OpenAiCompatClient
{   pub fn new(
      base_url: &str
    , model: impl Into<String>
    ) -> Self
    {   let url = format!(
          "{}/chat/completions",
          base_url.trim_end_matches('/')
        );
        debug!("Creating OpenAiCompatClient for {}", url);
        OpenAiCompatClient
        {   http_client: reqwest::Client::new()
          , url
          , model: model.into()
          , label: "OpenAI"
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self
    {   let mut client
          = OpenAiCompatClient::new(config.base_url(), config.model());
        if config.kind == BackendKind::AvalAi
        {   client.label = "AvalAI";
        }
        client
    }

    pub fn model(&self) -> &str
    {   &self.model
    }

    fn payload(&self, request: &CompletionRequest)
      -> ChatCompletionPayload
    {   ChatCompletionPayload
        {   model: self.model.clone()
          , messages: vec![
              ChatMessage
              {   role: "system".to_string()
                , content: request.system_instruction.clone()
              }
            , ChatMessage
              {   role: "user".to_string()
                , content: request.user_content.clone()
              }
            ]
          , temperature: request.temperature
          , max_tokens: request.max_output_tokens
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompatClient
{   fn name(&self) -> &str
    {   self.label
    }

    async fn send_completion(
      &self
    , credential: &Credential
    , request: &CompletionRequest
    ) -> Result<String, Error>
    {   debug!("{} send_completion with model {}",
          self.label, self.model);
        let payload = self.payload(request);
        trace!("{} request: {:?}", self.label, payload);

        let response = self.http_client
          .post(&self.url)
          .bearer_auth(credential.expose())
          .json(&payload)
          .send()
          .await
          .map_err(|e| super::transport_error(self.label, e))?;

        let envelope: ChatCompletionResponse
          = super::read_envelope(self.label, response).await?;

        if let Some(usage) = &envelope.usage
        {   trace!("{} usage: {:?}", self.label, usage);
        }

        envelope.first_text()
          .map(String::from)
          .ok_or_else(|| {
            debug!("No content in {} response", self.label);
            Error::EmptyResponse(format!(
              "{} returned no message content",
              self.label
            ))
          })
    }
}
