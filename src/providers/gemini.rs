use serde::{Deserialize, Serialize};
use async_trait::async_trait;
use log::{debug, trace};
use crate::config::{BackendConfig, Credential};
use crate::error::Error;
use crate::request::{CompletionRequest, THINKING_BUDGET};
use super::CompletionBackend;

const BACKEND_NAME: &str = "Gemini";

// ===== Request Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part
{   #[serde(default)]
    pub text: Option<String>
  , /// Set on reasoning summaries, which are not answer text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content
{   #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>
  , #[serde(default)]
    pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig
{   pub thinking_budget: u32
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub temperature: f32
  , pub max_output_tokens: u32
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest
{   pub system_instruction: Content
  , pub contents: Vec<Content>
  , pub generation_config: GenerationConfig
}

// ===== Response Types =====

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
  , #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>
  , #[serde(default)]
    pub usage_metadata: Option<serde_json::Value>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate
{   #[serde(default)]
    pub content: Option<Content>
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback
{   #[serde(default)]
    pub block_reason: Option<String>
}

impl GenerateContentResponse
{   /// Concatenated answer text of the first candidate,
    /// skipping thought parts
    pub fn text(&self) -> Option<String>
    {   let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter()
          .filter(|p| !p.thought.unwrap_or(false))
          .filter_map(|p| p.text.as_deref())
          .collect();
        if text.is_empty() { None } else { Some(text) }
    }

    fn block_reason(&self) -> Option<&str>
    {   self.prompt_feedback.as_ref()?
          .block_reason.as_deref()
    }
}

// ===== Client =====

/// Client for the Gemini generateContent API
pub struct GeminiClient
{   http_client: reqwest::Client
  , url: String
  , model: String
  , thinking_budget: Option<u32>
}

impl GeminiClient
{   pub fn new(
      base_url: &str
    , model: impl Into<String>
    ) -> Self
    {   let model = model.into();
        let url = format!(
          "{}/models/{}:generateContent",
          base_url.trim_end_matches('/'), model
        );
        // Only 2.5 models accept a thinking budget
        let thinking_budget = if model.starts_with("gemini-2.5")
        {   Some(THINKING_BUDGET)
        } else
        {   None
        };
        debug!("Creating GeminiClient for {}", url);
        GeminiClient
        {   http_client: reqwest::Client::new()
          , url
          , model
          , thinking_budget
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self
    {   GeminiClient::new(config.base_url(), config.model())
    }

    pub fn model(&self) -> &str
    {   &self.model
    }

    fn payload(&self, request: &CompletionRequest)
      -> GenerateContentRequest
    {   GenerateContentRequest
        {   system_instruction: Content
            {   role: None
              , parts: vec![Part
                {   text: Some(request.system_instruction.clone())
                  , thought: None
                }]
            }
          , contents: vec![Content
            {   role: Some("user".to_string())
              , parts: vec![Part
                {   text: Some(request.user_content.clone())
                  , thought: None
                }]
            }]
          , generation_config: GenerationConfig
            {   temperature: request.temperature
              , max_output_tokens: request.max_output_tokens
              , thinking_config: self.thinking_budget
                  .map(|thinking_budget| ThinkingConfig
                  {   thinking_budget
                  })
            }
        }
    }
}

#[async_trait]
impl CompletionBackend for GeminiClient
{   fn name(&self) -> &str
    {   BACKEND_NAME
    }

    async fn send_completion(
      &self
    , credential: &Credential
    , request: &CompletionRequest
    ) -> Result<String, Error>
    {   debug!("Gemini send_completion with model {}", self.model);
        let payload = self.payload(request);
        trace!("Gemini request: {:?}", payload);

        let response = self.http_client
          .post(&self.url)
          .header("x-goog-api-key", credential.expose())
          .json(&payload)
          .send()
          .await
          .map_err(|e| super::transport_error(BACKEND_NAME, e))?;

        let envelope: GenerateContentResponse
          = super::read_envelope(BACKEND_NAME, response).await?;

        if let Some(usage) = &envelope.usage_metadata
        {   trace!("Gemini usage: {}", usage);
        }

        match envelope.text()
        {   Some(text) => Ok(text)
          , None => {
              let reason = match envelope.block_reason()
              {   Some(block) => format!(
                    "Gemini blocked the prompt ({})", block
                  )
                , None => "Gemini returned no text".to_string()
              };
              debug!("{}", reason);
              Err(Error::EmptyResponse(reason))
            }
        }
    }
}
