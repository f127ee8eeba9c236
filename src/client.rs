use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use log::{debug, error, info, warn};
use crate::config::{BackendKind, ClientConfig, Credential};
use crate::error::{Error, ErrorKind};
use crate::prompt::{PromptTemplate, SYSTEM_INSTRUCTION};
use crate::providers::{CompletionBackend, GeminiClient, OpenAiCompatClient};
use crate::request::{AcademicLevel, CompletionRequest, GenerationRequest};

/// Where the current submission stands
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Lifecycle
{   #[default]
    Idle
  , InFlight
  , Succeeded(String)
  , Failed(String)
}

impl Lifecycle
{   pub fn is_in_flight(&self) -> bool
    {   matches!(self, Lifecycle::InFlight)
    }
}

/// Sends form submissions to one backend, one at a time.
///
/// The backend strategy and credential are fixed at
/// construction. Every failure comes back as a crate `Error`
/// whose `Display` is the message to show the user.
pub struct CompletionClient
{   backend: Arc<dyn CompletionBackend>
  , credential: Result<Credential, Error>
  , template: PromptTemplate
  , timeout: Option<Duration>
  , in_flight: AtomicBool
  , lifecycle: watch::Sender<Lifecycle>
}

impl CompletionClient
{   /// Create a client over a backend strategy. A missing key
    /// is not an error here; it fails each request instead.
    pub fn new(
      backend: Arc<dyn CompletionBackend>
    , api_key: Option<&str>
    ) -> Self
    {   debug!("Creating CompletionClient for {}", backend.name());
        let credential = Credential::from_raw(api_key);
        if credential.is_err()
        {   warn!("No usable credential for {}", backend.name());
        }
        let (lifecycle, _) = watch::channel(Lifecycle::Idle);
        CompletionClient
        {   backend
          , credential
          , template: PromptTemplate::default()
          , timeout: None
          , in_flight: AtomicBool::new(false)
          , lifecycle
        }
    }

    /// Build the strategy named by the config
    pub fn from_config(config: &ClientConfig) -> Self
    {   let backend: Arc<dyn CompletionBackend>
          = match config.backend.kind
          {   BackendKind::Gemini => Arc::new(
                GeminiClient::from_config(&config.backend)
              )
            , BackendKind::AvalAi
            | BackendKind::OpenAiCompatible => Arc::new(
                OpenAiCompatClient::from_config(&config.backend)
              )
          };
        CompletionClient::new(backend, config.api_key.as_deref())
          .with_timeout(config.backend.timeout())
    }

    /// Bound each backend call. None, or a zero duration,
    /// waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self
    {   self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self
    {   self.template = template;
        self
    }

    pub fn backend_name(&self) -> &str
    {   self.backend.name()
    }

    /// Current lifecycle state
    pub fn lifecycle(&self) -> Lifecycle
    {   self.lifecycle.borrow().clone()
    }

    /// Watch lifecycle transitions
    pub fn subscribe(&self) -> watch::Receiver<Lifecycle>
    {   self.lifecycle.subscribe()
    }

    /// Return to Idle after the caller has shown the outcome.
    /// Has no effect while a request is in flight.
    pub fn reset(&self)
    {   self.lifecycle.send_if_modified(|state| {
          match state
          {   Lifecycle::Idle | Lifecycle::InFlight => false
            , _ => {
                *state = Lifecycle::Idle;
                true
              }
          }
        });
    }

    /// Entry point for the presentation layer
    pub async fn submit(
      &self
    , keywords: &str
    , field_of_study: &str
    , academic_level: AcademicLevel
    ) -> Result<String, Error>
    {   let request = GenerationRequest::new(
          keywords, field_of_study, academic_level
        );
        self.request_completion(&request).await
    }

    /// Validate, build the prompt and make the one backend call.
    /// Refuses with `Error::Busy` while another call is pending.
    pub async fn request_completion(
      &self
    , request: &GenerationRequest
    ) -> Result<String, Error>
    {   let _guard = match InFlightGuard::acquire(self)
        {   Some(guard) => guard
          , None => {
              warn!("Submission refused: request already in flight");
              return Err(Error::Busy);
            }
        };

        let result = self.run(request).await;
        match &result
        {   Ok(text) => {
              info!(
                "{} returned {} bytes",
                self.backend.name(), text.len()
              );
              self.lifecycle.send_replace(
                Lifecycle::Succeeded(text.clone())
              );
            }
          , Err(e) => {
              if e.kind() != ErrorKind::Validation
              {   error!("{} request failed: {}",
                    self.backend.name(), e);
              }
              self.lifecycle.send_replace(
                Lifecycle::Failed(e.to_string())
              );
            }
        }
        result
    }

    async fn run(
      &self
    , request: &GenerationRequest
    ) -> Result<String, Error>
    {   request.validate()?;
        let credential = self.credential.as_ref()
          .map_err(|e| e.clone())?;

        let outbound = CompletionRequest::new(
          SYSTEM_INSTRUCTION,
          self.template.render(request)
        );

        debug!(
          "Sending {} request for field {}",
          self.backend.name(), request.field_of_study
        );
        self.lifecycle.send_replace(Lifecycle::InFlight);

        let call = self.backend.send_completion(credential, &outbound);
        match self.timeout
        {   Some(limit) => {
              tokio::time::timeout(limit, call).await
                .map_err(|_| Error::Timeout(limit))?
            }
          , None => call.await
        }
    }
}

/// Holds the in-flight flag for one submission. Dropping it,
/// including when the caller abandons the future, clears the
/// flag.
struct InFlightGuard<'a>
{   client: &'a CompletionClient
}

impl<'a> InFlightGuard<'a>
{   fn acquire(client: &'a CompletionClient) -> Option<Self>
    {   client.in_flight
          .compare_exchange(
            false, true,
            Ordering::AcqRel, Ordering::Acquire
          )
          .ok()
          .map(|_| InFlightGuard { client })
    }
}

impl Drop for InFlightGuard<'_>
{   fn drop(&mut self)
    {   // An abandoned call never reached a terminal state
        self.client.lifecycle.send_if_modified(|state| {
          if state.is_in_flight()
          {   *state = Lifecycle::Idle;
              true
          } else
          {   false
          }
        });
        self.client.in_flight.store(false, Ordering::Release);
    }
}
