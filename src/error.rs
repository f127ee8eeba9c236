use std::fmt;
use std::time::Duration;

/// Coarse classification of a failure, for callers that
/// branch on the kind rather than on the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind
{   Validation
  , Configuration
  , Transport
  , Backend
  , EmptyResponse
  , Busy
}

/// Custom error type for topicgen operations.
/// Every backend failure is normalized into one of these
/// variants before leaving the completion client.
/// Implements Clone for sending through channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Required user input is missing or not in the catalog
    Validation(String)
  , /// Credential missing/invalid, or bad deployment setup
    Configuration(String)
  , /// Request never got a usable response
    Transport(String)
  , /// Response body could not be decoded
    MalformedResponse(String)
  , /// Configured client-side timeout expired
    Timeout(Duration)
  , /// Backend answered with a non-success status or error payload
    Backend
    {   status: Option<u16>
      , message: String
      , credential_rejected: bool
    }
  , /// Backend succeeded but produced no text
    EmptyResponse(String)
  , /// A submission is already in flight
    Busy
}

impl Error
{   /// Classification of this error
    pub fn kind(&self) -> ErrorKind
    {   match self
        {   Error::Validation(_) => ErrorKind::Validation
          , Error::Configuration(_) => ErrorKind::Configuration
          , Error::Transport(_)
          | Error::MalformedResponse(_)
          | Error::Timeout(_) => ErrorKind::Transport
          , Error::Backend { .. } => ErrorKind::Backend
          , Error::EmptyResponse(_) => ErrorKind::EmptyResponse
          , Error::Busy => ErrorKind::Busy
        }
    }

    /// Build a backend error, flagging messages that point at a
    /// bad API key
    pub fn backend(
      status: Option<u16>
    , message: impl Into<String>
    ) -> Self
    {   let message = message.into();
        let credential_rejected = mentions_bad_key(&message);
        Error::Backend
        {   status
          , message
          , credential_rejected
        }
    }
}

const BAD_KEY_MARKERS: &[&str] = &[
  "API key not valid"
, "API_KEY_INVALID"
, "Invalid API key"
, "API key is not specified"
];

fn mentions_bad_key(message: &str) -> bool
{   BAD_KEY_MARKERS.iter().any(|m| message.contains(m))
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::Validation(msg) => {
              write!(f, "{}", msg)
            }
          , Error::Configuration(msg) => {
              write!(f, "Configuration error: {}", msg)
            }
          , Error::Transport(msg) => {
              write!(f,
                "Could not reach the AI service: {}",
                msg
              )
            }
          , Error::MalformedResponse(msg) => {
              write!(f,
                "The AI service sent an unreadable response: {}",
                msg
              )
            }
          , Error::Timeout(limit) => {
              write!(f,
                "The AI service did not answer within {:?}",
                limit
              )
            }
          , Error::Backend
            {   status
              , message
              , credential_rejected
            } => {
              match status
              {   Some(code) => write!(f,
                    "AI service error: {} - {}",
                    code, message
                  )?
                , None => write!(f,
                    "AI service error: {}",
                    message
                  )?
              }
              if *credential_rejected
              {   write!(f,
                    " (the API key is invalid or missing; \
                     check the API_KEY setting)"
                  )?;
              }
              Ok(())
            }
          , Error::EmptyResponse(msg) => {
              write!(f,
                "The AI service returned no content: {}",
                msg
              )
            }
          , Error::Busy => {
              write!(f,
                "A request is already in progress; \
                 wait for it to finish"
              )
            }
        }
    }
}

impl std::error::Error for Error {}
