//! Configuration for the completion backend and its credential

use std::fmt;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use log::{debug, warn};
use crate::error::Error;

/// Value a build-time injected key takes when it was never set
pub const UNSET_SENTINEL: &str = "undefined";

const GEMINI_API_BASE: &str
  = "https://generativelanguage.googleapis.com/v1beta";
const AVALAI_API_BASE: &str
  = "https://api.avalai.ir/v1";

/// Which backend a deployment talks to. Fixed per build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind
{   /// Google Gemini generateContent API
    #[default]
    Gemini
  , /// AvalAI OpenAI-compatible proxy
    AvalAi
  , /// Any OpenAI-compatible chat completions endpoint
    OpenAiCompatible
}

impl BackendKind
{   pub fn default_base_url(&self) -> &'static str
    {   match self
        {   BackendKind::Gemini => GEMINI_API_BASE
          , BackendKind::AvalAi => AVALAI_API_BASE
          , BackendKind::OpenAiCompatible => AVALAI_API_BASE
        }
    }

    pub fn default_model(&self) -> &'static str
    {   match self
        {   BackendKind::Gemini => "gemini-2.5-pro"
          , BackendKind::AvalAi => "gemini-2.5-flash"
          , BackendKind::OpenAiCompatible => "gpt-3.5-turbo"
        }
    }
}

impl std::str::FromStr for BackendKind
{   type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {   match s.trim().to_ascii_lowercase().as_str()
        {   "gemini" | "google" => Ok(BackendKind::Gemini)
          , "avalai" | "aval_ai" => Ok(BackendKind::AvalAi)
          , "openai" | "open_ai_compatible" => {
              Ok(BackendKind::OpenAiCompatible)
            }
          , other => Err(Error::Configuration(format!(
              "unknown backend: {}", other
            )))
        }
    }
}

/// Backend endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig
{   pub kind: BackendKind
  , /// API base URL (if custom)
    pub base_url: Option<String>
  , /// Model name (if not the kind's default)
    pub model: Option<String>
  , /// Client-side request timeout in seconds. None leaves the
    /// call unbounded, as the hosted SDKs do by default. Zero is
    /// treated as unset.
    pub timeout_secs: Option<u64>
}

impl BackendConfig
{   pub fn new(kind: BackendKind) -> Self
    {   BackendConfig
        {   kind
          , base_url: None
          , model: None
          , timeout_secs: None
        }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str
    {   self.base_url.as_deref()
          .unwrap_or(self.kind.default_base_url())
          .trim_end_matches('/')
    }

    pub fn model(&self) -> &str
    {   self.model.as_deref()
          .unwrap_or(self.kind.default_model())
    }

    pub fn timeout(&self) -> Option<Duration>
    {   self.timeout_secs
          .filter(|secs| *secs > 0)
          .map(Duration::from_secs)
    }
}

impl Default for BackendConfig
{   fn default() -> Self
    {   BackendConfig::new(BackendKind::default())
    }
}

/// Top-level client configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig
{   pub backend: BackendConfig
  , /// Raw credential as supplied by the environment
    #[serde(skip_serializing)]
    pub api_key: Option<String>
}

impl ClientConfig
{   /// Read configuration from the process environment.
    ///
    /// | Variable                | Purpose                      |
    /// |-------------------------|------------------------------|
    /// | `API_KEY`               | credential                   |
    /// | `VITE_API_KEY`          | credential, if `API_KEY` unset |
    /// | `TOPICGEN_BACKEND`      | `gemini`, `avalai`, `openai` |
    /// | `TOPICGEN_BASE_URL`     | endpoint override            |
    /// | `TOPICGEN_MODEL`        | model override               |
    /// | `TOPICGEN_TIMEOUT_SECS` | client-side timeout          |
    pub fn from_env() -> Result<Self, Error>
    {   Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where F: Fn(&str) -> Option<String>
    {   let kind = match lookup("TOPICGEN_BACKEND")
        {   Some(raw) => raw.parse()?
          , None => BackendKind::default()
        };
        let timeout_secs = match lookup("TOPICGEN_TIMEOUT_SECS")
        {   Some(raw) => Some(parse_timeout_secs(&raw)?)
          , None => None
        };
        let api_key = lookup("API_KEY")
          .or_else(|| lookup("VITE_API_KEY"));

        debug!(
          "Loaded config for {:?} (credential present: {})",
          kind, api_key.is_some()
        );
        Ok(ClientConfig
        {   backend: BackendConfig
            {   kind
              , base_url: lookup("TOPICGEN_BASE_URL")
              , model: lookup("TOPICGEN_MODEL")
              , timeout_secs
            }
          , api_key
        })
    }
}

impl fmt::Debug for ClientConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ClientConfig")
          .field("backend", &self.backend)
          .field("api_key", &self.api_key.as_ref().map(|_| "***"))
          .finish()
    }
}

/// Whole seconds, at least one
fn parse_timeout_secs(raw: &str) -> Result<u64, Error>
{   match raw.trim().parse::<u64>()
    {   Ok(secs) if secs > 0 => Ok(secs)
      , Ok(_) => {
          warn!("TOPICGEN_TIMEOUT_SECS is zero");
          Err(Error::Configuration(
            "TOPICGEN_TIMEOUT_SECS must be at least 1; \
             leave it unset for no timeout".to_string()
          ))
        }
      , Err(_) => {
          warn!("Bad TOPICGEN_TIMEOUT_SECS: {}", raw);
          Err(Error::Configuration(format!(
            "TOPICGEN_TIMEOUT_SECS is not a number: {}",
            raw
          )))
        }
    }
}

/// A credential that is known to be set
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential
{   /// Accept a raw credential, treating blank values and the
    /// unset sentinel as missing. A usable key is kept byte for
    /// byte.
    pub fn from_raw(raw: Option<&str>) -> Result<Self, Error>
    {   match raw
        {   Some(key) if !is_unset(key) => {
              Ok(Credential(key.to_string()))
            }
          , _ => Err(Error::Configuration(
              "API_KEY (or VITE_API_KEY) is not configured. \
               Set it in the environment.".to_string()
            ))
        }
    }

    pub fn expose(&self) -> &str
    {   &self.0
    }
}

fn is_unset(key: &str) -> bool
{   let key = key.trim();
    key.is_empty() || key == UNSET_SENTINEL
}

impl fmt::Debug for Credential
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str("Credential(***)")
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::collections::HashMap;
    use crate::error::ErrorKind;

    fn lookup_from(
      pairs: &[(&str, &str)]
    ) -> impl Fn(&str) -> Option<String>
    {   let map: HashMap<String, String> = pairs.iter()
          .map(|(k, v)| (k.to_string(), v.to_string()))
          .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn sentinel_and_empty_are_missing()
    {   for raw in [None, Some(""), Some("  "), Some("undefined")]
        {   let err = Credential::from_raw(raw).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
        assert!(Credential::from_raw(Some("sk-123")).is_ok());
        assert!(Credential::from_raw(Some(" undefined\n")).is_err());
    }

    #[test]
    fn usable_key_is_kept_verbatim()
    {   let cred = Credential::from_raw(Some(" sk-1 ")).unwrap();
        assert_eq!(cred.expose(), " sk-1 ");
    }

    #[test]
    fn debug_hides_secret()
    {   let cred = Credential::from_raw(Some("sk-secret")).unwrap();
        assert!(!format!("{:?}", cred).contains("sk-secret"));
        assert_eq!(cred.expose(), "sk-secret");
    }

    #[test]
    fn config_debug_hides_api_key()
    {   let cfg = ClientConfig::from_lookup(lookup_from(&[
          ("API_KEY", "sk-live-123")
        ])).unwrap();
        let text = format!("{:?}", cfg);
        assert!(!text.contains("sk-live-123"), "{}", text);
        assert!(text.contains("api_key: Some(\"***\")"), "{}", text);
        assert!(text.contains("Gemini"), "{}", text);
    }

    #[test]
    fn env_defaults_to_gemini()
    {   let cfg = ClientConfig::from_lookup(lookup_from(&[]))
          .unwrap();
        assert_eq!(cfg.backend.kind, BackendKind::Gemini);
        assert_eq!(cfg.backend.model(), "gemini-2.5-pro");
        assert_eq!(cfg.backend.timeout(), None);
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn env_overrides_are_applied()
    {   let cfg = ClientConfig::from_lookup(lookup_from(&[
          ("TOPICGEN_BACKEND", "avalai")
        , ("TOPICGEN_BASE_URL", "http://localhost:9000/v1/")
        , ("TOPICGEN_TIMEOUT_SECS", "30")
        , ("VITE_API_KEY", "from-vite")
        ])).unwrap();
        assert_eq!(cfg.backend.kind, BackendKind::AvalAi);
        assert_eq!(cfg.backend.base_url(), "http://localhost:9000/v1");
        assert_eq!(cfg.backend.model(), "gemini-2.5-flash");
        assert_eq!(
          cfg.backend.timeout(),
          Some(Duration::from_secs(30))
        );
        assert_eq!(cfg.api_key.as_deref(), Some("from-vite"));
    }

    #[test]
    fn api_key_wins_over_vite_key()
    {   let cfg = ClientConfig::from_lookup(lookup_from(&[
          ("API_KEY", "primary")
        , ("VITE_API_KEY", "secondary")
        ])).unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn bad_backend_and_timeout_are_configuration_errors()
    {   let err = ClientConfig::from_lookup(lookup_from(&[
          ("TOPICGEN_BACKEND", "claude")
        ])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = ClientConfig::from_lookup(lookup_from(&[
          ("TOPICGEN_TIMEOUT_SECS", "soon")
        ])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn zero_timeout_is_rejected()
    {   let err = ClientConfig::from_lookup(lookup_from(&[
          ("TOPICGEN_TIMEOUT_SECS", "0")
        ])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("at least 1"));

        let mut backend = BackendConfig::new(BackendKind::Gemini);
        backend.timeout_secs = Some(0);
        assert_eq!(backend.timeout(), None);
    }

    #[test]
    fn config_loads_from_json()
    {   let json = r#"{"backend":{"kind":"open_ai_compatible",
          "base_url":null,"model":"gpt-4o-mini","timeout_secs":10}}"#;
        let cfg: ClientConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.backend.kind, BackendKind::OpenAiCompatible);
        assert_eq!(cfg.backend.model(), "gpt-4o-mini");
        assert!(cfg.api_key.is_none());
    }
}
