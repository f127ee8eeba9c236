#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use topicgen::{CompletionBackend, CompletionRequest, Credential, Error};

pub fn init_logger()
{   let _ = env_logger::builder().is_test(true).try_init();
}

// ===== Scripted backend =====

/// Pauses a backend call until the test releases it
#[derive(Clone, Default)]
pub struct Gate
{   pub entered: Arc<Notify>
  , pub release: Arc<Notify>
}

/// Backend double that replays canned replies and counts calls
#[derive(Default)]
pub struct ScriptedBackend
{   replies: Mutex<VecDeque<Result<String, Error>>>
  , calls: AtomicUsize
  , seen: Mutex<Vec<(String, CompletionRequest)>>
  , gate: Option<Gate>
}

impl ScriptedBackend
{   pub fn replying(
      replies: Vec<Result<String, Error>>
    ) -> Arc<Self>
    {   Arc::new(ScriptedBackend
        {   replies: Mutex::new(replies.into())
          , ..Default::default()
        })
    }

    pub fn gated(
      replies: Vec<Result<String, Error>>
    , gate: Gate
    ) -> Arc<Self>
    {   Arc::new(ScriptedBackend
        {   replies: Mutex::new(replies.into())
          , gate: Some(gate)
          , ..Default::default()
        })
    }

    pub fn calls(&self) -> usize
    {   self.calls.load(Ordering::SeqCst)
    }

    /// Credentials and requests received, in order
    pub fn seen(&self) -> Vec<(String, CompletionRequest)>
    {   self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend
{   fn name(&self) -> &str
    {   "scripted"
    }

    async fn send_completion(
      &self
    , credential: &Credential
    , request: &CompletionRequest
    ) -> Result<String, Error>
    {   self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((
          credential.expose().to_string(),
          request.clone()
        ));
        if let Some(gate) = &self.gate
        {   gate.entered.notify_one();
            gate.release.notified().await;
        }
        let reply = self.replies.lock().unwrap().pop_front();
        reply.unwrap_or_else(|| Err(Error::Transport(
          "no scripted reply left".to_string()
        )))
    }
}

// ===== Local HTTP responder =====

/// One request as received by the responder
#[derive(Debug, Clone)]
pub struct Captured
{   pub method: String
  , pub path: String
  , pub headers: Vec<(String, String)>
  , pub body: String
}

impl Captured
{   pub fn header(&self, name: &str) -> Option<&str>
    {   self.headers.iter()
          .find(|(k, _)| k.eq_ignore_ascii_case(name))
          .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value
    {   serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Clone)]
struct Responder
{   status: StatusCode
  , body: String
  , captured: Arc<Mutex<Vec<Captured>>>
}

async fn respond(
  State(state): State<Responder>
, method: Method
, uri: Uri
, headers: HeaderMap
, body: String
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String)
{   let headers = headers.iter()
      .map(|(k, v)| (
        k.as_str().to_string(),
        String::from_utf8_lossy(v.as_bytes()).to_string()
      ))
      .collect();
    if let Ok(mut log) = state.captured.lock()
    {   log.push(Captured
        {   method: method.to_string()
          , path: uri.path().to_string()
          , headers
          , body
        });
    }
    (
      state.status,
      [(header::CONTENT_TYPE, "application/json")],
      state.body
    )
}

/// Serves the same canned response to every request on a
/// local port. Returns the base URL and the captured requests.
pub async fn spawn_responder(
  status: u16
, body: &str
) -> (String, Arc<Mutex<Vec<Captured>>>)
{   let captured = Arc::new(Mutex::new(Vec::new()));
    let state = Responder
    {   status: StatusCode::from_u16(status).unwrap()
      , body: body.to_string()
      , captured: captured.clone()
    };
    let app = Router::new()
      .fallback(respond)
      .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });

    (format!("http://{}", addr), captured)
}
