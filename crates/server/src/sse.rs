// MCP HTTP+SSE transport: one event stream per session, JSON-RPC messages
// posted to /message and answered on that stream

use crate::api::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use ocireg_mcp::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use ocireg_mcp::server::cancelled_request_id;
use ocireg_mcp::tools::ToolContext;
use serde::Deserialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const EVENT_ENDPOINT: &str = "endpoint";
pub const EVENT_MESSAGE: &str = "message";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One connected client: its outbound queue and in-flight requests.
pub struct Session {
    tx: mpsc::UnboundedSender<JsonRpcResponse>,
    cancel: CancellationToken,
    next_seq: AtomicU64,
    /// Keyed by request id text and a per-session sequence number
    in_flight: Mutex<HashMap<(String, u64), CancellationToken>>,
}

/// Handle on one registered request.
struct InFlight {
    key: Option<(String, u64)>,
    token: CancellationToken,
}

impl Session {
    fn new(tx: mpsc::UnboundedSender<JsonRpcResponse>, cancel: CancellationToken) -> Self {
        Self {
            tx,
            cancel,
            next_seq: AtomicU64::new(0),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new request; its token is cancelled with the session or by
    /// a `notifications/cancelled` naming `id`.
    fn begin(&self, id: Option<&serde_json::Value>) -> InFlight {
        let token = self.cancel.child_token();
        let key = id.map(|id| {
            let key = (id.to_string(), self.next_seq.fetch_add(1, Ordering::Relaxed));
            lock(&self.in_flight).insert(key.clone(), token.clone());
            key
        });
        InFlight { key, token }
    }

    fn finish(&self, request: &InFlight) {
        if let Some(key) = &request.key {
            lock(&self.in_flight).remove(key);
        }
    }

    /// Cancel every in-flight request carrying `id`.
    fn cancel_request(&self, id: &serde_json::Value) {
        let id = id.to_string();
        let mut in_flight = lock(&self.in_flight);
        in_flight.retain(|(request_id, _), token| {
            if *request_id != id {
                return true;
            }
            tracing::info!(request_id = %id, "Request cancelled by client");
            token.cancel();
            false
        });
    }

    fn send(&self, response: JsonRpcResponse) {
        if self.tx.send(response).is_err() {
            tracing::debug!("Session stream already closed, dropping response");
        }
    }
}

/// Open sessions keyed by id.
#[derive(Default)]
pub struct Sessions {
    inner: Mutex<HashMap<Uuid, Arc<Session>>>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn open(
        self: &Arc<Self>,
        cancel: CancellationToken,
    ) -> (SessionGuard, mpsc::UnboundedReceiver<JsonRpcResponse>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(Session::new(tx, cancel.clone()));
        lock(&self.inner).insert(id, session);
        tracing::info!(session_id = %id, "Session opened");

        let guard = SessionGuard {
            id,
            sessions: Arc::clone(self),
            cancel,
        };
        (guard, rx)
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        lock(&self.inner).get(id).cloned()
    }

    fn remove(&self, id: &Uuid) {
        lock(&self.inner).remove(id);
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned by the event stream; dropping it closes the session.
struct SessionGuard {
    id: Uuid,
    sessions: Arc<Sessions>,
    cancel: CancellationToken,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
        self.cancel.cancel();
        tracing::info!(session_id = %self.id, "Session closed");
    }
}

/// GET /sse
pub async fn open_stream(State(state): State<Arc<AppState>>) -> Response {
    if state.shutdown.is_cancelled() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let (guard, mut rx) = state.sessions.open(state.streams.child_token());
    let endpoint = format!("/message?sessionId={}", guard.id);
    let closed = guard.cancel.clone();

    let stream = async_stream::stream! {
        let _guard = guard;
        yield Ok::<_, Infallible>(Event::default().event(EVENT_ENDPOINT).data(endpoint));

        loop {
            let next = tokio::select! {
                biased;
                response = rx.recv() => response,
                _ = closed.cancelled() => None,
            };
            let Some(response) = next else {
                break;
            };

            match Event::default().event(EVENT_MESSAGE).json_data(&response) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::warn!("Failed to encode response event: {}", e),
            }
        }
    };

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

/// POST /message?sessionId=<id>
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if state.shutdown.is_cancelled() {
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    }

    let session = query
        .session_id
        .and_then(|id| Uuid::parse_str(&id).ok())
        .and_then(|id| state.sessions.get(&id));
    let Some(session) = session else {
        return (StatusCode::NOT_FOUND, "Session not found").into_response();
    };

    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!("Rejecting unparsable message: {}", e);
            let response =
                JsonRpcResponse::error(serde_json::Value::Null, JsonRpcError::parse_error());
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    if let Some(id) = cancelled_request_id(&request) {
        session.cancel_request(&id);
        return StatusCode::ACCEPTED.into_response();
    }

    let in_flight = session.begin(request.id.as_ref());
    let mcp = Arc::clone(&state.mcp);
    let ctx = ToolContext::new(headers);

    state.tracker.spawn(async move {
        let response = tokio::select! {
            response = mcp.handle_request(request, &ctx) => response,
            _ = in_flight.token.cancelled() => {
                tracing::debug!("Dropping cancelled request");
                None
            }
        };
        session.finish(&in_flight);
        if let Some(response) = response {
            session.send(response);
        }
    });

    StatusCode::ACCEPTED.into_response()
}
