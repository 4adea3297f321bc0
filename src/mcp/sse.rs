//! SSE transport
//!
//! `GET /sse` opens an event stream whose first event (`endpoint`) tells the
//! client where to POST. Requests sent to `POST /messages/?session_id=…` are
//! acknowledged with `202 Accepted`; their responses arrive on the stream as
//! `message` events.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive},
        IntoResponse, Sse,
    },
    routing::{get, post},
    Router,
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::server::McpServer;
use crate::error::{Error, Result};

type Sessions = Arc<Mutex<HashMap<Uuid, mpsc::Sender<String>>>>;

#[derive(Clone)]
struct SseState {
    server: Arc<McpServer>,
    sessions: Sessions,
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// Removes the session when its event stream is dropped
struct SessionGuard {
    id: Uuid,
    sessions: Sessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(&self.id);
        debug!(session_id = %self.id, "SSE session closed");
    }
}

/// Router serving `/sse` and `/messages/`
pub fn router(server: Arc<McpServer>) -> Router {
    let state = SseState {
        server,
        sessions: Arc::new(Mutex::new(HashMap::new())),
    };

    Router::new()
        .route("/sse", get(open_stream))
        .route("/messages/", post(post_message))
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn serve_sse(server: Arc<McpServer>, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        Error::configuration(format!("Failed to bind {}: {}", addr, e))
            .with_context("address", addr.clone())
            .with_source(e)
    })?;
    info!("Serving MCP over SSE on http://{}/sse", addr);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {}", e);
            }
        })
        .await
        .map_err(|e| Error::connection(format!("SSE server failed: {}", e)).with_source(e))
}

async fn open_stream(
    State(state): State<SseState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel::<String>(32);
    state
        .sessions
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .insert(id, tx);
    info!(session_id = %id, "SSE session opened");

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages/?session_id={}", id.simple()));
    let guard = SessionGuard {
        id,
        sessions: state.sessions.clone(),
    };

    let messages = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let message = rx.recv().await?;
        let event = Event::default().event("message").data(message);
        Some((Ok::<_, Infallible>(event), (rx, guard)))
    });
    let stream = stream::once(async move { Ok::<_, Infallible>(endpoint) }).chain(messages);

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

async fn post_message(
    State(state): State<SseState>,
    Query(query): Query<SessionQuery>,
    body: String,
) -> impl IntoResponse {
    let Ok(id) = Uuid::parse_str(&query.session_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid session ID");
    };

    let sender = state
        .sessions
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .get(&id)
        .cloned();
    let Some(sender) = sender else {
        warn!(session_id = %id, "Message for unknown session");
        return (StatusCode::NOT_FOUND, "Could not find session");
    };

    let server = state.server.clone();
    tokio::spawn(async move {
        let Some(response) = server.handle_message(&body).await else {
            return;
        };
        match serde_json::to_string(&response) {
            Ok(text) => {
                if sender.send(text).await.is_err() {
                    debug!(session_id = %id, "Session closed before response was sent");
                }
            }
            Err(e) => error!("Failed to encode MCP response: {}", e),
        }
    });

    (StatusCode::ACCEPTED, "Accepted")
}
