//! View-session WebSocket / 视图会话 WebSocket
//!
//! Text frames in are [`ClientEvent`] JSON, text frames out are
//! [`SessionView`] JSON. One connection is one [`SearchSession`].

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use directory_search::session::{ClientEvent, SearchSession, SessionView};

use crate::state::AppState;

/// GET /ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sink, stream) = socket.split();
    bridge(sink, stream, state).await;
}

/// Drive one session over any frame sink/stream pair / 连接帧与会话
async fn bridge<W, R, E>(mut sink: W, mut stream: R, state: Arc<AppState>)
where
    W: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Send + 'static,
{
    let session = SearchSession::new(
        state.dataset.clone(),
        state.search_client.clone(),
        state.upstream.clone(),
        &state.config.session_settings(),
    );
    let id = session.id();
    let active = state.session_opened();
    tracing::info!("WebSocket session {} connected ({} active)", id, active);

    let (in_tx, in_rx) = mpsc::channel::<ClientEvent>(32);
    let (out_tx, mut out_rx) = mpsc::channel::<SessionView>(32);

    let session_task = tokio::spawn(session.run(in_rx, out_tx));

    let mut send_task = tokio::spawn(async move {
        while let Some(view) = out_rx.recv().await {
            let text = match serde_json::to_string(&view) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Session {}: failed to encode view: {}", id, e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        if in_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!("Session {}: ignoring malformed event: {}", id, e),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Either side finishing ends the connection; dropping the inbound sender stops the session
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    if let Err(e) = session_task.await {
        tracing::warn!("Session {} task ended abnormally: {}", id, e);
    }
    let active = state.session_closed();
    tracing::info!("WebSocket session {} disconnected ({} active)", id, active);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use directory_search::config::AppConfig;
    use directory_search::search::seed_entries;
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(AppConfig::default(), Arc::new(seed_entries())))
    }

    async fn next_view(frames: &mut UnboundedReceiver<Message>) -> Value {
        loop {
            match frames.next().await.expect("connection closed") {
                Message::Text(text) => return serde_json::from_str(&text).unwrap(),
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_frames_drive_session_and_close_tears_down() {
        let state = test_state();
        let (client_tx, server_rx) = unbounded::<Result<Message, axum::Error>>();
        let (server_tx, mut client_rx) = unbounded::<Message>();
        let conn = tokio::spawn(bridge(server_tx, server_rx, state.clone()));

        let initial = next_view(&mut client_rx).await;
        assert_eq!(initial["term"], "");
        assert_eq!(initial["result_count"], 3);
        assert_eq!(state.active_sessions(), 1);

        client_tx.unbounded_send(Ok(Message::Text("{not json".to_string()))).unwrap();
        client_tx
            .unbounded_send(Ok(Message::Text(r#"{"type":"query","term":"consult"}"#.to_string())))
            .unwrap();

        let view = loop {
            let view = next_view(&mut client_rx).await;
            if view["term"] == "consult" {
                break view;
            }
        };
        assert_eq!(view["result_count"], 1);
        assert_eq!(view["provenance"], "mock");

        client_tx.unbounded_send(Ok(Message::Close(None))).unwrap();
        conn.await.unwrap();
        assert_eq!(state.active_sessions(), 0);

        let resp = crate::api::router(state)
            .oneshot(Request::builder().uri("/api").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let health: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(health["active_sessions"], 0);
    }

    #[tokio::test]
    async fn test_client_gone_ends_session() {
        let state = test_state();
        let (client_tx, server_rx) = unbounded::<Result<Message, axum::Error>>();
        let (server_tx, mut client_rx) = unbounded::<Message>();
        let conn = tokio::spawn(bridge(server_tx, server_rx, state.clone()));

        next_view(&mut client_rx).await;
        drop(client_tx);
        drop(client_rx);

        conn.await.unwrap();
        assert_eq!(state.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_plain_get_is_not_upgraded() {
        let resp = crate::api::router(test_state())
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
        assert_ne!(resp.status(), StatusCode::NOT_FOUND);
    }
}
