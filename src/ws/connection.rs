//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::SessionResponse;
use crate::domain::{MatchId, SessionEvent};
use crate::service::OfficiatingService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards events of subscribed matches from the
///   [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<SessionEvent>,
    officiating: Arc<OfficiatingService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &officiating).await;
                        if let Some(json) = reply
                            && ws_tx.send(Message::text(json)).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(session_event) => {
                        if !subs.matches(session_event.match_id()) {
                            continue;
                        }
                        let msg = WsMessage::new(
                            uuid::Uuid::new_v4().to_string(),
                            WsMessageType::Event,
                            serde_json::to_value(&session_event).unwrap_or_default(),
                        );
                        let json = serde_json::to_string(&msg).unwrap_or_default();
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

fn parse_ids(raw: Vec<String>) -> (Vec<MatchId>, bool) {
    let mut wildcard = false;
    let ids = raw
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| {
            if s == "*" {
                wildcard = true;
            }
            s != "*" && !s.is_empty()
        })
        .map(MatchId::from)
        .collect();
    (ids, wildcard)
}

/// Handles a text message from the client, returning an optional JSON reply.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    officiating: &OfficiatingService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", 400, "malformed JSON")).ok();
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, 404, "unknown command")).ok();
    };

    let reply = match command {
        WsCommand::Subscribe { match_ids } => {
            let (ids, wildcard) = parse_ids(match_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { match_ids } => {
            let (ids, _) = parse_ids(match_ids);
            subs.unsubscribe(&ids);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                }),
            )
        }
        WsCommand::GetState { match_id } => {
            match officiating.view(&MatchId::from(match_id)).await {
                Ok(view) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::to_value(SessionResponse::from(&view)).unwrap_or_default(),
                ),
                Err(e) => WsMessage::error(msg.id, e.error_code(), e.to_string()),
            }
        }
    };
    serde_json::to_string(&reply).ok()
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use tokio_tungstenite::tungstenite::Message as WireMessage;

    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::test_support::{MatchBuilder, team, test_app};

    #[test]
    fn wildcard_is_split_from_ids() {
        let (ids, wildcard) = parse_ids(vec!["1".into(), "*".into(), " ".into(), "2".into()]);
        assert!(wildcard);
        assert_eq!(ids, vec![MatchId::from("1"), MatchId::from("2")]);

        let (ids, wildcard) = parse_ids(vec!["3".into()]);
        assert!(!wildcard);
        assert_eq!(ids.len(), 1);
    }

    fn command(id: &str, payload: Value) -> WireMessage {
        let envelope = json!({
            "id": id,
            "type": "command",
            "timestamp": chrono::Utc::now(),
            "payload": payload,
        });
        WireMessage::text(envelope.to_string())
    }

    async fn next_json<S>(stream: &mut S) -> Value
    where
        S: futures_util::Stream<Item = Result<WireMessage, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        loop {
            let Ok(Some(Ok(message))) =
                tokio::time::timeout(Duration::from_secs(2), stream.next()).await
            else {
                panic!("no message within timeout");
            };
            if let WireMessage::Text(text) = message {
                let Ok(value) = serde_json::from_str(text.as_str()) else {
                    panic!("server sent invalid JSON");
                };
                return value;
            }
        }
    }

    #[tokio::test]
    async fn subscribers_receive_events_of_their_matches() {
        let backend = Arc::new(InMemoryBackend::new());
        backend
            .put_match(
                MatchBuilder::new("8", 1)
                    .teams(&team("A", "Alpha"), &team("B", "Bravo"))
                    .build(),
            )
            .await;
        let app = test_app(&backend);
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("ephemeral port should bind");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("listener has an address");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let Ok((mut socket, _)) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await
        else {
            panic!("websocket handshake failed");
        };

        let Ok(()) = socket.send(WireMessage::text("not json")).await else {
            panic!("send failed");
        };
        let reply = next_json(&mut socket).await;
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["payload"]["code"], 400);

        let Ok(()) = socket
            .send(command("s1", json!({"command": "subscribe", "match_ids": ["8"]})))
            .await
        else {
            panic!("send failed");
        };
        let reply = next_json(&mut socket).await;
        assert_eq!(reply["id"], "s1");
        assert_eq!(reply["type"], "response");
        assert_eq!(reply["payload"]["subscribed"], json!(["8"]));

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/api/v1/matches/8/session"))
            .send()
            .await;
        let Ok(response) = response else {
            panic!("open session request failed");
        };
        assert_eq!(response.status().as_u16(), 201);

        let event = next_json(&mut socket).await;
        assert_eq!(event["type"], "event");
        assert_eq!(event["payload"]["event_type"], "session_opened");
        assert_eq!(event["payload"]["match_id"], "8");

        let Ok(()) = socket
            .send(command("g1", json!({"command": "get_state", "match_id": "8"})))
            .await
        else {
            panic!("send failed");
        };
        let reply = next_json(&mut socket).await;
        assert_eq!(reply["id"], "g1");
        assert_eq!(reply["payload"]["phase"], "scheduled");

        let Ok(()) = socket
            .send(command("g2", json!({"command": "get_state", "match_id": "99"})))
            .await
        else {
            panic!("send failed");
        };
        let reply = next_json(&mut socket).await;
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["payload"]["code"], 2001);
    }
}
