//! `/ws` 实时通道
//!
//! Each connection forwards hub events to the client and answers client
//! messages. Nothing is sent on connect; a client pulls the current state with
//! `get-config`.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::dto::realtime_dto::{ClientMessage, ServerEvent};
use crate::error::api_error::ApiError;
use crate::state::realtime_state::RealtimeState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RealtimeState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: RealtimeState) {
    let (mut writer, mut reader) = socket.split();
    let mut events = state.hub.subscribe();
    tracing::info!("realtime client connected - subscribers:{}", state.hub.subscriber_count());

    loop {
        let outgoing = tokio::select! {
            incoming = reader.next() => match incoming {
                Some(Ok(Message::Text(text))) => dispatch(&state, &text).await,
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => None,
                Some(Err(err)) => {
                    tracing::debug!("realtime read failed - err:{}", err);
                    break;
                }
            },
            event = events.recv() => match event {
                Ok(event) => Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    // 丢了事件就补发一份最新状态
                    tracing::warn!("realtime client lagging - skipped:{}", skipped);
                    resync(&state).await
                }
                Err(RecvError::Closed) => break,
            },
        };
        let Some(event) = outgoing else {
            continue;
        };
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!("realtime encode failed - err:{}", err);
                continue;
            }
        };
        if writer.send(Message::Text(text)).await.is_err() {
            break;
        }
    }
    tracing::info!("realtime client disconnected");
}

/// 处理一条客户端消息，返回只发给该客户端的回复
pub async fn dispatch(state: &RealtimeState, text: &str) -> Option<ServerEvent> {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(err) => {
            tracing::warn!("realtime message ignored - err:{} | raw:{}", err, text);
            return None;
        }
    };
    match handle_message(state, message).await {
        Ok(reply) => reply,
        Err(err) => {
            tracing::warn!("realtime message failed - err:{}", err);
            None
        }
    }
}

async fn resync(state: &RealtimeState) -> Option<ServerEvent> {
    match state.status_service.snapshot().await {
        Ok(snapshot) => Some(ServerEvent::Status(snapshot)),
        Err(err) => {
            tracing::error!("realtime resync failed - err:{}", err);
            None
        }
    }
}

async fn handle_message(
    state: &RealtimeState,
    message: ClientMessage,
) -> Result<Option<ServerEvent>, ApiError> {
    match message {
        ClientMessage::GetConfig => {
            let snapshot = state.status_service.snapshot().await?;
            Ok(Some(ServerEvent::Status(snapshot)))
        }
        ClientMessage::AddSetting(setting) => {
            state.config_service.add_setting(setting).await?;
            state.status_service.publish().await;
            Ok(None)
        }
        ClientMessage::RemoveSetting(id) => {
            state.config_service.remove_setting(&id).await?;
            state.status_service.publish().await;
            Ok(None)
        }
        ClientMessage::AdminUpdateConfig(update) => {
            let config = state.config_service.update(update).await?;
            state.hub.publish(ServerEvent::SettingsUpdated(config));
            state.status_service.publish().await;
            Ok(None)
        }
    }
}
