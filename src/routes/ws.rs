//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic::{course_flow, move_flow_item};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::sectionizer::{recombine, sectionize};
use crate::state::AppState;
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "lessonflow_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "lessonflow_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let out = reply_json(&txt, &state).await;
        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "lessonflow_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "lessonflow_backend", "WebSocket disconnected");
}

const LOG_PAYLOAD_MAX: usize = 160;

/// Client messages can carry whole lessons; keep the debug line short.
fn log_summary(msg: &ClientWsMessage) -> String {
  trunc_for_log(&format!("{msg:?}"), LOG_PAYLOAD_MAX)
}

/// Parse, dispatch, serialize. Always yields one JSON reply.
async fn reply_json(txt: &str, state: &AppState) -> String {
  let reply = match serde_json::from_str::<ClientWsMessage>(txt) {
    Ok(incoming) => {
      debug!(target: "lessonflow_backend", msg = %log_summary(&incoming), "WS received");
      handle_client_ws(incoming, state).await
    }
    Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e), flow: None },
  };

  serde_json::to_string(&reply).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  })
}

#[instrument(level = "info", skip_all)]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Sectionize { html } => ServerWsMessage::Sections { sections: sectionize(&html) },

    ClientWsMessage::Recombine { sections } => ServerWsMessage::Recombined { html: recombine(&sections) },

    ClientWsMessage::GetFlow { course_id } => match course_flow(state, &course_id).await {
      Ok(flow) => {
        info!(target: "flow", %course_id, items = flow.items.len(), "WS flow served");
        ServerWsMessage::Flow { flow }
      }
      Err(e) => ServerWsMessage::Error { message: e.to_string(), flow: None },
    },

    ClientWsMessage::MoveFlowItem { course_id, from_index, to_index } => {
      match move_flow_item(state, &course_id, from_index, to_index).await {
        Ok(result) => ServerWsMessage::FlowMoved { result },
        Err(failure) => ServerWsMessage::Error {
          message: failure.error.to_string(),
          flow: Some(failure.flow).filter(|f| !f.is_empty()),
        },
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::Value;

  use super::*;

  async fn roundtrip(state: &AppState, msg: &str) -> Value {
    serde_json::from_str(&reply_json(msg, state).await).unwrap()
  }

  #[tokio::test]
  async fn ping_and_bad_json() {
    let st = AppState::from_parts(None, None);
    assert_eq!(roundtrip(&st, r#"{"type":"ping"}"#).await["type"], "pong");
    let v = roundtrip(&st, "{nope").await;
    assert_eq!(v["type"], "error");
    assert!(v["message"].as_str().unwrap().starts_with("Invalid JSON"));
    assert!(v.get("flow").is_none());
  }

  #[tokio::test]
  async fn sectionize_then_recombine() {
    let st = AppState::from_parts(None, None);
    let v = roundtrip(&st, r##"{"type":"sectionize","html":"<h2>Resources</h2><a href=\"#\">x</a>"}"##).await;
    assert_eq!(v["type"], "sections");
    assert_eq!(v["sections"]["resources"], "<a href=\"#\">x</a>");

    let msg = serde_json::json!({ "type": "recombine", "sections": v["sections"] }).to_string();
    let v = roundtrip(&st, &msg).await;
    assert_eq!(v["type"], "recombined");
    assert!(v["html"].as_str().unwrap().contains("<section class=\"resources\">"));
  }

  #[test]
  fn log_summary_truncates_large_payloads() {
    let html = format!("<p>{}</p>", "x".repeat(10_000));
    let line = log_summary(&ClientWsMessage::Sectionize { html });
    assert!(line.len() < LOG_PAYLOAD_MAX + 40);
    assert!(line.starts_with("Sectionize"));
    assert!(line.contains("bytes total"));
    assert_eq!(log_summary(&ClientWsMessage::Ping), "Ping");
  }

  #[tokio::test]
  async fn flow_messages() {
    let st = AppState::from_parts(None, None);
    let v = roundtrip(&st, r#"{"type":"get_flow","courseId":"web-101"}"#).await;
    assert_eq!(v["type"], "flow");
    assert_eq!(v["flow"]["totalDurationMinutes"], 245);

    let v = roundtrip(&st, r#"{"type":"move_flow_item","courseId":"web-101","fromIndex":0,"toIndex":4}"#).await;
    assert_eq!(v["type"], "flow_moved");
    assert_eq!(v["result"]["lessonIds"][2], "l-101");

    let v = roundtrip(&st, r#"{"type":"move_flow_item","courseId":"web-101","fromIndex":5,"toIndex":0}"#).await;
    assert_eq!(v["type"], "error");
    assert_eq!(v["flow"].as_array().unwrap().len(), 5);

    let v = roundtrip(&st, r#"{"type":"get_flow","courseId":"missing"}"#).await;
    assert_eq!(v["message"], "Course not found: missing");
  }
}
