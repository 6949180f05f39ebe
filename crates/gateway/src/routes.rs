use std::{convert::Infallible, sync::Arc};

use {
    axum::{
        Json,
        extract::State,
        response::{
            Html,
            sse::{self, KeepAlive, Sse},
        },
    },
    futures::{Stream, StreamExt, stream},
    serde::Deserialize,
    serde_json::{Value, json},
    tokio_stream::wrappers::BroadcastStream,
};

use {
    wagate_common::jid,
    wagate_lifecycle::client::MessagingClient,
};

use crate::{error::GatewayError, pages, state::GatewayState};

// ── Request bodies ───────────────────────────────────────────────────────────

// Fields are optional so an empty body reaches the validation error instead
// of a deserialization rejection.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendGroupMessageRequest {
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
}

fn required(field: Option<String>, msg: &str) -> Result<String, GatewayError> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| GatewayError::validation(msg))
}

/// Client handle, gated on the connected state. Sends and group listing go
/// through here; pairing does not (it works before the session is open).
async fn connected_client(
    state: &GatewayState,
) -> Result<Arc<dyn MessagingClient>, GatewayError> {
    if !state.manager.current_state().await.is_connected() {
        return Err(GatewayError::NotConnected);
    }
    state.manager.client().await.ok_or(GatewayError::NotConnected)
}

// ── Handlers ─────────────────────────────────────────────────────────────────

pub async fn root() -> Html<&'static str> {
    pages::landing()
}

pub async fn qr(State(state): State<Arc<GatewayState>>) -> Html<String> {
    pages::qr_page(&state.manager.current_state().await)
}

pub async fn health(State(state): State<Arc<GatewayState>>) -> Json<Value> {
    let connection = state.manager.current_state().await.label();
    Json(json!({
        "status": "ok",
        "version": state.version,
        "connection": connection,
    }))
}

/// SSE stream: the current projection first, then one event per transition.
pub async fn status(
    State(state): State<Arc<GatewayState>>,
) -> Sse<impl Stream<Item = Result<sse::Event, Infallible>>> {
    // Subscribe before reading the snapshot: a transition landing between
    // the two must show up in the stream, not fall into the gap.
    let updates = BroadcastStream::new(state.manager.subscribe())
        .filter_map(|item| async move { item.ok() });
    let current = state.manager.current_state().await.status();

    let stream = stream::once(async move { current })
        .chain(updates)
        .map(|status| Ok(sse::Event::default().data(status.as_str())));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn send_message(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Value>, GatewayError> {
    let phone = required(req.phone_number, "phoneNumber and message are required")?;
    let message = required(req.message, "phoneNumber and message are required")?;
    let client = connected_client(&state).await?;

    let target = jid::personal_jid(&jid::normalize_phone(&phone, &state.country_code));
    let receipt = client
        .send_text(&target, &message)
        .await
        .map_err(|e| GatewayError::from_client(e, "Failed to send message"))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Message sent successfully",
        "data": receipt,
    })))
}

pub async fn send_message_group(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<SendGroupMessageRequest>,
) -> Result<Json<Value>, GatewayError> {
    let group_id = required(req.group_id, "groupId and message are required")?;
    let message = required(req.message, "groupId and message are required")?;
    let client = connected_client(&state).await?;

    let target = jid::group_jid(&group_id);
    let receipt = client
        .send_text(&target, &message)
        .await
        .map_err(|e| GatewayError::from_client(e, "Failed to send message"))?;

    Ok(Json(json!({
        "status": "success",
        "message": "Message sent successfully",
        "data": receipt,
    })))
}

/// Request a pairing code for a phone number. Works while the QR is still on
/// screen, so this only needs a client handle, not an open session.
pub async fn pairing(
    State(state): State<Arc<GatewayState>>,
    Json(req): Json<PairingRequest>,
) -> Result<Json<Value>, GatewayError> {
    let phone = required(req.phone_number, "phoneNumber is required")?;
    let client = state.manager.client().await.ok_or(GatewayError::NotConnected)?;

    let code = client
        .request_pairing_code(&phone)
        .await
        .map_err(|e| GatewayError::from_client(e, "Failed to request pairing code"))?;

    Ok(Json(json!({ "code": code })))
}

pub async fn list_groups(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<Value>, GatewayError> {
    let client = connected_client(&state).await?;

    let groups = client
        .list_groups()
        .await
        .map_err(|e| GatewayError::from_client(e, "Failed to list groups"))?;

    Ok(Json(json!({ "status": "success", "data": groups })))
}
