use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    serde_json::json,
    thiserror::Error,
    tracing::error,
};

use wagate_lifecycle::client::ClientError;

/// Errors surfaced by route handlers, mapped to one JSON envelope:
/// `{"status": "error", "message": ...}`.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or invalid request input.
    #[error("{0}")]
    Validation(String),
    /// An operation that needs an active session was attempted while
    /// disconnected.
    #[error("WhatsApp is not connected")]
    NotConnected,
    /// The messaging library failed. The response message is genericized;
    /// the detail only goes to the log.
    #[error("{public}")]
    Collaborator { public: &'static str, detail: String },
}

impl GatewayError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap a client error from a specific operation. Invalid JIDs are the
    /// caller's fault; everything else is a collaborator failure.
    pub fn from_client(e: ClientError, public: &'static str) -> Self {
        match e {
            ClientError::InvalidJid(detail) => Self::Validation(format!("invalid JID: {detail}")),
            ClientError::Library(detail) => Self::Collaborator { public, detail },
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::NotConnected => StatusCode::BAD_REQUEST,
            Self::Collaborator { detail, .. } => {
                error!(detail = %detail, "collaborator failure");
                StatusCode::INTERNAL_SERVER_ERROR
            },
        };
        let body = Json(json!({ "status": "error", "message": self.to_string() }));
        (status, body).into_response()
    }
}
