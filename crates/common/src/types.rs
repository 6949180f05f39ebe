use serde::{Deserialize, Serialize};

/// Receipt returned by the messaging library after a successful send.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    /// Library-assigned message id.
    pub message_id: String,
    /// Fully-qualified JID the message was delivered to.
    pub jid: String,
}

/// Joined-group summary, shaped for the `/list-groups` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub id: String,
    pub name: String,
    /// Number of participants.
    pub participants: usize,
    /// Group creation time (unix seconds), when the library reports one.
    pub created_at: Option<i64>,
    pub description: String,
    /// Whether the connected account holds the literal admin role in this
    /// group. Superadmin (group creator) does not count.
    pub is_admin: bool,
}

/// Boolean-ish projection of the connection state pushed to status observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}
