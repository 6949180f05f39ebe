use std::sync::Arc;

use {
    async_trait::async_trait,
    tracing::debug,
    wacore_binary::jid::Jid,
    whatsapp_rust::{GroupMetadata, client::Client},
};

use {
    wagate_common::types::{GroupInfo, SendReceipt},
    wagate_lifecycle::client::{ClientError, MessagingClient},
};

/// Send/fetch handle backed by a live `whatsapp-rust` client.
pub struct WhatsAppClient {
    inner: Arc<Client>,
}

impl WhatsAppClient {
    pub fn new(inner: Arc<Client>) -> Self {
        Self { inner }
    }

    /// Own phone-number JID, used to find ourselves in participant lists.
    async fn own_user(&self) -> Option<String> {
        self.inner.get_pn().await.map(|jid| jid.user)
    }
}

#[async_trait]
impl MessagingClient for WhatsAppClient {
    async fn send_text(&self, jid: &str, text: &str) -> Result<SendReceipt, ClientError> {
        let target: Jid = jid
            .parse()
            .map_err(|e| ClientError::InvalidJid(format!("{jid}: {e}")))?;

        let msg = waproto::whatsapp::Message {
            conversation: Some(text.to_string()),
            ..Default::default()
        };

        let message_id = self
            .inner
            .send_message(target, msg)
            .await
            .map_err(|e| ClientError::Library(e.to_string()))?;

        debug!(%jid, %message_id, "message sent");
        Ok(SendReceipt {
            message_id,
            jid: jid.to_string(),
        })
    }

    async fn request_pairing_code(&self, phone: &str) -> Result<String, ClientError> {
        self.inner
            .request_pairing_code(phone)
            .await
            .map_err(|e| ClientError::Library(e.to_string()))
    }

    async fn list_groups(&self) -> Result<Vec<GroupInfo>, ClientError> {
        let groups = self
            .inner
            .groups()
            .get_joined_groups()
            .await
            .map_err(|e| ClientError::Library(e.to_string()))?;

        let own_user = self.own_user().await;
        Ok(groups
            .into_iter()
            .map(|meta| group_info(meta, own_user.as_deref()))
            .collect())
    }
}

/// Project library group metadata onto the wire shape.
///
/// `is_admin` is true only for the plain admin role. The account that created
/// the group holds the superadmin role instead and is deliberately excluded,
/// so the flag answers "was I promoted", not "do I have privileges".
fn group_info(meta: GroupMetadata, own_user: Option<&str>) -> GroupInfo {
    let is_admin = own_user
        .map(|user| {
            meta.participants
                .iter()
                .any(|p| p.jid.user == user && p.is_admin && !p.is_super_admin)
        })
        .unwrap_or(false);

    GroupInfo {
        id: meta.jid.to_string(),
        name: meta.name,
        participants: meta.participants.len(),
        created_at: meta.created_at,
        description: meta.description,
        is_admin,
    }
}
