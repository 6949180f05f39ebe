use std::sync::Arc;

use {async_trait::async_trait, thiserror::Error};

use wagate_common::types::{GroupInfo, SendReceipt};

use crate::manager::LifecycleManager;

/// Error surfaced by the external messaging library.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid JID: {0}")]
    InvalidJid(String),
    #[error("{0}")]
    Library(String),
}

/// Live send/fetch handle onto the external messaging library.
///
/// The gateway only ever talks to the library through this seam; session
/// cryptography, message framing, and multi-device protocol handling stay on
/// the other side of it.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Send a plain text message to a fully-qualified JID.
    async fn send_text(&self, jid: &str, text: &str) -> Result<SendReceipt, ClientError>;

    /// Request a pairing code for a phone number in E.164 format.
    async fn request_pairing_code(&self, phone: &str) -> Result<String, ClientError>;

    /// List the groups the connected account participates in.
    async fn list_groups(&self) -> Result<Vec<GroupInfo>, ClientError>;
}

/// Builds and starts a fresh messaging client wired to the lifecycle manager.
///
/// Invoked once at startup and once per reconnect attempt. Implementations
/// must tag everything they forward to the manager with the supplied
/// generation so events from a superseded instance can be fenced out.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        manager: Arc<LifecycleManager>,
        generation: u64,
    ) -> anyhow::Result<()>;
}
