//! WhatsApp adapter over `whatsapp-rust` (WhatsApp Web protocol: Noise
//! handshake + Signal encryption, paired by QR scan like WhatsApp Web).
//!
//! Implements the lifecycle crate's [`Connector`] and [`MessagingClient`]
//! seams. The session is persisted to `{session_dir}/whatsapp.db` by the
//! library's own store.
//!
//! [`Connector`]: wagate_lifecycle::client::Connector
//! [`MessagingClient`]: wagate_lifecycle::client::MessagingClient

pub mod client;
pub mod connector;

pub use {client::WhatsAppClient, connector::WhatsAppConnector};
