//! Connection lifecycle core.
//!
//! Owns the single process-wide connection state, decides reconnect versus
//! terminate on every closure, and fans status transitions out to HTTP
//! observers. The external messaging library lives behind the trait seams in
//! [`client`]; nothing in this crate knows about wire protocols or
//! cryptography.

pub mod backoff;
pub mod client;
pub mod manager;
pub mod qr;
pub mod session;
pub mod state;

pub use manager::LifecycleManager;
pub use state::{CloseReason, ConnectionEvent, ConnectionState};
