//! HTTP gateway: axum router, route handlers, error mapping, and the
//! QR/landing pages. Handlers are stateless; everything they need lives in
//! [`state::GatewayState`].

pub mod error;
pub mod pages;
pub mod routes;
pub mod server;
pub mod state;

pub use {
    server::{build_gateway_app, start_gateway},
    state::GatewayState,
};
