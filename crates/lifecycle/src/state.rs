use wagate_common::types::ConnectionStatus;

/// Process-wide connection state. Exactly one instance, owned by the
/// [`LifecycleManager`](crate::manager::LifecycleManager) and mutated only by
/// its event handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Waiting for the user to scan a QR code. The payload is a PNG data URL,
    /// always non-empty, and cleared on any transition away from this state.
    AwaitingScan { qr: String },
    Connected,
    /// The session was explicitly logged out. Terminal for this credential
    /// set: no reconnect is attempted and the operator must re-authenticate.
    LoggedOut,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Stable label for health reporting.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::AwaitingScan { .. } => "awaiting_scan",
            Self::Connected => "connected",
            Self::LoggedOut => "logged_out",
        }
    }

    /// QR payload, present only in `AwaitingScan`.
    pub fn qr(&self) -> Option<&str> {
        match self {
            Self::AwaitingScan { qr } => Some(qr),
            _ => None,
        }
    }

    /// The boolean-ish projection pushed to status observers.
    pub fn status(&self) -> ConnectionStatus {
        if self.is_connected() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        }
    }
}

/// Why the connection closed, as reported by the messaging library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The session was logged out on the phone. Terminal.
    LoggedOut,
    /// Any other closure (network drop, server restart, stream error).
    /// Reconnectable.
    Other(String),
}

/// Lifecycle event emitted by a messaging client instance. Every event is
/// tagged with the generation of the instance that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The library issued a raw QR pairing payload.
    QrIssued { code: String },
    /// The connection is open and authenticated.
    Opened,
    /// The connection closed.
    Closed { reason: CloseReason },
}
