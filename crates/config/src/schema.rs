use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration (`wagate.toml` / `.yaml` / `.yml` / `.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WagateConfig {
    pub gateway: GatewaySection,
    pub whatsapp: WhatsAppSection,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    pub bind: String,
    pub port: u16,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

/// WhatsApp connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhatsAppSection {
    /// Directory holding the library-owned session database and persisted
    /// credentials. Defaults to `~/.wagate/whatsapp_session`.
    pub session_dir: Option<PathBuf>,
    /// Device name shown in the phone's linked-devices list.
    pub device_name: String,
    /// Country code substituted for a leading `0` in phone numbers.
    pub country_code: String,
}

impl Default for WhatsAppSection {
    fn default() -> Self {
        Self {
            session_dir: None,
            device_name: "wagate".into(),
            country_code: "62".into(),
        }
    }
}

impl WhatsAppSection {
    /// Resolved session directory: configured path, or the default under the
    /// data directory.
    pub fn resolved_session_dir(&self) -> PathBuf {
        self.session_dir
            .clone()
            .unwrap_or_else(|| crate::loader::data_dir().join("whatsapp_session"))
    }
}
