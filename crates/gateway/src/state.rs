use std::sync::Arc;

use wagate_lifecycle::LifecycleManager;

/// Shared state handed to every route handler.
pub struct GatewayState {
    pub manager: Arc<LifecycleManager>,
    /// Country code substituted for a leading `0` in phone numbers.
    pub country_code: String,
    pub version: &'static str,
}

impl GatewayState {
    pub fn new(manager: Arc<LifecycleManager>, country_code: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            manager,
            country_code: country_code.into(),
            version: env!("CARGO_PKG_VERSION"),
        })
    }
}
