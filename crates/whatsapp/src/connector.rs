use std::{path::PathBuf, sync::Arc};

use {
    anyhow::Context as _,
    async_trait::async_trait,
    tracing::{debug, info},
    wacore::types::events::Event,
    whatsapp_rust::{bot::Bot, store::SqliteStore},
    whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory,
    whatsapp_rust_ureq_http_client::UreqHttpClient,
};

use wagate_lifecycle::{
    CloseReason, ConnectionEvent, LifecycleManager, client::Connector,
};

use crate::client::WhatsAppClient;

/// Builds and starts one `whatsapp-rust` bot per connect attempt.
///
/// Every lifecycle event the bot emits is forwarded to the manager tagged
/// with this attempt's generation, so a superseded bot that is still winding
/// down cannot disturb the current one.
pub struct WhatsAppConnector {
    session_dir: PathBuf,
    device_name: String,
}

impl WhatsAppConnector {
    pub fn new(session_dir: PathBuf, device_name: impl Into<String>) -> Self {
        Self {
            session_dir,
            device_name: device_name.into(),
        }
    }

    fn session_db_path(&self) -> String {
        self.session_dir.join("whatsapp.db").to_string_lossy().into_owned()
    }
}

#[async_trait]
impl Connector for WhatsAppConnector {
    async fn connect(
        &self,
        manager: Arc<LifecycleManager>,
        generation: u64,
    ) -> anyhow::Result<()> {
        let db_path = self.session_db_path();
        info!(generation, session = %db_path, "building WhatsApp bot");

        let backend = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .with_context(|| format!("opening session store at {db_path}"))?,
        );

        let event_manager = Arc::clone(&manager);
        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(
                Some(self.device_name.clone()),
                None,
                Some(waproto::whatsapp::device_props::PlatformType::Desktop),
            )
            .on_event(move |event, _client| {
                let manager = Arc::clone(&event_manager);
                async move {
                    match event {
                        Event::PairingQrCode { code, .. } => {
                            manager
                                .handle_event(generation, ConnectionEvent::QrIssued { code })
                                .await;
                        }
                        Event::PairSuccess(_) => {
                            // Connected fires right after, which is what
                            // actually flips the state.
                            info!("pairing successful");
                        }
                        Event::Connected(_) => {
                            manager.handle_event(generation, ConnectionEvent::Opened).await;
                        }
                        Event::Disconnected(_) => {
                            manager
                                .handle_event(
                                    generation,
                                    ConnectionEvent::Closed {
                                        reason: CloseReason::Other(
                                            "connection closed".to_string(),
                                        ),
                                    },
                                )
                                .await;
                        }
                        Event::LoggedOut(_) => {
                            manager
                                .handle_event(
                                    generation,
                                    ConnectionEvent::Closed {
                                        reason: CloseReason::LoggedOut,
                                    },
                                )
                                .await;
                        }
                        other => {
                            debug!(event = ?other, "unhandled WhatsApp event");
                        }
                    }
                }
            })
            .build()
            .await
            .map_err(|e| anyhow::anyhow!("WhatsApp bot build failed: {e}"))?;

        // Attach the send handle before the socket opens so pairing-code
        // requests work while the QR is still on screen.
        manager
            .attach_client(generation, Arc::new(WhatsAppClient::new(bot.client())))
            .await;

        bot.run()
            .await
            .map_err(|e| anyhow::anyhow!("WhatsApp bot run failed: {e}"))?;

        info!(generation, "WhatsApp bot started");
        Ok(())
    }
}
