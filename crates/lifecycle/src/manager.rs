use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use {
    tokio::sync::{Mutex, RwLock, broadcast},
    tracing::{debug, error, info, warn},
};

use wagate_common::types::ConnectionStatus;

use crate::{
    backoff::Backoff,
    client::{Connector, MessagingClient},
    qr,
    session::SessionStore,
    state::{CloseReason, ConnectionEvent, ConnectionState},
};

/// Capacity of the status broadcast channel. A lagging observer loses
/// intermediate transitions, never the subscription itself.
const STATUS_CHANNEL_CAPACITY: usize = 32;

/// Owns the process-wide [`ConnectionState`], reacts to lifecycle events from
/// the messaging client, decides reconnect versus terminate, and publishes
/// every transition to subscribed observers.
///
/// State is only ever written from [`handle_event`](Self::handle_event);
/// HTTP handlers read it concurrently through [`current_state`](Self::current_state).
pub struct LifecycleManager {
    state: RwLock<ConnectionState>,
    client: RwLock<Option<Arc<dyn MessagingClient>>>,
    connector: RwLock<Option<Arc<dyn Connector>>>,
    session: Arc<dyn SessionStore>,
    status_tx: broadcast::Sender<ConnectionStatus>,
    backoff: Mutex<Backoff>,
    /// Generation of the most recently started client. Events tagged with an
    /// older generation come from a superseded instance and are dropped, so
    /// two clients can never race to claim the session.
    generation: AtomicU64,
    /// Set while a reconnect attempt is in flight: overlapping close events
    /// schedule at most one.
    reconnect_pending: AtomicBool,
}

impl LifecycleManager {
    pub fn new(session: Arc<dyn SessionStore>) -> Arc<Self> {
        Self::with_backoff(session, Backoff::default())
    }

    pub fn with_backoff(session: Arc<dyn SessionStore>, backoff: Backoff) -> Arc<Self> {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Arc::new(Self {
            state: RwLock::new(ConnectionState::Disconnected),
            client: RwLock::new(None),
            connector: RwLock::new(None),
            session,
            status_tx,
            backoff: Mutex::new(backoff),
            generation: AtomicU64::new(0),
            reconnect_pending: AtomicBool::new(false),
        })
    }

    /// Late-bind the connector (it needs an `Arc<LifecycleManager>` itself).
    pub async fn set_connector(&self, connector: Arc<dyn Connector>) {
        *self.connector.write().await = Some(connector);
    }

    /// Session store shared with the messaging library.
    pub fn session(&self) -> &dyn SessionStore {
        self.session.as_ref()
    }

    /// Pure read of the current connection state.
    pub async fn current_state(&self) -> ConnectionState {
        self.state.read().await.clone()
    }

    /// Live client handle, if a messaging client is currently attached.
    pub async fn client(&self) -> Option<Arc<dyn MessagingClient>> {
        self.client.read().await.clone()
    }

    /// Subscribe to the connected/disconnected projection of transitions.
    ///
    /// There is no replay: a subscriber only sees transitions that happen
    /// after it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Forward updated credentials to the session store. Side effect only —
    /// no state transition, no observer notification.
    pub fn on_credentials_update(&self, blob: &[u8]) {
        if let Err(e) = self.session.persist(blob) {
            error!(error = %e, "failed to persist session credentials");
        }
    }

    /// Kick off the first connection. Failures are retried with backoff, the
    /// same as a closed connection.
    pub async fn start(self: &Arc<Self>) {
        if let Err(e) = self.connect_now().await {
            error!(error = %e, "initial connection failed");
            self.schedule_reconnect();
        }
    }

    /// Invoke the connector with a fresh generation. Shared by startup and
    /// the reconnect path. Returns the generation of the client being started.
    pub async fn connect_now(self: &Arc<Self>) -> anyhow::Result<u64> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let connector = self
            .connector
            .read()
            .await
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no connector configured"))?;
        connector.connect(Arc::clone(self), generation).await?;
        Ok(generation)
    }

    /// Attach the live send/fetch handle for `generation`. A handle from a
    /// superseded instance is dropped.
    pub async fn attach_client(&self, generation: u64, client: Arc<dyn MessagingClient>) {
        if generation != self.generation.load(Ordering::SeqCst) {
            debug!(generation, "dropping client handle from superseded instance");
            return;
        }
        *self.client.write().await = Some(client);
    }

    /// Handle a lifecycle event emitted by the client started as `generation`.
    pub async fn handle_event(self: &Arc<Self>, generation: u64, event: ConnectionEvent) {
        if generation != self.generation.load(Ordering::SeqCst) {
            debug!(generation, ?event, "dropping event from superseded instance");
            return;
        }

        match event {
            ConnectionEvent::QrIssued { code } => self.on_qr_issued(&code).await,
            ConnectionEvent::Opened => self.on_opened().await,
            ConnectionEvent::Closed { reason } => self.on_closed(reason).await,
        }
    }

    async fn on_qr_issued(&self, code: &str) {
        match qr::data_url(code) {
            Ok(data_url) => {
                info!("QR code issued, awaiting scan");
                *self.state.write().await = ConnectionState::AwaitingScan { qr: data_url };
                self.publish(ConnectionStatus::Disconnected);
            },
            Err(e) => {
                // Keep the previous state: an AwaitingScan with an empty
                // payload must never be observable.
                error!(error = %e, "failed to render QR payload");
            },
        }
    }

    async fn on_opened(&self) {
        info!("connection open");
        *self.state.write().await = ConnectionState::Connected;
        self.backoff.lock().await.reset();
        self.publish(ConnectionStatus::Connected);
    }

    async fn on_closed(self: &Arc<Self>, reason: CloseReason) {
        // The closing instance no longer holds the socket. Drop its handle
        // first so HTTP handlers stop routing sends through it.
        *self.client.write().await = None;

        match reason {
            CloseReason::LoggedOut => {
                warn!("session logged out, not reconnecting");
                *self.state.write().await = ConnectionState::LoggedOut;
                self.publish(ConnectionStatus::Disconnected);
            },
            CloseReason::Other(detail) => {
                warn!(reason = %detail, "connection closed, scheduling reconnect");
                *self.state.write().await = ConnectionState::Disconnected;
                self.publish(ConnectionStatus::Disconnected);
                self.schedule_reconnect();
            },
        }
    }

    /// Schedule exactly one reconnect attempt, delayed by the current backoff.
    fn schedule_reconnect(self: &Arc<Self>) {
        if self.reconnect_pending.swap(true, Ordering::SeqCst) {
            debug!("reconnect already pending");
            return;
        }

        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let delay = manager.backoff.lock().await.next_delay();
            debug!(delay_ms = delay.as_millis() as u64, "reconnect scheduled");
            tokio::time::sleep(delay).await;

            // Clear the flag before connecting: a close reported by the new
            // generation while its connect is still in flight must be able to
            // schedule its own attempt, or the reconnect loop stalls for good.
            manager.reconnect_pending.store(false, Ordering::SeqCst);
            if let Err(e) = manager.connect_now().await {
                error!(error = %e, "reconnect attempt failed");
                manager.schedule_reconnect();
            }
        });
    }

    fn publish(&self, status: ConnectionStatus) {
        // Err only means there are no observers right now.
        let _ = self.status_tx.send(status);
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::{Path, PathBuf},
        sync::Mutex as StdMutex,
        time::Duration,
    };

    use async_trait::async_trait;

    use wagate_common::types::{GroupInfo, SendReceipt};

    use super::*;
    use crate::{
        client::ClientError,
        session::{SessionError, SessionStore},
    };

    struct MemorySession {
        dir: PathBuf,
        blobs: StdMutex<Vec<Vec<u8>>>,
    }

    impl MemorySession {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                dir: PathBuf::from("/tmp/wagate-test-session"),
                blobs: StdMutex::new(Vec::new()),
            })
        }

        fn persisted(&self) -> Vec<Vec<u8>> {
            self.blobs.lock().expect("lock").clone()
        }
    }

    impl SessionStore for MemorySession {
        fn dir(&self) -> &Path {
            &self.dir
        }

        fn persist(&self, blob: &[u8]) -> Result<(), SessionError> {
            self.blobs.lock().expect("lock").push(blob.to_vec());
            Ok(())
        }

        fn load(&self) -> Result<Option<Vec<u8>>, SessionError> {
            Ok(self.blobs.lock().expect("lock").last().cloned())
        }
    }

    /// Records the generation of every connect invocation.
    struct CountingConnector {
        generations: StdMutex<Vec<u64>>,
    }

    impl CountingConnector {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                generations: StdMutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<u64> {
            self.generations.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Connector for CountingConnector {
        async fn connect(
            &self,
            _manager: Arc<LifecycleManager>,
            generation: u64,
        ) -> anyhow::Result<()> {
            self.generations.lock().expect("lock").push(generation);
            Ok(())
        }
    }

    /// Connector whose `block_call`-th invocation parks until released,
    /// simulating a connect attempt that is still in flight.
    struct GatedConnector {
        generations: StdMutex<Vec<u64>>,
        block_call: usize,
        gate: tokio::sync::Notify,
    }

    impl GatedConnector {
        fn new(block_call: usize) -> Arc<Self> {
            Arc::new(Self {
                generations: StdMutex::new(Vec::new()),
                block_call,
                gate: tokio::sync::Notify::new(),
            })
        }

        fn calls(&self) -> Vec<u64> {
            self.generations.lock().expect("lock").clone()
        }

        fn release(&self) {
            self.gate.notify_one();
        }
    }

    #[async_trait]
    impl Connector for GatedConnector {
        async fn connect(
            &self,
            _manager: Arc<LifecycleManager>,
            generation: u64,
        ) -> anyhow::Result<()> {
            let call = {
                let mut calls = self.generations.lock().expect("lock");
                calls.push(generation);
                calls.len()
            };
            if call == self.block_call {
                self.gate.notified().await;
            }
            Ok(())
        }
    }

    struct NoopClient;

    #[async_trait]
    impl MessagingClient for NoopClient {
        async fn send_text(&self, jid: &str, _text: &str) -> Result<SendReceipt, ClientError> {
            Ok(SendReceipt {
                message_id: "id".into(),
                jid: jid.into(),
            })
        }

        async fn request_pairing_code(&self, _phone: &str) -> Result<String, ClientError> {
            Ok("ABCD-EFGH".into())
        }

        async fn list_groups(&self) -> Result<Vec<GroupInfo>, ClientError> {
            Ok(Vec::new())
        }
    }

    async fn test_manager() -> (Arc<LifecycleManager>, Arc<CountingConnector>, Arc<MemorySession>)
    {
        let session = MemorySession::new();
        let manager = LifecycleManager::with_backoff(
            Arc::clone(&session) as Arc<dyn SessionStore>,
            Backoff::new(Duration::from_millis(1), Duration::from_millis(4)),
        );
        let connector = CountingConnector::new();
        manager
            .set_connector(Arc::clone(&connector) as Arc<dyn Connector>)
            .await;
        (manager, connector, session)
    }

    /// Poll until `n` connect calls have been observed, or fail after 2s.
    async fn wait_for_calls(calls: impl Fn() -> Vec<u64>, n: usize) -> Vec<u64> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let seen = calls();
            if seen.len() >= n {
                return seen;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {n} connect calls, saw {seen:?}"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn qr_event_enters_awaiting_scan_with_payload() {
        let (manager, _, _) = test_manager().await;
        let generation = manager.connect_now().await.expect("connect");

        manager
            .handle_event(generation, ConnectionEvent::QrIssued { code: "raw-qr".into() })
            .await;

        let state = manager.current_state().await;
        let qr = state.qr().expect("payload present");
        assert!(qr.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn open_clears_qr_and_connects() {
        let (manager, _, _) = test_manager().await;
        let generation = manager.connect_now().await.expect("connect");

        manager
            .handle_event(generation, ConnectionEvent::QrIssued { code: "raw-qr".into() })
            .await;
        manager.handle_event(generation, ConnectionEvent::Opened).await;

        let state = manager.current_state().await;
        assert!(state.is_connected());
        assert_eq!(state.qr(), None);
    }

    #[tokio::test]
    async fn non_logout_close_reconnects_exactly_once() {
        let (manager, connector, _) = test_manager().await;
        let generation = manager.connect_now().await.expect("connect");
        manager.handle_event(generation, ConnectionEvent::Opened).await;

        manager
            .handle_event(
                generation,
                ConnectionEvent::Closed {
                    reason: CloseReason::Other("stream error".into()),
                },
            )
            .await;

        let calls = wait_for_calls(|| connector.calls(), 2).await;
        assert_eq!(calls, vec![1, 2]);

        // No further attempts happen on their own.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(connector.calls().len(), 2);
    }

    #[tokio::test]
    async fn logged_out_close_is_terminal() {
        let (manager, connector, _) = test_manager().await;
        let generation = manager.connect_now().await.expect("connect");
        manager.handle_event(generation, ConnectionEvent::Opened).await;

        manager
            .handle_event(
                generation,
                ConnectionEvent::Closed {
                    reason: CloseReason::LoggedOut,
                },
            )
            .await;

        assert_eq!(manager.current_state().await, ConnectionState::LoggedOut);
        assert!(manager.client().await.is_none());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(connector.calls(), vec![1], "no reconnect after logout");
    }

    #[tokio::test]
    async fn stale_generation_events_are_ignored() {
        let (manager, _, _) = test_manager().await;
        let first = manager.connect_now().await.expect("connect");
        let second = manager.connect_now().await.expect("connect");
        assert!(second > first);

        // The superseded instance reports open; it must not flip the state.
        manager.handle_event(first, ConnectionEvent::Opened).await;
        assert_eq!(manager.current_state().await, ConnectionState::Disconnected);

        manager
            .attach_client(first, Arc::new(NoopClient) as Arc<dyn MessagingClient>)
            .await;
        assert!(manager.client().await.is_none());

        manager.handle_event(second, ConnectionEvent::Opened).await;
        assert!(manager.current_state().await.is_connected());
    }

    #[tokio::test]
    async fn observer_subscribing_after_transition_sees_only_the_next_one() {
        let (manager, _, _) = test_manager().await;
        let generation = manager.connect_now().await.expect("connect");
        manager.handle_event(generation, ConnectionEvent::Opened).await;

        // Subscribed strictly after the Connected transition: nothing yet.
        let mut rx = manager.subscribe();
        assert!(rx.try_recv().is_err());

        manager
            .handle_event(
                generation,
                ConnectionEvent::Closed {
                    reason: CloseReason::Other("gone".into()),
                },
            )
            .await;

        assert_eq!(rx.recv().await.expect("update"), ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn credentials_update_is_side_effect_only() {
        let (manager, _, session) = test_manager().await;
        let mut rx = manager.subscribe();

        manager.on_credentials_update(b"rotated-keys");

        assert_eq!(session.persisted(), vec![b"rotated-keys".to_vec()]);
        assert_eq!(manager.current_state().await, ConnectionState::Disconnected);
        assert!(rx.try_recv().is_err(), "no status published");
    }

    #[tokio::test]
    async fn overlapping_closes_schedule_a_single_reconnect() {
        let (manager, connector, _) = test_manager().await;
        let generation = manager.connect_now().await.expect("connect");

        // Two closes from the same (still current) generation in quick
        // succession: the pending flag collapses them into one attempt.
        let close = ConnectionEvent::Closed {
            reason: CloseReason::Other("flap".into()),
        };
        manager.handle_event(generation, close.clone()).await;
        manager.handle_event(generation, close).await;

        let calls = wait_for_calls(|| connector.calls(), 2).await;
        assert_eq!(calls.len(), 2);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(connector.calls().len(), 2);
    }

    #[tokio::test]
    async fn close_during_an_inflight_reconnect_schedules_another_attempt() {
        let session = MemorySession::new();
        let manager = LifecycleManager::with_backoff(
            Arc::clone(&session) as Arc<dyn SessionStore>,
            Backoff::new(Duration::from_millis(1), Duration::from_millis(4)),
        );
        let connector = GatedConnector::new(2);
        manager
            .set_connector(Arc::clone(&connector) as Arc<dyn Connector>)
            .await;

        let generation = manager.connect_now().await.expect("connect");
        manager
            .handle_event(
                generation,
                ConnectionEvent::Closed {
                    reason: CloseReason::Other("drop".into()),
                },
            )
            .await;

        // The reconnect for generation 2 is now parked inside connect().
        wait_for_calls(|| connector.calls(), 2).await;

        // Generation 2 reports a close while its own connect is still in
        // flight. This must schedule a third attempt, not vanish.
        manager
            .handle_event(
                2,
                ConnectionEvent::Closed {
                    reason: CloseReason::Other("dropped again".into()),
                },
            )
            .await;
        connector.release();

        let calls = wait_for_calls(|| connector.calls(), 3).await;
        assert_eq!(calls, vec![1, 2, 3]);
    }
}
