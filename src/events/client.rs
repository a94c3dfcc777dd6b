//! Event stream client
//!
//! Maintains one logical connection over an `EventTransport`, dispatches
//! messages to channel subscribers in arrival order and reconnects with
//! bounded exponential backoff.
//!
//! # Connection states
//!
//! ```text
//!  Disconnected ──connect()──► Connecting ──ok──► Connected
//!       ▲                          │                  │
//!       │◄─────────fail────────────┘                  │ stream dropped
//!       │                                             ▼
//!       └────────attempts exhausted───────────── Reconnecting
//! ```
//!
//! Every connection (initial or reconnect) is opened with the channel set of
//! the subscription table and the last delivered message id, so subscribers
//! never register twice and a resumed stream does not replay into handlers.
//! Subscribing to a channel the open stream was not scoped to reopens it with
//! the grown channel set.

use std::cell::Cell;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{Error, Result, TransportError};
use crate::stats::ClientStats;

use super::config::ClientConfig;
use super::message::EventMessage;
use super::subscription::{EventHandler, Subscription, SubscriptionTable};
use super::transport::{ConnectRequest, EventReceiver, EventTransport};

/// Connection state of the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no retry scheduled
    Disconnected,
    /// Initial connect in progress
    Connecting,
    /// Stream open and dispatching
    Connected,
    /// Stream lost, retrying in the background
    Reconnecting,
}

impl ConnectionState {
    /// Whether messages can currently arrive
    pub fn is_connected(&self) -> bool {
        *self == ConnectionState::Connected
    }
}

thread_local! {
    static DISPATCHING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as running handlers until dropped
struct DispatchScope;

impl DispatchScope {
    fn enter() -> Self {
        DISPATCHING.with(|flag| flag.set(true));
        DispatchScope
    }

    fn active() -> bool {
        DISPATCHING.with(|flag| flag.get())
    }
}

impl Drop for DispatchScope {
    fn drop(&mut self) {
        DISPATCHING.with(|flag| flag.set(false));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bounded set of recently delivered message ids
#[derive(Debug)]
struct RecentIds {
    seen: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl RecentIds {
    fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Record `id`; `false` if it was already present
    fn insert(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }

        self.seen.insert(id.to_string());
        self.order.push_back(id.to_string());
        true
    }
}

/// An open stream and the channel-set version it was scoped to
struct OpenStream {
    messages: EventReceiver,
    channels: watch::Receiver<u64>,
}

struct Shared<T> {
    transport: T,
    config: ClientConfig,
    subscriptions: Arc<Mutex<SubscriptionTable>>,
    /// Bumped whenever a channel is added to the subscription table
    channels_tx: watch::Sender<u64>,
    state_tx: watch::Sender<ConnectionState>,
    /// Held for reading while handlers run; `disconnect` takes it for writing
    gate: RwLock<()>,
    closed: AtomicBool,
    generation: AtomicU64,
    recent_ids: Mutex<RecentIds>,
    last_event_id: Mutex<Option<String>>,
    task: Mutex<Option<JoinHandle<()>>>,
    stats: Mutex<ClientStats>,
}

impl<T: EventTransport> Shared<T> {
    fn is_current(&self, generation: u64) -> bool {
        !self.closed.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Set `state` unless the connection generation has been superseded
    fn set_state_if_current(&self, generation: u64, state: ConnectionState) -> bool {
        self.state_tx.send_if_modified(|current| {
            if self.is_current(generation) && *current != state {
                *current = state;
                true
            } else {
                false
            }
        });
        self.is_current(generation)
    }

    fn connect_request(&self) -> ConnectRequest {
        ConnectRequest {
            channels: lock(&self.subscriptions).channels(),
            last_event_id: lock(&self.last_event_id).clone(),
        }
    }

    async fn open(&self) -> std::result::Result<OpenStream, TransportError> {
        // Subscribe before the snapshot so later additions are noticed
        let channels = self.channels_tx.subscribe();
        let request = self.connect_request();
        let timeout = self.config.connect_timeout;

        match tokio::time::timeout(timeout, self.transport.open(request)).await {
            Ok(result) => result.map(|messages| OpenStream { messages, channels }),
            Err(_) => Err(TransportError::ConnectTimeout(timeout)),
        }
    }

    fn record_connected(&self, reconnect: bool) {
        lock(&self.stats).connections += 1;

        let channels = lock(&self.subscriptions).channels();
        if reconnect {
            tracing::info!(channels = ?channels, "Event stream reconnected, subscriptions replayed");
        } else {
            tracing::info!(channels = ?channels, "Event stream connected");
        }
    }

    async fn reconnect(&self, generation: u64) -> Option<OpenStream> {
        for attempt in 1..=self.config.max_reconnect_attempts {
            if !self.set_state_if_current(generation, ConnectionState::Reconnecting) {
                return None;
            }

            let delay = self.config.backoff_delay(attempt);
            tracing::debug!(
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                "Scheduling event stream reconnect"
            );
            tokio::time::sleep(delay).await;

            if !self.is_current(generation) {
                return None;
            }

            lock(&self.stats).reconnect_attempts += 1;

            match self.open().await {
                Ok(stream) => {
                    if !self.set_state_if_current(generation, ConnectionState::Connected) {
                        return None;
                    }
                    self.record_connected(true);
                    return Some(stream);
                }
                Err(e) => {
                    tracing::warn!(attempt = attempt, error = %e, "Event stream reconnect failed");
                }
            }
        }

        tracing::warn!(
            attempts = self.config.max_reconnect_attempts,
            "Giving up on event stream reconnect"
        );
        self.set_state_if_current(generation, ConnectionState::Disconnected);
        None
    }

    fn dispatch(&self, generation: u64, msg: EventMessage) {
        let _gate = self.gate.read().unwrap_or_else(PoisonError::into_inner);

        if !self.is_current(generation) {
            tracing::trace!(channel = %msg.channel, "Dropping message from stale connection");
            return;
        }

        lock(&self.stats).messages_received += 1;

        if let Some(ref id) = msg.id {
            if !lock(&self.recent_ids).insert(id) {
                lock(&self.stats).duplicates_dropped += 1;
                tracing::debug!(id = %id, channel = %msg.channel, "Dropping duplicate event");
                return;
            }
            *lock(&self.last_event_id) = Some(id.clone());
        }

        let handlers = lock(&self.subscriptions).handlers_for(&msg.channel);
        if handlers.is_empty() {
            tracing::trace!(channel = %msg.channel, "No subscribers for channel");
            return;
        }

        let _scope = DispatchScope::enter();
        let mut delivered = 0u64;
        for handler in handlers {
            if !self.is_current(generation) {
                break;
            }
            handler(&msg);
            delivered += 1;
        }

        lock(&self.stats).deliveries += delivered;
    }
}

async fn run_pump<T: EventTransport>(
    shared: Arc<Shared<T>>,
    generation: u64,
    mut initial: Option<OpenStream>,
) {
    loop {
        let mut stream = match initial.take() {
            Some(stream) => stream,
            None => match shared.reconnect(generation).await {
                Some(stream) => stream,
                None => return,
            },
        };

        let rescope = loop {
            tokio::select! {
                item = stream.messages.recv() => match item {
                    Some(Ok(msg)) => shared.dispatch(generation, msg),
                    Some(Err(e)) => {
                        if shared.is_current(generation) {
                            tracing::warn!(error = %e, "Event stream dropped");
                        }
                        break false;
                    }
                    None => break false,
                },
                Ok(()) = stream.channels.changed() => break true,
            }
        };
        drop(stream);

        if !shared.is_current(generation) {
            return;
        }

        if rescope {
            match shared.open().await {
                Ok(next) => {
                    if !shared.is_current(generation) {
                        return;
                    }
                    lock(&shared.stats).connections += 1;
                    let channels = lock(&shared.subscriptions).channels();
                    tracing::info!(channels = ?channels, "Event stream reopened for new channels");
                    initial = Some(next);
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Event stream reopen failed");
                }
            }
        }

        if !shared.config.reconnect_on_error {
            shared.set_state_if_current(generation, ConnectionState::Disconnected);
            tracing::info!("Event stream closed");
            return;
        }
    }
}

/// Client for a receive-only push channel
///
/// # Example
/// ```no_run
/// use capture_sync::events::{EventStreamClient, HttpEventTransport, CAPTURE_CHANNEL};
///
/// # async fn example() -> capture_sync::error::Result<()> {
/// let transport = HttpEventTransport::from_url("http://localhost:8000/api/events")?;
/// let client = EventStreamClient::new(transport);
///
/// let _sub = client.subscribe(CAPTURE_CHANNEL, |msg| {
///     println!("capture event: {}", msg.data);
/// });
///
/// client.connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct EventStreamClient<T: EventTransport> {
    shared: Arc<Shared<T>>,
}

impl<T: EventTransport> EventStreamClient<T> {
    /// Create a client with default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (channels_tx, _) = watch::channel(0);
        let recent_ids = RecentIds::new(config.dedup_window);

        Self {
            shared: Arc::new(Shared {
                transport,
                config,
                subscriptions: Arc::new(Mutex::new(SubscriptionTable::default())),
                channels_tx,
                state_tx,
                gate: RwLock::new(()),
                closed: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                recent_ids: Mutex::new(recent_ids),
                last_event_id: Mutex::new(None),
                task: Mutex::new(None),
                stats: Mutex::new(ClientStats::new()),
            }),
        }
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Get the underlying transport
    pub fn transport(&self) -> &T {
        &self.shared.transport
    }

    /// Open the connection
    ///
    /// Returns immediately if a connection is already open or being
    /// established. On failure the state returns to `Disconnected` and the
    /// error is surfaced; with `reconnect_on_error` a background retry is
    /// scheduled as well.
    pub async fn connect(&self) -> Result<()> {
        let shared = &self.shared;

        let began = shared.state_tx.send_if_modified(|state| {
            if *state == ConnectionState::Disconnected {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        });
        if !began {
            tracing::debug!(state = ?self.state(), "Connect ignored");
            return Ok(());
        }

        shared.closed.store(false, Ordering::SeqCst);
        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;

        match shared.open().await {
            Ok(stream) => {
                if !shared.set_state_if_current(generation, ConnectionState::Connected) {
                    return Ok(());
                }
                shared.record_connected(false);
                self.spawn_pump(generation, Some(stream));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Event stream connect failed");
                if shared.set_state_if_current(generation, ConnectionState::Disconnected)
                    && shared.config.reconnect_on_error
                {
                    self.spawn_pump(generation, None);
                }
                Err(Error::Transport(e))
            }
        }
    }

    /// Close the connection and stop dispatching
    ///
    /// When this returns no handler is running and none will run until the
    /// next `connect`. Pending retries are cancelled. Subscriptions are kept.
    pub fn disconnect(&self) {
        let shared = &self.shared;

        shared.closed.store(true, Ordering::SeqCst);
        shared.generation.fetch_add(1, Ordering::SeqCst);

        if let Some(task) = lock(&shared.task).take() {
            task.abort();
        }

        // Wait out handlers running on other threads. A handler calling
        // disconnect on its own thread already holds the gate.
        if !DispatchScope::active() {
            drop(shared.gate.write().unwrap_or_else(PoisonError::into_inner));
        }

        let previous = shared.state_tx.send_replace(ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            tracing::info!(previous = ?previous, "Event stream disconnected");
        }
    }

    /// Register `handler` for messages on `channel`
    ///
    /// A channel new to the client reopens a live stream so it is scoped to
    /// the grown channel set.
    pub fn subscribe<F>(&self, channel: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&EventMessage) + Send + Sync + 'static,
    {
        let channel = channel.into();
        let handler: EventHandler = Arc::new(handler);
        let (id, added) = {
            let mut table = lock(&self.shared.subscriptions);
            let added = !table.has_channel(&channel);
            (table.insert(channel.clone(), handler), added)
        };

        if added {
            self.shared.channels_tx.send_modify(|version| *version += 1);
        }

        tracing::debug!(channel = %channel, new_channel = added, "Subscribed");
        Subscription::new(id, channel, &self.shared.subscriptions)
    }

    /// Sending is not possible on a receive-only channel
    pub fn send(&self, _channel: &str, _data: &str) -> Result<()> {
        Err(Error::UnsupportedOperation("send"))
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.shared.state_tx.borrow()
    }

    /// Whether the stream is connected
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Observe connection state changes
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// Number of live subscriptions
    pub fn subscription_count(&self) -> usize {
        lock(&self.shared.subscriptions).len()
    }

    /// Last message id delivered
    pub fn last_event_id(&self) -> Option<String> {
        lock(&self.shared.last_event_id).clone()
    }

    /// Get client statistics
    pub fn stats(&self) -> ClientStats {
        lock(&self.shared.stats).clone()
    }

    fn spawn_pump(&self, generation: u64, stream: Option<OpenStream>) {
        let handle = tokio::spawn(run_pump(Arc::clone(&self.shared), generation, stream));
        if let Some(previous) = lock(&self.shared.task).replace(handle) {
            previous.abort();
        }
    }
}

impl<T: EventTransport> Drop for EventStreamClient<T> {
    fn drop(&mut self) {
        self.disconnect();
        lock(&self.shared.subscriptions).clear();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Weak;
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    type StreamSender = mpsc::Sender<std::result::Result<EventMessage, TransportError>>;

    #[derive(Default)]
    struct MockTransport {
        opens: Mutex<VecDeque<std::result::Result<EventReceiver, TransportError>>>,
        requests: Mutex<Vec<ConnectRequest>>,
    }

    impl MockTransport {
        fn push_stream(&self) -> StreamSender {
            let (tx, rx) = mpsc::channel(16);
            self.opens.lock().unwrap().push_back(Ok(rx));
            tx
        }

        fn push_failure(&self) {
            self.opens
                .lock()
                .unwrap()
                .push_back(Err(TransportError::ConnectFailed("refused".into())));
        }

        fn requests(&self) -> Vec<ConnectRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl EventTransport for MockTransport {
        async fn open(
            &self,
            request: ConnectRequest,
        ) -> std::result::Result<EventReceiver, TransportError> {
            self.requests.lock().unwrap().push(request);
            self.opens
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::ConnectFailed("no stream".into())))
        }
    }

    fn fast_config() -> ClientConfig {
        ClientConfig::default()
            .reconnect_delay(Duration::from_millis(10), Duration::from_millis(100))
            .max_reconnect_attempts(3)
    }

    fn event(channel: &str, id: &str, data: &str) -> std::result::Result<EventMessage, TransportError> {
        Ok(EventMessage::new(channel, data).with_id(id))
    }

    fn collect<T: EventTransport>(
        client: &EventStreamClient<T>,
        channel: &str,
    ) -> (Subscription, mpsc::UnboundedReceiver<EventMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = client.subscribe(channel, move |msg| {
            let _ = tx.send(msg.clone());
        });
        (sub, rx)
    }

    #[tokio::test]
    async fn test_dispatch_in_order_by_channel() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        let tx = client.transport().push_stream();
        let (_capture, mut capture_rx) = collect(&client, "capture_events");
        let (_take, mut take_rx) = collect(&client, "take_1");

        client.connect().await.unwrap();
        assert!(client.is_connected());

        tx.send(event("capture_events", "1", "a")).await.unwrap();
        tx.send(event("take_1", "2", "x")).await.unwrap();
        tx.send(event("capture_events", "3", "b")).await.unwrap();

        assert_eq!(capture_rx.recv().await.unwrap().data, "a");
        assert_eq!(capture_rx.recv().await.unwrap().data, "b");
        assert_eq!(take_rx.recv().await.unwrap().data, "x");
        assert!(take_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_fan_out_to_multiple_handlers() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        let tx = client.transport().push_stream();
        let (_a, mut rx_a) = collect(&client, "capture_events");
        let (_b, mut rx_b) = collect(&client, "capture_events");

        client.connect().await.unwrap();
        tx.send(event("capture_events", "1", "a")).await.unwrap();

        assert_eq!(rx_a.recv().await.unwrap().data, "a");
        assert_eq!(rx_b.recv().await.unwrap().data, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscription_survives_reconnect() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        let tx1 = client.transport().push_stream();
        let tx2 = client.transport().push_stream();
        let (_sub, mut rx) = collect(&client, "capture_events");

        client.connect().await.unwrap();
        tx1.send(event("capture_events", "1", "a")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().data, "a");

        // Drop the first connection
        tx1.send(Err(TransportError::Closed)).await.unwrap();
        drop(tx1);

        // The resumed stream replays message 1 before new data
        tx2.send(event("capture_events", "1", "a")).await.unwrap();
        tx2.send(event("capture_events", "2", "b")).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().data, "b");
        assert!(rx.try_recv().is_err());
        assert!(client.is_connected());

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].channels, vec!["capture_events".to_string()]);
        assert_eq!(requests[1].last_event_id.as_deref(), Some("1"));

        let stats = client.stats();
        assert_eq!(stats.connections, 2);
        assert_eq!(stats.duplicates_dropped, 1);
        assert_eq!(stats.deliveries, 2);
    }

    #[tokio::test]
    async fn test_send_is_unsupported() {
        let client = EventStreamClient::new(MockTransport::default());
        let result = client.send("capture_events", "{}");

        assert!(matches!(result, Err(Error::UnsupportedOperation("send"))));
    }

    #[tokio::test]
    async fn test_connect_failure_without_retry() {
        let config = fast_config().reconnect_on_error(false);
        let client = EventStreamClient::with_config(MockTransport::default(), config);
        client.transport().push_failure();

        let result = client.connect().await;

        assert!(matches!(result, Err(Error::Transport(_))));
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_failure_schedules_retry() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        client.transport().push_failure();
        let tx = client.transport().push_stream();
        let (_sub, mut rx) = collect(&client, "capture_events");
        let mut state = client.watch_state();

        assert!(client.connect().await.is_err());

        state
            .wait_for(|s| *s == ConnectionState::Connected)
            .await
            .unwrap();

        tx.send(event("capture_events", "1", "late")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().data, "late");
        assert_eq!(client.stats().reconnect_attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_gives_up_after_max_attempts() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        let tx = client.transport().push_stream();
        let mut state = client.watch_state();

        client.connect().await.unwrap();
        drop(tx);

        state
            .wait_for(|s| *s == ConnectionState::Reconnecting)
            .await
            .unwrap();
        state
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();

        // One initial open plus three failed retries
        assert_eq!(client.transport().requests().len(), 4);
        assert_eq!(client.stats().reconnect_attempts, 3);
    }

    #[tokio::test]
    async fn test_disconnect_stops_dispatch() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        let tx = client.transport().push_stream();
        let (_sub, mut rx) = collect(&client, "capture_events");

        client.connect().await.unwrap();
        tx.send(event("capture_events", "1", "a")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().data, "a");

        client.disconnect();
        assert_eq!(client.state(), ConnectionState::Disconnected);

        let _ = tx.send(event("capture_events", "2", "b")).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_disconnect_from_handler_skips_remaining_handlers() {
        let client = Arc::new(EventStreamClient::with_config(
            MockTransport::default(),
            fast_config().reconnect_on_error(false),
        ));
        let tx = client.transport().push_stream();

        let weak: Weak<EventStreamClient<MockTransport>> = Arc::downgrade(&client);
        let _first = client.subscribe("capture_events", move |_| {
            if let Some(client) = weak.upgrade() {
                client.disconnect();
            }
        });
        let (_second, mut rx) = collect(&client, "capture_events");

        client.connect().await.unwrap();
        tx.send(event("capture_events", "1", "a")).await.unwrap();

        let mut state = client.watch_state();
        state
            .wait_for(|s| *s == ConnectionState::Disconnected)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_reconnect_after_disconnect() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        let _tx1 = client.transport().push_stream();
        let tx2 = client.transport().push_stream();
        let (_sub, mut rx) = collect(&client, "capture_events");

        client.connect().await.unwrap();
        client.disconnect();
        client.connect().await.unwrap();

        tx2.send(event("capture_events", "9", "again")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().data, "again");
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        let tx = client.transport().push_stream();
        let (sub, mut rx) = collect(&client, "capture_events");
        let (_other, mut other_rx) = collect(&client, "capture_events");

        client.connect().await.unwrap();
        sub.unsubscribe();
        sub.unsubscribe();
        assert_eq!(client.subscription_count(), 1);

        tx.send(event("capture_events", "1", "a")).await.unwrap();
        assert_eq!(other_rx.recv().await.unwrap().data, "a");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_channel_reopens_stream() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        let tx1 = client.transport().push_stream();
        let tx2 = client.transport().push_stream();
        let (_capture, mut capture_rx) = collect(&client, "capture_events");

        client.connect().await.unwrap();
        tx1.send(event("capture_events", "1", "a")).await.unwrap();
        assert_eq!(capture_rx.recv().await.unwrap().data, "a");

        let (_take, mut take_rx) = collect(&client, "take_2");
        tx2.send(event("take_2", "2", "x")).await.unwrap();
        assert_eq!(take_rx.recv().await.unwrap().data, "x");

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].channels, vec!["capture_events", "take_2"]);
        assert_eq!(requests[1].last_event_id.as_deref(), Some("1"));
        assert!(client.is_connected());
        assert_eq!(client.stats().connections, 2);

        // A second handler on a known channel keeps the stream
        let (_more, _more_rx) = collect(&client, "take_2");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.transport().requests().len(), 2);
    }

    #[tokio::test]
    async fn test_second_connect_is_noop() {
        let client = EventStreamClient::with_config(MockTransport::default(), fast_config());
        let _tx = client.transport().push_stream();

        client.connect().await.unwrap();
        client.connect().await.unwrap();

        assert_eq!(client.transport().requests().len(), 1);
    }

    #[test]
    fn test_recent_ids_window() {
        let mut ids = RecentIds::new(2);
        assert!(ids.insert("a"));
        assert!(!ids.insert("a"));
        assert!(ids.insert("b"));
        assert!(ids.insert("c"));
        // "a" fell out of the window
        assert!(ids.insert("a"));
    }
}
