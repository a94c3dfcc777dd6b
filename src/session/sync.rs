//! Capture session
//!
//! Subscribes to the capture, processing and take channels of the event
//! client and applies decoded events on a single task. That task is the
//! only writer of the activity state; it also drives the progress tracker
//! and reports frame counts to a listener (normally the navigation
//! controller).
//!
//! ```text
//!   EventStreamClient handlers ──decode──► mpsc ──► session task
//!                                                     ├──► watch<ActivityState>
//!                                                     ├──► ProgressTracker
//!                                                     └──► FrameCountListener
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::events::{
    take_channel, CaptureEvent, EventMessage, EventStreamClient, EventTransport, ProcessingEvent,
    Subscription, CAPTURE_CHANNEL, PROCESSING_CHANNEL,
};
use crate::navigation::FrameNavigationController;
use crate::progress::{ProgressSnapshot, ProgressTracker};
use crate::remote::FrameSource;

use super::config::SessionConfig;
use super::state::ActivityState;

/// Receives authoritative frame counts of the active take
pub trait FrameCountListener: Send + Sync + 'static {
    /// `take_id` now has `frame_count` frames
    fn frame_count_changed(&self, take_id: &str, frame_count: u64);
}

impl<S: FrameSource> FrameCountListener for FrameNavigationController<S> {
    fn frame_count_changed(&self, take_id: &str, frame_count: u64) {
        if self.take_id().as_deref() == Some(take_id) {
            self.set_frame_count(usize::try_from(frame_count).unwrap_or(usize::MAX));
        }
    }
}

#[derive(Debug)]
enum SessionEvent {
    Attach(String),
    Capture(CaptureEvent),
    Processing(ProcessingEvent),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Live synchronization of one take with the backend
pub struct CaptureSession {
    events: mpsc::UnboundedSender<SessionEvent>,
    activity_rx: watch::Receiver<ActivityState>,
    progress_rx: watch::Receiver<ProgressSnapshot>,
    listener: Arc<Mutex<Option<Arc<dyn FrameCountListener>>>>,
    subscriptions: Mutex<Vec<Subscription>>,
    task: JoinHandle<()>,
}

impl CaptureSession {
    /// Spawn the session task
    pub fn new(tracker: ProgressTracker, config: SessionConfig) -> Self {
        let (events, event_rx) = mpsc::unbounded_channel();
        let (activity_tx, activity_rx) = watch::channel(ActivityState::default());
        let progress_rx = tracker.watch();
        let listener: Arc<Mutex<Option<Arc<dyn FrameCountListener>>>> = Arc::new(Mutex::new(None));

        let worker = SessionWorker {
            config,
            tracker,
            activity_tx,
            listener: Arc::clone(&listener),
            tracking: false,
        };
        let task = tokio::spawn(worker.run(event_rx));

        Self {
            events,
            activity_rx,
            progress_rx,
            listener,
            subscriptions: Mutex::new(Vec::new()),
            task,
        }
    }

    /// Observe the activity state
    pub fn activity(&self) -> watch::Receiver<ActivityState> {
        self.activity_rx.clone()
    }

    /// Observe capture progress
    pub fn progress(&self) -> watch::Receiver<ProgressSnapshot> {
        self.progress_rx.clone()
    }

    /// Report frame counts of the active take to `listener`
    pub fn set_listener(&self, listener: Arc<dyn FrameCountListener>) {
        *lock(&self.listener) = Some(listener);
    }

    /// Follow `take_id` on `client`
    ///
    /// Replaces the subscriptions of a previously attached take and resets
    /// the activity state and progress.
    pub fn attach<T: EventTransport>(&self, client: &EventStreamClient<T>, take_id: &str) {
        let subscriptions = vec![
            client.subscribe(CAPTURE_CHANNEL, self.forwarder(decode_capture)),
            client.subscribe(PROCESSING_CHANNEL, self.forwarder(decode_processing)),
            client.subscribe(take_channel(take_id), self.forwarder(decode_take)),
        ];

        // Old handlers are gone before the new take becomes active
        drop(std::mem::replace(&mut *lock(&self.subscriptions), subscriptions));
        self.forward(SessionEvent::Attach(take_id.to_string()));
    }

    /// Stop following the current take
    pub fn detach(&self) {
        lock(&self.subscriptions).clear();
    }

    fn forward(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            tracing::warn!("Capture session task has exited");
        }
    }

    fn forwarder(
        &self,
        decode: fn(&EventMessage) -> Option<SessionEvent>,
    ) -> impl Fn(&EventMessage) + Send + Sync + 'static {
        let events = self.events.clone();
        move |msg: &EventMessage| {
            if let Some(event) = decode(msg) {
                let _ = events.send(event);
            }
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        lock(&self.subscriptions).clear();
        self.task.abort();
    }
}

fn decode_capture(msg: &EventMessage) -> Option<SessionEvent> {
    match msg.json::<CaptureEvent>() {
        Ok(event) => Some(SessionEvent::Capture(event)),
        Err(e) => {
            tracing::warn!(channel = %msg.channel, error = %e, "Unrecognized capture event");
            None
        }
    }
}

fn decode_processing(msg: &EventMessage) -> Option<SessionEvent> {
    match msg.json::<ProcessingEvent>() {
        Ok(event) => Some(SessionEvent::Processing(event)),
        Err(e) => {
            tracing::warn!(channel = %msg.channel, error = %e, "Unrecognized processing event");
            None
        }
    }
}

/// Take channels carry processing progress and frame counts
///
/// Lifecycle types shared by both families (`started`, `stopped`) are read
/// as processing events on this channel.
fn decode_take(msg: &EventMessage) -> Option<SessionEvent> {
    if let Ok(event) = msg.json::<ProcessingEvent>() {
        return Some(SessionEvent::Processing(event));
    }
    if let Ok(event) = msg.json::<CaptureEvent>() {
        return Some(SessionEvent::Capture(event));
    }

    tracing::warn!(channel = %msg.channel, "Unrecognized take event");
    None
}

struct SessionWorker {
    config: SessionConfig,
    tracker: ProgressTracker,
    activity_tx: watch::Sender<ActivityState>,
    listener: Arc<Mutex<Option<Arc<dyn FrameCountListener>>>>,
    /// Whether the tracker follows the current capture
    tracking: bool,
}

impl SessionWorker {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Attach(take_id) => self.attach(take_id),
                SessionEvent::Capture(event) => self.apply_capture(event),
                SessionEvent::Processing(event) => self.apply_processing(event),
            }
        }
    }

    fn attach(&mut self, take_id: String) {
        tracing::info!(take = %take_id, "Capture session attached");
        self.activity_tx.send_replace(ActivityState::for_take(take_id));
        self.tracker.stop();
        self.tracking = false;
    }

    fn apply_capture(&mut self, event: CaptureEvent) {
        let applied = self
            .activity_tx
            .send_if_modified(|state| state.apply_capture(&event));
        if !applied {
            tracing::trace!(take = %event.take_id(), "Capture event for another take");
            return;
        }

        match &event {
            CaptureEvent::Started {
                take_id,
                frame_rate,
            } => {
                let rate = frame_rate.unwrap_or(self.config.default_frame_rate);
                self.tracker.start(rate);
                self.tracking = true;
                tracing::info!(take = %take_id, frame_rate = rate, "Capture started");
            }
            CaptureEvent::FrameCount { take_id, count, .. } => {
                if !self.tracking {
                    self.tracker.start(self.config.default_frame_rate);
                    self.tracking = true;
                }
                self.tracker.authoritative(*count);
                self.notify(take_id, *count);
            }
            CaptureEvent::Stopped { take_id, .. } => {
                self.tracker.stop();
                self.tracking = false;
                let frame_count = self.activity_tx.borrow().frame_count;
                self.notify(take_id, frame_count);
                tracing::info!(take = %take_id, frame_count = frame_count, "Capture stopped");
            }
        }
    }

    fn apply_processing(&mut self, event: ProcessingEvent) {
        let applied = self
            .activity_tx
            .send_if_modified(|state| state.apply_processing(&event));
        if !applied {
            tracing::trace!(take = %event.take_id(), "Processing event for another take");
            return;
        }

        match &event {
            ProcessingEvent::Started { take_id } => {
                tracing::info!(take = %take_id, "Processing started");
            }
            ProcessingEvent::Progress {
                processed, total, ..
            } => {
                tracing::trace!(processed = processed, total = total, "Processing progress");
            }
            ProcessingEvent::Completed { take_id } => {
                tracing::info!(take = %take_id, "Processing completed");
            }
            ProcessingEvent::Failed { take_id, error } => {
                tracing::warn!(take = %take_id, error = ?error, "Processing failed");
            }
            ProcessingEvent::Stopped { take_id } => {
                tracing::info!(take = %take_id, "Processing stopped");
            }
        }
    }

    fn notify(&self, take_id: &str, frame_count: u64) {
        let listener = lock(&self.listener).clone();
        if let Some(listener) = listener {
            listener.frame_count_changed(take_id, frame_count);
        }
    }
}
