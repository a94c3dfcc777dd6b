//! Progress tracker task
//!
//! Owns a `ProgressPredictor` on a dedicated task. Commands arrive over an
//! unbounded channel so event handlers can issue them without awaiting; the
//! task is the only writer of the predictor state. Samples are published on
//! a watch channel at every tick and after every command.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::config::PredictorConfig;
use super::predictor::ProgressPredictor;

/// Published view of capture progress
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressSnapshot {
    /// Count to display
    pub displayed: u64,
    /// Confidence of the prediction in `[0, 1]`
    pub confidence: f64,
    /// Whether a capture is being tracked
    pub active: bool,
}

/// Commands accepted by the tracker task
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressCommand {
    /// Capture started at the nominal rate (frames per second)
    Start { frame_rate: f64 },
    /// Authoritative frame count
    Authoritative { count: u64 },
    /// Capture stopped or reset
    Stop,
}

/// Handle to a running progress tracker
pub struct ProgressTracker {
    commands: mpsc::UnboundedSender<ProgressCommand>,
    snapshot_rx: watch::Receiver<ProgressSnapshot>,
    task: JoinHandle<()>,
}

impl ProgressTracker {
    /// Spawn the tracker task on the current runtime
    pub fn spawn(config: PredictorConfig) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(ProgressSnapshot::default());

        let task = tokio::spawn(run_tracker(
            ProgressPredictor::new(config),
            command_rx,
            snapshot_tx,
        ));

        Self {
            commands,
            snapshot_rx,
            task,
        }
    }

    /// Start tracking a capture
    pub fn start(&self, frame_rate: f64) {
        self.send(ProgressCommand::Start { frame_rate });
    }

    /// Report an authoritative frame count
    pub fn authoritative(&self, count: u64) {
        self.send(ProgressCommand::Authoritative { count });
    }

    /// Stop tracking; the display snaps to zero
    pub fn stop(&self) {
        self.send(ProgressCommand::Stop);
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.snapshot_rx.borrow()
    }

    /// Observe published snapshots
    pub fn watch(&self) -> watch::Receiver<ProgressSnapshot> {
        self.snapshot_rx.clone()
    }

    fn send(&self, command: ProgressCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!(command = ?command, "Progress tracker task has exited");
        }
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_tracker(
    mut predictor: ProgressPredictor,
    mut commands: mpsc::UnboundedReceiver<ProgressCommand>,
    snapshot_tx: watch::Sender<ProgressSnapshot>,
) {
    let mut interval = tokio::time::interval(predictor.config().tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if !predictor.is_active() {
                    continue;
                }
                let displayed = predictor.tick(Instant::now());
                publish(&snapshot_tx, &predictor, displayed);
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    break;
                };

                let now = Instant::now();
                match command {
                    ProgressCommand::Start { frame_rate } => {
                        predictor.start(now, frame_rate);
                        tracing::info!(frame_rate = frame_rate, "Capture progress tracking started");
                    }
                    ProgressCommand::Authoritative { count } => {
                        predictor.on_authoritative(count, now);
                    }
                    ProgressCommand::Stop => {
                        if predictor.is_active() {
                            tracing::info!("Capture progress tracking stopped");
                        }
                        predictor.stop();
                    }
                }

                let displayed = predictor.tick(now);
                publish(&snapshot_tx, &predictor, displayed);
            }
        }
    }

    tracing::debug!("Progress tracker exited");
}

fn publish(
    snapshot_tx: &watch::Sender<ProgressSnapshot>,
    predictor: &ProgressPredictor,
    displayed: u64,
) {
    let next = ProgressSnapshot {
        displayed,
        confidence: predictor.confidence(),
        active: predictor.is_active(),
    };

    snapshot_tx.send_if_modified(|current| {
        if *current != next {
            *current = next;
            true
        } else {
            false
        }
    });
}
