//! Session host: the single writer for one demo session.
//!
//! Events arrive over an mpsc channel and are applied strictly in arrival
//! order. Every applied event publishes a whole-session snapshot on a watch
//! channel, so readers never observe a partial update.

use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use voxdemo_core::{DemoStatus, DemoStore, Env, Event, EventTag, Session, invariants};

const EVENT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("session host has shut down")]
    Closed,
}

/// Published after every applied event.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub revision: u64,
    /// Revision at which the current status was entered.
    pub status_since: u64,
    pub last_event: Option<EventTag>,
    pub session: Session,
}

impl Snapshot {
    pub fn status(&self) -> DemoStatus {
        self.session.status
    }
}

/// Cloneable dispatch/read handle. The host stops once every handle is gone.
#[derive(Debug, Clone)]
pub struct HostHandle {
    events: mpsc::Sender<Event>,
    snapshots: watch::Receiver<Snapshot>,
}

impl HostHandle {
    pub async fn send(&self, event: Event) -> Result<(), HostError> {
        self.events.send(event).await.map_err(|_| HostError::Closed)
    }

    pub fn status(&self) -> DemoStatus {
        self.snapshots.borrow().session.status
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }
}

/// Start the host task. The task returns the store when all handles drop.
pub fn spawn<E>(env: E) -> (HostHandle, JoinHandle<DemoStore<E>>)
where
    E: Env + Send + 'static,
{
    let store = DemoStore::with_env(env);
    let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let (snap_tx, snap_rx) = watch::channel(Snapshot {
        revision: store.revision(),
        status_since: store.revision(),
        last_event: None,
        session: store.context().clone(),
    });

    let task = tokio::spawn(run(store, event_rx, snap_tx));
    let handle = HostHandle {
        events: event_tx,
        snapshots: snap_rx,
    };
    (handle, task)
}

async fn run<E: Env>(
    mut store: DemoStore<E>,
    mut events: mpsc::Receiver<Event>,
    snapshots: watch::Sender<Snapshot>,
) -> DemoStore<E> {
    let mut status_since = store.revision();
    while let Some(event) = events.recv().await {
        let tag = event.tag();
        let out = store.send(&event);

        if !out.applied {
            tracing::debug!(event = %tag, status = %out.from, "event ignored");
            continue;
        }

        if out.status_changed() {
            status_since = store.revision();
            tracing::info!(event = %tag, from = %out.from, to = %out.to, "status changed");
        } else {
            tracing::debug!(event = %tag, status = %out.to, "context updated");
        }

        if let Err(violation) = invariants::check(store.context()) {
            tracing::warn!(event = %tag, %violation, "session invariant violated");
        }

        snapshots.send_replace(Snapshot {
            revision: store.revision(),
            status_since,
            last_event: Some(tag),
            session: store.context().clone(),
        });
    }

    tracing::debug!(revision = store.revision(), "session host stopped");
    store
}

/// Wait until the session reaches a status matching `pred`.
///
/// Returns `None` if the host shut down first.
pub async fn wait_for(
    rx: &mut watch::Receiver<Snapshot>,
    pred: impl Fn(DemoStatus) -> bool,
) -> Option<Snapshot> {
    rx.wait_for(|snap| pred(snap.session.status))
        .await
        .ok()
        .map(|snap| snap.clone())
}
