//! Machinery shared by both subscription kinds: the state channel, the
//! listener task and best-effort listener removal.

use crate::error::SubscriptionError;
use crate::state::SubscriptionState;
use portal_model::MaterializeError;
use portal_store::{Listener, ListenerRegistration, StoreResult};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Publishes into a subscription's state channel on behalf of one task.
///
/// Writes are dropped once the subscription has moved on to a newer task,
/// so a torn-down listener can never overwrite fresh state.
pub(crate) struct Publisher<T> {
    tx: Arc<watch::Sender<SubscriptionState<T>>>,
    generation: Arc<AtomicU64>,
    mine: u64,
}

impl<T> Publisher<T> {
    fn publish(&self, update: impl FnOnce(&mut SubscriptionState<T>)) -> bool {
        let generation = &self.generation;
        let mine = self.mine;
        self.tx.send_if_modified(|state| {
            if generation.load(Ordering::Acquire) != mine {
                return false;
            }
            update(state);
            true
        })
    }

    fn apply(&self, data: T) -> bool {
        self.publish(|state| state.apply(data))
    }

    fn fail(&self, error: SubscriptionError) -> bool {
        self.publish(|state| state.fail(error))
    }
}

/// Removes a store listener when dropped, including when the owning task is
/// aborted. Removal is fire-and-forget: failures are logged, never raised.
struct RegistrationGuard {
    registration: Box<dyn ListenerRegistration>,
    target: String,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        match self.registration.remove() {
            Ok(()) => debug!(target = %self.target, "listener released"),
            Err(e) => warn!(target = %self.target, error = %e, "failed to release listener"),
        }
    }
}

/// Consumes listener events until the store closes the stream.
///
/// Each snapshot is converted as a whole; on failure the previous data is
/// kept and only `error` changes.
pub(crate) async fn drive<S, T, F>(
    listener: StoreResult<Listener<S>>,
    publisher: Publisher<T>,
    target: String,
    mut convert: F,
) where
    F: FnMut(&S) -> Result<T, MaterializeError>,
{
    let listener = match listener {
        Ok(listener) => listener,
        Err(e) => {
            warn!(%target, error = %e, "failed to open listener");
            publisher.fail(SubscriptionError::Setup(e));
            return;
        }
    };
    let (mut events, registration) = listener.into_parts();
    let _guard = RegistrationGuard {
        registration,
        target: target.clone(),
    };

    while let Some(event) = events.recv().await {
        match event {
            Ok(snapshot) => match convert(&snapshot) {
                Ok(data) => {
                    if publisher.apply(data) {
                        trace!(%target, "snapshot applied");
                    }
                }
                Err(e) => {
                    warn!(%target, error = %e, "failed to materialize snapshot");
                    publisher.fail(SubscriptionError::Materialize(e));
                }
            },
            Err(e) => {
                warn!(%target, error = %e, "listener reported an error");
                publisher.fail(SubscriptionError::Snapshot(e));
            }
        }
    }
    debug!(%target, "listener stream closed");
}

/// The state channel of one subscription handle plus its running task.
pub(crate) struct Live<T> {
    tx: Arc<watch::Sender<SubscriptionState<T>>>,
    rx: watch::Receiver<SubscriptionState<T>>,
    generation: Arc<AtomicU64>,
    task: Option<JoinHandle<()>>,
    started: bool,
}

impl<T> Live<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(initial: SubscriptionState<T>) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            rx,
            generation: Arc::new(AtomicU64::new(0)),
            task: None,
            started: false,
        }
    }

    /// Replaces any running task with a fresh one, resetting state to
    /// `initial` first.
    pub(crate) fn start<F>(&mut self, initial: SubscriptionState<T>, run: impl FnOnce(Publisher<T>) -> F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let publisher = self.reset(initial);
        self.task = Some(tokio::spawn(run(publisher)));
    }

    /// Stops any running task and settles on `state` without a listener.
    pub(crate) fn settle(&mut self, state: SubscriptionState<T>) {
        self.reset(state);
    }

    fn reset(&mut self, initial: SubscriptionState<T>) -> Publisher<T> {
        self.stop();
        let mine = self.generation.load(Ordering::Acquire);
        self.tx.send_replace(initial);
        if !std::mem::replace(&mut self.started, true) {
            // The first reset repeats the state the channel was built with.
            self.rx.mark_unchanged();
        }
        Publisher {
            tx: Arc::clone(&self.tx),
            generation: Arc::clone(&self.generation),
            mine,
        }
    }

    pub(crate) fn state(&self) -> SubscriptionState<T> {
        (*self.rx.borrow()).clone()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<SubscriptionState<T>> {
        self.tx.subscribe()
    }

    pub(crate) async fn changed(&mut self) -> SubscriptionState<T> {
        // The sender lives in `self`, so this only fails if it was dropped.
        let _ = self.rx.changed().await;
        (*self.rx.borrow_and_update()).clone()
    }

    pub(crate) async fn settled(&mut self) -> SubscriptionState<T> {
        if let Ok(state) = self.rx.wait_for(|state| state.is_settled()).await {
            return (*state).clone();
        }
        self.state()
    }
}

impl<T> Live<T> {
    /// Aborts the running task. Its listener is released as the task is
    /// dropped; nothing waits for that to finish.
    pub(crate) fn stop(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<T> Drop for Live<T> {
    fn drop(&mut self) {
        self.stop();
    }
}
