//! Debounced server sync for cart row quantities.
//!
//! Each row gets its own task, started on the row's first change:
//!
//! ```text
//! Idle -> PendingDebounce -> Submitting -> Confirmed | Failed
//!              ^   |              |
//!              +---+ (new change) +--> PendingDebounce (response was stale)
//! ```
//!
//! 1. A change arms the row's debounce timer, replacing any armed timer, so
//!    only the last value inside the window is sent
//! 2. When the timer fires the row goes into its loading state and the
//!    update form is posted
//! 3. Changes that arrive while posting are queued and re-arm the timer; the
//!    row task awaits its request, so a row never has two in flight
//! 4. Every change advances the row's sequence. A response to a request
//!    whose sequence is no longer current is stale and ignored
//! 5. Success resyncs the page from the server. Failure restores the row's
//!    previous visual state and shows one error; the typed quantity is kept
//!    so the user can retry

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use countryfresh_core::LineId;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::remote::CartRemote;
use crate::signal::QuantityChanged;
use crate::surface::{CartSurface, Notification, RowVisual};

/// Error shown when a row update fails.
const UPDATE_FAILED_MESSAGE: &str = "Failed to update cart";

/// Where a row is in the sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RowPhase {
    #[default]
    Idle,
    PendingDebounce,
    Submitting,
    Confirmed,
    Failed,
}

/// Monotonic per-row change counter used to detect stale responses.
#[derive(Debug, Default)]
struct SequenceGuard {
    latest: u64,
}

impl SequenceGuard {
    /// Record a new change.
    const fn advance(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Sequence a request sent now would carry.
    const fn current(&self) -> u64 {
        self.latest
    }

    const fn is_current(&self, request: u64) -> bool {
        request == self.latest
    }
}

/// Debounces quantity changes and confirms them with the server.
///
/// Cheap to clone; clones share rows. Rows are spawned on the current tokio
/// runtime and live until [`CartReconciler::shutdown`], which also stops the
/// reconciler from taking further changes.
pub struct CartReconciler<R, S> {
    inner: Arc<Inner<R, S>>,
}

impl<R, S> Clone for CartReconciler<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<R, S> {
    remote: Arc<R>,
    surface: Arc<S>,
    debounce: Duration,
    rows: Mutex<HashMap<LineId, RowHandle>>,
    closed: AtomicBool,
}

struct RowHandle {
    tx: mpsc::UnboundedSender<QuantityChanged>,
    phase: watch::Receiver<RowPhase>,
    task: JoinHandle<()>,
}

impl<R: CartRemote, S: CartSurface> CartReconciler<R, S> {
    /// Create a reconciler posting through `remote` and drawing on `surface`.
    #[must_use]
    pub fn new(remote: Arc<R>, surface: Arc<S>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                surface,
                debounce,
                rows: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    fn rows(&self) -> MutexGuard<'_, HashMap<LineId, RowHandle>> {
        self.inner
            .rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed one change to its row, starting the row's task if needed.
    ///
    /// Ignored once shutdown has started.
    pub fn signal(&self, change: QuantityChanged) {
        let mut rows = self.rows();
        if self.inner.closed.load(Ordering::SeqCst) {
            warn!(line = %change.line, "Quantity change after reconciler shutdown ignored");
            return;
        }

        let change = match rows.get(&change.line) {
            Some(handle) => match handle.tx.send(change) {
                Ok(()) => return,
                // Row task is gone; start a fresh one below.
                Err(mpsc::error::SendError(change)) => change,
            },
            None => change,
        };

        let line = change.line.clone();
        let handle = self.spawn_row(line.clone());
        if handle.tx.send(change).is_err() {
            warn!(line = %line, "Row task exited before its first change");
        }
        rows.insert(line, handle);
    }

    fn spawn_row(&self, line: LineId) -> RowHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(RowPhase::Idle);

        debug!(line = %line, "Starting row reconciler");
        let worker = RowWorker {
            inner: Arc::clone(&self.inner),
            line,
            rx,
            phase: phase_tx,
            pending: None,
            deadline: None,
            sequence: SequenceGuard::default(),
        };

        RowHandle {
            tx,
            phase: phase_rx,
            task: tokio::spawn(worker.run()),
        }
    }

    /// Current phase of a row, or `None` if it never changed.
    #[must_use]
    pub fn phase(&self, line: &LineId) -> Option<RowPhase> {
        self.rows().get(line).map(|handle| *handle.phase.borrow())
    }

    /// Consume changes from a [`crate::QuantitySignal`] subscription.
    ///
    /// When the signal closes, pending changes are flushed and the returned
    /// task finishes once every row has stopped.
    pub fn attach(
        &self,
        mut events: mpsc::UnboundedReceiver<QuantityChanged>,
    ) -> JoinHandle<()> {
        let reconciler = self.clone();
        tokio::spawn(async move {
            while let Some(change) = events.recv().await {
                reconciler.signal(change);
            }
            debug!("Quantity signal closed, stopping reconciler");
            reconciler.shutdown().await;
        })
    }

    /// Stop every row, sending pending changes without waiting out the debounce.
    pub async fn shutdown(&self) {
        let handles: Vec<RowHandle> = {
            let mut rows = self.rows();
            self.inner.closed.store(true, Ordering::SeqCst);
            rows.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            drop(handle.tx);
            if let Err(e) = handle.task.await {
                warn!(error = %e, "Row reconciler task failed");
            }
        }
    }
}

/// State owned by one row's task.
struct RowWorker<R, S> {
    inner: Arc<Inner<R, S>>,
    line: LineId,
    rx: mpsc::UnboundedReceiver<QuantityChanged>,
    phase: watch::Sender<RowPhase>,
    pending: Option<QuantityChanged>,
    deadline: Option<Instant>,
    sequence: SequenceGuard,
}

impl<R: CartRemote, S: CartSurface> RowWorker<R, S> {
    async fn run(mut self) {
        loop {
            let sleep_until = self.deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                change = self.rx.recv() => match change {
                    Some(change) => self.queue(change),
                    None => break,
                },

                () = tokio::time::sleep_until(sleep_until), if self.deadline.is_some() => {
                    self.deadline = None;
                    if let Some(change) = self.pending.take() {
                        self.submit(change).await;
                    }
                }
            }
        }

        if let Some(change) = self.pending.take() {
            debug!(line = %self.line, "Flushing pending change on shutdown");
            self.submit(change).await;
        }
    }

    /// Hold a change and (re)arm the debounce timer.
    fn queue(&mut self, change: QuantityChanged) {
        let sequence = self.sequence.advance();
        debug!(
            line = %self.line,
            quantity = change.quantity.get(),
            sequence,
            "Quantity change queued"
        );
        self.pending = Some(change);
        self.deadline = Some(Instant::now() + self.inner.debounce);
        self.phase.send_replace(RowPhase::PendingDebounce);
    }

    async fn submit(&mut self, change: QuantityChanged) {
        let request = self.sequence.current();
        let surface = &self.inner.surface;

        self.phase.send_replace(RowPhase::Submitting);
        let previous = surface.row_visual(&self.line);
        surface.set_row_visual(&self.line, RowVisual::Loading);

        info!(
            line = %self.line,
            quantity = change.quantity.get(),
            request,
            "Submitting cart update"
        );
        let fields = change.form.with_quantity(change.quantity);
        let result = self
            .inner
            .remote
            .update_line(&change.form.action, &fields)
            .await;

        // Changes made while the request was in flight.
        while let Ok(newer) = self.rx.try_recv() {
            self.queue(newer);
        }

        let surface = &self.inner.surface;
        surface.set_row_visual(&self.line, previous);

        if !self.sequence.is_current(request) {
            debug!(
                line = %self.line,
                request,
                latest = self.sequence.current(),
                "Ignoring stale cart update response"
            );
            return;
        }

        match result {
            Ok(()) => {
                info!(line = %self.line, request, "Cart update confirmed");
                self.phase.send_replace(RowPhase::Confirmed);
                surface.resync();
            }
            Err(e) => {
                warn!(line = %self.line, request, error = %e, "Cart update failed");
                self.phase.send_replace(RowPhase::Failed);
                surface.notify(Notification::error(UPDATE_FAILED_MESSAGE));
            }
        }
    }
}
