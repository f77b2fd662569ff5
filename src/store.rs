//! The roster store: a background task that owns the fetched influencer and
//! manager collections and keeps them in sync with the service.
//!
//! The task reacts to three inputs: filter changes (debounced, then
//! re-fetched), the shared [`RefreshFlag`], and load results coming back
//! from spawned request tasks. Every change is published as a
//! [`RosterSnapshot`] on a watch channel that [`RosterHandle`] reads from.
//!
//! Loads are never cancelled. Each carries a sequence number, and a result
//! older than the newest one already applied is dropped, so the snapshot
//! always reflects the latest fetch. Once the store is torn down, results
//! still in flight are dropped as well.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::client::RosterApi;
use crate::config::StoreConfig;
use crate::debounce::Debounce;
use crate::error::{ApiError, LOAD_FAILED, StoreError};
use crate::filter::FilterMemo;
use crate::model::{Influencer, Manager};
use crate::refresh::RefreshFlag;

/// Point-in-time view of a mounted roster store.
#[derive(Debug, Clone)]
pub struct RosterSnapshot {
    /// The collection from the most recent applied influencer load.
    pub influencers: Arc<[Influencer]>,
    /// `influencers` narrowed by `filter`. Shares the allocation with
    /// `influencers` when the filter is empty.
    pub visible: Arc<[Influencer]>,
    /// Managers available for assignment.
    pub managers: Arc<[Manager]>,
    /// Current filter text.
    pub filter: String,
    /// `true` while at least one influencer load is in flight.
    pub loading: bool,
    /// Message describing the most recent failed influencer load, cleared
    /// by the next successful one.
    pub error: Option<String>,
    /// Message describing the most recent failed manager load, cleared by
    /// the next successful one. Only a refresh reloads managers.
    pub manager_error: Option<String>,
    /// Number of influencer load results applied so far (successful or
    /// not). Stale results are not counted.
    pub loads_completed: u64,
}

impl Default for RosterSnapshot {
    fn default() -> Self {
        let influencers: Arc<[Influencer]> = Arc::from(Vec::new());
        Self {
            visible: influencers.clone(),
            influencers,
            managers: Arc::from(Vec::new()),
            filter: String::new(),
            loading: false,
            error: None,
            manager_error: None,
            loads_completed: 0,
        }
    }
}

/// Result of a spawned load task, sent back to the store loop.
enum LoadOutcome {
    Influencers {
        seq: u64,
        result: Result<Vec<Influencer>, ApiError>,
    },
    Managers {
        seq: u64,
        result: Result<Vec<Manager>, ApiError>,
    },
}

/// State owned by the store loop.
struct StoreState {
    client: Arc<dyn RosterApi>,
    refresh: RefreshFlag,
    alive: Arc<AtomicBool>,
    outcomes_tx: mpsc::UnboundedSender<LoadOutcome>,
    snapshot_tx: watch::Sender<RosterSnapshot>,
    filter: String,
    influencers: Arc<[Influencer]>,
    managers: Arc<[Manager]>,
    memo: FilterMemo,
    next_seq: u64,
    applied_influencer_seq: u64,
    applied_manager_seq: u64,
    in_flight: usize,
    influencer_error: Option<String>,
    manager_error: Option<String>,
    loads_completed: u64,
}

impl StoreState {
    fn new(
        client: Arc<dyn RosterApi>,
        refresh: RefreshFlag,
        alive: Arc<AtomicBool>,
        outcomes_tx: mpsc::UnboundedSender<LoadOutcome>,
        snapshot_tx: watch::Sender<RosterSnapshot>,
        filter: String,
    ) -> Self {
        let empty: Arc<[Influencer]> = Arc::from(Vec::new());
        Self {
            client,
            refresh,
            alive,
            outcomes_tx,
            snapshot_tx,
            filter,
            influencers: empty,
            managers: Arc::from(Vec::new()),
            memo: FilterMemo::default(),
            next_seq: 0,
            applied_influencer_seq: 0,
            applied_manager_seq: 0,
            in_flight: 0,
            influencer_error: None,
            manager_error: None,
            loads_completed: 0,
        }
    }

    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Spawn `list_influencers` with the current filter.
    fn spawn_influencer_load(&mut self) {
        let seq = self.next_seq();
        self.in_flight += 1;
        let filter = self.filter.clone();
        tracing::debug!(seq, filter = %filter, "loading influencers");

        let client = Arc::clone(&self.client);
        let tx = self.outcomes_tx.clone();
        let alive = Arc::clone(&self.alive);
        tokio::spawn(async move {
            let result = client.list_influencers(&filter).await;
            if alive.load(Ordering::Acquire) {
                // The loop owns the receiver for as long as `alive` is set.
                let _ = tx.send(LoadOutcome::Influencers { seq, result });
            } else {
                tracing::debug!(seq, "store torn down, dropping influencer load");
            }
        });
        self.publish();
    }

    /// Spawn `list_managers`.
    fn spawn_manager_load(&mut self) {
        let seq = self.next_seq();
        let client = Arc::clone(&self.client);
        let tx = self.outcomes_tx.clone();
        let alive = Arc::clone(&self.alive);
        tokio::spawn(async move {
            let result = client.list_managers().await;
            if alive.load(Ordering::Acquire) {
                let _ = tx.send(LoadOutcome::Managers { seq, result });
            } else {
                tracing::debug!(seq, "store torn down, dropping manager load");
            }
        });
    }

    fn set_filter(&mut self, filter: String) {
        self.filter = filter;
        self.publish();
    }

    fn apply(&mut self, outcome: LoadOutcome) {
        if !self.alive.load(Ordering::Acquire) {
            tracing::debug!("store torn down, ignoring load outcome");
            return;
        }
        match outcome {
            LoadOutcome::Influencers { seq, result } => {
                // Decrement first: the loading flag clears whatever the outcome.
                self.in_flight = self.in_flight.saturating_sub(1);
                if seq < self.applied_influencer_seq {
                    tracing::debug!(
                        seq,
                        newest = self.applied_influencer_seq,
                        "discarding stale influencer load"
                    );
                } else {
                    self.applied_influencer_seq = seq;
                    self.loads_completed += 1;
                    match result {
                        Ok(influencers) => {
                            tracing::info!(seq, count = influencers.len(), "influencers loaded");
                            self.influencers = Arc::from(influencers);
                            self.influencer_error = None;
                        }
                        Err(e) => {
                            tracing::warn!(seq, error = %e, "influencer load failed");
                            self.influencer_error = Some(e.user_message(LOAD_FAILED));
                        }
                    }
                }
            }
            LoadOutcome::Managers { seq, result } => {
                if seq < self.applied_manager_seq {
                    tracing::debug!(seq, "discarding stale manager load");
                    return;
                }
                self.applied_manager_seq = seq;
                match result {
                    Ok(managers) => {
                        tracing::info!(seq, count = managers.len(), "managers loaded");
                        self.managers = Arc::from(managers);
                        self.manager_error = None;
                    }
                    Err(e) => {
                        tracing::warn!(seq, error = %e, "manager load failed");
                        self.manager_error = Some(e.user_message(LOAD_FAILED));
                    }
                }
            }
        }
        self.publish();
    }

    fn publish(&mut self) {
        let visible = self.memo.view(&self.influencers, &self.filter);
        self.snapshot_tx.send_replace(RosterSnapshot {
            influencers: Arc::clone(&self.influencers),
            visible,
            managers: Arc::clone(&self.managers),
            filter: self.filter.clone(),
            loading: self.in_flight > 0,
            error: self.influencer_error.clone(),
            manager_error: self.manager_error.clone(),
            loads_completed: self.loads_completed,
        });
    }
}

/// Receivers driven by the store loop.
struct StoreInputs {
    outcomes_rx: mpsc::UnboundedReceiver<LoadOutcome>,
    filter_rx: watch::Receiver<String>,
    refresh_rx: watch::Receiver<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Run the store loop until shutdown is signalled or every handle is
/// dropped.
async fn run_store(mut state: StoreState, inputs: StoreInputs, filter_debounce: Duration) {
    let StoreInputs {
        mut outcomes_rx,
        mut filter_rx,
        mut refresh_rx,
        mut shutdown_rx,
    } = inputs;
    let mut debounce = Debounce::new(filter_debounce);

    state.spawn_influencer_load();
    state.spawn_manager_load();
    // A flag raised before mount is satisfied by the mount loads.
    state.refresh.take();

    loop {
        tokio::select! {
            biased;

            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
            changed = filter_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let filter = filter_rx.borrow_and_update().clone();
                state.set_filter(filter);
                debounce.arm();
            }
            changed = refresh_rx.changed() => {
                // The state holds a RefreshFlag, so the sender outlives the loop.
                // Lowering the flag before spawning keeps a raise that lands
                // during the spawn for the next iteration.
                if changed.is_ok() && state.refresh.take() {
                    tracing::debug!("refresh requested");
                    // The refresh load already uses the current filter.
                    debounce.cancel();
                    state.spawn_influencer_load();
                    state.spawn_manager_load();
                }
            }
            () = debounce.fired() => {
                state.spawn_influencer_load();
            }
            Some(outcome) = outcomes_rx.recv() => {
                state.apply(outcome);
            }
        }
    }

    debounce.cancel();
    state.alive.store(false, Ordering::Release);
    tracing::debug!("roster store stopped");
}

/// Handle to a mounted roster store.
///
/// Cloning is cheap; all clones talk to the same store task. The store runs
/// until [`shutdown`](RosterHandle::shutdown) is called or every clone is
/// dropped, whichever comes first.
#[derive(Clone)]
pub struct RosterHandle {
    filter_tx: watch::Sender<String>,
    shutdown_tx: watch::Sender<bool>,
    snapshot_rx: watch::Receiver<RosterSnapshot>,
    refresh: RefreshFlag,
    alive: Arc<AtomicBool>,
    task: Arc<tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl std::fmt::Debug for RosterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterHandle")
            .field("alive", &self.is_alive())
            .field("filter", &*self.filter_tx.borrow())
            .finish()
    }
}

impl RosterHandle {
    /// Mount a store: spawn its task and issue the initial influencer and
    /// manager loads.
    ///
    /// # Arguments
    ///
    /// * `client` - API the store loads from.
    /// * `refresh` - Flag the store watches; writers raise it, the store
    ///   clears it after triggering a reload.
    /// * `config` - Debounce window and initial filter.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn mount(client: Arc<dyn RosterApi>, refresh: RefreshFlag, config: &StoreConfig) -> Self {
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (filter_tx, filter_rx) = watch::channel(config.initial_filter.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (snapshot_tx, snapshot_rx) = watch::channel(RosterSnapshot {
            filter: config.initial_filter.clone(),
            ..RosterSnapshot::default()
        });
        let alive = Arc::new(AtomicBool::new(true));

        let state = StoreState::new(
            client,
            refresh.clone(),
            Arc::clone(&alive),
            outcomes_tx,
            snapshot_tx,
            config.initial_filter.clone(),
        );
        let inputs = StoreInputs {
            outcomes_rx,
            filter_rx,
            refresh_rx: refresh.subscribe(),
            shutdown_rx,
        };

        let task = tokio::spawn(run_store(state, inputs, config.filter_debounce));

        Self {
            filter_tx,
            shutdown_tx,
            snapshot_rx,
            refresh,
            alive,
            task: Arc::new(tokio::sync::Mutex::new(Some(task))),
        }
    }

    /// Change the filter. The visible view updates right away; the service
    /// is queried once the debounce window passes without another change.
    /// Setting the current filter again does nothing.
    pub fn set_filter(&self, text: impl Into<String>) {
        let text = text.into();
        self.filter_tx.send_if_modified(|current| {
            if *current == text {
                false
            } else {
                *current = text;
                true
            }
        });
    }

    /// The filter most recently set through this store.
    pub fn filter(&self) -> String {
        self.filter_tx.borrow().clone()
    }

    /// Request a reload, exactly as a writer would.
    pub fn refresh(&self) {
        self.refresh.raise();
    }

    /// The flag this store consumes.
    pub fn refresh_flag(&self) -> &RefreshFlag {
        &self.refresh
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> RosterSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Latest filtered view.
    pub fn filtered_view(&self) -> Arc<[Influencer]> {
        Arc::clone(&self.snapshot_rx.borrow().visible)
    }

    /// A receiver that wakes on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<RosterSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Wait until a published snapshot satisfies `predicate`.
    ///
    /// Checks the latest snapshot first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Stopped`] if the store stops before any
    /// snapshot satisfies `predicate`.
    pub async fn wait_until(
        &self,
        mut predicate: impl FnMut(&RosterSnapshot) -> bool,
    ) -> Result<RosterSnapshot, StoreError> {
        let mut rx = self.snapshot_rx.clone();
        let snapshot = rx
            .wait_for(|s| predicate(s))
            .await
            .map_err(|_| StoreError::Stopped)?;
        Ok(snapshot.clone())
    }

    /// `true` until the store has been torn down.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Tear the store down and wait for its task to exit.
    ///
    /// Pending debounce timers are cancelled and results of loads still in
    /// flight are discarded. Calling `shutdown` more than once is safe.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TaskFailed`] if the store task panicked.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.alive.store(false, Ordering::Release);
        // The receiver is gone if the task already exited.
        let _ = self.shutdown_tx.send(true);

        let task = self.task.lock().await.take();
        match task {
            Some(join_handle) => join_handle
                .await
                .map_err(|e| StoreError::TaskFailed(e.to_string())),
            None => Ok(()),
        }
    }
}
