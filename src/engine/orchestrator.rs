//! Fetch orchestrator — turns user intent into fetches and applies results
//!
//! Every trigger becomes either a refresh (start over) or an append (fetch
//! more). Requests form a latest-wins switch: issuing one aborts the task of
//! the previous and bumps a sequence number, and a response is applied only
//! if its sequence is still current.
//!
//! Refreshes race the fetch against a short timer. If the timer wins, the
//! list is published as "cleared" so the caller can show a loading
//! indicator; fast responses never flicker.

use super::accumulator::{Accumulator, MergeMode};
use super::state::ConnectionState;
use crate::config::{ConfigError, ConnectionConfig};
use crate::connection::{ConnectionSource, FetchError, FilterSet, Page};
use crate::params::{Location, QueryParams, RequestKind, UrlQueryState};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

/// Errors from engine construction and operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What caused a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Mount,
    Search,
    Filter,
    Forced(&'static str),
    More,
}

impl Trigger {
    fn kind(self) -> RequestKind {
        match self {
            Trigger::More => RequestKind::Append,
            _ => RequestKind::Refresh,
        }
    }
}

struct InFlight {
    seq: u64,
    abort: AbortHandle,
}

struct Inner<N> {
    source: Arc<dyn ConnectionSource<N>>,
    params: QueryParams,
    acc: Accumulator<N>,
    /// Sequence of the most recently issued request
    seq: u64,
    /// Requests issued so far; the first may use the `visible` override
    query_count: u64,
    /// Bumped on every keystroke; only the latest debounce commits
    text_generation: u64,
    search_pending: bool,
    in_flight: Option<InFlight>,
    requested_first: usize,
    loading: bool,
    cleared: bool,
    error: Option<String>,
    update_key: Option<String>,
}

struct Shared<N> {
    config: ConnectionConfig,
    filters: FilterSet,
    location: Option<Arc<dyn Location>>,
    inner: Mutex<Inner<N>>,
    state_tx: watch::Sender<ConnectionState<N>>,
}

/// A paginated, filterable list over a [`ConnectionSource`].
///
/// Construct it inside a tokio runtime: the initial fetch is issued
/// immediately. Dropping the engine aborts any in-flight fetch.
pub struct ConnectionEngine<N> {
    shared: Arc<Shared<N>>,
}

impl<N> ConnectionEngine<N>
where
    N: Clone + Send + Sync + 'static,
{
    pub fn new(
        source: Arc<dyn ConnectionSource<N>>,
        config: ConnectionConfig,
    ) -> Result<Self, EngineError> {
        Self::build(source, config, None)
    }

    /// Like [`new`](Self::new), restoring from and syncing to `location`
    /// when `use_url_query` is set.
    pub fn with_location(
        source: Arc<dyn ConnectionSource<N>>,
        config: ConnectionConfig,
        location: Arc<dyn Location>,
    ) -> Result<Self, EngineError> {
        Self::build(source, config, Some(location))
    }

    fn build(
        source: Arc<dyn ConnectionSource<N>>,
        config: ConnectionConfig,
        location: Option<Arc<dyn Location>>,
    ) -> Result<Self, EngineError> {
        let filters = config.validate()?;
        let location = location.filter(|_| config.use_url_query);

        let params = match &location {
            Some(location) => {
                let url = UrlQueryState::parse(&location.search());
                QueryParams::from_url(&url, config.default_first, &filters)
            }
            None => QueryParams::new(config.default_first, &filters),
        };

        let initial = ConnectionState {
            search_input: params.search_input().to_string(),
            query: params.query(),
            ..ConnectionState::default()
        };
        let (state_tx, _) = watch::channel(initial);

        let inner = Inner {
            source,
            params,
            acc: Accumulator::new(),
            seq: 0,
            query_count: 0,
            text_generation: 0,
            search_pending: false,
            in_flight: None,
            requested_first: 0,
            loading: false,
            cleared: false,
            error: None,
            update_key: config.update_on_change.clone(),
        };

        let shared = Arc::new(Shared {
            config,
            filters,
            location,
            inner: Mutex::new(inner),
            state_tx,
        });

        {
            let mut inner = shared.lock();
            shared.issue(&mut inner, Trigger::Mount);
        }

        Ok(Self { shared })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.shared.config
    }

    pub fn filters(&self) -> &FilterSet {
        &self.shared.filters
    }

    /// Current snapshot.
    pub fn state(&self) -> ConnectionState<N> {
        self.shared.state_tx.borrow().clone()
    }

    /// Receive a new snapshot on every change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState<N>> {
        self.shared.state_tx.subscribe()
    }

    /// Wait until no fetch is in flight and no search text is pending.
    pub async fn settled(&self) -> ConnectionState<N> {
        let mut rx = self.shared.state_tx.subscribe();
        let settled = rx.wait_for(|state| state.is_settled()).await.map(|s| s.clone());
        match settled {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Update the search box. The fetch waits for the debounce interval and
    /// only happens if the committed text differs from the previous one.
    pub fn set_search_text(&self, text: impl Into<String>) {
        let generation = {
            let mut inner = self.shared.lock();
            inner.params.set_search_input(text);
            inner.text_generation += 1;
            inner.search_pending = true;
            self.shared.publish(&inner);
            inner.text_generation
        };

        let weak = Arc::downgrade(&self.shared);
        let delay = self.shared.config.search_debounce();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.commit_search(generation);
            }
        });
    }

    /// Switch filters. Selecting the active filter again does nothing.
    pub fn select_filter(&self, id: &str) -> Result<(), EngineError> {
        if self.shared.filters.get(id).is_none() {
            return Err(EngineError::UnknownFilter(id.to_string()));
        }
        let mut inner = self.shared.lock();
        if inner.params.select_filter(id) {
            self.shared.issue(&mut inner, Trigger::Filter);
        }
        Ok(())
    }

    /// Fetch the next page. Returns false, doing nothing, while a fetch is
    /// in flight, before the first page, when there is no next page, or
    /// after a failed refresh until a page for the current query lands.
    pub fn request_more(&self) -> bool {
        let mut inner = self.shared.lock();
        if inner.in_flight.is_some() || !inner.acc.is_loaded() || !inner.acc.has_next_page() {
            debug!(
                in_flight = inner.in_flight.is_some(),
                has_next_page = inner.acc.has_next_page(),
                "request_more ignored"
            );
            return false;
        }
        let end_cursor = inner.acc.end_cursor().map(str::to_string);
        let last_first = inner.requested_first;
        inner
            .params
            .request_more(self.shared.config.cursor_paging, end_cursor.as_deref(), last_first);
        self.shared.issue(&mut inner, Trigger::More);
        true
    }

    /// Force a refresh with the current parameters.
    pub fn refresh(&self) {
        self.shared.force_refresh("refresh");
    }

    /// Refresh when the opaque key differs from the previous one.
    pub fn set_update_key(&self, key: Option<String>) {
        let mut inner = self.shared.lock();
        if inner.update_key != key {
            inner.update_key = key;
            self.shared.issue(&mut inner, Trigger::Forced("update key changed"));
        }
    }

    /// Replace the fetch function; always refreshes.
    pub fn set_source(&self, source: Arc<dyn ConnectionSource<N>>) {
        let mut inner = self.shared.lock();
        inner.source = source;
        self.shared.issue(&mut inner, Trigger::Forced("source replaced"));
    }

    /// Treat every message on `updates` as "something changed elsewhere".
    /// The forwarding task ends when the channel closes or the engine drops.
    pub fn attach_updates(&self, mut updates: mpsc::Receiver<()>) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.shared);
        tokio::spawn(async move {
            while updates.recv().await.is_some() {
                match weak.upgrade() {
                    Some(shared) => shared.force_refresh("external update"),
                    None => break,
                }
            }
        })
    }
}

impl<N> Drop for ConnectionEngine<N> {
    fn drop(&mut self) {
        let inner = self.shared.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(in_flight) = &inner.in_flight {
            in_flight.abort.abort();
        }
    }
}

impl<N> Shared<N>
where
    N: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, Inner<N>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn force_refresh(self: &Arc<Self>, reason: &'static str) {
        let mut inner = self.lock();
        self.issue(&mut inner, Trigger::Forced(reason));
    }

    fn commit_search(self: &Arc<Self>, generation: u64) {
        let mut inner = self.lock();
        if inner.text_generation != generation {
            return;
        }
        inner.search_pending = false;
        if inner.params.commit_search_text() {
            self.issue(&mut inner, Trigger::Search);
        } else {
            self.publish(&inner);
        }
    }

    /// Issue a request, superseding whatever is in flight.
    fn issue(self: &Arc<Self>, inner: &mut Inner<N>, trigger: Trigger) {
        let kind = trigger.kind();
        if let Some(previous) = inner.in_flight.take() {
            debug!(seq = previous.seq, "superseding in-flight request");
            previous.abort.abort();
        }
        if kind == RequestKind::Refresh {
            inner.params.reset_cursor();
        }

        inner.seq += 1;
        inner.query_count += 1;
        let seq = inner.seq;
        let args = inner
            .params
            .fetch_args(kind, inner.query_count == 1, &self.filters);
        inner.requested_first = args.first;
        inner.loading = true;

        debug!(
            seq,
            ?trigger,
            first = args.first,
            after = ?args.after,
            query = args.query_text(),
            "issuing fetch"
        );

        let source = inner.source.clone();
        let weak = Arc::downgrade(self);
        let clear_delay = self.config.clear_delay();
        let handle = tokio::spawn(async move {
            let result = match kind {
                RequestKind::Refresh => {
                    let fetch = source.fetch(args);
                    tokio::pin!(fetch);
                    tokio::select! {
                        biased;
                        result = &mut fetch => result,
                        _ = tokio::time::sleep(clear_delay) => {
                            if let Some(shared) = weak.upgrade() {
                                shared.apply_cleared(seq);
                            }
                            fetch.await
                        }
                    }
                }
                RequestKind::Append => source.fetch(args).await,
            };
            if let Some(shared) = weak.upgrade() {
                shared.apply_result(seq, kind, result);
            }
        });

        inner.in_flight = Some(InFlight {
            seq,
            abort: handle.abort_handle(),
        });
        self.publish(inner);
    }

    fn apply_cleared(&self, seq: u64) {
        let mut inner = self.lock();
        if inner.seq != seq || inner.in_flight.is_none() {
            return;
        }
        debug!(seq, "refresh slow; clearing list");
        inner.cleared = true;
        self.publish(&inner);
    }

    fn apply_result(&self, seq: u64, kind: RequestKind, result: Result<Page<N>, FetchError>) {
        let mut inner = self.lock();
        if inner.seq != seq {
            debug!(seq, current = inner.seq, "discarding stale response");
            return;
        }
        inner.in_flight = None;
        inner.loading = false;
        inner.cleared = false;

        match result {
            Ok(page) => {
                let mode = match kind {
                    RequestKind::Append if self.config.cursor_paging => MergeMode::Append,
                    _ => MergeMode::Replace,
                };
                debug!(seq, items = page.items.len(), ?mode, "applying page");
                inner.acc.merge(mode, page);
                inner.error = None;
            }
            Err(err) => {
                warn!(seq, error = %err, "fetch failed");
                inner.error = Some(err.to_string());
                if kind == RequestKind::Refresh {
                    // The shown items belong to the previous query.
                    inner.acc.mark_stale();
                }
            }
        }
        inner.params.clear_visible_override();
        self.publish(&inner);
    }

    fn publish(&self, inner: &Inner<N>) {
        let state = ConnectionState {
            items: inner.acc.items().to_vec(),
            cleared: inner.cleared,
            loading: inner.loading,
            search_pending: inner.search_pending,
            search_input: inner.params.search_input().to_string(),
            query: inner.params.query(),
            error: inner.error.clone(),
            page_error: inner.acc.page_error().map(str::to_string),
            total: inner.acc.total(),
            total_count: inner.acc.total_count(inner.requested_first),
            has_next_page: inner.acc.has_next_page(),
            requested_first: inner.requested_first,
            loaded: inner.acc.is_loaded(),
        };
        let settled = state.is_settled();
        self.state_tx.send_replace(state);

        if settled {
            self.sync_location(inner);
        }
    }

    fn sync_location(&self, inner: &Inner<N>) {
        let Some(location) = &self.location else {
            return;
        };
        let current = location.search();
        let next = inner
            .params
            .to_url(inner.acc.len(), &self.filters)
            .apply_to(&current);
        if next != current.trim_start_matches('?') {
            location.replace_search(&next);
        }
    }
}
