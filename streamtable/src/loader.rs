//! Incremental loading of rows on a timer.
//!
//! The loader runs on the current thread: it shares the table through an
//! `Rc<RefCell<_>>` and never holds a borrow across an `.await`.

use stache::Value;
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::FetchError;
use crate::table::SharedTable;

/// What a source is asked for on each fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    /// The table's current search text
    pub query: String,
    /// Maximum number of rows wanted
    pub limit: Option<usize>,
    /// Number of rows the table already holds
    pub offset: usize,
}

/// Something rows can be fetched from.
pub trait RowSource {
    /// Fetch the next chunk of rows. An empty chunk means the source is
    /// exhausted.
    fn fetch(&self, query: &FetchQuery) -> impl Future<Output = Result<Vec<Value>, FetchError>>;
}

/// Outcome of one [`StreamLoader::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The chunk was appended to the table
    Appended(usize),
    /// A previous fetch is still in flight, or the table was borrowed
    /// elsewhere; nothing was appended
    Busy,
    /// The loader is stopped; nothing was done
    Stopped,
    /// The source returned nothing; the loader stopped
    Exhausted,
    /// The fetch failed; the loader stopped
    Failed,
    /// The loader was stopped while the fetch was in flight; the response
    /// was dropped
    Discarded,
}

impl Tick {
    /// Does this outcome end the stream?
    pub fn is_final(self) -> bool {
        matches!(
            self,
            Tick::Stopped | Tick::Exhausted | Tick::Failed | Tick::Discarded
        )
    }
}

#[derive(Debug, Default)]
struct LoaderState {
    stopped: Cell<bool>,
    in_flight: Cell<bool>,
}

/// Marks a fetch as in flight until dropped, including when the fetching
/// task is aborted.
struct InFlight<'a>(&'a Cell<bool>);

impl<'a> InFlight<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Fetches rows from a [`RowSource`] every `stream_after` seconds and
/// appends them to a table, until the source runs dry, a fetch fails or
/// someone stops it.
pub struct StreamLoader<S> {
    source: S,
    table: SharedTable,
    interval: Duration,
    limit: Option<usize>,
    state: Rc<LoaderState>,
}

impl<S> std::fmt::Debug for StreamLoader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamLoader")
            .field("interval", &self.interval)
            .field("limit", &self.limit)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S: RowSource> StreamLoader<S> {
    /// A loader for `table`, configured from the table's options. Without a
    /// `fetch_data_limit` it starts out stopped.
    pub fn new(source: S, table: SharedTable) -> Self {
        let (interval, limit) = {
            let table = table.borrow();
            let options = table.options();
            (options.stream_interval(), options.fetch_data_limit)
        };
        let state = Rc::new(LoaderState::default());
        if limit.is_none() {
            debug!("no fetch_data_limit; streaming disabled");
            state.stopped.set(true);
        }
        Self {
            source,
            table,
            interval,
            limit,
            state,
        }
    }

    /// Override the delay between fetches.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Is the loader (or its table) stopped?
    pub fn is_stopped(&self) -> bool {
        is_stopped(&self.state, &self.table)
    }

    /// Stop for good.
    pub fn stop(&self) {
        stop(&self.state, &self.table);
    }

    /// Run one fetch cycle.
    pub async fn tick(&self) -> Tick {
        if self.is_stopped() {
            return Tick::Stopped;
        }
        let Some(_guard) = InFlight::enter(&self.state.in_flight) else {
            trace!("fetch still in flight");
            return Tick::Busy;
        };

        let query = {
            let Ok(table) = self.table.try_borrow() else {
                trace!("table borrowed elsewhere; fetch skipped");
                return Tick::Busy;
            };
            FetchQuery {
                query: table.query().to_string(),
                limit: self.limit,
                offset: table.len(),
            }
        };
        trace!(offset = query.offset, limit = ?query.limit, "fetching rows");
        let result = self.source.fetch(&query).await;

        if self.is_stopped() {
            debug!("stopped while fetching; response discarded");
            return Tick::Discarded;
        }

        match result {
            Ok(rows) => {
                // The next fetch starts from the table's length again, so a
                // dropped chunk is fetched anew.
                let Ok(mut table) = self.table.try_borrow_mut() else {
                    debug!(offset = query.offset, "table borrowed elsewhere; chunk dropped");
                    return Tick::Busy;
                };
                let added = table.add_rows(rows);
                drop(table);
                if added == 0 && self.limit.is_some() {
                    debug!(offset = query.offset, "source exhausted");
                    self.stop();
                    Tick::Exhausted
                } else {
                    Tick::Appended(added)
                }
            }
            Err(err) => {
                warn!(error = %err, offset = query.offset, "fetch failed; streaming stopped");
                self.stop();
                Tick::Failed
            }
        }
    }

    /// Wait `stream_after`, fetch, and repeat until the stream ends.
    pub async fn run(&self) {
        while !self.is_stopped() {
            tokio::time::sleep(self.interval).await;
            if self.tick().await.is_final() {
                break;
            }
        }
    }
}

impl<S: RowSource + 'static> StreamLoader<S> {
    /// Run the loader as a task on the current [`LocalSet`](tokio::task::LocalSet).
    pub fn spawn_local(self) -> StreamHandle {
        let state = Rc::clone(&self.state);
        let table = Rc::clone(&self.table);
        let task = tokio::task::spawn_local(async move { self.run().await });
        StreamHandle { task, state, table }
    }
}

/// Handle to a spawned loader
#[derive(Debug)]
pub struct StreamHandle {
    task: JoinHandle<()>,
    state: Rc<LoaderState>,
    table: SharedTable,
}

impl StreamHandle {
    /// Stop the loader. A fetch already in flight is abandoned and its
    /// response never reaches the table.
    pub fn stop(&self) {
        stop(&self.state, &self.table);
        self.task.abort();
    }

    /// Is the loader (or its table) stopped?
    pub fn is_stopped(&self) -> bool {
        is_stopped(&self.state, &self.table)
    }

    /// Is a fetch in flight right now?
    pub fn is_fetching(&self) -> bool {
        self.state.in_flight.get()
    }

    /// Wait for the loader task to end.
    pub async fn finished(self) {
        // An aborted task reports a cancellation error, which is the
        // expected way for it to end after `stop`.
        let _ = self.task.await;
    }
}

fn is_stopped(state: &LoaderState, table: &SharedTable) -> bool {
    state.stopped.get()
        || table
            .try_borrow()
            .is_ok_and(|table| table.is_streaming_stopped())
}

fn stop(state: &LoaderState, table: &SharedTable) {
    state.stopped.set(true);
    // The table may be borrowed by the caller, e.g. from inside a callback;
    // its own flag is then set through `AfterAdd::stop_streaming` instead.
    if let Ok(mut table) = table.try_borrow_mut() {
        table.stop_streaming();
    }
}
