//! A multi-threaded, multi-session live data client. Each session is owned
//! and driven by its own worker thread; the supervisor tracks aggregate
//! subscription progress and tears every session down together.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use log::debug;

use crate::{
    enums::{SType, Schema},
    error::{Error, Result},
    live::{Session, SessionHandler},
    record_ref::RecordRef,
};

/// A supervisor-level record callback: the index of the originating session
/// and the record itself.
pub type RecordCallback = Box<dyn Fn(usize, RecordRef) + Send + Sync>;
/// A supervisor-level error callback: the index of the originating session
/// and the error it observed.
pub type ErrorCallback = Box<dyn Fn(usize, &Error) + Send + Sync>;

struct MultiShared {
    num_subscribed: AtomicU64,
    stop: AtomicBool,
    on_record: Option<RecordCallback>,
    on_error: Option<ErrorCallback>,
}

/// Forwards one session's callbacks to the supervisor-level callbacks,
/// tagged with the session index.
struct ForwardHandler {
    index: usize,
    shared: Arc<MultiShared>,
}

impl SessionHandler for ForwardHandler {
    fn on_record(&mut self, record: RecordRef) {
        if let Some(on_record) = &self.shared.on_record {
            on_record(self.index, record);
        }
    }

    fn on_error(&mut self, error: &Error) {
        if let Some(on_error) = &self.shared.on_error {
            on_error(self.index, error);
        }
    }
}

/// A collection of parallel live sessions, each owned by a worker thread
/// that subscribes and then drives an unbounded receive loop.
pub struct MultiClient {
    shared: Arc<MultiShared>,
    workers: Vec<JoinHandle<Session<ForwardHandler>>>,
}

impl MultiClient {
    /// Creates a new client with no sessions. `on_record` and `on_error`
    /// receive every session's records and errors along with the session's
    /// index.
    pub fn new(on_record: Option<RecordCallback>, on_error: Option<ErrorCallback>) -> Self {
        Self {
            shared: Arc::new(MultiShared {
                num_subscribed: AtomicU64::new(0),
                stop: AtomicBool::new(false),
                on_record,
                on_error,
            }),
            workers: Vec::new(),
        }
    }

    /// Establishes a new parallel session: connects and authenticates on the
    /// calling thread, then spawns a worker that subscribes and receives
    /// until [`close_all`](Self::close_all).
    ///
    /// # Errors
    /// This function returns an error if the connection or handshake fails,
    /// or if the worker thread can't be spawned. Subscription errors are
    /// reported asynchronously through the error callback.
    #[allow(clippy::too_many_arguments)]
    pub fn connect_and_start(
        &mut self,
        api_key: &str,
        dataset: &str,
        send_ts_out: bool,
        schema: Schema,
        stype_in: SType,
        symbols: &[String],
        suffix: &str,
        replay: bool,
    ) -> Result<()> {
        let index = self.workers.len();
        let mut session = Session::new(ForwardHandler {
            index,
            shared: Arc::clone(&self.shared),
        });
        session.connect(api_key, dataset, send_ts_out)?;

        let shared = Arc::clone(&self.shared);
        let symbols = symbols.to_vec();
        let suffix = suffix.to_owned();
        let worker = thread::Builder::new()
            .name(format!("lsg-session-{index}"))
            .spawn(move || {
                if session
                    .start(schema, stype_in, &symbols, &suffix, replay)
                    .is_err()
                {
                    // Already forwarded to the error callback.
                    return session;
                }
                shared.num_subscribed.fetch_add(1, Ordering::AcqRel);
                while !shared.stop.load(Ordering::Acquire) {
                    if session.get().is_err() {
                        break;
                    }
                }
                session
            })
            .map_err(|e| Error::io(e, "spawning session worker"))?;
        self.workers.push(worker);
        Ok(())
    }

    /// Returns the number of sessions established so far.
    pub fn num_sessions(&self) -> usize {
        self.workers.len()
    }

    /// Returns `true` once every session's worker has completed its
    /// subscription request, i.e. all requested data is flowing.
    pub fn is_fully_subscribed(&self) -> bool {
        self.shared.num_subscribed.load(Ordering::Acquire) == self.workers.len() as u64
    }

    /// Stops every worker at its next receive boundary, joins it, and closes
    /// its session. Idempotent: later calls are no-ops.
    pub fn close_all(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.shared.stop.store(true, Ordering::Release);
        debug!("Stopping {} session worker(s)", self.workers.len());
        for worker in self.workers.drain(..) {
            if let Ok(mut session) = worker.join() {
                session.close();
            }
        }
    }
}

impl Drop for MultiClient {
    fn drop(&mut self) {
        self.close_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn no_sessions_is_fully_subscribed() {
        let client = MultiClient::new(None, None);
        assert_eq!(client.num_sessions(), 0);
        assert!(client.is_fully_subscribed());
    }

    #[test]
    fn close_all_is_idempotent() {
        let mut client = MultiClient::new(None, None);
        client.close_all();
        client.close_all();
    }

    #[test]
    fn forward_handler_tags_session_index() {
        let seen: Arc<Mutex<Vec<(usize, String)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_by_cb = Arc::clone(&seen);
        let client = MultiClient::new(
            None,
            Some(Box::new(move |index: usize, err: &Error| {
                seen_by_cb.lock().unwrap().push((index, err.to_string()));
            })),
        );
        let mut handler = ForwardHandler {
            index: 3,
            shared: Arc::clone(&client.shared),
        };
        handler.on_error(&Error::ConnectionLost);
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[(3, "connection closed unexpectedly".to_owned())]
        );
    }
}
