//! Single-flight, rate-limited request queue
//!
//! Every call to the remote API goes through one [`RequestQueue`]. Callers get their own
//! future right away and may await it from any task, but the requests themselves leave
//! strictly one at a time, in the order they were enqueued, and at least the configured delay
//! apart.
//!
//! The drain task is spawned lazily on the first enqueue and exits once the queue runs dry,
//! after sleeping off the delay of the last request.
use ahash::AHashMap;
use e6f_common::log::{debug, warn};
use futures::FutureExt;
use serde_json::Value;
use std::{
    collections::VecDeque,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{sync::oneshot, time::sleep};

use crate::{
    endpoint::Endpoint,
    error::{ApiError, TransportError},
    transport::{HttpRequest, HttpResponse, Transport},
};

/// Spacing used when the caller doesn't ask for a specific one.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

/// No request is ever sent closer than this to the previous one.
pub const MIN_DELAY: Duration = Duration::from_millis(500);

/// Normalized answer of one queued request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueResponse {
    /// Parsed body, already unwrapped from the endpoint's envelope node.
    pub payload: Value,
    pub status: u16,
    pub endpoint: Endpoint,
}

type Responder = oneshot::Sender<Result<QueueResponse, ApiError>>;

struct QueueEntry {
    request: HttpRequest,
    index: u64,
    delay: Duration,
    endpoint: Endpoint,
}

#[derive(Default)]
struct QueueState {
    next_index: u64,
    entries: VecDeque<QueueEntry>,
    waiters: AHashMap<u64, Responder>,
    draining: bool,
}

struct QueueInner<T> {
    transport: T,
    state: Mutex<QueueState>,
}

impl<T> QueueInner<T> {
    // The state is never left half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a shared request queue. Clones feed the same queue.
pub struct RequestQueue<T: Transport> {
    inner: Arc<QueueInner<T>>,
    default_delay: Duration,
}

impl<T: Transport> Clone for RequestQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            default_delay: self.default_delay,
        }
    }
}

impl<T: Transport> RequestQueue<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_delay(transport, DEFAULT_DELAY)
    }

    /// Creates a queue whose requests default to `delay` spacing, floored at [`MIN_DELAY`].
    #[must_use]
    pub fn with_delay(transport: T, delay: Duration) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                transport,
                state: Mutex::new(QueueState::default()),
            }),
            default_delay: delay.max(MIN_DELAY),
        }
    }

    #[inline]
    pub const fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Requests waiting to be sent, not counting the one in flight.
    pub fn pending(&self) -> usize {
        self.inner.lock().entries.len()
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Appends a request to the queue and returns a future resolving to its answer.
    ///
    /// The request is registered before this returns, so queue order is call order even if
    /// the futures are awaited in a different one. Dropping the future doesn't cancel the
    /// request, its answer is simply discarded.
    ///
    /// `delay` is the pause after this request before the next one starts; `None` uses the
    /// queue default. Anything below [`MIN_DELAY`] is raised to it.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime, the drain task is spawned on it.
    pub fn enqueue(
        &self,
        request: HttpRequest,
        endpoint: Endpoint,
        delay: Option<Duration>,
    ) -> impl Future<Output = Result<QueueResponse, ApiError>> + Send + 'static {
        let (sender, receiver) = oneshot::channel();
        let delay = delay.unwrap_or(self.default_delay).max(MIN_DELAY);

        let start_drain = {
            let mut state = self.inner.lock();
            let index = state.next_index;
            state.next_index += 1;

            state.waiters.insert(index, sender);
            state.entries.push_back(QueueEntry {
                request,
                index,
                delay,
                endpoint,
            });
            debug!("Queued {endpoint} request #{index}");

            !std::mem::replace(&mut state.draining, true)
        };

        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.inner)));
        }

        async move {
            match receiver.await {
                Ok(result) => result,
                Err(_) => Err(ApiError::QueueClosed),
            }
        }
    }
}

async fn drain<T: Transport>(inner: Arc<QueueInner<T>>) {
    debug!("Request queue drain started");

    loop {
        let entry = {
            let mut state = inner.lock();
            match state.entries.pop_front() {
                Some(entry) => entry,
                None => {
                    state.draining = false;
                    break;
                }
            }
        };

        // A panicking transport fails its own request only.
        let outcome = match AssertUnwindSafe(inner.transport.send(entry.request))
            .catch_unwind()
            .await
        {
            Ok(result) => normalize(entry.endpoint, result),
            Err(_) => Err(ApiError::RequestFailed {
                status: 0,
                message: String::from("transport panicked while sending the request"),
                endpoint: entry.endpoint.name(),
            }),
        };

        if let Err(err) = &outcome {
            warn!("Request #{} failed: {err}", entry.index);
        }

        let waiter = inner.lock().waiters.remove(&entry.index);
        match waiter {
            Some(sender) => {
                if sender.send(outcome).is_err() {
                    debug!("Caller of request #{} went away", entry.index);
                }
            }
            None => debug!("No waiter registered for request #{}", entry.index),
        }

        sleep(entry.delay).await;
    }

    debug!("Request queue drained");
}

/// Turns a raw round-trip into the value handed to the caller.
fn normalize(
    endpoint: Endpoint,
    result: Result<HttpResponse, TransportError>,
) -> Result<QueueResponse, ApiError> {
    let response = result.map_err(|err| ApiError::RequestFailed {
        status: 0,
        message: err.to_string(),
        endpoint: endpoint.name(),
    })?;

    if !(200..400).contains(&response.status) {
        return Err(ApiError::RequestFailed {
            status: response.status,
            message: error_message(&response.body),
            endpoint: endpoint.name(),
        });
    }

    let payload = if response.body.trim().is_empty() {
        Value::Array(Vec::new())
    } else {
        serde_json::from_str::<Value>(&response.body).map_err(|err| {
            ApiError::InvalidResponse {
                endpoint: endpoint.name(),
                message: err.to_string(),
            }
        })?
    };

    let payload = match (endpoint.node(), payload) {
        (Some(node), Value::Object(mut envelope)) => {
            envelope
                .remove(node)
                .ok_or_else(|| ApiError::InvalidResponse {
                    endpoint: endpoint.name(),
                    message: format!("missing `{node}` node"),
                })?
        }
        (_, payload) => payload,
    };

    Ok(QueueResponse {
        payload,
        status: response.status,
        endpoint,
    })
}

/// Picks the server's own explanation out of an error body, if it gave one.
fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["reason", "message", "error"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        String::from("empty response")
    } else {
        body.chars().take(200).collect()
    }
}
