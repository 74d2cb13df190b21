//! # binding: observable fetch state for one kind of content
//!
//! A [`Binding`] ties a parameter value to an async fetch and exposes the outcome as a
//! [`BindingState`] through a `tokio::sync::watch` channel. A page section holds one
//! binding per entity kind it shows and re-renders whenever the channel changes.
//!
//! ## Lifecycle
//! - `Idle` until [`Binding::mount`] runs the first fetch. Any fetch counts as the first
//!   one, so mounting after `set_params` or `refetch` does nothing.
//! - Every fetch moves the state to `Loading` (previous data stays visible), then to
//!   `Loaded` with fresh data or `Errored` with a display message. Errors never clear data.
//! - [`Binding::set_params`] refetches only when the parameters differ structurally from
//!   the current ones (compared by their canonical JSON form).
//! - [`Binding::refetch`] always refetches.
//!
//! ## Overlapping fetches
//! Each fetch takes the next generation number when it starts. Its outcome is applied only
//! if no later fetch has started in the meantime; otherwise it is dropped. The final state
//! therefore always reflects the most recently issued request, whatever order the
//! responses arrive in. In-flight requests are not cancelled.

pub mod content;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ContentError;

/// The async call a binding runs for a given parameter value.
pub type Fetcher<P, T> =
    Arc<dyn Fn(P) -> BoxFuture<'static, Result<T, ContentError>> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Errored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingState<T> {
    pub phase: Phase,
    /// Empty until the first successful fetch; afterwards the latest successful result.
    pub data: T,
    pub loading: bool,
    /// User-facing message of the latest failure, cleared when a new fetch starts.
    pub error: Option<String>,
    /// Generation of the most recently started fetch.
    pub generation: u64,
}

impl<T: Default> Default for BindingState<T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            data: T::default(),
            loading: false,
            error: None,
            generation: 0,
        }
    }
}

struct Params<P> {
    key: String,
    value: P,
}

struct Inner<P, T> {
    name: &'static str,
    fetcher: Fetcher<P, T>,
    params: Mutex<Params<P>>,
    mounted: AtomicBool,
    state: watch::Sender<BindingState<T>>,
}

/// Cheaply cloneable handle; clones share the same state.
pub struct Binding<P, T> {
    inner: Arc<Inner<P, T>>,
}

impl<P, T> Clone for Binding<P, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, T> Binding<P, T>
where
    P: Serialize + Clone + Send + 'static,
    T: Clone + Default + Send + Sync + 'static,
{
    pub fn new(name: &'static str, params: P, fetcher: Fetcher<P, T>) -> Self {
        let key = canonical_key(name, &params);
        let (state, _) = watch::channel(BindingState::default());
        Self {
            inner: Arc::new(Inner {
                name,
                fetcher,
                params: Mutex::new(Params { key, value: params }),
                mounted: AtomicBool::new(false),
                state,
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    pub fn state(&self) -> BindingState<T> {
        self.inner.state.borrow().clone()
    }

    pub fn data(&self) -> T {
        self.inner.state.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error.clone()
    }

    pub fn params(&self) -> P {
        self.lock_params().value.clone()
    }

    /// Receiver notified on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<BindingState<T>> {
        self.inner.state.subscribe()
    }

    /// Runs the initial fetch. Returns `false` if the binding was already mounted or has
    /// already fetched.
    pub async fn mount(&self) -> bool {
        if self.inner.mounted.swap(true, Ordering::SeqCst) {
            debug!(binding = self.inner.name, "[BINDING] Already mounted");
            return false;
        }
        info!(binding = self.inner.name, "[BINDING] Mounted");
        self.refetch().await;
        true
    }

    /// Replaces the parameters and refetches, unless they are structurally equal to the
    /// current ones. Returns whether a fetch ran.
    pub async fn set_params(&self, params: P) -> bool {
        let key = canonical_key(self.inner.name, &params);
        let (generation, value) = {
            let mut current = self.lock_params();
            if current.key == key {
                debug!(binding = self.inner.name, params = %key, "[BINDING] Parameters unchanged");
                return false;
            }
            *current = Params { key, value: params };
            (self.begin(), current.value.clone())
        };
        self.run(generation, value).await;
        true
    }

    /// Fetches again with the current parameters.
    pub async fn refetch(&self) {
        let (generation, value) = {
            let current = self.lock_params();
            (self.begin(), current.value.clone())
        };
        self.run(generation, value).await;
    }

    fn lock_params(&self) -> MutexGuard<'_, Params<P>> {
        self.inner
            .params
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes the loading state and claims the next generation. Called with the
    /// parameter lock held so generation order matches parameter order.
    fn begin(&self) -> u64 {
        self.inner.mounted.store(true, Ordering::SeqCst);
        let mut generation = 0;
        self.inner.state.send_modify(|state| {
            state.generation += 1;
            generation = state.generation;
            state.phase = Phase::Loading;
            state.loading = true;
            state.error = None;
        });
        debug!(binding = self.inner.name, generation, "[BINDING] Fetch started");
        generation
    }

    async fn run(&self, generation: u64, params: P) {
        let outcome = (self.inner.fetcher)(params).await;
        if let Err(err) = &outcome {
            warn!(
                binding = self.inner.name,
                generation,
                kind = err.kind().code(),
                error = %err,
                "[BINDING] Fetch failed"
            );
        }

        let applied = self.inner.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            state.loading = false;
            match outcome {
                Ok(data) => {
                    state.phase = Phase::Loaded;
                    state.data = data;
                    state.error = None;
                }
                Err(err) => {
                    state.phase = Phase::Errored;
                    state.error = Some(err.user_message());
                }
            }
            true
        });

        if applied {
            debug!(binding = self.inner.name, generation, "[BINDING] Fetch applied");
        } else {
            debug!(binding = self.inner.name, generation, "[BINDING] Discarded stale result");
        }
    }
}

/// Canonical JSON form of the parameters. Object keys are sorted, so structurally
/// equal values produce the same key.
fn canonical_key<P: Serialize>(binding: &str, params: &P) -> String {
    match serde_json::to_value(params) {
        Ok(value) => sort_keys(value).to_string(),
        Err(e) => {
            warn!(binding, error = %e, "[BINDING] Parameters are not serializable");
            format!("<unserializable: {e}>")
        }
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
