// ⏳ View Lifecycle
// Two small state machines owned by the caller rather than kept in
// globals:
//
// - ViewScope / LiveToken / ViewSlot: a fetch started by a view may finish
//   after the view is gone. Results are applied only while the view's
//   token is still live; late results are dropped. `load_until_closed`
//   ties a scope to a close signal such as Ctrl-C.
// - ResourceLoader: one-time loading of an external resource
//   (Unloaded → Loading → Ready | Failed), retryable after a failure.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// LIVENESS
// ============================================================================

/// Owned by a view; closing or dropping it invalidates every token
#[derive(Debug)]
pub struct ViewScope {
    alive: Arc<AtomicBool>,
}

/// Handed to in-flight work started by the view
#[derive(Debug, Clone)]
pub struct LiveToken {
    alive: Arc<AtomicBool>,
}

impl ViewScope {
    pub fn new() -> Self {
        ViewScope {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn token(&self) -> LiveToken {
        LiveToken {
            alive: Arc::clone(&self.alive),
        }
    }

    pub fn close(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.close();
    }
}

impl LiveToken {
    pub fn is_live(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

/// What a view currently shows for one piece of data
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

/// A view's data slot; starts out `Loading`
#[derive(Debug)]
pub struct ViewSlot<T> {
    state: LoadState<T>,
}

impl<T> ViewSlot<T> {
    pub fn new() -> Self {
        ViewSlot {
            state: LoadState::Loading,
        }
    }

    pub fn state(&self) -> &LoadState<T> {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading)
    }

    /// Apply a finished load if the view is still live.
    /// Returns `false` when the result was discarded.
    pub fn apply<E: std::fmt::Display>(&mut self, token: &LiveToken, result: Result<T, E>) -> bool {
        if !token.is_live() {
            log::debug!("Discarding result for a closed view");
            return false;
        }

        self.state = match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Failed(e.to_string()),
        };
        true
    }

    /// Take the loaded value out, leaving the slot `Loading`
    pub fn take(&mut self) -> LoadState<T> {
        std::mem::replace(&mut self.state, LoadState::Loading)
    }
}

impl<T> Default for ViewSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ONE-TIME RESOURCE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    Unloaded,
    Loading,
    Ready,
    Failed(String),
}

/// ResourceLoader - loads an external resource at most once at a time
///
/// Callers ask `begin()` before starting a load; only one caller gets
/// `true` until the load finishes. A failed load can be started again.
#[derive(Debug)]
pub struct ResourceLoader {
    name: String,
    state: ResourceState,
}

impl ResourceLoader {
    pub fn new(name: &str) -> Self {
        ResourceLoader {
            name: name.to_string(),
            state: ResourceState::Unloaded,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &ResourceState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ResourceState::Ready
    }

    /// Unloaded | Failed → Loading. Returns whether the caller should
    /// actually start loading.
    pub fn begin(&mut self) -> bool {
        match self.state {
            ResourceState::Unloaded | ResourceState::Failed(_) => {
                self.state = ResourceState::Loading;
                true
            }
            ResourceState::Loading | ResourceState::Ready => false,
        }
    }

    /// Loading → Ready
    pub fn mark_ready(&mut self) {
        if self.state == ResourceState::Loading {
            self.state = ResourceState::Ready;
        } else {
            log::warn!("{}: ready signal while {:?}, ignored", self.name, self.state);
        }
    }

    /// Loading → Failed
    pub fn mark_failed(&mut self, message: &str) {
        if self.state == ResourceState::Loading {
            log::warn!("{} failed to load: {}", self.name, message);
            self.state = ResourceState::Failed(message.to_string());
        }
    }

    /// Back to Unloaded (owner teardown)
    pub fn reset(&mut self) {
        self.state = ResourceState::Unloaded;
    }
}

/// Run `load` for the lifetime of a view that `close` ends. A load that
/// finishes first lands in the slot; when `close` wins the scope is closed,
/// the load is dropped and the state stays `Loading`.
pub async fn load_until_closed<T, E, F, C>(load: F, close: C) -> LoadState<T>
where
    E: std::fmt::Display,
    F: Future<Output = Result<T, E>>,
    C: Future,
{
    let scope = ViewScope::new();
    let token = scope.token();
    let mut slot = ViewSlot::new();

    tokio::select! {
        result = load => {
            slot.apply(&token, result);
        }
        _ = close => {
            scope.close();
            log::debug!("View closed before its load finished");
        }
    }

    slot.take()
}
