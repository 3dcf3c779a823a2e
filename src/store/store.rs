use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::event::{ListenerList, Subscription};
use crate::registry::Registry;
use crate::store::{short_type_name, AnyStore, ScopedStore, StoreEvent, StoreId, StoreOptions, StoreRef, StoreState};
use crate::sync::lock;

/// Shared store listener. Registering the same `Arc` twice is rejected.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

type Listeners = ListenerList<dyn Fn() + Send + Sync>;

struct StateCell<S> {
    state: S,
    prev_state: Option<S>,
}

#[derive(Default)]
struct EventListeners {
    update: Listeners,
    reset: Listeners,
    destroy: Listeners,
}

impl EventListeners {
    fn get(&self, event: StoreEvent) -> &Listeners {
        match event {
            StoreEvent::Update => &self.update,
            StoreEvent::Reset => &self.reset,
            StoreEvent::Destroy => &self.destroy,
        }
    }

    fn clear(&self) {
        for event in StoreEvent::ALL {
            self.get(event).clear();
        }
    }
}

pub(crate) struct StoreInner<S> {
    uid: StoreId,
    name: String,
    initial_state: S,
    cell: Mutex<StateCell<S>>,
    listeners: EventListeners,
    registry: Registry,
    destroyed: AtomicBool,
}

impl<S: StoreState> StoreInner<S> {
    fn state(&self) -> S {
        lock(&self.cell).state.clone()
    }

    fn replace(&self, event: StoreEvent, updater: impl FnOnce(S) -> S) {
        let next = updater(self.state());
        {
            let mut cell = lock(&self.cell);
            let prev = std::mem::replace(&mut cell.state, next);
            cell.prev_state = Some(prev);
        }

        if self.is_destroyed() {
            warn!(store = %self.name, uid = %self.uid, %event, "state changed after destroy");
            return;
        }
        self.emit(event);
    }

    fn listen(&self, event: StoreEvent, callback: Callback) -> Subscription {
        if self.is_destroyed() {
            return Subscription::empty();
        }
        self.listeners.get(event).add_fresh(callback)
    }

    fn emit(&self, event: StoreEvent) {
        for listener in self.listeners.get(event).snapshot() {
            listener();
        }
    }
}

impl<S: StoreState> AnyStore for StoreInner<S> {
    fn uid(&self) -> &StoreId {
        &self.uid
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn state_value(&self) -> Result<Value> {
        let cell = lock(&self.cell);
        serde_json::to_value(&cell.state).map_err(|source| StoreError::Serialize {
            name: self.name.clone(),
            source,
        })
    }

    fn restore_value(&self, value: Value) -> Result<()> {
        let state: S = serde_json::from_value(value).map_err(|source| StoreError::Restore {
            name: self.name.clone(),
            source,
        })?;
        self.replace(StoreEvent::Update, |_| state);
        Ok(())
    }

    fn reset(&self) {
        let initial = self.initial_state.clone();
        self.replace(StoreEvent::Reset, |_| initial);
    }

    fn on(&self, event: StoreEvent, callback: Box<dyn Fn() + Send + Sync>) -> Subscription {
        self.listen(event, Arc::from(callback))
    }

    fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            debug!(store = %self.name, uid = %self.uid, "store already destroyed");
            return;
        }
        self.emit(StoreEvent::Destroy);
        self.listeners.clear();
        self.registry.remove(&self.uid);
        debug!(store = %self.name, uid = %self.uid, "store destroyed");
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<S> Drop for StoreInner<S> {
    fn drop(&mut self) {
        self.registry.prune(&self.uid);
    }
}

/// An observable state container.
///
/// The handle is cheap to clone; clones share the state, the listeners and
/// the registry entry. Mutation only happens through [`Store::update`],
/// [`Store::set`] and [`Store::reset`], and every listener runs synchronously
/// on the caller's stack, so a listener may update the store again.
///
/// # Example
/// ```
/// use serde::{Deserialize, Serialize};
/// use unistate::{Registry, Store, StoreEvent, StoreOptions};
///
/// #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
/// struct Counter {
///     count: u32,
/// }
///
/// let store = Store::with_options(
///     StoreOptions::new(Counter { count: 0 }).registry(Registry::new()),
/// );
/// let _sub = store.on(StoreEvent::Update, || println!("updated"));
///
/// store.update(|mut state| {
///     state.count += 1;
///     state
/// });
///
/// assert_eq!(store.state(), Counter { count: 1 });
/// assert_eq!(store.prev_state(), Some(Counter { count: 0 }));
/// ```
pub struct Store<S> {
    inner: Arc<StoreInner<S>>,
}

impl<S: StoreState> Store<S> {
    /// Create a store in the global registry with the default name.
    pub fn new(initial_state: S) -> Self {
        Self::with_options(StoreOptions::new(initial_state))
    }

    /// Create a store and register it.
    ///
    /// Without an explicit name the store is named after its type (`"Store"`).
    pub fn with_options(options: StoreOptions<S>) -> Self {
        let StoreOptions {
            initial_state,
            name,
            registry,
        } = options;
        let registry = registry.unwrap_or_else(Registry::global);
        let name = name.unwrap_or_else(|| short_type_name::<Self>().to_string());

        let inner = Arc::new(StoreInner {
            uid: StoreId::new(),
            name,
            initial_state: initial_state.clone(),
            cell: Mutex::new(StateCell {
                state: initial_state,
                prev_state: None,
            }),
            listeners: EventListeners::default(),
            registry: registry.clone(),
            destroyed: AtomicBool::new(false),
        });
        debug!(store = %inner.name, uid = %inner.uid, "store created");

        let erased: StoreRef = inner.clone();
        registry.add(&erased);
        Self { inner }
    }

    pub(crate) fn from_inner(inner: Arc<StoreInner<S>>) -> Self {
        Self { inner }
    }

    pub fn uid(&self) -> &StoreId {
        &self.inner.uid
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// A clone of the current state.
    pub fn state(&self) -> S {
        self.inner.state()
    }

    /// Read the state without cloning it.
    ///
    /// `f` must not call back into this store.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let cell = lock(&self.inner.cell);
        f(&cell.state)
    }

    /// The state as it was right before the last change, if any.
    pub fn prev_state(&self) -> Option<S> {
        lock(&self.inner.cell).prev_state.clone()
    }

    /// Replace the state with the value returned by `updater`, then notify
    /// `update` listeners in registration order.
    ///
    /// If `updater` panics the state is left unchanged. `updater` runs without
    /// the state lock, so updates racing from several threads are not
    /// serialized: the last one to finish wins.
    pub fn update<F>(&self, updater: F)
    where
        F: FnOnce(S) -> S,
    {
        self.inner.replace(StoreEvent::Update, updater);
    }

    /// Replace the state, then notify `update` listeners.
    pub fn set(&self, state: S) {
        self.update(|_| state);
    }

    /// Put the initial state back, then notify `reset` listeners.
    pub fn reset(&self) {
        AnyStore::reset(&*self.inner);
    }

    /// Register a listener for `event`.
    ///
    /// Every call registers a new listener, so passing equal closures twice
    /// makes both run. A destroyed store hands back an inactive subscription.
    pub fn on<F>(&self, event: StoreEvent, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.inner.listen(event, Arc::new(callback))
    }

    /// Register a shared listener for `event`.
    ///
    /// Fails with [`StoreError::DuplicateListener`] if this `Arc` is already
    /// registered for the same event.
    pub fn on_shared(&self, event: StoreEvent, callback: Callback) -> Result<Subscription> {
        if self.is_destroyed() {
            return Ok(Subscription::empty());
        }
        self.inner.listeners.get(event).add(callback)
    }

    /// Number of listeners currently registered for `event`.
    pub fn listener_count(&self, event: StoreEvent) -> usize {
        self.inner.listeners.get(event).len()
    }

    /// Notify `destroy` listeners, drop every listener and leave the registry.
    ///
    /// Only the first call has an effect. Afterwards the store still accepts
    /// state changes but never emits another event.
    pub fn destroy(&self) {
        AnyStore::destroy(&*self.inner);
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// The registry this store joined.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Non-owning handle to this store.
    pub fn downgrade(&self) -> WeakStore<S> {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Type-erased handle to this store.
    pub fn erased(&self) -> StoreRef {
        self.inner.clone()
    }

    /// Wrap the store so it is destroyed when the wrapper is dropped.
    pub fn scoped(self) -> ScopedStore<S> {
        ScopedStore::new(self)
    }
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("uid", &self.inner.uid)
            .field("name", &self.inner.name)
            .finish()
    }
}

/// Non-owning store handle; see [`Store::downgrade`].
pub struct WeakStore<S> {
    inner: Weak<StoreInner<S>>,
}

impl<S> WeakStore<S> {
    pub fn upgrade(&self) -> Option<Store<S>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl<S> Clone for WeakStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}
