use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::Result;
use crate::event::{ListenerList, Subscription};
use crate::store::{AnyStore, Store, StoreId, StoreInner, StoreRef, StoreState};
use crate::sync::lock;

/// Store display name → current state.
///
/// When two live stores share a name, the one registered later wins.
pub type Snapshot = serde_json::Map<String, Value>;

/// Shared registry listener. Registering the same `Arc` twice is rejected.
pub type RegistryListener = Arc<dyn Fn(&RegistryEvent) + Send + Sync>;

/// Lifecycle action broadcast by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryAction {
    Add,
    Remove,
}

/// Payload handed to registry listeners.
///
/// `store` is `None` when the entry belonged to a store that was dropped
/// without being destroyed; `uid` and `name` are always filled in.
#[derive(Clone)]
pub struct RegistryEvent {
    pub action: RegistryAction,
    pub uid: StoreId,
    pub name: String,
    pub store: Option<StoreRef>,
}

impl RegistryEvent {
    fn live(action: RegistryAction, store: StoreRef) -> Self {
        Self {
            action,
            uid: *store.uid(),
            name: store.name().to_string(),
            store: Some(store),
        }
    }

    fn dropped(entry: Entry) -> Self {
        Self {
            action: RegistryAction::Remove,
            uid: entry.uid,
            name: entry.name,
            store: None,
        }
    }
}

impl fmt::Debug for RegistryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEvent")
            .field("action", &self.action)
            .field("name", &self.name)
            .field("uid", &self.uid)
            .field("live", &self.store.is_some())
            .finish()
    }
}

struct Entry {
    uid: StoreId,
    name: String,
    store: Weak<dyn AnyStore>,
}

impl Entry {
    fn is_dead(&self) -> bool {
        self.store.strong_count() == 0
    }
}

struct RegistryInner {
    // Insertion order is snapshot order.
    stores: Mutex<Vec<Entry>>,
    listeners: ListenerList<dyn Fn(&RegistryEvent) + Send + Sync>,
}

/// Registry of live stores.
///
/// `Registry` is a cheap handle: clones observe and mutate the same registry.
/// Build isolated instances with [`Registry::new`] and hand them to stores
/// through [`StoreOptions::registry`](crate::StoreOptions::registry), or use
/// the process-wide [`Registry::global`].
///
/// # Example
/// ```
/// use unistate::{Registry, RegistryAction, Store, StoreOptions};
///
/// let registry = Registry::new();
/// let _sub = registry.on(|event| {
///     if event.action == RegistryAction::Add {
///         println!("{} joined", event.name);
///     }
/// });
///
/// let store = Store::with_options(StoreOptions::new(1_u8).name("One").registry(registry.clone()));
/// assert_eq!(registry.snapshot().unwrap()["One"], 1);
///
/// store.destroy();
/// assert!(registry.get(store.uid()).is_none());
/// ```
#[derive(Clone)]
pub struct Registry {
    inner: Arc<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                stores: Mutex::new(Vec::new()),
                listeners: ListenerList::new(),
            }),
        }
    }

    /// The process-wide default registry, created on first use.
    pub fn global() -> Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::new).clone()
    }

    /// Insert a store and notify listeners with [`RegistryAction::Add`].
    ///
    /// A store whose id is already present replaces the old entry in place.
    /// Entries of dropped stores found on the way are reported as removed
    /// first.
    pub fn add(&self, store: &StoreRef) {
        let dead = {
            let mut stores = lock(&self.inner.stores);
            let dead = take_dead(&mut stores, |_| true);

            let weak = Arc::downgrade(store);
            match stores.iter_mut().find(|entry| entry.uid == *store.uid()) {
                Some(entry) => {
                    entry.store = weak;
                    entry.name = store.name().to_string();
                }
                None => stores.push(Entry {
                    uid: *store.uid(),
                    name: store.name().to_string(),
                    store: weak,
                }),
            }
            dead
        };

        self.emit_dropped(dead);
        trace!(store = store.name(), uid = %store.uid(), "store added to registry");
        self.emit(RegistryEvent::live(RegistryAction::Add, Arc::clone(store)));
    }

    /// Remove a store and notify listeners with [`RegistryAction::Remove`].
    ///
    /// Unknown ids are ignored.
    pub fn remove(&self, uid: &StoreId) {
        let removed = {
            let mut stores = lock(&self.inner.stores);
            match stores.iter().position(|entry| entry.uid == *uid) {
                Some(pos) => stores.remove(pos),
                None => return,
            }
        };

        match removed.store.upgrade() {
            Some(store) => {
                trace!(store = store.name(), uid = %uid, "store removed from registry");
                self.emit(RegistryEvent::live(RegistryAction::Remove, store));
            }
            None => self.emit_dropped(vec![removed]),
        }
    }

    /// Drop the entry of a store that no longer exists and report it with a
    /// [`RegistryAction::Remove`] event that carries no store.
    pub(crate) fn prune(&self, uid: &StoreId) {
        let dead = take_dead(&mut lock(&self.inner.stores), |entry| entry.uid == *uid);
        self.emit_dropped(dead);
    }

    /// Listen to lifecycle events.
    pub fn on<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RegistryEvent) + Send + Sync + 'static,
    {
        self.inner.listeners.add_fresh(Arc::new(listener))
    }

    /// Listen to lifecycle events with a shared listener.
    ///
    /// Fails with [`StoreError::DuplicateListener`](crate::StoreError::DuplicateListener)
    /// if the same `Arc` is already registered.
    pub fn on_shared(&self, listener: RegistryListener) -> Result<Subscription> {
        self.inner.listeners.add(listener)
    }

    /// Name → state of every live store.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let mut snapshot = Snapshot::new();
        for store in self.stores() {
            snapshot.insert(store.name().to_string(), store.state_value()?);
        }
        Ok(snapshot)
    }

    pub fn get(&self, uid: &StoreId) -> Option<StoreRef> {
        let store = lock(&self.inner.stores)
            .iter()
            .find(|entry| entry.uid == *uid)
            .and_then(|entry| entry.store.upgrade());
        store
    }

    /// Typed lookup; `None` if the store is missing or holds another state type.
    pub fn get_store<S: StoreState>(&self, uid: &StoreId) -> Option<Store<S>> {
        self.get(uid)?
            .into_any()
            .downcast::<StoreInner<S>>()
            .ok()
            .map(Store::from_inner)
    }

    /// Live stores in insertion order.
    pub fn stores(&self) -> Vec<StoreRef> {
        let stores = lock(&self.inner.stores)
            .iter()
            .filter_map(|entry| entry.store.upgrade())
            .collect();
        stores
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.stores)
            .iter()
            .filter(|entry| !entry.is_dead())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn emit(&self, event: RegistryEvent) {
        for listener in self.inner.listeners.snapshot() {
            listener(&event);
        }
    }

    fn emit_dropped(&self, dead: Vec<Entry>) {
        for entry in dead {
            trace!(store = %entry.name, uid = %entry.uid, "dropped store left registry");
            self.emit(RegistryEvent::dropped(entry));
        }
    }
}

fn take_dead(stores: &mut Vec<Entry>, matches: impl Fn(&Entry) -> bool) -> Vec<Entry> {
    let mut dead = Vec::new();
    let mut i = 0;
    while i < stores.len() {
        if stores[i].is_dead() && matches(&stores[i]) {
            dead.push(stores.remove(i));
        } else {
            i += 1;
        }
    }
    dead
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("stores", &self.len())
            .field("listeners", &self.inner.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StoreError, StoreOptions};

    fn store_in<S: StoreState>(registry: &Registry, state: S, name: &str) -> Store<S> {
        Store::with_options(StoreOptions::new(state).name(name).registry(registry.clone()))
    }

    fn recorder(registry: &Registry) -> (Subscription, Arc<Mutex<Vec<(RegistryAction, String)>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let sub = registry.on(move |event| {
            lock(&log_clone).push((event.action, event.name.clone()));
        });
        (sub, log)
    }

    #[test]
    fn add_then_get_returns_same_store() {
        let registry = Registry::new();
        let store = store_in(&registry, 1_u32, "A");

        let found = registry.get(store.uid()).unwrap();
        assert_eq!(found.uid(), store.uid());

        let typed: Store<u32> = registry.get_store(store.uid()).unwrap();
        typed.set(2);
        assert_eq!(store.state(), 2);

        assert!(registry.get_store::<String>(store.uid()).is_none());
    }

    #[test]
    fn remove_fires_once_and_unknown_is_noop() {
        let registry = Registry::new();
        let (_sub, log) = recorder(&registry);
        let store = store_in(&registry, 0_i32, "Counter");

        registry.remove(store.uid());
        registry.remove(store.uid());

        assert!(registry.get(store.uid()).is_none());
        assert_eq!(
            *lock(&log),
            vec![
                (RegistryAction::Add, "Counter".to_string()),
                (RegistryAction::Remove, "Counter".to_string()),
            ]
        );
    }

    #[test]
    fn shared_listener_rejected_until_unregistered() {
        let registry = Registry::new();
        let listener: RegistryListener = Arc::new(|_: &RegistryEvent| {});

        let sub = registry.on_shared(listener.clone()).unwrap();
        assert!(matches!(
            registry.on_shared(listener.clone()),
            Err(StoreError::DuplicateListener)
        ));

        sub.unsubscribe();
        sub.unsubscribe();
        assert!(registry.on_shared(listener).is_ok());
    }

    #[test]
    fn snapshot_last_registered_name_wins() {
        let registry = Registry::new();
        let _first = store_in(&registry, 1_u8, "Same");
        let _second = store_in(&registry, 2_u8, "Same");
        let _other = store_in(&registry, vec!["x".to_string()], "Other");

        let snapshot = registry.snapshot().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["Same"], 2);
        assert_eq!(snapshot["Other"], serde_json::json!(["x"]));
    }

    #[test]
    fn dropped_store_is_reported_without_handle() {
        let registry = Registry::new();
        let (_sub, log) = recorder(&registry);
        let stores_seen = Arc::new(Mutex::new(Vec::new()));
        let _live = registry.on({
            let stores_seen = stores_seen.clone();
            move |event| lock(&stores_seen).push(event.store.is_some())
        });

        let kept = store_in(&registry, 1_u8, "Kept");
        let dropped = store_in(&registry, 2_u8, "Dropped");
        let dropped_uid = *dropped.uid();

        drop(dropped);

        assert_eq!(registry.len(), 1);
        assert!(registry.get(&dropped_uid).is_none());
        assert_eq!(registry.stores()[0].uid(), kept.uid());
        assert_eq!(
            *lock(&log),
            vec![
                (RegistryAction::Add, "Kept".to_string()),
                (RegistryAction::Add, "Dropped".to_string()),
                (RegistryAction::Remove, "Dropped".to_string()),
            ]
        );
        assert_eq!(*lock(&stores_seen), vec![true, true, false]);

        // Already reported; removing the id again is a no-op.
        registry.remove(&dropped_uid);
        assert_eq!(lock(&log).len(), 3);
    }

    #[test]
    fn destroyed_then_dropped_store_is_removed_once() {
        let registry = Registry::new();
        let (_sub, log) = recorder(&registry);
        let store = store_in(&registry, 0_u8, "Once");
        store.destroy();
        drop(store);

        let removes = lock(&log)
            .iter()
            .filter(|(action, _)| *action == RegistryAction::Remove)
            .count();
        assert_eq!(removes, 1);
    }

    #[test]
    fn listener_may_touch_registry_while_notified() {
        let registry = Registry::new();
        let inner = registry.clone();
        let _sub = registry.on(move |event| {
            assert!(inner.get(&event.uid).is_some() || event.action == RegistryAction::Remove);
            let _ = inner.snapshot();
        });

        let store = store_in(&registry, 3_u8, "Three");
        store.destroy();
        assert!(registry.is_empty());
    }
}
