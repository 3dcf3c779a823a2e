use std::any::Any;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::event::Subscription;
use crate::store::{StoreEvent, StoreId};

/// Bound for values a store can hold.
///
/// `Clone` provides the one-level copy kept as the previous state. The serde
/// bounds let registry snapshots and devtools read and restore any store.
pub trait StoreState: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> StoreState for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Type-erased view of a store, as seen by the registry and its observers.
pub trait AnyStore: Send + Sync + 'static {
    fn uid(&self) -> &StoreId;

    fn name(&self) -> &str;

    fn is_destroyed(&self) -> bool;

    /// Current state as JSON.
    fn state_value(&self) -> Result<Value>;

    /// Replace the state with a JSON value, firing `update` listeners.
    fn restore_value(&self, value: Value) -> Result<()>;

    /// Put the initial state back, firing `reset` listeners.
    fn reset(&self);

    /// Register a listener for one event kind.
    fn on(&self, event: StoreEvent, callback: Box<dyn Fn() + Send + Sync>) -> Subscription;

    fn destroy(&self);

    /// Used to get the typed store back.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Shared handle to a type-erased store.
pub type StoreRef = Arc<dyn AnyStore>;
