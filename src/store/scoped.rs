use std::ops::Deref;

use crate::store::{Store, StoreState};

/// Owning wrapper that destroys its store when dropped.
///
/// Ties a store to the lexical scope of its owner, the way a component-scoped
/// store is torn down together with the component.
///
/// ```
/// use unistate::{Registry, Store, StoreOptions};
///
/// let registry = Registry::new();
/// {
///     let store = Store::with_options(StoreOptions::new(1_i32).registry(registry.clone())).scoped();
///     store.set(2);
///     assert_eq!(registry.len(), 1);
/// }
/// assert!(registry.is_empty());
/// ```
#[derive(Debug)]
pub struct ScopedStore<S: StoreState> {
    store: Store<S>,
}

impl<S: StoreState> ScopedStore<S> {
    pub(crate) fn new(store: Store<S>) -> Self {
        Self { store }
    }

    /// A handle that outlives the scope; the store is still destroyed when
    /// this wrapper drops.
    pub fn store(&self) -> Store<S> {
        self.store.clone()
    }
}

impl<S: StoreState> Deref for ScopedStore<S> {
    type Target = Store<S>;

    fn deref(&self) -> &Store<S> {
        &self.store
    }
}

impl<S: StoreState> Drop for ScopedStore<S> {
    fn drop(&mut self) {
        self.store.destroy();
    }
}
