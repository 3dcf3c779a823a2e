//! # Unistate
//!
//! Observable state stores with a shared registry.
//!
//! ## Stores
//!
//! - `Store<S>` - owns a state value, replaced through `update`, `set` and `reset`
//! - `StoreEvent` - `update`, `reset` and `destroy` notifications without payload
//! - `Registry` - weak, insertion-ordered index of live stores with `add`/`remove`
//!   events and name → JSON snapshots
//!
//! ## Reactive glue
//!
//! - `Signal<T>`, `Memo<T>`, `Effect` - fine-grained reactive primitives
//! - `select` / `select_stream` - project a store into a signal or a stream
//! - `connect` / `connect_stream` - feed a signal or a stream back into a store
//!
//! ## Developer tooling
//!
//! - `DevTools` - Redux-DevTools style bridge with time travel
//! - `StoreLogger` - logs store activity through `tracing`
//!
//! ```
//! use unistate::{Registry, Store, StoreEvent, StoreOptions};
//!
//! let registry = Registry::new();
//! let store = Store::with_options(StoreOptions::new(0u32).name("Counter").registry(registry.clone()));
//! let _sub = store.on(StoreEvent::Update, || {});
//!
//! store.update(|count| count + 1);
//! assert_eq!(registry.snapshot().unwrap()["Counter"], 1);
//! ```

pub mod devtools;
pub mod registry;
pub mod runtime;
pub mod select;
pub mod signal;
pub mod store;

mod error;
mod event;
mod sync;

// Re-export main types for convenience
pub use devtools::{init_devtools, run_logger, DevTools, DevtoolsConfig, StoreLogger};
pub use error::{Result, StoreError};
pub use event::Subscription;
pub use registry::{Registry, RegistryAction, RegistryEvent, RegistryListener, Snapshot};
pub use runtime::ReactiveRuntime;
pub use select::{
    connect, connect_stream, select, select_stream, Connection, Propagation, SelectStream,
    Selected, Source, Subject,
};
pub use signal::{Effect, Memo, Signal};
pub use store::{
    AnyStore, Callback, ScopedStore, Store, StoreEvent, StoreId, StoreOptions, StoreRef,
    StoreState, WeakStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_works() {
        // Basic smoke test
        let registry = Registry::new();
        let store = Store::with_options(StoreOptions::new(0).registry(registry.clone()));
        assert_eq!(store.state(), 0);
        store.set(42);
        assert_eq!(store.state(), 42);
        assert_eq!(registry.len(), 1);
    }
}
