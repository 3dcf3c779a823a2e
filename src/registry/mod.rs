//! Registry of live stores.
//!
//! The registry never owns a store: it keeps weak references, broadcasts
//! `add`/`remove` lifecycle events and builds name → state snapshots for
//! external tooling.

mod registry;

pub use registry::{Registry, RegistryAction, RegistryEvent, RegistryListener, Snapshot};
