//! Observable state stores.
//!
//! A [`Store`] owns one state value, hands out subscriptions for its
//! [`StoreEvent`]s and registers itself in a [`Registry`](crate::Registry)
//! for as long as it lives.

mod erased;
mod event;
mod options;
mod scoped;
mod store;

pub use erased::{AnyStore, StoreRef, StoreState};
pub use event::{StoreEvent, StoreId};
pub use options::StoreOptions;
pub use scoped::ScopedStore;
pub use store::{Callback, Store, WeakStore};

pub(crate) use options::short_type_name;
pub(crate) use store::StoreInner;
