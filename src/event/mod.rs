//! Listener bookkeeping shared by stores, the registry and streams.
//!
//! All three use the same policy:
//! - listeners are called in registration order,
//! - a shared listener (`Arc`) can only be registered once at a time,
//! - unregistering is idempotent and removes at most one entry.

mod listeners;
mod subscription;

pub(crate) use listeners::ListenerList;
pub use subscription::Subscription;
