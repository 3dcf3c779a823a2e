//! Derived views of a store and bindings that feed a store.
//!
//! - [`select`] projects the state into a [`Signal`](crate::Signal) that is
//!   recomputed on every `update`.
//! - [`select_stream`] pushes the projection into a replaying [`Subject`].
//! - [`connect`] writes a signal-driven transform of the state back into the
//!   store; [`connect_stream`] does the same for every value of a [`Source`].
//!
//! Everything returned here releases its store listener when dropped.

mod connect;
mod select;
mod stream;

pub use connect::{connect, connect_stream, Connection, Propagation};
pub use select::{select, select_stream, SelectStream, Selected};
pub use stream::{Source, Subject};
