//! Fine-grained reactive primitives.
//!
//! This module provides the reactive cells used by selectors and connections:
//! - Signals: Reactive state containers
//! - Memos: Cached computed values
//! - Effects: Side effects that react to changes

mod effect;
mod memo;
mod signal;

pub use effect::Effect;
pub use memo::Memo;
pub use signal::Signal;
