use std::sync::{Arc, Weak};

use crate::runtime::ReactiveRuntime;

/// A side effect that runs when its dependencies change.
///
/// Effects automatically track signal and memo reads and re-run synchronously
/// when those change. The effect runs immediately on creation to establish
/// its initial dependencies. Dropping the effect unregisters it.
///
/// # Examples
///
/// ```
/// use unistate::{Effect, Signal};
/// use std::sync::{Arc, atomic::{AtomicI32, Ordering}};
///
/// let signal = Signal::new(5);
/// let last_value = Arc::new(AtomicI32::new(0));
/// let last_value_clone = last_value.clone();
///
/// let _effect = Effect::new({
///     let signal = signal.clone();
///     move || {
///         last_value_clone.store(signal.get(), Ordering::SeqCst);
///     }
/// });
///
/// assert_eq!(last_value.load(Ordering::SeqCst), 5);
///
/// signal.set(10);
/// assert_eq!(last_value.load(Ordering::SeqCst), 10);
/// ```
pub struct Effect {
    id: usize,
    runtime: Weak<ReactiveRuntime>,
}

impl Effect {
    /// Create a new effect that runs when dependencies change.
    pub fn new<F>(effect: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();
        let effect = Arc::new(effect);

        runtime.register_observer(id, effect.clone());
        runtime.with_observer(id, || effect());

        Self {
            id,
            runtime: Arc::downgrade(&runtime),
        }
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.id);
        }
    }
}
