use std::fmt;
use std::sync::{Arc, RwLock};

use crate::runtime::ReactiveRuntime;
use crate::sync::{read, write};

/// A reactive signal that holds a value and notifies observers when changed.
///
/// A signal is bound to the runtime that was current when it was created.
pub struct Signal<T> {
    value: Arc<RwLock<T>>,
    runtime: Arc<ReactiveRuntime>,
    id: usize,
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(initial: T) -> Self {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();

        Self {
            value: Arc::new(RwLock::new(initial)),
            runtime,
            id,
        }
    }

    /// Get the current value of the signal.
    pub fn get(&self) -> T {
        self.runtime.track_read(self.id);
        read(&self.value).clone()
    }

    /// Set a new value for the signal.
    pub fn set(&self, new_value: T) {
        *write(&self.value) = new_value;
        self.runtime.notify_observers(self.id);
    }

    /// Update the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut value = write(&self.value);
            f(&mut *value);
        }
        self.runtime.notify_observers(self.id);
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.runtime.track_read(self.id);
        let value = read(&self.value);
        f(&*value)
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            runtime: Arc::clone(&self.runtime),
            id: self.id,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &*read(&self.value))
            .finish()
    }
}
